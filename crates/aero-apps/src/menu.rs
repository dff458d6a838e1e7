//! Per-instance application menu model.
//!
//! Each process owns one [`AppMenuManager`]; the host reads the tree back to
//! render the system menu bar and change subscribers hear about every edit.

/// One menu entry; `children` nests submenus.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppMenu {
    /// Stable id for lookup independent of display name
    pub id: Option<String>,
    /// Display name (also the path segment for [`AppMenuManager::get_by_path`])
    pub name: String,
    /// Checkmark state
    pub checked: bool,
    /// Icon URL
    pub icon: Option<String>,
    /// Keyboard shortcut parts, e.g. `["Ctrl", "S"]`
    pub shortcut: Vec<String>,
    pub children: Vec<AppMenu>,
}

impl AppMenu {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_children(mut self, children: Vec<AppMenu>) -> Self {
        self.children = children;
        self
    }
}

type ChangeCallback = Box<dyn FnMut(&str)>;

/// Menu tree for one application instance.
#[derive(Default)]
pub struct AppMenuManager {
    menu: Vec<AppMenu>,
    on_change: Vec<ChangeCallback>,
}

impl AppMenuManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole tree.
    pub fn set(&mut self, menu: Vec<AppMenu>) {
        self.menu = menu;
        self.notify("");
    }

    /// The current tree, top level first.
    pub fn get(&self) -> &[AppMenu] {
        &self.menu
    }

    /// Breadth-first lookup by display name.
    pub fn get_by_name(&self, name: &str) -> Option<&AppMenu> {
        let mut queue: Vec<&AppMenu> = self.menu.iter().collect();
        let mut i = 0;
        while i < queue.len() {
            let m = queue[i];
            if m.name == name {
                return Some(m);
            }
            queue.extend(m.children.iter());
            i += 1;
        }
        None
    }

    /// Breadth-first lookup by id.
    pub fn get_by_id(&self, id: &str) -> Option<&AppMenu> {
        let mut queue: Vec<&AppMenu> = self.menu.iter().collect();
        let mut i = 0;
        while i < queue.len() {
            let m = queue[i];
            if m.id.as_deref() == Some(id) {
                return Some(m);
            }
            queue.extend(m.children.iter());
            i += 1;
        }
        None
    }

    /// Lookup by dot-separated name path, e.g. `"File.Open Recent"`.
    pub fn get_by_path(&self, path: &str) -> Option<&AppMenu> {
        let mut level = &self.menu;
        let mut found = None;
        for segment in path.split('.') {
            let next = level.iter().find(|m| m.name == segment)?;
            found = Some(next);
            level = &next.children;
        }
        found
    }

    /// Set the checkmark on the entry at `path`.
    ///
    /// With `exclusive`, siblings at the same level are unchecked first.
    /// Returns whether the path resolved.
    pub fn set_checked(&mut self, path: &str, checked: bool, exclusive: bool) -> bool {
        let mut level = &mut self.menu;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            if i + 1 == segments.len() {
                if !level.iter().any(|m| m.name == *segment) {
                    return false;
                }
                if exclusive {
                    for m in level.iter_mut() {
                        m.checked = false;
                    }
                }
                for m in level.iter_mut() {
                    if m.name == *segment {
                        m.checked = checked;
                    }
                }
                self.notify(path);
                return true;
            }
            match level.iter_mut().find(|m| m.name == *segment) {
                Some(next) => level = &mut next.children,
                None => return false,
            }
        }
        false
    }

    /// Rename the entry at `path`. Returns whether the path resolved.
    pub fn set_name(&mut self, path: &str, name: impl Into<String>) -> bool {
        let name = name.into();
        let mut level = &mut self.menu;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            match level.iter_mut().find(|m| m.name == *segment) {
                Some(next) => {
                    if i + 1 == segments.len() {
                        next.name = name;
                        self.notify(path);
                        return true;
                    }
                    level = &mut next.children;
                }
                None => return false,
            }
        }
        false
    }

    /// Subscribe to tree changes; the callback receives the changed path
    /// (empty for a full replace).
    pub fn on_change(&mut self, cb: impl FnMut(&str) + 'static) {
        self.on_change.push(Box::new(cb));
    }

    fn notify(&mut self, path: &str) {
        let mut cbs = std::mem::take(&mut self.on_change);
        for cb in cbs.iter_mut() {
            cb(path);
        }
        cbs.append(&mut self.on_change);
        self.on_change = cbs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<AppMenu> {
        vec![
            AppMenu::new("File").with_children(vec![
                AppMenu::new("Open").with_id("file.open"),
                AppMenu::new("Save"),
            ]),
            AppMenu::new("View").with_children(vec![
                AppMenu::new("Day"),
                AppMenu::new("Night"),
            ]),
        ]
    }

    #[test]
    fn test_lookup_by_name_id_and_path() {
        let mut mgr = AppMenuManager::new();
        mgr.set(sample());

        assert_eq!(mgr.get_by_name("Save").unwrap().name, "Save");
        assert_eq!(mgr.get_by_id("file.open").unwrap().name, "Open");
        assert_eq!(mgr.get_by_path("File.Open").unwrap().name, "Open");
        assert!(mgr.get_by_path("File.Missing").is_none());
    }

    #[test]
    fn test_exclusive_check_clears_siblings() {
        let mut mgr = AppMenuManager::new();
        mgr.set(sample());

        assert!(mgr.set_checked("View.Day", true, false));
        assert!(mgr.set_checked("View.Night", true, true));

        assert!(!mgr.get_by_path("View.Day").unwrap().checked);
        assert!(mgr.get_by_path("View.Night").unwrap().checked);
    }

    #[test]
    fn test_change_notification() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut mgr = AppMenuManager::new();
        let paths = Rc::new(RefCell::new(Vec::new()));
        let paths_cb = paths.clone();
        mgr.on_change(move |p| paths_cb.borrow_mut().push(p.to_string()));

        mgr.set(sample());
        mgr.set_name("File.Save", "Save As");
        assert_eq!(*paths.borrow(), vec!["".to_string(), "File.Save".to_string()]);
    }
}
