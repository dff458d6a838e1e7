//! Capability objects handed to applications.
//!
//! An [`AppContext`] belongs to exactly one process; the shell keeps
//! ownership and lends it to the app for the duration of a lifecycle hook.
//! Anything that must reach back into the shell (open-file delegation) goes
//! through the [`ShellRequestQueue`] instead of a direct call, so a hook can
//! never re-enter the process manager.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use aero_desktop::{WindowConfig, WindowId, WindowManager};

use crate::hook::SystemHooks;
use crate::menu::AppMenuManager;

/// A deferred call into the shell, drained by the shell's pump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellRequest {
    /// Route a file to whichever app supports its extension.
    OpenFile { path: String },
    /// Route a file to a specific app.
    OpenFileBy { app: String, path: String },
}

/// Shared queue of deferred shell calls.
#[derive(Clone, Default)]
pub struct ShellRequestQueue {
    inner: Rc<RefCell<VecDeque<ShellRequest>>>,
}

impl ShellRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, request: ShellRequest) {
        self.inner.borrow_mut().push_back(request);
    }

    /// Take every pending request, oldest first.
    pub fn drain(&self) -> Vec<ShellRequest> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

type OpenFileCallback = Box<dyn FnMut(&str)>;

/// Per-process capability object.
pub struct AppContext {
    app_name: String,
    /// Launch parameters (`file`, deep-link values)
    pub params: HashMap<String, String>,
    /// Whether this start resumes persisted state
    pub resume: bool,
    /// Per-instance menu tree
    pub menu: AppMenuManager,
    windows: Rc<RefCell<WindowManager>>,
    window_ids: Vec<WindowId>,
    open_file_subscribers: Vec<OpenFileCallback>,
    registered_exts: Vec<String>,
    requests: ShellRequestQueue,
}

impl AppContext {
    pub fn new(
        app_name: impl Into<String>,
        windows: Rc<RefCell<WindowManager>>,
        requests: ShellRequestQueue,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            params: HashMap::new(),
            resume: false,
            menu: AppMenuManager::new(),
            windows,
            window_ids: Vec::new(),
            open_file_subscribers: Vec::new(),
            registered_exts: Vec::new(),
            requests,
        }
    }

    /// Owning application name.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Create a window owned by this process.
    pub fn create_window(&mut self, mut config: WindowConfig) -> WindowId {
        config.app_name = self.app_name.clone();
        let id = self.windows.borrow_mut().create_window(config);
        self.window_ids.push(id);
        id
    }

    /// Shared window-manager handle for geometry calls on owned windows.
    pub fn windows(&self) -> &Rc<RefCell<WindowManager>> {
        &self.windows
    }

    /// Ids of every window this process created, oldest first.
    pub fn window_ids(&self) -> &[WindowId] {
        &self.window_ids
    }

    /// Forget a window that has been removed from the arena.
    pub fn forget_window(&mut self, id: WindowId) {
        self.window_ids.retain(|w| *w != id);
    }

    /// Subscribe to files routed to this process.
    pub fn on_open_file(&mut self, cb: impl FnMut(&str) + 'static) {
        self.open_file_subscribers.push(Box::new(cb));
    }

    /// Deliver a routed file to the app's subscribers.
    pub fn emit_open_file(&mut self, path: &str) {
        let mut cbs = std::mem::take(&mut self.open_file_subscribers);
        for cb in cbs.iter_mut() {
            cb(path);
        }
        cbs.append(&mut self.open_file_subscribers);
        self.open_file_subscribers = cbs;
    }

    /// Ask the shell to open a file with whichever app supports it.
    pub fn open_file(&self, path: impl Into<String>) {
        self.requests.push(ShellRequest::OpenFile { path: path.into() });
    }

    /// Ask the shell to open a file with a specific app.
    pub fn open_file_by(&self, app: impl Into<String>, path: impl Into<String>) {
        self.requests.push(ShellRequest::OpenFileBy {
            app: app.into(),
            path: path.into(),
        });
    }

    /// Declare extra extensions supported at runtime.
    pub fn register_ext(&mut self, exts: &[&str]) {
        for ext in exts {
            let ext = ext.to_string();
            if !self.registered_exts.contains(&ext) {
                self.registered_exts.push(ext);
            }
        }
    }

    /// Extensions declared via [`AppContext::register_ext`].
    pub fn registered_exts(&self) -> &[String] {
        &self.registered_exts
    }
}

/// Context for the one-time `installed` hook.
pub struct InstallContext<'a> {
    /// System hook surface (global search)
    pub hooks: &'a mut SystemHooks,
    requests: ShellRequestQueue,
}

impl<'a> InstallContext<'a> {
    pub fn new(hooks: &'a mut SystemHooks, requests: ShellRequestQueue) -> Self {
        Self { hooks, requests }
    }

    /// Ask the shell to open a file with whichever app supports it.
    pub fn open_file(&self, path: impl Into<String>) {
        self.requests.push(ShellRequest::OpenFile { path: path.into() });
    }

    /// Ask the shell to open a file with a specific app.
    pub fn open_file_by(&self, app: impl Into<String>, path: impl Into<String>) {
        self.requests.push(ShellRequest::OpenFileBy {
            app: app.into(),
            path: path.into(),
        });
    }
}
