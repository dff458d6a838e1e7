//! Process manager: one process per running application.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use aero_apps::{AppContext, AppRegistry, ShellRequest, ShellRequestQueue};
use aero_desktop::launch_url;
use aero_desktop::math::Size;
use aero_desktop::{WindowConfig, WindowId, WindowManager};
use aero_store::{Collection, Store};
use serde_json::Value;

use crate::error::ShellError;
use crate::persist::{
    window_key, PositionRecord, ProcessCache, SizeRecord, WindowRecord, CACHE_KEY,
    PROCESS_COLLECTION,
};

/// Lifecycle phase of a process. Stopped processes leave the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Closing,
}

/// Options for [`ProcessManager::start_app`].
#[derive(Clone, Debug, Default)]
pub struct StartOptions {
    /// Start forced fullscreen without a title bar
    pub fullscreen: bool,
    /// Launch parameters handed to the app
    pub params: HashMap<String, String>,
    /// Mark the start as a resume of persisted state
    pub resume: bool,
}

/// One running application.
pub struct ProcessState {
    name: String,
    phase: Phase,
    ctx: AppContext,
    inbox: Vec<Value>,
    /// Creation ordinal per window, for stable persisted keys
    ordinals: Vec<(WindowId, usize)>,
    next_ordinal: usize,
    main_window: WindowId,
}

impl ProcessState {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn main_window(&self) -> WindowId {
        self.main_window
    }

    pub fn ctx(&self) -> &AppContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }
}

/// Window events observed by the manager, replayed outside the
/// window-manager borrow.
enum ProcEvent {
    BeforeClose(String),
    Minimized(String),
    Activated(String),
}

/// Process table, boot sequence, persistence, and file routing.
pub struct ProcessManager {
    registry: AppRegistry,
    windows: Rc<RefCell<WindowManager>>,
    remote: Collection,
    cache: ProcessCache,
    processes: Vec<ProcessState>,
    dock: Vec<String>,
    active: Option<String>,
    requests: ShellRequestQueue,
    events: Rc<RefCell<Vec<ProcEvent>>>,
    geometry_dirty: Rc<Cell<bool>>,
    now_ms: f64,
}

impl ProcessManager {
    /// `requests` must be the queue the registry's contexts write to.
    pub fn new(
        store: &Store,
        registry: AppRegistry,
        windows: Rc<RefCell<WindowManager>>,
        requests: ShellRequestQueue,
    ) -> Self {
        Self {
            registry,
            windows,
            remote: store.collection(PROCESS_COLLECTION),
            cache: ProcessCache::new(),
            processes: Vec::new(),
            dock: Vec::new(),
            active: None,
            requests,
            events: Rc::new(RefCell::new(Vec::new())),
            geometry_dirty: Rc::new(Cell::new(false)),
            now_ms: 0.0,
        }
    }

    // =========================================================================
    // Boot
    // =========================================================================

    /// Bring the shell up.
    ///
    /// A `#app=<name>` fragment installs only that app and starts it forced
    /// fullscreen; otherwise the whole catalog is installed, orphaned
    /// records are pruned, and apps persisted as running are resumed.
    pub fn boot(&mut self, fragment: Option<&str>) -> Result<(), ShellError> {
        self.cache = self.remote.get::<ProcessCache>(CACHE_KEY)?.unwrap_or_default();

        if let Some(name) = fragment.and_then(launch_url::parse_app_fragment) {
            let name = name.to_string();
            self.registry.init(Some(&[name.as_str()]))?;
            if self.registry.get(&name).is_some() {
                self.start_app(
                    &name,
                    StartOptions {
                        fullscreen: true,
                        resume: true,
                        ..StartOptions::default()
                    },
                )?;
                return Ok(());
            }
            tracing::warn!(app = %name, "deep link to unknown app");
        }
        self.registry.init(None)?;

        self.cache
            .retain(|name, _| self.registry.get(name).is_some());

        let resume: Vec<(String, bool)> = self
            .cache
            .iter()
            .filter(|(_, record)| record.is_running)
            .map(|(name, record)| (name.clone(), record.is_minimized))
            .collect();
        for (name, minimized) in resume {
            if let Err(err) = self.start_app(
                &name,
                StartOptions {
                    resume: true,
                    ..StartOptions::default()
                },
            ) {
                tracing::warn!(app = %name, %err, "resume failed");
                continue;
            }
            if minimized {
                self.minimize_app(&name);
            }
        }
        self.persist()?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start an application, or bring its existing process to the front.
    pub fn start_app(&mut self, name: &str, options: StartOptions) -> Result<(), ShellError> {
        match self.process(name).map(|p| p.phase) {
            Some(Phase::Closing) => {
                // Relaunch during the close fade: drop the dying entry and
                // start fresh. Its windows finish fading on their own.
                self.processes.retain(|p| p.name != name);
            }
            Some(_) => {
                self.bring_to_front(name, options.params);
                return Ok(());
            }
            None => {}
        }

        let Some(installed) = self.registry.get(name) else {
            tracing::warn!(app = %name, "app not installed");
            return Err(ShellError::AppNotInstalled {
                name: name.to_string(),
            });
        };
        let info = installed.info.clone();

        let mut ctx = AppContext::new(name, self.windows.clone(), self.requests.clone());
        ctx.params = options.params;
        ctx.resume = options.resume;

        let mut config = WindowConfig::new(name);
        config.size = Some(Size::new(info.width, info.height));
        if options.fullscreen {
            config.title_bar = false;
        }
        let main_window = ctx.create_window(config);
        if options.fullscreen {
            self.windows.borrow_mut().force_fullscreen(main_window, true);
        }

        let mut process = ProcessState {
            name: name.to_string(),
            phase: Phase::Starting,
            ctx,
            inbox: Vec::new(),
            ordinals: Vec::new(),
            next_ordinal: 0,
            main_window,
        };

        let mut definition = self.registry.take(name);
        if let Some(def) = definition.as_mut() {
            def.start(&mut process.ctx);
        }
        if let Some(def) = definition {
            self.registry.put_back(name, def);
        }
        process.phase = Phase::Running;
        self.processes.push(process);

        self.sync_windows(name);
        self.restore_or_record_geometry(name);
        if let Some(record) = self.cache.get_mut(name) {
            record.is_running = true;
        }
        self.persist()?;
        self.windows.borrow_mut().set_active(main_window, true);
        self.process_events();
        tracing::info!(app = %name, "started");
        Ok(())
    }

    /// Re-enter a live process: new params, `start` again, raise.
    fn bring_to_front(&mut self, name: &str, params: HashMap<String, String>) {
        if self.dock.iter().any(|n| n == name) {
            self.restore_app(name);
        }
        let mut definition = self.registry.take(name);
        let main_window = match self.processes.iter_mut().find(|p| p.name == name) {
            Some(process) => {
                process.ctx.params = params;
                process.ctx.resume = false;
                if let Some(def) = definition.as_mut() {
                    def.start(&mut process.ctx);
                }
                Some(process.main_window)
            }
            None => None,
        };
        if let Some(def) = definition {
            self.registry.put_back(name, def);
        }
        if let Some(main_window) = main_window {
            self.windows.borrow_mut().set_active(main_window, true);
        }
        self.sync_windows(name);
        self.process_events();
    }

    /// Close an application through its `exit` hook.
    pub fn close(&mut self, name: &str, now_ms: f64) -> Result<(), ShellError> {
        self.now_ms = now_ms;
        if self.process(name).is_none() {
            return Err(ShellError::NotRunning {
                name: name.to_string(),
            });
        }
        self.begin_close(name);
        self.process_events();
        self.persist()?;
        Ok(())
    }

    /// Run the exit hook and close every window the process still owns.
    /// Idempotent per process.
    fn begin_close(&mut self, name: &str) {
        {
            let Some(process) = self.processes.iter_mut().find(|p| p.name == name) else {
                return;
            };
            if process.phase == Phase::Closing {
                return;
            }
            process.phase = Phase::Closing;
        }

        let mut definition = self.registry.take(name);
        if let Some(def) = definition.as_mut() {
            if let Some(process) = self.processes.iter_mut().find(|p| p.name == name) {
                def.exit(&mut process.ctx);
            }
        }
        if let Some(def) = definition {
            self.registry.put_back(name, def);
        }

        // Stragglers the exit hook left behind still fade out normally.
        let ids: Vec<WindowId> = self
            .process(name)
            .map(|p| p.ctx.window_ids().to_vec())
            .unwrap_or_default();
        {
            let mut wm = self.windows.borrow_mut();
            for id in ids {
                wm.close(id, self.now_ms);
            }
        }

        self.remove_from_dock(name);
        if let Some(record) = self.cache.get_mut(name) {
            record.is_running = false;
        }
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        tracing::info!(app = %name, "closing");
    }

    // =========================================================================
    // Pump
    // =========================================================================

    /// Advance time-driven work: deferred app requests, window fade-outs,
    /// process teardown, and coalesced geometry persistence.
    pub fn pump(&mut self, now_ms: f64) {
        self.now_ms = now_ms;

        for request in self.requests.drain() {
            let result = match request {
                ShellRequest::OpenFile { path } => self.open_file(&path).map(|_| ()),
                ShellRequest::OpenFileBy { app, path } => self.open_file_by(&app, &path),
            };
            if let Err(err) = result {
                tracing::warn!(%err, "deferred shell request failed");
            }
        }

        let removed = self.windows.borrow_mut().pump(now_ms);
        if !removed.is_empty() {
            for process in &mut self.processes {
                for id in &removed {
                    process.ctx.forget_window(*id);
                    process.ordinals.retain(|(w, _)| w != id);
                }
            }
        }
        let finished: Vec<String> = self
            .processes
            .iter()
            .filter(|p| p.phase == Phase::Closing && p.ctx.window_ids().is_empty())
            .map(|p| p.name.clone())
            .collect();
        for name in &finished {
            self.processes.retain(|p| p.name != *name);
            tracing::info!(app = %name, "stopped");
        }

        self.process_events();

        if self.geometry_dirty.replace(false) {
            self.snapshot_geometry();
            if let Err(err) = self.persist() {
                tracing::warn!(%err, "failed to persist process state");
            }
        }
    }

    /// Drain window events until none are produced. Handlers may push new
    /// events (a close cascading into more closes); the loop absorbs them.
    fn process_events(&mut self) {
        loop {
            let batch: Vec<ProcEvent> = self.events.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                break;
            }
            for event in batch {
                match event {
                    ProcEvent::Activated(name) => {
                        if self.process(&name).is_some() {
                            self.active = Some(name);
                        }
                    }
                    ProcEvent::Minimized(name) => {
                        self.append_to_dock(&name);
                    }
                    ProcEvent::BeforeClose(name) => {
                        self.begin_close(&name);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Dock
    // =========================================================================

    /// Minimize an app's main window into the dock.
    pub fn minimize_app(&mut self, name: &str) {
        if let Some(main_window) = self.process(name).map(|p| p.main_window) {
            self.windows.borrow_mut().minimize(main_window);
            self.process_events();
        }
    }

    /// Restore an app from the dock and activate it.
    pub fn restore_app(&mut self, name: &str) {
        let Some(main_window) = self.process(name).map(|p| p.main_window) else {
            return;
        };
        self.remove_from_dock(name);
        self.windows.borrow_mut().restore(main_window);
        if let Err(err) = self.persist() {
            tracing::warn!(%err, "failed to persist process state");
        }
        self.process_events();
    }

    fn append_to_dock(&mut self, name: &str) {
        if self.process(name).is_none() || self.dock.iter().any(|n| n == name) {
            return;
        }
        self.dock.push(name.to_string());
        if let Some(record) = self.cache.get_mut(name) {
            record.is_minimized = true;
        }
        self.windows.borrow_mut().set_dock_visible(true);
        if let Err(err) = self.persist() {
            tracing::warn!(%err, "failed to persist process state");
        }
    }

    fn remove_from_dock(&mut self, name: &str) {
        self.dock.retain(|n| n != name);
        if let Some(record) = self.cache.get_mut(name) {
            record.is_minimized = false;
        }
        if self.dock.is_empty() {
            self.windows.borrow_mut().set_dock_visible(false);
        }
    }

    /// App names currently minimized to the dock, oldest first.
    pub fn dock(&self) -> &[String] {
        &self.dock
    }

    // =========================================================================
    // File routing and messaging
    // =========================================================================

    /// Route a file to the first app supporting its extension.
    ///
    /// `Ok(false)` when nothing supports the extension (or there is none).
    pub fn open_file(&mut self, path: &str) -> Result<bool, ShellError> {
        let Some(ext) = file_ext(path) else {
            return Ok(false);
        };
        let apps = self.registry.supported_apps_by_ext(ext);
        let Some(app) = apps.first() else {
            return Ok(false);
        };
        let app = app.clone();
        self.open_file_by(&app, path)?;
        Ok(true)
    }

    /// Route a file to a specific app, starting it if needed.
    pub fn open_file_by(&mut self, name: &str, path: &str) -> Result<(), ShellError> {
        let mut params = HashMap::new();
        params.insert("file".to_string(), path.to_string());
        self.start_app(
            name,
            StartOptions {
                params,
                ..StartOptions::default()
            },
        )?;
        if let Some(process) = self.processes.iter_mut().find(|p| p.name == name) {
            process.ctx.emit_open_file(path);
        }
        Ok(())
    }

    /// Deliver a message to a process inbox.
    pub fn post_message(&mut self, name: &str, message: Value) -> Result<(), ShellError> {
        match self.processes.iter_mut().find(|p| p.name == name) {
            Some(process) => {
                process.inbox.push(message);
                Ok(())
            }
            None => {
                tracing::error!(app = %name, "app not opened");
                Err(ShellError::NotRunning {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Drain a process inbox, oldest first.
    pub fn take_messages(&mut self, name: &str) -> Vec<Value> {
        self.processes
            .iter_mut()
            .find(|p| p.name == name)
            .map(|p| std::mem::take(&mut p.inbox))
            .unwrap_or_default()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn process(&self, name: &str) -> Option<&ProcessState> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn process_mut(&mut self, name: &str) -> Option<&mut ProcessState> {
        self.processes.iter_mut().find(|p| p.name == name)
    }

    /// Names of live processes, start order.
    pub fn running(&self) -> Vec<String> {
        self.processes.iter().map(|p| p.name.clone()).collect()
    }

    /// The active app name, if any window of it is active.
    pub fn active_app(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Deactivate everything.
    pub fn blur(&mut self) {
        self.active = None;
        self.windows.borrow_mut().blur_all();
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AppRegistry {
        &mut self.registry
    }

    pub fn windows(&self) -> &Rc<RefCell<WindowManager>> {
        &self.windows
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn persist(&self) -> Result<(), ShellError> {
        self.remote.set(CACHE_KEY, &self.cache)?;
        Ok(())
    }

    /// Assign ordinals to newly created windows and subscribe to their
    /// events.
    fn sync_windows(&mut self, name: &str) {
        let Some(idx) = self.processes.iter().position(|p| p.name == name) else {
            return;
        };
        let new_ids: Vec<WindowId> = {
            let process = &self.processes[idx];
            process
                .ctx
                .window_ids()
                .iter()
                .copied()
                .filter(|id| !process.ordinals.iter().any(|(w, _)| w == id))
                .collect()
        };
        for id in new_ids {
            {
                let process = &mut self.processes[idx];
                let ordinal = process.next_ordinal;
                process.next_ordinal += 1;
                process.ordinals.push((id, ordinal));
            }
            self.wire_window(name, id);
        }
    }

    fn wire_window(&mut self, name: &str, id: WindowId) {
        let mut wm = self.windows.borrow_mut();

        let dirty = self.geometry_dirty.clone();
        wm.on_window_move(id, move |_, _| dirty.set(true));
        let dirty = self.geometry_dirty.clone();
        wm.on_window_resize(id, move |_, _| dirty.set(true));

        let events = self.events.clone();
        let app = name.to_string();
        wm.on_before_close(id, move || {
            events.borrow_mut().push(ProcEvent::BeforeClose(app.clone()));
        });
        let events = self.events.clone();
        let app = name.to_string();
        wm.on_window_minimize(id, move || {
            events.borrow_mut().push(ProcEvent::Minimized(app.clone()));
        });
        let events = self.events.clone();
        let app = name.to_string();
        wm.on_activate(id, move || {
            events.borrow_mut().push(ProcEvent::Activated(app.clone()));
        });
    }

    /// Replay persisted geometry onto a fresh process, or record the
    /// initial geometry when none is persisted yet.
    fn restore_or_record_geometry(&mut self, name: &str) {
        let Some(process) = self.processes.iter().find(|p| p.name == name) else {
            return;
        };
        let entries = process.ordinals.clone();
        let record = self.cache.entry(name.to_string()).or_default();
        let mut wm = self.windows.borrow_mut();
        for (id, ordinal) in entries {
            let key = window_key(ordinal);
            match record.windows_info.get(&key) {
                Some(win) => {
                    wm.set_pos(id, win.position.x, win.position.y);
                    wm.set_size(id, win.size.w, win.size.h);
                }
                None => {
                    if let (Some(pos), Some(size)) = (wm.get_pos(id), wm.get_size(id)) {
                        record.windows_info.insert(
                            key,
                            WindowRecord {
                                size: SizeRecord {
                                    w: size.width,
                                    h: size.height,
                                },
                                position: PositionRecord { x: pos.x, y: pos.y },
                            },
                        );
                    }
                }
            }
        }
    }

    /// Copy current geometry of every live window into the cache.
    fn snapshot_geometry(&mut self) {
        let wm = self.windows.borrow();
        for process in &self.processes {
            let Some(record) = self.cache.get_mut(&process.name) else {
                continue;
            };
            for (id, ordinal) in &process.ordinals {
                if let (Some(pos), Some(size)) = (wm.get_pos(*id), wm.get_size(*id)) {
                    record.windows_info.insert(
                        window_key(*ordinal),
                        WindowRecord {
                            size: SizeRecord {
                                w: size.width,
                                h: size.height,
                            },
                            position: PositionRecord { x: pos.x, y: pos.y },
                        },
                    );
                }
            }
        }
    }
}

/// Trailing extension of a path; `None` for dotfiles and extension-less
/// names.
fn file_ext(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ext() {
        assert_eq!(file_ext("/docs/report.pdf"), Some("pdf"));
        assert_eq!(file_ext("archive.tar.gz"), Some("gz"));
        assert_eq!(file_ext("/etc/hosts"), None);
        assert_eq!(file_ext("/home/.bashrc"), None);
    }
}
