//! End-to-end shell behavior over the in-memory backend and native engine.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use aero_apps::sandbox::{BufferSink, MemorySurface};
use aero_apps::{
    AppContext, AppDefinition, AppInfo, AppRegistry, NativeEngine, NativeFetcher,
    ShellRequestQueue,
};
use aero_desktop::math::Size;
use aero_desktop::{WindowManager, CLOSE_FADE_MS};
use aero_shell::{Phase, ProcessManager, StartOptions, CACHE_KEY, PROCESS_COLLECTION};
use aero_store::{MemoryBackend, Store};

#[derive(Clone, Default)]
struct Handles {
    starts: Rc<Cell<u32>>,
    exits: Rc<Cell<u32>>,
    opened: Rc<RefCell<Vec<String>>>,
}

struct Probe {
    info: AppInfo,
    handles: Handles,
}

impl AppDefinition for Probe {
    fn app_info(&self) -> AppInfo {
        self.info.clone()
    }

    fn start(&mut self, ctx: &mut AppContext) {
        self.handles.starts.set(self.handles.starts.get() + 1);
        let opened = self.handles.opened.clone();
        ctx.on_open_file(move |file| opened.borrow_mut().push(file.to_string()));
    }

    fn exit(&mut self, _ctx: &mut AppContext) {
        self.handles.exits.set(self.handles.exits.get() + 1);
    }
}

fn register_probe(engine: &mut NativeEngine, name: &str, exts: &[&str], handles: &Handles) {
    let info = AppInfo {
        support_exts: exts.iter().map(|e| e.to_string()).collect(),
        ..AppInfo::new(name)
    };
    let handles = handles.clone();
    engine.register(name, move || {
        Box::new(Probe {
            info: info.clone(),
            handles: handles.clone(),
        })
    });
}

fn manager(store: &Store, engine: NativeEngine) -> ProcessManager {
    let requests = ShellRequestQueue::new();
    let registry = AppRegistry::new(
        store,
        Box::new(engine),
        Box::new(NativeFetcher::new()),
        Rc::new(RefCell::new(MemorySurface::new())),
        Rc::new(RefCell::new(BufferSink::default())),
        requests.clone(),
    );
    let windows = Rc::new(RefCell::new(WindowManager::new()));
    windows.borrow_mut().set_viewport(Size::new(1280.0, 800.0));
    ProcessManager::new(store, registry, windows, requests)
}

#[test]
fn test_double_start_yields_one_process() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();

    pm.start_app("files", StartOptions::default()).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();

    assert_eq!(pm.running(), vec!["files".to_string()]);
    // Both starts reached the app, on the same process.
    assert_eq!(handles.starts.get(), 2);
    assert_eq!(pm.windows().borrow().count(), 1);
    assert_eq!(pm.active_app(), Some("files"));
}

#[test]
fn test_start_unknown_app_is_refused() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let mut pm = manager(&store, NativeEngine::new());
    pm.boot(None).unwrap();

    let err = pm.start_app("ghost", StartOptions::default()).unwrap_err();
    assert!(err.is_not_installed());
    assert!(pm.running().is_empty());
}

#[test]
fn test_persist_reboot_resume_restores_geometry() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();

    let main = pm.process("files").unwrap().main_window();
    {
        let mut wm = pm.windows().borrow_mut();
        wm.set_pos(main, 10.0, 20.0);
        wm.set_size(main, 640.0, 480.0);
    }
    pm.pump(16.0);

    // Fresh shell over the same store.
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();

    let process = pm.process("files").expect("files resumed");
    assert!(process.ctx().resume);
    let main = process.main_window();
    let wm = pm.windows().borrow();
    let pos = wm.get_pos(main).unwrap();
    let size = wm.get_size(main).unwrap();
    assert_eq!((size.width, size.height), (640.0, 480.0));
    assert_eq!((pos.x, pos.y), (10.0, 20.0));
}

#[test]
fn test_closed_app_is_not_resumed() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();

    pm.close("files", 1000.0).unwrap();
    assert_eq!(handles.exits.get(), 1);
    assert_eq!(pm.process("files").unwrap().phase(), Phase::Closing);

    // The process lingers until the window fade-out elapses.
    pm.pump(1100.0);
    assert!(pm.process("files").is_some());
    pm.pump(1000.0 + CLOSE_FADE_MS);
    assert!(pm.process("files").is_none());

    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();
    assert!(pm.running().is_empty());
    assert_eq!(handles.starts.get(), 0);
}

#[test]
fn test_restart_during_close_fade_spawns_fresh_process() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();

    pm.close("files", 1000.0).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();
    assert_eq!(handles.starts.get(), 2);
    assert_eq!(pm.process("files").unwrap().phase(), Phase::Running);

    // The old window's fade elapsing must not take the relaunch with it.
    pm.pump(1000.0 + CLOSE_FADE_MS);
    let process = pm.process("files").expect("relaunched process survives the fade");
    assert_eq!(process.phase(), Phase::Running);
    assert_eq!(pm.running(), vec!["files".to_string()]);
    assert_eq!(pm.windows().borrow().count(), 1);
}

#[test]
fn test_open_file_routes_by_extension() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let pdf = Handles::default();
    let paint = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "pdf-viewer", &[".pdf"], &pdf);
    register_probe(&mut engine, "paint", &["png"], &paint);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();

    assert!(pm.open_file("/docs/report.pdf").unwrap());
    assert_eq!(pm.running(), vec!["pdf-viewer".to_string()]);
    assert_eq!(*pdf.opened.borrow(), vec!["/docs/report.pdf".to_string()]);
    let process = pm.process("pdf-viewer").unwrap();
    assert_eq!(
        process.ctx().params.get("file").map(String::as_str),
        Some("/docs/report.pdf")
    );

    // Unsupported extension soft-fails without starting anything.
    assert!(!pm.open_file("/bin/tool.exe").unwrap());
    assert!(!pm.open_file("/etc/hosts").unwrap());
    assert_eq!(pm.running().len(), 1);
}

#[test]
fn test_deep_link_boot_starts_single_fullscreen_app() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "paint", &[], &handles);
    register_probe(&mut engine, "files", &[], &Handles::default());
    let mut pm = manager(&store, engine);
    pm.boot(Some("#app=paint")).unwrap();

    // Only the deep-linked app was installed.
    assert_eq!(pm.registry().all(), vec!["paint".to_string()]);
    assert_eq!(pm.running(), vec!["paint".to_string()]);

    let process = pm.process("paint").unwrap();
    assert!(process.ctx().resume);
    let wm = pm.windows().borrow();
    let window = wm.window(process.main_window()).unwrap();
    assert!(window.force_fullscreen);
    assert!(!window.title_bar_visible);
}

#[test]
fn test_minimize_to_dock_and_restore() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();

    pm.minimize_app("files");
    assert_eq!(pm.dock(), &["files".to_string()]);

    let cache: aero_shell::ProcessCache = store
        .collection(PROCESS_COLLECTION)
        .get(CACHE_KEY)
        .unwrap()
        .unwrap();
    assert!(cache["files"].is_minimized);
    assert!(cache["files"].is_running);

    pm.restore_app("files");
    assert!(pm.dock().is_empty());
    assert_eq!(pm.active_app(), Some("files"));

    let cache: aero_shell::ProcessCache = store
        .collection(PROCESS_COLLECTION)
        .get(CACHE_KEY)
        .unwrap()
        .unwrap();
    assert!(!cache["files"].is_minimized);
}

#[test]
fn test_minimized_state_survives_reboot() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();
    pm.start_app("files", StartOptions::default()).unwrap();
    pm.minimize_app("files");

    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &Handles::default());
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();

    assert_eq!(pm.dock(), &["files".to_string()]);
    assert!(pm.windows().borrow().window(pm.process("files").unwrap().main_window()).unwrap().minimized);
}

#[test]
fn test_orphaned_records_are_pruned_at_boot() {
    let store = Store::new(Box::new(MemoryBackend::new()));

    // Persist a record for an app that will not be installed.
    let mut cache = aero_shell::ProcessCache::new();
    cache.insert(
        "ghost".to_string(),
        aero_shell::ProcessRecord {
            is_running: true,
            ..Default::default()
        },
    );
    store
        .collection(PROCESS_COLLECTION)
        .set(CACHE_KEY, &cache)
        .unwrap();

    let mut pm = manager(&store, NativeEngine::new());
    pm.boot(None).unwrap();

    assert!(pm.running().is_empty());
    let cache: aero_shell::ProcessCache = store
        .collection(PROCESS_COLLECTION)
        .get(CACHE_KEY)
        .unwrap()
        .unwrap();
    assert!(!cache.contains_key("ghost"));
}

#[test]
fn test_post_message_reaches_inbox() {
    let store = Store::new(Box::new(MemoryBackend::new()));
    let handles = Handles::default();
    let mut engine = NativeEngine::new();
    register_probe(&mut engine, "files", &[], &handles);
    let mut pm = manager(&store, engine);
    pm.boot(None).unwrap();

    assert!(pm
        .post_message("files", serde_json::json!({"op": "ping"}))
        .is_err());

    pm.start_app("files", StartOptions::default()).unwrap();
    pm.post_message("files", serde_json::json!({"op": "ping"}))
        .unwrap();
    let messages = pm.take_messages("files");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["op"], "ping");
    assert!(pm.take_messages("files").is_empty());
}
