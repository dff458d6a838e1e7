//! App registry: download, install, and index application modules.

use std::cell::RefCell;
use std::rc::Rc;

use aero_store::{Collection, Store};
use serde::{Deserialize, Serialize};

use crate::app::{AppDefinition, AppInfo};
use crate::context::{InstallContext, ShellRequestQueue};
use crate::error::{LoadError, RegistryError};
use crate::hook::SystemHooks;
use crate::loader::{load_module, ModuleTable, ScriptEngine, ScriptFetcher, ScriptSource};
use crate::sandbox::{ConsoleSink, HostSurface};

/// Built-in catalog; scripts are served from `/apps/<name>.js`.
pub const BUILTIN_APPS: &[&str] = &[
    "app-center",
    "book-reader",
    "files",
    "image",
    "paint",
    "pdf-viewer",
    "setting",
    "text-editor",
    "video-player",
];

/// Store key for the persisted third-party list.
const THIRDPARTY_KEY: &str = "thirdparty_apps";

/// Third-party install record, persisted in the `appManager` collection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThirdPartyApp {
    pub name: String,
    pub src: String,
}

/// One installed application.
///
/// The definition is `None` while lent out via [`AppRegistry::take`].
pub struct InstalledApp {
    pub name: String,
    pub info: AppInfo,
    definition: Option<Box<dyn AppDefinition>>,
}

type InstalledCallback = Box<dyn FnMut(Option<&str>)>;

/// Registry of every installed application.
pub struct AppRegistry {
    apps: Vec<InstalledApp>,
    third_party: Vec<ThirdPartyApp>,
    downloads: std::collections::HashMap<String, ScriptSource>,
    table: ModuleTable,
    engine: Box<dyn ScriptEngine>,
    fetcher: Box<dyn ScriptFetcher>,
    host: Rc<RefCell<dyn HostSurface>>,
    sink: Rc<RefCell<dyn ConsoleSink>>,
    remote: Collection,
    hooks: SystemHooks,
    requests: ShellRequestQueue,
    installed_subscribers: Vec<InstalledCallback>,
    ready: bool,
}

impl AppRegistry {
    pub fn new(
        store: &Store,
        engine: Box<dyn ScriptEngine>,
        fetcher: Box<dyn ScriptFetcher>,
        host: Rc<RefCell<dyn HostSurface>>,
        sink: Rc<RefCell<dyn ConsoleSink>>,
        requests: ShellRequestQueue,
    ) -> Self {
        Self {
            apps: Vec::new(),
            third_party: Vec::new(),
            downloads: std::collections::HashMap::new(),
            table: ModuleTable::new(),
            engine,
            fetcher,
            host,
            sink,
            remote: store.collection("appManager"),
            hooks: SystemHooks::new(store.collection("systemHook")),
            requests,
            installed_subscribers: Vec::new(),
            ready: false,
        }
    }

    /// Install the built-in catalog (optionally filtered to `selected`) and
    /// replay persisted third-party installs. Idempotent.
    pub fn init(&mut self, selected: Option<&[&str]>) -> Result<(), RegistryError> {
        if self.ready {
            return Ok(());
        }
        for name in BUILTIN_APPS {
            if let Some(selected) = selected {
                if !selected.contains(name) {
                    continue;
                }
            }
            let src = format!("/apps/{name}.js");
            if let Err(err) = self.download(name, &src).and_then(|_| self.install(name)) {
                tracing::warn!(app = %name, %err, "builtin app install failed");
            }
        }

        if let Some(third_party) = self.remote.get::<Vec<ThirdPartyApp>>(THIRDPARTY_KEY)? {
            self.third_party = third_party.clone();
            for app in &third_party {
                if let Err(err) = self
                    .download(&app.name, &app.src)
                    .and_then(|_| self.install(&app.name))
                {
                    tracing::warn!(app = %app.name, %err, "third-party app install failed");
                }
            }
        }

        self.ready = true;
        self.notify_installed(None);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Download a module script once; repeat calls are skipped.
    fn download(&mut self, name: &str, src: &str) -> Result<(), LoadError> {
        if self.downloads.contains_key(name) {
            tracing::debug!(app = %name, "already downloaded, skipping");
            return Ok(());
        }
        let source = self.fetcher.fetch(src)?;
        self.downloads
            .insert(name.to_string(), ScriptSource::new(source, src));
        Ok(())
    }

    /// Load a downloaded module and run its install hook.
    fn install(&mut self, name: &str) -> Result<(), LoadError> {
        if self.apps.iter().any(|app| app.name == name) {
            tracing::debug!(app = %name, "already installed, skipping");
            return Ok(());
        }
        let script = self
            .downloads
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotDownloaded {
                name: name.to_string(),
            })?;

        let mut definition = load_module(
            self.engine.as_mut(),
            &mut self.table,
            &self.host,
            &self.sink,
            &script,
            name,
        )?;
        let info = definition.app_info();

        {
            let mut ctx = InstallContext::new(&mut self.hooks, self.requests.clone());
            definition.installed(&mut ctx);
        }

        tracing::info!(app = %name, "installed");
        self.apps.push(InstalledApp {
            name: name.to_string(),
            info,
            definition: Some(definition),
        });
        Ok(())
    }

    /// Install a third-party app from a source URL.
    ///
    /// Returns `Ok(false)` when the name is already taken.
    pub fn install_app(&mut self, src: &str, name: &str) -> Result<bool, RegistryError> {
        if self.apps.iter().any(|app| app.name == name) {
            return Ok(false);
        }
        self.download(name, src)?;
        self.install(name)?;
        self.third_party.push(ThirdPartyApp {
            name: name.to_string(),
            src: src.to_string(),
        });
        self.remote.set(THIRDPARTY_KEY, &self.third_party)?;
        self.notify_installed(Some(name));
        Ok(true)
    }

    /// Remove a third-party app. Built-ins cannot be uninstalled.
    pub fn uninstall_app(&mut self, name: &str) -> Result<bool, RegistryError> {
        let Some(idx) = self.third_party.iter().position(|app| app.name == name) else {
            return Ok(false);
        };
        self.third_party.remove(idx);
        self.remote.set(THIRDPARTY_KEY, &self.third_party)?;

        if let Some(app_idx) = self.apps.iter().position(|app| app.name == name) {
            let mut app = self.apps.remove(app_idx);
            if let Some(def) = app.definition.as_mut() {
                def.before_uninstall();
            }
            self.hooks.global_search.unregister_app(name);
        }
        self.downloads.remove(name);
        self.notify_installed(None);
        Ok(true)
    }

    /// Metadata of an installed app.
    pub fn get(&self, name: &str) -> Option<&InstalledApp> {
        self.apps.iter().find(|app| app.name == name)
    }

    /// Lend the definition out for a lifecycle hook; pair with
    /// [`AppRegistry::put_back`].
    pub fn take(&mut self, name: &str) -> Option<Box<dyn AppDefinition>> {
        self.apps
            .iter_mut()
            .find(|app| app.name == name)
            .and_then(|app| app.definition.take())
    }

    /// Return a definition lent out by [`AppRegistry::take`].
    pub fn put_back(&mut self, name: &str, definition: Box<dyn AppDefinition>) {
        if let Some(app) = self.apps.iter_mut().find(|app| app.name == name) {
            app.definition = Some(definition);
        }
    }

    /// Names of apps supporting a file extension; the leading dot is
    /// ignored on both sides.
    pub fn supported_apps_by_ext(&self, ext: &str) -> Vec<String> {
        fn normalize(ext: &str) -> &str {
            ext.trim_start_matches('.')
        }
        self.apps
            .iter()
            .filter(|app| {
                app.info
                    .support_exts
                    .iter()
                    .any(|e| normalize(e) == normalize(ext))
            })
            .map(|app| app.name.clone())
            .collect()
    }

    /// Every installed app name, install order.
    pub fn all(&self) -> Vec<String> {
        self.apps.iter().map(|app| app.name.clone()).collect()
    }

    /// The third-party install records.
    pub fn third_party(&self) -> &[ThirdPartyApp] {
        &self.third_party
    }

    /// System hook surface.
    pub fn hooks_mut(&mut self) -> &mut SystemHooks {
        &mut self.hooks
    }

    /// Subscribe to install/uninstall changes; `Some(name)` for a single
    /// third-party install, `None` for bulk changes.
    pub fn on_app_installed(&mut self, cb: impl FnMut(Option<&str>) + 'static) {
        self.installed_subscribers.push(Box::new(cb));
    }

    fn notify_installed(&mut self, name: Option<&str>) {
        let mut cbs = std::mem::take(&mut self.installed_subscribers);
        for cb in cbs.iter_mut() {
            cb(name);
        }
        cbs.append(&mut self.installed_subscribers);
        self.installed_subscribers = cbs;
    }
}

#[cfg(test)]
mod tests {
    use aero_store::MemoryBackend;

    use super::*;
    use crate::context::AppContext;
    use crate::loader::{NativeEngine, NativeFetcher};
    use crate::sandbox::{BufferSink, MemorySurface};

    struct Echo {
        info: AppInfo,
    }

    impl AppDefinition for Echo {
        fn app_info(&self) -> AppInfo {
            self.info.clone()
        }

        fn start(&mut self, _ctx: &mut AppContext) {}

        fn exit(&mut self, _ctx: &mut AppContext) {}
    }

    fn registry_with(engine: NativeEngine) -> (AppRegistry, Store) {
        let store = Store::new(Box::new(MemoryBackend::new()));
        let registry = AppRegistry::new(
            &store,
            Box::new(engine),
            Box::new(NativeFetcher::new()),
            Rc::new(RefCell::new(MemorySurface::new())),
            Rc::new(RefCell::new(BufferSink::default())),
            ShellRequestQueue::new(),
        );
        (registry, store)
    }

    fn echo(name: &str, exts: &[&str]) -> impl Fn() -> Box<dyn AppDefinition> {
        let info = AppInfo {
            support_exts: exts.iter().map(|e| e.to_string()).collect(),
            ..AppInfo::new(name)
        };
        move || {
            Box::new(Echo {
                info: info.clone(),
            })
        }
    }

    #[test]
    fn test_init_installs_selected_builtins_only() {
        let mut engine = NativeEngine::new();
        engine.register("files", echo("files", &[]));
        engine.register("paint", echo("paint", &["png"]));
        let (mut registry, _store) = registry_with(engine);

        registry.init(Some(&["files"])).unwrap();
        assert_eq!(registry.all(), vec!["files".to_string()]);
        assert!(registry.get("paint").is_none());
    }

    #[test]
    fn test_failed_module_is_absent() {
        // "files" has no native module registered: the load fails and the
        // registry must not list it.
        let (mut registry, _store) = registry_with(NativeEngine::new());
        registry.init(Some(&["files"])).unwrap();
        assert!(registry.get("files").is_none());
        assert!(registry.all().is_empty());
    }

    #[test]
    fn test_ext_lookup_ignores_leading_dot() {
        let mut engine = NativeEngine::new();
        engine.register("pdf-viewer", echo("pdf-viewer", &[".pdf"]));
        engine.register("paint", echo("paint", &["png"]));
        let (mut registry, _store) = registry_with(engine);
        registry.init(Some(&["pdf-viewer", "paint"])).unwrap();

        assert_eq!(
            registry.supported_apps_by_ext("pdf"),
            registry.supported_apps_by_ext(".pdf")
        );
        assert_eq!(registry.supported_apps_by_ext(".png"), vec!["paint"]);
        assert!(registry.supported_apps_by_ext("exe").is_empty());
    }

    #[test]
    fn test_third_party_install_persists_and_replays() {
        let mut engine = NativeEngine::new();
        engine.register("weather", echo("weather", &[]));
        let (mut registry, store) = registry_with(engine);
        registry.init(Some(&[])).unwrap();

        assert!(registry
            .install_app("https://example.com/weather.js", "weather")
            .unwrap());
        // Second install of the same name is refused.
        assert!(!registry
            .install_app("https://example.com/weather.js", "weather")
            .unwrap());

        let persisted: Vec<ThirdPartyApp> = store
            .collection("appManager")
            .get(THIRDPARTY_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(persisted[0].src, "https://example.com/weather.js");

        // A fresh registry over the same store replays the install.
        let mut engine = NativeEngine::new();
        engine.register("weather", echo("weather", &[]));
        let mut replay = AppRegistry::new(
            &store,
            Box::new(engine),
            Box::new(NativeFetcher::new()),
            Rc::new(RefCell::new(MemorySurface::new())),
            Rc::new(RefCell::new(BufferSink::default())),
            ShellRequestQueue::new(),
        );
        replay.init(Some(&[])).unwrap();
        assert!(replay.get("weather").is_some());
    }

    #[test]
    fn test_uninstall_only_removes_third_party() {
        let mut engine = NativeEngine::new();
        engine.register("files", echo("files", &[]));
        engine.register("weather", echo("weather", &[]));
        let (mut registry, _store) = registry_with(engine);
        registry.init(Some(&["files"])).unwrap();
        registry
            .install_app("https://example.com/weather.js", "weather")
            .unwrap();

        assert!(!registry.uninstall_app("files").unwrap());
        assert!(registry.uninstall_app("weather").unwrap());
        assert!(registry.get("weather").is_none());
        assert!(registry.get("files").is_some());
    }

    #[test]
    fn test_take_and_put_back() {
        let mut engine = NativeEngine::new();
        engine.register("files", echo("files", &[]));
        let (mut registry, _store) = registry_with(engine);
        registry.init(Some(&["files"])).unwrap();

        let def = registry.take("files").unwrap();
        // Lent out: a second take yields nothing.
        assert!(registry.take("files").is_none());
        registry.put_back("files", def);
        assert!(registry.take("files").is_some());
    }

    #[test]
    fn test_on_app_installed_notification() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut engine = NativeEngine::new();
        engine.register("weather", echo("weather", &[]));
        let (mut registry, _store) = registry_with(engine);

        let events = Rc::new(RefCell::new(Vec::new()));
        let events_cb = events.clone();
        registry.on_app_installed(move |name| {
            events_cb.borrow_mut().push(name.map(str::to_string));
        });

        registry.init(Some(&[])).unwrap();
        registry
            .install_app("https://example.com/weather.js", "weather")
            .unwrap();
        assert_eq!(
            *events.borrow(),
            vec![None, Some("weather".to_string())]
        );
    }
}
