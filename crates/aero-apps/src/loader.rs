//! Sandboxed module loader.
//!
//! A module is a script executed against one [`SandboxEnv`]. The loader
//! registers an exports slot, hands source and environment to the script
//! engine, then reads the slot back. A throwing execution is reported
//! through the scoped console and otherwise ignored; missing exports fail
//! the install.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::app::AppDefinition;
use crate::error::LoadError;
use crate::sandbox::{
    ConsoleSink, DocumentSurface, ExportSlot, HostSurface, SandboxEnv, ScopedConsole,
};

/// Script text plus the URL it was fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptSource {
    pub source: String,
    pub origin_url: String,
}

impl ScriptSource {
    pub fn new(source: impl Into<String>, origin_url: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin_url: origin_url.into(),
        }
    }
}

/// Synchronous failure raised by a script execution.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ScriptError(pub String);

/// Host seam that actually runs module source.
pub trait ScriptEngine {
    /// Execute `script` against `env`. Exports land in the environment's
    /// slot; a returned error means the script threw synchronously.
    fn execute(&mut self, script: &ScriptSource, env: &mut SandboxEnv) -> Result<(), ScriptError>;
}

/// Host seam that downloads module source by URL.
pub trait ScriptFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, LoadError>;
}

/// Exports slots keyed by module name.
#[derive(Default)]
pub struct ModuleTable {
    slots: HashMap<String, ExportSlot>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh empty slot, replacing any previous one.
    pub(crate) fn register(&mut self, name: &str) -> ExportSlot {
        let slot: ExportSlot = Rc::new(RefCell::new(None));
        self.slots.insert(name.to_string(), slot.clone());
        slot
    }

    /// Move the exports out of a slot.
    pub(crate) fn take(&mut self, name: &str) -> Option<Box<dyn AppDefinition>> {
        self.slots.get(name).and_then(|slot| slot.borrow_mut().take())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}

/// Load one module: execute in a private scope, validate exports, and
/// re-execute passthrough when the app opts out of the sandbox.
pub fn load_module(
    engine: &mut dyn ScriptEngine,
    table: &mut ModuleTable,
    host: &Rc<RefCell<dyn HostSurface>>,
    sink: &Rc<RefCell<dyn ConsoleSink>>,
    script: &ScriptSource,
    name: &str,
) -> Result<Box<dyn AppDefinition>, LoadError> {
    let app = execute_once(engine, table, host, sink, script, name, true)?;

    if app.app_info().no_sandbox {
        // Opt-out: run again against the live document. The first run's
        // side effects stay in its discarded private scope.
        return execute_once(engine, table, host, sink, script, name, false);
    }
    Ok(app)
}

fn execute_once(
    engine: &mut dyn ScriptEngine,
    table: &mut ModuleTable,
    host: &Rc<RefCell<dyn HostSurface>>,
    sink: &Rc<RefCell<dyn ConsoleSink>>,
    script: &ScriptSource,
    name: &str,
    sandboxed: bool,
) -> Result<Box<dyn AppDefinition>, LoadError> {
    let slot = table.register(name);
    let document = if sandboxed {
        DocumentSurface::sandboxed(host.clone())
    } else {
        DocumentSurface::passthrough(host.clone())
    };
    let console = ScopedConsole::new(name, sink.clone());
    let mut env = SandboxEnv::new(name, document, console, slot);

    if let Err(err) = engine.execute(script, &mut env) {
        env.console.error(&format!("error occurs in {name}: {err}"));
    }

    table.take(name).ok_or_else(|| LoadError::InstallFailed {
        name: name.to_string(),
    })
}

/// Engine for native builds and tests: module name to factory.
#[derive(Default)]
pub struct NativeEngine {
    modules: HashMap<String, Box<dyn Fn() -> Box<dyn AppDefinition>>>,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a module name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn AppDefinition> + 'static,
    {
        self.modules.insert(name.into(), Box::new(factory));
    }
}

impl ScriptEngine for NativeEngine {
    fn execute(&mut self, _script: &ScriptSource, env: &mut SandboxEnv) -> Result<(), ScriptError> {
        match self.modules.get(env.name()) {
            Some(factory) => {
                env.set_exports(factory());
                Ok(())
            }
            None => Err(ScriptError(format!("unknown module `{}`", env.name()))),
        }
    }
}

/// Fetcher for native builds and tests: URL to canned script text.
#[derive(Default)]
pub struct NativeFetcher {
    scripts: HashMap<String, String>,
}

impl NativeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, url: impl Into<String>, source: impl Into<String>) {
        self.scripts.insert(url.into(), source.into());
    }
}

impl ScriptFetcher for NativeFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, LoadError> {
        // Native modules are resolved by name, so an unknown URL still
        // yields empty source rather than a failed download.
        Ok(self.scripts.get(url).cloned().unwrap_or_default())
    }
}
