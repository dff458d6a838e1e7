//! Application model for the Aero shell
//!
//! Three pieces live here: the [`AppDefinition`] lifecycle surface every
//! application module exports, the sandboxed module loader that turns script
//! sources into definitions through host capability traits, and the
//! [`AppRegistry`] that downloads, installs, and indexes them (extension
//! routing, system hooks, third-party installs).
//!
//! The crate never touches a real document or network: those concerns sit
//! behind [`sandbox::HostSurface`], [`ScriptEngine`], and [`ScriptFetcher`],
//! which the host implements. [`NativeEngine`] and the in-memory surface
//! make the whole runtime exercisable in native tests.

pub mod app;
pub mod context;
pub mod error;
pub mod hook;
pub mod loader;
pub mod menu;
pub mod registry;
pub mod sandbox;

pub use app::{AppDefinition, AppInfo};
pub use context::{AppContext, InstallContext, ShellRequest, ShellRequestQueue};
pub use error::{LoadError, RegistryError};
pub use hook::{GlobalSearchHandler, SearchResult, SystemHook, SystemHooks};
pub use loader::{
    load_module, ModuleTable, NativeEngine, NativeFetcher, ScriptEngine, ScriptError,
    ScriptFetcher, ScriptSource,
};
pub use menu::{AppMenu, AppMenuManager};
pub use registry::{AppRegistry, InstalledApp, ThirdPartyApp, BUILTIN_APPS};
