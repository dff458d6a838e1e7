//! Application definition surface.

use serde::{Deserialize, Serialize};

use crate::context::{AppContext, InstallContext};

/// Static metadata an application declares about itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Application name (registry key, launch-URL fragment)
    pub name: String,
    /// Icon shown in the launcher and dock
    pub icon_url: String,
    /// Preferred main-window width
    pub width: f32,
    /// Preferred main-window height
    pub height: f32,
    /// File extensions this app can open (with or without leading dot)
    #[serde(default)]
    pub support_exts: Vec<String>,
    /// Run without the private document surface
    #[serde(default)]
    pub no_sandbox: bool,
}

impl AppInfo {
    /// Metadata with defaults for an app that opens no files.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon_url: String::new(),
            width: 700.0,
            height: 500.0,
            support_exts: Vec::new(),
            no_sandbox: false,
        }
    }
}

/// Lifecycle surface every application module must export.
///
/// `start` may be invoked again on a live process (bring-to-front with new
/// params); `installed` runs exactly once, right after the module is loaded
/// into the registry.
pub trait AppDefinition {
    /// Application metadata.
    fn app_info(&self) -> AppInfo;

    /// Start or re-enter the application.
    fn start(&mut self, ctx: &mut AppContext);

    /// Tear the application down; windows close through the shared
    /// before-close path.
    fn exit(&mut self, ctx: &mut AppContext);

    /// One-time install hook (system hooks, open-file delegates).
    fn installed(&mut self, _ctx: &mut InstallContext<'_>) {}

    /// Called before a third-party app is removed from the registry.
    fn before_uninstall(&mut self) {}
}
