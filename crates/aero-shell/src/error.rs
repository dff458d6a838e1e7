//! Shell error type.

use aero_apps::RegistryError;
use aero_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// Start was requested for an app the registry does not know.
    #[error("app not installed: {name}")]
    AppNotInstalled { name: String },

    /// The operation targets an app with no live process.
    #[error("app not opened: {name}")]
    NotRunning { name: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ShellError {
    pub fn is_not_installed(&self) -> bool {
        matches!(self, ShellError::AppNotInstalled { .. })
    }
}
