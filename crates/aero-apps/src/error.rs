//! Error types for module loading and the app registry.

use aero_store::StoreError;
use thiserror::Error;

/// Failure while downloading or loading an application module.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The script could not be fetched from its source URL.
    #[error("failed to fetch `{url}`: {reason}")]
    Fetch { url: String, reason: String },

    /// Install was requested before the script was downloaded.
    #[error("app `{name}` is not downloaded")]
    NotDownloaded { name: String },

    /// The executed module did not export the application surface.
    #[error("install app [{name}] error")]
    InstallFailed { name: String },
}

impl LoadError {
    pub fn is_install_failed(&self) -> bool {
        matches!(self, LoadError::InstallFailed { .. })
    }
}

/// Failure in a registry operation.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The named app is not in the registry.
    #[error("app `{name}` is not installed")]
    NotInstalled { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn is_not_installed(&self) -> bool {
        matches!(self, RegistryError::NotInstalled { .. })
    }
}
