//! Persisted process and window records.
//!
//! The whole table lives under one key in the `processManager` collection
//! and is rewritten as a unit; window geometry is keyed by the per-process
//! creation ordinal (`"w0"`, `"w1"`, …) so it replays across reloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Collection holding the process table.
pub const PROCESS_COLLECTION: &str = "processManager";

/// Key of the persisted table.
pub const CACHE_KEY: &str = "cacheProcessState";

/// Persisted table: one record per application name.
pub type ProcessCache = BTreeMap<String, ProcessRecord>;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    /// Resume this app on the next boot
    pub is_running: bool,
    /// Restore straight into the dock
    pub is_minimized: bool,
    /// Window geometry by creation ordinal
    #[serde(default)]
    pub windows_info: BTreeMap<String, WindowRecord>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WindowRecord {
    pub size: SizeRecord,
    pub position: PositionRecord,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SizeRecord {
    pub w: f32,
    pub h: f32,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionRecord {
    pub x: f32,
    pub y: f32,
}

/// Key for a window's record inside `windows_info`.
pub fn window_key(ordinal: usize) -> String {
    format!("w{ordinal}")
}
