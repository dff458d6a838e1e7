//! Process manager and boot sequence for the Aero shell
//!
//! This crate ties the runtime together: it resolves apps through the
//! registry, hands each process its capability context, owns the persisted
//! process/window table, and drives time-based work (window fade-outs,
//! coalesced geometry persistence, deferred app requests) from a single
//! `pump(now_ms)` tick the host calls every frame.

pub mod error;
pub mod logging;
pub mod persist;
pub mod process;

pub use error::ShellError;
pub use logging::init_logging;
pub use persist::{ProcessCache, ProcessRecord, WindowRecord, CACHE_KEY, PROCESS_COLLECTION};
pub use process::{Phase, ProcessManager, ProcessState, StartOptions};
