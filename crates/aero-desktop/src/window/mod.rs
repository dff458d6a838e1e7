//! Window management module
//!
//! Provides the window arena, lifecycle, drag/resize handling, and
//! per-window event subscriptions.

#[allow(clippy::module_inception)]
mod window;
mod config;
mod events;
mod manager;
mod resize;

pub use config::WindowConfig;
pub use manager::{NewWindowSpec, WindowManager};
pub use resize::ResizeMask;
pub use window::Window;

/// Unique window identifier
pub type WindowId = u64;

/// Identifies one event subscription for later removal
pub type SubscriptionId = u64;
