//! Window management for the Aero shell
//!
//! This crate owns everything on-screen geometry: an arena of windows keyed
//! by [`WindowId`], drag/resize state, fullscreen modes, minimize/close
//! lifecycle, per-window event subscriptions, and the z-order registry that
//! keeps stacking ranks a dense `1..N` permutation.
//!
//! Rendering is the host's job. The manager holds authoritative geometry and
//! flags; the host reads them back (and the subscription lists tell
//! interested parties about every change with final, already-clamped
//! values).

pub mod input;
pub mod launch_url;
pub mod math;
pub mod window;
pub mod zorder;

pub use window::{
    Window, WindowConfig, WindowId, WindowManager, NewWindowSpec, ResizeMask, SubscriptionId,
};
pub use zorder::ZOrderRegistry;

/// Height of the title bar, in CSS pixels.
pub const TITLE_BAR_HEIGHT: f32 = 22.0;

/// Top inset below which a title bar must stay reachable.
pub const TOP_INSET: f32 = 25.0;

/// Margin kept visible when a window is pushed past a side edge.
pub const EDGE_MARGIN: f32 = 20.0;

/// Height of the dock strip when minimized apps are shown.
pub const DOCK_HEIGHT: f32 = 25.0;

/// Delay between hiding a closed window and removing it, in milliseconds.
pub const CLOSE_FADE_MS: f64 = 400.0;
