//! Window arena entry.

use crate::math::{Rect, Size, Vec2};

use super::events::WindowEvents;
use super::WindowId;

/// One on-screen surface owned by a process.
pub struct Window {
    /// Window id (arena key)
    pub id: WindowId,
    /// Owning application name
    pub app_name: String,
    /// Title shown in the title bar
    pub title: String,
    /// Top-left position
    pub position: Vec2,
    /// Current size
    pub size: Size,
    /// Minimum size enforced on every resize
    pub min_size: Size,
    /// Whether the window is shown (close fades this off first)
    pub visible: bool,
    /// Whether this is the active (topmost, focused) window
    pub active: bool,
    /// Whether the window is minimized to the dock
    pub minimized: bool,
    /// Whether the title bar is shown
    pub title_bar_visible: bool,
    /// Content background disabled (transparent apps)
    pub no_background: bool,
    /// Pointer events enabled on the content area (off while dragging)
    pub content_pointer_events: bool,
    /// Forced fullscreen: no move/resize, tracks the viewport
    pub force_fullscreen: bool,
    /// Rect to restore when leaving fullscreen
    pub saved_rect: Rect,
    /// Before-close already dispatched; guards double close
    pub(crate) closing: bool,
    /// When set, the arena entry is removed once `pump` passes this time
    pub(crate) remove_at_ms: Option<f64>,
    /// Event subscriber lists
    pub(crate) events: WindowEvents,
}

impl Window {
    /// Current bounding rect.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    /// Whether close has started on this window.
    #[inline]
    pub fn is_closing(&self) -> bool {
        self.closing
    }
}
