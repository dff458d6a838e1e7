//! Drag state for move and resize operations

use crate::math::{Size, Vec2};
use crate::window::{ResizeMask, WindowId};

/// Current drag operation state
#[derive(Clone, Debug)]
pub enum DragState {
    /// Moving a window by its title bar
    MoveWindow {
        /// Window being moved
        window_id: WindowId,
        /// Window position at start
        start_pos: Vec2,
        /// Cursor position at start
        start_cursor: Vec2,
    },
    /// Resizing a window by an edge or corner handle
    ResizeWindow {
        /// Window being resized
        window_id: WindowId,
        /// Direction mask of the grabbed handle
        mask: ResizeMask,
        /// Window position at start
        start_pos: Vec2,
        /// Window size at start
        start_size: Size,
        /// Cursor position at start
        start_cursor: Vec2,
    },
}

impl DragState {
    /// Check if this is a window move operation
    #[inline]
    pub fn is_move(&self) -> bool {
        matches!(self, DragState::MoveWindow { .. })
    }

    /// Check if this is a window resize operation
    #[inline]
    pub fn is_resize(&self) -> bool {
        matches!(self, DragState::ResizeWindow { .. })
    }

    /// The window being dragged
    pub fn window_id(&self) -> WindowId {
        match self {
            DragState::MoveWindow { window_id, .. } => *window_id,
            DragState::ResizeWindow { window_id, .. } => *window_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_window_state() {
        let state = DragState::MoveWindow {
            window_id: 42,
            start_pos: Vec2::new(100.0, 100.0),
            start_cursor: Vec2::new(110.0, 108.0),
        };

        assert!(state.is_move());
        assert!(!state.is_resize());
        assert_eq!(state.window_id(), 42);
    }

    #[test]
    fn test_resize_window_state() {
        let state = DragState::ResizeWindow {
            window_id: 7,
            mask: ResizeMask::SE,
            start_pos: Vec2::new(100.0, 100.0),
            start_size: Size::new(800.0, 600.0),
            start_cursor: Vec2::new(900.0, 700.0),
        };

        assert!(state.is_resize());
        assert_eq!(state.window_id(), 7);
    }
}
