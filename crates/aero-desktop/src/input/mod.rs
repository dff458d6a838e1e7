//! Input state for drag operations.

mod drag;

pub use drag::DragState;
