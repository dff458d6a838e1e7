//! Per-window event subscriber lists.
//!
//! Subscribers are plain boxed callbacks keyed by subscription id; the
//! manager moves a list out of the window for the duration of a dispatch so
//! callbacks may subscribe or unsubscribe while running.

use super::SubscriptionId;

pub(crate) type GeometryCallback = Box<dyn FnMut(f32, f32)>;
pub(crate) type UnitCallback = Box<dyn FnMut()>;

/// Subscriber lists for one window.
#[derive(Default)]
pub(crate) struct WindowEvents {
    pub on_move: Vec<(SubscriptionId, GeometryCallback)>,
    pub on_resize: Vec<(SubscriptionId, GeometryCallback)>,
    pub on_before_close: Vec<(SubscriptionId, UnitCallback)>,
    pub on_minimize: Vec<(SubscriptionId, UnitCallback)>,
    pub on_activate: Vec<(SubscriptionId, UnitCallback)>,
}

impl WindowEvents {
    /// Remove a subscription from whichever list holds it.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.len();
        self.on_move.retain(|(sid, _)| *sid != id);
        self.on_resize.retain(|(sid, _)| *sid != id);
        self.on_before_close.retain(|(sid, _)| *sid != id);
        self.on_minimize.retain(|(sid, _)| *sid != id);
        self.on_activate.retain(|(sid, _)| *sid != id);
        self.len() != before
    }

    fn len(&self) -> usize {
        self.on_move.len()
            + self.on_resize.len()
            + self.on_before_close.len()
            + self.on_minimize.len()
            + self.on_activate.len()
    }
}
