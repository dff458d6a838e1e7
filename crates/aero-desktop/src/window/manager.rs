//! Window manager: lifecycle, drag/resize, fullscreen, stacking.

use std::collections::HashMap;

use crate::input::DragState;
use crate::launch_url;
use crate::math::{Rect, Size, Vec2};
use crate::zorder::ZOrderRegistry;
use crate::{CLOSE_FADE_MS, DOCK_HEIGHT, EDGE_MARGIN, TOP_INSET};

use super::events::WindowEvents;
use super::{ResizeMask, SubscriptionId, Window, WindowConfig, WindowId};

/// Everything needed to reopen an application in a new browsing context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewWindowSpec {
    /// URL carrying the `#app=<name>` fragment
    pub url: String,
    /// Name for the new browsing context
    pub window_name: String,
    /// Window feature string for the host `open` call
    pub features: String,
}

/// Window manager handling the window arena, drag state, and z-order.
pub struct WindowManager {
    /// All windows by id
    windows: HashMap<WindowId, Window>,
    /// Stacking order
    zorder: ZOrderRegistry,
    /// Next window id
    next_id: WindowId,
    /// Next subscription id (shared across all windows)
    next_subscription: SubscriptionId,
    /// Current work-area size
    viewport: Size,
    /// Whether the dock strip is visible (shrinks the fullscreen area)
    dock_visible: bool,
    /// Cascade offset applied to the next auto-placed window
    cascade_offset: f32,
    /// Active drag operation, if any
    drag: Option<DragState>,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager {
    /// Create a manager with a default work area.
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            zorder: ZOrderRegistry::new(),
            next_id: 1,
            next_subscription: 1,
            viewport: Size::new(1024.0, 768.0),
            dock_visible: false,
            cascade_offset: 0.0,
            drag: None,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a window and raise it to the top of the stack.
    pub fn create_window(&mut self, config: WindowConfig) -> WindowId {
        let id = self.next_id;
        self.next_id += 1;

        let size = config
            .size
            .unwrap_or(WindowConfig::DEFAULT_SIZE)
            .max(config.min_size);
        let position = config.position.unwrap_or_else(|| {
            let pos = Vec2::new(
                (self.viewport.width - size.width) / 2.0 + self.cascade_offset,
                (self.viewport.height - size.height) / 2.0 + self.cascade_offset,
            );
            self.cascade_offset = if self.cascade_offset > 100.0 {
                0.0
            } else {
                self.cascade_offset + 10.0
            };
            pos
        });

        let window = Window {
            id,
            title: config.title,
            app_name: config.app_name,
            position,
            size,
            min_size: config.min_size,
            visible: true,
            active: false,
            minimized: false,
            title_bar_visible: config.title_bar,
            no_background: false,
            content_pointer_events: true,
            force_fullscreen: false,
            saved_rect: Rect::from_pos_size(position, size),
            closing: false,
            remove_at_ms: None,
            events: WindowEvents::default(),
        };

        self.windows.insert(id, window);
        self.zorder.raise(id);
        tracing::debug!(window = id, app = %self.windows[&id].app_name, "window created");
        id
    }

    /// Start closing a window.
    ///
    /// Before-close subscribers run synchronously, exactly once; the window
    /// is hidden immediately and its arena entry removed once `pump`
    /// advances past the fade-out delay.
    pub fn close(&mut self, id: WindowId, now_ms: f64) {
        {
            let window = match self.windows.get_mut(&id) {
                Some(w) => w,
                None => return,
            };
            if window.closing {
                return;
            }
            window.closing = true;
        }

        // Drop global drag listeners bound to this window.
        if self.drag.as_ref().map(|d| d.window_id()) == Some(id) {
            self.drag = None;
        }

        self.emit_before_close(id);

        if let Some(window) = self.windows.get_mut(&id) {
            window.visible = false;
            window.active = false;
            window.remove_at_ms = Some(now_ms + CLOSE_FADE_MS);
        }
    }

    /// Remove windows whose fade-out has elapsed. Returns the removed ids.
    pub fn pump(&mut self, now_ms: f64) -> Vec<WindowId> {
        let expired: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| matches!(w.remove_at_ms, Some(at) if at <= now_ms))
            .map(|w| w.id)
            .collect();
        for id in &expired {
            self.windows.remove(id);
            tracing::debug!(window = *id, "window removed");
        }
        if !expired.is_empty() {
            let windows = &self.windows;
            self.zorder.prune(|id| windows.contains_key(&id));
        }
        expired
    }

    // =========================================================================
    // Stacking and activation
    // =========================================================================

    /// Activate (raise) or deactivate a window.
    pub fn set_active(&mut self, id: WindowId, active: bool) {
        if !self.windows.contains_key(&id) {
            return;
        }
        if active {
            for window in self.windows.values_mut() {
                if window.id != id {
                    window.active = false;
                }
            }
            if let Some(window) = self.windows.get_mut(&id) {
                window.active = true;
            }
            self.zorder.raise(id);
            self.emit_activate(id);
        } else if let Some(window) = self.windows.get_mut(&id) {
            window.active = false;
        }
    }

    /// Deactivate every window.
    pub fn blur_all(&mut self) {
        for window in self.windows.values_mut() {
            window.active = false;
        }
    }

    /// The currently active window, if any.
    pub fn active_window(&self) -> Option<WindowId> {
        self.windows.values().find(|w| w.active).map(|w| w.id)
    }

    /// Window ids ordered bottom to top.
    pub fn windows_by_z(&self) -> Vec<WindowId> {
        self.zorder.ordered()
    }

    /// Access the z-order registry.
    pub fn zorder(&self) -> &ZOrderRegistry {
        &self.zorder
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Set window position. No-op while forced fullscreen.
    pub fn set_pos(&mut self, id: WindowId, left: f32, top: f32) {
        let changed = match self.windows.get_mut(&id) {
            Some(w) if !w.force_fullscreen => {
                w.position = Vec2::new(left, top);
                true
            }
            _ => false,
        };
        if changed {
            self.emit_move(id);
        }
    }

    /// Set window size, clamped to the minimum. No-op while forced
    /// fullscreen.
    pub fn set_size(&mut self, id: WindowId, width: f32, height: f32) {
        let changed = match self.windows.get_mut(&id) {
            Some(w) if !w.force_fullscreen => {
                w.size = Size::new(width, height).max(w.min_size);
                true
            }
            _ => false,
        };
        if changed {
            self.emit_resize(id);
        }
    }

    /// Current size.
    pub fn get_size(&self, id: WindowId) -> Option<Size> {
        self.windows.get(&id).map(|w| w.size)
    }

    /// Current position.
    pub fn get_pos(&self, id: WindowId) -> Option<Vec2> {
        self.windows.get(&id).map(|w| w.position)
    }

    /// Current bounding rect.
    pub fn get_rect(&self, id: WindowId) -> Option<Rect> {
        self.windows.get(&id).map(|w| w.rect())
    }

    /// Clamp a window back on-screen if its title bar became unreachable.
    pub fn check_pos(&mut self, id: WindowId) {
        let viewport = self.viewport;
        let moved = match self.windows.get_mut(&id) {
            Some(w) if !w.force_fullscreen => {
                let rect = w.rect();
                let mut pos = w.position;
                if rect.y < TOP_INSET {
                    pos.y = TOP_INSET;
                }
                if rect.x + rect.width < EDGE_MARGIN {
                    pos.x = EDGE_MARGIN - rect.width;
                }
                if rect.x > viewport.width - EDGE_MARGIN {
                    pos.x = viewport.width - EDGE_MARGIN;
                }
                if rect.y > viewport.height - TOP_INSET {
                    pos.y = viewport.height - TOP_INSET;
                }
                if pos != w.position {
                    w.position = pos;
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if moved {
            self.emit_move(id);
        }
    }

    /// Update the work-area size.
    ///
    /// Forced-fullscreen windows track the viewport; everything else is
    /// clamped back on-screen.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            let tracks = self
                .windows
                .get(&id)
                .map(|w| w.force_fullscreen)
                .unwrap_or(false);
            if tracks {
                if let Some(w) = self.windows.get_mut(&id) {
                    w.position = Vec2::ZERO;
                    w.size = size;
                }
                self.emit_resize(id);
            } else {
                self.check_pos(id);
            }
        }
    }

    /// Current work-area size.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Show or hide the dock strip (affects the fullscreen work area).
    pub fn set_dock_visible(&mut self, visible: bool) {
        self.dock_visible = visible;
    }

    // =========================================================================
    // Fullscreen
    // =========================================================================

    /// Toggle between the work-area rect and the saved rect.
    pub fn toggle_fullscreen(&mut self, id: WindowId) {
        let dock = if self.dock_visible { DOCK_HEIGHT } else { 0.0 };
        let target = Rect::new(
            0.0,
            TOP_INSET,
            self.viewport.width,
            self.viewport.height - TOP_INSET - dock,
        );

        let apply = match self.windows.get_mut(&id) {
            Some(w) if !w.force_fullscreen => {
                let rect = w.rect();
                let already_full = (rect.width - target.width).abs() < 0.5
                    && (rect.height - target.height).abs() < 0.5;
                let next = if already_full { w.saved_rect } else { target };
                if !already_full {
                    w.saved_rect = rect;
                }
                w.position = next.position();
                w.size = next.size();
                true
            }
            _ => false,
        };
        if apply {
            self.emit_move(id);
            self.emit_resize(id);
        }
    }

    /// Enter or leave forced fullscreen.
    ///
    /// While active the window cannot be moved or resized and follows the
    /// viewport size instead.
    pub fn force_fullscreen(&mut self, id: WindowId, fullscreen: bool) {
        let viewport = self.viewport;
        let changed = match self.windows.get_mut(&id) {
            Some(w) if w.force_fullscreen != fullscreen => {
                if fullscreen {
                    w.saved_rect = w.rect();
                    w.position = Vec2::ZERO;
                    w.size = viewport;
                } else {
                    w.position = w.saved_rect.position();
                    w.size = w.saved_rect.size();
                }
                w.force_fullscreen = fullscreen;
                true
            }
            _ => false,
        };
        if changed {
            self.emit_move(id);
            self.emit_resize(id);
        }
    }

    // =========================================================================
    // Minimize and chrome
    // =========================================================================

    /// Minimize: notifies subscribers only; hiding is the caller's job.
    pub fn minimize(&mut self, id: WindowId) {
        let changed = match self.windows.get_mut(&id) {
            Some(w) if !w.minimized => {
                w.minimized = true;
                true
            }
            _ => false,
        };
        if changed {
            self.emit_minimize(id);
        }
    }

    /// Restore a minimized window and bring it to the front.
    pub fn restore(&mut self, id: WindowId) {
        if let Some(w) = self.windows.get_mut(&id) {
            w.minimized = false;
        }
        self.set_active(id, true);
    }

    /// Set the title text.
    pub fn set_title(&mut self, id: WindowId, title: impl Into<String>) {
        if let Some(w) = self.windows.get_mut(&id) {
            w.title = title.into();
        }
    }

    /// Show or hide the title bar.
    pub fn show_title_bar(&mut self, id: WindowId, show: bool) {
        if let Some(w) = self.windows.get_mut(&id) {
            w.title_bar_visible = show;
        }
    }

    /// Show or hide the window surface.
    pub fn set_visible(&mut self, id: WindowId, visible: bool) {
        if let Some(w) = self.windows.get_mut(&id) {
            w.visible = visible;
        }
    }

    /// Make the content background transparent.
    pub fn set_no_background(&mut self, id: WindowId, no_background: bool) {
        if let Some(w) = self.windows.get_mut(&id) {
            w.no_background = no_background;
        }
    }

    /// Spec for reopening this window's app in a new browsing context.
    pub fn new_window_spec(&self, id: WindowId) -> Option<NewWindowSpec> {
        self.windows.get(&id).map(|w| NewWindowSpec {
            url: launch_url::format_app_fragment(&w.app_name),
            window_name: format!("{}_window", w.app_name),
            features: format!(
                "menubar=no,location=no,resizable=yes,scrollbars=no,status=no,width={},height={}",
                w.size.width, w.size.height
            ),
        })
    }

    // =========================================================================
    // Drag and resize
    // =========================================================================

    /// Start a title-bar drag. Content pointer events are suspended so app
    /// hover effects cannot interrupt the drag.
    pub fn begin_title_drag(&mut self, id: WindowId, cursor: Vec2) {
        let start_pos = match self.windows.get_mut(&id) {
            Some(w) if !w.force_fullscreen && !w.closing => {
                w.content_pointer_events = false;
                w.position
            }
            _ => return,
        };
        self.set_active(id, true);
        self.drag = Some(DragState::MoveWindow {
            window_id: id,
            start_pos,
            start_cursor: cursor,
        });
    }

    /// Start a resize drag on the handle described by `mask`.
    pub fn begin_resize(&mut self, id: WindowId, mask: ResizeMask, cursor: Vec2) {
        if mask.is_empty() {
            return;
        }
        let (start_pos, start_size) = match self.windows.get_mut(&id) {
            Some(w) if !w.force_fullscreen && !w.closing => {
                w.content_pointer_events = false;
                (w.position, w.size)
            }
            _ => return,
        };
        self.drag = Some(DragState::ResizeWindow {
            window_id: id,
            mask,
            start_pos,
            start_size,
            start_cursor: cursor,
        });
    }

    /// Advance the current drag to a new cursor position.
    ///
    /// Move/resize subscribers fire on every frame with final, clamped
    /// values; an axis past the minimum simply stops following the cursor.
    pub fn drag_to(&mut self, cursor: Vec2) {
        let drag = match self.drag.clone() {
            Some(d) => d,
            None => return,
        };
        match drag {
            DragState::MoveWindow {
                window_id,
                start_pos,
                start_cursor,
            } => {
                let delta = cursor - start_cursor;
                let moved = match self.windows.get_mut(&window_id) {
                    Some(w) => {
                        w.position = start_pos + delta;
                        true
                    }
                    None => false,
                };
                if moved {
                    self.emit_move(window_id);
                }
            }
            DragState::ResizeWindow {
                window_id,
                mask,
                start_pos,
                start_size,
                start_cursor,
            } => {
                let delta = cursor - start_cursor;
                let changed = match self.windows.get_mut(&window_id) {
                    Some(w) => {
                        let mut pos = start_pos;
                        let mut size = start_size;
                        if mask.has_right() {
                            let width = start_size.width + delta.x;
                            if width >= w.min_size.width {
                                size.width = width;
                            }
                        }
                        if mask.has_bottom() {
                            let height = start_size.height + delta.y;
                            if height >= w.min_size.height {
                                size.height = height;
                            }
                        }
                        if mask.has_top() {
                            let height = start_size.height - delta.y;
                            if height >= w.min_size.height {
                                size.height = height;
                                pos.y = start_pos.y + delta.y;
                            }
                        }
                        if mask.has_left() {
                            let width = start_size.width - delta.x;
                            if width >= w.min_size.width {
                                size.width = width;
                                pos.x = start_pos.x + delta.x;
                            }
                        }
                        w.position = pos;
                        w.size = size;
                        true
                    }
                    None => false,
                };
                if changed {
                    self.emit_resize(window_id);
                    self.emit_move(window_id);
                }
            }
        }
    }

    /// Finish the current drag: restore content pointer events and clamp
    /// the window back on-screen.
    pub fn end_drag(&mut self) {
        let id = match self.drag.take() {
            Some(d) => d.window_id(),
            None => return,
        };
        if let Some(w) = self.windows.get_mut(&id) {
            w.content_pointer_events = true;
        }
        self.check_pos(id);
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get a window by id.
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    /// Window ids owned by an application.
    pub fn windows_of_app(&self, app_name: &str) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.app_name == app_name)
            .map(|w| w.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live windows.
    pub fn count(&self) -> usize {
        self.windows.len()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribe to window moves `(left, top)`.
    pub fn on_window_move(
        &mut self,
        id: WindowId,
        cb: impl FnMut(f32, f32) + 'static,
    ) -> Option<SubscriptionId> {
        let sub = self.alloc_subscription();
        self.windows
            .get_mut(&id)
            .map(|w| {
                w.events.on_move.push((sub, Box::new(cb)));
                sub
            })
    }

    /// Subscribe to window resizes `(width, height)`.
    pub fn on_window_resize(
        &mut self,
        id: WindowId,
        cb: impl FnMut(f32, f32) + 'static,
    ) -> Option<SubscriptionId> {
        let sub = self.alloc_subscription();
        self.windows
            .get_mut(&id)
            .map(|w| {
                w.events.on_resize.push((sub, Box::new(cb)));
                sub
            })
    }

    /// Subscribe to before-close.
    pub fn on_before_close(
        &mut self,
        id: WindowId,
        cb: impl FnMut() + 'static,
    ) -> Option<SubscriptionId> {
        let sub = self.alloc_subscription();
        self.windows
            .get_mut(&id)
            .map(|w| {
                w.events.on_before_close.push((sub, Box::new(cb)));
                sub
            })
    }

    /// Subscribe to minimize.
    pub fn on_window_minimize(
        &mut self,
        id: WindowId,
        cb: impl FnMut() + 'static,
    ) -> Option<SubscriptionId> {
        let sub = self.alloc_subscription();
        self.windows
            .get_mut(&id)
            .map(|w| {
                w.events.on_minimize.push((sub, Box::new(cb)));
                sub
            })
    }

    /// Subscribe to activation.
    pub fn on_activate(
        &mut self,
        id: WindowId,
        cb: impl FnMut() + 'static,
    ) -> Option<SubscriptionId> {
        let sub = self.alloc_subscription();
        self.windows
            .get_mut(&id)
            .map(|w| {
                w.events.on_activate.push((sub, Box::new(cb)));
                sub
            })
    }

    /// Remove a subscription by id.
    pub fn unsubscribe(&mut self, sub: SubscriptionId) {
        for window in self.windows.values_mut() {
            if window.events.remove(sub) {
                return;
            }
        }
    }

    fn alloc_subscription(&mut self) -> SubscriptionId {
        let sub = self.next_subscription;
        self.next_subscription += 1;
        sub
    }

    // =========================================================================
    // Event dispatch
    // =========================================================================

    fn emit_move(&mut self, id: WindowId) {
        let (x, y, mut cbs) = match self.windows.get_mut(&id) {
            Some(w) => (
                w.position.x,
                w.position.y,
                std::mem::take(&mut w.events.on_move),
            ),
            None => return,
        };
        for (_, cb) in cbs.iter_mut() {
            cb(x, y);
        }
        if let Some(w) = self.windows.get_mut(&id) {
            let mut added = std::mem::take(&mut w.events.on_move);
            cbs.append(&mut added);
            w.events.on_move = cbs;
        }
    }

    fn emit_resize(&mut self, id: WindowId) {
        let (width, height, mut cbs) = match self.windows.get_mut(&id) {
            Some(w) => (
                w.size.width,
                w.size.height,
                std::mem::take(&mut w.events.on_resize),
            ),
            None => return,
        };
        for (_, cb) in cbs.iter_mut() {
            cb(width, height);
        }
        if let Some(w) = self.windows.get_mut(&id) {
            let mut added = std::mem::take(&mut w.events.on_resize);
            cbs.append(&mut added);
            w.events.on_resize = cbs;
        }
    }

    fn emit_before_close(&mut self, id: WindowId) {
        let mut cbs = match self.windows.get_mut(&id) {
            Some(w) => std::mem::take(&mut w.events.on_before_close),
            None => return,
        };
        for (_, cb) in cbs.iter_mut() {
            cb();
        }
        if let Some(w) = self.windows.get_mut(&id) {
            let mut added = std::mem::take(&mut w.events.on_before_close);
            cbs.append(&mut added);
            w.events.on_before_close = cbs;
        }
    }

    fn emit_minimize(&mut self, id: WindowId) {
        let mut cbs = match self.windows.get_mut(&id) {
            Some(w) => std::mem::take(&mut w.events.on_minimize),
            None => return,
        };
        for (_, cb) in cbs.iter_mut() {
            cb();
        }
        if let Some(w) = self.windows.get_mut(&id) {
            let mut added = std::mem::take(&mut w.events.on_minimize);
            cbs.append(&mut added);
            w.events.on_minimize = cbs;
        }
    }

    fn emit_activate(&mut self, id: WindowId) {
        let mut cbs = match self.windows.get_mut(&id) {
            Some(w) => std::mem::take(&mut w.events.on_activate),
            None => return,
        };
        for (_, cb) in cbs.iter_mut() {
            cb();
        }
        if let Some(w) = self.windows.get_mut(&id) {
            let mut added = std::mem::take(&mut w.events.on_activate);
            cbs.append(&mut added);
            w.events.on_activate = cbs;
        }
    }
}
