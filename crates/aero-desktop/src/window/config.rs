//! Window configuration for creation

use crate::math::{Size, Vec2};

/// Configuration for creating a window
#[derive(Clone, Debug)]
pub struct WindowConfig {
    /// Name of the owning application (used for routing and launch URLs)
    pub app_name: String,
    /// Window title (defaults to the app name when empty)
    pub title: String,
    /// Initial position (None = centered with cascade offset)
    pub position: Option<Vec2>,
    /// Initial size (None = shell default)
    pub size: Option<Size>,
    /// Minimum size constraint
    pub min_size: Size,
    /// Create without a title bar (forced-fullscreen single-app windows)
    pub title_bar: bool,
}

impl WindowConfig {
    /// Default window size when an app declares none.
    pub const DEFAULT_SIZE: Size = Size::new(700.0, 500.0);

    /// Default minimum window size.
    pub const DEFAULT_MIN_SIZE: Size = Size::new(200.0, 200.0);

    /// Config for an application window with defaults.
    pub fn new(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        Self {
            title: app_name.clone(),
            app_name,
            position: None,
            size: None,
            min_size: Self::DEFAULT_MIN_SIZE,
            title_bar: true,
        }
    }

    /// Set the initial size.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the initial position.
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }
}
