//! Sizing and colors for the egui editor.

use std::time::Duration;

// =============================================================================
// EDITOR CONSTANTS
// =============================================================================

/// Initial window width when the editor starts.
pub const INITIAL_WINDOW_WIDTH: f32 = 1280.0;

/// Initial window height when the editor starts.
pub const INITIAL_WINDOW_HEIGHT: f32 = 900.0;

/// Side length of the square resize handle in the bottom-right corner of a snippet.
pub const RESIZE_HANDLE_SIZE: f32 = 14.0;

/// Size of the delete/rename control buttons drawn in the widget's top-right corner.
pub const CONTROL_BUTTON_SIZE: f32 = 18.0;

/// Spacing between control buttons.
pub const CONTROL_BUTTON_SPACING: f32 = 4.0;

/// Corner radius for widget rectangles.
pub const WIDGET_CORNER_RADIUS: f32 = 4.0;

/// Font size for snippet titles and nav button labels.
pub const LABEL_FONT_SIZE: f32 = 13.0;

/// Font size for the raw HTML preview inside a snippet.
pub const HTML_PREVIEW_FONT_SIZE: f32 = 11.0;

/// How long a save-failure message stays in the status bar.
pub const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(4);

// =============================================================================
// COLORS
// =============================================================================

pub mod colors {
    use eframe::egui::Color32;

    /// Canvas background behind the page container.
    pub const CANVAS_BG: Color32 = Color32::from_rgb(24, 24, 24);

    /// Page container fill.
    pub const CONTAINER_BG: Color32 = Color32::from_rgb(40, 40, 44);

    /// Grid dots drawn on the container.
    pub const GRID_DOT: Color32 = Color32::from_rgb(64, 64, 70);

    /// Snippet body fill.
    pub const SNIPPET_BG: Color32 = Color32::from_rgb(58, 64, 84);

    /// Nav button fill.
    pub const NAV_BUTTON_BG: Color32 = Color32::from_rgb(46, 110, 80);

    /// Outline of the widget under an active gesture.
    pub const ACTIVE_OUTLINE: Color32 = Color32::from_rgb(250, 200, 80);

    /// Resize handle fill.
    pub const RESIZE_HANDLE: Color32 = Color32::from_rgb(180, 180, 190);

    /// Delete button color in normal state.
    pub const DELETE_BUTTON: Color32 = Color32::from_rgb(200, 60, 60);

    /// Delete button color when hovered.
    pub const DELETE_BUTTON_HOVER: Color32 = Color32::from_rgb(255, 100, 100);

    /// Rename button color in normal state.
    pub const RENAME_BUTTON: Color32 = Color32::from_rgb(90, 90, 110);

    /// Rename button color when hovered.
    pub const RENAME_BUTTON_HOVER: Color32 = Color32::from_rgb(130, 130, 160);

    /// Toolbar background.
    pub const TOOLBAR_BG: Color32 = Color32::from_rgb(30, 30, 30);

    /// Status bar text for failures.
    pub const STATUS_ERROR: Color32 = Color32::from_rgb(255, 120, 120);
}

/// Stable accent color for a widget: the id picks one of 24 evenly spaced hues.
pub fn accent_for(id: uuid::Uuid) -> eframe::egui::Color32 {
    const HUES: u128 = 24;
    let hue = (id.as_u128() % HUES) as f32 / HUES as f32;
    eframe::egui::Color32::from(eframe::egui::epaint::Hsva::new(hue, 0.55, 0.85, 1.0))
}
