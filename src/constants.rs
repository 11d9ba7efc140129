//! Centralized engine defaults for grid geometry, widget sizing, and sync timing.

use std::time::Duration;

// =============================================================================
// GRID & GEOMETRY CONSTANTS
// =============================================================================

/// Default spacing of the snapping grid, in pixels.
pub const DEFAULT_GRID_SIZE: i32 = 20;

/// Minimum width of a snippet so it remains usable.
pub const MIN_WIDGET_WIDTH: i32 = 100;

/// Minimum height of a snippet so it remains usable.
pub const MIN_WIDGET_HEIGHT: i32 = 100;

/// Intrinsic width of a navigation button. Nav buttons are never resized.
pub const NAV_BUTTON_WIDTH: i32 = 160;

/// Intrinsic height of a navigation button.
pub const NAV_BUTTON_HEIGHT: i32 = 40;

/// Initial size of a freshly added snippet.
pub const DEFAULT_SNIPPET_WIDTH: i32 = 400;
pub const DEFAULT_SNIPPET_HEIGHT: i32 = 300;

// =============================================================================
// CONTAINER CONSTANTS
// =============================================================================

/// Width of the page container when nothing else is configured.
pub const DEFAULT_CONTAINER_WIDTH: i32 = 1200;

/// Height of the page container when nothing else is configured.
pub const DEFAULT_CONTAINER_HEIGHT: i32 = 800;

// =============================================================================
// SYNC CONSTANTS
// =============================================================================

/// Trailing-edge delay before a geometry change is persisted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Longest debounce a config file may ask for.
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(60);
