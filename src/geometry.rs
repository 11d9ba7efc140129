//! Grid snapping and bounds clamping for widget position and size.
//!
//! Every function here is total: any numeric input, including negative, huge or
//! non-finite values, produces a snapped and clamped result without panicking.

use crate::widget::{Position, Size};

/// Rounds `value` to the nearest multiple of `grid`, half away from zero.
///
/// A non-positive grid disables snapping and only rounds to whole pixels.
/// NaN maps to 0 and out-of-range values saturate at the `i32` bounds.
pub fn snap(value: f32, grid: i32) -> i32 {
    if !value.is_finite() {
        return if value.is_nan() {
            0
        } else if value > 0.0 {
            align_down(i32::MAX, grid)
        } else {
            align_up(i32::MIN, grid)
        };
    }
    if grid <= 0 {
        return value.round() as i32;
    }
    let grid_f = grid as f64;
    let steps = (value as f64 / grid_f).round();
    let snapped = steps * grid_f;
    if snapped >= i32::MAX as f64 {
        align_down(i32::MAX, grid)
    } else if snapped <= i32::MIN as f64 {
        align_up(i32::MIN, grid)
    } else {
        snapped as i32
    }
}

/// Computes a snapped top-left that keeps the widget inside the container.
///
/// When the container is smaller than the widget the upper bound goes negative;
/// the lower bound of 0 wins and the widget is allowed to overflow.
pub fn clamp_drag(
    raw_x: f32,
    raw_y: f32,
    widget: Size,
    container: Size,
    grid: i32,
) -> Position {
    let x = snap(raw_x, grid);
    let y = snap(raw_y, grid);
    Position {
        x: clamp_axis(
            x,
            0,
            container.width.saturating_sub(widget.width),
            grid,
        ),
        y: clamp_axis(
            y,
            0,
            container.height.saturating_sub(widget.height),
            grid,
        ),
    }
}

/// Computes a snapped size within `[min, max]` on each axis.
///
/// Callers pass `max` as `container - widget position` so the far edge stays
/// inside the container. If `max` is below `min`, the minimum wins.
pub fn clamp_resize(raw_width: f32, raw_height: f32, min: Size, max: Size, grid: i32) -> Size {
    let width = snap(raw_width, grid);
    let height = snap(raw_height, grid);
    Size {
        width: clamp_axis(width, min.width, max.width, grid),
        height: clamp_axis(height, min.height, max.height, grid),
    }
}

/// Clamps an already snapped value to grid-aligned bounds. The lower bound wins
/// when the aligned bounds cross.
fn clamp_axis(value: i32, lower: i32, upper: i32, grid: i32) -> i32 {
    let lower = align_up(lower, grid);
    let upper = align_down(upper, grid);
    if upper < lower {
        return lower;
    }
    value.clamp(lower, upper)
}

fn align_up(value: i32, grid: i32) -> i32 {
    if grid <= 0 {
        return value;
    }
    let rem = value.rem_euclid(grid);
    if rem == 0 {
        value
    } else {
        value
            .checked_add(grid - rem)
            .unwrap_or_else(|| value.saturating_sub(rem))
    }
}

fn align_down(value: i32, grid: i32) -> i32 {
    if grid <= 0 {
        return value;
    }
    let rem = value.rem_euclid(grid);
    value
        .checked_sub(rem)
        .unwrap_or_else(|| value.saturating_add(grid - rem))
}
