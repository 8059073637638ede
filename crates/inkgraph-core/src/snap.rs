//! Grid snapping for cursor positions.

use kurbo::Point;

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Result of a snap operation.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Round `value` to the nearest multiple of `step`. A non-positive step leaves it alone.
pub fn snap(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Snap a point to the grid, with independent steps per axis.
pub fn snap_to_grid(point: Point, snap_x: f64, snap_y: f64) -> SnapResult {
    SnapResult {
        point: Point::new(snap(point.x, snap_x), snap(point.y, snap_y)),
        snapped_x: snap_x > 0.0,
        snapped_y: snap_y > 0.0,
    }
}

/// Snap a point using the project's options.
pub fn snap_point(point: Point, options: &crate::project::Options) -> SnapResult {
    if options.snap_to_grid {
        snap_to_grid(point, options.snap_x, options.snap_y)
    } else {
        SnapResult::none(point)
    }
}
