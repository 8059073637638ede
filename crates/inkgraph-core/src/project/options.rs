//! Project-wide editing options.

use crate::shapes::{FillRule, ShapeId};
use crate::snap::GRID_SIZE;
use serde::{Deserialize, Serialize};

/// Default hit-test threshold in world units.
pub const DEFAULT_HIT_THRESHOLD: f64 = 7.0;

/// What a drag of the selection moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveMode {
    /// Move the distinct points underneath the selected shapes.
    Point,
    /// Move whole shapes, skipping locked and connector shapes.
    #[default]
    Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub snap_to_grid: bool,
    pub snap_x: f64,
    pub snap_y: f64,
    pub hit_threshold: f64,
    pub move_mode: MoveMode,
    pub default_is_stroked: bool,
    pub default_is_filled: bool,
    pub default_is_closed: bool,
    pub default_fill_rule: FillRule,
    /// Split lines under a dropped group's connectors.
    pub try_to_connect: bool,
    /// Clone a style when applying it instead of sharing it.
    pub clone_style: bool,
    /// Shape drawn for every point, if any.
    pub point_shape: Option<ShapeId>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            snap_to_grid: true,
            snap_x: GRID_SIZE,
            snap_y: GRID_SIZE,
            hit_threshold: DEFAULT_HIT_THRESHOLD,
            move_mode: MoveMode::default(),
            default_is_stroked: true,
            default_is_filled: false,
            default_is_closed: true,
            default_fill_rule: FillRule::default(),
            try_to_connect: false,
            clone_style: false,
            point_shape: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let options: Options = serde_json::from_str(r#"{ "snap_to_grid": false }"#).unwrap();
        assert!(!options.snap_to_grid);
        assert_eq!(options.hit_threshold, DEFAULT_HIT_THRESHOLD);
        assert_eq!(options.move_mode, MoveMode::Shape);
    }
}
