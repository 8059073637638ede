//! Rectangle shape.

use super::{ShapeId, ShapeTrait};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle spanned by two corner points, optionally drawn as a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleShape {
    pub top_left: ShapeId,
    pub bottom_right: ShapeId,
    #[serde(default)]
    pub is_grid: bool,
    #[serde(default = "default_cells")]
    pub columns: u32,
    #[serde(default = "default_cells")]
    pub rows: u32,
}

fn default_cells() -> u32 {
    1
}

impl RectangleShape {
    pub fn new(top_left: ShapeId, bottom_right: ShapeId) -> Self {
        Self {
            top_left,
            bottom_right,
            is_grid: false,
            columns: 1,
            rows: 1,
        }
    }
}

impl ShapeTrait for RectangleShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        vec![self.top_left, self.bottom_right]
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        vec![&mut self.top_left, &mut self.bottom_right]
    }
}
