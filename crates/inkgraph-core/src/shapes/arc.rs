//! Arc shape.

use super::{ShapeId, ShapeTrait};
use serde::{Deserialize, Serialize};

/// An elliptical arc.
///
/// `point1`/`point2` span the bounding box of the full ellipse; `point3` and
/// `point4` give the start and end angles as rays from its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcShape {
    pub point1: ShapeId,
    pub point2: ShapeId,
    pub point3: ShapeId,
    pub point4: ShapeId,
}

impl ArcShape {
    pub fn new(point1: ShapeId, point2: ShapeId, point3: ShapeId, point4: ShapeId) -> Self {
        Self {
            point1,
            point2,
            point3,
            point4,
        }
    }
}

impl ShapeTrait for ArcShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        vec![self.point1, self.point2, self.point3, self.point4]
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        vec![
            &mut self.point1,
            &mut self.point2,
            &mut self.point3,
            &mut self.point4,
        ]
    }
}
