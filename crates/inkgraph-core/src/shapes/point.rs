//! Point shape.

use super::{ShapeId, ShapeTrait};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// A point: the only shape variant that stores coordinates.
///
/// Every other variant refers to point shapes by handle, so a single point can
/// be the end of one line and the start of the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointShape {
    pub position: Point,
}

impl PointShape {
    pub fn new(position: Point) -> Self {
        Self { position }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        self.position.distance(other)
    }
}

impl ShapeTrait for PointShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        Vec::new()
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        Vec::new()
    }
}
