//! Cubic and quadratic bezier shapes.

use super::{ShapeId, ShapeTrait};
use serde::{Deserialize, Serialize};

/// A cubic bezier: start, two control points, end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubicBezierShape {
    pub point1: ShapeId,
    pub point2: ShapeId,
    pub point3: ShapeId,
    pub point4: ShapeId,
}

impl CubicBezierShape {
    pub fn new(point1: ShapeId, point2: ShapeId, point3: ShapeId, point4: ShapeId) -> Self {
        Self {
            point1,
            point2,
            point3,
            point4,
        }
    }
}

impl ShapeTrait for CubicBezierShape {
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

/// A quadratic bezier: start, control point, end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticBezierShape {
    pub point1: ShapeId,
    pub point2: ShapeId,
    pub point3: ShapeId,
}

impl QuadraticBezierShape {
    pub fn new(point1: ShapeId, point2: ShapeId, point3: ShapeId) -> Self {
        Self {
            point1,
            point2,
            point3,
        }
    }
}

impl ShapeTrait for QuadraticBezierShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        vec![self.point1, self.point2, self.point3]
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        vec![&mut self.point1, &mut self.point2, &mut self.point3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_point_counts() {
        let ids: Vec<ShapeId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let cubic = CubicBezierShape::new(ids[0], ids[1], ids[2], ids[3]);
        let quad = QuadraticBezierShape::new(ids[0], ids[1], ids[2]);
        assert_eq!(cubic.point_refs(), ids);
        assert_eq!(quad.point_refs(), ids[..3].to_vec());
    }
}
