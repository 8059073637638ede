//! Line shape.

use super::{ShapeId, ShapeTrait};
use serde::{Deserialize, Serialize};

/// Which end of a line a point handle occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineEnd {
    Start,
    End,
}

/// A straight segment between two point shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineShape {
    pub start: ShapeId,
    pub end: ShapeId,
}

impl LineShape {
    pub fn new(start: ShapeId, end: ShapeId) -> Self {
        Self { start, end }
    }

    pub fn endpoint(&self, end: LineEnd) -> ShapeId {
        match end {
            LineEnd::Start => self.start,
            LineEnd::End => self.end,
        }
    }

    pub fn set_endpoint(&mut self, end: LineEnd, point: ShapeId) {
        match end {
            LineEnd::Start => self.start = point,
            LineEnd::End => self.end = point,
        }
    }
}

impl ShapeTrait for LineShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        vec![self.start, self.end]
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        vec![&mut self.start, &mut self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_endpoints() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let mut line = LineShape::new(a, b);
        assert_eq!(line.endpoint(LineEnd::Start), a);
        assert_eq!(line.endpoint(LineEnd::End), b);

        line.set_endpoint(LineEnd::End, c);
        assert_eq!(line.point_refs(), vec![a, c]);
    }
}
