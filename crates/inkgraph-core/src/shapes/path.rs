//! Path shape: figures made of typed segments.

use super::{ShapeId, ShapeTrait};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a figure within a path.
pub type FigureId = Uuid;

/// Unique identifier for a segment within a figure.
pub type SegmentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    EvenOdd,
    Nonzero,
}

/// Geometry of a single segment. Every variant ends at its last point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentKind {
    Line {
        point: ShapeId,
    },
    Arc {
        point: ShapeId,
        size: Size,
        rotation_angle: f64,
        is_large_arc: bool,
        sweep_clockwise: bool,
    },
    CubicBezier {
        point1: ShapeId,
        point2: ShapeId,
        point3: ShapeId,
    },
    QuadraticBezier {
        point1: ShapeId,
        point2: ShapeId,
    },
    PolyLine {
        points: Vec<ShapeId>,
    },
    PolyCubicBezier {
        points: Vec<ShapeId>,
    },
    PolyQuadraticBezier {
        points: Vec<ShapeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub(crate) id: SegmentId,
    #[serde(default = "default_stroked")]
    pub is_stroked: bool,
    pub kind: SegmentKind,
}

fn default_stroked() -> bool {
    true
}

impl PathSegment {
    pub fn new(kind: SegmentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_stroked: true,
            kind,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn points(&self) -> Vec<ShapeId> {
        match &self.kind {
            SegmentKind::Line { point } | SegmentKind::Arc { point, .. } => vec![*point],
            SegmentKind::CubicBezier {
                point1,
                point2,
                point3,
            } => vec![*point1, *point2, *point3],
            SegmentKind::QuadraticBezier { point1, point2 } => vec![*point1, *point2],
            SegmentKind::PolyLine { points }
            | SegmentKind::PolyCubicBezier { points }
            | SegmentKind::PolyQuadraticBezier { points } => points.clone(),
        }
    }

    fn points_mut(&mut self) -> Vec<&mut ShapeId> {
        match &mut self.kind {
            SegmentKind::Line { point } | SegmentKind::Arc { point, .. } => vec![point],
            SegmentKind::CubicBezier {
                point1,
                point2,
                point3,
            } => vec![point1, point2, point3],
            SegmentKind::QuadraticBezier { point1, point2 } => vec![point1, point2],
            SegmentKind::PolyLine { points }
            | SegmentKind::PolyCubicBezier { points }
            | SegmentKind::PolyQuadraticBezier { points } => points.iter_mut().collect(),
        }
    }
}

/// A connected run of segments starting at `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFigure {
    pub(crate) id: FigureId,
    pub start: ShapeId,
    pub segments: Vec<PathSegment>,
    #[serde(default = "default_stroked")]
    pub is_filled: bool,
    #[serde(default)]
    pub is_closed: bool,
}

impl PathFigure {
    pub fn new(start: ShapeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            segments: Vec::new(),
            is_filled: true,
            is_closed: false,
        }
    }

    pub fn id(&self) -> FigureId {
        self.id
    }

    pub fn segment(&self, id: SegmentId) -> Option<&PathSegment> {
        self.segments.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathGeometry {
    #[serde(default)]
    pub fill_rule: FillRule,
    pub figures: Vec<PathFigure>,
}

impl PathGeometry {
    pub fn figure(&self, id: FigureId) -> Option<&PathFigure> {
        self.figures.iter().find(|f| f.id == id)
    }

    pub fn figure_mut(&mut self, id: FigureId) -> Option<&mut PathFigure> {
        self.figures.iter_mut().find(|f| f.id == id)
    }

    /// Find a segment in any figure.
    pub fn segment(&self, id: SegmentId) -> Option<&PathSegment> {
        self.figures.iter().find_map(|f| f.segment(id))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathShape {
    pub geometry: PathGeometry,
}

impl PathShape {
    pub fn new(geometry: PathGeometry) -> Self {
        Self { geometry }
    }
}

impl ShapeTrait for PathShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        let mut points = Vec::new();
        for figure in &self.geometry.figures {
            points.push(figure.start);
            for segment in &figure.segments {
                points.extend(segment.points());
            }
        }
        points
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        let mut points = Vec::new();
        for figure in &mut self.geometry.figures {
            points.push(&mut figure.start);
            for segment in &mut figure.segments {
                points.extend(segment.points_mut());
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_point_refs_walk_all_segments() {
        let ids: Vec<ShapeId> = (0..7).map(|_| Uuid::new_v4()).collect();
        let mut figure = PathFigure::new(ids[0]);
        figure.segments.push(PathSegment::new(SegmentKind::Line { point: ids[1] }));
        figure.segments.push(PathSegment::new(SegmentKind::QuadraticBezier {
            point1: ids[2],
            point2: ids[3],
        }));
        figure.segments.push(PathSegment::new(SegmentKind::PolyLine {
            points: ids[4..].to_vec(),
        }));
        let path = PathShape::new(PathGeometry {
            fill_rule: FillRule::Nonzero,
            figures: vec![figure],
        });
        assert_eq!(path.point_refs(), ids);
    }

    #[test]
    fn test_point_refs_mut_matches_point_refs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let mut figure = PathFigure::new(a);
        figure.segments.push(PathSegment::new(SegmentKind::Arc {
            point: b,
            size: Size::new(5.0, 5.0),
            rotation_angle: 0.0,
            is_large_arc: false,
            sweep_clockwise: true,
        }));
        let mut path = PathShape::new(PathGeometry {
            fill_rule: FillRule::EvenOdd,
            figures: vec![figure],
        });
        for slot in path.point_refs_mut() {
            if *slot == b {
                *slot = c;
            }
        }
        assert_eq!(path.point_refs(), vec![a, c]);
    }
}
