//! Geometric hit testing against shapes resolved through the project arenas.

use crate::project::{LayerId, Project};
use crate::shapes::{Shape, ShapeId, ShapeKind, SegmentKind, point_to_segment_dist};
use kurbo::{BezPath, CubicBez, ParamCurveNearest, Point, QuadBez, Rect, Shape as _};

/// Accuracy passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-3;

/// Topmost shape in `layer` under `point`.
pub fn shape_at(
    project: &Project,
    layer: LayerId,
    point: Point,
    tolerance: f64,
) -> Option<ShapeId> {
    let layer = project.layer(layer)?;
    layer
        .shapes
        .iter()
        .rev()
        .copied()
        .find(|&id| hit_test(project, id, point, tolerance))
}

/// Topmost line in `layer` under `point`.
pub fn line_at(
    project: &Project,
    layer: LayerId,
    point: Point,
    tolerance: f64,
) -> Option<ShapeId> {
    let layer = project.layer(layer)?;
    layer.shapes.iter().rev().copied().find(|&id| {
        project.shape(id).is_some_and(Shape::is_line)
            && line_contains(project, id, point, tolerance)
    })
}

/// Shapes in `layer` whose bounds lie inside `rect`, back to front.
pub fn shapes_in_rect(project: &Project, layer: LayerId, rect: Rect) -> Vec<ShapeId> {
    let Some(layer) = project.layer(layer) else {
        return Vec::new();
    };
    layer
        .shapes
        .iter()
        .copied()
        .filter(|&id| {
            bounds(project, id)
                .is_some_and(|b| rect.contains(b.origin()) && rect.contains(Point::new(b.x1, b.y1)))
        })
        .collect()
}

/// Whether the segment of line `line` passes within `tolerance` of `point`.
pub fn line_contains(project: &Project, line: ShapeId, point: Point, tolerance: f64) -> bool {
    let Some((start, end)) = line_points(project, line) else {
        return false;
    };
    point_to_segment_dist(point, start, end) <= tolerance
}

/// Resolved start and end positions of a line shape.
pub fn line_points(project: &Project, line: ShapeId) -> Option<(Point, Point)> {
    let line = project.shape(line)?.as_line()?;
    Some((
        project.point_position(line.start)?,
        project.point_position(line.end)?,
    ))
}

/// Axis-aligned bounds of a shape's points.
pub fn bounds(project: &Project, id: ShapeId) -> Option<Rect> {
    let mut points = Vec::new();
    project.collect_points(id, &mut points);
    let mut positions = points.into_iter().filter_map(|p| project.point_position(p));
    let first = positions.next()?;
    Some(positions.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

/// Whether `point` is within `tolerance` of the shape.
pub fn hit_test(project: &Project, id: ShapeId, point: Point, tolerance: f64) -> bool {
    let Some(shape) = project.shape(id) else {
        return false;
    };
    let pos = |handle: ShapeId| project.point_position(handle);
    match &shape.kind {
        ShapeKind::Point(p) => p.distance_to(point) <= tolerance,
        ShapeKind::Line(_) => line_contains(project, id, point, tolerance),
        ShapeKind::Rectangle(r) => match (pos(r.top_left), pos(r.bottom_right)) {
            (Some(a), Some(b)) => {
                hit_rect(Rect::from_points(a, b), point, tolerance, shape.is_filled)
            }
            _ => false,
        },
        ShapeKind::Ellipse(e) => match (pos(e.top_left), pos(e.bottom_right)) {
            (Some(a), Some(b)) => {
                hit_ellipse(Rect::from_points(a, b), point, tolerance, shape.is_filled)
            }
            _ => false,
        },
        ShapeKind::Text(t) => match (pos(t.top_left), pos(t.bottom_right)) {
            (Some(a), Some(b)) => {
                Rect::from_points(a, b).inflate(tolerance, tolerance).contains(point)
            }
            _ => false,
        },
        ShapeKind::Image(i) => match (pos(i.top_left), pos(i.bottom_right)) {
            (Some(a), Some(b)) => {
                Rect::from_points(a, b).inflate(tolerance, tolerance).contains(point)
            }
            _ => false,
        },
        ShapeKind::Arc(a) => match (pos(a.point1), pos(a.point2)) {
            (Some(p1), Some(p2)) => hit_ellipse(Rect::from_points(p1, p2), point, tolerance, false),
            _ => false,
        },
        ShapeKind::CubicBezier(c) => match (
            pos(c.point1),
            pos(c.point2),
            pos(c.point3),
            pos(c.point4),
        ) {
            (Some(p0), Some(p1), Some(p2), Some(p3)) => {
                CubicBez::new(p0, p1, p2, p3).nearest(point, NEAREST_ACCURACY).distance_sq
                    <= tolerance * tolerance
            }
            _ => false,
        },
        ShapeKind::QuadraticBezier(q) => match (pos(q.point1), pos(q.point2), pos(q.point3)) {
            (Some(p0), Some(p1), Some(p2)) => {
                QuadBez::new(p0, p1, p2).nearest(point, NEAREST_ACCURACY).distance_sq
                    <= tolerance * tolerance
            }
            _ => false,
        },
        ShapeKind::Path(_) => path_of(project, shape).is_some_and(|path| {
            (shape.is_filled && path.contains(point))
                || path.segments().any(|seg| {
                    seg.nearest(point, NEAREST_ACCURACY).distance_sq <= tolerance * tolerance
                })
        }),
        ShapeKind::Group(g) => g
            .shapes
            .iter()
            .any(|&child| hit_test(project, child, point, tolerance)),
    }
}

fn hit_rect(rect: Rect, point: Point, tolerance: f64, filled: bool) -> bool {
    let outer = rect.inflate(tolerance, tolerance);
    if !outer.contains(point) {
        return false;
    }
    if filled {
        return true;
    }
    let inner = rect.inflate(-tolerance, -tolerance);
    inner.width() <= 0.0 || inner.height() <= 0.0 || !inner.contains(point)
}

fn hit_ellipse(rect: Rect, point: Point, tolerance: f64, filled: bool) -> bool {
    let center = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    let dx = (point.x - center.x) / (rx + tolerance);
    let dy = (point.y - center.y) / (ry + tolerance);
    if dx * dx + dy * dy > 1.0 {
        return false;
    }
    if filled {
        return true;
    }
    let inner_rx = rx - tolerance;
    let inner_ry = ry - tolerance;
    if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
        return true;
    }
    let dx = (point.x - center.x) / inner_rx;
    let dy = (point.y - center.y) / inner_ry;
    dx * dx + dy * dy > 1.0
}

/// Build a kurbo path from a path shape. Arc segments are approximated by chords.
fn path_of(project: &Project, shape: &Shape) -> Option<BezPath> {
    let geometry = &shape.as_path()?.geometry;
    let pos = |id: ShapeId| project.point_position(id);
    let mut path = BezPath::new();
    for figure in &geometry.figures {
        path.move_to(pos(figure.start)?);
        for segment in &figure.segments {
            match &segment.kind {
                SegmentKind::Line { point } | SegmentKind::Arc { point, .. } => {
                    path.line_to(pos(*point)?)
                }
                SegmentKind::CubicBezier {
                    point1,
                    point2,
                    point3,
                } => path.curve_to(pos(*point1)?, pos(*point2)?, pos(*point3)?),
                SegmentKind::QuadraticBezier { point1, point2 } => {
                    path.quad_to(pos(*point1)?, pos(*point2)?)
                }
                SegmentKind::PolyLine { points } => {
                    for p in points {
                        path.line_to(pos(*p)?);
                    }
                }
                SegmentKind::PolyCubicBezier { points } => {
                    for chunk in points.chunks_exact(3) {
                        path.curve_to(pos(chunk[0])?, pos(chunk[1])?, pos(chunk[2])?);
                    }
                }
                SegmentKind::PolyQuadraticBezier { points } => {
                    for chunk in points.chunks_exact(2) {
                        path.quad_to(pos(chunk[0])?, pos(chunk[1])?);
                    }
                }
            }
        }
        if figure.is_closed {
            path.close_path();
        }
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{PathFigure, PathGeometry, PathSegment, PathShape};

    fn setup() -> (Project, LayerId) {
        let project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        (project, layer)
    }

    #[test]
    fn test_line_hit_within_threshold() {
        let (mut project, layer) = setup();
        let line = project.create_line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        project.layer_mut(layer).unwrap().shapes.push(line);

        assert!(line_contains(&project, line, Point::new(50.0, 5.0), 7.0));
        assert!(!line_contains(&project, line, Point::new(50.0, 10.0), 7.0));
        assert_eq!(line_at(&project, layer, Point::new(50.0, 3.0), 7.0), Some(line));
    }

    #[test]
    fn test_shape_at_returns_topmost() {
        let (mut project, layer) = setup();
        let a = project.create_line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let b = project.create_line(Point::new(50.0, -50.0), Point::new(50.0, 50.0));
        project.layer_mut(layer).unwrap().shapes.extend([a, b]);
        assert_eq!(shape_at(&project, layer, Point::new(50.0, 0.0), 7.0), Some(b));
        assert_eq!(shape_at(&project, layer, Point::new(10.0, 0.0), 7.0), Some(a));
        assert_eq!(shape_at(&project, layer, Point::new(10.0, 40.0), 7.0), None);
    }

    #[test]
    fn test_outline_rectangle_misses_interior() {
        let (mut project, _) = setup();
        let tl = project.create_point(0.0, 0.0);
        let br = project.create_point(100.0, 100.0);
        let rect = project.insert_shape(Shape::rectangle(tl, br));
        assert!(hit_test(&project, rect, Point::new(0.0, 50.0), 5.0));
        assert!(!hit_test(&project, rect, Point::new(50.0, 50.0), 5.0));

        project.shape_mut(rect).unwrap().is_filled = true;
        assert!(hit_test(&project, rect, Point::new(50.0, 50.0), 5.0));
    }

    #[test]
    fn test_path_hit_on_segment() {
        let (mut project, _) = setup();
        let a = project.create_point(0.0, 0.0);
        let b = project.create_point(100.0, 0.0);
        let mut figure = PathFigure::new(a);
        figure.segments.push(PathSegment::new(SegmentKind::Line { point: b }));
        let geometry = PathGeometry {
            figures: vec![figure],
            ..Default::default()
        };
        let path = project.insert_shape(Shape::new(ShapeKind::Path(PathShape::new(geometry))));
        assert!(hit_test(&project, path, Point::new(40.0, 2.0), 5.0));
        assert!(!hit_test(&project, path, Point::new(40.0, 20.0), 5.0));
    }

    #[test]
    fn test_bounds_and_rect_selection() {
        let (mut project, layer) = setup();
        let line = project.create_line(Point::new(10.0, 10.0), Point::new(30.0, 40.0));
        project.layer_mut(layer).unwrap().shapes.push(line);
        assert_eq!(bounds(&project, line), Some(Rect::new(10.0, 10.0, 30.0, 40.0)));
        assert_eq!(shapes_in_rect(&project, layer, Rect::new(0.0, 0.0, 50.0, 50.0)), vec![line]);
        assert!(shapes_in_rect(&project, layer, Rect::new(0.0, 0.0, 20.0, 20.0)).is_empty());
    }
}
