//! Grouping and line connectivity.
//!
//! Lines share point shapes with whatever they attach to. Splitting a line
//! hands one of its endpoints to a new line and puts a shared split point in
//! its place, so both halves stay connected through that point.

use super::{Editor, Selection, Session, ShapeBundle};
use crate::history::{Edit, Snapshot};
use crate::hit;
use crate::project::LayerId;
use crate::shapes::{GroupShape, LineEnd, Shape, ShapeId, ShapeKind, ShapeState, nearest_on_segment};
use crate::snap::snap_point;
use kurbo::Point;

impl Session {
    /// Copy a line's style and stroke flags onto a fresh line between `start` and `end`.
    fn line_like(&self, source: ShapeId, start: ShapeId, end: ShapeId) -> Shape {
        let mut line = Shape::line(start, end);
        if let Some(shape) = self.project.shape(source) {
            line.style = shape.style;
            line.is_stroked = shape.is_stroked;
            line.is_filled = shape.is_filled;
        }
        line
    }

    /// Split `line` at `at` through `point`. The endpoint closer to `at` moves to
    /// a new line ending at `point`; the original line takes `point` in its place.
    fn split_line(
        &mut self,
        layer: LayerId,
        line: ShapeId,
        point: ShapeId,
        at: Point,
    ) -> Option<ShapeId> {
        let segment = self.project.shape(line)?.as_line()?.clone();
        let (start, end) = hit::line_points(&self.project, line)?;
        let previous = self.project.point_position(point)?;

        let (new_line, replaced_end) = if at.distance(start) <= at.distance(end) {
            (self.line_like(line, segment.start, point), LineEnd::Start)
        } else {
            (self.line_like(line, point, segment.end), LineEnd::End)
        };
        let id = self.project.insert_shape(new_line);
        self.batch(|s| {
            s.commit(Edit::PointPosition(point, Snapshot::new(previous, at)));
            s.commit(Edit::LineEndpoint {
                line,
                end: replaced_end,
                point: Snapshot::new(segment.endpoint(replaced_end), point),
            });
            s.append_to_layer(layer, &[id]);
        });
        log::debug!("Split line {} at ({}, {})", line, at.x, at.y);
        Some(id)
    }

    /// Cut the stretch between `p0` and `p1` out of `line`.
    ///
    /// The original line keeps its start and ends at whichever connector comes
    /// first along its direction; a new line runs from the other connector to the
    /// original end.
    fn split_line_between(
        &mut self,
        layer: LayerId,
        line: ShapeId,
        p0: ShapeId,
        p1: ShapeId,
    ) -> Option<ShapeId> {
        let segment = self.project.shape(line)?.as_line()?.clone();
        let (start, end) = hit::line_points(&self.project, line)?;
        let a = self.project.point_position(p0)?;
        let b = self.project.point_position(p1)?;

        let (near, far) = if (end - start).dot(b - a) >= 0.0 { (p0, p1) } else { (p1, p0) };
        let tail = self.line_like(line, far, segment.end);
        let id = self.project.insert_shape(tail);
        self.batch(|s| {
            s.commit(Edit::LineEndpoint {
                line,
                end: LineEnd::End,
                point: Snapshot::new(segment.end, near),
            });
            s.append_to_layer(layer, &[id]);
        });
        Some(id)
    }

    /// Match connectors to lines and stitch every line with exactly two aligned matches.
    fn connect_lines(&mut self, lines: &[ShapeId], connectors: &[ShapeId], threshold: f64) -> bool {
        let mut matched: Vec<(ShapeId, Vec<ShapeId>)> = Vec::new();
        for &connector in connectors {
            let Some(position) = self.project.point_position(connector) else {
                continue;
            };
            let Some(&line) = lines
                .iter()
                .find(|&&l| hit::line_contains(&self.project, l, position, threshold))
            else {
                continue;
            };
            match matched.iter_mut().find(|(l, _)| *l == line) {
                Some((_, list)) => list.push(connector),
                None => matched.push((line, vec![connector])),
            }
        }

        let mut connected = false;
        for (line, points) in matched {
            let &[c0, c1] = points.as_slice() else {
                continue;
            };
            let (Some(a), Some(b)) = (
                self.project.point_position(c0),
                self.project.point_position(c1),
            ) else {
                continue;
            };
            let (p0, p1) = if (a.y - b.y).abs() < threshold {
                if a.x <= b.x { (c0, c1) } else { (c1, c0) }
            } else if (a.x - b.x).abs() < threshold {
                if a.y <= b.y { (c0, c1) } else { (c1, c0) }
            } else {
                continue;
            };
            let Some(layer) = self.project.layer_of(line) else {
                continue;
            };
            connected |= self.split_line_between(layer, line, p0, p1).is_some();
        }
        connected
    }

    fn set_connector(&mut self, point: ShapeId, connector: bool) {
        let Some(previous) = self.project.shape(point).map(|s| s.state) else {
            return;
        };
        let mut next = previous;
        next.set(ShapeState::CONNECTOR, connector);
        next.set(ShapeState::STANDALONE, !connector);
        self.commit(Edit::ShapeState(point, Snapshot::new(previous, next)));
    }
}

impl Editor {
    /// Group shapes of the current layer.
    ///
    /// Members keep their layer order. Points become the group's connectors and
    /// everything else its children. The group is appended to the layer and selected.
    pub fn group(&mut self, ids: &[ShapeId], name: &str) -> Option<ShapeId> {
        let session = self.session.as_mut()?;
        let layer = session.project.current_layer()?;
        let shapes = session.project.layer(layer)?.shapes.clone();
        let members: Vec<ShapeId> = shapes.iter().copied().filter(|s| ids.contains(s)).collect();
        if members.is_empty() {
            return None;
        }

        let (connectors, children): (Vec<ShapeId>, Vec<ShapeId>) = members
            .iter()
            .partition(|&&m| session.project.shape(m).is_some_and(Shape::is_point));
        let mut group = Shape::group(name);
        group.kind = ShapeKind::Group(GroupShape::new(children, connectors.clone()));
        group.style = Some(session.style_for_new_shape());
        let id = session.project.insert_shape(group);

        let mut next: Vec<ShapeId> = shapes
            .iter()
            .copied()
            .filter(|s| !members.contains(s))
            .collect();
        next.push(id);
        session.batch(|s| {
            for &point in &connectors {
                s.set_connector(point, true);
            }
            s.commit(Edit::LayerShapes(layer, Snapshot::new(shapes, next)));
        });
        session.select(Selection::Shape(id));
        log::debug!("Grouped {} shapes into {}", members.len(), id);
        Some(id)
    }

    /// Dissolve groups back into their layers, children first and then connectors,
    /// at each group's position. Returns the released shapes, which are selected.
    pub fn ungroup(&mut self, ids: &[ShapeId]) -> Vec<ShapeId> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let groups: Vec<(ShapeId, LayerId, GroupShape)> = ids
            .iter()
            .filter_map(|&id| {
                let group = session.project.shape(id)?.as_group()?.clone();
                Some((id, session.project.layer_of(id)?, group))
            })
            .collect();
        if groups.is_empty() {
            return Vec::new();
        }

        let released = session.batch(|s| {
            let mut released = Vec::new();
            for (id, layer, group) in groups {
                let Some(shapes) = s.project.layer(layer).map(|l| l.shapes.clone()) else {
                    continue;
                };
                let Some(index) = shapes.iter().position(|&x| x == id) else {
                    continue;
                };
                for &point in &group.connectors {
                    s.set_connector(point, false);
                }
                let mut next = shapes.clone();
                next.splice(
                    index..=index,
                    group.shapes.iter().chain(&group.connectors).copied(),
                );
                s.commit(Edit::LayerShapes(layer, Snapshot::new(shapes, next)));
                released.extend(group.shapes.iter().chain(&group.connectors).copied());
            }
            released
        });
        session.select(Selection::Shapes(released.clone()));
        released
    }

    /// Split the line under `(x, y)` in the current layer through `point`.
    ///
    /// The split position is the nearest point on the line, or `(x, y)` itself when
    /// snapping to the grid (the caller has already snapped it).
    pub fn try_to_split_line(&mut self, x: f64, y: f64, point: ShapeId, select: bool) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(layer) = session.project.current_layer() else {
            return false;
        };
        if !session.project.shape(point).is_some_and(Shape::is_point) {
            return false;
        }
        let cursor = Point::new(x, y);
        let threshold = session.project.options.hit_threshold;
        let Some(line) = hit::line_at(&session.project, layer, cursor, threshold) else {
            return false;
        };
        let Some(segment) = session.project.shape(line).and_then(Shape::as_line) else {
            return false;
        };
        if segment.start == point || segment.end == point {
            return false;
        }
        let Some((start, end)) = hit::line_points(&session.project, line) else {
            return false;
        };
        let at = if session.project.options.snap_to_grid {
            cursor
        } else {
            nearest_on_segment(cursor, start, end)
        };
        if session.split_line(layer, line, point, at).is_none() {
            return false;
        }
        if select {
            session.select(Selection::Shape(point));
        }
        true
    }

    /// Split `line` between two points lying on it, leaving the stretch between
    /// them to whatever owns the points.
    pub fn try_to_split_line_at(&mut self, line: ShapeId, p0: ShapeId, p1: ShapeId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(layer) = session.project.layer_of(line) else {
            return false;
        };
        session.split_line_between(layer, line, p0, p1).is_some()
    }

    /// Stitch `connectors` into `lines` as one undo step.
    ///
    /// Each connector attaches to the first line passing within `threshold` of it.
    /// Only lines that collect exactly two connectors, aligned horizontally or
    /// vertically, are split.
    pub fn try_to_connect_lines(
        &mut self,
        lines: &[ShapeId],
        connectors: &[ShapeId],
        threshold: f64,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.batch(|s| s.connect_lines(lines, connectors, threshold))
    }

    /// Drop a copy of `group` with its bounds origin at `(x, y)` into the current
    /// layer, stitching its connectors into the layer's lines when enabled.
    pub fn insert_group(&mut self, group: ShapeId, x: f64, y: f64) -> Option<ShapeId> {
        let session = self.session.as_mut()?;
        let layer = session.project.current_layer()?;
        if !session.project.shape(group).is_some_and(Shape::is_group) {
            return None;
        }
        let options = session.project.options.clone();
        let target = snap_point(Point::new(x, y), &options).point;

        let mut bundle = ShapeBundle::collect(&session.project, &[group]);
        if let Some(bounds) = bundle.bounds() {
            bundle.translate(target - bounds.origin());
        }
        let lines: Vec<ShapeId> = session
            .project
            .layer(layer)?
            .shapes
            .iter()
            .copied()
            .filter(|&s| session.project.shape(s).is_some_and(Shape::is_line))
            .collect();

        let copy = session.batch(|s| {
            let copy = *bundle.instantiate(&mut s.project).first()?;
            s.append_to_layer(layer, &[copy]);
            if options.try_to_connect {
                let connectors = s
                    .project
                    .shape(copy)
                    .and_then(Shape::as_group)
                    .map(|g| g.connectors.clone())
                    .unwrap_or_default();
                s.connect_lines(&lines, &connectors, options.hit_threshold);
            }
            Some(copy)
        })?;
        session.select(Selection::Shape(copy));
        Some(copy)
    }
}
