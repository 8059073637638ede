//! Selection, cursors, z-order, move and delete.
//!
//! Neither the selection nor the document, page and layer cursors are undo
//! steps: changing them records nothing in the history.

use super::{Editor, Session};
use crate::graph::NodeId;
use crate::hit;
use crate::history::{Change, Edit, Field, Snapshot};
use crate::project::{DocumentId, LayerId, MoveMode, PageId};
use crate::shapes::ShapeId;
use kurbo::{Point, Rect, Vec2};

/// Current selection. A single shape and a set of shapes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    None,
    Shape(ShapeId),
    Shapes(Vec<ShapeId>),
}

impl Selection {
    pub fn ids(&self) -> Vec<ShapeId> {
        match self {
            Selection::None => Vec::new(),
            Selection::Shape(id) => vec![*id],
            Selection::Shapes(ids) => ids.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::None => true,
            Selection::Shape(_) => false,
            Selection::Shapes(ids) => ids.is_empty(),
        }
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        match self {
            Selection::None => false,
            Selection::Shape(s) => *s == id,
            Selection::Shapes(ids) => ids.contains(&id),
        }
    }
}

/// Where a z-order change moves a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZOrder {
    Front,
    Forward,
    Backward,
    Back,
}

impl Session {
    pub(crate) fn select(&mut self, selection: Selection) {
        self.selection = match selection {
            Selection::Shapes(ids) if ids.is_empty() => Selection::None,
            other => other,
        };
        let current = match &self.selection {
            Selection::Shape(id) => Some(*id),
            _ => None,
        };
        if let Some(page) = self.project.current_page.and_then(|p| self.project.page_mut(p)) {
            page.current_shape = current;
        }
    }

    fn reorder(&mut self, id: ShapeId, order: ZOrder) -> bool {
        let Some(layer) = self.project.layer_of(id) else {
            return false;
        };
        let Some(shapes) = self.project.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        let Some(index) = shapes.iter().position(|&s| s == id) else {
            return false;
        };
        let last = shapes.len() - 1;
        let target = match order {
            ZOrder::Front => last,
            ZOrder::Forward => (index + 1).min(last),
            ZOrder::Backward => index.saturating_sub(1),
            ZOrder::Back => 0,
        };
        if target == index {
            return false;
        }
        let mut next = shapes.clone();
        next.remove(index);
        next.insert(target, id);
        self.commit(Edit::LayerShapes(layer, Snapshot::new(shapes, next)));
        true
    }

    /// Remove shapes from whichever layers hold them, one edit per layer.
    pub(crate) fn remove_from_layers(&mut self, ids: &[ShapeId]) -> bool {
        let mut by_layer: Vec<(LayerId, Vec<ShapeId>)> = Vec::new();
        for &id in ids {
            let Some(layer) = self.project.layer_of(id) else {
                continue;
            };
            match by_layer.iter_mut().find(|(l, _)| *l == layer) {
                Some((_, list)) => list.push(id),
                None => by_layer.push((layer, vec![id])),
            }
        }
        if by_layer.is_empty() {
            return false;
        }
        self.batch(|session| {
            for (layer, removed) in by_layer {
                let Some(shapes) = session.project.layer(layer).map(|l| l.shapes.clone()) else {
                    continue;
                };
                let next = shapes.iter().copied().filter(|s| !removed.contains(s)).collect();
                session.commit(Edit::LayerShapes(layer, Snapshot::new(shapes, next)));
            }
        });
        true
    }

    /// Distinct points moved when dragging `ids` under the current move mode.
    fn points_to_move(&self, ids: &[ShapeId]) -> Vec<ShapeId> {
        let mode = self.project.options.move_mode;
        let mut points = Vec::new();
        for &id in ids {
            let Some(shape) = self.project.shape(id) else {
                continue;
            };
            if mode == MoveMode::Shape && (shape.is_locked() || shape.is_connector()) {
                continue;
            }
            self.project.collect_points(id, &mut points);
        }
        points
    }

    pub(crate) fn move_shapes(&mut self, ids: &[ShapeId], delta: Vec2) -> bool {
        let points = self.points_to_move(ids);
        if points.is_empty() || delta == Vec2::ZERO {
            return false;
        }
        self.commit(Edit::Move { points, delta });
        true
    }
}

impl Editor {
    pub fn selected_shape(&self) -> Option<ShapeId> {
        match self.session.as_ref()?.selection {
            Selection::Shape(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_shapes(&self) -> Vec<ShapeId> {
        self.session
            .as_ref()
            .map(|s| s.selection.ids())
            .unwrap_or_default()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.session.as_ref().map(|s| &s.selection)
    }

    /// Select one shape, clearing any multi-selection.
    pub fn select_shape(&mut self, id: ShapeId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.project.shape(id).is_none() {
            return false;
        }
        session.select(Selection::Shape(id));
        true
    }

    /// Select a set of shapes, clearing any single selection.
    pub fn select_shapes(&mut self, ids: &[ShapeId]) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let ids: Vec<ShapeId> = ids
            .iter()
            .copied()
            .filter(|&id| session.project.shape(id).is_some())
            .collect();
        if ids.is_empty() {
            return false;
        }
        session.select(Selection::Shapes(ids));
        true
    }

    pub fn deselect_all(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.select(Selection::None);
        }
    }

    /// Select the topmost shape of the current layer under `point`.
    pub fn select_at(&mut self, point: Point) -> Option<ShapeId> {
        let session = self.session.as_mut()?;
        let layer = session.project.current_layer()?;
        let threshold = session.project.options.hit_threshold;
        match hit::shape_at(&session.project, layer, point, threshold) {
            Some(id) => {
                session.select(Selection::Shape(id));
                Some(id)
            }
            None => {
                session.select(Selection::None);
                None
            }
        }
    }

    /// Select every shape of the current layer inside `rect`. Returns how many were selected.
    pub fn select_in_rect(&mut self, rect: Rect) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let Some(layer) = session.project.current_layer() else {
            return 0;
        };
        let ids = hit::shapes_in_rect(&session.project, layer, rect);
        let count = ids.len();
        session.select(Selection::Shapes(ids));
        count
    }

    pub fn select_all(&mut self) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let Some(ids) = session
            .project
            .current_layer()
            .and_then(|l| session.project.layer(l))
            .map(|l| l.shapes.clone())
        else {
            return 0;
        };
        let count = ids.len();
        session.select(Selection::Shapes(ids));
        count
    }

    /// Make `document` current. The page cursor moves to its first page unless it
    /// already points into the document. Clears the selection.
    pub fn set_current_document(&mut self, document: DocumentId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.project.documents.contains(&document) {
            return false;
        }
        let Some(pages) = session.project.document(document).map(|d| d.pages.clone()) else {
            return false;
        };
        session.select(Selection::None);
        let project = &mut session.project;
        project.current_document = Some(document);
        if project.current_page.is_none_or(|p| !pages.contains(&p)) {
            project.current_page = pages.first().copied();
        }
        session.dispatch(&[Change::new(NodeId::Project, Field::Current)]);
        true
    }

    /// Make `page` current, along with the document that holds it. Clears the selection.
    pub fn set_current_page(&mut self, page: PageId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let project = &session.project;
        let Some(document) = project
            .documents
            .iter()
            .copied()
            .find(|d| project.document(*d).is_some_and(|d| d.pages.contains(&page)))
        else {
            return false;
        };
        session.select(Selection::None);
        session.project.current_document = Some(document);
        session.project.current_page = Some(page);
        session.dispatch(&[Change::new(NodeId::Project, Field::Current)]);
        true
    }

    /// Make `layer` the layer of the current page that receives new shapes.
    /// Clears the selection.
    pub fn set_current_layer(&mut self, layer: LayerId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(page) = session.project.active_page() else {
            return false;
        };
        if !session.project.page(page).is_some_and(|p| p.layers.contains(&layer)) {
            return false;
        }
        session.select(Selection::None);
        if let Some(p) = session.project.page_mut(page) {
            p.current_layer = Some(layer);
        }
        session.dispatch(&[Change::new(NodeId::Page(page), Field::Current)]);
        true
    }

    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.reorder(id, ZOrder::Front))
    }

    pub fn bring_forward(&mut self, id: ShapeId) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.reorder(id, ZOrder::Forward))
    }

    pub fn send_backward(&mut self, id: ShapeId) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.reorder(id, ZOrder::Backward))
    }

    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.reorder(id, ZOrder::Back))
    }

    /// Move the selection as one undo step.
    pub fn move_selection_by(&mut self, dx: f64, dy: f64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let ids = session.selection.ids();
        session.move_shapes(&ids, Vec2::new(dx, dy))
    }

    /// Remove the selected shapes from their layers.
    pub fn delete_selected(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let ids = session.selection.ids();
        if ids.is_empty() {
            return false;
        }
        let removed = session.remove_from_layers(&ids);
        session.select(Selection::None);
        removed
    }

    /// Shapes of the current layer, back to front.
    pub fn current_layer_shapes(&self) -> Vec<ShapeId> {
        self.project()
            .and_then(|p| p.current_layer().and_then(|l| p.layer(l)))
            .map(|l| l.shapes.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_synced, loaded};
    use super::*;
    use crate::shapes::{Shape, ShapeState};

    fn three_lines(editor: &mut Editor) -> (ShapeId, ShapeId, ShapeId) {
        let a = editor.add_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)).unwrap();
        let b = editor.add_line(Point::new(0.0, 20.0), Point::new(10.0, 20.0)).unwrap();
        let c = editor.add_line(Point::new(0.0, 40.0), Point::new(10.0, 40.0)).unwrap();
        (a, b, c)
    }

    #[test]
    fn test_single_and_multi_selection_are_exclusive() {
        let mut editor = loaded();
        let (a, b, _) = three_lines(&mut editor);
        editor.select_shape(a);
        assert_eq!(editor.selected_shape(), Some(a));
        editor.select_shapes(&[a, b]);
        assert_eq!(editor.selected_shape(), None);
        assert_eq!(editor.selected_shapes(), vec![a, b]);
        editor.select_shape(b);
        assert_eq!(editor.selected_shapes(), vec![b]);
        editor.deselect_all();
        assert!(editor.selected_shapes().is_empty());
    }

    #[test]
    fn test_select_at_and_in_rect() {
        let mut editor = loaded();
        let (a, b, c) = three_lines(&mut editor);
        assert_eq!(editor.select_at(Point::new(5.0, 21.0)), Some(b));
        assert_eq!(editor.select_at(Point::new(5.0, 30.0)), None);
        assert_eq!(editor.select_in_rect(Rect::new(-1.0, -1.0, 11.0, 25.0)), 2);
        assert_eq!(editor.selected_shapes(), vec![a, b]);
        assert_eq!(editor.select_all(), 3);
        assert!(editor.selection().unwrap().contains(c));
    }

    #[test]
    fn test_cursors_route_new_shapes() {
        let mut editor = loaded();
        let document = editor.add_document("Second").unwrap();
        let page = editor.add_page(document, "Extra").unwrap();
        let layer = editor.add_layer(page, "Notes").unwrap();
        let steps = editor.session().unwrap().history().undo_count();
        let a = editor.add_line(Point::ZERO, Point::new(10.0, 0.0)).unwrap();
        editor.select_shape(a);

        assert!(!editor.set_current_layer(layer));
        assert!(editor.set_current_page(page));
        assert!(editor.selected_shapes().is_empty());
        assert_eq!(editor.project().unwrap().current_document, Some(document));
        assert!(editor.set_current_layer(layer));
        let b = editor.add_line(Point::ZERO, Point::new(10.0, 0.0)).unwrap();
        assert_eq!(editor.current_layer_shapes(), vec![b]);
        assert_eq!(editor.select_at(Point::new(5.0, 0.0)), Some(b));
        assert_eq!(editor.session().unwrap().history().undo_count(), steps + 2);

        let first = editor.project().unwrap().documents[0];
        assert!(editor.set_current_document(first));
        assert_eq!(editor.current_layer_shapes(), vec![a]);
        assert!(!editor.set_current_document(uuid::Uuid::new_v4()));
        assert!(!editor.set_current_page(uuid::Uuid::new_v4()));
        assert_synced(&editor);
    }

    #[test]
    fn test_undo_pulls_cursor_off_removed_page() {
        let mut editor = loaded();
        let document = editor.project().unwrap().current_document.unwrap();
        let first = editor.project().unwrap().current_page.unwrap();
        let page = editor.add_page(document, "Extra").unwrap();
        assert!(editor.set_current_page(page));

        assert!(editor.undo());
        assert_eq!(editor.project().unwrap().current_page, Some(first));
        assert!(editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).is_some());
        assert_synced(&editor);
    }

    #[test]
    fn test_z_order() {
        let mut editor = loaded();
        let (a, b, c) = three_lines(&mut editor);
        assert!(editor.bring_to_front(a));
        assert_eq!(editor.current_layer_shapes(), vec![b, c, a]);
        assert!(!editor.bring_forward(a));
        assert!(editor.send_backward(a));
        assert_eq!(editor.current_layer_shapes(), vec![b, a, c]);
        assert!(editor.send_to_back(c));
        assert_eq!(editor.current_layer_shapes(), vec![c, b, a]);

        editor.undo();
        assert_eq!(editor.current_layer_shapes(), vec![b, a, c]);
        assert_synced(&editor);
    }

    #[test]
    fn test_move_shared_point_once() {
        let mut editor = loaded();
        let a = editor.create_point(0.0, 0.0).unwrap();
        let b = editor.create_point(10.0, 0.0).unwrap();
        let c = editor.create_point(10.0, 10.0).unwrap();
        let l1 = editor.add_shape(Shape::line(a, b)).unwrap();
        let l2 = editor.add_shape(Shape::line(b, c)).unwrap();
        editor.select_shapes(&[l1, l2]);
        assert!(editor.move_selection_by(1.0, 2.0));
        let project = editor.project().unwrap();
        assert_eq!(project.point_position(b), Some(Point::new(11.0, 2.0)));
        assert_eq!(project.point_position(a), Some(Point::new(1.0, 2.0)));

        assert!(editor.undo());
        assert_eq!(editor.project().unwrap().point_position(b), Some(Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_shape_mode_skips_locked_shapes() {
        let mut editor = loaded();
        let (a, b, _) = three_lines(&mut editor);
        let state = editor.project().unwrap().shape(a).unwrap().state | ShapeState::LOCKED;
        editor.set_shape_state(a, state);
        let start = editor.project().unwrap().shape(a).unwrap().as_line().unwrap().start;

        editor.select_shapes(&[a, b]);
        assert!(editor.move_selection_by(5.0, 0.0));
        assert_eq!(editor.project().unwrap().point_position(start), Some(Point::new(0.0, 0.0)));

        let mut options = editor.project().unwrap().options.clone();
        options.move_mode = MoveMode::Point;
        editor.set_options(options);
        editor.select_shapes(&[a]);
        assert!(editor.move_selection_by(5.0, 0.0));
        assert_eq!(editor.project().unwrap().point_position(start), Some(Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_delete_selected() {
        let mut editor = loaded();
        let (a, b, c) = three_lines(&mut editor);
        editor.select_shapes(&[a, c]);
        assert!(editor.delete_selected());
        assert_eq!(editor.current_layer_shapes(), vec![b]);
        assert!(editor.selected_shapes().is_empty());
        assert!(!editor.delete_selected());
        assert_synced(&editor);

        editor.undo();
        assert_eq!(editor.current_layer_shapes(), vec![a, b, c]);
    }
}
