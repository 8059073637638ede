//! Undo/redo history of reversible edits.
//!
//! Every edit is a value: the variant names the slot (the setter), and the
//! [`Snapshot`] it carries holds the value before and after the change.
//! Undo writes `previous` back into the slot, redo writes `next`.

use crate::graph::NodeId;
use crate::project::{
    Column, DatabaseId, DocumentId, LayerId, LibraryId, Options, PageId, Project, Property,
    PropertyId, RecordId, Value, ValueId,
};
use crate::shapes::{
    ArgbColor, FigureId, LineEnd, PathFigure, PathSegment, ShapeId, ShapeState, ShapeStyle,
    StyleId,
};
use kurbo::{Point, Vec2};
use uuid::Uuid;

/// Which way an edit is being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

/// The value of a slot before and after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub previous: T,
    pub next: T,
}

impl<T> Snapshot<T> {
    pub fn new(previous: T, next: T) -> Self {
        Self { previous, next }
    }

    /// The value to write back when replaying in `direction`.
    pub fn value(&self, direction: Direction) -> &T {
        match direction {
            Direction::Undo => &self.previous,
            Direction::Redo => &self.next,
        }
    }
}

impl<T: PartialEq> Snapshot<T> {
    pub fn is_noop(&self) -> bool {
        self.previous == self.next
    }
}

/// Field of a node that an edit (or a direct mutation) touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Documents,
    Templates,
    StyleLibraries,
    GroupLibraries,
    Databases,
    Options,
    Pages,
    Layers,
    Template,
    Background,
    Shapes,
    Items,
    /// A library's selected item. Not an edit of the document.
    Selected,
    Columns,
    Records,
    Values,
    Content,
    Properties,
    Record,
    Style,
    State,
    Points,
    Connectors,
    /// A document, page or layer cursor. Moves the insertion point, not content.
    Current,
    Figures,
    Segments,
    Position,
}

/// Notification that `field` of `node` was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub node: NodeId,
    pub field: Field,
}

impl Change {
    pub fn new(node: NodeId, field: Field) -> Self {
        Self { node, field }
    }
}

/// A reversible edit of one slot, or an atomic group of edits.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    ProjectDocuments(Snapshot<Vec<DocumentId>>),
    ProjectTemplates(Snapshot<Vec<PageId>>),
    ProjectStyleLibraries(Snapshot<Vec<LibraryId>>),
    ProjectGroupLibraries(Snapshot<Vec<LibraryId>>),
    ProjectDatabases(Snapshot<Vec<DatabaseId>>),
    Options(Snapshot<Options>),
    DocumentPages(DocumentId, Snapshot<Vec<PageId>>),
    PageLayers(PageId, Snapshot<Vec<LayerId>>),
    /// Document cursor, moved when the current document is removed.
    CurrentDocument(Snapshot<Option<DocumentId>>),
    CurrentPage(Snapshot<Option<PageId>>),
    PageCurrentLayer(PageId, Snapshot<Option<LayerId>>),
    PageTemplate(PageId, Snapshot<Option<PageId>>),
    PageBackground(PageId, Snapshot<ArgbColor>),
    LayerShapes(LayerId, Snapshot<Vec<ShapeId>>),
    StyleLibraryItems(LibraryId, Snapshot<Vec<StyleId>>),
    GroupLibraryItems(LibraryId, Snapshot<Vec<ShapeId>>),
    DatabaseColumns(DatabaseId, Snapshot<Vec<Column>>),
    DatabaseRecords(DatabaseId, Snapshot<Vec<RecordId>>),
    RecordValues(RecordId, Snapshot<Vec<Value>>),
    ValueContent {
        record: RecordId,
        value: ValueId,
        content: Snapshot<String>,
    },
    /// Properties of the data context owned by a shape or page.
    DataProperties(Uuid, Snapshot<Vec<Property>>),
    PropertyValue {
        owner: Uuid,
        property: PropertyId,
        value: Snapshot<String>,
    },
    DataRecord(Uuid, Snapshot<Option<RecordId>>),
    StyleContent(StyleId, Snapshot<ShapeStyle>),
    ShapeStyle(ShapeId, Snapshot<Option<StyleId>>),
    ShapeState(ShapeId, Snapshot<ShapeState>),
    LineEndpoint {
        line: ShapeId,
        end: LineEnd,
        point: Snapshot<ShapeId>,
    },
    GroupShapes(ShapeId, Snapshot<Vec<ShapeId>>),
    GroupConnectors(ShapeId, Snapshot<Vec<ShapeId>>),
    PathFigures(ShapeId, Snapshot<Vec<PathFigure>>),
    FigureSegments {
        shape: ShapeId,
        figure: FigureId,
        segments: Snapshot<Vec<PathSegment>>,
    },
    PointPosition(ShapeId, Snapshot<Point>),
    /// Translate a set of distinct points; undo translates by `-delta`.
    Move { points: Vec<ShapeId>, delta: Vec2 },
    /// Edits applied in order on redo and in reverse on undo.
    Batch(Vec<Edit>),
}

impl Edit {
    /// True when replaying the edit changes nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Edit::ProjectDocuments(s) => s.is_noop(),
            Edit::ProjectTemplates(s) => s.is_noop(),
            Edit::ProjectStyleLibraries(s) => s.is_noop(),
            Edit::ProjectGroupLibraries(s) => s.is_noop(),
            Edit::ProjectDatabases(s) => s.is_noop(),
            Edit::Options(s) => s.is_noop(),
            Edit::DocumentPages(_, s) => s.is_noop(),
            Edit::PageLayers(_, s) => s.is_noop(),
            Edit::CurrentDocument(s) => s.is_noop(),
            Edit::CurrentPage(s) => s.is_noop(),
            Edit::PageCurrentLayer(_, s) => s.is_noop(),
            Edit::PageTemplate(_, s) => s.is_noop(),
            Edit::PageBackground(_, s) => s.is_noop(),
            Edit::LayerShapes(_, s) => s.is_noop(),
            Edit::StyleLibraryItems(_, s) => s.is_noop(),
            Edit::GroupLibraryItems(_, s) => s.is_noop(),
            Edit::DatabaseColumns(_, s) => s.is_noop(),
            Edit::DatabaseRecords(_, s) => s.is_noop(),
            Edit::RecordValues(_, s) => s.is_noop(),
            Edit::ValueContent { content, .. } => content.is_noop(),
            Edit::DataProperties(_, s) => s.is_noop(),
            Edit::PropertyValue { value, .. } => value.is_noop(),
            Edit::DataRecord(_, s) => s.is_noop(),
            Edit::StyleContent(_, s) => s.is_noop(),
            Edit::ShapeStyle(_, s) => s.is_noop(),
            Edit::ShapeState(_, s) => s.is_noop(),
            Edit::LineEndpoint { point, .. } => point.is_noop(),
            Edit::GroupShapes(_, s) => s.is_noop(),
            Edit::GroupConnectors(_, s) => s.is_noop(),
            Edit::PathFigures(_, s) => s.is_noop(),
            Edit::FigureSegments { segments, .. } => segments.is_noop(),
            Edit::PointPosition(_, s) => s.is_noop(),
            Edit::Move { points, delta } => points.is_empty() || *delta == Vec2::ZERO,
            Edit::Batch(edits) => edits.iter().all(Edit::is_noop),
        }
    }

    /// Write the edit's value for `direction` into its slot.
    pub fn apply(&self, project: &mut Project, direction: Direction) -> Vec<Change> {
        let mut changes = Vec::new();
        self.apply_into(project, direction, &mut changes);
        changes
    }

    fn apply_into(&self, project: &mut Project, direction: Direction, changes: &mut Vec<Change>) {
        let mut changed = |node: NodeId, field: Field| changes.push(Change::new(node, field));
        match self {
            Edit::ProjectDocuments(s) => {
                project.documents = s.value(direction).clone();
                changed(NodeId::Project, Field::Documents);
            }
            Edit::ProjectTemplates(s) => {
                project.templates = s.value(direction).clone();
                changed(NodeId::Project, Field::Templates);
            }
            Edit::ProjectStyleLibraries(s) => {
                project.style_libraries = s.value(direction).clone();
                changed(NodeId::Project, Field::StyleLibraries);
            }
            Edit::ProjectGroupLibraries(s) => {
                project.group_libraries = s.value(direction).clone();
                changed(NodeId::Project, Field::GroupLibraries);
            }
            Edit::ProjectDatabases(s) => {
                project.databases = s.value(direction).clone();
                changed(NodeId::Project, Field::Databases);
            }
            Edit::Options(s) => {
                project.options = s.value(direction).clone();
                changed(NodeId::Options, Field::Options);
            }
            Edit::DocumentPages(id, s) => {
                if let Some(document) = project.document_mut(*id) {
                    document.pages = s.value(direction).clone();
                    changed(NodeId::Document(*id), Field::Pages);
                }
            }
            Edit::PageLayers(id, s) => {
                if let Some(page) = project.page_mut(*id) {
                    page.layers = s.value(direction).clone();
                    changed(NodeId::Page(*id), Field::Layers);
                }
            }
            Edit::CurrentDocument(s) => {
                project.current_document = *s.value(direction);
                changed(NodeId::Project, Field::Current);
            }
            Edit::CurrentPage(s) => {
                project.current_page = *s.value(direction);
                changed(NodeId::Project, Field::Current);
            }
            Edit::PageCurrentLayer(id, s) => {
                if let Some(page) = project.page_mut(*id) {
                    page.current_layer = *s.value(direction);
                    changed(NodeId::Page(*id), Field::Current);
                }
            }
            Edit::PageTemplate(id, s) => {
                if let Some(page) = project.page_mut(*id) {
                    page.template = *s.value(direction);
                    changed(NodeId::Page(*id), Field::Template);
                }
            }
            Edit::PageBackground(id, s) => {
                if let Some(page) = project.page_mut(*id) {
                    page.background = *s.value(direction);
                    changed(NodeId::Page(*id), Field::Background);
                }
            }
            Edit::LayerShapes(id, s) => {
                if let Some(layer) = project.layer_mut(*id) {
                    layer.shapes = s.value(direction).clone();
                    changed(NodeId::Layer(*id), Field::Shapes);
                }
            }
            Edit::StyleLibraryItems(id, s) => {
                if let Some(library) = project.style_library_mut(*id) {
                    library.set_items(s.value(direction).clone());
                    changed(NodeId::Library(*id), Field::Items);
                }
            }
            Edit::GroupLibraryItems(id, s) => {
                if let Some(library) = project.group_library_mut(*id) {
                    library.set_items(s.value(direction).clone());
                    changed(NodeId::Library(*id), Field::Items);
                }
            }
            Edit::DatabaseColumns(id, s) => {
                if let Some(db) = project.database_mut(*id) {
                    db.columns = s.value(direction).clone();
                    changed(NodeId::Database(*id), Field::Columns);
                }
            }
            Edit::DatabaseRecords(id, s) => {
                if let Some(db) = project.database_mut(*id) {
                    db.records = s.value(direction).clone();
                    changed(NodeId::Database(*id), Field::Records);
                }
            }
            Edit::RecordValues(id, s) => {
                if let Some(record) = project.record_mut(*id) {
                    record.values = s.value(direction).clone();
                    changed(NodeId::Record(*id), Field::Values);
                }
            }
            Edit::ValueContent {
                record,
                value,
                content,
            } => {
                if let Some(v) = project
                    .record_mut(*record)
                    .and_then(|r| r.values.iter_mut().find(|v| v.id == *value))
                {
                    v.content = content.value(direction).clone();
                    changed(NodeId::Value(*record, *value), Field::Content);
                }
            }
            Edit::DataProperties(owner, s) => {
                if let Some(data) = project.data_mut(*owner) {
                    data.properties = s.value(direction).clone();
                    changed(NodeId::Data(*owner), Field::Properties);
                }
            }
            Edit::PropertyValue {
                owner,
                property,
                value,
            } => {
                if let Some(p) = project
                    .data_mut(*owner)
                    .and_then(|d| d.properties.iter_mut().find(|p| p.id == *property))
                {
                    p.value = value.value(direction).clone();
                    changed(NodeId::Property(*owner, *property), Field::Content);
                }
            }
            Edit::DataRecord(owner, s) => {
                if let Some(data) = project.data_mut(*owner) {
                    data.record = *s.value(direction);
                    changed(NodeId::Data(*owner), Field::Record);
                }
            }
            Edit::StyleContent(id, s) => {
                if let Some(style) = project.style_mut(*id) {
                    let mut value = s.value(direction).clone();
                    value.id = *id;
                    *style = value;
                    changed(NodeId::Style(*id), Field::Content);
                }
            }
            Edit::ShapeStyle(id, s) => {
                if let Some(shape) = project.shape_mut(*id) {
                    shape.style = *s.value(direction);
                    changed(NodeId::Shape(*id), Field::Style);
                }
            }
            Edit::ShapeState(id, s) => {
                if let Some(shape) = project.shape_mut(*id) {
                    shape.state = *s.value(direction);
                    changed(NodeId::Shape(*id), Field::State);
                }
            }
            Edit::LineEndpoint { line, end, point } => {
                if let Some(l) = project.shape_mut(*line).and_then(|s| s.as_line_mut()) {
                    l.set_endpoint(*end, *point.value(direction));
                    changed(NodeId::Shape(*line), Field::Points);
                }
            }
            Edit::GroupShapes(id, s) => {
                if let Some(group) = project.shape_mut(*id).and_then(|s| s.as_group_mut()) {
                    group.shapes = s.value(direction).clone();
                    changed(NodeId::Shape(*id), Field::Shapes);
                }
            }
            Edit::GroupConnectors(id, s) => {
                if let Some(group) = project.shape_mut(*id).and_then(|s| s.as_group_mut()) {
                    group.connectors = s.value(direction).clone();
                    changed(NodeId::Shape(*id), Field::Connectors);
                }
            }
            Edit::PathFigures(id, s) => {
                if let Some(path) = project.shape_mut(*id).and_then(|s| s.as_path_mut()) {
                    path.geometry.figures = s.value(direction).clone();
                    changed(NodeId::Geometry(*id), Field::Figures);
                }
            }
            Edit::FigureSegments {
                shape,
                figure,
                segments,
            } => {
                if let Some(f) = project
                    .shape_mut(*shape)
                    .and_then(|s| s.as_path_mut())
                    .and_then(|p| p.geometry.figure_mut(*figure))
                {
                    f.segments = segments.value(direction).clone();
                    changed(NodeId::Figure(*shape, *figure), Field::Segments);
                }
            }
            Edit::PointPosition(id, s) => {
                if let Some(point) = project.shape_mut(*id).and_then(|s| s.as_point_mut()) {
                    point.position = *s.value(direction);
                    changed(NodeId::Shape(*id), Field::Position);
                }
            }
            Edit::Move { points, delta } => {
                let delta = match direction {
                    Direction::Undo => -*delta,
                    Direction::Redo => *delta,
                };
                for id in points {
                    if let Some(point) = project.shape_mut(*id).and_then(|s| s.as_point_mut()) {
                        point.translate(delta);
                        changed(NodeId::Shape(*id), Field::Position);
                    }
                }
            }
            Edit::Batch(edits) => match direction {
                Direction::Redo => {
                    for edit in edits {
                        edit.apply_into(project, direction, changes);
                    }
                }
                Direction::Undo => {
                    for edit in edits.iter().rev() {
                        edit.apply_into(project, direction, changes);
                    }
                }
            },
        }
    }

    /// Nodes referenced by either side of the edit. Used as garbage collection roots
    /// so that undo can restore them.
    pub fn references(&self, out: &mut Vec<NodeId>) {
        fn both<T: Copy>(s: &Snapshot<Vec<T>>, f: impl Fn(T) -> NodeId, out: &mut Vec<NodeId>) {
            out.extend(s.previous.iter().chain(s.next.iter()).map(|&id| f(id)));
        }
        match self {
            Edit::ProjectDocuments(s) => both(s, NodeId::Document, out),
            Edit::ProjectTemplates(s) => both(s, NodeId::Page, out),
            Edit::ProjectStyleLibraries(s) | Edit::ProjectGroupLibraries(s) => {
                both(s, NodeId::Library, out)
            }
            Edit::ProjectDatabases(s) => both(s, NodeId::Database, out),
            Edit::Options(s) => out.extend(
                [s.previous.point_shape, s.next.point_shape]
                    .into_iter()
                    .flatten()
                    .map(NodeId::Shape),
            ),
            Edit::DocumentPages(_, s) => both(s, NodeId::Page, out),
            Edit::PageLayers(_, s) => both(s, NodeId::Layer, out),
            Edit::CurrentDocument(s) => {
                out.extend([s.previous, s.next].into_iter().flatten().map(NodeId::Document))
            }
            Edit::CurrentPage(s) => {
                out.extend([s.previous, s.next].into_iter().flatten().map(NodeId::Page))
            }
            Edit::PageCurrentLayer(_, s) => {
                out.extend([s.previous, s.next].into_iter().flatten().map(NodeId::Layer))
            }
            Edit::PageTemplate(_, s) => {
                out.extend([s.previous, s.next].into_iter().flatten().map(NodeId::Page))
            }
            Edit::LayerShapes(_, s) | Edit::GroupShapes(_, s) | Edit::GroupConnectors(_, s) => {
                both(s, NodeId::Shape, out)
            }
            Edit::GroupLibraryItems(_, s) => both(s, NodeId::Shape, out),
            Edit::StyleLibraryItems(_, s) => both(s, NodeId::Style, out),
            Edit::DatabaseRecords(_, s) => both(s, NodeId::Record, out),
            Edit::DataRecord(_, s) => {
                out.extend([s.previous, s.next].into_iter().flatten().map(NodeId::Record))
            }
            Edit::StyleContent(id, _) => out.push(NodeId::Style(*id)),
            Edit::ShapeStyle(_, s) => {
                out.extend([s.previous, s.next].into_iter().flatten().map(NodeId::Style))
            }
            Edit::LineEndpoint { point, .. } => {
                out.extend([point.previous, point.next].map(NodeId::Shape))
            }
            Edit::PathFigures(_, s) => {
                for figure in s.previous.iter().chain(s.next.iter()) {
                    out.push(NodeId::Shape(figure.start));
                    for segment in &figure.segments {
                        out.extend(segment.points().into_iter().map(NodeId::Shape));
                    }
                }
            }
            Edit::FigureSegments { segments, .. } => {
                for segment in segments.previous.iter().chain(segments.next.iter()) {
                    out.extend(segment.points().into_iter().map(NodeId::Shape));
                }
            }
            Edit::Move { points, .. } => out.extend(points.iter().map(|&p| NodeId::Shape(p))),
            Edit::PointPosition(id, _) | Edit::ShapeState(id, _) => out.push(NodeId::Shape(*id)),
            Edit::Batch(edits) => {
                for edit in edits {
                    edit.references(out);
                }
            }
            Edit::PageBackground(..)
            | Edit::DatabaseColumns(..)
            | Edit::RecordValues(..)
            | Edit::ValueContent { .. }
            | Edit::DataProperties(..)
            | Edit::PropertyValue { .. } => {}
        }
    }
}

/// Undo and redo stacks. Unbounded; cleared by [`reset`](History::reset).
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Edit>,
    redo_stack: Vec<Edit>,
    /// Edits collected while a batch is open.
    pending: Vec<Edit>,
    batch_depth: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit that has already been applied to the project.
    ///
    /// Inside a batch the edit joins the batch; otherwise it is pushed onto the
    /// undo stack and the redo stack is cleared.
    pub fn snapshot(&mut self, edit: Edit) {
        if edit.is_noop() {
            return;
        }
        if self.batch_depth > 0 {
            self.pending.push(edit);
            return;
        }
        self.undo_stack.push(edit);
        self.redo_stack.clear();
    }

    /// Apply `edit` forward and record it.
    pub fn commit(&mut self, project: &mut Project, edit: Edit) -> Vec<Change> {
        let changes = edit.apply(project, Direction::Redo);
        self.snapshot(edit);
        changes
    }

    /// Open a batch: edits recorded until the matching [`end_batch`](History::end_batch)
    /// become one undo step. Batches nest.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            log::warn!("end_batch called without an open batch");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let mut edits = std::mem::take(&mut self.pending);
        match edits.len() {
            0 => {}
            1 => self.snapshot(edits.remove(0)),
            _ => self.snapshot(Edit::Batch(edits)),
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Revert the most recent edit. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, project: &mut Project) -> Option<Vec<Change>> {
        if self.in_batch() {
            log::warn!("undo requested while a batch is open");
            return None;
        }
        let edit = self.undo_stack.pop()?;
        let changes = edit.apply(project, Direction::Undo);
        self.redo_stack.push(edit);
        Some(changes)
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self, project: &mut Project) -> Option<Vec<Change>> {
        if self.in_batch() {
            log::warn!("redo requested while a batch is open");
            return None;
        }
        let edit = self.redo_stack.pop()?;
        let changes = edit.apply(project, Direction::Redo);
        self.undo_stack.push(edit);
        Some(changes)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear both stacks and drop any open batch.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending.clear();
        self.batch_depth = 0;
    }

    /// Nodes referenced by any recorded edit.
    pub fn references(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for edit in self
            .undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .chain(self.pending.iter())
        {
            edit.references(&mut out);
        }
        out
    }
}
