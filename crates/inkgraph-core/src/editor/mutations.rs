//! Structural edits. Every operation here records exactly one undo step.

use super::{Editor, Selection, Session};
use crate::graph::NodeId;
use crate::history::{Change, Edit, Field, Snapshot};
use crate::project::{
    Column, ColumnId, DatabaseId, Database, Document, DocumentId, GroupLibrary, Layer, LayerId,
    LibraryId, Options, PageId, Property, PropertyId, Record, RecordId, StyleLibrary, Value,
    ValueId,
};
use crate::shapes::{
    ArgbColor, FigureId, PathFigure, PathSegment, Shape, ShapeId, ShapeState, ShapeStyle, StyleId,
};
use kurbo::Point;
use uuid::Uuid;

impl Session {
    /// Style for a shape added without one: the current library's selection,
    /// or a fresh default style.
    pub(crate) fn style_for_new_shape(&mut self) -> StyleId {
        if let Some(style) = self.project.current_style() {
            return style;
        }
        self.project.insert_style(ShapeStyle::new("Default"))
    }

    /// Insert `shape` into the arena and append it to the current layer.
    pub(crate) fn add_shape(&mut self, mut shape: Shape) -> Option<ShapeId> {
        let layer = self.project.current_layer()?;
        if !shape.is_point() && shape.style.is_none() {
            shape.style = Some(self.style_for_new_shape());
        }
        let id = self.project.insert_shape(shape);
        self.append_to_layer(layer, &[id]);
        Some(id)
    }

    /// Move cursors left on removed nodes onto the tree, as part of the open
    /// batch. `page` names a page whose layer cursor may have gone stale.
    fn settle_cursors(&mut self, page: Option<PageId>) {
        let (document, current) = self.project.settled_cursors();
        let previous = (self.project.current_document, self.project.current_page);
        self.commit(Edit::CurrentDocument(Snapshot::new(previous.0, document)));
        self.commit(Edit::CurrentPage(Snapshot::new(previous.1, current)));
        if previous.1 != current {
            self.select(Selection::None);
        }

        let stale = page.and_then(|p| self.project.page(p)).and_then(|p| {
            let layer = p.current_layer?;
            (!p.layers.contains(&layer)).then_some((p.id(), layer, p.layers.first().copied()))
        });
        if let Some((page, layer, next)) = stale {
            self.commit(Edit::PageCurrentLayer(page, Snapshot::new(Some(layer), next)));
        }
    }

    pub(crate) fn append_to_layer(&mut self, layer: LayerId, ids: &[ShapeId]) -> bool {
        let Some(shapes) = self.project.layer(layer).map(|l| l.shapes.clone()) else {
            return false;
        };
        let mut next = shapes.clone();
        next.extend_from_slice(ids);
        self.commit(Edit::LayerShapes(layer, Snapshot::new(shapes, next)));
        true
    }

    fn library_items(&self, library: LibraryId) -> Option<Vec<Uuid>> {
        self.project
            .style_library(library)
            .map(|l| l.items.clone())
            .or_else(|| self.project.group_library(library).map(|l| l.items.clone()))
    }

    fn set_library_items(&mut self, library: LibraryId, next: Vec<Uuid>) -> bool {
        let Some(previous) = self.library_items(library) else {
            return false;
        };
        if previous == next {
            return false;
        }
        let snapshot = Snapshot::new(previous, next);
        if self.project.style_library(library).is_some() {
            self.commit(Edit::StyleLibraryItems(library, snapshot));
        } else {
            self.commit(Edit::GroupLibraryItems(library, snapshot));
        }
        true
    }

    fn apply_style_to(&mut self, shape: ShapeId, style: StyleId) {
        let Some(current) = self.project.shape(shape) else {
            return;
        };
        let previous = current.style;
        let children = current.as_group().map(|g| g.shapes.clone()).unwrap_or_default();
        self.commit(Edit::ShapeStyle(shape, Snapshot::new(previous, Some(style))));
        for child in children {
            self.apply_style_to(child, style);
        }
    }
}

/// Remove every occurrence of `item` from `items`. Returns `None` if it was absent.
fn without<T: PartialEq + Copy>(items: &[T], item: T) -> Option<Vec<T>> {
    if !items.contains(&item) {
        return None;
    }
    Some(items.iter().copied().filter(|&i| i != item).collect())
}

/// `items` with `old` swapped for `new` in place. Returns `None` if `old` is absent.
fn replaced<T: PartialEq + Copy>(items: &[T], old: T, new: T) -> Option<Vec<T>> {
    let index = items.iter().position(|&i| i == old)?;
    let mut next = items.to_vec();
    next[index] = new;
    Some(next)
}

impl Editor {
    /// Insert a free point. It joins the graph once a shape references it.
    pub fn create_point(&mut self, x: f64, y: f64) -> Option<ShapeId> {
        let session = self.session.as_mut()?;
        Some(session.project.create_point(x, y))
    }

    /// Add a shape to the current layer. Non-point shapes without a style get the current style.
    pub fn add_shape(&mut self, shape: Shape) -> Option<ShapeId> {
        self.session.as_mut()?.add_shape(shape)
    }

    /// Add a line between two new points.
    pub fn add_line(&mut self, start: Point, end: Point) -> Option<ShapeId> {
        let session = self.session.as_mut()?;
        session.project.current_layer()?;
        let s = session.project.create_point(start.x, start.y);
        let e = session.project.create_point(end.x, end.y);
        let mut line = Shape::line(s, e);
        line.is_stroked = session.project.options.default_is_stroked;
        line.is_filled = session.project.options.default_is_filled;
        session.add_shape(line)
    }

    /// Remove a shape from its layer.
    pub fn remove_shape(&mut self, id: ShapeId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.selection.contains(id) {
            session.select(super::Selection::None);
        }
        session.remove_from_layers(&[id])
    }

    /// Put `shape` where `old` sits in its layer. A non-point shape without a
    /// style takes the style of the shape it replaces.
    pub fn replace_shape(&mut self, old: ShapeId, mut shape: Shape) -> Option<ShapeId> {
        let session = self.session.as_mut()?;
        let layer = session.project.layer_of(old)?;
        let previous = session.project.layer(layer)?.shapes.clone();
        if !shape.is_point() && shape.style.is_none() {
            shape.style = session.project.shape(old).and_then(|s| s.style);
        }
        let id = session.project.insert_shape(shape);
        let next = replaced(&previous, old, id)?;
        if session.selection.contains(old) {
            session.select(super::Selection::None);
        }
        session.commit(Edit::LayerShapes(layer, Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn set_shape_state(&mut self, id: ShapeId, state: ShapeState) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.shape(id).map(|s| s.state) else {
            return false;
        };
        session.commit(Edit::ShapeState(id, Snapshot::new(previous, state)));
        previous != state
    }

    pub fn set_point_position(&mut self, point: ShapeId, position: Point) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.point_position(point) else {
            return false;
        };
        session.commit(Edit::PointPosition(point, Snapshot::new(previous, position)));
        previous != position
    }

    pub fn add_document(&mut self, name: &str) -> Option<DocumentId> {
        let session = self.session.as_mut()?;
        let page = session.project.create_page("Page");
        let template = session.project.current_template;
        if let Some(p) = session.project.page_mut(page) {
            p.template = template;
        }
        let mut document = Document::new(name);
        document.pages.push(page);
        let id = session.project.insert_document(document);

        let previous = session.project.documents.clone();
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::ProjectDocuments(Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_document(&mut self, id: DocumentId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.project.documents.clone();
        let Some(next) = without(&previous, id) else {
            return false;
        };
        session.batch(|s| {
            s.commit(Edit::ProjectDocuments(Snapshot::new(previous, next)));
            s.settle_cursors(None);
        });
        true
    }

    pub fn replace_document(&mut self, old: DocumentId, document: Document) -> Option<DocumentId> {
        let session = self.session.as_mut()?;
        let previous = session.project.documents.clone();
        if !previous.contains(&old) {
            return None;
        }
        let id = session.project.insert_document(document);
        let next = replaced(&previous, old, id)?;
        session.batch(|s| {
            s.commit(Edit::ProjectDocuments(Snapshot::new(previous, next)));
            if s.project.current_document == Some(old) {
                s.commit(Edit::CurrentDocument(Snapshot::new(Some(old), Some(id))));
            }
            s.settle_cursors(None);
        });
        Some(id)
    }

    pub fn add_page(&mut self, document: DocumentId, name: &str) -> Option<PageId> {
        let session = self.session.as_mut()?;
        let previous = session.project.document(document)?.pages.clone();
        let page = session.project.create_page(name);
        let template = session.project.current_template;
        if let Some(p) = session.project.page_mut(page) {
            p.template = template;
        }
        let mut next = previous.clone();
        next.push(page);
        session.commit(Edit::DocumentPages(document, Snapshot::new(previous, next)));
        Some(page)
    }

    pub fn remove_page(&mut self, document: DocumentId, page: PageId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.document(document).map(|d| d.pages.clone()) else {
            return false;
        };
        let Some(next) = without(&previous, page) else {
            return false;
        };
        session.batch(|s| {
            s.commit(Edit::DocumentPages(document, Snapshot::new(previous, next)));
            s.settle_cursors(None);
        });
        true
    }

    pub fn add_layer(&mut self, page: PageId, name: &str) -> Option<LayerId> {
        let session = self.session.as_mut()?;
        let previous = session.project.page(page)?.layers.clone();
        let mut layer = Layer::new(name);
        layer.owner = Some(page);
        let id = session.project.insert_layer(layer);
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::PageLayers(page, Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_layer(&mut self, page: PageId, layer: LayerId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.page(page).map(|p| p.layers.clone()) else {
            return false;
        };
        let Some(next) = without(&previous, layer) else {
            return false;
        };
        session.batch(|s| {
            s.commit(Edit::PageLayers(page, Snapshot::new(previous, next)));
            s.settle_cursors(Some(page));
        });
        true
    }

    pub fn replace_layer(
        &mut self,
        page: PageId,
        old: LayerId,
        mut layer: Layer,
    ) -> Option<LayerId> {
        let session = self.session.as_mut()?;
        let previous = session.project.page(page)?.layers.clone();
        if !previous.contains(&old) {
            return None;
        }
        layer.owner = Some(page);
        let id = session.project.insert_layer(layer);
        let next = replaced(&previous, old, id)?;
        let current = session.project.page(page)?.current_layer;
        session.batch(|s| {
            s.commit(Edit::PageLayers(page, Snapshot::new(previous, next)));
            if current == Some(old) {
                s.commit(Edit::PageCurrentLayer(page, Snapshot::new(current, Some(id))));
            }
        });
        Some(id)
    }

    /// Add a template page to the project pool.
    pub fn add_template(&mut self, name: &str) -> Option<PageId> {
        let session = self.session.as_mut()?;
        let template = session.project.create_page(name);
        let previous = session.project.templates.clone();
        let mut next = previous.clone();
        next.push(template);
        session.commit(Edit::ProjectTemplates(Snapshot::new(previous, next)));
        Some(template)
    }

    pub fn remove_template(&mut self, template: PageId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.project.templates.clone();
        let Some(next) = without(&previous, template) else {
            return false;
        };
        session.commit(Edit::ProjectTemplates(Snapshot::new(previous, next)));
        true
    }

    /// Point a page at a template from the pool, or clear it.
    pub fn apply_template(&mut self, page: PageId, template: Option<PageId>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if template.is_some_and(|t| !session.project.templates.contains(&t)) {
            return false;
        }
        let Some(previous) = session.project.page(page).map(|p| p.template) else {
            return false;
        };
        if previous == template {
            return false;
        }
        session.commit(Edit::PageTemplate(page, Snapshot::new(previous, template)));
        true
    }

    pub fn set_page_background(&mut self, page: PageId, color: ArgbColor) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.page(page).map(|p| p.background) else {
            return false;
        };
        if previous == color {
            return false;
        }
        session.commit(Edit::PageBackground(page, Snapshot::new(previous, color)));
        true
    }

    /// Add a style to a style library. A style whose id is already taken is added as a copy.
    pub fn add_style(&mut self, library: LibraryId, style: ShapeStyle) -> Option<StyleId> {
        let session = self.session.as_mut()?;
        let previous = session.project.style_library(library)?.items.clone();
        let style = if session.project.style(style.id()).is_some() {
            style.duplicate()
        } else {
            style
        };
        let id = session.project.insert_style(style);
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::StyleLibraryItems(library, Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_style(&mut self, library: LibraryId, style: StyleId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.style_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        let Some(next) = without(&previous, style) else {
            return false;
        };
        session.commit(Edit::StyleLibraryItems(library, Snapshot::new(previous, next)));
        true
    }

    pub fn replace_style(
        &mut self,
        library: LibraryId,
        old: StyleId,
        style: ShapeStyle,
    ) -> Option<StyleId> {
        let session = self.session.as_mut()?;
        let previous = session.project.style_library(library)?.items.clone();
        if !previous.contains(&old) {
            return None;
        }
        let style = if session.project.style(style.id()).is_some() {
            style.duplicate()
        } else {
            style
        };
        let id = session.project.insert_style(style);
        let next = replaced(&previous, old, id)?;
        session.commit(Edit::StyleLibraryItems(library, Snapshot::new(previous, next)));
        Some(id)
    }

    /// Replace the content of a style. Every shape sharing it is restyled.
    pub fn set_style(&mut self, id: StyleId, content: ShapeStyle) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.style(id).cloned() else {
            return false;
        };
        let mut next = content;
        next.id = id;
        if previous == next {
            return false;
        }
        session.commit(Edit::StyleContent(id, Snapshot::new(previous, next)));
        true
    }

    /// Apply a style to a shape and, for groups, to every child. With
    /// `clone_style` set the shape gets its own copy of the style.
    pub fn apply_style(&mut self, shape: ShapeId, style: StyleId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.project.shape(shape).is_none() {
            return false;
        }
        let Some(source) = session.project.style(style).cloned() else {
            return false;
        };
        let style = if session.project.options.clone_style {
            session.project.insert_style(source.duplicate())
        } else {
            style
        };
        session.batch(|s| s.apply_style_to(shape, style));
        true
    }

    pub fn add_style_library(&mut self, name: &str) -> Option<LibraryId> {
        let session = self.session.as_mut()?;
        let id = session.project.insert_style_library(StyleLibrary::new(name));
        let previous = session.project.style_libraries.clone();
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::ProjectStyleLibraries(Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_style_library(&mut self, library: LibraryId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.project.style_libraries.clone();
        let Some(next) = without(&previous, library) else {
            return false;
        };
        session.commit(Edit::ProjectStyleLibraries(Snapshot::new(previous, next)));
        true
    }

    pub fn add_group_library(&mut self, name: &str) -> Option<LibraryId> {
        let session = self.session.as_mut()?;
        let id = session.project.insert_group_library(GroupLibrary::new(name));
        let previous = session.project.group_libraries.clone();
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::ProjectGroupLibraries(Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_group_library(&mut self, library: LibraryId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.project.group_libraries.clone();
        let Some(next) = without(&previous, library) else {
            return false;
        };
        session.commit(Edit::ProjectGroupLibraries(Snapshot::new(previous, next)));
        true
    }

    /// Store a group in a group library.
    pub fn add_group_to_library(&mut self, library: LibraryId, group: ShapeId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.project.shape(group).is_some_and(Shape::is_group) {
            return false;
        }
        let Some(previous) = session.project.group_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        let mut next = previous.clone();
        next.push(group);
        session.commit(Edit::GroupLibraryItems(library, Snapshot::new(previous, next)));
        true
    }

    pub fn remove_group_from_library(&mut self, library: LibraryId, group: ShapeId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.group_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        let Some(next) = without(&previous, group) else {
            return false;
        };
        session.commit(Edit::GroupLibraryItems(library, Snapshot::new(previous, next)));
        true
    }

    /// Swap a library group for another group shape.
    pub fn replace_group_in_library(
        &mut self,
        library: LibraryId,
        old: ShapeId,
        group: ShapeId,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.project.shape(group).is_some_and(Shape::is_group) {
            return false;
        }
        let Some(previous) = session.project.group_library(library).map(|l| l.items.clone()) else {
            return false;
        };
        let Some(next) = replaced(&previous, old, group) else {
            return false;
        };
        session.commit(Edit::GroupLibraryItems(library, Snapshot::new(previous, next)));
        true
    }

    /// Swap two items of a style or group library.
    pub fn swap_items(&mut self, library: LibraryId, a: usize, b: usize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(mut items) = session.library_items(library) else {
            return false;
        };
        if a >= items.len() || b >= items.len() {
            return false;
        }
        items.swap(a, b);
        session.set_library_items(library, items)
    }

    /// Move a library item from one index to another.
    pub fn move_item(&mut self, library: LibraryId, from: usize, to: usize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(mut items) = session.library_items(library) else {
            return false;
        };
        if from >= items.len() || to >= items.len() {
            return false;
        }
        let item = items.remove(from);
        items.insert(to, item);
        session.set_library_items(library, items)
    }

    /// Select a library item. Not an edit: it is not recorded and does not dirty the project.
    pub fn select_library_item(&mut self, library: LibraryId, item: Uuid) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let selected = if let Some(l) = session.project.style_library_mut(library) {
            l.set_selected(Some(item))
        } else if let Some(l) = session.project.group_library_mut(library) {
            l.set_selected(Some(item))
        } else {
            false
        };
        if selected {
            session.dispatch(&[Change::new(NodeId::Library(library), Field::Selected)]);
        }
        selected
    }

    pub fn add_database(&mut self, name: &str, columns: &[&str]) -> Option<DatabaseId> {
        let session = self.session.as_mut()?;
        let mut database = Database::new(name);
        database.columns = columns.iter().map(|c| Column::new(*c)).collect();
        let id = session.project.insert_database(database);
        let previous = session.project.databases.clone();
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::ProjectDatabases(Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_database(&mut self, database: DatabaseId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.project.databases.clone();
        let Some(next) = without(&previous, database) else {
            return false;
        };
        session.commit(Edit::ProjectDatabases(Snapshot::new(previous, next)));
        true
    }

    /// Put `database` where `old` sits, bringing its records along.
    pub fn replace_database(
        &mut self,
        old: DatabaseId,
        mut database: Database,
        records: Vec<Record>,
    ) -> Option<DatabaseId> {
        let session = self.session.as_mut()?;
        let previous = session.project.databases.clone();
        if !previous.contains(&old) {
            return None;
        }
        database.records = records
            .into_iter()
            .map(|r| session.project.insert_record(r))
            .collect();
        let id = session.project.insert_database(database);
        let next = replaced(&previous, old, id)?;
        session.commit(Edit::ProjectDatabases(Snapshot::new(previous, next)));
        Some(id)
    }

    /// Append a column. Every record gets an empty value for it.
    pub fn add_column(&mut self, database: DatabaseId, name: &str) -> Option<ColumnId> {
        let session = self.session.as_mut()?;
        let db = session.project.database(database)?;
        let previous = db.columns.clone();
        let records = db.records.clone();
        let column = Column::new(name);
        let id = column.id();
        let mut next = previous.clone();
        next.push(column);
        session.batch(|s| {
            s.commit(Edit::DatabaseColumns(database, Snapshot::new(previous, next)));
            for record in records {
                let Some(values) = s.project.record(record).map(|r| r.values.clone()) else {
                    continue;
                };
                let mut padded = values.clone();
                padded.push(Value::new(""));
                s.commit(Edit::RecordValues(record, Snapshot::new(values, padded)));
            }
        });
        Some(id)
    }

    /// Remove a column and the matching value of every record.
    pub fn remove_column(&mut self, database: DatabaseId, column: ColumnId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(db) = session.project.database(database) else {
            return false;
        };
        let Some(index) = db.columns.iter().position(|c| c.id() == column) else {
            return false;
        };
        let previous = db.columns.clone();
        let records = db.records.clone();
        let mut next = previous.clone();
        next.remove(index);
        session.batch(|s| {
            s.commit(Edit::DatabaseColumns(database, Snapshot::new(previous, next)));
            for record in records {
                let Some(values) = s.project.record(record).map(|r| r.values.clone()) else {
                    continue;
                };
                if index < values.len() {
                    let mut trimmed = values.clone();
                    trimmed.remove(index);
                    s.commit(Edit::RecordValues(record, Snapshot::new(values, trimmed)));
                }
            }
        });
        true
    }

    /// Append a record. Values are matched to columns by position; missing ones are empty.
    pub fn add_record(&mut self, database: DatabaseId, values: &[&str]) -> Option<RecordId> {
        let session = self.session.as_mut()?;
        let db = session.project.database(database)?;
        let previous = db.records.clone();
        let values = (0..db.columns.len())
            .map(|i| Value::new(values.get(i).copied().unwrap_or_default()))
            .collect();
        let id = session.project.insert_record(Record::new(values));
        let mut next = previous.clone();
        next.push(id);
        session.commit(Edit::DatabaseRecords(database, Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_record(&mut self, database: DatabaseId, record: RecordId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.database(database).map(|d| d.records.clone()) else {
            return false;
        };
        let Some(next) = without(&previous, record) else {
            return false;
        };
        session.commit(Edit::DatabaseRecords(database, Snapshot::new(previous, next)));
        true
    }

    pub fn set_record_value(&mut self, record: RecordId, value: ValueId, content: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session
            .project
            .record(record)
            .and_then(|r| r.values.iter().find(|v| v.id() == value))
            .map(|v| v.content.clone())
        else {
            return false;
        };
        if previous == content {
            return false;
        }
        session.commit(Edit::ValueContent {
            record,
            value,
            content: Snapshot::new(previous, content.to_string()),
        });
        true
    }

    /// Bind a shape or page to a shared record, or unbind it.
    pub fn apply_record(&mut self, owner: Uuid, record: Option<RecordId>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if record.is_some_and(|r| session.project.record(r).is_none()) {
            return false;
        }
        let Some(previous) = session.project.data(owner).map(|d| d.record) else {
            return false;
        };
        if previous == record {
            return false;
        }
        session.commit(Edit::DataRecord(owner, Snapshot::new(previous, record)));
        true
    }

    pub fn add_property(&mut self, owner: Uuid, name: &str, value: &str) -> Option<PropertyId> {
        let session = self.session.as_mut()?;
        let previous = session.project.data(owner)?.properties.clone();
        let property = Property::new(name, value);
        let id = property.id();
        let mut next = previous.clone();
        next.push(property);
        session.commit(Edit::DataProperties(owner, Snapshot::new(previous, next)));
        Some(id)
    }

    pub fn remove_property(&mut self, owner: Uuid, property: PropertyId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session.project.data(owner).map(|d| d.properties.clone()) else {
            return false;
        };
        if !previous.iter().any(|p| p.id() == property) {
            return false;
        }
        let next = previous.iter().filter(|p| p.id() != property).cloned().collect();
        session.commit(Edit::DataProperties(owner, Snapshot::new(previous, next)));
        true
    }

    pub fn set_property_value(&mut self, owner: Uuid, property: PropertyId, value: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session
            .project
            .data(owner)
            .and_then(|d| d.properties.iter().find(|p| p.id() == property))
            .map(|p| p.value.clone())
        else {
            return false;
        };
        if previous == value {
            return false;
        }
        session.commit(Edit::PropertyValue {
            owner,
            property,
            value: Snapshot::new(previous, value.to_string()),
        });
        true
    }

    pub fn set_options(&mut self, options: Options) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.project.options.clone();
        if previous == options {
            return false;
        }
        session.commit(Edit::Options(Snapshot::new(previous, options)));
        true
    }

    /// Append a figure to a path shape.
    pub fn add_figure(&mut self, path: ShapeId, figure: PathFigure) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session
            .project
            .shape(path)
            .and_then(|s| s.as_path())
            .map(|p| p.geometry.figures.clone())
        else {
            return false;
        };
        let mut next = previous.clone();
        next.push(figure);
        session.commit(Edit::PathFigures(path, Snapshot::new(previous, next)));
        true
    }

    pub fn remove_figure(&mut self, path: ShapeId, figure: FigureId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session
            .project
            .shape(path)
            .and_then(|s| s.as_path())
            .map(|p| p.geometry.figures.clone())
        else {
            return false;
        };
        if !previous.iter().any(|f| f.id() == figure) {
            return false;
        }
        let next = previous.iter().filter(|f| f.id() != figure).cloned().collect();
        session.commit(Edit::PathFigures(path, Snapshot::new(previous, next)));
        true
    }

    /// Append a segment to a figure of a path shape.
    pub fn add_segment(&mut self, path: ShapeId, figure: FigureId, segment: PathSegment) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(previous) = session
            .project
            .shape(path)
            .and_then(|s| s.as_path())
            .and_then(|p| p.geometry.figure(figure))
            .map(|f| f.segments.clone())
        else {
            return false;
        };
        let mut next = previous.clone();
        next.push(segment);
        session.commit(Edit::FigureSegments {
            shape: path,
            figure,
            segments: Snapshot::new(previous, next),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_synced, loaded};
    use super::super::EditorEvent;
    use super::*;
    use crate::graph;
    use crate::shapes::{PathGeometry, PathShape, SegmentKind, ShapeKind};
    use crate::storage::{MemoryStorage, block_on};

    #[test]
    fn test_added_shapes_get_a_style() {
        let mut editor = loaded();
        let line = editor.add_line(Point::ZERO, Point::new(1.0, 1.0)).unwrap();
        let project = editor.project().unwrap();
        assert_eq!(project.shape(line).unwrap().style, project.current_style());

        let p = editor.create_point(3.0, 3.0).unwrap();
        let q = editor.create_point(6.0, 6.0).unwrap();
        let rect = editor.add_shape(Shape::rectangle(p, q)).unwrap();
        assert!(editor.project().unwrap().shape(rect).unwrap().style.is_some());
        assert_synced(&editor);
    }

    #[test]
    fn test_documents_pages_layers() {
        let mut editor = loaded();
        let document = editor.add_document("Second").unwrap();
        let page = editor.add_page(document, "Extra").unwrap();
        let layer = editor.add_layer(page, "Notes").unwrap();
        assert_synced(&editor);
        {
            let project = editor.project().unwrap();
            assert_eq!(project.document(document).unwrap().pages.len(), 2);
            assert_eq!(project.layer(layer).unwrap().owner, Some(page));
            assert_eq!(
                project.page(page).unwrap().template,
                project.current_template
            );
        }

        assert!(editor.remove_layer(page, layer));
        assert!(!editor.remove_layer(page, layer));
        assert!(editor.remove_page(document, page));
        assert!(editor.remove_document(document));
        assert_synced(&editor);
        assert!(!editor.project().unwrap().documents.contains(&document));

        editor.undo();
        assert!(editor.project().unwrap().documents.contains(&document));
        assert_synced(&editor);
    }

    #[test]
    fn test_removing_current_layer_restores_cursor_on_undo() {
        let mut editor = loaded();
        let page = editor.project().unwrap().current_page.unwrap();
        let first = editor.project().unwrap().current_layer().unwrap();
        let second = editor.add_layer(page, "Second").unwrap();
        assert!(editor.set_current_layer(second));
        let before = editor.project().unwrap().page(page).unwrap().clone();

        assert!(editor.remove_layer(page, second));
        assert_eq!(editor.project().unwrap().current_layer(), Some(first));
        assert!(editor.undo());
        assert_eq!(editor.project().unwrap().page(page).unwrap(), &before);
        assert!(editor.redo());
        assert_eq!(editor.project().unwrap().current_layer(), Some(first));
        assert!(editor.undo());

        let line = editor.add_line(Point::ZERO, Point::new(5.0, 0.0)).unwrap();
        assert!(editor.project().unwrap().layer(second).unwrap().contains(line));
        assert_synced(&editor);
    }

    #[test]
    fn test_replacing_current_layer_moves_cursor() {
        let mut editor = loaded();
        let page = editor.project().unwrap().current_page.unwrap();
        let old = editor.project().unwrap().current_layer().unwrap();
        let new = editor.replace_layer(page, old, Layer::new("Fresh")).unwrap();
        assert_eq!(editor.project().unwrap().current_layer(), Some(new));
        editor.undo();
        assert_eq!(editor.project().unwrap().current_layer(), Some(old));
    }

    #[test]
    fn test_removing_current_page_keeps_new_shapes_reachable() {
        let mut editor = loaded();
        let storage = MemoryStorage::new();
        let document = editor.project().unwrap().current_document.unwrap();
        let first = editor.project().unwrap().current_page.unwrap();
        let second = editor.add_page(document, "Second").unwrap();

        assert!(editor.remove_page(document, first));
        assert_eq!(editor.project().unwrap().current_page, Some(second));
        block_on(editor.save(&storage, "doc")).unwrap();
        editor.take_events();

        let line = editor.add_line(Point::ZERO, Point::new(5.0, 0.0)).unwrap();
        assert!(graph::reachable(editor.project().unwrap()).contains(&NodeId::Shape(line)));
        assert!(editor.is_dirty());
        assert!(editor.take_events().contains(&EditorEvent::DirtyChanged(true)));
        assert_synced(&editor);

        editor.undo();
        editor.undo();
        assert_eq!(editor.project().unwrap().current_page, Some(first));
        assert_synced(&editor);
    }

    #[test]
    fn test_removing_current_document_moves_both_cursors() {
        let mut editor = loaded();
        let first = editor.project().unwrap().current_document.unwrap();
        let page = editor.project().unwrap().current_page.unwrap();
        let second = editor.add_document("Second").unwrap();
        let second_page = editor.project().unwrap().document(second).unwrap().pages[0];

        assert!(editor.remove_document(first));
        let project = editor.project().unwrap();
        assert_eq!(project.current_document, Some(second));
        assert_eq!(project.current_page, Some(second_page));
        assert!(project.current_layer().is_some());

        editor.undo();
        let project = editor.project().unwrap();
        assert_eq!(project.current_document, Some(first));
        assert_eq!(project.current_page, Some(page));
        assert_synced(&editor);
    }

    #[test]
    fn test_templates() {
        let mut editor = loaded();
        let page = editor.project().unwrap().current_page.unwrap();
        let template = editor.add_template("Grid").unwrap();
        assert!(editor.apply_template(page, Some(template)));
        assert_eq!(editor.project().unwrap().page(page).unwrap().template, Some(template));
        assert!(!editor.apply_template(page, Some(Uuid::new_v4())));
        assert_synced(&editor);
        assert!(editor.remove_template(template));
        // Still referenced by the page.
        assert!(editor.session().unwrap().observer().is_attached(NodeId::Page(template)));
        assert_synced(&editor);
    }

    #[test]
    fn test_shared_style_edit_restyles_every_shape() {
        let mut editor = loaded();
        let a = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();
        let b = editor.add_line(Point::ZERO, Point::new(0.0, 1.0)).unwrap();
        let style = editor.project().unwrap().current_style().unwrap();
        let mut content = editor.project().unwrap().style(style).unwrap().clone();
        content.thickness = 9.0;
        editor.take_events();

        assert!(editor.set_style(style, content));
        let events = editor.take_events();
        assert!(events.contains(&EditorEvent::CacheInvalidated));
        let project = editor.project().unwrap();
        for id in [a, b] {
            let style = project.shape(id).unwrap().style.unwrap();
            assert_eq!(project.style(style).unwrap().thickness, 9.0);
        }
    }

    #[test]
    fn test_apply_style_shares_or_clones() {
        let mut editor = loaded();
        let library = editor.project().unwrap().current_style_library.unwrap();
        let red = editor.add_style(library, ShapeStyle::new("Red")).unwrap();
        let line = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();

        assert!(editor.apply_style(line, red));
        assert_eq!(editor.project().unwrap().shape(line).unwrap().style, Some(red));

        let mut options = editor.project().unwrap().options.clone();
        options.clone_style = true;
        editor.set_options(options);
        assert!(editor.apply_style(line, red));
        let applied = editor.project().unwrap().shape(line).unwrap().style.unwrap();
        assert_ne!(applied, red);
        assert_eq!(editor.project().unwrap().style(applied).unwrap().name, "Red");
        assert_synced(&editor);
    }

    #[test]
    fn test_library_items_keep_selected_valid() {
        let mut editor = loaded();
        let library = editor.project().unwrap().current_style_library.unwrap();
        let first = editor.project().unwrap().current_style().unwrap();
        let red = editor.add_style(library, ShapeStyle::new("Red")).unwrap();
        let blue = editor.add_style(library, ShapeStyle::new("Blue")).unwrap();

        assert!(editor.swap_items(library, 0, 2));
        assert!(editor.move_item(library, 0, 1));
        assert_eq!(
            editor.project().unwrap().style_library(library).unwrap().items,
            vec![red, blue, first]
        );
        assert!(!editor.swap_items(library, 0, 9));

        assert!(editor.select_library_item(library, red));
        assert!(!editor.select_library_item(library, Uuid::new_v4()));
        assert!(editor.remove_style(library, red));
        let lib = editor.project().unwrap().style_library(library).unwrap();
        assert_eq!(lib.selected(), lib.items.first().copied());
    }

    #[test]
    fn test_group_library() {
        let mut editor = loaded();
        let library = editor.project().unwrap().current_group_library.unwrap();
        let a = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();
        let group = editor.group(&[a], "G").unwrap();
        assert!(editor.add_group_to_library(library, group));
        assert!(!editor.add_group_to_library(library, a));
        assert!(editor.remove_group_from_library(library, group));
        assert_synced(&editor);
    }

    #[test]
    fn test_database_columns_and_records() {
        let mut editor = loaded();
        let db = editor.add_database("Parts", &["Name", "Price"]).unwrap();
        let record = editor.add_record(db, &["Bolt"]).unwrap();
        {
            let project = editor.project().unwrap();
            let values = &project.record(record).unwrap().values;
            assert_eq!(values.len(), 2);
            assert_eq!(values[0].content, "Bolt");
            assert_eq!(values[1].content, "");
        }

        let column = editor.add_column(db, "Stock").unwrap();
        assert_eq!(editor.project().unwrap().record(record).unwrap().values.len(), 3);
        let value = editor.project().unwrap().record(record).unwrap().values[2].id();
        assert!(editor.set_record_value(record, value, "12"));
        assert_synced(&editor);

        assert!(editor.remove_column(db, column));
        assert_eq!(editor.project().unwrap().record(record).unwrap().values.len(), 2);
        assert!(editor.undo());
        assert_eq!(
            editor.project().unwrap().record(record).unwrap().values[2].content,
            "12"
        );
        assert!(editor.remove_record(db, record));
        assert_synced(&editor);
    }

    #[test]
    fn test_shared_record_binding() {
        let mut editor = loaded();
        let db = editor.add_database("Parts", &["Name"]).unwrap();
        let record = editor.add_record(db, &["Nut"]).unwrap();
        let a = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();
        let b = editor.add_line(Point::ZERO, Point::new(0.0, 1.0)).unwrap();
        assert!(editor.apply_record(a, Some(record)));
        assert!(editor.apply_record(b, Some(record)));
        assert_eq!(
            graph::reference_counts(editor.project().unwrap())[&NodeId::Record(record)],
            3
        );
        assert!(editor.remove_record(db, record));
        assert!(editor.session().unwrap().observer().is_attached(NodeId::Record(record)));
        assert_synced(&editor);
    }

    #[test]
    fn test_properties() {
        let mut editor = loaded();
        let line = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();
        let page = editor.project().unwrap().current_page.unwrap();
        let p = editor.add_property(line, "Tag", "A").unwrap();
        let q = editor.add_property(page, "Title", "Plan").unwrap();
        assert!(editor.set_property_value(line, p, "B"));
        assert!(!editor.set_property_value(line, p, "B"));
        assert_eq!(
            editor.project().unwrap().data(line).unwrap().property("Tag").unwrap().value,
            "B"
        );
        assert!(editor.remove_property(page, q));
        assert_synced(&editor);
        editor.undo();
        editor.undo();
        assert_eq!(
            editor.project().unwrap().data(line).unwrap().property("Tag").unwrap().value,
            "A"
        );
        assert_synced(&editor);
    }

    #[test]
    fn test_path_figures_and_segments() {
        let mut editor = loaded();
        let a = editor.create_point(0.0, 0.0).unwrap();
        let path = editor
            .add_shape(Shape::new(ShapeKind::Path(PathShape::new(PathGeometry::default()))))
            .unwrap();
        let figure = PathFigure::new(a);
        let figure_id = figure.id();
        assert!(editor.add_figure(path, figure));
        let b = editor.create_point(10.0, 0.0).unwrap();
        let segment = PathSegment::new(SegmentKind::Line { point: b });
        assert!(editor.add_segment(path, figure_id, segment));
        assert!(editor.session().unwrap().observer().is_attached(NodeId::Shape(b)));
        assert_synced(&editor);

        assert!(editor.remove_figure(path, figure_id));
        assert!(!editor.session().unwrap().observer().is_attached(NodeId::Shape(b)));
        assert_synced(&editor);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut editor = loaded();
        let a = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();
        let b = editor.add_line(Point::ZERO, Point::new(0.0, 1.0)).unwrap();
        let p = editor.create_point(5.0, 5.0).unwrap();
        let q = editor.create_point(9.0, 9.0).unwrap();
        let rect = editor.replace_shape(a, Shape::rectangle(p, q)).unwrap();
        assert_eq!(editor.current_layer_shapes(), vec![rect, b]);
        let project = editor.project().unwrap();
        assert_eq!(project.shape(rect).unwrap().style, project.shape(a).unwrap().style);
        assert!(editor.replace_shape(Uuid::new_v4(), Shape::point(0.0, 0.0)).is_none());
        assert_synced(&editor);

        let library = editor.project().unwrap().current_style_library.unwrap();
        let first = editor.project().unwrap().current_style().unwrap();
        let green = editor.replace_style(library, first, ShapeStyle::new("Green")).unwrap();
        let lib = editor.project().unwrap().style_library(library).unwrap();
        assert_eq!(lib.items, vec![green]);
        assert_eq!(lib.selected(), Some(green));

        let page = editor.project().unwrap().current_page.unwrap();
        let old = editor.project().unwrap().page(page).unwrap().layers[0];
        let layer = editor.replace_layer(page, old, Layer::new("Fresh")).unwrap();
        assert_eq!(editor.project().unwrap().page(page).unwrap().layers, vec![layer]);
        assert_synced(&editor);

        let document = editor.project().unwrap().documents[0];
        let fresh = editor.replace_document(document, Document::new("Fresh")).unwrap();
        assert_eq!(editor.project().unwrap().documents, vec![fresh]);
        assert_synced(&editor);
        editor.undo();
        assert_eq!(editor.project().unwrap().documents, vec![document]);
    }

    #[test]
    fn test_page_background_and_point_position() {
        let mut editor = loaded();
        let page = editor.project().unwrap().current_page.unwrap();
        assert!(editor.set_page_background(page, ArgbColor::black()));
        assert!(!editor.set_page_background(page, ArgbColor::black()));
        let line = editor.add_line(Point::ZERO, Point::new(1.0, 0.0)).unwrap();
        let start = editor.project().unwrap().shape(line).unwrap().as_line().unwrap().start;
        assert!(editor.set_point_position(start, Point::new(4.0, 4.0)));
        editor.undo();
        assert_eq!(editor.project().unwrap().point_position(start), Some(Point::ZERO));
    }
}
