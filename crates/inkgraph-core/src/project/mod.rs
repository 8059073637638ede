//! The project: the root of the document graph and the arenas that own every node.

mod containers;
mod data;
mod images;
mod library;
mod options;

pub use containers::{Document, Layer, Page};
pub use data::{Column, DataContext, Database, Property, Record, Value};
pub use images::ImageCache;
pub use library::Library;
pub use options::{DEFAULT_HIT_THRESHOLD, MoveMode, Options};

use crate::shapes::{Shape, ShapeId, ShapeKind, ShapeStyle, StyleId};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub type DocumentId = Uuid;
pub type PageId = Uuid;
pub type LayerId = Uuid;
pub type LibraryId = Uuid;
pub type DatabaseId = Uuid;
pub type ColumnId = Uuid;
pub type RecordId = Uuid;
pub type ValueId = Uuid;
pub type PropertyId = Uuid;

/// A style library.
pub type StyleLibrary = Library<StyleId>;

/// A library of reusable groups.
pub type GroupLibrary = Library<ShapeId>;

/// Root of the graph.
///
/// The ordered collections (`documents`, `templates`, ...) are the graph edges;
/// the arenas below them own the entities. An entity that is in an arena but no
/// longer reachable from the root is garbage until
/// [`collect_garbage`](crate::graph::collect_garbage) runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub(crate) id: Uuid,
    pub name: String,
    #[serde(default)]
    pub options: Options,
    pub documents: Vec<DocumentId>,
    #[serde(default)]
    pub templates: Vec<PageId>,
    #[serde(default)]
    pub style_libraries: Vec<LibraryId>,
    #[serde(default)]
    pub group_libraries: Vec<LibraryId>,
    #[serde(default)]
    pub databases: Vec<DatabaseId>,
    #[serde(default)]
    pub current_document: Option<DocumentId>,
    #[serde(default)]
    pub current_page: Option<PageId>,
    #[serde(default)]
    pub current_template: Option<PageId>,
    #[serde(default)]
    pub current_style_library: Option<LibraryId>,
    #[serde(default)]
    pub current_group_library: Option<LibraryId>,
    #[serde(default)]
    pub current_database: Option<DatabaseId>,
    #[serde(default)]
    pub images: ImageCache,

    #[serde(default)]
    pub(crate) document_arena: HashMap<DocumentId, Document>,
    #[serde(default)]
    pub(crate) page_arena: HashMap<PageId, Page>,
    #[serde(default)]
    pub(crate) layer_arena: HashMap<LayerId, Layer>,
    #[serde(default)]
    pub(crate) shape_arena: HashMap<ShapeId, Shape>,
    #[serde(default)]
    pub(crate) style_arena: HashMap<StyleId, ShapeStyle>,
    #[serde(default)]
    pub(crate) style_library_arena: HashMap<LibraryId, StyleLibrary>,
    #[serde(default)]
    pub(crate) group_library_arena: HashMap<LibraryId, GroupLibrary>,
    #[serde(default)]
    pub(crate) database_arena: HashMap<DatabaseId, Database>,
    #[serde(default)]
    pub(crate) record_arena: HashMap<RecordId, Record>,
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            options: Options::default(),
            documents: Vec::new(),
            templates: Vec::new(),
            style_libraries: Vec::new(),
            group_libraries: Vec::new(),
            databases: Vec::new(),
            current_document: None,
            current_page: None,
            current_template: None,
            current_style_library: None,
            current_group_library: None,
            current_database: None,
            images: ImageCache::default(),
            document_arena: HashMap::new(),
            page_arena: HashMap::new(),
            layer_arena: HashMap::new(),
            shape_arena: HashMap::new(),
            style_arena: HashMap::new(),
            style_library_arena: HashMap::new(),
            group_library_arena: HashMap::new(),
            database_arena: HashMap::new(),
            record_arena: HashMap::new(),
        }
    }

    /// Create a project with one document holding one page, a template,
    /// a style library with a default style and an empty group library.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        let mut project = Self::new(name);

        let template = project.create_page("Template");
        project.templates.push(template);
        project.current_template = Some(template);

        let page = project.create_page("Page");
        if let Some(p) = project.page_mut(page) {
            p.template = Some(template);
        }
        let mut document = Document::new("Document");
        document.pages.push(page);
        let document_id = project.insert_document(document);
        project.documents.push(document_id);
        project.current_document = Some(document_id);
        project.current_page = Some(page);

        let style = project.insert_style(ShapeStyle::new("Default"));
        let mut styles = StyleLibrary::new("Default");
        styles.set_items(vec![style]);
        let styles = project.insert_style_library(styles);
        project.style_libraries.push(styles);
        project.current_style_library = Some(styles);

        let groups = project.insert_group_library(GroupLibrary::new("Default"));
        project.group_libraries.push(groups);
        project.current_group_library = Some(groups);

        project
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Insert a page with one content layer plus its working and helper layers.
    /// The page is not linked into any document.
    pub fn create_page(&mut self, name: impl Into<String>) -> PageId {
        let working = self.insert_layer(Layer::new("Working"));
        let helper = self.insert_layer(Layer::new("Helper"));
        let content = self.insert_layer(Layer::new("Layer1"));
        let mut page = Page::new(name, working, helper);
        page.layers.push(content);
        page.current_layer = Some(content);
        let id = page.id;
        for layer in [working, helper, content] {
            if let Some(l) = self.layer_mut(layer) {
                l.owner = Some(id);
            }
        }
        self.page_arena.insert(id, page);
        id
    }

    /// Insert a point shape and return its handle.
    pub fn create_point(&mut self, x: f64, y: f64) -> ShapeId {
        self.insert_shape(Shape::point(x, y))
    }

    /// Insert a line between two new points.
    pub fn create_line(&mut self, start: Point, end: Point) -> ShapeId {
        let s = self.create_point(start.x, start.y);
        let e = self.create_point(end.x, end.y);
        self.insert_shape(Shape::line(s, e))
    }

    pub fn insert_document(&mut self, document: Document) -> DocumentId {
        let id = document.id;
        self.document_arena.insert(id, document);
        id
    }

    pub fn insert_page(&mut self, page: Page) -> PageId {
        let id = page.id;
        self.page_arena.insert(id, page);
        id
    }

    pub fn insert_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layer_arena.insert(id, layer);
        id
    }

    pub fn insert_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id;
        self.shape_arena.insert(id, shape);
        id
    }

    pub fn insert_style(&mut self, style: ShapeStyle) -> StyleId {
        let id = style.id;
        self.style_arena.insert(id, style);
        id
    }

    pub fn insert_style_library(&mut self, library: StyleLibrary) -> LibraryId {
        let id = library.id;
        self.style_library_arena.insert(id, library);
        id
    }

    pub fn insert_group_library(&mut self, library: GroupLibrary) -> LibraryId {
        let id = library.id;
        self.group_library_arena.insert(id, library);
        id
    }

    pub fn insert_database(&mut self, database: Database) -> DatabaseId {
        let id = database.id;
        self.database_arena.insert(id, database);
        id
    }

    pub fn insert_record(&mut self, record: Record) -> RecordId {
        let id = record.id;
        self.record_arena.insert(id, record);
        id
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.document_arena.get(&id)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.document_arena.get_mut(&id)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.page_arena.get(&id)
    }

    pub fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.page_arena.get_mut(&id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layer_arena.get(&id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layer_arena.get_mut(&id)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shape_arena.get(&id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shape_arena.get_mut(&id)
    }

    pub fn style(&self, id: StyleId) -> Option<&ShapeStyle> {
        self.style_arena.get(&id)
    }

    pub fn style_mut(&mut self, id: StyleId) -> Option<&mut ShapeStyle> {
        self.style_arena.get_mut(&id)
    }

    pub fn style_library(&self, id: LibraryId) -> Option<&StyleLibrary> {
        self.style_library_arena.get(&id)
    }

    pub fn style_library_mut(&mut self, id: LibraryId) -> Option<&mut StyleLibrary> {
        self.style_library_arena.get_mut(&id)
    }

    pub fn group_library(&self, id: LibraryId) -> Option<&GroupLibrary> {
        self.group_library_arena.get(&id)
    }

    pub fn group_library_mut(&mut self, id: LibraryId) -> Option<&mut GroupLibrary> {
        self.group_library_arena.get_mut(&id)
    }

    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.database_arena.get(&id)
    }

    pub fn database_mut(&mut self, id: DatabaseId) -> Option<&mut Database> {
        self.database_arena.get_mut(&id)
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.record_arena.get(&id)
    }

    pub fn record_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.record_arena.get_mut(&id)
    }

    /// Data context of a shape or page.
    pub fn data(&self, owner: Uuid) -> Option<&DataContext> {
        self.shape(owner)
            .map(|s| &s.data)
            .or_else(|| self.page(owner).map(|p| &p.data))
    }

    pub fn data_mut(&mut self, owner: Uuid) -> Option<&mut DataContext> {
        if self.shape_arena.contains_key(&owner) {
            return self.shape_mut(owner).map(|s| &mut s.data);
        }
        self.page_mut(owner).map(|p| &mut p.data)
    }

    /// Position of a point shape.
    pub fn point_position(&self, id: ShapeId) -> Option<Point> {
        self.shape(id)?.as_point().map(|p| p.position)
    }

    /// True when `page` belongs to a document on the project root.
    pub fn is_live_page(&self, page: PageId) -> bool {
        self.documents
            .iter()
            .filter_map(|d| self.document(*d))
            .any(|d| d.pages.contains(&page))
    }

    /// The current page, unless it has been removed from the document tree.
    pub fn active_page(&self) -> Option<PageId> {
        self.current_page.filter(|p| self.is_live_page(*p))
    }

    /// Layer that receives new shapes: the active page's current layer, or its
    /// first layer when the cursor is unset or stale.
    pub fn current_layer(&self) -> Option<LayerId> {
        let page = self.page(self.active_page()?)?;
        page.current_layer
            .filter(|l| page.layers.contains(l))
            .or_else(|| page.layers.first().copied())
    }

    /// Document and page cursors moved onto the tree: the current document if it
    /// is still on the root (else the first one) and the current page if it is one
    /// of that document's pages (else its first page).
    pub fn settled_cursors(&self) -> (Option<DocumentId>, Option<PageId>) {
        let document = self
            .current_document
            .filter(|d| self.documents.contains(d))
            .or_else(|| self.documents.first().copied());
        let pages = document
            .and_then(|d| self.document(d))
            .map(|d| d.pages.as_slice())
            .unwrap_or_default();
        let page = self
            .current_page
            .filter(|p| pages.contains(p))
            .or_else(|| pages.first().copied());
        (document, page)
    }

    /// Selected style of the current style library.
    pub fn current_style(&self) -> Option<StyleId> {
        self.style_library(self.current_style_library?)?.selected()
    }

    /// Content layer holding `shape` at top level, searching the current page first.
    pub fn layer_of(&self, shape: ShapeId) -> Option<LayerId> {
        let current = self.active_page().into_iter();
        let pages = current.chain(
            self.documents
                .iter()
                .filter_map(|d| self.document(*d))
                .flat_map(|d| d.pages.iter().copied()),
        );
        for page in pages.filter_map(|p| self.page(p)) {
            for layer in page.all_layers() {
                if self.layer(layer).is_some_and(|l| l.contains(shape)) {
                    return Some(layer);
                }
            }
        }
        None
    }

    /// Distinct point shapes under `shape`, recursing into groups. A point yields itself.
    pub fn collect_points(&self, shape: ShapeId, out: &mut Vec<ShapeId>) {
        let mut seen: HashSet<ShapeId> = out.iter().copied().collect();
        self.collect_points_into(shape, out, &mut seen);
    }

    fn collect_points_into(
        &self,
        id: ShapeId,
        out: &mut Vec<ShapeId>,
        seen: &mut HashSet<ShapeId>,
    ) {
        let Some(shape) = self.shape(id) else {
            return;
        };
        match &shape.kind {
            ShapeKind::Point(_) => {
                if seen.insert(id) {
                    out.push(id);
                }
            }
            ShapeKind::Group(group) => {
                for child in &group.shapes {
                    self.collect_points_into(*child, out, seen);
                }
                for connector in &group.connectors {
                    self.collect_points_into(*connector, out, seen);
                }
            }
            _ => {
                for point in shape.point_refs() {
                    self.collect_points_into(point, out, seen);
                }
            }
        }
    }

    /// Number of shapes in the arena, reachable or not.
    pub fn shape_arena_len(&self) -> usize {
        self.shape_arena.len()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults() {
        let project = Project::with_defaults("Test");
        assert_eq!(project.documents.len(), 1);
        assert_eq!(project.templates.len(), 1);
        assert!(project.current_layer().is_some());
        assert!(project.current_style().is_some());
        let page = project.page(project.current_page.unwrap()).unwrap();
        assert_eq!(page.template, project.current_template);
        assert_eq!(
            project.layer(page.working_layer).unwrap().owner,
            Some(page.id())
        );
    }

    #[test]
    fn test_collect_points_dedups_shared_points() {
        let mut project = Project::new("Test");
        let a = project.create_point(0.0, 0.0);
        let b = project.create_point(10.0, 0.0);
        let c = project.create_point(10.0, 10.0);
        let l1 = project.insert_shape(Shape::line(a, b));
        let l2 = project.insert_shape(Shape::line(b, c));
        let mut group = Shape::group("g");
        group.as_group_mut().unwrap().shapes = vec![l1, l2];
        let g = project.insert_shape(group);

        let mut points = Vec::new();
        project.collect_points(g, &mut points);
        assert_eq!(points, vec![a, b, c]);
    }

    #[test]
    fn test_detached_page_has_no_current_layer() {
        let mut project = Project::with_defaults("Test");
        let document = project.current_document.unwrap();
        let page = project.current_page.unwrap();
        let loose = project.create_page("Loose");

        project.current_page = Some(loose);
        assert!(!project.is_live_page(loose));
        assert_eq!(project.current_layer(), None);
        assert_eq!(project.settled_cursors(), (Some(document), Some(page)));

        project.documents.clear();
        assert_eq!(project.settled_cursors(), (None, None));
    }

    #[test]
    fn test_layer_of() {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let line = project.create_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        project.layer_mut(layer).unwrap().shapes.push(line);
        assert_eq!(project.layer_of(line), Some(layer));
        assert_eq!(project.layer_of(Uuid::new_v4()), None);
    }

    #[test]
    fn test_serde_roundtrip_keeps_sharing() {
        let mut project = Project::with_defaults("Test");
        let a = project.create_point(0.0, 0.0);
        let b = project.create_point(5.0, 0.0);
        let c = project.create_point(5.0, 5.0);
        let l1 = project.insert_shape(Shape::line(a, b));
        let l2 = project.insert_shape(Shape::line(b, c));
        let json = serde_json::to_string(&project).unwrap();
        let loaded: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(
            loaded.shape(l1).unwrap().as_line().unwrap().end,
            loaded.shape(l2).unwrap().as_line().unwrap().start
        );
        assert_eq!(loaded, project);
    }
}
