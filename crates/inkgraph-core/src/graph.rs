//! Graph topology: node identity, child enumeration, reachability and
//! mark-sweep garbage collection over the project arenas.

use crate::project::{
    ColumnId, DatabaseId, DocumentId, LayerId, LibraryId, PageId, Project, PropertyId, RecordId,
    ValueId,
};
use crate::shapes::{FigureId, SegmentId, ShapeId, ShapeKind, StyleId};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Identity of every mutable node a listener can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Project,
    Options,
    Document(DocumentId),
    Page(PageId),
    Layer(LayerId),
    Shape(ShapeId),
    Style(StyleId),
    Library(LibraryId),
    Database(DatabaseId),
    Column(DatabaseId, ColumnId),
    Record(RecordId),
    Value(RecordId, ValueId),
    /// Data context of a shape or page, keyed by its owner.
    Data(Uuid),
    Property(Uuid, PropertyId),
    /// Geometry of a path shape.
    Geometry(ShapeId),
    Figure(ShapeId, FigureId),
    Segment(ShapeId, SegmentId),
}

/// Nodes directly below `node`, one entry per reference (duplicates kept).
pub fn children(project: &Project, node: NodeId) -> Vec<NodeId> {
    match node {
        NodeId::Project => {
            let mut out = vec![NodeId::Options];
            out.extend(project.documents.iter().map(|&d| NodeId::Document(d)));
            out.extend(project.templates.iter().map(|&p| NodeId::Page(p)));
            out.extend(project.style_libraries.iter().map(|&l| NodeId::Library(l)));
            out.extend(project.group_libraries.iter().map(|&l| NodeId::Library(l)));
            out.extend(project.databases.iter().map(|&d| NodeId::Database(d)));
            out
        }
        NodeId::Options => project
            .options
            .point_shape
            .map(NodeId::Shape)
            .into_iter()
            .collect(),
        NodeId::Document(id) => project
            .document(id)
            .map(|d| d.pages.iter().map(|&p| NodeId::Page(p)).collect())
            .unwrap_or_default(),
        NodeId::Page(id) => {
            let Some(page) = project.page(id) else {
                return Vec::new();
            };
            let mut out: Vec<NodeId> = page.template.map(NodeId::Page).into_iter().collect();
            out.extend(page.all_layers().into_iter().map(NodeId::Layer));
            out.push(NodeId::Data(id));
            out
        }
        NodeId::Layer(id) => project
            .layer(id)
            .map(|l| l.shapes.iter().map(|&s| NodeId::Shape(s)).collect())
            .unwrap_or_default(),
        NodeId::Shape(id) => {
            let Some(shape) = project.shape(id) else {
                return Vec::new();
            };
            let mut out: Vec<NodeId> = shape.style.map(NodeId::Style).into_iter().collect();
            out.push(NodeId::Data(id));
            match &shape.kind {
                ShapeKind::Path(_) => out.push(NodeId::Geometry(id)),
                ShapeKind::Group(group) => {
                    out.extend(group.shapes.iter().map(|&s| NodeId::Shape(s)));
                    out.extend(group.connectors.iter().map(|&s| NodeId::Shape(s)));
                }
                _ => out.extend(shape.point_refs().into_iter().map(NodeId::Shape)),
            }
            out
        }
        NodeId::Library(id) => {
            if let Some(library) = project.style_library(id) {
                library.items.iter().map(|&s| NodeId::Style(s)).collect()
            } else if let Some(library) = project.group_library(id) {
                library.items.iter().map(|&s| NodeId::Shape(s)).collect()
            } else {
                Vec::new()
            }
        }
        NodeId::Database(id) => {
            let Some(db) = project.database(id) else {
                return Vec::new();
            };
            let mut out: Vec<NodeId> =
                db.columns.iter().map(|c| NodeId::Column(id, c.id())).collect();
            out.extend(db.records.iter().map(|&r| NodeId::Record(r)));
            out
        }
        NodeId::Record(id) => project
            .record(id)
            .map(|r| r.values.iter().map(|v| NodeId::Value(id, v.id())).collect())
            .unwrap_or_default(),
        NodeId::Data(owner) => {
            let Some(data) = project.data(owner) else {
                return Vec::new();
            };
            let mut out: Vec<NodeId> = data
                .properties
                .iter()
                .map(|p| NodeId::Property(owner, p.id()))
                .collect();
            out.extend(data.record.map(NodeId::Record));
            out
        }
        NodeId::Geometry(id) => project
            .shape(id)
            .and_then(|s| s.as_path())
            .map(|p| {
                p.geometry
                    .figures
                    .iter()
                    .map(|f| NodeId::Figure(id, f.id()))
                    .collect()
            })
            .unwrap_or_default(),
        NodeId::Figure(shape, figure) => {
            let Some(f) = project
                .shape(shape)
                .and_then(|s| s.as_path())
                .and_then(|p| p.geometry.figure(figure))
            else {
                return Vec::new();
            };
            let mut out = vec![NodeId::Shape(f.start)];
            out.extend(f.segments.iter().map(|s| NodeId::Segment(shape, s.id())));
            out
        }
        NodeId::Segment(shape, segment) => project
            .shape(shape)
            .and_then(|s| s.as_path())
            .and_then(|p| p.geometry.segment(segment))
            .map(|s| s.points().into_iter().map(NodeId::Shape).collect())
            .unwrap_or_default(),
        NodeId::Style(_) | NodeId::Column(..) | NodeId::Value(..) | NodeId::Property(..) => {
            Vec::new()
        }
    }
}

/// Every node reachable from the project root.
pub fn reachable(project: &Project) -> HashSet<NodeId> {
    reachable_from(project, [NodeId::Project])
}

/// Every node reachable from the given roots.
pub fn reachable_from(
    project: &Project,
    roots: impl IntoIterator<Item = NodeId>,
) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut stack: Vec<NodeId> = roots.into_iter().collect();
    while let Some(node) = stack.pop() {
        if visited.insert(node) {
            stack.extend(children(project, node));
        }
    }
    visited
}

/// Number of reachable references to each reachable node. The root counts once.
pub fn reference_counts(project: &Project) -> HashMap<NodeId, usize> {
    let mut counts = HashMap::from([(NodeId::Project, 1)]);
    for node in reachable(project) {
        for child in children(project, node) {
            *counts.entry(child).or_insert(0) += 1;
        }
    }
    counts
}

/// What a garbage collection pass removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GarbageStats {
    pub documents: usize,
    pub pages: usize,
    pub layers: usize,
    pub shapes: usize,
    pub styles: usize,
    pub libraries: usize,
    pub databases: usize,
    pub records: usize,
}

impl GarbageStats {
    pub fn total(&self) -> usize {
        self.documents
            + self.pages
            + self.layers
            + self.shapes
            + self.styles
            + self.libraries
            + self.databases
            + self.records
    }
}

/// Mark-sweep the arenas. Anything not reachable from the root or from
/// `extra_roots` (for example, nodes referenced by undo history) is dropped.
pub fn collect_garbage(
    project: &mut Project,
    extra_roots: impl IntoIterator<Item = NodeId>,
) -> GarbageStats {
    let roots = std::iter::once(NodeId::Project).chain(extra_roots);
    let marked = reachable_from(project, roots);
    let live = |node: NodeId| marked.contains(&node);

    let mut stats = GarbageStats::default();
    stats.documents = sweep(&mut project.document_arena, |id| live(NodeId::Document(*id)));
    stats.pages = sweep(&mut project.page_arena, |id| live(NodeId::Page(*id)));
    stats.layers = sweep(&mut project.layer_arena, |id| live(NodeId::Layer(*id)));
    stats.shapes = sweep(&mut project.shape_arena, |id| live(NodeId::Shape(*id)));
    stats.styles = sweep(&mut project.style_arena, |id| live(NodeId::Style(*id)));
    stats.libraries = sweep(&mut project.style_library_arena, |id| live(NodeId::Library(*id)))
        + sweep(&mut project.group_library_arena, |id| live(NodeId::Library(*id)));
    stats.databases = sweep(&mut project.database_arena, |id| live(NodeId::Database(*id)));
    stats.records = sweep(&mut project.record_arena, |id| live(NodeId::Record(*id)));

    if stats.total() > 0 {
        log::debug!("Collected {} unreachable nodes: {:?}", stats.total(), stats);
    }
    stats
}

fn sweep<T>(arena: &mut HashMap<Uuid, T>, keep: impl Fn(&Uuid) -> bool) -> usize {
    let before = arena.len();
    arena.retain(|id, _| keep(id));
    before - arena.len()
}

/// Image keys used by image shapes reachable from the root.
pub fn used_image_keys(project: &Project) -> HashSet<String> {
    reachable(project)
        .into_iter()
        .filter_map(|node| match node {
            NodeId::Shape(id) => project.shape(id),
            _ => None,
        })
        .filter_map(|shape| match &shape.kind {
            ShapeKind::Image(image) => Some(image.key.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ImageShape, Shape};
    use kurbo::Point;

    fn project_with_shared_point() -> (Project, ShapeId, ShapeId, ShapeId) {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let a = project.create_point(0.0, 0.0);
        let b = project.create_point(10.0, 0.0);
        let c = project.create_point(10.0, 10.0);
        let l1 = project.insert_shape(Shape::line(a, b));
        let l2 = project.insert_shape(Shape::line(b, c));
        project.layer_mut(layer).unwrap().shapes.extend([l1, l2]);
        (project, l1, l2, b)
    }

    #[test]
    fn test_reachable_includes_shared_point_once() {
        let (project, l1, l2, b) = project_with_shared_point();
        let nodes = reachable(&project);
        assert!(nodes.contains(&NodeId::Shape(l1)));
        assert!(nodes.contains(&NodeId::Shape(l2)));
        assert!(nodes.contains(&NodeId::Shape(b)));
        assert_eq!(reference_counts(&project)[&NodeId::Shape(b)], 2);
    }

    #[test]
    fn test_garbage_collection_keeps_shared_points() {
        let (mut project, l1, l2, b) = project_with_shared_point();
        let layer = project.current_layer().unwrap();
        project.layer_mut(layer).unwrap().shapes.retain(|&s| s != l1);

        let stats = collect_garbage(&mut project, []);
        // l1 and its unshared start point.
        assert_eq!(stats.shapes, 2);
        assert!(project.shape(l1).is_none());
        assert!(project.shape(l2).is_some());
        assert!(project.shape(b).is_some());
    }

    #[test]
    fn test_extra_roots_survive_collection() {
        let mut project = Project::with_defaults("Test");
        let line = project.create_line(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        let stats = collect_garbage(&mut project, [NodeId::Shape(line)]);
        assert_eq!(stats.shapes, 0);
        let stats = collect_garbage(&mut project, []);
        assert_eq!(stats.shapes, 3);
    }

    #[test]
    fn test_used_image_keys() {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let used = project.images.add(b"used");
        project.images.add(b"unused");
        let tl = project.create_point(0.0, 0.0);
        let br = project.create_point(10.0, 10.0);
        let kind = ShapeKind::Image(ImageShape::new(tl, br, used.clone()));
        let image = project.insert_shape(Shape::new(kind));
        project.layer_mut(layer).unwrap().shapes.push(image);

        let keys = used_image_keys(&project);
        assert_eq!(keys, HashSet::from([used]));
    }
}
