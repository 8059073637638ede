//! Change observation.
//!
//! The observer keeps one listener per reachable node, counted once per
//! incoming reference. A shared point referenced by two lines has a count of
//! two and stays attached until both references are gone. After every change
//! the changed node's recorded children are diffed against its current
//! children and the difference is attached or detached.

use crate::graph::{self, NodeId};
use crate::history::{Change, Field};
use crate::project::{LayerId, PageId, Project};
use std::collections::{HashMap, HashSet};

/// Granularity of a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedrawTarget {
    Canvas,
    Page(PageId),
    Layer(LayerId),
}

/// What a change means to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The project differs from its saved state.
    MarkDirty,
    Redraw(RedrawTarget),
    /// Cached render geometry is stale.
    InvalidateCache,
    /// Style library views need refreshing.
    RedrawStyles,
}

#[derive(Debug, Default)]
pub struct Observer {
    listeners: HashMap<NodeId, usize>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Observer {
    /// Attach to every node reachable from the project root.
    pub fn new(project: &Project) -> Self {
        let mut observer = Self::default();
        observer.attach(project, NodeId::Project);
        log::debug!("Observer attached {} nodes", observer.listeners.len());
        observer
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.listeners.contains_key(&node)
    }

    /// Number of attached references to `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(&node).copied().unwrap_or(0)
    }

    /// Every node with a listener.
    pub fn attached(&self) -> HashSet<NodeId> {
        self.listeners.keys().copied().collect()
    }

    /// Attach counts, keyed by node.
    pub fn counts(&self) -> &HashMap<NodeId, usize> {
        &self.listeners
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn attach(&mut self, project: &Project, node: NodeId) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            let count = self.listeners.entry(node).or_insert(0);
            *count += 1;
            if *count == 1 {
                let children = graph::children(project, node);
                stack.extend(children.iter().copied());
                self.children.insert(node, children);
            }
        }
    }

    fn detach(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            let Some(count) = self.listeners.get_mut(&node) else {
                log::warn!("Detaching unattached node {:?}", node);
                continue;
            };
            *count -= 1;
            if *count == 0 {
                self.listeners.remove(&node);
                if let Some(children) = self.children.remove(&node) {
                    stack.extend(children);
                }
            }
        }
    }

    /// Resync the changed node's subtree and translate the change into signals.
    pub fn on_change(&mut self, project: &Project, change: &Change) -> Vec<Signal> {
        if !self.is_attached(change.node) {
            // Edits on detached nodes (for example inside a group that is not on
            // a layer yet) are picked up when the node is attached.
            return Vec::new();
        }
        self.resync(project, change.node);
        signals_for(change)
    }

    fn resync(&mut self, project: &Project, node: NodeId) {
        let current = graph::children(project, node);
        let recorded = self.children.insert(node, current.clone()).unwrap_or_default();

        let mut delta: HashMap<NodeId, isize> = HashMap::new();
        for child in &current {
            *delta.entry(*child).or_insert(0) += 1;
        }
        for child in &recorded {
            *delta.entry(*child).or_insert(0) -= 1;
        }

        // Attach before detaching so that nodes moving between parents in one
        // batch keep their listeners.
        let mut added = 0;
        let mut removed = Vec::new();
        for (child, diff) in delta {
            if diff > 0 {
                for _ in 0..diff {
                    self.attach(project, child);
                }
                added += diff;
            } else if diff < 0 {
                removed.push((child, -diff));
            }
        }
        for (child, times) in &removed {
            for _ in 0..*times {
                self.detach(*child);
            }
        }
        if added > 0 || !removed.is_empty() {
            log::debug!(
                "Resynced {:?}: +{} -{}",
                node,
                added,
                removed.iter().map(|(_, n)| n).sum::<isize>()
            );
        }
    }

    /// Detach every listener.
    pub fn dispose(&mut self) {
        if self.is_attached(NodeId::Project) {
            self.detach(NodeId::Project);
        }
        if !self.listeners.is_empty() {
            log::warn!("{} listeners left after dispose", self.listeners.len());
        }
        self.listeners.clear();
        self.children.clear();
    }
}

fn signals_for(change: &Change) -> Vec<Signal> {
    if change.field == Field::Selected {
        return vec![Signal::RedrawStyles];
    }
    if change.field == Field::Current {
        return vec![Signal::Redraw(RedrawTarget::Canvas)];
    }
    match change.node {
        NodeId::Style(_) | NodeId::Geometry(_) | NodeId::Figure(..) | NodeId::Segment(..) => vec![
            Signal::InvalidateCache,
            Signal::Redraw(RedrawTarget::Canvas),
            Signal::MarkDirty,
        ],
        NodeId::Shape(_) if change.field == Field::Style => vec![
            Signal::InvalidateCache,
            Signal::Redraw(RedrawTarget::Canvas),
            Signal::MarkDirty,
        ],
        NodeId::Library(_) => vec![Signal::MarkDirty, Signal::RedrawStyles],
        NodeId::Layer(id) => vec![Signal::MarkDirty, Signal::Redraw(RedrawTarget::Layer(id))],
        NodeId::Page(id) => vec![Signal::MarkDirty, Signal::Redraw(RedrawTarget::Page(id))],
        _ => vec![Signal::MarkDirty, Signal::Redraw(RedrawTarget::Canvas)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{Edit, History, Snapshot};
    use crate::shapes::{LineEnd, Shape, ShapeStyle};
    use kurbo::Point;

    fn assert_synced(observer: &Observer, project: &Project) {
        assert_eq!(observer.attached(), graph::reachable(project));
        assert_eq!(observer.counts(), &graph::reference_counts(project));
    }

    fn commit(
        project: &mut Project,
        history: &mut History,
        observer: &mut Observer,
        edit: Edit,
    ) -> Vec<Signal> {
        let changes = history.commit(project, edit);
        changes
            .iter()
            .flat_map(|c| observer.on_change(project, c))
            .collect()
    }

    fn undo(project: &mut Project, history: &mut History, observer: &mut Observer) {
        for change in history.undo(project).unwrap() {
            observer.on_change(project, &change);
        }
    }

    #[test]
    fn test_new_observer_matches_reachable_graph() {
        let project = Project::with_defaults("Test");
        let observer = Observer::new(&project);
        assert_synced(&observer, &project);
    }

    #[test]
    fn test_add_and_remove_shape() {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let mut observer = Observer::new(&project);
        let mut history = History::new();
        let line = project.create_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));

        let signals = commit(
            &mut project,
            &mut history,
            &mut observer,
            Edit::LayerShapes(layer, Snapshot::new(vec![], vec![line])),
        );
        assert!(observer.is_attached(NodeId::Shape(line)));
        assert!(signals.contains(&Signal::MarkDirty));
        assert!(signals.contains(&Signal::Redraw(RedrawTarget::Layer(layer))));
        assert_synced(&observer, &project);

        undo(&mut project, &mut history, &mut observer);
        assert!(!observer.is_attached(NodeId::Shape(line)));
        assert_synced(&observer, &project);
    }

    #[test]
    fn test_shared_point_survives_until_last_reference() {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let a = project.create_point(0.0, 0.0);
        let b = project.create_point(10.0, 0.0);
        let c = project.create_point(10.0, 10.0);
        let l1 = project.insert_shape(Shape::line(a, b));
        let l2 = project.insert_shape(Shape::line(b, c));
        project.layer_mut(layer).unwrap().shapes.extend([l1, l2]);
        let mut observer = Observer::new(&project);
        let mut history = History::new();
        assert_eq!(observer.listener_count(NodeId::Shape(b)), 2);

        commit(
            &mut project,
            &mut history,
            &mut observer,
            Edit::LayerShapes(layer, Snapshot::new(vec![l1, l2], vec![l2])),
        );
        assert!(observer.is_attached(NodeId::Shape(b)));
        assert!(!observer.is_attached(NodeId::Shape(a)));
        assert_eq!(observer.listener_count(NodeId::Shape(b)), 1);
        assert_synced(&observer, &project);
    }

    #[test]
    fn test_replacing_endpoint_moves_listener() {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let line = project.create_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        project.layer_mut(layer).unwrap().shapes.push(line);
        let start = project.shape(line).unwrap().as_line().unwrap().start;
        let replacement = project.create_point(3.0, 0.0);
        let mut observer = Observer::new(&project);
        let mut history = History::new();

        commit(
            &mut project,
            &mut history,
            &mut observer,
            Edit::LineEndpoint {
                line,
                end: LineEnd::Start,
                point: Snapshot::new(start, replacement),
            },
        );
        assert!(observer.is_attached(NodeId::Shape(replacement)));
        assert!(!observer.is_attached(NodeId::Shape(start)));
        assert_synced(&observer, &project);

        undo(&mut project, &mut history, &mut observer);
        assert!(observer.is_attached(NodeId::Shape(start)));
        assert_synced(&observer, &project);
    }

    #[test]
    fn test_batch_moving_shapes_into_group_keeps_listeners() {
        let mut project = Project::with_defaults("Test");
        let layer = project.current_layer().unwrap();
        let l1 = project.create_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let l2 = project.create_line(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        project.layer_mut(layer).unwrap().shapes.extend([l1, l2]);
        let group = project.insert_shape(Shape::group("g"));
        let mut observer = Observer::new(&project);
        let mut history = History::new();

        let edit = Edit::Batch(vec![
            Edit::GroupShapes(group, Snapshot::new(vec![], vec![l1, l2])),
            Edit::LayerShapes(layer, Snapshot::new(vec![l1, l2], vec![group])),
        ]);
        commit(&mut project, &mut history, &mut observer, edit);
        assert!(observer.is_attached(NodeId::Shape(group)));
        assert_eq!(observer.listener_count(NodeId::Shape(l1)), 1);
        assert_synced(&observer, &project);

        undo(&mut project, &mut history, &mut observer);
        assert!(!observer.is_attached(NodeId::Shape(group)));
        assert_synced(&observer, &project);
    }

    #[test]
    fn test_style_change_invalidates_cache() {
        let mut project = Project::with_defaults("Test");
        let style = project.current_style().unwrap();
        let mut observer = Observer::new(&project);
        let mut history = History::new();
        let previous = project.style(style).unwrap().clone();
        let mut next = previous.clone();
        next.thickness = 5.0;

        let signals = commit(
            &mut project,
            &mut history,
            &mut observer,
            Edit::StyleContent(style, Snapshot::new(previous, next)),
        );
        assert!(signals.contains(&Signal::InvalidateCache));
        assert!(signals.contains(&Signal::MarkDirty));
    }

    #[test]
    fn test_library_selection_does_not_dirty() {
        let mut project = Project::with_defaults("Test");
        let library = project.current_style_library.unwrap();
        let mut observer = Observer::new(&project);
        let style = project.insert_style(ShapeStyle::new("Other"));
        let change = Change::new(NodeId::Library(library), Field::Selected);
        let signals = observer.on_change(&project, &change);
        assert_eq!(signals, vec![Signal::RedrawStyles]);
        assert!(!observer.is_attached(NodeId::Style(style)));
    }

    #[test]
    fn test_cursor_moves_redraw_without_dirtying() {
        let mut project = Project::with_defaults("Test");
        let mut history = History::new();
        let mut observer = Observer::new(&project);
        let page = project.current_page.unwrap();
        let edit = Edit::CurrentPage(Snapshot::new(Some(page), None));

        let signals = commit(&mut project, &mut history, &mut observer, edit);
        assert_eq!(signals, vec![Signal::Redraw(RedrawTarget::Canvas)]);
        assert_synced(&observer, &project);
    }

    #[test]
    fn test_dispose_detaches_everything() {
        let project = Project::with_defaults("Test");
        let mut observer = Observer::new(&project);
        assert!(!observer.is_empty());
        observer.dispose();
        assert!(observer.is_empty());
    }
}
