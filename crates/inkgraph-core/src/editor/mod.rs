//! Editing session and the facade every mutation goes through.
//!
//! An [`Editor`] holds at most one [`Session`]. With no session loaded every
//! operation is a no-op that returns `false`, `None` or an empty list.

mod clipboard;
mod connect;
mod mutations;
mod selection;

pub use clipboard::{ImportPayload, ShapeBundle};
pub use selection::Selection;

use crate::graph::{self, NodeId};
use crate::history::{Change, Edit, Field, History};
use crate::observer::{Observer, RedrawTarget, Signal};
use crate::project::Project;
use crate::storage::{Storage, StorageError};
use thiserror::Error;

/// Events for collaborators (renderer, window title, style panel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    Redraw(RedrawTarget),
    StylesChanged,
    CacheInvalidated,
    /// The dirty flag flipped.
    DirtyChanged(bool),
}

/// Errors surfaced at the load and import boundary.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No project is loaded")]
    NoProject,
    #[error("Unsupported import kind: {0}")]
    UnsupportedImport(String),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type EditorResult<T> = Result<T, EditorError>;

/// A loaded project with its history, observer and selection.
#[derive(Debug)]
pub struct Session {
    pub(crate) project: Project,
    pub(crate) history: History,
    observer: Observer,
    path: Option<String>,
    dirty: bool,
    pub(crate) selection: Selection,
    events: Vec<EditorEvent>,
}

impl Session {
    fn new(project: Project, path: Option<String>) -> Self {
        let observer = Observer::new(&project);
        Self {
            project,
            history: History::new(),
            observer,
            path,
            dirty: false,
            selection: Selection::None,
            events: Vec::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply an edit, record it and propagate its changes.
    pub(crate) fn commit(&mut self, edit: Edit) {
        if edit.is_noop() {
            return;
        }
        let changes = self.history.commit(&mut self.project, edit);
        self.dispatch(&changes);
    }

    /// Run `f` with every committed edit collected into one undo step.
    pub(crate) fn batch<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        self.history.begin_batch();
        let result = f(self);
        self.history.end_batch();
        result
    }

    /// Feed changes to the observer and turn its signals into events.
    pub(crate) fn dispatch(&mut self, changes: &[Change]) {
        for change in changes {
            for signal in self.observer.on_change(&self.project, change) {
                match signal {
                    Signal::MarkDirty => self.set_dirty(true),
                    Signal::Redraw(target) => self.emit(EditorEvent::Redraw(target)),
                    Signal::InvalidateCache => self.emit(EditorEvent::CacheInvalidated),
                    Signal::RedrawStyles => self.emit(EditorEvent::StylesChanged),
                }
            }
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
    }

    fn set_dirty(&mut self, dirty: bool) {
        if self.dirty != dirty {
            self.dirty = dirty;
            self.events.push(EditorEvent::DirtyChanged(dirty));
        }
    }

    /// Pull the document and page cursors back onto the tree after undo or redo
    /// removed the nodes they were moved to.
    fn repair_cursors(&mut self) {
        let (document, page) = self.project.settled_cursors();
        if (document, page) == (self.project.current_document, self.project.current_page) {
            return;
        }
        self.project.current_document = document;
        self.project.current_page = page;
        self.dispatch(&[Change::new(NodeId::Project, Field::Current)]);
    }

    /// Drop unreachable arena entries, keeping anything the history can restore.
    fn collect_garbage(&mut self) -> usize {
        let roots: Vec<NodeId> = self.history.references();
        graph::collect_garbage(&mut self.project, roots).total()
    }
}

/// Facade over the loaded session.
#[derive(Debug, Default)]
pub struct Editor {
    session: Option<Session>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a project with a fresh history and observer. Any loaded project is unloaded first.
    pub fn load(&mut self, project: Project, path: Option<String>) {
        if self.session.is_some() {
            self.unload();
        }
        log::info!("Loading project '{}' ({})", project.name, project.id());
        self.session = Some(Session::new(project, path));
    }

    /// Tear down the session and hand the project back.
    pub fn unload(&mut self) -> Option<Project> {
        let mut session = self.session.take()?;
        session.observer.dispose();
        session.history.reset();
        let used = graph::used_image_keys(&session.project);
        let purged = session.project.images.purge_unused(&used);
        let collected = graph::collect_garbage(&mut session.project, []).total();
        log::info!(
            "Unloaded project '{}' (purged {} images, collected {} nodes)",
            session.project.name,
            purged,
            collected
        );
        Some(session.project)
    }

    /// Load a project from storage. The loaded project is only replaced once
    /// the new one has been read successfully.
    pub async fn open(&mut self, storage: &dyn Storage, id: &str) -> EditorResult<()> {
        let project = storage.load(id).await.inspect_err(|e| {
            log::warn!("Failed to open '{}': {}", id, e);
        })?;
        self.load(project, Some(id.to_string()));
        Ok(())
    }

    /// Save the project to storage and clear the dirty flag.
    pub async fn save(&mut self, storage: &dyn Storage, id: &str) -> EditorResult<()> {
        let session = self.session.as_mut().ok_or(EditorError::NoProject)?;
        let collected = session.collect_garbage();
        if collected > 0 {
            log::debug!("Collected {} unreachable nodes before save", collected);
        }
        storage.save(id, &session.project).await.inspect_err(|e| {
            log::warn!("Failed to save '{}': {}", id, e);
        })?;
        session.path = Some(id.to_string());
        session.set_dirty(false);
        log::info!("Saved project '{}' as '{}'", session.project.name, id);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn project(&self) -> Option<&Project> {
        self.session.as_ref().map(|s| &s.project)
    }

    pub fn can_undo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_redo())
    }

    pub fn is_dirty(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_dirty)
    }

    /// Undo the last edit. Clears the selection first.
    pub fn undo(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.select(Selection::None);
        let Some(changes) = session.history.undo(&mut session.project) else {
            return false;
        };
        log::debug!("Undo: {} changes", changes.len());
        session.dispatch(&changes);
        session.repair_cursors();
        true
    }

    /// Redo the last undone edit. Clears the selection first.
    pub fn redo(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.select(Selection::None);
        let Some(changes) = session.history.redo(&mut session.project) else {
            return false;
        };
        log::debug!("Redo: {} changes", changes.len());
        session.dispatch(&changes);
        session.repair_cursors();
        true
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        self.session
            .as_mut()
            .map(|s| std::mem::take(&mut s.events))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, block_on};
    use kurbo::Point;

    pub(super) fn loaded() -> Editor {
        let mut editor = Editor::new();
        editor.load(Project::with_defaults("Test"), None);
        editor
    }

    pub(super) fn assert_synced(editor: &Editor) {
        let session = editor.session().unwrap();
        assert_eq!(session.observer().attached(), graph::reachable(session.project()));
        assert_eq!(
            session.observer().counts(),
            &graph::reference_counts(session.project())
        );
    }

    #[test]
    fn test_no_project_is_noop() {
        let mut editor = Editor::new();
        assert!(!editor.undo());
        assert!(!editor.redo());
        assert!(!editor.can_undo());
        assert!(!editor.is_dirty());
        assert!(editor.add_line(Point::ZERO, Point::new(1.0, 1.0)).is_none());
        assert!(!editor.move_selection_by(1.0, 1.0));
        assert!(!editor.try_to_split_line(0.0, 0.0, uuid::Uuid::new_v4(), false));
        assert!(editor.take_events().is_empty());
        assert!(editor.unload().is_none());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut editor = loaded();
        assert!(!editor.undo());
        assert!(!editor.redo());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_undo_redo_symmetry() {
        let mut editor = loaded();
        let before = editor.project().unwrap().clone();

        let a = editor.add_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)).unwrap();
        let b = editor.add_line(Point::new(0.0, 10.0), Point::new(10.0, 10.0)).unwrap();
        editor.select_shapes(&[a, b]);
        editor.move_selection_by(5.0, 5.0);
        editor.bring_to_front(a);
        let after = editor.project().unwrap().clone();

        let mut steps = 0;
        while editor.undo() {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(
            editor.project().unwrap().layer(before.current_layer().unwrap()),
            before.layer(before.current_layer().unwrap())
        );
        assert!(editor.selected_shapes().is_empty());
        assert_synced(&editor);

        while editor.redo() {}
        let project = editor.project().unwrap();
        let layer = after.current_layer().unwrap();
        assert_eq!(project.layer(layer), after.layer(layer));
        for id in [a, b] {
            let line = project.shape(id).unwrap().as_line().unwrap();
            assert_eq!(project.point_position(line.start), after.point_position(line.start));
        }
        assert_synced(&editor);
    }

    #[test]
    fn test_dirty_flag_discipline() {
        let mut editor = loaded();
        let library = editor.project().unwrap().current_style_library.unwrap();
        let style = editor.add_style(library, crate::shapes::ShapeStyle::new("Red")).unwrap();
        editor.take_events();

        block_on(editor.save(&MemoryStorage::new(), "p")).unwrap();
        assert!(!editor.is_dirty());
        assert_eq!(editor.take_events(), vec![EditorEvent::DirtyChanged(false)]);

        assert!(editor.select_library_item(library, style));
        assert!(!editor.is_dirty());
        assert_eq!(editor.take_events(), vec![EditorEvent::StylesChanged]);

        editor.add_line(Point::ZERO, Point::new(5.0, 5.0));
        assert!(editor.is_dirty());
        assert!(editor.take_events().contains(&EditorEvent::DirtyChanged(true)));
    }

    #[test]
    fn test_open_and_save_roundtrip() {
        let storage = MemoryStorage::new();
        let mut editor = loaded();
        let line = editor.add_line(Point::ZERO, Point::new(5.0, 0.0)).unwrap();
        block_on(editor.save(&storage, "drawing")).unwrap();
        assert_eq!(editor.session().unwrap().path(), Some("drawing"));

        let mut other = Editor::new();
        block_on(other.open(&storage, "drawing")).unwrap();
        assert!(other.project().unwrap().shape(line).is_some());
        assert!(!other.is_dirty());
        assert_synced(&other);
    }

    #[test]
    fn test_failed_open_keeps_current_project() {
        let storage = MemoryStorage::new();
        let mut editor = loaded();
        let id = editor.project().unwrap().id();
        let result = block_on(editor.open(&storage, "missing"));
        assert!(matches!(result, Err(EditorError::Storage(StorageError::NotFound(_)))));
        assert_eq!(editor.project().unwrap().id(), id);
    }

    #[test]
    fn test_save_without_project() {
        let mut editor = Editor::new();
        let result = block_on(editor.save(&MemoryStorage::new(), "p"));
        assert!(matches!(result, Err(EditorError::NoProject)));
    }

    #[test]
    fn test_unload_collects_garbage_and_images() {
        let mut editor = loaded();
        let line = editor.add_line(Point::ZERO, Point::new(5.0, 0.0)).unwrap();
        editor.select_shape(line);
        editor.delete_selected();
        let project = editor.unload().unwrap();
        assert!(project.shape(line).is_none());
        assert!(!editor.is_loaded());
    }

    #[test]
    fn test_save_keeps_nodes_history_can_restore() {
        let mut editor = loaded();
        let line = editor.add_line(Point::ZERO, Point::new(5.0, 0.0)).unwrap();
        editor.select_shape(line);
        editor.delete_selected();
        block_on(editor.save(&MemoryStorage::new(), "p")).unwrap();
        assert!(editor.project().unwrap().shape(line).is_some());
        assert!(editor.undo());
        let layer = editor.project().unwrap().current_layer().unwrap();
        assert!(editor.project().unwrap().layer(layer).unwrap().contains(line));
        assert_synced(&editor);
    }
}
