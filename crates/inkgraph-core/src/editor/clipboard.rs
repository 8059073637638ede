//! Copy, paste and JSON import of graph fragments.

use super::{Editor, EditorError, EditorResult, Selection, Session};
use crate::history::{Edit, Snapshot};
use crate::project::{Database, Options, Project, Record, StyleLibrary};
use crate::shapes::{Shape, ShapeId, ShapeStyle};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A self-contained set of shapes: the roots plus every shape and style they reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeBundle {
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub styles: Vec<ShapeStyle>,
    pub roots: Vec<ShapeId>,
}

impl ShapeBundle {
    /// Gather `roots` and their closure from the project.
    pub fn collect(project: &Project, roots: &[ShapeId]) -> Self {
        let mut bundle = Self::default();
        let mut seen = HashSet::new();
        let mut styles = HashSet::new();
        let mut stack: Vec<ShapeId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(shape) = project.shape(id) else {
                continue;
            };
            if let Some(style) = shape.style.and_then(|s| project.style(s)) {
                if styles.insert(style.id()) {
                    bundle.styles.push(style.clone());
                }
            }
            stack.extend(shape.referenced_shapes().into_iter().rev());
            bundle.shapes.push(shape.clone());
        }
        bundle.roots = roots.iter().copied().filter(|r| seen.contains(r)).collect();
        bundle
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Bounds of every point in the bundle.
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.shapes.iter().filter_map(|s| s.as_point()).map(|p| p.position);
        let first = points.next()?;
        Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
    }

    /// Shift every point by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for point in self.shapes.iter_mut().filter_map(Shape::as_point_mut) {
            point.translate(delta);
        }
    }

    /// Insert a fresh copy into the project arenas and return the new roots.
    ///
    /// Shapes get new identities with point sharing kept. Styles already in the
    /// project are reused; missing ones are inserted. Records the project does not
    /// know are unbound.
    pub fn instantiate(&self, project: &mut Project) -> Vec<ShapeId> {
        for style in &self.styles {
            if project.style(style.id()).is_none() {
                project.insert_style(style.clone());
            }
        }
        let mut copies: Vec<Shape> = self.shapes.clone();
        let mut map = HashMap::with_capacity(copies.len());
        for shape in &mut copies {
            let old = shape.id();
            shape.regenerate_id();
            map.insert(old, shape.id());
        }
        for mut shape in copies {
            shape.remap_refs(&map);
            if shape.data.record.is_some_and(|r| project.record(r).is_none()) {
                shape.data.record = None;
            }
            if shape.style.is_some_and(|s| project.style(s).is_none()) {
                shape.style = None;
            }
            project.insert_shape(shape);
        }
        self.roots.iter().filter_map(|r| map.get(r).copied()).collect()
    }
}

/// Fragments accepted by [`Editor::import_json`], tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImportPayload {
    /// A style added to the current style library.
    Style { style: ShapeStyle },
    /// A new style library.
    Styles { name: String, styles: Vec<ShapeStyle> },
    /// Groups added to the current group library.
    Group { bundle: ShapeBundle },
    /// Shapes pasted into the current layer.
    Shapes { bundle: ShapeBundle },
    Database {
        database: Database,
        #[serde(default)]
        records: Vec<Record>,
    },
    Options { options: Options },
    /// A whole project replacing the loaded one.
    Project { project: Box<Project> },
}

const IMPORT_KINDS: [&str; 7] = [
    "style", "styles", "group", "shapes", "database", "options", "project",
];

impl ImportPayload {
    /// Parse a fragment, rejecting unknown kinds before the payload itself.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let kind = value.get("kind").and_then(|k| k.as_str()).unwrap_or_default();
        if !IMPORT_KINDS.contains(&kind) {
            return Err(EditorError::UnsupportedImport(kind.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Session {
    /// Instantiate a bundle into the current layer and select the copies.
    fn paste_bundle(&mut self, bundle: &ShapeBundle) -> Vec<ShapeId> {
        let Some(layer) = self.project.current_layer() else {
            return Vec::new();
        };
        let roots = bundle.instantiate(&mut self.project);
        if roots.is_empty() {
            return roots;
        }
        self.append_to_layer(layer, &roots);
        self.select(Selection::Shapes(roots.clone()));
        roots
    }

    fn import(&mut self, payload: ImportPayload) -> bool {
        match payload {
            ImportPayload::Style { style } => {
                let Some(library) = self.project.current_style_library else {
                    return false;
                };
                let Some(previous) = self
                    .project
                    .style_library(library)
                    .map(|l| l.items.clone())
                else {
                    return false;
                };
                let style = if self.project.style(style.id()).is_some() {
                    style.duplicate()
                } else {
                    style
                };
                let id = self.project.insert_style(style);
                let mut next = previous.clone();
                next.push(id);
                self.commit(Edit::StyleLibraryItems(library, Snapshot::new(previous, next)));
                true
            }
            ImportPayload::Styles { name, styles } => {
                let mut library = StyleLibrary::new(name);
                let items = styles
                    .into_iter()
                    .map(|s| {
                        let s = match self.project.style(s.id()) {
                            Some(_) => s.duplicate(),
                            None => s,
                        };
                        self.project.insert_style(s)
                    })
                    .collect();
                library.set_items(items);
                let id = self.project.insert_style_library(library);
                let previous = self.project.style_libraries.clone();
                let mut next = previous.clone();
                next.push(id);
                self.commit(Edit::ProjectStyleLibraries(Snapshot::new(previous, next)));
                true
            }
            ImportPayload::Group { bundle } => {
                let Some(library) = self.project.current_group_library else {
                    return false;
                };
                let Some(previous) = self
                    .project
                    .group_library(library)
                    .map(|l| l.items.clone())
                else {
                    return false;
                };
                let groups: Vec<ShapeId> = bundle
                    .instantiate(&mut self.project)
                    .into_iter()
                    .filter(|&g| self.project.shape(g).is_some_and(Shape::is_group))
                    .collect();
                if groups.is_empty() {
                    return false;
                }
                let mut next = previous.clone();
                next.extend(groups);
                self.commit(Edit::GroupLibraryItems(library, Snapshot::new(previous, next)));
                true
            }
            ImportPayload::Shapes { bundle } => !self.paste_bundle(&bundle).is_empty(),
            ImportPayload::Database { mut database, records } => {
                if self.project.database(database.id()).is_some() {
                    database = database.duplicate();
                }
                // Records already in the arena are live; the import gets its own copies.
                database.records = records
                    .into_iter()
                    .map(|r| match self.project.record(r.id()) {
                        Some(_) => self.project.insert_record(r.duplicate()),
                        None => self.project.insert_record(r),
                    })
                    .collect();
                let id = self.project.insert_database(database);
                let previous = self.project.databases.clone();
                let mut next = previous.clone();
                next.push(id);
                self.commit(Edit::ProjectDatabases(Snapshot::new(previous, next)));
                true
            }
            ImportPayload::Options { options } => {
                let previous = self.project.options.clone();
                self.commit(Edit::Options(Snapshot::new(previous, options)));
                true
            }
            // Handled by the editor, which owns session replacement.
            ImportPayload::Project { .. } => false,
        }
    }
}

impl Editor {
    /// Snapshot of the selected shapes and everything they reference.
    pub fn copy_selection(&self) -> Option<ShapeBundle> {
        let session = self.session.as_ref()?;
        let bundle = ShapeBundle::collect(&session.project, &session.selection.ids());
        if bundle.is_empty() {
            return None;
        }
        log::info!("Copied {} shapes", bundle.roots.len());
        Some(bundle)
    }

    pub fn cut_selection(&mut self) -> Option<ShapeBundle> {
        let bundle = self.copy_selection()?;
        self.delete_selected();
        Some(bundle)
    }

    /// Paste a copy of `bundle` into the current layer as one undo step.
    pub fn paste(&mut self, bundle: &ShapeBundle) -> Vec<ShapeId> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let pasted = session.batch(|s| s.paste_bundle(bundle));
        log::info!("Pasted {} shapes", pasted.len());
        pasted
    }

    /// Paste at an offset from the copied position.
    pub fn paste_at(&mut self, bundle: &ShapeBundle, target: Point) -> Vec<ShapeId> {
        let mut moved = bundle.clone();
        if let Some(bounds) = bundle.bounds() {
            moved.translate(target - bounds.origin());
        }
        self.paste(&moved)
    }

    /// Import a JSON fragment. A project replaces the loaded session; every
    /// other kind needs one and is applied as a single undo step.
    pub fn import_json(&mut self, json: &str) -> EditorResult<()> {
        match ImportPayload::from_json(json)? {
            ImportPayload::Project { project } => {
                self.load(*project, None);
                Ok(())
            }
            payload => {
                let session = self.session.as_mut().ok_or(EditorError::NoProject)?;
                if !session.import(payload) {
                    log::warn!("Import had nothing to apply");
                }
                Ok(())
            }
        }
    }
}
