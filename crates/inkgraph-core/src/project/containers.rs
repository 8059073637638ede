//! Documents, pages and layers.

use super::{DataContext, DocumentId, LayerId, PageId};
use crate::shapes::{ArgbColor, ShapeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ordered, z-ordered sequence of shapes (back to front).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    /// Owning page. Not an ownership edge of the graph.
    #[serde(default)]
    pub owner: Option<PageId>,
    pub shapes: Vec<ShapeId>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner: None,
            shapes: Vec::new(),
            is_visible: true,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn contains(&self, shape: ShapeId) -> bool {
        self.shapes.contains(&shape)
    }
}

/// A page: content layers plus working/helper layers and an optional template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub(crate) id: PageId,
    pub name: String,
    /// Template page drawn underneath (background, grid). Shared from the project pool.
    #[serde(default)]
    pub template: Option<PageId>,
    pub layers: Vec<LayerId>,
    pub working_layer: LayerId,
    pub helper_layer: LayerId,
    /// Layer that receives new shapes.
    #[serde(default)]
    pub current_layer: Option<LayerId>,
    /// Selection cursor.
    #[serde(default)]
    pub current_shape: Option<ShapeId>,
    #[serde(default)]
    pub data: DataContext,
    #[serde(default = "default_background")]
    pub background: ArgbColor,
}

fn default_background() -> ArgbColor {
    ArgbColor::white()
}

impl Page {
    pub(crate) fn new(
        name: impl Into<String>,
        working_layer: LayerId,
        helper_layer: LayerId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            template: None,
            layers: Vec::new(),
            working_layer,
            helper_layer,
            current_layer: None,
            current_shape: None,
            data: DataContext::default(),
            background: default_background(),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// Every layer the page owns: content layers, then working and helper.
    pub fn all_layers(&self) -> Vec<LayerId> {
        let mut layers = self.layers.clone();
        layers.push(self.working_layer);
        layers.push(self.helper_layer);
        layers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub(crate) id: DocumentId,
    pub name: String,
    pub pages: Vec<PageId>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            pages: Vec::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }
}
