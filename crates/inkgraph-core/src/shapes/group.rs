//! Group shape for combining multiple shapes.

use super::{ShapeId, ShapeTrait};
use serde::{Deserialize, Serialize};

/// A group of shapes that can be manipulated as a single unit.
///
/// Besides its ordered children a group exposes connector points that
/// external lines attach to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupShape {
    /// Child shapes in z-order.
    pub shapes: Vec<ShapeId>,
    /// Connector points exposed for external attachment.
    pub connectors: Vec<ShapeId>,
}

impl GroupShape {
    pub fn new(shapes: Vec<ShapeId>, connectors: Vec<ShapeId>) -> Self {
        Self { shapes, connectors }
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains(&id) || self.connectors.contains(&id)
    }
}

impl ShapeTrait for GroupShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        self.connectors.clone()
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        self.connectors.iter_mut().collect()
    }
}
