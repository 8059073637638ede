//! Text shape.

use super::{ShapeId, ShapeTrait};
use serde::{Deserialize, Serialize};

/// Text laid out inside the box spanned by two corner points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextShape {
    pub top_left: ShapeId,
    pub bottom_right: ShapeId,
    /// Text content; `{name}` placeholders bind to data properties.
    pub text: String,
}

impl TextShape {
    pub fn new(top_left: ShapeId, bottom_right: ShapeId, text: impl Into<String>) -> Self {
        Self {
            top_left,
            bottom_right,
            text: text.into(),
        }
    }
}

impl ShapeTrait for TextShape {
    fn point_refs(&self) -> Vec<ShapeId> {
        vec![self.top_left, self.bottom_right]
    }

    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        vec![&mut self.top_left, &mut self.bottom_right]
    }
}
