//! Shape definitions for the document graph.
//!
//! Shapes live in the project arena and refer to each other by [`ShapeId`].
//! Only [`PointShape`] carries coordinates; every other variant holds handles
//! to point shapes, which is how two lines end up sharing an endpoint.

mod arc;
mod bezier;
mod ellipse;
mod group;
mod image;
mod line;
mod path;
mod point;
mod rectangle;
mod text;

pub use arc::ArcShape;
pub use bezier::{CubicBezierShape, QuadraticBezierShape};
pub use ellipse::EllipseShape;
pub use group::GroupShape;
pub use image::{ImageFormat, ImageShape};
pub use line::{LineEnd, LineShape};
pub use path::{
    FigureId, FillRule, PathFigure, PathGeometry, PathSegment, PathShape, SegmentId, SegmentKind,
};
pub use point::PointShape;
pub use rectangle::RectangleShape;
pub use text::TextShape;

use crate::project::DataContext;
use bitflags::bitflags;
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Unique identifier for styles.
pub type StyleId = Uuid;

/// Serializable color representation (ARGB8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgbColor {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ArgbColor {
    pub fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    pub fn black() -> Self {
        Self::new(255, 0, 0, 0)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for ArgbColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            a: rgba.a,
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
        }
    }
}

impl From<ArgbColor> for Color {
    fn from(color: ArgbColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Line cap used when stroking open figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Flat,
    Square,
    Round,
}

/// Horizontal text alignment inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Font settings carried by a style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_name: String,
    pub font_size: f64,
    #[serde(default)]
    pub alignment: TextAlignment,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_name: "Calibri".to_string(),
            font_size: 12.0,
            alignment: TextAlignment::default(),
        }
    }
}

/// A named, shareable style.
///
/// Shapes reference styles by [`StyleId`]; many shapes may point at the same
/// style, so editing a style restyles all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub(crate) id: StyleId,
    /// Display name used by style libraries.
    pub name: String,
    /// Stroke color.
    pub stroke: ArgbColor,
    /// Fill color.
    pub fill: ArgbColor,
    /// Stroke thickness.
    pub thickness: f64,
    #[serde(default)]
    pub line_cap: LineCap,
    /// Dash pattern as space separated lengths.
    #[serde(default)]
    pub dashes: Option<String>,
    #[serde(default)]
    pub dash_offset: f64,
    #[serde(default)]
    pub text: TextStyle,
}

impl ShapeStyle {
    /// Create a new style with the default black stroke.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            stroke: ArgbColor::black(),
            fill: ArgbColor::transparent(),
            thickness: 2.0,
            line_cap: LineCap::default(),
            dashes: None,
            dash_offset: 0.0,
            text: TextStyle::default(),
        }
    }

    pub fn id(&self) -> StyleId {
        self.id
    }

    /// Copy of this style under a fresh identity.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke_color(&self) -> Color {
        self.stroke.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill_color(&self) -> Color {
        self.fill.into()
    }

    pub fn set_stroke(&mut self, color: Color) {
        self.stroke = color.into();
    }

    pub fn set_fill(&mut self, color: Color) {
        self.fill = color.into();
    }
}

bitflags! {
    /// Mutable per-shape state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ShapeState: u32 {
        const VISIBLE    = 1 << 0;
        const PRINTABLE  = 1 << 1;
        const LOCKED     = 1 << 2;
        const SIZE       = 1 << 3;
        const THICKNESS  = 1 << 4;
        /// Exposed by a group for external lines to attach to.
        const CONNECTOR  = 1 << 5;
        const STANDALONE = 1 << 6;
        const INPUT      = 1 << 7;
        const OUTPUT     = 1 << 8;
    }
}

impl Default for ShapeState {
    fn default() -> Self {
        ShapeState::VISIBLE | ShapeState::PRINTABLE | ShapeState::STANDALONE
    }
}

fn default_true() -> bool {
    true
}

/// Per-variant access to the point handles a shape holds.
pub trait ShapeTrait {
    /// Point handles held directly by this shape, in field order.
    fn point_refs(&self) -> Vec<ShapeId>;

    /// Mutable slots for every point handle, in the same order as [`point_refs`](Self::point_refs).
    fn point_refs_mut(&mut self) -> Vec<&mut ShapeId>;
}

/// Variant payload of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Point(PointShape),
    Line(LineShape),
    Rectangle(RectangleShape),
    Ellipse(EllipseShape),
    Arc(ArcShape),
    CubicBezier(CubicBezierShape),
    QuadraticBezier(QuadraticBezierShape),
    Text(TextShape),
    Image(ImageShape),
    Path(PathShape),
    Group(GroupShape),
}

impl ShapeKind {
    fn as_trait(&self) -> &dyn ShapeTrait {
        match self {
            ShapeKind::Point(s) => s,
            ShapeKind::Line(s) => s,
            ShapeKind::Rectangle(s) => s,
            ShapeKind::Ellipse(s) => s,
            ShapeKind::Arc(s) => s,
            ShapeKind::CubicBezier(s) => s,
            ShapeKind::QuadraticBezier(s) => s,
            ShapeKind::Text(s) => s,
            ShapeKind::Image(s) => s,
            ShapeKind::Path(s) => s,
            ShapeKind::Group(s) => s,
        }
    }

    fn as_trait_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            ShapeKind::Point(s) => s,
            ShapeKind::Line(s) => s,
            ShapeKind::Rectangle(s) => s,
            ShapeKind::Ellipse(s) => s,
            ShapeKind::Arc(s) => s,
            ShapeKind::CubicBezier(s) => s,
            ShapeKind::QuadraticBezier(s) => s,
            ShapeKind::Text(s) => s,
            ShapeKind::Image(s) => s,
            ShapeKind::Path(s) => s,
            ShapeKind::Group(s) => s,
        }
    }

    /// Short lowercase name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Point(_) => "point",
            ShapeKind::Line(_) => "line",
            ShapeKind::Rectangle(_) => "rectangle",
            ShapeKind::Ellipse(_) => "ellipse",
            ShapeKind::Arc(_) => "arc",
            ShapeKind::CubicBezier(_) => "cubic-bezier",
            ShapeKind::QuadraticBezier(_) => "quadratic-bezier",
            ShapeKind::Text(_) => "text",
            ShapeKind::Image(_) => "image",
            ShapeKind::Path(_) => "path",
            ShapeKind::Group(_) => "group",
        }
    }
}

/// A node in the shape arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    pub name: String,
    /// Shared style reference.
    #[serde(default)]
    pub style: Option<StyleId>,
    /// Owned data context (properties plus an optional shared record).
    #[serde(default)]
    pub data: DataContext,
    #[serde(default)]
    pub state: ShapeState,
    #[serde(default = "default_true")]
    pub is_stroked: bool,
    #[serde(default)]
    pub is_filled: bool,
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape around a variant payload.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            style: None,
            data: DataContext::default(),
            state: ShapeState::default(),
            is_stroked: true,
            is_filled: false,
            kind,
        }
    }

    /// Create a standalone point shape.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(ShapeKind::Point(PointShape::new(Point::new(x, y))))
    }

    pub fn line(start: ShapeId, end: ShapeId) -> Self {
        Self::new(ShapeKind::Line(LineShape::new(start, end)))
    }

    pub fn rectangle(top_left: ShapeId, bottom_right: ShapeId) -> Self {
        Self::new(ShapeKind::Rectangle(RectangleShape::new(top_left, bottom_right)))
    }

    pub fn ellipse(top_left: ShapeId, bottom_right: ShapeId) -> Self {
        Self::new(ShapeKind::Ellipse(EllipseShape::new(top_left, bottom_right)))
    }

    pub fn text(top_left: ShapeId, bottom_right: ShapeId, text: impl Into<String>) -> Self {
        Self::new(ShapeKind::Text(TextShape::new(top_left, bottom_right, text)))
    }

    pub fn group(name: impl Into<String>) -> Self {
        let mut shape = Self::new(ShapeKind::Group(GroupShape::default()));
        shape.name = name.into();
        shape
    }

    pub fn with_style(mut self, style: StyleId) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Regenerate the shape's ID with a new unique identifier.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    /// Point handles held directly by this shape.
    pub fn point_refs(&self) -> Vec<ShapeId> {
        self.kind.as_trait().point_refs()
    }

    pub fn point_refs_mut(&mut self) -> Vec<&mut ShapeId> {
        self.kind.as_trait_mut().point_refs_mut()
    }

    /// Every shape this shape references: point handles, then group children.
    pub fn referenced_shapes(&self) -> Vec<ShapeId> {
        let mut refs = self.point_refs();
        if let ShapeKind::Group(group) = &self.kind {
            refs.extend(group.shapes.iter().copied());
        }
        refs
    }

    /// Rewrite every shape handle through `map`, leaving unmapped handles alone.
    pub fn remap_refs(&mut self, map: &HashMap<ShapeId, ShapeId>) {
        for slot in self.point_refs_mut() {
            if let Some(&new_id) = map.get(slot) {
                *slot = new_id;
            }
        }
        if let ShapeKind::Group(group) = &mut self.kind {
            for child in &mut group.shapes {
                if let Some(&new_id) = map.get(child) {
                    *child = new_id;
                }
            }
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self.kind, ShapeKind::Point(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self.kind, ShapeKind::Line(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group(_))
    }

    pub fn is_locked(&self) -> bool {
        self.state.contains(ShapeState::LOCKED)
    }

    pub fn is_connector(&self) -> bool {
        self.state.contains(ShapeState::CONNECTOR)
    }

    pub fn as_point(&self) -> Option<&PointShape> {
        match &self.kind {
            ShapeKind::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_point_mut(&mut self) -> Option<&mut PointShape> {
        match &mut self.kind {
            ShapeKind::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineShape> {
        match &self.kind {
            ShapeKind::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut LineShape> {
        match &mut self.kind {
            ShapeKind::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupShape> {
        match &self.kind {
            ShapeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupShape> {
        match &mut self.kind {
            ShapeKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathShape> {
        match &self.kind {
            ShapeKind::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_path_mut(&mut self) -> Option<&mut PathShape> {
        match &mut self.kind {
            ShapeKind::Path(p) => Some(p),
            _ => None,
        }
    }
}

/// Distance from a point to a line segment (a->b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    point.distance(nearest_on_segment(point, a, b))
}

/// Closest point to `point` on the segment a->b.
pub fn nearest_on_segment(point: Point, a: Point, b: Point) -> Point {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return a;
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    a + seg * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_on_segment_clamps() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(nearest_on_segment(Point::new(3.0, 4.0), a, b), Point::new(3.0, 0.0));
        assert_eq!(nearest_on_segment(Point::new(-5.0, 1.0), a, b), a);
        assert_eq!(nearest_on_segment(Point::new(15.0, 1.0), a, b), b);
    }

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!((d - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_state() {
        let shape = Shape::point(1.0, 2.0);
        assert!(shape.state.contains(ShapeState::VISIBLE));
        assert!(shape.state.contains(ShapeState::STANDALONE));
        assert!(!shape.is_connector());
        assert!(!shape.is_locked());
    }

    #[test]
    fn test_remap_refs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let mut line = Shape::line(a, b);
        let map = HashMap::from([(a, c)]);
        line.remap_refs(&map);
        assert_eq!(line.point_refs(), vec![c, b]);
    }

    #[test]
    fn test_style_duplicate_has_new_identity() {
        let style = ShapeStyle::new("Solid");
        let copy = style.duplicate();
        assert_ne!(style.id(), copy.id());
        assert_eq!(style.name, copy.name);
        assert_eq!(style.thickness, copy.thickness);
    }

    #[test]
    fn test_color_roundtrip_through_peniko() {
        let color = ArgbColor::new(128, 10, 20, 30);
        let back: ArgbColor = Color::from(color).into();
        assert_eq!(color, back);
    }
}
