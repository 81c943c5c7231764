//! Shape primitives and their geometry contracts.
//!
//! A [`Primitive`] is the data model for one shape on the canvas: its
//! kind, local transform, size, and paints. Rendering backends consume
//! primitives through the [`DrawContext`] trait: the primitive builds
//! its outline path and applies its fills and strokes, and the backend
//! decides how to rasterize.

use glam::Vec2;
use palette::Srgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;
use vellum_core::{Bounds, Matrix};

/// Unique identifier for a primitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimitiveId(uuid::Uuid);

impl PrimitiveId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create a PrimitiveId from a u128 (useful for tests).
    pub fn from_u128(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }
}

impl Default for PrimitiveId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimitiveId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A single fill or stroke paint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Paint {
    Solid { color: Srgba<f32> },
}

impl Paint {
    pub fn solid(color: Srgba<f32>) -> Self {
        Paint::Solid { color }
    }
}

/// The kind of a primitive, with per-kind geometry data.
///
/// Container kinds (`Frame`, `Layer`, `Transformer`) may have children;
/// every other kind is a leaf.
#[derive(Clone, Debug, PartialEq, Display, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PrimitiveKind {
    Rect { corner_radius: f32 },
    Ellipse,
    /// Endpoints in the primitive's local frame.
    Line { start: Vec2, end: Vec2 },
    Text { content: String, font_size: f32 },
    Picture { source: String },
    Frame,
    Layer,
    Transformer,
}

impl PrimitiveKind {
    /// Whether this kind can never have children. Tree recursion
    /// bottoms out on leaves.
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Frame | PrimitiveKind::Layer | PrimitiveKind::Transformer
        )
    }
}

/// Receiver for a primitive's outline path and paints.
///
/// Path coordinates are in the primitive's local frame; the caller is
/// responsible for applying the world transform.
pub trait DrawContext {
    fn move_to(&mut self, point: Vec2);
    fn line_to(&mut self, point: Vec2);
    fn rect(&mut self, origin: Vec2, size: Vec2, corner_radius: f32);
    fn ellipse(&mut self, center: Vec2, radii: Vec2);
    fn close_path(&mut self);

    fn fill(&mut self, paint: &Paint);
    fn stroke(&mut self, paint: &Paint, width: f32);
}

/// Minimum pick distance for hairline strokes, in local units.
const LINE_PICK_SLOP: f32 = 2.0;

/// A shape in the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub kind: PrimitiveKind,
    pub label: String,
    /// Local-frame size. Lines derive their extent from endpoints instead.
    pub size: Vec2,
    /// Transform from this primitive's local frame into its parent's frame.
    pub transform: Matrix,
    /// Fill paints, applied bottom to top.
    pub fills: Vec<Paint>,
    /// Stroke paints, applied bottom to top.
    pub strokes: Vec<Paint>,
    pub stroke_width: f32,
    /// Whether hit testing and selection may pick this primitive.
    pub selectable: bool,
}

impl Primitive {
    fn new(kind: PrimitiveKind, label: impl Into<String>) -> Self {
        Self {
            id: PrimitiveId::new(),
            kind,
            label: label.into(),
            size: Vec2::ZERO,
            transform: Matrix::IDENTITY,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_width: 1.0,
            selectable: true,
        }
    }

    pub fn rect() -> Self {
        Self::new(PrimitiveKind::Rect { corner_radius: 0.0 }, "Rect")
    }

    pub fn ellipse() -> Self {
        Self::new(PrimitiveKind::Ellipse, "Ellipse")
    }

    pub fn line(start: Vec2, end: Vec2) -> Self {
        Self::new(PrimitiveKind::Line { start, end }, "Line")
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(
            PrimitiveKind::Text {
                content: content.into(),
                font_size: 16.0,
            },
            "Text",
        )
    }

    pub fn picture(source: impl Into<String>) -> Self {
        Self::new(
            PrimitiveKind::Picture {
                source: source.into(),
            },
            "Picture",
        )
    }

    pub fn frame() -> Self {
        Self::new(PrimitiveKind::Frame, "Frame")
    }

    pub fn layer() -> Self {
        let mut layer = Self::new(PrimitiveKind::Layer, "Layer");
        layer.selectable = false;
        layer
    }

    pub fn transformer() -> Self {
        let mut transformer = Self::new(PrimitiveKind::Transformer, "Transformer");
        transformer.selectable = false;
        transformer
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_transform(mut self, transform: Matrix) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_fill(mut self, paint: Paint) -> Self {
        self.fills.push(paint);
        self
    }

    pub fn with_stroke(mut self, paint: Paint, width: f32) -> Self {
        self.strokes.push(paint);
        self.stroke_width = width;
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Bounding box in the primitive's own local frame.
    pub fn local_bounds(&self) -> Bounds {
        match &self.kind {
            PrimitiveKind::Line { start, end } => Bounds::from_corners(*start, *end),
            _ => Bounds::from_origin_size(Vec2::ZERO, self.size),
        }
    }

    /// Exact hit test against a point in the primitive's local frame.
    ///
    /// The spatial index produces candidates by bounding box; this is
    /// the per-kind exactness filter applied on top.
    pub fn hit_test_local(&self, point: Vec2) -> bool {
        match &self.kind {
            PrimitiveKind::Ellipse => {
                let radii = self.size * 0.5;
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return false;
                }
                let normalized = (point - radii) / radii;
                normalized.length_squared() <= 1.0
            }
            PrimitiveKind::Line { start, end } => {
                let pick = (self.stroke_width * 0.5).max(LINE_PICK_SLOP);
                distance_to_segment(point, *start, *end) <= pick
            }
            PrimitiveKind::Layer | PrimitiveKind::Transformer => false,
            _ => self.local_bounds().contains_point(point),
        }
    }

    /// Builds this primitive's outline path into the draw context.
    pub fn build_path(&self, ctx: &mut dyn DrawContext) {
        match &self.kind {
            PrimitiveKind::Rect { corner_radius } => {
                ctx.rect(Vec2::ZERO, self.size, *corner_radius);
            }
            PrimitiveKind::Ellipse => {
                ctx.ellipse(self.size * 0.5, self.size * 0.5);
            }
            PrimitiveKind::Line { start, end } => {
                ctx.move_to(*start);
                ctx.line_to(*end);
            }
            PrimitiveKind::Text { .. } | PrimitiveKind::Picture { .. } | PrimitiveKind::Frame => {
                ctx.rect(Vec2::ZERO, self.size, 0.0);
            }
            // Containers with no outline of their own
            PrimitiveKind::Layer | PrimitiveKind::Transformer => {}
        }
    }

    /// Applies this primitive's fills, then strokes, to the draw context.
    pub fn apply_paints(&self, ctx: &mut dyn DrawContext) {
        for fill in &self.fills {
            ctx.fill(fill);
        }
        for stroke in &self.strokes {
            ctx.stroke(stroke, self.stroke_width);
        }
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared == 0.0 {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingContext {
        ops: Vec<String>,
    }

    impl DrawContext for RecordingContext {
        fn move_to(&mut self, point: Vec2) {
            self.ops.push(format!("move_to({}, {})", point.x, point.y));
        }
        fn line_to(&mut self, point: Vec2) {
            self.ops.push(format!("line_to({}, {})", point.x, point.y));
        }
        fn rect(&mut self, origin: Vec2, size: Vec2, corner_radius: f32) {
            self.ops.push(format!(
                "rect({}, {}, {}, {}, r={})",
                origin.x, origin.y, size.x, size.y, corner_radius
            ));
        }
        fn ellipse(&mut self, center: Vec2, radii: Vec2) {
            self.ops.push(format!(
                "ellipse({}, {}, {}, {})",
                center.x, center.y, radii.x, radii.y
            ));
        }
        fn close_path(&mut self) {
            self.ops.push("close".into());
        }
        fn fill(&mut self, _paint: &Paint) {
            self.ops.push("fill".into());
        }
        fn stroke(&mut self, _paint: &Paint, width: f32) {
            self.ops.push(format!("stroke(w={width})"));
        }
    }

    #[test]
    fn test_leaf_discrimination() {
        assert!(Primitive::rect().is_leaf());
        assert!(Primitive::ellipse().is_leaf());
        assert!(Primitive::line(Vec2::ZERO, Vec2::ONE).is_leaf());
        assert!(!Primitive::frame().is_leaf());
        assert!(!Primitive::layer().is_leaf());
        assert!(!Primitive::transformer().is_leaf());
    }

    #[test]
    fn test_ellipse_hit_test() {
        let ellipse = Primitive::ellipse().with_size(Vec2::new(100.0, 50.0));

        // Center and a point well inside
        assert!(ellipse.hit_test_local(Vec2::new(50.0, 25.0)));
        assert!(ellipse.hit_test_local(Vec2::new(60.0, 25.0)));
        // Bounding-box corner is outside the ellipse itself
        assert!(!ellipse.hit_test_local(Vec2::new(2.0, 2.0)));
        // Rightmost point of the ellipse lies on the curve
        assert!(ellipse.hit_test_local(Vec2::new(100.0, 25.0)));
    }

    #[test]
    fn test_zero_size_ellipse_never_hits() {
        let ellipse = Primitive::ellipse();
        assert!(!ellipse.hit_test_local(Vec2::ZERO));
    }

    #[test]
    fn test_line_hit_test_uses_stroke_width() {
        let line = Primitive::line(Vec2::ZERO, Vec2::new(100.0, 0.0)).with_stroke(
            Paint::solid(Srgba::new(0.0, 0.0, 0.0, 1.0)),
            10.0,
        );

        assert!(line.hit_test_local(Vec2::new(50.0, 4.0)));
        assert!(!line.hit_test_local(Vec2::new(50.0, 6.0)));
        // Beyond the endpoint
        assert!(!line.hit_test_local(Vec2::new(110.0, 0.0)));
    }

    #[test]
    fn test_line_local_bounds_from_endpoints() {
        let line = Primitive::line(Vec2::new(30.0, 40.0), Vec2::new(10.0, 5.0));
        let bounds = line.local_bounds();
        assert_eq!(bounds.min, Vec2::new(10.0, 5.0));
        assert_eq!(bounds.max, Vec2::new(30.0, 40.0));
    }

    #[test]
    fn test_build_path_and_paints() {
        let rect = Primitive::rect()
            .with_size(Vec2::new(10.0, 20.0))
            .with_fill(Paint::solid(Srgba::new(1.0, 0.0, 0.0, 1.0)))
            .with_stroke(Paint::solid(Srgba::new(0.0, 0.0, 0.0, 1.0)), 2.0);

        let mut ctx = RecordingContext::default();
        rect.build_path(&mut ctx);
        rect.apply_paints(&mut ctx);

        assert_eq!(
            ctx.ops,
            vec!["rect(0, 0, 10, 20, r=0)", "fill", "stroke(w=2)"]
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let rect = Primitive::rect()
            .with_size(Vec2::new(10.0, 20.0))
            .with_transform(Matrix::translation(3.0, 4.0));
        let json = serde_json::to_string(&rect).unwrap();
        let back: Primitive = serde_json::from_str(&json).unwrap();
        assert_eq!(rect, back);
    }
}
