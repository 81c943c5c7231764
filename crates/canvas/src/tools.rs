//! Tools for creating and selecting shapes.
//!
//! Exactly one tool is current at a time. The [`ToolManager`] sits in
//! the dispatch chain and forwards events to it; switching tools runs
//! the deactivate/activate lifecycle and announces the change.

use glam::Vec2;
use log::{debug, info};
use palette::Srgba;
use scene_graph::primitive::{Paint, Primitive, PrimitiveKind};
use scene_graph::SceneNodeId;
use strum_macros::{Display, EnumIter};
use vellum_core::color::parse_hex_color;
use vellum_core::Matrix;

use crate::dispatcher::{DispatchCtx, EventHandler, PointerButton, PointerEvent};
use crate::events::{EditorEvent, EventBus};

/// A press-release pair that moved less than this (in viewport pixels)
/// counts as a click, and the drawn shape gets the default size.
const DRAG_THRESHOLD: f32 = 4.0;
/// Side length of a shape created by clicking instead of dragging.
const DEFAULT_SHAPE_SIZE: f32 = 100.0;

/// Identifies the available tools.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolId {
    /// Pick and manipulate existing shapes
    #[default]
    Select,
    /// Draw rectangles
    Rect,
    /// Draw ellipses
    Ellipse,
    /// Draw container frames
    Frame,
    /// Draw lines
    Line,
}

/// One tool's behavior. Pointer methods mirror [`EventHandler`] and
/// return whether the tool acted on the event.
pub trait Tool {
    fn id(&self) -> ToolId;

    fn on_activate(&mut self) {}
    fn on_deactivate(&mut self) {}

    fn on_pointer_down(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
    fn on_pointer_move(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
    fn on_pointer_up(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
    fn on_click(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
}

fn hex_paint(hex: &str, fallback: Srgba<f32>) -> Paint {
    Paint::solid(parse_hex_color(hex).unwrap_or(fallback))
}

fn default_fill() -> Paint {
    hex_paint("#d9d9d9", Srgba::new(0.85, 0.85, 0.85, 1.0))
}

fn default_stroke() -> Paint {
    hex_paint("#000000", Srgba::new(0.0, 0.0, 0.0, 1.0))
}

/// Click-or-drag creation of rects, ellipses, frames and lines.
///
/// Pointer down plants a zero-sized shape at the cursor's document
/// position; each move grows it by the document-space delta; release
/// finalizes it, falling back to the default size when the gesture
/// never left the drag threshold.
pub struct DrawShapeTool {
    id: ToolId,
    drawing: Option<SceneNodeId>,
    /// Last pointer position in viewport coordinates
    last: Vec2,
    /// Total viewport distance traveled during the gesture
    traveled: f32,
}

impl DrawShapeTool {
    pub fn new(id: ToolId) -> Self {
        Self {
            id,
            drawing: None,
            last: Vec2::ZERO,
            traveled: 0.0,
        }
    }

    fn blank_shape(&self) -> Primitive {
        match self.id {
            ToolId::Rect => Primitive::rect().with_fill(default_fill()),
            ToolId::Ellipse => Primitive::ellipse().with_fill(default_fill()),
            ToolId::Frame => {
                Primitive::frame().with_fill(Paint::solid(Srgba::new(1.0, 1.0, 1.0, 1.0)))
            }
            ToolId::Line => {
                Primitive::line(Vec2::ZERO, Vec2::ZERO).with_stroke(default_stroke(), 1.0)
            }
            ToolId::Select => Primitive::rect(),
        }
    }

    fn grow(primitive: &mut Primitive, delta: Vec2) {
        match &mut primitive.kind {
            PrimitiveKind::Line { end, .. } => *end += delta,
            _ => primitive.size += delta,
        }
    }

    fn set_default_size(primitive: &mut Primitive) {
        match &mut primitive.kind {
            PrimitiveKind::Line { start, end } => {
                *end = *start + Vec2::splat(DEFAULT_SHAPE_SIZE);
            }
            _ => primitive.size = Vec2::splat(DEFAULT_SHAPE_SIZE),
        }
    }
}

impl Tool for DrawShapeTool {
    fn id(&self) -> ToolId {
        self.id
    }

    fn on_deactivate(&mut self) {
        self.drawing = None;
    }

    fn on_pointer_down(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        if event.button != PointerButton::Left {
            return false;
        }
        let origin = cx.scene.to_scene(event.position);
        let shape = self
            .blank_shape()
            .with_transform(Matrix::translation(origin.x, origin.y));
        match cx.scene.add_child_to_active(shape) {
            Ok(node) => {
                self.drawing = Some(node);
                self.last = event.position;
                self.traveled = 0.0;
                true
            }
            Err(error) => {
                debug!("could not start drawing: {error}");
                false
            }
        }
    }

    fn on_pointer_move(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        let Some(node) = self.drawing else {
            return false;
        };
        // Grow by the document-space delta so drawing tracks the cursor
        // at any zoom
        let delta = cx.scene.to_scene(event.position) - cx.scene.to_scene(self.last);
        self.traveled += (event.position - self.last).length();
        self.last = event.position;
        cx.scene
            .update_primitive(node, |primitive| Self::grow(primitive, delta))
            .is_ok()
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        let Some(node) = self.drawing.take() else {
            return false;
        };
        if self.traveled < DRAG_THRESHOLD {
            cx.scene
                .update_primitive(node, Self::set_default_size)
                .ok();
        }
        if let Some(primitive) = cx.scene.primitive(node) {
            debug!("finished drawing {} ({})", primitive.label, primitive.id);
        }
        true
    }
}

/// Click selection: topmost hit wins, shift toggles, empty canvas
/// clears.
#[derive(Default)]
pub struct SelectTool;

impl Tool for SelectTool {
    fn id(&self) -> ToolId {
        ToolId::Select
    }

    fn on_click(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        match cx.scene.top_primitive_at(event.position) {
            Some(id) => {
                if event.modifiers.shift || cx.keys.shift {
                    cx.selection.toggle(id);
                } else {
                    cx.selection.deselect_all();
                    cx.selection.select(&[id]);
                }
            }
            None => cx.selection.deselect_all(),
        }
        true
    }
}

/// Owns the tool set and routes events to the current tool.
pub struct ToolManager {
    tools: Vec<Box<dyn Tool>>,
    current: usize,
}

impl ToolManager {
    pub fn new() -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(SelectTool),
            Box::new(DrawShapeTool::new(ToolId::Rect)),
            Box::new(DrawShapeTool::new(ToolId::Ellipse)),
            Box::new(DrawShapeTool::new(ToolId::Frame)),
            Box::new(DrawShapeTool::new(ToolId::Line)),
        ];
        Self { tools, current: 0 }
    }

    pub fn current_tool(&self) -> ToolId {
        self.tools[self.current].id()
    }

    /// Switches the current tool, running the lifecycle hooks and
    /// announcing the change. Re-selecting the current tool is a no-op.
    pub fn set_current_tool(&mut self, id: ToolId, bus: &mut EventBus) {
        if self.current_tool() == id {
            return;
        }
        let Some(index) = self.tools.iter().position(|tool| tool.id() == id) else {
            return;
        };
        self.tools[self.current].on_deactivate();
        self.current = index;
        self.tools[self.current].on_activate();
        info!("tool changed to {id}");
        bus.emit(EditorEvent::ToolChanged(id));
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for ToolManager {
    fn on_pointer_down(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        self.tools[self.current].on_pointer_down(event, cx)
    }

    fn on_pointer_move(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        self.tools[self.current].on_pointer_move(event, cx)
    }

    fn on_pointer_up(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        self.tools[self.current].on_pointer_up(event, cx)
    }

    fn on_click(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        self.tools[self.current].on_click(event, cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{KeyState, Modifiers};
    use crate::selection::SelectionManager;
    use scene_graph::SceneGraph;
    use vellum_core::Bounds;

    struct Fixture {
        scene: SceneGraph,
        selection: SelectionManager,
        bus: EventBus,
        keys: KeyState,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: SceneGraph::new(),
                selection: SelectionManager::new(),
                bus: EventBus::new(),
                keys: KeyState::default(),
            }
        }

        fn cx(&mut self) -> DispatchCtx<'_> {
            DispatchCtx {
                scene: &mut self.scene,
                selection: &mut self.selection,
                bus: &mut self.bus,
                keys: self.keys,
            }
        }
    }

    fn press(position: Vec2) -> PointerEvent {
        PointerEvent {
            position,
            button: PointerButton::Left,
            modifiers: Modifiers::default(),
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_drag_draws_a_sized_rect() {
        let mut fixture = Fixture::new();
        let mut tool = DrawShapeTool::new(ToolId::Rect);

        assert!(tool.on_pointer_down(&press(Vec2::new(10.0, 10.0)), &mut fixture.cx()));
        assert!(tool.on_pointer_move(&press(Vec2::new(60.0, 40.0)), &mut fixture.cx()));
        assert!(tool.on_pointer_move(&press(Vec2::new(110.0, 90.0)), &mut fixture.cx()));
        assert!(tool.on_pointer_up(&press(Vec2::new(110.0, 90.0)), &mut fixture.cx()));

        let id = fixture.scene.top_primitive_at(Vec2::new(50.0, 50.0)).unwrap();
        let bounds = fixture.scene.spatial().bounds_of(id).unwrap();
        assert_eq!(
            bounds,
            Bounds::from_origin_size(Vec2::new(10.0, 10.0), Vec2::new(100.0, 80.0))
        );
    }

    #[test]
    fn test_click_draws_the_default_size() {
        let mut fixture = Fixture::new();
        let mut tool = DrawShapeTool::new(ToolId::Ellipse);

        tool.on_pointer_down(&press(Vec2::new(20.0, 20.0)), &mut fixture.cx());
        tool.on_pointer_up(&press(Vec2::new(20.0, 20.0)), &mut fixture.cx());

        let id = fixture.scene.top_primitive_at(Vec2::new(70.0, 70.0)).unwrap();
        let bounds = fixture.scene.spatial().bounds_of(id).unwrap();
        assert_eq!(bounds.size(), Vec2::splat(DEFAULT_SHAPE_SIZE));
        assert_eq!(bounds.origin(), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_drawing_under_a_zoomed_camera_lands_in_document_space() {
        let mut fixture = Fixture::new();
        // Viewport coordinates are twice the document's
        fixture
            .scene
            .set_view_matrix(Matrix::scaling(2.0, 2.0))
            .unwrap();
        let mut tool = DrawShapeTool::new(ToolId::Rect);

        tool.on_pointer_down(&press(Vec2::new(20.0, 20.0)), &mut fixture.cx());
        tool.on_pointer_move(&press(Vec2::new(120.0, 120.0)), &mut fixture.cx());
        tool.on_pointer_up(&press(Vec2::new(120.0, 120.0)), &mut fixture.cx());

        let id = fixture.scene.top_primitive_at(Vec2::new(70.0, 70.0)).unwrap();
        let bounds = fixture.scene.spatial().bounds_of(id).unwrap();
        assert_eq!(
            bounds,
            Bounds::from_origin_size(Vec2::new(10.0, 10.0), Vec2::new(50.0, 50.0))
        );
    }

    #[test]
    fn test_line_grows_its_endpoint() {
        let mut fixture = Fixture::new();
        let mut tool = DrawShapeTool::new(ToolId::Line);

        tool.on_pointer_down(&press(Vec2::ZERO), &mut fixture.cx());
        tool.on_pointer_move(&press(Vec2::new(30.0, 40.0)), &mut fixture.cx());
        tool.on_pointer_up(&press(Vec2::new(30.0, 40.0)), &mut fixture.cx());

        let id = fixture.scene.top_primitive_at(Vec2::new(15.0, 20.0)).unwrap();
        let node = fixture.scene.node_by_primitive(id).unwrap();
        match fixture.scene.primitive(node).unwrap().kind {
            PrimitiveKind::Line { start, end } => {
                assert_eq!(start, Vec2::ZERO);
                assert_eq!(end, Vec2::new(30.0, 40.0));
            }
            _ => panic!("expected a line"),
        }
    }

    #[test]
    fn test_right_button_does_not_draw() {
        let mut fixture = Fixture::new();
        let mut tool = DrawShapeTool::new(ToolId::Rect);
        let event = PointerEvent {
            button: PointerButton::Right,
            ..press(Vec2::ZERO)
        };
        assert!(!tool.on_pointer_down(&event, &mut fixture.cx()));
        assert!(fixture.scene.spatial().is_empty());
    }

    #[test]
    fn test_select_tool_click_cycle() {
        let mut fixture = Fixture::new();
        let a = fixture
            .scene
            .add_child_to_active(
                Primitive::rect()
                    .with_size(Vec2::splat(50.0))
                    .with_transform(Matrix::translation(0.0, 0.0)),
            )
            .unwrap();
        let b = fixture
            .scene
            .add_child_to_active(
                Primitive::rect()
                    .with_size(Vec2::splat(50.0))
                    .with_transform(Matrix::translation(100.0, 0.0)),
            )
            .unwrap();
        let a_id = fixture.scene.primitive(a).unwrap().id;
        let b_id = fixture.scene.primitive(b).unwrap().id;

        let mut tool = SelectTool;
        tool.on_click(&press(Vec2::new(25.0, 25.0)), &mut fixture.cx());
        assert_eq!(fixture.selection.selected(), vec![a_id]);

        // Plain click replaces the selection
        tool.on_click(&press(Vec2::new(125.0, 25.0)), &mut fixture.cx());
        assert_eq!(fixture.selection.selected(), vec![b_id]);

        // Shift click extends, then shift click again removes
        let shifted = PointerEvent {
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
            ..press(Vec2::new(25.0, 25.0))
        };
        tool.on_click(&shifted, &mut fixture.cx());
        assert_eq!(fixture.selection.len(), 2);
        tool.on_click(&shifted, &mut fixture.cx());
        assert_eq!(fixture.selection.selected(), vec![b_id]);

        // Empty canvas clears
        tool.on_click(&press(Vec2::new(500.0, 500.0)), &mut fixture.cx());
        assert!(fixture.selection.is_empty());
    }

    #[test]
    fn test_tool_manager_switch_announces_once() {
        let mut fixture = Fixture::new();
        let mut manager = ToolManager::new();

        manager.set_current_tool(ToolId::Rect, &mut fixture.bus);
        manager.set_current_tool(ToolId::Rect, &mut fixture.bus);
        assert_eq!(manager.current_tool(), ToolId::Rect);
        assert_eq!(fixture.bus.pending(), 1);
    }
}
