//! The editor facade.
//!
//! Owns the scene graph, camera, tools, selection, transformer and
//! event bus, and exposes two entry points to the host: feed input with
//! [`Editor::handle_input`], then settle the cycle with
//! [`Editor::flush`], which drains queued events to subscribers and
//! reports whether a redraw is due.
//!
//! The dispatch chain runs camera first (pan and zoom win over
//! everything), then the transformer (handle drags win over tools),
//! then hover tracking (never consumes), then the current tool.

use glam::Vec2;
use vellum_core::{Bounds, Matrix};

use scene_graph::primitive::{Primitive, PrimitiveId};
use scene_graph::{LayerConfig, SceneError, SceneGraph, SceneNodeId};

use crate::camera::Camera;
use crate::dispatcher::{DispatchCtx, Dispatcher, EventHandler, InputEvent, Key};
use crate::events::{EditorEvent, EventBus};
use crate::hover::HoverManager;
use crate::selection::SelectionManager;
use crate::tools::{ToolId, ToolManager};
use crate::transformer::Transformer;

pub struct Editor {
    scene: SceneGraph,
    camera: Camera,
    transformer: Transformer,
    hover: HoverManager,
    tools: ToolManager,
    selection: SelectionManager,
    dispatcher: Dispatcher,
    bus: EventBus,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            scene: SceneGraph::new(),
            camera: Camera::new(),
            transformer: Transformer::new(),
            hover: HoverManager::new(),
            tools: ToolManager::new(),
            selection: SelectionManager::new(),
            dispatcher: Dispatcher::new(),
            bus: EventBus::new(),
        }
    }

    // --- Access ---

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn hovered(&self) -> Option<PrimitiveId> {
        self.hover.hovered()
    }

    pub fn current_tool(&self) -> ToolId {
        self.tools.current_tool()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&EditorEvent) + 'static) {
        self.bus.subscribe(subscriber);
    }

    // --- Input ---

    /// Routes one input event through the dispatch chain. Returns
    /// whether anything consumed it.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        self.dispatcher.track_keys(&event);

        if let InputEvent::KeyDown(key_event) = &event {
            if key_event.key == Key::Delete {
                self.delete_selected();
                return true;
            }
        }

        let mut cx = DispatchCtx {
            scene: &mut self.scene,
            selection: &mut self.selection,
            bus: &mut self.bus,
            keys: self.dispatcher.key_state(),
        };
        let mut handlers: [&mut dyn EventHandler; 4] = [
            &mut self.camera,
            &mut self.transformer,
            &mut self.hover,
            &mut self.tools,
        ];
        self.dispatcher.dispatch(&event, &mut handlers, &mut cx)
    }

    // --- Commands ---

    pub fn set_current_tool(&mut self, id: ToolId) {
        self.tools.set_current_tool(id, &mut self.bus);
    }

    /// Adds a shape to the active layer
    pub fn add_shape(&mut self, primitive: Primitive) -> Result<SceneNodeId, SceneError> {
        self.scene.add_child_to_active(primitive)
    }

    pub fn select(&mut self, ids: &[PrimitiveId]) {
        self.selection.select(ids);
    }

    pub fn deselect(&mut self, ids: &[PrimitiveId]) {
        self.selection.deselect(ids);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.scene);
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Removes the given nodes and prunes the selection of anything
    /// that went with them
    pub fn remove(&mut self, nodes: &[SceneNodeId]) {
        let removed = self.scene.remove_nodes(nodes);
        self.selection.prune(&removed);
    }

    pub fn delete_selected(&mut self) {
        let nodes: Vec<_> = self
            .selection
            .selected()
            .into_iter()
            .filter_map(|id| self.scene.node_by_primitive(id))
            .collect();
        self.remove(&nodes);
    }

    pub fn create_layer(&mut self, config: LayerConfig) -> Result<SceneNodeId, SceneError> {
        self.scene.create_layer(config)
    }

    pub fn remove_layer(&mut self, name: &str) -> Result<(), SceneError> {
        let removed = self.scene.remove_layer(name)?;
        self.selection.prune(&removed);
        Ok(())
    }

    pub fn set_active_layer(&mut self, name: &str) -> Result<(), SceneError> {
        self.scene.set_active_layer(name)
    }

    // --- Coordinates and queries ---

    pub fn to_scene(&self, viewport_point: Vec2) -> Vec2 {
        self.scene.to_scene(viewport_point)
    }

    pub fn to_viewport(&self, scene_point: Vec2) -> Vec2 {
        self.scene.to_viewport(scene_point)
    }

    pub fn view_matrix(&self) -> Matrix {
        self.scene.view_matrix()
    }

    /// Primitives to paint for the given viewport region, bottom to top
    pub fn visible_primitives(&self, viewport_region: &Bounds) -> Vec<PrimitiveId> {
        self.scene.primitives_in_viewport(viewport_region)
    }

    // --- Update cycle ---

    /// Settles the update cycle: synchronizes the gizmo with the
    /// selection, delivers queued events, and reports whether the
    /// document needs repainting.
    pub fn flush(&mut self) -> bool {
        for event in self.scene.take_events() {
            self.bus.emit(event.into());
        }

        let selection_changed = self.selection.take_changed();
        if selection_changed.is_some() || self.scene.needs_redraw() {
            self.transformer.refresh(&mut self.scene, &self.selection);
        }
        if let Some(ids) = selection_changed {
            self.bus.emit(EditorEvent::SelectionChanged(ids));
        }

        let redraw = self.scene.take_redraw();
        self.bus.flush();
        redraw
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{KeyEvent, PointerButton, PointerEvent, WheelEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown(PointerEvent::new(Vec2::new(x, y), PointerButton::Left))
    }

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMove(PointerEvent::new(Vec2::new(x, y), PointerButton::Left))
    }

    fn up(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerUp(PointerEvent::new(Vec2::new(x, y), PointerButton::Left))
    }

    fn click(x: f32, y: f32) -> InputEvent {
        InputEvent::Click(PointerEvent::new(Vec2::new(x, y), PointerButton::Left))
    }

    fn drag(editor: &mut Editor, from: Vec2, to: Vec2) {
        editor.handle_input(down(from.x, from.y));
        editor.handle_input(moved(to.x, to.y));
        editor.handle_input(up(to.x, to.y));
    }

    #[test]
    fn test_draw_rect_by_dragging() {
        let mut editor = Editor::new();
        editor.set_current_tool(ToolId::Rect);

        drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(110.0, 90.0));
        assert!(editor.flush());

        let id = editor.scene().top_primitive_at(Vec2::new(50.0, 50.0)).unwrap();
        let bounds = editor.scene().spatial().bounds_of(id).unwrap();
        assert_eq!(
            bounds,
            Bounds::from_origin_size(Vec2::new(10.0, 10.0), Vec2::new(100.0, 80.0))
        );
    }

    #[test]
    fn test_click_draws_the_default_size() {
        let mut editor = Editor::new();
        editor.set_current_tool(ToolId::Ellipse);

        editor.handle_input(down(30.0, 30.0));
        editor.handle_input(up(30.0, 30.0));
        editor.flush();

        let id = editor.scene().top_primitive_at(Vec2::new(80.0, 80.0)).unwrap();
        let bounds = editor.scene().spatial().bounds_of(id).unwrap();
        assert_eq!(bounds.origin(), Vec2::new(30.0, 30.0));
        assert_eq!(bounds.size(), Vec2::splat(100.0));
    }

    #[test]
    fn test_selection_emits_one_coalesced_event_per_flush() {
        let mut editor = Editor::new();
        let node = editor
            .add_shape(
                Primitive::rect()
                    .with_size(Vec2::splat(50.0))
                    .with_transform(Matrix::translation(0.0, 0.0)),
            )
            .unwrap();
        let id = editor.scene().primitive(node).unwrap().id;

        let selection_events = Rc::new(RefCell::new(Vec::new()));
        let sink = selection_events.clone();
        editor.subscribe(move |event| {
            if let EditorEvent::SelectionChanged(ids) = event {
                sink.borrow_mut().push(ids.clone());
            }
        });

        // Several mutations in one cycle collapse to one event
        editor.select(&[id]);
        editor.deselect_all();
        editor.select(&[id]);
        editor.flush();

        assert_eq!(*selection_events.borrow(), vec![vec![id]]);
    }

    #[test]
    fn test_click_selection_shows_the_gizmo() {
        let mut editor = Editor::new();
        let node = editor
            .add_shape(
                Primitive::rect()
                    .with_size(Vec2::splat(50.0))
                    .with_transform(Matrix::translation(0.0, 0.0)),
            )
            .unwrap();
        let id = editor.scene().primitive(node).unwrap().id;
        editor.flush();

        editor.handle_input(click(25.0, 25.0));
        editor.flush();

        assert!(editor.selection().is_selected(id));
        let gizmo = editor.transformer.gizmo_node().unwrap();
        assert!(editor.scene().node(gizmo).unwrap().is_visible());
        let gizmo_primitive = editor.scene().primitive(gizmo).unwrap();
        assert_eq!(gizmo_primitive.size, Vec2::splat(50.0));

        // Clicking empty canvas clears and hides
        editor.handle_input(click(400.0, 400.0));
        editor.flush();
        assert!(editor.selection().is_empty());
        assert!(!editor.scene().node(gizmo).unwrap().is_visible());
    }

    #[test]
    fn test_space_drag_pans_and_wheel_zooms() {
        let mut editor = Editor::new();

        editor.handle_input(InputEvent::KeyDown(KeyEvent { key: Key::Space }));
        drag(&mut editor, Vec2::ZERO, Vec2::new(10.0, 10.0));
        editor.handle_input(InputEvent::KeyUp(KeyEvent { key: Key::Space }));

        assert_eq!(editor.to_scene(Vec2::ZERO), Vec2::new(-10.0, -10.0));
        editor.flush();

        let camera_events = Rc::new(RefCell::new(0));
        let sink = camera_events.clone();
        editor.subscribe(move |event| {
            if matches!(event, EditorEvent::CameraChanged(_)) {
                *sink.borrow_mut() += 1;
            }
        });

        editor.handle_input(InputEvent::Wheel(WheelEvent {
            position: Vec2::ZERO,
            delta_y: -1.0,
            timestamp_ms: 0.0,
        }));
        assert!(editor.flush());
        assert!((editor.camera().zoom() - 1.1).abs() < 1e-6);
        assert_eq!(*camera_events.borrow(), 1);
    }

    #[test]
    fn test_space_drag_does_not_draw() {
        let mut editor = Editor::new();
        editor.set_current_tool(ToolId::Rect);

        editor.handle_input(InputEvent::KeyDown(KeyEvent { key: Key::Space }));
        drag(&mut editor, Vec2::ZERO, Vec2::new(50.0, 50.0));
        editor.flush();

        assert!(editor.scene().spatial().is_empty());
    }

    #[test]
    fn test_resize_through_the_full_pipeline() {
        let mut editor = Editor::new();
        editor.set_current_tool(ToolId::Rect);
        drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(110.0, 110.0));
        editor.flush();

        editor.set_current_tool(ToolId::Select);
        editor.handle_input(click(50.0, 50.0));
        editor.flush();

        let id = editor.scene().top_primitive_at(Vec2::new(50.0, 50.0)).unwrap();
        let node = editor.scene().node_by_primitive(id).unwrap();

        // Hover the bottom-right handle, then drag it outward
        editor.handle_input(moved(110.0, 110.0));
        drag(&mut editor, Vec2::new(110.0, 110.0), Vec2::new(160.0, 160.0));
        editor.flush();

        let bounds = editor.scene().document_bounds(node).unwrap();
        assert!((bounds.min - Vec2::new(10.0, 10.0)).length() < 1e-3);
        assert!((bounds.size() - Vec2::splat(150.0)).length() < 1e-3);
    }

    #[test]
    fn test_move_selection_by_dragging_the_body() {
        let mut editor = Editor::new();
        editor.set_current_tool(ToolId::Rect);
        drag(&mut editor, Vec2::new(10.0, 10.0), Vec2::new(110.0, 110.0));
        editor.flush();

        editor.set_current_tool(ToolId::Select);
        editor.handle_input(click(50.0, 50.0));
        editor.flush();

        let id = editor.scene().top_primitive_at(Vec2::new(50.0, 50.0)).unwrap();
        let node = editor.scene().node_by_primitive(id).unwrap();

        editor.handle_input(moved(60.0, 60.0));
        drag(&mut editor, Vec2::new(60.0, 60.0), Vec2::new(90.0, 80.0));
        editor.flush();

        let bounds = editor.scene().document_bounds(node).unwrap();
        assert!((bounds.min - Vec2::new(40.0, 30.0)).length() < 1e-3);
    }

    #[test]
    fn test_delete_key_removes_the_selection() {
        let mut editor = Editor::new();
        let node = editor
            .add_shape(
                Primitive::rect()
                    .with_size(Vec2::splat(50.0))
                    .with_transform(Matrix::translation(0.0, 0.0)),
            )
            .unwrap();
        let id = editor.scene().primitive(node).unwrap().id;
        editor.select(&[id]);
        editor.flush();

        assert!(editor.handle_input(InputEvent::KeyDown(KeyEvent { key: Key::Delete })));
        editor.flush();

        assert!(editor.selection().is_empty());
        assert!(editor.scene().node(node).is_none());
        assert!(editor.scene().spatial().is_empty());
        let gizmo = editor.transformer.gizmo_node().unwrap();
        assert!(!editor.scene().node(gizmo).unwrap().is_visible());
    }

    #[test]
    fn test_remove_layer_prunes_selection() {
        let mut editor = Editor::new();
        editor.create_layer(LayerConfig::new("notes")).unwrap();
        editor.set_active_layer("notes").unwrap();
        let node = editor
            .add_shape(Primitive::rect().with_size(Vec2::splat(10.0)))
            .unwrap();
        let id = editor.scene().primitive(node).unwrap().id;
        editor.select(&[id]);
        editor.flush();

        editor.remove_layer("notes").unwrap();
        editor.flush();
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_flush_reports_redraw_only_when_dirty() {
        let mut editor = Editor::new();
        editor.flush();
        assert!(!editor.flush());

        editor
            .add_shape(Primitive::rect().with_size(Vec2::splat(10.0)))
            .unwrap();
        assert!(editor.flush());
        assert!(!editor.flush());
    }

    #[test]
    fn test_tool_change_is_announced() {
        let mut editor = Editor::new();
        let tools = Rc::new(RefCell::new(Vec::new()));
        let sink = tools.clone();
        editor.subscribe(move |event| {
            if let EditorEvent::ToolChanged(id) = event {
                sink.borrow_mut().push(*id);
            }
        });

        editor.set_current_tool(ToolId::Line);
        editor.flush();
        assert_eq!(*tools.borrow(), vec![ToolId::Line]);
        assert_eq!(editor.current_tool(), ToolId::Line);
    }
}
