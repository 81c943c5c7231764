//! The selection gizmo: a bounding box with resize, rotate and move
//! handles.
//!
//! The gizmo lives in the helper layer, so it is never spatially
//! indexed or hit by document picking. A single selected shape gets an
//! oriented box that hugs the shape exactly even under rotated
//! ancestors; multiple selections get the axis-aligned union of their
//! document bounds.
//!
//! Handle drags produce a delta matrix in the gizmo's parent frame.
//! That one delta is applied to the gizmo and, conjugated into each
//! shape's own parent frame, to every selected shape, so a shape nested
//! three rotated frames deep still follows the cursor exactly. After
//! every change the gizmo geometry is re-derived from the shapes rather
//! than accumulated, which keeps scale out of the gizmo's transform.

use glam::Vec2;
use log::debug;
use palette::Srgba;
use scene_graph::primitive::{Paint, Primitive};
use scene_graph::{SceneGraph, SceneNodeId, HELPER_LAYER};
use smallvec::SmallVec;
use vellum_core::{Bounds, Matrix};

use crate::dispatcher::{DispatchCtx, EventHandler, PointerEvent};
use crate::selection::SelectionManager;

/// Diameter of a handle, in document units.
pub const HANDLE_SIZE: f32 = 20.0;
/// Distance of the rotate handle above the gizmo's top edge.
const ROTATE_HANDLE_OFFSET: f32 = 40.0;

/// The ten grab points on the gizmo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    TopLeft,
    TopMiddle,
    TopRight,
    MiddleRight,
    BottomRight,
    BottomMiddle,
    BottomLeft,
    MiddleLeft,
    Rotate,
    /// The gizmo body itself; dragging it translates the selection.
    Mover,
}

pub const DEFAULT_HANDLES: [HandleKind; 10] = [
    HandleKind::TopLeft,
    HandleKind::TopMiddle,
    HandleKind::TopRight,
    HandleKind::MiddleRight,
    HandleKind::BottomRight,
    HandleKind::BottomMiddle,
    HandleKind::BottomLeft,
    HandleKind::MiddleLeft,
    HandleKind::Rotate,
    HandleKind::Mover,
];

impl HandleKind {
    /// Handle anchor position in the gizmo's local frame
    pub fn anchor(&self, size: Vec2) -> Vec2 {
        match self {
            HandleKind::TopLeft => Vec2::ZERO,
            HandleKind::TopMiddle => Vec2::new(size.x * 0.5, 0.0),
            HandleKind::TopRight => Vec2::new(size.x, 0.0),
            HandleKind::MiddleRight => Vec2::new(size.x, size.y * 0.5),
            HandleKind::BottomRight => size,
            HandleKind::BottomMiddle => Vec2::new(size.x * 0.5, size.y),
            HandleKind::BottomLeft => Vec2::new(0.0, size.y),
            HandleKind::MiddleLeft => Vec2::new(0.0, size.y * 0.5),
            HandleKind::Rotate => Vec2::new(size.x * 0.5, -ROTATE_HANDLE_OFFSET),
            HandleKind::Mover => size * 0.5,
        }
    }

    /// The point of the gizmo that stays fixed while this handle
    /// resizes, in the gizmo's local frame
    fn pivot(&self, size: Vec2) -> Vec2 {
        match self {
            HandleKind::TopLeft => size,
            HandleKind::TopMiddle => Vec2::new(size.x * 0.5, size.y),
            HandleKind::TopRight => Vec2::new(0.0, size.y),
            HandleKind::MiddleRight => Vec2::new(0.0, size.y * 0.5),
            HandleKind::BottomRight => Vec2::ZERO,
            HandleKind::BottomMiddle => Vec2::new(size.x * 0.5, 0.0),
            HandleKind::BottomLeft => Vec2::new(size.x, 0.0),
            HandleKind::MiddleLeft => Vec2::new(size.x, size.y * 0.5),
            HandleKind::Rotate | HandleKind::Mover => Vec2::ZERO,
        }
    }

    /// Delta matrix in the gizmo's parent frame for one pointer step
    pub fn delta_in_parent(&self, ctx: &HandleContext) -> Option<Matrix> {
        match self {
            HandleKind::Mover => {
                let delta = ctx.current_in_parent - ctx.last_in_parent;
                Some(Matrix::translation(delta.x, delta.y))
            }
            HandleKind::Rotate => {
                let center = ctx.center_in_parent;
                let last = ctx.last_in_parent - center;
                let current = ctx.current_in_parent - center;
                let angle = current.y.atan2(current.x) - last.y.atan2(last.x);
                Some(
                    Matrix::translation(center.x, center.y)
                        .append(&Matrix::rotation(angle))
                        .append(&Matrix::translation(-center.x, -center.y)),
                )
            }
            _ => {
                let delta = ctx.current_in_gizmo - ctx.last_in_gizmo;
                let size = ctx.size;
                let scale_x = match self {
                    HandleKind::TopLeft | HandleKind::MiddleLeft | HandleKind::BottomLeft => {
                        safe_ratio(size.x - delta.x, size.x)
                    }
                    HandleKind::TopRight | HandleKind::MiddleRight | HandleKind::BottomRight => {
                        safe_ratio(size.x + delta.x, size.x)
                    }
                    _ => 1.0,
                };
                let scale_y = match self {
                    HandleKind::TopLeft | HandleKind::TopMiddle | HandleKind::TopRight => {
                        safe_ratio(size.y - delta.y, size.y)
                    }
                    HandleKind::BottomLeft | HandleKind::BottomMiddle | HandleKind::BottomRight => {
                        safe_ratio(size.y + delta.y, size.y)
                    }
                    _ => 1.0,
                };
                let pivot = self.pivot(size);
                let in_gizmo = Matrix::translation(pivot.x, pivot.y)
                    .append(&Matrix::scaling(scale_x, scale_y))
                    .append(&Matrix::translation(-pivot.x, -pivot.y));
                child_delta_to_parent_delta(&in_gizmo, &ctx.gizmo_transform)
            }
        }
    }
}

fn safe_ratio(new: f32, old: f32) -> f32 {
    if old == 0.0 {
        1.0
    } else {
        new / old
    }
}

/// Pointer positions and gizmo geometry for one drag step.
pub struct HandleContext {
    pub last_in_parent: Vec2,
    pub current_in_parent: Vec2,
    pub last_in_gizmo: Vec2,
    pub current_in_gizmo: Vec2,
    /// The gizmo's center, in its parent frame
    pub center_in_parent: Vec2,
    pub size: Vec2,
    /// The gizmo's local transform
    pub gizmo_transform: Matrix,
}

/// Re-expresses a delta from a child frame in the parent frame:
/// `local * delta * local^-1`. None when the local transform is
/// degenerate.
pub fn child_delta_to_parent_delta(delta: &Matrix, local: &Matrix) -> Option<Matrix> {
    Some(local.append(delta).append(&local.invert()?))
}

/// Re-expresses a delta acting in one parent frame as a delta acting in
/// another: through document space and back down. This is how one gizmo
/// drag moves shapes that live under arbitrarily transformed parents.
pub fn convert_delta(
    delta: &Matrix,
    source_parent_world: &Matrix,
    target_parent_world: &Matrix,
) -> Option<Matrix> {
    Some(
        target_parent_world
            .invert()?
            .append(source_parent_world)
            .append(delta)
            .append(&source_parent_world.invert()?)
            .append(target_parent_world),
    )
}

fn handle_fill() -> Paint {
    Paint::solid(Srgba::new(0.2, 0.45, 0.95, 1.0))
}

/// The selection gizmo and its drag state.
pub struct Transformer {
    gizmo: Option<SceneNodeId>,
    handles: SmallVec<[(HandleKind, SceneNodeId); 10]>,
    /// Scene nodes of the selected shapes
    targets: Vec<SceneNodeId>,
    active_handle: Option<HandleKind>,
    /// Last pointer position while dragging, in viewport coordinates
    drag: Option<Vec2>,
}

impl Transformer {
    pub fn new() -> Self {
        Self {
            gizmo: None,
            handles: SmallVec::new(),
            targets: Vec::new(),
            active_handle: None,
            drag: None,
        }
    }

    /// The gizmo's scene node, once it exists
    pub fn gizmo_node(&self) -> Option<SceneNodeId> {
        self.gizmo
    }

    pub fn active_handle(&self) -> Option<HandleKind> {
        self.active_handle
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Rebuilds the target list from the selection and re-derives the
    /// gizmo geometry. Called by the editor whenever the selection or
    /// the scene changed.
    pub fn refresh(&mut self, scene: &mut SceneGraph, selection: &SelectionManager) {
        self.targets = selection
            .selected()
            .into_iter()
            .filter_map(|id| scene.node_by_primitive(id))
            .collect();

        let Some(gizmo) = self.ensure_gizmo(scene) else {
            return;
        };
        if self.targets.is_empty() {
            scene.set_visible(gizmo, false);
            self.active_handle = None;
            self.drag = None;
            return;
        }
        scene.set_visible(gizmo, true);
        self.update_geometry(scene);
    }

    fn ensure_gizmo(&mut self, scene: &mut SceneGraph) -> Option<SceneNodeId> {
        if let Some(gizmo) = self.gizmo {
            if scene.node(gizmo).is_some() {
                return Some(gizmo);
            }
        }
        let gizmo = match scene.add_child_to_layer(HELPER_LAYER, Primitive::transformer()) {
            Ok(node) => node,
            Err(error) => {
                debug!("could not create the gizmo: {error}");
                return None;
            }
        };
        self.handles.clear();
        for kind in DEFAULT_HANDLES {
            let handle = Primitive::ellipse()
                .with_label("Handle")
                .with_size(Vec2::splat(HANDLE_SIZE))
                .with_fill(handle_fill())
                .with_selectable(false);
            match scene.add_child(gizmo, handle) {
                Ok(node) => self.handles.push((kind, node)),
                Err(error) => debug!("could not create a handle: {error}"),
            }
        }
        self.gizmo = Some(gizmo);
        Some(gizmo)
    }

    /// Re-derives the gizmo's transform and size from the selected
    /// shapes. Never accumulates onto the previous gizmo transform, so
    /// scale stays in the size and the transform remains a rigid
    /// translation plus rotation.
    fn update_geometry(&mut self, scene: &mut SceneGraph) {
        let Some(gizmo) = self.gizmo else { return };
        let Some(parent) = scene.node(gizmo).and_then(|node| node.parent()) else {
            return;
        };
        let Some(inverse_parent) = scene.world_transform(parent).invert() else {
            return;
        };

        let (transform, size) = if let [single] = self.targets[..] {
            let Some(primitive) = scene.primitive(single) else {
                return;
            };
            let corners = primitive.local_bounds().corners();
            // Shape local frame straight into the gizmo's parent frame
            let into_parent = inverse_parent.append(&scene.world_transform(single));
            let rotation = into_parent.decompose().rotation;

            // Un-rotate the corners, box them axis-aligned, then put
            // the box's origin back on the rotated axes
            let unrotate = Matrix::rotation(-rotation);
            let unrotated =
                corners.map(|corner| unrotate.apply(into_parent.apply(corner)));
            let boxed = Bounds::from_points(&unrotated);
            let top_left = Matrix::rotation(rotation).apply(boxed.min);
            (
                Matrix::from_position_rotation(top_left, rotation),
                boxed.size(),
            )
        } else {
            let mut union: Option<Bounds> = None;
            for &target in &self.targets {
                if let Some(bounds) = scene.document_bounds(target) {
                    union = Some(match union {
                        Some(existing) => existing.union(&bounds),
                        None => bounds,
                    });
                }
            }
            let Some(union) = union else { return };
            let in_parent = union.apply_matrix(&inverse_parent);
            (
                Matrix::translation(in_parent.min.x, in_parent.min.y),
                in_parent.size(),
            )
        };

        scene
            .update_primitive(gizmo, |primitive| {
                primitive.transform = transform;
                primitive.size = size;
            })
            .ok();

        for &(kind, node) in &self.handles {
            let anchor = kind.anchor(size) - Vec2::splat(HANDLE_SIZE * 0.5);
            scene
                .update_primitive(node, |primitive| {
                    primitive.transform = Matrix::translation(anchor.x, anchor.y);
                })
                .ok();
        }
    }

    /// Applies one delta (in the gizmo's parent frame) to the gizmo and
    /// every selected shape.
    pub fn apply_delta(&mut self, scene: &mut SceneGraph, delta: &Matrix) {
        let Some(gizmo) = self.gizmo else { return };
        let Some(parent) = scene.node(gizmo).and_then(|node| node.parent()) else {
            return;
        };
        let gizmo_parent_world = scene.world_transform(parent);

        scene
            .update_primitive(gizmo, |primitive| {
                primitive.transform = delta.append(&primitive.transform);
            })
            .ok();

        for &target in &self.targets {
            let Some(shape_parent) = scene.node(target).and_then(|node| node.parent()) else {
                continue;
            };
            let shape_parent_world = scene.world_transform(shape_parent);
            let Some(local_delta) = convert_delta(delta, &gizmo_parent_world, &shape_parent_world)
            else {
                continue;
            };
            scene
                .update_primitive(target, |primitive| {
                    primitive.transform = local_delta.append(&primitive.transform);
                })
                .ok();
        }
        self.update_geometry(scene);
    }

    /// Resolves which handle, if any, sits under a viewport point
    fn handle_at(&self, scene: &SceneGraph, viewport_point: Vec2) -> Option<HandleKind> {
        let gizmo = self.gizmo?;
        if !scene.node(gizmo)?.is_visible() {
            return None;
        }
        let parent = scene.node(gizmo)?.parent()?;
        let in_parent = scene
            .world_transform(parent)
            .invert()?
            .apply(scene.to_scene(viewport_point));
        let primitive = scene.primitive(gizmo)?;
        let in_gizmo = primitive.transform.invert()?.apply(in_parent);
        let size = primitive.size;

        // Point handles first; the mover is the whole body and would
        // otherwise shadow them
        for kind in DEFAULT_HANDLES {
            if kind == HandleKind::Mover {
                continue;
            }
            if (kind.anchor(size) - in_gizmo).length() <= HANDLE_SIZE * 0.5 {
                return Some(kind);
            }
        }
        Bounds::from_origin_size(Vec2::ZERO, size)
            .contains_point(in_gizmo)
            .then_some(HandleKind::Mover)
    }

    fn drag_step(&mut self, scene: &mut SceneGraph, last: Vec2, current: Vec2) {
        let Some(handle) = self.active_handle else { return };
        let Some(gizmo) = self.gizmo else { return };
        let Some(parent) = scene.node(gizmo).and_then(|node| node.parent()) else {
            return;
        };
        let Some(inverse_parent) = scene.world_transform(parent).invert() else {
            return;
        };
        let Some(primitive) = scene.primitive(gizmo) else {
            return;
        };
        let gizmo_transform = primitive.transform;
        let size = primitive.size;
        let Some(inverse_local) = gizmo_transform.invert() else {
            return;
        };

        let last_in_parent = inverse_parent.apply(scene.to_scene(last));
        let current_in_parent = inverse_parent.apply(scene.to_scene(current));
        let context = HandleContext {
            last_in_parent,
            current_in_parent,
            last_in_gizmo: inverse_local.apply(last_in_parent),
            current_in_gizmo: inverse_local.apply(current_in_parent),
            center_in_parent: gizmo_transform.apply(size * 0.5),
            size,
            gizmo_transform,
        };
        if let Some(delta) = handle.delta_in_parent(&context) {
            self.apply_delta(scene, &delta);
        }
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for Transformer {
    fn on_pointer_down(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        self.active_handle = self.handle_at(cx.scene, event.position);
        if self.active_handle.is_some() {
            self.drag = Some(event.position);
            return true;
        }
        false
    }

    fn on_pointer_move(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        match self.drag {
            Some(last) => {
                self.drag_step(cx.scene, last, event.position);
                self.drag = Some(event.position);
                true
            }
            None => {
                // Hover tracking only; the event stays available to tools
                self.active_handle = self.handle_at(cx.scene, event.position);
                false
            }
        }
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        if self.drag.take().is_some() {
            return true;
        }
        false
    }
}
