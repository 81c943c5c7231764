//! Pan and zoom.
//!
//! The camera owns the view matrix: document space times the view
//! matrix is viewport space. Panning adds to the translation, zooming
//! scales about the cursor so the document point under it stays put.
//! Every mutation is pushed into the scene graph (which caches the
//! inverse for viewport conversion) and announced on the event bus.

use glam::Vec2;
use log::warn;
use vellum_core::Matrix;

use crate::dispatcher::{DispatchCtx, EventHandler, PointerButton, PointerEvent, WheelEvent};
use crate::events::EditorEvent;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 10.0;

/// Per-wheel-notch zoom factor.
const ZOOM_IN_FACTOR: f32 = 1.1;
const ZOOM_OUT_FACTOR: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq)]
enum PanState {
    Idle,
    /// Panning, with the last pointer position in viewport coordinates.
    Panning { last: Vec2 },
}

pub struct Camera {
    transform: Matrix,
    pan: PanState,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            transform: Matrix::IDENTITY,
            pan: PanState::Idle,
        }
    }

    /// The view matrix (document space to viewport)
    pub fn transform(&self) -> Matrix {
        self.transform
    }

    /// Uniform zoom factor of the current view
    pub fn zoom(&self) -> f32 {
        self.transform.a
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.pan, PanState::Panning { .. })
    }

    /// Installs the view on the scene and announces the change
    fn sync(&self, cx: &mut DispatchCtx) {
        match cx.scene.set_view_matrix(self.transform) {
            Ok(()) => cx.bus.emit(EditorEvent::CameraChanged(self.transform)),
            Err(error) => warn!("camera view rejected: {error}"),
        }
    }

    fn starts_pan(event: &PointerEvent, cx: &DispatchCtx) -> bool {
        event.button == PointerButton::Middle
            || (event.button == PointerButton::Left && cx.keys.space)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for Camera {
    fn on_pointer_down(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        if Self::starts_pan(event, cx) {
            self.pan = PanState::Panning {
                last: event.position,
            };
            return true;
        }
        false
    }

    fn on_pointer_move(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        let PanState::Panning { last } = self.pan else {
            return false;
        };
        let delta = event.position - last;
        self.transform = self.transform.translated(delta);
        self.pan = PanState::Panning {
            last: event.position,
        };
        self.sync(cx);
        true
    }

    fn on_pointer_up(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        if self.is_panning() {
            self.pan = PanState::Idle;
            return true;
        }
        false
    }

    fn on_wheel(&mut self, event: &WheelEvent, cx: &mut DispatchCtx) -> bool {
        // A wheel gesture ends any pan in progress
        self.pan = PanState::Idle;

        let factor = if event.delta_y > 0.0 {
            ZOOM_OUT_FACTOR
        } else {
            ZOOM_IN_FACTOR
        };
        let next_zoom = self.zoom() * factor;
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&next_zoom) {
            // Consumed, but the view stays where it is
            return true;
        }

        // Scale about the cursor: translate it to the origin, scale,
        // translate back
        let cursor = event.position;
        self.transform = Matrix::translation(cursor.x, cursor.y)
            .append(&Matrix::scaling(factor, factor))
            .append(&Matrix::translation(-cursor.x, -cursor.y))
            .append(&self.transform);
        self.sync(cx);
        true
    }
}
