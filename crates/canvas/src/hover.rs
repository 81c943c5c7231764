//! Hover tracking.
//!
//! Watches pointer moves, resolves the topmost primitive under the
//! cursor, and announces transitions. Never consumes the event, so it
//! can sit anywhere in the dispatch chain without starving handlers
//! after it.

use scene_graph::primitive::PrimitiveId;

use crate::dispatcher::{DispatchCtx, EventHandler, PointerEvent};
use crate::events::EditorEvent;

#[derive(Default)]
pub struct HoverManager {
    current: Option<PrimitiveId>,
}

impl HoverManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<PrimitiveId> {
        self.current
    }
}

impl EventHandler for HoverManager {
    fn on_pointer_move(&mut self, event: &PointerEvent, cx: &mut DispatchCtx) -> bool {
        let hit = cx.scene.top_primitive_at(event.position);
        if hit != self.current {
            self.current = hit;
            cx.bus.emit(EditorEvent::HoverChanged(hit));
        }
        false
    }
}
