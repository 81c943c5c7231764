//! Editor event contract and delivery.
//!
//! Every observable state change in the editor surfaces as one of the
//! [`EditorEvent`] variants. Events are queued as mutations happen and
//! delivered to subscribers in one batch by the editor's end-of-update
//! flush, so a burst of synchronous mutations produces one delivery
//! pass per cycle.

use scene_graph::primitive::PrimitiveId;
use scene_graph::SceneEvent;
use vellum_core::Matrix;

use crate::tools::ToolId;

/// Everything the editor can notify consumers about.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// The view matrix changed (pan or zoom). Carries the new matrix.
    CameraChanged(Matrix),
    /// The selection reached a new final state. Emitted at most once
    /// per update cycle.
    SelectionChanged(Vec<PrimitiveId>),
    /// Tracked primitives entered or left the document tree.
    DescendantsChanged(Vec<PrimitiveId>),
    ToolChanged(ToolId),
    LayerAdded(String),
    LayerRemoved(String),
    LayerChanged(String),
    HoverChanged(Option<PrimitiveId>),
}

impl From<SceneEvent> for EditorEvent {
    fn from(event: SceneEvent) -> Self {
        match event {
            SceneEvent::DescendantsChanged(ids) => EditorEvent::DescendantsChanged(ids),
            SceneEvent::LayerAdded(name) => EditorEvent::LayerAdded(name),
            SceneEvent::LayerRemoved(name) => EditorEvent::LayerRemoved(name),
            SceneEvent::LayerChanged(name) => EditorEvent::LayerChanged(name),
        }
    }
}

/// Queued event delivery to registered subscribers.
#[derive(Default)]
pub struct EventBus {
    queue: Vec<EditorEvent>,
    subscribers: Vec<Box<dyn FnMut(&EditorEvent)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event for the next flush
    pub fn emit(&mut self, event: EditorEvent) {
        self.queue.push(event);
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&EditorEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers every queued event to every subscriber, in emission
    /// order, and clears the queue
    pub fn flush(&mut self) {
        for event in self.queue.drain(..) {
            for subscriber in self.subscribers.iter_mut() {
                subscriber(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_flush_delivers_in_order_and_clears() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        bus.emit(EditorEvent::LayerAdded("a".into()));
        bus.emit(EditorEvent::LayerRemoved("a".into()));
        assert_eq!(bus.pending(), 2);

        bus.flush();
        assert_eq!(bus.pending(), 0);
        assert_eq!(
            *seen.borrow(),
            vec![
                EditorEvent::LayerAdded("a".into()),
                EditorEvent::LayerRemoved("a".into())
            ]
        );

        bus.flush();
        assert_eq!(seen.borrow().len(), 2);
    }
}
