//! Input events, the handler chain, and click synthesis.
//!
//! Hosts feed [`InputEvent`]s to the dispatcher, which walks an ordered
//! list of [`EventHandler`]s and stops at the first one that returns
//! true. The dispatcher also keeps the modifier-key state and folds
//! click pairs into double clicks.

use std::collections::HashSet;

use glam::Vec2;
use scene_graph::SceneGraph;

use crate::events::EventBus;
use crate::selection::SelectionManager;

/// Two clicks this close in time and space become a double click.
const DOUBLE_CLICK_THRESHOLD_MS: f64 = 300.0;
const DOUBLE_CLICK_DISTANCE: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Modifier flags carried on each pointer event by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Position in viewport coordinates.
    pub position: Vec2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// Milliseconds from an arbitrary host epoch.
    pub timestamp_ms: f64,
}

impl PointerEvent {
    pub fn new(position: Vec2, button: PointerButton) -> Self {
        Self {
            position,
            button,
            modifiers: Modifiers::default(),
            timestamp_ms: 0.0,
        }
    }

    pub fn at(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    pub position: Vec2,
    /// Positive scrolls away from the user (zoom out).
    pub delta_y: f32,
    pub timestamp_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Shift,
    Control,
    Alt,
    Escape,
    Delete,
    Character(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
}

/// One input event from the host windowing layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    /// A completed press-release pair, as reported by the host.
    Click(PointerEvent),
    Wheel(WheelEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
}

/// Snapshot of the modifier keys at dispatch time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub space: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Everything a handler may touch while processing an event.
pub struct DispatchCtx<'a> {
    pub scene: &'a mut SceneGraph,
    pub selection: &'a mut SelectionManager,
    pub bus: &'a mut EventBus,
    pub keys: KeyState,
}

/// A participant in the dispatch chain.
///
/// Every method returns whether the event was consumed; the defaults
/// consume nothing, so handlers implement only what they care about.
pub trait EventHandler {
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
    fn on_double_click(&mut self, _event: &PointerEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
    fn on_wheel(&mut self, _event: &WheelEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
    fn on_key_down(&mut self, _event: &KeyEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
    fn on_key_up(&mut self, _event: &KeyEvent, _cx: &mut DispatchCtx) -> bool {
        false
    }
}

/// Walks input events down an ordered handler chain.
#[derive(Default)]
pub struct Dispatcher {
    pressed: HashSet<Key>,
    last_click: Option<(f64, Vec2)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates modifier-key tracking. Must run before dispatch so the
    /// key state snapshot reflects this event.
    pub fn track_keys(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key_event) => {
                self.pressed.insert(key_event.key);
            }
            InputEvent::KeyUp(key_event) => {
                self.pressed.remove(&key_event.key);
            }
            _ => {}
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn key_state(&self) -> KeyState {
        KeyState {
            space: self.pressed.contains(&Key::Space),
            shift: self.pressed.contains(&Key::Shift),
            ctrl: self.pressed.contains(&Key::Control),
            alt: self.pressed.contains(&Key::Alt),
        }
    }

    /// Dispatches one event through the chain. Returns whether any
    /// handler consumed it.
    ///
    /// Clicks are classified before dispatch: a click landing within
    /// [`DOUBLE_CLICK_THRESHOLD_MS`] and [`DOUBLE_CLICK_DISTANCE`] of
    /// the previous one goes out as a double click instead, and the
    /// tracking state resets so a triple click starts a fresh pair.
    pub fn dispatch(
        &mut self,
        event: &InputEvent,
        handlers: &mut [&mut dyn EventHandler],
        cx: &mut DispatchCtx,
    ) -> bool {
        match event {
            InputEvent::PointerDown(pointer) => {
                Self::first(handlers, |handler| handler.on_pointer_down(pointer, cx))
            }
            InputEvent::PointerMove(pointer) => {
                Self::first(handlers, |handler| handler.on_pointer_move(pointer, cx))
            }
            InputEvent::PointerUp(pointer) => {
                Self::first(handlers, |handler| handler.on_pointer_up(pointer, cx))
            }
            InputEvent::Click(pointer) => {
                if self.is_double_click(pointer) {
                    self.last_click = None;
                    Self::first(handlers, |handler| handler.on_double_click(pointer, cx))
                } else {
                    self.last_click = Some((pointer.timestamp_ms, pointer.position));
                    Self::first(handlers, |handler| handler.on_click(pointer, cx))
                }
            }
            InputEvent::Wheel(wheel) => {
                Self::first(handlers, |handler| handler.on_wheel(wheel, cx))
            }
            InputEvent::KeyDown(key) => {
                Self::first(handlers, |handler| handler.on_key_down(key, cx))
            }
            InputEvent::KeyUp(key) => Self::first(handlers, |handler| handler.on_key_up(key, cx)),
        }
    }

    fn is_double_click(&self, pointer: &PointerEvent) -> bool {
        self.last_click.is_some_and(|(time, position)| {
            pointer.timestamp_ms - time <= DOUBLE_CLICK_THRESHOLD_MS
                && (pointer.position - position).length() <= DOUBLE_CLICK_DISTANCE
        })
    }

    fn first(
        handlers: &mut [&mut dyn EventHandler],
        mut invoke: impl FnMut(&mut dyn EventHandler) -> bool,
    ) -> bool {
        handlers.iter_mut().any(|handler| invoke(&mut **handler))
    }
}
