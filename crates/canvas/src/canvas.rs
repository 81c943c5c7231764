//! # Canvas Interaction Layer
//!
//! Everything between raw input and the scene graph: the camera, tools,
//! selection, the transform gizmo, and the [`Editor`] facade that wires
//! them together.
//!
//! Input flows through a single [`Dispatcher`] chain. Each handler gets
//! the event in turn and the first one that consumes it wins, so the
//! camera can take a pan gesture before a tool ever sees it, and the
//! transformer can take a handle drag before the select tool does.
//!
//! [`Editor`]: crate::editor::Editor
//! [`Dispatcher`]: crate::dispatcher::Dispatcher

pub mod camera;
pub mod dispatcher;
pub mod editor;
pub mod events;
pub mod hover;
pub mod selection;
pub mod tools;
pub mod transformer;

pub use camera::Camera;
pub use dispatcher::{Dispatcher, EventHandler, InputEvent};
pub use editor::Editor;
pub use events::{EditorEvent, EventBus};
pub use selection::SelectionManager;
pub use tools::ToolId;
pub use transformer::Transformer;
