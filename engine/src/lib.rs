//! AirTouch interaction engine.
//!
//! Turns a stream of tracked hand skeletons into pointer events for a
//! touchless display. Each frame, every active recognizer picks a point
//! on the hand, projects it onto the virtual screen, stabilises it with a
//! resizable deadzone and runs its own press/release state machine.

pub mod config;
pub mod curve;
pub mod drag;
pub mod engine;
pub mod filter;
pub mod hand;
pub mod history;
pub mod math;
pub mod protocol;
pub mod recognizer;
pub mod screen;
pub mod selector;
pub mod sexp;
pub mod stabiliser;
pub mod timer;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EventSink, Frame};
pub use hand::{Chirality, HandJoint, HandSample};
pub use recognizer::{HandSlot, InputKind, InteractionKind, PointerEvent, Positions};
