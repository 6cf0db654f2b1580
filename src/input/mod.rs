//! Input handling: platform-agnostic event types, the single-pointer drag
//! tracker and bindable key actions.

/// Platform-agnostic input events and orientation samples.
pub mod event;
/// Bindable key actions.
pub mod keyboard;
/// Single-pointer drag tracking.
pub mod touch;

pub use event::{InputEvent, OrientationSample};
pub use keyboard::KeyAction;
pub use touch::TouchDragState;
