use serde::{Deserialize, Serialize};

/// Host-level actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML presets stay readable:
/// ```toml
/// [keybindings.bindings]
/// next_view = "ArrowRight"
/// recenter = "KeyC"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Switch to the next scene.
    NextView,
    /// Switch to the previous scene.
    PreviousView,
    /// Zero the fused orientation on the current attitude or drag.
    Recenter,
    /// Ask for motion-sensor access (counts as a user gesture).
    EnableMotion,
}
