use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Clock", inline)]
#[serde(default)]
/// Frame clock parameters.
pub struct ClockOptions {
    /// Largest simulation step in milliseconds. Longer gaps between frames
    /// (backgrounded tab, debugger pause) are clamped to this.
    #[schemars(title = "Max Frame Step (ms)", range(min = 16.0, max = 250.0), extend("step" = 1.0))]
    pub max_frame_ms: f64,
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self { max_frame_ms: 50.0 }
    }
}
