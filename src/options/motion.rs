use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Motion", inline)]
#[serde(default)]
/// Orientation/touch fusion parameters.
pub struct MotionOptions {
    /// Base of the per-second exponential decay toward the target angle.
    /// The per-frame blend factor is `1 - decay_base^dt`.
    #[schemars(title = "Smoothing Decay", range(min = 0.000_001, max = 0.5))]
    pub decay_base: f32,
    /// Maximum absolute pitch, in degrees, before the camera would flip.
    #[schemars(title = "Pitch Limit", range(min = 10.0, max = 89.0), extend("step" = 1.0))]
    pub pitch_limit_deg: f32,
    /// Touch drag sensitivity in radians per pixel.
    #[schemars(title = "Touch Sensitivity", range(min = 0.001, max = 0.02), extend("step" = 0.001))]
    pub touch_sensitivity: f32,
    /// Device gamma degrees to camera yaw degrees.
    #[schemars(skip)]
    pub yaw_scale: f32,
    /// Device beta degrees to camera pitch degrees.
    #[schemars(skip)]
    pub pitch_scale: f32,
}

/// Largest pitch limit that keeps the camera from flipping over the pole.
const MAX_PITCH_LIMIT_DEG: f32 = 89.9;

impl MotionOptions {
    /// Pitch limit in radians, always finite and in `[0, 89.9°]`.
    #[must_use]
    pub fn pitch_limit(&self) -> f32 {
        let degrees = if self.pitch_limit_deg.is_finite() {
            self.pitch_limit_deg.clamp(0.0, MAX_PITCH_LIMIT_DEG)
        } else {
            Self::default().pitch_limit_deg
        };
        degrees.to_radians()
    }

    /// Replace out-of-range values from a hand-edited file with usable ones.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !self.pitch_limit_deg.is_finite() {
            self.pitch_limit_deg = defaults.pitch_limit_deg;
        }
        self.pitch_limit_deg = self.pitch_limit_deg.clamp(0.0, MAX_PITCH_LIMIT_DEG);
        if !(self.decay_base.is_finite() && self.decay_base > 0.0 && self.decay_base < 1.0) {
            self.decay_base = defaults.decay_base;
        }
        for (value, default) in [
            (&mut self.touch_sensitivity, defaults.touch_sensitivity),
            (&mut self.yaw_scale, defaults.yaw_scale),
            (&mut self.pitch_scale, defaults.pitch_scale),
        ] {
            if !value.is_finite() {
                *value = default;
            }
        }
    }
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            decay_base: 0.001,
            pitch_limit_deg: 85.0,
            touch_sensitivity: 0.005,
            yaw_scale: 1.0,
            pitch_scale: 1.0,
        }
    }
}
