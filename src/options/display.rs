use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
/// Surface sizing and scene population.
pub struct DisplayOptions {
    /// Lower bound for the device pixel ratio used by the surface.
    #[schemars(skip)]
    pub min_pixel_ratio: f32,
    /// Upper bound for the device pixel ratio; bounds GPU cost on dense
    /// displays.
    #[schemars(title = "Max Pixel Ratio", range(min = 1.0, max = 3.0), extend("step" = 0.25))]
    pub max_pixel_ratio: f32,
    /// Vertical field of view in degrees for the motion-driven scenes.
    #[schemars(title = "Field of View", range(min = 30.0, max = 100.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Stars generated by the starfield-based scenes.
    #[schemars(title = "Star Count", range(min = 100, max = 20000))]
    pub star_count: u32,
    /// Index of the scene shown at startup (wraps like a switch).
    #[schemars(skip)]
    pub initial_view: i64,
    /// Optional JSON mesh shown by the model scene.
    #[schemars(skip)]
    pub model_path: Option<String>,
}

/// Smallest pixel ratio a surface is sized with.
const MIN_PIXEL_RATIO: f32 = 1e-3;

impl DisplayOptions {
    /// Replace out-of-range values from a hand-edited file with usable ones.
    /// Afterwards both ratios are finite, positive and ordered.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(self.min_pixel_ratio.is_finite() && self.min_pixel_ratio >= MIN_PIXEL_RATIO) {
            self.min_pixel_ratio = defaults.min_pixel_ratio;
        }
        if !self.max_pixel_ratio.is_finite() {
            self.max_pixel_ratio = defaults.max_pixel_ratio;
        }
        self.max_pixel_ratio = self.max_pixel_ratio.max(self.min_pixel_ratio);
        if !(self.fovy.is_finite() && self.fovy > 1.0 && self.fovy < 179.0) {
            self.fovy = defaults.fovy;
        }
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            min_pixel_ratio: 1.0,
            max_pixel_ratio: 2.0,
            fovy: 60.0,
            star_count: 4000,
            initial_view: 0,
            model_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_inverted_ratios_are_repaired() {
        let mut options = DisplayOptions {
            min_pixel_ratio: f32::NAN,
            max_pixel_ratio: 0.5,
            ..DisplayOptions::default()
        };
        options.sanitize();
        assert_eq!(options.min_pixel_ratio, 1.0);
        assert_eq!(options.max_pixel_ratio, 1.0);
    }

    #[test]
    fn sane_values_are_untouched() {
        let mut options = DisplayOptions {
            min_pixel_ratio: 0.75,
            max_pixel_ratio: 3.0,
            ..DisplayOptions::default()
        };
        let before = options.clone();
        options.sanitize();
        assert_eq!(options, before);
    }
}
