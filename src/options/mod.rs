//! Centralized runtime options with TOML preset support.
//!
//! Motion fusion, frame clock, display and keybinding settings are
//! consolidated here. Options serialize to/from TOML so a single file can be
//! passed to the binary or embedded by a web host.

mod clock;
mod display;
mod keybindings;
mod motion;

use std::path::Path;

pub use clock::ClockOptions;
pub use display::DisplayOptions;
pub use keybindings::KeybindingOptions;
pub use motion::MotionOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CosmoError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[motion]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Orientation/touch fusion parameters.
    pub motion: MotionOptions,
    /// Frame clock parameters.
    pub clock: ClockOptions,
    /// Surface sizing and scene population.
    pub display: DisplayOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeybindingOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, CosmoError> {
        let mut opts: Self = toml::from_str(content)
            .map_err(|e| CosmoError::OptionsParse(e.to_string()))?;
        opts.keybindings.rebuild_reverse_map();
        opts.motion.sanitize();
        opts.display.sanitize();
        Ok(opts)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, CosmoError> {
        let content = std::fs::read_to_string(path).map_err(CosmoError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), CosmoError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CosmoError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CosmoError::Io)?;
        }
        std::fs::write(path, content).map_err(CosmoError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyAction;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = Options::from_toml_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[motion]
touch_sensitivity = 0.01
";
        let opts = Options::from_toml_str(toml_str).unwrap();
        assert_eq!(opts.motion.touch_sensitivity, 0.01);
        // Everything else should be default
        assert_eq!(opts.motion.decay_base, 0.001);
        assert_eq!(opts.clock.max_frame_ms, 50.0);
        assert_eq!(opts.display.max_pixel_ratio, 2.0);
    }

    #[test]
    fn malformed_toml_is_an_options_error() {
        let err = Options::from_toml_str("[motion\n").unwrap_err();
        assert!(matches!(err, CosmoError::OptionsParse(_)));
    }

    #[test]
    fn out_of_range_values_are_repaired_on_load() {
        let opts = Options::from_toml_str(
            "[motion]\npitch_limit_deg = -10.0\n[display]\nmin_pixel_ratio = nan\n",
        )
        .unwrap();
        assert_eq!(opts.motion.pitch_limit_deg, 0.0);
        assert_eq!(opts.display.min_pixel_ratio, 1.0);
        assert!(opts.display.max_pixel_ratio >= opts.display.min_pixel_ratio);
    }

    #[test]
    fn keybinding_lookup() {
        let opts = Options::default();
        assert_eq!(
            opts.keybindings.lookup("ArrowRight"),
            Some(KeyAction::NextView)
        );
        assert_eq!(opts.keybindings.lookup("KeyC"), Some(KeyAction::Recenter));
        assert_eq!(opts.keybindings.lookup("KeyZ"), None);
    }

    #[test]
    fn keybindings_survive_loading() {
        let toml_str = r#"
[keybindings.bindings]
next_view = "KeyN"
"#;
        let opts = Options::from_toml_str(toml_str).unwrap();
        assert_eq!(opts.keybindings.lookup("KeyN"), Some(KeyAction::NextView));
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("motion"));
        assert!(props.contains_key("clock"));
        assert!(props.contains_key("display"));
        assert!(!props.contains_key("keybindings"));

        let motion = &props["motion"]["properties"];
        assert!(motion.get("touch_sensitivity").is_some());
        assert!(motion.get("yaw_scale").is_none());
    }
}
