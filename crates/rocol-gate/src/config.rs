use std::fmt;

use serde::{Deserialize, Serialize};

/// Workbook used when expectation checks are enabled without a location.
pub const DEFAULT_EXPECTATIONS: &str = "ro-crate-validation";

/// Mode definition used when mode checks are enabled without a location.
pub const DEFAULT_MODE: &str =
    "https://language-research-technology.github.io/ro-crate-modes/modes/comprehensive-ldac.json";

/// Whether an optional validator runs, and against what.
///
/// In configuration files this is written as `false`, `true`, or a string
/// location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSetting", into = "RawSetting")]
pub enum ValidatorSetting {
    #[default]
    Disabled,
    /// Enabled with the built-in default location.
    Default,
    /// Enabled with an explicit path or URL.
    Location(String),
}

impl ValidatorSetting {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// The location to load from, or `None` when disabled.
    pub fn resolve<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match self {
            Self::Disabled => None,
            Self::Default => Some(default),
            Self::Location(loc) => Some(loc),
        }
    }
}

impl fmt::Display for ValidatorSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Default => f.write_str("default"),
            Self::Location(loc) => f.write_str(loc),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSetting {
    Flag(bool),
    Location(String),
}

impl From<RawSetting> for ValidatorSetting {
    fn from(raw: RawSetting) -> Self {
        match raw {
            RawSetting::Flag(false) => Self::Disabled,
            RawSetting::Flag(true) => Self::Default,
            RawSetting::Location(loc) => Self::Location(loc),
        }
    }
}

impl From<ValidatorSetting> for RawSetting {
    fn from(setting: ValidatorSetting) -> Self {
        match setting {
            ValidatorSetting::Disabled => Self::Flag(false),
            ValidatorSetting::Default => Self::Flag(true),
            ValidatorSetting::Location(loc) => Self::Location(loc),
        }
    }
}

/// Configuration for the validation gate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Expectation workbook check.
    pub expectations: ValidatorSetting,
    /// Mode definition check.
    pub mode: ValidatorSetting,
}

impl GateConfig {
    /// Structural checks only.
    pub fn structural_only() -> Self {
        Self::default()
    }

    pub fn expectations_location(&self) -> Option<&str> {
        self.expectations.resolve(DEFAULT_EXPECTATIONS)
    }

    pub fn mode_location(&self) -> Option<&str> {
        self.mode.resolve(DEFAULT_MODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_deserialize_from_bool_or_string() {
        let cfg: GateConfig =
            serde_json::from_str(r#"{"expectations": true, "mode": "modes/local.json"}"#).unwrap();
        assert_eq!(cfg.expectations, ValidatorSetting::Default);
        assert_eq!(cfg.expectations_location(), Some(DEFAULT_EXPECTATIONS));
        assert_eq!(cfg.mode_location(), Some("modes/local.json"));

        let off: GateConfig = serde_json::from_str(r#"{"mode": false}"#).unwrap();
        assert!(!off.mode.is_enabled());
        assert_eq!(off.mode_location(), None);
    }

    #[test]
    fn settings_serialize_back() {
        let json = serde_json::to_value(GateConfig {
            expectations: ValidatorSetting::Disabled,
            mode: ValidatorSetting::Default,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"expectations": false, "mode": true}));
    }
}
