//! Saved form of an egg.
//!
//! Keys follow the host's save format (`HatchTime`, `Breed`,
//! `TransitionBreed`, `TransitionTime`). Transition keys are only written
//! while a transition is running.

use ron::extensions::Extensions;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::error::{HatcheryError, Result};
use crate::math::Vec3Fixed;

/// Persisted egg fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EggRecord {
    /// Ticks until hatch. Missing means a fresh egg.
    #[serde(rename = "HatchTime", default, skip_serializing_if = "Option::is_none")]
    pub hatch_time: Option<i32>,

    /// Current breed id.
    #[serde(rename = "Breed", default)]
    pub breed: String,

    /// Pending transition breed id.
    #[serde(
        rename = "TransitionBreed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_breed: Option<String>,

    /// Ticks left in the pending transition.
    #[serde(
        rename = "TransitionTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_time: Option<i32>,

    /// Position.
    #[serde(rename = "Pos", default)]
    pub pos: Vec3Fixed,

    /// Velocity.
    #[serde(rename = "Motion", default)]
    pub motion: Vec3Fixed,

    /// Display name carried over to the hatchling.
    #[serde(rename = "CustomName", default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,

    /// Whether gravity is disabled.
    #[serde(rename = "NoGravity", default)]
    pub no_gravity: bool,
}

impl EggRecord {
    /// Render as RON text.
    pub fn to_ron(&self) -> Result<String> {
        let pretty = PrettyConfig::new().extensions(Extensions::IMPLICIT_SOME);
        ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| HatcheryError::Serialization(format!("Failed to write egg record: {}", e)))
    }

    /// Parse RON text. `Some(..)` wrappers on optional keys may be omitted.
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
            .map_err(|e| HatcheryError::DataParseError {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_record_omits_transition_keys() {
        let record = EggRecord {
            hatch_time: Some(500),
            breed: "fire".to_string(),
            ..Default::default()
        };
        let text = record.to_ron().unwrap();
        assert!(text.contains("HatchTime"));
        assert!(!text.contains("TransitionBreed"));
        assert!(!text.contains("TransitionTime"));
        assert_eq!(EggRecord::from_ron("test", &text).unwrap(), record);
    }

    #[test]
    fn test_parses_hand_written_record() {
        let record = EggRecord::from_ron(
            "hand",
            r#"(HatchTime: 900, Breed: "ice", TransitionBreed: "fire", TransitionTime: 80)"#,
        )
        .unwrap();
        assert_eq!(record.hatch_time, Some(900));
        assert_eq!(record.transition_breed.as_deref(), Some("fire"));
        assert_eq!(record.transition_time, Some(80));
        assert_eq!(record.pos, Vec3Fixed::ZERO);
        assert!(!record.no_gravity);
    }

    #[test]
    fn test_empty_record_is_fresh() {
        let record = EggRecord::from_ron("empty", "()").unwrap();
        assert_eq!(record, EggRecord::default());
    }
}
