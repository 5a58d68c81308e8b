//! Tunable constants for the egg lifecycle.
//!
//! Every field has a default, so a RON file only needs the values it
//! overrides. Fixed-point fields are written as raw bits, like all other
//! fixed-point data files.
//!
//! # Example RON
//!
//! ```ron
//! EggConfig(
//!     default_hatch_time: 6000,
//!     habitat_update_interval: 100,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{HatcheryError, Result};
use crate::math::{fixed_serde, Fixed};

/// Egg lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EggConfig {
    /// Ticks from placement to hatch for a fresh egg.
    pub default_hatch_time: i32,

    /// Length of a breed transition in ticks.
    pub transition_time: u32,

    /// Habitat is re-evaluated when the egg's age is a multiple of this.
    pub habitat_update_interval: u64,

    /// Wiggling starts once remaining hatch time drops below this
    /// percentage of `default_hatch_time`.
    pub wiggle_threshold_percent: u32,

    /// Lower bound on the wiggle roll denominator.
    pub min_wiggle_roll: i32,

    /// Per-tick step of the replica's wiggle interpolation.
    #[serde(with = "fixed_serde")]
    pub wiggle_step: Fixed,

    /// Non-player damage strictly above this destroys the egg.
    #[serde(with = "fixed_serde")]
    pub fatal_damage: Fixed,

    /// A breed must score strictly more than this to win a habitat check.
    pub min_habitat_points: u32,

    /// Downward acceleration per tick.
    #[serde(with = "fixed_serde")]
    pub gravity: Fixed,

    /// Horizontal velocity multiplier applied after each move.
    #[serde(with = "fixed_serde")]
    pub horizontal_drag: Fixed,

    /// Vertical velocity multiplier applied after each move.
    #[serde(with = "fixed_serde")]
    pub vertical_drag: Fixed,

    /// Footprint width of the egg's bounding box.
    #[serde(with = "fixed_serde")]
    pub width: Fixed,

    /// Height of the egg's bounding box.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
}

impl Default for EggConfig {
    fn default() -> Self {
        Self {
            default_hatch_time: 12_000,
            transition_time: 200,
            habitat_update_interval: 200,
            wiggle_threshold_percent: 25,
            min_wiggle_roll: 10,
            wiggle_step: Fixed::from_num(0.1),
            fatal_damage: Fixed::from_num(4),
            min_habitat_points: 2,
            gravity: Fixed::from_num(0.04),
            horizontal_drag: Fixed::from_num(0.3),
            vertical_drag: Fixed::from_num(0.98),
            width: Fixed::from_num(0.9),
            height: Fixed::from_num(0.9),
        }
    }
}

impl EggConfig {
    /// Remaining hatch time below which the egg starts wiggling.
    #[must_use]
    pub fn wiggle_threshold(&self) -> i32 {
        let scaled = i64::from(self.default_hatch_time) * i64::from(self.wiggle_threshold_percent);
        (scaled / 100) as i32
    }

    /// Parse and validate a config from RON text.
    pub fn from_ron(source_name: &str, text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| HatcheryError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or divide by zero.
    pub fn validate(&self) -> Result<()> {
        if self.default_hatch_time <= 0 {
            return Err(invalid("default_hatch_time", "must be positive"));
        }
        if self.transition_time == 0 {
            return Err(invalid("transition_time", "must be positive"));
        }
        if self.habitat_update_interval == 0 {
            return Err(invalid("habitat_update_interval", "must be positive"));
        }
        if self.wiggle_threshold_percent > 100 {
            return Err(invalid("wiggle_threshold_percent", "must be at most 100"));
        }
        if self.min_wiggle_roll <= 0 {
            return Err(invalid("min_wiggle_roll", "must be positive"));
        }
        if self.wiggle_step <= Fixed::ZERO || self.wiggle_step > Fixed::ONE {
            return Err(invalid("wiggle_step", "must be in (0, 1]"));
        }
        if self.width <= Fixed::ZERO || self.height <= Fixed::ZERO {
            return Err(invalid("width/height", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> HatcheryError {
    HatcheryError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wiggle_threshold_is_quarter_hatch_time() {
        let config = EggConfig::default();
        assert_eq!(config.wiggle_threshold(), 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = EggConfig::from_ron(
            "inline",
            "EggConfig(default_hatch_time: 400, habitat_update_interval: 20)",
        )
        .unwrap();
        assert_eq!(config.default_hatch_time, 400);
        assert_eq!(config.habitat_update_interval, 20);
        assert_eq!(config.transition_time, 200);
        assert_eq!(config.wiggle_threshold(), 100);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = EggConfig::from_ron("inline", "EggConfig(habitat_update_interval: 0)")
            .unwrap_err();
        assert!(matches!(
            err,
            HatcheryError::InvalidConfig {
                field: "habitat_update_interval",
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = EggConfig::from_ron("bad.ron", "EggConfig(").unwrap_err();
        assert!(matches!(err, HatcheryError::DataParseError { .. }));
    }
}
