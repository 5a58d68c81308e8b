//! Error types for the hatchery core.
//!
//! Nothing on the per-tick path returns these: unknown breeds and bad
//! synced values degrade to defaults there. Errors only surface when
//! loading data or encoding records and packets.

use thiserror::Error;

/// Result type alias using [`HatcheryError`].
pub type Result<T> = std::result::Result<T, HatcheryError>;

/// Top-level error type for the hatchery core.
#[derive(Debug, Error)]
pub enum HatcheryError {
    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// File path or label of the data that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// A breed identifier was registered twice.
    #[error("Duplicate breed id: {0}")]
    DuplicateBreed(String),

    /// A registry was built with no breeds.
    #[error("Breed registry is empty")]
    EmptyRegistry,

    /// A required breed identifier is not registered.
    #[error("Unknown breed: {0}")]
    UnknownBreed(String),

    /// A configuration value is out of range.
    #[error("Invalid config value for '{field}': {reason}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Record or packet encoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
