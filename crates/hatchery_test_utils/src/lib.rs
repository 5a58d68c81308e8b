//! # Hatchery Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Test breed registry and world stubs
//! - Replicated egg harness (authoritative + replica over the wire codec)
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
