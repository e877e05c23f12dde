//! Foundation utilities shared across cloudpilot crates.
//!
//! Provides the error taxonomy, flow/stage identifier types, atomic file
//! writes for generated artifacts, and tracing setup.

pub mod atomic_write;
pub mod error;
pub mod logging;
pub mod types;
