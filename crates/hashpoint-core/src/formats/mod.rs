//! # Formats Module
//!
//! Entity definition documents (TOML and JSON).
//!
//! Parsing is pure; reading files is the app layer's job.

mod definitions;

pub use definitions::*;
