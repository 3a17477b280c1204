//! # hashpoint
//!
//! Application layer over `hashpoint-core`: the CLI commands and the HTTP
//! API. Exposed as a library so integration tests can build the router.

pub mod api;
pub mod cli;
