//! mcp-bridge-core - Platform-independent configuration and error types
//!
//! This crate provides the error taxonomy and runner configuration shared
//! by the bridge service and anything embedding it as a library.

pub mod config;
pub mod error;

pub use config::*;
pub use error::*;
