//! Session-scoped bridge exposing stateful MCP server connections over a
//! stateless HTTP endpoint.
//!
//! Each session binds one launched server process, one transport, and one
//! protocol client under a caller-chosen identifier. The [`registry`] owns
//! those resources; the [`bridge`] endpoint resolves an identifier per
//! request and forwards a single RPC method call.

pub mod bridge;
pub mod client;
pub mod process;
pub mod registry;
pub mod runner;

pub use client::{ProtocolClient, RemoteClient};
pub use mcp_bridge_core::{BridgeError, RunnerConfig, Transport};
pub use registry::SessionRegistry;
pub use runner::{ConnectedRunner, ServerRunner};
