//! Spyglass MCP Server
//!
//! Exposes the Spyglass read operations as MCP tools over a stdio JSON-RPC
//! transport. The server is a thin shell: every tool parses its parameters,
//! calls the source manager, and serializes the `(payload, metadata)` pair
//! back to the client. All policy lives in `spyglass-engine`.

pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::McpError;
pub use server::McpServer;
