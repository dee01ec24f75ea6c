//! Error types for MCP server operations.

use spyglass_engine::QueryError;
use thiserror::Error;

/// MCP server error types
#[derive(Error, Debug)]
pub enum McpError {
    /// Invalid request format or parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Engine error from the source manager
    #[error(transparent)]
    Query(#[from] QueryError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::InvalidRequest(_) => -32602,
            McpError::ToolNotFound(_) => -32601,
            McpError::Query(QueryError::Validation(_)) => -32602,
            McpError::Query(QueryError::RateLimited(_)) => -32001,
            McpError::Query(QueryError::GlobalLedgerDisabled) => -32002,
            McpError::Query(QueryError::SourceUnavailable(_)) => -32003,
            McpError::JsonError(_) => -32700,
            McpError::IoError(_) => -32000,
        }
    }
}
