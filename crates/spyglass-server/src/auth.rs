//! API-key authentication
//!
//! Clients authenticate with `Authorization: Bearer <key>` or an
//! `X-API-Key` header. `allow_insecure_dev` disables the check for local
//! development; a deployment with neither a key nor the dev flag is
//! reported as misconfigured, not as a client failure.

use crate::config::ServerConfig;
use axum::http::HeaderMap;
use thiserror::Error;

/// Authentication failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No credential presented
    #[error("Missing authorization: use Authorization: Bearer <key> or X-API-Key header")]
    Missing,

    /// Presented credential does not match
    #[error("Invalid API key")]
    Invalid,

    /// Server has no API key configured and dev mode is off
    #[error("Server misconfigured: authentication not properly initialized")]
    NotConfigured,
}

/// Extract the presented API key from request headers.
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(key) = auth.strip_prefix("Bearer ") {
            return Some(key.to_string());
        }
    }

    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Verify the request's API key against the configuration.
pub fn verify_api_key(config: &ServerConfig, headers: &HeaderMap) -> Result<(), AuthError> {
    if config.allow_insecure_dev {
        return Ok(());
    }

    let presented = extract_api_key(headers).ok_or(AuthError::Missing)?;

    if config.api_key.is_empty() {
        tracing::error!("api_key not configured and allow_insecure_dev is off");
        return Err(AuthError::NotConfigured);
    }

    if !constant_time_eq(presented.as_bytes(), config.api_key.as_bytes()) {
        return Err(AuthError::Invalid);
    }

    Ok(())
}

/// Compare two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
