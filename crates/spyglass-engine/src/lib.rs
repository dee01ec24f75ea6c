//! Spyglass Source Hierarchy Resolution Engine
//!
//! The core of Spyglass: for each read operation this crate decides which
//! backing sources to consult, in what order, under what freshness policy
//! and bounds, and folds the results into a single attributed response.
//!
//! - [`bounds`]: pure clamping of caller-requested limits and time windows
//! - [`derive`]: pure fold of receipt headers into a lineage status
//! - [`config`]: engine configuration (TOML)
//! - [`manager`]: the [`SourceManager`] orchestrator owning one instance of
//!   every source client and implementing the per-operation fallback policy
//!
//! One `SourceManager` is constructed at process start and passed explicitly
//! into every request-handling path; per-test instances are equally cheap.

pub mod bounds;
pub mod config;
pub mod derive;
pub mod error;
pub mod manager;

pub use config::{ConfigError, EngineConfig};
pub use error::QueryError;
pub use manager::{SearchReceiptsRequest, SourceManager};
