//! Artifact pointer metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pointer to a staged artifact.
///
/// Metadata only: `location` and `content_hash` identify the blob but are
/// never dereferenced into bytes by this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPointer {
    /// Artifact identifier
    pub artifact_id: String,
    /// Lineage the artifact belongs to
    pub root_task_id: String,
    /// MIME type of the staged content
    pub mime_type: String,
    /// Size of the staged content in bytes
    pub size_bytes: u64,
    /// Role of the artifact within the lineage (`plan`, `final_output`, ...)
    pub artifact_role: String,
    /// When the artifact was staged
    pub staged_at: Option<DateTime<Utc>>,
    /// Storage location reference
    pub location: Option<String>,
    /// Content hash of the staged bytes
    pub content_hash: Option<String>,
}

/// Counts of staged artifacts by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedCounts {
    /// Plan artifacts
    #[serde(default)]
    pub plan: u32,
    /// Final output artifacts
    #[serde(default)]
    pub final_output: u32,
    /// Supporting artifacts
    #[serde(default)]
    pub supporting: u32,
    /// Intermediate artifacts
    #[serde(default)]
    pub intermediate: u32,
}

/// Artifact inventory for a lineage or deliverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInventory {
    /// Artifact pointers found
    pub artifact_pointers: Vec<ArtifactPointer>,
    /// Shipment manifest pointer, when one was staged
    pub shipment_manifest_pointer: Option<String>,
    /// Per-role staged counts, when the index reports them
    pub staged_counts: Option<StagedCounts>,
}
