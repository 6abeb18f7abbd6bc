use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An immutable recorded take, finalized when a recording cycle ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedArtifact {
    pub data: Arc<[u8]>,
    pub metadata: ArtifactMetadata,
}

/// Metadata describing a recorded artifact.
///
/// Serializable for handing to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub chunk_count: usize,
    pub duration_secs: f64,
    pub checksum: String,
    pub created_at: String,
}

impl RecordedArtifact {
    /// Concatenate buffered chunks into a single artifact tagged with `mime_type`.
    pub fn from_chunks(chunks: &[Vec<u8>], mime_type: &str, duration_secs: f64) -> Self {
        let data: Vec<u8> = chunks.concat();
        let checksum = sha256_hex(&data);
        Self {
            metadata: ArtifactMetadata {
                id: uuid::Uuid::new_v4().to_string(),
                mime_type: mime_type.to_string(),
                size_bytes: data.len(),
                chunk_count: chunks.len(),
                duration_secs,
                checksum,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
            data: data.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn mime_type(&self) -> &str {
        &self.metadata.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Recompute the checksum and compare against the stored one.
    pub fn verify(&self) -> bool {
        sha256_hex(&self.data) == self.metadata.checksum
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{:02x}", b)).collect()
}
