//! Delivery result
//!
//! What a completed job hands back: either a reference minted by the storage
//! collaborator, or the artifact bytes themselves when no collaborator is
//! configured. Inline bytes are read in full before the workspace is
//! released, so the result outlives cleanup.

use bytes::Bytes;

#[derive(Debug, Clone)]
pub enum DeliveryResult {
    /// Artifact was handed to the storage collaborator.
    Stored {
        key: String,
        url: String,
        size_bytes: u64,
    },
    /// Artifact is returned directly to the caller.
    Inline { data: Bytes, content_type: String },
}

impl DeliveryResult {
    pub fn size_bytes(&self) -> u64 {
        match self {
            DeliveryResult::Stored { size_bytes, .. } => *size_bytes,
            DeliveryResult::Inline { data, .. } => data.len() as u64,
        }
    }
}
