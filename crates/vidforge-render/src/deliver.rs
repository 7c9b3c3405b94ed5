//! Output delivery
//!
//! Runs strictly after the engine has exited and strictly before the
//! workspace is released. Engines have been observed to exit zero without
//! writing anything usable, so presence and non-emptiness are checked here,
//! not in the supervisor. The artifact is read in full before cleanup can
//! touch it.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use uuid::Uuid;

use vidforge_core::{DeliveryResult, JobError};
use vidforge_storage::Storage;

pub struct OutputDeliverer {
    storage: Option<Arc<dyn Storage>>,
}

impl OutputDeliverer {
    pub fn new(storage: Option<Arc<dyn Storage>>) -> Self {
        Self { storage }
    }

    pub async fn deliver(
        &self,
        job_id: Uuid,
        output_path: &Path,
    ) -> Result<DeliveryResult, JobError> {
        let size_bytes = match tokio::fs::metadata(output_path).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => return Err(JobError::OutputMissing),
        };

        let data = tokio::fs::read(output_path)
            .await
            .map_err(|e| JobError::Delivery(anyhow!(e).context("failed to read output artifact")))?;

        let content_type = mime_guess::from_path(output_path)
            .first_or_octet_stream()
            .to_string();

        match &self.storage {
            Some(storage) => {
                let file_name = output_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "output".to_string());
                let key = format!("renders/{job_id}/{file_name}");

                let url = storage
                    .put(&key, Bytes::from(data), &content_type)
                    .await
                    .map_err(|e| JobError::Delivery(e.into()))?;

                tracing::info!(job_id = %job_id, key = %key, size_bytes, "artifact stored");
                Ok(DeliveryResult::Stored {
                    key,
                    url,
                    size_bytes,
                })
            }
            None => Ok(DeliveryResult::Inline {
                data: Bytes::from(data),
                content_type,
            }),
        }
    }
}
