//! Backend construction from configuration

use std::sync::Arc;

use vidforge_core::StorageConfig;

use crate::traits::{Storage, StorageError, StorageResult};

/// Build the configured storage collaborator. `Ok(None)` means no
/// collaborator: artifacts stream back to the caller instead.
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Option<Arc<dyn Storage>>> {
    match config {
        StorageConfig::None => Ok(None),

        #[cfg(feature = "storage-local")]
        StorageConfig::Local { path, base_url } => {
            let storage = crate::local::LocalStorage::new(path.clone(), base_url.clone()).await?;
            Ok(Some(Arc::new(storage)))
        }

        #[cfg(feature = "storage-s3")]
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let storage =
                crate::s3::S3Storage::new(bucket.clone(), region.clone(), endpoint.clone())?;
            Ok(Some(Arc::new(storage)))
        }

        #[allow(unreachable_patterns)]
        other => Err(StorageError::ConfigError(format!(
            "storage backend {other:?} not compiled in"
        ))),
    }
}
