//! Storage collaborator boundary
//!
//! The orchestrator treats storage as a single opaque call: hand over the
//! finished artifact under a key, get back an addressable URL. This crate
//! provides that trait plus a local-filesystem backend and an S3-compatible
//! backend (feature `storage-s3`).
//!
//! Keys are relative paths like `renders/{job_id}/output.mp4`. They must not
//! contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};

/// Which backend a `Storage` implementation talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}
