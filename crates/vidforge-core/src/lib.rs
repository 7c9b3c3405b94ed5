//! Core types shared across the vidforge workspace: the render job data
//! model, the job error taxonomy, and process configuration.

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, StorageConfig};
pub use error::{JobError, JobResult};
pub use models::{DeliveryResult, InputSpec, RenderJob, ResourceSpec};
