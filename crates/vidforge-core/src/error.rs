//! Job error taxonomy
//!
//! Every failure a render job can surface to its caller is one of these
//! variants. The first error encountered aborts the remaining phases (cleanup
//! always runs); there is no partial-success result. Workspace removal
//! failures are deliberately absent: they are logged, never returned.

use std::time::Duration;

use thiserror::Error;

/// Result alias for orchestrator-facing operations.
pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    /// Malformed or missing job fields, rejected before any I/O.
    #[error("invalid job: {0}")]
    Validation(String),

    /// A named resource or materialized input could not be retrieved.
    #[error("failed to fetch '{name}': {source}")]
    ResourceFetch {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The filter graph references a resource the job never declared.
    #[error("filter graph references undeclared resource '{0}'")]
    GraphResolution(String),

    /// The engine exited non-zero (or never started). Carries the bounded
    /// diagnostic tail, which is the only part of the engine's output worth
    /// keeping.
    #[error("engine failed with exit code {exit_code}: {diagnostic_tail}")]
    ProcessFailure {
        exit_code: i32,
        diagnostic_tail: String,
    },

    /// The engine outlived its wall-clock budget and was terminated.
    #[error("engine exceeded the {}s wall-clock budget", .timeout.as_secs())]
    ProcessTimeout { timeout: Duration },

    /// The caller withdrew the job; the engine was terminated.
    #[error("job was cancelled by the caller")]
    Cancelled,

    /// The engine exited zero but the expected output file is absent or empty.
    #[error("engine produced no usable output")]
    OutputMissing,

    /// Reading the artifact or handing it to the storage collaborator failed.
    #[error("delivery failed: {0}")]
    Delivery(#[source] anyhow::Error),

    /// Host-environment fault (e.g. workspace allocation) that is neither the
    /// job's nor a collaborator's doing.
    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl JobError {
    /// Stable machine-readable discriminator for API responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::ResourceFetch { .. } => "resource_fetch",
            JobError::GraphResolution(_) => "graph_resolution",
            JobError::ProcessFailure { .. } => "process_failure",
            JobError::ProcessTimeout { .. } => "process_timeout",
            JobError::Cancelled => "cancelled",
            JobError::OutputMissing => "output_missing",
            JobError::Delivery(_) => "delivery",
            JobError::Internal(_) => "internal",
        }
    }
}
