//! Job orchestration
//!
//! Sequences one job through its phases: validate, allocate workspace, fetch
//! resources and inputs, resolve the graph, build the invocation, supervise
//! the engine, deliver the output. The first failure short-circuits the
//! remaining phases; workspace cleanup runs on every path, exactly once, and
//! its failure never changes the job's result.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vidforge_core::{Config, DeliveryResult, JobError, RenderJob};
use vidforge_storage::Storage;

use crate::deliver::OutputDeliverer;
use crate::fetch::ResourceFetcher;
use crate::graph;
use crate::invocation;
use crate::progress::ProgressObserver;
use crate::supervisor::{ExitOutcome, ProcessSupervisor};
use crate::workspace::{Workspace, WorkspaceManager};

pub struct JobOrchestrator {
    workspaces: WorkspaceManager,
    fetcher: ResourceFetcher,
    supervisor: ProcessSupervisor,
    deliverer: OutputDeliverer,
}

impl JobOrchestrator {
    /// Wire up the pipeline from configuration plus the injected
    /// collaborators: the process-wide HTTP client and the optional storage
    /// backend. The orchestrator owns nothing global.
    pub fn new(
        config: &Config,
        client: reqwest::Client,
        storage: Option<Arc<dyn Storage>>,
    ) -> Self {
        Self {
            workspaces: WorkspaceManager::new(config.workspace_root.clone()),
            fetcher: ResourceFetcher::new(client, config.fetch_timeout),
            supervisor: ProcessSupervisor::new(config.engine_path.clone(), config.render_timeout),
            deliverer: OutputDeliverer::new(storage),
        }
    }

    /// Attach an informational progress observer, shared by all jobs.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.supervisor = self.supervisor.with_observer(observer);
        self
    }

    /// Execute one job to completion. Convenience wrapper that mints the job
    /// id and never cancels.
    pub async fn execute(&self, job: RenderJob) -> Result<DeliveryResult, JobError> {
        self.execute_with_id(Uuid::new_v4(), job, &CancellationToken::new())
            .await
    }

    /// Execute one job under a caller-supplied id and cancellation signal.
    #[tracing::instrument(skip(self, job, cancel), fields(job_id = %job_id))]
    pub async fn execute_with_id(
        &self,
        job_id: Uuid,
        job: RenderJob,
        cancel: &CancellationToken,
    ) -> Result<DeliveryResult, JobError> {
        // Rejected before any I/O.
        job.validate()?;

        let mut workspace = self
            .workspaces
            .acquire()
            .await
            .map_err(JobError::Internal)?;

        let result = self.run_phases(job_id, &job, &workspace, cancel).await;

        // Cleanup is unconditional and non-fatal; the outcome is already set.
        workspace.release().await;

        match &result {
            Ok(delivery) => {
                tracing::info!(job_id = %job_id, size_bytes = delivery.size_bytes(), "job completed");
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, kind = err.kind(), error = %err, "job failed");
            }
        }

        result
    }

    async fn run_phases(
        &self,
        job_id: Uuid,
        job: &RenderJob,
        workspace: &Workspace,
        cancel: &CancellationToken,
    ) -> Result<DeliveryResult, JobError> {
        tracing::info!(
            job_id = %job_id,
            inputs = job.inputs.len(),
            resources = job.resources.len(),
            "fetching resources"
        );
        let resolved = self
            .fetcher
            .fetch_resources(&job.resources, workspace)
            .await?;
        let effective_inputs = self.fetcher.fetch_inputs(&job.inputs, workspace).await?;

        let resolved_graph = graph::resolve(&job.filter_graph, &resolved);
        let output_path = workspace.file(&format!("output.{}", job.output_ext));
        let argv = invocation::build(job, &effective_inputs, &resolved_graph, &output_path);

        tracing::debug!(job_id = %job_id, argv = ?argv, "invoking engine");
        let process = self
            .supervisor
            .run(&argv, job.total_frames, cancel)
            .await
            .map_err(|e| JobError::ProcessFailure {
                exit_code: -1,
                diagnostic_tail: format!("{e:#}"),
            })?;

        match process.outcome {
            ExitOutcome::Succeeded => {}
            ExitOutcome::Failed => {
                return Err(JobError::ProcessFailure {
                    exit_code: process.exit_code,
                    diagnostic_tail: process.diagnostic_tail,
                });
            }
            ExitOutcome::TimedOut => {
                return Err(JobError::ProcessTimeout {
                    timeout: self.supervisor.timeout(),
                });
            }
            ExitOutcome::Cancelled => return Err(JobError::Cancelled),
        }

        self.deliverer.deliver(job_id, &output_path).await
    }
}
