//! Shared application state

use std::sync::Arc;

use tokio::sync::Semaphore;
use vidforge_render::JobOrchestrator;

/// State handed to every handler. The semaphore is the process-wide bound on
/// concurrently executing jobs; the orchestrator itself imposes none.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<JobOrchestrator>,
    pub job_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(orchestrator: Arc<JobOrchestrator>, max_concurrent_jobs: usize) -> Self {
        Self {
            orchestrator,
            job_slots: Arc::new(Semaphore::new(max_concurrent_jobs)),
        }
    }
}
