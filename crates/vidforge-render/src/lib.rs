//! Render job orchestration
//!
//! Turns a declarative `RenderJob` into one supervised invocation of the
//! external transcoding engine: allocate an isolated workspace, fetch
//! resources and inputs into it, resolve the filter-graph template against
//! their local paths, assemble the argument vector, run the engine under a
//! wall-clock budget, deliver the artifact, and remove the workspace on
//! every exit path.
//!
//! Data flow is strictly linear per job. Isolation between concurrent jobs
//! comes from uniquely named workspaces and share-nothing construction, not
//! from locking; the caller bounds how many jobs run at once.

pub mod deliver;
pub mod fetch;
pub mod graph;
pub mod invocation;
pub mod orchestrator;
pub mod progress;
pub mod supervisor;
pub mod workspace;

pub use deliver::OutputDeliverer;
pub use fetch::{ResolvedResource, ResourceFetcher};
pub use orchestrator::JobOrchestrator;
pub use progress::{ProgressObserver, ProgressSample};
pub use supervisor::{ExitOutcome, ProcessResult, ProcessSupervisor};
pub use workspace::{Workspace, WorkspaceManager};
