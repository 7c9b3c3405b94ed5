//! Per-job scratch directories
//!
//! Every job gets a fresh directory named from a v4 UUID, so concurrent jobs
//! on one host can never collide without any locking. The directory holds
//! downloaded resources, materialized inputs, and the output artifact, and is
//! removed when the job ends regardless of outcome.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

/// Allocates isolated workspaces under a configured root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh, empty, uniquely named directory.
    pub async fn acquire(&self) -> Result<Workspace> {
        let dir = self.root.join(format!("job-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create workspace {}", dir.display()))?;
        Ok(Workspace {
            dir,
            released: false,
        })
    }
}

/// Handle to one job's scratch directory. Exclusively owned; never reused.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    released: bool,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Recursively remove the directory and everything in it.
    ///
    /// Idempotent: a second call (or a racing external removal) is a no-op.
    /// Failures are logged and swallowed; by the time cleanup runs, the
    /// job's own outcome has already been decided.
    pub async fn release(&mut self) {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    workspace = %self.dir.display(),
                    error = %e,
                    "workspace removal failed"
                );
            }
        }
    }
}

impl Drop for Workspace {
    // Backstop for paths that never reach release(), e.g. a future dropped
    // at an await point. Synchronous, best-effort.
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }
}
