//! Engine process supervision
//!
//! Spawns the external engine with an explicit argument vector, never
//! through a shell, so nothing in a locator or overlay text can smuggle in
//! commands. While the process runs its diagnostic stream is scanned for
//! progress markers and folded into a bounded tail; on exit the outcome is
//! classified as succeeded, failed, timed out, or cancelled. Timeout and
//! cancellation share one termination point.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::progress::{ProgressObserver, ProgressTracker};

/// Upper bound on retained diagnostic output. The engine's full stream is
/// dominated by preamble; the tail is what explains a failure.
pub const DIAGNOSTIC_TAIL_LIMIT: usize = 1_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

#[derive(Debug)]
pub struct ProcessResult {
    pub outcome: ExitOutcome,
    /// Exit code; -1 when the process was killed by a signal or never
    /// reported one.
    pub exit_code: i32,
    /// Last `DIAGNOSTIC_TAIL_LIMIT` characters of the diagnostic stream.
    pub diagnostic_tail: String,
}

impl ProcessResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == ExitOutcome::Succeeded
    }
}

#[derive(Clone)]
pub struct ProcessSupervisor {
    engine_path: String,
    timeout: Duration,
    observer: Option<ProgressObserver>,
}

impl ProcessSupervisor {
    pub fn new(engine_path: String, timeout: Duration) -> Self {
        Self {
            engine_path,
            timeout,
            observer: None,
        }
    }

    /// Attach an informational progress callback. Never on the critical path:
    /// whatever it does, outcome classification depends only on the exit code.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the engine to completion (or termination) and classify the result.
    ///
    /// Errors only when the process cannot be spawned or its diagnostic
    /// stream cannot be captured; an engine that runs and fails is an `Ok`
    /// with a `Failed` outcome.
    pub async fn run(
        &self,
        argv: &[String],
        total_frames: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<ProcessResult> {
        let mut child = Command::new(&self.engine_path)
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn engine '{}'", self.engine_path))?;

        let stderr = child
            .stderr
            .take()
            .context("failed to capture engine diagnostic stream")?;

        let observer = self.observer.clone();
        let reader = tokio::spawn(async move {
            let mut tail = String::new();
            let mut tracker = ProgressTracker::new(total_frames);
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(sample) = tracker.observe_line(&line) {
                    if let Some(observer) = &observer {
                        observer(sample);
                    }
                }
                push_tail(&mut tail, &line);
            }
            tail
        });

        let (outcome, exit_code) = tokio::select! {
            status = child.wait() => {
                let code = status
                    .context("failed to wait for engine process")?
                    .code()
                    .unwrap_or(-1);
                if code == 0 {
                    (ExitOutcome::Succeeded, 0)
                } else {
                    (ExitOutcome::Failed, code)
                }
            }
            _ = tokio::time::sleep(self.timeout) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "engine exceeded wall-clock budget, terminating"
                );
                (ExitOutcome::TimedOut, terminate(&mut child).await)
            }
            _ = cancel.cancelled() => {
                tracing::info!("job cancelled, terminating engine");
                (ExitOutcome::Cancelled, terminate(&mut child).await)
            }
        };

        // The pipe closes once the process is gone, so the reader finishes on
        // its own; its panic (if any) must not take the job down.
        let diagnostic_tail = reader.await.unwrap_or_default();

        Ok(ProcessResult {
            outcome,
            exit_code,
            diagnostic_tail,
        })
    }
}

/// Forcibly stop the child and reap it.
async fn terminate(child: &mut Child) -> i32 {
    let _ = child.start_kill();
    match child.wait().await {
        Ok(status) => status.code().unwrap_or(-1),
        Err(_) => -1,
    }
}

/// Append a line, keeping only the last `DIAGNOSTIC_TAIL_LIMIT` characters.
fn push_tail(tail: &mut String, line: &str) {
    tail.push_str(line);
    tail.push('\n');
    if tail.len() > DIAGNOSTIC_TAIL_LIMIT {
        let mut cut = tail.len() - DIAGNOSTIC_TAIL_LIMIT;
        while !tail.is_char_boundary(cut) {
            cut += 1;
        }
        tail.drain(..cut);
    }
}
