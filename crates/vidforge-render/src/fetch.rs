//! Resource and input retrieval
//!
//! Downloads every declared resource (and any input marked for
//! materialization) into the job's workspace over plain HTTP(S). Success is a
//! 2xx status with a non-empty body. Independent items carry no ordering
//! dependency, so they are fetched concurrently; failure of any one item
//! fails the job with the item's name attached.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::future::try_join_all;
use url::Url;

use vidforge_core::{InputSpec, JobError, ResourceSpec};

use crate::workspace::Workspace;

/// Fallback extension for materialized inputs whose locator has none. The
/// engine sniffs the container from content anyway.
const PLACEHOLDER_EXT: &str = "bin";

/// A resource that now exists on the local filesystem, ready for graph
/// resolution. Lifetime bounded by the workspace.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    pub name: String,
    pub local_path: PathBuf,
}

/// Fetches remote bytes into workspaces. Holds the injected HTTP client;
/// one instance is shared by all jobs.
#[derive(Clone)]
pub struct ResourceFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ResourceFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Retrieve every resource into the workspace, named by its key.
    pub async fn fetch_resources(
        &self,
        resources: &[ResourceSpec],
        workspace: &Workspace,
    ) -> Result<Vec<ResolvedResource>, JobError> {
        try_join_all(resources.iter().map(|spec| async move {
            let dest = workspace.file(&spec.name);
            self.fetch_one(&spec.name, &spec.locator, &dest).await?;
            Ok(ResolvedResource {
                name: spec.name.clone(),
                local_path: dest,
            })
        }))
        .await
    }

    /// Compute the effective engine locator for every input, materializing
    /// the ones that asked for it as `input-<index>.<ext>`.
    pub async fn fetch_inputs(
        &self,
        inputs: &[InputSpec],
        workspace: &Workspace,
    ) -> Result<Vec<String>, JobError> {
        try_join_all(inputs.iter().enumerate().map(|(index, spec)| async move {
            if !spec.materialize {
                return Ok(spec.locator.clone());
            }
            let file_name = materialized_input_name(index, &spec.locator);
            let dest = workspace.file(&file_name);
            self.fetch_one(&file_name, &spec.locator, &dest).await?;
            Ok(dest.to_string_lossy().into_owned())
        }))
        .await
    }

    async fn fetch_one(&self, name: &str, locator: &str, dest: &Path) -> Result<(), JobError> {
        self.download(locator, dest)
            .await
            .map_err(|source| JobError::ResourceFetch {
                name: name.to_string(),
                source,
            })
    }

    async fn download(&self, locator: &str, dest: &Path) -> Result<()> {
        let url = parse_http_url(locator)?;
        let redacted = redacted_url_for_display(&url);

        tracing::debug!(url = %redacted, dest = %dest.display(), "fetching");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("failed to fetch {redacted}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} from {}", status.as_u16(), redacted));
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed while reading body from {redacted}"))?;

        if body.is_empty() {
            return Err(anyhow!("empty body from {redacted}"));
        }

        tokio::fs::write(dest, &body)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;

        Ok(())
    }
}

fn parse_http_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).with_context(|| format!("invalid locator '{raw}'"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(anyhow!(
            "unsupported locator scheme '{scheme}' (expected http/https)"
        )),
    }
}

/// Query strings may carry signed tokens; keep them out of logs and errors.
fn redacted_url_for_display(url: &Url) -> String {
    let mut redacted = url.clone();
    if redacted.query().is_some() {
        redacted.set_query(Some("<redacted>"));
    }
    redacted.to_string()
}

/// Deterministic workspace name for the input at `index`.
fn materialized_input_name(index: usize, locator: &str) -> String {
    let ext = Url::parse(locator)
        .ok()
        .and_then(|url| extension_from_path(url.path()))
        .unwrap_or_else(|| PLACEHOLDER_EXT.to_string());
    format!("input-{index}.{ext}")
}

fn extension_from_path(path: &str) -> Option<String> {
    let ext = Path::new(path).extension()?.to_str()?;
    let cleaned: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
