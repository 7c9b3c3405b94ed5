//! Render job data model
//!
//! A `RenderJob` is the parsed body of one render request. It is immutable
//! once accepted, fully consumed by a single orchestrator invocation, and
//! never persisted.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// One engine input. Order across the `inputs` vector is load-bearing: the
/// engine assigns zero-based stream indices (`[0:v]`, `[1:a]`, …) in
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    /// http(s) URI or any locator the engine can read directly.
    pub locator: String,
    /// Tokens emitted verbatim before this input's `-i` flag.
    #[serde(default)]
    pub engine_options: Vec<String>,
    /// Download into the workspace first instead of passing the locator to
    /// the engine by reference.
    #[serde(default)]
    pub materialize: bool,
}

/// A named auxiliary file (font, overlay, LUT) referenced symbolically from
/// the filter-graph template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Unique key within the job; doubles as the workspace file name.
    pub name: String,
    pub locator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    /// Filter-graph template in the engine's own expression syntax. May
    /// contain `{{name}}` placeholders or bare resource-name tokens.
    pub filter_graph: String,
    /// Tokens appended verbatim before the output path.
    #[serde(default)]
    pub output_options: Vec<String>,
    /// Extension of the produced artifact; picks the container together with
    /// `output_options`.
    #[serde(default = "default_output_ext")]
    pub output_ext: String,
    /// Expected frame count, used only to estimate remaining time while the
    /// engine runs. Never affects control flow.
    #[serde(default)]
    pub total_frames: Option<u64>,
}

fn default_output_ext() -> String {
    "mp4".to_string()
}

impl RenderJob {
    /// Structural validation, run before any I/O.
    ///
    /// Besides the shape invariants, this rejects `{{name}}` placeholders
    /// that reference no declared resource; failing fast here beats an
    /// opaque engine parse error later. Bare-token references are not
    /// checked; the resolver passes unknown tokens through untouched.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.inputs.is_empty() {
            return Err(JobError::Validation("job declares no inputs".into()));
        }
        if self.filter_graph.trim().is_empty() {
            return Err(JobError::Validation("filter graph is empty".into()));
        }
        if self.output_ext.is_empty() || !is_bare_file_name(&self.output_ext) {
            return Err(JobError::Validation(format!(
                "invalid output extension '{}'",
                self.output_ext
            )));
        }

        let mut seen = HashSet::new();
        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(JobError::Validation("resource with empty name".into()));
            }
            if !is_bare_file_name(&resource.name) {
                return Err(JobError::Validation(format!(
                    "resource name '{}' is not a bare file name",
                    resource.name
                )));
            }
            if !seen.insert(resource.name.as_str()) {
                return Err(JobError::Validation(format!(
                    "duplicate resource name '{}'",
                    resource.name
                )));
            }
        }

        for placeholder in placeholder_names(&self.filter_graph) {
            if !seen.contains(placeholder) {
                return Err(JobError::GraphResolution(placeholder.to_string()));
            }
        }

        Ok(())
    }
}

/// True when `name` cannot escape the directory it is joined onto.
fn is_bare_file_name(name: &str) -> bool {
    !name.contains('/') && !name.contains('\\') && name != "." && name != ".."
}

/// Extract the names inside `{{...}}` placeholders, in order of appearance.
pub fn placeholder_names(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                names.push(&after[..end]);
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    names
}
