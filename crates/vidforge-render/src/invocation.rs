//! Engine argument-vector assembly
//!
//! Token order is load-bearing: the engine binds filter-graph stream labels
//! (`[0:v]`, `[1:a]`, …) to inputs by position, so inputs are emitted exactly
//! in declaration order. Tokens are treated as opaque, already-safe
//! arguments: graph escaping happened upstream, and adding quoting here
//! would double-escape.

use std::path::Path;

use vidforge_core::RenderJob;

/// Flags emitted before everything else: overwrite the output if a previous
/// attempt left one, and keep the engine from waiting on a terminal.
const GLOBAL_FLAGS: [&str; 3] = ["-y", "-hide_banner", "-nostdin"];

/// Assemble the full argument vector for one invocation.
///
/// `effective_inputs` is the per-input engine locator (remote URI or
/// materialized local path), index-aligned with `job.inputs`.
pub fn build(
    job: &RenderJob,
    effective_inputs: &[String],
    resolved_graph: &str,
    output_path: &Path,
) -> Vec<String> {
    debug_assert_eq!(job.inputs.len(), effective_inputs.len());

    let mut argv: Vec<String> = GLOBAL_FLAGS.iter().map(|f| f.to_string()).collect();

    for (spec, locator) in job.inputs.iter().zip(effective_inputs) {
        argv.extend(spec.engine_options.iter().cloned());
        argv.push("-i".to_string());
        argv.push(locator.clone());
    }

    argv.push("-filter_complex".to_string());
    argv.push(resolved_graph.to_string());

    argv.extend(job.output_options.iter().cloned());

    argv.push(output_path.to_string_lossy().into_owned());

    argv
}
