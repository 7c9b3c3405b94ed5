//! Configuration
//!
//! Flat, env-driven configuration resolved once at process start. Components
//! receive the pieces they need by construction; nothing reads the
//! environment after startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_ENGINE_PATH: &str = "ffmpeg";
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Storage collaborator selection. `None` means completed artifacts are
/// streamed back to the caller instead of being uploaded.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    None,
    Local { path: PathBuf, base_url: String },
    S3 {
        bucket: String,
        region: Option<String>,
        endpoint: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Path to the external transcoding engine binary.
    pub engine_path: String,
    /// Root under which per-job workspaces are created.
    pub workspace_root: PathBuf,
    /// Wall-clock budget for one engine invocation.
    pub render_timeout: Duration,
    /// Per-resource retrieval budget.
    pub fetch_timeout: Duration,
    /// Upper bound on concurrently executing jobs.
    pub max_concurrent_jobs: usize,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let engine_path =
            env::var("ENGINE_PATH").unwrap_or_else(|_| DEFAULT_ENGINE_PATH.to_string());
        validate_engine_path(&engine_path)?;

        let workspace_root = env::var("WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("vidforge"));

        Ok(Config {
            server_port: env_parsed("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            engine_path,
            workspace_root,
            render_timeout: Duration::from_secs(env_parsed(
                "RENDER_TIMEOUT_SECS",
                DEFAULT_RENDER_TIMEOUT_SECS,
            )?),
            fetch_timeout: Duration::from_secs(env_parsed(
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            max_concurrent_jobs: env_parsed("MAX_CONCURRENT_JOBS", DEFAULT_MAX_CONCURRENT_JOBS)?,
            storage: storage_from_env()?,
        })
    }
}

fn storage_from_env() -> Result<StorageConfig> {
    match env::var("STORAGE_BACKEND").as_deref() {
        Err(_) | Ok("none") | Ok("") => Ok(StorageConfig::None),
        Ok("local") => {
            let path = env::var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .context("STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH")?;
            let base_url = env::var("LOCAL_STORAGE_BASE_URL")
                .context("STORAGE_BACKEND=local requires LOCAL_STORAGE_BASE_URL")?;
            Ok(StorageConfig::Local { path, base_url })
        }
        Ok("s3") => {
            let bucket = env::var("S3_BUCKET").context("STORAGE_BACKEND=s3 requires S3_BUCKET")?;
            Ok(StorageConfig::S3 {
                bucket,
                region: env::var("S3_REGION").ok(),
                endpoint: env::var("S3_ENDPOINT").ok(),
            })
        }
        Ok(other) => Err(anyhow!(
            "unknown STORAGE_BACKEND '{other}' (expected none, local, or s3)"
        )),
    }
}

/// Reject engine paths containing shell metacharacters. The engine is always
/// spawned with an explicit argument vector, never through a shell, but a
/// path like `ffmpeg;rm` is a misconfiguration worth failing loudly on.
pub fn validate_engine_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("invalid engine path: {path:?}"));
    }
    Ok(())
}

fn env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow!("invalid {key}={raw}: {e}")),
        Err(_) => Ok(default),
    }
}
