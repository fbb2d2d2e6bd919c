use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use uuid::Uuid;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORAGE_PATH: &str = "/tmp/storage_data";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_path: PathBuf,
    pub instance_id: String,
    pub max_upload_bytes: usize,
    pub shutdown_timeout: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Single-node HTTP file storage")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where files and metadata are stored (overrides STORAGE_PATH)
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Identifier reported by the informational endpoints (overrides INSTANCE_ID)
    #[arg(long)]
    pub instance_id: Option<String>,

    /// Largest accepted request body in bytes (overrides MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Seconds in-flight requests get after a shutdown signal (overrides SHUTDOWN_TIMEOUT_SECS)
    #[arg(long)]
    pub shutdown_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_sources(Args::parse(), |key| env::var(key).ok())
    }

    /// Merge parsed arguments over values looked up through `env`.
    pub fn from_sources(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_host = env("HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let env_port = parse_env(&env, "PORT", DEFAULT_PORT)?;
        let env_storage = env("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));
        let env_max_upload = parse_env(&env, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let env_shutdown = parse_env(&env, "SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT_SECS)?;

        let instance_id = args
            .instance_id
            .or_else(|| env("INSTANCE_ID"))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_path: args.storage_path.unwrap_or(env_storage),
            instance_id,
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
            shutdown_timeout: Duration::from_secs(
                args.shutdown_timeout_secs.unwrap_or(env_shutdown),
            ),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(default),
    }
}
