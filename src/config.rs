//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! command-line flags (each of which can also come from the environment).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;

use crate::http::body::BodyMode;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Listener and per-connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for the whole request head, and the longest silence allowed
    /// between body chunks. `0` disables both.
    pub read_timeout_secs: u64,
    pub body_mode: BodyMode,
}

/// Where files live and how request paths map onto them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub index_file: String,
    /// Normalise request paths and refuse anything escaping `root`.
    pub confine_paths: bool,
    /// Serialise writers (and readers against writers) per resolved path.
    pub lock_paths: bool,
    /// Extra extension → content-type entries layered over the built-in table.
    pub mime_types: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Command-line flags. Anything left unset falls back to the file or defaults.
#[derive(Debug, Parser)]
#[command(name = "webroot", version, about = "Minimal HTTP/1.1 file server")]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "WEBROOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "WEBROOT_PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "WEBROOT_HOST")]
    pub host: Option<String>,

    /// Directory served, written to and deleted from
    #[arg(short, long, env = "WEBROOT_ROOT")]
    pub root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", env = "WEBROOT_LOG")]
    pub log_level: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            read_timeout_secs: 30,
            body_mode: BodyMode::Lenient,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("web_root"),
            index_file: "index.html".to_string(),
            confine_paths: false,
            lock_paths: true,
            mime_types: HashMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Builds the effective configuration from the process arguments and environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(port) = args.port {
            cfg.server.port = port;
        }
        if let Some(host) = args.host {
            cfg.server.host = host;
        }
        if let Some(root) = args.root {
            cfg.storage.root = root;
        }
        if let Some(level) = args.log_level {
            cfg.logging.level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        // An empty document deserialises to unit, not to a defaulted struct.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.root.as_os_str().is_empty() {
            bail!("storage.root must not be empty");
        }
        if self.storage.index_file.is_empty() || self.storage.index_file.contains('/') {
            bail!("storage.index_file must be a bare file name");
        }
        self.log_level()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        match self.server.read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn log_level(&self) -> anyhow::Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown log level {:?}", self.logging.level))
    }
}
