use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Number of connection worker threads
    pub pool_size: usize,
    /// Idle window for the next request on a keep-alive connection
    pub keep_alive_timeout_secs: u64,
    /// Value of the `Server` response header
    pub server_name: String,
    /// Stop the binary after this many seconds; runs until killed when unset
    pub shutdown_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticFilesConfig {
    pub document_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            pool_size: 2,
            keep_alive_timeout_secs: 5,
            server_name: concat!("Lantern/", env!("CARGO_PKG_VERSION")).to_string(),
            shutdown_after_secs: None,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("./public"),
        }
    }
}

impl Config {
    /// Loads the YAML file named by `LANTERN_CONFIG` if set, then applies
    /// the `LISTEN` and `DOCUMENT_ROOT` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("LANTERN_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("Invalid config file {}", path))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }
        if let Ok(root) = std::env::var("DOCUMENT_ROOT") {
            cfg.static_files.document_root = PathBuf::from(root);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("Failed to parse YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.server.keep_alive_timeout_secs)
    }

    pub fn shutdown_after(&self) -> Option<Duration> {
        self.server.shutdown_after_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server.pool_size == 0 {
            bail!("server.pool_size must be at least 1");
        }
        if self.server.keep_alive_timeout_secs == 0 {
            bail!("server.keep_alive_timeout_secs must be at least 1");
        }
        Ok(())
    }
}
