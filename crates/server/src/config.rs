use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// HTTP listener settings. The classification pipeline has its own YAML file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Whole-request budget, in seconds. Must cover generative retries and
    /// readiness waits.
    pub timeout_secs: u64,
    pub max_body_size_kb: usize,
    pub enable_cors: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Pipeline YAML path; pipeline defaults when absent.
    pub pipeline_config: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 8080,
            timeout_secs: 120,
            max_body_size_kb: 64,
            enable_cors: true,
            log_level: "info".into(),
            pipeline_config: None,
        }
    }
}

impl ServerConfig {
    /// Optional `server.{toml,yaml,json}` in the working directory, overridden
    /// by `INTENT_SERVER__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("INTENT_SERVER").separator("__"))
            .build()
            .context("reading server configuration")?
            .try_deserialize()
            .context("decoding server configuration")
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind_addr, self.port))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }
}
