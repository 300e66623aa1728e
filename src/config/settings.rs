/*
* Configuration layering
* ----------------------
* @project: metrics-orchestrator
*
* Lowest to highest priority:
*
* 1. Hardcoded defaults (the service runs fine with nothing else)
* 2. <CONFIG_PATH>/default.toml, optional
* 3. <CONFIG_PATH>/local.toml, optional
* 4. ORCH_* environment variables, `__` between nested keys
*    (ORCH_SERVER__PORT=9000, ORCH_UPSTREAM__METRICS_URL=...)
*
* An explicit `--config <file>` replaces steps 2 and 3 and must exist.
*/

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::errors::{OrchestratorError, OrchestratorResult};
use crate::monitoring::anomaly_detection::DEFAULT_WARMUP_SAMPLES;
use crate::monitoring::history::DEFAULT_HISTORY_CAPACITY;

const MAX_HISTORY_CAPACITY: usize = DEFAULT_HISTORY_CAPACITY;
const MIN_WARMUP_SAMPLES: usize = DEFAULT_WARMUP_SAMPLES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub history: HistorySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSettings {
    pub metrics_url: String,
    pub anomaly_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySettings {
    pub capacity: usize,
    pub warmup_samples: usize,
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        generate_default_config()
    }
}

impl Settings {
    /// Loads from `CONFIG_PATH` (default `config`) plus the environment.
    pub fn new() -> OrchestratorResult<Self> {
        let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
        Self::load_dir(&config_path)
    }

    pub fn load_dir(config_path: &str) -> OrchestratorResult<Self> {
        info!("Loading configuration from path: {}", config_path);

        let config = Self::defaults()?
            .add_source(File::with_name(&format!("{}/default", config_path)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_path)).required(false))
            .add_source(Self::environment())
            .build()?;

        Self::finish(config)
    }

    pub fn new_from_file(path: &Path) -> OrchestratorResult<Self> {
        info!("Loading configuration from file: {}", path.display());

        let config = Self::defaults()?
            .add_source(File::from(path).required(true))
            .add_source(Self::environment())
            .build()?;

        Self::finish(config)
    }

    /// The detector takes between `MIN_WARMUP_SAMPLES` and `MAX_HISTORY_CAPACITY`
    /// samples per series, so history settings must stay inside that window.
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.history.capacity > MAX_HISTORY_CAPACITY {
            return Err(invalid(format!(
                "history.capacity ({}) exceeds the maximum of {}",
                self.history.capacity, MAX_HISTORY_CAPACITY
            )));
        }
        if self.history.warmup_samples < MIN_WARMUP_SAMPLES {
            return Err(invalid(format!(
                "history.warmup_samples ({}) is below the minimum of {}",
                self.history.warmup_samples, MIN_WARMUP_SAMPLES
            )));
        }
        if self.history.warmup_samples > self.history.capacity {
            return Err(invalid(format!(
                "history.warmup_samples ({}) exceeds history.capacity ({})",
                self.history.warmup_samples, self.history.capacity
            )));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(invalid("upstream.timeout_secs must be at least 1"));
        }
        Ok(())
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = generate_default_config();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("upstream.metrics_url", defaults.upstream.metrics_url)?
            .set_default("upstream.anomaly_url", defaults.upstream.anomaly_url)?
            .set_default("upstream.timeout_secs", defaults.upstream.timeout_secs as i64)?
            .set_default("history.capacity", defaults.history.capacity as i64)?
            .set_default("history.warmup_samples", defaults.history.warmup_samples as i64)
    }

    fn environment() -> Environment {
        Environment::with_prefix("ORCH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(config: Config) -> OrchestratorResult<Self> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

fn invalid(message: impl Into<String>) -> OrchestratorError {
    OrchestratorError::Config(ConfigError::Message(message.into()))
}

pub fn generate_default_config() -> Settings {
    Settings {
        server: ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8002,
        },
        upstream: UpstreamSettings {
            metrics_url: "http://localhost:8000/metrics".to_string(),
            anomaly_url: "http://localhost:8001/detect".to_string(),
            timeout_secs: crate::monitoring::upstream::DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
        },
        history: HistorySettings {
            capacity: DEFAULT_HISTORY_CAPACITY,
            warmup_samples: DEFAULT_WARMUP_SAMPLES,
        },
    }
}
