use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The two external services the orchestrator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Metrics,
    Anomaly,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::Metrics => write!(f, "metrics provider"),
            Upstream::Anomaly => write!(f, "anomaly provider"),
        }
    }
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Connection refused, DNS failure, timeout, or a body that could not be read.
    #[error("failed to reach {upstream}: {source}")]
    Transport {
        upstream: Upstream,
        #[source]
        source: BoxError,
    },

    #[error("{upstream} returned non-OK status {status}: {body}")]
    Upstream {
        upstream: Upstream,
        status: u16,
        body: String,
    },

    #[error("failed to decode {upstream} response: {source}")]
    Decode {
        upstream: Upstream,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
}

impl OrchestratorError {
    pub fn transport(upstream: Upstream, source: impl Into<BoxError>) -> Self {
        OrchestratorError::Transport {
            upstream,
            source: source.into(),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
