use thiserror::Error;

/// Failure talking to the container cluster.  Always local to one cycle.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
}

impl ClusterError {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no event bus named `{0}` found")]
    BusNotFound(String),

    #[error("event bus request failed: {0}")]
    Transport(String),

    #[error("failed to encode event payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid configuration.  Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("stack name `{0}` must have the form <project>-<envType>-<envNum>")]
    MalformedStackName(String),

    #[error("exporter marker must not be empty")]
    EmptyMarker,

    #[error("interval_secs must be greater than zero")]
    ZeroInterval,
}
