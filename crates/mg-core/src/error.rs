use std::path::PathBuf;
use thiserror::Error;
use crate::stage::Stage;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a remote mesh service or while reading its artifacts
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint} failed on the remote side: {message}")]
    Remote {
        endpoint: String,
        message: String,
    },

    #[error("Unexpected response from {endpoint}: {detail}")]
    Protocol {
        endpoint: String,
        detail: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn transport<E: Into<BoxError>>(err: E) -> Self {
        Self::Transport(err.into())
    }

    pub fn protocol(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }
}

/// Terminal outcome of a failed generation run
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Input image file not found at '{}'", .0.display())]
    InputNotFound(PathBuf),

    #[error("Could not read input image '{}': {source}", .path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create output directory '{}': {source}", .path.display())]
    OutputDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not connect to the mesh service: {0}")]
    ConnectionFailed(#[source] ServiceError),

    #[error("Stage '{stage}' failed: {source}")]
    Pipeline {
        stage: Stage,
        #[source]
        source: ServiceError,
    },
}

impl GenerationError {
    /// The stage that failed, for mid-pipeline failures
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether the remote service was contacted before the failure
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Pipeline { .. })
    }
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
