use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a recognition engine backend
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to construct engine: {message}")]
    Construction { message: String },
    #[error("engine is not loaded; check the configuration file and runtime data directory")]
    NotLoaded,
    #[error("failed to read image {path:?}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image ({len} bytes): {message}")]
    Decode { len: usize, message: String },
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
    #[error("engine returned malformed results: {0}")]
    MalformedResults(#[from] serde_json::Error),
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl EngineError {
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
