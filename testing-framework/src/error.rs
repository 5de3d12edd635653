//! Structural errors of a harness run.
//!
//! A failing fixture is not an error here: it is recovered at the fixture
//! boundary and shows up as an `ExecutionOutcome::Failure` plus a count in
//! the `RunResult`. Every variant of `HarnessError` aborts the run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Malformed version string '{input}'{}", origin_suffix(.origin))]
    MalformedVersion {
        input: String,
        origin: Option<PathBuf>,
    },

    #[error("Missing metadata file {metadata} for fixture {fixture}")]
    MissingMetadata { fixture: PathBuf, metadata: PathBuf },

    #[error("Invalid metadata file {path}: {reason}")]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error("Invalid fixture pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server version probe failed: {0}")]
    VersionProbe(String),

    #[error("Connection is no longer usable: {0}")]
    ConnectionFatal(String),

    #[error("Query '{query}' failed: {reason}")]
    ServerQuery { query: String, reason: String },
}

fn origin_suffix(origin: &Option<PathBuf>) -> String {
    origin
        .as_ref()
        .map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the file a malformed version came from
    pub(crate) fn with_origin(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::MalformedVersion { input, .. } => Self::MalformedVersion {
                input,
                origin: Some(path.into()),
            },
            other => other,
        }
    }
}
