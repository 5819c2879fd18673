use crate::model::SubjectKind;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a resource accessor
///
/// Absence is not an error: lookups by name return `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Failed to decode resource: {0}")]
    Decode(String),
}

#[cfg(feature = "kubernetes")]
impl From<kube::Error> for AccessError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::SerdeError(e) => AccessError::Decode(e.to_string()),
            other => AccessError::Api(other.to_string()),
        }
    }
}

/// Failure that aborts a validation run
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to list {}: {source}", kind.plural())]
    ListFailed {
        kind: SubjectKind,
        #[source]
        source: AccessError,
    },
}

/// Failure while loading a captured snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest document has no kind")]
    MissingKind,
}
