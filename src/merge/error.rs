//! Error types for the merge engine.
//!
//! Per-item failures ([`MergeError`]) never leave a unit of work: the batch
//! driver turns them into an `error` outcome. Only [`BatchError`] aborts a run,
//! and only before any item has been scheduled.

use std::path::{Path, PathBuf};

/// Failure while merging a single item.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MergeError {
    /// Reading or writing a file failed
    #[error("IO error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A JSON document could not be parsed or written
    #[error("invalid JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The render-offset table has an unexpected shape
    #[error("malformed render table {path}: {message}")]
    RenderTable { path: PathBuf, message: String },
    /// The declared classname does not yield a usable directory name
    #[error("base_id '{base_id}' from {path} is not a valid directory name")]
    InvalidBaseId { base_id: String, path: PathBuf },
}

impl MergeError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        MergeError::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        MergeError::Json { path: path.to_path_buf(), source }
    }
}

/// Fatal precondition failure for a whole batch.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BatchError {
    /// The raw asset root does not exist
    #[error("raw asset directory not found: {0}")]
    MissingRawRoot(PathBuf),
    /// The metadata root does not exist
    #[error("metadata directory not found: {0}")]
    MissingMetadataRoot(PathBuf),
    /// Enumerating a root directory failed
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The requested item does not exist in the raw asset tree
    #[error("no raw asset directory for item '{0}'")]
    UnknownItem(String),
    /// Planning a single inspected item failed
    #[error("failed to merge {classname}")]
    Item {
        classname: String,
        #[source]
        source: MergeError,
    },
}

/// Render an error and its full `source()` chain as one line.
///
/// This is the "failure trace" carried by `error` outcomes.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_includes_source() {
        let err = MergeError::io(
            Path::new("/raw/chair/renderdata.json"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let chain = error_chain(&err);
        assert_eq!(chain, "IO error at /raw/chair/renderdata.json: denied");
    }

    #[test]
    fn test_error_chain_names_json_cause_once() {
        let source = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let cause = source.to_string();
        let err = MergeError::json(Path::new("meta/lamp/data.json"), source);

        let chain = error_chain(&err);
        assert!(chain.starts_with("invalid JSON in meta/lamp/data.json: "));
        assert_eq!(chain.matches(cause.as_str()).count(), 1, "{}", chain);
    }

    #[test]
    fn test_batch_chain_through_item() {
        let err = BatchError::Item {
            classname: "lamp".to_string(),
            source: MergeError::io(
                Path::new("raw/lamp/renderdata.json"),
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            ),
        };
        assert_eq!(
            error_chain(&err),
            "failed to merge lamp: IO error at raw/lamp/renderdata.json: gone"
        );
    }

    #[test]
    fn test_batch_error_display() {
        let err = BatchError::MissingRawRoot(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "raw asset directory not found: /nope");
    }
}
