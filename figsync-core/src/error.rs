//! Error types for figsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from metadata, catalog and identity operations.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Underlying I/O failure, annotated with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document did not exist at the expected path.
    #[error("metadata not found at {path}")]
    NotFound { path: PathBuf },

    /// The document root is not a YAML mapping.
    #[error("expected a mapping at the root of {path}")]
    NotAMapping { path: PathBuf },

    /// A locator was written for a key-path whose parent mapping is gone.
    #[error("no parent mapping for key path '{key_path}'")]
    MissingParent { key_path: String },

    /// A task name that is not present in the catalog.
    #[error("unknown task '{task}'")]
    UnknownTask { task: String },
}

/// Convenience constructor for [`MetadataError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> MetadataError {
    MetadataError::Io {
        path: path.into(),
        source,
    }
}
