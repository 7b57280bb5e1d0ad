//! Error types for figsync-remote.

use std::path::PathBuf;

use thiserror::Error;

use figsync_core::MetadataError;

/// All errors that can arise from talking to the remote repository.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, DNS, TLS or timeout failure before a status was received.
    #[error("transport error: {0}")]
    Transport(Box<ureq::Transport>),

    /// The API answered with a non-success status.
    #[error("api returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Reading a local file for upload failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Response body could not be decoded.
    #[error("invalid response body from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The response decoded but lacked a required field.
    #[error("malformed response from {endpoint}: {detail}")]
    MalformedResponse { endpoint: String, detail: String },

    /// An authenticated endpoint was called without a token.
    #[error("no API token configured; set FIGSHARE_TOKEN")]
    MissingToken,

    /// Hashing the local file failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Coarse classification of API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

impl RemoteError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            RemoteError::Api { status, .. } => Some(classify_status(*status)),
            RemoteError::Transport(_) => Some(ApiErrorClass::Transient),
            _ => None,
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.classification(),
            Some(ApiErrorClass::RateLimit | ApiErrorClass::Transient)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Api { status: 404, .. })
    }

    /// Failure reading the local file rather than talking to the remote.
    pub fn is_local(&self) -> bool {
        matches!(self, RemoteError::Io { .. } | RemoteError::Metadata(_))
    }
}

fn classify_status(status: u16) -> ApiErrorClass {
    match status {
        401 | 403 => ApiErrorClass::Auth,
        429 => ApiErrorClass::RateLimit,
        408 | 409 | 425 => ApiErrorClass::Transient,
        s if s >= 500 => ApiErrorClass::Transient,
        _ => ApiErrorClass::Permanent,
    }
}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => RemoteError::Api {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => RemoteError::Transport(Box::new(transport)),
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RemoteError {
    RemoteError::Io {
        path: path.into(),
        source,
    }
}
