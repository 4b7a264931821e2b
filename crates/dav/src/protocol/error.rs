use std::io;

use http::StatusCode;
use thiserror::Error;

use crate::protocol::{convert_err, ErrorKind, ProtocolError, RepositoryError};

#[derive(Debug, Error)]
pub enum DavError {
    #[error("malformed uri: {reason}")]
    MalformedUri { reason: String },

    #[error("unsupported feature: {reason}")]
    UnsupportedFeature { reason: String },

    #[error("request entity too large: {reason}")]
    EntityTooLarge { reason: String },

    #[error("bad request: {reason}")]
    BadRequest { reason: String },

    #[error("connection aborted")]
    ConnectionAborted,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

impl DavError {
    pub fn malformed_uri<S: ToString>(str: S) -> Self {
        Self::MalformedUri { reason: str.to_string() }
    }

    pub fn unsupported_feature<S: ToString>(str: S) -> Self {
        Self::UnsupportedFeature { reason: str.to_string() }
    }

    pub fn entity_too_large<S: ToString>(str: S) -> Self {
        Self::EntityTooLarge { reason: str.to_string() }
    }

    pub fn bad_request<S: ToString>(str: S) -> Self {
        Self::BadRequest { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn is_connection_aborted(&self) -> bool {
        matches!(self, Self::ConnectionAborted)
    }

    /// Converts this error into the chain sent to the client.
    ///
    /// URI and repository failures go through [`convert_err`], so they receive the same
    /// status overrides as any other storage error; `default_status` applies when the
    /// error kind has no dedicated status.
    pub fn into_protocol(self, default_status: StatusCode) -> ProtocolError {
        match self {
            Self::MalformedUri { reason } => {
                convert_err(RepositoryError::new(ErrorKind::MalformedUri, reason), default_status, None)
            }
            Self::UnsupportedFeature { reason } => {
                convert_err(RepositoryError::new(ErrorKind::UnsupportedFeature, reason), default_status, None)
            }
            Self::EntityTooLarge { reason } => ProtocolError::new(StatusCode::PAYLOAD_TOO_LARGE, 0, reason),
            Self::BadRequest { reason } => ProtocolError::new(StatusCode::BAD_REQUEST, 0, reason),
            Self::ConnectionAborted => ProtocolError::new_tagged(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::ConnectionAborted.code(),
                ErrorKind::ConnectionAborted.default_message(),
            ),
            Self::Io { source } => ProtocolError::new(StatusCode::INTERNAL_SERVER_ERROR, 0, source),
            Self::Repository { source } => convert_err(source, default_status, None),
        }
    }
}
