use std::{fmt, path::PathBuf};

use shared::{
    domain::IdError,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// What the remote service said when it refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub status: u16,
    pub kind: Option<String>,
    pub message: String,
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "HTTP {} ({kind}): {}", self.status, self.message),
            None => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation rejected: {0}")]
    Validation(RemoteFailure),
    #[error("unauthorized: {0}")]
    Unauthorized(RemoteFailure),
    #[error("forbidden: {0}")]
    Forbidden(RemoteFailure),
    #[error("not found: {0}")]
    NotFound(RemoteFailure),
    #[error("conflict: {0}")]
    Conflict(RemoteFailure),
    #[error("rate limited: {0}")]
    RateLimited(RemoteFailure),
    #[error("server error: {0}")]
    Server(RemoteFailure),
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid id: {0}")]
    InvalidId(#[from] IdError),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    pub fn from_remote(status: u16, body: ApiError) -> Self {
        let failure = RemoteFailure {
            status,
            kind: body.kind,
            message: body.message,
        };
        match ErrorCode::from_status(status) {
            ErrorCode::Validation => ServiceError::Validation(failure),
            ErrorCode::Unauthorized => ServiceError::Unauthorized(failure),
            ErrorCode::Forbidden => ServiceError::Forbidden(failure),
            ErrorCode::NotFound => ServiceError::NotFound(failure),
            ErrorCode::Conflict => ServiceError::Conflict(failure),
            ErrorCode::RateLimited => ServiceError::RateLimited(failure),
            ErrorCode::Internal => ServiceError::Server(failure),
        }
    }

    /// Remote classification, `None` for failures that never reached the service.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ServiceError::Validation(_) => Some(ErrorCode::Validation),
            ServiceError::Unauthorized(_) => Some(ErrorCode::Unauthorized),
            ServiceError::Forbidden(_) => Some(ErrorCode::Forbidden),
            ServiceError::NotFound(_) => Some(ErrorCode::NotFound),
            ServiceError::Conflict(_) => Some(ErrorCode::Conflict),
            ServiceError::RateLimited(_) => Some(ErrorCode::RateLimited),
            ServiceError::Server(_) => Some(ErrorCode::Internal),
            _ => None,
        }
    }

    pub fn remote(&self) -> Option<&RemoteFailure> {
        match self {
            ServiceError::Validation(f)
            | ServiceError::Unauthorized(f)
            | ServiceError::Forbidden(f)
            | ServiceError::NotFound(f)
            | ServiceError::Conflict(f)
            | ServiceError::RateLimited(f)
            | ServiceError::Server(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ServiceError::Transport(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
