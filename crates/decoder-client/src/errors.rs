//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Error taxonomy for DECODER API calls."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by [`ApiClient`](crate::ApiClient) calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("401 Unauthorized - Authentication Required")]
    Unauthorized,
    #[error("403 Forbidden - Access Denied")]
    Forbidden,
    #[error("Status {}: {}", .status.as_u16(), .body)]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

/// Coarse category used when reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Status,
    Shape,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidUrl(_) | ApiError::Transport(_) => ErrorKind::Network,
            ApiError::Unauthorized | ApiError::Forbidden | ApiError::UnexpectedStatus { .. } => {
                ErrorKind::Status
            }
            ApiError::UnexpectedShape(_) => ErrorKind::Shape,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Forbidden => Some(StatusCode::FORBIDDEN),
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::InvalidUrl(_) | ApiError::UnexpectedShape(_) => None,
        }
    }

    /// True for the 401/403 answers returned when access is refused.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }
}
