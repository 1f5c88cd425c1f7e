use axum::http::StatusCode;
use thiserror::Error;

use crate::{models::ErrorKind, provider::PathProviderError};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    RouteNotFound(String),
    #[error("{0}")]
    UpstreamUnavailable(String),
}

impl RouteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::InvalidInput(_) => ErrorKind::InvalidInput,
            RouteError::RouteNotFound(_) => ErrorKind::RouteNotFound,
            RouteError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RouteError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            RouteError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<PathProviderError> for RouteError {
    fn from(err: PathProviderError) -> Self {
        match err {
            PathProviderError::NotFound => RouteError::RouteNotFound(err.to_string()),
            PathProviderError::TooFewCoordinates(_) => RouteError::InvalidInput(err.to_string()),
            other => RouteError::UpstreamUnavailable(other.to_string()),
        }
    }
}
