use crate::application_port::SessionError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
pub enum ApiErrorCode {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<SessionError> for ApiErrorCode {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Unauthenticated => ApiErrorCode::Unauthenticated,
            SessionError::Store(e) => ApiErrorCode::internal(e),
            SessionError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = match err.find::<ApiErrorCode>() {
        Some(code) => (code.clone(), code.to_string()),
        None => (
            ApiErrorCode::InternalError,
            format!("Unhandled error: {:?}", err),
        ),
    };
    let status = code.status();
    let json = warp::reply::json(&ApiError { code, message });
    Ok(warp::reply::with_status(json, status))
}
