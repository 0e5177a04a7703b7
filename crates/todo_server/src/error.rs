//! HTTP-facing error type.
//!
//! `NotFound` stays distinct from store faults so clients can tell
//! "absent" from "broken" by status code alone. Extractor rejections are
//! folded into `Validation` so every error response carries an
//! [`ErrorBody`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use todo_core::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request input failed validation (400).
    Validation(String),
    /// The addressed todo does not exist (404).
    NotFound(String),
    /// The store failed (500). The detail is logged, never sent.
    Internal(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Internal(_) => write!(f, "internal server error"),
        }
    }
}

impl Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        if value.is_not_found() {
            return Self::NotFound(value.to_string());
        }
        let detail = value.to_string();
        error!("event=http_store_fault module=api status=error error={detail}");
        Self::Internal(detail)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::Validation(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::Validation(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
    use todo_core::{RepoError, StoreError};
    use uuid::Uuid;

    #[test]
    fn store_not_found_maps_to_404() {
        let id = Uuid::nil();
        let err = ApiError::from(StoreError::Repo(RepoError::NotFound(id)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn other_store_errors_map_to_500_without_details() {
        let err = ApiError::from(StoreError::Closed);
        assert_eq!(err, ApiError::Internal("todo store is closed".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
    }
}
