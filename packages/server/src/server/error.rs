//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domains::providers::activities::ProviderInputError;
use crate::domains::providers::models::ProviderSearchError;

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

/// Errors a route can return
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Logged in full; the client only sees the public message
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(input) = err.downcast_ref::<ProviderInputError>() {
            return ApiError::BadRequest(input.to_string());
        }
        ApiError::Internal {
            message: "internal server error",
            source: err,
        }
    }
}

impl From<ProviderSearchError> for ApiError {
    fn from(err: ProviderSearchError) -> Self {
        ApiError::Internal {
            message: "failed to list providers",
            source: err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Internal { source, .. } = &self {
            tracing::error!(error = ?source, "Request failed");
        }

        let body = ApiErrorBody {
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
