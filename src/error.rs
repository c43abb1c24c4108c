//! HTTP-facing errors for the lead endpoints.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::users::{repo::StoreError, services::ValidationErrors};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadJson(String),

    /// A write was rejected by the datastore.
    #[error("persist user: {0}")]
    Persistence(#[source] StoreError),

    /// The datastore failed during a read or bulk delete.
    #[error("{public}: {source}")]
    Infrastructure {
        public: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn infrastructure(public: &'static str, source: StoreError) -> Self {
        Self::Infrastructure { public, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Persistence(_) | ApiError::Infrastructure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadJson(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errs) => {
                warn!(error = %errs, "validation failed");
                json!({ "error": errs.to_string(), "issues": errs.issues() })
            }
            ApiError::BadJson(msg) => {
                warn!(error = %msg, "invalid json body");
                json!({ "error": msg })
            }
            ApiError::Persistence(e) => {
                error!(error = %e, "create user failed");
                json!({ "error": "Failed to create user" })
            }
            ApiError::Infrastructure { public, source } => {
                error!(error = %source, "{}", public);
                json!({ "error": public })
            }
        };
        (status, Json(body)).into_response()
    }
}
