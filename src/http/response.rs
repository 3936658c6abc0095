//! JSON response envelopes and error mapping.
//!
//! Every body carries `success`. Failures add `message` and usually `error`;
//! validation failures add `details: [{ field, message }]`.

use std::any::Any;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::catch_panic::ResponseForPanic;

use crate::blockchain::Chain;
use crate::config::validation::ValidationError;
use crate::payments::{BalanceResult, TransactionRecord};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error")]
    Validation(Vec<ValidationError>),

    #[error("{message}: {error}")]
    BadRequest { message: String, error: String },

    #[error("{0}")]
    Unauthorized(String),

    /// A body the JSON extractor refused for reasons other than its content,
    /// such as a missing content type or an oversized payload.
    #[error("Invalid request body: {error}")]
    Rejected { status: StatusCode, error: String },

    /// `detail` is only rendered when the environment exposes errors.
    #[error("{message}")]
    Internal { message: String, detail: Option<String> },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, error: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            error: error.into(),
        }
    }

    pub fn internal(detail: impl Into<String>, expose: bool) -> Self {
        ApiError::Internal {
            message: "Internal server error".to_string(),
            detail: expose.then(|| detail.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                ApiError::Validation(vec![ValidationError::new("body", rejection.body_text())])
            }
            other => ApiError::Rejected {
                status: other.status(),
                error: other.body_text(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => {
                let error = details
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "success": false,
                        "message": "Validation error",
                        "error": error,
                        "details": details,
                    })),
                )
                    .into_response()
            }
            ApiError::BadRequest { message, error } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": message, "error": error })),
            )
                .into_response(),
            ApiError::Rejected { status, error } => (
                status,
                Json(json!({ "success": false, "message": "Invalid request body", "error": error })),
            )
                .into_response(),
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response(),
            ApiError::Internal { message, detail } => {
                let body = match detail {
                    Some(error) => json!({ "success": false, "message": message, "error": error }),
                    None => json!({ "success": false, "message": message }),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Renders handler panics as the 500 envelope.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    pub expose_errors: bool,
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response {
        let message = panic_message(err.as_ref());
        tracing::error!(panic = %message, "Handler panicked");
        ApiError::internal(message, self.expose_errors).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionSummary {
    pub id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: String,
    pub blockchain: Chain,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub message: &'static str,
    pub transaction: TransactionSummary,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub success: bool,
    pub balances: BalanceResult,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub transactions: Vec<TransactionRecord>,
}
