//! Request handling: request IDs and payment body validation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and echo it on the response
//! - Open a trace span per request carrying that ID
//! - Validate payment bodies, reporting every bad field at once

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

use crate::blockchain::Chain;
use crate::config::validation::ValidationError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Assigns an `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for `TraceLayer`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request.headers()),
    )
}

const PAYMENT_FIELDS: [&str; 3] = ["dataId", "amount", "blockchain"];

/// A payment body that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub data_id: String,
    pub amount: Decimal,
    pub chain: Chain,
}

impl PaymentRequest {
    /// Validate `{ dataId, amount, blockchain }`, rejecting unknown keys.
    pub fn from_json(body: &Value) -> Result<Self, Vec<ValidationError>> {
        let Some(fields) = body.as_object() else {
            return Err(vec![ValidationError::new("body", "must be a JSON object")]);
        };
        let mut errors = Vec::new();

        let data_id = match fields.get("dataId") {
            None | Some(Value::Null) => {
                errors.push(ValidationError::new("dataId", "is required"));
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                errors.push(ValidationError::new("dataId", "must not be empty"));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.push(ValidationError::new("dataId", "must be a string"));
                None
            }
        };

        let amount = match fields.get("amount") {
            None | Some(Value::Null) => {
                errors.push(ValidationError::new("amount", "is required"));
                None
            }
            Some(value) => match parse_amount(value) {
                Some(amount) if amount > Decimal::ZERO => Some(amount),
                Some(_) => {
                    errors.push(ValidationError::new("amount", "must be greater than 0"));
                    None
                }
                None => {
                    errors.push(ValidationError::new("amount", "must be a number"));
                    None
                }
            },
        };

        let chain = match fields.get("blockchain") {
            None | Some(Value::Null) => {
                errors.push(ValidationError::new("blockchain", "is required"));
                None
            }
            Some(Value::String(s)) => match s.parse::<Chain>() {
                Ok(chain) => Some(chain),
                Err(_) => {
                    errors.push(ValidationError::new(
                        "blockchain",
                        format!("must be one of [{}]", supported_chains()),
                    ));
                    None
                }
            },
            Some(_) => {
                errors.push(ValidationError::new("blockchain", "must be a string"));
                None
            }
        };

        for key in fields.keys() {
            if !PAYMENT_FIELDS.contains(&key.as_str()) {
                errors.push(ValidationError::new(key.clone(), "is not allowed"));
            }
        }

        match (data_id, amount, chain) {
            (Some(data_id), Some(amount), Some(chain)) if errors.is_empty() => Ok(Self {
                data_id,
                amount,
                chain,
            }),
            _ => Err(errors),
        }
    }
}

fn supported_chains() -> String {
    Chain::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON numbers and numeric strings; anything else is `None`.
fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}
