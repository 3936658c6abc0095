//! Bearer-token authentication.
//!
//! Resolves `Authorization: Bearer <api_key>` against the configured users
//! and attaches the caller as an [`AuthenticatedUser`] request extension.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::{AuthConfig, WalletMap};
use crate::http::response::ApiError;

/// Caller identity attached to authenticated requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub wallets: WalletMap,
}

/// API keys mapped to the users they belong to.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_api_key: HashMap<String, AuthenticatedUser>,
}

impl UserDirectory {
    pub fn from_config(config: &AuthConfig) -> Self {
        let by_api_key = config
            .users
            .iter()
            .map(|u| {
                (
                    u.api_key.clone(),
                    AuthenticatedUser {
                        id: u.id.clone(),
                        wallets: u.wallets.clone(),
                    },
                )
            })
            .collect();
        Self { by_api_key }
    }

    pub fn authenticate(&self, api_key: &str) -> Option<&AuthenticatedUser> {
        self.by_api_key.get(api_key)
    }

    pub fn len(&self) -> usize {
        self.by_api_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_api_key.is_empty()
    }
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    State(users): State<Arc<UserDirectory>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return ApiError::Unauthorized("Authentication required".to_string()).into_response();
    };

    match users.authenticate(token) {
        Some(user) => {
            let user = user.clone();
            tracing::debug!(user_id = %user.id, "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Rejected unknown API key");
            ApiError::Unauthorized("Invalid API key".to_string()).into_response()
        }
    }
}
