//! Shared-secret gate in front of every route.
//!
//! Requests must carry `x-api-key` equal to the configured secret. `OPTIONS`
//! requests pass untouched so browser pre-flights work. With no secret
//! configured nothing but pre-flights gets through.

use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderName, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

#[derive(Clone, Debug)]
pub struct ApiKeyGate {
    secret: Option<String>,
}

impl ApiKeyGate {
    pub fn new(secret: Option<String>) -> Arc<Self> {
        Arc::new(Self { secret })
    }

    /// Exact, constant-time comparison against the configured secret.
    pub fn accepts(&self, presented: Option<&[u8]>) -> bool {
        match (self.secret.as_deref(), presented) {
            (Some(secret), Some(presented)) => {
                secret.len() == presented.len() && bool::from(secret.as_bytes().ct_eq(presented))
            }
            _ => false,
        }
    }
}

pub async fn require_api_key(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(&API_KEY_HEADER)
        .map(|value| value.as_bytes());

    if !gate.accepts(presented) {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            header_present = presented.is_some(),
            "rejected request without a valid api key"
        );
        return AppError::unauthorized().into_response();
    }

    next.run(request).await
}
