//! Defines the HTTP surface of the ingestion service.
//!
//! ## Structure
//! - `POST /upload-multiple` - multipart batch upload (field `files`)
//! - `POST /data`            - generic single-row insert
//! - `GET  /health`          - liveness
//! - `GET  /readyz`          - readiness (database + disk)
//!
//! Every route sits behind the `x-api-key` gate.
//! `OPTIONS` requests skip the gate and are answered by the CORS layer.

use crate::{
    handlers::{
        data_handlers::insert_record,
        health_handlers::{health, readyz},
        upload_handlers::upload_multiple,
    },
    middleware::api_key::{ApiKeyGate, require_api_key},
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Route table without middleware, carrying `AppState` to the handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        // Per-file limits are enforced while streaming.
        .route(
            "/upload-multiple",
            post(upload_multiple).layer(DefaultBodyLimit::disable()),
        )
        .route("/data", post(insert_record))
}

/// Full application: routes, api-key gate, CORS, hardening headers, tracing.
pub fn app(state: AppState) -> Router {
    let gate = ApiKeyGate::new(state.config.api_key.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes()
        .with_state(state)
        .layer(from_fn_with_state(gate, require_api_key))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
}
