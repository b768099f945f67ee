//! `POST /data`: insert one row into a registered table.

use crate::{
    errors::AppError, models::record::InsertResponse, services::record_service::parse_insert,
    state::AppState,
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::{Map, Value};
use tracing::error;

pub async fn insert_record(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<InsertResponse>, AppError> {
    // No content type at all reads as an empty body, not as a 415.
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Object(Map::new()),
        Err(rejection) => return Err(rejection.into()),
    };
    let record = parse_insert(body)?;

    match state.records.insert(&record).await {
        Ok(id) => Ok(Json(InsertResponse { ok: true, id })),
        Err(err) => {
            error!(table = %record.table, "insert failed: {}", err);
            Err(err.into())
        }
    }
}
