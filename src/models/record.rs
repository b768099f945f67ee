//! Represents a row submitted to `POST /data`.

use serde::Serialize;
use serde_json::Value;

/// One column value, resolved once when the request body is parsed.
///
/// Objects and arrays are kept as their JSON text; everything else binds as
/// the matching SQLite scalar.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Structured(String),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                // u64 above i64::MAX and fractional numbers
                None => FieldValue::Real(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s),
            structured @ (Value::Array(_) | Value::Object(_)) => {
                FieldValue::Structured(structured.to_string())
            }
        }
    }
}

/// A table name plus its columns, in the order the client sent them.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertRecord {
    pub table: String,
    pub fields: Vec<(String, FieldValue)>,
}

/// `{ ok: true, id }`
#[derive(Serialize, Debug)]
pub struct InsertResponse {
    pub ok: bool,
    pub id: i64,
}
