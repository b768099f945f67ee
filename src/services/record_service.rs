//! src/services/record_service.rs
//!
//! RecordService: the generic insert path behind `POST /data`.
//!
//! Table names never reach SQL text straight from the request: they resolve
//! through a `TableRegistry` read from `sqlite_master` once at startup
//! (optionally narrowed by the configured allow-list). Column names are
//! quoted as identifiers and every value is bound.

use crate::models::record::{FieldValue, InsertRecord};
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::{collections::BTreeSet, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("table required")]
    MissingTable,
    #[error("no fields to insert")]
    NoFields,
    #[error("table name must be a string")]
    TableNotString,
    #[error("table `{0}` is not available for inserts")]
    UnknownTable(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl RecordError {
    /// Errors answered with 400 rather than `internal_error`.
    pub fn is_validation(&self) -> bool {
        matches!(self, RecordError::MissingTable | RecordError::NoFields)
    }
}

pub type RecordResult<T> = Result<T, RecordError>;

/// Split a request body into its table and ordered fields.
///
/// Non-object bodies are treated as `{}`. A falsy `table` (missing, null,
/// false, 0, "") is a missing table.
pub fn parse_insert(body: Value) -> RecordResult<InsertRecord> {
    let mut object = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let table = match object.shift_remove("table") {
        Some(value) if !is_truthy(&value) => return Err(RecordError::MissingTable),
        Some(Value::String(name)) => name,
        Some(_) => return Err(RecordError::TableNotString),
        None => return Err(RecordError::MissingTable),
    };

    if object.is_empty() {
        return Err(RecordError::NoFields);
    }

    let fields = object
        .into_iter()
        .map(|(column, value)| (column, FieldValue::from(value)))
        .collect();

    Ok(InsertRecord { table, fields })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Double-quote an SQLite identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Tables that `POST /data` may write to, fixed at startup.
#[derive(Clone, Debug, Default)]
pub struct TableRegistry {
    tables: BTreeSet<String>,
}

impl TableRegistry {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Read user tables from the schema. A non-empty `allowed` list narrows
    /// the result; names in it that do not exist are logged and skipped.
    pub async fn load(db: &SqlitePool, allowed: &[String]) -> Result<Self, sqlx::Error> {
        let existing: BTreeSet<String> = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(db)
        .await?
        .into_iter()
        .collect();

        if allowed.is_empty() {
            return Ok(Self { tables: existing });
        }

        let mut tables = BTreeSet::new();
        for name in allowed {
            if existing.contains(name) {
                tables.insert(name.clone());
            } else {
                warn!("allowed table `{}` does not exist; ignoring", name);
            }
        }
        Ok(Self { tables })
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.tables.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }
}

#[derive(Clone)]
pub struct RecordService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
    registry: Arc<TableRegistry>,
}

impl RecordService {
    pub fn new(db: Arc<SqlitePool>, registry: TableRegistry) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
        }
    }

    /// Insert one row and return its rowid.
    pub async fn insert(&self, record: &InsertRecord) -> RecordResult<i64> {
        if record.fields.is_empty() {
            return Err(RecordError::NoFields);
        }
        let table = self
            .registry
            .resolve(&record.table)
            .ok_or_else(|| RecordError::UnknownTable(record.table.clone()))?;

        let mut builder = build_insert(table, record);
        debug!("executing insert: {}", builder.sql());

        let result = builder.build().execute(&*self.db).await?;
        Ok(result.last_insert_rowid())
    }
}

/// `INSERT INTO "t" ("a", "b") VALUES (?, ?)` with every value bound.
fn build_insert<'a>(table: &str, record: &'a InsertRecord) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO ");
    builder.push(quote_ident(table));
    builder.push(" (");
    {
        let mut columns = builder.separated(", ");
        for (column, _) in &record.fields {
            columns.push(quote_ident(column));
        }
    }
    builder.push(") VALUES (");
    {
        let mut values = builder.separated(", ");
        for (_, value) in &record.fields {
            match value {
                FieldValue::Null => values.push_bind(None::<String>),
                FieldValue::Bool(b) => values.push_bind(*b),
                FieldValue::Integer(i) => values.push_bind(*i),
                FieldValue::Real(f) => values.push_bind(*f),
                FieldValue::Text(s) => values.push_bind(s.as_str()),
                FieldValue::Structured(json) => values.push_bind(json.as_str()),
            };
        }
    }
    builder.push(")");
    builder
}
