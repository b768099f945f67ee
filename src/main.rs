use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::{fs, io::ErrorKind, path::Path, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use upload_ingest::{
    config::AppConfig,
    routes::routes,
    services::{
        record_service::{RecordService, TableRegistry},
        storage_service::StorageService,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting upload-ingest with config: {:?}", cfg);
    if cfg.api_key.is_none() {
        tracing::warn!("no API key configured; every non-OPTIONS request will be rejected");
    }

    // --- Ensure upload root exists ---
    let storage = StorageService::open(&cfg.upload_dir)
        .await
        .with_context(|| format!("preparing upload directory {}", cfg.upload_dir.display()))?;
    tracing::info!("Upload root at {}", storage.base_path.display());

    // --- Initialize SQLite connection (fatal if unreachable) ---
    let db = Arc::new(connect(&cfg.database_url).await?);

    // --- Handle migration mode ---
    if migrate {
        run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    let registry = TableRegistry::load(&db, &cfg.allowed_tables)
        .await
        .context("reading table registry")?;
    tracing::info!(
        "Inserts accepted for tables: {:?}",
        registry.names().collect::<Vec<_>>()
    );

    let records = RecordService::new(db.clone(), registry);
    let addr = cfg.addr();
    let host = cfg.host.clone();
    let port = cfg.port;
    let app = routes::app(AppState::new(cfg, storage, records));

    // --- Start server ---
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the SQLite pool, creating the database file and its directory if
/// they are missing.
async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parsing database URL {}", database_url))?
        .create_if_missing(true);

    let db_path = options.get_filename();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("connecting to {}", database_url))
}

/// Run SQLite migrations manually from the SQL file on disk.
async fn run_migrations(db: &Arc<SqlitePool>) -> Result<()> {
    let path = "migrations/0001_init.sql";

    if !Path::new(path).exists() {
        anyhow::bail!("Migration file not found: {}", path);
    }

    let sql = fs::read_to_string(path)?;
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(&**db).await?;
    }

    Ok(())
}
