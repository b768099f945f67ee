#![allow(dead_code)]

use axum_test::TestServer;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;
use upload_ingest::{
    config::{AppConfig, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES},
    routes::routes,
    services::{
        record_service::{RecordService, TableRegistry},
        storage_service::StorageService,
    },
    state::AppState,
};

pub const API_KEY: &str = "test-secret";

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub upload_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Knobs that differ between tests.
pub struct TestOptions {
    pub api_key: Option<String>,
    pub max_file_size: u64,
    pub max_files: usize,
    pub allowed_tables: Vec<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            api_key: Some(API_KEY.to_string()),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
            allowed_tables: Vec::new(),
        }
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

/// Build the full router over a temp upload root and an in-memory database
/// holding `t` and `samples`.
pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    // One connection that never expires, so the in-memory schema survives.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    for stmt in [
        "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, a INTEGER, b TEXT, c TEXT)",
        "CREATE TABLE samples (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, payload TEXT)",
    ] {
        sqlx::query(stmt)
            .execute(&pool)
            .await
            .expect("Failed to create test table");
    }

    let config = AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        upload_dir: temp_dir.path().join("uploads"),
        database_url: "sqlite::memory:".into(),
        api_key: options.api_key,
        allowed_tables: options.allowed_tables,
        max_file_size: options.max_file_size,
        max_files: options.max_files,
    };

    let storage = StorageService::open(&config.upload_dir)
        .await
        .expect("Failed to create upload root");
    let upload_root = storage.base_path.clone();

    let registry = TableRegistry::load(&pool, &config.allowed_tables)
        .await
        .expect("Failed to load table registry");
    let records = RecordService::new(Arc::new(pool.clone()), registry);

    let app = routes::app(AppState::new(config, storage, records));
    let server = TestServer::new(app).expect("Failed to start test server");

    TestApp {
        server,
        pool,
        upload_root,
        _temp_dir: temp_dir,
    }
}

/// Every regular file under `root`, relative to it, sorted.
pub fn files_under(root: &std::path::Path) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).expect("read_dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(
                    path.strip_prefix(root)
                        .expect("under root")
                        .display()
                        .to_string(),
                );
            }
        }
    }
    out.sort();
    out
}
