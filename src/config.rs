use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt, path::PathBuf};

/// Default per-file upload ceiling (200 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 200 * 1024 * 1024;

/// Default number of file parts accepted in one upload request.
pub const DEFAULT_MAX_FILES: usize = 50;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments. Built once in `main`
/// and never mutated afterwards.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub database_url: String,
    pub api_key: Option<String>,
    pub allowed_tables: Vec<String>,
    pub max_file_size: u64,
    pub max_files: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Multipart file ingestion and generic insert API")]
pub struct Args {
    /// Host to bind to (overrides INGEST_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides INGEST_PORT / PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Root directory for uploaded files (overrides INGEST_UPLOAD_DIR / UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Database URL (overrides INGEST_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Shared secret expected in `x-api-key` (overrides INGEST_API_KEY / API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Comma-separated tables accepted by `POST /data` (overrides INGEST_ALLOWED_TABLES)
    #[arg(long, value_delimiter = ',')]
    pub allowed_tables: Option<Vec<String>>,

    /// Per-file size limit in bytes (overrides INGEST_MAX_FILE_SIZE)
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Maximum file parts per upload request (overrides INGEST_MAX_FILES)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// Merge CLI args over values produced by `lookup`, then over defaults.
    ///
    /// `lookup` has the shape of `std::env::var` so tests can feed a fixed map.
    pub fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let first = |keys: &[&str]| -> Result<Option<(String, String)>> {
            for key in keys {
                match lookup(key) {
                    Ok(value) => return Ok(Some((key.to_string(), value))),
                    Err(env::VarError::NotPresent) => continue,
                    Err(err) => return Err(err).with_context(|| format!("reading {}", key)),
                }
            }
            Ok(None)
        };

        let env_host = first(&["INGEST_HOST"])?.map(|(_, v)| v);
        let env_port = parse_var::<u16>(first(&["INGEST_PORT", "PORT"])?)?;
        let env_upload = first(&["INGEST_UPLOAD_DIR", "UPLOAD_DIR"])?.map(|(_, v)| PathBuf::from(v));
        let env_db = first(&["INGEST_DATABASE_URL"])?.map(|(_, v)| v);
        let env_key = first(&["INGEST_API_KEY", "API_KEY"])?.map(|(_, v)| v);
        let env_tables = first(&["INGEST_ALLOWED_TABLES"])?.map(|(_, v)| split_list(&v));
        let env_max_size = parse_var::<u64>(first(&["INGEST_MAX_FILE_SIZE"])?)?;
        let env_max_files = parse_var::<usize>(first(&["INGEST_MAX_FILES"])?)?;

        let allowed_tables = args
            .allowed_tables
            .map(|tables| {
                tables
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .or(env_tables)
            .unwrap_or_default();

        Ok(Self {
            host: args.host.or(env_host).unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.or(env_port).unwrap_or(3000),
            upload_dir: args
                .upload_dir
                .or(env_upload)
                .unwrap_or_else(|| PathBuf::from("./data/uploads")),
            database_url: args
                .database_url
                .or(env_db)
                .unwrap_or_else(|| "sqlite://./data/meta/ingest.db".into()),
            api_key: args.api_key.or(env_key).filter(|k| !k.is_empty()),
            allowed_tables,
            max_file_size: args
                .max_file_size
                .or(env_max_size)
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            max_files: args.max_files.or(env_max_files).unwrap_or(DEFAULT_MAX_FILES),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// The secret never reaches the logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("database_url", &self.database_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("allowed_tables", &self.allowed_tables)
            .field("max_file_size", &self.max_file_size)
            .field("max_files", &self.max_files)
            .finish()
    }
}

fn parse_var<T>(entry: Option<(String, String)>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match entry {
        Some((key, value)) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
