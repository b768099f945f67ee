//! src/services/storage_service.rs
//!
//! StorageService: writes uploaded parts beneath the upload root, routed into
//! `amostras/`, `videos/` or the root itself by the original file name.
//! Files are streamed straight to their final path; nothing is kept in memory
//! beyond one chunk and nothing is recorded in the database.

use crate::{
    models::uploaded_file::UploadedFile,
    services::{naming, routing::Destination},
};
use axum::{extract::multipart::MultipartError, http::StatusCode};
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unexpected field")]
    UnexpectedField(String),
    #[error("Too many files")]
    TooManyFiles(usize),
    #[error("only {} files are allowed", naming::ALLOWED_SUFFIX)]
    InvalidExtension(String),
    #[error("File too large")]
    FileTooLarge { name: String, limit: u64 },
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl UploadError {
    /// Rejections of what the client sent. A broken or interrupted multipart
    /// stream is not one of them: like disk failures it leaves files in place.
    pub fn is_validation(&self) -> bool {
        !matches!(self, UploadError::Io(_) | UploadError::Multipart(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::UnexpectedField(_)
            | UploadError::TooManyFiles(_)
            | UploadError::InvalidExtension(_) => StatusCode::BAD_REQUEST,
            UploadError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Multipart(err) => err.status(),
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Disk side of the upload endpoint.
#[derive(Clone, Debug)]
pub struct StorageService {
    /// Absolute upload root.
    pub base_path: PathBuf,
}

impl StorageService {
    /// Create the upload root if needed and resolve it to an absolute path.
    pub async fn open(base_path: impl AsRef<Path>) -> io::Result<Self> {
        let base_path = base_path.as_ref();
        fs::create_dir_all(base_path).await?;
        let base_path = fs::canonicalize(base_path).await?;
        Ok(Self { base_path })
    }

    /// Directory a file with this original name is written to. Created on
    /// demand; concurrent creation of the same directory is harmless.
    pub async fn ensure_destination(&self, original_name: &str) -> io::Result<PathBuf> {
        let dir = Destination::for_name(original_name).dir_under(&self.base_path);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Stream one part to `<destination>/<epoch-millis>-<sanitized name>`.
    ///
    /// Aborts and removes the partial file once more than `max_size` bytes
    /// arrive. A stream error (client gone, broken multipart) or an I/O error
    /// leaves whatever was already written.
    pub async fn store_stream<S, E>(
        &self,
        original_name: &str,
        content_type: Option<String>,
        stream: S,
        max_size: u64,
    ) -> UploadResult<UploadedFile>
    where
        S: Stream<Item = Result<Bytes, E>>,
        UploadError: From<E>,
    {
        let dir = self.ensure_destination(original_name).await?;
        let stored_name = naming::stored_file_name(Utc::now().timestamp_millis(), original_name);
        let file_path = dir.join(&stored_name);
        let mut file = File::create(&file_path).await?;

        let mut size: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = chunk_res?;
            size += chunk.len() as u64;
            if size > max_size {
                drop(file);
                let _ = fs::remove_file(&file_path).await;
                return Err(UploadError::FileTooLarge {
                    name: original_name.to_string(),
                    limit: max_size,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("stored {} bytes at {}", size, file_path.display());

        Ok(UploadedFile {
            original_name: original_name.to_string(),
            content_type,
            size,
            stored_name,
            path: file_path,
        })
    }

    /// Remove files written earlier in a batch that is being rejected.
    pub async fn discard(&self, files: &[UploadedFile]) {
        for file in files {
            match fs::remove_file(&file.path).await {
                Ok(_) => debug!("removed {} after rejected batch", file.path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => debug!("failed to remove {}: {}", file.path.display(), err),
            }
        }
    }
}
