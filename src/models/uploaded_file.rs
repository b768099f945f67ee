//! Represents a file written to disk by the upload endpoint.

use serde::Serialize;
use std::path::PathBuf;

/// A single multipart part that finished writing to disk.
///
/// Stored name is `<epoch-millis>-<sanitized original name>`. Two parts with
/// the same sanitized name written in the same millisecond collide; the
/// later write replaces the earlier file. That holds across requests too: if
/// the later request is then rejected and its batch discarded, the shared
/// path is removed even though the earlier request reported it as stored.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Name the client sent for the part (untrusted).
    pub original_name: String,

    /// Content type declared on the part, if any.
    pub content_type: Option<String>,

    /// Bytes written.
    pub size: u64,

    /// Name of the file on disk.
    pub stored_name: String,

    /// Absolute path of the file on disk.
    pub path: PathBuf,
}

/// Per-file entry of the upload response body.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct UploadManifestEntry {
    #[serde(rename = "originalname")]
    pub original_name: String,
    #[serde(rename = "savedAs")]
    pub saved_as: String,
    pub path: String,
    pub size: u64,
}

impl From<&UploadedFile> for UploadManifestEntry {
    fn from(file: &UploadedFile) -> Self {
        Self {
            original_name: file.original_name.clone(),
            saved_as: file.stored_name.clone(),
            path: file.path.display().to_string(),
            size: file.size,
        }
    }
}

/// `{ ok: true, files: [...] }`
#[derive(Serialize, Debug)]
pub struct UploadResponse {
    pub ok: bool,
    pub files: Vec<UploadManifestEntry>,
}
