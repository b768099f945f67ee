//! Chooses the storage subdirectory for an upload from its original name.

use std::path::{Path, PathBuf};

/// Where under the upload root a file lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    Amostras,
    Videos,
    Root,
}

impl Destination {
    /// First matching rule wins; "amostra" is checked before "video".
    pub fn for_name(original_name: &str) -> Self {
        let lowered = original_name.to_lowercase();
        if lowered.contains("amostra") {
            Destination::Amostras
        } else if lowered.contains("video") {
            Destination::Videos
        } else {
            Destination::Root
        }
    }

    pub fn subdir(self) -> Option<&'static str> {
        match self {
            Destination::Amostras => Some("amostras"),
            Destination::Videos => Some("videos"),
            Destination::Root => None,
        }
    }

    pub fn dir_under(self, root: &Path) -> PathBuf {
        match self.subdir() {
            Some(sub) => root.join(sub),
            None => root.to_path_buf(),
        }
    }
}
