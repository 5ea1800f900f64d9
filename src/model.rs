//! Model artifact discovery and classification

use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::config::TrialConfig;
use crate::error::{Result, TrialsealError};
use crate::trailer::{self, Expiry};
use crate::utils::format_bytes;

/// Trailer state of an artifact on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Unprotected,
    Protected(Expiry),
    Malformed,
}

/// Information about a model artifact
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub status: ArtifactStatus,
}

impl ArtifactFile {
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .await
            .map_err(|e| TrialsealError::read_failed(path, e))?;

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            path: path.to_path_buf(),
            size: data.len() as u64,
            status: classify(&data),
        })
    }

    pub fn is_protected(&self) -> bool {
        matches!(self.status, ArtifactStatus::Protected(_))
    }
}

/// Trailer state of in-memory artifact content
pub fn classify(data: &[u8]) -> ArtifactStatus {
    match trailer::decode(data) {
        Ok(None) => ArtifactStatus::Unprotected,
        Ok(Some(expiry)) => ArtifactStatus::Protected(expiry),
        Err(_) => ArtifactStatus::Malformed,
    }
}

/// Model artifacts found directly inside a directory
#[derive(Debug, Clone)]
pub struct ArtifactDirectory {
    pub path: PathBuf,
    pub files: Vec<ArtifactFile>,
    pub total_size: u64,
}

impl ArtifactDirectory {
    /// Scan `path` (not recursively) for files with a configured model extension
    pub async fn from_path(path: &Path, config: &TrialConfig) -> Result<Self> {
        if !path.exists() {
            return Err(TrialsealError::path_with_location(
                "Model path does not exist",
                path.display().to_string(),
            ));
        }

        if !path.is_dir() {
            return Err(TrialsealError::path_with_location(
                "Path is not a directory",
                path.display().to_string(),
            ));
        }

        let mut candidates: Vec<PathBuf> = WalkDir::new(path)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|file_path| {
                file_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| config.is_artifact_extension(ext))
            })
            .collect();
        candidates.sort();

        let mut files = Vec::with_capacity(candidates.len());
        let mut total_size = 0u64;
        for file_path in candidates {
            match ArtifactFile::from_path(&file_path).await {
                Ok(file) => {
                    total_size += file.size;
                    files.push(file);
                }
                Err(e) => tracing::warn!(path = %file_path.display(), error = %e, "skipping unreadable artifact"),
            }
        }

        if files.is_empty() {
            return Err(TrialsealError::validation(format!(
                "No model files ({}) found in {}",
                config.artifact_extensions.join(", "),
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            files,
            total_size,
        })
    }

    pub fn protected_files(&self) -> impl Iterator<Item = &ArtifactFile> {
        self.files.iter().filter(|f| f.is_protected())
    }

    pub fn formatted_size(&self) -> String {
        format_bytes(self.total_size)
    }
}
