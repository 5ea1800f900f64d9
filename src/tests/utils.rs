//! Test utilities and helpers for unit tests
//!
//! This module provides common testing utilities including:
//! - Temporary directories and files
//! - Mock ONNX payloads
//! - Protected artifact fixtures

#[cfg(test)]
pub mod test_helpers {
    use chrono::{Duration, Utc};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    use crate::trailer::{encode, Expiry};

    /// Create a temporary directory for testing
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    /// Create a temporary file with content
    pub fn create_temp_file_with_content(dir: &TempDir, filename: &str, content: &[u8]) -> PathBuf {
        let file_path = dir.path().join(filename);
        std::fs::write(&file_path, content).expect("Failed to write temp file");
        file_path
    }

    /// Create a mock ONNX payload of exactly `len` bytes (len >= 4)
    pub fn create_mock_onnx_payload(len: usize) -> Vec<u8> {
        // ir_version = 7, then the start of a producer_name field
        let mut payload = vec![0x08, 0x07, 0x12, 0x02];
        payload.extend((0..len.saturating_sub(4)).map(|i| (i % 251) as u8));
        payload.truncate(len);
        payload
    }

    /// Create a protected artifact whose trial ends `days` from now
    pub fn create_protected_file(dir: &TempDir, filename: &str, payload: &[u8], days: i64) -> PathBuf {
        let expiry = Expiry::from_datetime(Utc::now() + Duration::days(days));
        create_temp_file_with_content(dir, filename, &encode(payload, expiry))
    }

    /// Whether `dir` has no entries
    pub fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir)
            .expect("Failed to read dir")
            .next()
            .is_none()
    }
}
