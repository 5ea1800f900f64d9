//! Utility functions for trialseal

use sha2::{Digest, Sha256};

use crate::trailer::Expiry;

pub const KB: u64 = 1024;
pub const MB: u64 = KB * 1024;
pub const GB: u64 = MB * 1024;

const SECONDS_PER_DAY: i64 = 86_400;

/// Leading bytes of ONNX models serialized with IR version 3 and 7
const ONNX_SIGNATURES: [[u8; 4]; 2] = [[0x08, 0x03, 0x12, 0x02], [0x08, 0x07, 0x12, 0x02]];

/// Calculate SHA256 hash of bytes
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Whether `payload` starts with a known ONNX protobuf prefix
pub fn has_onnx_signature(payload: &[u8]) -> bool {
    payload
        .get(..4)
        .is_some_and(|head| ONNX_SIGNATURES.iter().any(|sig| sig == head))
}

/// First `n` bytes of `data`, hex encoded
pub fn hex_head(data: &[u8], n: usize) -> String {
    hex::encode(&data[..data.len().min(n)])
}

/// Whole days left until `expiry`, negative once expired
pub fn days_remaining(expiry: Expiry, now: u64) -> i64 {
    let expiry = i64::try_from(expiry.as_unix()).unwrap_or(i64::MAX);
    let now = i64::try_from(now).unwrap_or(i64::MAX);
    expiry.saturating_sub(now).div_euclid(SECONDS_PER_DAY)
}

/// Format bytes in human readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
