//! Trial trailer codec
//!
//! A protected artifact is the original file with a fixed 24-byte trailer
//! appended:
//!
//! ```text
//! +---------------------------+
//! | Original payload          |  unchanged model bytes
//! +---------------------------+
//! | Magic header (8 bytes)    |  "THORMDL1"
//! +---------------------------+
//! | Expiry (8 bytes)          |  u64 little-endian, Unix seconds
//! +---------------------------+
//! | Magic footer (8 bytes)    |  "ENDTRIAL"
//! +---------------------------+
//! ```
//!
//! The header is located by its last occurrence in the file. If the payload
//! itself contains the header bytes after a real trailer has been appended,
//! the wrong occurrence can be picked up. If the payload contains them and no
//! trailer was ever appended, the file reads as malformed and [`strip`]
//! truncates it. Both cases are accepted limitations of the format.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, TrialsealError};

/// Magic bytes marking the start of a trailer
pub const MAGIC_HEADER: &[u8; 8] = b"THORMDL1";

/// Magic bytes marking a complete trailer
pub const MAGIC_FOOTER: &[u8; 8] = b"ENDTRIAL";

/// Size of the expiry field
pub const EXPIRY_SIZE: usize = 8;

/// Total trailer size: header (8) + expiry (8) + footer (8)
pub const TRAILER_SIZE: usize = MAGIC_HEADER.len() + EXPIRY_SIZE + MAGIC_FOOTER.len();

/// Trial expiry in Unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Expiry(u64);

impl Expiry {
    pub const fn from_unix(secs: u64) -> Self {
        Self(secs)
    }

    /// Expiry from a wall-clock instant. Instants before the epoch clamp to 0.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(u64::try_from(at.timestamp()).unwrap_or(0))
    }

    pub const fn as_unix(self) -> u64 {
        self.0
    }

    /// `None` when the stored seconds do not fit a calendar date
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    fn to_le_bytes(self) -> [u8; EXPIRY_SIZE] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "{} (out of range)", self.0),
        }
    }
}

/// Append a trailer to `original`.
///
/// No validation is done on the payload.
pub fn encode(original: &[u8], expiry: Expiry) -> Vec<u8> {
    let mut protected = Vec::with_capacity(original.len() + TRAILER_SIZE);
    protected.extend_from_slice(original);
    protected.extend_from_slice(MAGIC_HEADER);
    protected.extend_from_slice(&expiry.to_le_bytes());
    protected.extend_from_slice(MAGIC_FOOTER);
    protected
}

/// Offset of the last occurrence of [`MAGIC_HEADER`] in `data`
pub fn locate(data: &[u8]) -> Option<usize> {
    data.windows(MAGIC_HEADER.len())
        .rposition(|window| window == MAGIC_HEADER)
}

/// Read the trailer from `data`.
///
/// Returns `Ok(None)` when no header is present, `Ok(Some(expiry))` when the
/// header is followed by the expiry and the footer, and a malformed trailer
/// error otherwise. Bytes after the footer are ignored.
pub fn decode(data: &[u8]) -> Result<Option<Expiry>> {
    let Some(header_pos) = locate(data) else {
        return Ok(None);
    };

    let expiry_start = header_pos + MAGIC_HEADER.len();
    let footer_start = expiry_start + EXPIRY_SIZE;
    let footer_end = footer_start + MAGIC_FOOTER.len();

    let expiry_bytes: [u8; EXPIRY_SIZE] = data
        .get(expiry_start..footer_start)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| TrialsealError::malformed_trailer("expiry field truncated", header_pos))?;

    if data.get(footer_start..footer_end) != Some(MAGIC_FOOTER.as_slice()) {
        return Err(TrialsealError::malformed_trailer(
            "footer missing or misplaced",
            header_pos,
        ));
    }

    Ok(Some(Expiry::from_unix(u64::from_le_bytes(expiry_bytes))))
}

/// Everything before the last header, or `data` unchanged when there is none
pub fn strip(data: &[u8]) -> &[u8] {
    match locate(data) {
        Some(header_pos) => &data[..header_pos],
        None => data,
    }
}

/// Diagnostic view of an artifact's trailer
#[derive(Debug, Clone, Serialize)]
pub struct TrailerReport {
    pub total_size: usize,
    pub header_offset: Option<usize>,
    /// Size of the data that would be handed to the runtime
    pub payload_size: usize,
    /// Raw bytes from the header to the end of file, hex encoded
    pub trailer_hex: Option<String>,
    pub complete: bool,
    pub expiry: Option<Expiry>,
    pub error: Option<String>,
}

impl TrailerReport {
    pub fn is_protected(&self) -> bool {
        self.header_offset.is_some()
    }
}

/// Inspect `data` without failing on a malformed trailer
pub fn inspect(data: &[u8]) -> TrailerReport {
    let header_offset = locate(data);
    let (expiry, error) = match decode(data) {
        Ok(expiry) => (expiry, None),
        Err(e) => (None, Some(e.to_string())),
    };

    TrailerReport {
        total_size: data.len(),
        header_offset,
        payload_size: strip(data).len(),
        trailer_hex: header_offset.map(|pos| hex::encode(&data[pos..])),
        complete: expiry.is_some(),
        expiry,
        error,
    }
}
