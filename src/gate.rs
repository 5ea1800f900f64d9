//! Expiry gate
//!
//! Decides whether an artifact may be loaded. The policy is asymmetric:
//! an artifact with no trailer is allowed, an artifact whose trailer is
//! broken or cannot be read is denied.

use std::fmt;
use std::path::Path;

use crate::clock::{Clock, SystemClock};
use crate::trailer::{self, Expiry};

/// Why a load is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    /// No trailer present
    Unprotected,
    /// Trailer present and not yet expired
    WithinTrial(Expiry),
}

/// Why a load is denied. Internal only, never shown to the caller of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Expired { expiry: Expiry, now: u64 },
    Malformed,
    Unreadable(std::io::ErrorKind),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired { expiry, now } => {
                write!(f, "trial expired at {} (now {})", expiry.as_unix(), now)
            }
            Self::Malformed => write!(f, "malformed trailer"),
            Self::Unreadable(kind) => write!(f, "artifact unreadable: {}", kind),
        }
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(Allowance),
    Deny(DenyReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Trial expiry gate
#[derive(Debug, Clone, Default)]
pub struct ExpiryGate<C = SystemClock> {
    clock: C,
}

impl ExpiryGate<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> ExpiryGate<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Read `path` and decide
    pub fn evaluate(&self, path: &Path) -> GateDecision {
        match std::fs::read(path) {
            Ok(data) => self.evaluate_bytes(&data),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "artifact unreadable");
                GateDecision::Deny(DenyReason::Unreadable(e.kind()))
            }
        }
    }

    /// Decide on artifact content already in memory
    pub fn evaluate_bytes(&self, data: &[u8]) -> GateDecision {
        match trailer::decode(data) {
            Ok(None) => GateDecision::Allow(Allowance::Unprotected),
            Ok(Some(expiry)) => {
                let now = self.clock.now_unix();
                // Inclusive: still valid during the expiry second itself.
                if now <= expiry.as_unix() {
                    GateDecision::Allow(Allowance::WithinTrial(expiry))
                } else {
                    GateDecision::Deny(DenyReason::Expired { expiry, now })
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "trailer rejected");
                GateDecision::Deny(DenyReason::Malformed)
            }
        }
    }

    pub fn is_within_trial(&self, path: &Path) -> bool {
        self.evaluate(path).is_allowed()
    }
}

/// Whether the artifact at `path` may be loaded right now
pub fn is_within_trial(path: impl AsRef<Path>) -> bool {
    ExpiryGate::new().is_within_trial(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::tests::utils::test_helpers::*;
    use crate::trailer::{encode, MAGIC_HEADER};

    const NOW: u64 = 1_800_000_000;

    fn gate() -> ExpiryGate<FixedClock> {
        ExpiryGate::with_clock(FixedClock(NOW))
    }

    #[test]
    fn test_unprotected_artifact_is_allowed() {
        let dir = create_temp_dir();
        let path = create_temp_file_with_content(&dir, "plain.onnx", &create_mock_onnx_payload(64));

        assert!(gate().is_within_trial(&path));
        assert_eq!(
            gate().evaluate(&path),
            GateDecision::Allow(Allowance::Unprotected)
        );
        assert!(is_within_trial(&path));
    }

    #[test]
    fn test_expired_artifact_is_denied() {
        let dir = create_temp_dir();
        let data = encode(b"payload", Expiry::from_unix(NOW - 1));
        let path = create_temp_file_with_content(&dir, "expired.onnx", &data);

        assert!(!gate().is_within_trial(&path));
        assert!(matches!(
            gate().evaluate(&path),
            GateDecision::Deny(DenyReason::Expired { .. })
        ));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let dir = create_temp_dir();
        let data = encode(b"payload", Expiry::from_unix(NOW));
        let path = create_temp_file_with_content(&dir, "boundary.onnx", &data);

        assert!(gate().is_within_trial(&path));
        assert!(!ExpiryGate::with_clock(FixedClock(NOW + 1)).is_within_trial(&path));
    }

    #[test]
    fn test_future_expiry_is_allowed() {
        let dir = create_temp_dir();
        let path = create_protected_file(&dir, "trial.onnx", b"payload", 60);

        assert!(is_within_trial(&path));
    }

    #[test]
    fn test_malformed_trailer_is_denied() {
        let dir = create_temp_dir();
        let mut data = encode(b"payload", Expiry::from_unix(NOW + 1000));
        let len = data.len();
        data[len - 1] ^= 0xFF;
        let corrupted = create_temp_file_with_content(&dir, "corrupted.onnx", &data);

        let mut truncated = b"payload".to_vec();
        truncated.extend_from_slice(MAGIC_HEADER);
        truncated.extend_from_slice(&(NOW + 1000).to_le_bytes());
        let missing_footer = create_temp_file_with_content(&dir, "truncated.onnx", &truncated);

        for path in [corrupted, missing_footer] {
            assert!(!gate().is_within_trial(&path));
            assert_eq!(gate().evaluate(&path), GateDecision::Deny(DenyReason::Malformed));
        }
    }

    #[test]
    fn test_missing_file_is_denied() {
        let dir = create_temp_dir();
        let path = dir.path().join("missing.onnx");

        assert!(!is_within_trial(&path));
        assert_eq!(
            gate().evaluate(&path),
            GateDecision::Deny(DenyReason::Unreadable(std::io::ErrorKind::NotFound))
        );
    }
}
