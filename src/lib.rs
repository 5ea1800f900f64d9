//! Time-limited trial protection for machine-learning model files.
//!
//! A protected model is the original file followed by a 24-byte trailer
//! holding its expiry time (see [`trailer`]). Applications build their
//! inference sessions through a [`GatedLoader`], which checks the trailer
//! with an [`ExpiryGate`] and hands the runtime an unprotected transient copy.
//!
//! The trailer is not encrypted. It deters casual reuse, nothing more.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod loader;
pub mod model;
pub mod protect;
pub mod trailer;
pub mod ui;
pub mod utils;

#[cfg(test)]
mod tests;

/// Crate version, as reported by `--version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::config::TrialConfig;
pub use crate::error::{ErrorCode, Result, TrialsealError};
pub use crate::gate::{is_within_trial, Allowance, DenyReason, ExpiryGate, GateDecision};
pub use crate::loader::{GatedLoader, ModelSource, SessionBuilder, StagingConfig, TransientModel};
pub use crate::trailer::Expiry;
