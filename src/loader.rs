//! Gated model loading
//!
//! [`GatedLoader`] wraps an inference runtime's session constructor. Callers
//! build sessions through the loader instead of the runtime directly and keep
//! passing the same arguments:
//!
//! ```no_run
//! # use std::path::Path;
//! # use trialseal::{GatedLoader, SessionBuilder};
//! # struct Runtime;
//! # impl SessionBuilder for Runtime {
//! #     type Session = ();
//! #     type Options = ();
//! #     type Error = std::io::Error;
//! #     fn from_path(&self, _: &Path, _: ()) -> Result<(), std::io::Error> { Ok(()) }
//! #     fn from_bytes(&self, _: &[u8], _: ()) -> Result<(), std::io::Error> { Ok(()) }
//! # }
//! let loader = GatedLoader::new(Runtime);
//! let session = loader.load("models/segmenter.onnx", ())?;
//! # Ok::<(), trialseal::TrialsealError>(())
//! ```
//!
//! Path inputs go through the expiry gate, have their trailer stripped and
//! are staged into a transient file that the runtime reads. Byte inputs are
//! forwarded untouched: content the caller already holds in memory is out of
//! the gate's reach.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TrialsealError};
use crate::gate::{DenyReason, ExpiryGate, GateDecision};
use crate::trailer;

/// The runtime's own session constructor
pub trait SessionBuilder {
    type Session;
    /// Everything besides the model itself (session options, providers, ...)
    type Options;
    type Error: std::error::Error + Send + Sync + 'static;

    fn from_path(
        &self,
        path: &Path,
        options: Self::Options,
    ) -> std::result::Result<Self::Session, Self::Error>;

    fn from_bytes(
        &self,
        bytes: &[u8],
        options: Self::Options,
    ) -> std::result::Result<Self::Session, Self::Error>;
}

/// Model input as accepted by the runtime: a file path or in-memory bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a Path> for ModelSource<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for ModelSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Self::Path(path.as_path())
    }
}

impl<'a> From<&'a str> for ModelSource<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(Path::new(path))
    }
}

impl<'a> From<&'a String> for ModelSource<'a> {
    fn from(path: &'a String) -> Self {
        Self::Path(Path::new(path.as_str()))
    }
}

impl<'a> From<&'a [u8]> for ModelSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ModelSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ModelSource<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

/// Where and how transient copies are written
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Directory for transient copies, system temp dir when `None`
    pub dir: Option<PathBuf>,
    /// Suffix used when the source path has no extension
    pub default_suffix: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            default_suffix: ".onnx".to_string(),
        }
    }
}

impl StagingConfig {
    /// Suffix for the transient copy of `source`, keeping its extension
    pub fn suffix_for(&self, source: &Path) -> String {
        source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| self.default_suffix.clone())
    }

    fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Unprotected copy of a model, removed when dropped
#[derive(Debug)]
pub struct TransientModel {
    path: PathBuf,
}

impl TransientModel {
    /// Write `payload` to a new uniquely named file in `dir`
    pub fn stage(payload: &[u8], dir: &Path, suffix: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("trialseal-")
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(TrialsealError::staging)?;

        file.write_all(payload).map_err(TrialsealError::staging)?;
        file.flush().map_err(TrialsealError::staging)?;

        // From here on removal is handled by our Drop, not tempfile's.
        let (_, path) = file.keep().map_err(|e| TrialsealError::staging(e.error))?;
        tracing::debug!(path = %path.display(), size = payload.len(), "staged transient model");

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientModel {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(
                path = %self.path.display(),
                error = %e,
                "failed to remove transient model"
            );
        }
    }
}

/// Session constructor with trial enforcement
#[derive(Debug, Clone)]
pub struct GatedLoader<B, C = SystemClock> {
    builder: B,
    gate: ExpiryGate<C>,
    staging: StagingConfig,
}

impl<B: SessionBuilder> GatedLoader<B, SystemClock> {
    pub fn new(builder: B) -> Self {
        Self::with_gate(builder, ExpiryGate::new())
    }
}

impl<B: SessionBuilder, C: Clock> GatedLoader<B, C> {
    pub fn with_gate(builder: B, gate: ExpiryGate<C>) -> Self {
        Self {
            builder,
            gate,
            staging: StagingConfig::default(),
        }
    }

    pub fn with_staging(mut self, staging: StagingConfig) -> Self {
        self.staging = staging;
        self
    }

    /// The wrapped runtime constructor
    pub fn inner(&self) -> &B {
        &self.builder
    }

    /// Build a session, enforcing the trial for path inputs
    pub fn load<'a>(
        &self,
        source: impl Into<ModelSource<'a>>,
        options: B::Options,
    ) -> Result<B::Session> {
        match source.into() {
            ModelSource::Bytes(bytes) => self
                .builder
                .from_bytes(bytes, options)
                .map_err(TrialsealError::runtime),
            ModelSource::Path(path) => self.load_path(path, options),
        }
    }

    fn load_path(&self, path: &Path, options: B::Options) -> Result<B::Session> {
        let data = std::fs::read(path)
            .map_err(|e| TrialsealError::denied(&DenyReason::Unreadable(e.kind())))?;

        if let GateDecision::Deny(reason) = self.gate.evaluate_bytes(&data) {
            return Err(TrialsealError::denied(&reason));
        }

        let transient = TransientModel::stage(
            trailer::strip(&data),
            &self.staging.dir(),
            &self.staging.suffix_for(path),
        )?;

        let session = self
            .builder
            .from_path(transient.path(), options)
            .map_err(TrialsealError::runtime);
        drop(transient);
        session
    }
}
