//! Mock implementations for testing

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::loader::SessionBuilder;

/// Options a real runtime would take next to the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockSessionOptions {
    pub providers: Vec<String>,
    pub intra_op_threads: Option<usize>,
}

impl MockSessionOptions {
    pub fn with_providers(providers: &[&str]) -> Self {
        Self {
            providers: providers.iter().map(|p| p.to_string()).collect(),
            intra_op_threads: Some(1),
        }
    }
}

/// How the mock session got its model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedFrom {
    /// Loaded from a file: the path given and the bytes read at that moment
    Path { path: PathBuf, bytes: Vec<u8> },
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct MockSession {
    pub loaded_from: LoadedFrom,
    pub options: MockSessionOptions,
}

#[derive(Debug, thiserror::Error)]
#[error("mock runtime: {0}")]
pub struct MockRuntimeError(String);

/// Runtime stand-in that records what it was handed
#[derive(Debug, Clone, Default)]
pub struct MockRuntime {
    fail: bool,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime whose constructor always rejects the model
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl SessionBuilder for MockRuntime {
    type Session = MockSession;
    type Options = MockSessionOptions;
    type Error = MockRuntimeError;

    fn from_path(
        &self,
        path: &Path,
        options: MockSessionOptions,
    ) -> Result<MockSession, MockRuntimeError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            return Err(MockRuntimeError("invalid protobuf".to_string()));
        }

        let bytes = std::fs::read(path).map_err(|e| MockRuntimeError(e.to_string()))?;
        Ok(MockSession {
            loaded_from: LoadedFrom::Path {
                path: path.to_path_buf(),
                bytes,
            },
            options,
        })
    }

    fn from_bytes(
        &self,
        bytes: &[u8],
        options: MockSessionOptions,
    ) -> Result<MockSession, MockRuntimeError> {
        if self.fail {
            return Err(MockRuntimeError("invalid protobuf".to_string()));
        }

        Ok(MockSession {
            loaded_from: LoadedFrom::Bytes(bytes.to_vec()),
            options,
        })
    }
}
