use std::{fmt::Debug, path::PathBuf};

use serde_json::Value;

use crate::rpc::error::RpcError;

/// Error type based off <https://github.com/paradigmxyz/reth/blob/main/testing/ef-tests/src/result.rs>
#[derive(Clone, Debug, thiserror::Error)]
pub enum RunnerError {
    /// The response carried both a result and an error, or neither.
    #[error("{method}: protocol violation: {reason}")]
    ProtocolViolation { method: String, reason: String },
    /// The node answered with an error where a result was expected.
    #[error("{method} returned an error: {error}")]
    RpcMethod { method: String, error: RpcError },
    /// The node answered, but not with what the fixture expects.
    #[error("{context}: expected {expected}, got {actual}")]
    AssertionMismatch {
        context: String,
        expected: Value,
        actual: Value,
    },
    /// A block reference that is neither a hash, a number nor a tag.
    #[error("Unrecognized block reference: {0}")]
    UnrecognizedReference(Value),
    /// The fixture contradicts itself.
    #[error("Inconsistent fixture: {0}")]
    FixtureInconsistency(String),
    /// A fixture field could not be interpreted.
    #[error("Malformed fixture: {0}")]
    MalformedFixture(String),
    /// The request could not be delivered or the response not read.
    #[error("Transport error: {0}")]
    Transport(String),
    /// An IO error occurred
    #[error("An error occurred interacting with the file system at {path}: {error}")]
    Io {
        /// The path to the file or directory
        path: PathBuf,
        /// The specific error
        error: String,
    },
    /// The fixture file could not be deserialized
    #[error("An error occurred deserializing the fixture at {path}: {error}")]
    CouldNotDeserialize {
        /// The path to the file
        path: PathBuf,
        /// The specific error
        error: String,
    },
    /// Skipped test
    #[error("test skipped")]
    Skipped,
    /// Other
    #[error("{0}")]
    Other(String),
}

impl RunnerError {
    pub fn mismatch(context: impl Into<String>, expected: Value, actual: Value) -> Self {
        Self::AssertionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl From<eyre::Error> for RunnerError {
    fn from(err: eyre::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<reqwest::Error> for RunnerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.to_string())
    }
}
