//! JSON-RPC error bindings
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Represents a JSON-RPC error.
///
/// Nodes do not all follow the `{code, message}` shape: a bare string (or any
/// other value) is accepted and kept as the message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RpcError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }
}

impl<'de> Deserialize<'de> for RpcError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawError {
            Structured {
                code: i64,
                message: String,
                #[serde(default)]
                data: Option<Value>,
            },
            Message(String),
            Other(Value),
        }

        Ok(match RawError::deserialize(deserializer)? {
            RawError::Structured {
                code,
                message,
                data,
            } => Self {
                code: Some(code),
                message,
                data,
            },
            RawError::Message(message) => Self {
                code: None,
                message,
                data: None,
            },
            RawError::Other(value) => Self {
                code: None,
                message: value.to_string(),
                data: Some(value),
            },
        })
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
