use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{error::RpcError, request::Id};
use crate::{models::error::RunnerError, utils::deserialize_present};

/// Response of a _single_ rpc call, as sent by the node.
///
/// `result` distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(Value::Null)`), a legitimate answer to e.g. a lookup of an unknown
/// block. `error` is only considered present when non-null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Splits the response into its result or its error. Exactly one of them
    /// must be present.
    pub fn into_result(self, method: &str) -> Result<Result<Value, RpcError>, RunnerError> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(Ok(result)),
            (None, Some(error)) => Ok(Err(error)),
            (Some(result), Some(error)) => Err(RunnerError::ProtocolViolation {
                method: method.to_string(),
                reason: format!("response carries both result {result} and error {error}"),
            }),
            (None, None) => Err(RunnerError::ProtocolViolation {
                method: method.to_string(),
                reason: "response carries neither a result nor an error".to_string(),
            }),
        }
    }
}
