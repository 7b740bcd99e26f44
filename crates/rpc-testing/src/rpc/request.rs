use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Correlation id sent with every request. Responses are matched by the
/// transport, so any value works.
pub const REQUEST_ID: i64 = 3;

/// JSON-RPC version tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Version {
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

/// Request id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
    Null,
}

/// A single JSON-RPC request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: Version,
    pub method: String,
    pub params: Vec<Value>,
    pub id: Id,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: Version::V2,
            method: method.into(),
            params,
            id: Id::Number(REQUEST_ID),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        // Given
        let request = RpcRequest::new("eth_getBalance", vec![json!("0x01"), json!("latest")]);

        // When
        let value = serde_json::to_value(&request).unwrap();

        // Then
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "method": "eth_getBalance",
                "params": ["0x01", "latest"],
                "id": 3
            })
        );
    }
}
