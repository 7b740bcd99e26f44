use serde_json::Value;
use tracing::trace;

use super::{error::RpcError, request::RpcRequest, response::RpcResponse, transport::Transport};
use crate::models::error::RunnerError;

/// What the node answered: its result, or the error it reported.
pub type CallResult = Result<Value, RpcError>;

/// The call driver. Every validator goes through [`RpcClient::call`].
#[derive(Debug, Clone)]
pub struct RpcClient<T> {
    transport: T,
}

impl<T: Transport> RpcClient<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `method` with `params` and splits the response. The outer error
    /// covers transport failures and malformed responses, the inner one is
    /// the error reported by the node.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<CallResult, RunnerError> {
        let request = RpcRequest::new(method, params);
        trace!("-> {} {:?}", method, request.params);

        let raw = self.transport.execute(&request).await?;
        let response: RpcResponse =
            serde_json::from_str(&raw).map_err(|err| RunnerError::ProtocolViolation {
                method: method.to_string(),
                reason: format!("response is not a JSON-RPC response ({err}): {raw}"),
            })?;

        let outcome = response.into_result(method)?;
        trace!("<- {} {:?}", method, outcome);
        Ok(outcome)
    }

    /// Like [`RpcClient::call`], but an error reported by the node fails.
    pub async fn call_ok(&self, method: &str, params: Vec<Value>) -> Result<Value, RunnerError> {
        self.call(method, params)
            .await?
            .map_err(|error| RunnerError::RpcMethod {
                method: method.to_string(),
                error,
            })
    }

    /// Fails unless the node answers `expected` exactly.
    pub async fn assert_result(
        &self,
        method: &str,
        params: Vec<Value>,
        expected: &Value,
    ) -> Result<Value, RunnerError> {
        let context = format!("{method} {}", Value::Array(params.clone()));
        let result = self.call_ok(method, params).await?;
        if &result != expected {
            return Err(RunnerError::mismatch(context, expected.clone(), result));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure, success, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_call_splits_result() {
        // Given
        let client = RpcClient::new(MockTransport::new(|_| success(json!("0x2a"))));

        // When
        let outcome = client.call("eth_getBalance", vec![json!("0x01"), json!("latest")]).await;

        // Then
        assert_eq!(outcome.unwrap(), Ok(json!("0x2a")));
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "eth_getBalance");
        assert_eq!(requests[0].params, vec![json!("0x01"), json!("latest")]);
    }

    #[tokio::test]
    async fn test_call_splits_error() {
        let client = RpcClient::new(MockTransport::new(|_| failure("unknown block")));

        let outcome = client.call("eth_getBlockByHash", vec![]).await.unwrap();

        assert_eq!(outcome.unwrap_err().message, "unknown block");
    }

    #[tokio::test]
    async fn test_call_rejects_non_json_rpc() {
        let client = RpcClient::new(MockTransport::new(|_| json!([1, 2, 3])));

        let err = client.call("eth_blockNumber", vec![]).await.unwrap_err();

        assert!(matches!(err, RunnerError::ProtocolViolation { .. }));
    }

    #[tokio::test]
    async fn test_assert_result_mismatch() {
        let client = RpcClient::new(MockTransport::new(|_| success(json!("0x1"))));

        let err = client
            .assert_result("eth_getStorageAt", vec![], &json!("0x2"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, RunnerError::AssertionMismatch { expected, actual, .. } if expected == json!("0x2") && actual == json!("0x1"))
        );
    }

    #[tokio::test]
    async fn test_assert_result_error() {
        let client = RpcClient::new(MockTransport::new(|_| failure("boom")));

        let err = client
            .assert_result("eth_getStorageAt", vec![], &json!("0x2"))
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::RpcMethod { method, .. } if method == "eth_getStorageAt"));
    }
}
