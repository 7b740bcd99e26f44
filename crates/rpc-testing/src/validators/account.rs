use serde_json::Value;
use tracing::debug;

use crate::{
    models::{error::RunnerError, reference::BlockReference, AccountState, State},
    projection::project_account_state,
    rpc::{
        methods::{GET_BALANCE, GET_CODE, GET_STORAGE_AT, GET_TRANSACTION_COUNT},
        RpcClient, Transport,
    },
};

/// Account fields checked with a scalar lookup, and the method used for each.
const RPC_STATE_LOOKUPS: [(&str, &str); 3] = [
    ("balance", GET_BALANCE),
    ("code", GET_CODE),
    ("nonce", GET_TRANSACTION_COUNT),
];

/// Validates every account of `states` at the given block.
pub async fn validate_accounts<T: Transport>(
    client: &RpcClient<T>,
    states: &State,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    debug!("validating {} accounts at {}", states.len(), at_block);
    for (addr, state) in states {
        validate_account_state(client, state, addr, at_block).await?;
    }
    Ok(())
}

pub async fn validate_account_state<T: Transport>(
    client: &RpcClient<T>,
    state: &AccountState,
    addr: &str,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    let standardized_state = project_account_state(state);

    for (fixture_key, rpc_method) in RPC_STATE_LOOKUPS {
        let expected = standardized_state
            .get(fixture_key)
            .cloned()
            .unwrap_or(Value::Null);
        let outcome = client
            .call(rpc_method, vec![Value::String(addr.to_string()), at_block.to_param()])
            .await?;
        match outcome {
            Ok(actual) if actual == expected => {}
            Ok(actual) => {
                return Err(RunnerError::mismatch(
                    format!("Invalid state - {fixture_key} of {addr} at {at_block}"),
                    expected,
                    actual,
                ))
            }
            Err(error) => {
                return Err(RunnerError::mismatch(
                    format!("Invalid state - {fixture_key} of {addr} at {at_block} - {error}"),
                    expected,
                    Value::Null,
                ))
            }
        }
    }

    for (key, expected_storage) in state.storage() {
        let position = if key == "0x" { "0x0" } else { key.as_str() };
        client
            .assert_result(
                GET_STORAGE_AT,
                vec![
                    Value::String(addr.to_string()),
                    Value::String(position.to_string()),
                    at_block.to_param(),
                ],
                &Value::String(expected_storage.clone()),
            )
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure, success, MockTransport};
    use serde_json::json;

    const ADDR: &str = "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b";

    fn account(storage: &[(&str, &str)]) -> AccountState {
        AccountState {
            balance: "0x0ba1a9ce0ba1a9ce".to_string(),
            nonce: "0x01".to_string(),
            code: "".to_string(),
            storage: Some(
                storage
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            extra: Default::default(),
        }
    }

    fn node(request: &crate::rpc::request::RpcRequest) -> Value {
        match request.method.as_str() {
            GET_BALANCE => success(json!("0xba1a9ce0ba1a9ce")),
            GET_CODE => success(json!("0x")),
            GET_TRANSACTION_COUNT => success(json!("0x1")),
            GET_STORAGE_AT => success(json!("0x2a")),
            _ => failure("method not found"),
        }
    }

    #[tokio::test]
    async fn test_validate_account_state() {
        // Given
        let client = RpcClient::new(MockTransport::new(node));
        let state = account(&[("0x01", "0x2a")]);

        // When
        validate_account_state(&client, &state, ADDR, &BlockReference::LATEST)
            .await
            .unwrap();

        // Then
        let requests = client.transport().requests();
        let methods: Vec<_> = requests.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(
            methods,
            vec![GET_BALANCE, GET_CODE, GET_TRANSACTION_COUNT, GET_STORAGE_AT]
        );
        assert_eq!(requests[0].params, vec![json!(ADDR), json!("latest")]);
        assert_eq!(requests[3].params, vec![json!(ADDR), json!("0x01"), json!("latest")]);
    }

    #[tokio::test]
    async fn test_empty_storage_key_is_slot_zero() {
        // Given
        let client = RpcClient::new(MockTransport::new(node));
        let state = account(&[("0x", "0x2a")]);

        // When
        validate_account_state(&client, &state, ADDR, &BlockReference::Number(0))
            .await
            .unwrap();

        // Then
        let requests = client.transport().requests();
        let storage = requests.last().unwrap();
        assert_eq!(storage.method, GET_STORAGE_AT);
        assert_eq!(storage.params, vec![json!(ADDR), json!("0x0"), json!(0)]);
    }

    #[tokio::test]
    async fn test_balance_mismatch() {
        let client = RpcClient::new(MockTransport::new(|request| match request.method.as_str() {
            GET_BALANCE => success(json!("0x1")),
            _ => success(json!("0x0")),
        }));

        let err = validate_account_state(&client, &account(&[]), ADDR, &BlockReference::LATEST)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunnerError::AssertionMismatch { expected, actual, .. }
                if expected == json!("0xba1a9ce0ba1a9ce") && actual == json!("0x1")
        ));
    }

    #[tokio::test]
    async fn test_rpc_error_is_attached() {
        let client = RpcClient::new(MockTransport::new(|_| failure("state unavailable")));

        let err = validate_account_state(&client, &account(&[]), ADDR, &BlockReference::EARLIEST)
            .await
            .unwrap_err();

        assert!(
            matches!(err, RunnerError::AssertionMismatch { context, .. } if context.contains("state unavailable"))
        );
    }

    #[tokio::test]
    async fn test_validation_is_idempotent() {
        // Given
        let client = RpcClient::new(MockTransport::new(node));
        let states: State = [(ADDR.to_string(), account(&[("0x", "0x2a")]))]
            .into_iter()
            .collect();

        // When
        let first = validate_accounts(&client, &states, &BlockReference::LATEST).await;
        let second = validate_accounts(&client, &states, &BlockReference::LATEST).await;

        // Then
        assert!(first.is_ok());
        assert!(second.is_ok());
        let requests = client.transport().requests();
        assert_eq!(requests[..4], requests[4..]);
    }
}
