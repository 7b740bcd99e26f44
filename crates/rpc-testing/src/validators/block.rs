use serde_json::Value;
use tracing::debug;

use crate::{
    models::{error::RunnerError, reference::BlockReference, BlockFixture, Header, TransactionFixture},
    normalizers::{parse_quantity, to_quantity},
    projection::{
        project_block, project_transaction, without_fields, BLOCK_EXCLUDED_FIELDS,
        TRANSACTION_EXCLUDED_FIELDS,
    },
    rpc::{
        methods::{
            GET_BLOCK, GET_BLOCK_TRANSACTION_COUNT, GET_TRANSACTION_BY_BLOCK_AND_INDEX,
            GET_UNCLE_BY_BLOCK_AND_INDEX, GET_UNCLE_COUNT,
        },
        RpcClient, Transport,
    },
    utils::assert::{assert_fields_eq, expect_object},
};

fn block_header(block: &BlockFixture) -> Result<&Header, RunnerError> {
    block.block_header.as_ref().ok_or_else(|| {
        RunnerError::MalformedFixture("block validation requires a blockHeader".to_string())
    })
}

/// Compares a block (or uncle) returned by the node with a fixture header.
pub fn validate_rpc_block_vs_fixture_header(
    context: &str,
    block: &Value,
    header_fixture: &Header,
) -> Result<(), RunnerError> {
    let expected = project_block(header_fixture);
    let actual_block = without_fields(expect_object(context, block)?, &BLOCK_EXCLUDED_FIELDS);
    assert_fields_eq(context, expected, actual_block)
}

/// Compares a transaction returned by the node with a fixture transaction.
pub fn validate_rpc_transaction_vs_fixture(
    context: &str,
    transaction: &Value,
    fixture: &TransactionFixture,
) -> Result<(), RunnerError> {
    let expected = project_transaction(fixture);
    let actual_transaction =
        without_fields(expect_object(context, transaction)?, &TRANSACTION_EXCLUDED_FIELDS);
    assert_fields_eq(context, expected, actual_transaction)
}

/// Validates the block, its transactions and its uncles as reported by the
/// node when looked up through `at_block`.
pub async fn validate_block<T: Transport>(
    client: &RpcClient<T>,
    block_fixture: &BlockFixture,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    let header = block_header(block_fixture)?;
    let rpc_method = GET_BLOCK.resolve(at_block);
    debug!("validating block {} through {}", at_block, rpc_method);

    // validate without transaction bodies
    let result = client
        .call_ok(rpc_method, vec![at_block.to_param(), Value::Bool(false)])
        .await?;
    let context = format!("{rpc_method} {at_block}");
    validate_rpc_block_vs_fixture_header(&context, &result, header)?;

    let transaction_count = result
        .get("transactions")
        .and_then(Value::as_array)
        .map(Vec::len);
    let expected_count = block_fixture.transactions().len();
    if transaction_count != Some(expected_count) {
        return Err(RunnerError::mismatch(
            format!("{context}: transactions"),
            Value::from(expected_count),
            result.get("transactions").cloned().unwrap_or(Value::Null),
        ));
    }

    for (index, transaction_fixture) in block_fixture.transactions().iter().enumerate() {
        validate_transaction_by_index(client, transaction_fixture, at_block, index).await?;
    }

    validate_transaction_count(client, block_fixture, at_block).await?;

    // Bodies are fetched but not compared against the fixture yet.
    let full_block = client
        .call(rpc_method, vec![at_block.to_param(), Value::Bool(true)])
        .await?;
    debug!(
        "fetched {} with transaction bodies (unchecked): {}",
        at_block,
        if full_block.is_ok() { "ok" } else { "error" }
    );

    validate_uncles(client, block_fixture, at_block).await
}

/// Validates the chain head: the block must be reachable as `latest`, by its
/// hash and by its number.
pub async fn validate_last_block<T: Transport>(
    client: &RpcClient<T>,
    block_fixture: &BlockFixture,
) -> Result<(), RunnerError> {
    let header = block_header(block_fixture)?;

    let hash = header
        .get("hash")
        .ok_or_else(|| RunnerError::MalformedFixture("blockHeader without hash".to_string()))?;
    let number = header
        .get("number")
        .and_then(Value::as_str)
        .and_then(parse_quantity)
        .ok_or_else(|| {
            RunnerError::MalformedFixture(format!(
                "blockHeader {hash} without a valid number: {:?}",
                header.get("number")
            ))
        })?;

    validate_block(client, block_fixture, &BlockReference::LATEST).await?;
    validate_block(client, block_fixture, &BlockReference::classify(hash)?).await?;
    validate_block(client, block_fixture, &BlockReference::Number(number)).await
}

async fn validate_transaction_count<T: Transport>(
    client: &RpcClient<T>,
    block_fixture: &BlockFixture,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    let rpc_method = GET_BLOCK_TRANSACTION_COUNT.resolve(at_block);
    let expected_transaction_count = to_quantity(block_fixture.transactions().len());
    client
        .assert_result(
            rpc_method,
            vec![at_block.to_param()],
            &Value::String(expected_transaction_count),
        )
        .await?;
    Ok(())
}

async fn validate_transaction_by_index<T: Transport>(
    client: &RpcClient<T>,
    transaction_fixture: &TransactionFixture,
    at_block: &BlockReference,
    index: usize,
) -> Result<(), RunnerError> {
    let rpc_method = GET_TRANSACTION_BY_BLOCK_AND_INDEX.resolve(at_block);
    let result = client
        .call_ok(
            rpc_method,
            vec![at_block.to_param(), Value::String(to_quantity(index))],
        )
        .await?;
    validate_rpc_transaction_vs_fixture(
        &format!("{rpc_method} {at_block} #{index}"),
        &result,
        transaction_fixture,
    )
}

async fn validate_uncles<T: Transport>(
    client: &RpcClient<T>,
    block_fixture: &BlockFixture,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    validate_uncle_count(client, block_fixture, at_block).await?;
    validate_uncle_headers(client, block_fixture, at_block).await
}

async fn validate_uncle_count<T: Transport>(
    client: &RpcClient<T>,
    block_fixture: &BlockFixture,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    let rpc_method = GET_UNCLE_COUNT.resolve(at_block);
    let num_uncles = block_fixture.uncle_headers().len();
    client
        .assert_result(
            rpc_method,
            vec![at_block.to_param()],
            &Value::String(to_quantity(num_uncles)),
        )
        .await?;
    Ok(())
}

async fn validate_uncle_headers<T: Transport>(
    client: &RpcClient<T>,
    block_fixture: &BlockFixture,
    at_block: &BlockReference,
) -> Result<(), RunnerError> {
    let rpc_method = GET_UNCLE_BY_BLOCK_AND_INDEX.resolve(at_block);
    for (idx, uncle) in block_fixture.uncle_headers().iter().enumerate() {
        let result = client
            .call_ok(
                rpc_method,
                vec![at_block.to_param(), Value::String(to_quantity(idx))],
            )
            .await?;
        validate_rpc_block_vs_fixture_header(
            &format!("{rpc_method} {at_block} #{idx}"),
            &result,
            uncle,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure, success, FixtureNode, MockTransport};
    use crate::models::BlockchainFixture;
    use serde_json::json;

    fn fixture() -> BlockchainFixture {
        serde_json::from_str(include_str!("../../test_data/simple_blockchain_test.json"))
            .expect("Error while reading the fixture")
    }

    fn good_block(fixture: &BlockchainFixture) -> &BlockFixture {
        fixture.blocks.iter().find(|b| b.is_good_block()).unwrap()
    }

    #[tokio::test]
    async fn test_validate_block_by_hash() {
        // Given
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| node.handle(request)));
        let block = good_block(&fixture);
        let at_block = BlockReference::hash(block.header_hash().unwrap()).unwrap();

        // When
        validate_block(&client, block, &at_block).await.unwrap();

        // Then
        let methods = client.transport().methods();
        assert_eq!(
            methods,
            vec![
                "eth_getBlockByHash",
                "eth_getTransactionByBlockHashAndIndex",
                "eth_getBlockTransactionCountByHash",
                "eth_getBlockByHash",
                "eth_getUncleCountByBlockHash",
                "eth_getUncleByBlockHashAndIndex",
            ]
        );
        let requests = client.transport().requests();
        assert_eq!(requests[0].params[1], json!(false));
        assert_eq!(requests[1].params[1], json!("0x0"));
        assert_eq!(requests[3].params[1], json!(true));
    }

    #[tokio::test]
    async fn test_validate_last_block() {
        // Given
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| node.handle(request)));
        let block = good_block(&fixture);

        // When
        validate_last_block(&client, block).await.unwrap();

        // Then
        let block_lookups: Vec<_> = client
            .transport()
            .requests()
            .into_iter()
            .filter(|r| r.method.starts_with("eth_getBlockBy") && r.params[1] == json!(false))
            .map(|r| r.params[0].clone())
            .collect();
        assert_eq!(
            block_lookups,
            vec![json!("latest"), json!(block.header_hash().unwrap()), json!(1)]
        );
    }

    #[tokio::test]
    async fn test_unchecked_full_block_error_is_ignored() {
        // Given
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| {
            if request.params.get(1) == Some(&json!(true)) {
                return failure("full transactions not supported");
            }
            node.handle(request)
        }));

        // When
        let result = validate_block(&client, good_block(&fixture), &BlockReference::Number(1)).await;

        // Then
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_header_mismatch() {
        // Given
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| {
            let mut response = node.handle(request);
            if request.method == "eth_getBlockByNumber" {
                response["result"]["miner"] = json!("0x0000000000000000000000000000000000000000");
            }
            response
        }));

        // When
        let err = validate_block(&client, good_block(&fixture), &BlockReference::LATEST)
            .await
            .unwrap_err();

        // Then
        assert!(
            matches!(err, RunnerError::AssertionMismatch { context, .. } if context.contains("miner"))
        );
    }

    #[tokio::test]
    async fn test_transaction_count_mismatch() {
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| {
            let mut response = node.handle(request);
            if request.method == "eth_getBlockByNumber" {
                response["result"]["transactions"] = json!([]);
            }
            response
        }));

        let err = validate_block(&client, good_block(&fixture), &BlockReference::LATEST)
            .await
            .unwrap_err();

        assert!(
            matches!(err, RunnerError::AssertionMismatch { context, .. } if context.ends_with("transactions"))
        );
    }

    #[tokio::test]
    async fn test_unknown_block() {
        let client = RpcClient::new(MockTransport::new(|_| success(Value::Null)));
        let fixture = fixture();

        let err = validate_block(&client, good_block(&fixture), &BlockReference::LATEST)
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::AssertionMismatch { actual, .. } if actual.is_null()));
    }

    #[tokio::test]
    async fn test_bad_block_cannot_be_validated() {
        let client = RpcClient::new(MockTransport::new(|_| success(Value::Null)));
        let block: BlockFixture = serde_json::from_value(json!({"rlp": "0xf9"})).unwrap();

        let err = validate_block(&client, &block, &BlockReference::LATEST)
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::MalformedFixture(_)));
        assert!(client.transport().requests().is_empty());
    }
}
