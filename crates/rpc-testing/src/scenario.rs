//! Replays one blockchain fixture against a node and checks what the node
//! reports at every step.
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    models::{error::RunnerError, reference::BlockReference, BlockFixture, BlockchainFixture},
    rpc::{
        methods::{APPLY_BLOCK_FIXTURE, RESET_TO_GENESIS_FIXTURE},
        RpcClient, Transport,
    },
    validators::{validate_accounts, validate_block, validate_last_block},
};

/// Where a scenario stands. Transitions only go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Nothing sent to the node yet.
    Reset,
    /// The node is at genesis, blocks are being applied.
    Replaying,
    /// Every block was applied, the final state is being checked.
    PostValidated,
    Done,
}

pub struct ScenarioDriver<'a, T> {
    client: &'a RpcClient<T>,
    name: &'a str,
    fixture: &'a BlockchainFixture,
    state: ScenarioState,
}

impl<'a, T: Transport> ScenarioDriver<'a, T> {
    pub const fn new(client: &'a RpcClient<T>, name: &'a str, fixture: &'a BlockchainFixture) -> Self {
        Self {
            client,
            name,
            fixture,
            state: ScenarioState::Reset,
        }
    }

    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Runs the whole scenario. The first failure aborts it, leaving the
    /// driver in the state it failed in.
    pub async fn run(&mut self) -> Result<(), RunnerError> {
        self.fixture.check_consistency()?;

        self.reset().await?;
        self.transition(ScenarioState::Replaying);

        self.replay().await?;
        self.transition(ScenarioState::PostValidated);

        self.validate_post_state().await?;
        self.transition(ScenarioState::Done);

        info!("{} passed", self.name);
        Ok(())
    }

    fn transition(&mut self, next: ScenarioState) {
        debug!("{}: {:?} -> {:?}", self.name, self.state, next);
        self.state = next;
    }

    async fn reset(&self) -> Result<(), RunnerError> {
        let fixture = serde_json::to_value(self.fixture)?;
        self.client
            .assert_result(RESET_TO_GENESIS_FIXTURE, vec![fixture], &Value::Bool(true))
            .await?;

        validate_accounts(self.client, &self.fixture.pre, &BlockReference::LATEST).await
    }

    async fn replay(&self) -> Result<(), RunnerError> {
        for (index, block) in self.fixture.blocks.iter().enumerate() {
            if block.has_rlp_error() {
                debug!("{}: block #{} has an rlp_error, skipping", self.name, index);
                continue;
            }
            if block.is_good_block() {
                self.apply_good_block(index, block).await?;
            } else {
                self.apply_bad_block(index, block).await?;
            }
        }

        for block in self.fixture.last_blocks() {
            validate_last_block(self.client, block).await?;
        }
        Ok(())
    }

    async fn apply_good_block(&self, index: usize, block: &BlockFixture) -> Result<(), RunnerError> {
        let hash = block.header_hash().ok_or_else(|| {
            RunnerError::MalformedFixture(format!("block #{index}: blockHeader without hash"))
        })?;
        let at_block = BlockReference::hash(hash)?;
        debug!("{}: applying block #{} ({})", self.name, index, hash);

        self.client
            .assert_result(
                APPLY_BLOCK_FIXTURE,
                vec![serde_json::to_value(block)?],
                &block.rlp,
            )
            .await?;

        validate_block(self.client, block, &at_block).await
    }

    async fn apply_bad_block(&self, index: usize, block: &BlockFixture) -> Result<(), RunnerError> {
        debug!("{}: applying bad block #{}", self.name, index);
        let outcome = self
            .client
            .call(APPLY_BLOCK_FIXTURE, vec![serde_json::to_value(block)?])
            .await?;
        match outcome {
            Err(error) => {
                debug!("{}: block #{} rejected: {}", self.name, index, error);
                Ok(())
            }
            Ok(result) => Err(RunnerError::mismatch(
                format!("{APPLY_BLOCK_FIXTURE} block #{index}: invalid block was accepted"),
                Value::String("error".to_string()),
                result,
            )),
        }
    }

    async fn validate_post_state(&self) -> Result<(), RunnerError> {
        validate_accounts(self.client, &self.fixture.post_state, &BlockReference::LATEST).await?;
        validate_accounts(self.client, &self.fixture.pre, &BlockReference::EARLIEST).await?;
        validate_accounts(self.client, &self.fixture.pre, &BlockReference::Number(0)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure, setup, success, FixtureNode, MockTransport};
    use serde_json::json;

    fn fixture() -> BlockchainFixture {
        serde_json::from_str(include_str!("../test_data/simple_blockchain_test.json"))
            .expect("Error while reading the fixture")
    }

    #[tokio::test]
    async fn test_scenario_passes() {
        // Given
        setup();
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| node.handle(request)));
        let mut driver = ScenarioDriver::new(&client, "simple", &fixture);

        // When
        driver.run().await.unwrap();

        // Then
        assert_eq!(driver.state(), ScenarioState::Done);
        let methods = client.transport().methods();
        assert_eq!(methods[0], RESET_TO_GENESIS_FIXTURE);
        // The block with an rlp_error is never submitted.
        assert_eq!(
            methods.iter().filter(|m| *m == APPLY_BLOCK_FIXTURE).count(),
            2
        );
    }

    #[tokio::test]
    async fn test_inconsistent_fixture_makes_no_call() {
        // Given
        let mut fixture = fixture();
        fixture.blocks[0].rlp_error = Some(json!("BlockWrongRlp"));
        let client = RpcClient::new(MockTransport::new(|_| success(json!(true))));
        let mut driver = ScenarioDriver::new(&client, "inconsistent", &fixture);

        // When
        let err = driver.run().await.unwrap_err();

        // Then
        assert!(matches!(err, RunnerError::FixtureInconsistency(_)));
        assert!(client.transport().requests().is_empty());
        assert_eq!(driver.state(), ScenarioState::Reset);
    }

    #[tokio::test]
    async fn test_reset_must_return_true() {
        let fixture = fixture();
        let client = RpcClient::new(MockTransport::new(|_| success(json!(false))));
        let mut driver = ScenarioDriver::new(&client, "reset", &fixture);

        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, RunnerError::AssertionMismatch { .. }));
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_accepted_bad_block_fails() {
        // Given
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| {
            if request.method == APPLY_BLOCK_FIXTURE && request.params[0].get("blockHeader").is_none() {
                return success(json!("0x"));
            }
            node.handle(request)
        }));
        let mut driver = ScenarioDriver::new(&client, "bad block", &fixture);

        // When
        let err = driver.run().await.unwrap_err();

        // Then
        assert!(
            matches!(err, RunnerError::AssertionMismatch { context, .. } if context.contains("block #1"))
        );
        assert_eq!(driver.state(), ScenarioState::Replaying);
    }

    #[tokio::test]
    async fn test_rejected_good_block_fails() {
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| {
            if request.method == APPLY_BLOCK_FIXTURE {
                return failure("invalid block");
            }
            node.handle(request)
        }));
        let mut driver = ScenarioDriver::new(&client, "good block", &fixture);

        let err = driver.run().await.unwrap_err();

        assert!(
            matches!(err, RunnerError::RpcMethod { method, .. } if method == APPLY_BLOCK_FIXTURE)
        );
    }

    #[tokio::test]
    async fn test_good_block_with_other_rlp_fails() {
        // Given
        let fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| {
            if request.method == APPLY_BLOCK_FIXTURE {
                return success(json!("0xdeadbeef"));
            }
            node.handle(request)
        }));
        let mut driver = ScenarioDriver::new(&client, "other rlp", &fixture);

        // When
        let err = driver.run().await.unwrap_err();

        // Then
        let rlp = fixture.blocks[0].rlp.clone();
        assert!(matches!(
            err,
            RunnerError::AssertionMismatch { expected, actual, .. }
                if expected == rlp && actual == json!("0xdeadbeef")
        ));
        let methods = client.transport().methods();
        assert_eq!(methods.last().map(String::as_str), Some(APPLY_BLOCK_FIXTURE));
        assert!(!methods.iter().any(|m| m == "eth_getBlockByHash"));
        assert_eq!(driver.state(), ScenarioState::Replaying);
    }

    #[tokio::test]
    async fn test_wrong_post_state_fails() {
        // Given
        let mut fixture = fixture();
        let node = FixtureNode::new(fixture.clone());
        let client = RpcClient::new(MockTransport::new(move |request| node.handle(request)));
        if let Some(account) = fixture.post_state.values_mut().next() {
            account.nonce = "0x07".to_string();
        }
        let mut driver = ScenarioDriver::new(&client, "post state", &fixture);

        // When
        let err = driver.run().await.unwrap_err();

        // Then
        assert!(
            matches!(err, RunnerError::AssertionMismatch { context, .. } if context.starts_with("Invalid state - nonce"))
        );
        assert_eq!(driver.state(), ScenarioState::PostValidated);
    }
}
