pub mod case;
pub mod error;
pub mod reference;
pub mod result;
pub mod suite;

use std::collections::BTreeMap;

use serde::{self, Deserialize, Serialize};
use serde_json::Value;

use crate::utils::deserialize_present;

use self::error::RunnerError;

/// A fixture entity kept in its raw, field-by-field form.
pub type FixtureMap = serde_json::Map<String, Value>;

/// Block header as found in the fixture (`blockHeader`, `uncleHeaders`).
pub type Header = FixtureMap;

/// Transaction as found in the fixture.
pub type TransactionFixture = FixtureMap;

/// Mapping from account address to account state.
pub type State = BTreeMap<String, AccountState>;

/// Mapping from storage key to storage value.
pub type Storage = BTreeMap<String, String>;

/// Account state, in the fixture encoding: numeric fields are hex strings that
/// may carry leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountState {
    pub balance: String,
    pub nonce: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(flatten)]
    pub extra: FixtureMap,
}

impl AccountState {
    /// Storage entries, none if the fixture declares no storage.
    pub fn storage(&self) -> impl Iterator<Item = (&String, &String)> {
        self.storage.iter().flatten()
    }
}

/// A block in a blockchain fixture.
///
/// A block with a `blockHeader` is expected to be accepted by the node. A block
/// without one is expected to be rejected, and if it additionally carries an
/// `rlp_error` it cannot even be decoded and is never submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFixture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_header: Option<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionFixture>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncle_headers: Option<Vec<Header>>,
    /// Expected canonical encoding of the block, opaque to the harness.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub rlp: Value,
    #[serde(
        default,
        rename = "rlp_error",
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub rlp_error: Option<Value>,
    /// Every other field of the block, forwarded untouched to the node.
    #[serde(flatten)]
    pub extra: FixtureMap,
}

impl BlockFixture {
    pub const fn is_good_block(&self) -> bool {
        self.block_header.is_some()
    }

    pub const fn has_rlp_error(&self) -> bool {
        self.rlp_error.is_some()
    }

    pub fn transactions(&self) -> &[TransactionFixture] {
        self.transactions.as_deref().unwrap_or_default()
    }

    pub fn uncle_headers(&self) -> &[Header] {
        self.uncle_headers.as_deref().unwrap_or_default()
    }

    /// Hash declared in the block header, if any.
    pub fn header_hash(&self) -> Option<&str> {
        self.block_header
            .as_ref()
            .and_then(|header| header.get("hash"))
            .and_then(Value::as_str)
    }

    /// A block cannot both claim validity and carry a decoding error.
    pub fn check_consistency(&self) -> Result<(), RunnerError> {
        if self.is_good_block() && self.has_rlp_error() {
            return Err(RunnerError::FixtureInconsistency(format!(
                "block {} carries both a blockHeader and an rlp_error",
                self.header_hash().unwrap_or("<unknown>")
            )));
        }
        Ok(())
    }
}

/// The definition of a blockchain fixture scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainFixture {
    /// Network (fork) the blocks are built for.
    pub network: String,
    /// The test pre-state.
    pub pre: State,
    /// Block data.
    #[serde(default)]
    pub blocks: Vec<BlockFixture>,
    /// The expected post state.
    pub post_state: State,
    /// Hash of the best block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastblockhash: Option<String>,
    /// Every other field of the scenario (genesis header, seal engine...),
    /// forwarded untouched to the node.
    #[serde(flatten)]
    pub extra: FixtureMap,
}

impl BlockchainFixture {
    /// Checks all the blocks for self-consistency, before anything is sent to
    /// the node.
    pub fn check_consistency(&self) -> Result<(), RunnerError> {
        self.blocks
            .iter()
            .enumerate()
            .try_for_each(|(index, block)| {
                block.check_consistency().map_err(|err| match err {
                    RunnerError::FixtureInconsistency(msg) => {
                        RunnerError::FixtureInconsistency(format!("block #{index}: {msg}"))
                    }
                    other => other,
                })
            })
    }

    /// Blocks whose header hash matches `lastblockhash`.
    pub fn last_blocks(&self) -> impl Iterator<Item = &BlockFixture> {
        let last = self.lastblockhash.as_deref().filter(|hash| !hash.is_empty());
        self.blocks
            .iter()
            .filter(move |block| last.is_some() && block.header_hash() == last)
    }
}
