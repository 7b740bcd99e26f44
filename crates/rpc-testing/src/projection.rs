//! Projection of fixture entities into the shape the RPC is expected to return.
//!
//! Each entity kind has a remapping table (fixture field name to RPC field
//! name) and a normalizer table keyed by the *fixture* field name. Fields
//! missing from a table keep their name, or their value. New fields are
//! supported by extending the tables.
use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::{
    models::{AccountState, FixtureMap, Header, TransactionFixture},
    normalizers::{
        add_0x_prefix, empty_to_0x, identity, normalize_value, remove_leading_zeros, Normalizer,
    },
};

type Remappers = HashMap<&'static str, &'static str>;
type Normalizers = HashMap<&'static str, Normalizer>;

/// Block fields that are not compared: expensive to recompute
/// independently (`size`, `totalDifficulty`) or checked separately.
pub const BLOCK_EXCLUDED_FIELDS: [&str; 4] = ["size", "totalDifficulty", "transactions", "uncles"];

/// Transaction fields that are not compared: the hash is derived.
pub const TRANSACTION_EXCLUDED_FIELDS: [&str; 1] = ["hash"];

lazy_static! {
    static ref RPC_BLOCK_REMAPPERS: Remappers = HashMap::from([
        ("bloom", "logsBloom"),
        ("coinbase", "miner"),
        ("transactionsTrie", "transactionsRoot"),
        ("uncleHash", "sha3Uncles"),
        ("receiptTrie", "receiptsRoot"),
    ]);
    static ref RPC_BLOCK_NORMALIZERS: Normalizers = {
        let mut normalizers: Normalizers = HashMap::new();
        normalizers.insert("difficulty", remove_leading_zeros);
        normalizers.insert("extraData", empty_to_0x);
        normalizers.insert("gasLimit", remove_leading_zeros);
        normalizers.insert("gasUsed", remove_leading_zeros);
        normalizers.insert("number", remove_leading_zeros);
        normalizers.insert("timestamp", remove_leading_zeros);
        normalizers
    };
    static ref RPC_TRANSACTION_REMAPPERS: Remappers =
        HashMap::from([("data", "input"), ("gasLimit", "gas")]);
    static ref RPC_TRANSACTION_NORMALIZERS: Normalizers = {
        let mut normalizers: Normalizers = HashMap::new();
        normalizers.insert("nonce", remove_leading_zeros);
        normalizers.insert("gasLimit", remove_leading_zeros);
        normalizers.insert("gasPrice", remove_leading_zeros);
        normalizers.insert("value", remove_leading_zeros);
        normalizers.insert("data", empty_to_0x);
        normalizers.insert("to", add_0x_prefix);
        normalizers.insert("r", remove_leading_zeros);
        normalizers.insert("s", remove_leading_zeros);
        normalizers.insert("v", remove_leading_zeros);
        normalizers
    };
    static ref RPC_STATE_REMAPPERS: Remappers = HashMap::new();
    static ref RPC_STATE_NORMALIZERS: Normalizers = {
        let mut normalizers: Normalizers = HashMap::new();
        normalizers.insert("balance", remove_leading_zeros);
        normalizers.insert("code", empty_to_0x);
        normalizers.insert("nonce", remove_leading_zeros);
        normalizers
    };
}

fn project(fields: &FixtureMap, remappers: &Remappers, normalizers: &Normalizers) -> FixtureMap {
    fields
        .iter()
        .map(|(key, value)| {
            let rpc_key = remappers.get(key.as_str()).copied().unwrap_or(key.as_str());
            let normalizer = normalizers.get(key.as_str()).copied().unwrap_or(identity);
            (rpc_key.to_string(), normalize_value(normalizer, value))
        })
        .collect()
}

/// Expected RPC block (or uncle) for a fixture header.
pub fn project_block(header: &Header) -> FixtureMap {
    project(header, &RPC_BLOCK_REMAPPERS, &RPC_BLOCK_NORMALIZERS)
}

/// Expected RPC transaction for a fixture transaction.
pub fn project_transaction(transaction: &TransactionFixture) -> FixtureMap {
    project(
        transaction,
        &RPC_TRANSACTION_REMAPPERS,
        &RPC_TRANSACTION_NORMALIZERS,
    )
}

/// Expected RPC values for a fixture account state.
pub fn project_account_state(state: &AccountState) -> FixtureMap {
    let mut fields = FixtureMap::new();
    fields.insert("balance".to_string(), Value::String(state.balance.clone()));
    fields.insert("code".to_string(), Value::String(state.code.clone()));
    fields.insert("nonce".to_string(), Value::String(state.nonce.clone()));
    fields.insert(
        "storage".to_string(),
        Value::Object(
            state
                .storage()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ),
    );
    project(&fields, &RPC_STATE_REMAPPERS, &RPC_STATE_NORMALIZERS)
}

/// Copy of `fields` without the `excluded` keys.
pub fn without_fields(fields: &FixtureMap, excluded: &[&str]) -> FixtureMap {
    fields
        .iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
