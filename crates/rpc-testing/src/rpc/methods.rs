//! Names of the RPC methods exercised by the harness.
use crate::models::reference::BlockReference;

pub const RESET_TO_GENESIS_FIXTURE: &str = "evm_resetToGenesisFixture";
pub const APPLY_BLOCK_FIXTURE: &str = "evm_applyBlockFixture";

pub const GET_BALANCE: &str = "eth_getBalance";
pub const GET_CODE: &str = "eth_getCode";
pub const GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
pub const GET_STORAGE_AT: &str = "eth_getStorageAt";

/// A pair of methods doing the same lookup, keyed either by block hash or by
/// block number/tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupMethods {
    pub by_hash: &'static str,
    pub by_number: &'static str,
}

impl LookupMethods {
    /// Picks the member of the pair matching the reference.
    pub const fn resolve(&self, reference: &BlockReference) -> &'static str {
        if reference.is_by_hash() {
            self.by_hash
        } else {
            self.by_number
        }
    }
}

pub const GET_BLOCK: LookupMethods = LookupMethods {
    by_hash: "eth_getBlockByHash",
    by_number: "eth_getBlockByNumber",
};

pub const GET_BLOCK_TRANSACTION_COUNT: LookupMethods = LookupMethods {
    by_hash: "eth_getBlockTransactionCountByHash",
    by_number: "eth_getBlockTransactionCountByNumber",
};

pub const GET_TRANSACTION_BY_BLOCK_AND_INDEX: LookupMethods = LookupMethods {
    by_hash: "eth_getTransactionByBlockHashAndIndex",
    by_number: "eth_getTransactionByBlockNumberAndIndex",
};

pub const GET_UNCLE_COUNT: LookupMethods = LookupMethods {
    by_hash: "eth_getUncleCountByBlockHash",
    by_number: "eth_getUncleCountByBlockNumber",
};

pub const GET_UNCLE_BY_BLOCK_AND_INDEX: LookupMethods = LookupMethods {
    by_hash: "eth_getUncleByBlockHashAndIndex",
    by_number: "eth_getUncleByBlockNumberAndIndex",
};
