// Inspired by https://github.com/paradigmxyz/reth/tree/main/testing/ef-tests
// Modified to use async running

use std::path::PathBuf;

use build_utils::filter::Filter;

use super::case::BlockchainTestCase;
use crate::traits::Suite;

pub struct BlockchainTestSuite {
    /// Folder of the suite, relative to the fixtures root.
    pub name: String,
    /// Root folder of the blockchain fixtures.
    pub root: PathBuf,
    pub filter: Filter,
}

impl BlockchainTestSuite {
    #[must_use]
    pub const fn new(name: String, root: PathBuf, filter: Filter) -> Self {
        Self { name, root, filter }
    }
}

impl Suite for BlockchainTestSuite {
    type Case = BlockchainTestCase;

    fn suite_name(&self) -> String {
        format!("BlockchainTests/{}", self.name)
    }

    fn suite_path(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    fn filter(&self) -> &Filter {
        &self.filter
    }
}
