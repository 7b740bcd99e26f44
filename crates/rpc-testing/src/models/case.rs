// Inspired by https://github.com/paradigmxyz/reth/tree/main/testing/ef-tests

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use super::{error::RunnerError, BlockchainFixture};
use crate::{
    rpc::{RpcClient, Transport},
    scenario::ScenarioDriver,
    traits::Case,
    utils::io::{deserialize_into, load_file},
};

#[derive(Debug)]
pub struct BlockchainTestCase {
    pub name: String,
    pub path: PathBuf,
    pub fixture: BlockchainFixture,
}

#[async_trait]
impl Case for BlockchainTestCase {
    /// Loads the scenarios of a fixture file: a JSON object mapping each
    /// scenario name to its fixture.
    fn load(path: &Path) -> Result<Vec<Self>, RunnerError> {
        let s = load_file(path)?;
        let cases: BTreeMap<String, BlockchainFixture> = deserialize_into(&s, path)?;
        Ok(cases
            .into_iter()
            .map(|(name, fixture)| Self {
                name,
                path: path.to_path_buf(),
                fixture,
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn network(&self) -> Option<&str> {
        Some(self.fixture.network.as_str()).filter(|network| !network.is_empty())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn run<T: Transport>(&self, client: &RpcClient<T>) -> Result<(), RunnerError> {
        ScenarioDriver::new(client, &self.name, &self.fixture)
            .run()
            .await
    }
}
