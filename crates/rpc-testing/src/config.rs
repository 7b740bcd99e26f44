//! Runner configuration, read from the environment (and a `.env` file).
use std::{env, path::PathBuf};

use build_utils::filter::Filter;

use crate::models::error::RunnerError;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_FIXTURES_PATH: &str = "ethereum-tests/BlockchainTests";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// JSON-RPC endpoint of the node under test.
    pub rpc_url: String,
    /// Root folder of the blockchain fixtures.
    pub fixtures_path: PathBuf,
    /// YAML registry of the skipped and expected-to-fail scenarios.
    pub filter_path: Option<PathBuf>,
    pub run_slow_tests: bool,
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            rpc_url: var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            fixtures_path: var("FIXTURES_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_FIXTURES_PATH), PathBuf::from),
            filter_path: var("FIXTURES_FILTER").map(PathBuf::from),
            run_slow_tests: var("RUN_SLOW_TESTS")
                .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true"))
                .unwrap_or_default(),
        }
    }

    /// Loads the registry, or an empty one when none is configured.
    pub fn load_filter(&self) -> Result<Filter, RunnerError> {
        let filter = match &self.filter_path {
            Some(path) => Filter::load_file(path)?,
            None => Filter::default(),
        };
        Ok(filter.with_slow_tests(self.run_slow_tests))
    }
}
