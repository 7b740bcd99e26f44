//! Traits definition
//! Inspired by <https://github.com/paradigmxyz/reth/tree/main/testing/ef-tests>
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use build_utils::{dir_reader::DirReader, filter::Filter, filter::Mark, path::PathWrapper};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    models::{
        error::RunnerError,
        result::{CaseResult, SuiteReport},
    },
    rpc::{RpcClient, Transport},
};

/// A single scenario, capable of loading a JSON description of itself and
/// running it against a node.
#[async_trait]
pub trait Case: Debug + Sync + Send + Sized {
    /// Loads every scenario of the fixture file at `path`.
    fn load(path: &Path) -> Result<Vec<Self>, RunnerError>;

    fn name(&self) -> &str;

    /// Network (fork) the scenario targets, if it declares one.
    fn network(&self) -> Option<&str>;

    /// Fixture file the scenario was loaded from.
    fn path(&self) -> &Path;

    /// Replays the scenario through `client`.
    async fn run<T: Transport>(&self, client: &RpcClient<T>) -> Result<(), RunnerError>;
}

#[async_trait]
pub trait Suite: Sync {
    type Case: Case;

    fn suite_name(&self) -> String;

    /// Folder containing the fixture files of the suite.
    fn suite_path(&self) -> PathBuf;

    /// Registry deciding which scenarios are skipped or expected to fail.
    fn filter(&self) -> &Filter;

    /// Discovers the fixture files of the suite and loads them in parallel.
    /// A file that cannot be loaded is reported as a failed result instead of
    /// stopping the suite.
    fn load_cases(&self) -> Result<(Vec<Self::Case>, Vec<CaseResult>), RunnerError> {
        let files = DirReader::new()
            .walk_dir_and_store_files(self.suite_path().into())?
            .all_files();
        let loaded = files
            .par_iter()
            .filter(|path| !self.filter().is_skipped(path, None))
            .map(|path| (path, Self::Case::load(path)))
            .collect::<Vec<_>>();

        let mut cases = Vec::new();
        let mut failures = Vec::new();
        for (path, result) in loaded {
            match result {
                Ok(file_cases) => cases.extend(file_cases),
                Err(err) => {
                    warn!("{} could not be loaded: {}", path.display(), err);
                    failures.push(CaseResult::load_failure(path, &err));
                }
            }
        }
        Ok((cases, failures))
    }

    /// Runs every scenario of the suite, one after the other: they all share
    /// the chain of the node behind `client`.
    async fn run<T: Transport>(&self, client: &RpcClient<T>) -> Result<SuiteReport, RunnerError> {
        let suite_name = self.suite_name();
        let (cases, mut results) = self.load_cases()?;
        info!("{}: running {} scenarios", suite_name, cases.len());

        results.reserve(cases.len());
        for case in &cases {
            let path: PathWrapper = case.path().to_path_buf().into();
            let mark = self.filter().mark(&path, case.name(), case.network());
            let result = match mark {
                Mark::Skip(ref reason) => {
                    info!("{} skipped: {}", case.name(), reason);
                    CaseResult::new(case, &mark, Err(RunnerError::Skipped))
                }
                _ => {
                    let outcome = case.run(client).await;
                    if let Err(ref err) = outcome {
                        warn!("{} failed: {}", case.name(), err);
                    }
                    CaseResult::new(case, &mark, outcome)
                }
            };
            results.push(result);
        }

        let report = SuiteReport::new(suite_name, results);
        report.log();
        Ok(report)
    }
}
