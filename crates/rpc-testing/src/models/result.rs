use std::{
    fmt,
    path::{Path, PathBuf},
};

use build_utils::filter::Mark;
use tracing::{info, warn};

use super::error::RunnerError;
use crate::traits::Case;

/// What happened to a scenario once run (or not) under its mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
    /// Known to fail, and did.
    ExpectedFailure(String),
    /// Known to fail, but passed.
    UnexpectedPass(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed(err) => write!(f, "failed: {err}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::ExpectedFailure(reason) => write!(f, "xfail: {reason}"),
            Self::UnexpectedPass(reason) => write!(f, "xpass: {reason}"),
        }
    }
}

/// The result of running a scenario.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub name: String,
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl CaseResult {
    pub fn new(case: &impl Case, mark: &Mark, result: Result<(), RunnerError>) -> Self {
        let outcome = match (mark, result) {
            (Mark::Skip(reason), _) => Outcome::Skipped(reason.clone()),
            (_, Err(RunnerError::Skipped)) => Outcome::Skipped("skipped by the scenario".to_string()),
            (Mark::Run, Ok(())) => Outcome::Passed,
            (Mark::Run, Err(err)) => Outcome::Failed(err.to_string()),
            (Mark::ExpectedFailure(reason), Err(_)) => Outcome::ExpectedFailure(reason.clone()),
            (Mark::ExpectedFailure(reason), Ok(())) => Outcome::UnexpectedPass(reason.clone()),
        };
        Self {
            name: case.name().to_string(),
            path: case.path().to_path_buf(),
            outcome,
        }
    }

    /// A fixture file that could not be loaded fails on its own, named after
    /// the file since none of its scenarios could be read.
    pub fn load_failure(path: &Path, err: &RunnerError) -> Self {
        Self {
            name: path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            outcome: Outcome::Failed(err.to_string()),
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Counts of the outcomes of a suite.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub expected_failures: usize,
    pub unexpected_passes: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} xfailed, {} xpassed",
            self.passed, self.failed, self.skipped, self.expected_failures, self.unexpected_passes
        )
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub suite_name: String,
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    pub const fn new(suite_name: String, results: Vec<CaseResult>) -> Self {
        Self {
            suite_name,
            results,
        }
    }

    pub fn summary(&self) -> Summary {
        self.results
            .iter()
            .fold(Summary::default(), |mut summary, result| {
                match result.outcome {
                    Outcome::Passed => summary.passed += 1,
                    Outcome::Failed(_) => summary.failed += 1,
                    Outcome::Skipped(_) => summary.skipped += 1,
                    Outcome::ExpectedFailure(_) => summary.expected_failures += 1,
                    Outcome::UnexpectedPass(_) => summary.unexpected_passes += 1,
                }
                summary
            })
    }

    /// Unexpected passes are reported but do not fail the suite.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(CaseResult::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|result| result.is_failure())
    }

    pub fn log(&self) {
        for result in &self.results {
            if let Outcome::UnexpectedPass(reason) = &result.outcome {
                warn!(
                    "{} ({}) passed but is marked as incorrect upstream: {}",
                    result.name,
                    result.path.display(),
                    reason
                );
            }
        }
        for failure in self.failures() {
            warn!(
                "{} ({}) {}",
                failure.name,
                failure.path.display(),
                failure.outcome
            );
        }
        info!("{}: {}", self.suite_name, self.summary());
    }
}
