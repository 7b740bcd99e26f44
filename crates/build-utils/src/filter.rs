use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, fs, path::Path};

use crate::path::PathWrapper;

type Folder = String;
type FilterMap = BTreeMap<Folder, Vec<String>>;

/// A fixture known to be wrong upstream. The scenario still runs, but a failure
/// is reported as expected.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct IncorrectUpstream {
    /// Path of the fixture file, relative to the fixtures root
    pub path: String,
    /// Name of the scenario inside the fixture file
    pub name: String,
    /// Why the fixture is considered incorrect. Always provide one.
    pub reason: String,
}

/// Decision taken for a scenario before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Run,
    Skip(String),
    ExpectedFailure(String),
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Skip(reason) => write!(f, "skip ({reason})"),
            Self::ExpectedFailure(reason) => write!(f, "xfail ({reason})"),
        }
    }
}

/// Registry of the fixtures that should be skipped or are expected to fail.
/// Loaded once per test run and passed to the suite explicitly.
#[derive(Debug, Deserialize, Default, Serialize)]
pub struct Filter {
    /// List of directories that should be skipped.
    #[serde(default)]
    directories: Vec<String>,
    /// Mapping containing the directories and the files that should be skipped
    #[serde(default)]
    filename: FilterMap,
    /// Mapping containing the directories and the regex patterns that should be skipped
    #[serde(default)]
    regex: FilterMap,
    /// Mapping containing the directories and the specific tests that should be skipped
    #[serde(default, rename = "testname")]
    test_name: FilterMap,
    /// Substrings of fixture paths or scenario names that are too slow for a quick run
    #[serde(default)]
    slow: Vec<String>,
    /// Scenarios that are thought to be incorrect or buggy upstream
    #[serde(default)]
    incorrect_upstream: Vec<IncorrectUpstream>,
    /// Networks (forks) the node under test does not support
    #[serde(default)]
    unsupported_networks: Vec<String>,
    #[serde(skip)]
    compiled_regex: BTreeMap<Folder, Vec<Regex>>,
    #[serde(skip)]
    run_slow_tests: bool,
}

impl Filter {
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, eyre::Error> {
        let filter = fs::read_to_string(path.as_ref())
            .map_err(|err| eyre::eyre!("{}: {err}", path.as_ref().display()))?;
        Self::from_yaml(&filter)
    }

    pub fn from_yaml(content: &str) -> Result<Self, eyre::Error> {
        let mut filter: Self = serde_yaml::from_str(content)?;
        filter.compiled_regex = filter
            .regex
            .iter()
            .map(|(folder, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((folder.clone(), compiled))
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(filter)
    }

    /// Enables or disables the scenarios listed as slow.
    #[must_use]
    pub fn with_slow_tests(mut self, run_slow_tests: bool) -> Self {
        self.run_slow_tests = run_slow_tests;
        self
    }

    /// Decides whether the scenario `case_name` of the fixture file at `path`
    /// runs, is skipped or is expected to fail.
    pub fn mark(&self, path: &PathWrapper, case_name: &str, network: Option<&str>) -> Mark {
        let path_str = path.to_slash_string();

        if !self.run_slow_tests {
            if let Some(slow) = self
                .slow
                .iter()
                .find(|slow| path_str.contains(slow.as_str()) || case_name.contains(slow.as_str()))
            {
                return Mark::Skip(format!("slow test {slow}"));
            }
        }

        if let Some(network) = network {
            if self.unsupported_networks.iter().any(|n| n == network) {
                return Mark::Skip(format!("network {network} not supported"));
            }
        }

        if self.is_skipped(path, Some(case_name)) {
            return Mark::Skip("skipped in config file".to_string());
        }

        if let Some(entry) = self
            .incorrect_upstream
            .iter()
            .find(|entry| entry.name == case_name && path_str.ends_with(entry.path.as_str()))
        {
            return Mark::ExpectedFailure(entry.reason.clone());
        }

        Mark::Run
    }

    /// Checks if the given path (and optionally scenario) is skipped by the
    /// directory, file name, regex or test name entries.
    pub fn is_skipped(&self, path: &PathWrapper, case_name: Option<&str>) -> bool {
        let path_str = path.to_slash_string();
        if self
            .directories
            .iter()
            .any(|dir| path_str.split('/').any(|component| component == dir))
        {
            return true;
        }

        let dir_name = path.parent_name();
        let file_name = path.file_stem_to_string();

        let mut should_skip = self
            .filename
            .get(&dir_name)
            .map(|filtered_files| filtered_files.iter().any(|filename| filename == &file_name))
            .unwrap_or_default();

        should_skip |= self
            .compiled_regex
            .get(&dir_name)
            .map(|regexes| regexes.iter().any(|regex| regex.is_match(&file_name)))
            .unwrap_or_default();

        if let Some(case_name) = case_name {
            should_skip |= self
                .test_name
                .get(&dir_name)
                .map(|tests| tests.iter().any(|test| test == case_name))
                .unwrap_or_default();
        }

        should_skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    const REGISTRY: &str = r#"
directories:
  - Pyspecs
filename:
  bcExploitTest:
    - DelegateCallSpam
regex:
  stBadOpcode:
    - opc[0-9A-F]{2}DiffPlaces
testname:
  stRandom:
    - randomStatetest0_d0g0v0_Byzantium
slow:
  - Call1024PreCalls_d0g0v0_Byzantium
  - stQuadraticComplexityTest/Call50000_d0g1v0.json
incorrect_upstream:
  - path: GeneralStateTests/stRevertTest/RevertInCreateInInit_d0g0v0.json
    name: RevertInCreateInInit_d0g0v0_Byzantium
    reason: synthetic scenario that cannot be reached with consensus rules
unsupported_networks:
  - Constantinople
"#;

    fn path(p: &str) -> PathWrapper {
        PathBuf::from(p).into()
    }

    #[rstest]
    #[case("fixtures/BlockchainTests/bcExploitTest/DelegateCallSpam.json", "any", true)]
    #[case("fixtures/BlockchainTests/stBadOpcode/opc4DDiffPlaces.json", "any", true)]
    #[case("fixtures/BlockchainTests/Pyspecs/cancun/a.json", "any", true)]
    #[case("fixtures/BlockchainTests/stRandom/randomStatetest0.json", "randomStatetest0_d0g0v0_Byzantium", true)]
    #[case("fixtures/BlockchainTests/stRandom/randomStatetest0.json", "randomStatetest0_d1g0v0_Byzantium", false)]
    #[case("fixtures/BlockchainTests/bcExploitTest/SuicideIssue.json", "any", false)]
    fn test_filter_is_skipped(#[case] p: &str, #[case] case_name: &str, #[case] expected: bool) {
        let filter = Filter::from_yaml(REGISTRY).unwrap();
        assert_eq!(filter.is_skipped(&path(p), Some(case_name)), expected);
    }

    #[test]
    fn test_mark_slow_by_name() {
        // Given
        let filter = Filter::from_yaml(REGISTRY).unwrap();
        let p = path("fixtures/BlockchainTests/GeneralStateTests/stCallCreateCallCodeTest/Call1024PreCalls.json");

        // When
        let mark = filter.mark(&p, "Call1024PreCalls_d0g0v0_Byzantium", Some("Byzantium"));

        // Then
        assert!(matches!(mark, Mark::Skip(_)));
    }

    #[test]
    fn test_mark_slow_by_path_runs_when_enabled() {
        // Given
        let filter = Filter::from_yaml(REGISTRY).unwrap().with_slow_tests(true);
        let p = path("fixtures/BlockchainTests/GeneralStateTests/stQuadraticComplexityTest/Call50000_d0g1v0.json");

        // When
        let mark = filter.mark(&p, "Call50000_d0g1v0_Byzantium", Some("Byzantium"));

        // Then
        assert_eq!(mark, Mark::Run);
    }

    #[test]
    fn test_mark_incorrect_upstream() {
        let filter = Filter::from_yaml(REGISTRY).unwrap();
        let p = path("fixtures/BlockchainTests/GeneralStateTests/stRevertTest/RevertInCreateInInit_d0g0v0.json");

        let mark = filter.mark(&p, "RevertInCreateInInit_d0g0v0_Byzantium", Some("Byzantium"));

        assert!(matches!(mark, Mark::ExpectedFailure(reason) if reason.contains("synthetic")));
    }

    #[test]
    fn test_mark_unsupported_network() {
        let filter = Filter::from_yaml(REGISTRY).unwrap();
        let p = path("fixtures/BlockchainTests/bcValidBlockTest/SimpleTx.json");

        assert!(matches!(
            filter.mark(&p, "SimpleTx_Constantinople", Some("Constantinople")),
            Mark::Skip(_)
        ));
        assert_eq!(filter.mark(&p, "SimpleTx_Byzantium", Some("Byzantium")), Mark::Run);
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let result = Filter::from_yaml("regex:\n  a:\n    - \"(unclosed\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_registry() {
        let filter = Filter::from_yaml("{}").unwrap();
        assert_eq!(filter.mark(&path("a/b.json"), "b", None), Mark::Run);
    }
}
