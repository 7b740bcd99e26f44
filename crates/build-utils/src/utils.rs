use std::path::Path;

use crate::path::PathWrapper;

/// Converts the path to a Vector of Strings
pub fn path_to_vec_string(path: &Path) -> Result<Vec<String>, eyre::Error> {
    path.iter()
        .map(|os_str| {
            Ok(os_str
                .to_str()
                .ok_or_else(|| eyre::eyre!("Error while converting the path to a string"))?
                .to_string())
        })
        .collect()
}

/// Returns the path relative to the given folder. If the folder is not part
/// of the path, the full path is returned.
///
/// # Example
///
/// Input: fixtures/BlockchainTests/bcExploitTest/SuicideIssue.json, BlockchainTests
/// Output: [bcExploitTest, SuicideIssue.json]
pub fn path_relative_to(path: Vec<String>, folder: &str) -> Vec<String> {
    if !path.iter().any(|x| x == folder) {
        return path;
    }
    path.into_iter()
        .skip_while(|x| x != folder)
        .skip(1)
        .collect()
}

/// Returns true if the path is a fixture file.
pub fn is_fixture_file(path: &PathWrapper, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or_default()
}
