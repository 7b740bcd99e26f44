use std::collections::BTreeMap;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::constants::{FIXTURE_EXTENSION, ROOT};
use crate::path::PathWrapper;
use crate::utils::{is_fixture_file, path_relative_to, path_to_vec_string};

/// The `DirReader` will iterate all folders and
/// fixture files in the given directory and stores them
/// by using a recursive structure (structure that
/// contains itself).
#[derive(Debug, Default)]
pub struct DirReader {
    /// Mapping containing the sub directories
    pub(crate) sub_dirs: BTreeMap<String, DirReader>,
    /// Vector containing the fixture files
    pub(crate) files: Vec<PathWrapper>,
}

impl DirReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fixture files stored directly in this folder
    pub fn files(&self) -> &[PathWrapper] {
        &self.files
    }

    /// Returns the sub folders of this folder
    pub fn sub_dirs(&self) -> impl Iterator<Item = (&String, &DirReader)> {
        self.sub_dirs.iter()
    }

    /// Walks the given directory and stores all fixture files.
    pub fn walk_dir_and_store_files(
        mut self,
        directory_path: PathWrapper,
    ) -> Result<Self, eyre::Error> {
        let root: PathBuf = directory_path.into();
        if !root.exists() {
            return Err(eyre::eyre!("Fixtures directory {} not found", root.display()));
        }

        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|f| f.file_type().is_file())
        {
            let full_path: PathWrapper = entry.path().to_path_buf().into();
            if !is_fixture_file(&full_path, FIXTURE_EXTENSION) {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let path = path_relative_to(path_to_vec_string(relative)?, ROOT);
            self.insert_file(path, full_path);
        }

        tracing::debug!(
            "found {} fixture files under {}",
            self.file_count(),
            root.display()
        );
        Ok(self)
    }

    /// Returns all the stored files, depth first, sub folders before files.
    pub fn all_files(&self) -> Vec<PathWrapper> {
        let mut acc = Vec::new();
        self.collect_files(&mut acc);
        acc
    }

    fn collect_files(&self, acc: &mut Vec<PathWrapper>) {
        for sub_node in self.sub_dirs.values() {
            sub_node.collect_files(acc);
        }
        acc.extend(self.files.iter().cloned());
    }

    fn file_count(&self) -> usize {
        self.files.len() + self.sub_dirs.values().map(Self::file_count).sum::<usize>()
    }

    /// Inserts a file into the `DirReader` by recursively navigating the file's
    /// path and inserting the file into the correct sub directory.
    fn insert_file(&mut self, current_path: Vec<String>, full_path: PathWrapper) {
        match current_path.split_first() {
            Some((root_name, rest)) if !rest.is_empty() => {
                let sub_node = self.sub_dirs.entry(root_name.clone()).or_default();
                sub_node.insert_file(rest.to_vec(), full_path);
            }
            _ => self.files.push(full_path),
        }
    }
}
