use std::{fmt, ops::Deref, path::PathBuf};

/// Path to a fixture file.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathWrapper(PathBuf);

impl From<PathBuf> for PathWrapper {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<PathWrapper> for PathBuf {
    fn from(path: PathWrapper) -> Self {
        path.0
    }
}

impl Deref for PathWrapper {
    type Target = PathBuf;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for PathWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl PathWrapper {
    /// Name of the folder containing the file, empty if the path has no parent.
    pub fn parent_name(&self) -> String {
        self.0
            .parent()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// File name without its extension, empty for paths without a file name.
    pub fn file_stem_to_string(&self) -> String {
        self.0
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Forward-slash separated representation, used for substring matching
    /// against registry entries independently of the platform.
    pub fn to_slash_string(&self) -> String {
        self.0
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}
