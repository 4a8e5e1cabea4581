//! Where config files are looked for and how found files combine.
//!
//! Search paths are listed in **priority-ascending** order: the last entry
//! wins. Each directory is checked for every configured file name in turn
//! and the first name that exists is that directory's file.
//!
//! Common setups:
//!
//! ```ignore
//! // user-level settings, overridden by the project checkout
//! .search_paths(vec![SearchPath::Platform, SearchPath::Ancestors(Boundary::Marker(".git"))])
//!
//! // the nearest project file only, no layering
//! .search_paths(vec![SearchPath::Ancestors(Boundary::Root)])
//! .search_mode(SearchMode::FirstMatch)
//! ```

use std::path::{Path, PathBuf};

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
    /// Every directory from the working directory up to `Boundary`,
    /// shallowest first.
    Ancestors(Boundary),
}

/// How far an [`Ancestors`](SearchPath::Ancestors) walk goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    /// Up to the filesystem root.
    Root,
    /// Up to and including the first directory containing this entry.
    Marker(&'static str),
}

/// What to do when several config files are found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Deep-merge every file, later ones overriding earlier ones.
    #[default]
    Merge,
    /// Use only the highest-priority file.
    FirstMatch,
}

/// Config file syntax, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` is JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}
