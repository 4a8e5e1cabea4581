//! Config file discovery, reading and parsing.
//!
//! # Discovery
//!
//! Each [`SearchPath`] resolves to one or more directories.
//! `Ancestors(boundary)` expands inline, shallowest first, so the directory
//! closest to the working directory has the highest priority.
//!
//! # Resolution
//!
//! Every directory is checked for each candidate file name in order; the first
//! name that exists is that directory's file. Then:
//!
//! - [`SearchMode::Merge`] returns every directory's file in priority order,
//! - [`SearchMode::FirstMatch`] returns only the file of the highest-priority
//!   directory that has one.
//!
//! Missing files are skipped. Only real I/O errors (permissions, ...) and
//! syntax errors propagate.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use crate::error::ArgshapeError;
use crate::types::{Boundary, ConfigFormat, SearchMode, SearchPath};

/// One config file read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub content: String,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            format: ConfigFormat::from_path(&path),
            path,
            content: content.into(),
        }
    }

    /// Parse the content into a table according to its format.
    pub fn parse(&self) -> Result<Table, ArgshapeError> {
        match self.format {
            ConfigFormat::Toml => toml::from_str(&self.content).map_err(|e| self.parse_error(e)),
            ConfigFormat::Json => {
                let json: serde_json::Value =
                    serde_json::from_str(&self.content).map_err(|e| self.parse_error(e))?;
                match json_to_toml(json) {
                    Some(Value::Table(table)) => Ok(table),
                    _ => Err(self.parse_error("top-level value must be an object")),
                }
            }
        }
    }

    fn parse_error(&self, reason: impl ToString) -> ArgshapeError {
        ArgshapeError::ParseError {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// JSON to TOML. `null` has no TOML counterpart: null object members and
/// array items are dropped, a top-level null yields `None`.
fn json_to_toml(json: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;
    match json {
        Json::Null => None,
        Json::Bool(b) => Some(Value::Boolean(b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        Json::String(s) => Some(Value::String(s)),
        Json::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(json_to_toml).collect(),
        )),
        Json::Object(members) => Some(Value::Table(
            members
                .into_iter()
                .filter_map(|(k, v)| json_to_toml(v).map(|v| (k, v)))
                .collect(),
        )),
    }
}

/// Resolve a single-directory [`SearchPath`] to a concrete path.
///
/// `app_name` names the platform config directory (e.g. `~/.config/{app_name}/`
/// on Linux). Returns `None` when the directory cannot be determined, and for
/// [`SearchPath::Ancestors`], which expands to many directories; see
/// [`expand_ancestors`].
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
        SearchPath::Ancestors(_) => None,
    }
}

/// Directories from the working directory up to `boundary`, shallowest first.
pub fn expand_ancestors(boundary: &Boundary) -> Vec<PathBuf> {
    let Ok(cwd) = std::env::current_dir() else {
        return vec![];
    };
    expand_ancestors_from(&cwd, boundary)
}

/// Like [`expand_ancestors`], starting from `start` instead of the working
/// directory. A marker that is never found means walking to the root.
pub fn expand_ancestors_from(start: &Path, boundary: &Boundary) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in start.ancestors() {
        dirs.push(dir.to_path_buf());
        if let Boundary::Marker(name) = boundary
            && dir.join(name).exists()
        {
            break;
        }
    }
    dirs.reverse();
    dirs
}

/// Expand all search paths into a priority-ascending directory list.
pub fn expand_search_paths(search_paths: &[SearchPath], app_name: &str) -> Vec<PathBuf> {
    expand_search_paths_from(search_paths, app_name, None)
}

/// Like [`expand_search_paths`] with an explicit start directory for
/// `Ancestors` entries.
pub fn expand_search_paths_from(
    search_paths: &[SearchPath],
    app_name: &str,
    ancestors_start: Option<&Path>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for sp in search_paths {
        match sp {
            SearchPath::Ancestors(boundary) => match ancestors_start {
                Some(start) => dirs.extend(expand_ancestors_from(start, boundary)),
                None => dirs.extend(expand_ancestors(boundary)),
            },
            other => dirs.extend(resolve_search_path(other, app_name)),
        }
    }
    dirs
}

/// Find and read config files, respecting [`SearchMode`].
pub fn load_config_files(
    search_paths: &[SearchPath],
    file_names: &[String],
    app_name: &str,
    mode: SearchMode,
) -> Result<Vec<ConfigSource>, ArgshapeError> {
    let dirs = expand_search_paths(search_paths, app_name);
    debug!(dirs = dirs.len(), ?file_names, ?mode, "searching for config files");
    let found = match mode {
        SearchMode::Merge => load_all(&dirs, file_names)?,
        SearchMode::FirstMatch => load_first_match(&dirs, file_names)?.into_iter().collect(),
    };
    for source in &found {
        debug!(path = %source.path.display(), "found config file");
    }
    Ok(found)
}

/// Read the first existing candidate in `dir`.
fn read_first_in(dir: &Path, file_names: &[String]) -> Result<Option<ConfigSource>, ArgshapeError> {
    for name in file_names {
        let path = dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => return Ok(Some(ConfigSource::new(path, content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(ArgshapeError::IoError { path, source: e }),
        }
    }
    Ok(None)
}

fn load_all(dirs: &[PathBuf], file_names: &[String]) -> Result<Vec<ConfigSource>, ArgshapeError> {
    let mut found = Vec::new();
    for dir in dirs {
        found.extend(read_first_in(dir, file_names)?);
    }
    Ok(found)
}

fn load_first_match(
    dirs: &[PathBuf],
    file_names: &[String],
) -> Result<Option<ConfigSource>, ArgshapeError> {
    for dir in dirs.iter().rev() {
        if let Some(source) = read_first_in(dir, file_names)? {
            return Ok(Some(source));
        }
    }
    Ok(None)
}
