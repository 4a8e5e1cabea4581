//! Strict-mode validation: detect unknown keys in config files.
//!
//! Keys are checked against the object shape of the schema. `Record`, `Any`
//! and `Unknown` nodes accept arbitrary keys below them. Each unknown key is
//! reported with its file path and best-effort line number.

use toml::Table;

use crate::error::ArgshapeError;
use crate::file::ConfigSource;
use crate::schema::{Node, Schema};
use crate::types::ConfigFormat;

/// Dotted paths of every key in `table` that `schema` does not declare.
pub fn unknown_keys(table: &Table, schema: &Schema) -> Vec<String> {
    let mut found = Vec::new();
    collect_unknown(table, schema, "", &mut found);
    found
}

/// The node that decides which keys are allowed below a field.
fn structural(schema: &Schema) -> &Schema {
    match schema.node() {
        Node::Optional(inner) | Node::Default { inner, .. } => structural(inner),
        Node::Option(option) => structural(option.inner_type()),
        _ => schema,
    }
}

fn collect_unknown(table: &Table, schema: &Schema, prefix: &str, found: &mut Vec<String>) {
    let Some(shape) = structural(schema).shape() else {
        return;
    };
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match (shape.get(key), value.as_table()) {
            (None, _) => found.push(path),
            (Some(field), Some(sub)) => collect_unknown(sub, field, &path, found),
            (Some(_), None) => {}
        }
    }
}

/// Fail with [`ArgshapeError::UnknownKeys`] if `table`, parsed from
/// `source`, holds keys unknown to `schema`.
pub fn validate_unknown_keys(
    source: &ConfigSource,
    table: &Table,
    schema: &Schema,
) -> Result<(), ArgshapeError> {
    let unknown = unknown_keys(table, schema);
    if unknown.is_empty() {
        return Ok(());
    }

    let errors = unknown
        .into_iter()
        .map(|key| {
            let line = match source.format {
                ConfigFormat::Toml => find_key_line(&source.content, &key),
                ConfigFormat::Json => find_json_key_line(&source.content, &key),
            };
            ArgshapeError::UnknownKey {
                key,
                path: source.path.clone(),
                line,
            }
        })
        .collect();
    Err(ArgshapeError::UnknownKeys(errors))
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// For a dotted key like `"database.typo"`, tracks the current `[section]`
/// header while scanning and only matches the leaf key inside the right
/// section. Quoted keys and inline tables are not handled. Returns 0 if the
/// key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (section.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), dotted_key),
    };

    let mut current: Vec<String> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_section =
            section.len() == current.len() && section.iter().zip(&current).all(|(a, b)| a == b);
        if in_section
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

/// Find the 1-indexed line of the first `"leaf":` member in JSON content.
/// Returns 0 if not found.
fn find_json_key_line(content: &str, dotted_key: &str) -> usize {
    let leaf = dotted_key.rsplit('.').next().unwrap_or(dotted_key);
    let needle = format!("\"{leaf}\"");
    content
        .lines()
        .position(|line| {
            line.find(&needle)
                .is_some_and(|at| line[at + needle.len()..].trim_start().starts_with(':'))
        })
        .map_or(0, |i| i + 1)
}
