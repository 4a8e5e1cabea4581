//! Layer resolution pipeline.
//!
//! Operates on pre-loaded data ([`ResolveInput`]) with no I/O, so the whole
//! pipeline is testable with synthetic inputs. Steps:
//!
//! 1. Parse each file and, in strict mode, reject keys the schema lacks
//! 2. Deep-merge files (later overrides earlier)
//! 3. Build the env layer from `PREFIX__*` variables
//! 4. [`finalize`]: merge the argv layer on top and validate

use std::path::PathBuf;

use toml::Table;
use tracing::debug;

use crate::env;
use crate::error::ArgshapeError;
use crate::file::ConfigSource;
use crate::merge::{fill_missing, merge_into, merge_layers};
use crate::schema::Schema;
use crate::validate;

/// All pre-loaded data needed to resolve. No I/O happens here.
pub struct ResolveInput {
    /// Files in precedence order: first = lowest priority, last = highest.
    pub files: Vec<ConfigSource>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix (e.g. `"MYAPP"`). `None` means env disabled.
    pub env_prefix: Option<String>,
    /// Whether to reject unknown keys in config files.
    pub strict: bool,
}

/// The file and environment layers, kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layers {
    /// Paths of the files that contributed, lowest priority first.
    pub sources: Vec<PathBuf>,
    pub files: Table,
    pub env: Table,
}

impl Layers {
    /// Files overlaid by environment.
    pub fn combined(&self) -> Table {
        merge_layers([self.files.clone(), self.env.clone()])
    }
}

/// Parse, check and merge the file layers and build the env layer.
pub fn resolve_layers(input: ResolveInput, schema: &Schema) -> Result<Layers, ArgshapeError> {
    let mut layers = Layers::default();
    for source in &input.files {
        let table = source.parse()?;
        if input.strict {
            validate::validate_unknown_keys(source, &table, schema)?;
        }
        merge_into(&mut layers.files, table);
        layers.sources.push(source.path.clone());
    }

    if let Some(prefix) = &input.env_prefix {
        layers.env = env::env_to_table(prefix, input.env_vars, schema);
    }

    debug!(
        files = layers.sources.len(),
        env_keys = layers.env.len(),
        "resolved config layers"
    );
    Ok(layers)
}

/// Overlay `args` on `base`, then validate against `schema`.
///
/// Validation fills defaults and strips keys the schema does not declare;
/// those stripped keys (middleware output, lenient-mode extras) are put back
/// untouched afterwards.
pub fn finalize(schema: &Schema, base: Table, args: Table) -> Result<Table, ArgshapeError> {
    let merged = merge_layers([base, args]);
    let mut validated = schema.validate_table(&merged)?;
    fill_missing(&mut validated, &merged);
    Ok(validated)
}
