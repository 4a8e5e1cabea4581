use std::path::PathBuf;

use thiserror::Error;

use crate::command::HandlerError;
use crate::schema::{Kind, ValidationErrors};

#[derive(Debug, Error)]
pub enum ArgshapeError {
    #[error("Unsupported method '{method}' on {kind} schema")]
    UnsupportedMethod { method: &'static str, kind: Kind },

    #[error("Unsupported type: cannot derive a CLI option from a {kind} schema")]
    UnsupportedType { kind: Kind },

    #[error("Expected an object schema, got {kind}")]
    NotAnObject { kind: Kind },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<ArgshapeError>),

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("Handler for command '{command}' failed: {source}")]
    Handler {
        command: String,
        source: HandlerError,
    },

    #[error("Failed to convert resolved arguments: {0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("App name is required; call .app_name() on the builder")]
    AppNameRequired,
}
