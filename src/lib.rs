//! Schema-driven command-line arguments and config files.
//!
//! Describe your arguments once as a [`Schema`]: booleans, strings, numbers,
//! enums, arrays, nested objects. argshape turns that description into clap
//! flags, positionals and subcommands, discovers and merges config files and
//! `PREFIX__*` environment variables beneath them, and validates the result
//! against the same schema.
//!
//! ```ignore
//! let schema = Schema::object(
//!     Shape::new()
//!         .field("host", Schema::string().describe("Bind address"))
//!         .field("port", Schema::number().default(8080))
//!         .field("verbose", Schema::boolean().alias("v")?.optional()),
//! );
//!
//! let resolved = Argshape::builder(schema)
//!     .app_name("myapp")
//!     .parse()?;
//! ```
//!
//! # Schema to options
//!
//! Every field of an object schema becomes one [`OptionDescriptor`]. The
//! descriptor's `type` is inferred from the schema: `boolean`, `string` or
//! `number`, with arrays setting `array` and enums contributing `choices`.
//! [`Schema::to_options`] produces the whole [`OptionRecord`] at once.
//!
//! A field is demanded unless it is wrapped in `.optional()`. A field with a
//! `.default(...)` stays demanded in its descriptor; the parser only requires
//! a value on the command line when neither a default nor a config value
//! can satisfy it.
//!
//! Option metadata (aliases, `global`, `hidden`, `count`, `nargs`,
//! `normalize`, group headings and deprecation) is attached with the fluent
//! methods from [`meta`]. Each returns an [`OptionNode`] carrying the
//! accumulated [`OptionMeta`], so calls chain:
//!
//! ```ignore
//! Schema::number().count()?.alias("v").describe("Verbosity")
//! ```
//!
//! # Capabilities
//!
//! Which schema kinds accept option metadata, and which can become commands,
//! is the [`CapabilityRegistry`]. The [standard](capability::standard)
//! registry gives the option capability to booleans, strings, numbers, enums,
//! arrays and already-decorated option nodes, and the command capability to
//! objects. `Optional` and `Default` wrappers have no capability of their
//! own: translation looks through them to the kind they wrap. A builder can
//! be handed a different registry; it applies only to that builder.
//!
//! # Commands
//!
//! An object schema becomes a [`Command`] with [`Schema::command`]. Commands
//! take positionals, middlewares (run over the parsed arguments in order)
//! and a handler (run once the arguments have validated).
//!
//! # Layer precedence
//!
//! ```text
//! Schema defaults       .default(...)
//!        ↑ overridden by
//! Config files          search paths in order, later paths win
//!        ↑ overridden by
//! Environment vars      PREFIX__KEY
//!        ↑ overridden by
//! Command line          --key value
//! ```
//!
//! Nested objects and records are config-only: they come from files and the
//! environment but get no flags.
//!
//! # Config discovery
//!
//! [`search_paths()`](ArgshapeBuilder::search_paths) accepts [`SearchPath`]
//! variants in **priority-ascending** order (last = highest).
//! [`search_mode()`](ArgshapeBuilder::search_mode) either merges every file
//! found ([`Merge`](SearchMode::Merge)) or keeps the single highest-priority
//! one ([`FirstMatch`](SearchMode::FirstMatch)). Files ending in `.json` are
//! read as JSON; everything else as TOML.
//!
//! # Strict mode
//!
//! Strict mode is **on by default**. A config file key the schema does not
//! declare fails loading with the file path, key name and line number:
//!
//! ```text
//! Unknown key 'typo_key' in /home/user/.config/myapp/myapp.toml (line 5)
//! ```
//!
//! # Error handling
//!
//! All fallible operations return [`ArgshapeError`]. See the [`error`]
//! module for the full set.

pub mod capability;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod meta;
pub mod parser;
pub mod record;
pub mod schema;
pub mod types;

mod builder;
mod env;
mod file;
pub(crate) mod merge;
mod resolve;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Argshape, ArgshapeBuilder, LoadedConfig, Resolved};
pub use capability::{Capability, CapabilityRegistry};
pub use command::{Command, CommandConfig, CommandNames, CommandRegistration, handler, middleware};
pub use descriptor::{OptionDescriptor, OptionType, Translator, infer_type};
pub use error::ArgshapeError;
pub use meta::{Aliases, Deprecated, OptionMeta, OptionNode};
pub use parser::{Parsed, ParserBuilder};
pub use record::OptionRecord;
pub use schema::{Issue, Kind, Node, Schema, Shape, ValidationErrors};
pub use types::{Boundary, ConfigFormat, SearchMode, SearchPath};
