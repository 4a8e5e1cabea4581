//! Subcommands described by schemas.
//!
//! A [`Command`] moves through four stages:
//!
//! - unnamed: promoted from an object schema with [`Command::from_schema`],
//! - named: [`Command::new`], [`Command::from_config`], [`Schema::command`],
//!   or a later [`Command::command`] call,
//! - configured: positionals, middlewares, a handler and deprecation added,
//! - registered: fed into a [`ParserBuilder`] with [`Command::register`].
//!
//! Every stage transition returns a new `Command`. The options shape is
//! always forced optional: a command never hard-demands a flag.

use std::fmt;
use std::sync::Arc;

use toml::Table;
use tracing::debug;

use crate::capability::{self, Capability};
use crate::descriptor::{OptionDescriptor, Translator};
use crate::error::ArgshapeError;
use crate::meta::{Deprecated, OptionMeta};
use crate::parser::ParserBuilder;
use crate::record::OptionRecord;
use crate::schema::{Kind, Node, Schema, Shape};

/// Error type handlers may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Runs once the command's arguments are parsed, merged and validated.
pub type Handler = Arc<dyn Fn(&Table) -> Result<(), HandlerError> + Send + Sync>;

/// Runs before the handler and may rewrite the parsed arguments.
pub type Middleware = Arc<dyn Fn(&mut Table) + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Table) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(&mut Table) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn noop_handler() -> Handler {
    Arc::new(|_| Ok(()))
}

/// Primary command name followed by its aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNames(Vec<String>);

impl CommandNames {
    pub fn primary(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn aliases(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn all(&self) -> &[String] {
        &self.0
    }

    fn is_valid(&self) -> bool {
        !self.primary().is_empty()
    }
}

impl From<&str> for CommandNames {
    fn from(name: &str) -> Self {
        CommandNames(vec![name.to_string()])
    }
}

impl From<String> for CommandNames {
    fn from(name: String) -> Self {
        CommandNames(vec![name])
    }
}

impl From<Vec<&str>> for CommandNames {
    fn from(names: Vec<&str>) -> Self {
        CommandNames(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for CommandNames {
    fn from(names: Vec<String>) -> Self {
        CommandNames(names)
    }
}

impl<const N: usize> From<[&str; N]> for CommandNames {
    fn from(names: [&str; N]) -> Self {
        CommandNames(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Object-style command construction.
#[derive(Clone, Default)]
pub struct CommandConfig {
    pub command: Option<CommandNames>,
    pub description: Option<String>,
    pub handler: Option<Handler>,
    pub middlewares: Vec<Middleware>,
    pub deprecated: Option<Deprecated>,
}

impl CommandConfig {
    pub fn new(command: impl Into<CommandNames>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Table) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handler = Some(handler(f));
        self
    }

    pub fn middlewares(mut self, middlewares: impl IntoIterator<Item = Middleware>) -> Self {
        self.middlewares = middlewares.into_iter().collect();
        self
    }

    pub fn deprecated(mut self, deprecated: impl Into<Deprecated>) -> Self {
        self.deprecated = Some(deprecated.into());
        self
    }
}

impl fmt::Debug for CommandConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandConfig")
            .field("command", &self.command)
            .field("description", &self.description)
            .field("handler", &self.handler.is_some())
            .field("middlewares", &self.middlewares.len())
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

/// A positional parameter: name, schema and its own option metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Positional {
    pub name: String,
    pub schema: Schema,
    pub options: OptionMeta,
}

/// Single-valued kinds, seen through option decoration.
fn positional_eligible(schema: &Schema) -> bool {
    match schema.node() {
        Node::Option(node) => positional_eligible(node.inner_type()),
        _ => matches!(
            schema.kind(),
            Kind::Boolean
                | Kind::String
                | Kind::Number
                | Kind::Enum
                | Kind::Optional
                | Kind::Default
        ),
    }
}

/// One subcommand node.
#[derive(Clone)]
pub struct Command {
    names: Option<CommandNames>,
    description: String,
    shape: Shape,
    handler: Option<Handler>,
    middlewares: Vec<Middleware>,
    deprecated: Option<Deprecated>,
    positionals: Vec<Positional>,
}

impl Command {
    /// A named command with no options.
    pub fn new(names: impl Into<CommandNames>, description: impl Into<String>) -> Self {
        Self {
            names: Some(names.into()),
            description: description.into(),
            shape: Shape::new(),
            handler: None,
            middlewares: Vec::new(),
            deprecated: None,
            positionals: Vec::new(),
        }
    }

    /// Build from an options object. Fails without a non-empty `command`.
    pub fn from_config(config: CommandConfig) -> Result<Self, ArgshapeError> {
        Self::unnamed(Shape::new()).configure(config)
    }

    /// Promote an object schema into an unnamed command. Every field becomes
    /// optional; name it with [`command`](Self::command).
    pub fn from_schema(schema: &Schema) -> Result<Self, ArgshapeError> {
        capability::require(schema.kind(), Capability::Command, "command")?;
        let shape = schema
            .partial()
            .and_then(|partial| partial.shape().cloned())
            .unwrap_or_default();
        Ok(Self::unnamed(shape))
    }

    fn unnamed(shape: Shape) -> Self {
        Self {
            names: None,
            description: String::new(),
            shape,
            handler: None,
            middlewares: Vec::new(),
            deprecated: None,
            positionals: Vec::new(),
        }
    }

    fn configure(&self, config: CommandConfig) -> Result<Self, ArgshapeError> {
        let names = config
            .command
            .filter(CommandNames::is_valid)
            .ok_or_else(|| {
                ArgshapeError::InvalidArguments("a command needs a non-empty name".into())
            })?;
        let mut next = self.clone();
        next.names = Some(names);
        next.description = config.description.unwrap_or_default();
        if config.handler.is_some() {
            next.handler = config.handler;
        }
        if !config.middlewares.is_empty() {
            next.middlewares = config.middlewares;
        }
        if config.deprecated.is_some() {
            next.deprecated = config.deprecated;
        }
        Ok(next)
    }

    /// Rename. Everything else carries over; the latest name wins.
    pub fn command(&self, names: impl Into<CommandNames>, description: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.names = Some(names.into());
        next.description = description.into();
        next
    }

    /// Rename from an options object.
    pub fn command_with(&self, config: CommandConfig) -> Result<Self, ArgshapeError> {
        self.configure(config)
    }

    pub fn handler<F>(&self, f: F) -> Self
    where
        F: Fn(&Table) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut next = self.clone();
        next.handler = Some(handler(f));
        next
    }

    /// Replace the middleware list.
    pub fn middlewares(&self, middlewares: impl IntoIterator<Item = Middleware>) -> Self {
        let mut next = self.clone();
        next.middlewares = middlewares.into_iter().collect();
        next
    }

    pub fn deprecated(&self, deprecated: impl Into<Deprecated>) -> Self {
        let mut next = self.clone();
        next.deprecated = Some(deprecated.into());
        next
    }

    /// Append a positional. Slot order follows call order.
    pub fn positional(
        &self,
        name: impl Into<String>,
        schema: &Schema,
        options: OptionMeta,
    ) -> Result<Self, ArgshapeError> {
        if self.names.is_none() {
            return Err(ArgshapeError::InvalidArguments(
                "positional() needs a named command; call command() first".into(),
            ));
        }
        if !positional_eligible(schema) {
            return Err(ArgshapeError::InvalidArguments(format!(
                "a {} schema cannot be a positional",
                schema.kind()
            )));
        }
        let name = name.into();
        if self.positionals.iter().any(|p| p.name == name) {
            return Err(ArgshapeError::InvalidArguments(format!(
                "positional '{name}' is already declared"
            )));
        }
        let mut next = self.clone();
        next.positionals.push(Positional {
            name,
            schema: schema.clone(),
            options,
        });
        Ok(next)
    }

    pub fn names(&self) -> Option<&CommandNames> {
        self.names.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The forced-optional options shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn positionals(&self) -> &[Positional] {
        &self.positionals
    }

    /// Option record of the command's shape, using the standard registry.
    pub fn to_options(&self) -> Result<OptionRecord, ArgshapeError> {
        Translator::default().options(&Schema::object(self.shape.clone()))
    }

    /// Translate everything the parser builder needs for this command.
    pub fn registration(
        &self,
        translator: &Translator<'_>,
    ) -> Result<CommandRegistration, ArgshapeError> {
        let names = self.names.clone().ok_or_else(|| {
            ArgshapeError::InvalidArguments("cannot register an unnamed command".into())
        })?;
        // A positional owns its name; the same-named field gets no flag.
        let flags: Shape = self
            .shape
            .iter()
            .filter(|(name, _)| !self.positionals.iter().any(|p| p.name == *name))
            .map(|(name, field)| (name, field.clone()))
            .collect();
        let options = translator.options(&Schema::object(flags))?;
        let positionals = self
            .positionals
            .iter()
            .map(|p| Ok((p.name.clone(), translator.positional(&p.schema, &p.options)?)))
            .collect::<Result<Vec<_>, ArgshapeError>>()?;

        let mut validation = self.shape.clone();
        for p in &self.positionals {
            validation.insert(p.name.clone(), p.schema.clone());
        }

        Ok(CommandRegistration {
            names,
            description: self.description.clone(),
            options,
            positionals,
            handler: self.handler.clone().unwrap_or_else(noop_handler),
            middlewares: self.middlewares.clone(),
            deprecated: self.deprecated.clone(),
            validation,
        })
    }

    /// Register on `builder`, translating with the builder's registry.
    pub fn register(&self, builder: ParserBuilder) -> Result<ParserBuilder, ArgshapeError> {
        let registration = self.registration(&builder.translator())?;
        debug!(
            command = registration.name(),
            options = registration.options.len(),
            positionals = registration.positionals.len(),
            "registering command"
        );
        Ok(builder.with_command(registration))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("names", &self.names)
            .field("description", &self.description)
            .field("shape", &self.shape)
            .field("handler", &self.handler.is_some())
            .field("middlewares", &self.middlewares.len())
            .field("deprecated", &self.deprecated)
            .field("positionals", &self.positionals)
            .finish()
    }
}

/// Command promotion on object schemas.
impl Schema {
    pub fn command(
        &self,
        names: impl Into<CommandNames>,
        description: impl Into<String>,
    ) -> Result<Command, ArgshapeError> {
        Ok(Command::from_schema(self)?.command(names, description))
    }

    pub fn command_with(&self, config: CommandConfig) -> Result<Command, ArgshapeError> {
        Command::from_schema(self)?.configure(config)
    }
}

/// A fully translated command, as stored by the parser builder.
#[derive(Clone)]
pub struct CommandRegistration {
    pub names: CommandNames,
    pub description: String,
    pub options: OptionRecord,
    pub positionals: Vec<(String, OptionDescriptor)>,
    pub handler: Handler,
    pub middlewares: Vec<Middleware>,
    pub deprecated: Option<Deprecated>,
    /// Options shape plus positionals, for validating merged arguments.
    pub validation: Shape,
}

impl CommandRegistration {
    pub fn name(&self) -> &str {
        self.names.primary()
    }

    pub fn positional_names(&self) -> impl Iterator<Item = &str> {
        self.positionals.iter().map(|(n, _)| n.as_str())
    }
}

impl fmt::Debug for CommandRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistration")
            .field("names", &self.names)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("positionals", &self.positionals)
            .field("middlewares", &self.middlewares.len())
            .field("deprecated", &self.deprecated)
            .finish()
    }
}
