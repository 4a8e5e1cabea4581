//! Parser builder backed by clap.
//!
//! [`ParserBuilder`] collects option records, positionals and command
//! registrations as plain data and only turns them into a [`clap::Command`]
//! when asked to. Parsing yields a flat [`toml::Table`] holding exactly the
//! values given on the command line, layered over descriptor defaults and
//! any table supplied through [`ParserBuilder::with_defaults`].

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, builder::PossibleValuesParser, value_parser};
use toml::{Table, Value};
use tracing::debug;

use crate::capability::{self, CapabilityRegistry};
use crate::command::CommandRegistration;
use crate::descriptor::{OptionDescriptor, OptionType, Translator};
use crate::env::parse_number;
use crate::error::ArgshapeError;
use crate::record::OptionRecord;

/// Result of parsing argv.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Primary name of the matched subcommand, if any.
    pub command: Option<String>,
    pub args: Table,
}

/// Accumulates parser configuration and builds a clap command from it.
#[derive(Debug, Clone)]
pub struct ParserBuilder {
    name: String,
    about: Option<String>,
    version: Option<String>,
    registry: CapabilityRegistry,
    options: OptionRecord,
    positionals: Vec<(String, OptionDescriptor)>,
    commands: Vec<CommandRegistration>,
    defaults: Table,
}

impl ParserBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            version: None,
            registry: capability::standard().clone(),
            options: OptionRecord::new(),
            positionals: Vec::new(),
            commands: Vec::new(),
            defaults: Table::new(),
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Translate commands registered from now on with `registry`.
    pub fn with_registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn translator(&self) -> Translator<'_> {
        Translator::new(&self.registry)
    }

    /// Add every option in `record`, replacing same-named ones.
    pub fn with_options(mut self, record: &OptionRecord) -> Self {
        for (name, descriptor) in record.iter() {
            self.options.insert(name, descriptor.clone());
        }
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, descriptor: OptionDescriptor) -> Self {
        self.options.insert(name, descriptor);
        self
    }

    /// Append a root positional. Slot order follows call order.
    pub fn with_positional(mut self, name: impl Into<String>, descriptor: OptionDescriptor) -> Self {
        self.positionals.push((name.into(), descriptor));
        self
    }

    /// Add a command, replacing one with the same primary name.
    pub fn with_command(mut self, registration: CommandRegistration) -> Self {
        match self
            .commands
            .iter_mut()
            .find(|c| c.name() == registration.name())
        {
            Some(slot) => *slot = registration,
            None => self.commands.push(registration),
        }
        self
    }

    /// Values used for keys absent from argv. A demanded option with a
    /// default is not required on the command line.
    pub fn with_defaults(mut self, defaults: &Table) -> Self {
        for (key, value) in defaults {
            self.defaults.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn options(&self) -> &OptionRecord {
        &self.options
    }

    pub fn commands(&self) -> &[CommandRegistration] {
        &self.commands
    }

    /// Registration whose primary name is `name`.
    pub fn registration(&self, name: &str) -> Option<&CommandRegistration> {
        self.commands.iter().find(|c| c.name() == name)
    }

    pub fn build_command(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.name.clone());
        if let Some(about) = &self.about {
            cmd = cmd.about(about.clone());
        }
        if let Some(version) = &self.version {
            cmd = cmd.version(version.clone());
        }
        for (name, descriptor) in self.options.iter() {
            cmd = cmd.arg(self.build_arg(name, descriptor));
        }
        for (index, (name, descriptor)) in self.positionals.iter().enumerate() {
            cmd = cmd.arg(self.build_positional(name, descriptor, index + 1));
        }
        for registration in &self.commands {
            cmd = cmd.subcommand(self.build_subcommand(registration));
        }
        cmd
    }

    fn build_subcommand(&self, registration: &CommandRegistration) -> clap::Command {
        let mut about = registration.description.clone();
        if let Some(deprecated) = &registration.deprecated
            && deprecated.is_deprecated()
        {
            about = with_suffix(about, deprecation_note(deprecated.message()));
        }
        let mut sub = clap::Command::new(registration.name().to_string()).about(about);
        for alias in registration.names.aliases() {
            sub = sub.visible_alias(alias.clone());
        }
        for (name, descriptor) in registration.options.iter() {
            sub = sub.arg(self.build_arg(name, descriptor));
        }
        for (index, (name, descriptor)) in registration.positionals.iter().enumerate() {
            sub = sub.arg(self.build_positional(name, descriptor, index + 1));
        }
        sub
    }

    fn is_required(&self, name: &str, descriptor: &OptionDescriptor) -> bool {
        descriptor.demand_option
            && descriptor.default.is_none()
            && !self.defaults.contains_key(name)
            && !descriptor.is_count()
    }

    fn build_arg(&self, name: &str, descriptor: &OptionDescriptor) -> Arg {
        let mut arg = Arg::new(name.to_string()).long(name.to_string());

        let nargs = descriptor.meta.nargs;
        arg = if descriptor.is_count() {
            arg.action(ArgAction::Count)
        } else if descriptor.option_type == OptionType::Boolean
            && !descriptor.array
            && nargs.is_none()
        {
            arg.action(ArgAction::SetTrue)
        } else if descriptor.array {
            with_value_parser(arg.action(ArgAction::Append), descriptor)
                .num_args(nargs.map_or(1.., |n| n..))
        } else {
            let arg = with_value_parser(arg.action(ArgAction::Set), descriptor);
            match nargs {
                Some(n) => arg.num_args(n),
                None => arg,
            }
        };

        let mut shorts = Vec::new();
        for alias in descriptor.aliases() {
            let mut chars = alias.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => shorts.push(c),
                _ => arg = arg.visible_alias(alias.clone()),
            }
        }
        if let Some((first, rest)) = shorts.split_first() {
            arg = arg.short(*first);
            for c in rest {
                arg = arg.visible_short_alias(*c);
            }
        }

        if descriptor.is_hidden() {
            arg = arg.hide(true);
        }
        if descriptor.is_global() {
            arg = arg.global(true);
        }
        if let Some(group) = &descriptor.meta.group {
            arg = arg.help_heading(group.clone());
        }
        if let Some(help) = help_text(descriptor) {
            arg = arg.help(help);
        }
        arg.required(self.is_required(name, descriptor))
    }

    fn build_positional(&self, name: &str, descriptor: &OptionDescriptor, index: usize) -> Arg {
        let mut arg = Arg::new(name.to_string()).index(index);
        arg = with_value_parser(arg.action(ArgAction::Set), descriptor);
        if let Some(help) = help_text(descriptor) {
            arg = arg.help(help);
        }
        arg.required(self.is_required(name, descriptor))
    }

    /// Parse `argv` (program name first) into a flat table.
    pub fn parse_from<I, T>(&self, argv: I) -> Result<Parsed, ArgshapeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.build_command().try_get_matches_from(argv)?;

        let mut args = Table::new();
        let mut command = None;
        let mut scopes: Vec<(&str, &OptionDescriptor)> = self.options.iter().collect();
        scopes.extend(self.positionals.iter().map(|(n, d)| (n.as_str(), d)));
        fill_defaults(&mut args, &scopes, &self.defaults);
        extract(&matches, &scopes, &mut args)?;

        if let Some((name, sub_matches)) = matches.subcommand()
            && let Some(registration) = self.registration(name)
        {
            let mut sub_scopes: Vec<(&str, &OptionDescriptor)> =
                registration.options.iter().collect();
            sub_scopes.extend(registration.positionals.iter().map(|(n, d)| (n.as_str(), d)));
            fill_defaults(&mut args, &sub_scopes, &self.defaults);
            extract(sub_matches, &sub_scopes, &mut args)?;

            let globals: Vec<(&str, &OptionDescriptor)> = self
                .options
                .iter()
                .filter(|(_, d)| d.is_global())
                .collect();
            extract(sub_matches, &globals, &mut args)?;
            command = Some(registration.name().to_string());
        }

        debug!(command = ?command, keys = args.len(), "parsed command line");
        Ok(Parsed { command, args })
    }

    /// Run the matched command's middlewares, in order, over its arguments.
    pub fn apply_middlewares(&self, parsed: &mut Parsed) {
        let Some(registration) = parsed.command.as_deref().and_then(|n| self.registration(n))
        else {
            return;
        };
        for middleware in &registration.middlewares {
            middleware(&mut parsed.args);
        }
    }

    /// Run the matched command's handler. No command, no-op.
    pub fn run_handler(&self, parsed: &Parsed) -> Result<(), ArgshapeError> {
        let Some(name) = parsed.command.as_deref() else {
            return Ok(());
        };
        let Some(registration) = self.registration(name) else {
            return Ok(());
        };
        debug!(command = name, "dispatching command");
        (registration.handler)(&parsed.args).map_err(|source| ArgshapeError::Handler {
            command: name.to_string(),
            source,
        })
    }

    /// Middlewares, then handler.
    pub fn dispatch(&self, mut parsed: Parsed) -> Result<Parsed, ArgshapeError> {
        self.apply_middlewares(&mut parsed);
        self.run_handler(&parsed)?;
        Ok(parsed)
    }

    /// Parse and dispatch in one go.
    pub fn run_from<I, T>(&self, argv: I) -> Result<Parsed, ArgshapeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let parsed = self.parse_from(argv)?;
        self.dispatch(parsed)
    }
}

fn with_value_parser(arg: Arg, descriptor: &OptionDescriptor) -> Arg {
    match (&descriptor.choices, descriptor.option_type) {
        (Some(choices), _) => arg.value_parser(PossibleValuesParser::new(choices.clone())),
        (None, OptionType::Number) => arg.value_parser(number_arg),
        (None, OptionType::Boolean) => arg.value_parser(value_parser!(bool)),
        (None, OptionType::String) => arg.value_parser(value_parser!(String)),
    }
}

fn deprecation_note(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!("[deprecated: {msg}]"),
        None => "[deprecated]".to_string(),
    }
}

fn with_suffix(text: String, suffix: String) -> String {
    if text.is_empty() {
        suffix
    } else {
        format!("{text} {suffix}")
    }
}

fn help_text(descriptor: &OptionDescriptor) -> Option<String> {
    let mut text = descriptor.describe.clone().unwrap_or_default();
    if let Some(deprecated) = &descriptor.meta.deprecated
        && deprecated.is_deprecated()
    {
        text = with_suffix(text, deprecation_note(deprecated.message()));
    }
    if let Some(shown) = &descriptor.meta.default_description {
        text = with_suffix(text, format!("[default: {shown}]"));
    } else if let Some(default) = &descriptor.default {
        text = with_suffix(text, format!("[default: {}]", display_value(default)));
    }
    (!text.is_empty()).then_some(text)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn fill_defaults(args: &mut Table, scopes: &[(&str, &OptionDescriptor)], defaults: &Table) {
    for (name, descriptor) in scopes {
        if let Some(value) = defaults.get(*name) {
            args.insert(name.to_string(), value.clone());
        } else if let Some(value) = &descriptor.default {
            args.insert(name.to_string(), value.clone());
        }
    }
}

/// Copy every value given on the command line for `scopes` into `args`.
fn extract(
    matches: &ArgMatches,
    scopes: &[(&str, &OptionDescriptor)],
    args: &mut Table,
) -> Result<(), ArgshapeError> {
    for (name, descriptor) in scopes {
        if matches.value_source(name) != Some(ValueSource::CommandLine) {
            continue;
        }
        if let Some(value) = read_value(matches, name, descriptor)? {
            args.insert(name.to_string(), value);
        }
    }
    Ok(())
}

fn read_value(
    matches: &ArgMatches,
    name: &str,
    descriptor: &OptionDescriptor,
) -> Result<Option<Value>, ArgshapeError> {
    if descriptor.is_count() {
        return Ok(Some(Value::Integer(i64::from(matches.get_count(name)))));
    }
    let multiple = descriptor.array || descriptor.meta.nargs.is_some_and(|n| n > 1);
    if descriptor.option_type == OptionType::Boolean && !multiple && descriptor.meta.nargs.is_none()
    {
        // SetTrue flags only report a value when present.
        let flag = matches.try_get_one::<bool>(name).map_err(invalid)?;
        return Ok(flag.map(|b| Value::Boolean(*b)));
    }

    let values: Vec<Value> = match descriptor.option_type {
        OptionType::Number => matches
            .try_get_many::<Value>(name)
            .map_err(invalid)?
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        OptionType::Boolean => matches
            .try_get_many::<bool>(name)
            .map_err(invalid)?
            .map(|vals| vals.map(|b| Value::Boolean(*b)).collect())
            .unwrap_or_default(),
        OptionType::String => {
            let normalize = descriptor.is_normalized();
            matches
                .try_get_many::<String>(name)
                .map_err(invalid)?
                .map(|vals| {
                    vals.map(|s| {
                        if normalize {
                            Value::String(normalize_path(s))
                        } else {
                            Value::String(s.clone())
                        }
                    })
                    .collect()
                })
                .unwrap_or_default()
        }
    };

    if multiple {
        Ok(Some(Value::Array(values)))
    } else {
        Ok(values.into_iter().next())
    }
}

fn invalid(err: clap::parser::MatchesError) -> ArgshapeError {
    ArgshapeError::InvalidArguments(err.to_string())
}

fn number_arg(raw: &str) -> Result<Value, String> {
    parse_number(raw).ok_or_else(|| format!("'{raw}' is not a number"))
}

/// Lexical path normalization: drops `.` segments and folds `..` into the
/// preceding segment where one exists. Never touches the file system.
fn normalize_path(raw: &str) -> String {
    let mut out = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        ".".to_string()
    } else {
        out.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, middleware};
    use crate::fixtures::test::server_schema;
    use crate::meta::OptionMeta;
    use crate::schema::{Schema, Shape};
    use std::sync::{Arc, Mutex};

    fn server_parser() -> ParserBuilder {
        ParserBuilder::new("server").with_options(&server_schema().to_options().unwrap())
    }

    #[test]
    fn middleware_runs_before_handler_end_to_end() {
        let schema = Schema::object(Shape::new().field("bar", Schema::boolean()));
        let cmd = schema
            .command("foo", "bar")
            .unwrap()
            .middlewares([middleware(|args| {
                args.insert("butts".into(), Value::Integer(1));
            })]);
        let builder = cmd.register(ParserBuilder::new("app")).unwrap();
        let parsed = builder.run_from(["app", "foo"]).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("foo"));
        assert_eq!(parsed.args["butts"].as_integer(), Some(1));
        assert!(!parsed.args.contains_key("bar"));
    }

    #[test]
    fn handler_sees_middleware_output() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let builder = Command::new("go", "")
            .middlewares([middleware(|args| {
                args.insert("stage".into(), Value::String("mw".into()));
            })])
            .handler(move |args| {
                *sink.lock().unwrap() = args.get("stage").cloned();
                Ok(())
            })
            .register(ParserBuilder::new("app"))
            .unwrap();
        builder.run_from(["app", "go"]).unwrap();
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(Value::String("mw".into()))
        );
    }

    #[test]
    fn handler_error_names_command() {
        let builder = Command::new("fail", "")
            .handler(|_| Err("boom".into()))
            .register(ParserBuilder::new("app"))
            .unwrap();
        match builder.run_from(["app", "fail"]) {
            Err(ArgshapeError::Handler { command, source }) => {
                assert_eq!(command, "fail");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("Expected Handler error, got {other:?}"),
        }
    }

    #[test]
    fn demanded_option_is_required() {
        let err = server_parser().parse_from(["server"]).unwrap_err();
        assert!(matches!(err, ArgshapeError::Cli(_)));
    }

    #[test]
    fn defaults_relax_required_and_fill_values() {
        let mut defaults = Table::new();
        defaults.insert("host".into(), Value::String("example.org".into()));
        let parsed = server_parser()
            .with_defaults(&defaults)
            .parse_from(["server"])
            .unwrap();
        assert_eq!(parsed.args["host"].as_str(), Some("example.org"));
        assert_eq!(parsed.args["port"].as_integer(), Some(8080));
    }

    #[test]
    fn command_line_beats_defaults() {
        let mut defaults = Table::new();
        defaults.insert("host".into(), Value::String("example.org".into()));
        let parsed = server_parser()
            .with_defaults(&defaults)
            .parse_from(["server", "--host", "cli.example", "--port", "9000"])
            .unwrap();
        assert_eq!(parsed.args["host"].as_str(), Some("cli.example"));
        assert_eq!(parsed.args["port"].as_integer(), Some(9000));
    }

    #[test]
    fn converts_each_option_type() {
        let parsed = server_parser()
            .parse_from([
                "server", "--host", "h", "--verbose", "--tags", "a", "b", "--level", "debug",
            ])
            .unwrap();
        assert_eq!(parsed.args["verbose"].as_bool(), Some(true));
        let tags: Vec<&str> = parsed.args["tags"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(parsed.args["level"].as_str(), Some("debug"));
        assert!(parsed.command.is_none());
    }

    #[test]
    fn absent_flags_stay_absent() {
        let parsed = server_parser().parse_from(["server", "--host", "h"]).unwrap();
        assert!(!parsed.args.contains_key("verbose"));
        assert!(!parsed.args.contains_key("tags"));
    }

    #[test]
    fn fractional_numbers_stay_floats() {
        let record = Schema::object(Shape::new().field("ratio", Schema::number()))
            .to_options()
            .unwrap();
        let parsed = ParserBuilder::new("app")
            .with_options(&record)
            .parse_from(["app", "--ratio", "0.5"])
            .unwrap();
        assert_eq!(parsed.args["ratio"].as_float(), Some(0.5));
    }

    #[test]
    fn large_integers_keep_precision() {
        let record = Schema::object(Shape::new().field("id", Schema::number()))
            .to_options()
            .unwrap();
        let parser = ParserBuilder::new("app").with_options(&record);
        let parsed = parser
            .parse_from(["app", "--id", "9007199254740993"])
            .unwrap();
        assert_eq!(parsed.args["id"].as_integer(), Some(9_007_199_254_740_993));
        assert!(matches!(
            parser.parse_from(["app", "--id", "many"]),
            Err(ArgshapeError::Cli(_))
        ));
    }

    #[test]
    fn choices_are_enforced() {
        let err = server_parser()
            .parse_from(["server", "--host", "h", "--level", "loud"])
            .unwrap_err();
        assert!(matches!(err, ArgshapeError::Cli(_)));
    }

    #[test]
    fn aliases_map_to_short_and_long() {
        let verbose = Schema::boolean().alias(["v", "loud"]).unwrap().optional();
        let record = Schema::object(Shape::new().field("verbose", verbose))
            .to_options()
            .unwrap();
        let builder = ParserBuilder::new("app").with_options(&record);
        for argv in [["app", "-v"], ["app", "--loud"]] {
            let parsed = builder.parse_from(argv).unwrap();
            assert_eq!(parsed.args["verbose"].as_bool(), Some(true));
        }
    }

    #[test]
    fn count_option_counts_occurrences() {
        let verbosity = Schema::number().alias("v").unwrap().count().optional();
        let record = Schema::object(Shape::new().field("verbosity", verbosity))
            .to_options()
            .unwrap();
        let parsed = ParserBuilder::new("app")
            .with_options(&record)
            .parse_from(["app", "-vvv"])
            .unwrap();
        assert_eq!(parsed.args["verbosity"].as_integer(), Some(3));
    }

    #[test]
    fn nargs_takes_exact_value_count() {
        let point = Schema::number().nargs(2).unwrap().optional();
        let record = Schema::object(Shape::new().field("point", point))
            .to_options()
            .unwrap();
        let parsed = ParserBuilder::new("app")
            .with_options(&record)
            .parse_from(["app", "--point", "1", "2"])
            .unwrap();
        assert_eq!(
            parsed.args["point"],
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn normalize_cleans_paths() {
        let dir = Schema::string().normalize().unwrap().optional();
        let record = Schema::object(Shape::new().field("dir", dir))
            .to_options()
            .unwrap();
        let parsed = ParserBuilder::new("app")
            .with_options(&record)
            .parse_from(["app", "--dir", "a/./b/../c"])
            .unwrap();
        assert_eq!(parsed.args["dir"].as_str(), Some("a/c"));
        assert_eq!(normalize_path("../x/.."), "..");
        assert_eq!(normalize_path("/a/../.."), "/");
    }

    #[test]
    fn hidden_and_group_reach_clap() {
        let secret = Schema::string().hidden().unwrap().group("Advanced").optional();
        let record = Schema::object(Shape::new().field("secret", secret))
            .to_options()
            .unwrap();
        let cmd = ParserBuilder::new("app").with_options(&record).build_command();
        let arg = cmd.get_arguments().find(|a| a.get_id() == "secret").unwrap();
        assert!(arg.is_hide_set());
        assert_eq!(arg.get_help_heading(), Some("Advanced"));
    }

    #[test]
    fn help_mentions_deprecation_and_default() {
        let old = Schema::string()
            .describe("Old flag")
            .deprecated_with("use --new")
            .unwrap()
            .default("x");
        let record = Schema::object(Shape::new().field("old", old))
            .to_options()
            .unwrap();
        let cmd = ParserBuilder::new("app").with_options(&record).build_command();
        let arg = cmd.get_arguments().find(|a| a.get_id() == "old").unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert_eq!(help, "Old flag [deprecated: use --new] [default: x]");
        assert!(!arg.is_required_set());
    }

    #[test]
    fn positionals_fill_in_order() {
        let builder = Command::new("cp", "Copy")
            .positional("src", &Schema::string(), OptionMeta::new())
            .unwrap()
            .positional("dst", &Schema::string().optional(), OptionMeta::new())
            .unwrap()
            .register(ParserBuilder::new("app"))
            .unwrap();
        let parsed = builder.parse_from(["app", "cp", "one", "two"]).unwrap();
        assert_eq!(parsed.args["src"].as_str(), Some("one"));
        assert_eq!(parsed.args["dst"].as_str(), Some("two"));

        let partial = builder.parse_from(["app", "cp", "one"]).unwrap();
        assert!(!partial.args.contains_key("dst"));
        assert!(builder.parse_from(["app", "cp"]).is_err());
    }

    #[test]
    fn positional_takes_over_same_named_field() {
        let schema = Schema::object(
            Shape::new()
                .field("c", Schema::string())
                .field("b", Schema::string())
                .field("a", Schema::string()),
        );
        let builder = schema
            .command("copy", "")
            .unwrap()
            .positional("a", &Schema::string(), OptionMeta::new())
            .unwrap()
            .positional("b", &Schema::string(), OptionMeta::new())
            .unwrap()
            .register(ParserBuilder::new("app"))
            .unwrap();
        let parsed = builder.parse_from(["app", "copy", "x", "y", "--c", "z"]).unwrap();
        assert_eq!(parsed.args["a"].as_str(), Some("x"));
        assert_eq!(parsed.args["b"].as_str(), Some("y"));
        assert_eq!(parsed.args["c"].as_str(), Some("z"));
        assert!(builder.parse_from(["app", "copy", "x", "--a", "y"]).is_err());
    }

    #[test]
    fn command_aliases_resolve_to_primary_name() {
        let builder = Command::new(["remove", "rm"], "Remove")
            .register(ParserBuilder::new("app"))
            .unwrap();
        let parsed = builder.parse_from(["app", "rm"]).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("remove"));
    }

    #[test]
    fn global_option_is_read_after_subcommand() {
        let debug = Schema::boolean().global().unwrap().optional();
        let record = Schema::object(Shape::new().field("debug", debug))
            .to_options()
            .unwrap();
        let builder = Command::new("run", "")
            .register(ParserBuilder::new("app").with_options(&record))
            .unwrap();
        let parsed = builder.parse_from(["app", "run", "--debug"]).unwrap();
        assert_eq!(parsed.args["debug"].as_bool(), Some(true));
    }

    #[test]
    fn custom_registry_is_used_for_commands() {
        let builder = ParserBuilder::new("app").with_registry(CapabilityRegistry::new());
        let cmd = Schema::object(Shape::new().field("bar", Schema::boolean()))
            .command("foo", "")
            .unwrap();
        assert!(matches!(
            cmd.register(builder),
            Err(ArgshapeError::UnsupportedMethod { .. })
        ));
    }
}
