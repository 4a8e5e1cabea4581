use std::ffi::OsString;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::debug;

use crate::capability::{self, CapabilityRegistry};
use crate::command::Command;
use crate::descriptor::Translator;
use crate::error::ArgshapeError;
use crate::file::{self, ConfigSource};
use crate::parser::{Parsed, ParserBuilder};
use crate::resolve::{self, Layers, ResolveInput};
use crate::schema::{Kind, Node, Schema, Shape};
use crate::types::{SearchMode, SearchPath};

/// Entry point for binding a schema to config files and the command line.
pub struct Argshape;

impl Argshape {
    pub fn builder(schema: Schema) -> ArgshapeBuilder {
        ArgshapeBuilder::new(schema)
    }
}

/// A config file set found and validated by [`ArgshapeBuilder::load_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    /// The highest-priority file found.
    pub filepath: PathBuf,
    /// Every contributing file, lowest priority first.
    pub sources: Vec<PathBuf>,
    /// Merged file contents, validated against the schema with every field
    /// optional.
    pub config: Table,
}

/// The outcome of [`ArgshapeBuilder::parse_from`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Primary name of the command that ran, if any.
    pub command: Option<String>,
    /// Validated arguments: config files < environment < command line.
    pub args: Table,
    /// The highest-priority config file, if one was found.
    pub config_path: Option<PathBuf>,
}

impl Resolved {
    /// Convert the arguments into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ArgshapeError> {
        Ok(Value::Table(self.args.clone()).try_into()?)
    }
}

/// Builder tying one schema to config discovery, environment variables and
/// a clap parser.
///
/// - **Discovery**: [`search_paths()`](Self::search_paths) and
///   [`file_name()`](Self::file_name): where to look and what for.
/// - **Resolution**: [`search_mode()`](Self::search_mode): merge all or pick one.
/// - **Command line**: [`command()`](Self::command), [`registry()`](Self::registry).
pub struct ArgshapeBuilder {
    schema: Schema,
    app_name: Option<String>,
    file_names: Option<Vec<String>>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    env_prefix: Option<String>,
    env_enabled: bool,
    strict: bool,
    about: Option<String>,
    version: Option<String>,
    registry: Option<CapabilityRegistry>,
    commands: Vec<Command>,
}

impl ArgshapeBuilder {
    fn new(schema: Schema) -> Self {
        Self {
            schema,
            app_name: None,
            file_names: None,
            search_paths: None,
            search_mode: SearchMode::default(),
            env_prefix: None,
            env_enabled: true,
            strict: true,
            about: None,
            version: None,
            registry: None,
            commands: Vec::new(),
        }
    }

    /// Set the application name. This derives sensible defaults:
    /// - file names → `"{app_name}.toml"`, `"{app_name}.json"`
    /// - search paths → `[SearchPath::Platform]`
    /// - env prefix → `"{APP_NAME}"` (uppercased, `-` becomes `_`)
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Look for exactly this file name in every search directory.
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_names = Some(vec![name.to_string()]);
        self
    }

    /// Add a candidate file name. Within one directory, earlier names win.
    /// If no names have been set yet, starts from the defaults.
    pub fn add_file_name(mut self, name: &str) -> Self {
        let defaults = self.default_file_names();
        self.file_names.get_or_insert(defaults).push(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has
    /// the highest priority.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path. If no paths have been set yet, starts from the
    /// default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Override the environment variable prefix.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Translate with `registry` instead of the standard one.
    pub fn registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a subcommand.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    fn effective_app_name(&self) -> Result<&str, ArgshapeError> {
        self.app_name
            .as_deref()
            .ok_or(ArgshapeError::AppNameRequired)
    }

    fn default_file_names(&self) -> Vec<String> {
        match &self.app_name {
            Some(app) => vec![format!("{app}.toml"), format!("{app}.json")],
            None => Vec::new(),
        }
    }

    fn effective_file_names(&self) -> Result<Vec<String>, ArgshapeError> {
        if let Some(names) = &self.file_names {
            return Ok(names.clone());
        }
        self.effective_app_name()?;
        Ok(self.default_file_names())
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        if let Some(paths) = &self.search_paths {
            return paths.clone();
        }
        vec![SearchPath::Platform]
    }

    fn effective_env_prefix(&self) -> Result<Option<String>, ArgshapeError> {
        if !self.env_enabled {
            return Ok(None);
        }
        if let Some(prefix) = &self.env_prefix {
            return Ok(Some(prefix.clone()));
        }
        let app = self.effective_app_name()?;
        Ok(Some(app.to_uppercase().replace('-', "_")))
    }

    fn effective_registry(&self) -> CapabilityRegistry {
        self.registry
            .clone()
            .unwrap_or_else(|| capability::standard().clone())
    }

    fn build_input(&self) -> Result<ResolveInput, ArgshapeError> {
        let app_name = self.effective_app_name()?;
        let file_names = self.effective_file_names()?;
        let search_paths = self.effective_search_paths();
        let env_prefix = self.effective_env_prefix()?;

        let files: Vec<ConfigSource> =
            file::load_config_files(&search_paths, &file_names, app_name, self.search_mode)?;
        let env_vars = match env_prefix {
            Some(_) => std::env::vars().collect(),
            None => Vec::new(),
        };

        Ok(ResolveInput {
            files,
            env_vars,
            env_prefix,
            strict: self.strict,
        })
    }

    fn layers(&self) -> Result<Layers, ArgshapeError> {
        resolve::resolve_layers(self.build_input()?, &self.schema)
    }

    /// Find, merge and validate config files. `None` when no file exists.
    ///
    /// Fields are validated with every field optional, so a file may hold any
    /// subset of the schema.
    pub fn load_config(&self) -> Result<Option<LoadedConfig>, ArgshapeError> {
        let layers = self.layers()?;
        let Some(filepath) = layers.sources.last().cloned() else {
            return Ok(None);
        };
        let partial = self.schema.partial().ok_or(ArgshapeError::NotAnObject {
            kind: self.schema.kind(),
        })?;
        let config = partial.validate_table(&layers.files)?;
        Ok(Some(LoadedConfig {
            filepath,
            sources: layers.sources,
            config,
        }))
    }

    /// Resolve files and environment against the full schema, without a
    /// command line.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, ArgshapeError> {
        let layers = self.layers()?;
        let args = resolve::finalize(&self.schema, layers.combined(), Table::new())?;
        Ok(Value::Table(args).try_into()?)
    }

    /// The parser for this schema and its commands, without config defaults.
    pub fn parser(&self) -> Result<ParserBuilder, ArgshapeError> {
        self.parser_with_defaults(&Table::new())
    }

    fn parser_with_defaults(&self, defaults: &Table) -> Result<ParserBuilder, ArgshapeError> {
        let app_name = self.effective_app_name()?;
        let registry = self.effective_registry();
        let flags = flag_schema(&self.schema)?;
        let options = Translator::new(&registry).options(&flags)?;

        let mut parser = ParserBuilder::new(app_name)
            .with_registry(registry)
            .with_options(&options)
            .with_defaults(defaults);
        if let Some(about) = &self.about {
            parser = parser.about(about.clone());
        }
        if let Some(version) = &self.version {
            parser = parser.version(version.clone());
        }
        for command in &self.commands {
            parser = command.register(parser)?;
        }
        Ok(parser)
    }

    /// Load config, parse `argv` over it, run middlewares, validate, then run
    /// the matched command's handler.
    pub fn parse_from<I, T>(&self, argv: I) -> Result<Resolved, ArgshapeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let layers = self.layers()?;
        let base = layers.combined();
        let parser = self.parser_with_defaults(&base)?;
        let mut parsed = parser.parse_from(argv)?;
        parser.apply_middlewares(&mut parsed);

        let mut shape = self.schema.shape().cloned().unwrap_or_default();
        if let Some(registration) = parsed.command.as_deref().and_then(|n| parser.registration(n)) {
            shape.extend(&registration.validation);
        }
        let args = resolve::finalize(&Schema::object(shape), base, parsed.args)?;

        let parsed = Parsed {
            command: parsed.command,
            args,
        };
        parser.run_handler(&parsed)?;

        debug!(command = ?parsed.command, "resolved arguments");
        Ok(Resolved {
            command: parsed.command,
            args: parsed.args,
            config_path: layers.sources.last().cloned(),
        })
    }

    /// [`parse_from`](Self::parse_from) over the process arguments.
    pub fn parse(&self) -> Result<Resolved, ArgshapeError> {
        self.parse_from(std::env::args_os())
    }
}

/// Table-valued fields (`Object`, `Record`), stripped of wrappers.
fn is_section(schema: &Schema) -> bool {
    match schema.node() {
        Node::Optional(inner) | Node::Default { inner, .. } => is_section(inner),
        Node::Option(option) => is_section(option.inner_type()),
        _ => matches!(schema.kind(), Kind::Object | Kind::Record),
    }
}

/// The root fields exposed as flags: everything but config-only sections.
fn flag_schema(schema: &Schema) -> Result<Schema, ArgshapeError> {
    let shape = schema.shape().ok_or(ArgshapeError::NotAnObject {
        kind: schema.kind(),
    })?;
    let flags: Shape = shape
        .iter()
        .filter(|(_, field)| !is_section(field))
        .map(|(name, field)| (name, field.clone()))
        .collect();
    Ok(Schema::object(flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::middleware;
    use crate::fixtures::test::{AppConfig, app_schema};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn in_dir(dir: &TempDir) -> ArgshapeBuilder {
        Argshape::builder(app_schema())
            .app_name("test")
            .search_paths(vec![SearchPath::Path(dir.path().to_path_buf())])
            .no_env()
    }

    #[test]
    fn app_name_sets_defaults() {
        let builder = Argshape::builder(app_schema()).app_name("my-app");
        assert_eq!(
            builder.effective_file_names().unwrap(),
            vec!["my-app.toml".to_string(), "my-app.json".to_string()]
        );
        assert_eq!(
            builder.effective_env_prefix().unwrap(),
            Some("MY_APP".to_string())
        );
        assert_eq!(builder.effective_search_paths(), vec![SearchPath::Platform]);
    }

    #[test]
    fn file_names_replace_and_extend() {
        let single = Argshape::builder(app_schema())
            .app_name("app")
            .file_name(".apprc");
        assert_eq!(single.effective_file_names().unwrap(), vec![".apprc".to_string()]);

        let extended = Argshape::builder(app_schema())
            .app_name("app")
            .add_file_name(".apprc.toml");
        assert_eq!(extended.effective_file_names().unwrap().len(), 3);
    }

    #[test]
    fn env_prefix_override_and_disable() {
        let custom = Argshape::builder(app_schema())
            .app_name("myapp")
            .env_prefix("CUSTOM");
        assert_eq!(
            custom.effective_env_prefix().unwrap(),
            Some("CUSTOM".to_string())
        );
        let off = Argshape::builder(app_schema()).app_name("myapp").no_env();
        assert_eq!(off.effective_env_prefix().unwrap(), None);
    }

    #[test]
    fn add_search_path_appends_to_defaults() {
        let builder = Argshape::builder(app_schema())
            .app_name("myapp")
            .add_search_path(SearchPath::Cwd);
        assert_eq!(
            builder.effective_search_paths(),
            vec![SearchPath::Platform, SearchPath::Cwd]
        );
    }

    #[test]
    fn missing_app_name_errors() {
        let builder = Argshape::builder(app_schema());
        assert!(matches!(
            builder.load_config(),
            Err(ArgshapeError::AppNameRequired)
        ));
        assert!(matches!(builder.parser(), Err(ArgshapeError::AppNameRequired)));
    }

    #[test]
    fn load_config_none_without_files() {
        let dir = TempDir::new().unwrap();
        assert_eq!(in_dir(&dir).load_config().unwrap(), None);
    }

    #[test]
    fn load_config_returns_path_and_partial_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.toml"), "port = 3000\n").unwrap();

        let loaded = in_dir(&dir).load_config().unwrap().unwrap();
        assert_eq!(loaded.filepath, dir.path().join("test.toml"));
        assert_eq!(loaded.config["port"].as_integer(), Some(3000));
        // host is required by the schema but optional in a file
        assert!(!loaded.config.contains_key("host"));
    }

    #[test]
    fn load_config_validates_types() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.toml"), "port = \"high\"\n").unwrap();
        assert!(matches!(
            in_dir(&dir).load_config(),
            Err(ArgshapeError::Validation(_))
        ));
    }

    #[test]
    fn load_typed_config_from_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("test.toml"),
            "host = \"db.local\"\n[database]\nurl = \"pg://\"\n",
        )
        .unwrap();
        let config: AppConfig = in_dir(&dir).load().unwrap();
        assert_eq!(config.host, "db.local");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.url.as_deref(), Some("pg://"));
        assert_eq!(config.database.pool_size, 5);
    }

    #[test]
    fn first_match_uses_highest_priority_file_only() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("test.toml"), "port = 1000\nhost = \"low\"\n").unwrap();
        fs::write(dir2.path().join("test.toml"), "port = 2000\n").unwrap();

        let loaded = Argshape::builder(app_schema())
            .app_name("test")
            .search_paths(vec![
                SearchPath::Path(dir1.path().to_path_buf()),
                SearchPath::Path(dir2.path().to_path_buf()),
            ])
            .search_mode(SearchMode::FirstMatch)
            .no_env()
            .load_config()
            .unwrap()
            .unwrap();
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.config["port"].as_integer(), Some(2000));
        assert!(!loaded.config.contains_key("host"));
    }

    #[test]
    fn strict_rejects_unknown_key_lenient_allows() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.toml"), "typo = 1\nport = 3000\n").unwrap();
        assert!(in_dir(&dir).load_config().is_err());
        let loaded = in_dir(&dir).strict(false).load_config().unwrap().unwrap();
        assert_eq!(loaded.config["port"].as_integer(), Some(3000));
    }

    #[test]
    fn config_satisfies_required_flag() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.toml"), "host = \"from-file\"\n").unwrap();

        let resolved = in_dir(&dir).parse_from(["test"]).unwrap();
        assert_eq!(resolved.args["host"].as_str(), Some("from-file"));
        assert_eq!(resolved.args["port"].as_integer(), Some(8080));
        assert_eq!(resolved.config_path, Some(dir.path().join("test.toml")));
    }

    #[test]
    fn command_line_overrides_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("test.toml"),
            "host = \"from-file\"\nport = 1\n[database]\npool_size = 9\n",
        )
        .unwrap();

        let resolved = in_dir(&dir)
            .parse_from(["test", "--port", "2", "--verbose"])
            .unwrap();
        assert_eq!(resolved.args["host"].as_str(), Some("from-file"));
        assert_eq!(resolved.args["port"].as_integer(), Some(2));
        assert_eq!(resolved.args["verbose"].as_bool(), Some(true));
        assert_eq!(resolved.args["database"]["pool_size"].as_integer(), Some(9));

        let config: AppConfig = resolved.deserialize().unwrap();
        assert_eq!(config.port, 2);
    }

    #[test]
    fn missing_required_value_is_a_cli_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            in_dir(&dir).parse_from(["test"]),
            Err(ArgshapeError::Cli(_))
        ));
    }

    #[test]
    fn sections_are_not_flags() {
        let dir = TempDir::new().unwrap();
        let parser = in_dir(&dir).parser().unwrap();
        let names: Vec<&str> = parser.options().names().collect();
        assert_eq!(names, vec!["host", "port", "verbose", "tags", "level"]);
    }

    #[test]
    fn command_runs_with_validated_args() {
        let dir = TempDir::new().unwrap();
        let seen = Arc::new(Mutex::new(Table::new()));
        let sink = Arc::clone(&seen);

        let deploy = Schema::object(
            Shape::new()
                .field("dry_run", Schema::boolean())
                .field("replicas", Schema::number().default(1)),
        )
        .command("deploy", "Deploy the service")
        .unwrap()
        .positional("target", &Schema::enumeration(["staging", "prod"]), Default::default())
        .unwrap()
        .middlewares([middleware(|args| {
            args.insert("stamped".into(), Value::Boolean(true));
        })])
        .handler(move |args| {
            *sink.lock().unwrap() = args.clone();
            Ok(())
        });

        let resolved = in_dir(&dir)
            .command(deploy)
            .parse_from(["test", "--host", "h", "deploy", "prod", "--dry_run"])
            .unwrap();

        assert_eq!(resolved.command.as_deref(), Some("deploy"));
        let args = seen.lock().unwrap().clone();
        assert_eq!(args["target"].as_str(), Some("prod"));
        assert_eq!(args["dry_run"].as_bool(), Some(true));
        assert_eq!(args["replicas"].as_integer(), Some(1));
        assert_eq!(args["stamped"].as_bool(), Some(true));
        assert_eq!(args["host"].as_str(), Some("h"));
    }

    #[test]
    fn handler_not_run_when_validation_fails() {
        let dir = TempDir::new().unwrap();
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let cmd = Command::new("go", "")
            .middlewares([middleware(|args| {
                args.insert("port".into(), Value::String("bad".into()));
            })])
            .handler(move |_| {
                *flag.lock().unwrap() = true;
                Ok(())
            });
        let result = in_dir(&dir)
            .command(cmd)
            .parse_from(["test", "--host", "h", "go"]);
        assert!(matches!(result, Err(ArgshapeError::Validation(_))));
        assert!(!*ran.lock().unwrap());
    }

    #[test]
    fn custom_registry_reaches_root_options() {
        let dir = TempDir::new().unwrap();
        let result = in_dir(&dir).registry(CapabilityRegistry::new()).parser();
        assert!(matches!(result, Err(ArgshapeError::UnsupportedMethod { .. })));
    }
}
