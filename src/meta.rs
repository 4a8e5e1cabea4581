//! CLI option metadata and the decorated schema node that carries it.
//!
//! [`OptionMeta`] holds the flag-level settings a validation schema has no
//! notion of (aliases, help group, visibility, ...). [`OptionNode`] pairs one
//! schema with one metadata value. Both are immutable: every accumulator
//! method returns a new node with the change merged in, right side winning
//! per key, and the receiver stays as it was.
//!
//! ```ignore
//! let verbose = Schema::boolean()
//!     .alias("v")?
//!     .group("Output")
//!     .describe("Print more");
//! ```

use serde::Serialize;

use crate::capability::{self, Capability};
use crate::error::ArgshapeError;
use crate::schema::{Node, Schema};

/// Deprecation marker: a bare flag or a message shown in help.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Deprecated {
    Flag(bool),
    Message(String),
}

impl Deprecated {
    pub fn is_deprecated(&self) -> bool {
        match self {
            Deprecated::Flag(flag) => *flag,
            Deprecated::Message(_) => true,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Deprecated::Message(msg) => Some(msg),
            Deprecated::Flag(_) => None,
        }
    }
}

impl From<bool> for Deprecated {
    fn from(flag: bool) -> Self {
        Deprecated::Flag(flag)
    }
}

impl From<&str> for Deprecated {
    fn from(msg: &str) -> Self {
        Deprecated::Message(msg.to_string())
    }
}

impl From<String> for Deprecated {
    fn from(msg: String) -> Self {
        Deprecated::Message(msg)
    }
}

/// One or more alternative names for an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Aliases(pub Vec<String>);

impl From<&str> for Aliases {
    fn from(alias: &str) -> Self {
        Aliases(vec![alias.to_string()])
    }
}

impl From<String> for Aliases {
    fn from(alias: String) -> Self {
        Aliases(vec![alias])
    }
}

impl From<Vec<&str>> for Aliases {
    fn from(aliases: Vec<&str>) -> Self {
        Aliases(aliases.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Aliases {
    fn from(aliases: Vec<String>) -> Self {
        Aliases(aliases)
    }
}

impl<const N: usize> From<[&str; N]> for Aliases {
    fn from(aliases: [&str; N]) -> Self {
        Aliases(aliases.iter().map(|a| a.to_string()).collect())
    }
}

/// Option-level settings understood by the parser builder.
///
/// Every field is optional; unset fields never reach the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<Aliases>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_option: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub describe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nargs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,
}

impl OptionMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge, `over` winning for every key it sets.
    pub fn merge(self, over: OptionMeta) -> OptionMeta {
        OptionMeta {
            alias: over.alias.or(self.alias),
            count: over.count.or(self.count),
            default_description: over.default_description.or(self.default_description),
            demand_option: over.demand_option.or(self.demand_option),
            deprecated: over.deprecated.or(self.deprecated),
            describe: over.describe.or(self.describe),
            global: over.global.or(self.global),
            group: over.group.or(self.group),
            hidden: over.hidden.or(self.hidden),
            nargs: over.nargs.or(self.nargs),
            normalize: over.normalize.or(self.normalize),
        }
    }

    pub fn alias(mut self, alias: impl Into<Aliases>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn count(mut self) -> Self {
        self.count = Some(true);
        self
    }

    pub fn default_description(mut self, text: impl Into<String>) -> Self {
        self.default_description = Some(text.into());
        self
    }

    pub fn demand_option(mut self, demand: bool) -> Self {
        self.demand_option = Some(demand);
        self
    }

    pub fn deprecated(mut self, deprecated: impl Into<Deprecated>) -> Self {
        self.deprecated = Some(deprecated.into());
        self
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.describe = Some(text.into());
        self
    }

    pub fn global(mut self) -> Self {
        self.global = Some(true);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = Some(true);
        self
    }

    pub fn nargs(mut self, n: usize) -> Self {
        self.nargs = Some(n);
        self
    }

    pub fn normalize(mut self) -> Self {
        self.normalize = Some(true);
        self
    }

    /// Alias list, empty when unset.
    pub fn aliases(&self) -> &[String] {
        self.alias.as_ref().map(|a| a.0.as_slice()).unwrap_or(&[])
    }
}

/// A schema decorated with option metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionNode {
    inner: Schema,
    meta: OptionMeta,
}

impl OptionNode {
    pub(crate) fn new(inner: Schema, meta: OptionMeta) -> Self {
        Self { inner, meta }
    }

    pub fn inner_type(&self) -> &Schema {
        &self.inner
    }

    pub fn meta(&self) -> &OptionMeta {
        &self.meta
    }

    /// Description shown for this option: the wrapped schema's own
    /// description first, then the `describe` metadata.
    pub fn description(&self) -> Option<&str> {
        self.inner
            .description()
            .or(self.meta.describe.as_deref())
    }

    pub(crate) fn with_inner_description(&self, text: String) -> Self {
        Self::new(self.inner.clone().describe(text), self.meta.clone())
    }

    /// New node with `config` merged over the current metadata.
    pub fn option(&self, config: OptionMeta) -> OptionNode {
        Self::new(self.inner.clone(), self.meta.clone().merge(config))
    }

    pub fn alias(&self, alias: impl Into<Aliases>) -> OptionNode {
        self.option(OptionMeta::new().alias(alias))
    }

    pub fn global(&self) -> OptionNode {
        self.option(OptionMeta::new().global())
    }

    pub fn hidden(&self) -> OptionNode {
        self.option(OptionMeta::new().hidden())
    }

    pub fn deprecated(&self) -> OptionNode {
        self.deprecated_with(true)
    }

    /// Deprecate with a message, or set the flag explicitly.
    pub fn deprecated_with(&self, deprecated: impl Into<Deprecated>) -> OptionNode {
        self.option(OptionMeta::new().deprecated(deprecated))
    }

    pub fn default_description(&self, text: impl Into<String>) -> OptionNode {
        self.option(OptionMeta::new().default_description(text))
    }

    pub fn group(&self, group: impl Into<String>) -> OptionNode {
        self.option(OptionMeta::new().group(group))
    }

    pub fn count(&self) -> OptionNode {
        self.option(OptionMeta::new().count())
    }

    pub fn nargs(&self, n: usize) -> OptionNode {
        self.option(OptionMeta::new().nargs(n))
    }

    pub fn normalize(&self) -> OptionNode {
        self.option(OptionMeta::new().normalize())
    }

    pub fn demand_option(&self, demand: bool) -> OptionNode {
        self.option(OptionMeta::new().demand_option(demand))
    }

    /// Set the `describe` metadata. A description on the wrapped schema
    /// still wins; see [`description`](Self::description).
    pub fn describe(&self, text: impl Into<String>) -> OptionNode {
        self.option(OptionMeta::new().describe(text))
    }

    pub fn optional(self) -> Schema {
        Schema::from(self).optional()
    }

    pub fn default(self, value: impl Into<toml::Value>) -> Schema {
        Schema::from(self).default(value)
    }
}

impl From<OptionNode> for Schema {
    fn from(node: OptionNode) -> Self {
        Schema::from_node(Node::Option(Box::new(node)))
    }
}

/// Option accumulator on plain schema nodes. Each method fails with
/// [`ArgshapeError::UnsupportedMethod`] on kinds without the option
/// capability, and merges instead of re-wrapping on decorated nodes.
impl Schema {
    fn decorate(&self, method: &'static str, config: OptionMeta) -> Result<OptionNode, ArgshapeError> {
        if let Node::Option(node) = self.node() {
            return Ok(node.option(config));
        }
        capability::require(self.kind(), Capability::Option, method)?;
        Ok(OptionNode::new(self.clone(), config))
    }

    pub fn option(&self, config: OptionMeta) -> Result<OptionNode, ArgshapeError> {
        self.decorate("option", config)
    }

    pub fn alias(&self, alias: impl Into<Aliases>) -> Result<OptionNode, ArgshapeError> {
        self.decorate("alias", OptionMeta::new().alias(alias))
    }

    pub fn global(&self) -> Result<OptionNode, ArgshapeError> {
        self.decorate("global", OptionMeta::new().global())
    }

    pub fn hidden(&self) -> Result<OptionNode, ArgshapeError> {
        self.decorate("hidden", OptionMeta::new().hidden())
    }

    pub fn deprecated(&self) -> Result<OptionNode, ArgshapeError> {
        self.decorate("deprecated", OptionMeta::new().deprecated(true))
    }

    pub fn deprecated_with(
        &self,
        deprecated: impl Into<Deprecated>,
    ) -> Result<OptionNode, ArgshapeError> {
        self.decorate("deprecated_with", OptionMeta::new().deprecated(deprecated))
    }

    pub fn default_description(
        &self,
        text: impl Into<String>,
    ) -> Result<OptionNode, ArgshapeError> {
        self.decorate(
            "default_description",
            OptionMeta::new().default_description(text),
        )
    }

    pub fn group(&self, group: impl Into<String>) -> Result<OptionNode, ArgshapeError> {
        self.decorate("group", OptionMeta::new().group(group))
    }

    pub fn count(&self) -> Result<OptionNode, ArgshapeError> {
        self.decorate("count", OptionMeta::new().count())
    }

    pub fn nargs(&self, n: usize) -> Result<OptionNode, ArgshapeError> {
        self.decorate("nargs", OptionMeta::new().nargs(n))
    }

    pub fn normalize(&self) -> Result<OptionNode, ArgshapeError> {
        self.decorate("normalize", OptionMeta::new().normalize())
    }

    pub fn demand_option(&self, demand: bool) -> Result<OptionNode, ArgshapeError> {
        self.decorate("demand_option", OptionMeta::new().demand_option(demand))
    }

    /// Set the `describe` option metadata (as opposed to
    /// [`Schema::describe`], which describes the schema itself).
    pub fn describe_option(&self, text: impl Into<String>) -> Result<OptionNode, ArgshapeError> {
        self.decorate("describe_option", OptionMeta::new().describe(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Kind;

    #[test]
    fn option_wraps_plain_schema() {
        let node = Schema::boolean().option(OptionMeta::new()).unwrap();
        assert_eq!(node.inner_type(), &Schema::boolean());
        assert_eq!(node.meta(), &OptionMeta::default());
    }

    #[test]
    fn sugar_sets_single_field() {
        let node = Schema::string().alias("s").unwrap();
        assert_eq!(node.meta().aliases(), ["s".to_string()]);
        assert_eq!(Schema::number().count().unwrap().meta().count, Some(true));
        assert_eq!(Schema::number().nargs(2).unwrap().meta().nargs, Some(2));
        assert_eq!(Schema::string().normalize().unwrap().meta().normalize, Some(true));
        assert_eq!(Schema::string().hidden().unwrap().meta().hidden, Some(true));
        assert_eq!(Schema::string().global().unwrap().meta().global, Some(true));
        assert_eq!(
            Schema::string().group("Net").unwrap().meta().group.as_deref(),
            Some("Net")
        );
        assert_eq!(
            Schema::string().demand_option(false).unwrap().meta().demand_option,
            Some(false)
        );
    }

    #[test]
    fn deprecated_variants() {
        let bare = Schema::boolean().deprecated().unwrap();
        assert_eq!(bare.meta().deprecated, Some(Deprecated::Flag(true)));

        let msg = Schema::boolean().deprecated_with("use --quiet").unwrap();
        assert_eq!(msg.meta().deprecated.as_ref().unwrap().message(), Some("use --quiet"));

        let off = bare.deprecated_with(false);
        assert!(!off.meta().deprecated.as_ref().unwrap().is_deprecated());
    }

    #[test]
    fn merge_is_right_biased() {
        let a = OptionMeta::new().alias("a").group("one");
        let b = OptionMeta::new().group("two").hidden();
        let merged = a.merge(b);
        assert_eq!(merged.aliases(), ["a".to_string()]);
        assert_eq!(merged.group.as_deref(), Some("two"));
        assert_eq!(merged.hidden, Some(true));
    }

    #[test]
    fn chained_options_match_single_merge() {
        let n = Schema::string().alias("n").unwrap();
        let a = OptionMeta::new().group("A").describe("first");
        let b = OptionMeta::new().describe("second").count();

        let chained = n.option(a.clone()).option(b.clone());
        let once = n.option(a.merge(b));
        assert_eq!(chained, once);
    }

    #[test]
    fn mutators_leave_receiver_untouched() {
        let n = Schema::string().alias("n").unwrap();
        let snapshot = n.clone();
        let _ = n.group("G");
        let _ = n.option(OptionMeta::new().alias("m"));
        assert_eq!(n, snapshot);
    }

    #[test]
    fn decorated_schema_merges_instead_of_wrapping() {
        let schema: Schema = Schema::boolean().alias("b").unwrap().into();
        let node = schema.group("G").unwrap();
        assert_eq!(node.inner_type().kind(), Kind::Boolean);
        assert_eq!(node.meta().aliases(), ["b".to_string()]);
        assert_eq!(node.meta().group.as_deref(), Some("G"));
    }

    #[test]
    fn description_prefers_inner_schema() {
        let node = Schema::string()
            .describe("pigs")
            .describe_option("hogs")
            .unwrap();
        assert_eq!(node.description(), Some("pigs"));

        let fallback = Schema::string().describe_option("hogs").unwrap();
        assert_eq!(fallback.description(), Some("hogs"));
    }

    #[test]
    fn describe_on_decorated_schema_targets_inner() {
        let schema = Schema::from(Schema::string().describe_option("hogs").unwrap()).describe("pigs");
        assert_eq!(schema.description(), Some("pigs"));
    }

    type Accumulator = fn(&Schema) -> Result<OptionNode, ArgshapeError>;

    fn unsupported_schemas() -> Vec<Schema> {
        vec![
            Schema::string().optional(),
            Schema::number().default(1),
            Schema::date(),
            Schema::literal("x"),
            Schema::tuple(vec![Schema::string()]),
            Schema::record(Schema::string()),
            Schema::union(vec![Schema::string(), Schema::number()]),
            Schema::any(),
            Schema::unknown(),
            Schema::never(),
            Schema::object(Default::default()),
        ]
    }

    #[test]
    fn unsupported_kinds_reject_every_accumulator() {
        let methods: [(&str, Accumulator); 13] = [
            ("option", |s| s.option(OptionMeta::new())),
            ("alias", |s| s.alias("a")),
            ("global", |s| s.global()),
            ("hidden", |s| s.hidden()),
            ("deprecated", |s| s.deprecated()),
            ("deprecated_with", |s| s.deprecated_with("gone")),
            ("default_description", |s| s.default_description("d")),
            ("group", |s| s.group("g")),
            ("count", |s| s.count()),
            ("nargs", |s| s.nargs(2)),
            ("normalize", |s| s.normalize()),
            ("demand_option", |s| s.demand_option(true)),
            ("describe_option", |s| s.describe_option("text")),
        ];
        for schema in unsupported_schemas() {
            for (method, call) in &methods {
                match call(&schema) {
                    Err(ArgshapeError::UnsupportedMethod { method: m, kind }) => {
                        assert_eq!(m, *method);
                        assert_eq!(kind, schema.kind());
                    }
                    other => panic!(
                        "{method} on {}: expected UnsupportedMethod, got {other:?}",
                        schema.kind()
                    ),
                }
            }
        }
    }

    #[test]
    fn unsupported_kinds_fail_to_translate() {
        for schema in unsupported_schemas() {
            let target = match schema.kind() {
                // Wrappers are transparent to translation; the inner kind decides.
                Kind::Optional | Kind::Default => continue,
                kind => kind,
            };
            match schema.to_descriptor(true) {
                Err(ArgshapeError::UnsupportedMethod { method, kind }) => {
                    assert_eq!(method, "to_descriptor");
                    assert_eq!(kind, target);
                }
                other => panic!("Expected UnsupportedMethod, got {other:?}"),
            }
            match schema.clone().optional().to_descriptor(false) {
                Err(ArgshapeError::UnsupportedMethod { kind, .. }) => assert_eq!(kind, target),
                other => panic!("Expected UnsupportedMethod, got {other:?}"),
            }
        }
    }

    #[test]
    fn meta_serializes_camel_case_and_skips_unset() {
        let meta = OptionMeta::new()
            .alias(["v", "verbose"])
            .default_description("off")
            .deprecated("gone");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "alias": ["v", "verbose"],
                "defaultDescription": "off",
                "deprecated": "gone",
            })
        );
    }
}
