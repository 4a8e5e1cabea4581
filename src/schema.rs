//! The schema tree that drives both config validation and CLI derivation.
//!
//! A [`Schema`] is a tagged union over node kinds. Each node can validate a
//! [`toml::Value`] and exposes just enough structure (kind tag, description,
//! inner/element types, object shape) for the translators in
//! [`descriptor`](crate::descriptor) and [`record`](crate::record) to derive
//! parser configuration from it.
//!
//! Combinators never mutate: `optional()`, `default()`, `describe()` and
//! `partial()` all return new nodes, so one schema can be shared between the
//! config loader and any number of commands.

use std::fmt;

use toml::{Table, Value};

use crate::meta::OptionNode;

/// Kind tag of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Boolean,
    String,
    Number,
    Enum,
    Array,
    Optional,
    Default,
    Object,
    /// A node decorated with CLI option metadata.
    Option,
    Date,
    Literal,
    Tuple,
    Record,
    Union,
    Any,
    Unknown,
    Never,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 17] = [
        Kind::Boolean,
        Kind::String,
        Kind::Number,
        Kind::Enum,
        Kind::Array,
        Kind::Optional,
        Kind::Default,
        Kind::Object,
        Kind::Option,
        Kind::Date,
        Kind::Literal,
        Kind::Tuple,
        Kind::Record,
        Kind::Union,
        Kind::Any,
        Kind::Unknown,
        Kind::Never,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Enum => "enum",
            Kind::Array => "array",
            Kind::Optional => "optional",
            Kind::Default => "default",
            Kind::Object => "object",
            Kind::Option => "option",
            Kind::Date => "date",
            Kind::Literal => "literal",
            Kind::Tuple => "tuple",
            Kind::Record => "record",
            Kind::Union => "union",
            Kind::Any => "any",
            Kind::Unknown => "unknown",
            Kind::Never => "never",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structure of a schema node. Read it through [`Schema::node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Boolean,
    String,
    Number,
    Enum(Vec<String>),
    Array(Box<Schema>),
    Optional(Box<Schema>),
    Default { inner: Box<Schema>, value: Value },
    Object(Shape),
    Option(Box<OptionNode>),
    Date,
    Literal(Value),
    Tuple(Vec<Schema>),
    Record(Box<Schema>),
    Union(Vec<Schema>),
    Any,
    Unknown,
    Never,
}

/// A validation schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    node: Node,
    description: Option<String>,
}

impl Schema {
    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node,
            description: None,
        }
    }

    pub fn boolean() -> Self {
        Self::from_node(Node::Boolean)
    }

    pub fn string() -> Self {
        Self::from_node(Node::String)
    }

    /// Integers and floats both validate as numbers.
    pub fn number() -> Self {
        Self::from_node(Node::Number)
    }

    /// A string restricted to a fixed set of values.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_node(Node::Enum(values.into_iter().map(Into::into).collect()))
    }

    pub fn array(element: impl Into<Schema>) -> Self {
        Self::from_node(Node::Array(Box::new(element.into())))
    }

    pub fn object(shape: Shape) -> Self {
        Self::from_node(Node::Object(shape))
    }

    pub fn date() -> Self {
        Self::from_node(Node::Date)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::from_node(Node::Literal(value.into()))
    }

    pub fn tuple(items: Vec<Schema>) -> Self {
        Self::from_node(Node::Tuple(items))
    }

    /// A table whose keys are free-form and whose values all match `values`.
    pub fn record(values: impl Into<Schema>) -> Self {
        Self::from_node(Node::Record(Box::new(values.into())))
    }

    /// Accepts the first alternative that validates.
    pub fn union(options: Vec<Schema>) -> Self {
        Self::from_node(Node::Union(options))
    }

    pub fn any() -> Self {
        Self::from_node(Node::Any)
    }

    pub fn unknown() -> Self {
        Self::from_node(Node::Unknown)
    }

    pub fn never() -> Self {
        Self::from_node(Node::Never)
    }

    /// Wrap this node so a missing value is accepted. Already-optional nodes
    /// are returned as-is.
    pub fn optional(self) -> Self {
        if self.kind() == Kind::Optional {
            return self;
        }
        Self::from_node(Node::Optional(Box::new(self)))
    }

    /// Wrap this node so a missing value is replaced by `value`.
    pub fn default(self, value: impl Into<Value>) -> Self {
        Self::from_node(Node::Default {
            inner: Box::new(self),
            value: value.into(),
        })
    }

    /// Attach a human-readable description.
    ///
    /// On a decorated node the text lands on the wrapped schema, where it
    /// takes precedence over the option's own `describe` metadata.
    pub fn describe(self, text: impl Into<String>) -> Self {
        match self.node {
            Node::Option(option) => Self::from(option.with_inner_description(text.into())),
            node => Self {
                node,
                description: Some(text.into()),
            },
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn kind(&self) -> Kind {
        match &self.node {
            Node::Boolean => Kind::Boolean,
            Node::String => Kind::String,
            Node::Number => Kind::Number,
            Node::Enum(_) => Kind::Enum,
            Node::Array(_) => Kind::Array,
            Node::Optional(_) => Kind::Optional,
            Node::Default { .. } => Kind::Default,
            Node::Object(_) => Kind::Object,
            Node::Option(_) => Kind::Option,
            Node::Date => Kind::Date,
            Node::Literal(_) => Kind::Literal,
            Node::Tuple(_) => Kind::Tuple,
            Node::Record(_) => Kind::Record,
            Node::Union(_) => Kind::Union,
            Node::Any => Kind::Any,
            Node::Unknown => Kind::Unknown,
            Node::Never => Kind::Never,
        }
    }

    /// The node's effective description. Decorated nodes resolve it through
    /// [`OptionNode::description`].
    pub fn description(&self) -> Option<&str> {
        match &self.node {
            Node::Option(option) => option.description(),
            _ => self.description.as_deref(),
        }
    }

    /// Wrapped node of an `Optional`, `Default` or decorated node.
    pub fn inner_type(&self) -> Option<&Schema> {
        match &self.node {
            Node::Optional(inner) | Node::Default { inner, .. } => Some(inner),
            Node::Option(option) => Some(option.inner_type()),
            _ => None,
        }
    }

    /// Element node of an `Array`.
    pub fn element_type(&self) -> Option<&Schema> {
        match &self.node {
            Node::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Named fields of an `Object`.
    pub fn shape(&self) -> Option<&Shape> {
        match &self.node {
            Node::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// Copy of an object schema with every field wrapped in `Optional`.
    ///
    /// Returns `None` for non-object nodes.
    pub fn partial(&self) -> Option<Schema> {
        let shape = self.shape()?;
        let fields = shape
            .iter()
            .map(|(name, field)| (name.to_string(), field.clone().optional()))
            .collect();
        Some(Self {
            node: Node::Object(fields),
            description: self.description.clone(),
        })
    }

    /// Validate `value`, returning the normalized value (defaults filled,
    /// unknown object keys stripped) or every issue found.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationErrors> {
        let mut issues = Vec::new();
        let out = self.check(Some(value), "", &mut issues);
        match out {
            Some(v) if issues.is_empty() => Ok(v),
            _ => Err(ValidationErrors(issues)),
        }
    }

    /// Validate a table against an object schema.
    pub fn validate_table(&self, table: &Table) -> Result<Table, ValidationErrors> {
        match self.validate(&Value::Table(table.clone()))? {
            Value::Table(out) => Ok(out),
            other => Err(ValidationErrors(vec![Issue::new(
                "",
                format!("expected a table, got {}", other.type_str()),
            )])),
        }
    }

    /// Validate a possibly missing value. `None` in, `None` out means the
    /// field stays absent.
    fn check(&self, value: Option<&Value>, path: &str, issues: &mut Vec<Issue>) -> Option<Value> {
        let value = match (value, &self.node) {
            (None, Node::Optional(_) | Node::Any | Node::Unknown) => return None,
            (None, Node::Default { inner, value }) => {
                return inner.check(Some(value), path, issues);
            }
            (None, Node::Option(option)) => return option.inner_type().check(None, path, issues),
            (None, _) => {
                issues.push(Issue::new(path, "required"));
                return None;
            }
            (Some(value), _) => value,
        };

        match &self.node {
            Node::Boolean => expect(value.is_bool(), value, "boolean", path, issues),
            Node::String => expect(value.is_str(), value, "string", path, issues),
            Node::Number => expect(
                value.is_integer() || value.is_float(),
                value,
                "number",
                path,
                issues,
            ),
            Node::Date => expect(value.is_datetime(), value, "datetime", path, issues),
            Node::Enum(choices) => match value.as_str() {
                Some(s) if choices.iter().any(|c| c == s) => Some(value.clone()),
                _ => {
                    issues.push(Issue::new(
                        path,
                        format!("expected one of [{}]", choices.join(", ")),
                    ));
                    None
                }
            },
            Node::Literal(expected) => {
                if value == expected {
                    Some(value.clone())
                } else {
                    issues.push(Issue::new(path, format!("expected literal {expected}")));
                    None
                }
            }
            Node::Array(element) => {
                let Some(items) = value.as_array() else {
                    return mismatch(value, "array", path, issues);
                };
                let out: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| {
                        element.check(Some(item), &join(path, &i.to_string()), issues)
                    })
                    .collect();
                Some(Value::Array(out))
            }
            Node::Tuple(elements) => {
                let Some(items) = value.as_array() else {
                    return mismatch(value, "array", path, issues);
                };
                if items.len() != elements.len() {
                    issues.push(Issue::new(
                        path,
                        format!("expected {} items, got {}", elements.len(), items.len()),
                    ));
                    return None;
                }
                let out: Vec<Value> = elements
                    .iter()
                    .zip(items)
                    .enumerate()
                    .filter_map(|(i, (element, item))| {
                        element.check(Some(item), &join(path, &i.to_string()), issues)
                    })
                    .collect();
                Some(Value::Array(out))
            }
            Node::Optional(inner) | Node::Default { inner, .. } => {
                inner.check(Some(value), path, issues)
            }
            Node::Option(option) => option.inner_type().check(Some(value), path, issues),
            Node::Object(shape) => {
                let Some(table) = value.as_table() else {
                    return mismatch(value, "table", path, issues);
                };
                let mut out = Table::new();
                for (name, field) in shape.iter() {
                    if let Some(v) = field.check(table.get(name), &join(path, name), issues) {
                        out.insert(name.to_string(), v);
                    }
                }
                Some(Value::Table(out))
            }
            Node::Record(values) => {
                let Some(table) = value.as_table() else {
                    return mismatch(value, "table", path, issues);
                };
                let mut out = Table::new();
                for (key, item) in table {
                    if let Some(v) = values.check(Some(item), &join(path, key), issues) {
                        out.insert(key.clone(), v);
                    }
                }
                Some(Value::Table(out))
            }
            Node::Union(options) => {
                for option in options {
                    let mut scratch = Vec::new();
                    if let Some(v) = option.check(Some(value), path, &mut scratch)
                        && scratch.is_empty()
                    {
                        return Some(v);
                    }
                }
                issues.push(Issue::new(path, "no union alternative matched"));
                None
            }
            Node::Any | Node::Unknown => Some(value.clone()),
            Node::Never => {
                issues.push(Issue::new(path, "no value is allowed here"));
                None
            }
        }
    }
}

fn expect(
    ok: bool,
    value: &Value,
    expected: &str,
    path: &str,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    if ok {
        Some(value.clone())
    } else {
        mismatch(value, expected, path, issues)
    }
}

fn mismatch(value: &Value, expected: &str, path: &str, issues: &mut Vec<Issue>) -> Option<Value> {
    issues.push(Issue::new(
        path,
        format!("expected {expected}, got {}", value.type_str()),
    ));
    None
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Ordered named fields of an object schema.
///
/// Declaration order is preserved; it is the order options appear in help
/// output. Adding a field under an existing name replaces it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    fields: Vec<(String, Schema)>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.insert(name, schema);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: impl Into<Schema>) {
        let name = name.into();
        let schema = schema.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.fields.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Add every field of `other`, replacing same-named fields.
    pub fn extend(&mut self, other: &Shape) {
        for (name, schema) in other.iter() {
            self.insert(name, schema.clone());
        }
    }
}

impl<N: Into<String>> FromIterator<(N, Schema)> for Shape {
    fn from_iter<I: IntoIterator<Item = (N, Schema)>>(iter: I) -> Self {
        let mut shape = Shape::new();
        for (name, schema) in iter {
            shape.insert(name, schema);
        }
        shape
    }
}

/// One validation failure at a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// All issues found while validating one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<Issue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[Issue] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
