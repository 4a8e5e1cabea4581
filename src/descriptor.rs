//! Translate one schema node into an [`OptionDescriptor`].
//!
//! The descriptor is assembled in a fixed order:
//!
//! 1. the option type inferred from the node (wrappers are transparent),
//! 2. `demandOption` from the caller's `strict` flag,
//! 3. stored option metadata, which may override `demandOption`,
//! 4. `describe`, computed last so the inner schema's description always
//!    wins over metadata.

use serde::Serialize;
use toml::Value;

use crate::capability::{self, Capability, CapabilityRegistry};
use crate::error::ArgshapeError;
use crate::meta::OptionMeta;
use crate::schema::{Kind, Node, Schema};

/// Value type of a CLI option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Boolean,
    String,
    Number,
}

/// Parser-facing configuration of one flag or positional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDescriptor {
    #[serde(rename = "type")]
    pub option_type: OptionType,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub demand_option: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub describe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Remaining metadata; `describe` and `demand_option` are always unset
    /// here since they live in the fields above.
    #[serde(flatten)]
    pub meta: OptionMeta,
}

impl OptionDescriptor {
    pub fn aliases(&self) -> &[String] {
        self.meta.aliases()
    }

    pub fn is_count(&self) -> bool {
        self.meta.count.unwrap_or(false)
    }

    pub fn is_hidden(&self) -> bool {
        self.meta.hidden.unwrap_or(false)
    }

    pub fn is_global(&self) -> bool {
        self.meta.global.unwrap_or(false)
    }

    pub fn is_normalized(&self) -> bool {
        self.meta.normalize.unwrap_or(false)
    }
}

/// Infer the option type of a node, or the kind that blocked inference.
pub fn infer_type(schema: &Schema) -> Result<OptionType, Kind> {
    match schema.node() {
        Node::Boolean => Ok(OptionType::Boolean),
        Node::String | Node::Enum(_) => Ok(OptionType::String),
        Node::Number => Ok(OptionType::Number),
        Node::Array(element) => infer_type(element),
        Node::Optional(inner) | Node::Default { inner, .. } => infer_type(inner),
        Node::Option(option) => infer_type(option.inner_type()),
        _ => Err(schema.kind()),
    }
}

/// Structural facts collected while walking through wrappers.
#[derive(Default)]
struct Peeled<'a> {
    array: bool,
    choices: Option<Vec<String>>,
    default: Option<Value>,
    meta: Option<&'a OptionMeta>,
}

/// Walk `Optional`, `Default`, decorated and `Array` wrappers down to the
/// leaf, recording what each layer contributes.
fn peel(schema: &Schema) -> Peeled<'_> {
    let mut peeled = Peeled::default();
    let mut current = schema;
    loop {
        match current.node() {
            Node::Optional(inner) => current = inner,
            Node::Default { inner, value } => {
                peeled.default.get_or_insert_with(|| value.clone());
                current = inner;
            }
            Node::Option(option) => {
                peeled.meta.get_or_insert(option.meta());
                current = option.inner_type();
            }
            Node::Array(element) => {
                peeled.array = true;
                current = element;
            }
            Node::Enum(values) => {
                peeled.choices = Some(values.clone());
                return peeled;
            }
            _ => return peeled,
        }
    }
}

/// The node whose kind decides the option capability: the first node under
/// `Optional`, `Default` and decorated wrappers.
fn capability_target(schema: &Schema) -> &Schema {
    match schema.node() {
        Node::Optional(inner) | Node::Default { inner, .. } => capability_target(inner),
        Node::Option(option) => capability_target(option.inner_type()),
        _ => schema,
    }
}

/// Schema→descriptor translation against one capability registry.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'r> {
    registry: &'r CapabilityRegistry,
}

impl Default for Translator<'static> {
    fn default() -> Self {
        Self::new(capability::standard())
    }
}

impl<'r> Translator<'r> {
    pub fn new(registry: &'r CapabilityRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r CapabilityRegistry {
        self.registry
    }

    /// Translate `schema` into a descriptor, demanded when `strict`.
    pub fn descriptor(
        &self,
        schema: &Schema,
        strict: bool,
    ) -> Result<OptionDescriptor, ArgshapeError> {
        self.assemble(schema, strict, None)
    }

    /// Translate a positional: its own inferred type, then `options` merged
    /// over any metadata the schema already carries. Positionals wrapped in
    /// `Optional` are not demanded.
    pub fn positional(
        &self,
        schema: &Schema,
        options: &OptionMeta,
    ) -> Result<OptionDescriptor, ArgshapeError> {
        let strict = schema.kind() != Kind::Optional;
        self.assemble(schema, strict, Some(options))
    }

    fn assemble(
        &self,
        schema: &Schema,
        strict: bool,
        extra: Option<&OptionMeta>,
    ) -> Result<OptionDescriptor, ArgshapeError> {
        let target = capability_target(schema);
        self.registry
            .require(target.kind(), Capability::Option, "to_descriptor")?;
        let option_type =
            infer_type(schema).map_err(|kind| ArgshapeError::UnsupportedType { kind })?;

        let peeled = peel(schema);
        let mut meta = peeled.meta.cloned().unwrap_or_default();
        if let Some(extra) = extra {
            meta = meta.merge(extra.clone());
        }
        let demand_option = meta.demand_option.take().unwrap_or(strict);
        let fallback = meta.describe.take();
        let describe = description_of(schema)
            .map(str::to_string)
            .or(fallback);

        Ok(OptionDescriptor {
            option_type,
            array: peeled.array,
            choices: peeled.choices,
            demand_option,
            describe,
            default: peeled.default,
            meta,
        })
    }
}

/// Description of the first described node going through wrappers. Inner
/// descriptions of decorated nodes come before their `describe` metadata.
fn description_of(schema: &Schema) -> Option<&str> {
    if let Some(text) = schema.description()
        && schema.kind() != Kind::Option
    {
        return Some(text);
    }
    match schema.node() {
        Node::Optional(inner) | Node::Default { inner, .. } | Node::Array(inner) => {
            description_of(inner)
        }
        Node::Option(option) => description_of(option.inner_type()),
        _ => None,
    }
}

impl Schema {
    /// Translate this node with the standard registry.
    pub fn to_descriptor(&self, strict: bool) -> Result<OptionDescriptor, ArgshapeError> {
        Translator::default().descriptor(self, strict)
    }
}
