//! Object shape → option record.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::descriptor::{OptionDescriptor, Translator};
use crate::error::ArgshapeError;
use crate::schema::{Kind, Schema};

/// Ordered name→descriptor mapping handed to the parser builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionRecord {
    entries: Vec<(String, OptionDescriptor)>,
}

impl OptionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: OptionDescriptor) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = descriptor,
            None => self.entries.push((name, descriptor)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionDescriptor> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OptionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, descriptor) in &self.entries {
            map.serialize_entry(name, descriptor)?;
        }
        map.end()
    }
}

impl Translator<'_> {
    /// Translate every field of an object schema.
    ///
    /// A field wrapped in `Optional` translates its inner node with
    /// `strict = false`; every other field is demanded. Explicit
    /// `demand_option` metadata still overrides either way.
    pub fn options(&self, schema: &Schema) -> Result<OptionRecord, ArgshapeError> {
        let Some(shape) = schema.shape() else {
            return Err(ArgshapeError::NotAnObject {
                kind: schema.kind(),
            });
        };
        let mut record = OptionRecord::new();
        for (name, field) in shape.iter() {
            let descriptor = match (field.kind(), field.inner_type()) {
                (Kind::Optional, Some(inner)) => self.descriptor(inner, false)?,
                _ => self.descriptor(field, true)?,
            };
            record.insert(name, descriptor);
        }
        Ok(record)
    }
}

impl Schema {
    /// Option record of an object schema, using the standard registry.
    pub fn to_options(&self) -> Result<OptionRecord, ArgshapeError> {
        Translator::default().options(self)
    }
}
