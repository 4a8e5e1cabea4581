//! Which schema kinds can be turned into CLI options or commands.
//!
//! The kind→capability table is [`capability_of`]. A [`CapabilityRegistry`]
//! is an explicit, owned copy of that table that translation runs against.
//! Registering installs the table; unregistering removes exactly what
//! registering installed. Nothing here is process-wide mutable state: two
//! builders holding different registries never observe each other.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::ArgshapeError;
use crate::schema::Kind;

/// What a schema kind can be translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Decorated with option metadata and translated to a flag.
    Option,
    /// Promoted to a subcommand.
    Command,
}

/// Names of the metadata and translation methods of the option capability.
pub const OPTION_METHODS: [&str; 14] = [
    "option",
    "alias",
    "global",
    "hidden",
    "deprecated",
    "deprecated_with",
    "default_description",
    "group",
    "count",
    "nargs",
    "normalize",
    "demand_option",
    "describe_option",
    "to_descriptor",
];

/// Names of the methods of the command capability.
pub const COMMAND_METHODS: [&str; 2] = ["command", "to_options"];

/// Built-in capability of a kind.
pub fn capability_of(kind: Kind) -> Option<Capability> {
    match kind {
        Kind::Boolean | Kind::String | Kind::Number | Kind::Enum | Kind::Array | Kind::Option => {
            Some(Capability::Option)
        }
        Kind::Object => Some(Capability::Command),
        _ => None,
    }
}

/// Fail with [`ArgshapeError::UnsupportedMethod`] unless `kind` has
/// `capability` in the built-in table.
pub(crate) fn require(
    kind: Kind,
    capability: Capability,
    method: &'static str,
) -> Result<(), ArgshapeError> {
    if capability_of(kind) == Some(capability) {
        Ok(())
    } else {
        Err(ArgshapeError::UnsupportedMethod { method, kind })
    }
}

static STANDARD: LazyLock<CapabilityRegistry> = LazyLock::new(CapabilityRegistry::standard);

/// A registered registry shared by every translation that doesn't bring its own.
pub fn standard() -> &'static CapabilityRegistry {
    &STANDARD
}

/// Owned kind→capability table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityRegistry {
    installed: BTreeMap<Kind, Capability>,
    added: Vec<Kind>,
    registered: bool,
}

impl CapabilityRegistry {
    /// An empty, unregistered registry. Every kind is unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in table registered.
    pub fn standard() -> Self {
        Self::new().register()
    }

    /// Install the built-in table. No-op if already registered.
    ///
    /// Kinds that already carry an entry (see [`install`](Self::install)) are
    /// left alone and not tracked, so [`unregister`](Self::unregister) keeps them.
    pub fn register(mut self) -> Self {
        if self.registered {
            return self;
        }
        for kind in Kind::ALL {
            if let Some(capability) = capability_of(kind)
                && !self.installed.contains_key(&kind)
            {
                self.installed.insert(kind, capability);
                self.added.push(kind);
            }
        }
        self.registered = true;
        self
    }

    /// Remove exactly the entries [`register`](Self::register) added. No-op if
    /// not registered.
    pub fn unregister(mut self) -> Self {
        if !self.registered {
            return self;
        }
        for kind in self.added.drain(..) {
            self.installed.remove(&kind);
        }
        self.registered = false;
        self
    }

    /// Install a single entry outside the register/unregister lifecycle.
    pub fn install(mut self, kind: Kind, capability: Capability) -> Self {
        self.installed.insert(kind, capability);
        self
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn capability(&self, kind: Kind) -> Option<Capability> {
        self.installed.get(&kind).copied()
    }

    /// Kinds currently carrying an entry.
    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.installed.keys().copied()
    }

    /// Fail with [`ArgshapeError::UnsupportedMethod`] unless `kind` carries
    /// `capability`.
    pub fn require(
        &self,
        kind: Kind,
        capability: Capability,
        method: &'static str,
    ) -> Result<(), ArgshapeError> {
        if self.capability(kind) == Some(capability) {
            Ok(())
        } else {
            Err(ArgshapeError::UnsupportedMethod { method, kind })
        }
    }
}
