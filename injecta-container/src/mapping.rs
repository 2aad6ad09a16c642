//! Alias and abstraction substitutions.
//!
//! Aliases rename the type part of every reference before the registry
//! is consulted. Mappings bind an interface or abstract class to the
//! concrete reference built in its place.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::key::TypeRef;

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    aliases: HashMap<String, String>,
    mappings: HashMap<String, TypeRef>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_alias(&mut self, alias: impl Into<String>, type_name: impl Into<String>) {
        let (alias, type_name) = (alias.into(), type_name.into());
        debug!(alias = %alias, type_name = %type_name, "Registered alias");
        self.aliases.insert(alias, type_name);
    }

    pub fn add_aliases<K, V>(&mut self, aliases: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (alias, type_name) in aliases {
            self.set_alias(alias, type_name);
        }
    }

    /// The type `alias` stands for, one level deep; `None` if it is not
    /// an alias.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Replaces an aliased type part with its target.
    pub fn canonical(&self, key: TypeRef) -> TypeRef {
        match self.aliases.get(key.type_name()) {
            Some(type_name) => {
                trace!(alias = key.type_name(), type_name = %type_name, "Following alias");
                let type_name = type_name.clone();
                key.with_type(type_name)
            }
            None => key,
        }
    }

    /// Binds an interface or abstract class to `Type` or `Type#instance`.
    pub fn set_mapping(&mut self, abstraction: impl Into<String>, concrete: &str) {
        let abstraction = abstraction.into();
        debug!(abstraction = %abstraction, concrete, "Registered mapping");
        self.mappings.insert(abstraction, TypeRef::parse(concrete));
    }

    pub fn add_mappings<K, V>(&mut self, mappings: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        for (abstraction, concrete) in mappings {
            self.set_mapping(abstraction, concrete.as_ref());
        }
    }

    pub fn resolve(&self, abstraction: &str) -> Option<&TypeRef> {
        self.mappings.get(abstraction)
    }
}
