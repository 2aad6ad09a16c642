//! Binding registry: per-binding configuration and singleton state.
//!
//! The registry maps a [`TypeRef`] to an [`InstanceEntry`] holding the
//! singleton flag, the cached instance and the [`MethodEntry`]s that
//! carry explicit parameter values and scheduled calls. Entries are
//! created lazily and live as long as the registry.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::key::TypeRef;
use crate::value::{Instance, Params, Value};

/// Method name standing for the constructor.
pub const CONSTRUCTOR: &str = "new";

/// Explicit parameters and scheduled calls for one method of a binding.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    type_name: String,
    name: String,
    params: Params,
    calls: Vec<Params>,
}

impl MethodEntry {
    pub(crate) fn new(type_name: &str, name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
            params: Params::new(),
            calls: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR
    }

    /// Sets one parameter value.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replaces all parameter values.
    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.params = params;
        self
    }

    /// Merges parameter values, overwriting existing names.
    pub fn add_params(&mut self, params: Params) -> &mut Self {
        self.params.extend(params);
        self
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Schedules one call after construction, with its own arguments.
    pub fn add_call(&mut self, params: Params) -> &mut Self {
        trace!(
            type_name = %self.type_name,
            method = %self.name,
            "Scheduled method call"
        );
        self.calls.push(params);
        self
    }

    pub fn calls(&self) -> &[Params] {
        &self.calls
    }

    pub fn has_calls(&self) -> bool {
        !self.calls.is_empty()
    }
}

/// Configuration and state of one binding.
#[derive(Debug, Clone)]
pub struct InstanceEntry {
    key: TypeRef,
    singleton: bool,
    instance: Option<Instance>,
    methods: Vec<MethodEntry>,
}

impl InstanceEntry {
    pub(crate) fn new(key: TypeRef) -> Self {
        Self {
            key,
            singleton: true,
            instance: None,
            methods: Vec::new(),
        }
    }

    pub fn key(&self) -> &TypeRef {
        &self.key
    }

    pub fn type_name(&self) -> &str {
        self.key.type_name()
    }

    pub fn name(&self) -> &str {
        self.key.instance()
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Sets the singleton flag.
    ///
    /// Clearing it while an instance is held is ignored.
    pub fn singleton(&mut self, singleton: bool) -> &mut Self {
        if !singleton && self.instance.is_some() {
            warn!(
                key = %self.key,
                "Ignoring singleton downgrade: an instance is already held"
            );
            return self;
        }
        self.singleton = singleton;
        self
    }

    /// Stores a shared instance and forces the binding to singleton.
    pub fn set_instance(&mut self, instance: Instance) -> &mut Self {
        debug!(key = %self.key, class = instance.type_name(), "Stored instance");
        self.singleton = true;
        self.instance = Some(instance);
        self
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// The instance to hand out without constructing, if any.
    pub fn cached(&self) -> Option<&Instance> {
        self.instance.as_ref().filter(|_| self.singleton)
    }

    /// Gets or creates the entry for `method`.
    pub fn method(&mut self, method: &str) -> &mut MethodEntry {
        let index = match self.methods.iter().position(|entry| entry.name() == method) {
            Some(index) => index,
            None => {
                self.methods
                    .push(MethodEntry::new(self.key.type_name(), method));
                self.methods.len() - 1
            }
        };
        &mut self.methods[index]
    }

    pub fn find_method(&self, method: &str) -> Option<&MethodEntry> {
        self.methods.iter().find(|entry| entry.name() == method)
    }

    /// Gets or creates the constructor entry.
    pub fn constructor(&mut self) -> &mut MethodEntry {
        self.method(CONSTRUCTOR)
    }

    /// Method entries in registration order.
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }
}

/// Instance entries of one type, keyed by instance name.
#[derive(Debug, Clone, Default)]
struct TypeEntry {
    instances: HashMap<String, InstanceEntry>,
}

/// All bindings, keyed by type name then instance name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: HashMap<String, TypeEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets or creates the entry for `key`.
    pub fn instance(&mut self, key: &TypeRef) -> &mut InstanceEntry {
        self.types
            .entry(key.type_name().to_string())
            .or_default()
            .instances
            .entry(key.instance().to_string())
            .or_insert_with(|| {
                trace!(key = %key, "Created instance entry");
                InstanceEntry::new(key.clone())
            })
    }

    /// Gets or creates the entry for `method` of `key`.
    pub fn method(&mut self, key: &TypeRef, method: &str) -> &mut MethodEntry {
        self.instance(key).method(method)
    }

    /// Looks up an entry without creating it.
    pub fn get(&self, key: &TypeRef) -> Option<&InstanceEntry> {
        self.types.get(key.type_name())?.instances.get(key.instance())
    }

    /// Number of instance entries.
    pub fn len(&self) -> usize {
        self.types.values().map(|entry| entry.instances.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
