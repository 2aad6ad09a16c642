//! # The Container
//!
//! Builds fully wired objects from class descriptors and bindings.
//!
//! # Architecture
//! ```text
//!   make(Type#instance)
//!        │
//!        ▼
//!   singleton cache ──hit──> instance
//!        │ miss
//!        ▼
//!   mapping table ──abstraction──> make(mapped target)
//!        │ none
//!        ▼
//!   factory table ──match──> invoke(factory)
//!        │ none
//!        ▼
//!   create_object ──> resolve constructor parameters ──> make(...) (recursive)
//!        │
//!        ▼
//!   scheduled method calls
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use injecta_container::prelude::*;
//!
//! struct Database { url: String }
//! struct UserRepo { db: Arc<Database> }
//!
//! let mut container = Container::new();
//! container
//!     .register_class(ClassDescriptor::with_constructor(
//!         "Database",
//!         [ParamSpec::new("url")],
//!         |args| Ok(Database { url: args.take("url")? }),
//!     ))
//!     .register_class(ClassDescriptor::with_constructor(
//!         "UserRepo",
//!         [ParamSpec::class("db", "Database")],
//!         |args| Ok(UserRepo { db: args.take("db")? }),
//!     ));
//! container
//!     .get_constructor("Database")
//!     .set_param("url", "postgres://localhost");
//!
//! let repo = container.make_as::<UserRepo>("UserRepo").unwrap();
//! assert_eq!(repo.db.url, "postgres://localhost");
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use injecta_support::rendering::suggest_similar;
use parking_lot::Mutex;
use tracing::{debug, instrument, trace};

use crate::error::{ArgumentNotFoundError, ClassNotFoundError, InjectorError, Result};
use crate::factory::FactoryTable;
use crate::key::TypeRef;
use crate::mapping::MappingTable;
use crate::provider::Provider;
use crate::reflect::{Catalog, ClassDescriptor, ClassKind, Injectable, MethodDescriptor, ParamSpec, Recipe};
use crate::registry::{CONSTRUCTOR, InstanceEntry, MethodEntry, Registry};
use crate::stack::ConstructionStack;
use crate::target::{Receiver, Target, split_method};
use crate::value::{Args, Callable, Instance, Params, Value};

/// How many "did you mean" hints an unknown class reports.
const MAX_SUGGESTIONS: usize = 3;

/// Parameter through which a factory learns the requested type.
pub const FACTORY_TYPE_PARAM: &str = "type_name";

/// Parameter through which a factory learns the requested instance name.
pub const FACTORY_INSTANCE_PARAM: &str = "instance_name";

/// A container shareable across threads; each lock spans whole calls.
pub type SharedContainer = Arc<Mutex<Container>>;

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// The inversion-of-control container.
///
/// All operations take `&mut self`: resolution mutates the singleton
/// cache and the registry. Use [`into_shared`](Container::into_shared)
/// to hand one container to several threads.
#[derive(Clone, Default)]
pub struct Container {
    catalog: Catalog,
    registry: Registry,
    mappings: MappingTable,
    factories: FactoryTable,
}

impl Container {
    /// An empty container with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// A container knowing every type that derived `Injectable`.
    pub fn discover() -> Self {
        Self::with_catalog(Catalog::discover())
    }

    // ── Catalog ──

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn register<T: Injectable>(&mut self) -> &mut Self {
        self.catalog.register_type::<T>();
        self
    }

    pub fn register_class(&mut self, descriptor: ClassDescriptor) -> &mut Self {
        self.catalog.register(descriptor);
        self
    }

    pub fn register_function(&mut self, function: Callable) -> &mut Self {
        self.catalog.register_function(function);
        self
    }

    // ── Aliases ──

    pub fn set_alias(&mut self, alias: impl Into<String>, type_name: impl Into<String>) -> &mut Self {
        self.mappings.set_alias(alias, type_name);
        self
    }

    pub fn add_aliases<K, V>(&mut self, aliases: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.mappings.add_aliases(aliases);
        self
    }

    /// The type an alias points to; `None` when `alias` is not one.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.mappings.resolve_alias(alias)
    }

    // ── Bindings ──

    /// Gets or creates the binding for `type_ref`, aliases applied.
    pub fn get_instance_def(&mut self, type_ref: impl Into<TypeRef>) -> &mut InstanceEntry {
        let key = self.mappings.canonical(type_ref.into());
        self.registry.instance(&key)
    }

    pub fn get_method(&mut self, type_ref: impl Into<TypeRef>, method: &str) -> &mut MethodEntry {
        self.get_instance_def(type_ref).method(method)
    }

    pub fn get_constructor(&mut self, type_ref: impl Into<TypeRef>) -> &mut MethodEntry {
        self.get_instance_def(type_ref).constructor()
    }

    pub fn singleton(&mut self, type_ref: impl Into<TypeRef>, singleton: bool) -> &mut Self {
        self.get_instance_def(type_ref).singleton(singleton);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ── Mappings ──

    /// Binds an interface or abstract class to `Type` or `Type#instance`.
    pub fn set_mapping(&mut self, abstraction: impl Into<String>, concrete: &str) -> &mut Self {
        self.mappings.set_mapping(abstraction, concrete);
        self
    }

    pub fn add_mappings<K, V>(&mut self, mappings: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        self.mappings.add_mappings(mappings);
        self
    }

    // ── Factories ──

    /// Delegates construction of every type matching `pattern` to `factory`.
    ///
    /// The factory receives `type_name` and `instance_name` arguments and
    /// must return an object.
    ///
    /// # Errors
    /// [`InjectorError::InvalidFactoryPattern`] if `pattern` does not compile.
    pub fn set_factory(&mut self, pattern: &str, factory: impl Into<Target>) -> Result<&mut Self> {
        self.factories.set(pattern, factory.into())?;
        Ok(self)
    }

    pub fn add_factories<P, F>(&mut self, factories: impl IntoIterator<Item = (P, F)>) -> Result<&mut Self>
    where
        P: AsRef<str>,
        F: Into<Target>,
    {
        for (pattern, factory) in factories {
            self.factories.set(pattern.as_ref(), factory.into())?;
        }
        Ok(self)
    }

    // ── Shared instances ──

    /// Registers pre-built objects as the singletons of their classes.
    pub fn share(&mut self, instances: impl IntoIterator<Item = Instance>) -> &mut Self {
        for instance in instances {
            let key = TypeRef::of(instance.type_name());
            self.get_instance_def(key).set_instance(instance);
        }
        self
    }

    /// Like [`share`](Self::share), each key naming the instance
    /// (`Type#key`).
    pub fn share_named<K: Into<String>>(
        &mut self,
        instances: impl IntoIterator<Item = (K, Instance)>,
    ) -> &mut Self {
        for (name, instance) in instances {
            let key = TypeRef::named(instance.type_name(), name);
            self.get_instance_def(key).set_instance(instance);
        }
        self
    }

    // ── Providers ──

    /// Lets a [`Provider`] module register its bindings.
    pub fn add_provider(&mut self, provider: &dyn Provider) -> Result<&mut Self> {
        debug!(provider = provider.name(), "Registering provider");
        provider.register(self)?;
        Ok(self)
    }

    /// Wraps the container for cross-thread use.
    pub fn into_shared(self) -> SharedContainer {
        Arc::new(Mutex::new(self))
    }

    // ── Resolution ──

    /// Builds (or returns the cached) instance for `type_ref`.
    ///
    /// ```rust,ignore
    /// let user = container.make("User#admin")?;
    /// ```
    pub fn make(&mut self, type_ref: impl Into<TypeRef>) -> Result<Instance> {
        self.make_with(type_ref, Params::new())
    }

    /// [`make`](Self::make) with explicit constructor arguments, which
    /// take precedence over everything registered.
    pub fn make_with(&mut self, type_ref: impl Into<TypeRef>, params: Params) -> Result<Instance> {
        let type_ref = type_ref.into();
        self.make_root(&type_ref, params)
    }

    /// [`make`](Self::make), viewed as `Arc<T>`; `T` may be a trait object
    /// the class declares.
    pub fn make_as<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        type_ref: impl Into<TypeRef>,
    ) -> Result<Arc<T>> {
        let instance = self.make(type_ref)?;
        instance.get::<T>().ok_or_else(|| InjectorError::TypeMismatch {
            type_name: instance.type_name().to_string(),
            expected: type_name::<T>(),
        })
    }

    /// Calls a function, method or closure with resolved arguments.
    pub fn invoke(&mut self, target: impl Into<Target>) -> Result<Value> {
        self.invoke_with(target, Params::new())
    }

    pub fn invoke_with(&mut self, target: impl Into<Target>, params: Params) -> Result<Value> {
        let target = target.into();
        self.invoke_root(&target, params)
    }

    #[instrument(skip(self, type_ref, params), fields(type_ref = %type_ref), name = "container_make")]
    fn make_root(&mut self, type_ref: &TypeRef, params: Params) -> Result<Instance> {
        let mut stack = ConstructionStack::new();
        self.make_in(type_ref, params, &mut stack)
    }

    #[instrument(skip(self, target, params), fields(target = %target), name = "container_invoke")]
    fn invoke_root(&mut self, target: &Target, params: Params) -> Result<Value> {
        let mut stack = ConstructionStack::new();
        self.invoke_in(target, params, &mut stack)
    }

    fn make_in(
        &mut self,
        type_ref: &TypeRef,
        mut params: Params,
        stack: &mut ConstructionStack,
    ) -> Result<Instance> {
        let key = self.mappings.canonical(type_ref.clone());

        let entry = self.registry.instance(&key);
        if let Some(instance) = entry.cached() {
            trace!(key = %key, "Returning cached instance");
            return Ok(instance.clone());
        }
        let singleton = entry.is_singleton();

        if let Some(target) = self.mapped_target(key.type_name()) {
            debug!(abstraction = %key, concrete = %target, "Following mapping");
            let mut frame = stack.enter(key.type_name())?;
            return self.make_in(&target, params, &mut frame);
        }

        let instance = match self.factories.find(key.type_name()).cloned() {
            Some(factory) => {
                debug!(key = %key, factory = %factory, "Delegating to factory");
                params.insert(FACTORY_TYPE_PARAM.to_string(), key.type_name().into());
                params.insert(FACTORY_INSTANCE_PARAM.to_string(), key.instance().into());

                let value = self.invoke_in(&factory, params, stack)?;
                let found = value.kind();
                value
                    .into_instance()
                    .ok_or_else(|| InjectorError::InvalidFactoryResult {
                        type_name: key.type_name().to_string(),
                        found,
                    })?
            }
            None => self.create_object(&key, params, stack)?,
        };

        if singleton {
            self.registry.instance(&key).set_instance(instance.clone());
        }

        self.run_scheduled_calls(&key, &instance, stack)?;
        Ok(instance)
    }

    fn create_object(
        &mut self,
        key: &TypeRef,
        params: Params,
        stack: &mut ConstructionStack,
    ) -> Result<Instance> {
        stack.check(key.type_name())?;

        let class = self
            .catalog
            .class(key.type_name())
            .cloned()
            .ok_or_else(|| self.class_not_found(key.type_name()))?;

        match class.recipe() {
            Recipe::Abstract => Err(class.unmapped_error()),
            Recipe::Bare(instantiate) => {
                debug!(key = %key, "Instantiating without constructor");
                Ok(class.wrap(instantiate()))
            }
            Recipe::Constructor { params: specs, build } => {
                debug!(key = %key, params = specs.len(), "Constructing");
                let registered = self.registered_params(key, CONSTRUCTOR);

                let mut args = {
                    let mut frame = stack.enter(key.type_name())?;
                    self.resolve_parameters(
                        Some(class.name()),
                        CONSTRUCTOR,
                        specs,
                        params,
                        &registered,
                        &mut frame,
                    )?
                };

                let object = build(&mut args)?;
                Ok(class.wrap(object))
            }
        }
    }

    fn run_scheduled_calls(
        &mut self,
        key: &TypeRef,
        instance: &Instance,
        stack: &mut ConstructionStack,
    ) -> Result<()> {
        let methods: Vec<MethodEntry> = match self.registry.get(key) {
            Some(entry) => entry
                .methods()
                .iter()
                .filter(|method| !method.is_constructor())
                .cloned()
                .collect(),
            None => return Ok(()),
        };
        if methods.is_empty() {
            return Ok(());
        }

        let class = self.catalog.class(instance.type_name()).cloned();
        for method in &methods {
            let descriptor = class
                .as_ref()
                .and_then(|class| class.find_method(method.name()))
                .cloned()
                .ok_or_else(|| InjectorError::MethodNotCallable {
                    type_name: instance.type_name().to_string(),
                    method: method.name().to_string(),
                })?;

            for call in method.calls() {
                trace!(key = %key, method = method.name(), "Running scheduled call");
                self.call_method(
                    instance.type_name(),
                    &descriptor,
                    Some(instance),
                    call.clone(),
                    method.params(),
                    stack,
                )?;
            }
        }
        Ok(())
    }

    fn invoke_in(
        &mut self,
        target: &Target,
        params: Params,
        stack: &mut ConstructionStack,
    ) -> Result<Value> {
        match target {
            Target::Closure(callable) => self.call_callable(callable, params, stack),
            Target::Function(name) => {
                if let Some(function) = self.catalog.function(name).cloned() {
                    return self.call_callable(&function, params, stack);
                }
                let Some((type_name, method)) = split_method(name) else {
                    return Err(InjectorError::FunctionNotFound { name: name.clone() });
                };
                self.call_static(type_name, method, params, stack)
            }
            Target::Method(Receiver::Type(type_name), method) => {
                self.call_static(type_name, method, params, stack)
            }
            Target::Method(Receiver::Instance(instance), method) => {
                let descriptor = self
                    .catalog
                    .class(instance.type_name())
                    .and_then(|class| class.find_method(method))
                    .cloned()
                    .ok_or_else(|| InjectorError::MethodNotCallable {
                        type_name: instance.type_name().to_string(),
                        method: method.clone(),
                    })?;
                let registered = self.registered_params(&TypeRef::of(instance.type_name()), method);
                self.call_method(
                    instance.type_name(),
                    &descriptor,
                    Some(instance),
                    params,
                    &registered,
                    stack,
                )
            }
        }
    }

    /// `Type::method` without a receiver: static methods only.
    fn call_static(
        &mut self,
        type_name: &str,
        method: &str,
        params: Params,
        stack: &mut ConstructionStack,
    ) -> Result<Value> {
        let type_name = self.mappings.resolve_alias(type_name).unwrap_or(type_name).to_string();
        let class = self
            .catalog
            .class(&type_name)
            .cloned()
            .ok_or_else(|| self.class_not_found(&type_name))?;
        let descriptor = class
            .find_method(method)
            .cloned()
            .ok_or_else(|| InjectorError::MethodNotCallable {
                type_name: type_name.clone(),
                method: method.to_string(),
            })?;

        let registered = self.registered_params(&TypeRef::of(&type_name), method);
        self.call_method(&type_name, &descriptor, None, params, &registered, stack)
    }

    fn call_method(
        &mut self,
        owner: &str,
        method: &MethodDescriptor,
        receiver: Option<&Instance>,
        params: Params,
        registered: &Params,
        stack: &mut ConstructionStack,
    ) -> Result<Value> {
        let mut args = self.resolve_parameters(
            Some(owner),
            method.name(),
            method.params(),
            params,
            registered,
            stack,
        )?;
        method.call(receiver, &mut args)
    }

    fn call_callable(
        &mut self,
        callable: &Callable,
        params: Params,
        stack: &mut ConstructionStack,
    ) -> Result<Value> {
        let mut args = self.resolve_parameters(
            None,
            callable.name(),
            callable.params(),
            params,
            &Params::new(),
            stack,
        )?;
        callable.call(&mut args)
    }

    /// Resolves every declared parameter: explicit argument first, then
    /// the registered value, auto-wiring and the declared default.
    fn resolve_parameters(
        &mut self,
        owner: Option<&str>,
        method: &str,
        specs: &[ParamSpec],
        mut explicit: Params,
        registered: &Params,
        stack: &mut ConstructionStack,
    ) -> Result<Args> {
        let mut values = Vec::with_capacity(specs.len());

        for spec in specs {
            let value = match explicit.remove(spec.name()) {
                Some(value) => {
                    trace!(param = spec.name(), "Using explicit argument");
                    self.resolve_value(spec, value, stack)?
                }
                None => self.resolve_parameter(owner, method, spec, registered, stack)?,
            };
            values.push((spec.name().to_string(), value));
        }

        Ok(Args::new(owner, method, values))
    }

    fn resolve_parameter(
        &mut self,
        owner: Option<&str>,
        method: &str,
        spec: &ParamSpec,
        registered: &Params,
        stack: &mut ConstructionStack,
    ) -> Result<Value> {
        if let Some(value) = registered.get(spec.name()) {
            trace!(param = spec.name(), "Using registered value");
            return self.resolve_value(spec, value.clone(), stack);
        }

        if let Some(class) = spec.class_name() {
            let declared = spec.class_kind().unwrap_or(ClassKind::Concrete);
            return match self.autowire(class, declared, stack) {
                Ok(instance) => Ok(Value::Object(instance)),
                Err(err) if err.is_resolution_error() => match spec.default() {
                    Some(default) => {
                        debug!(
                            param = spec.name(),
                            class,
                            error = %err,
                            "Auto-wiring failed, using default"
                        );
                        Ok(default.clone())
                    }
                    None => Err(err),
                },
                Err(err) => Err(err),
            };
        }

        if let Some(default) = spec.default() {
            trace!(param = spec.name(), "Using default value");
            return Ok(default.clone());
        }

        Err(InjectorError::ArgumentNotFound(ArgumentNotFoundError {
            owner: owner.map(str::to_string),
            method: method.to_string(),
            param: spec.name().to_string(),
        }))
    }

    /// Final value for a supplied raw value.
    fn resolve_value(
        &mut self,
        spec: &ParamSpec,
        value: Value,
        stack: &mut ConstructionStack,
    ) -> Result<Value> {
        match value {
            Value::Str(reference) if spec.class_name().is_some() => {
                let instance = self.make_in(&TypeRef::parse(&reference), Params::new(), stack)?;
                Ok(Value::Object(instance))
            }
            Value::Callable(callable) if !spec.accepts_callable() => {
                trace!(param = spec.name(), callable = callable.name(), "Invoking lazy value");
                self.call_callable(&callable, Params::new(), stack)
            }
            other => Ok(other),
        }
    }

    /// Builds an instance for a class-typed parameter with no value.
    ///
    /// The catalog's kind for `class` wins over the `declared` one. An
    /// abstraction with neither a mapping nor a factory fails here.
    fn autowire(
        &mut self,
        class: &str,
        declared: ClassKind,
        stack: &mut ConstructionStack,
    ) -> Result<Instance> {
        let kind = self.catalog.class(class).map_or(declared, |descriptor| descriptor.kind());
        let servable = kind == ClassKind::Concrete
            || self.mappings.resolve(class).is_some()
            || self.factories.find(class).is_some();
        if !servable {
            return Err(kind.unmapped_error(class));
        }
        self.make_in(&TypeRef::of(class), Params::new(), stack)
    }

    /// Where a mapping sends `type_name`, unless the catalog can build
    /// it directly.
    fn mapped_target(&self, type_name: &str) -> Option<TypeRef> {
        if self
            .catalog
            .class(type_name)
            .is_some_and(|class| class.is_instantiable())
        {
            return None;
        }
        self.mappings.resolve(type_name).cloned()
    }

    fn registered_params(&self, key: &TypeRef, method: &str) -> Params {
        self.registry
            .get(key)
            .and_then(|entry| entry.find_method(method))
            .map(|method| method.params().clone())
            .unwrap_or_default()
    }

    fn class_not_found(&self, type_name: &str) -> InjectorError {
        InjectorError::ClassNotFound(ClassNotFoundError {
            type_name: type_name.to_string(),
            suggestions: suggest_similar(type_name, &self.catalog.class_names(), MAX_SUGGESTIONS),
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("classes", &self.catalog.len())
            .field("bindings", &self.registry.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, SharedContainer};
    pub use crate::config::ContainerConfig;
    pub use crate::error::{InjectorError, Result};
    pub use crate::key::TypeRef;
    pub use crate::params;
    pub use crate::provider::Provider;
    pub use crate::reflect::{Catalog, ClassDescriptor, Injectable, ParamSpec};
    pub use crate::target::Target;
    pub use crate::value::{Args, Callable, FromValue, Instance, Params, Value};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

    struct Engine;

    struct Car {
        engine: Arc<Engine>,
        model: String,
    }

    trait Logger: Send + Sync {
        fn name(&self) -> &str;
    }

    struct FileLogger;

    impl Logger for FileLogger {
        fn name(&self) -> &str {
            "file"
        }
    }

    struct Service {
        logger: Option<Arc<dyn Logger>>,
    }

    struct Counter {
        count: AtomicI64,
    }

    struct Node;

    fn engine() -> ClassDescriptor {
        ClassDescriptor::without_constructor("Engine", || Engine)
    }

    fn car() -> ClassDescriptor {
        ClassDescriptor::with_constructor(
            "Car",
            [
                ParamSpec::class("engine", "Engine"),
                ParamSpec::new("model").with_default("basic"),
            ],
            |args| {
                Ok(Car {
                    engine: args.take("engine")?,
                    model: args.take("model")?,
                })
            },
        )
    }

    fn file_logger() -> ClassDescriptor {
        ClassDescriptor::without_constructor("FileLogger", || FileLogger)
            .implements("Logger", |l: Arc<FileLogger>| l as Arc<dyn Logger>)
    }

    fn service(optional: bool) -> ClassDescriptor {
        let logger = ParamSpec::class("logger", "Logger");
        let logger = if optional { logger.optional() } else { logger };
        ClassDescriptor::with_constructor("Service", [logger], |args| {
            Ok(Service {
                logger: args.take("logger")?,
            })
        })
    }

    fn counter() -> ClassDescriptor {
        ClassDescriptor::with_constructor(
            "Counter",
            [ParamSpec::new("start").with_default(0)],
            |args| {
                Ok(Counter {
                    count: AtomicI64::new(args.take("start")?),
                })
            },
        )
        .method("increment", [ParamSpec::new("step").with_default(1)], |this: &Counter, args| {
            let step: i64 = args.take("step")?;
            Ok(this.count.fetch_add(step, Ordering::SeqCst) + step)
        })
        .static_method("zero", [], |_| Ok(0))
    }

    fn node(name: &str, next: &str) -> ClassDescriptor {
        ClassDescriptor::with_constructor(name, [ParamSpec::class("next", next)], |_| Ok(Node))
    }

    fn container() -> Container {
        let mut container = Container::new();
        container
            .register_class(engine())
            .register_class(car())
            .register_class(file_logger())
            .register_class(counter());
        container
    }

    fn count(instance: &Instance) -> i64 {
        instance
            .downcast_ref::<Counter>()
            .unwrap()
            .count
            .load(Ordering::SeqCst)
    }

    #[test]
    fn make_class_without_constructor() {
        let mut container = container();
        let engine = container.make("Engine").unwrap();
        assert_eq!(engine.type_name(), "Engine");
        assert!(engine.downcast_ref::<Engine>().is_some());
    }

    #[test]
    fn singleton_by_default() {
        let mut container = container();
        let a = container.make("Car").unwrap();
        let b = container.make("Car").unwrap();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn non_singleton_builds_fresh() {
        let mut container = container();
        container.singleton("Car", false);
        let a = container.make("Car").unwrap();
        let b = container.make("Car").unwrap();
        assert!(!a.ptr_eq(&b));

        // The engine stays shared
        let (a, b) = (a.get::<Car>().unwrap(), b.get::<Car>().unwrap());
        assert!(Arc::ptr_eq(&a.engine, &b.engine));
    }

    #[test]
    fn named_instances_are_independent() {
        let mut container = container();
        container.get_constructor("Car#sport").set_param("model", "gt");

        let basic = container.make_as::<Car>("Car").unwrap();
        let sport = container.make_as::<Car>("Car#sport").unwrap();
        assert_eq!(basic.model, "basic");
        assert_eq!(sport.model, "gt");
        assert!(!Arc::ptr_eq(&basic, &sport));
    }

    #[test]
    fn explicit_args_beat_registered_values() {
        let mut container = container();
        container.singleton("Car", false);
        container.get_constructor("Car").set_param("model", "registered");

        let car = container.make_as::<Car>("Car").unwrap();
        assert_eq!(car.model, "registered");

        let car = container
            .make_with("Car", params! { "model" => "explicit" })
            .unwrap();
        assert_eq!(car.get::<Car>().unwrap().model, "explicit");
    }

    #[test]
    fn unmapped_interface_fails() {
        let mut container = container();
        container.register_class(service(false));
        match container.make("Service").unwrap_err() {
            InjectorError::UnmappedInterface { interface } => assert_eq!(interface, "Logger"),
            other => panic!("Expected UnmappedInterface, got: {other:?}"),
        }
    }

    #[test]
    fn unmapped_interface_falls_back_to_default() {
        let mut container = container();
        container.register_class(service(true));
        let service = container.make_as::<Service>("Service").unwrap();
        assert!(service.logger.is_none());
    }

    #[test]
    fn mapped_interface_is_injected() {
        let mut container = container();
        container.register_class(service(false));
        container.set_mapping("Logger", "FileLogger");

        let service = container.make_as::<Service>("Service").unwrap();
        assert_eq!(service.logger.as_ref().unwrap().name(), "file");

        // The interface itself resolves through the mapping too
        let logger = container.make_as::<dyn Logger>("Logger").unwrap();
        assert_eq!(logger.name(), "file");
    }

    fn repository() -> ClassDescriptor {
        ClassDescriptor::with_constructor("Repository", [ParamSpec::interface("cache", "Cache")], |_| {
            Ok(Node)
        })
    }

    #[test]
    fn interface_param_without_implementer_is_unmapped() {
        let mut container = container();
        container.register_class(repository());
        assert!(!container.catalog().contains_class("Cache"));

        match container.make("Repository").unwrap_err() {
            InjectorError::UnmappedInterface { interface } => assert_eq!(interface, "Cache"),
            other => panic!("Expected UnmappedInterface, got: {other:?}"),
        }
    }

    #[test]
    fn mapping_applies_to_uncatalogued_interface() {
        let mut container = container();
        container.register_class(repository());
        container.set_mapping("Cache", "Engine");

        let cache = container.make("Cache").unwrap();
        assert_eq!(cache.type_name(), "Engine");
        assert!(cache.ptr_eq(&container.make("Engine").unwrap()));
        assert!(container.make("Repository").is_ok());
    }

    #[test]
    fn interface_param_served_by_factory() {
        let mut container = container();
        container.register_class(repository());
        container
            .set_factory("^Cache$", Callable::thunk(|| Instance::named("MemoryCache", Engine)))
            .unwrap();
        assert!(container.make("Repository").is_ok());
    }

    #[test]
    fn mapping_loop_is_circular() {
        let mut container = Container::new();
        container.set_mapping("Cache", "Store").set_mapping("Store", "Cache");
        assert!(matches!(
            container.make("Cache"),
            Err(InjectorError::CircularDependency(_))
        ));
    }

    #[test]
    fn autowiring_beats_default() {
        struct Garage {
            engine: Option<Arc<Engine>>,
        }

        let mut container = container();
        container.register_class(ClassDescriptor::with_constructor(
            "Garage",
            [ParamSpec::class("engine", "Engine").optional()],
            |args| {
                Ok(Garage {
                    engine: args.take("engine")?,
                })
            },
        ));

        let garage = container.make_as::<Garage>("Garage").unwrap();
        let engine = container.make_as::<Engine>("Engine").unwrap();
        assert!(Arc::ptr_eq(garage.engine.as_ref().unwrap(), &engine));
    }

    #[test]
    fn construction_failure_is_not_defaulted() {
        let mut container = container();
        container
            .register_class(ClassDescriptor::with_constructor("Battery", [], |_| {
                Err::<Engine, _>(InjectorError::construction("Battery", "cell failure"))
            }))
            .register_class(ClassDescriptor::with_constructor(
                "Torch",
                [ParamSpec::class("battery", "Battery").optional()],
                |_| Ok(Node),
            ));

        match container.make("Torch").unwrap_err() {
            InjectorError::ConstructionFailed { type_name, source } => {
                assert_eq!(type_name, "Battery");
                assert_eq!(source.to_string(), "cell failure");
            }
            other => panic!("Expected ConstructionFailed, got: {other:?}"),
        }
    }

    #[test]
    fn circular_dependency_reports_chain() {
        let mut container = Container::new();
        container
            .register_class(node("A", "B"))
            .register_class(node("B", "C"))
            .register_class(node("C", "A"));

        for _ in 0..2 {
            match container.make("A").unwrap_err() {
                InjectorError::CircularDependency(err) => {
                    assert_eq!(err.chain_string(), "A -> B -> C -> A");
                }
                other => panic!("Expected CircularDependency, got: {other:?}"),
            }
        }
    }

    #[test]
    fn circular_dependency_with_default_is_swallowed() {
        let mut container = Container::new();
        container.register_class(ClassDescriptor::with_constructor(
            "Tree",
            [ParamSpec::class("parent", "Tree").optional()],
            |_| Ok(Node),
        ));
        assert!(container.make("Tree").is_ok());
    }

    #[test]
    fn class_not_found_suggests() {
        let mut container = container();
        match container.make("car").unwrap_err() {
            InjectorError::ClassNotFound(err) => {
                assert_eq!(err.type_name, "car");
                assert_eq!(err.suggestions.first().map(String::as_str), Some("Car"));
            }
            other => panic!("Expected ClassNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn factory_replaces_constructor() {
        let built = Arc::new(AtomicU32::new(0));
        let mut container = container();
        container.register_class(ClassDescriptor::with_constructor("Gadget", [], {
            let built = built.clone();
            move |_| {
                built.fetch_add(1, Ordering::SeqCst);
                Ok(Engine)
            }
        }));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let factory = Callable::closure(
            [ParamSpec::new("type_name"), ParamSpec::new("instance_name")],
            {
                let seen = seen.clone();
                move |args| {
                    let type_name: String = args.take("type_name")?;
                    let instance_name: String = args.take("instance_name")?;
                    seen.lock().push(format!("{type_name}#{instance_name}"));
                    Ok(Instance::named(&type_name, Engine))
                }
            },
        );
        container.set_factory("^Gad", factory).unwrap();

        let gadget = container.make("Gadget#x").unwrap();
        assert_eq!(gadget.type_name(), "Gadget");
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(*seen.lock(), vec!["Gadget#x".to_string()]);
    }

    #[test]
    fn factory_must_return_object() {
        let mut container = container();
        container
            .set_factory("Engine", Callable::thunk(|| 42))
            .unwrap();
        assert!(matches!(
            container.make("Engine"),
            Err(InjectorError::InvalidFactoryResult { found: "int", .. })
        ));
    }

    #[test]
    fn scheduled_calls_run_in_order() {
        let mut container = container();
        container
            .get_method("Counter", "increment")
            .add_call(params! {})
            .add_call(params! { "step" => 10 });

        let counter = container.make("Counter").unwrap();
        assert_eq!(count(&counter), 11);

        // Cached: calls do not run again
        let counter = container.make("Counter").unwrap();
        assert_eq!(count(&counter), 11);
    }

    #[test]
    fn scheduled_call_uses_registered_params() {
        let mut container = container();
        container
            .get_method("Counter", "increment")
            .set_param("step", 5)
            .add_call(params! {})
            .add_call(params! {});
        let counter = container.make("Counter").unwrap();
        assert_eq!(count(&counter), 10);
    }

    #[test]
    fn unknown_scheduled_method_is_not_callable() {
        let mut container = container();
        container.get_method("Counter", "reset").add_call(params! {});
        match container.make("Counter").unwrap_err() {
            InjectorError::MethodNotCallable { type_name, method } => {
                assert_eq!(type_name, "Counter");
                assert_eq!(method, "reset");
            }
            other => panic!("Expected MethodNotCallable, got: {other:?}"),
        }
    }

    #[test]
    fn invoke_forms() {
        let mut container = container();
        container.register_function(Callable::new(
            "add",
            [ParamSpec::new("a"), ParamSpec::new("b")],
            |args| Ok(args.take::<i64>("a")? + args.take::<i64>("b")?),
        ));

        assert_eq!(
            container.invoke_with("add", params! { "a" => 2, "b" => 3 }).unwrap(),
            Value::Int(5)
        );
        assert_eq!(container.invoke("Counter::zero").unwrap(), Value::Int(0));
        assert_eq!(container.invoke(("Counter", "zero")).unwrap(), Value::Int(0));

        let counter = container.make("Counter").unwrap();
        assert_eq!(
            container
                .invoke_with((&counter, "increment"), params! { "step" => 3 })
                .unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn invoke_errors() {
        let mut container = container();
        assert!(matches!(
            container.invoke("missing"),
            Err(InjectorError::FunctionNotFound { .. })
        ));
        // Instance methods need a receiver
        assert!(matches!(
            container.invoke("Counter::increment"),
            Err(InjectorError::MethodNotCallable { .. })
        ));
        assert!(matches!(
            container.invoke("Counter::reset"),
            Err(InjectorError::MethodNotCallable { .. })
        ));
    }

    #[test]
    fn missing_argument_names_callsite() {
        let mut container = Container::new();
        let err = container
            .invoke(Callable::closure([ParamSpec::new("param")], |args| {
                args.take::<Value>("param")
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "No parameter found for {closure}()::$param.");
    }

    #[test]
    fn lazy_values_are_invoked() {
        let mut container = container();
        container.singleton("Car", false);
        container
            .get_constructor("Car")
            .set_param("model", Callable::thunk(|| "lazy"));
        assert_eq!(container.make_as::<Car>("Car").unwrap().model, "lazy");

        // Callable parameters receive the closure itself
        let value = container
            .invoke_with(
                Callable::closure([ParamSpec::callable("f")], |args| {
                    let f: Callable = args.take("f")?;
                    Ok(f.name().to_string())
                }),
                params! { "f" => Callable::new("named", [], |_| Ok(1)) },
            )
            .unwrap();
        assert_eq!(value, Value::Str("named".into()));
    }

    #[test]
    fn string_for_class_param_is_made() {
        let mut container = container();
        container.share_named([("spare", Instance::named("Engine", Engine))]);
        let spare = container.make("Engine#spare").unwrap();

        container.get_constructor("Car").set_param("engine", "Engine#spare");
        let car = container.make_as::<Car>("Car").unwrap();
        assert!(Arc::ptr_eq(&car.engine, &spare.get::<Engine>().unwrap()));
    }

    #[test]
    fn shared_instance_is_returned() {
        let mut container = container();
        let engine = Instance::named("Engine", Engine);
        container.share([engine.clone()]);
        assert!(container.make("Engine").unwrap().ptr_eq(&engine));
    }

    #[test]
    fn aliases_apply_everywhere() {
        let mut container = container();
        container.set_alias("Auto", "Car").set_alias("Tally", "Counter");

        container.get_constructor("Auto").set_param("model", "aliased");
        assert_eq!(container.make_as::<Car>("Car").unwrap().model, "aliased");
        assert!(
            container
                .make("Auto")
                .unwrap()
                .ptr_eq(&container.make("Car").unwrap())
        );
        assert_eq!(container.invoke("Tally::zero").unwrap(), Value::Int(0));
    }

    #[test]
    fn make_as_type_mismatch() {
        let mut container = container();
        assert!(matches!(
            container.make_as::<Car>("Engine"),
            Err(InjectorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn shared_container_across_threads() {
        let shared = container().into_shared();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.lock().make("Engine").unwrap())
            })
            .collect();
        let engines: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(engines.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    }

    #[test]
    fn debug_display() {
        let container = container();
        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("classes: 5"));
    }
}
