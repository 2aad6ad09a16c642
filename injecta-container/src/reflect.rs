//! Class and function metadata.
//!
//! The container never inspects Rust types directly. Everything it
//! knows about a class comes from its [`ClassDescriptor`]: kind,
//! constructor parameters, implemented interfaces and callable methods.
//! Descriptors are collected in a [`Catalog`], either registered by hand
//! or discovered from types deriving `Injectable`.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{InjectorError, Result};
use crate::value::{Args, Callable, Instance, Object, Upcast, Value};

type InstantiateFn = Arc<dyn Fn() -> Object + Send + Sync>;

type BuildFn = Arc<dyn Fn(&mut Args) -> Result<Object> + Send + Sync>;

type MethodFn = Arc<dyn Fn(Option<&Instance>, &mut Args) -> Result<Value> + Send + Sync>;

// ═══════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════

/// Declared type of a parameter, as far as resolution cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Scalars and anything without a class; never auto-wired.
    Any,
    /// A class, interface or abstract class; auto-wired when no value is
    /// supplied. `kind` is what the declaration says, used when the
    /// catalog has no descriptor for `name`.
    Class { name: String, kind: ClassKind },
    /// Accepts a closure as-is instead of invoking it.
    Callable,
}

/// One declared parameter of a constructor, method, function or closure.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    ty: ParamType,
    default: Option<Value>,
}

impl ParamSpec {
    /// An untyped parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Any,
            default: None,
        }
    }

    /// A parameter typed as a concrete class.
    pub fn class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::typed(name, class, ClassKind::Concrete)
    }

    /// A parameter typed as an interface, such as `Arc<dyn Cache>`.
    pub fn interface(name: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::typed(name, interface, ClassKind::Interface)
    }

    pub fn abstract_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::typed(name, class, ClassKind::Abstract)
    }

    fn typed(name: impl Into<String>, class: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            ty: ParamType::Class {
                name: class.into(),
                kind,
            },
            ..Self::new(name)
        }
    }

    /// A parameter that takes closures unevaluated.
    pub fn callable(name: impl Into<String>) -> Self {
        Self {
            ty: ParamType::Callable,
            ..Self::new(name)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Shorthand for a `Null` default.
    pub fn optional(self) -> Self {
        self.with_default(Value::Null)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.ty {
            ParamType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Declared kind of a class-typed parameter.
    pub fn class_kind(&self) -> Option<ClassKind> {
        match &self.ty {
            ParamType::Class { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn accepts_callable(&self) -> bool {
        self.ty == ParamType::Callable
    }
}

// ═══════════════════════════════════════════
// Classes
// ═══════════════════════════════════════════

/// What kind of type a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Concrete,
    Interface,
    Abstract,
}

impl ClassKind {
    /// The error for resolving an abstraction of this kind that has no
    /// mapping.
    pub(crate) fn unmapped_error(self, name: &str) -> InjectorError {
        match self {
            ClassKind::Abstract => InjectorError::UnmappedAbstractClass {
                class: name.to_string(),
            },
            _ => InjectorError::UnmappedInterface {
                interface: name.to_string(),
            },
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Concrete => write!(f, "concrete"),
            ClassKind::Interface => write!(f, "interface"),
            ClassKind::Abstract => write!(f, "abstract"),
        }
    }
}

/// How an instance of a class comes into existence.
#[derive(Clone)]
pub(crate) enum Recipe {
    /// No constructor: built without arguments.
    Bare(InstantiateFn),
    /// Constructor with declared parameters.
    Constructor {
        params: Arc<[ParamSpec]>,
        build: BuildFn,
    },
    /// Interfaces and abstract classes.
    Abstract,
}

/// A callable method of a class.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    params: Arc<[ParamSpec]>,
    is_static: bool,
    body: MethodFn,
}

impl MethodDescriptor {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Static methods are invoked without a receiver.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub(crate) fn call(&self, receiver: Option<&Instance>, args: &mut Args) -> Result<Value> {
        (self.body)(receiver, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Everything the container knows about one class.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use injecta_container::reflect::{ClassDescriptor, ClassKind, ParamSpec};
///
/// trait Greeter: Send + Sync {}
/// struct Polite { name: String }
/// impl Greeter for Polite {}
///
/// let class = ClassDescriptor::with_constructor(
///     "Polite",
///     [ParamSpec::new("name")],
///     |args| Ok(Polite { name: args.take("name")? }),
/// )
/// .implements("Greeter", |p: Arc<Polite>| p as Arc<dyn Greeter>)
/// .method("name", [], |this: &Polite, _| Ok(this.name.clone()));
///
/// assert_eq!(class.kind(), ClassKind::Concrete);
/// assert_eq!(class.interfaces().collect::<Vec<_>>(), vec!["Greeter"]);
/// assert!(class.has_method("name"));
/// ```
#[derive(Clone)]
pub struct ClassDescriptor {
    name: Arc<str>,
    kind: ClassKind,
    recipe: Recipe,
    methods: HashMap<String, MethodDescriptor>,
    upcasts: Vec<Upcast>,
}

impl ClassDescriptor {
    /// A concrete class built without arguments.
    pub fn without_constructor<T, F>(name: impl Into<String>, instantiate: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(name.into());
        Self {
            upcasts: vec![Upcast::identity::<T>(&name)],
            name,
            kind: ClassKind::Concrete,
            recipe: Recipe::Bare(Arc::new(move || Arc::new(instantiate()) as Object)),
            methods: HashMap::new(),
        }
    }

    /// A concrete class whose constructor takes `params`.
    ///
    /// `build` receives the resolved arguments in declaration order.
    pub fn with_constructor<T, F>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        build: F,
    ) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Args) -> Result<T> + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(name.into());
        Self {
            upcasts: vec![Upcast::identity::<T>(&name)],
            name,
            kind: ClassKind::Concrete,
            recipe: Recipe::Constructor {
                params: params.into_iter().collect(),
                build: Arc::new(move |args: &mut Args| {
                    build(args).map(|value| Arc::new(value) as Object)
                }),
            },
            methods: HashMap::new(),
        }
    }

    /// An interface: never instantiated, only mapped.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::abstraction(name, ClassKind::Interface)
    }

    /// An abstract class: never instantiated, only mapped.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::abstraction(name, ClassKind::Abstract)
    }

    fn abstraction(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: Arc::from(name.into()),
            kind,
            recipe: Recipe::Abstract,
            methods: HashMap::new(),
            upcasts: Vec::new(),
        }
    }

    /// Declares that instances can be viewed as `interface`.
    ///
    /// `cast` is usually `|x: Arc<T>| x as Arc<dyn Trait>`.
    pub fn implements<T, I, F>(mut self, interface: impl Into<String>, cast: F) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let interface = interface.into();
        self.upcasts.retain(|upcast| upcast.target() != interface);
        self.upcasts.push(Upcast::interface(&interface, cast));
        self
    }

    /// Adds an instance method.
    pub fn method<T, V, F>(
        self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        body: F,
    ) -> Self
    where
        T: Send + Sync + 'static,
        V: Into<Value>,
        F: Fn(&T, &mut Args) -> Result<V> + Send + Sync + 'static,
    {
        let name = name.into();
        let class = self.name.clone();
        let method = name.clone();
        let body: MethodFn = Arc::new(move |receiver: Option<&Instance>, args: &mut Args| {
            let Some(receiver) = receiver else {
                return Err(InjectorError::MethodNotCallable {
                    type_name: class.to_string(),
                    method: method.clone(),
                });
            };
            let this = receiver
                .downcast_ref::<T>()
                .ok_or_else(|| InjectorError::TypeMismatch {
                    type_name: receiver.type_name().to_string(),
                    expected: type_name::<T>(),
                })?;
            body(this, args).map(Into::into)
        });
        self.add_method(name, params, false, body)
    }

    /// Adds a static method, invoked without a receiver.
    pub fn static_method<V, F>(
        self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        body: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&mut Args) -> Result<V> + Send + Sync + 'static,
    {
        let body: MethodFn = Arc::new(move |_: Option<&Instance>, args: &mut Args| {
            body(args).map(Into::into)
        });
        self.add_method(name.into(), params, true, body)
    }

    fn add_method(
        mut self,
        name: String,
        params: impl IntoIterator<Item = ParamSpec>,
        is_static: bool,
        body: MethodFn,
    ) -> Self {
        self.methods.insert(
            name.clone(),
            MethodDescriptor {
                name,
                params: params.into_iter().collect(),
                is_static,
                body,
            },
        );
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete
    }

    /// Constructor parameters; `None` for classes without a constructor
    /// and for abstractions.
    pub fn constructor_params(&self) -> Option<&[ParamSpec]> {
        match &self.recipe {
            Recipe::Constructor { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Declared interfaces, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.upcasts
            .iter()
            .map(Upcast::target)
            .filter(move |target| *target != &*self.name)
    }

    pub(crate) fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub(crate) fn shared_upcasts(&self) -> Arc<[Upcast]> {
        Arc::from(self.upcasts.as_slice())
    }

    /// Wraps a freshly built object as an instance of this class.
    pub(crate) fn wrap(&self, object: Object) -> Instance {
        Instance::from_parts(self.name.clone(), object, self.shared_upcasts())
    }

    /// The error reported when this abstraction has no mapping.
    pub(crate) fn unmapped_error(&self) -> InjectorError {
        self.kind.unmapped_error(&self.name)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor_params())
            .field("methods", &self.method_names())
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Injectable
// ═══════════════════════════════════════════

/// Types that describe themselves to the container.
///
/// Usually derived with `#[derive(Injectable)]`, which also registers the
/// type for [`Catalog::discover`].
pub trait Injectable: Send + Sync + 'static {
    /// Class name used in type references and errors.
    const TYPE_NAME: &'static str;

    fn descriptor() -> ClassDescriptor;
}

/// Link-time registration record emitted by the derive macro.
pub struct ClassRegistration {
    describe: fn() -> ClassDescriptor,
}

impl ClassRegistration {
    pub const fn new(describe: fn() -> ClassDescriptor) -> Self {
        Self { describe }
    }

    pub fn describe(&self) -> ClassDescriptor {
        (self.describe)()
    }
}

inventory::collect!(ClassRegistration);

// ═══════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════

/// Known classes and free functions, by name.
#[derive(Clone, Default)]
pub struct Catalog {
    classes: HashMap<String, Arc<ClassDescriptor>>,
    functions: HashMap<String, Callable>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every type that derived `Injectable` in the
    /// final binary.
    pub fn discover() -> Self {
        let mut catalog = Self::new();
        for registration in inventory::iter::<ClassRegistration> {
            catalog.register(registration.describe());
        }
        info!(classes = catalog.len(), "Discovered injectable classes");
        catalog
    }

    /// Registers a class, replacing any previous descriptor of that name.
    ///
    /// Interfaces it declares become known as well, unless already
    /// registered.
    pub fn register(&mut self, descriptor: ClassDescriptor) -> &mut Self {
        for interface in descriptor.interfaces() {
            self.classes
                .entry(interface.to_string())
                .or_insert_with(|| Arc::new(ClassDescriptor::interface(interface)));
        }

        debug!(
            class = descriptor.name(),
            kind = %descriptor.kind(),
            "Registered class"
        );
        self.classes
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        self
    }

    pub fn register_type<T: Injectable>(&mut self) -> &mut Self {
        self.register(T::descriptor())
    }

    /// Registers a free function under its name.
    pub fn register_function(&mut self, function: Callable) -> &mut Self {
        debug!(function = function.name(), "Registered function");
        self.functions.insert(function.name().to_string(), function);
        self
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("classes", &self.classes.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}
