//! Dynamic values flowing through resolution.
//!
//! The container works on type-erased values: scalars coming from
//! configuration, shared object [`Instance`]s produced by `make`, and
//! [`Callable`]s that are invoked lazily at injection time. Constructor
//! and method bodies get their resolved arguments back as typed Rust
//! values through [`Args::take`] and the [`FromValue`] trait.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ArgumentNotFoundError, InjectorError, Result};
use crate::reflect::{Injectable, ParamSpec};

/// A shared, type-erased object.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Explicit arguments keyed by parameter name.
pub type Params = HashMap<String, Value>;

/// Name given to closures created without an explicit name.
pub const CLOSURE_NAME: &str = "{closure}";

type CastFn = Arc<dyn Fn(&Object) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

type CallFn = Arc<dyn Fn(&mut Args) -> Result<Value> + Send + Sync>;

// ═══════════════════════════════════════════
// Upcast
// ═══════════════════════════════════════════

/// A view of an object as `Arc<T>` for some concrete type or trait object.
///
/// Every class carries the identity view first, followed by one view per
/// implemented interface.
#[derive(Clone)]
pub struct Upcast {
    target: Arc<str>,
    cast: CastFn,
}

impl Upcast {
    /// View of the concrete type itself.
    pub(crate) fn identity<T: Send + Sync + 'static>(type_name: &str) -> Self {
        Self {
            target: Arc::from(type_name),
            cast: Arc::new(|object: &Object| {
                object
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|concrete| Box::new(concrete) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    /// View of a concrete `T` as the interface `I`.
    pub(crate) fn interface<T, I, F>(interface: &str, cast: F) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        Self {
            target: Arc::from(interface),
            cast: Arc::new(move |object: &Object| {
                object
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|concrete| Box::new(cast(concrete)) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    /// The class or interface name this view produces.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Debug for Upcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Upcast").field(&self.target).finish()
    }
}

// ═══════════════════════════════════════════
// Instance
// ═══════════════════════════════════════════

/// A constructed object together with its class name.
///
/// Cloning an `Instance` clones the handle, not the object: two clones
/// are [`ptr_eq`](Instance::ptr_eq).
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    object: Object,
    upcasts: Arc<[Upcast]>,
}

impl Instance {
    /// Wraps a value of an [`Injectable`] type.
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value of an [`Injectable`] type.
    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Self {
            type_name: Arc::from(T::TYPE_NAME),
            object: value,
            upcasts: T::descriptor().shared_upcasts(),
        }
    }

    /// Wraps any value under an explicit class name.
    ///
    /// Only the concrete view is available; use [`Instance::new`] for
    /// types that implement interfaces.
    pub fn named<T: Send + Sync + 'static>(type_name: &str, value: T) -> Self {
        Self {
            type_name: Arc::from(type_name),
            object: Arc::new(value),
            upcasts: Arc::from(vec![Upcast::identity::<T>(type_name)]),
        }
    }

    pub(crate) fn from_parts(type_name: Arc<str>, object: Object, upcasts: Arc<[Upcast]>) -> Self {
        Self {
            type_name,
            object,
            upcasts,
        }
    }

    /// The class this object was built as.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The underlying type-erased object.
    #[inline]
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Views the object as `Arc<T>`, where `T` is its concrete type or
    /// one of the interfaces its class declares.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.upcasts.iter().find_map(|upcast| {
            (upcast.cast)(&self.object)?
                .downcast::<Arc<T>>()
                .ok()
                .map(|view| *view)
        })
    }

    /// Borrows the object as its concrete type.
    pub fn downcast_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Pointer identity.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.object), Arc::as_ptr(&other.object))
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.type_name).finish()
    }
}

// ═══════════════════════════════════════════
// Callable
// ═══════════════════════════════════════════

/// A closure with declared parameters.
///
/// Parameters are resolved by the container exactly like constructor
/// parameters before the body runs.
///
/// ```
/// use injecta_container::reflect::ParamSpec;
/// use injecta_container::value::{Callable, Value};
///
/// let add = Callable::new("add", [ParamSpec::new("a"), ParamSpec::new("b")], |args| {
///     Ok(args.take::<i64>("a")? + args.take::<i64>("b")?)
/// });
/// assert_eq!(add.name(), "add");
/// assert_eq!(add.params().len(), 2);
///
/// let lazy = Callable::thunk(|| "computed");
/// assert!(lazy.params().is_empty());
/// ```
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    params: Arc<[ParamSpec]>,
    body: CallFn,
}

impl Callable {
    /// Creates a named callable.
    pub fn new<V, F>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        body: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&mut Args) -> Result<V> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            params: params.into_iter().collect(),
            body: Arc::new(move |args: &mut Args| body(args).map(Into::into)),
        }
    }

    /// Creates an anonymous callable.
    pub fn closure<V, F>(params: impl IntoIterator<Item = ParamSpec>, body: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&mut Args) -> Result<V> + Send + Sync + 'static,
    {
        Self::new(CLOSURE_NAME, params, body)
    }

    /// Creates a parameterless, infallible callable; handy for values
    /// only knowable at injection time.
    pub fn thunk<V, F>(body: F) -> Self
    where
        V: Into<Value>,
        F: Fn() -> V + Send + Sync + 'static,
    {
        Self::new(CLOSURE_NAME, [], move |_: &mut Args| Ok(body()))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn call(&self, args: &mut Args) -> Result<Value> {
        (self.body)(args)
    }

    /// Pointer identity of the closure body.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Value
// ═══════════════════════════════════════════

/// Any value the container can pass as an argument or return from an
/// invocation.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A string; for class-typed parameters this is a type reference.
    Str(String),
    Object(Instance),
    /// Invoked at injection time unless the parameter accepts callables.
    Callable(Callable),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Callable(_) => "callable",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Converts into a Rust type, `None` when the variant does not fit.
    pub fn extract<T: FromValue>(self) -> Option<T> {
        T::from_value(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Callable(callable)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ═══════════════════════════════════════════
// FromValue
// ═══════════════════════════════════════════

/// Conversion from a resolved [`Value`] into a Rust argument type.
pub trait FromValue: Sized {
    /// Returns `None` when the value's variant does not fit `Self`.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for Instance {
    fn from_value(value: Value) -> Option<Self> {
        value.into_instance()
    }
}

impl FromValue for Callable {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Callable(callable) => Some(callable),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Option<Self> {
                    value.as_int().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

impl_from_value_int!(i64, i32, u32, u64, usize);

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> FromValue for Arc<T> {
    fn from_value(value: Value) -> Option<Self> {
        value.as_instance().and_then(Instance::get::<T>)
    }
}

// ═══════════════════════════════════════════
// Args
// ═══════════════════════════════════════════

/// Resolved arguments handed to a constructor, method or closure body,
/// in declaration order.
#[derive(Debug, Clone)]
pub struct Args {
    owner: Option<String>,
    method: String,
    values: Vec<(String, Value)>,
}

impl Args {
    pub fn new(owner: Option<&str>, method: &str, values: Vec<(String, Value)>) -> Self {
        Self {
            owner: owner.map(str::to_string),
            method: method.to_string(),
            values,
        }
    }

    /// Declaring type, absent for functions and closures.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Borrows an argument by parameter name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Moves an argument out, converted to `T`.
    ///
    /// # Errors
    /// [`InjectorError::ArgumentNotFound`] if no parameter has that name,
    /// [`InjectorError::ArgumentType`] if the value does not convert.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T> {
        let Some((_, slot)) = self.values.iter_mut().find(|(param, _)| param == name) else {
            return Err(InjectorError::ArgumentNotFound(ArgumentNotFoundError {
                owner: self.owner.clone(),
                method: self.method.clone(),
                param: name.to_string(),
            }));
        };

        let value = std::mem::take(slot);
        let found = value.kind();
        T::from_value(value).ok_or_else(|| InjectorError::ArgumentType {
            owner: self.owner.clone(),
            method: self.method.clone(),
            param: name.to_string(),
            expected: type_name::<T>(),
            found,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

/// Builds a [`Params`] map.
///
/// ```
/// use injecta_container::params;
///
/// let params = params! { "a" => 5, "b" => "six" };
/// assert_eq!(params.len(), 2);
/// assert!(params!().is_empty());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::value::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::value::Params::new();
        $(
            params.insert(
                ::std::string::String::from($name),
                $crate::value::Value::from($value),
            );
        )+
        params
    }};
}
