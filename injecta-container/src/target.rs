//! Invokable references.
//!
//! A [`Target`] names what `invoke` should call: a registered function,
//! a method on a class or on an existing instance, or a closure.

use std::fmt;

use crate::value::{Callable, Instance};

/// What a method target is called on.
#[derive(Debug, Clone)]
pub enum Receiver {
    /// A class by name: static methods only.
    Type(String),
    /// An existing object.
    Instance(Instance),
}

impl Receiver {
    pub fn type_name(&self) -> &str {
        match self {
            Receiver::Type(type_name) => type_name,
            Receiver::Instance(instance) => instance.type_name(),
        }
    }
}

/// Something `invoke` can call.
///
/// # Examples
/// ```
/// use injecta_container::target::Target;
///
/// // Plain strings name functions, or `Type::method` pairs
/// assert_eq!(Target::from("Counter::increment").to_string(), "Counter::increment");
/// assert_eq!(Target::from(("Counter", "zero")).to_string(), "Counter::zero");
/// ```
#[derive(Debug, Clone)]
pub enum Target {
    /// A function, or `Type::method` when no function has that name.
    Function(String),
    Method(Receiver, String),
    Closure(Callable),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Function(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Function(name)
    }
}

impl From<Callable> for Target {
    fn from(callable: Callable) -> Self {
        Target::Closure(callable)
    }
}

impl From<(&str, &str)> for Target {
    fn from((type_name, method): (&str, &str)) -> Self {
        Target::Method(Receiver::Type(type_name.to_string()), method.to_string())
    }
}

impl From<(Instance, &str)> for Target {
    fn from((instance, method): (Instance, &str)) -> Self {
        Target::Method(Receiver::Instance(instance), method.to_string())
    }
}

impl From<(&Instance, &str)> for Target {
    fn from((instance, method): (&Instance, &str)) -> Self {
        Target::Method(Receiver::Instance(instance.clone()), method.to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Function(name) => write!(f, "{name}"),
            Target::Method(receiver, method) => write!(f, "{}::{method}", receiver.type_name()),
            Target::Closure(callable) => write!(f, "{}", callable.name()),
        }
    }
}

/// Splits `Type::method` at the last `::`.
pub(crate) fn split_method(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once("::")
        .filter(|(type_name, method)| !type_name.is_empty() && !method.is_empty())
}
