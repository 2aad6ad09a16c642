//! Core container implementation for Injecta IoC.

pub mod config;
pub mod container;
pub mod error;
pub mod factory;
pub mod key;
pub mod mapping;
pub mod provider;
pub mod reflect;
pub mod registry;
pub mod stack;
pub mod target;
pub mod value;

pub use config::{ConfigValue, ContainerConfig};
pub use container::{Container, SharedContainer, prelude};
pub use error::{InjectorError, Result};
pub use key::TypeRef;
pub use provider::Provider;
pub use reflect::{Catalog, ClassDescriptor, ClassKind, ClassRegistration, Injectable, ParamSpec};
pub use registry::{InstanceEntry, MethodEntry};
pub use target::Target;
pub use value::{Args, Callable, FromValue, Instance, Params, Value};

#[doc(hidden)]
pub use inventory;
