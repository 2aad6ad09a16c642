//! Error types for Injecta container operations.
//!
//! Every failure carries enough context (type, method, parameter name
//! or the full construction chain) to pinpoint the failing binding.

use std::fmt;

use injecta_support::rendering::{render_callsite, render_chain};

/// Main error type for all Injecta operations.
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    /// The requested type is not known to the catalog.
    #[error("{}", .0)]
    ClassNotFound(ClassNotFoundError),

    /// A required parameter has no supplied or resolvable value.
    #[error("{}", .0)]
    ArgumentNotFound(ArgumentNotFoundError),

    /// An interface parameter has no mapping and no default.
    #[error("The interface {interface} is not mapped to a concrete implementation.")]
    UnmappedInterface { interface: String },

    /// An abstract class parameter has no mapping and no default.
    #[error("The abstract class {class} is not mapped to a concrete implementation.")]
    UnmappedAbstractClass { class: String },

    /// A scheduled or invoked method does not exist on the target.
    #[error("The method {type_name}::{method}() is not callable.")]
    MethodNotCallable { type_name: String, method: String },

    /// A function target is not registered in the catalog.
    #[error("The function {name}() cannot be found.")]
    FunctionNotFound { name: String },

    /// The type being constructed is already under construction.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A resolved argument could not be converted to the Rust type its
    /// consumer asked for.
    #[error(
        "Parameter {}()::${param} expects {expected}, got {found}.",
        render_callsite(owner.as_deref(), method)
    )]
    ArgumentType {
        owner: Option<String>,
        method: String,
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An instance cannot be viewed as the requested Rust type.
    #[error("Type mismatch: {type_name} cannot be viewed as {expected}")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
    },

    /// A factory returned something other than an object.
    #[error("The factory for {type_name} returned {found} instead of an object.")]
    InvalidFactoryResult {
        type_name: String,
        found: &'static str,
    },

    /// A factory pattern is not a valid regular expression.
    #[error("Invalid factory pattern {pattern:?}: {source}")]
    InvalidFactoryPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A constructor body returned an error.
    #[error("Failed to construct {type_name}: {source}")]
    ConstructionFailed {
        type_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A function, method or closure body returned an error.
    #[error("Failed to invoke {target}: {source}")]
    InvocationFailed {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl InjectorError {
    /// Wraps an error raised inside a constructor body.
    pub fn construction(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// Wraps an error raised inside a function, method or closure body.
    pub fn invocation(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::InvocationFailed {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for failures of the resolution algorithm itself.
    ///
    /// Only these are replaced by a parameter's declared default when
    /// auto-wiring fails; everything else (user code failing, type
    /// mismatches, bad factory output) always propagates.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            InjectorError::ClassNotFound(_)
                | InjectorError::ArgumentNotFound(_)
                | InjectorError::UnmappedInterface { .. }
                | InjectorError::UnmappedAbstractClass { .. }
                | InjectorError::MethodNotCallable { .. }
                | InjectorError::FunctionNotFound { .. }
                | InjectorError::CircularDependency(_)
        )
    }
}

/// Error when a type is not known to the catalog.
///
/// Includes "did you mean?" hints drawn from the catalog.
#[derive(Debug)]
pub struct ClassNotFoundError {
    /// The type that was requested
    pub type_name: String,
    /// Similar types that ARE known
    pub suggestions: Vec<String>,
}

impl fmt::Display for ClassNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The class {} cannot be found.", self.type_name)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// Error when a required parameter could not be resolved.
#[derive(Debug)]
pub struct ArgumentNotFoundError {
    /// Declaring type, absent for free functions and closures
    pub owner: Option<String>,
    /// Declaring method or function
    pub method: String,
    /// The parameter without a value
    pub param: String,
}

impl fmt::Display for ArgumentNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No parameter found for {}()::${}.",
            render_callsite(self.owner.as_deref(), &self.method),
            self.param,
        )
    }
}

/// Error when a circular construction chain is detected.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Types under construction, ending with the repeated one.
    /// Example: ["A", "B", "C", "A"]
    pub chain: Vec<String>,
}

impl CircularDependencyError {
    /// The chain joined with arrows, e.g. `A -> B -> C -> A`.
    pub fn chain_string(&self) -> String {
        render_chain(&self.chain)
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected: {}", self.chain_string())
    }
}

/// Convenient Result type for Injecta operations.
pub type Result<T> = std::result::Result<T, InjectorError>;
