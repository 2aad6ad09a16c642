//! Binding identification keys.
//!
//! [`TypeRef`] identifies a binding within the container: a type name
//! plus an instance name distinguishing independently configured
//! bindings of the same type.

use std::fmt;

/// Instance name used when a reference carries no `#instance` part.
pub const DEFAULT_INSTANCE: &str = "default";

/// Separator between the type name and the instance name.
const INSTANCE_SEPARATOR: char = '#';

/// Uniquely identifies a binding in the container.
///
/// # Examples
/// ```
/// use injecta_container::key::TypeRef;
///
/// // Bare type: default instance
/// let key = TypeRef::parse("Database");
/// assert_eq!(key.type_name(), "Database");
/// assert_eq!(key.instance(), "default");
///
/// // Named instance
/// let key = TypeRef::parse("Database#replica");
/// assert_eq!(key.instance(), "replica");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    type_name: String,
    instance: String,
}

impl TypeRef {
    /// Creates a reference to the default instance of `type_name`.
    pub fn of(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            instance: DEFAULT_INSTANCE.to_string(),
        }
    }

    /// Creates a reference to a named instance of `type_name`.
    pub fn named(type_name: impl Into<String>, instance: impl Into<String>) -> Self {
        let instance = instance.into();
        Self {
            type_name: type_name.into(),
            instance: if instance.is_empty() {
                DEFAULT_INSTANCE.to_string()
            } else {
                instance
            },
        }
    }

    /// Parses `Type` or `Type#instance`.
    ///
    /// Only a single `#` is significant. A reference with several `#`
    /// is taken literally as a type name bound to the default instance.
    ///
    /// ```
    /// use injecta_container::key::TypeRef;
    ///
    /// let key = TypeRef::parse("A#b#c");
    /// assert_eq!(key.type_name(), "A#b#c");
    /// assert!(key.is_default());
    /// ```
    pub fn parse(reference: &str) -> Self {
        let mut parts = reference.split(INSTANCE_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(type_name), Some(instance), None) => Self::named(type_name, instance),
            _ => Self::of(reference),
        }
    }

    /// Returns the type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the instance name.
    #[inline]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Returns `true` when this refers to the default instance.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.instance == DEFAULT_INSTANCE
    }

    /// Same instance name, different type (used when following aliases).
    pub fn with_type(self, type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            instance: self.instance,
        }
    }
}

impl From<&str> for TypeRef {
    fn from(reference: &str) -> Self {
        Self::parse(reference)
    }
}

impl From<String> for TypeRef {
    fn from(reference: String) -> Self {
        Self::parse(&reference)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "{}", self.type_name)
        } else {
            write!(f, "{}{}{}", self.type_name, INSTANCE_SEPARATOR, self.instance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_reference_uses_default_instance() {
        let key = TypeRef::parse("service::AuthService");
        assert_eq!(key.type_name(), "service::AuthService");
        assert_eq!(key.instance(), DEFAULT_INSTANCE);
        assert!(key.is_default());
    }

    #[test]
    fn single_separator_splits() {
        let key = TypeRef::parse("User#admin");
        assert_eq!(key.type_name(), "User");
        assert_eq!(key.instance(), "admin");
        assert!(!key.is_default());
    }

    #[test]
    fn several_separators_are_literal() {
        let key = TypeRef::parse("User#a#b");
        assert_eq!(key.type_name(), "User#a#b");
        assert!(key.is_default());
    }

    #[test]
    fn empty_instance_is_default() {
        assert_eq!(TypeRef::parse("User#"), TypeRef::of("User"));
    }

    #[test]
    fn named_keys_different() {
        assert_ne!(TypeRef::parse("User#a"), TypeRef::parse("User#b"));
        assert_ne!(TypeRef::parse("User#a"), TypeRef::parse("User"));
        assert_eq!(TypeRef::parse("User#default"), TypeRef::parse("User"));
    }

    #[test]
    fn display_round_trips_reference() {
        assert_eq!(TypeRef::parse("User").to_string(), "User");
        assert_eq!(TypeRef::parse("User#admin").to_string(), "User#admin");
    }

    #[test]
    fn with_type_keeps_instance() {
        let key = TypeRef::parse("U#admin").with_type("User");
        assert_eq!(key, TypeRef::named("User", "admin"));
    }

    #[test]
    fn key_in_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(TypeRef::of("User"), "user");
        map.insert(TypeRef::named("User", "admin"), "admin");
        assert_eq!(map.get(&TypeRef::parse("User#admin")), Some(&"admin"));
        assert_eq!(map.get(&TypeRef::of("Counter")), None);
    }
}
