//! Pattern-matched factories.
//!
//! A factory replaces reflective construction for every type name its
//! regular expression matches. Entries are tried in registration order
//! and the first match wins.

use regex::Regex;
use tracing::debug;

use crate::error::{InjectorError, Result};
use crate::target::Target;

#[derive(Debug, Clone)]
struct FactoryEntry {
    pattern: String,
    regex: Regex,
    target: Target,
}

#[derive(Debug, Clone, Default)]
pub struct FactoryTable {
    entries: Vec<FactoryEntry>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for type names matching `pattern`.
    ///
    /// An identical pattern is replaced in place.
    ///
    /// # Errors
    /// [`InjectorError::InvalidFactoryPattern`] if `pattern` does not compile.
    pub fn set(&mut self, pattern: &str, target: Target) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|source| InjectorError::InvalidFactoryPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        debug!(pattern, target = %target, "Registered factory");
        match self.entries.iter_mut().find(|entry| entry.pattern == pattern) {
            Some(entry) => entry.target = target,
            None => self.entries.push(FactoryEntry {
                pattern: pattern.to_string(),
                regex,
                target,
            }),
        }
        Ok(())
    }

    /// The first factory whose pattern matches `type_name`.
    pub fn find(&self, type_name: &str) -> Option<&Target> {
        self.entries
            .iter()
            .find(|entry| entry.regex.is_match(type_name))
            .map(|entry| &entry.target)
    }

    /// Registered patterns, in match order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let mut table = FactoryTable::new();
        table.set("^service::", Target::from("services")).unwrap();
        table.set("AuthService$", Target::from("auth")).unwrap();

        assert_eq!(
            table.find("service::AuthService").unwrap().to_string(),
            "services"
        );
        assert_eq!(table.find("AuthService").unwrap().to_string(), "auth");
        assert!(table.find("User").is_none());
    }

    #[test]
    fn same_pattern_replaces_in_place() {
        let mut table = FactoryTable::new();
        table.set("^a", Target::from("first")).unwrap();
        table.set("^b", Target::from("second")).unwrap();
        table.set("^a", Target::from("third")).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.patterns().collect::<Vec<_>>(), vec!["^a", "^b"]);
        assert_eq!(table.find("abc").unwrap().to_string(), "third");
    }

    #[test]
    fn namespace_separator_matches_literally() {
        let mut table = FactoryTable::new();
        table.set("^service::Auth", Target::from("auth")).unwrap();
        assert!(table.find("service::AuthService").is_some());
        assert!(table.find("serviceAuth").is_none());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut table = FactoryTable::new();
        let err = table.set("(unclosed", Target::from("f")).unwrap_err();
        assert!(matches!(err, InjectorError::InvalidFactoryPattern { .. }));
        assert!(table.is_empty());
    }
}
