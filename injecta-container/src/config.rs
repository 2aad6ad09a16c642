//! Declarative bindings loaded through serde.
//!
//! The format is the caller's choice; any serde data format that
//! produces this shape works.
//!
//! ```json
//! {
//!   "aliases":      { "Db": "Database" },
//!   "mappings":     { "Storage": "DiskStorage#primary" },
//!   "singletons":   { "Clock": false },
//!   "constructors": { "Database": { "url": "postgres://localhost", "pool": 8 } },
//!   "calls":        { "Counter": { "increment": [{}, { "step": 10 }] } },
//!   "factories":    [{ "pattern": "^service::", "target": "service::build" }]
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::container::Container;
use crate::error::Result;
use crate::value::{Params, Value};

/// A scalar binding value.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Plain string, or a type reference for class-typed parameters.
    Str(String),
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => Value::Null,
            ConfigValue::Bool(b) => Value::Bool(b),
            ConfigValue::Int(n) => Value::Int(n),
            ConfigValue::Float(x) => Value::Float(x),
            ConfigValue::Str(s) => Value::Str(s),
        }
    }
}

/// Named parameter values.
pub type ParamsConfig = BTreeMap<String, ConfigValue>;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    /// Regular expression matched against type names.
    pub pattern: String,
    /// Function name or `Type::method`.
    pub target: String,
}

/// Container bindings.
///
/// Maps are applied in key order; factories in list order.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// alias → type name
    pub aliases: BTreeMap<String, String>,
    /// interface or abstract class → `Type` or `Type#instance`
    pub mappings: BTreeMap<String, String>,
    /// type reference → singleton flag
    pub singletons: BTreeMap<String, bool>,
    /// type reference → constructor parameters
    pub constructors: BTreeMap<String, ParamsConfig>,
    /// type reference → method → call records
    pub calls: BTreeMap<String, BTreeMap<String, Vec<ParamsConfig>>>,
    pub factories: Vec<FactoryConfig>,
}

fn to_params(config: &ParamsConfig) -> Params {
    config
        .iter()
        .map(|(name, value)| (name.clone(), Value::from(value.clone())))
        .collect()
}

impl Container {
    /// Applies declarative bindings on top of the current ones.
    ///
    /// # Errors
    /// [`InjectorError::InvalidFactoryPattern`](crate::error::InjectorError::InvalidFactoryPattern)
    /// for a factory pattern that does not compile; bindings before it
    /// stay applied.
    pub fn apply_config(&mut self, config: &ContainerConfig) -> Result<&mut Self> {
        debug!(
            aliases = config.aliases.len(),
            mappings = config.mappings.len(),
            constructors = config.constructors.len(),
            factories = config.factories.len(),
            "Applying container config"
        );

        self.add_aliases(config.aliases.clone())
            .add_mappings(config.mappings.iter());

        for (type_ref, singleton) in &config.singletons {
            self.singleton(type_ref.as_str(), *singleton);
        }

        for (type_ref, params) in &config.constructors {
            self.get_constructor(type_ref.as_str())
                .add_params(to_params(params));
        }

        for (type_ref, methods) in &config.calls {
            for (method, calls) in methods {
                let entry = self.get_method(type_ref.as_str(), method);
                for call in calls {
                    entry.add_call(to_params(call));
                }
            }
        }

        for factory in &config.factories {
            self.set_factory(&factory.pattern, factory.target.as_str())?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InjectorError;
    use crate::key::TypeRef;

    const CONFIG: &str = r#"{
        "aliases": { "Db": "Database" },
        "mappings": { "Storage": "DiskStorage#primary" },
        "singletons": { "Clock": false },
        "constructors": { "Db": { "url": "postgres://localhost", "pool": 8, "ratio": 0.5, "tls": true, "name": null } },
        "calls": { "Counter": { "increment": [{}, { "step": 10 }] } },
        "factories": [{ "pattern": "^service::", "target": "service::build" }]
    }"#;

    #[test]
    fn parse_full_config() {
        let config: ContainerConfig = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(config.aliases["Db"], "Database");
        let db = &config.constructors["Db"];
        assert_eq!(db["pool"], ConfigValue::Int(8));
        assert_eq!(db["ratio"], ConfigValue::Float(0.5));
        assert_eq!(db["tls"], ConfigValue::Bool(true));
        assert_eq!(db["name"], ConfigValue::Null);
        assert_eq!(config.calls["Counter"]["increment"].len(), 2);
    }

    #[test]
    fn missing_sections_default() {
        let config: ContainerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ContainerConfig::default());
    }

    #[test]
    fn unknown_sections_rejected() {
        assert!(serde_json::from_str::<ContainerConfig>(r#"{ "bindings": {} }"#).is_err());
    }

    #[test]
    fn apply_to_container() {
        let config: ContainerConfig = serde_json::from_str(CONFIG).unwrap();
        let mut container = Container::new();
        container.apply_config(&config).unwrap();

        assert_eq!(container.resolve_alias("Db"), Some("Database"));
        assert!(!container.get_instance_def("Clock").is_singleton());

        // Constructor params went through the alias
        let constructor = container.get_constructor("Database");
        assert_eq!(
            constructor.param("url"),
            Some(&Value::Str("postgres://localhost".into()))
        );

        let increment = container.get_method("Counter", "increment");
        assert_eq!(increment.calls().len(), 2);
        assert_eq!(increment.calls()[1].get("step"), Some(&Value::Int(10)));

        assert!(
            container
                .registry()
                .get(&TypeRef::of("Counter"))
                .is_some()
        );
    }

    #[test]
    fn bad_factory_pattern_fails() {
        let config = ContainerConfig {
            factories: vec![FactoryConfig {
                pattern: "(".into(),
                target: "build".into(),
            }],
            ..ContainerConfig::default()
        };
        assert!(matches!(
            Container::new().apply_config(&config),
            Err(InjectorError::InvalidFactoryPattern { .. })
        ));
    }
}
