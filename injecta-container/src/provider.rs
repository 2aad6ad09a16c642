//! Provider trait: a module of related bindings.
//!
//! Providers group the registrations of one concern, so an application
//! assembles its container module by module.
//!
//! # Examples
//! ```rust
//! use injecta_container::prelude::*;
//!
//! struct StorageProvider;
//!
//! impl Provider for StorageProvider {
//!     fn register(&self, container: &mut Container) -> Result<()> {
//!         container
//!             .set_mapping("Storage", "DiskStorage")
//!             .get_constructor("DiskStorage")
//!             .set_param("root", "/var/data");
//!         Ok(())
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.add_provider(&StorageProvider).unwrap();
//! assert!(container.get_constructor("DiskStorage").has_param("root"));
//! ```

use crate::container::Container;
use crate::error::Result;

/// A module that registers related bindings into a container.
///
/// Split registrations by domain instead of one giant setup block:
///
/// ```rust,ignore
/// container.add_provider(&DatabaseProvider)?;
/// container.add_provider(&AuthProvider)?;
/// ```
pub trait Provider: Send + Sync {
    /// Register bindings, classes, mappings or factories.
    ///
    /// # Errors
    /// Whatever the registrations themselves report, typically an
    /// invalid factory pattern.
    fn register(&self, container: &mut Container) -> Result<()>;

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
