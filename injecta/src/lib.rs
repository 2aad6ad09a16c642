//! # Injecta: an inversion-of-control container for Rust
//!
//! Classes describe themselves through `#[derive(Injectable)]` or a
//! hand-written [`ClassDescriptor`]; the container wires constructor
//! arguments lazily, caches singletons, follows interface mappings and
//! delegates to pattern-matched factories.
//!
//! ```rust
//! use std::sync::Arc;
//! use injecta::prelude::*;
//! use injecta::Injectable;
//!
//! #[derive(Injectable)]
//! struct Config {
//!     #[inject(default = "sqlite::memory:")]
//!     url: String,
//! }
//!
//! #[derive(Injectable)]
//! struct Database {
//!     config: Arc<Config>,
//! }
//!
//! let mut container = Container::new();
//! container.register::<Config>().register::<Database>();
//! let db = container.make_as::<Database>("Database").unwrap();
//! assert_eq!(db.config.url, "sqlite::memory:");
//! ```

pub use injecta_container::*;
pub use injecta_derive::*;
pub use injecta_support::*;
