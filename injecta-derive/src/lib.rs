//! # injecta-derive
//!
//! Derive macros for Injecta.
//!
//! Re-exports the procedural macros from `injecta-macros`. The generated
//! code refers to `::injecta`, so depend on the `injecta` crate to use
//! them.

pub use injecta_macros::Injectable;
