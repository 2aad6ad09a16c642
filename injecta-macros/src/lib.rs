//! # injecta-macros
//!
//! Procedural macros for the Injecta IoC container.
//!
//! - `#[derive(Injectable)]`: describe a struct to the container and
//!   register it for discovery.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod injectable;

/// Derives `Injectable` for a unit struct or a struct with named fields.
///
/// Named fields become constructor parameters, in declaration order.
///
/// Struct attributes, under `#[injectable(...)]`:
/// - `name = "..."`: class name (defaults to the struct ident)
/// - `implements(TraitA, TraitB)`: declared interfaces
/// - `extend = path::to_fn`: a `fn(ClassDescriptor) -> ClassDescriptor`
///   adding methods
///
/// Field attributes, under `#[inject(...)]`:
/// - `name = "..."`: parameter name (defaults to the field ident)
/// - `class = "..."`: auto-wire this class
/// - `interface = "..."`: auto-wire through this interface's mapping
///
/// `Arc<dyn Trait>` fields are interface parameters named `Trait`.
/// - `callable`: take closures unevaluated
/// - `default` / `default = expr`: `Null` or an explicit default
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match injectable::expand(&input) {
        Ok(result) => result.into(),
        Err(err) => err.write_errors().into(),
    }
}
