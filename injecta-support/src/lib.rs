//! # Injecta Support
//!
//! Shared utilities for the Injecta IoC container.
//!
//! This crate provides:
//! - Text rendering for error messages (cycle chains, call sites)
//! - "Did you mean?" suggestions for unknown type names

pub mod rendering;
