//! Construction stack for cycle detection.
//!
//! Holds the names of the types whose constructor parameters are being
//! resolved. One stack is threaded through a single top-level `make` or
//! `invoke` call; a type already on it means the dependency graph loops.
//!
//! Entries are pushed through [`ConstructionStack::enter`], which hands
//! back a [`Frame`] that pops on drop, so early returns and `?` never
//! leave a stale entry behind.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::error::{CircularDependencyError, InjectorError, Result};

#[derive(Debug, Default)]
pub struct ConstructionStack {
    frames: Vec<String>,
}

impl ConstructionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if `type_name` is already under construction.
    ///
    /// # Errors
    /// [`InjectorError::CircularDependency`] with the chain from the
    /// outermost type to `type_name`.
    pub fn check(&self, type_name: &str) -> Result<()> {
        if !self.contains(type_name) {
            return Ok(());
        }

        let mut chain = self.frames.clone();
        chain.push(type_name.to_string());

        warn!(cycle = ?chain, "Circular dependency detected!");

        Err(InjectorError::CircularDependency(CircularDependencyError { chain }))
    }

    /// Pushes `type_name`, after [`check`](Self::check)ing it.
    pub fn enter(&mut self, type_name: &str) -> Result<Frame<'_>> {
        self.check(type_name)?;
        self.frames.push(type_name.to_string());
        Ok(Frame { stack: self })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.frames.iter().any(|frame| frame == type_name)
    }

    /// Types under construction, outermost first.
    pub fn chain(&self) -> &[String] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// One pushed entry. Gives access to the stack for nested resolution
/// and pops the entry when dropped.
#[derive(Debug)]
pub struct Frame<'a> {
    stack: &'a mut ConstructionStack,
}

impl Deref for Frame<'_> {
    type Target = ConstructionStack;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for Frame<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_pops_on_drop() {
        let mut stack = ConstructionStack::new();
        {
            let mut a = stack.enter("A").unwrap();
            let b = a.enter("B").unwrap();
            assert_eq!(b.chain(), ["A", "B"]);
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn detects_cycle_with_chain() {
        let mut stack = ConstructionStack::new();
        let mut a = stack.enter("A").unwrap();
        let mut b = a.enter("B").unwrap();
        let mut c = b.enter("C").unwrap();

        match c.enter("A").unwrap_err() {
            InjectorError::CircularDependency(err) => {
                assert_eq!(err.chain_string(), "A -> B -> C -> A");
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn self_dependency() {
        let mut stack = ConstructionStack::new();
        let a = stack.enter("A").unwrap();
        assert!(a.check("A").is_err());
        assert!(a.check("B").is_ok());
    }

    #[test]
    fn failure_leaves_no_stale_entry() {
        fn build(stack: &mut ConstructionStack) -> Result<()> {
            let mut frame = stack.enter("A")?;
            frame.enter("A")?;
            Ok(())
        }

        let mut stack = ConstructionStack::new();
        assert!(build(&mut stack).is_err());
        assert!(stack.is_empty());
        assert!(build(&mut stack).is_err());
        assert!(!stack.contains("A"));
    }
}
