//! The scope stack: lexically nested name-to-type bindings.
//!
//! A stack of frames mapping names to types (monomorphic types or
//! schemes). Entering a binding construct pushes a frame, leaving pops
//! it. Lookup walks from the innermost frame outward and finally falls
//! back to the fixed builtin table. Shadowing is forbidden at every
//! level: a name may not be rebound while it is visible anywhere on the
//! stack, and builtin names may never be rebound.

use rustc_hash::FxHashMap;

use crate::builtins;
use crate::ty::Ty;

/// A stack of name-to-type frames. Index 0 is the root (global) frame.
pub struct ScopeStack {
    frames: Vec<FxHashMap<String, Ty>>,
}

impl ScopeStack {
    /// Create a scope stack with one empty root frame.
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![FxHashMap::default()],
        }
    }

    /// Push a new empty frame.
    pub fn push_scope(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Pop the innermost frame.
    ///
    /// # Panics
    ///
    /// Panics if only the root frame remains.
    pub fn pop_scope(&mut self) {
        assert!(self.frames.len() > 1, "cannot pop the root scope");
        self.frames.pop();
    }

    /// Bind a name in the innermost frame.
    ///
    /// Returns `false` without binding if the name is already bound in
    /// any frame or collides with a builtin.
    pub fn define(&mut self, name: &str, ty: Ty) -> bool {
        if builtins::builtin_type(name).is_some() {
            return false;
        }
        if self.frames.iter().any(|frame| frame.contains_key(name)) {
            return false;
        }
        self.frames
            .last_mut()
            .expect("scope stack always has a root frame")
            .insert(name.to_string(), ty);
        true
    }

    /// Look up a name, innermost frame first, builtins last.
    ///
    /// Returns a clone so the caller may mutate freely; the stored
    /// binding is never aliased.
    pub fn find(&self, name: &str) -> Option<Ty> {
        for frame in self.frames.iter().rev() {
            if let Some(ty) = frame.get(name) {
                return Some(ty.clone());
            }
        }
        builtins::builtin_type(name)
    }

    /// Number of frames on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Consume the stack and return the root frame's bindings.
    ///
    /// Used by the top-level driver to produce the symbol table.
    pub fn into_root(mut self) -> FxHashMap<String, Ty> {
        debug_assert_eq!(self.frames.len(), 1, "scopes must be balanced at top level");
        self.frames.swap_remove(0)
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
