//! Placeholder reference map.
//!
//! Callers name nodes they have not created yet ("idea1", "step-2"). When
//! the node is created the placeholder is bound to the generated id. A
//! binding can later be pointed at another key, so resolution follows a
//! chain `ref -> ref -> id`. The map is kept acyclic on every write and
//! [`ReferenceMap::resolve`] compresses the chain it walks, in the manner of
//! union-find.

use std::collections::HashMap;

use crate::error::CoreError;

#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    parent: HashMap<String, String>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `placeholder` to `target`.
    ///
    /// Binding a key to itself is a no-op. Errors if the binding would make
    /// resolution loop.
    pub fn insert(&mut self, placeholder: &str, target: &str) -> Result<(), CoreError> {
        if placeholder == target {
            return Ok(());
        }
        if self.chain(target).any(|k| k == placeholder) {
            return Err(CoreError::ReferenceCycle {
                reference: placeholder.to_string(),
                target: target.to_string(),
            });
        }
        self.parent
            .insert(placeholder.to_string(), target.to_string());
        Ok(())
    }

    /// Re-points an existing (or new) placeholder at `target`.
    pub fn remap(&mut self, placeholder: &str, target: &str) -> Result<(), CoreError> {
        self.insert(placeholder, target)
    }

    /// Resolves `key` to the end of its chain, compressing the path.
    ///
    /// Keys with no binding (including real ids) resolve to themselves.
    pub fn resolve(&mut self, key: &str) -> String {
        let root = self.peek(key);
        let mut current = key.to_string();
        while let Some(next) = self.parent.get(&current).cloned() {
            if next != root {
                self.parent.insert(current, root.clone());
            }
            current = next;
        }
        root
    }

    /// Resolves `key` without modifying the map.
    pub fn peek(&self, key: &str) -> String {
        let mut current = key;
        // Chains are acyclic, so the walk ends within `len` steps.
        for _ in 0..=self.parent.len() {
            match self.parent.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.to_string()
    }

    /// Walks the chain starting at `key`, yielding `key` and every key it
    /// passes through.
    fn chain<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut next = Some(key);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.parent.get(current).map(String::as_str);
            Some(current)
        })
        .take(self.parent.len() + 1)
    }

    /// Returns `true` if `placeholder` has a binding.
    pub fn contains(&self, placeholder: &str) -> bool {
        self.parent.contains_key(placeholder)
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn clear(&mut self) {
        self.parent.clear();
    }

    /// Iterates over `(placeholder, resolved id)` pairs.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.parent
            .keys()
            .map(move |k| (k.as_str(), self.peek(k)))
    }
}
