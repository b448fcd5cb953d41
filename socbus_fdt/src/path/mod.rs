// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Linked path chains addressing nodes and properties of a device tree.
//!
//! An [`FdtPath`] is a chain of named components. The innermost component
//! (the leaf, or "top") owns the component below it, which owns the one
//! below it, down to the component adjacent to the tree root. An empty chain
//! denotes the root itself.

mod parse;

use core::fmt;
use core::hash::{Hash, Hasher};

use crate::error::NameError;

/// Returns whether `name` can be used as a single path component.
///
/// A valid name is non-empty, contains neither `/` nor `\` and is neither
/// `.` nor `..`.
///
/// # Examples
///
/// ```
/// # use socbus_fdt::path::is_valid_name;
/// assert!(is_valid_name("ethernet@17020000"));
/// assert!(is_valid_name("#address-cells"));
/// assert!(!is_valid_name(".."));
/// assert!(!is_valid_name("soc/serial"));
/// ```
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

struct Component {
    name: Box<str>,
    base: Option<Box<Component>>,
}

/// A path inside a device tree, stored as a chain of components.
///
/// Cloning a path produces a deep, independent copy of the chain.
///
/// # Examples
///
/// ```
/// # use socbus_fdt::path::FdtPath;
/// let mut path = FdtPath::root();
/// path.push("soc").unwrap();
/// path.push("ethernet@17020000").unwrap();
/// assert_eq!(path.to_string(), "/soc/ethernet@17020000");
/// assert_eq!(path.render(Some("reg")), "/soc/ethernet@17020000/reg");
/// ```
pub struct FdtPath {
    top: Option<Box<Component>>,
    depth: usize,
}

impl FdtPath {
    /// Creates an empty path denoting the tree root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            top: None,
            depth: 0,
        }
    }

    /// Returns true if this path has no components.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.top.is_none()
    }

    /// Returns the number of components in this path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the name of the innermost component, or `None` for the root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.top.as_deref().map(|top| &*top.name)
    }

    /// Appends a new innermost component.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] if `name` is not a valid component name (see
    /// [`is_valid_name`]). The path is left untouched in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socbus_fdt::path::FdtPath;
    /// let mut path = FdtPath::root();
    /// path.push("amba").unwrap();
    /// assert!(path.push("..").is_err());
    /// assert_eq!(path.depth(), 1);
    /// ```
    pub fn push(&mut self, name: &str) -> Result<(), NameError> {
        if !is_valid_name(name) {
            return Err(NameError::new(name));
        }
        let base = self.top.take();
        self.top = Some(Box::new(Component {
            name: name.into(),
            base,
        }));
        self.depth += 1;
        Ok(())
    }

    /// Removes the innermost component and returns its name.
    ///
    /// Returns `None` if the path is already the root.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socbus_fdt::path::FdtPath;
    /// let mut path: FdtPath = "/amba/serial@0".parse().unwrap();
    /// assert_eq!(path.pop().as_deref(), Some("serial@0"));
    /// assert_eq!(path.to_string(), "/amba");
    /// ```
    pub fn pop(&mut self) -> Option<String> {
        let top = self.top.take()?;
        let Component { name, base } = *top;
        self.top = base;
        self.depth -= 1;
        Some(name.into_string())
    }

    /// Removes every component, leaving the root path.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    /// Returns a new path with `name` appended to a copy of this one.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] if `name` is not a valid component name.
    pub fn join(&self, name: &str) -> Result<Self, NameError> {
        let mut path = self.clone();
        path.push(name)?;
        Ok(path)
    }

    /// Returns an iterator over the component names, from the leaf towards
    /// the root.
    pub fn names_rev(&self) -> impl Iterator<Item = &str> {
        let mut cur = self.top.as_deref();
        core::iter::from_fn(move || {
            let component = cur?;
            cur = component.base.as_deref();
            Some(&*component.name)
        })
    }

    /// Returns the component names in order from the root to the leaf.
    #[must_use]
    pub fn components(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names_rev().collect();
        names.reverse();
        names
    }

    /// Returns the length of [`render`](Self::render) for the same
    /// arguments.
    #[must_use]
    pub fn rendered_len(&self, top: Option<&str>) -> usize {
        if self.is_root() && top.is_none() {
            return 1;
        }
        self.names_rev()
            .chain(top)
            .map(|name| 1 + name.len())
            .sum()
    }

    /// Renders the path as a `/`-separated string, optionally followed by an
    /// extra leaf name that is not part of the chain.
    ///
    /// The root renders as `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socbus_fdt::path::FdtPath;
    /// let root = FdtPath::root();
    /// assert_eq!(root.render(None), "/");
    /// assert_eq!(root.render(Some("model")), "/model");
    /// ```
    #[must_use]
    pub fn render(&self, top: Option<&str>) -> String {
        let len = self.rendered_len(top);
        let mut s = String::with_capacity(len);
        if self.is_root() && top.is_none() {
            s.push('/');
            return s;
        }
        for name in self.components().into_iter().chain(top) {
            s.push('/');
            s.push_str(name);
        }
        debug_assert_eq!(s.len(), len);
        s
    }
}

impl Default for FdtPath {
    fn default() -> Self {
        Self::root()
    }
}

impl Clone for FdtPath {
    fn clone(&self) -> Self {
        let mut copy = FdtPath::root();
        for name in self.components() {
            copy.top = Some(Box::new(Component {
                name: name.into(),
                base: copy.top.take(),
            }));
            copy.depth += 1;
        }
        copy
    }
}

// Dropping a long chain recursively could exhaust the stack.
impl Drop for FdtPath {
    fn drop(&mut self) {
        self.clear();
    }
}

impl PartialEq for FdtPath {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.names_rev().eq(other.names_rev())
    }
}

impl Eq for FdtPath {}

impl Hash for FdtPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.depth.hash(state);
        for name in self.names_rev() {
            name.hash(state);
        }
    }
}

impl fmt::Display for FdtPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for name in self.components() {
            write!(f, "/{name}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FdtPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FdtPath").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_len_is_exact() {
        let mut path = FdtPath::root();
        assert_eq!(path.rendered_len(None), path.render(None).len());
        assert_eq!(path.rendered_len(Some("x")), path.render(Some("x")).len());

        for name in ["a", "bb", "ccc@0123", "#size-cells"] {
            path.push(name).unwrap();
            assert_eq!(path.rendered_len(None), path.render(None).len());
            assert_eq!(
                path.rendered_len(Some("compatible")),
                path.render(Some("compatible")).len()
            );
        }
        assert!(path.render(None).capacity() >= path.rendered_len(None));
    }

    #[test]
    fn deep_chain_drops() {
        let mut path = FdtPath::root();
        for _ in 0..100_000 {
            path.push("n").unwrap();
        }
        let copy = path.clone();
        assert_eq!(copy.depth(), 100_000);
        drop(path);
        drop(copy);
    }
}
