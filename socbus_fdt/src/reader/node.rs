// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use core::fmt;

use indexmap::IndexMap;
use twox_hash::xxhash64;

use super::property::{StringList, fmt_property};

/// An in-memory copy of a device tree node loaded by
/// [`TreeReader::load`](super::TreeReader::load).
///
/// Children and properties are stored in [`IndexMap`]s, which provide O(1)
/// lookups by name while preserving the (sorted) order they were loaded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTreeNode {
    name: String,
    properties: IndexMap<String, Vec<u8>, xxhash64::State>,
    children: IndexMap<String, DeviceTreeNode, xxhash64::State>,
}

impl Default for DeviceTreeNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            properties: IndexMap::with_hasher(xxhash64::State::with_seed(0xdead_cafe)),
            children: IndexMap::with_hasher(xxhash64::State::with_seed(0xdead_cafe)),
        }
    }
}

impl DeviceTreeNode {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn add_property(&mut self, name: String, value: Vec<u8>) {
        self.properties.insert(name, value);
    }

    pub(crate) fn add_child(&mut self, child: DeviceTreeNode) {
        self.children.insert(child.name.clone(), child);
    }

    /// Returns the name of this node. The root node has an empty name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw value of a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&[u8]> {
        self.properties.get(name).map(Vec::as_slice)
    }

    /// Returns the strings of a string-list property such as `compatible`.
    pub fn property_strings(&self, name: &str) -> impl Iterator<Item = &str> {
        StringList::new(self.property(name).unwrap_or_default())
    }

    /// Returns an iterator over `(name, value)` pairs of the properties.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_slice()))
    }

    /// Returns a child by its name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DeviceTreeNode> {
        self.children.get(name)
    }

    /// Returns an iterator over the children of this node.
    pub fn children(&self) -> impl Iterator<Item = &DeviceTreeNode> {
        self.children.values()
    }

    fn fmt_recursive(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "{:indent$}/ {{", "", indent = indent)?;
        } else {
            writeln!(f, "{:indent$}{} {{", "", self.name, indent = indent)?;
        }

        for (name, value) in self.properties() {
            fmt_property(f, name, value, indent + 4)?;
        }

        for child in self.children() {
            writeln!(f)?;
            child.fmt_recursive(f, indent + 4)?;
        }

        writeln!(f, "{:indent$}}};", "", indent = indent)
    }
}

impl fmt::Display for DeviceTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_recursive(f, 0)
    }
}
