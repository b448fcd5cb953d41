// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sandboxed reads from a device tree exported as a directory hierarchy.
//!
//! Linux exports the device tree it booted with under `/proc/device-tree`:
//! every node is a directory and every property is a file holding the raw,
//! big-endian property value. The [`TreeReader`] resolves [`FdtPath`]s
//! against such a directory and refuses to follow anything (symlinks or
//! otherwise) that leads outside of it.

mod node;
mod property;

use core::mem::size_of;
use core::ops::ControlFlow;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, error};
use zerocopy::byteorder::big_endian;
use zerocopy::{FromBytes, Immutable};

pub use node::DeviceTreeNode;
pub use property::{PropertyString, StringList};

use crate::error::TreeError;
use crate::path::{FdtPath, is_valid_name};

/// The location where Linux exports the live device tree.
pub const DEFAULT_ROOT: &str = "/proc/device-tree";

/// A handle to an exported device tree rooted at a directory.
///
/// Opening a reader performs no I/O; every read resolves its path anew.
///
/// # Examples
///
/// ```no_run
/// # use socbus_fdt::{path::FdtPath, reader::TreeReader};
/// let tree = TreeReader::open(None::<&str>);
/// let model = tree.read_string(&FdtPath::root(), Some("model")).unwrap();
/// println!("running on {}", model.as_str().unwrap_or("<unknown>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeReader {
    root: PathBuf,
}

impl TreeReader {
    /// Opens the tree rooted at `root`, or at [`DEFAULT_ROOT`] if `None`.
    #[must_use]
    pub fn open<P: AsRef<Path>>(root: Option<P>) -> Self {
        let root = match root {
            Some(root) => root.as_ref().to_path_buf(),
            None => PathBuf::from(DEFAULT_ROOT),
        };
        Self { root }
    }

    /// Closes the tree. Equivalent to dropping it.
    pub fn close(self) {}

    /// Returns the root directory of the tree, as given to [`open`](Self::open).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `base` (followed by the optional extra leaf `top`) to a
    /// canonical path on the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::OutsideRoot`] if the canonical path is not
    /// inside the canonical tree root, or [`TreeError::Io`] if either path
    /// cannot be canonicalized (for example because it does not exist).
    pub fn resolve(&self, base: &FdtPath, top: Option<&str>) -> Result<PathBuf, TreeError> {
        let relative = base.render(top);
        let joined = self.root.join(relative.trim_start_matches('/'));

        let path = fs::canonicalize(&joined).map_err(|e| TreeError::io(&joined, e))?;
        let root = fs::canonicalize(&self.root).map_err(|e| {
            error!("cannot canonicalize the tree root {}: {e}", self.root.display());
            TreeError::io(&self.root, e)
        })?;

        if !path.starts_with(&root) {
            error!(
                "attempt to access {} out of the tree root {}",
                path.display(),
                root.display()
            );
            return Err(TreeError::OutsideRoot { path });
        }
        Ok(path)
    }

    /// Opens the file at the given path, returning `None` if it does not
    /// exist.
    fn open_file(
        &self,
        base: &FdtPath,
        top: Option<&str>,
    ) -> Result<Option<(File, PathBuf)>, TreeError> {
        let path = match self.resolve(base, top) {
            Ok(path) => path,
            Err(e) if e.is_not_found() => {
                debug!("{} does not exist in {}", base.render(top), self.root.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let file = File::open(&path).map_err(|e| TreeError::io(&path, e))?;
        Ok(Some((file, path)))
    }

    /// Reads the raw value of a property into `buf`.
    ///
    /// At most `min(buf.len(), file size)` bytes are read. A property that
    /// does not exist reads as zero bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the path escapes the tree root or the
    /// property cannot be read.
    pub fn read_raw(
        &self,
        base: &FdtPath,
        top: Option<&str>,
        buf: &mut [u8],
    ) -> Result<usize, TreeError> {
        let Some((mut file, path)) = self.open_file(base, top)? else {
            return Ok(0);
        };
        let size = file.metadata().map_err(|e| TreeError::io(&path, e))?.len();
        let goal = usize::try_from(size).map_or(buf.len(), |size| size.min(buf.len()));
        read_full(&mut file, &mut buf[..goal]).map_err(|e| TreeError::io(&path, e))
    }

    /// Reads up to `out.len()` big-endian 32-bit cells and returns how many
    /// were read.
    ///
    /// Trailing bytes that do not form a whole cell are ignored. A property
    /// that does not exist reads as zero cells.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the path escapes the tree root or the
    /// property cannot be read.
    pub fn read_u32_array(
        &self,
        base: &FdtPath,
        top: Option<&str>,
        out: &mut [u32],
    ) -> Result<usize, TreeError> {
        self.read_cells::<big_endian::U32, u32>(base, top, out, big_endian::U32::get)
    }

    /// Reads up to `out.len()` big-endian 64-bit values and returns how many
    /// were read.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the path escapes the tree root or the
    /// property cannot be read.
    pub fn read_u64_array(
        &self,
        base: &FdtPath,
        top: Option<&str>,
        out: &mut [u64],
    ) -> Result<usize, TreeError> {
        self.read_cells::<big_endian::U64, u64>(base, top, out, big_endian::U64::get)
    }

    /// Reads a single 32-bit cell, or `None` if the property is absent or
    /// shorter than 4 bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the path escapes the tree root or the
    /// property cannot be read.
    pub fn read_u32(&self, base: &FdtPath, top: Option<&str>) -> Result<Option<u32>, TreeError> {
        let mut value = [0];
        let count = self.read_u32_array(base, top, &mut value)?;
        Ok((count == 1).then_some(value[0]))
    }

    fn read_cells<C, V>(
        &self,
        base: &FdtPath,
        top: Option<&str>,
        out: &mut [V],
        get: impl Fn(C) -> V,
    ) -> Result<usize, TreeError>
    where
        C: FromBytes + Immutable + Copy,
    {
        let mut raw = vec![0; out.len() * size_of::<C>()];
        let len = self.read_raw(base, top, &mut raw)?;
        let count = len / size_of::<C>();
        let cells = <[C]>::ref_from_bytes(&raw[..count * size_of::<C>()])
            .ok()
            .unwrap_or_default();
        for (slot, cell) in out.iter_mut().zip(cells) {
            *slot = get(*cell);
        }
        Ok(count)
    }

    /// Reads a whole property as a string.
    ///
    /// The value may contain embedded NULs (string lists such as
    /// `compatible`); see [`PropertyString::strings`]. A property that does
    /// not exist reads as an empty string.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the path escapes the tree root or the
    /// property cannot be read.
    pub fn read_string(
        &self,
        base: &FdtPath,
        top: Option<&str>,
    ) -> Result<PropertyString, TreeError> {
        let Some((mut file, path)) = self.open_file(base, top)? else {
            return Ok(PropertyString::default());
        };
        let size = file.metadata().map_err(|e| TreeError::io(&path, e))?.len();
        let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0) + 1);
        file.read_to_end(&mut bytes)
            .map_err(|e| TreeError::io(&path, e))?;
        Ok(PropertyString::new(bytes))
    }

    /// Calls `f` for every child (node or property) of the node at `base`.
    ///
    /// Entries are visited in the order the operating system lists them.
    /// Entries whose names are not valid path components are skipped. The
    /// walk stops early when `f` returns [`ControlFlow::Break`], and the
    /// break value is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the node cannot be resolved or listed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use core::ops::ControlFlow;
    /// # use socbus_fdt::{path::FdtPath, reader::TreeReader};
    /// let tree = TreeReader::open(None::<&str>);
    /// let found = tree
    ///     .walk_children(&FdtPath::root(), |_, _, name| {
    ///         if name == "soc" { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
    ///     })
    ///     .unwrap();
    /// assert!(found.is_some());
    /// ```
    pub fn walk_children<B, F>(&self, base: &FdtPath, mut f: F) -> Result<Option<B>, TreeError>
    where
        F: FnMut(&Self, &FdtPath, &str) -> ControlFlow<B>,
    {
        let dir = self.resolve(base, None)?;
        let entries = fs::read_dir(&dir).map_err(|e| TreeError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| TreeError::io(&dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_valid_name(name) {
                continue;
            }
            if let ControlFlow::Break(value) = f(self, base, name) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Returns the names of all children of the node at `base`, sorted.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the node cannot be resolved or listed.
    pub fn children(&self, base: &FdtPath) -> Result<Vec<String>, TreeError> {
        let mut names = Vec::new();
        self.walk_children::<(), _>(base, |_, _, name| {
            names.push(name.to_owned());
            ControlFlow::Continue(())
        })?;
        names.sort_unstable();
        Ok(names)
    }

    /// Returns whether the node or property at the given path is a node.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the path cannot be resolved.
    pub fn is_node(&self, base: &FdtPath, top: Option<&str>) -> Result<bool, TreeError> {
        let path = self.resolve(base, top)?;
        let metadata = fs::metadata(&path).map_err(|e| TreeError::io(&path, e))?;
        Ok(metadata.is_dir())
    }

    /// Loads the node at `base` and everything below it into memory.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if any node or property of the subtree
    /// cannot be read, or if one of them leads outside of the tree root.
    pub fn load(&self, base: &FdtPath) -> Result<DeviceTreeNode, TreeError> {
        let mut node = DeviceTreeNode::new(base.name().unwrap_or(""));
        for name in self.children(base)? {
            if self.is_node(base, Some(&name))? {
                let child = base
                    .join(&name)
                    .expect("names listed by walk_children are valid");
                node.add_child(self.load(&child)?);
            } else {
                let value = self.read_string(base, Some(&name))?;
                node.add_property(name, value.into_bytes());
            }
        }
        Ok(node)
    }

    /// Writes the subtree at `base` to `out` in a device tree source like
    /// syntax.
    ///
    /// # Errors
    ///
    /// Returns a [`TreeError`] if the subtree cannot be loaded or `out`
    /// cannot be written to.
    pub fn dump<W: io::Write>(&self, base: &FdtPath, out: &mut W) -> Result<(), TreeError> {
        let node = self.load(base)?;
        write!(out, "{node}").map_err(|e| TreeError::io(base.render(None), e))
    }
}

/// Reads until `buf` is full or the end of the file is reached.
fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
