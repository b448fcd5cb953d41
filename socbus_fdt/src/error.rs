// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for the `socbus_fdt` crate.

use core::fmt;
use std::io;
use std::path::PathBuf;

/// An error that can occur when parsing a device tree path string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseError {
    offset: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { offset, kind }
    }

    /// Returns the byte offset in the input at which the error was found.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// The kind of an error that can occur when parsing a device tree path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// The path string is empty.
    Empty,
    /// The path does not start with `/`.
    NotAbsolute,
    /// A path segment is not a valid component name.
    InvalidName,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::Empty => write!(f, "empty device tree path"),
            ParseErrorKind::NotAbsolute => write!(f, "device tree path must start with '/'"),
            ParseErrorKind::InvalidName => write!(f, "invalid path component name"),
        }
    }
}

impl core::error::Error for ParseError {}

/// An invalid name was given as a path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    name: String,
}

impl NameError {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }

    /// Returns the rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path component name {:?}", self.name)
    }
}

impl core::error::Error for NameError {}

/// An error that can occur when reading from an exported device tree.
#[derive(Debug)]
#[non_exhaustive]
pub enum TreeError {
    /// The resolved path lies outside of the tree root.
    OutsideRoot {
        /// The canonical path that was rejected.
        path: PathBuf,
    },
    /// The underlying storage failed.
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The error reported by the operating system.
        source: io::Error,
    },
}

impl TreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TreeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error means that the requested node or property
    /// does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::OutsideRoot { path } => {
                write!(f, "attempt to access {} outside of the tree root", path.display())
            }
            TreeError::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl core::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TreeError::OutsideRoot { .. } => None,
            TreeError::Io { source, .. } => Some(source),
        }
    }
}
