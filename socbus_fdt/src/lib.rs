// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sandboxed access to a device tree exported as a directory hierarchy.
//!
//! Linux exposes the device tree it was booted with under
//! `/proc/device-tree`, one directory per node and one file per property.
//! This library provides:
//!
//! - [`FdtPath`](path::FdtPath), a chain of path components addressing a
//!   node, with parsing from and rendering to `/a/b/c` strings.
//! - [`TreeReader`](reader::TreeReader), which resolves paths inside a tree
//!   root, refuses to leave it, and reads raw, 32-bit, 64-bit and string
//!   property values.
//! - [`DeviceTreeNode`](reader::DeviceTreeNode), an in-memory copy of a
//!   subtree that prints as device tree source.
//!
//! # Examples
//!
//! ```no_run
//! use socbus_fdt::path::FdtPath;
//! use socbus_fdt::reader::TreeReader;
//!
//! let tree = TreeReader::open(Some("/proc/device-tree"));
//! let node: FdtPath = "/soc/ethernet@17020000".parse().unwrap();
//!
//! let mut reg = [0u64; 6];
//! let count = tree.read_u64_array(&node, Some("reg"), &mut reg).unwrap();
//! println!("{:x?}", &reg[..count]);
//!
//! let compatible = tree.read_string(&node, Some("compatible")).unwrap();
//! for s in compatible.strings() {
//!     println!("compatible with {s}");
//! }
//! ```

#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod path;
pub mod reader;

pub use error::{NameError, ParseError, ParseErrorKind, TreeError};
