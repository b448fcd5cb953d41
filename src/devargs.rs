// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! User supplied allow and deny lists.

use core::fmt;
use core::str::FromStr;

use socbus_fdt::path::FdtPath;

use crate::soc::SocAddress;

/// Whether a device argument allows or denies a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevArgKind {
    /// The device is allow-listed. Once any device is allow-listed, only
    /// allow-listed devices are probed.
    Allowed,
    /// The device is deny-listed and is never initialised.
    Denied,
}

/// A device argument: an allow or deny entry for one device, with optional
/// driver arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevArg {
    kind: DevArgKind,
    address: SocAddress,
    args: String,
}

impl DevArg {
    /// Creates a device argument.
    #[must_use]
    pub fn new(kind: DevArgKind, address: SocAddress, args: impl Into<String>) -> Self {
        Self {
            kind,
            address,
            args: args.into(),
        }
    }

    /// Returns whether the device is allowed or denied.
    #[must_use]
    pub fn kind(&self) -> DevArgKind {
        self.kind
    }

    /// Returns the address of the device.
    #[must_use]
    pub fn address(&self) -> &SocAddress {
        &self.address
    }

    /// Returns the driver arguments, which may be empty.
    #[must_use]
    pub fn args(&self) -> &str {
        &self.args
    }
}

/// An error parsing a [`DevArg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevArgParseError {
    input: String,
}

impl fmt::Display for DevArgParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid device argument {:?}, expected allow:<path>[,args] or deny:<path>",
            self.input
        )
    }
}

impl core::error::Error for DevArgParseError {}

impl FromStr for DevArg {
    type Err = DevArgParseError;

    /// Parses `allow:<path>[,args]` or `deny:<path>[,args]`.
    ///
    /// The path is normalised, so `deny:/soc/./uart@0/` denies
    /// `/soc/uart@0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || DevArgParseError {
            input: s.to_owned(),
        };
        let (kind, rest) = if let Some(rest) = s.strip_prefix("allow:") {
            (DevArgKind::Allowed, rest)
        } else if let Some(rest) = s.strip_prefix("deny:") {
            (DevArgKind::Denied, rest)
        } else {
            return Err(error());
        };
        let (path, args) = rest.split_once(',').unwrap_or((rest, ""));
        let path = FdtPath::parse(path).map_err(|_| error())?;
        if path.is_root() {
            return Err(error());
        }
        Ok(Self::new(kind, SocAddress::new(path.to_string()), args))
    }
}

/// The list of device arguments.
#[derive(Debug, Clone, Default)]
pub struct DevArgs {
    entries: Vec<DevArg>,
}

impl DevArgs {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Earlier entries for the same address take
    /// precedence.
    pub fn add(&mut self, arg: DevArg) {
        self.entries.push(arg);
    }

    /// Returns the first entry for `address`.
    #[must_use]
    pub fn lookup(&self, address: &SocAddress) -> Option<&DevArg> {
        self.entries.iter().find(|arg| arg.address == *address)
    }

    /// Returns the number of entries of the given kind.
    #[must_use]
    pub fn count(&self, kind: DevArgKind) -> usize {
        self.entries.iter().filter(|arg| arg.kind == kind).count()
    }

    /// Returns true if any device is allow-listed.
    #[must_use]
    pub fn has_allow_list(&self) -> bool {
        self.count(DevArgKind::Allowed) > 0
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &DevArg> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
