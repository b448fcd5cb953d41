// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Enumeration of the platform bus.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Error;
use crate::soc::KernelDriver;

/// A source of platform devices.
///
/// [`SysfsBus`] reads the devices the kernel exports; tests and embedders
/// may provide their own.
pub trait PlatformBus: Send + Sync {
    /// Returns the names of all device entries on the bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus cannot be listed.
    fn list_devices(&self) -> Result<Vec<String>, Error>;

    /// Reads a text attribute (such as `uevent` or `numa_node`) of a device.
    /// Returns `None` if the device has no such attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute exists but cannot be read.
    fn read_attribute(&self, device: &str, attribute: &str) -> Result<Option<String>, Error>;

    /// Returns which kernel driver manages a device.
    ///
    /// # Errors
    ///
    /// Returns an error if the binding cannot be determined.
    fn kernel_driver(&self, device: &str) -> Result<KernelDriver, Error>;
}

/// The platform bus as exported by the kernel under
/// `/sys/bus/platform/devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsBus {
    root: PathBuf,
}

impl SysfsBus {
    /// Creates a bus reading device entries from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory the device entries are listed in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PlatformBus for SysfsBus {
    fn list_devices(&self) -> Result<Vec<String>, Error> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                debug!("skipping non UTF-8 bus entry {:?}", entry.file_name());
                continue;
            };
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn read_attribute(&self, device: &str, attribute: &str) -> Result<Option<String>, Error> {
        let path = self.root.join(device).join(attribute);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    fn kernel_driver(&self, device: &str) -> Result<KernelDriver, Error> {
        let path = self.root.join(device).join("driver");
        match fs::read_link(&path) {
            Ok(target) => Ok(target
                .file_name()
                .map_or(KernelDriver::Unknown, |name| {
                    KernelDriver::Bound(name.to_string_lossy().into_owned())
                })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(KernelDriver::None),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}
