// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error type of the SoC bus.

use core::fmt;
use std::io;
use std::path::PathBuf;

use socbus_fdt::TreeError;

use crate::soc::{DriverError, SocAddress};
use crate::uevent::UeventError;

/// An error reported by the SoC bus.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// No device has the given address.
    NotFound {
        /// The requested address.
        address: SocAddress,
    },
    /// The device is already bound to a driver and must be detached first.
    AlreadyBound {
        /// The address of the device.
        address: SocAddress,
        /// The name of the bound driver.
        driver: String,
    },
    /// A driver with the same name is already registered.
    DuplicateDriver {
        /// The name of the driver.
        name: String,
    },
    /// A driver failed to initialise a device.
    DriverInit {
        /// The address of the device.
        address: SocAddress,
        /// The name of the driver.
        driver: String,
        /// The error reported by the driver.
        source: DriverError,
    },
    /// A driver failed to release a device.
    DriverUninit {
        /// The address of the device.
        address: SocAddress,
        /// The name of the driver.
        driver: String,
        /// The error reported by the driver.
        source: DriverError,
    },
    /// The memory resources of a device could not be mapped.
    ResourceMapping {
        /// The address of the device.
        address: SocAddress,
        /// What went wrong.
        message: String,
    },
    /// The `uevent` record of a bus entry is malformed.
    Uevent {
        /// The name of the bus entry.
        entry: String,
        /// What is wrong with the record.
        source: UeventError,
    },
    /// Reading the platform bus failed.
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The error reported by the operating system.
        source: io::Error,
    },
    /// Reading the device tree failed.
    Tree(TreeError),
    /// A device that was requested to be probed could not be used.
    Fatal {
        /// The address of the device.
        address: SocAddress,
        /// Why the device could not be probed.
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { address } => write!(f, "no SoC device at {address}"),
            Error::AlreadyBound { address, driver } => {
                write!(f, "SoC device {address} is already bound to {driver}")
            }
            Error::DuplicateDriver { name } => {
                write!(f, "a SoC driver named {name} is already registered")
            }
            Error::DriverInit {
                address,
                driver,
                source,
            } => write!(f, "driver {driver} failed to initialise {address}: {source}"),
            Error::DriverUninit {
                address,
                driver,
                source,
            } => write!(f, "driver {driver} failed to release {address}: {source}"),
            Error::ResourceMapping { address, message } => {
                write!(f, "cannot map resources of {address}: {message}")
            }
            Error::Uevent { entry, source } => write!(f, "{entry}: {source}"),
            Error::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Error::Tree(source) => write!(f, "{source}"),
            Error::Fatal { address, source } => {
                write!(f, "requested device {address} cannot be used: {source}")
            }
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::DriverInit { source, .. } | Error::DriverUninit { source, .. } => Some(source),
            Error::Uevent { source, .. } => Some(source),
            Error::Io { source, .. } => Some(source),
            Error::Tree(source) => Some(source),
            Error::Fatal { source, .. } => Some(source.as_ref()),
            Error::NotFound { .. }
            | Error::AlreadyBound { .. }
            | Error::DuplicateDriver { .. }
            | Error::ResourceMapping { .. } => None,
        }
    }
}

impl From<TreeError> for Error {
    fn from(error: TreeError) -> Self {
        Error::Tree(error)
    }
}
