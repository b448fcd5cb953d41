// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Mapping of device memory resources before a driver takes a device over.

use log::debug;

use crate::error::Error;
use crate::soc::{KernelDriver, SocDevice};

/// The result of [`ResourceMapper::map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    /// The resources were mapped.
    Mapped,
    /// Nothing had to be mapped.
    NotNeeded,
    /// The device is managed by something this mapper cannot take it from.
    /// The driver being probed is treated as not matching.
    Unmanaged,
}

/// Maps and unmaps the memory resources of devices.
pub trait ResourceMapper: Send + Sync {
    /// Prepares the resources of `device` for a driver that sets
    /// [`DriverFlags::NEED_MAPPING`](crate::DriverFlags::NEED_MAPPING).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceMapping`] if mapping failed.
    fn map(&self, device: &mut SocDevice) -> Result<MapOutcome, Error>;

    /// Releases what [`map`](Self::map) set up.
    fn unmap(&self, device: &mut SocDevice);
}

/// Only takes over devices that no kernel driver is bound to.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelDriverMapper;

impl ResourceMapper for KernelDriverMapper {
    fn map(&self, device: &mut SocDevice) -> Result<MapOutcome, Error> {
        match device.kernel_driver() {
            KernelDriver::None => Ok(MapOutcome::Mapped),
            KernelDriver::Unknown | KernelDriver::Bound(_) => {
                debug!("  Not managed by a supported kernel driver, skipped");
                Ok(MapOutcome::Unmanaged)
            }
        }
    }

    fn unmap(&self, device: &mut SocDevice) {
        for resource in device.resources_mut() {
            resource.mapped = None;
        }
    }
}
