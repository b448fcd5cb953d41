// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The collections of known devices and registered drivers.

use core::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use twox_hash::xxhash64;

use crate::error::Error;
use crate::soc::{SocAddress, SocDevice, SocDriver};

/// Devices sorted by ascending address, at most one per address.
#[derive(Debug, Default)]
pub(crate) struct DeviceRegistry {
    devices: Vec<SocDevice>,
}

impl DeviceRegistry {
    /// Inserts `device` at its sorted position, or merges it into the device
    /// with the same address. Returns true if it was inserted.
    pub(crate) fn insert_or_merge(&mut self, device: SocDevice) -> bool {
        let index = self
            .devices
            .iter()
            .position(|existing| device.address().cmp(existing.address()) != Ordering::Greater);
        match index {
            Some(index) if self.devices[index].address() == device.address() => {
                debug!("SoC device {} already known, updating", device.address());
                self.devices[index].merge(device);
                false
            }
            Some(index) => {
                self.devices.insert(index, device);
                true
            }
            None => {
                self.devices.push(device);
                true
            }
        }
    }

    /// Returns the device at `address` together with its index.
    pub(crate) fn find_mut(&mut self, address: &SocAddress) -> Option<(usize, &mut SocDevice)> {
        self.devices
            .iter_mut()
            .enumerate()
            .find(|(_, device)| device.address() == address)
    }

    pub(crate) fn remove(&mut self, index: usize) -> SocDevice {
        self.devices.remove(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &SocDevice> {
        self.devices.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SocDevice> {
        self.devices.iter_mut()
    }
}

/// Drivers in registration order, keyed by name.
pub(crate) struct DriverRegistry {
    drivers: IndexMap<String, Arc<dyn SocDriver>, xxhash64::State>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self {
            drivers: IndexMap::with_hasher(xxhash64::State::with_seed(0xdead_cafe)),
        }
    }
}

impl DriverRegistry {
    pub(crate) fn register(&mut self, driver: Arc<dyn SocDriver>) -> Result<(), Error> {
        let name = driver.name().to_owned();
        if self.drivers.contains_key(&name) {
            return Err(Error::DuplicateDriver { name });
        }
        debug!("registered SoC driver {name}");
        self.drivers.insert(name, driver);
        Ok(())
    }

    pub(crate) fn unregister(&mut self, name: &str) -> Option<Arc<dyn SocDriver>> {
        self.drivers.shift_remove(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<dyn SocDriver>> {
        self.drivers.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.drivers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::{KernelDriver, SocId};

    fn device(path: &str) -> SocDevice {
        SocDevice::new(SocAddress::new(path), SocId::new(["test"]))
    }

    fn paths(registry: &DeviceRegistry) -> Vec<&str> {
        registry
            .iter()
            .map(|device| device.address().devtree_path())
            .collect()
    }

    #[test]
    fn sorted_insertion() {
        let mut registry = DeviceRegistry::default();
        for path in ["/soc/c", "/soc/a", "/soc/d", "/soc/b", "/a"] {
            assert!(registry.insert_or_merge(device(path)));
        }
        assert_eq!(paths(&registry), ["/a", "/soc/a", "/soc/b", "/soc/c", "/soc/d"]);
    }

    #[test]
    fn merge_keeps_one_entry() {
        let mut registry = DeviceRegistry::default();
        registry.insert_or_merge(device("/soc/a"));
        registry.insert_or_merge(device("/soc/b"));

        let rescanned = SocDevice::new(SocAddress::new("/soc/a"), SocId::new(["new"]))
            .with_numa_node(1)
            .with_kernel_driver(KernelDriver::None);
        assert!(!registry.insert_or_merge(rescanned));

        assert_eq!(paths(&registry), ["/soc/a", "/soc/b"]);
        let (index, merged) = registry.find_mut(&SocAddress::new("/soc/a")).unwrap();
        assert_eq!(index, 0);
        assert_eq!(merged.id(), &SocId::new(["new"]));
        assert_eq!(merged.numa_node(), 1);
        assert_eq!(merged.kernel_driver(), &KernelDriver::None);
    }
}
