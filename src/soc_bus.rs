// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The SoC bus: scanning, probing and detaching of platform devices.

use std::io;
use std::sync::Arc;

use log::{debug, error, info, warn};
use socbus_fdt::reader::TreeReader;
use spin::mutex::SpinMutex;

use crate::bus::{PlatformBus, SysfsBus};
use crate::config::Config;
use crate::devargs::{DevArg, DevArgKind, DevArgs};
use crate::error::Error;
use crate::mapping::{KernelDriverMapper, ResourceMapper};
use crate::matching::{DetachOutcome, ProbeOutcome, detach_all_drivers, probe_all_drivers};
use crate::registry::{DeviceRegistry, DriverRegistry};
use crate::resources::read_resources;
use crate::soc::{MAX_RESOURCES, SocAddress, SocDevice, SocDriver, SocId};
use crate::uevent;

/// The devices found on a platform bus and the drivers that may take them.
///
/// Locks are always taken in the order device arguments, drivers, devices.
/// Driver callbacks run with the device lock held and must not call back
/// into the same bus.
pub struct SocBus {
    bus: Box<dyn PlatformBus>,
    mapper: Box<dyn ResourceMapper>,
    tree: Option<TreeReader>,
    devargs: SpinMutex<DevArgs>,
    drivers: SpinMutex<DriverRegistry>,
    devices: SpinMutex<DeviceRegistry>,
}

impl SocBus {
    /// Creates an empty bus over `bus`, mapping resources with
    /// [`KernelDriverMapper`] and without a device tree.
    pub fn new(bus: impl PlatformBus + 'static) -> Self {
        Self {
            bus: Box::new(bus),
            mapper: Box::new(KernelDriverMapper),
            tree: None,
            devargs: SpinMutex::new(DevArgs::new()),
            drivers: SpinMutex::new(DriverRegistry::default()),
            devices: SpinMutex::new(DeviceRegistry::default()),
        }
    }

    /// Replaces the resource mapper.
    #[must_use]
    pub fn with_mapper(mut self, mapper: impl ResourceMapper + 'static) -> Self {
        self.mapper = Box::new(mapper);
        self
    }

    /// Reads the memory resources of scanned devices from `tree`.
    #[must_use]
    pub fn with_tree(mut self, tree: TreeReader) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Creates the bus described by `config` and scans it, unless
    /// [`Config::no_soc`] is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails.
    pub fn init(config: &Config) -> Result<Self, Error> {
        let mut soc = Self::new(SysfsBus::new(config.sysfs_devices()));
        if config.fdt_root().is_dir() {
            soc = soc.with_tree(TreeReader::open(Some(config.fdt_root())));
        } else {
            info!(
                "no device tree at {}, SoC resources are unknown",
                config.fdt_root().display()
            );
        }

        if config.no_soc() {
            return Ok(soc);
        }
        soc.scan().inspect_err(|e| {
            error!("Failed to scan for SoC devices: {e}");
        })?;
        Ok(soc)
    }

    /// Returns the device tree resources are read from, if any.
    #[must_use]
    pub fn tree(&self) -> Option<&TreeReader> {
        self.tree.as_ref()
    }

    /// Registers a driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDriver`] if a driver with the same name is
    /// already registered.
    pub fn register_driver(&self, driver: Arc<dyn SocDriver>) -> Result<(), Error> {
        self.drivers.lock().register(driver)
    }

    /// Unregisters the driver with the given name and returns it.
    ///
    /// Devices bound to the driver stay bound until they are detached.
    pub fn unregister_driver(&self, name: &str) -> Option<Arc<dyn SocDriver>> {
        self.drivers.lock().unregister(name)
    }

    /// Returns the number of registered drivers.
    #[must_use]
    pub fn driver_count(&self) -> usize {
        self.drivers.lock().len()
    }

    /// Adds an allow or deny entry. It takes effect on the next probe.
    pub fn add_devarg(&self, arg: DevArg) {
        self.devargs.lock().add(arg);
    }

    /// Removes all allow and deny entries.
    pub fn clear_devargs(&self) {
        self.devargs.lock().clear();
    }

    /// Enumerates the platform bus and adds every device tree backed device,
    /// merging devices that are already known.
    ///
    /// Entries with malformed `uevent` records or NUMA nodes are skipped.
    /// A device whose memory resources cannot be read from the device tree
    /// is kept without resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus cannot be read.
    pub fn scan(&self) -> Result<(), Error> {
        for name in self.bus.list_devices()? {
            match self.scan_one(&name) {
                Ok(Some(device)) => {
                    self.devices.lock().insert_or_merge(device);
                }
                Ok(None) => {}
                Err(Error::Uevent { entry, source }) => {
                    warn!("skipping SoC device {entry}: {source}");
                }
                Err(e) => {
                    error!("cannot scan SoC device {name}: {e}");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn scan_one(&self, name: &str) -> Result<Option<SocDevice>, Error> {
        let record = self.bus.read_attribute(name, "uevent")?.unwrap_or_default();
        let parsed = uevent::parse(&record).map_err(|source| Error::Uevent {
            entry: name.to_owned(),
            source,
        })?;
        let Some(parsed) = parsed else {
            debug!("{name} is not described by the device tree, skipped");
            return Ok(None);
        };

        let numa_node = match self.bus.read_attribute(name, "numa_node")? {
            None => 0,
            Some(value) => match value.trim().parse::<i64>() {
                // -1 means no affinity.
                Ok(node) => u32::try_from(node).unwrap_or(0),
                Err(_) => {
                    warn!("skipping SoC device {name}: invalid numa_node {value:?}");
                    return Ok(None);
                }
            },
        };

        let resources = match &self.tree {
            Some(tree) => read_resources(tree, &parsed.fullname).unwrap_or_else(|e| {
                warn!("SoC device {name} has no usable resources: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let device = SocDevice::new(
            SocAddress::new(parsed.fullname).with_name(name),
            SocId::new(parsed.compatible),
        )
        .with_resources(resources)
        .with_numa_node(numa_node)
        .with_kernel_driver(self.bus.kernel_driver(name)?);
        Ok(Some(device))
    }

    /// Probes every unbound device.
    ///
    /// If any device is allow-listed, only allow-listed devices are probed.
    /// Deny-listed devices are never initialised.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fatal`] as soon as a device cannot be probed; the
    /// remaining devices are left alone.
    pub fn probe_all(&self) -> Result<(), Error> {
        let devargs = self.devargs.lock();
        let drivers = self.drivers.lock();
        let mut devices = self.devices.lock();

        let allow_list = devargs.has_allow_list();
        for device in devices.iter_mut() {
            device.set_devargs(devargs.lookup(device.address()).cloned());
            if device.is_bound() {
                continue;
            }
            let requested = !allow_list
                || device
                    .devargs()
                    .is_some_and(|arg| arg.kind() == DevArgKind::Allowed);
            if !requested {
                continue;
            }

            match probe_all_drivers(&drivers, device, self.mapper.as_ref()) {
                Ok(outcome) => debug!("probed {}: {outcome:?}", device.address()),
                Err(source) => {
                    error!("Requested device {} cannot be used", device.address());
                    return Err(Error::Fatal {
                        address: device.address().clone(),
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(())
    }

    /// Probes the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such device,
    /// [`Error::AlreadyBound`] if it is bound, or the error of the driver.
    pub fn probe_one(&self, address: &SocAddress) -> Result<ProbeOutcome, Error> {
        let devargs = self.devargs.lock();
        let drivers = self.drivers.lock();
        let mut devices = self.devices.lock();

        let (_, device) = devices.find_mut(address).ok_or_else(|| Error::NotFound {
            address: address.clone(),
        })?;
        if let Some(driver) = device.driver() {
            return Err(Error::AlreadyBound {
                address: address.clone(),
                driver: driver.name().to_owned(),
            });
        }
        device.set_devargs(devargs.lookup(address).cloned());

        probe_all_drivers(&drivers, device, self.mapper.as_ref()).inspect_err(|_| {
            warn!("Failed to probe device {address}");
        })
    }

    /// Detaches the device at `address` from its driver and removes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such device, or the error
    /// of the driver, in which case the device is kept.
    pub fn detach(&self, address: &SocAddress) -> Result<DetachOutcome, Error> {
        let mut devices = self.devices.lock();
        let (index, device) = devices.find_mut(address).ok_or_else(|| Error::NotFound {
            address: address.clone(),
        })?;

        let outcome = detach_all_drivers(device, self.mapper.as_ref()).inspect_err(|_| {
            warn!("Failed to detach device {address}");
        })?;
        devices.remove(index);
        Ok(outcome)
    }

    /// Writes every device with its compatible strings and memory resources.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let devices = self.devices.lock();
        for device in devices.iter() {
            writeln!(out, "{}", device.address())?;
            for compatible in device.id().compatible() {
                writeln!(out, "   {compatible}")?;
            }
            for index in 0..MAX_RESOURCES {
                let resource = device.resources().get(index).copied().unwrap_or_default();
                writeln!(out, "   {:016x} {:016x}", resource.phys_addr, resource.len)?;
            }
        }
        Ok(())
    }

    /// Returns a snapshot of all devices, in address order.
    #[must_use]
    pub fn devices(&self) -> Vec<SocDevice> {
        self.devices.lock().iter().cloned().collect()
    }

    /// Calls `f` with the device at `address`, if there is one.
    pub fn with_device<R>(
        &self,
        address: &SocAddress,
        f: impl FnOnce(&SocDevice) -> R,
    ) -> Option<R> {
        let devices = self.devices.lock();
        devices
            .iter()
            .find(|device| device.address() == address)
            .map(f)
    }
}
