// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use socbus::{
    DriverError, DriverFlags, Error, KernelDriver, PlatformBus, SocDevice, SocDriver, SocId,
};
use spin::mutex::SpinMutex;

#[derive(Debug, Default, Clone)]
struct MemoryDevice {
    attributes: IndexMap<String, String>,
    kernel_driver: Option<String>,
}

/// A platform bus held in memory that tests can change between scans.
#[derive(Debug, Default, Clone)]
pub struct MemoryBus {
    devices: Arc<SpinMutex<IndexMap<String, MemoryDevice>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a device tree backed device.
    pub fn add(&self, name: &str, fullname: &str, compatible: &[&str]) {
        let mut uevent = format!("OF_NAME={name}\nOF_FULLNAME={fullname}\n");
        for (index, compatible) in compatible.iter().enumerate() {
            uevent.push_str(&format!("OF_COMPATIBLE_{index}={compatible}\n"));
        }
        uevent.push_str(&format!("OF_COMPATIBLE_N={}\n", compatible.len()));
        self.add_raw(name, &uevent);
    }

    /// Adds (or replaces) a device with the given `uevent` record.
    pub fn add_raw(&self, name: &str, uevent: &str) {
        let mut device = MemoryDevice::default();
        device
            .attributes
            .insert("uevent".to_owned(), uevent.to_owned());
        self.devices.lock().insert(name.to_owned(), device);
    }

    pub fn set_attribute(&self, name: &str, attribute: &str, value: &str) {
        if let Some(device) = self.devices.lock().get_mut(name) {
            device
                .attributes
                .insert(attribute.to_owned(), value.to_owned());
        }
    }

    pub fn set_kernel_driver(&self, name: &str, driver: Option<&str>) {
        if let Some(device) = self.devices.lock().get_mut(name) {
            device.kernel_driver = driver.map(str::to_owned);
        }
    }

    pub fn remove(&self, name: &str) {
        self.devices.lock().shift_remove(name);
    }
}

impl PlatformBus for MemoryBus {
    fn list_devices(&self) -> Result<Vec<String>, Error> {
        Ok(self.devices.lock().keys().cloned().collect())
    }

    fn read_attribute(&self, device: &str, attribute: &str) -> Result<Option<String>, Error> {
        Ok(self
            .devices
            .lock()
            .get(device)
            .and_then(|device| device.attributes.get(attribute).cloned()))
    }

    fn kernel_driver(&self, device: &str) -> Result<KernelDriver, Error> {
        Ok(
            match self
                .devices
                .lock()
                .get(device)
                .and_then(|device| device.kernel_driver.clone())
            {
                Some(name) => KernelDriver::Bound(name),
                None => KernelDriver::None,
            },
        )
    }
}

/// A driver counting how often it was asked to initialise and release
/// devices.
#[derive(Debug)]
pub struct CountingDriver {
    name: String,
    ids: Vec<SocId>,
    flags: DriverFlags,
    fail_init: bool,
    fail_uninit: bool,
    inits: AtomicUsize,
    uninits: AtomicUsize,
}

impl CountingDriver {
    pub fn new(name: &str, compatible: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            ids: vec![SocId::new(compatible.iter().copied())],
            flags: DriverFlags::empty(),
            fail_init: false,
            fail_uninit: false,
            inits: AtomicUsize::new(0),
            uninits: AtomicUsize::new(0),
        }
    }

    pub fn with_flags(mut self, flags: DriverFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_uninit(mut self) -> Self {
        self.fail_uninit = true;
        self
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn uninits(&self) -> usize {
        self.uninits.load(Ordering::SeqCst)
    }

    pub fn register(self, soc: &socbus::SocBus) -> Arc<Self> {
        let driver = Arc::new(self);
        soc.register_driver(driver.clone()).unwrap();
        driver
    }
}

impl SocDriver for CountingDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn id_table(&self) -> &[SocId] {
        &self.ids
    }

    fn flags(&self) -> DriverFlags {
        self.flags
    }

    fn init(&self, device: &mut SocDevice) -> Result<(), DriverError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(DriverError::new(format!("cannot reset {}", device.address())));
        }
        Ok(())
    }

    fn uninit(&self, device: &mut SocDevice) -> Result<(), DriverError> {
        self.uninits.fetch_add(1, Ordering::SeqCst);
        if self.fail_uninit {
            return Err(DriverError::new(format!("{} is busy", device.address())));
        }
        Ok(())
    }
}
