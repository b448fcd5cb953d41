// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The data model of SoC platform devices and their drivers.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use bitflags::bitflags;

use crate::devargs::DevArg;

/// The maximum number of memory resources of a single device.
pub const MAX_RESOURCES: usize = 6;

/// The address of a SoC device.
///
/// Devices are identified by the full path of their device tree node
/// (`OF_FULLNAME`). The name of the bus entry the device was found under is
/// kept for diagnostics but does not take part in comparisons.
#[derive(Debug, Clone)]
pub struct SocAddress {
    devtree_path: String,
    name: Option<String>,
}

impl SocAddress {
    /// Creates an address from a device tree path such as
    /// `/soc/ethernet@17020000`.
    #[must_use]
    pub fn new(devtree_path: impl Into<String>) -> Self {
        Self {
            devtree_path: devtree_path.into(),
            name: None,
        }
    }

    /// Attaches the platform bus entry name, e.g. `17020000.ethernet`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the device tree path of the device.
    #[must_use]
    pub fn devtree_path(&self) -> &str {
        &self.devtree_path
    }

    /// Returns the platform bus entry name, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for SocAddress {
    fn eq(&self, other: &Self) -> bool {
        self.devtree_path == other.devtree_path
    }
}

impl Eq for SocAddress {}

impl PartialOrd for SocAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SocAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.devtree_path.as_bytes().cmp(other.devtree_path.as_bytes())
    }
}

impl Hash for SocAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.devtree_path.hash(state);
    }
}

impl fmt::Display for SocAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.devtree_path)
    }
}

/// A set of `compatible` strings, in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocId {
    compatible: Vec<String>,
}

impl SocId {
    /// Creates an identity from a list of compatible strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use socbus::SocId;
    ///
    /// let device = SocId::new(["apm,xgene-enet", "apm,xgene1-sgenet"]);
    /// let driver = SocId::new(["apm,xgene1-sgenet"]);
    /// assert!(driver.matches(&device));
    /// assert!(!driver.matches(&SocId::new(["ns16550a"])));
    /// ```
    pub fn new<I, S>(compatible: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            compatible: compatible.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the compatible strings.
    #[must_use]
    pub fn compatible(&self) -> &[String] {
        &self.compatible
    }

    /// Returns true if there are no compatible strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compatible.is_empty()
    }

    /// Returns true if at least one compatible string of `self` equals one
    /// of `other`.
    #[must_use]
    pub fn matches(&self, other: &SocId) -> bool {
        self.compatible
            .iter()
            .any(|ours| other.compatible.iter().any(|theirs| ours == theirs))
    }
}

/// A memory resource of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocResource {
    /// The physical address of the region.
    pub phys_addr: u64,
    /// The length of the region in bytes.
    pub len: u64,
    /// Where the region is mapped in the address space of this process.
    pub mapped: Option<usize>,
}

impl SocResource {
    /// Creates an unmapped resource.
    #[must_use]
    pub fn new(phys_addr: u64, len: u64) -> Self {
        Self {
            phys_addr,
            len,
            mapped: None,
        }
    }
}

/// Which kernel driver, if any, manages a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KernelDriver {
    /// The state has not been determined.
    #[default]
    Unknown,
    /// No kernel driver is bound.
    None,
    /// The named kernel driver is bound.
    Bound(String),
}

bitflags! {
    /// Capabilities and requirements of a [`SocDriver`].
    #[derive(Default)]
    pub struct DriverFlags: u32 {
        /// The memory resources of the device must be mapped before init.
        const NEED_MAPPING = 1 << 0;
        /// The device should be unbound from its kernel driver on probe.
        const FORCE_UNBIND = 1 << 1;
        /// The driver supports link state change interrupts.
        const INTR_LSC = 1 << 2;
        /// The driver supports detaching devices at runtime.
        const DETACHABLE = 1 << 3;
        /// The driver works with devices that are not cache coherent.
        const NON_COHERENT = 1 << 4;
    }
}

/// An error returned by the callbacks of a [`SocDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    message: String,
}

impl DriverError {
    /// Creates an error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description of the error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for DriverError {}

/// A driver for SoC devices.
///
/// Drivers are shared with the bus as `Arc<dyn SocDriver>`; a bound device
/// only keeps a weak reference to its driver.
pub trait SocDriver: Send + Sync {
    /// Returns the unique name of the driver.
    fn name(&self) -> &str;

    /// Returns the identities this driver can operate.
    fn id_table(&self) -> &[SocId];

    /// Returns the flags of the driver.
    fn flags(&self) -> DriverFlags {
        DriverFlags::empty()
    }

    /// Initialises a device that matched [`id_table`](Self::id_table).
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the device cannot be brought up.
    fn init(&self, device: &mut SocDevice) -> Result<(), DriverError>;

    /// Releases a device previously initialised by this driver.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the device cannot be released.
    fn uninit(&self, device: &mut SocDevice) -> Result<(), DriverError> {
        let _ = device;
        Ok(())
    }
}

/// A discovered SoC device.
#[derive(Debug, Clone)]
pub struct SocDevice {
    address: SocAddress,
    id: SocId,
    resources: Vec<SocResource>,
    driver: Option<Weak<dyn SocDriver>>,
    numa_node: u32,
    kernel_driver: KernelDriver,
    devargs: Option<DevArg>,
}

impl SocDevice {
    /// Creates an unbound device with no resources.
    #[must_use]
    pub fn new(address: SocAddress, id: SocId) -> Self {
        Self {
            address,
            id,
            resources: Vec::new(),
            driver: None,
            numa_node: 0,
            kernel_driver: KernelDriver::Unknown,
            devargs: None,
        }
    }

    /// Sets the memory resources, keeping at most [`MAX_RESOURCES`].
    #[must_use]
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = SocResource>) -> Self {
        self.resources = resources.into_iter().take(MAX_RESOURCES).collect();
        self
    }

    /// Sets the NUMA node.
    #[must_use]
    pub fn with_numa_node(mut self, numa_node: u32) -> Self {
        self.numa_node = numa_node;
        self
    }

    /// Sets the kernel driver state.
    #[must_use]
    pub fn with_kernel_driver(mut self, kernel_driver: KernelDriver) -> Self {
        self.kernel_driver = kernel_driver;
        self
    }

    /// Returns the address of the device.
    #[must_use]
    pub fn address(&self) -> &SocAddress {
        &self.address
    }

    /// Returns the compatible strings of the device.
    #[must_use]
    pub fn id(&self) -> &SocId {
        &self.id
    }

    /// Returns the memory resources of the device.
    #[must_use]
    pub fn resources(&self) -> &[SocResource] {
        &self.resources
    }

    /// Returns the memory resources for a mapper to fill in.
    pub fn resources_mut(&mut self) -> &mut [SocResource] {
        &mut self.resources
    }

    /// Returns the NUMA node the device is attached to.
    #[must_use]
    pub fn numa_node(&self) -> u32 {
        self.numa_node
    }

    /// Returns the kernel driver state of the device.
    #[must_use]
    pub fn kernel_driver(&self) -> &KernelDriver {
        &self.kernel_driver
    }

    /// Returns the device argument that applied when the device was last
    /// probed.
    #[must_use]
    pub fn devargs(&self) -> Option<&DevArg> {
        self.devargs.as_ref()
    }

    /// Returns the driver the device is bound to, if it is still registered.
    #[must_use]
    pub fn driver(&self) -> Option<Arc<dyn SocDriver>> {
        self.driver.as_ref().and_then(Weak::upgrade)
    }

    /// Returns true if the device is bound to a driver.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.driver.is_some()
    }

    pub(crate) fn bind(&mut self, driver: &Arc<dyn SocDriver>) {
        self.driver = Some(Arc::downgrade(driver));
    }

    pub(crate) fn unbind(&mut self) {
        self.driver = None;
    }

    pub(crate) fn set_devargs(&mut self, devargs: Option<DevArg>) {
        self.devargs = devargs;
    }

    /// Takes the freshly scanned data of `scanned`, which has the same
    /// address, while keeping the driver binding of `self`.
    pub(crate) fn merge(&mut self, scanned: SocDevice) {
        self.address = scanned.address;
        self.id = scanned.id;
        self.resources = scanned.resources;
        self.numa_node = scanned.numa_node;
        self.kernel_driver = scanned.kernel_driver;
    }
}
