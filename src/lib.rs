// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Discovery of SoC platform devices and matching them with drivers.
//!
//! Platform devices on SoC boards are not discoverable the way PCI devices
//! are: the kernel learns about them from the device tree and exports one
//! entry per device under `/sys/bus/platform/devices`. A [`SocBus`] scans
//! those entries, keeps the devices sorted by device tree path, and binds
//! each device to the first registered [`SocDriver`] sharing one of its
//! `compatible` strings, honouring user supplied allow and deny lists.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use socbus::{Config, DriverError, SocBus, SocDevice, SocDriver, SocId};
//!
//! struct Enet {
//!     ids: Vec<SocId>,
//! }
//!
//! impl SocDriver for Enet {
//!     fn name(&self) -> &str {
//!         "xgene-enet"
//!     }
//!
//!     fn id_table(&self) -> &[SocId] {
//!         &self.ids
//!     }
//!
//!     fn init(&self, device: &mut SocDevice) -> Result<(), DriverError> {
//!         println!("taking over {}", device.address());
//!         Ok(())
//!     }
//! }
//!
//! let soc = SocBus::init(&Config::from_env()).unwrap();
//! soc.register_driver(Arc::new(Enet {
//!     ids: vec![SocId::new(["apm,xgene-enet"])],
//! }))
//! .unwrap();
//! soc.probe_all().unwrap();
//! soc.dump(&mut std::io::stdout()).unwrap();
//! ```

pub mod bus;
pub mod config;
pub mod devargs;
pub mod error;
pub mod logger;
pub mod mapping;
pub mod matching;
mod registry;
mod resources;
pub mod soc;
mod soc_bus;
pub mod uevent;

pub use bus::{PlatformBus, SysfsBus};
pub use config::Config;
pub use devargs::{DevArg, DevArgKind, DevArgs};
pub use error::Error;
pub use mapping::{KernelDriverMapper, MapOutcome, ResourceMapper};
pub use matching::{DetachOutcome, ProbeOutcome, id_match};
pub use soc::{
    DriverError, DriverFlags, KernelDriver, MAX_RESOURCES, SocAddress, SocDevice, SocDriver,
    SocId, SocResource,
};
pub use soc_bus::SocBus;
pub use uevent::UeventError;
