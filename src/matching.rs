// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pairing of devices with drivers.

use std::sync::Arc;

use log::{debug, warn};

use crate::devargs::DevArgKind;
use crate::error::Error;
use crate::mapping::{MapOutcome, ResourceMapper};
use crate::registry::DriverRegistry;
use crate::soc::{DriverFlags, SocDevice, SocDriver, SocId};

/// The result of probing a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A driver matched and initialised the device.
    Bound,
    /// A driver matched, but the device is deny-listed and was left alone.
    Denied,
    /// No driver matched.
    NoMatch,
}

/// The result of detaching a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachOutcome {
    /// The device was released by its driver.
    Unbound,
    /// The device was not bound to any driver.
    NotBound,
}

/// Returns true if any identity in `table` shares a compatible string with
/// `id`.
#[must_use]
pub fn id_match(table: &[SocId], id: &SocId) -> bool {
    table.iter().any(|entry| entry.matches(id))
}

/// Tries to bind `device` to `driver`.
pub(crate) fn probe_one_driver(
    driver: &Arc<dyn SocDriver>,
    device: &mut SocDevice,
    mapper: &dyn ResourceMapper,
) -> Result<ProbeOutcome, Error> {
    if !id_match(driver.id_table(), device.id()) {
        return Ok(ProbeOutcome::NoMatch);
    }

    debug!(
        "SoC device {} on NUMA socket {}",
        device.address(),
        device.numa_node()
    );
    debug!("  probe driver: {}", driver.name());

    if device
        .devargs()
        .is_some_and(|arg| arg.kind() == DevArgKind::Denied)
    {
        debug!("  Device is blacklisted, skipping");
        return Ok(ProbeOutcome::Denied);
    }

    let mapped = driver.flags().contains(DriverFlags::NEED_MAPPING);
    if mapped && mapper.map(device)? == MapOutcome::Unmanaged {
        return Ok(ProbeOutcome::NoMatch);
    }

    device.bind(driver);
    if let Err(source) = driver.init(device) {
        device.unbind();
        if mapped {
            mapper.unmap(device);
        }
        return Err(Error::DriverInit {
            address: device.address().clone(),
            driver: driver.name().to_owned(),
            source,
        });
    }
    Ok(ProbeOutcome::Bound)
}

/// Probes every registered driver in order until one matches.
pub(crate) fn probe_all_drivers(
    drivers: &DriverRegistry,
    device: &mut SocDevice,
    mapper: &dyn ResourceMapper,
) -> Result<ProbeOutcome, Error> {
    for driver in drivers.iter() {
        match probe_one_driver(driver, device, mapper)? {
            ProbeOutcome::NoMatch => {}
            outcome => return Ok(outcome),
        }
    }
    Ok(ProbeOutcome::NoMatch)
}

/// Releases `device` from the driver it is bound to.
pub(crate) fn detach_all_drivers(
    device: &mut SocDevice,
    mapper: &dyn ResourceMapper,
) -> Result<DetachOutcome, Error> {
    if !device.is_bound() {
        return Ok(DetachOutcome::NotBound);
    }
    let Some(driver) = device.driver() else {
        warn!(
            "the driver of SoC device {} was unregistered, dropping the binding",
            device.address()
        );
        device.unbind();
        return Ok(DetachOutcome::NotBound);
    };

    debug!(
        "SoC device {} on NUMA socket {}",
        device.address(),
        device.numa_node()
    );
    debug!("  remove driver: {} {}", device.address(), driver.name());

    driver.uninit(device).map_err(|source| Error::DriverUninit {
        address: device.address().clone(),
        driver: driver.name().to_owned(),
        source,
    })?;
    device.unbind();
    if driver.flags().contains(DriverFlags::NEED_MAPPING) {
        mapper.unmap(device);
    }
    Ok(DetachOutcome::Unbound)
}
