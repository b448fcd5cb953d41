// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime configuration.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use socbus_fdt::reader::DEFAULT_ROOT;

/// The default listing of platform bus devices.
pub const DEFAULT_SYSFS_DEVICES: &str = "/sys/bus/platform/devices";

/// Overrides [`Config::sysfs_devices`].
pub const ENV_SYSFS_DEVICES: &str = "SOCBUS_SYSFS_DEVICES";
/// Overrides [`Config::fdt_root`].
pub const ENV_FDT_ROOT: &str = "SOCBUS_FDT_ROOT";
/// Overrides [`Config::no_soc`].
pub const ENV_NO_SOC: &str = "SOCBUS_NO_SOC";

/// Where to look for devices, and whether to look at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    sysfs_devices: PathBuf,
    fdt_root: PathBuf,
    no_soc: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysfs_devices: PathBuf::from(DEFAULT_SYSFS_DEVICES),
            fdt_root: PathBuf::from(DEFAULT_ROOT),
            no_soc: false,
        }
    }
}

impl Config {
    /// Creates the default configuration, overridden by the `SOCBUS_*`
    /// environment variables that are set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_SYSFS_DEVICES) {
            config.sysfs_devices = path.into();
        }
        if let Some(path) = lookup(ENV_FDT_ROOT) {
            config.fdt_root = path.into();
        }
        if let Some(value) = lookup(ENV_NO_SOC) {
            config.no_soc = matches!(
                value.to_string_lossy().trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        config
    }

    /// Sets the platform bus listing.
    #[must_use]
    pub fn with_sysfs_devices(mut self, path: impl Into<PathBuf>) -> Self {
        self.sysfs_devices = path.into();
        self
    }

    /// Sets the device tree export root.
    #[must_use]
    pub fn with_fdt_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.fdt_root = path.into();
        self
    }

    /// Sets whether the initial scan is skipped.
    #[must_use]
    pub fn with_no_soc(mut self, no_soc: bool) -> Self {
        self.no_soc = no_soc;
        self
    }

    /// Returns the directory listing one entry per platform device.
    #[must_use]
    pub fn sysfs_devices(&self) -> &Path {
        &self.sysfs_devices
    }

    /// Returns the root of the exported device tree.
    #[must_use]
    pub fn fdt_root(&self) -> &Path {
        &self.fdt_root
    }

    /// Returns true if SoC devices should not be scanned on init.
    #[must_use]
    pub fn no_soc(&self) -> bool {
        self.no_soc
    }
}
