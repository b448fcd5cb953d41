// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing of the `uevent` records the kernel exports for platform devices.
//!
//! A record is a list of `KEY=value` lines:
//!
//! ```text
//! DRIVER=xgene-enet
//! OF_NAME=ethernet
//! OF_FULLNAME=/soc/ethernet@17020000
//! OF_COMPATIBLE_0=apm,xgene-enet
//! OF_COMPATIBLE_N=1
//! MODALIAS=of:NethernetT<NULL>Capm,xgene-enet
//! ```

use core::fmt;

use log::debug;

/// The largest accepted value of `OF_COMPATIBLE_N`.
pub const MAX_COMPATIBLES: usize = 9999;

const FULLNAME: &str = "OF_FULLNAME";
const COMPATIBLE_COUNT: &str = "OF_COMPATIBLE_N";

/// The device tree identity of a platform device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uevent {
    /// The full path of the device tree node.
    pub fullname: String,
    /// The compatible strings, in index order.
    pub compatible: Vec<String>,
}

/// A malformed `uevent` record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UeventError {
    /// A required entry is missing.
    MissingEntry {
        /// The key of the entry.
        key: &'static str,
    },
    /// `OF_COMPATIBLE_N` is not a number.
    InvalidCount {
        /// The rejected value.
        value: String,
    },
    /// `OF_COMPATIBLE_N` exceeds [`MAX_COMPATIBLES`].
    TooManyCompatibles {
        /// The rejected count.
        count: usize,
    },
    /// One of the `OF_COMPATIBLE_<index>` entries is missing.
    MissingCompatible {
        /// The missing index.
        index: usize,
    },
}

impl fmt::Display for UeventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UeventError::MissingEntry { key } => write!(f, "missing uevent entry {key}"),
            UeventError::InvalidCount { value } => {
                write!(f, "failed to parse {COMPATIBLE_COUNT}={value:?}")
            }
            UeventError::TooManyCompatibles { count } => {
                write!(f, "strange count of compatible entries: {count}")
            }
            UeventError::MissingCompatible { index } => {
                write!(f, "missing uevent entry OF_COMPATIBLE_{index}")
            }
        }
    }
}

impl core::error::Error for UeventError {}

/// Finds the line starting with `key=` and returns the rest of that line.
///
/// Only whole keys at the start of a line match, so a value that happens to
/// contain `key=` is never mistaken for the entry itself.
///
/// # Examples
///
/// ```
/// use socbus::uevent::find_entry;
///
/// let record = "DRIVER=x\nOF_NAME=serial\nOF_FULLNAME=/soc/serial@0\n";
/// assert_eq!(find_entry(record, "OF_FULLNAME"), Some("/soc/serial@0"));
/// assert_eq!(find_entry(record, "OF_TYPE"), None);
/// assert_eq!(find_entry(record, "NAME"), None);
/// ```
#[must_use]
pub fn find_entry<'a>(record: &'a str, key: &str) -> Option<&'a str> {
    record
        .split('\n')
        .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
}

/// Parses a `uevent` record.
///
/// Returns `Ok(None)` if the record has no `OF_FULLNAME`, meaning that the
/// device is not described by the device tree.
///
/// # Errors
///
/// Returns an error if the compatible entries are missing or inconsistent.
pub fn parse(record: &str) -> Result<Option<Uevent>, UeventError> {
    let Some(fullname) = find_entry(record, FULLNAME) else {
        return Ok(None);
    };
    debug!("{FULLNAME}={fullname}");

    let count = find_entry(record, COMPATIBLE_COUNT)
        .ok_or(UeventError::MissingEntry {
            key: COMPATIBLE_COUNT,
        })?;
    let count: usize = count
        .trim()
        .parse()
        .map_err(|_| UeventError::InvalidCount {
            value: count.to_owned(),
        })?;
    if count > MAX_COMPATIBLES {
        return Err(UeventError::TooManyCompatibles { count });
    }
    debug!("{COMPATIBLE_COUNT}={count}");

    let compatible = (0..count)
        .map(|index| {
            find_entry(record, &format!("OF_COMPATIBLE_{index}"))
                .map(str::to_owned)
                .ok_or(UeventError::MissingCompatible { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Uevent {
        fullname: fullname.to_owned(),
        compatible,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_at_line_start_only() {
        let record = "MODALIAS=of:OF_FULLNAME=/fake\nOF_FULLNAME=/soc/real";
        assert_eq!(find_entry(record, "OF_FULLNAME"), Some("/soc/real"));
    }

    #[test]
    fn entry_without_trailing_newline() {
        assert_eq!(find_entry("A=1\nB=2", "B"), Some("2"));
        assert_eq!(find_entry("A=", "A"), Some(""));
    }

    #[test]
    fn key_prefix_is_not_a_match() {
        assert_eq!(find_entry("OF_COMPATIBLE_10=x\n", "OF_COMPATIBLE_1"), None);
    }
}
