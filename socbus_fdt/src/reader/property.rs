// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Property values read from an exported device tree.

use core::ffi::CStr;
use core::fmt;

/// The value of a property read as a string.
///
/// The value is stored exactly as read, followed by an extra terminating
/// NUL that is not counted by [`len`](Self::len). Device tree strings
/// already end with a NUL, and string lists contain one NUL per string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyString {
    bytes: Vec<u8>,
}

impl Default for PropertyString {
    fn default() -> Self {
        Self { bytes: vec![0] }
    }
}

impl PropertyString {
    pub(crate) fn new(mut bytes: Vec<u8>) -> Self {
        bytes.push(0);
        Self { bytes }
    }

    /// Returns the number of bytes read, excluding the extra terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Returns true if nothing was read (the property is empty or absent).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes read, excluding the extra terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Returns the bytes read followed by the extra terminator.
    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the first string of the value, up to the first NUL.
    ///
    /// Returns `None` if that string is not valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        CStr::from_bytes_until_nul(&self.bytes).ok()?.to_str().ok()
    }

    /// Returns an iterator over the NUL-separated strings of the value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socbus_fdt::reader::StringList;
    /// let strings: Vec<_> = StringList::new(b"apm,mustang\0apm,xgene-storm\0").collect();
    /// assert_eq!(strings, ["apm,mustang", "apm,xgene-storm"]);
    /// ```
    #[must_use]
    pub fn strings(&self) -> StringList<'_> {
        StringList::new(self.as_bytes())
    }

    /// Consumes the value and returns the bytes read.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.pop();
        self.bytes
    }
}

/// An iterator over the strings of a NUL-separated string list.
///
/// A final string without a terminating NUL is still returned. Strings that
/// are not valid UTF-8 end the iteration.
#[derive(Debug, Clone)]
pub struct StringList<'a> {
    value: &'a [u8],
}

impl<'a> StringList<'a> {
    /// Creates an iterator over the strings in `value`.
    #[must_use]
    pub fn new(value: &'a [u8]) -> Self {
        Self { value }
    }
}

impl<'a> Iterator for StringList<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.value.is_empty() {
            return None;
        }
        let end = self
            .value
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.value.len());
        let s = core::str::from_utf8(&self.value[..end]).ok()?;
        self.value = self.value.get(end + 1..).unwrap_or_default();
        Some(s)
    }
}

/// Writes `name = value;` in device tree source syntax, guessing the value
/// type from its contents.
pub(crate) fn fmt_property(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    value: &[u8],
    indent: usize,
) -> fmt::Result {
    write!(f, "{:indent$}{}", "", name, indent = indent)?;

    if value.is_empty() {
        writeln!(f, ";")?;
        return Ok(());
    }

    let is_printable = value
        .iter()
        .all(|&ch| ch.is_ascii_graphic() || ch == b' ' || ch == 0);
    let has_empty = value.windows(2).any(|window| window == [0, 0]) || value[0] == 0;
    if is_printable && value.ends_with(&[0]) && !has_empty {
        let mut strings = StringList::new(value);
        if let Some(first) = strings.next() {
            write!(f, " = \"{first}\"")?;
            for s in strings {
                write!(f, ", \"{s}\"")?;
            }
            writeln!(f, ";")?;
            return Ok(());
        }
    }

    if value.len().is_multiple_of(4) {
        write!(f, " = <")?;
        for (i, chunk) in value.chunks_exact(4).enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            let val = u32::from_be_bytes(
                chunk
                    .try_into()
                    .expect("u32::from_be_bytes() should always succeed with 4 bytes"),
            );
            write!(f, "0x{val:02x}")?;
        }
        writeln!(f, ">;")?;
    } else {
        write!(f, " = [")?;
        for (i, byte) in value.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        writeln!(f, "];")?;
    }

    Ok(())
}
