// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Conversion from `/`-separated strings to [`FdtPath`] chains.

use core::str::FromStr;

use super::FdtPath;
use crate::error::{ParseError, ParseErrorKind};

impl FdtPath {
    /// Parses an absolute device tree path.
    ///
    /// Repeated and trailing slashes are collapsed, `.` segments are skipped
    /// and `..` removes the previous component. Going above the root with
    /// `..` is not an error; the path simply stays at the root.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the string is empty, does not start with
    /// `/`, or contains a segment that is not a valid component name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socbus_fdt::path::FdtPath;
    /// let path = FdtPath::parse("/amba/./xxx/").unwrap();
    /// assert_eq!(path.components(), ["amba", "xxx"]);
    ///
    /// assert!(FdtPath::parse("/amba/../xxx/..").unwrap().is_root());
    /// assert!(FdtPath::parse("/..").unwrap().is_root());
    /// assert!(FdtPath::parse("..").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self, ParseError> {
        if path.is_empty() {
            return Err(ParseError::new(ParseErrorKind::Empty, 0));
        }
        let Some(rest) = path.strip_prefix('/') else {
            return Err(ParseError::new(ParseErrorKind::NotAbsolute, 0));
        };

        let mut parsed = FdtPath::root();
        let mut offset = 1;
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parsed.pop();
                }
                name => {
                    parsed
                        .push(name)
                        .map_err(|_| ParseError::new(ParseErrorKind::InvalidName, offset))?;
                }
            }
            offset += segment.len() + 1;
        }

        Ok(parsed)
    }
}

impl FromStr for FdtPath {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FdtPath {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_segment_offset() {
        let err = FdtPath::parse("/soc/bad\\name/x").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidName);
        assert_eq!(err.offset(), 5);
    }

    #[test]
    fn relative_paths_are_rejected() {
        let err = FdtPath::parse("soc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NotAbsolute);
    }
}
