// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use socbus::uevent::{MAX_COMPATIBLES, Uevent, parse};
use socbus::UeventError;

#[test]
fn parse_compatibles_in_index_order() {
    let record = "DRIVER=xgene-enet\n\
                  OF_NAME=ethernet\n\
                  OF_FULLNAME=/soc/ethernet@17020000\n\
                  OF_COMPATIBLE_1=apm,xgene-enet\n\
                  OF_COMPATIBLE_0=apm,xgene1-sgenet\n\
                  OF_COMPATIBLE_N=2\n";
    assert_eq!(
        parse(record).unwrap(),
        Some(Uevent {
            fullname: "/soc/ethernet@17020000".to_owned(),
            compatible: vec!["apm,xgene1-sgenet".to_owned(), "apm,xgene-enet".to_owned()],
        })
    );
}

#[test]
fn no_compatibles() {
    let parsed = parse("OF_FULLNAME=/soc/bare\nOF_COMPATIBLE_N=0").unwrap().unwrap();
    assert_eq!(parsed.fullname, "/soc/bare");
    assert!(parsed.compatible.is_empty());
}

#[test]
fn not_a_device_tree_device() {
    assert_eq!(parse("DRIVER=serial8250\nMODALIAS=platform:serial8250\n"), Ok(None));
    assert_eq!(parse(""), Ok(None));
}

#[test]
fn missing_count() {
    assert_eq!(
        parse("OF_FULLNAME=/soc/a\nOF_COMPATIBLE_0=x\n"),
        Err(UeventError::MissingEntry {
            key: "OF_COMPATIBLE_N"
        })
    );
}

#[test]
fn invalid_count() {
    assert!(matches!(
        parse("OF_FULLNAME=/soc/a\nOF_COMPATIBLE_N=two\n"),
        Err(UeventError::InvalidCount { value }) if value == "two"
    ));
    assert!(matches!(
        parse("OF_FULLNAME=/soc/a\nOF_COMPATIBLE_N=-1\n"),
        Err(UeventError::InvalidCount { .. })
    ));
}

#[test]
fn count_sanity_bound() {
    let record = format!("OF_FULLNAME=/soc/a\nOF_COMPATIBLE_N={}\n", MAX_COMPATIBLES + 1);
    assert_eq!(
        parse(&record),
        Err(UeventError::TooManyCompatibles { count: 10000 })
    );
}

#[test]
fn missing_indexed_compatible() {
    let record = "OF_FULLNAME=/soc/broken@0\nOF_COMPATIBLE_0=vendor,broken\nOF_COMPATIBLE_N=2\n";
    let err = parse(record).unwrap_err();
    assert_eq!(err, UeventError::MissingCompatible { index: 1 });
    assert_eq!(err.to_string(), "missing uevent entry OF_COMPATIBLE_1");
}
