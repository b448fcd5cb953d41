// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use core::ops::ControlFlow;
use std::path::PathBuf;

use socbus_fdt::TreeError;
use socbus_fdt::path::FdtPath;
use socbus_fdt::reader::{DEFAULT_ROOT, TreeReader};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn xgene1() -> TreeReader {
    TreeReader::open(Some(fixture("xgene1")))
}

#[test]
fn open_defaults_to_proc() {
    let tree = TreeReader::open(None::<&str>);
    assert_eq!(tree.root(), PathBuf::from(DEFAULT_ROOT));
    tree.close();
}

#[test]
fn read_model_string() {
    let tree = xgene1();
    let path = FdtPath::parse("/model").unwrap();
    let model = tree.read_string(&path, None).unwrap();
    assert_eq!(model.len(), 25);
    assert_eq!(model.as_str(), Some("APM X-Gene Mustang board"));
    assert_eq!(model.as_bytes_with_nul().len(), 26);
}

#[test]
fn read_compatible_string_list() {
    let tree = xgene1();
    let compatible = tree
        .read_string(&FdtPath::root(), Some("compatible"))
        .unwrap();
    assert_eq!(compatible.len(), 28);
    assert_eq!(compatible.as_str(), Some("apm,mustang"));
    assert_eq!(&compatible.as_bytes()[12..27], b"apm,xgene-storm");

    let strings: Vec<_> = compatible.strings().collect();
    assert_eq!(strings, ["apm,mustang", "apm,xgene-storm"]);
}

#[test]
fn read_cells() {
    let tree = xgene1();
    let root = FdtPath::root();

    let mut cells = [0u32; 1];
    assert_eq!(
        tree.read_u32_array(&root, Some("#address-cells"), &mut cells)
            .unwrap(),
        1
    );
    assert_eq!(cells[0], 2);

    let path = FdtPath::parse("/#size-cells").unwrap();
    assert_eq!(tree.read_u32(&path, None).unwrap(), Some(2));

    let mut more = [0u32; 4];
    assert_eq!(
        tree.read_u32_array(&root, Some("#size-cells"), &mut more)
            .unwrap(),
        1
    );
}

#[test]
fn read_ethernet() {
    let tree = xgene1();
    let base = FdtPath::parse("/soc/ethernet@17020000").unwrap();

    let mut reg = [0u64; 6];
    assert_eq!(tree.read_u64_array(&base, Some("reg"), &mut reg).unwrap(), 6);
    assert_eq!(
        reg,
        [0x1702_0000, 0x30, 0x1702_0000, 0x1_0000, 0x1702_0000, 0x20]
    );

    let mut first = [0u64; 2];
    assert_eq!(
        tree.read_u64_array(&base, Some("reg"), &mut first).unwrap(),
        2
    );
    assert_eq!(first, [0x1702_0000, 0x30]);

    let mut mac = [0u8; 6];
    assert_eq!(
        tree.read_raw(&base, Some("local-mac-address"), &mut mac)
            .unwrap(),
        6
    );
    assert_eq!(mac, [0x00, 0x11, 0x3a, 0x8a, 0x5a, 0x78]);

    let mut larger = [0u8; 64];
    assert_eq!(
        tree.read_raw(&base, Some("local-mac-address"), &mut larger)
            .unwrap(),
        6
    );
}

#[test]
fn absent_property_reads_as_empty() {
    let tree = xgene1();
    let base = FdtPath::parse("/soc/ethernet@17020000").unwrap();

    let mut cells = [0u32; 2];
    assert_eq!(
        tree.read_u32_array(&base, Some("no-such-property"), &mut cells)
            .unwrap(),
        0
    );
    assert_eq!(tree.read_u32(&base, Some("no-such-property")).unwrap(), None);
    assert!(
        tree.read_string(&base, Some("no-such-property"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn walk_root() {
    let tree = xgene1();
    let mut seen = Vec::new();
    let stopped = tree
        .walk_children::<(), _>(&FdtPath::root(), |_, base, name| {
            assert!(base.is_root());
            seen.push(name.to_owned());
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(stopped, None);

    seen.sort();
    assert_eq!(
        seen,
        ["#address-cells", "#size-cells", "compatible", "model", "soc"]
    );
}

#[test]
fn walk_stops_early() {
    let tree = xgene1();
    let soc = FdtPath::parse("/soc").unwrap();
    let mut visited = 0;
    let found = tree
        .walk_children(&soc, |tree, base, name| {
            visited += 1;
            if tree.is_node(base, Some(name)).unwrap() {
                ControlFlow::Break(name.to_owned())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    let found = found.unwrap();
    assert!(found.contains('@'));
    assert!(visited <= 6);
}

#[test]
fn walk_missing_node_fails() {
    let tree = xgene1();
    let missing = FdtPath::parse("/no/such/node").unwrap();
    let err = tree
        .walk_children::<(), _>(&missing, |_, _, _| ControlFlow::Continue(()))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn children_sorted() {
    let tree = xgene1();
    let soc = FdtPath::parse("/soc").unwrap();
    assert_eq!(
        tree.children(&soc).unwrap(),
        [
            "#address-cells",
            "#size-cells",
            "compatible",
            "ethernet@17020000",
            "serial@1c020000",
            "test@1c000000",
        ]
    );
}

#[test]
fn symlink_escape_is_rejected() {
    let tree = TreeReader::open(Some(fixture("sandbox/root")));

    let escape = FdtPath::parse("/escape").unwrap();
    let err = tree.read_string(&escape, Some("secret")).unwrap_err();
    assert!(matches!(err, TreeError::OutsideRoot { .. }));

    let mut buf = [0u8; 16];
    let err = tree.read_raw(&escape, Some("secret"), &mut buf).unwrap_err();
    assert!(matches!(err, TreeError::OutsideRoot { .. }));

    let err = tree
        .walk_children::<(), _>(&escape, |_, _, _| ControlFlow::Continue(()))
        .unwrap_err();
    assert!(matches!(err, TreeError::OutsideRoot { .. }));
}

#[test]
fn symlink_inside_root_is_followed() {
    let tree = TreeReader::open(Some(fixture("sandbox/root")));
    let value = tree.read_string(&FdtPath::root(), Some("alias")).unwrap();
    assert_eq!(value.as_str(), Some("inside"));
}

#[test]
fn load_subtree() {
    let tree = xgene1();
    let node = tree
        .load(&FdtPath::parse("/soc/ethernet@17020000").unwrap())
        .unwrap();
    assert_eq!(node.name(), "ethernet@17020000");
    assert_eq!(
        node.property("local-mac-address"),
        Some(&[0x00, 0x11, 0x3a, 0x8a, 0x5a, 0x78][..])
    );
    assert_eq!(
        node.property_strings("compatible").collect::<Vec<_>>(),
        ["apm,xgene-enet"]
    );
    assert_eq!(node.children().count(), 0);

    let root = tree.load(&FdtPath::root()).unwrap();
    assert_eq!(root.name(), "");
    let soc = root.child("soc").unwrap();
    assert_eq!(soc.children().count(), 3);
    assert!(soc.child("test@1c000000").is_some());
}

#[test]
fn display_subtree() {
    let tree = xgene1();
    let node = tree
        .load(&FdtPath::parse("/soc/test@1c000000").unwrap())
        .unwrap();
    assert_eq!(
        node.to_string(),
        "test@1c000000 {\n    \
             compatible = \"dpdk,test-device\";\n    \
             reg = <0x00 0x1c000000 0x00 0x1000>;\n\
         };\n"
    );

    let ethernet = tree
        .load(&FdtPath::parse("/soc/ethernet@17020000").unwrap())
        .unwrap();
    assert!(
        ethernet
            .to_string()
            .contains("local-mac-address = [00 11 3a 8a 5a 78];")
    );
}

#[test]
fn load_rejects_escaping_subtree() {
    let tree = TreeReader::open(Some(fixture("sandbox/root")));
    let err = tree.load(&FdtPath::root()).unwrap_err();
    assert!(matches!(err, TreeError::OutsideRoot { .. }));
}

#[test]
fn dump_subtree() {
    let tree = xgene1();
    let mut out = Vec::new();
    tree.dump(&FdtPath::parse("/soc/serial@1c020000").unwrap(), &mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "serial@1c020000 {\n    \
             compatible = \"ns16550a\";\n    \
             reg = <0x00 0x1c020000 0x00 0x100>;\n\
         };\n"
    );
}
