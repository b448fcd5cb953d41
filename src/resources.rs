// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Memory resources decoded from the `reg` property of a device node.

use core::mem::size_of;

use log::warn;
use socbus_fdt::path::FdtPath;
use socbus_fdt::reader::TreeReader;
use zerocopy::FromBytes;
use zerocopy::byteorder::big_endian;

use crate::error::Error;
use crate::soc::{MAX_RESOURCES, SocResource};

const DEFAULT_ADDRESS_CELLS: u32 = 2;
const DEFAULT_SIZE_CELLS: u32 = 1;
// Addresses and lengths are stored in 64 bits.
const MAX_CELLS: u32 = 2;

/// Reads the memory resources of the node at `devtree_path`.
///
/// The cell sizes come from the parent node, as the device tree requires.
pub(crate) fn read_resources(
    tree: &TreeReader,
    devtree_path: &str,
) -> Result<Vec<SocResource>, Error> {
    let node = match FdtPath::parse(devtree_path) {
        Ok(node) => node,
        Err(e) => {
            warn!("cannot read resources of {devtree_path}: {e}");
            return Ok(Vec::new());
        }
    };
    let mut parent = node.clone();
    parent.pop();

    let address_cells = tree
        .read_u32(&parent, Some("#address-cells"))?
        .unwrap_or(DEFAULT_ADDRESS_CELLS);
    let size_cells = tree
        .read_u32(&parent, Some("#size-cells"))?
        .unwrap_or(DEFAULT_SIZE_CELLS);
    if !cells_supported(address_cells, size_cells) {
        warn!("{devtree_path}: unsupported cell sizes {address_cells}/{size_cells}");
        return Ok(Vec::new());
    }

    let cells_per_entry = (address_cells + size_cells) as usize;
    let mut raw = vec![0; MAX_RESOURCES * cells_per_entry * size_of::<u32>()];
    let len = tree.read_raw(&node, Some("reg"), &mut raw)?;
    Ok(decode_reg(&raw[..len], address_cells, size_cells))
}

/// Decodes `(address, size)` pairs of the given cell sizes.
///
/// A trailing incomplete pair is ignored.
pub(crate) fn decode_reg(raw: &[u8], address_cells: u32, size_cells: u32) -> Vec<SocResource> {
    if !cells_supported(address_cells, size_cells) {
        return Vec::new();
    }
    let address_cells = address_cells as usize;
    let size_cells = size_cells as usize;
    let cells_per_entry = address_cells + size_cells;
    if cells_per_entry == 0 {
        return Vec::new();
    }

    let whole = raw.len() / size_of::<u32>() * size_of::<u32>();
    let Ok(cells) = <[big_endian::U32]>::ref_from_bytes(&raw[..whole]) else {
        return Vec::new();
    };
    cells
        .chunks_exact(cells_per_entry)
        .take(MAX_RESOURCES)
        .map(|entry| {
            let (address, size) = entry.split_at(address_cells);
            SocResource::new(combine(address), combine(size))
        })
        .collect()
}

fn cells_supported(address_cells: u32, size_cells: u32) -> bool {
    address_cells <= MAX_CELLS && size_cells <= MAX_CELLS
}

fn combine(cells: &[big_endian::U32]) -> u64 {
    cells
        .iter()
        .fold(0, |value, cell| (value << 32) | u64::from(cell.get()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be_cells(cells: &[u32]) -> Vec<u8> {
        cells.iter().flat_map(|cell| cell.to_be_bytes()).collect()
    }

    #[test]
    fn two_address_cells_one_size_cell() {
        let raw = be_cells(&[0x1, 0x2000_0000, 0x1000, 0x0, 0x3000_0000, 0x2000]);
        assert_eq!(
            decode_reg(&raw, 2, 1),
            [
                SocResource::new(0x1_2000_0000, 0x1000),
                SocResource::new(0x3000_0000, 0x2000),
            ]
        );
    }

    #[test]
    fn single_cells() {
        let raw = be_cells(&[0x1c02_0000, 0x100]);
        assert_eq!(decode_reg(&raw, 1, 1), [SocResource::new(0x1c02_0000, 0x100)]);
    }

    #[test]
    fn incomplete_and_excess_entries() {
        let raw = be_cells(&[0x10, 0x1, 0x20]);
        assert_eq!(decode_reg(&raw, 1, 1), [SocResource::new(0x10, 0x1)]);

        let raw = be_cells(&[0x0; 20]);
        assert_eq!(decode_reg(&raw, 1, 1).len(), MAX_RESOURCES);

        assert!(decode_reg(&raw, 0, 0).is_empty());
        assert!(decode_reg(&[0x12, 0x34], 1, 1).is_empty());
    }

    #[test]
    fn wide_cells_are_rejected() {
        let raw = be_cells(&[0x1, 0x0, 0x2000_0000, 0x0, 0x1000]);
        assert!(decode_reg(&raw, 3, 2).is_empty());
        assert!(decode_reg(&raw, 2, 3).is_empty());
        assert_eq!(
            decode_reg(&raw[4..], 2, 2),
            [SocResource::new(0x2000_0000, 0x1000)]
        );
    }
}
