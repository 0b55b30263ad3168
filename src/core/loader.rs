// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Executable loading
//!
//! PS-X EXE files carry a 0x800-byte header followed by the raw text
//! section:
//!
//! ```text
//! 0x00-0x07: "PS-X EXE" marker
//! 0x10-0x13: initial PC (entry point)
//! 0x14-0x17: initial GP
//! 0x18-0x1B: RAM placement address
//! 0x1C-0x1F: text size in bytes
//! 0x20-0x27: data section base / size
//! 0x28-0x2F: bss section base / size
//! 0x30-0x33: initial SP base
//! 0x34-0x37: initial SP offset
//! 0x800+:    text section
//! ```
//!
//! All fields are little-endian u32. The loader copies the text into RAM at
//! the placement address, zeroes the declared bss, and sets PC/GP/SP.

use crate::core::error::{CoreError, Result};

/// A parsed PS-X EXE
#[derive(Debug, Clone)]
pub struct Executable {
    /// Entry point
    pub pc: u32,

    /// Initial global pointer (r28)
    pub gp: u32,

    /// RAM placement address of the text section
    pub load_address: u32,

    /// Declared data section (rarely used; kept for completeness)
    pub data_address: u32,
    pub data_size: u32,

    /// Declared bss section, zeroed at load
    pub bss_address: u32,
    pub bss_size: u32,

    /// Initial stack pointer base and offset; a base of zero leaves the
    /// stack registers alone
    pub stack_base: u32,
    pub stack_offset: u32,

    /// The raw text section
    pub text: Vec<u8>,
}

impl Executable {
    /// Fixed header size
    pub const HEADER_SIZE: usize = 0x800;

    /// ASCII marker at offset 0
    const MARKER: &'static [u8; 8] = b"PS-X EXE";

    /// Parse an executable from raw file bytes
    ///
    /// # Errors
    ///
    /// Fails when the file is shorter than the header, the marker is
    /// wrong, or the declared text size overruns the file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(CoreError::Loader(format!(
                "file too small for an EXE header: {} bytes",
                data.len()
            )));
        }

        if &data[0..8] != Self::MARKER {
            return Err(CoreError::Loader("bad PS-X EXE marker".to_string()));
        }

        let field = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        let pc = field(0x10);
        let gp = field(0x14);
        let load_address = field(0x18);
        let text_size = field(0x1C);
        let data_address = field(0x20);
        let data_size = field(0x24);
        let bss_address = field(0x28);
        let bss_size = field(0x2C);
        let stack_base = field(0x30);
        let stack_offset = field(0x34);

        let text_end = Self::HEADER_SIZE + text_size as usize;
        if text_end > data.len() {
            return Err(CoreError::Loader(format!(
                "text size 0x{:X} overruns the file",
                text_size
            )));
        }

        log::info!(
            "EXE: PC=0x{:08X} GP=0x{:08X} load=0x{:08X} text=0x{:X}",
            pc,
            gp,
            load_address,
            text_size,
        );

        Ok(Self {
            pc,
            gp,
            load_address,
            data_address,
            data_size,
            bss_address,
            bss_size,
            stack_base,
            stack_offset,
            text: data[Self::HEADER_SIZE..text_end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal header with the given field values
    fn make_exe(pc: u32, load: u32, text: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; Executable::HEADER_SIZE + text.len()];
        data[0..8].copy_from_slice(b"PS-X EXE");
        data[0x10..0x14].copy_from_slice(&pc.to_le_bytes());
        data[0x14..0x18].copy_from_slice(&0x8002_0000u32.to_le_bytes());
        data[0x18..0x1C].copy_from_slice(&load.to_le_bytes());
        data[0x1C..0x20].copy_from_slice(&(text.len() as u32).to_le_bytes());
        data[0x30..0x34].copy_from_slice(&0x801F_FF00u32.to_le_bytes());
        data[Executable::HEADER_SIZE..].copy_from_slice(text);
        data
    }

    #[test]
    fn test_parse_header_fields() {
        let exe = Executable::parse(&make_exe(0x8001_0000, 0x8001_0000, &[1, 2, 3, 4])).unwrap();
        assert_eq!(exe.pc, 0x8001_0000);
        assert_eq!(exe.gp, 0x8002_0000);
        assert_eq!(exe.load_address, 0x8001_0000);
        assert_eq!(exe.stack_base, 0x801F_FF00);
        assert_eq!(exe.stack_offset, 0);
        assert_eq!(exe.text, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_bad_marker_rejected() {
        let mut data = make_exe(0, 0, &[]);
        data[0] = b'X';
        assert!(Executable::parse(&data).is_err());
    }

    #[test]
    fn test_short_file_rejected() {
        assert!(Executable::parse(&[0u8; 0x100]).is_err());
    }

    #[test]
    fn test_overrunning_text_size_rejected() {
        let mut data = make_exe(0, 0, &[0; 4]);
        data[0x1C..0x20].copy_from_slice(&0x1000u32.to_le_bytes());
        assert!(Executable::parse(&data).is_err());
    }
}
