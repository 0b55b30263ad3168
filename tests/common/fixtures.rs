// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Test fixtures: synthetic executables and disc images

use oxidestation::core::loader::Executable;

/// Build a PS-X EXE image whose text section is the given instruction
/// words, placed and entered at `address`
pub fn make_exe(address: u32, text: &[u32]) -> Vec<u8> {
    let mut data = vec![0u8; Executable::HEADER_SIZE + text.len() * 4];

    data[0..8].copy_from_slice(b"PS-X EXE");
    data[0x10..0x14].copy_from_slice(&address.to_le_bytes()); // PC
    data[0x14..0x18].copy_from_slice(&0x8002_0000u32.to_le_bytes()); // GP
    data[0x18..0x1C].copy_from_slice(&address.to_le_bytes()); // load address
    data[0x1C..0x20].copy_from_slice(&((text.len() * 4) as u32).to_le_bytes());
    data[0x30..0x34].copy_from_slice(&0x801F_FF00u32.to_le_bytes()); // SP base

    for (i, word) in text.iter().enumerate() {
        let offset = Executable::HEADER_SIZE + i * 4;
        data[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
    }

    data
}
