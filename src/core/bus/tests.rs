// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Bus dispatch, mirroring and save-state tests

use super::Bus;

#[test]
fn test_segment_folding() {
    let mut bus = Bus::new();

    bus.write32(0x0000_1000, 0xAAAA_AAAA).unwrap();
    assert_eq!(bus.read32(0x8000_1000).unwrap(), 0xAAAA_AAAA); // KSEG0
    assert_eq!(bus.read32(0xA000_1000).unwrap(), 0xAAAA_AAAA); // KSEG1

    bus.write32(0xA000_1000, 0xBBBB_BBBB).unwrap();
    assert_eq!(bus.read32(0x0000_1000).unwrap(), 0xBBBB_BBBB); // KUSEG
}

#[test]
fn test_ram_mirrors_through_the_window() {
    let mut bus = Bus::new();
    bus.write32(0x0000_0000, 0x1234_5678).unwrap();
    assert_eq!(bus.read32(0x0020_0000).unwrap(), 0x1234_5678);
    assert_eq!(bus.read32(0x0060_0000).unwrap(), 0x1234_5678);
}

#[test]
fn test_endianness_and_mixed_widths() {
    let mut bus = Bus::new();
    bus.write32(0x0000_0100, 0x1234_5678).unwrap();

    assert_eq!(bus.read8(0x0000_0100).unwrap(), 0x78);
    assert_eq!(bus.read8(0x0000_0103).unwrap(), 0x12);
    assert_eq!(bus.read16(0x0000_0100).unwrap(), 0x5678);
    assert_eq!(bus.read16(0x0000_0102).unwrap(), 0x1234);
}

#[test]
fn test_scratchpad() {
    let mut bus = Bus::new();
    bus.write32(0x1F80_0000, 0xCAFE_BABE).unwrap();
    assert_eq!(bus.read32(0x1F80_0000).unwrap(), 0xCAFE_BABE);
    // The scratchpad also folds through KSEG0
    assert_eq!(bus.read32(0x9F80_0000).unwrap(), 0xCAFE_BABE);
}

#[test]
fn test_bios_rejects_writes() {
    let mut bus = Bus::new();
    bus.write_bios_for_test(0, &[0xAA, 0xBB, 0xCC, 0xDD]);

    bus.write32(0xBFC0_0000, 0x1234_5678).unwrap();
    assert_eq!(bus.read32(0xBFC0_0000).unwrap(), 0xDDCC_BBAA);
}

#[test]
fn test_unmapped_access_is_fatal() {
    let mut bus = Bus::new();
    assert!(bus.read32(0x1F80_4000).is_err());
    assert!(bus.write32(0x1F80_4000, 0).is_err());
    // A hole between I/O windows is just as fatal
    assert!(bus.read32(0x1F80_1030).is_err());
}

#[test]
fn test_io_registers_honor_byte_lanes() {
    let mut bus = Bus::new();

    // I_MASK assembled from 16-bit halves
    bus.write16(0x1F80_1074, 0x07FF).unwrap();
    bus.write16(0x1F80_1076, 0x0000).unwrap();
    assert_eq!(bus.read32(0x1F80_1074).unwrap(), 0x07FF);
    assert_eq!(bus.read8(0x1F80_1074).unwrap(), 0xFF);
    assert_eq!(bus.read8(0x1F80_1075).unwrap(), 0x07);
}

#[test]
fn test_gpu_port_is_word_mapped() {
    let mut bus = Bus::new();

    // GPUSTAT: display disabled out of reset (bit 23), ready bits up
    let stat = bus.read32(0x1F80_1814).unwrap();
    assert_ne!(stat & (1 << 23), 0);
    assert_ne!(stat & (1 << 26), 0);

    // GP0 through the bus: set the drawing offset (a pure register write)
    bus.write32(0x1F80_1810, 0xE500_0000).unwrap();
}

#[test]
fn test_cache_control_window() {
    let mut bus = Bus::new();
    bus.write32(0xFFFE_0130, 0x0000_1E98).unwrap();
    assert_eq!(bus.read32(0xFFFE_0130).unwrap(), 0x0000_1E98);
}

#[test]
fn test_cache_isolation_suppresses_stores() {
    let mut bus = Bus::new();
    bus.write32(0x0000_0200, 0x1111_1111).unwrap();

    // sw r0, 0x200(r0) would clear the word if it reached memory
    bus.write32(0x8000_1000, 0xAC00_0200).unwrap();

    let cpu = bus.cpu();
    cpu.borrow_mut().set_pc(0x8000_1000);
    cpu.borrow_mut().cop0_mut().write(12, 1 << 16); // isolate cache

    cpu.borrow_mut().step(&mut bus).unwrap();
    assert_eq!(bus.read32(0x0000_0200).unwrap(), 0x1111_1111);
}

#[test]
fn test_execute_reaches_vblank() {
    let mut bus = Bus::new();
    // BIOS is all zeros: an endless stream of NOPs at the reset vector

    let mut saw_vblank = false;
    // One NTSC frame needs about 286k CPU cycles
    for _ in 0..3000 {
        bus.execute(Bus::BATCH_CYCLES).unwrap();
        if bus.take_vblank() {
            saw_vblank = true;
            break;
        }
    }
    assert!(saw_vblank);
}

#[test]
fn test_run_until_vblank() {
    let mut bus = Bus::new();
    bus.run_until_vblank().unwrap();
    // The latch is single-shot: consumed by run_until_vblank itself
    assert!(!bus.take_vblank());
    assert_eq!(bus.gpu().borrow().frames(), 1);
}

#[test]
fn test_save_state_round_trip_is_bit_identical() {
    let mut bus = Bus::new();

    // Disturb a spread of component state
    bus.write32(0x0000_1234, 0xDEAD_BEEF).unwrap();
    bus.write32(0x1F80_1074, 0x0055).unwrap(); // I_MASK
    bus.write16(0x1F80_1C00, 0x1234).unwrap(); // SPU voice register
    bus.write32(0x1F80_1810, 0xE500_0123).unwrap(); // GPU drawing offset
    bus.write32(0x1F80_1110, 0x0042).unwrap(); // timer 1 counter
    bus.execute(Bus::BATCH_CYCLES).unwrap();

    let saved = bus.save_state();

    // Restore into a freshly-reset console
    let mut restored = Bus::new();
    restored.reset();
    let mut stream =
        crate::core::savestate::SaveState::from_payload(saved.payload().to_vec());
    restored.load_state(&mut stream).unwrap();

    // Serializing the restored console reproduces the stream byte for byte
    let resaved = restored.save_state();
    assert_eq!(saved.payload(), resaved.payload());

    // Spot checks on the restored state
    assert_eq!(restored.read32(0x0000_1234).unwrap(), 0xDEAD_BEEF);
    assert_eq!(restored.read32(0x1F80_1074).unwrap(), 0x0055);
}

#[test]
fn test_reset_clears_ram_but_keeps_bios() {
    let mut bus = Bus::new();
    bus.write_bios_for_test(0, &[0x12, 0x34, 0x56, 0x78]);
    bus.write32(0x0000_0000, 0xFFFF_FFFF).unwrap();

    bus.reset();

    assert_eq!(bus.read32(0x0000_0000).unwrap(), 0);
    assert_eq!(bus.read32(0xBFC0_0000).unwrap(), 0x7856_3412);
}
