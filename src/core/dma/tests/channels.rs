// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Channel register behavior tests

use super::{channel_base, make_bus, DPCR};

#[test]
fn test_dpcr_reset_value() {
    let mut bus = make_bus();
    assert_eq!(bus.read32(DPCR).unwrap(), 0x0765_4321);
}

#[test]
fn test_madr_masks_to_24_bits() {
    let mut bus = make_bus();
    bus.write32(channel_base(2), 0xFFFF_FFFC).unwrap();
    assert_eq!(bus.read32(channel_base(2)).unwrap(), 0x00FF_FFFC);
}

#[test]
fn test_channel_registers_are_byte_lane_addressable() {
    let mut bus = make_bus();

    // Build the BCR of channel 4 one byte at a time
    bus.write8(channel_base(4) + 4, 0x10).unwrap();
    bus.write8(channel_base(4) + 5, 0x00).unwrap();
    bus.write8(channel_base(4) + 6, 0x02).unwrap();
    bus.write8(channel_base(4) + 7, 0x00).unwrap();
    assert_eq!(bus.read32(channel_base(4) + 4).unwrap(), 0x0002_0010);

    // And read one back out
    assert_eq!(bus.read8(channel_base(4) + 6).unwrap(), 0x02);
}

#[test]
fn test_otc_chcr_write_is_masked() {
    let mut bus = make_bus();

    // Try to set direction from-RAM, forward step, linked-list sync and
    // chopping; OTC pins all of them (without the enable bit, nothing runs)
    bus.write32(channel_base(6) + 8, 0x0000_0501).unwrap();
    let chcr = bus.read32(channel_base(6) + 8).unwrap();

    assert_eq!(chcr & 1, 0, "direction pinned to-RAM");
    assert_ne!(chcr & 2, 0, "step pinned backward");
    assert_eq!((chcr >> 9) & 3, 0, "sync mode pinned to word");
    assert_eq!(chcr & (1 << 8), 0, "chopping pinned off");
}

#[test]
fn test_gpu_chcr_write_is_not_masked() {
    let mut bus = make_bus();

    // Without the enable bit the value just lands
    bus.write32(channel_base(2) + 8, 0x0000_0401).unwrap();
    assert_eq!(bus.read32(channel_base(2) + 8).unwrap(), 0x0000_0401);
}

#[test]
fn test_disabled_channel_does_not_run() {
    let mut bus = make_bus();

    // DPCR enable for channel 6 is off by default; the CHCR kick must not
    // touch RAM
    bus.write32(channel_base(6), 0x2000).unwrap();
    bus.write32(channel_base(6) + 4, 4).unwrap();
    bus.write32(channel_base(6) + 8, 0x1100_0000).unwrap();

    assert_eq!(bus.read32(0x2000).unwrap(), 0);
    // Still armed
    assert_ne!(bus.read32(channel_base(6) + 8).unwrap() & 0x0100_0000, 0);
}
