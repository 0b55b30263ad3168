// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Color arithmetic tests: blending, modulation, dithering

use super::super::color::{self, Color15, Color24};

#[test]
fn test_blend_mode_0_average() {
    let source = Color15::new(31, 0, 0, false);
    let destination = Color15::new(1, 1, 1, false);
    let blended = Color15::blended(source, destination, 0);
    assert_eq!((blended.r, blended.g, blended.b), (16, 0, 0));
}

#[test]
fn test_blend_mode_1_additive_clamps() {
    let source = Color15::new(31, 0, 0, false);
    let destination = Color15::new(5, 5, 5, false);
    let blended = Color15::blended(source, destination, 1);
    assert_eq!((blended.r, blended.g, blended.b), (31, 5, 5));
}

#[test]
fn test_blend_mode_2_subtractive_clamps_at_zero() {
    let source = Color15::new(10, 0, 20, false);
    let destination = Color15::new(15, 5, 5, false);
    let blended = Color15::blended(source, destination, 2);
    assert_eq!((blended.r, blended.g, blended.b), (0, 0, 15));
}

#[test]
fn test_blend_mode_3_quarter_additive() {
    let source = Color15::new(20, 20, 31, false);
    let destination = Color15::new(8, 4, 16, false);
    let blended = Color15::blended(source, destination, 3);
    assert_eq!((blended.r, blended.g, blended.b), (22, 21, 31));
}

#[test]
fn test_blend_carries_destination_mask() {
    let source = Color15::new(0, 0, 0, true);
    let destination = Color15::new(0, 0, 0, false);
    assert!(!Color15::blended(source, destination, 0).mask);

    let destination = Color15::new(0, 0, 0, true);
    assert!(Color15::blended(source, destination, 0).mask);
}

#[test]
fn test_mix_neutral_at_128() {
    // 128 is the neutral modulation value: texel passes through
    let texel = Color15::new(20, 10, 5, true);
    let mixed = Color15::mixed(Color24 { r: 128, g: 128, b: 128 }, texel);
    assert_eq!((mixed.r, mixed.g, mixed.b, mixed.mask), (20, 10, 5, true));
}

#[test]
fn test_mix_doubles_and_clamps() {
    let texel = Color15::new(20, 1, 0, false);
    let mixed = Color15::mixed(Color24 { r: 255, g: 255, b: 255 }, texel);
    assert_eq!(mixed.r, 31); // 20 * 255 / 128 clamps
    assert_eq!(mixed.g, 1); // 1 * 255 / 128 = 1 (integer)
}

#[test]
fn test_raw_round_trip() {
    let color = Color15::new(31, 15, 7, true);
    assert_eq!(Color15::from_raw(color.to_raw()), color);

    assert_eq!(Color15::from_raw(0x0000), Color15::new(0, 0, 0, false));
    assert_eq!(Color15::from_raw(0xFFFF), Color15::new(31, 31, 31, true));
}

#[test]
fn test_from_24bit_truncates() {
    let color = Color15::from_24bit(Color24 { r: 255, g: 128, b: 7 });
    assert_eq!((color.r, color.g, color.b), (31, 16, 0));
    assert!(!color.mask);
}

#[test]
fn test_dither_offsets_and_clamps() {
    // Position (0, 0) carries a -4 offset
    let dithered = color::dither(Color24 { r: 2, g: 100, b: 255 }, 0, 0);
    assert_eq!((dithered.r, dithered.g, dithered.b), (0, 96, 251));

    // Position (3, 1) carries a -1 offset; (1, 0) carries 0
    let dithered = color::dither(Color24 { r: 0, g: 0, b: 0 }, 3, 1);
    assert_eq!(dithered.r, 0);
    let dithered = color::dither(Color24 { r: 7, g: 7, b: 7 }, 1, 0);
    assert_eq!(dithered.r, 7);

    // The pattern tiles every 4 pixels
    let a = color::dither(Color24 { r: 100, g: 100, b: 100 }, 2, 1);
    let b = color::dither(Color24 { r: 100, g: 100, b: 100 }, 6, 5);
    assert_eq!(a, b);
}
