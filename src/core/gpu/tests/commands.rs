// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! GP0/GP1 command protocol tests

use super::super::commands::{GpuCommand, LineCommand, PolygonCommand, RectangleCommand};
use super::super::GPU;

#[test]
fn test_polygon_num_arguments() {
    // Flat-shaded untextured triangle: header + 3 vertices
    assert_eq!(PolygonCommand::new(0x20).num_arguments(), 4);

    // Flat-shaded untextured quad: header + 4 vertices
    assert_eq!(PolygonCommand::new(0x28).num_arguments(), 5);

    // Gouraud triangle: header + 3 vertices + 2 extra colors
    assert_eq!(PolygonCommand::new(0x30).num_arguments(), 6);

    // Gouraud quad: header + 4 vertices + 3 extra colors
    assert_eq!(PolygonCommand::new(0x38).num_arguments(), 8);

    // Textured flat quad: header + 4 * (vertex + uv)
    assert_eq!(PolygonCommand::new(0x2C).num_arguments(), 9);

    // Textured gouraud quad: header + 4 * (vertex + uv) + 3 colors
    assert_eq!(PolygonCommand::new(0x3C).num_arguments(), 12);

    // Textured gouraud triangle: header + 3 * (vertex + uv) + 2 colors
    assert_eq!(PolygonCommand::new(0x34).num_arguments(), 9);
}

#[test]
fn test_line_num_arguments() {
    // Flat line: header + 2 vertices
    assert_eq!(LineCommand::new(0x40).num_arguments(), 3);

    // Gouraud line: header + vertex + color + vertex
    assert_eq!(LineCommand::new(0x50).num_arguments(), 4);
}

#[test]
fn test_rectangle_num_arguments() {
    // Variable size untextured: header + vertex + size
    assert_eq!(RectangleCommand::new(0x60).num_arguments(), 3);

    // Variable size textured: header + vertex + uv/clut + size
    assert_eq!(RectangleCommand::new(0x64).num_arguments(), 4);

    // Fixed 16x16 untextured: header + vertex
    assert_eq!(RectangleCommand::new(0x78).num_arguments(), 2);

    // Fixed 8x8 textured: header + vertex + uv/clut
    assert_eq!(RectangleCommand::new(0x74).num_arguments(), 3);
    assert_eq!(RectangleCommand::new(0x74).actual_size(), 8);
}

#[test]
fn test_gp0_buffers_until_complete() {
    let mut gpu = GPU::new_standalone();

    // Monochrome triangle needs 4 words; nothing draws until the last one
    gpu.write_gp0(0x2000_00FF);
    gpu.write_gp0(0x0000_0000);
    gpu.write_gp0(0x0000_0040);
    assert_eq!(gpu.read_stat() & (1 << 26), 0); // command still in flight

    gpu.write_gp0(0x0040_0040);
    assert_ne!(gpu.read_stat() & (1 << 26), 0); // back to ready
}

#[test]
fn test_gp0_draw_mode_setting() {
    let mut gpu = GPU::new_standalone();
    gpu.write_gp0(0xE100_0200); // dither on (bit 9)
    assert!(gpu.dither_enabled());
    assert_eq!(gpu.read_stat() & 0x200, 0x200);
}

#[test]
fn test_gp0_drawing_area_and_offset() {
    let mut gpu = GPU::new_standalone();

    // Top-left (16, 8), bottom-right (255, 127)
    gpu.write_gp0(0xE300_0000 | (8 << 10) | 16);
    gpu.write_gp0(0xE400_0000 | (127 << 10) | 255);
    assert_eq!(gpu.clamp_drawing_area_left(0), 16);
    assert_eq!(gpu.clamp_drawing_area_top(0), 8);
    assert_eq!(gpu.clamp_drawing_area_right(1000), 255);
    assert_eq!(gpu.clamp_drawing_area_bottom(1000), 127);

    // Negative drawing offset sign-extends from 11 bits
    let offset_x = (-16i32 as u32) & 0x7FF;
    let offset_y = (-8i32 as u32) & 0x7FF;
    gpu.write_gp0(0xE500_0000 | (offset_y << 11) | offset_x);
    let info = gpu.read_stat();
    assert_ne!(info, 0);
}

#[test]
fn test_gp1_dma_direction_in_status() {
    let mut gpu = GPU::new_standalone();
    gpu.write_gp1(0x0400_0002);
    assert_eq!((gpu.read_stat() >> 29) & 3, 2);
}

#[test]
fn test_gp1_reset_command_buffer_aborts_command() {
    let mut gpu = GPU::new_standalone();
    gpu.write_gp0(0x2000_00FF); // triangle header
    assert_eq!(gpu.read_stat() & (1 << 26), 0);

    gpu.write_gp1(0x0100_0000);
    assert_ne!(gpu.read_stat() & (1 << 26), 0);
}

#[test]
fn test_gp1_acknowledge_interrupt() {
    let mut gpu = GPU::new_standalone();
    gpu.write_gp0(0x1F00_0000); // InterruptRequest
    assert_ne!(gpu.read_stat() & (1 << 24), 0);

    gpu.write_gp1(0x0200_0000);
    assert_eq!(gpu.read_stat() & (1 << 24), 0);
}

#[test]
fn test_gpu_info_readback() {
    let mut gpu = GPU::new_standalone();
    gpu.write_gp0(0xE300_0000 | (12 << 10) | 34); // drawing area top-left
    gpu.write_gp1(0x1000_0003); // latch top-left into GPUREAD
    assert_eq!(gpu.read_gpuread(), (12 << 10) | 34);
}

#[test]
fn test_poly_line_terminator() {
    let mut gpu = GPU::new_standalone();

    // Opaque poly-line: vertices stream until 0x5555_5555 terminator
    gpu.write_gp0(0x4800_FFFF);
    gpu.write_gp0(0x0000_0000);
    gpu.write_gp0(0x0000_0010); // first segment complete, chain continues
    assert_eq!(gpu.read_stat() & (1 << 26), 0);

    gpu.write_gp0(0x5555_5555); // terminator
    assert_ne!(gpu.read_stat() & (1 << 26), 0);
}

#[test]
fn test_command_code_round_trip() {
    for code in 0..=8 {
        let command = GpuCommand::from_code(code).unwrap();
        assert_eq!(command.to_code(), code);
    }
    assert!(GpuCommand::from_code(99).is_none());
}
