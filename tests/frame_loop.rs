// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! End-to-end frame loop: emulation thread, mailbox hand-off, shutdown

use oxidestation::core::bus::Bus;
use oxidestation::frontend::{spawn_emulation_thread, EmulationContext};
use oxidestation::core::peripherals::Buttons;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_emulation_thread_publishes_frames() {
    // No BIOS image: the ROM is all zeros, which the CPU executes as an
    // endless stream of NOPs — enough to reach vblank every frame
    let context = Arc::new(EmulationContext::new(false));
    let handle = spawn_emulation_thread(
        || {
            let mut bus = Bus::new();
            bus.reset();
            Ok(bus)
        },
        context.clone(),
    );

    // Collect a couple of frames through the mailbox
    let mut last_number = 0;
    for _ in 0..2 {
        let frame = context
            .mailbox
            .wait_for_frame(Duration::from_secs(10))
            .expect("frame before timeout");
        assert!(frame.number > last_number);
        assert_eq!(frame.vram.len(), 1024 * 512);
        last_number = frame.number;
    }

    // Input reaches the emulation thread between frames
    context.input.set_buttons(Buttons::START);

    context.stop();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_shutdown_is_cooperative() {
    let context = Arc::new(EmulationContext::new(false));
    let handle = spawn_emulation_thread(
        || {
            let mut bus = Bus::new();
            bus.reset();
            Ok(bus)
        },
        context.clone(),
    );

    // Wait for at least one full frame, then request shutdown
    context
        .mailbox
        .wait_for_frame(Duration::from_secs(10))
        .expect("first frame");
    context.stop();

    // The thread winds down at the frame edge without being killed
    handle.join().unwrap().unwrap();
    assert!(!context.is_running());
}
