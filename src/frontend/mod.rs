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

//! The frontend seam
//!
//! Two threads meet here. The emulation thread runs the console until each
//! vertical blank, publishes one VRAM snapshot, and throttles itself to the
//! console refresh rate. A presentation thread (not part of this crate's
//! scope) polls host input into [`InputState`] and drains the
//! [`FrameMailbox`] under a bounded wait.
//!
//! The mailbox is deliberately a single slot, not a queue: if the consumer
//! falls behind, frames coalesce and it always picks up the latest one. The
//! consumer's wait is time-bounded so a stalled emulation thread can never
//! hang the presentation side. Shutdown is cooperative through a shared
//! flag checked once per frame; nothing is interrupted mid-transfer.

use crate::core::bus::Bus;
use crate::core::error::Result;
use crate::core::gpu::DisplayInfo;
use crate::core::peripherals::Buttons;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// One published frame: the whole VRAM plus the display cutout
pub struct Frame {
    pub vram: Vec<u16>,
    pub display: DisplayInfo,
    /// Frame counter since the thread started
    pub number: u64,
}

/// Single-slot frame hand-off between the two threads
///
/// At most one frame is ever pending; publishing over an unconsumed frame
/// replaces it. This is the only state shared between the threads apart
/// from the input mask and the run flag.
pub struct FrameMailbox {
    slot: Mutex<Option<Frame>>,
    available: Condvar,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            available: Condvar::new(),
        }
    }

    /// Publish a frame, replacing any unconsumed one
    pub fn publish(&self, frame: Frame) {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(frame);
        self.available.notify_one();
    }

    /// Wait up to `timeout` for the next frame
    ///
    /// Returns `None` on timeout so the caller can keep polling input and
    /// never blocks indefinitely behind a stalled producer.
    pub fn wait_for_frame(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };

        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            let (guard, result) = match self.available.wait_timeout(slot, remaining) {
                Ok(pair) => pair,
                Err(poisoned) => {
                    let pair = poisoned.into_inner();
                    (pair.0, pair.1)
                }
            };
            slot = guard;

            if result.timed_out() && slot.is_none() {
                return None;
            }
        }
    }

    /// Take a pending frame without waiting
    pub fn try_take(&self) -> Option<Frame> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Host button state shared with the presentation thread
///
/// A single atomic mask; the emulation thread samples it once per frame.
pub struct InputState {
    buttons: AtomicU16,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            buttons: AtomicU16::new(0),
        }
    }

    /// Replace the pressed-button set (presentation thread)
    pub fn set_buttons(&self, buttons: Buttons) {
        self.buttons.store(buttons.bits(), Ordering::Relaxed);
    }

    /// Sample the pressed-button set (emulation thread)
    pub fn buttons(&self) -> Buttons {
        Buttons::from_bits_retain(self.buttons.load(Ordering::Relaxed))
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame pacing: sleep away the remainder of each frame budget
pub struct FramePacer {
    last_frame: Instant,
}

impl FramePacer {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
        }
    }

    /// Throttle to `refresh_rate` frames per second
    pub fn throttle(&mut self, refresh_rate: f32) {
        let budget = Duration::from_secs_f32(1.0 / refresh_rate);
        let elapsed = self.last_frame.elapsed();

        if elapsed < budget {
            thread::sleep(budget - elapsed);
        }

        self.last_frame = Instant::now();
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the emulation thread shares with its host
pub struct EmulationContext {
    pub mailbox: FrameMailbox,
    pub input: InputState,
    pub running: AtomicBool,
    /// Throttle to the console refresh rate (off for headless batch runs)
    pub frame_pacing: bool,
}

impl EmulationContext {
    pub fn new(frame_pacing: bool) -> Self {
        Self {
            mailbox: FrameMailbox::new(),
            input: InputState::new(),
            running: AtomicBool::new(true),
            frame_pacing,
        }
    }

    /// Request cooperative shutdown; takes effect at the next frame edge
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Spawn the emulation thread
///
/// The Bus is not `Send` (components share `Rc` handles), so the builder
/// closure runs on the emulation thread itself. The loop runs one frame at
/// a time: sample input, emulate to vblank, publish the snapshot, pace.
pub fn spawn_emulation_thread<F>(
    build: F,
    context: Arc<EmulationContext>,
) -> JoinHandle<Result<()>>
where
    F: FnOnce() -> Result<Bus> + Send + 'static,
{
    thread::spawn(move || {
        let mut bus = build()?;
        let mut pacer = FramePacer::new();
        let mut frame_number = 0u64;

        while context.is_running() {
            bus.peripherals()
                .borrow_mut()
                .set_buttons(context.input.buttons());

            bus.run_until_vblank()?;
            frame_number += 1;

            context.mailbox.publish(Frame {
                vram: bus.vram_snapshot(),
                display: bus.display_info(),
                number: frame_number,
            });

            if context.frame_pacing {
                pacer.throttle(bus.refresh_rate());
            }
        }

        log::info!("emulation thread stopped after {} frames", frame_number);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_coalesces_to_latest() {
        let mailbox = FrameMailbox::new();
        let display = DisplayInfo {
            start_x: 0,
            start_y: 0,
            width: 320,
            height: 240,
            enabled: true,
            color_depth_24: false,
        };

        mailbox.publish(Frame {
            vram: vec![],
            display,
            number: 1,
        });
        mailbox.publish(Frame {
            vram: vec![],
            display,
            number: 2,
        });

        // Only the latest frame survives
        let frame = mailbox.try_take().unwrap();
        assert_eq!(frame.number, 2);
        assert!(mailbox.try_take().is_none());
    }

    #[test]
    fn test_mailbox_wait_times_out() {
        let mailbox = FrameMailbox::new();
        let start = Instant::now();
        assert!(mailbox
            .wait_for_frame(Duration::from_millis(20))
            .is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_mailbox_hand_off_across_threads() {
        let mailbox = Arc::new(FrameMailbox::new());
        let display = DisplayInfo {
            start_x: 0,
            start_y: 0,
            width: 320,
            height: 240,
            enabled: true,
            color_depth_24: false,
        };

        let producer = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                mailbox.publish(Frame {
                    vram: vec![0x7FFF],
                    display,
                    number: 7,
                });
            })
        };

        let frame = mailbox.wait_for_frame(Duration::from_secs(1)).unwrap();
        assert_eq!(frame.number, 7);
        assert_eq!(frame.vram, vec![0x7FFF]);
        producer.join().unwrap();
    }

    #[test]
    fn test_input_state_round_trip() {
        let input = InputState::new();
        input.set_buttons(Buttons::CROSS | Buttons::UP);
        assert_eq!(input.buttons(), Buttons::CROSS | Buttons::UP);
    }

    #[test]
    fn test_context_stop_flag() {
        let context = EmulationContext::new(false);
        assert!(context.is_running());
        context.stop();
        assert!(!context.is_running());
    }
}
