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

//! Timer/counter channels
//!
//! Three 16-bit timers, each with a counter, a mode register and a target.
//! They differ only in their selectable clock source: timer 0 can count the
//! dot clock, timer 1 the horizontal blank rate, timer 2 the system clock
//! divided by 8. All are fed CPU cycles by the Bus and divide internally
//! with integer rationals so timing stays deterministic.
//!
//! Mode register layout (low 13 bits):
//!
//! ```text
//! 0     sync enable          8-9   clock source
//! 1-2   sync mode            10    interrupt request (0 = asserted)
//! 3     reset counter at target
//! 4     IRQ at target        11    reached target   (reset on read)
//! 5     IRQ at 0xFFFF        12    reached 0xFFFF   (reset on read)
//! 6     IRQ repeat
//! 7     IRQ toggle
//! ```
//!
//! Writing the mode clears the counter, re-arms the one-shot interrupt and
//! applies the sync gating. Bits 11/12 clear when the high mode byte is
//! read.

use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::interrupt::{Interrupt, InterruptController};
use crate::core::memory::Register;
use crate::core::savestate::SaveState;
use std::cell::RefCell;
use std::rc::Rc;

/// Selectable counting source per timer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Timer 0: GPU dot clock
    DotClock,
    /// Timer 1: horizontal blanking rate
    HBlank,
    /// Timer 2: system clock (optionally / 8)
    SystemClock,
}

/// One timer channel
pub struct Timer {
    source: ClockSource,
    interrupts: Rc<RefCell<InterruptController>>,

    /// Counter value register (16 bits used)
    counter: Register,

    /// Mode register
    mode: Register,

    /// Target value register (16 bits used)
    target: Register,

    /// Sub-division remainder, in source-specific units
    remainder: u32,

    /// Counting suspended by the sync mode
    paused: bool,

    /// A one-shot interrupt has already fired since the last mode write
    irq_occurred: bool,
}

impl Timer {
    /// Average dot-clock divider as a rational: 34/5 CPU cycles per count
    const DOT_CLOCK_DIV: (u32, u32) = (34, 5);

    /// CPU cycles per NTSC scanline (hblank rate)
    const HBLANK_DIV: (u32, u32) = (1086, 1);

    /// System clock / 8
    const SYSCLOCK_8_DIV: (u32, u32) = (8, 1);

    pub fn new(source: ClockSource, interrupts: Rc<RefCell<InterruptController>>) -> Self {
        let mut timer = Self {
            source,
            interrupts,
            counter: Register::new(0),
            mode: Register::new(0),
            target: Register::new(0),
            remainder: 0,
            paused: false,
            irq_occurred: false,
        };
        timer.reset();
        timer
    }

    #[inline(always)]
    fn mode_bit(&self, bit: u32) -> bool {
        self.mode.raw() & (1 << bit) != 0
    }

    fn set_mode_bit(&mut self, bit: u32, value: bool) {
        let raw = self.mode.raw();
        self.mode
            .set_raw(if value { raw | (1 << bit) } else { raw & !(1 << bit) });
    }

    /// Divider for the currently selected clock source as (cycles, counts)
    fn divider(&self) -> (u32, u32) {
        let clock_source = (self.mode.raw() >> 8) & 3;
        match self.source {
            ClockSource::DotClock => {
                if clock_source & 1 != 0 {
                    Self::DOT_CLOCK_DIV
                } else {
                    (1, 1)
                }
            }
            ClockSource::HBlank => {
                if clock_source & 1 != 0 {
                    Self::HBLANK_DIV
                } else {
                    (1, 1)
                }
            }
            ClockSource::SystemClock => {
                if clock_source & 2 != 0 {
                    Self::SYSCLOCK_8_DIV
                } else {
                    (1, 1)
                }
            }
        }
    }

    /// Raise the timer interrupt honoring toggle/pulse and one-shot modes
    fn trigger_interrupt_request(&mut self) {
        // Bit 10 is active low; pulse mode drops it, toggle mode flips it
        if self.mode_bit(7) {
            let current = self.mode_bit(10);
            self.set_mode_bit(10, !current);
        } else {
            self.set_mode_bit(10, false);
        }

        // One-shot: only the first request since the last mode write fires
        if !self.mode_bit(6) && self.irq_occurred {
            self.set_mode_bit(10, true);
            return;
        }

        if !self.mode_bit(10) {
            let interrupt = match self.source {
                ClockSource::DotClock => Interrupt::Timer0,
                ClockSource::HBlank => Interrupt::Timer1,
                ClockSource::SystemClock => Interrupt::Timer2,
            };
            self.interrupts.borrow_mut().trigger(interrupt);
            self.irq_occurred = true;
        }

        self.set_mode_bit(10, true);
    }

    /// Current counter value (tests)
    pub fn counter(&self) -> u16 {
        self.counter.raw() as u16
    }
}

impl Component for Timer {
    fn execute(&mut self, cycles: u32) {
        if self.paused {
            return;
        }

        let (div_cycles, div_counts) = self.divider();
        let total = self.remainder + cycles * div_counts;
        let advance = total / div_cycles;
        self.remainder = total % div_cycles;

        let mut value = self.counter.raw() + advance;
        let target = self.target.raw() & 0xFFFF;

        if value >= target && advance > 0 {
            self.set_mode_bit(11, true);

            if self.mode_bit(3) {
                value = if target != 0 { value % target } else { 0 };
            }

            if self.mode_bit(4) {
                self.trigger_interrupt_request();
            }
        }

        if value >= 0xFFFF {
            self.set_mode_bit(12, true);

            if !self.mode_bit(3) {
                value %= 0xFFFF;
            }

            if self.mode_bit(5) {
                self.trigger_interrupt_request();
            }
        }

        self.counter.set_raw(value & 0xFFFF);
    }

    fn read(&mut self, address: u32) -> u32 {
        match address {
            0..=3 => self.counter.read_lane(address),
            4..=7 => {
                let value = self.mode.read_lane(address - 4);
                // Reached flags clear when their byte is read
                if address == 5 {
                    self.set_mode_bit(11, false);
                    self.set_mode_bit(12, false);
                }
                value
            }
            8..=11 => self.target.read_lane(address - 8),
            _ => unreachable!("timer read at 0x{:02X}", address),
        }
    }

    fn write(&mut self, address: u32, value: u32) {
        match address {
            0..=3 => self.counter.write_lane(address, value),
            4..=7 => {
                // Mode writes restart the counter
                self.paused = false;
                self.counter.set_raw(0);
                self.remainder = 0;
                self.mode.write_lane(address - 4, value);

                if address == 4 {
                    self.irq_occurred = false;
                    self.set_mode_bit(10, true);

                    if self.mode_bit(0) {
                        let sync_mode = (self.mode.raw() >> 1) & 3;
                        let pause = match self.source {
                            // Pause-until-blank modes gate the counter
                            ClockSource::DotClock => sync_mode == 3,
                            ClockSource::HBlank => sync_mode == 3,
                            ClockSource::SystemClock => sync_mode == 0 || sync_mode == 3,
                        };
                        self.paused = pause;
                        log::debug!("timer sync mode {} (paused={})", sync_mode, pause);
                    }
                }
            }
            8..=11 => self.target.write_lane(address - 8, value),
            _ => unreachable!("timer write at 0x{:02X}", address),
        }
    }

    fn reset(&mut self) {
        self.counter.set_raw(0);
        self.mode.set_raw(1 << 10);
        self.target.set_raw(0);
        self.remainder = 0;
        self.paused = false;
        self.irq_occurred = false;
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.counter.raw());
        state.push(&self.mode.raw());
        state.push(&self.target.raw());
        state.push(&self.remainder);
        state.push(&self.paused);
        state.push(&self.irq_occurred);
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.counter.set_raw(state.pop()?);
        self.mode.set_raw(state.pop()?);
        self.target.set_raw(state.pop()?);
        self.remainder = state.pop()?;
        self.paused = state.pop()?;
        self.irq_occurred = state.pop()?;
        Ok(())
    }
}
