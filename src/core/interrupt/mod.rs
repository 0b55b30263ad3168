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

//! Interrupt controller (I_STAT / I_MASK)
//!
//! Peripherals assert edges with [`InterruptController::trigger`], which
//! latches bits into I_STAT. Guest code acknowledges by writing the bit as
//! zero (I_STAT is and-ed with the written value). The CPU's single hardware
//! interrupt line is level-driven from `I_STAT & I_MASK`; the Bus copies
//! that level into COP0 before every CPU batch.

use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::memory::Register;
use crate::core::savestate::SaveState;

/// Interrupt sources, by I_STAT bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Vblank = 0,
    Gpu = 1,
    CdRom = 2,
    Dma = 3,
    Timer0 = 4,
    Timer1 = 5,
    Timer2 = 6,
    Controller = 7,
    Sio = 8,
    Spu = 9,
    Lightpen = 10,
}

/// I_STAT / I_MASK register pair
///
/// # Example
/// ```
/// use oxidestation::core::interrupt::{Interrupt, InterruptController};
///
/// let mut ic = InterruptController::new();
/// ic.trigger(Interrupt::Vblank);
/// assert!(!ic.pending()); // masked by default
/// ```
pub struct InterruptController {
    /// I_STAT at 0x1F801070: latched interrupt requests
    status: Register,

    /// I_MASK at 0x1F801074: enable bits
    mask: Register,
}

impl InterruptController {
    /// Only 11 interrupt sources exist
    const SOURCE_MASK: u32 = 0x7FF;

    pub fn new() -> Self {
        Self {
            status: Register::new(0),
            mask: Register::new(0),
        }
    }

    /// Latch an interrupt request
    pub fn trigger(&mut self, interrupt: Interrupt) {
        log::trace!("interrupt trigger: {:?}", interrupt);
        self.status
            .set_raw(self.status.raw() | (1 << interrupt as u32));
    }

    /// Level of the CPU interrupt line
    pub fn pending(&self) -> bool {
        self.status.raw() & self.mask.raw() & Self::SOURCE_MASK != 0
    }

    /// Current I_STAT value
    pub fn status(&self) -> u32 {
        self.status.raw()
    }

    /// Current I_MASK value
    pub fn mask(&self) -> u32 {
        self.mask.raw()
    }
}

impl Component for InterruptController {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        match address {
            0..=3 => self.status.read_lane(address),
            4..=7 => self.mask.read_lane(address - 4),
            _ => unreachable!("interrupt controller read at 0x{:02X}", address),
        }
    }

    fn write(&mut self, address: u32, value: u32) {
        match address {
            // Acknowledge: writing 0 bits clears them
            0..=3 => {
                let lane = address;
                let current = self.status.read_lane(lane);
                self.status.write_lane(lane, current & value);
            }
            4..=7 => self.mask.write_lane(address - 4, value),
            _ => unreachable!("interrupt controller write at 0x{:02X}", address),
        }
    }

    fn reset(&mut self) {
        self.status = Register::new(0);
        self.mask = Register::new(0);
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.status.raw());
        state.push(&self.mask.raw());
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.status.set_raw(state.pop()?);
        self.mask.set_raw(state.pop()?);
        Ok(())
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}
