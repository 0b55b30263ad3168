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

//! Serial port (SIO1) register block at 0x1F801050
//!
//! Nothing is attached to the link cable port; the registers store written
//! values and the status register always reports TX ready so guest polls
//! terminate.

use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::memory::Register;
use crate::core::savestate::SaveState;

pub struct SerialPort {
    /// SIO1_DATA / SIO1_STAT / SIO1_MODE+CTRL / SIO1_MISC+BAUD
    regs: [Register; 4],
}

impl SerialPort {
    /// TX ready (bits 0 and 2 of SIO1_STAT)
    const STAT_TX_READY: u32 = 0b101;

    pub fn new() -> Self {
        Self {
            regs: [Register::new(0); 4],
        }
    }
}

impl Component for SerialPort {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        let reg = (address / 4) as usize;
        if reg == 1 {
            return Register::new(Self::STAT_TX_READY).read_lane(address % 4);
        }
        self.regs[reg].read_lane(address % 4)
    }

    fn write(&mut self, address: u32, value: u32) {
        let reg = (address / 4) as usize;
        self.regs[reg].write_lane(address % 4, value);
        log::trace!("SIO1 write [{}] = 0x{:02X}", address, value & 0xFF);
    }

    fn reset(&mut self) {
        self.regs = [Register::new(0); 4];
    }

    fn serialize(&self, state: &mut SaveState) {
        for reg in &self.regs {
            state.push(&reg.raw());
        }
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        for reg in &mut self.regs {
            reg.set_raw(state.pop()?);
        }
        Ok(())
    }
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new()
    }
}
