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

//! Memory-control register blocks
//!
//! Four trivial components that exist so every mapped address has exactly
//! one owner: the memory controller (expansion bases and bus delay setup at
//! 0x1F801000), the RAM size register (0x1F801060), the cache control
//! window in KSEG2 (0xFFFE0000 region) and the expansion-2 POST/debug ports
//! (0x1F802000 region). The BIOS programs them during boot; nothing else in
//! the machine reacts to the values, they only need to read back.

use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::memory::{MemoryRegion, Register};
use crate::core::savestate::SaveState;

/// Bus/expansion setup registers at 0x1F801000-0x1F801023
pub struct MemControl {
    regs: [Register; MemControl::NUM_REGS],
}

impl MemControl {
    const NUM_REGS: usize = 9;

    pub fn new() -> Self {
        Self {
            regs: [Register::new(0); Self::NUM_REGS],
        }
    }
}

impl Component for MemControl {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        let reg = (address / 4) as usize;
        self.regs[reg].read_lane(address % 4)
    }

    fn write(&mut self, address: u32, value: u32) {
        let reg = (address / 4) as usize;
        self.regs[reg].write_lane(address % 4, value);
    }

    fn reset(&mut self) {
        self.regs = [Register::new(0); Self::NUM_REGS];
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

impl Default for MemControl {
    fn default() -> Self {
        Self::new()
    }
}

/// RAM size register at 0x1F801060
pub struct RamControl {
    ram_size: Register,
}

impl RamControl {
    pub fn new() -> Self {
        Self {
            ram_size: Register::new(0),
        }
    }
}

impl Component for RamControl {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        self.ram_size.read_lane(address % 4)
    }

    fn write(&mut self, address: u32, value: u32) {
        self.ram_size.write_lane(address % 4, value);
    }

    fn reset(&mut self) {
        self.ram_size = Register::new(0);
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.ram_size.raw());
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.ram_size.set_raw(state.pop()?);
        Ok(())
    }
}

impl Default for RamControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache control register window (0xFFFE0000 KSEG2 region)
///
/// Only the BIU/cache configuration register at offset 0x130 is meaningful;
/// the rest of the window stores and returns bytes.
pub struct CacheControl {
    window: MemoryRegion,
}

impl CacheControl {
    /// Window size (the register sits at offset 0x130)
    pub const WINDOW_SIZE: usize = 0x200;

    pub fn new() -> Self {
        Self {
            window: MemoryRegion::new(Self::WINDOW_SIZE),
        }
    }

    /// The BIU cache configuration value
    pub fn biu(&self) -> u32 {
        self.window.read32(0x130)
    }
}

impl Component for CacheControl {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        self.window.read8(address) as u32
    }

    fn write(&mut self, address: u32, value: u32) {
        self.window.write8(address, value as u8);
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.window.bytes().to_vec());
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        let bytes: Vec<u8> = state.pop()?;
        self.window.bytes_mut().copy_from_slice(&bytes);
        Ok(())
    }
}

impl Default for CacheControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Expansion-2 debug/POST ports at 0x1F802000
///
/// The BIOS writes its boot progress to the POST register at offset 0x41
/// and the value shows up in the debug log.
pub struct ExpansionPorts {
    window: MemoryRegion,
}

impl ExpansionPorts {
    pub const WINDOW_SIZE: usize = 0x80;

    /// POST seven-segment register offset
    const POST: u32 = 0x41;

    pub fn new() -> Self {
        Self {
            window: MemoryRegion::new(Self::WINDOW_SIZE),
        }
    }
}

impl Component for ExpansionPorts {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        self.window.read8(address) as u32
    }

    fn write(&mut self, address: u32, value: u32) {
        if address == Self::POST {
            log::debug!("BIOS POST: {:X}", value & 0xF);
        }
        self.window.write8(address, value as u8);
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.window.bytes().to_vec());
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        let bytes: Vec<u8> = state.pop()?;
        self.window.bytes_mut().copy_from_slice(&bytes);
        Ok(())
    }
}

impl Default for ExpansionPorts {
    fn default() -> Self {
        Self::new()
    }
}
