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

//! Common interface for hardware components connected to the Bus
//!
//! Every unit on the console — GPU, SPU, MDEC, DMA channels, timers,
//! interrupt and peripheral controllers — implements [`Component`]. The Bus
//! owns the components and never reaches into their internals except through
//! this interface.
//!
//! # Addressing convention
//!
//! `read`/`write` take an address *relative to the component's mapping*.
//! Register-block components are byte-lane addressed: each call moves one
//! byte, and the Bus assembles 16/32-bit accesses from consecutive lanes.
//! This is what lets guest code write individual bytes of a 32-bit hardware
//! register. The GPU and MDEC are word-ported instead (their two registers
//! are only meaningfully accessed as full words).

use crate::core::savestate::SaveState;
use crate::core::error::Result;

/// Capability set shared by every hardware unit on the Bus
pub trait Component {
    /// Advance the device by `cycles` clock cycles (relative to CPU speed)
    fn execute(&mut self, cycles: u32);

    /// Read from the device at a component-relative address
    fn read(&mut self, address: u32) -> u32;

    /// Write to the device at a component-relative address
    fn write(&mut self, address: u32, value: u32);

    /// Reset the device into its initial state
    fn reset(&mut self);

    /// Append the device state to a save-state stream
    fn serialize(&self, state: &mut SaveState);

    /// Restore the device state from a save-state stream
    ///
    /// # Errors
    ///
    /// Returns a save-state error when the stream is exhausted or corrupt.
    fn deserialize(&mut self, state: &mut SaveState) -> Result<()>;
}

/// Assemble a 16-bit read from two byte lanes of a register-block component
#[inline(always)]
pub fn read16(component: &mut dyn Component, address: u32) -> u16 {
    (component.read(address) as u16) | ((component.read(address + 1) as u16) << 8)
}

/// Assemble a 32-bit read from four byte lanes of a register-block component
#[inline(always)]
pub fn read32(component: &mut dyn Component, address: u32) -> u32 {
    component.read(address)
        | (component.read(address + 1) << 8)
        | (component.read(address + 2) << 16)
        | (component.read(address + 3) << 24)
}

/// Split a 16-bit write into two byte-lane writes
#[inline(always)]
pub fn write16(component: &mut dyn Component, address: u32, value: u16) {
    component.write(address, (value & 0xFF) as u32);
    component.write(address + 1, (value >> 8) as u32);
}

/// Split a 32-bit write into four byte-lane writes
#[inline(always)]
pub fn write32(component: &mut dyn Component, address: u32, value: u32) {
    component.write(address, value & 0xFF);
    component.write(address + 1, (value >> 8) & 0xFF);
    component.write(address + 2, (value >> 16) & 0xFF);
    component.write(address + 3, (value >> 24) & 0xFF);
}
