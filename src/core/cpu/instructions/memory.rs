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

//! Load and store instructions
//!
//! All aligned loads land in the delay file via `schedule_load`, so their
//! results honor the one-instruction load delay. Misaligned word/halfword
//! accesses raise address-error exceptions with BadVaddr set and never reach
//! the bus. LWL/LWR/SWL/SWR implement the unaligned-access pairs; the load
//! variants forward from a pending delayed load of the same register, which
//! is how the hardware lets an LWL/LWR pair combine in adjacent slots.

use super::super::{Exception, Instruction, CPU};
use crate::core::bus::Bus;
use crate::core::error::Result;

impl CPU {
    #[inline(always)]
    fn effective_address(&self, ins: Instruction) -> u32 {
        self.reg(ins.rs()).wrapping_add(ins.imm_signed() as u32)
    }

    pub(super) fn op_lb(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        let value = bus.read8(address)? as i8 as u32;
        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_lbu(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        let value = bus.read8(address)? as u32;
        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_lh(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        if address & 1 != 0 {
            self.cop0_mut().set_bad_vaddr(address);
            self.exception(Exception::BadAddressLoad);
            return Ok(());
        }
        let value = bus.read16(address)? as i16 as u32;
        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_lhu(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        if address & 1 != 0 {
            self.cop0_mut().set_bad_vaddr(address);
            self.exception(Exception::BadAddressLoad);
            return Ok(());
        }
        let value = bus.read16(address)? as u32;
        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_lw(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        if address & 3 != 0 {
            self.cop0_mut().set_bad_vaddr(address);
            self.exception(Exception::BadAddressLoad);
            return Ok(());
        }
        let value = bus.read32(address)?;
        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_lwl(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        let aligned = bus.read32(address & !3)?;
        let current = self.reg_with_pending_load(ins.rt());

        let value = match address & 3 {
            0 => (current & 0x00FF_FFFF) | (aligned << 24),
            1 => (current & 0x0000_FFFF) | (aligned << 16),
            2 => (current & 0x0000_00FF) | (aligned << 8),
            _ => aligned,
        };

        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_lwr(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        let address = self.effective_address(ins);
        let aligned = bus.read32(address & !3)?;
        let current = self.reg_with_pending_load(ins.rt());

        let value = match address & 3 {
            0 => aligned,
            1 => (current & 0xFF00_0000) | (aligned >> 8),
            2 => (current & 0xFFFF_0000) | (aligned >> 16),
            _ => (current & 0xFFFF_FF00) | (aligned >> 24),
        };

        self.schedule_load(ins.rt(), value);
        Ok(())
    }

    pub(super) fn op_sb(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        if self.cop0().is_cache_isolated() {
            return Ok(());
        }
        let address = self.effective_address(ins);
        bus.write8(address, self.reg(ins.rt()) as u8)
    }

    pub(super) fn op_sh(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        if self.cop0().is_cache_isolated() {
            return Ok(());
        }
        let address = self.effective_address(ins);
        if address & 1 != 0 {
            self.cop0_mut().set_bad_vaddr(address);
            self.exception(Exception::BadAddressStore);
            return Ok(());
        }
        bus.write16(address, self.reg(ins.rt()) as u16)
    }

    pub(super) fn op_sw(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        if self.cop0().is_cache_isolated() {
            return Ok(());
        }
        let address = self.effective_address(ins);
        if address & 3 != 0 {
            self.cop0_mut().set_bad_vaddr(address);
            self.exception(Exception::BadAddressStore);
            return Ok(());
        }
        bus.write32(address, self.reg(ins.rt()))
    }

    pub(super) fn op_swl(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        if self.cop0().is_cache_isolated() {
            return Ok(());
        }
        let address = self.effective_address(ins);
        let aligned_address = address & !3;
        let current = bus.read32(aligned_address)?;
        let value = self.reg(ins.rt());

        let merged = match address & 3 {
            0 => (current & 0xFFFF_FF00) | (value >> 24),
            1 => (current & 0xFFFF_0000) | (value >> 16),
            2 => (current & 0xFF00_0000) | (value >> 8),
            _ => value,
        };

        bus.write32(aligned_address, merged)
    }

    pub(super) fn op_swr(&mut self, ins: Instruction, bus: &mut Bus) -> Result<()> {
        if self.cop0().is_cache_isolated() {
            return Ok(());
        }
        let address = self.effective_address(ins);
        let aligned_address = address & !3;
        let current = bus.read32(aligned_address)?;
        let value = self.reg(ins.rt());

        let merged = match address & 3 {
            0 => value,
            1 => (current & 0x0000_00FF) | (value << 8),
            2 => (current & 0x0000_FFFF) | (value << 16),
            _ => (current & 0x00FF_FFFF) | (value << 24),
        };

        bus.write32(aligned_address, merged)
    }
}
