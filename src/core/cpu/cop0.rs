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

//! COP0 — the System Control Coprocessor
//!
//! COP0 owns the exception machinery: the status register with its
//! three-level interrupt/mode stack, the cause register, EPC and the bad
//! virtual address register. Exception entry pushes the mode stack, records
//! the cause and faulting address, and selects the handler vector from the
//! BEV bit; RFE pops the stack back.

use crate::core::savestate::SaveState;
use crate::core::error::Result;

/// Exception kinds, encoded into CAUSE bits 2-6
///
/// TLB exceptions exist in the encoding but cannot occur on this console
/// (no TLB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    Interrupt = 0,
    TlbModification = 1,
    TlbLoad = 2,
    TlbStore = 3,
    BadAddressLoad = 4,
    BadAddressStore = 5,
    BusErrorInstruction = 6,
    BusErrorData = 7,
    SystemCall = 8,
    Break = 9,
    Reserved = 10,
    CoprocessorUnusable = 11,
    Overflow = 12,
}

/// System Control Coprocessor state
#[derive(Debug, Clone, Default)]
pub struct COP0 {
    /// cop0r8: bad virtual address from an address-error exception
    bad_vaddr: u32,

    /// cop0r12: status register
    sr: u32,

    /// cop0r13: cause register
    cause: u32,

    /// cop0r14: exception return address
    epc: u32,

    /// cop0r15: processor ID
    prid: u32,

    /// cop0r3/5/6/7/9/11: breakpoint registers, stored but otherwise inert
    bpc: u32,
    bda: u32,
    jumpdest: u32,
    dcic: u32,
    bdam: u32,
    bpcm: u32,
}

impl COP0 {
    /// SR bit 16: cache isolation (writes bypass memory)
    const SR_ISOLATE_CACHE: u32 = 1 << 16;

    /// SR bit 22: boot exception vectors in BIOS space
    const SR_BEV: u32 = 1 << 22;

    /// General exception vector (BEV = 0)
    pub const VECTOR_RAM: u32 = 0x8000_0080;

    /// Bootstrap exception vector (BEV = 1)
    pub const VECTOR_ROM: u32 = 0xBFC0_0180;

    pub fn new() -> Self {
        let mut cop0 = Self::default();
        cop0.reset();
        cop0
    }

    pub fn reset(&mut self) {
        self.bad_vaddr = 0;
        self.sr = 0;
        self.cause = 0;
        self.epc = 0;
        self.prid = 2;
        self.bpc = 0;
        self.bda = 0;
        self.jumpdest = 0;
        self.dcic = 0;
        self.bdam = 0;
        self.bpcm = 0;
    }

    /// Read a COP0 register by index (MFC0)
    ///
    /// Unknown registers decode as `None`; the CPU turns that into a fatal
    /// unsupported-instruction error.
    pub fn read(&self, reg: u32) -> Option<u32> {
        match reg {
            3 => Some(self.bpc),
            5 => Some(self.bda),
            6 => Some(self.jumpdest),
            7 => Some(self.dcic),
            8 => Some(self.bad_vaddr),
            9 => Some(self.bdam),
            11 => Some(self.bpcm),
            12 => Some(self.sr),
            13 => Some(self.cause),
            14 => Some(self.epc),
            15 => Some(self.prid),
            _ => None,
        }
    }

    /// Write a COP0 register by index (MTC0)
    ///
    /// CAUSE is read-only except for the two software-interrupt bits; EPC,
    /// BadVaddr and PRID are read-only entirely.
    pub fn write(&mut self, reg: u32, value: u32) {
        match reg {
            3 => self.bpc = value,
            5 => self.bda = value,
            7 => self.dcic = value,
            9 => self.bdam = value,
            11 => self.bpcm = value,
            12 => self.sr = value,
            13 => {
                self.cause = (self.cause & !0x0000_0300) | (value & 0x0000_0300);
            }
            _ => {
                log::trace!("COP0 write to read-only/unknown r{} ignored", reg);
            }
        }
    }

    /// Enter an exception: push the mode stack, record cause/EPC, and
    /// return the handler address
    ///
    /// `epc` is the address of the faulting instruction — or of the branch
    /// when the fault happened in a branch-delay slot (`in_delay_slot`),
    /// which also sets CAUSE.BD.
    pub fn enter_exception(&mut self, kind: Exception, epc: u32, in_delay_slot: bool) -> u32 {
        // Push the interrupt-enable/mode stack: current -> previous -> old
        let mode = self.sr & 0x3F;
        self.sr = (self.sr & !0x3F) | ((mode << 2) & 0x3F);

        // Record the exception code, preserve the interrupt-pending field
        self.cause = (self.cause & !0x7C) | ((kind as u32) << 2);

        if in_delay_slot {
            self.cause |= 1 << 31;
        } else {
            self.cause &= !(1 << 31);
        }

        self.epc = epc;

        if self.sr & Self::SR_BEV != 0 {
            Self::VECTOR_ROM
        } else {
            Self::VECTOR_RAM
        }
    }

    /// Pop the interrupt-enable/mode stack (RFE)
    pub fn return_from_exception(&mut self) {
        let mode = self.sr & 0x3F;
        self.sr = (self.sr & !0xF) | ((mode >> 2) & 0xF);
    }

    /// Record the faulting address of an address-error exception
    pub fn set_bad_vaddr(&mut self, address: u32) {
        self.bad_vaddr = address;
    }

    /// Drive the hardware interrupt-pending lines in CAUSE bits 10-15
    ///
    /// The interrupt controller asserts line 2 while `I_STAT & I_MASK` is
    /// non-zero; software-interrupt bits 8-9 are left alone.
    pub fn set_interrupt_pending(&mut self, lines: u32) {
        self.cause = (self.cause & !0x0000_FC00) | ((lines & 0x3F) << 10);
    }

    /// True when an enabled interrupt line is pending and interrupts are on
    pub fn interrupt_pending(&self) -> bool {
        let pending = (self.cause >> 8) & 0xFF;
        let mask = (self.sr >> 8) & 0xFF;
        (self.sr & 1) != 0 && (pending & mask) != 0
    }

    /// True while SR isolates the data cache (stores must not hit memory)
    pub fn is_cache_isolated(&self) -> bool {
        self.sr & Self::SR_ISOLATE_CACHE != 0
    }

    /// Status register value (used by step logging and tests)
    pub fn sr(&self) -> u32 {
        self.sr
    }

    /// Cause register value
    pub fn cause(&self) -> u32 {
        self.cause
    }

    /// Exception return address
    pub fn epc(&self) -> u32 {
        self.epc
    }

    pub fn serialize(&self, state: &mut SaveState) {
        state.push(&self.bad_vaddr);
        state.push(&self.sr);
        state.push(&self.cause);
        state.push(&self.epc);
        state.push(&self.prid);
        state.push(&self.bpc);
        state.push(&self.bda);
        state.push(&self.jumpdest);
        state.push(&self.dcic);
        state.push(&self.bdam);
        state.push(&self.bpcm);
    }

    pub fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.bad_vaddr = state.pop()?;
        self.sr = state.pop()?;
        self.cause = state.pop()?;
        self.epc = state.pop()?;
        self.prid = state.pop()?;
        self.bpc = state.pop()?;
        self.bda = state.pop()?;
        self.jumpdest = state.pop()?;
        self.dcic = state.pop()?;
        self.bdam = state.pop()?;
        self.bpcm = state.pop()?;
        Ok(())
    }
}
