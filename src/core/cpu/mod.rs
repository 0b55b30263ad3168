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

//! CPU (MIPS R3000A) emulation
//!
//! The pipeline is modelled as fetch → decode → execute → commit of the
//! previous cycle's load-delay slot. Two architectural delay rules shape the
//! implementation:
//!
//! - **Load-delay slot**: a load's result is invisible to the instruction
//!   immediately after it. The CPU keeps two delay buffers (current, next);
//!   each cycle the current buffer commits to the register file and the next
//!   buffer is *swapped* into its place — never overwritten in place.
//!   Writing a register directly cancels a pending delayed load of the same
//!   register, and scheduling a new delayed load of a register already
//!   pending discards the older one.
//! - **Branch-delay slot**: the instruction after a branch or jump always
//!   executes before the branch target, even when the branch is taken.
//!
//! Exceptions redirect the PC to the BEV-selected vector and record
//! cause/EPC in COP0. Pending delay-slot loads are preserved across the
//! redirect, matching the architectural rule. Undecodable opcodes are fatal:
//! only validated game code is expected to run.

use crate::core::bus::Bus;
use crate::core::error::{CoreError, Result};
use crate::core::savestate::SaveState;

mod cop0;
pub mod decode;
mod disassembler;
mod instructions;
#[cfg(test)]
mod tests;

pub use cop0::{Exception, COP0};
pub use decode::Instruction;
pub use disassembler::disassemble;

/// One pending delayed register load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadDelay {
    /// Target register (1-31; loads into r0 are never queued)
    pub reg: u8,
    /// Value that becomes visible after the delay
    pub value: u32,
}

/// Index of the slot that commits this cycle
const SLOT_CURRENT: usize = 0;
/// Index of the slot that commits next cycle
const SLOT_NEXT: usize = 1;

/// MIPS R3000A CPU core
///
/// # Example
/// ```
/// use oxidestation::core::cpu::CPU;
///
/// let cpu = CPU::new();
/// assert_eq!(cpu.reg(0), 0); // r0 is hardwired to zero
/// assert_eq!(cpu.pc(), 0xBFC00000); // BIOS entry point
/// ```
pub struct CPU {
    /// General purpose registers (r0-r31); r0 reads as 0
    regs: [u32; 32],

    /// Program counter of the instruction about to execute
    pc: u32,

    /// Address of the instruction after that (branch targets land here)
    next_pc: u32,

    /// Multiply/divide result registers
    hi: u32,
    lo: u32,

    /// System Control Coprocessor
    cop0: COP0,

    /// Two-slot load-delay file: [current, next], swapped every cycle
    load_delay: [Option<LoadDelay>; 2],

    /// The previous instruction was a branch/jump, so the one executing now
    /// sits in its delay slot
    in_delay_slot: bool,

    /// The previous instruction actually took its branch
    branching: bool,

    /// Set by branch/jump handlers; becomes `in_delay_slot` next cycle
    branch_delay_pending: bool,

    /// Set by a taken jump; becomes `branching` next cycle
    branch_taken_pending: bool,

    /// PC of the instruction currently executing (exception bookkeeping)
    current_pc: u32,

    /// Instruction currently executing
    current_instruction: Instruction,

    /// Clock cycles since reset
    cycles: u64,
}

impl CPU {
    /// Reset vector: BIOS entry point
    const PC_RESET: u32 = 0xBFC0_0000;

    /// Return-address register (r31)
    const REG_RA: u32 = 31;

    pub fn new() -> Self {
        Self {
            regs: [0; 32],
            pc: Self::PC_RESET,
            next_pc: Self::PC_RESET.wrapping_add(4),
            hi: 0,
            lo: 0,
            cop0: COP0::new(),
            load_delay: [None, None],
            in_delay_slot: false,
            branching: false,
            branch_delay_pending: false,
            branch_taken_pending: false,
            current_pc: Self::PC_RESET,
            current_instruction: Instruction(0),
            cycles: 0,
        }
    }

    pub fn reset(&mut self) {
        self.regs = [0; 32];
        self.set_pc(Self::PC_RESET);
        self.hi = 0;
        self.lo = 0;
        self.cop0.reset();
        self.load_delay = [None, None];
        self.in_delay_slot = false;
        self.branching = false;
        self.branch_delay_pending = false;
        self.branch_taken_pending = false;
        self.current_pc = Self::PC_RESET;
        self.current_instruction = Instruction(0);
        self.cycles = 0;
    }

    /// Execute one instruction
    ///
    /// Interrupts are sampled before the fetch; the interrupt-pending lines
    /// in COP0 are driven by the Bus from the interrupt controller each
    /// batch. Returns the number of cycles consumed (always 1 for now).
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32> {
        // Delay-slot bookkeeping set up by the previous instruction
        self.in_delay_slot = self.branch_delay_pending;
        self.branching = self.branch_taken_pending;
        self.branch_delay_pending = false;
        self.branch_taken_pending = false;
        self.current_pc = self.pc;

        if self.cop0.interrupt_pending() {
            self.exception(Exception::Interrupt);
            // The handler's first instruction executes this very step
            self.current_pc = self.pc;
            self.in_delay_slot = false;
        }

        if self.pc & 0x3 != 0 {
            self.cop0.set_bad_vaddr(self.pc);
            self.exception(Exception::BadAddressLoad);
            self.commit_load_delay();
            self.cycles += 1;
            return Ok(1);
        }

        // Fetch
        self.current_instruction = Instruction(bus.read32(self.pc)?);

        // Advance PC; a branch in execute() will overwrite next_pc
        self.pc = self.next_pc;
        self.next_pc = self.next_pc.wrapping_add(4);

        // Execute
        self.execute_instruction(bus)?;

        // Commit the previous cycle's load and rotate the delay file
        self.commit_load_delay();

        self.cycles += 1;
        Ok(1)
    }

    /// Read a general purpose register; r0 always reads 0
    #[inline(always)]
    pub fn reg(&self, index: u32) -> u32 {
        self.regs[index as usize]
    }

    /// Write a general purpose register immediately
    ///
    /// Writes to r0 are discarded. A pending delayed load of the same
    /// register in the current slot is cancelled: the direct write wins.
    #[inline(always)]
    pub fn set_reg(&mut self, index: u32, value: u32) {
        if index == 0 {
            return;
        }
        self.regs[index as usize] = value;
        if let Some(slot) = self.load_delay[SLOT_CURRENT] {
            if slot.reg as u32 == index {
                self.load_delay[SLOT_CURRENT] = None;
            }
        }
    }

    /// Queue a delayed register load (visible after one instruction)
    ///
    /// Scheduling over a register already pending in the current slot
    /// discards the older load.
    pub fn schedule_load(&mut self, index: u32, value: u32) {
        if index == 0 {
            return;
        }
        if let Some(slot) = self.load_delay[SLOT_CURRENT] {
            if slot.reg as u32 == index {
                self.load_delay[SLOT_CURRENT] = None;
            }
        }
        self.load_delay[SLOT_NEXT] = Some(LoadDelay {
            reg: index as u8,
            value,
        });
    }

    /// Commit the current delay slot and rotate next into its place
    fn commit_load_delay(&mut self) {
        if let Some(slot) = self.load_delay[SLOT_CURRENT] {
            self.regs[slot.reg as usize] = slot.value;
        }
        self.load_delay[SLOT_CURRENT] = self.load_delay[SLOT_NEXT].take();
    }

    /// Value of `index` as seen by LWL/LWR, which forward from a pending
    /// delayed load of the same register
    fn reg_with_pending_load(&self, index: u32) -> u32 {
        if let Some(slot) = self.load_delay[SLOT_CURRENT] {
            if slot.reg as u32 == index {
                return slot.value;
            }
        }
        self.reg(index)
    }

    /// Redirect control flow into a branch target (takes effect after the
    /// delay slot)
    fn jump(&mut self, address: u32) {
        self.next_pc = address;
        self.branch_taken_pending = true;
    }

    /// Hard-set the PC (reset, exception entry, executable loading)
    pub fn set_pc(&mut self, address: u32) {
        self.pc = address;
        self.next_pc = address.wrapping_add(4);
    }

    /// Enter an exception
    ///
    /// EPC records the faulting instruction — or the branch when the fault
    /// hit a delay slot, with CAUSE.BD set. Pending delayed loads survive
    /// the redirect.
    pub fn exception(&mut self, kind: Exception) {
        let epc = if self.in_delay_slot {
            self.current_pc.wrapping_sub(4)
        } else {
            self.current_pc
        };

        let handler = self.cop0.enter_exception(kind, epc, self.in_delay_slot);

        log::debug!(
            "exception {:?}: EPC=0x{:08X} handler=0x{:08X} delay_slot={}",
            kind,
            epc,
            handler,
            self.in_delay_slot,
        );

        self.set_pc(handler);
        self.branch_delay_pending = false;
        self.branch_taken_pending = false;
    }

    /// Current program counter
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// True while the instruction in flight sits in a branch-delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.in_delay_slot
    }

    /// Clock cycles executed since reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Both load-delay buffers (delay-slot preservation tests)
    pub fn load_delay_slots(&self) -> [Option<LoadDelay>; 2] {
        self.load_delay
    }

    /// COP0 access for the Bus (interrupt lines, cache isolation)
    pub fn cop0(&self) -> &COP0 {
        &self.cop0
    }

    /// Mutable COP0 access for the Bus interrupt line updates
    pub fn cop0_mut(&mut self) -> &mut COP0 {
        &mut self.cop0
    }

    /// Set up PC/GP/SP/FP after loading an executable
    pub fn apply_executable_entry(&mut self, pc: u32, gp: u32, sp: u32) {
        self.set_pc(pc);
        self.regs[28] = gp;
        if sp != 0 {
            self.regs[29] = sp;
            self.regs[30] = sp;
        }
    }

    /// Append the CPU state to a save-state stream
    pub fn serialize(&self, state: &mut SaveState) {
        state.push(&self.regs);
        state.push(&self.pc);
        state.push(&self.next_pc);
        state.push(&self.hi);
        state.push(&self.lo);
        self.cop0.serialize(state);
        for slot in &self.load_delay {
            match slot {
                Some(delay) => {
                    state.push(&true);
                    state.push(&delay.reg);
                    state.push(&delay.value);
                }
                None => state.push(&false),
            }
        }
        state.push(&self.in_delay_slot);
        state.push(&self.branching);
        state.push(&self.branch_delay_pending);
        state.push(&self.branch_taken_pending);
        state.push(&self.current_pc);
        state.push(&self.current_instruction.raw());
        state.push(&self.cycles);
    }

    /// Restore the CPU state from a save-state stream
    pub fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.regs = state.pop()?;
        self.pc = state.pop()?;
        self.next_pc = state.pop()?;
        self.hi = state.pop()?;
        self.lo = state.pop()?;
        self.cop0.deserialize(state)?;
        for slot in &mut self.load_delay {
            let present: bool = state.pop()?;
            *slot = if present {
                Some(LoadDelay {
                    reg: state.pop()?,
                    value: state.pop()?,
                })
            } else {
                None
            };
        }
        self.in_delay_slot = state.pop()?;
        self.branching = state.pop()?;
        self.branch_delay_pending = state.pop()?;
        self.branch_taken_pending = state.pop()?;
        self.current_pc = state.pop()?;
        self.current_instruction = Instruction(state.pop()?);
        self.cycles = state.pop()?;
        Ok(())
    }

    /// Fatal decode error for an instruction no valid guest emits
    fn unsupported(&self) -> CoreError {
        CoreError::UnsupportedInstruction {
            word: self.current_instruction.raw(),
            pc: self.current_pc,
            disassembly: disassemble(self.current_instruction.raw()),
        }
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}
