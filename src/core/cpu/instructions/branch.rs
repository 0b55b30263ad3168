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

//! Branch and jump instructions
//!
//! Every handler marks the following instruction as a delay slot whether or
//! not the branch is taken. When execute() runs, `self.pc` already points at
//! the delay slot, so relative targets are `pc + offset*4` and the link
//! register receives `next_pc` (branch address + 8).

use super::super::{Instruction, CPU};

/// Region bits kept by J/JAL (the target replaces the low 28 bits)
const JUMP_REGION_MASK: u32 = 0xF000_0000;

impl CPU {
    pub(super) fn op_j(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        self.jump((self.next_pc & JUMP_REGION_MASK) | (ins.target() << 2));
    }

    pub(super) fn op_jal(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        let return_address = self.next_pc;
        self.set_reg(Self::REG_RA, return_address);
        self.jump((self.next_pc & JUMP_REGION_MASK) | (ins.target() << 2));
    }

    pub(super) fn op_jr(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        self.jump(self.reg(ins.rs()));
    }

    pub(super) fn op_jalr(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        let return_address = self.next_pc;
        let target = self.reg(ins.rs());
        self.set_reg(ins.rd(), return_address);
        self.jump(target);
    }

    pub(super) fn op_beq(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        if self.reg(ins.rs()) == self.reg(ins.rt()) {
            self.branch_relative(ins);
        }
    }

    pub(super) fn op_bne(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        if self.reg(ins.rs()) != self.reg(ins.rt()) {
            self.branch_relative(ins);
        }
    }

    pub(super) fn op_blez(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        if (self.reg(ins.rs()) as i32) <= 0 {
            self.branch_relative(ins);
        }
    }

    pub(super) fn op_bgtz(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;
        if (self.reg(ins.rs()) as i32) > 0 {
            self.branch_relative(ins);
        }
    }

    /// BLTZ/BGEZ/BLTZAL/BGEZAL, multiplexed through the rt field
    ///
    /// Bit 0 of rt selects >= 0 vs < 0; rt = 0b10000/0b10001 additionally
    /// links. The link happens regardless of whether the branch is taken.
    pub(super) fn op_bcondz(&mut self, ins: Instruction) {
        self.branch_delay_pending = true;

        let greater_equal = ins.rt() & 1 != 0;
        let link = (ins.rt() & 0x1E) == 0x10;

        let value = self.reg(ins.rs()) as i32;
        let taken = if greater_equal { value >= 0 } else { value < 0 };

        if link {
            let return_address = self.next_pc;
            self.set_reg(Self::REG_RA, return_address);
        }

        if taken {
            self.branch_relative(ins);
        }
    }

    /// Take a PC-relative branch; `self.pc` is the delay-slot address
    fn branch_relative(&mut self, ins: Instruction) {
        let offset = (ins.imm_signed() as u32).wrapping_mul(4);
        let target = self.pc.wrapping_add(offset);
        self.jump(target);
    }
}
