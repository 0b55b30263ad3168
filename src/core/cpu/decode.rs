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

//! MIPS instruction word decoding
//!
//! A 32-bit instruction word is interpreted through one of three overlapping
//! bit-field layouts, selected by the opcode field:
//!
//! ```text
//! R-type: | op (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
//! I-type: | op (6) | rs (5) | rt (5) |       immediate (16)          |
//! J-type: | op (6) |              target (26)                        |
//! ```
//!
//! [`Instruction`] keeps the raw word and exposes every field as an
//! accessor; exactly one layout is meaningful for a given opcode class.
//! Re-encoding the fields of any layout reproduces the raw word.

/// A raw 32-bit MIPS instruction with layout accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Raw instruction word
    #[inline(always)]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Primary opcode (bits 26-31)
    #[inline(always)]
    pub fn opcode(self) -> u32 {
        self.0 >> 26
    }

    /// Source register (bits 21-25)
    #[inline(always)]
    pub fn rs(self) -> u32 {
        (self.0 >> 21) & 0x1F
    }

    /// Target register (bits 16-20)
    #[inline(always)]
    pub fn rt(self) -> u32 {
        (self.0 >> 16) & 0x1F
    }

    /// Destination register (bits 11-15, R-type)
    #[inline(always)]
    pub fn rd(self) -> u32 {
        (self.0 >> 11) & 0x1F
    }

    /// Shift amount (bits 6-10, R-type)
    #[inline(always)]
    pub fn shamt(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// Secondary function code (bits 0-5, R-type)
    #[inline(always)]
    pub fn funct(self) -> u32 {
        self.0 & 0x3F
    }

    /// Zero-extended 16-bit immediate (I-type)
    #[inline(always)]
    pub fn imm(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Sign-extended 16-bit immediate (I-type)
    #[inline(always)]
    pub fn imm_signed(self) -> i32 {
        (self.0 & 0xFFFF) as i16 as i32
    }

    /// 26-bit jump target (J-type)
    #[inline(always)]
    pub fn target(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }

    /// Assemble an R-type word from its fields
    pub fn from_r_type(op: u32, rs: u32, rt: u32, rd: u32, shamt: u32, funct: u32) -> Self {
        Self(
            (op << 26)
                | ((rs & 0x1F) << 21)
                | ((rt & 0x1F) << 16)
                | ((rd & 0x1F) << 11)
                | ((shamt & 0x1F) << 6)
                | (funct & 0x3F),
        )
    }

    /// Assemble an I-type word from its fields
    pub fn from_i_type(op: u32, rs: u32, rt: u32, imm: u16) -> Self {
        Self((op << 26) | ((rs & 0x1F) << 21) | ((rt & 0x1F) << 16) | imm as u32)
    }

    /// Assemble a J-type word from its fields
    pub fn from_j_type(op: u32, target: u32) -> Self {
        Self((op << 26) | (target & 0x03FF_FFFF))
    }
}

impl From<u32> for Instruction {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}
