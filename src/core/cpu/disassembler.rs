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

//! One-line MIPS disassembly for logging and fatal decode errors

use super::decode::Instruction;

/// Disassemble a single instruction word
pub fn disassemble(word: u32) -> String {
    let ins = Instruction(word);
    let rs = ins.rs();
    let rt = ins.rt();
    let rd = ins.rd();
    let imm = ins.imm_signed();

    match ins.opcode() {
        0x00 => match ins.funct() {
            0x00 if word == 0 => "nop".to_string(),
            0x00 => format!("sll r{rd}, r{rt}, {}", ins.shamt()),
            0x02 => format!("srl r{rd}, r{rt}, {}", ins.shamt()),
            0x03 => format!("sra r{rd}, r{rt}, {}", ins.shamt()),
            0x04 => format!("sllv r{rd}, r{rt}, r{rs}"),
            0x06 => format!("srlv r{rd}, r{rt}, r{rs}"),
            0x07 => format!("srav r{rd}, r{rt}, r{rs}"),
            0x08 => format!("jr r{rs}"),
            0x09 => format!("jalr r{rd}, r{rs}"),
            0x0C => "syscall".to_string(),
            0x0D => "break".to_string(),
            0x10 => format!("mfhi r{rd}"),
            0x11 => format!("mthi r{rs}"),
            0x12 => format!("mflo r{rd}"),
            0x13 => format!("mtlo r{rs}"),
            0x18 => format!("mult r{rs}, r{rt}"),
            0x19 => format!("multu r{rs}, r{rt}"),
            0x1A => format!("div r{rs}, r{rt}"),
            0x1B => format!("divu r{rs}, r{rt}"),
            0x20 => format!("add r{rd}, r{rs}, r{rt}"),
            0x21 => format!("addu r{rd}, r{rs}, r{rt}"),
            0x22 => format!("sub r{rd}, r{rs}, r{rt}"),
            0x23 => format!("subu r{rd}, r{rs}, r{rt}"),
            0x24 => format!("and r{rd}, r{rs}, r{rt}"),
            0x25 => format!("or r{rd}, r{rs}, r{rt}"),
            0x26 => format!("xor r{rd}, r{rs}, r{rt}"),
            0x27 => format!("nor r{rd}, r{rs}, r{rt}"),
            0x2A => format!("slt r{rd}, r{rs}, r{rt}"),
            0x2B => format!("sltu r{rd}, r{rs}, r{rt}"),
            funct => format!("special? funct=0x{funct:02X}"),
        },
        0x01 => {
            let mnemonic = match rt {
                0x00 => "bltz",
                0x01 => "bgez",
                0x10 => "bltzal",
                0x11 => "bgezal",
                _ => "bcondz?",
            };
            format!("{mnemonic} r{rs}, {imm}")
        }
        0x02 => format!("j 0x{:08X}", ins.target() << 2),
        0x03 => format!("jal 0x{:08X}", ins.target() << 2),
        0x04 => format!("beq r{rs}, r{rt}, {imm}"),
        0x05 => format!("bne r{rs}, r{rt}, {imm}"),
        0x06 => format!("blez r{rs}, {imm}"),
        0x07 => format!("bgtz r{rs}, {imm}"),
        0x08 => format!("addi r{rt}, r{rs}, {imm}"),
        0x09 => format!("addiu r{rt}, r{rs}, {imm}"),
        0x0A => format!("slti r{rt}, r{rs}, {imm}"),
        0x0B => format!("sltiu r{rt}, r{rs}, {imm}"),
        0x0C => format!("andi r{rt}, r{rs}, 0x{:04X}", ins.imm()),
        0x0D => format!("ori r{rt}, r{rs}, 0x{:04X}", ins.imm()),
        0x0E => format!("xori r{rt}, r{rs}, 0x{:04X}", ins.imm()),
        0x0F => format!("lui r{rt}, 0x{:04X}", ins.imm()),
        0x10 => match rs {
            0x00 => format!("mfc0 r{rt}, cop0r{rd}"),
            0x04 => format!("mtc0 r{rt}, cop0r{rd}"),
            0x10 => "rfe".to_string(),
            _ => format!("cop0? rs=0x{rs:02X}"),
        },
        0x12 => format!("cop2 0x{:07X}", word & 0x03FF_FFFF),
        0x20 => format!("lb r{rt}, {imm}(r{rs})"),
        0x21 => format!("lh r{rt}, {imm}(r{rs})"),
        0x22 => format!("lwl r{rt}, {imm}(r{rs})"),
        0x23 => format!("lw r{rt}, {imm}(r{rs})"),
        0x24 => format!("lbu r{rt}, {imm}(r{rs})"),
        0x25 => format!("lhu r{rt}, {imm}(r{rs})"),
        0x26 => format!("lwr r{rt}, {imm}(r{rs})"),
        0x28 => format!("sb r{rt}, {imm}(r{rs})"),
        0x29 => format!("sh r{rt}, {imm}(r{rs})"),
        0x2A => format!("swl r{rt}, {imm}(r{rs})"),
        0x2B => format!("sw r{rt}, {imm}(r{rs})"),
        0x2E => format!("swr r{rt}, {imm}(r{rs})"),
        0x32 => format!("lwc2 r{rt}, {imm}(r{rs})"),
        0x3A => format!("swc2 r{rt}, {imm}(r{rs})"),
        op => format!("op? 0x{op:02X}"),
    }
}
