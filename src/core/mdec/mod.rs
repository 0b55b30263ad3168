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

//! MDEC — the macroblock decoder
//!
//! Decodes JPEG-like compressed YCbCr macroblocks into RGB, normally fed
//! and drained by DMA channels 0 and 1. Three commands exist, each
//! declaring its parameter word count up front:
//!
//! - **Decode Macroblock** (opcode 1): the low 16 bits give the number of
//!   parameter words; every word splits into two 16-bit codes appended to
//!   the input FIFO. Once the count is satisfied the whole FIFO is decoded:
//!   per macroblock six 8x8 blocks (Cr, Cb, Y0..Y3) are run-length
//!   expanded and dequantized, inverse-DCT'd against the programmable IDCT
//!   table, color-converted and written into the output FIFO as one 16x16
//!   macroblock.
//! - **Set Quantization Tables** (opcode 2): 16 words of luma table, plus
//!   16 of color when bit 0 is set.
//! - **Set IDCT Table** (opcode 3): 32 words of signed 16-bit matrix.
//!
//! Running out of input mid-block is a logged soft warning that abandons
//! the rest of the stream; a command word that does not decode at all is a
//! fatal invariant violation.

use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::savestate::SaveState;
use std::collections::VecDeque;

mod decoder;
#[cfg(test)]
mod tests;

/// Macroblock decoder state
pub struct MDEC {
    /// Control register (write 0x1F801824)
    control: u32,

    /// Opcode of the command in progress (0 when idle)
    command_opcode: u32,

    /// Parameter words still expected by the command in progress
    remaining_params: u32,

    /// 16-bit run-length codes awaiting decode
    input_fifo: VecDeque<u16>,

    /// Decoded output words awaiting the CPU or DMA channel 1
    output_fifo: VecDeque<u32>,

    /// Quantization tables (zig-zag order)
    luma_quant: [u8; 64],
    color_quant: [u8; 64],

    /// Programmable IDCT matrix
    idct_table: [i16; 64],

    /// Cursor used while loading tables
    table_cursor: usize,

    /// Decode command output format
    output_depth: u32,
    output_signed: bool,
    output_bit15: bool,

    /// Block counter reported in the status register (4 = Cr, 5 = Cb,
    /// 0-3 = Y)
    current_block: u32,
}

impl MDEC {
    /// Control register bits
    const CTRL_RESET: u32 = 1 << 31;
    const CTRL_ENABLE_DATA_IN: u32 = 1 << 30;
    const CTRL_ENABLE_DATA_OUT: u32 = 1 << 29;

    pub fn new() -> Self {
        let mut mdec = Self {
            control: 0,
            command_opcode: 0,
            remaining_params: 0,
            input_fifo: VecDeque::new(),
            output_fifo: VecDeque::new(),
            luma_quant: [0; 64],
            color_quant: [0; 64],
            idct_table: [0; 64],
            table_cursor: 0,
            output_depth: 0,
            output_signed: false,
            output_bit15: false,
            current_block: 4,
        };
        mdec.reset();
        mdec
    }

    /// Start a new command from its leading word
    fn begin_command(&mut self, value: u32) {
        self.command_opcode = value >> 29;

        match self.command_opcode {
            // Decode Macroblock
            1 => {
                self.remaining_params = value & 0xFFFF;
                self.output_depth = (value >> 27) & 0b11;
                self.output_signed = value & (1 << 26) != 0;
                self.output_bit15 = value & (1 << 25) != 0;
                self.input_fifo.clear();
                log::debug!(
                    "MDEC decode: {} words, depth {}, signed {}",
                    self.remaining_params,
                    self.output_depth,
                    self.output_signed,
                );
            }
            // Set Quantization Tables
            2 => {
                self.remaining_params = if value & 1 != 0 { 32 } else { 16 };
                self.table_cursor = 0;
            }
            // Set IDCT Table
            3 => {
                self.remaining_params = 32;
                self.table_cursor = 0;
            }
            _ => unreachable!("MDEC command 0x{:X} does not decode", self.command_opcode),
        }
    }

    /// Feed one parameter word to the command in progress
    fn push_parameter(&mut self, value: u32) {
        match self.command_opcode {
            1 => {
                self.input_fifo.push_back(value as u16);
                self.input_fifo.push_back((value >> 16) as u16);
            }
            2 => {
                // Four table bytes per word, luma first then color
                for (i, byte) in value.to_le_bytes().iter().enumerate() {
                    let index = self.table_cursor + i;
                    if index < 64 {
                        self.luma_quant[index] = *byte;
                    } else {
                        self.color_quant[index - 64] = *byte;
                    }
                }
                self.table_cursor += 4;
            }
            3 => {
                // Two signed 16-bit matrix entries per word
                self.idct_table[self.table_cursor] = value as i16;
                self.idct_table[self.table_cursor + 1] = (value >> 16) as i16;
                self.table_cursor += 2;
            }
            _ => unreachable!("MDEC parameter without a command"),
        }

        self.remaining_params -= 1;

        // The declared count is satisfied: run the command
        if self.remaining_params == 0 {
            if self.command_opcode == 1 {
                self.decode_all_macroblocks();
            }
            self.command_opcode = 0;
        }
    }

    /// Status register (read 0x1F801824)
    pub fn status(&self) -> u32 {
        let mut status = 0u32;
        status |= (self.output_fifo.is_empty() as u32) << 31;
        // The input FIFO is unbounded here, so it never reports full
        status |= ((self.command_opcode != 0) as u32) << 29;
        status |= (((self.control & Self::CTRL_ENABLE_DATA_IN != 0) && self.input_ready()) as u32)
            << 28;
        status |= (((self.control & Self::CTRL_ENABLE_DATA_OUT != 0) && self.output_ready())
            as u32)
            << 27;
        status |= (self.output_depth & 0b11) << 25;
        status |= (self.output_signed as u32) << 24;
        status |= (self.output_bit15 as u32) << 23;
        status |= (self.current_block & 0b111) << 16;
        status |= self.remaining_params.wrapping_sub(1) & 0xFFFF;
        status
    }

    /// DMA channel 0 readiness: parameters are still expected
    pub fn input_ready(&self) -> bool {
        self.command_opcode == 1 && self.remaining_params > 0
    }

    /// DMA channel 1 readiness: decoded words are available
    pub fn output_ready(&self) -> bool {
        !self.output_fifo.is_empty()
    }

    /// Pop one decoded word (CPU read or DMA channel 1)
    pub fn pop_output(&mut self) -> u32 {
        self.output_fifo.pop_front().unwrap_or(0)
    }

    /// Decoded words currently buffered (tests)
    pub fn output_len(&self) -> usize {
        self.output_fifo.len()
    }
}

impl Component for MDEC {
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        match address {
            0..=3 => self.pop_output(),
            4..=7 => self.status(),
            _ => unreachable!("MDEC read at 0x{:02X}", address),
        }
    }

    fn write(&mut self, address: u32, value: u32) {
        match address {
            0..=3 => {
                if self.command_opcode == 0 {
                    self.begin_command(value);
                } else {
                    self.push_parameter(value);
                }
            }
            4..=7 => {
                self.control = value;
                if value & Self::CTRL_RESET != 0 {
                    self.reset();
                }
            }
            _ => unreachable!("MDEC write at 0x{:02X}", address),
        }
    }

    fn reset(&mut self) {
        self.command_opcode = 0;
        self.remaining_params = 0;
        self.input_fifo.clear();
        self.output_fifo.clear();
        self.table_cursor = 0;
        self.output_depth = 0;
        self.output_signed = false;
        self.output_bit15 = false;
        self.current_block = 4;
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.control);
        state.push(&self.command_opcode);
        state.push(&self.remaining_params);
        state.push(&self.input_fifo.iter().copied().collect::<Vec<u16>>());
        state.push(&self.output_fifo.iter().copied().collect::<Vec<u32>>());
        state.push(&self.luma_quant);
        state.push(&self.color_quant);
        state.push(&self.idct_table);
        state.push(&(self.table_cursor as u32));
        state.push(&self.output_depth);
        state.push(&self.output_signed);
        state.push(&self.output_bit15);
        state.push(&self.current_block);
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.control = state.pop()?;
        self.command_opcode = state.pop()?;
        self.remaining_params = state.pop()?;
        let input: Vec<u16> = state.pop()?;
        self.input_fifo = input.into();
        let output: Vec<u32> = state.pop()?;
        self.output_fifo = output.into();
        self.luma_quant = state.pop()?;
        self.color_quant = state.pop()?;
        self.idct_table = state.pop()?;
        self.table_cursor = state.pop::<u32>()? as usize;
        self.output_depth = state.pop()?;
        self.output_signed = state.pop()?;
        self.output_bit15 = state.pop()?;
        self.current_block = state.pop()?;
        Ok(())
    }
}

impl Default for MDEC {
    fn default() -> Self {
        Self::new()
    }
}
