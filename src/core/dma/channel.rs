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

//! One DMA channel
//!
//! A channel owns three registers — the 24-bit base address, the
//! sync-mode-dependent block control and the channel control — plus a
//! non-owning handle to the peripheral it serves. The sync mode selects the
//! copy routine:
//!
//! - **word** (0): one bulk transfer of `num_words` words (0 encodes
//!   0x10000), kicked by the manual trigger bit. The OTC channel's word
//!   mode is special: it writes the GPU ordering table as a reverse linked
//!   free list instead of moving peripheral data.
//! - **block** (1): `num_blocks` runs of `block_size` words, gated by the
//!   peripheral's readiness (`sync_request`); the MDEC-out channel copies
//!   one block per tick (`interleaved_copy`) so decode output interleaves
//!   with input.
//! - **linked-list** (2): GPU only; walks (size, next) node headers in RAM
//!   until the 0x00FFFFFF terminator.
//!
//! Channel-control writes are masked per channel kind before they land —
//! the OTC channel pins its direction, step and sync mode in hardware.

use crate::core::bus::Bus;
use crate::core::cdrom::CDROM;
use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::gpu::GPU;
use crate::core::mdec::MDEC;
use crate::core::memory::Register;
use crate::core::savestate::SaveState;
use crate::core::spu::SPU;
use std::cell::RefCell;
use std::rc::Rc;

/// The seven channels, by index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    MdecIn = 0,
    MdecOut = 1,
    Gpu = 2,
    CdRom = 3,
    Spu = 4,
    Pio = 5,
    Otc = 6,
}

/// Non-owning handle to the peripheral a channel moves data to/from
pub enum ChannelTarget {
    Gpu(Rc<RefCell<GPU>>),
    Mdec(Rc<RefCell<MDEC>>),
    Spu(Rc<RefCell<SPU>>),
    CdRom(Rc<RefCell<CDROM>>),
    /// PIO and OTC have no peripheral port
    None,
}

/// One DMA channel: registers + target strategy
pub struct DMAChannel {
    kind: ChannelKind,
    target: ChannelTarget,

    /// MADR: transfer base address (24 bits)
    base_address: Register,

    /// BCR: block control, layout depends on the sync mode
    block_control: Register,

    /// CHCR: direction, step, chopping, sync mode, enable, trigger
    channel_control: Register,

    /// Completion flag collected by the controller for DICR aggregation
    interrupt_request: bool,
}

impl DMAChannel {
    /// CHCR bits
    const CHCR_DIRECTION_FROM_RAM: u32 = 1 << 0;
    const CHCR_STEP_BACKWARD: u32 = 1 << 1;
    const CHCR_CHOPPING: u32 = 1 << 8;
    const CHCR_ENABLED: u32 = 1 << 24;
    const CHCR_TRIGGER: u32 = 1 << 28;

    /// Ordering-table terminator
    const OT_TERMINATOR: u32 = 0x00FF_FFFF;

    pub fn new(kind: ChannelKind, target: ChannelTarget) -> Self {
        Self {
            kind,
            target,
            base_address: Register::new(0),
            block_control: Register::new(0),
            channel_control: Register::new(0),
            interrupt_request: false,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Collect and clear the completion flag
    pub fn take_interrupt_request(&mut self) -> bool {
        let flag = self.interrupt_request;
        self.interrupt_request = false;
        flag
    }

    #[inline(always)]
    fn address(&self) -> u32 {
        self.base_address.raw() & 0x00FF_FFFF
    }

    #[inline(always)]
    fn direction_from_ram(&self) -> bool {
        self.channel_control.raw() & Self::CHCR_DIRECTION_FROM_RAM != 0
    }

    #[inline(always)]
    fn step(&self) -> i64 {
        if self.channel_control.raw() & Self::CHCR_STEP_BACKWARD != 0 {
            -4
        } else {
            4
        }
    }

    #[inline(always)]
    pub fn sync_mode(&self) -> u32 {
        (self.channel_control.raw() >> 9) & 0b11
    }

    #[inline(always)]
    pub fn enabled(&self) -> bool {
        self.channel_control.raw() & Self::CHCR_ENABLED != 0
    }

    #[inline(always)]
    fn triggered(&self) -> bool {
        self.channel_control.raw() & Self::CHCR_TRIGGER != 0
    }

    fn clear_trigger(&mut self) {
        self.channel_control
            .set_raw(self.channel_control.raw() & !Self::CHCR_TRIGGER);
    }

    fn finish(&mut self) {
        self.channel_control
            .set_raw(self.channel_control.raw() & !Self::CHCR_ENABLED);
        self.interrupt_request = true;
    }

    /// Run one tick of this channel against the Bus
    pub fn run(&mut self, bus: &mut Bus) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }

        // Word mode waits for the manual trigger
        if self.sync_mode() == 0 && !self.triggered() {
            return Ok(());
        }

        match self.sync_mode() {
            0 => self.word_copy(bus),
            1 => self.block_copy(bus),
            2 => self.linked_list_copy(bus),
            _ => unreachable!("DMA sync mode 3 is reserved"),
        }
    }

    /// Peripheral readiness for block mode
    fn sync_request(&self) -> bool {
        match self.kind {
            ChannelKind::MdecIn => match &self.target {
                ChannelTarget::Mdec(mdec) => mdec.borrow().input_ready(),
                _ => true,
            },
            ChannelKind::MdecOut => match &self.target {
                ChannelTarget::Mdec(mdec) => mdec.borrow().output_ready(),
                _ => true,
            },
            _ => true,
        }
    }

    /// Block mode yields between blocks so other channels interleave
    fn interleaved_copy(&self) -> bool {
        self.kind == ChannelKind::MdecOut
    }

    /// Read one word from the peripheral port
    fn read_from_component(&mut self) -> u32 {
        match &self.target {
            ChannelTarget::Gpu(gpu) => gpu.borrow_mut().read(0),
            ChannelTarget::Mdec(mdec) => mdec.borrow_mut().pop_output(),
            ChannelTarget::Spu(spu) => spu.borrow_mut().dma_read(),
            ChannelTarget::CdRom(cdrom) => {
                let mut cdrom = cdrom.borrow_mut();
                u32::from_le_bytes([
                    cdrom.pop_data(),
                    cdrom.pop_data(),
                    cdrom.pop_data(),
                    cdrom.pop_data(),
                ])
            }
            ChannelTarget::None => {
                log::warn!("DMA {:?} read from portless channel", self.kind);
                !0
            }
        }
    }

    /// Write one word to the peripheral port
    fn write_to_component(&mut self, value: u32) {
        match &self.target {
            ChannelTarget::Gpu(gpu) => gpu.borrow_mut().write(0, value),
            ChannelTarget::Mdec(mdec) => mdec.borrow_mut().write(0, value),
            ChannelTarget::Spu(spu) => spu.borrow_mut().dma_write(value),
            ChannelTarget::CdRom(_) | ChannelTarget::None => {
                log::warn!("DMA {:?} write to read-only channel", self.kind);
            }
        }
    }

    /// Word mode: one bulk transfer of num_words words
    fn word_copy(&mut self, bus: &mut Bus) -> Result<()> {
        self.clear_trigger();

        if self.kind == ChannelKind::Otc {
            return self.ordering_table_clear(bus);
        }

        let mut address = self.address() as i64;
        let step = self.step();

        // num_words of zero encodes the maximum transfer
        let mut num_words = self.block_control.raw() & 0xFFFF;
        if num_words == 0 {
            num_words = 0x10000;
        }

        if self.direction_from_ram() {
            for _ in 0..num_words {
                let word = bus.read32(address as u32)?;
                self.write_to_component(word);
                address += step;
            }
        } else {
            for _ in 0..num_words {
                let word = self.read_from_component();
                bus.write32(address as u32, word)?;
                address += step;
            }
        }

        log::debug!("DMA {:?} word copy of {} words done", self.kind, num_words);
        self.finish();
        Ok(())
    }

    /// OTC word mode: write the reverse ordering-table free list
    ///
    /// Entries link each word to the previous address; the final (lowest)
    /// entry holds the terminator. num_words of zero again encodes 0x10000.
    fn ordering_table_clear(&mut self, bus: &mut Bus) -> Result<()> {
        let mut address = self.address();

        let mut num_words = self.block_control.raw() & 0xFFFF;
        if num_words == 0 {
            num_words = 0x10000;
        }

        for i in (0..num_words).rev() {
            let entry = if i == 0 {
                Self::OT_TERMINATOR
            } else {
                address.wrapping_sub(4) & 0x00FF_FFFF
            };
            bus.write32(address, entry)?;
            address = address.wrapping_sub(4);
        }

        log::debug!("DMA OTC cleared {} entries", num_words);
        self.finish();
        Ok(())
    }

    /// Block mode: num_blocks runs of block_size words with device sync
    fn block_copy(&mut self, bus: &mut Bus) -> Result<()> {
        self.clear_trigger();

        if !self.sync_request() {
            return Ok(());
        }

        let mut address = self.address() as i64;
        let step = self.step();
        let block_size = self.block_control.raw() & 0xFFFF;
        let mut num_blocks = (self.block_control.raw() >> 16) & 0xFFFF;

        // An empty program completes immediately
        if num_blocks == 0 {
            self.finish();
            return Ok(());
        }

        loop {
            if self.direction_from_ram() {
                for _ in 0..block_size {
                    let word = bus.read32(address as u32)?;
                    self.write_to_component(word);
                    address += step;
                }
            } else {
                for _ in 0..block_size {
                    let word = self.read_from_component();
                    bus.write32(address as u32, word)?;
                    address += step;
                }
            }

            // The resume point lives in the base address register
            self.base_address.set_raw(address as u32 & 0x00FF_FFFF);

            num_blocks -= 1;
            if num_blocks == 0 {
                self.finish();
                break;
            }

            if self.interleaved_copy() {
                break;
            }
        }

        self.block_control
            .set_raw((self.block_control.raw() & 0xFFFF) | (num_blocks << 16));
        Ok(())
    }

    /// Linked-list mode: walk (size, next) headers until the terminator
    fn linked_list_copy(&mut self, bus: &mut Bus) -> Result<()> {
        self.clear_trigger();

        let mut address = self.address() as i64;
        let step = self.step();

        loop {
            let header = bus.read32(address as u32)?;
            let num_words = header >> 24;
            let next_node = header & 0x00FF_FFFF;

            address += step;
            for _ in 0..num_words {
                let word = bus.read32(address as u32)?;
                self.write_to_component(word);
                address += step;
            }

            address = next_node as i64;

            if next_node & 0x0080_0000 != 0 || next_node == 0 {
                break;
            }
        }

        self.base_address.set_raw(address as u32 & 0x00FF_FFFF);
        self.finish();
        Ok(())
    }

    /// Channel-specific CHCR masking applied on every write
    ///
    /// The OTC channel hardwires device-to-RAM direction, backward step,
    /// word sync and no chopping.
    fn mask_channel_control_register(&mut self) {
        if self.kind == ChannelKind::Otc {
            let mut raw = self.channel_control.raw();
            raw &= !(Self::CHCR_DIRECTION_FROM_RAM | Self::CHCR_CHOPPING);
            raw &= !(0b11 << 9); // sync mode 0
            raw &= !(0b111 << 16 | 0b111 << 20); // chopping window sizes
            raw |= Self::CHCR_STEP_BACKWARD;
            self.channel_control.set_raw(raw);
        }
    }

    /// Byte-lane register read (offsets 0-11 inside the channel window)
    pub fn read_lane(&self, address: u32) -> u32 {
        match address {
            0..=3 => self.base_address.read_lane(address),
            4..=7 => self.block_control.read_lane(address - 4),
            8..=11 => self.channel_control.read_lane(address - 8),
            _ => unreachable!("DMA channel read at 0x{:02X}", address),
        }
    }

    /// Byte-lane register write; returns true when the write enabled the
    /// channel and it should be kicked immediately
    pub fn write_lane(&mut self, address: u32, value: u32) -> bool {
        match address {
            0..=3 => {
                self.base_address.write_lane(address, value);
                self.base_address
                    .set_raw(self.base_address.raw() & 0x00FF_FFFF);
                false
            }
            4..=7 => {
                self.block_control.write_lane(address - 4, value);
                false
            }
            8..=11 => {
                self.channel_control.write_lane(address - 8, value);
                self.mask_channel_control_register();
                self.enabled()
            }
            _ => unreachable!("DMA channel write at 0x{:02X}", address),
        }
    }

    pub fn reset(&mut self) {
        self.base_address.set_raw(0);
        self.block_control.set_raw(0);
        self.channel_control.set_raw(0);
        self.interrupt_request = false;
    }

    pub fn serialize(&self, state: &mut SaveState) {
        state.push(&self.base_address.raw());
        state.push(&self.block_control.raw());
        state.push(&self.channel_control.raw());
        state.push(&self.interrupt_request);
    }

    pub fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.base_address.set_raw(state.pop()?);
        self.block_control.set_raw(state.pop()?);
        self.channel_control.set_raw(state.pop()?);
        self.interrupt_request = state.pop()?;
        Ok(())
    }
}
