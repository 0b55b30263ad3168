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

//! DMA controller
//!
//! Seven channels move data between RAM and the peripherals without CPU
//! involvement:
//!
//! | Channel | Device   | Window      |
//! |---------|----------|-------------|
//! | 0       | MDEC in  | 0x1F801080  |
//! | 1       | MDEC out | 0x1F801090  |
//! | 2       | GPU      | 0x1F8010A0  |
//! | 3       | CD-ROM   | 0x1F8010B0  |
//! | 4       | SPU      | 0x1F8010C0  |
//! | 5       | PIO      | 0x1F8010D0  |
//! | 6       | OTC      | 0x1F8010E0  |
//!
//! Each tick visits every channel in priority order: DPCR carries a 3-bit
//! priority per channel (lower value first, ties by channel index) plus an
//! enable bit per nibble. Channel completions land in DICR, which
//! aggregates per-channel enables against requests:
//! `irq = force OR (master AND (enable & request) != 0)`; the controller
//! raises the single DMA system interrupt when the aggregate goes high.
//! DICR's request bits are write-1-to-clear.

pub mod channel;
#[cfg(test)]
mod tests;

use crate::core::bus::Bus;
use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::interrupt::{Interrupt, InterruptController};
use crate::core::memory::Register;
use crate::core::savestate::SaveState;
use channel::{ChannelKind, ChannelTarget, DMAChannel};
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::rc::Rc;

pub use channel::ChannelKind as DmaChannelKind;

/// The DMA controller and its seven channels
pub struct DMAController {
    channels: [DMAChannel; 7],

    /// DPCR at 0x1F8010F0: per-channel priority and enable nibbles
    control: Register,

    /// DICR at 0x1F8010F4: interrupt enables, requests and the aggregate
    interrupt: Register,

    /// A CHCR write enabled a channel; the Bus kicks the engine once the
    /// register write unwinds
    pending_kick: bool,

    /// The aggregate went high during channel processing
    raise_irq: bool,

    interrupts: Rc<RefCell<InterruptController>>,
}

impl DMAController {
    /// DPCR reset value: ascending priorities in channel order
    const DPCR_RESET: u32 = 0x0765_4321;

    /// DICR force-IRQ bit
    const DICR_FORCE: u32 = 1 << 15;

    /// DICR master-enable bit
    const DICR_MASTER_ENABLE: u32 = 1 << 23;

    /// DICR aggregate flag bit
    const DICR_MASTER_FLAG: u32 = 1 << 31;

    pub fn new(
        interrupts: Rc<RefCell<InterruptController>>,
        gpu: Rc<RefCell<crate::core::gpu::GPU>>,
        mdec: Rc<RefCell<crate::core::mdec::MDEC>>,
        spu: Rc<RefCell<crate::core::spu::SPU>>,
        cdrom: Rc<RefCell<crate::core::cdrom::CDROM>>,
    ) -> Self {
        Self {
            channels: [
                DMAChannel::new(ChannelKind::MdecIn, ChannelTarget::Mdec(mdec.clone())),
                DMAChannel::new(ChannelKind::MdecOut, ChannelTarget::Mdec(mdec)),
                DMAChannel::new(ChannelKind::Gpu, ChannelTarget::Gpu(gpu)),
                DMAChannel::new(ChannelKind::CdRom, ChannelTarget::CdRom(cdrom)),
                DMAChannel::new(ChannelKind::Spu, ChannelTarget::Spu(spu)),
                DMAChannel::new(ChannelKind::Pio, ChannelTarget::None),
                DMAChannel::new(ChannelKind::Otc, ChannelTarget::None),
            ],
            control: Register::new(Self::DPCR_RESET),
            interrupt: Register::new(0),
            pending_kick: false,
            raise_irq: false,
            interrupts,
        }
    }

    /// The aggregate interrupt condition over the current DICR value
    pub fn interrupt_aggregate(&self) -> bool {
        let raw = self.interrupt.raw();
        let enabled = (raw >> 16) & 0x7F;
        let requested = (raw >> 24) & 0x7F;
        raw & Self::DICR_FORCE != 0
            || (raw & Self::DICR_MASTER_ENABLE != 0 && (enabled & requested) != 0)
    }

    /// Recompute the DICR aggregate flag bit
    fn update_master_flag(&mut self) {
        let raw = self.interrupt.raw();
        let flag = if self.interrupt_aggregate() {
            raw | Self::DICR_MASTER_FLAG
        } else {
            raw & !Self::DICR_MASTER_FLAG
        };
        self.interrupt.set_raw(flag);
    }

    /// Run one controller tick: every enabled channel, in priority order
    pub fn run(&mut self, bus: &mut Bus) -> Result<()> {
        // Priority queue over (priority, channel index); lower wins
        let mut queue: BinaryHeap<Reverse<(u32, u32)>> = BinaryHeap::new();
        for index in 0..7u32 {
            let priority = (self.control.raw() >> (index * 4)) & 0b111;
            queue.push(Reverse((priority, index)));
        }

        while let Some(Reverse((_, index))) = queue.pop() {
            let index = index as usize;

            // DPCR enable bit for this channel
            if self.control.raw() & (0b1000 << (index * 4)) != 0 {
                self.channels[index].run(bus)?;
            }

            if self.channels[index].take_interrupt_request() {
                // Latch the request if this channel's DICR enable is on
                if self.interrupt.raw() & (1 << (16 + index)) != 0 {
                    self.interrupt
                        .set_raw(self.interrupt.raw() | (1 << (24 + index)));

                    if self.interrupt_aggregate() {
                        self.raise_irq = true;
                    }
                }
            }
        }

        self.update_master_flag();

        if self.raise_irq {
            self.raise_irq = false;
            self.interrupts.borrow_mut().trigger(Interrupt::Dma);
        }

        Ok(())
    }

    /// Collect the immediate-kick request set by an enabling CHCR write
    pub fn take_pending_kick(&mut self) -> bool {
        let kick = self.pending_kick;
        self.pending_kick = false;
        kick
    }

    /// DPCR value (tests)
    pub fn control(&self) -> u32 {
        self.control.raw()
    }

    /// DICR value (tests)
    pub fn interrupt_register(&self) -> u32 {
        self.interrupt.raw()
    }

    /// Overwrite DICR wholesale to probe the aggregation formula
    #[cfg(test)]
    pub(crate) fn set_interrupt_register_for_test(&mut self, value: u32) {
        self.interrupt.set_raw(value);
    }
}

impl Component for DMAController {
    /// Registers only; the transfer engine runs through [`Self::run`],
    /// which needs the Bus
    fn execute(&mut self, _cycles: u32) {}

    fn read(&mut self, address: u32) -> u32 {
        match address {
            0..=111 => self.channels[(address / 16) as usize].read_lane(address & 0xF),
            112..=115 => self.control.read_lane(address - 112),
            116..=119 => self.interrupt.read_lane(address - 116),
            _ => unreachable!("DMA register read at 0x{:02X}", address),
        }
    }

    fn write(&mut self, address: u32, value: u32) {
        match address {
            0..=111 => {
                let kick = self.channels[(address / 16) as usize].write_lane(address & 0xF, value);
                if kick {
                    self.pending_kick = true;
                }
            }
            112..=115 => self.control.write_lane(address - 112, value),
            116..=119 => {
                let lane = address - 116;
                if lane <= 2 {
                    self.interrupt.write_lane(lane, value);
                } else {
                    // Request bits are write-1-to-clear
                    let current = self.interrupt.read_lane(3);
                    self.interrupt.write_lane(3, current & !value);
                }
                self.update_master_flag();
            }
            _ => unreachable!("DMA register write at 0x{:02X}", address),
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.control.set_raw(Self::DPCR_RESET);
        self.interrupt.set_raw(0);
        self.pending_kick = false;
        self.raise_irq = false;
    }

    fn serialize(&self, state: &mut SaveState) {
        for channel in &self.channels {
            channel.serialize(state);
        }
        state.push(&self.control.raw());
        state.push(&self.interrupt.raw());
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        for channel in &mut self.channels {
            channel.deserialize(state)?;
        }
        self.control.set_raw(state.pop()?);
        self.interrupt.set_raw(state.pop()?);
        self.pending_kick = false;
        self.raise_irq = false;
        Ok(())
    }
}
