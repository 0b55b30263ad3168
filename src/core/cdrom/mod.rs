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

//! CD-ROM drive
//!
//! Four byte-wide registers multiplexed through an index register carry the
//! whole protocol: commands go in with parameters through their FIFOs,
//! responses come back with an INT level in the interrupt-flag register,
//! and sector data drains through the data FIFO (normally via DMA channel
//! 3). Command responses are delivered with a delay measured in controller
//! ticks, one tick per Bus batch, and queue up behind an unacknowledged
//! interrupt the way the hardware serializes them.

pub mod disc;

use crate::core::component::Component;
use crate::core::error::Result;
use crate::core::interrupt::{Interrupt, InterruptController};
use crate::core::savestate::SaveState;
use disc::{bcd_to_binary, Disc, Position, Sector};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One queued command response
struct PendingResponse {
    /// Controller ticks until delivery
    delay: u32,
    /// INT level (1-5)
    level: u8,
    bytes: Vec<u8>,
}

/// CD-ROM controller
pub struct CDROM {
    interrupts: Rc<RefCell<InterruptController>>,

    /// Register bank index (0-3)
    index: u8,

    parameter_fifo: VecDeque<u8>,
    response_fifo: VecDeque<u8>,
    data_fifo: VecDeque<u8>,

    interrupt_enable: u8,
    /// INT level of the response currently latched (0 = none)
    interrupt_flag: u8,

    pending: VecDeque<PendingResponse>,

    disc: Option<Disc>,

    /// Target set by Setloc, consumed by reads and seeks
    seek_target: Position,
    /// Current read head position
    read_position: Position,

    /// Mode register (Setmode); bit 5 selects whole-sector reads
    mode: u8,

    reading: bool,
    motor_on: bool,

    /// Ticks until the next sector is delivered while reading
    read_countdown: u32,

    /// Last raw sector, armed into the data FIFO by the request register
    current_sector: Vec<u8>,
}

impl CDROM {
    /// Controller ticks between sector deliveries while reading
    const READ_DELAY: u32 = 4;

    /// Controller ticks for an average command response
    const RESPONSE_DELAY: u32 = 2;

    /// Status byte bits
    const STAT_MOTOR_ON: u8 = 1 << 1;
    const STAT_SEEK_ERROR: u8 = 1 << 2;
    const STAT_SHELL_OPEN: u8 = 1 << 4;
    const STAT_READING: u8 = 1 << 5;

    pub fn new(interrupts: Rc<RefCell<InterruptController>>) -> Self {
        Self {
            interrupts,
            index: 0,
            parameter_fifo: VecDeque::new(),
            response_fifo: VecDeque::new(),
            data_fifo: VecDeque::new(),
            interrupt_enable: 0,
            interrupt_flag: 0,
            pending: VecDeque::new(),
            disc: None,
            seek_target: Position::from_lba(0),
            read_position: Position::from_lba(0),
            mode: 0,
            reading: false,
            motor_on: true,
            read_countdown: 0,
            current_sector: Vec::new(),
        }
    }

    /// Insert a disc image
    pub fn insert_disc(&mut self, disc: Disc) {
        self.disc = Some(disc);
        self.motor_on = true;
    }

    pub fn has_disc(&self) -> bool {
        self.disc.is_some()
    }

    /// Drive status byte
    fn status_byte(&self) -> u8 {
        let mut status = 0;
        if self.motor_on {
            status |= Self::STAT_MOTOR_ON;
        }
        if self.disc.is_none() {
            status |= Self::STAT_SHELL_OPEN;
        }
        if self.reading {
            status |= Self::STAT_READING;
        }
        status
    }

    /// Queue a response for delayed delivery
    fn respond(&mut self, delay: u32, level: u8, bytes: Vec<u8>) {
        self.pending.push_back(PendingResponse {
            delay,
            level,
            bytes,
        });
    }

    /// Execute a command byte
    fn command(&mut self, command: u8) {
        let stat = self.status_byte();
        log::debug!("CDROM command 0x{:02X} (stat 0x{:02X})", command, stat);

        match command {
            // GetStat
            0x01 => self.respond(Self::RESPONSE_DELAY, 3, vec![stat]),
            // Setloc(mm, ss, ff)
            0x02 => {
                let minutes = bcd_to_binary(self.parameter_fifo.pop_front().unwrap_or(0));
                let seconds = bcd_to_binary(self.parameter_fifo.pop_front().unwrap_or(0));
                let fractions = bcd_to_binary(self.parameter_fifo.pop_front().unwrap_or(0));
                self.seek_target = Position {
                    minutes: minutes as u32,
                    seconds: seconds as u32,
                    fractions: fractions as u32,
                };
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat]);
            }
            // ReadN
            0x06 => {
                self.read_position = self.seek_target;
                self.reading = true;
                self.read_countdown = Self::READ_DELAY;
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat | Self::STAT_READING]);
            }
            // Stop / Pause
            0x08 | 0x09 => {
                self.reading = false;
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat]);
                let stopped = self.status_byte() & !Self::STAT_READING;
                self.respond(Self::RESPONSE_DELAY * 2, 2, vec![stopped]);
            }
            // Init
            0x0A => {
                self.mode = 0;
                self.reading = false;
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat]);
                self.respond(Self::RESPONSE_DELAY * 2, 2, vec![self.status_byte()]);
            }
            // Demute (no audio path, acknowledged for protocol flow)
            0x0C => self.respond(Self::RESPONSE_DELAY, 3, vec![stat]),
            // Setmode
            0x0E => {
                self.mode = self.parameter_fifo.pop_front().unwrap_or(0);
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat]);
            }
            // SeekL
            0x15 => {
                self.read_position = self.seek_target;
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat]);
                self.respond(Self::RESPONSE_DELAY * 2, 2, vec![self.status_byte()]);
            }
            // Test: sub-function 0x20 returns the controller version
            0x19 => {
                let sub = self.parameter_fifo.pop_front().unwrap_or(0);
                if sub == 0x20 {
                    self.respond(Self::RESPONSE_DELAY, 3, vec![0x94, 0x09, 0x19, 0xC0]);
                } else {
                    log::warn!("CDROM test sub-function 0x{:02X}", sub);
                    self.respond(Self::RESPONSE_DELAY, 5, vec![stat | 1, 0x10]);
                }
            }
            // GetID
            0x1A => {
                self.respond(Self::RESPONSE_DELAY, 3, vec![stat]);
                if self.has_disc() {
                    // Licensed disc, region SCEA
                    self.respond(
                        Self::RESPONSE_DELAY * 2,
                        2,
                        vec![0x02, 0x00, 0x20, 0x00, b'S', b'C', b'E', b'A'],
                    );
                } else {
                    self.respond(
                        Self::RESPONSE_DELAY * 2,
                        5,
                        vec![0x08, 0x40, 0, 0, 0, 0, 0, 0],
                    );
                }
            }
            _ => {
                log::warn!("CDROM unknown command 0x{:02X}", command);
                self.respond(Self::RESPONSE_DELAY, 5, vec![stat | 1, 0x40]);
            }
        }

        self.parameter_fifo.clear();
    }

    /// Deliver one sector while reading
    fn deliver_sector(&mut self) {
        let Some(disc) = &self.disc else {
            self.reading = false;
            return;
        };

        match disc.read_sector(self.read_position) {
            Ok(sector) => {
                self.current_sector = sector.data;
                let next = self.read_position.lba() + 1;
                self.read_position = Position::from_lba(next);

                let stat = self.status_byte();
                self.respond(0, 1, vec![stat]);
            }
            Err(e) => {
                log::warn!("CDROM read failed: {e}");
                self.reading = false;
                let stat = self.status_byte() | Self::STAT_SEEK_ERROR;
                self.respond(0, 5, vec![stat, 0x04]);
            }
        }
    }

    /// Arm the data FIFO with the last delivered sector
    fn request_data(&mut self) {
        if self.current_sector.is_empty() {
            return;
        }

        self.data_fifo.clear();

        // Mode bit 5: whole 0x924-byte sector after sync, else the
        // 2048-byte payload
        if self.mode & (1 << 5) != 0 {
            self.data_fifo
                .extend(&self.current_sector[12..12 + 0x924]);
        } else {
            self.data_fifo.extend(
                &self.current_sector[Sector::HEADER_SIZE..Sector::HEADER_SIZE + Sector::DATA_SIZE],
            );
        }
    }

    /// Pop one data byte (CPU read or DMA channel 3)
    pub fn pop_data(&mut self) -> u8 {
        self.data_fifo.pop_front().unwrap_or(0)
    }

    /// Status/index register (read at offset 0)
    fn read_index_register(&self) -> u8 {
        let mut value = self.index;
        value |= (self.parameter_fifo.is_empty() as u8) << 3;
        value |= ((self.parameter_fifo.len() < 16) as u8) << 4;
        value |= (!self.response_fifo.is_empty() as u8) << 5;
        value |= (!self.data_fifo.is_empty() as u8) << 6;
        value
    }
}

impl Component for CDROM {
    /// One controller tick per Bus batch: delivers due responses (one at a
    /// time, serialized behind interrupt acknowledgment) and paces sector
    /// reads
    fn execute(&mut self, _cycles: u32) {
        if self.reading {
            if self.read_countdown == 0 {
                self.read_countdown = Self::READ_DELAY;
                self.deliver_sector();
            } else {
                self.read_countdown -= 1;
            }
        }

        let due = match self.pending.front_mut() {
            Some(head) if head.delay > 0 => {
                head.delay -= 1;
                false
            }
            Some(_) => self.interrupt_flag == 0,
            None => false,
        };

        if due {
            if let Some(response) = self.pending.pop_front() {
                self.response_fifo.extend(response.bytes.iter());
                self.interrupt_flag = response.level;

                if self.interrupt_enable & (1 << (response.level - 1)) != 0 {
                    self.interrupts.borrow_mut().trigger(Interrupt::CdRom);
                }
            }
        }
    }

    fn read(&mut self, address: u32) -> u32 {
        let value = match address & 3 {
            0 => self.read_index_register(),
            1 => self.response_fifo.pop_front().unwrap_or(0),
            2 => self.pop_data(),
            _ => match self.index {
                0 | 2 => self.interrupt_enable | 0xE0,
                _ => self.interrupt_flag | 0xE0,
            },
        };
        value as u32
    }

    fn write(&mut self, address: u32, value: u32) {
        let value = value as u8;

        match (address & 3, self.index) {
            (0, _) => self.index = value & 3,
            (1, 0) => self.command(value),
            (1, _) => log::trace!("CDROM write reg1.{} = 0x{:02X}", self.index, value),
            (2, 0) => {
                if self.parameter_fifo.len() < 16 {
                    self.parameter_fifo.push_back(value);
                }
            }
            (2, 1) => self.interrupt_enable = value & 0x1F,
            (2, _) => log::trace!("CDROM write reg2.{} = 0x{:02X}", self.index, value),
            (3, 0) => {
                // Request register: bit 7 arms the data FIFO
                if value & 0x80 != 0 {
                    self.request_data();
                } else {
                    self.data_fifo.clear();
                }
            }
            (3, 1) => {
                // Acknowledge: clear the written flag bits
                self.interrupt_flag &= !(value & 0x1F);
                if value & 0x40 != 0 {
                    self.parameter_fifo.clear();
                }
            }
            (_, _) => log::trace!("CDROM write reg3.{} = 0x{:02X}", self.index, value),
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.parameter_fifo.clear();
        self.response_fifo.clear();
        self.data_fifo.clear();
        self.interrupt_enable = 0;
        self.interrupt_flag = 0;
        self.pending.clear();
        self.seek_target = Position::from_lba(0);
        self.read_position = Position::from_lba(0);
        self.mode = 0;
        self.reading = false;
        self.motor_on = true;
        self.read_countdown = 0;
        self.current_sector.clear();
    }

    fn serialize(&self, state: &mut SaveState) {
        state.push(&self.index);
        state.push(&self.parameter_fifo.iter().copied().collect::<Vec<u8>>());
        state.push(&self.response_fifo.iter().copied().collect::<Vec<u8>>());
        state.push(&self.data_fifo.iter().copied().collect::<Vec<u8>>());
        state.push(&self.interrupt_enable);
        state.push(&self.interrupt_flag);
        state.push(&self.seek_target.lba());
        state.push(&self.read_position.lba());
        state.push(&self.mode);
        state.push(&self.reading);
        state.push(&self.motor_on);
        state.push(&self.read_countdown);
        state.push(&self.current_sector);
    }

    fn deserialize(&mut self, state: &mut SaveState) -> Result<()> {
        self.index = state.pop()?;
        let params: Vec<u8> = state.pop()?;
        self.parameter_fifo = params.into();
        let responses: Vec<u8> = state.pop()?;
        self.response_fifo = responses.into();
        let data: Vec<u8> = state.pop()?;
        self.data_fifo = data.into();
        self.interrupt_enable = state.pop()?;
        self.interrupt_flag = state.pop()?;
        self.seek_target = Position::from_lba(state.pop()?);
        self.read_position = Position::from_lba(state.pop()?);
        self.mode = state.pop()?;
        self.reading = state.pop()?;
        self.motor_on = state.pop()?;
        self.read_countdown = state.pop()?;
        self.current_sector = state.pop()?;
        // In-flight delayed responses are not carried across a save
        self.pending.clear();
        Ok(())
    }
}
