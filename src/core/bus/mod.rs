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

//! The Bus: central dispatcher and component owner
//!
//! The Bus owns every hardware unit and all raw memory, routes every
//! memory access by physical address range to exactly one owner, and
//! drives the system clock. Shared peripherals live in `Rc<RefCell<_>>`
//! handles so the DMA engine and CPU can reach them through the Bus without
//! ownership cycles; the CPU and DMA controller are driven through cloned
//! handles so nothing re-borrows the Bus while it is held.
//!
//! # Memory Map (physical)
//!
//! | Range                  | Owner          |
//! |------------------------|----------------|
//! | 0x00000000-0x007FFFFF  | RAM (2MB, mirrored 4x) |
//! | 0x1F000000-0x1F7FFFFF  | Expansion 1 (unpopulated) |
//! | 0x1F800000-0x1F8003FF  | Scratchpad     |
//! | 0x1F801000-0x1F801023  | MemControl     |
//! | 0x1F801040-0x1F80104F  | Peripherals    |
//! | 0x1F801050-0x1F80105F  | SerialPort     |
//! | 0x1F801060-0x1F801063  | RamControl     |
//! | 0x1F801070-0x1F801077  | InterruptController |
//! | 0x1F801080-0x1F8010F7  | DMAController  |
//! | 0x1F801100-0x1F80112F  | Timers 0-2     |
//! | 0x1F801800-0x1F801803  | CD-ROM         |
//! | 0x1F801810-0x1F801817  | GPU (word port) |
//! | 0x1F801820-0x1F801827  | MDEC (word port) |
//! | 0x1F801C00-0x1F801FFF  | SPU            |
//! | 0x1F802000-0x1F80207F  | ExpansionPorts |
//! | 0x1FA00000-0x1FBFFFFF  | Expansion 3 (unpopulated) |
//! | 0x1FC00000-0x1FC7FFFF  | BIOS ROM       |
//! | 0x1FFE0000-0x1FFE01FF  | CacheControl   |
//!
//! KUSEG/KSEG0/KSEG1 all fold onto this space by masking the top three
//! address bits. An address outside every range is a fatal error: guest
//! code is assumed validated, so an unmapped access is an emulator bug.

#[cfg(test)]
mod tests;

use crate::core::cdrom::disc::Disc;
use crate::core::cdrom::CDROM;
use crate::core::component::{self, Component};
use crate::core::cpu::CPU;
use crate::core::dma::DMAController;
use crate::core::error::{CoreError, Result};
use crate::core::gpu::{DisplayInfo, GPU};
use crate::core::interrupt::InterruptController;
use crate::core::loader::Executable;
use crate::core::mdec::MDEC;
use crate::core::memctrl::{CacheControl, ExpansionPorts, MemControl, RamControl};
use crate::core::memory::MemoryRegion;
use crate::core::peripherals::Peripherals;
use crate::core::savestate::SaveState;
use crate::core::serial::SerialPort;
use crate::core::spu::SPU;
use crate::core::timer::{ClockSource, Timer};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Address-range owner, resolved per access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Ram,
    Expansion1,
    Scratchpad,
    MemControl,
    Peripherals,
    Serial,
    RamControl,
    Interrupts,
    Dma,
    Timer0,
    Timer1,
    Timer2,
    CdRom,
    Gpu,
    Mdec,
    Spu,
    ExpansionPorts,
    Expansion3,
    Bios,
    CacheControl,
    Unmapped,
}

/// The console
pub struct Bus {
    /// Main RAM (2MB, mirrored through an 8MB window)
    ram: MemoryRegion,

    /// BIOS ROM (512KB, read-only through the map)
    bios: MemoryRegion,

    /// Scratchpad (1KB fast RAM)
    scratchpad: MemoryRegion,

    cpu: Rc<RefCell<CPU>>,
    gpu: Rc<RefCell<GPU>>,
    spu: Rc<RefCell<SPU>>,
    mdec: Rc<RefCell<MDEC>>,
    cdrom: Rc<RefCell<CDROM>>,
    dma: Rc<RefCell<DMAController>>,
    timers: [Rc<RefCell<Timer>>; 3],
    interrupts: Rc<RefCell<InterruptController>>,
    peripherals: Rc<RefCell<Peripherals>>,
    serial: Rc<RefCell<SerialPort>>,
    mem_control: Rc<RefCell<MemControl>>,
    ram_control: Rc<RefCell<RamControl>>,
    cache_control: Rc<RefCell<CacheControl>>,
    expansion_ports: Rc<RefCell<ExpansionPorts>>,

    /// GPU clock remainder (the GPU runs at 22/7 of the CPU clock)
    gpu_cycle_remainder: u32,

    /// Single-shot frame-completion latch
    vblank_flag: bool,
}

impl Bus {
    /// RAM size (2MB)
    pub const RAM_SIZE: u32 = 2 * 1024 * 1024;

    /// BIOS size (512KB)
    pub const BIOS_SIZE: u32 = 512 * 1024;

    /// Scratchpad size (1KB)
    pub const SCRATCHPAD_SIZE: u32 = 1024;

    /// CPU cycles advanced per `execute` batch by the frame loop
    pub const BATCH_CYCLES: u32 = 128;

    /// GPU clock ratio relative to the CPU clock, as a rational
    const GPU_CLOCK_NUM: u32 = 22;
    const GPU_CLOCK_DEN: u32 = 7;

    /// Build the console; the construction order here fixes the save-state
    /// stream order
    pub fn new() -> Self {
        let interrupts = Rc::new(RefCell::new(InterruptController::new()));
        let cpu = Rc::new(RefCell::new(CPU::new()));
        let gpu = Rc::new(RefCell::new(GPU::new(interrupts.clone())));
        let spu = Rc::new(RefCell::new(SPU::new()));
        let mdec = Rc::new(RefCell::new(MDEC::new()));
        let cdrom = Rc::new(RefCell::new(CDROM::new(interrupts.clone())));
        let dma = Rc::new(RefCell::new(DMAController::new(
            interrupts.clone(),
            gpu.clone(),
            mdec.clone(),
            spu.clone(),
            cdrom.clone(),
        )));
        let timers = [
            Rc::new(RefCell::new(Timer::new(
                ClockSource::DotClock,
                interrupts.clone(),
            ))),
            Rc::new(RefCell::new(Timer::new(
                ClockSource::HBlank,
                interrupts.clone(),
            ))),
            Rc::new(RefCell::new(Timer::new(
                ClockSource::SystemClock,
                interrupts.clone(),
            ))),
        ];
        let peripherals = Rc::new(RefCell::new(Peripherals::new(interrupts.clone())));

        Self {
            ram: MemoryRegion::new(Self::RAM_SIZE as usize),
            bios: MemoryRegion::new(Self::BIOS_SIZE as usize),
            scratchpad: MemoryRegion::new(Self::SCRATCHPAD_SIZE as usize),
            cpu,
            gpu,
            spu,
            mdec,
            cdrom,
            dma,
            timers,
            interrupts,
            peripherals,
            serial: Rc::new(RefCell::new(SerialPort::new())),
            mem_control: Rc::new(RefCell::new(MemControl::new())),
            ram_control: Rc::new(RefCell::new(RamControl::new())),
            cache_control: Rc::new(RefCell::new(CacheControl::new())),
            expansion_ports: Rc::new(RefCell::new(ExpansionPorts::new())),
            gpu_cycle_remainder: 0,
            vblank_flag: false,
        }
    }

    /// Reset the whole console; BIOS contents survive
    pub fn reset(&mut self) {
        self.cpu.borrow_mut().reset();
        self.gpu.borrow_mut().reset();
        self.spu.borrow_mut().reset();
        self.mdec.borrow_mut().reset();
        self.cdrom.borrow_mut().reset();
        self.dma.borrow_mut().reset();
        for timer in &self.timers {
            timer.borrow_mut().reset();
        }
        self.interrupts.borrow_mut().reset();
        self.peripherals.borrow_mut().reset();
        self.serial.borrow_mut().reset();
        self.mem_control.borrow_mut().reset();
        self.ram_control.borrow_mut().reset();
        self.cache_control.borrow_mut().reset();
        self.expansion_ports.borrow_mut().reset();
        self.ram.clear();
        self.scratchpad.clear();
        self.gpu_cycle_remainder = 0;
        self.vblank_flag = false;
    }

    /// Fold KUSEG/KSEG0/KSEG1 onto the physical space
    #[inline(always)]
    fn translate(address: u32) -> u32 {
        address & 0x1FFF_FFFF
    }

    /// Resolve a physical address to its owning region and local offset
    fn identify(paddr: u32) -> (Region, u32) {
        match paddr {
            0x0000_0000..=0x007F_FFFF => (Region::Ram, paddr % Self::RAM_SIZE),
            0x1F00_0000..=0x1F7F_FFFF => (Region::Expansion1, paddr - 0x1F00_0000),
            0x1F80_0000..=0x1F80_03FF => (Region::Scratchpad, paddr - 0x1F80_0000),
            0x1F80_1000..=0x1F80_1023 => (Region::MemControl, paddr - 0x1F80_1000),
            0x1F80_1040..=0x1F80_104F => (Region::Peripherals, paddr - 0x1F80_1040),
            0x1F80_1050..=0x1F80_105F => (Region::Serial, paddr - 0x1F80_1050),
            0x1F80_1060..=0x1F80_1063 => (Region::RamControl, paddr - 0x1F80_1060),
            0x1F80_1070..=0x1F80_1077 => (Region::Interrupts, paddr - 0x1F80_1070),
            0x1F80_1080..=0x1F80_10F7 => (Region::Dma, paddr - 0x1F80_1080),
            0x1F80_1100..=0x1F80_110F => (Region::Timer0, paddr - 0x1F80_1100),
            0x1F80_1110..=0x1F80_111F => (Region::Timer1, paddr - 0x1F80_1110),
            0x1F80_1120..=0x1F80_112F => (Region::Timer2, paddr - 0x1F80_1120),
            0x1F80_1800..=0x1F80_1803 => (Region::CdRom, paddr - 0x1F80_1800),
            0x1F80_1810..=0x1F80_1817 => (Region::Gpu, paddr - 0x1F80_1810),
            0x1F80_1820..=0x1F80_1827 => (Region::Mdec, paddr - 0x1F80_1820),
            0x1F80_1C00..=0x1F80_1FFF => (Region::Spu, paddr - 0x1F80_1C00),
            0x1F80_2000..=0x1F80_207F => (Region::ExpansionPorts, paddr - 0x1F80_2000),
            0x1FA0_0000..=0x1FBF_FFFF => (Region::Expansion3, paddr - 0x1FA0_0000),
            0x1FC0_0000..=0x1FC7_FFFF => (Region::Bios, paddr - 0x1FC0_0000),
            0x1FFE_0000..=0x1FFE_01FF => (Region::CacheControl, paddr - 0x1FFE_0000),
            _ => (Region::Unmapped, paddr),
        }
    }

    /// Byte-lane-addressed register-block component for a region
    fn io_component(&self, region: Region) -> Option<&RefCell<dyn Component>> {
        Some(match region {
            Region::MemControl => &*self.mem_control,
            Region::Peripherals => &*self.peripherals,
            Region::Serial => &*self.serial,
            Region::RamControl => &*self.ram_control,
            Region::Interrupts => &*self.interrupts,
            Region::Dma => &*self.dma,
            Region::Timer0 => &*self.timers[0],
            Region::Timer1 => &*self.timers[1],
            Region::Timer2 => &*self.timers[2],
            Region::CdRom => &*self.cdrom,
            Region::Spu => &*self.spu,
            Region::ExpansionPorts => &*self.expansion_ports,
            Region::CacheControl => &*self.cache_control,
            _ => return None,
        })
    }

    /// Word-ported component (GPU/MDEC) for a region
    fn word_component(&self, region: Region) -> Option<&RefCell<dyn Component>> {
        Some(match region {
            Region::Gpu => &*self.gpu,
            Region::Mdec => &*self.mdec,
            _ => return None,
        })
    }

    pub fn read8(&mut self, address: u32) -> Result<u8> {
        let paddr = Self::translate(address);
        let (region, offset) = Self::identify(paddr);

        match region {
            Region::Ram => Ok(self.ram.read8(offset)),
            Region::Scratchpad => Ok(self.scratchpad.read8(offset)),
            Region::Bios => Ok(self.bios.read8(offset)),
            // Expansion 1 is unpopulated; the ROM-header probe reads zero
            // so the BIOS does not chase a bogus entry point
            Region::Expansion1 => Ok(if offset < 0x100 { 0x00 } else { 0xFF }),
            Region::Expansion3 => Ok(0xFF),
            Region::Unmapped => Err(CoreError::UnmappedRead { address }),
            _ => {
                if let Some(comp) = self.io_component(region) {
                    Ok(comp.borrow_mut().read(offset) as u8)
                } else if let Some(comp) = self.word_component(region) {
                    let word = comp.borrow_mut().read(offset & !3);
                    Ok((word >> ((offset & 3) * 8)) as u8)
                } else {
                    Err(CoreError::UnmappedRead { address })
                }
            }
        }
    }

    pub fn read16(&mut self, address: u32) -> Result<u16> {
        let paddr = Self::translate(address);
        let (region, offset) = Self::identify(paddr);

        match region {
            Region::Ram => Ok(self.ram.read16(offset)),
            Region::Scratchpad => Ok(self.scratchpad.read16(offset)),
            Region::Bios => Ok(self.bios.read16(offset)),
            Region::Expansion1 => Ok(if offset < 0x100 { 0x0000 } else { 0xFFFF }),
            Region::Expansion3 => Ok(0xFFFF),
            Region::Unmapped => Err(CoreError::UnmappedRead { address }),
            _ => {
                if let Some(comp) = self.io_component(region) {
                    Ok(component::read16(&mut *comp.borrow_mut(), offset))
                } else if let Some(comp) = self.word_component(region) {
                    let word = comp.borrow_mut().read(offset & !3);
                    Ok((word >> ((offset & 2) * 8)) as u16)
                } else {
                    Err(CoreError::UnmappedRead { address })
                }
            }
        }
    }

    pub fn read32(&mut self, address: u32) -> Result<u32> {
        let paddr = Self::translate(address);
        let (region, offset) = Self::identify(paddr);

        match region {
            Region::Ram => Ok(self.ram.read32(offset)),
            Region::Scratchpad => Ok(self.scratchpad.read32(offset)),
            Region::Bios => Ok(self.bios.read32(offset)),
            Region::Expansion1 => Ok(if offset < 0x100 { 0x0000_0000 } else { 0xFFFF_FFFF }),
            Region::Expansion3 => Ok(0xFFFF_FFFF),
            Region::Unmapped => Err(CoreError::UnmappedRead { address }),
            _ => {
                if let Some(comp) = self.word_component(region) {
                    Ok(comp.borrow_mut().read(offset))
                } else if let Some(comp) = self.io_component(region) {
                    Ok(component::read32(&mut *comp.borrow_mut(), offset))
                } else {
                    Err(CoreError::UnmappedRead { address })
                }
            }
        }
    }

    pub fn write8(&mut self, address: u32, value: u8) -> Result<()> {
        let paddr = Self::translate(address);
        let (region, offset) = Self::identify(paddr);

        match region {
            Region::Ram => self.ram.write8(offset, value),
            Region::Scratchpad => self.scratchpad.write8(offset, value),
            Region::Bios => log::trace!("write to BIOS ROM at 0x{:08X} ignored", address),
            Region::Expansion1 | Region::Expansion3 => {
                log::trace!("expansion write8 at 0x{:08X} ignored", address)
            }
            Region::Unmapped => {
                return Err(CoreError::UnmappedWrite {
                    address,
                    value: value as u32,
                })
            }
            _ => {
                if let Some(comp) = self.io_component(region) {
                    comp.borrow_mut().write(offset, value as u32);
                } else if let Some(comp) = self.word_component(region) {
                    comp.borrow_mut().write(offset & !3, value as u32);
                }
                self.kick_dma_if_requested(region)?;
            }
        }

        Ok(())
    }

    pub fn write16(&mut self, address: u32, value: u16) -> Result<()> {
        let paddr = Self::translate(address);
        let (region, offset) = Self::identify(paddr);

        match region {
            Region::Ram => self.ram.write16(offset, value),
            Region::Scratchpad => self.scratchpad.write16(offset, value),
            Region::Bios => log::trace!("write to BIOS ROM at 0x{:08X} ignored", address),
            Region::Expansion1 | Region::Expansion3 => {
                log::trace!("expansion write16 at 0x{:08X} ignored", address)
            }
            Region::Unmapped => {
                return Err(CoreError::UnmappedWrite {
                    address,
                    value: value as u32,
                })
            }
            _ => {
                if let Some(comp) = self.io_component(region) {
                    component::write16(&mut *comp.borrow_mut(), offset, value);
                } else if let Some(comp) = self.word_component(region) {
                    comp.borrow_mut().write(offset & !3, value as u32);
                }
                self.kick_dma_if_requested(region)?;
            }
        }

        Ok(())
    }

    pub fn write32(&mut self, address: u32, value: u32) -> Result<()> {
        let paddr = Self::translate(address);
        let (region, offset) = Self::identify(paddr);

        match region {
            Region::Ram => self.ram.write32(offset, value),
            Region::Scratchpad => self.scratchpad.write32(offset, value),
            Region::Bios => log::trace!("write to BIOS ROM at 0x{:08X} ignored", address),
            Region::Expansion1 | Region::Expansion3 => {
                log::trace!("expansion write32 at 0x{:08X} ignored", address)
            }
            Region::Unmapped => return Err(CoreError::UnmappedWrite { address, value }),
            _ => {
                if let Some(comp) = self.word_component(region) {
                    comp.borrow_mut().write(offset, value);
                } else if let Some(comp) = self.io_component(region) {
                    component::write32(&mut *comp.borrow_mut(), offset, value);
                }
                self.kick_dma_if_requested(region)?;
            }
        }

        Ok(())
    }

    /// A CHCR write that enabled a channel starts its transfer as soon as
    /// the register write itself has unwound
    fn kick_dma_if_requested(&mut self, region: Region) -> Result<()> {
        if region != Region::Dma {
            return Ok(());
        }

        let kick = self.dma.borrow_mut().take_pending_kick();
        if kick {
            let dma = self.dma.clone();
            dma.borrow_mut().run(self)?;
        }
        Ok(())
    }

    /// Advance the whole console by `steps` CPU cycles
    ///
    /// The CPU runs every cycle; DMA and the CD-ROM controller tick once
    /// per batch; the GPU advances at its 22/7 clock ratio; timers and
    /// peripherals get the raw cycle count.
    pub fn execute(&mut self, steps: u32) -> Result<()> {
        let cpu = self.cpu.clone();
        {
            let mut cpu = cpu.borrow_mut();
            for _ in 0..steps {
                let pending = self.interrupts.borrow().pending();
                cpu.cop0_mut().set_interrupt_pending(pending as u32);
                cpu.step(self)?;
            }
        }

        let dma = self.dma.clone();
        dma.borrow_mut().run(self)?;

        for timer in &self.timers {
            timer.borrow_mut().execute(steps);
        }

        self.cdrom.borrow_mut().execute(steps);

        let gpu_cycles = {
            let total = self.gpu_cycle_remainder + steps * Self::GPU_CLOCK_NUM;
            self.gpu_cycle_remainder = total % Self::GPU_CLOCK_DEN;
            total / Self::GPU_CLOCK_DEN
        };
        {
            let mut gpu = self.gpu.borrow_mut();
            gpu.execute(gpu_cycles);
            if gpu.take_frame_complete() {
                self.vblank_flag = true;
            }
        }

        self.peripherals.borrow_mut().execute(steps);

        Ok(())
    }

    /// Run batches until the GPU signals a completed frame
    pub fn run_until_vblank(&mut self) -> Result<()> {
        while !self.vblank_flag {
            self.execute(Self::BATCH_CYCLES)?;
        }
        self.vblank_flag = false;
        Ok(())
    }

    /// Single-shot vblank latch
    pub fn take_vblank(&mut self) -> bool {
        let flag = self.vblank_flag;
        self.vblank_flag = false;
        flag
    }

    /// Load the BIOS image; must be exactly 512KB
    pub fn load_bios<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let image = fs::read(&path)
            .map_err(|_| CoreError::BiosNotFound(path.as_ref().display().to_string()))?;

        if image.len() != Self::BIOS_SIZE as usize {
            return Err(CoreError::InvalidBiosSize {
                expected: Self::BIOS_SIZE as usize,
                got: image.len(),
            });
        }

        self.bios.bytes_mut().copy_from_slice(&image);
        log::info!("BIOS loaded from {}", path.as_ref().display());
        Ok(())
    }

    /// Place a parsed executable in RAM and point the CPU at it
    pub fn load_executable(&mut self, executable: &Executable) -> Result<()> {
        for (i, byte) in executable.text.iter().enumerate() {
            self.write8(executable.load_address.wrapping_add(i as u32), *byte)?;
        }

        // Zero the BSS region the header declares
        for i in 0..executable.bss_size {
            self.write8(executable.bss_address.wrapping_add(i), 0)?;
        }

        let sp = executable.stack_base.wrapping_add(executable.stack_offset);
        self.cpu
            .borrow_mut()
            .apply_executable_entry(executable.pc, executable.gp, sp);

        log::info!(
            "executable loaded at 0x{:08X}, entry 0x{:08X}",
            executable.load_address,
            executable.pc,
        );
        Ok(())
    }

    /// Insert a disc image into the drive
    pub fn insert_disc(&mut self, disc: Disc) {
        self.cdrom.borrow_mut().insert_disc(disc);
    }

    /// Snapshot surface: the raw VRAM pixels
    pub fn vram_snapshot(&self) -> Vec<u16> {
        self.gpu.borrow().vram().to_vec()
    }

    /// Display cutout for the frontend blit
    pub fn display_info(&self) -> DisplayInfo {
        self.gpu.borrow().display_info()
    }

    /// Refresh rate of the selected video standard (frame pacing)
    pub fn refresh_rate(&self) -> f32 {
        self.gpu.borrow().refresh_rate()
    }

    /// CPU handle (tests, loaders, debug surfaces)
    pub fn cpu(&self) -> Rc<RefCell<CPU>> {
        self.cpu.clone()
    }

    /// GPU handle
    pub fn gpu(&self) -> Rc<RefCell<GPU>> {
        self.gpu.clone()
    }

    /// Peripherals handle (host input feeds button state through this)
    pub fn peripherals(&self) -> Rc<RefCell<Peripherals>> {
        self.peripherals.clone()
    }

    /// Interrupt controller handle
    pub fn interrupts(&self) -> Rc<RefCell<InterruptController>> {
        self.interrupts.clone()
    }

    /// DMA controller handle (tests)
    pub fn dma(&self) -> Rc<RefCell<DMAController>> {
        self.dma.clone()
    }

    /// CD-ROM handle
    pub fn cdrom(&self) -> Rc<RefCell<CDROM>> {
        self.cdrom.clone()
    }

    /// Serialize the whole console
    ///
    /// The component order mirrors construction order exactly; the stream
    /// is positional with no tags, so this order is the format.
    pub fn save_state(&self) -> SaveState {
        let mut state = SaveState::new();

        self.cpu.borrow().serialize(&mut state);
        self.gpu.borrow().serialize(&mut state);
        self.spu.borrow().serialize(&mut state);
        self.mdec.borrow().serialize(&mut state);
        self.cdrom.borrow().serialize(&mut state);
        self.dma.borrow().serialize(&mut state);
        for timer in &self.timers {
            timer.borrow().serialize(&mut state);
        }
        self.interrupts.borrow().serialize(&mut state);
        self.peripherals.borrow().serialize(&mut state);
        self.serial.borrow().serialize(&mut state);
        self.mem_control.borrow().serialize(&mut state);
        self.ram_control.borrow().serialize(&mut state);
        self.cache_control.borrow().serialize(&mut state);
        self.expansion_ports.borrow().serialize(&mut state);

        state.push(&self.ram.bytes().to_vec());
        state.push(&self.bios.bytes().to_vec());
        state.push(&self.scratchpad.bytes().to_vec());
        state.push(&self.gpu_cycle_remainder);
        state.push(&self.vblank_flag);

        state
    }

    /// Restore the whole console from a save-state stream
    pub fn load_state(&mut self, state: &mut SaveState) -> Result<()> {
        self.cpu.borrow_mut().deserialize(state)?;
        self.gpu.borrow_mut().deserialize(state)?;
        self.spu.borrow_mut().deserialize(state)?;
        self.mdec.borrow_mut().deserialize(state)?;
        self.cdrom.borrow_mut().deserialize(state)?;
        self.dma.borrow_mut().deserialize(state)?;
        for timer in &self.timers {
            timer.borrow_mut().deserialize(state)?;
        }
        self.interrupts.borrow_mut().deserialize(state)?;
        self.peripherals.borrow_mut().deserialize(state)?;
        self.serial.borrow_mut().deserialize(state)?;
        self.mem_control.borrow_mut().deserialize(state)?;
        self.ram_control.borrow_mut().deserialize(state)?;
        self.cache_control.borrow_mut().deserialize(state)?;
        self.expansion_ports.borrow_mut().deserialize(state)?;

        let ram: Vec<u8> = state.pop()?;
        self.ram.bytes_mut().copy_from_slice(&ram);
        let bios: Vec<u8> = state.pop()?;
        self.bios.bytes_mut().copy_from_slice(&bios);
        let scratchpad: Vec<u8> = state.pop()?;
        self.scratchpad.bytes_mut().copy_from_slice(&scratchpad);
        self.gpu_cycle_remainder = state.pop()?;
        self.vblank_flag = state.pop()?;

        Ok(())
    }

    /// Write directly into BIOS ROM (test fixtures only)
    #[cfg(test)]
    pub(crate) fn write_bios_for_test(&mut self, offset: usize, data: &[u8]) {
        self.bios.bytes_mut()[offset..offset + data.len()].copy_from_slice(data);
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
