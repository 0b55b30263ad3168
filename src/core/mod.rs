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

//! Core emulation components
//!
//! This module contains all hardware emulation components:
//! - Bus (central dispatcher owning every unit)
//! - CPU (MIPS R3000A)
//! - GPU (command FIFO interpreter + software rasterizer)
//! - DMA controller and its seven channels
//! - MDEC (macroblock decoder)
//! - SPU, CD-ROM, timers, interrupt and peripheral controllers
//! - Save-state serialization and executable loading

pub mod bus;
pub mod cdrom;
pub mod component;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod gpu;
pub mod interrupt;
pub mod loader;
pub mod mdec;
pub mod memctrl;
pub mod memory;
pub mod peripherals;
pub mod savestate;
pub mod serial;
pub mod spu;
pub mod timer;

// Re-export commonly used types
pub use bus::Bus;
pub use component::Component;
pub use cpu::CPU;
pub use dma::DMAController;
pub use error::{CoreError, Result};
pub use gpu::GPU;
pub use interrupt::InterruptController;
pub use mdec::MDEC;
pub use savestate::SaveState;
pub use spu::SPU;
