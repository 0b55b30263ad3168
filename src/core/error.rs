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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for the emulator
///
/// Two classes live here. Configuration/IO errors (missing BIOS, short EXE,
/// bad disc image) are reportable conditions the binary surfaces before
/// exiting. The `Unmapped*`/`UnsupportedInstruction`/`Internal` variants are
/// invariant violations: guest code is assumed validated, so hitting one of
/// them is an emulator bug and there is no recovery path.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("BIOS file not found: {0}")]
    BiosNotFound(String),

    #[error("Invalid BIOS size: {got} bytes (expected {expected})")]
    InvalidBiosSize { expected: usize, got: usize },

    #[error("Unmapped bus address on read: 0x{address:08X}")]
    UnmappedRead { address: u32 },

    #[error("Unmapped bus address on write: 0x{address:08X} (value 0x{value:08X})")]
    UnmappedWrite { address: u32, value: u32 },

    #[error("Unsupported instruction {disassembly} (0x{word:08X}) at 0x{pc:08X}")]
    UnsupportedInstruction {
        word: u32,
        pc: u32,
        disassembly: String,
    },

    #[error("Internal emulator invariant violated: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Executable loader error: {0}")]
    Loader(String),

    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    #[error("CD-ROM error: {0}")]
    CdRom(#[from] CdRomError),

    #[error("Save state error: {0}")]
    SaveState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// GPU-specific error types
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("Invalid VRAM access at ({x}, {y})")]
    InvalidVramAccess { x: u16, y: u16 },

    #[error("Invalid GP0 command: {command:#010x}")]
    InvalidGp0Command { command: u32 },

    #[error("Invalid GP1 command: {command:#010x}")]
    InvalidGp1Command { command: u32 },
}

/// CD-ROM-specific error types
#[derive(Error, Debug)]
pub enum CdRomError {
    #[error("No disc inserted")]
    NoDisc,

    #[error("Invalid disc position: {position}")]
    InvalidPosition { position: u32 },

    #[error("Read error at position {position}: {reason}")]
    ReadError { position: u32, reason: String },

    #[error("Disc load error: {0}")]
    DiscLoadError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
