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

//! Save state serialization
//!
//! A save state is a flat, positional byte stream. Every component appends
//! its register state with [`SaveState::push`] in a fixed order — the order
//! in which the [`Bus`](crate::core::bus::Bus) constructs its components —
//! and restores it with [`SaveState::pop`] in the exact same order. There is
//! no field tagging and no per-component framing: any change to a
//! component's serialized layout, or to the construction order, is a
//! breaking format change.
//!
//! Values are encoded with bincode's legacy configuration (fixed-width
//! little-endian integers), which keeps the stream positional and byte-exact.
//!
//! # File Format
//!
//! ```text
//! 0x00: "OXSS" magic
//! 0x04: format version (u32 LE)
//! 0x08: creation timestamp, unix seconds (i64 LE)
//! 0x10: payload length (u64 LE)
//! 0x18: positional component payload
//! ```
//!
//! # Example
//!
//! ```
//! use oxidestation::core::savestate::SaveState;
//!
//! let mut state = SaveState::new();
//! state.push(&0xDEADBEEFu32);
//! state.push(&[1u8, 2, 3]);
//!
//! let mut restored = SaveState::from_payload(state.payload().to_vec());
//! assert_eq!(restored.pop::<u32>().unwrap(), 0xDEADBEEF);
//! assert_eq!(restored.pop::<[u8; 3]>().unwrap(), [1, 2, 3]);
//! ```

use crate::core::error::{CoreError, Result};
use bincode::config::{self, Configuration, Fixint, LittleEndian};
use chrono::{DateTime, TimeZone, Utc};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Save state format version
///
/// Bumped whenever any component's serialized layout changes. Old files are
/// rejected, never migrated.
pub const SAVE_STATE_VERSION: u32 = 1;

/// File magic for save state files
const MAGIC: [u8; 4] = *b"OXSS";

/// Fixed-width little-endian encoding keeps the stream positional
const CODEC: Configuration<LittleEndian, Fixint> = config::legacy();

/// Flat positional save-state stream
///
/// Writing and reading must visit components in the same order; the stream
/// carries no tags to detect a mismatch. Corrupt or short streams surface as
/// [`CoreError::SaveState`] on [`pop`](Self::pop).
pub struct SaveState {
    /// Creation timestamp (stored in the file header)
    created: DateTime<Utc>,

    /// Positional component payload
    data: Vec<u8>,

    /// Read cursor into `data`
    cursor: usize,
}

impl SaveState {
    /// Create an empty save state ready for serialization
    pub fn new() -> Self {
        Self {
            created: Utc::now(),
            data: Vec::new(),
            cursor: 0,
        }
    }

    /// Create a save state around an existing payload, ready for restore
    pub fn from_payload(data: Vec<u8>) -> Self {
        Self {
            created: Utc::now(),
            data,
            cursor: 0,
        }
    }

    /// Append a value to the stream
    ///
    /// Encoding plain register data into a byte vector cannot fail; a
    /// failure here is an emulator bug, not a runtime condition.
    pub fn push<T: bincode::Encode>(&mut self, value: &T) {
        match bincode::encode_into_std_write(value, &mut self.data, CODEC) {
            Ok(_) => {}
            Err(e) => unreachable!("save state encoding failed: {e}"),
        }
    }

    /// Consume the next value from the stream
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SaveState`] when the stream is exhausted or the
    /// bytes do not decode as `T` (corrupt or mismatched file).
    pub fn pop<T: bincode::Decode<()>>(&mut self) -> Result<T> {
        let (value, consumed) = bincode::decode_from_slice(&self.data[self.cursor..], CODEC)
            .map_err(|e| CoreError::SaveState(format!("decode at offset {}: {e}", self.cursor)))?;
        self.cursor += consumed;
        Ok(value)
    }

    /// Raw positional payload
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// Creation timestamp
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Number of payload bytes not yet consumed by [`pop`](Self::pop)
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Write the save state to a file
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from file creation and writing.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&MAGIC)?;
        file.write_all(&SAVE_STATE_VERSION.to_le_bytes())?;
        file.write_all(&self.created.timestamp().to_le_bytes())?;
        file.write_all(&(self.data.len() as u64).to_le_bytes())?;
        file.write_all(&self.data)?;
        Ok(())
    }

    /// Read a save state from a file
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SaveState`] for bad magic, an unsupported
    /// version, or a truncated payload; I/O errors are propagated.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;

        let mut header = [0u8; 24];
        file.read_exact(&mut header)?;

        if header[0..4] != MAGIC {
            return Err(CoreError::SaveState("bad magic".to_string()));
        }

        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != SAVE_STATE_VERSION {
            return Err(CoreError::SaveState(format!(
                "unsupported version {version} (expected {SAVE_STATE_VERSION})"
            )));
        }

        let timestamp = i64::from_le_bytes([
            header[8], header[9], header[10], header[11], header[12], header[13], header[14],
            header[15],
        ]);
        let length = u64::from_le_bytes([
            header[16], header[17], header[18], header[19], header[20], header[21], header[22],
            header[23],
        ]) as usize;

        let mut data = vec![0u8; length];
        file.read_exact(&mut data)?;

        let created = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or_else(|| CoreError::SaveState("bad timestamp".to_string()))?;

        Ok(Self {
            created,
            data,
            cursor: 0,
        })
    }
}

impl Default for SaveState {
    fn default() -> Self {
        Self::new()
    }
}
