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

//! Disc image model
//!
//! A raw "bin" image is one unbroken stream of 2352-byte sectors (sync
//! bytes and headers included). The disc keeps an ordered track table;
//! positions address sectors as minutes:seconds:fractions with 75 fractions
//! per second, and resolve to a track through cumulative sector counts.
//!
//! The first data track's position is offset by +2 seconds — a mastering
//! quirk of the medium that shows up both in track-offset arithmetic and
//! when seeking back into the file. It must not be "fixed".

use crate::core::error::{CdRomError, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::rc::Rc;

/// Fractions (sectors) per second of playback
pub const FRACTIONS_PER_SECOND: u32 = 75;

/// Seconds per minute
pub const SECONDS_PER_MINUTE: u32 = 60;

/// A disc position in minutes:seconds:fractions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub minutes: u32,
    pub seconds: u32,
    pub fractions: u32,
}

impl Position {
    /// Build a position from a linear block address
    pub fn from_lba(lba: u32) -> Self {
        Self {
            minutes: lba / SECONDS_PER_MINUTE / FRACTIONS_PER_SECOND,
            seconds: (lba % (SECONDS_PER_MINUTE * FRACTIONS_PER_SECOND)) / FRACTIONS_PER_SECOND,
            fractions: lba % FRACTIONS_PER_SECOND,
        }
    }

    /// Linear block address of this position
    pub fn lba(&self) -> u32 {
        self.minutes * SECONDS_PER_MINUTE * FRACTIONS_PER_SECOND
            + self.seconds * FRACTIONS_PER_SECOND
            + self.fractions
    }
}

/// Track content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Data,
    Audio,
}

/// One track of the disc
pub struct Track {
    /// 1-based track number
    pub number: u32,

    pub track_type: TrackType,

    /// Byte offset of the track inside the backing file
    pub file_offset: u64,

    /// Length in sectors
    pub num_sectors: u32,

    /// Shared handle to the backing image file
    file: Rc<RefCell<File>>,
}

/// One raw sector read off the disc
pub struct Sector {
    pub data: Vec<u8>,
    pub track_type: TrackType,
}

impl Sector {
    /// Raw sector size: sync bytes + header + payload
    pub const SIZE: usize = 2352;

    /// Payload size of a mode-2 data sector without header
    pub const DATA_SIZE: usize = 2048;

    /// Header bytes preceding the payload (sync + address + mode + subheader)
    pub const HEADER_SIZE: usize = 24;
}

/// A loaded disc: an ordered sequence of tracks over one image file
pub struct Disc {
    tracks: Vec<Track>,
}

impl Disc {
    /// Load a raw bin image as a single data track
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened or is not a whole number of
    /// sectors... short images are padded up to the next sector boundary by
    /// rounding the sector count up, matching common dumps.
    pub fn from_bin<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path).map_err(CdRomError::IoError)?;
        let file_size = file.metadata().map_err(CdRomError::IoError)?.len();

        log::debug!(
            "loading disc from {} ({} bytes)",
            path.as_ref().display(),
            file_size,
        );

        let num_sectors = file_size.div_ceil(Sector::SIZE as u64) as u32;

        let track = Track {
            number: 1,
            track_type: TrackType::Data,
            file_offset: 0,
            num_sectors,
            file: Rc::new(RefCell::new(file)),
        };

        Ok(Self {
            tracks: vec![track],
        })
    }

    /// Number of tracks on the disc
    pub fn num_tracks(&self) -> u32 {
        self.tracks.len() as u32
    }

    /// Absolute start position of a track
    ///
    /// Cumulative sector counts of the preceding tracks. The first data
    /// track's position carries the documented +2-second adjustment.
    pub fn track_offset(&self, index: u32) -> Position {
        let mut lba = 0;

        for i in 0..index.min(self.tracks.len() as u32) {
            lba += self.tracks[i as usize].num_sectors;
        }

        if self.first_data_track() == Some(index) {
            lba += FRACTIONS_PER_SECOND * 2;
        }

        Position::from_lba(lba)
    }

    /// Index of the first data track, if any
    fn first_data_track(&self) -> Option<u32> {
        self.tracks
            .iter()
            .position(|t| t.track_type == TrackType::Data)
            .map(|i| i as u32)
    }

    /// Resolve a position to the track containing it
    ///
    /// Every valid position resolves to exactly one track; positions
    /// outside all tracks return `None`.
    pub fn track_index(&self, position: Position) -> Option<u32> {
        let lba = position.lba();

        for i in 0..self.tracks.len() as u32 {
            let offset = self.track_offset(i).lba();
            let size = self.tracks[i as usize].num_sectors;

            if lba >= offset && lba < offset + size {
                return Some(i);
            }
        }

        None
    }

    /// Read the raw sector at an absolute position
    ///
    /// # Errors
    ///
    /// Positions outside every track, or reads past the end of the backing
    /// file, are reported as read errors.
    pub fn read_sector(&self, position: Position) -> Result<Sector> {
        let index = self
            .track_index(position)
            .ok_or(CdRomError::InvalidPosition {
                position: position.lba(),
            })?;

        let track = &self.tracks[index as usize];

        // Undo the +2-second quirk so file offsets line up again
        let lba = position.lba() - self.track_offset(index).lba();

        let byte_offset = track.file_offset + lba as u64 * Sector::SIZE as u64;
        let mut data = vec![0u8; Sector::SIZE];

        let mut file = track.file.borrow_mut();
        file.seek(SeekFrom::Start(byte_offset))
            .map_err(CdRomError::IoError)?;
        file.read_exact(&mut data).map_err(|e| CdRomError::ReadError {
            position: position.lba(),
            reason: e.to_string(),
        })?;

        Ok(Sector {
            data,
            track_type: track.track_type,
        })
    }
}

/// Convert a BCD-coded byte to binary
pub fn bcd_to_binary(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0xF)
}

/// Convert a binary byte to BCD coding
pub fn binary_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Write a bin image of `sectors` sectors, each filled with its index
    fn make_bin(sectors: u32) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..sectors {
            file.write_all(&vec![i as u8; Sector::SIZE]).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_position_lba_round_trip() {
        let position = Position {
            minutes: 2,
            seconds: 30,
            fractions: 44,
        };
        assert_eq!(Position::from_lba(position.lba()), position);
        assert_eq!(position.lba(), 2 * 60 * 75 + 30 * 75 + 44);
    }

    #[test]
    fn test_first_data_track_offset_has_two_second_quirk() {
        let file = make_bin(10);
        let disc = Disc::from_bin(file.path()).unwrap();

        assert_eq!(disc.num_tracks(), 1);
        assert_eq!(disc.track_offset(0).lba(), 2 * FRACTIONS_PER_SECOND);
    }

    #[test]
    fn test_track_index_is_bijective_over_the_track() {
        let file = make_bin(10);
        let disc = Disc::from_bin(file.path()).unwrap();

        let offset = disc.track_offset(0).lba();
        for lba in offset..offset + 10 {
            assert_eq!(disc.track_index(Position::from_lba(lba)), Some(0));
        }
        // One before and one past the track resolve to nothing
        assert_eq!(disc.track_index(Position::from_lba(offset - 1)), None);
        assert_eq!(disc.track_index(Position::from_lba(offset + 10)), None);
    }

    #[test]
    fn test_read_sector_contents() {
        let file = make_bin(4);
        let disc = Disc::from_bin(file.path()).unwrap();

        // Sector 2 of the file sits at the track offset + 2
        let offset = disc.track_offset(0).lba();
        let sector = disc.read_sector(Position::from_lba(offset + 2)).unwrap();
        assert_eq!(sector.data.len(), Sector::SIZE);
        assert!(sector.data.iter().all(|&b| b == 2));
        assert_eq!(sector.track_type, TrackType::Data);
    }

    #[test]
    fn test_read_outside_disc_fails() {
        let file = make_bin(4);
        let disc = Disc::from_bin(file.path()).unwrap();
        assert!(disc.read_sector(Position::from_lba(0)).is_err());
        assert!(disc.read_sector(Position::from_lba(2 * FRACTIONS_PER_SECOND + 100)).is_err());
    }

    #[test]
    fn test_bcd_conversions() {
        assert_eq!(bcd_to_binary(0x25), 25);
        assert_eq!(binary_to_bcd(25), 0x25);
        assert_eq!(bcd_to_binary(binary_to_bcd(74)), 74);
    }
}
