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

//! Emulator configuration
//!
//! A small TOML file next to the binary (or passed with `--config`) carries
//! the persistent settings; command-line arguments override it.
//!
//! ```toml
//! bios = "SCPH1001.BIN"
//! game = "game.bin"
//! region = "ntsc"
//! frame_pacing = true
//! ```

use crate::core::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Console region, used only for reporting; the video standard itself
/// follows the GPU display mode the guest programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

/// Persistent emulator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the 512KB BIOS image
    pub bios: PathBuf,

    /// Optional game image (.bin disc or .exe executable)
    pub game: Option<PathBuf>,

    pub region: Region,

    /// Throttle the emulation thread to the console refresh rate
    pub frame_pacing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bios: PathBuf::from("SCPH1001.BIN"),
            game: None,
            region: Region::default(),
            frame_pacing: true,
        }
    }
}

impl Config {
    /// Load a TOML config file
    ///
    /// # Errors
    ///
    /// Propagates I/O failures; malformed TOML is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Load the config if the file exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("using default config ({e})");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            bios = "bios/SCPH1001.BIN"
            game = "games/demo.bin"
            region = "pal"
            frame_pacing = false
            "#,
        )
        .unwrap();

        assert_eq!(config.bios, PathBuf::from("bios/SCPH1001.BIN"));
        assert_eq!(config.game, Some(PathBuf::from("games/demo.bin")));
        assert_eq!(config.region, Region::Pal);
        assert!(!config.frame_pacing);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str(r#"bios = "a.bin""#).unwrap();
        assert_eq!(config.game, None);
        assert_eq!(config.region, Region::Ntsc);
        assert!(config.frame_pacing);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = Config::load_or_default("/nonexistent/oxidestation.toml");
        assert_eq!(config.region, Region::Ntsc);
    }
}
