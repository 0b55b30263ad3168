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

//! Texture fetch, CLUT cache and texture windowing
//!
//! 4-bit and 8-bit textures index a color look-up table stored in VRAM. The
//! CLUT row is cached and keyed by (color depth, clut x, clut y); the cache
//! refreshes when the key changes and drops entirely on the
//! InvalidateClutCache GP0 command. 15-bit textures read VRAM directly.

use super::color::Color15;
use super::GPU;

impl GPU {
    /// Refresh the CLUT cache if the palette key changed
    ///
    /// Only paletted depths (4/8-bit) use the cache; 16 or 256 entries are
    /// read from the CLUT row in VRAM.
    pub(super) fn update_clut_cache(&mut self, color_depth: u32, clut_x: u32, clut_y: u32) {
        if color_depth != 1 && color_depth != 2 {
            return;
        }

        let key_changed = self.clut_cache_x != Some(clut_x)
            || self.clut_cache_y != Some(clut_y)
            || self.clut_cache_depth != color_depth;

        if !key_changed {
            return;
        }

        self.clut_cache_depth = color_depth;
        self.clut_cache_x = Some(clut_x);
        self.clut_cache_y = Some(clut_y);

        let num_entries = if color_depth == 2 { 256 } else { 16 };
        for i in 0..num_entries {
            self.clut_cache[i as usize] =
                self.vram_read((clut_x + i) % Self::VRAM_WIDTH, clut_y % Self::VRAM_HEIGHT);
        }
    }

    /// Fetch one texel
    ///
    /// `color_depth`: 1 = 4-bit (4 texels per VRAM halfword), 2 = 8-bit
    /// (2 texels per halfword), 3 = direct 15-bit.
    pub(super) fn fetch_texture_color(
        &self,
        color_depth: u32,
        uv_x: i32,
        uv_y: i32,
        texpage_x: u32,
        texpage_y: u32,
    ) -> Color15 {
        let uv_x = uv_x as u32;
        let uv_y = uv_y as u32;

        match color_depth {
            1 => {
                let x = (texpage_x + uv_x / 4) % Self::VRAM_WIDTH;
                let y = (texpage_y + uv_y) % Self::VRAM_HEIGHT;
                let packed = self.vram_read(x, y);
                let index = (packed >> ((uv_x & 3) * 4)) & 0xF;
                Color15::from_raw(self.clut_cache[index as usize])
            }
            2 => {
                let x = (texpage_x + uv_x / 2) % Self::VRAM_WIDTH;
                let y = (texpage_y + uv_y) % Self::VRAM_HEIGHT;
                let packed = self.vram_read(x, y);
                let index = (packed >> ((uv_x & 1) * 8)) & 0xFF;
                Color15::from_raw(self.clut_cache[index as usize])
            }
            3 => {
                let x = (texpage_x + uv_x) % Self::VRAM_WIDTH;
                let y = (texpage_y + uv_y) % Self::VRAM_HEIGHT;
                Color15::from_raw(self.vram_read(x, y))
            }
            _ => unreachable!("texture fetch with color depth {}", color_depth),
        }
    }

    /// Apply the texture window to a U coordinate
    ///
    /// `u = (u AND NOT (mask*8)) OR ((offset AND mask)*8)`, after wrapping
    /// to the 256-texel page.
    pub(super) fn mask_texture_u(&self, u: i32) -> i32 {
        let mask_x = (self.texture_window & 0x1F) as i32;
        let offset_x = ((self.texture_window >> 10) & 0x1F) as i32;
        ((u & 255) & !(mask_x * 8)) | ((offset_x & mask_x) * 8)
    }

    /// Apply the texture window to a V coordinate
    pub(super) fn mask_texture_v(&self, v: i32) -> i32 {
        let mask_y = ((self.texture_window >> 5) & 0x1F) as i32;
        let offset_y = ((self.texture_window >> 15) & 0x1F) as i32;
        ((v & 255) & !(mask_y * 8)) | ((offset_y & mask_y) * 8)
    }
}
