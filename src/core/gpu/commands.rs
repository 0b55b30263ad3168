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

//! GP0 command headers
//!
//! The leading word of every GP0 command encodes the opcode in bits 24-31;
//! render commands embed their shape flags in the opcode byte itself, and
//! the total word count of the command (header included) is computed from
//! those flags alone. The engine uses `num_arguments()` to know when a
//! buffered command is complete.

/// Multi-word command classes tracked by the GP0 engine between words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuCommand {
    /// No command in flight
    Nop,
    VramFill,
    PolygonRender,
    LineRender,
    RectangleRender,
    CopyCpuToVramParsingPhase,
    CopyCpuToVramDataPhase,
    CopyVramToCpu,
    CopyVramToVram,
}

impl GpuCommand {
    /// Stable code for save states
    pub fn to_code(self) -> u32 {
        match self {
            GpuCommand::Nop => 0,
            GpuCommand::VramFill => 1,
            GpuCommand::PolygonRender => 2,
            GpuCommand::LineRender => 3,
            GpuCommand::RectangleRender => 4,
            GpuCommand::CopyCpuToVramParsingPhase => 5,
            GpuCommand::CopyCpuToVramDataPhase => 6,
            GpuCommand::CopyVramToCpu => 7,
            GpuCommand::CopyVramToVram => 8,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => GpuCommand::Nop,
            1 => GpuCommand::VramFill,
            2 => GpuCommand::PolygonRender,
            3 => GpuCommand::LineRender,
            4 => GpuCommand::RectangleRender,
            5 => GpuCommand::CopyCpuToVramParsingPhase,
            6 => GpuCommand::CopyCpuToVramDataPhase,
            7 => GpuCommand::CopyVramToCpu,
            8 => GpuCommand::CopyVramToVram,
            _ => return None,
        })
    }
}

/// Polygon render command header (GP0 opcodes 0x20-0x3F)
///
/// ```text
/// bit 24: raw texture (no modulation)
/// bit 25: semi-transparent
/// bit 26: texture mapped
/// bit 27: quad (else triangle)
/// bit 28: gouraud shaded
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PolygonCommand(pub u32);

impl PolygonCommand {
    /// Build from the opcode byte (header word >> 24)
    pub fn new(opcode: u32) -> Self {
        Self(opcode)
    }

    #[inline(always)]
    pub fn is_raw_texture(self) -> bool {
        self.0 & (1 << 0) != 0
    }

    #[inline(always)]
    pub fn is_semi_transparent(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    #[inline(always)]
    pub fn is_texture_mapped(self) -> bool {
        self.0 & (1 << 2) != 0
    }

    #[inline(always)]
    pub fn is_quad(self) -> bool {
        self.0 & (1 << 3) != 0
    }

    #[inline(always)]
    pub fn is_gouraud_shaded(self) -> bool {
        self.0 & (1 << 4) != 0
    }

    /// Number of vertices of the polygon
    pub fn num_vertices(self) -> u32 {
        if self.is_quad() {
            4
        } else {
            3
        }
    }

    /// Total command length in words, header included
    ///
    /// One position word per vertex, doubled when texture mapped (UV word
    /// per vertex), plus one extra color word per vertex after the first
    /// when gouraud shaded.
    pub fn num_arguments(self) -> u32 {
        let mut words = self.num_vertices();

        if self.is_texture_mapped() {
            words *= 2;
        }

        if self.is_gouraud_shaded() {
            words += self.num_vertices() - 1;
        }

        1 + words
    }
}

/// Line render command header (GP0 opcodes 0x40-0x5F)
///
/// ```text
/// bit 25: semi-transparent
/// bit 27: poly-line (vertex list until the 0x5000_5000 terminator)
/// bit 28: gouraud shaded
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LineCommand(pub u32);

impl LineCommand {
    pub fn new(opcode: u32) -> Self {
        Self(opcode)
    }

    #[inline(always)]
    pub fn is_semi_transparent(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    #[inline(always)]
    pub fn is_poly_line(self) -> bool {
        self.0 & (1 << 3) != 0
    }

    #[inline(always)]
    pub fn is_gouraud_shaded(self) -> bool {
        self.0 & (1 << 4) != 0
    }

    /// Total command length in words for one segment, header included
    pub fn num_arguments(self) -> u32 {
        1 + if self.is_gouraud_shaded() { 3 } else { 2 }
    }
}

/// Rectangle render command header (GP0 opcodes 0x60-0x7F)
///
/// ```text
/// bit 24: raw texture (no modulation)
/// bit 25: semi-transparent
/// bit 26: texture mapped
/// bits 27-28: size (0 = variable, 1 = 1x1, 2 = 8x8, 3 = 16x16)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RectangleCommand(pub u32);

impl RectangleCommand {
    pub fn new(opcode: u32) -> Self {
        Self(opcode)
    }

    #[inline(always)]
    pub fn is_raw_texture(self) -> bool {
        self.0 & (1 << 0) != 0
    }

    #[inline(always)]
    pub fn is_semi_transparent(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    #[inline(always)]
    pub fn is_texture_mapped(self) -> bool {
        self.0 & (1 << 2) != 0
    }

    #[inline(always)]
    pub fn size_field(self) -> u32 {
        (self.0 >> 3) & 3
    }

    /// Fixed edge length, or 0 for variable-size rectangles
    pub fn actual_size(self) -> u32 {
        match self.size_field() {
            0 => 0,
            1 => 1,
            2 => 8,
            _ => 16,
        }
    }

    /// Total command length in words, header included
    ///
    /// Header + vertex, plus a size word for variable rectangles, plus a
    /// UV/CLUT word when texture mapped.
    pub fn num_arguments(self) -> u32 {
        let size_words = if self.size_field() == 0 { 2 } else { 1 };
        1 + size_words + self.is_texture_mapped() as u32
    }
}
