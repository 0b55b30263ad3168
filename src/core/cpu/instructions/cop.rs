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

//! Coprocessor, syscall and break instructions
//!
//! Only COP0 exists on this CPU. MFC0 results pass through the load-delay
//! file like memory loads do.

use super::super::{Exception, Instruction, CPU};
use crate::core::error::Result;

impl CPU {
    pub(super) fn op_cop0(&mut self, ins: Instruction) -> Result<()> {
        match ins.rs() {
            // MFC0
            0x00 => {
                let value = self.cop0().read(ins.rd()).ok_or_else(|| self.unsupported())?;
                self.schedule_load(ins.rt(), value);
                Ok(())
            }
            // MTC0
            0x04 => {
                let value = self.reg(ins.rt());
                self.cop0_mut().write(ins.rd(), value);
                Ok(())
            }
            // RFE (the only COP0 "co-instruction" on this chip)
            0x10 => {
                if ins.funct() == 0x10 {
                    self.cop0_mut().return_from_exception();
                    Ok(())
                } else {
                    Err(self.unsupported())
                }
            }
            _ => Err(self.unsupported()),
        }
    }

    pub(super) fn op_syscall(&mut self) {
        self.exception(Exception::SystemCall);
    }

    pub(super) fn op_break(&mut self) {
        self.exception(Exception::Break);
    }
}
