//! CB-prefixed instructions: rotates/shifts, BIT, RES and SET.
//!
//! The second byte splits into `xx yyy zzz`: `xx` picks the group, `yyy`
//! the shift kind or bit index, `zzz` the operand.

use super::{CpuLr35902, MemoryLr35902, Operand};

impl<M: MemoryLr35902> CpuLr35902<M> {
    pub(super) fn execute_cb(&mut self, opcode: u8) -> u32 {
        let target = Operand::decode(opcode);
        let selector = (opcode >> 3) & 0x07;
        let indirect = target == Operand::HlIndirect;
        let val = self.read_operand(target);

        let result = match opcode >> 6 {
            0 => match selector {
                0 => self.rlc(val),
                1 => self.rrc(val),
                2 => self.rl(val),
                3 => self.rr(val),
                4 => self.sla(val),
                5 => self.sra(val),
                6 => self.swap(val),
                _ => self.srl(val),
            },
            1 => {
                self.bit(selector, val);
                return if indirect { 3 } else { 2 };
            }
            2 => val & !(1 << selector),
            _ => val | (1 << selector),
        };

        self.write_operand(target, result);
        if indirect {
            4
        } else {
            2
        }
    }
}
