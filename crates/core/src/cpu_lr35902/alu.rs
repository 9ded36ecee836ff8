//! Arithmetic, logic and bit-shift primitives.
//!
//! Every operation that defines the flag register rebuilds it with
//! `reset_flags`, so nothing is inherited from the previous instruction
//! except where a flag is documented as preserved.

use super::{CpuLr35902, MemoryLr35902};
use crate::flags::Flags;

impl<M: MemoryLr35902> CpuLr35902<M> {
    /// ADD/ADC into A.
    pub(super) fn add8(&mut self, val: u8, with_carry: bool) {
        let a = self.regs.a();
        let c = (with_carry && self.regs.flag_set(Flags::CARRY)) as u8;
        let result = a as u16 + val as u16 + c as u16;

        let mut flags = Flags::empty();
        flags.set(Flags::ZERO, result as u8 == 0);
        flags.set(Flags::HALF_CARRY, (a & 0x0F) + (val & 0x0F) + c > 0x0F);
        flags.set(Flags::CARRY, result > 0xFF);
        self.regs.reset_flags(flags);
        self.regs.set_a(result as u8);
    }

    /// SUB/SBC/CP arithmetic. Sets flags and returns the difference without
    /// storing it.
    pub(super) fn sub8(&mut self, val: u8, with_carry: bool) -> u8 {
        let a = self.regs.a();
        let c = (with_carry && self.regs.flag_set(Flags::CARRY)) as u8;
        let result = a as i16 - val as i16 - c as i16;

        let mut flags = Flags::SUBTRACT;
        flags.set(Flags::ZERO, result as u8 == 0);
        flags.set(Flags::HALF_CARRY, (a & 0x0F) < (val & 0x0F) + c);
        flags.set(Flags::CARRY, result < 0);
        self.regs.reset_flags(flags);
        result as u8
    }

    pub(super) fn and8(&mut self, val: u8) {
        let result = self.regs.a() & val;
        self.regs.set_a(result);
        let mut flags = Flags::HALF_CARRY;
        flags.set(Flags::ZERO, result == 0);
        self.regs.reset_flags(flags);
    }

    pub(super) fn xor8(&mut self, val: u8) {
        let result = self.regs.a() ^ val;
        self.regs.set_a(result);
        self.regs.reset_flags(zero_if(result));
    }

    pub(super) fn or8(&mut self, val: u8) {
        let result = self.regs.a() | val;
        self.regs.set_a(result);
        self.regs.reset_flags(zero_if(result));
    }

    /// The eight-way ALU selected by bits 3-5 of the 0x80-0xBF and
    /// 0xC6-0xFE opcode columns.
    pub(super) fn alu(&mut self, kind: u8, val: u8) {
        match kind & 0x07 {
            0 => self.add8(val, false),
            1 => self.add8(val, true),
            2 => {
                let r = self.sub8(val, false);
                self.regs.set_a(r);
            }
            3 => {
                let r = self.sub8(val, true);
                self.regs.set_a(r);
            }
            4 => self.and8(val),
            5 => self.xor8(val),
            6 => self.or8(val),
            _ => {
                self.sub8(val, false);
            }
        }
    }

    /// 8-bit increment. Carry is preserved; half-carry is set when the
    /// result's low nibble wrapped to 0.
    pub(super) fn inc8(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut flags = self.regs.flags() & Flags::CARRY;
        flags.set(Flags::ZERO, result == 0);
        flags.set(Flags::HALF_CARRY, result & 0x0F == 0x00);
        self.regs.reset_flags(flags);
        result
    }

    /// 8-bit decrement. Carry is preserved; half-carry is set when the
    /// result's low nibble wrapped to 0xF.
    pub(super) fn dec8(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut flags = (self.regs.flags() & Flags::CARRY) | Flags::SUBTRACT;
        flags.set(Flags::ZERO, result == 0);
        flags.set(Flags::HALF_CARRY, result & 0x0F == 0x0F);
        self.regs.reset_flags(flags);
        result
    }

    /// ADD HL,rr. Zero is preserved; H from bit 11, C from bit 15.
    pub(super) fn add_hl(&mut self, val: u16) {
        let hl = self.regs.hl.get();
        let (result, carry) = hl.overflowing_add(val);
        let mut flags = self.regs.flags() & Flags::ZERO;
        flags.set(Flags::HALF_CARRY, (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF);
        flags.set(Flags::CARRY, carry);
        self.regs.reset_flags(flags);
        self.regs.hl.set(result);
    }

    /// SP plus a signed immediate, as used by ADD SP,r8 and LD HL,SP+r8.
    /// Flags come from the unsigned low-byte addition.
    pub(super) fn sp_plus_offset(&mut self, offset: u8) -> u16 {
        let sp = self.regs.sp;
        let result = sp.wrapping_add(offset as i8 as i16 as u16);
        let mut flags = Flags::empty();
        flags.set(Flags::HALF_CARRY, (sp & 0x000F) + (offset as u16 & 0x000F) > 0x000F);
        flags.set(Flags::CARRY, (sp & 0x00FF) + offset as u16 > 0x00FF);
        self.regs.reset_flags(flags);
        result
    }

    pub(super) fn daa(&mut self) {
        let mut a = self.regs.a();
        let flags = self.regs.flags();
        let mut carry = flags.contains(Flags::CARRY);

        if flags.contains(Flags::SUBTRACT) {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if flags.contains(Flags::HALF_CARRY) {
                a = a.wrapping_sub(0x06);
            }
        } else {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if flags.contains(Flags::HALF_CARRY) || (a & 0x0F) > 0x09 {
                a = a.wrapping_add(0x06);
            }
        }

        let mut out = (flags & Flags::SUBTRACT) | zero_if(a);
        out.set(Flags::CARRY, carry);
        self.regs.reset_flags(out);
        self.regs.set_a(a);
    }

    pub(super) fn rlc(&mut self, val: u8) -> u8 {
        let result = val.rotate_left(1);
        self.shift_flags(result, val & 0x80 != 0);
        result
    }

    pub(super) fn rrc(&mut self, val: u8) -> u8 {
        let result = val.rotate_right(1);
        self.shift_flags(result, val & 0x01 != 0);
        result
    }

    pub(super) fn rl(&mut self, val: u8) -> u8 {
        let carry_in = self.regs.flag_set(Flags::CARRY) as u8;
        let result = (val << 1) | carry_in;
        self.shift_flags(result, val & 0x80 != 0);
        result
    }

    pub(super) fn rr(&mut self, val: u8) -> u8 {
        let carry_in = (self.regs.flag_set(Flags::CARRY) as u8) << 7;
        let result = (val >> 1) | carry_in;
        self.shift_flags(result, val & 0x01 != 0);
        result
    }

    pub(super) fn sla(&mut self, val: u8) -> u8 {
        let result = val << 1;
        self.shift_flags(result, val & 0x80 != 0);
        result
    }

    pub(super) fn sra(&mut self, val: u8) -> u8 {
        let result = (val >> 1) | (val & 0x80);
        self.shift_flags(result, val & 0x01 != 0);
        result
    }

    pub(super) fn swap(&mut self, val: u8) -> u8 {
        let result = val.rotate_left(4);
        self.regs.reset_flags(zero_if(result));
        result
    }

    pub(super) fn srl(&mut self, val: u8) -> u8 {
        let result = val >> 1;
        self.shift_flags(result, val & 0x01 != 0);
        result
    }

    /// BIT n. Carry is preserved.
    pub(super) fn bit(&mut self, bit: u8, val: u8) {
        let mut flags = (self.regs.flags() & Flags::CARRY) | Flags::HALF_CARRY;
        flags.set(Flags::ZERO, val & (1 << bit) == 0);
        self.regs.reset_flags(flags);
    }

    fn shift_flags(&mut self, result: u8, carry: bool) {
        let mut flags = zero_if(result);
        flags.set(Flags::CARRY, carry);
        self.regs.reset_flags(flags);
    }
}

fn zero_if(result: u8) -> Flags {
    if result == 0 {
        Flags::ZERO
    } else {
        Flags::empty()
    }
}
