//! Opcode table and the base (unprefixed) instruction handlers.
//!
//! The table is an associated `const` built by a `const fn`, so it exists
//! once per memory type and is never mutated. Each entry receives the opcode
//! byte, which lets one handler serve a whole family by decoding the
//! register fields (`opcode >> 3` for destinations, `opcode & 7` for
//! sources, `opcode >> 4` for register pairs). Handlers return machine
//! cycles.

use super::{CpuError, CpuLr35902, MemoryLr35902, Operand};
use crate::flags::Flags;
use crate::logging::{log, LogCategory, LogLevel};
use crate::registers::Reg16;

pub(super) type Handler<M> = fn(&mut CpuLr35902<M>, u8) -> Result<u32, CpuError>;

impl<M: MemoryLr35902> CpuLr35902<M> {
    pub(super) const OPCODES: [Handler<M>; 256] = opcode_table::<M>();
}

const fn opcode_table<M: MemoryLr35902>() -> [Handler<M>; 256] {
    let illegal: Handler<M> = CpuLr35902::<M>::illegal;
    let mut t = [illegal; 256];

    macro_rules! map {
        ($handler:ident => $($op:expr),+ $(,)?) => {
            $( t[$op] = CpuLr35902::<M>::$handler; )+
        };
    }

    map!(nop => 0x00);
    map!(ld_rr_d16 => 0x01, 0x11, 0x21, 0x31);
    map!(ld_indirect_a => 0x02, 0x12, 0x22, 0x32);
    map!(ld_a_indirect => 0x0A, 0x1A, 0x2A, 0x3A);
    map!(inc_rr => 0x03, 0x13, 0x23, 0x33);
    map!(dec_rr => 0x0B, 0x1B, 0x2B, 0x3B);
    map!(inc_r => 0x04, 0x0C, 0x14, 0x1C, 0x24, 0x2C, 0x34, 0x3C);
    map!(dec_r => 0x05, 0x0D, 0x15, 0x1D, 0x25, 0x2D, 0x35, 0x3D);
    map!(ld_r_d8 => 0x06, 0x0E, 0x16, 0x1E, 0x26, 0x2E, 0x36, 0x3E);
    map!(rotate_a => 0x07, 0x0F, 0x17, 0x1F);
    map!(ld_a16_sp => 0x08);
    map!(add_hl_rr => 0x09, 0x19, 0x29, 0x39);
    map!(stop => 0x10);
    map!(jr => 0x18);
    map!(jr_cc => 0x20, 0x28, 0x30, 0x38);
    map!(daa_op => 0x27);
    map!(cpl => 0x2F);
    map!(scf => 0x37);
    map!(ccf => 0x3F);

    let mut op = 0x40;
    while op < 0x80 {
        t[op] = CpuLr35902::<M>::ld_r_r;
        op += 1;
    }
    map!(halt => 0x76);

    while op < 0xC0 {
        t[op] = CpuLr35902::<M>::alu_r;
        op += 1;
    }

    map!(ret_cc => 0xC0, 0xC8, 0xD0, 0xD8);
    map!(pop => 0xC1, 0xD1, 0xE1, 0xF1);
    map!(jp_cc => 0xC2, 0xCA, 0xD2, 0xDA);
    map!(jp => 0xC3);
    map!(call_cc => 0xC4, 0xCC, 0xD4, 0xDC);
    map!(push => 0xC5, 0xD5, 0xE5, 0xF5);
    map!(alu_d8 => 0xC6, 0xCE, 0xD6, 0xDE, 0xE6, 0xEE, 0xF6, 0xFE);
    map!(rst => 0xC7, 0xCF, 0xD7, 0xDF, 0xE7, 0xEF, 0xF7, 0xFF);
    map!(ret => 0xC9);
    map!(prefix_cb => 0xCB);
    map!(call => 0xCD);
    map!(reti => 0xD9);
    map!(ldh_a8_a => 0xE0);
    map!(ldh_a_a8 => 0xF0);
    map!(ld_c_a => 0xE2);
    map!(ld_a_c => 0xF2);
    map!(add_sp_r8 => 0xE8);
    map!(ld_hl_sp_r8 => 0xF8);
    map!(jp_hl => 0xE9);
    map!(ld_sp_hl => 0xF9);
    map!(ld_a16_a => 0xEA);
    map!(ld_a_a16 => 0xFA);
    map!(di => 0xF3);
    map!(ei => 0xFB);

    t
}

impl<M: MemoryLr35902> CpuLr35902<M> {
    // D3 DB DD E3 E4 EB EC ED F4 FC FD
    fn illegal(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let pc = self.regs.pc.wrapping_sub(1);
        log(LogCategory::Cpu, LogLevel::Error, || {
            format!("illegal opcode {:02X} at {:04X}", opcode, pc)
        });
        Err(CpuError::IllegalOpcode { opcode, pc })
    }

    fn nop(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        Ok(1)
    }

    // LD rr,d16
    fn ld_rr_d16(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let val = self.fetch_u16();
        self.regs.set16(Self::pair_for(opcode), val);
        Ok(3)
    }

    /// Pointer for the (BC)/(DE)/(HL+)/(HL-) column, applying HL's
    /// post-increment or post-decrement.
    fn indirect_address(&mut self, opcode: u8) -> u16 {
        match (opcode >> 4) & 0x03 {
            0 => self.regs.bc.get(),
            1 => self.regs.de.get(),
            2 => {
                let hl = self.regs.hl.get();
                self.regs.hl.set(hl.wrapping_add(1));
                hl
            }
            _ => {
                let hl = self.regs.hl.get();
                self.regs.hl.set(hl.wrapping_sub(1));
                hl
            }
        }
    }

    // LD (BC),A / LD (DE),A / LD (HL+),A / LD (HL-),A
    fn ld_indirect_a(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let addr = self.indirect_address(opcode);
        self.memory.write(addr, self.regs.a());
        Ok(2)
    }

    // LD A,(BC) / LD A,(DE) / LD A,(HL+) / LD A,(HL-)
    fn ld_a_indirect(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let addr = self.indirect_address(opcode);
        let val = self.memory.read(addr);
        self.regs.set_a(val);
        Ok(2)
    }

    fn inc_rr(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let reg = Self::pair_for(opcode);
        self.regs.set16(reg, self.regs.get16(reg).wrapping_add(1));
        Ok(2)
    }

    fn dec_rr(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let reg = Self::pair_for(opcode);
        self.regs.set16(reg, self.regs.get16(reg).wrapping_sub(1));
        Ok(2)
    }

    fn inc_r(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let target = Operand::decode(opcode >> 3);
        let val = self.read_operand(target);
        let result = self.inc8(val);
        self.write_operand(target, result);
        Ok(if target == Operand::HlIndirect { 3 } else { 1 })
    }

    fn dec_r(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let target = Operand::decode(opcode >> 3);
        let val = self.read_operand(target);
        let result = self.dec8(val);
        self.write_operand(target, result);
        Ok(if target == Operand::HlIndirect { 3 } else { 1 })
    }

    // LD r,d8 / LD (HL),d8
    fn ld_r_d8(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let target = Operand::decode(opcode >> 3);
        let val = self.fetch_byte();
        self.write_operand(target, val);
        Ok(if target == Operand::HlIndirect { 3 } else { 2 })
    }

    // RLCA / RRCA / RLA / RRA: like the CB forms but Z is always cleared.
    fn rotate_a(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let a = self.regs.a();
        let result = match (opcode >> 3) & 0x03 {
            0 => self.rlc(a),
            1 => self.rrc(a),
            2 => self.rl(a),
            _ => self.rr(a),
        };
        self.regs.set_a(result);
        self.regs.clear_flag(Flags::ZERO);
        Ok(1)
    }

    fn ld_a16_sp(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let addr = self.fetch_u16();
        let [lo, hi] = self.regs.sp.to_le_bytes();
        self.memory.write(addr, lo);
        self.memory.write(addr.wrapping_add(1), hi);
        Ok(5)
    }

    fn add_hl_rr(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let val = self.regs.get16(Self::pair_for(opcode));
        self.add_hl(val);
        Ok(2)
    }

    /// STOP consumes its padding byte and idles until a joypad interrupt.
    fn stop(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let padding = self.fetch_byte();
        self.stopped = true;
        log(LogCategory::Cpu, LogLevel::Debug, || {
            format!("STOP at PC={:04X} (padding {:02X})", self.regs.pc.wrapping_sub(2), padding)
        });
        Ok(1)
    }

    fn jr(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let offset = self.fetch_byte() as i8;
        self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
        Ok(3)
    }

    fn jr_cc(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let offset = self.fetch_byte() as i8;
        if self.condition(opcode) {
            self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
            Ok(3)
        } else {
            Ok(2)
        }
    }

    fn daa_op(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.daa();
        Ok(1)
    }

    fn cpl(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.regs.set_a(!self.regs.a());
        self.regs.set_flag(Flags::SUBTRACT | Flags::HALF_CARRY);
        Ok(1)
    }

    fn scf(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let zero = self.regs.flags() & Flags::ZERO;
        self.regs.reset_flags(zero | Flags::CARRY);
        Ok(1)
    }

    fn ccf(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let kept = self.regs.flags() & (Flags::ZERO | Flags::CARRY);
        self.regs.reset_flags(kept);
        self.regs.toggle_flag(Flags::CARRY);
        Ok(1)
    }

    // LD r,r' / LD r,(HL) / LD (HL),r
    fn ld_r_r(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let dst = Operand::decode(opcode >> 3);
        let src = Operand::decode(opcode);
        let val = self.read_operand(src);
        self.write_operand(dst, val);
        Ok(if dst == Operand::HlIndirect || src == Operand::HlIndirect { 2 } else { 1 })
    }

    fn halt(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.halted = true;
        log(LogCategory::Cpu, LogLevel::Debug, || {
            format!("HALT at PC={:04X}", self.regs.pc.wrapping_sub(1))
        });
        Ok(1)
    }

    // ADD/ADC/SUB/SBC/AND/XOR/OR/CP r
    fn alu_r(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let src = Operand::decode(opcode);
        let val = self.read_operand(src);
        self.alu(opcode >> 3, val);
        Ok(if src == Operand::HlIndirect { 2 } else { 1 })
    }

    // ADD/ADC/SUB/SBC/AND/XOR/OR/CP d8
    fn alu_d8(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let val = self.fetch_byte();
        self.alu(opcode >> 3, val);
        Ok(2)
    }

    fn ret_cc(&mut self, opcode: u8) -> Result<u32, CpuError> {
        if self.condition(opcode) {
            self.regs.pc = self.pop_u16();
            Ok(5)
        } else {
            Ok(2)
        }
    }

    fn pop(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let val = self.pop_u16();
        self.regs.set16(Self::stack_pair_for(opcode), val);
        Ok(3)
    }

    fn push(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let val = self.regs.get16(Self::stack_pair_for(opcode));
        self.push_u16(val);
        Ok(4)
    }

    fn jp(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.regs.pc = self.fetch_u16();
        Ok(4)
    }

    fn jp_cc(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let addr = self.fetch_u16();
        if self.condition(opcode) {
            self.regs.pc = addr;
            Ok(4)
        } else {
            Ok(3)
        }
    }

    fn jp_hl(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.regs.pc = self.regs.hl.get();
        Ok(1)
    }

    fn call(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let addr = self.fetch_u16();
        self.push_u16(self.regs.pc);
        self.regs.pc = addr;
        Ok(6)
    }

    fn call_cc(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let addr = self.fetch_u16();
        if self.condition(opcode) {
            self.push_u16(self.regs.pc);
            self.regs.pc = addr;
            Ok(6)
        } else {
            Ok(3)
        }
    }

    fn rst(&mut self, opcode: u8) -> Result<u32, CpuError> {
        self.push_u16(self.regs.pc);
        self.regs.pc = (opcode & 0x38) as u16;
        Ok(4)
    }

    fn ret(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.regs.pc = self.pop_u16();
        Ok(4)
    }

    fn reti(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.regs.pc = self.pop_u16();
        self.ime = true;
        Ok(4)
    }

    fn prefix_cb(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let cb_op = self.fetch_byte();
        Ok(self.execute_cb(cb_op))
    }

    // LDH (a8),A
    fn ldh_a8_a(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let offset = self.fetch_byte() as u16;
        self.memory.write(0xFF00 | offset, self.regs.a());
        Ok(3)
    }

    // LDH A,(a8)
    fn ldh_a_a8(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let offset = self.fetch_byte() as u16;
        let val = self.memory.read(0xFF00 | offset);
        self.regs.set_a(val);
        Ok(3)
    }

    // LD (C),A
    fn ld_c_a(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.memory.write(0xFF00 | self.regs.bc.low() as u16, self.regs.a());
        Ok(2)
    }

    // LD A,(C)
    fn ld_a_c(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let val = self.memory.read(0xFF00 | self.regs.bc.low() as u16);
        self.regs.set_a(val);
        Ok(2)
    }

    fn ld_a16_a(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let addr = self.fetch_u16();
        self.memory.write(addr, self.regs.a());
        Ok(4)
    }

    fn ld_a_a16(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let addr = self.fetch_u16();
        let val = self.memory.read(addr);
        self.regs.set_a(val);
        Ok(4)
    }

    fn add_sp_r8(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let offset = self.fetch_byte();
        self.regs.sp = self.sp_plus_offset(offset);
        Ok(4)
    }

    fn ld_hl_sp_r8(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        let offset = self.fetch_byte();
        let val = self.sp_plus_offset(offset);
        self.regs.set16(Reg16::HL, val);
        Ok(3)
    }

    fn ld_sp_hl(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.regs.sp = self.regs.hl.get();
        Ok(2)
    }

    fn di(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.disable_ime();
        Ok(1)
    }

    fn ei(&mut self, _opcode: u8) -> Result<u32, CpuError> {
        self.schedule_ime();
        Ok(1)
    }
}
