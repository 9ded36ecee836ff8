//! Sharp LR35902 CPU core (Game Boy CPU)
//!
//! A Z80-like 8-bit CPU with an 8080-style register set. The core is a
//! fetch/decode/execute interpreter: [`CpuLr35902::step`] services pending
//! interrupts, fetches one opcode through the memory capability, dispatches
//! it through a 256-entry handler table and returns the cost in machine
//! cycles (1 machine cycle = 4 clock ticks).
//!
//! All memory traffic goes through [`MemoryLr35902`]. The CPU never owns any
//! storage besides its registers, so tests can substitute [`FlatMemory`] for
//! a real memory map.

mod alu;
mod cb;
mod dispatch;
mod memory;


pub use memory::FlatMemory;

use crate::flags::Flags;
use crate::logging::{log, LogCategory, LogLevel};
use crate::registers::{Reg16, Reg8, Registers};

/// Interrupt enable register.
pub const IE_ADDR: u16 = 0xFFFF;
/// Interrupt flag register.
pub const IF_ADDR: u16 = 0xFF0F;
/// Joypad bit in IE/IF; the only source that ends STOP.
pub const JOYPAD_INTERRUPT: u8 = 0x10;

/// Memory interface trait for the LR35902 CPU
pub trait MemoryLr35902 {
    /// Read a byte from memory
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to memory
    fn write(&mut self, addr: u16, val: u8);
}

impl<T: MemoryLr35902 + ?Sized> MemoryLr35902 for &mut T {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        (**self).write(addr, val)
    }
}

/// Conditions that stop the instruction stream.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("illegal opcode {opcode:#04X} at {pc:#06X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}

/// 8-bit operand slot as encoded in the low three bits of an opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    Reg(Reg8),
    HlIndirect,
}

impl Operand {
    pub(crate) const fn decode(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Operand::Reg(Reg8::B),
            1 => Operand::Reg(Reg8::C),
            2 => Operand::Reg(Reg8::D),
            3 => Operand::Reg(Reg8::E),
            4 => Operand::Reg(Reg8::H),
            5 => Operand::Reg(Reg8::L),
            6 => Operand::HlIndirect,
            _ => Operand::Reg(Reg8::A),
        }
    }
}

/// Sharp LR35902 CPU state
#[derive(Debug)]
pub struct CpuLr35902<M: MemoryLr35902> {
    pub regs: Registers,
    /// Interrupt Master Enable flag
    pub ime: bool,
    /// Instructions left before a pending EI takes effect
    ime_delay: u8,
    /// Halted state (HALT)
    pub halted: bool,
    /// Stopped state (STOP)
    pub stopped: bool,
    /// Machine cycles executed since construction
    cycles: u64,
    /// Memory interface
    pub memory: M,
}

impl<M: MemoryLr35902> CpuLr35902<M> {
    /// CPU in the state the boot ROM leaves behind, about to run cartridge
    /// code at 0x0100.
    pub fn new(memory: M) -> Self {
        Self {
            regs: Registers::post_boot(),
            ime: false,
            ime_delay: 0,
            halted: false,
            stopped: false,
            cycles: 0,
            memory,
        }
    }

    /// CPU that starts at 0x0000 so a mapped boot overlay runs first.
    pub fn with_boot_overlay(memory: M) -> Self {
        let mut cpu = Self::new(memory);
        cpu.regs.pc = 0x0000;
        cpu
    }

    /// Total machine cycles consumed so far. Never decreases.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Execute one instruction (or one idle/interrupt-entry slot) and return
    /// its cost in machine cycles.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        if let Some(cycles) = self.service_interrupts() {
            return Ok(self.account(cycles));
        }

        if self.halted || self.stopped {
            return Ok(self.account(1));
        }

        let opcode = self.fetch_byte();
        self.execute(opcode)
    }

    /// Run an already-fetched opcode. Immediate operands are fetched from PC.
    pub fn execute(&mut self, opcode: u8) -> Result<u32, CpuError> {
        let cycles = Self::OPCODES[opcode as usize](self, opcode)?;

        if self.ime_delay > 0 {
            self.ime_delay -= 1;
            if self.ime_delay == 0 {
                self.ime = true;
            }
        }

        Ok(self.account(cycles))
    }

    fn account(&mut self, cycles: u32) -> u32 {
        self.cycles += cycles as u64;
        cycles
    }

    /// Read the byte at PC and advance PC.
    pub fn fetch_byte(&mut self) -> u8 {
        let val = self.memory.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    /// Little-endian 16-bit immediate: low byte first.
    pub fn fetch_u16(&mut self) -> u16 {
        let lo = self.fetch_byte();
        let hi = self.fetch_byte();
        u16::from_le_bytes([lo, hi])
    }

    pub fn push_u16(&mut self, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.memory.write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.memory.write(self.regs.sp, lo);
    }

    pub fn pop_u16(&mut self) -> u16 {
        let lo = self.memory.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.memory.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn read_operand(&mut self, operand: Operand) -> u8 {
        match operand {
            Operand::Reg(reg) => self.regs.get8(reg),
            Operand::HlIndirect => self.memory.read(self.regs.hl.get()),
        }
    }

    pub(crate) fn write_operand(&mut self, operand: Operand, val: u8) {
        match operand {
            Operand::Reg(reg) => self.regs.set8(reg, val),
            Operand::HlIndirect => self.memory.write(self.regs.hl.get(), val),
        }
    }

    /// NZ / Z / NC / C from bits 3-4 of a conditional opcode.
    pub(crate) fn condition(&self, opcode: u8) -> bool {
        match (opcode >> 3) & 0x03 {
            0 => !self.regs.flag_set(Flags::ZERO),
            1 => self.regs.flag_set(Flags::ZERO),
            2 => !self.regs.flag_set(Flags::CARRY),
            _ => self.regs.flag_set(Flags::CARRY),
        }
    }

    /// Arm the delayed IME enable used by EI.
    pub(crate) fn schedule_ime(&mut self) {
        // EI's own completion counts as the first tick.
        self.ime_delay = 2;
    }

    pub(crate) fn disable_ime(&mut self) {
        self.ime = false;
        self.ime_delay = 0;
    }

    /// Wake from HALT/STOP and enter the highest-priority pending interrupt.
    fn service_interrupts(&mut self) -> Option<u32> {
        let pending = self.memory.read(IE_ADDR) & self.memory.read(IF_ADDR) & 0x1F;
        if pending == 0 {
            return None;
        }

        if self.stopped {
            if pending & JOYPAD_INTERRUPT == 0 {
                return None;
            }
            self.stopped = false;
            log(LogCategory::Cpu, LogLevel::Debug, || {
                format!("STOP released at PC={:04X}", self.regs.pc)
            });
        }

        if self.halted {
            self.halted = false;
            log(LogCategory::Cpu, LogLevel::Debug, || {
                format!("HALT released at PC={:04X} (pending={:02X})", self.regs.pc, pending)
            });
        }

        if !self.ime {
            return None;
        }

        let bit = pending.trailing_zeros() as u16;
        let vector = 0x0040 + bit * 8;
        self.disable_ime();
        let flags = self.memory.read(IF_ADDR);
        self.memory.write(IF_ADDR, flags & !(1u8 << bit));
        let return_addr = self.regs.pc;
        self.push_u16(return_addr);
        self.regs.pc = vector;

        log(LogCategory::Interrupts, LogLevel::Trace, || {
            format!("interrupt {} -> {:04X} (return {:04X})", bit, vector, return_addr)
        });
        Some(5)
    }

    pub(crate) fn pair_for(opcode: u8) -> Reg16 {
        match (opcode >> 4) & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::SP,
        }
    }

    pub(crate) fn stack_pair_for(opcode: u8) -> Reg16 {
        match (opcode >> 4) & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::AF,
        }
    }
}

impl<M: MemoryLr35902> crate::Cpu for CpuLr35902<M> {
    type Error = CpuError;

    fn step(&mut self) -> Result<u32, CpuError> {
        self.step()
    }

    fn cycles(&self) -> u64 {
        self.cycles()
    }
}
