//! LR35902 register file.
//!
//! The CPU exposes its 8-bit registers as four packed 16-bit pairs (AF, BC,
//! DE, HL). Each pair is stored as a single `u16`; the byte accessors
//! read-modify-write that value so writing one half never disturbs the other.

/// A 16-bit register pair with independent high/low byte access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterPair(u16);

impl RegisterPair {
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Full 16-bit value, `(high << 8) | low`.
    pub const fn get(self) -> u16 {
        self.0
    }

    pub fn set(&mut self, value: u16) {
        self.0 = value;
    }

    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn low(self) -> u8 {
        self.0 as u8
    }

    /// Replace the high byte, keeping the current low byte.
    pub fn set_high(&mut self, value: u8) {
        self.0 = (self.0 & 0x00FF) | ((value as u16) << 8);
    }

    /// Replace the low byte, keeping the current high byte.
    pub fn set_low(&mut self, value: u8) {
        self.0 = (self.0 & 0xFF00) | value as u16;
    }
}

impl From<u16> for RegisterPair {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<RegisterPair> for u16 {
    fn from(pair: RegisterPair) -> Self {
        pair.0
    }
}

/// 8-bit register names as encoded in opcode operand fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

/// 16-bit register names used by the pair-addressed opcode families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

/// Complete register file: four pairs plus stack pointer and program counter.
///
/// The flag register lives in the low byte of `af`; see [`crate::flags`] for
/// the accessors that keep its low nibble clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub af: RegisterPair,
    pub bc: RegisterPair,
    pub de: RegisterPair,
    pub hl: RegisterPair,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Register contents the DMG boot ROM leaves behind when it hands over to
    /// cartridge code at 0x0100.
    pub const fn post_boot() -> Self {
        Self {
            af: RegisterPair::new(0x01B0),
            bc: RegisterPair::new(0x0013),
            de: RegisterPair::new(0x00D8),
            hl: RegisterPair::new(0x014D),
            sp: 0xFFFE,
            pc: 0x0100,
        }
    }

    pub fn a(&self) -> u8 {
        self.af.high()
    }

    pub fn set_a(&mut self, value: u8) {
        self.af.set_high(value);
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.af.high(),
            Reg8::B => self.bc.high(),
            Reg8::C => self.bc.low(),
            Reg8::D => self.de.high(),
            Reg8::E => self.de.low(),
            Reg8::H => self.hl.high(),
            Reg8::L => self.hl.low(),
        }
    }

    pub fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.af.set_high(value),
            Reg8::B => self.bc.set_high(value),
            Reg8::C => self.bc.set_low(value),
            Reg8::D => self.de.set_high(value),
            Reg8::E => self.de.set_low(value),
            Reg8::H => self.hl.set_high(value),
            Reg8::L => self.hl.set_low(value),
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => self.af.get(),
            Reg16::BC => self.bc.get(),
            Reg16::DE => self.de.get(),
            Reg16::HL => self.hl.get(),
            Reg16::SP => self.sp,
        }
    }

    /// Write a 16-bit register. Writes to AF drop the low nibble of F.
    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::AF => self.af.set(value & 0xFFF0),
            Reg16::BC => self.bc.set(value),
            Reg16::DE => self.de.set(value),
            Reg16::HL => self.hl.set(value),
            Reg16::SP => self.sp = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_byte_independence() {
        let mut pair = RegisterPair::new(0x8000);
        assert_eq!(pair.high(), 0x80);
        assert_eq!(pair.low(), 0x00);

        pair.set_low(0x80);
        assert_eq!(pair.get(), 0x8080);

        pair.set_high(0x79);
        assert_eq!(pair.get(), 0x7980);
    }

    #[test]
    fn test_pair_repeated_writes_keep_other_half() {
        let mut pair = RegisterPair::default();
        for value in [0x01u8, 0x7F, 0xFF, 0x00] {
            pair.set_high(value);
            pair.set_low(value ^ 0xFF);
            assert_eq!(pair.high(), value);
            assert_eq!(pair.low(), value ^ 0xFF);
        }
    }

    #[test]
    fn test_post_boot_state() {
        let regs = Registers::post_boot();
        assert_eq!(regs.af.get(), 0x01B0);
        assert_eq!(regs.bc.get(), 0x0013);
        assert_eq!(regs.de.get(), 0x00D8);
        assert_eq!(regs.hl.get(), 0x014D);
        assert_eq!(regs.sp, 0xFFFE);
        assert_eq!(regs.pc, 0x0100);
    }

    #[test]
    fn test_reg8_maps_onto_pairs() {
        let mut regs = Registers::default();
        regs.set8(Reg8::D, 0x12);
        regs.set8(Reg8::E, 0x34);
        assert_eq!(regs.de.get(), 0x1234);

        regs.set8(Reg8::H, 0xAB);
        assert_eq!(regs.get8(Reg8::H), 0xAB);
        assert_eq!(regs.hl.get(), 0xAB00);
    }

    #[test]
    fn test_af_write_masks_flag_nibble() {
        let mut regs = Registers::default();
        regs.set16(Reg16::AF, 0x12FF);
        assert_eq!(regs.af.get(), 0x12F0);
    }
}
