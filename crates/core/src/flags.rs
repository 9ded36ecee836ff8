//! Flag register layered on the low byte of AF.
//!
//! Only the top nibble is meaningful; every accessor here goes through
//! [`Flags::from_bits_truncate`] so the low nibble is always written as zero.

use crate::registers::Registers;

bitflags::bitflags! {
    /// Z/N/H/C status bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Result was zero
        const ZERO = 0x80;
        /// Last ALU operation was a subtraction
        const SUBTRACT = 0x40;
        /// Carry/borrow between bit 3 and bit 4
        const HALF_CARRY = 0x20;
        /// Carry/borrow out of the top bit
        const CARRY = 0x10;
    }
}

impl Registers {
    pub fn flags(&self) -> Flags {
        Flags::from_bits_truncate(self.af.low())
    }

    pub fn flag_set(&self, flag: Flags) -> bool {
        self.flags().contains(flag)
    }

    pub fn set_flag(&mut self, flag: Flags) {
        self.reset_flags(self.flags() | flag);
    }

    pub fn clear_flag(&mut self, flag: Flags) {
        self.reset_flags(self.flags() - flag);
    }

    pub fn toggle_flag(&mut self, flag: Flags) {
        self.reset_flags(self.flags() ^ flag);
    }

    /// Overwrite the whole nibble with exactly `flags`.
    pub fn reset_flags(&mut self, flags: Flags) {
        self.af.set_low(flags.bits());
    }
}
