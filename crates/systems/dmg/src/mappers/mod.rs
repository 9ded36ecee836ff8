//! Cartridge mappers (memory bank controllers).
//!
//! The MMU forwards every access to 0x0000-0x7FFF (outside the boot
//! overlay) through [`Mapper`], so a banking controller only needs a new
//! variant here. Only the ROM-only cartridge is modeled.

mod rom_only;

pub use rom_only::RomOnly;

use dmg_core::logging::{log, LogCategory, LogLevel};
use std::sync::Arc;

/// Unified mapper enum that dispatches to specific implementations
#[derive(Debug, Clone)]
pub enum Mapper {
    RomOnly(RomOnly),
}

impl Mapper {
    /// Create a mapper from ROM data and the header's cartridge type byte.
    ///
    /// Types without a modeled controller fall back to ROM-only access.
    pub fn from_cart(rom: Arc<[u8]>, cart_type: u8) -> Self {
        match cart_type {
            0x00 => {}        // ROM ONLY
            0x08 | 0x09 => {} // ROM+RAM, ROM+RAM+BATTERY
            other => {
                log(LogCategory::Cartridge, LogLevel::Warn, || {
                    format!(
                        "cartridge type {:02X} has no bank controller model; using ROM-only access",
                        other
                    )
                });
            }
        }
        Mapper::RomOnly(RomOnly::new(rom))
    }

    /// Read from ROM address space
    pub fn read_rom(&self, addr: u16) -> u8 {
        match self {
            Mapper::RomOnly(m) => m.read_rom(addr),
        }
    }

    /// Write to ROM address space (controller registers on banked carts)
    pub fn write_rom(&mut self, addr: u16, val: u8) {
        match self {
            Mapper::RomOnly(m) => m.write_rom(addr, val),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mapper::RomOnly(_) => "ROM ONLY",
        }
    }
}
