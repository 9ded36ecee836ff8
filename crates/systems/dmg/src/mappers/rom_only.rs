//! ROM-only cartridge: no banking hardware.
//!
//! The whole image is visible directly through 0x0000-0x7FFF, so the
//! switchable window at 0x4000 always shows the second 16KB of the file.

use dmg_core::logging::{log, LogCategory, LogLevel};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RomOnly {
    rom: Arc<[u8]>,
}

impl RomOnly {
    pub fn new(rom: Arc<[u8]>) -> Self {
        Self { rom }
    }

    /// Bytes past the end of a short image read as 0xFF (open bus).
    pub fn read_rom(&self, addr: u16) -> u8 {
        self.rom.get(addr as usize).copied().unwrap_or(0xFF)
    }

    pub fn write_rom(&mut self, addr: u16, val: u8) {
        log(LogCategory::Stubs, LogLevel::Debug, || {
            format!("ROM-only cartridge ignored write {:02X} to {:04X}", val, addr)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rom_only_read() {
        let mut rom = vec![0; 0x8000];
        rom[0x0000] = 0x12;
        rom[0x4000] = 0x34;
        rom[0x7FFF] = 0x56;

        let mbc = RomOnly::new(rom.into());

        assert_eq!(mbc.read_rom(0x0000), 0x12);
        assert_eq!(mbc.read_rom(0x4000), 0x34);
        assert_eq!(mbc.read_rom(0x7FFF), 0x56);
    }

    #[test]
    fn test_rom_only_short_image_reads_open_bus() {
        let mbc = RomOnly::new(vec![0xAA; 0x150].into());
        assert_eq!(mbc.read_rom(0x014F), 0xAA);
        assert_eq!(mbc.read_rom(0x0150), 0xFF);
        assert_eq!(mbc.read_rom(0x7FFF), 0xFF);
    }

    #[test]
    fn test_rom_only_write_ignored() {
        let mut rom = vec![0; 0x8000];
        rom[0x2000] = 0xAA;
        let mut mbc = RomOnly::new(rom.into());

        mbc.write_rom(0x2000, 0x01);
        assert_eq!(mbc.read_rom(0x2000), 0xAA);
    }
}
