//! Game Boy memory management unit
//!
//! Owns every addressable byte and decides, per access, which region
//! services it. Side effects are write interceptions at fixed addresses;
//! the only one modeled is the boot overlay disable at 0xFF50.
//!
//! # Memory Map
//!
//! ```text
//! $0000-$00FF  Boot overlay while enabled, then cartridge ROM
//! $0100-$3FFF  Cartridge ROM, fixed bank 0
//! $4000-$7FFF  Cartridge ROM, switchable window (mapper)
//! $8000-$9FFF  Video RAM (8KB)
//! $A000-$BFFF  External RAM (8KB)
//! $C000-$DFFF  Work RAM (8KB)
//! $E000-$FDFF  Echo RAM (mirror of $C000-$DDFF)
//! $FE00-$FE9F  OAM (160 bytes)
//! $FEA0-$FEFF  Not usable
//! $FF00-$FF7F  I/O registers ($FF0F = IF, $FF50 = boot overlay disable)
//! $FF80-$FFFE  High RAM (127 bytes)
//! $FFFF        Interrupt Enable register
//! ```
//!
//! I/O registers are plain storage apart from $FF50; no peripheral behind
//! them is modeled.

use crate::boot_rom::BootRom;
use crate::mappers::Mapper;
use dmg_core::cpu_lr35902::{MemoryLr35902, IF_ADDR};
use dmg_core::logging::{log, LogCategory, LogLevel};

/// Boot overlay disable register.
pub const BOOT_OVERLAY_DISABLE: u16 = 0xFF50;

/// Backing region for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    BootOverlay,
    RomBank0,
    RomWindow,
    VideoRam,
    ExternalRam,
    WorkRam,
    EchoRam,
    Oam,
    Unusable,
    Io,
    HighRam,
    InterruptEnable,
}

impl Region {
    /// Every `u16` lands in exactly one arm.
    pub const fn decode(addr: u16) -> Self {
        match addr {
            0x0000..=0x00FF => Region::BootOverlay,
            0x0100..=0x3FFF => Region::RomBank0,
            0x4000..=0x7FFF => Region::RomWindow,
            0x8000..=0x9FFF => Region::VideoRam,
            0xA000..=0xBFFF => Region::ExternalRam,
            0xC000..=0xDFFF => Region::WorkRam,
            0xE000..=0xFDFF => Region::EchoRam,
            0xFE00..=0xFE9F => Region::Oam,
            0xFEA0..=0xFEFF => Region::Unusable,
            0xFF00..=0xFF7F => Region::Io,
            0xFF80..=0xFFFE => Region::HighRam,
            0xFFFF => Region::InterruptEnable,
        }
    }
}

/// Game Boy memory map
#[derive(Debug, Clone)]
pub struct Mmu {
    mapper: Mapper,
    boot_rom: Option<BootRom>,
    boot_overlay_enabled: bool,
    /// Video RAM (8KB)
    vram: [u8; 0x2000],
    /// External cartridge RAM (8KB)
    eram: [u8; 0x2000],
    /// Work RAM (8KB)
    wram: [u8; 0x2000],
    oam: [u8; 0xA0],
    io: [u8; 0x80],
    /// High RAM (127 bytes)
    hram: [u8; 0x7F],
    /// Interrupt Enable register
    ie: u8,
}

impl Mmu {
    /// The overlay starts enabled only when a boot image is supplied.
    pub fn new(mapper: Mapper, boot_rom: Option<BootRom>) -> Self {
        Self {
            mapper,
            boot_overlay_enabled: boot_rom.is_some(),
            boot_rom,
            vram: [0; 0x2000],
            eram: [0; 0x2000],
            wram: [0; 0x2000],
            oam: [0; 0xA0],
            io: [0; 0x80],
            hram: [0; 0x7F],
            ie: 0,
        }
    }

    pub fn boot_overlay_enabled(&self) -> bool {
        self.boot_overlay_enabled
    }

    /// Raise an interrupt request bit in IF.
    /// Bit 0: VBlank, 1: LCD STAT, 2: Timer, 3: Serial, 4: Joypad
    pub fn request_interrupt(&mut self, interrupt_bit: u8) {
        self.io[(IF_ADDR - 0xFF00) as usize] |= interrupt_bit & 0x1F;
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        if addr == BOOT_OVERLAY_DISABLE && self.boot_overlay_enabled {
            self.boot_overlay_enabled = false;
            log(LogCategory::Mmu, LogLevel::Info, || {
                format!("boot overlay disabled (wrote {:02X} to FF50)", val)
            });
        }
        self.io[(addr - 0xFF00) as usize] = val;
    }
}

impl MemoryLr35902 for Mmu {
    fn read(&self, addr: u16) -> u8 {
        match Region::decode(addr) {
            Region::BootOverlay => match &self.boot_rom {
                Some(boot) if self.boot_overlay_enabled => boot.read(addr as u8),
                _ => self.mapper.read_rom(addr),
            },
            Region::RomBank0 | Region::RomWindow => self.mapper.read_rom(addr),
            Region::VideoRam => self.vram[(addr - 0x8000) as usize],
            Region::ExternalRam => self.eram[(addr - 0xA000) as usize],
            Region::WorkRam => self.wram[(addr - 0xC000) as usize],
            Region::EchoRam => self.wram[(addr - 0xE000) as usize],
            Region::Oam => self.oam[(addr - 0xFE00) as usize],
            Region::Unusable => 0xFF,
            Region::Io => self.io[(addr - 0xFF00) as usize],
            Region::HighRam => self.hram[(addr - 0xFF80) as usize],
            Region::InterruptEnable => self.ie,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match Region::decode(addr) {
            // ROM is read-only; writes are mapper commands
            Region::BootOverlay | Region::RomBank0 | Region::RomWindow => {
                self.mapper.write_rom(addr, val)
            }
            Region::VideoRam => self.vram[(addr - 0x8000) as usize] = val,
            Region::ExternalRam => self.eram[(addr - 0xA000) as usize] = val,
            Region::WorkRam => self.wram[(addr - 0xC000) as usize] = val,
            Region::EchoRam => self.wram[(addr - 0xE000) as usize] = val,
            Region::Oam => self.oam[(addr - 0xFE00) as usize] = val,
            Region::Unusable => {}
            Region::Io => self.write_io(addr, val),
            Region::HighRam => self.hram[(addr - 0xFF80) as usize] = val,
            Region::InterruptEnable => self.ie = val,
        }
    }
}
