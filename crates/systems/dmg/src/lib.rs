//! Game Boy (DMG) system: memory map, cartridge and frame loop.

pub mod boot_rom;
pub mod cartridge;
pub mod mappers;
pub mod mmu;

use std::path::Path;

use dmg_core::cpu_lr35902::{CpuError, CpuLr35902};
use dmg_core::logging::{log, LogCategory, LogLevel};
use dmg_core::timing::FrameTiming;
use dmg_core::types::FrameReport;
use dmg_core::System;

pub use boot_rom::{BootRom, BootRomError};
pub use cartridge::{Cartridge, CartridgeError, CartridgeHeader};
pub use mappers::Mapper;
pub use mmu::{Mmu, Region};

#[derive(thiserror::Error, Debug)]
pub enum DmgError {
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error(transparent)]
    BootRom(#[from] BootRomError),
}

pub struct DmgSystem {
    cpu: CpuLr35902<Mmu>,
    cartridge: Cartridge,
    boot_rom: Option<BootRom>,
    timing: FrameTiming,
}

impl DmgSystem {
    pub fn new(cartridge: Cartridge, boot_rom: Option<BootRom>) -> Self {
        if !cartridge.header_checksum_ok() {
            log(LogCategory::Cartridge, LogLevel::Warn, || {
                format!(
                    "header checksum mismatch for \"{}\": stored {:02X}, computed {:02X}",
                    cartridge.header.title(),
                    cartridge.header.header_checksum,
                    cartridge::computed_header_checksum(&cartridge.rom()),
                )
            });
        }

        let cpu = Self::build_cpu(&cartridge, boot_rom.as_ref());
        Self {
            cpu,
            cartridge,
            boot_rom,
            timing: FrameTiming::default(),
        }
    }

    /// Load the cartridge (and optional boot image) from disk.
    pub fn from_paths<P: AsRef<Path>>(rom: P, boot_rom: Option<P>) -> Result<Self, DmgError> {
        let cartridge = Cartridge::from_path(rom)?;
        let boot_rom = boot_rom.map(BootRom::from_path).transpose()?;
        Ok(Self::new(cartridge, boot_rom))
    }

    pub fn with_timing(mut self, timing: FrameTiming) -> Self {
        self.timing = timing;
        self
    }

    fn build_cpu(cartridge: &Cartridge, boot_rom: Option<&BootRom>) -> CpuLr35902<Mmu> {
        let mapper = Mapper::from_cart(cartridge.rom(), cartridge.header.cartridge_type);
        let mmu = Mmu::new(mapper, boot_rom.cloned());
        if boot_rom.is_some() {
            CpuLr35902::with_boot_overlay(mmu)
        } else {
            CpuLr35902::new(mmu)
        }
    }

    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cpu(&self) -> &CpuLr35902<Mmu> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CpuLr35902<Mmu> {
        &mut self.cpu
    }

    /// Run one frame, checking `should_stop` before every instruction.
    pub fn step_frame_until<F>(&mut self, mut should_stop: F) -> Result<FrameReport, DmgError>
    where
        F: FnMut() -> bool,
    {
        let budget = self.timing.budget() as u64;
        let mut report = FrameReport::default();

        while report.cycles < budget {
            if should_stop() {
                report.interrupted = true;
                break;
            }
            report.cycles += self.cpu.step()? as u64;
            report.instructions += 1;
        }

        Ok(report)
    }
}

impl System for DmgSystem {
    type Error = DmgError;

    fn reset(&mut self) {
        self.cpu = Self::build_cpu(&self.cartridge, self.boot_rom.as_ref());
    }

    fn step(&mut self) -> Result<u32, Self::Error> {
        Ok(self.cpu.step()?)
    }

    fn step_frame(&mut self) -> Result<FrameReport, Self::Error> {
        self.step_frame_until(|| false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmg_core::cpu_lr35902::MemoryLr35902;

    /// 32KB ROM whose entry point jumps into a `JR -2` loop at 0x0150.
    fn looping_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0100..0x0104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
        rom[0x0134..0x0138].copy_from_slice(b"LOOP");
        rom[0x0150..0x0152].copy_from_slice(&[0x18, 0xFE]);
        rom[0x014D] = cartridge::computed_header_checksum(&rom);
        rom
    }

    fn make_system() -> DmgSystem {
        DmgSystem::new(Cartridge::from_bytes(&looping_rom()).unwrap(), None)
    }

    #[test]
    fn test_dmg_system_creation() {
        let sys = make_system();
        assert_eq!(sys.cpu().regs.pc, 0x0100);
        assert!(!sys.cpu().memory.boot_overlay_enabled());
        assert_eq!(sys.timing(), FrameTiming::Refresh);
    }

    #[test]
    fn test_step_runs_one_instruction() {
        let mut sys = make_system();
        assert_eq!(sys.step().unwrap(), 1); // NOP
        assert_eq!(sys.step().unwrap(), 4); // JP 0x0150
        assert_eq!(sys.cpu().regs.pc, 0x0150);
    }

    #[test]
    fn test_step_frame_meets_budget() {
        let mut sys = make_system();
        let report = sys.step_frame().unwrap();
        assert!(report.cycles >= 70221);
        assert!(report.cycles < 70221 + 6);
        assert!(!report.interrupted);
        assert_eq!(sys.cpu().cycles(), report.cycles);
    }

    #[test]
    fn test_scanline_timing_budget() {
        let mut sys = make_system().with_timing(FrameTiming::Scanline);
        let report = sys.step_frame().unwrap();
        assert!(report.cycles >= 17556);
        assert!(report.cycles < 17556 + 6);
    }

    #[test]
    fn test_step_frame_until_stops_between_instructions() {
        let mut sys = make_system();
        let mut remaining = 3;
        let report = sys
            .step_frame_until(|| {
                if remaining == 0 {
                    return true;
                }
                remaining -= 1;
                false
            })
            .unwrap();
        assert!(report.interrupted);
        assert_eq!(report.instructions, 3);
        assert_eq!(report.cycles, 1 + 4 + 3);
    }

    #[test]
    fn test_reset_rebuilds_cpu_and_memory() {
        let mut sys = make_system();
        sys.step_frame().unwrap();
        sys.cpu_mut().memory.write(0xC000, 0x42);

        sys.reset();
        assert_eq!(sys.cpu().regs.pc, 0x0100);
        assert_eq!(sys.cpu().cycles(), 0);
        assert_eq!(sys.cpu().memory.read(0xC000), 0x00);
    }

    #[test]
    fn test_illegal_opcode_surfaces() {
        let mut rom = looping_rom();
        rom[0x0150] = 0xD3;
        let mut sys = DmgSystem::new(Cartridge::from_bytes(&rom).unwrap(), None);
        let err = sys.step_frame().unwrap_err();
        assert!(matches!(
            err,
            DmgError::Cpu(CpuError::IllegalOpcode { opcode: 0xD3, pc: 0x0150 })
        ));
    }

    #[test]
    fn test_boot_overlay_starts_at_zero() {
        let mut boot = vec![0u8; boot_rom::BOOT_ROM_SIZE];
        // JP 0x00FC
        boot[..3].copy_from_slice(&[0xC3, 0xFC, 0x00]);
        // LD A,1; LDH (0x50),A, ending on the last overlay byte
        boot[0xFC..].copy_from_slice(&[0x3E, 0x01, 0xE0, 0x50]);
        let boot = BootRom::from_bytes(&boot).unwrap();
        let mut sys = DmgSystem::new(Cartridge::from_bytes(&looping_rom()).unwrap(), Some(boot));

        assert_eq!(sys.cpu().regs.pc, 0x0000);
        assert!(sys.cpu().memory.boot_overlay_enabled());
        sys.step().unwrap();
        assert_eq!(sys.cpu().regs.pc, 0x00FC);
        sys.step().unwrap();
        assert!(sys.cpu().memory.boot_overlay_enabled());
        sys.step().unwrap();
        assert!(!sys.cpu().memory.boot_overlay_enabled());
        assert_eq!(sys.cpu().regs.pc, 0x0100);

        // Execution falls through into the cartridge entry point.
        assert_eq!(sys.step().unwrap(), 1); // NOP
        sys.step().unwrap(); // JP 0x0150
        assert_eq!(sys.cpu().regs.pc, 0x0150);

        sys.reset();
        assert!(sys.cpu().memory.boot_overlay_enabled());
        assert_eq!(sys.cpu().regs.pc, 0x0000);
    }
}
