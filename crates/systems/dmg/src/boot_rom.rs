//! The 256-byte boot image mapped over 0x0000-0x00FF at power-on.

use std::fs;
use std::path::Path;

pub const BOOT_ROM_SIZE: usize = 0x100;

#[derive(thiserror::Error, Debug)]
pub enum BootRomError {
    #[error("failed to read boot ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("boot ROM must be exactly {BOOT_ROM_SIZE} bytes, got {len}")]
    WrongSize { len: usize },
}

#[derive(Clone, PartialEq, Eq)]
pub struct BootRom(Box<[u8; BOOT_ROM_SIZE]>);

impl BootRom {
    pub fn from_bytes(data: &[u8]) -> Result<Self, BootRomError> {
        let image: [u8; BOOT_ROM_SIZE] = data
            .try_into()
            .map_err(|_| BootRomError::WrongSize { len: data.len() })?;
        Ok(Self(Box::new(image)))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BootRomError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn read(&self, offset: u8) -> u8 {
        self.0[offset as usize]
    }
}

impl std::fmt::Debug for BootRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BootRom").field(&format_args!("{} bytes", BOOT_ROM_SIZE)).finish()
    }
}
