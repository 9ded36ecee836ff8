//! Cartridge image loader and header parser.
//!
//! The whole image is read into memory first, then the header is read
//! back from its fixed location at 0x0100-0x014F. The loader does not judge
//! the header; checksum verification is left to the caller.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// First header byte (entry point).
pub const HEADER_START: usize = 0x0100;
/// One past the last header byte.
pub const HEADER_END: usize = 0x0150;
const HEADER_LEN: usize = HEADER_END - HEADER_START;

/// Bytes covered by the header checksum, 0x0134-0x014C.
const CHECKSUM_RANGE: std::ops::RangeInclusive<usize> = 0x0134..=0x014C;

#[derive(thiserror::Error, Debug)]
pub enum CartridgeError {
    #[error("failed to read cartridge: {0}")]
    Io(#[from] std::io::Error),
    #[error("cartridge image is {len} bytes, too short to hold a header")]
    Truncated { len: usize },
}

/// Header fields at their hardware offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// 0x0100-0x0103, usually `NOP; JP 0x0150`
    pub entry_point: [u8; 4],
    /// 0x0104-0x0133
    pub logo: [u8; 48],
    /// 0x0134-0x0143; the last byte doubles as the CGB flag
    pub title: [u8; 16],
    /// 0x0144-0x0145
    pub new_licensee_code: [u8; 2],
    /// 0x0146
    pub sgb_flag: u8,
    /// 0x0147
    pub cartridge_type: u8,
    /// 0x0148
    pub rom_size: u8,
    /// 0x0149
    pub ram_size: u8,
    /// 0x014A
    pub destination_code: u8,
    /// 0x014B
    pub old_licensee_code: u8,
    /// 0x014C
    pub mask_rom_version: u8,
    /// 0x014D
    pub header_checksum: u8,
    /// 0x014E-0x014F, big-endian
    pub global_checksum: [u8; 2],
}

impl CartridgeHeader {
    fn parse(raw: &[u8; HEADER_LEN]) -> Self {
        let field = |addr: usize| raw[addr - HEADER_START];
        let mut entry_point = [0; 4];
        let mut logo = [0; 48];
        let mut title = [0; 16];
        entry_point.copy_from_slice(&raw[0x00..0x04]);
        logo.copy_from_slice(&raw[0x04..0x34]);
        title.copy_from_slice(&raw[0x34..0x44]);

        Self {
            entry_point,
            logo,
            title,
            new_licensee_code: [field(0x0144), field(0x0145)],
            sgb_flag: field(0x0146),
            cartridge_type: field(0x0147),
            rom_size: field(0x0148),
            ram_size: field(0x0149),
            destination_code: field(0x014A),
            old_licensee_code: field(0x014B),
            mask_rom_version: field(0x014C),
            header_checksum: field(0x014D),
            global_checksum: [field(0x014E), field(0x014F)],
        }
    }

    pub fn cgb_flag(&self) -> u8 {
        self.title[15]
    }

    /// Printable title. Stops at the first NUL; a CGB flag in the last
    /// byte is not part of the title.
    pub fn title(&self) -> String {
        let len = if self.supports_cgb() { 15 } else { 16 };
        self.title[..len]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }

    pub fn supports_cgb(&self) -> bool {
        self.cgb_flag() & 0x80 != 0
    }

    pub fn supports_sgb(&self) -> bool {
        self.sgb_flag == 0x03
    }

    pub fn cartridge_type_name(&self) -> &'static str {
        match self.cartridge_type {
            0x00 => "ROM ONLY",
            0x01 => "MBC1",
            0x02 => "MBC1+RAM",
            0x03 => "MBC1+RAM+BATTERY",
            0x05 => "MBC2",
            0x06 => "MBC2+BATTERY",
            0x08 => "ROM+RAM",
            0x09 => "ROM+RAM+BATTERY",
            0x0B => "MMM01",
            0x0C => "MMM01+RAM",
            0x0D => "MMM01+RAM+BATTERY",
            0x0F => "MBC3+TIMER+BATTERY",
            0x10 => "MBC3+TIMER+RAM+BATTERY",
            0x11 => "MBC3",
            0x12 => "MBC3+RAM",
            0x13 => "MBC3+RAM+BATTERY",
            0x19 => "MBC5",
            0x1A => "MBC5+RAM",
            0x1B => "MBC5+RAM+BATTERY",
            0x1C => "MBC5+RUMBLE",
            0x1D => "MBC5+RUMBLE+RAM",
            0x1E => "MBC5+RUMBLE+RAM+BATTERY",
            0x20 => "MBC6",
            0x22 => "MBC7+SENSOR+RUMBLE+RAM+BATTERY",
            0xFC => "POCKET CAMERA",
            0xFD => "BANDAI TAMA5",
            0xFE => "HuC3",
            0xFF => "HuC1+RAM+BATTERY",
            _ => "UNKNOWN",
        }
    }

    /// Declared ROM size; `None` for codes outside the known table.
    pub fn rom_size_bytes(&self) -> Option<usize> {
        const BANK: usize = 16 * 1024;
        match self.rom_size {
            code @ 0x00..=0x08 => Some(2 * BANK << code),
            0x52 => Some(72 * BANK),
            0x53 => Some(80 * BANK),
            0x54 => Some(96 * BANK),
            _ => None,
        }
    }

    /// Declared external RAM size; `None` for unknown codes.
    pub fn ram_size_bytes(&self) -> Option<usize> {
        match self.ram_size {
            0x00 => Some(0),
            0x01 => Some(2 * 1024),
            0x02 => Some(8 * 1024),
            0x03 => Some(32 * 1024),
            0x04 => Some(128 * 1024),
            0x05 => Some(64 * 1024),
            _ => None,
        }
    }

    pub fn global_checksum(&self) -> u16 {
        u16::from_be_bytes(self.global_checksum)
    }
}

/// Header checksum as the boot ROM computes it over 0x0134-0x014C.
/// Bytes missing from a short image count as absent.
pub fn computed_header_checksum(rom: &[u8]) -> u8 {
    rom.iter()
        .skip(*CHECKSUM_RANGE.start())
        .take(CHECKSUM_RANGE.count())
        .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1))
}

/// Sum of every byte except the two global checksum bytes.
pub fn computed_global_checksum(rom: &[u8]) -> u16 {
    rom.iter()
        .enumerate()
        .filter(|(i, _)| !matches!(*i, 0x014E | 0x014F))
        .fold(0u16, |acc, (_, &b)| acc.wrapping_add(b as u16))
}

/// A loaded cartridge image and its parsed header.
#[derive(Debug, Clone)]
pub struct Cartridge {
    rom: Arc<[u8]>,
    pub header: CartridgeHeader,
}

impl Cartridge {
    pub fn load<R: Read + Seek>(mut reader: R) -> Result<Self, CartridgeError> {
        let mut rom = Vec::new();
        reader.read_to_end(&mut rom)?;
        if rom.len() < HEADER_END {
            return Err(CartridgeError::Truncated { len: rom.len() });
        }

        reader.seek(SeekFrom::Start(HEADER_START as u64))?;
        let mut raw = [0u8; HEADER_LEN];
        reader.read_exact(&mut raw)?;

        Ok(Self {
            rom: rom.into(),
            header: CartridgeHeader::parse(&raw),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let file = File::open(path)?;
        Self::load(BufReader::new(file))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        Self::load(std::io::Cursor::new(data))
    }

    /// Shared handle to the raw image.
    pub fn rom(&self) -> Arc<[u8]> {
        Arc::clone(&self.rom)
    }

    pub fn len(&self) -> usize {
        self.rom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rom.is_empty()
    }

    pub fn header_checksum_ok(&self) -> bool {
        computed_header_checksum(&self.rom) == self.header.header_checksum
    }

    pub fn global_checksum_ok(&self) -> bool {
        computed_global_checksum(&self.rom) == self.header.global_checksum()
    }

    /// Header summary for display.
    pub fn header_json(&self) -> serde_json::Value {
        let h = &self.header;
        serde_json::json!({
            "title": h.title(),
            "cartridge_type": h.cartridge_type,
            "cartridge_type_name": h.cartridge_type_name(),
            "rom_size_bytes": h.rom_size_bytes(),
            "ram_size_bytes": h.ram_size_bytes(),
            "image_bytes": self.rom.len(),
            "cgb": h.supports_cgb(),
            "sgb": h.supports_sgb(),
            "destination_code": h.destination_code,
            "old_licensee_code": h.old_licensee_code,
            "new_licensee_code": String::from_utf8_lossy(&h.new_licensee_code),
            "mask_rom_version": h.mask_rom_version,
            "header_checksum": h.header_checksum,
            "header_checksum_ok": self.header_checksum_ok(),
            "global_checksum": h.global_checksum(),
            "global_checksum_ok": self.global_checksum_ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture_rom(title: &[u8]) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0100..0x0104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
        rom[0x0134..0x0134 + title.len()].copy_from_slice(title);
        rom[0x0147] = 0x00;
        rom[0x0148] = 0x00;
        rom[0x0149] = 0x00;
        rom[0x014D] = computed_header_checksum(&rom);
        let global = computed_global_checksum(&rom).to_be_bytes();
        rom[0x014E..0x0150].copy_from_slice(&global);
        rom
    }

    #[test]
    fn test_title_round_trip() {
        let cart = Cartridge::from_bytes(&fixture_rom(b"POKEMON RED")).unwrap();
        assert_eq!(cart.header.title(), "POKEMON RED");
        assert_eq!(&cart.header.title[..11], b"POKEMON RED");
    }

    #[test]
    fn test_full_width_title() {
        let cart = Cartridge::from_bytes(&fixture_rom(b"SIXTEEN CHAR TTL")).unwrap();
        assert_eq!(cart.header.title(), "SIXTEEN CHAR TTL");
        assert!(!cart.header.supports_cgb());
    }

    #[test]
    fn test_cgb_flag_not_part_of_title() {
        let mut rom = fixture_rom(b"COLORGAME");
        rom[0x0143] = 0xC0;
        let cart = Cartridge::from_bytes(&rom).unwrap();
        assert!(cart.header.supports_cgb());
        assert_eq!(cart.header.cgb_flag(), 0xC0);
        assert_eq!(cart.header.title(), "COLORGAME");
    }

    #[test]
    fn test_header_offsets() {
        let mut rom = fixture_rom(b"OFFSETS");
        rom[0x0144] = b'0';
        rom[0x0145] = b'1';
        rom[0x0146] = 0x03;
        rom[0x0147] = 0x13;
        rom[0x0148] = 0x05;
        rom[0x0149] = 0x03;
        rom[0x014A] = 0x01;
        rom[0x014B] = 0x33;
        rom[0x014C] = 0x02;
        let cart = Cartridge::from_bytes(&rom).unwrap();
        let h = &cart.header;

        assert_eq!(h.entry_point, [0x00, 0xC3, 0x50, 0x01]);
        assert_eq!(&h.new_licensee_code, b"01");
        assert!(h.supports_sgb());
        assert_eq!(h.cartridge_type, 0x13);
        assert_eq!(h.cartridge_type_name(), "MBC3+RAM+BATTERY");
        assert_eq!(h.rom_size_bytes(), Some(1024 * 1024));
        assert_eq!(h.ram_size_bytes(), Some(32 * 1024));
        assert_eq!(h.destination_code, 0x01);
        assert_eq!(h.old_licensee_code, 0x33);
        assert_eq!(h.mask_rom_version, 0x02);
    }

    #[test]
    fn test_size_codes() {
        let mut rom = fixture_rom(b"SIZES");
        rom[0x0148] = 0x00;
        let cart = Cartridge::from_bytes(&rom).unwrap();
        assert_eq!(cart.header.rom_size_bytes(), Some(32 * 1024));

        rom[0x0148] = 0x52;
        rom[0x0149] = 0x07;
        let cart = Cartridge::from_bytes(&rom).unwrap();
        assert_eq!(cart.header.rom_size_bytes(), Some(72 * 16 * 1024));
        assert_eq!(cart.header.ram_size_bytes(), None);

        rom[0x0148] = 0x42;
        let cart = Cartridge::from_bytes(&rom).unwrap();
        assert_eq!(cart.header.rom_size_bytes(), None);
    }

    #[test]
    fn test_checksums() {
        let mut rom = fixture_rom(b"CHECKSUM");
        let cart = Cartridge::from_bytes(&rom).unwrap();
        assert!(cart.header_checksum_ok());
        assert!(cart.global_checksum_ok());

        rom[0x0140] ^= 0xFF;
        let cart = Cartridge::from_bytes(&rom).unwrap();
        assert!(!cart.header_checksum_ok());
        assert!(!cart.global_checksum_ok());
    }

    #[test]
    fn test_known_header_checksum() {
        // All-zero header region: 25 decrements from zero.
        let rom = vec![0u8; 0x150];
        assert_eq!(computed_header_checksum(&rom), 0u8.wrapping_sub(25));
    }

    #[test]
    fn test_truncated_image() {
        let err = Cartridge::from_bytes(&[0u8; 0x14F]).unwrap_err();
        assert!(matches!(err, CartridgeError::Truncated { len: 0x14F }));

        let err = Cartridge::from_bytes(&[]).unwrap_err();
        assert!(matches!(err, CartridgeError::Truncated { len: 0 }));
    }

    #[test]
    fn test_minimum_image_loads() {
        let cart = Cartridge::from_bytes(&[0u8; HEADER_END]).unwrap();
        assert_eq!(cart.len(), HEADER_END);
        assert_eq!(cart.header.title(), "");
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&fixture_rom(b"FROM DISK")).unwrap();
        let cart = Cartridge::from_path(file.path()).unwrap();
        assert_eq!(cart.header.title(), "FROM DISK");
        assert_eq!(cart.len(), 0x8000);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Cartridge::from_path(dir.path().join("nope.gb")).unwrap_err();
        assert!(matches!(err, CartridgeError::Io(_)));
    }

    #[test]
    fn test_rom_handle_is_shared() {
        let cart = Cartridge::from_bytes(&fixture_rom(b"SHARED")).unwrap();
        let a = cart.rom();
        let b = cart.rom();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_header_json() {
        let cart = Cartridge::from_bytes(&fixture_rom(b"JSON")).unwrap();
        let v = cart.header_json();
        assert_eq!(v["title"], "JSON");
        assert_eq!(v["cartridge_type_name"], "ROM ONLY");
        assert_eq!(v["rom_size_bytes"], 32768);
        assert_eq!(v["header_checksum_ok"], true);
    }
}
