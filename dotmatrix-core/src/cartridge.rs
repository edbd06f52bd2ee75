mod mbc;

use crate::memory::address;
use mbc::Mbc;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("header should be at least 336 bytes, was {header_len} bytes")]
    HeaderTooShort { header_len: usize },
    #[error("unsupported mapper byte in cartridge header: {mapper_byte:02X}")]
    UnsupportedMapper { mapper_byte: u8 },
    #[error("invalid ROM size code in cartridge header: {rom_size_code:02X}")]
    InvalidRomSize { rom_size_code: u8 },
    #[error("ROM image is {actual} bytes but header declares {declared} bytes")]
    RomTruncated { declared: usize, actual: usize },
    #[error("invalid RAM size code, expected 0 or 2-5: {ram_size_code}")]
    InvalidRamSize { ram_size_code: u8 },
    #[error("error reading data from {file_path}: {source}")]
    FileReadError {
        file_path: String,
        #[source]
        source: io::Error,
    },
}

impl CartridgeLoadError {
    /// Whether the failure is "this cartridge needs hardware we don't
    /// emulate" rather than "this file is not a valid cartridge".
    pub fn is_unsupported_mapper(&self) -> bool {
        matches!(self, Self::UnsupportedMapper { .. })
    }
}

#[derive(Debug)]
struct RamBattery {
    dirty: bool,
    sav_path: PathBuf,
}

impl RamBattery {
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn persist_ram(&mut self, ram: &[u8]) -> Result<(), io::Error> {
        if !self.dirty {
            return Ok(());
        }

        let tmp_file = self.sav_path.with_extension("sav.tmp");
        fs::write(&tmp_file, ram)?;
        fs::rename(&tmp_file, &self.sav_path)?;

        self.dirty = false;

        Ok(())
    }
}

fn load_sav_file<P>(sav_file: P) -> Result<Option<Vec<u8>>, CartridgeLoadError>
where
    P: AsRef<Path>,
{
    let ram = if fs::metadata(sav_file.as_ref()).map(|metadata| metadata.is_file()).unwrap_or(false)
    {
        Some(fs::read(sav_file.as_ref()).map_err(|err| CartridgeLoadError::FileReadError {
            file_path: sav_file.as_ref().to_str().unwrap_or("").into(),
            source: err,
        })?)
    } else {
        None
    };

    if ram.is_some() {
        log::info!("Loaded external RAM from {}", sav_file.as_ref().display());
    }

    Ok(ram)
}

fn declared_rom_size(rom_size_code: u8) -> Option<usize> {
    // 0x00 = 32 KiB, each step doubles, up to 8 MiB
    (rom_size_code <= 0x08).then(|| (32 * 1024) << rom_size_code)
}

fn declared_ram_size(ram_size_code: u8) -> Option<usize> {
    match ram_size_code {
        0x00 => Some(0),
        0x02 => Some(8192),
        0x03 => Some(32768),
        0x04 => Some(131072),
        0x05 => Some(65536),
        _ => None,
    }
}

#[derive(Debug)]
pub struct Cartridge {
    rom: Vec<u8>,
    mbc: Mbc,
    ram: Vec<u8>,
    ram_battery: Option<RamBattery>,
}

impl Cartridge {
    /// Create a new Cartridge value from the given ROM image.
    ///
    /// # `CartridgeLoadError`
    ///
    /// This function will return an error in the following scenarios:
    /// * The ROM is too short (must be at least 0x150 bytes)
    /// * The ROM is shorter than the size its header declares
    /// * The mapper byte in the cartridge header is unsupported
    /// * The ROM or RAM size byte in the cartridge header is invalid
    pub fn new(rom: Vec<u8>, sav_path: Option<PathBuf>) -> Result<Self, CartridgeLoadError> {
        log::info!("Initializing cartridge using {} bytes of data", rom.len());

        if rom.len() < 0x0150 {
            return Err(CartridgeLoadError::HeaderTooShort { header_len: rom.len() });
        }

        let mapper_byte = rom[address::MAPPER as usize];
        let Some((mbc_kind, mbc_features)) = mbc::parse_mapper_byte(mapper_byte) else {
            return Err(CartridgeLoadError::UnsupportedMapper { mapper_byte });
        };

        log::info!("Detected mapper type {mbc_kind:?} (byte: {mapper_byte:02X})");
        log::info!("Mapper features: {mbc_features}");

        let rom_size_code = rom[address::ROM_SIZE as usize];
        let Some(declared) = declared_rom_size(rom_size_code) else {
            return Err(CartridgeLoadError::InvalidRomSize { rom_size_code });
        };
        if rom.len() < declared {
            return Err(CartridgeLoadError::RomTruncated { declared, actual: rom.len() });
        }

        let loaded_ram = if let Some(sav_path) = &sav_path {
            load_sav_file(sav_path)?
        } else {
            None
        };

        let ram = match (mbc_features.has_ram, mbc_features.has_battery, loaded_ram) {
            (true, true, Some(ram)) => ram,
            (true, _, _) => {
                let ram_size_code = rom[address::RAM_SIZE as usize];
                let Some(ram_size) = declared_ram_size(ram_size_code) else {
                    return Err(CartridgeLoadError::InvalidRamSize { ram_size_code });
                };
                vec![0; ram_size]
            }
            _ => Vec::new(),
        };

        let ram_battery = match (mbc_features.has_battery, sav_path) {
            (true, Some(sav_path)) => Some(RamBattery { dirty: false, sav_path }),
            _ => None,
        };

        if let Some(ram_battery) = &ram_battery {
            log::info!("Persisting external RAM to {}", ram_battery.sav_path.display());
        }

        let mbc = Mbc::new(mbc_kind, rom.len() as u32, ram.len() as u32);

        log::info!("Cartridge has {} bytes of external RAM", ram.len());

        Ok(Self { rom, mbc, ram, ram_battery })
    }

    pub fn from_file(file_path: &str) -> Result<Self, CartridgeLoadError> {
        log::info!("Loading cartridge from '{file_path}'");

        let rom = fs::read(Path::new(file_path)).map_err(|err| CartridgeLoadError::FileReadError {
            file_path: file_path.into(),
            source: err,
        })?;

        let sav_file = Path::new(file_path).with_extension("sav");

        Self::new(rom, Some(sav_file))
    }

    pub fn title(&self) -> String {
        let title_bytes = &self.rom
            [address::HEADER_TITLE_START as usize..=address::HEADER_TITLE_END as usize];
        title_bytes
            .iter()
            .copied()
            .take_while(|&byte| byte != 0)
            .map(|byte| if byte.is_ascii_graphic() || byte == b' ' { byte as char } else { '?' })
            .collect()
    }

    /// Read a value from the given ROM address (0x0000-0x7FFF).
    pub fn read_rom_address(&self, address: u16) -> u8 {
        let mapped_address = self.mbc.map_rom_address(address);
        self.rom.get(mapped_address as usize).copied().unwrap_or(0xFF)
    }

    /// Write a value to the given ROM address; this sets an MBC control
    /// register, the ROM itself is never modified.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        self.mbc.write_rom_address(address, value);
    }

    /// Read a value from the given cartridge RAM address (0xA000-0xBFFF).
    /// Returns 0xFF if RAM is absent or disabled.
    pub fn read_ram_address(&self, address: u16) -> u8 {
        match self.mbc.map_ram_address(address) {
            Some(mapped_address) => {
                self.ram.get(mapped_address as usize).copied().unwrap_or(0xFF)
            }
            None => 0xFF,
        }
    }

    /// Write a value to the given cartridge RAM address. Dropped if RAM is
    /// absent or disabled.
    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        if let Some(mapped_address) = self.mbc.map_ram_address(address) {
            if let Some(ram_value) = self.ram.get_mut(mapped_address as usize) {
                *ram_value = value;
                if let Some(ram_battery) = &mut self.ram_battery {
                    ram_battery.mark_dirty();
                }
            }
        }
    }

    /// If this cartridge has battery-backed RAM, save it to disk if it has
    /// been modified since the last time this method was called.
    pub fn persist_external_ram(&mut self) -> Result<(), io::Error> {
        match &mut self.ram_battery {
            Some(ram_battery) => ram_battery.persist_ram(&self.ram),
            None => Ok(()),
        }
    }
}

/// An all-zero 32 KiB ROM-only cartridge for unit tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn blank_test_cartridge() -> Cartridge {
    Cartridge::new(vec![0; 32 * 1024], None).expect("blank test cartridge should parse")
}
