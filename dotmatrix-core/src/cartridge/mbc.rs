use crate::memory::address as memory_map;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MbcKind {
    None,
    Mbc1,
    Mbc3,
    Mbc5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MbcFeatures {
    pub(crate) has_ram: bool,
    pub(crate) has_battery: bool,
}

impl std::fmt::Display for MbcFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RAM={}, battery={}", self.has_ram, self.has_battery)
    }
}

/// Decode cartridge header byte 0x0147. Returns None for mapper types the
/// core does not support (MBC2/MBC6/MBC7/HuC/etc.).
pub(crate) fn parse_mapper_byte(mapper_byte: u8) -> Option<(MbcKind, MbcFeatures)> {
    let (kind, has_ram, has_battery) = match mapper_byte {
        0x00 => (MbcKind::None, false, false),
        0x08 => (MbcKind::None, true, false),
        0x09 => (MbcKind::None, true, true),
        0x01 => (MbcKind::Mbc1, false, false),
        0x02 => (MbcKind::Mbc1, true, false),
        0x03 => (MbcKind::Mbc1, true, true),
        // RTC variants are accepted but the clock itself is not emulated
        0x0F => (MbcKind::Mbc3, false, true),
        0x10 => (MbcKind::Mbc3, true, true),
        0x11 => (MbcKind::Mbc3, false, false),
        0x12 => (MbcKind::Mbc3, true, false),
        0x13 => (MbcKind::Mbc3, true, true),
        // 0x1C-0x1E are the rumble variants; the rumble motor is ignored
        0x19 | 0x1C => (MbcKind::Mbc5, false, false),
        0x1A | 0x1D => (MbcKind::Mbc5, true, false),
        0x1B | 0x1E => (MbcKind::Mbc5, true, true),
        _ => return None,
    };

    Some((kind, MbcFeatures { has_ram, has_battery }))
}

#[derive(Debug, Clone)]
pub(crate) enum Mbc {
    None,
    Mbc1 {
        rom_bank_bit_mask: u8,
        ram_bank_bit_mask: u8,
        ram_enable: u8,
        rom_bank_number: u8,
        ram_bank_number: u8,
        banking_mode_select: u8,
    },
    Mbc3 {
        rom_bank_bit_mask: u8,
        ram_enable: u8,
        rom_bank_number: u8,
        ram_bank_number: u8,
    },
    Mbc5 {
        rom_bank_bit_mask: u16,
        ram_bank_bit_mask: u8,
        ram_enable: u8,
        rom_bank_number: u16,
        ram_bank_number: u8,
    },
}

impl Mbc {
    pub(crate) fn new(kind: MbcKind, rom_size: u32, ram_size: u32) -> Self {
        let rom_bank_bit_mask = if rom_size >= 1 << 14 {
            ((rom_size >> 14) - 1) as u16
        } else {
            0
        };
        let ram_bank_bit_mask = if ram_size >= 1 << 13 {
            ((ram_size >> 13) - 1) as u8
        } else {
            0
        };

        log::debug!("setting ROM bank bit mask to {rom_bank_bit_mask:03X} for size {rom_size}");
        log::debug!("setting RAM bank bit mask to {ram_bank_bit_mask:02X} for size {ram_size}");

        match kind {
            MbcKind::None => Self::None,
            MbcKind::Mbc1 => Self::Mbc1 {
                rom_bank_bit_mask: rom_bank_bit_mask as u8,
                ram_bank_bit_mask,
                ram_enable: 0x00,
                rom_bank_number: 0x00,
                ram_bank_number: 0x00,
                banking_mode_select: 0x00,
            },
            MbcKind::Mbc3 => Self::Mbc3 {
                rom_bank_bit_mask: rom_bank_bit_mask as u8,
                ram_enable: 0x00,
                rom_bank_number: 0x00,
                ram_bank_number: 0x00,
            },
            MbcKind::Mbc5 => Self::Mbc5 {
                rom_bank_bit_mask,
                ram_bank_bit_mask,
                ram_enable: 0x00,
                rom_bank_number: 0x01,
                ram_bank_number: 0x00,
            },
        }
    }

    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        match self {
            Self::None => u32::from(address),
            &Self::Mbc1 {
                rom_bank_bit_mask,
                rom_bank_number,
                ram_bank_number,
                banking_mode_select,
                ..
            } => {
                let rom_bank_number = if rom_bank_number == 0x00 { 0x01 } else { rom_bank_number };

                match address {
                    address @ 0x0000..=0x3FFF => {
                        if banking_mode_select == 0x00 {
                            u32::from(address)
                        } else {
                            let bank_number = (ram_bank_number << 5) & rom_bank_bit_mask;
                            u32::from(address) + (u32::from(bank_number) << 14)
                        }
                    }
                    address @ 0x4000..=0x7FFF => {
                        let bank_number =
                            (rom_bank_number | (ram_bank_number << 5)) & rom_bank_bit_mask;
                        u32::from(address - 0x4000) + (u32::from(bank_number) << 14)
                    }
                    _ => panic!("MBC called for address outside of ROM range: {address:04X}"),
                }
            }
            &Self::Mbc3 { rom_bank_bit_mask, rom_bank_number, .. } => {
                let rom_bank_number = if rom_bank_number == 0x00 { 0x01 } else { rom_bank_number };

                match address {
                    address @ 0x0000..=0x3FFF => u32::from(address),
                    address @ 0x4000..=0x7FFF => {
                        let bank_number = rom_bank_number & rom_bank_bit_mask;
                        u32::from(address - 0x4000) + (u32::from(bank_number) << 14)
                    }
                    _ => panic!("MBC called for address outside of ROM range: {address:04X}"),
                }
            }
            &Self::Mbc5 { rom_bank_bit_mask, rom_bank_number, .. } => {
                // Unlike MBC1/MBC3, bank 0 really is bank 0 on MBC5
                match address {
                    address @ 0x0000..=0x3FFF => u32::from(address),
                    address @ 0x4000..=0x7FFF => {
                        let bank_number = rom_bank_number & rom_bank_bit_mask;
                        u32::from(address - 0x4000) + (u32::from(bank_number) << 14)
                    }
                    _ => panic!("MBC called for address outside of ROM range: {address:04X}"),
                }
            }
        }
    }

    // ROM writes never reach the ROM chip; they set MBC control registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1 {
                ram_enable,
                rom_bank_number,
                ram_bank_number,
                banking_mode_select,
                ..
            } => match address {
                _address @ 0x0000..=0x1FFF => {
                    log::trace!("MBC1 ram_enable changed to {value:02X}");
                    *ram_enable = value;
                }
                _address @ 0x2000..=0x3FFF => {
                    log::trace!("MBC1 rom_bank_number changed to {value:02X}");
                    *rom_bank_number = value & 0x1F;
                }
                _address @ 0x4000..=0x5FFF => {
                    log::trace!("MBC1 ram_bank_number changed to {value:02X}");
                    *ram_bank_number = value & 0x03;
                }
                _address @ 0x6000..=0x7FFF => {
                    log::trace!("MBC1 banking_mode_select changed to {value:02X}");
                    *banking_mode_select = value & 0x01;
                }
                _ => panic!("invalid ROM write address in MBC1 mapper: {address:04X}"),
            },
            Self::Mbc3 {
                ram_enable,
                rom_bank_number,
                ram_bank_number,
                ..
            } => match address {
                _address @ 0x0000..=0x1FFF => {
                    *ram_enable = value;
                }
                _address @ 0x2000..=0x3FFF => {
                    *rom_bank_number = value & 0x7F;
                }
                _address @ 0x4000..=0x5FFF => {
                    *ram_bank_number = value & 0x03;
                }
                // 6000-7FFF is the RTC latch register on real MBC3 carts; no clock here
                _address @ 0x6000..=0x7FFF => {}
                _ => panic!("invalid ROM write address in MBC3 mapper: {address:04X}"),
            },
            Self::Mbc5 {
                ram_enable,
                rom_bank_number,
                ram_bank_number,
                ..
            } => match address {
                _address @ 0x0000..=0x1FFF => {
                    *ram_enable = value;
                }
                _address @ 0x2000..=0x2FFF => {
                    *rom_bank_number = (*rom_bank_number & 0x0100) | u16::from(value);
                }
                _address @ 0x3000..=0x3FFF => {
                    *rom_bank_number =
                        (*rom_bank_number & 0x00FF) | (u16::from(value & 0x01) << 8);
                }
                _address @ 0x4000..=0x5FFF => {
                    *ram_bank_number = value & 0x0F;
                }
                _address @ 0x6000..=0x7FFF => {}
                _ => panic!("invalid ROM write address in MBC5 mapper: {address:04X}"),
            },
        }
    }

    /// Map an external RAM address (0xA000-0xBFFF) to a relative address into
    /// the full RAM array. Returns None if RAM is disabled or not banked in.
    pub(crate) fn map_ram_address(&self, address: u16) -> Option<u32> {
        let relative_address = u32::from(address - memory_map::EXTERNAL_RAM_START);
        match self {
            Self::None => Some(relative_address),
            &Self::Mbc1 {
                ram_bank_bit_mask,
                ram_enable,
                ram_bank_number,
                banking_mode_select,
                ..
            } => {
                if ram_enable & 0x0F != 0x0A {
                    return None;
                }

                let bank_number = if banking_mode_select == 0x00 {
                    0x00
                } else {
                    ram_bank_number & ram_bank_bit_mask
                };
                Some(relative_address + (u32::from(bank_number) << 13))
            }
            &Self::Mbc3 { ram_enable, ram_bank_number, .. } => {
                if ram_enable & 0x0F != 0x0A {
                    return None;
                }

                Some(relative_address + (u32::from(ram_bank_number) << 13))
            }
            &Self::Mbc5 {
                ram_bank_bit_mask,
                ram_enable,
                ram_bank_number,
                ..
            } => {
                if ram_enable & 0x0F != 0x0A {
                    return None;
                }

                let bank_number = ram_bank_number & ram_bank_bit_mask;
                Some(relative_address + (u32::from(bank_number) << 13))
            }
        }
    }
}
