use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::interrupts::{InterruptFlags, InterruptType};
use crate::joypad::Joypad;
use crate::memory::{address, AddressSpace};
use crate::ppu::Ppu;
use crate::serial::Serial;
use crate::timer::Timer;

pub const BOOT_ROM_LEN: usize = 256;

const OAM_DMA_LENGTH: u8 = 160;

#[derive(Debug, Clone, Copy)]
struct OamDma {
    source_base: u16,
    bytes_copied: u8,
}

/// The system bus: owns every device and arbitrates all memory traffic.
///
/// The CPU performs at most one access per machine cycle, and every access
/// (and every internal machine cycle) goes through `tick_m_cycle` first, so
/// devices always observe time in order: Timer, then PPU, then APU, then
/// Serial, then the OAM DMA engine.
pub struct Bus {
    cartridge: Cartridge,
    address_space: AddressSpace,
    pub(crate) interrupt_flags: InterruptFlags,
    pub(crate) timer: Timer,
    pub(crate) ppu: Ppu,
    pub(crate) apu: Apu,
    pub(crate) joypad: Joypad,
    pub(crate) serial: Serial,
    boot_rom: Option<Box<[u8; BOOT_ROM_LEN]>>,
    boot_rom_enabled: bool,
    oam_dma: Option<OamDma>,
    dma_register: u8,
    // STOP freezes the CPU and the timer; the rest of the machine runs on
    stop_mode: bool,
    m_cycles_elapsed: u64,
}

impl Bus {
    /// A bus in the post-boot state, ready to execute from 0x0100.
    pub fn new(cartridge: Cartridge) -> Self {
        let mut interrupt_flags = InterruptFlags::new();
        interrupt_flags.write(0xE1);

        Self {
            cartridge,
            address_space: AddressSpace::new(),
            interrupt_flags,
            timer: Timer::new_post_boot(),
            ppu: Ppu::new_post_boot(),
            apu: Apu::new_post_boot(),
            joypad: Joypad::new(),
            serial: Serial::new_post_boot(),
            boot_rom: None,
            boot_rom_enabled: false,
            oam_dma: None,
            dma_register: 0x00,
            stop_mode: false,
            m_cycles_elapsed: 0,
        }
    }

    /// A cold bus that will execute the given boot ROM from 0x0000; the boot
    /// ROM stays mapped over 0x0000-0x00FF until software writes 0xFF50.
    pub fn with_boot_rom(cartridge: Cartridge, boot_rom: [u8; BOOT_ROM_LEN]) -> Self {
        Self {
            cartridge,
            address_space: AddressSpace::new(),
            interrupt_flags: InterruptFlags::new(),
            timer: Timer::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            joypad: Joypad::new(),
            serial: Serial::new(),
            boot_rom: Some(Box::new(boot_rom)),
            boot_rom_enabled: true,
            oam_dma: None,
            dma_register: 0x00,
            stop_mode: false,
            m_cycles_elapsed: 0,
        }
    }

    /// Advance the whole machine by one machine cycle (4 T-cycles).
    pub fn tick_m_cycle(&mut self) {
        self.m_cycles_elapsed += 1;
        if !self.stop_mode {
            self.timer.tick_m_cycle(&mut self.interrupt_flags);
        }
        self.ppu.tick_m_cycle(&self.address_space, &mut self.interrupt_flags);
        self.apu.tick_m_cycle();
        self.serial.tick_m_cycle(&mut self.interrupt_flags);
        self.progress_oam_dma();
    }

    fn progress_oam_dma(&mut self) {
        let Some(OamDma { source_base, bytes_copied }) = self.oam_dma else {
            return;
        };

        let byte =
            self.read_address_no_access_check(source_base + u16::from(bytes_copied));
        self.address_space
            .write_oam(address::OAM_START + u16::from(bytes_copied), byte);

        self.oam_dma = if bytes_copied + 1 == OAM_DMA_LENGTH {
            None
        } else {
            Some(OamDma { source_base, bytes_copied: bytes_copied + 1 })
        };
    }

    pub fn oam_dma_in_progress(&self) -> bool {
        self.oam_dma.is_some()
    }

    pub fn set_stop_mode(&mut self, stop_mode: bool) {
        self.stop_mode = stop_mode;
    }

    fn is_cpu_access_allowed(&self, address: u16) -> bool {
        // While an OAM DMA transfer is running the CPU can only reach HRAM
        if self.oam_dma.is_some()
            && !(address::HRAM_START..=address::HRAM_END).contains(&address)
        {
            return false;
        }

        // OAM is blocked during OAM scan and pixel transfer
        if (address::OAM_START..=address::OAM_END).contains(&address)
            && !self.ppu.oam_accessible()
        {
            return false;
        }

        // VRAM is blocked during pixel transfer
        if (address::VRAM_START..=address::VRAM_END).contains(&address)
            && !self.ppu.vram_accessible()
        {
            return false;
        }

        true
    }

    /// Read the value at the given address from the perspective of the CPU.
    /// Returns 0xFF when PPU mode or an active OAM DMA blocks the access.
    pub fn read(&self, address: u16) -> u8 {
        if !self.is_cpu_access_allowed(address) {
            return 0xFF;
        }

        self.read_address_no_access_check(address)
    }

    fn read_address_no_access_check(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::BOOT_ROM_END if self.boot_rom_enabled => {
                self.boot_rom
                    .as_ref()
                    .map_or(0xFF, |boot_rom| boot_rom[address as usize])
            }
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.read_rom_address(address)
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.address_space.read_vram(address)
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address @ address::WORKING_RAM_START..=address::ECHO_RAM_END => {
                self.address_space.read_working_ram(address)
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.address_space.read_oam(address)
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.read_io_register(address)
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.address_space.read_hram(address)
            }
            address::IE_REGISTER => self.address_space.ie_register(),
        }
    }

    /// Assign a value to the given address from the perspective of the CPU.
    /// The write is dropped when PPU mode or an active OAM DMA blocks it.
    pub fn write(&mut self, address: u16, value: u8) {
        if !self.is_cpu_access_allowed(address) {
            return;
        }

        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom_address(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.address_space.write_vram(address, value);
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address @ address::WORKING_RAM_START..=address::ECHO_RAM_END => {
                self.address_space.write_working_ram(address, value);
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.address_space.write_oam(address, value);
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.write_io_register(address, value);
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.address_space.write_hram(address, value);
            }
            address::IE_REGISTER => {
                self.address_space.set_ie_register(value);
            }
        }
    }

    fn read_io_register(&self, register_address: u16) -> u8 {
        match register_address {
            address::JOYP => self.joypad.read_p1(),
            address::SB => self.serial.read_sb(),
            address::SC => self.serial.read_sc(),
            address::DIV => self.timer.read_div(),
            address::TIMA => self.timer.read_tima(),
            address::TMA => self.timer.read_tma(),
            address::TAC => self.timer.read_tac(),
            address::IF => self.interrupt_flags.read(),
            address::NR10..=address::WAVE_RAM_END => self.apu.read_register(register_address),
            address::DMA => self.dma_register,
            address::LCDC..=address::WX => self.ppu.read_register(register_address),
            address::BOOT_ROM_DISABLE => 0xFE | u8::from(!self.boot_rom_enabled),
            _ => 0xFF,
        }
    }

    fn write_io_register(&mut self, register_address: u16, value: u8) {
        match register_address {
            address::JOYP => self.joypad.write_p1(value),
            address::SB => self.serial.write_sb(value),
            address::SC => self.serial.write_sc(value),
            address::DIV => self.timer.write_div(),
            address::TIMA => self.timer.write_tima(value),
            address::TMA => self.timer.write_tma(value),
            address::TAC => self.timer.write_tac(value),
            address::IF => self.interrupt_flags.write(value),
            address::NR10..=address::WAVE_RAM_END => {
                self.apu.write_register(register_address, value);
            }
            address::DMA => {
                self.dma_register = value;
                self.oam_dma =
                    Some(OamDma { source_base: u16::from(value) << 8, bytes_copied: 0 });
            }
            address::LCDC..=address::WX => {
                self.ppu.write_register(register_address, value, &mut self.interrupt_flags);
            }
            // Write-once, one-way: the boot ROM can never be re-mapped
            address::BOOT_ROM_DISABLE => {
                if value != 0 && self.boot_rom_enabled {
                    log::info!("boot ROM disabled");
                    self.boot_rom_enabled = false;
                }
            }
            _ => {}
        }
    }

    //
    // Interrupt sampling helpers for the CPU
    //

    pub fn pending_interrupt(&self) -> Option<InterruptType> {
        self.interrupt_flags.highest_priority_pending(self.address_space.ie_register())
    }

    pub fn acknowledge_interrupt(&mut self, interrupt_type: InterruptType) {
        self.interrupt_flags.clear(interrupt_type);
    }

    /// Total machine cycles ticked since power-on.
    pub fn m_cycles_elapsed(&self) -> u64 {
        self.m_cycles_elapsed
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }
}
