//! Cycle-synchronised Game Boy (DMG) emulation core.
//!
//! The CPU drives all time: every memory access it performs first advances
//! the timer, PPU, APU, and serial port by one machine cycle, so software
//! that depends on exact device timing (timer edge glitches, the HALT bug,
//! PPU mode blocking, OAM DMA isolation) observes the same behavior as on
//! hardware.
//!
//! The host boundary is [`GameBoy`]: load a cartridge, feed it button state,
//! and pull finished 160x144 frames and audio samples out of it.

mod apu;
mod bus;
mod cartridge;
mod cpu;
mod interrupts;
mod joypad;
mod memory;
mod ppu;
mod serial;
mod timer;

use std::path::PathBuf;

pub use apu::DEFAULT_OUTPUT_FREQUENCY as DEFAULT_AUDIO_OUTPUT_FREQUENCY;
pub use bus::BOOT_ROM_LEN;
pub use cartridge::CartridgeLoadError;
pub use joypad::{
    BUTTON_A, BUTTON_B, BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_SELECT, BUTTON_START,
    BUTTON_UP,
};
pub use ppu::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};

use bus::Bus;
use cartridge::Cartridge;
use cpu::Cpu;

/// A complete emulated Game Boy.
pub struct GameBoy {
    cpu: Cpu,
    bus: Bus,
}

impl GameBoy {
    /// Create a machine from a ROM image, starting in the post-boot state
    /// (PC=0x0100, LCD on). No `.sav` persistence is configured.
    pub fn load_cartridge(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        let cartridge = Cartridge::new(rom, None)?;
        Ok(Self { cpu: Cpu::new_post_boot(), bus: Bus::new(cartridge) })
    }

    /// Create a machine from a ROM image with battery-backed RAM persisted
    /// to the given `.sav` path (loaded now if the file exists).
    pub fn load_cartridge_with_sav(
        rom: Vec<u8>,
        sav_path: PathBuf,
    ) -> Result<Self, CartridgeLoadError> {
        let cartridge = Cartridge::new(rom, Some(sav_path))?;
        Ok(Self { cpu: Cpu::new_post_boot(), bus: Bus::new(cartridge) })
    }

    /// Create a machine from a ROM file path; a sidecar `.sav` file next to
    /// the ROM is used for battery-backed RAM.
    pub fn from_file(rom_path: &str) -> Result<Self, CartridgeLoadError> {
        let cartridge = Cartridge::from_file(rom_path)?;
        Ok(Self { cpu: Cpu::new_post_boot(), bus: Bus::new(cartridge) })
    }

    /// Create a cold machine that executes the given 256-byte boot ROM from
    /// address 0; the cartridge becomes fully visible once the boot ROM
    /// writes 0xFF50.
    pub fn load_cartridge_with_boot_rom(
        rom: Vec<u8>,
        boot_rom: [u8; BOOT_ROM_LEN],
    ) -> Result<Self, CartridgeLoadError> {
        let cartridge = Cartridge::new(rom, None)?;
        Ok(Self { cpu: Cpu::new_power_on(), bus: Bus::with_boot_rom(cartridge, boot_rom) })
    }

    /// The title string from the cartridge header.
    pub fn cartridge_title(&self) -> String {
        self.bus.cartridge().title()
    }

    /// Run until the PPU finishes the current frame, then hand the frame
    /// buffer to the caller. Frames keep coming at the hardware cadence even
    /// when the LCD is disabled or the CPU has locked up on an undefined
    /// opcode.
    pub fn run_frame(&mut self) -> &FrameBuffer {
        loop {
            self.cpu.step(&mut self.bus);
            if self.bus.ppu.take_frame_complete() {
                break;
            }
        }

        self.bus.ppu.frame_buffer()
    }

    /// Replace the current button state. Bit layout: 0 Right, 1 Left, 2 Up,
    /// 3 Down, 4 A, 5 B, 6 Select, 7 Start; a set bit means pressed.
    pub fn set_button_state(&mut self, button_mask: u8) {
        self.bus.joypad.set_button_state(button_mask, &mut self.bus.interrupt_flags);
    }

    /// Drain all audio produced since the last call, as interleaved stereo
    /// i16 samples at the configured sample rate.
    pub fn drain_audio_samples(&mut self) -> Vec<i16> {
        self.bus.apu.sample_queue_mut().drain(..).collect()
    }

    /// Change the audio output sample rate (default
    /// [`DEFAULT_AUDIO_OUTPUT_FREQUENCY`]).
    pub fn set_audio_sample_rate(&mut self, sample_rate: u32) {
        self.bus.apu.set_output_frequency(sample_rate);
    }

    /// Take the bytes the emulated program has transmitted over the serial
    /// port since the last call. Test ROMs report their results this way.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.bus.serial.take_output()
    }

    /// Write battery-backed cartridge RAM to its `.sav` file if it changed.
    pub fn persist_cartridge_ram(&mut self) -> Result<(), std::io::Error> {
        self.bus.cartridge_mut().persist_external_ram()
    }

    /// Whether an undefined opcode has frozen the CPU.
    pub fn cpu_locked(&self) -> bool {
        self.cpu.locked()
    }
}
