use crate::interrupts::{InterruptFlags, InterruptType};

// Host-facing button mask bit assignments
pub const BUTTON_RIGHT: u8 = 1 << 0;
pub const BUTTON_LEFT: u8 = 1 << 1;
pub const BUTTON_UP: u8 = 1 << 2;
pub const BUTTON_DOWN: u8 = 1 << 3;
pub const BUTTON_A: u8 = 1 << 4;
pub const BUTTON_B: u8 = 1 << 5;
pub const BUTTON_SELECT: u8 = 1 << 6;
pub const BUTTON_START: u8 = 1 << 7;

/// The P1/JOYP button matrix (0xFF00).
///
/// The host supplies a "set = pressed" button mask; the register exposes the
/// selected half of the matrix with pressed buttons reading as 0.
pub struct Joypad {
    button_mask: u8,
    select_action: bool,
    select_direction: bool,
}

impl Joypad {
    // Both matrix halves start selected, matching the post-boot P1 value of
    // 0xCF with no buttons held
    pub fn new() -> Self {
        Self {
            button_mask: 0x00,
            select_action: true,
            select_direction: true,
        }
    }

    /// Replace the current button state. A released-to-pressed transition of
    /// a button whose matrix half is selected raises the Joypad interrupt.
    pub fn set_button_state(&mut self, button_mask: u8, interrupt_flags: &mut InterruptFlags) {
        let newly_pressed = button_mask & !self.button_mask;
        self.button_mask = button_mask;

        let direction_pressed = newly_pressed & 0x0F != 0;
        let action_pressed = newly_pressed & 0xF0 != 0;
        if (self.select_direction && direction_pressed) || (self.select_action && action_pressed) {
            interrupt_flags.request(InterruptType::Joypad);
        }
    }

    pub fn any_button_pressed(&self) -> bool {
        self.button_mask != 0
    }

    pub fn read_p1(&self) -> u8 {
        let mut low_nibble = 0x0F;
        if self.select_direction {
            low_nibble &= !(self.button_mask & 0x0F);
        }
        if self.select_action {
            low_nibble &= !(self.button_mask >> 4);
        }

        let select_bits = (u8::from(!self.select_direction) << 4)
            | (u8::from(!self.select_action) << 5);
        0xC0 | select_bits | low_nibble
    }

    /// Only the two select bits are writable; a low bit selects its half.
    pub fn write_p1(&mut self, value: u8) {
        self.select_direction = value & 0x10 == 0;
        self.select_action = value & 0x20 == 0;
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}
