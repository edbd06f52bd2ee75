use crate::apu::channels::{Channel, LengthTimer, VolumeControl};

/// The noise channel (channel 4): a 15-bit LFSR clocked at a configurable
/// divisor.
#[derive(Debug, Clone)]
pub(crate) struct NoiseChannel {
    generation_on: bool,
    dac_on: bool,
    length_timer: LengthTimer,
    volume_control: VolumeControl,
    nr2_value: u8,
    clock_shift: u8,
    divisor_code: u8,
    short_width_mode: bool,
    lfsr: u16,
    timer_counter: u32,
}

impl NoiseChannel {
    pub(crate) fn new() -> Self {
        Self {
            generation_on: false,
            dac_on: false,
            length_timer: LengthTimer::new(64),
            volume_control: VolumeControl::new(),
            nr2_value: 0x00,
            clock_shift: 0,
            divisor_code: 0,
            short_width_mode: false,
            lfsr: 0x7FFF,
            timer_counter: 0,
        }
    }

    pub(crate) fn write_nr1(&mut self, value: u8) {
        self.length_timer.load(u16::from(value & 0x3F));
    }

    pub(crate) fn read_nr2(&self) -> u8 {
        self.nr2_value
    }

    pub(crate) fn write_nr2(&mut self, value: u8) {
        self.nr2_value = value;
        self.dac_on = value & 0xF8 != 0;
        if !self.dac_on {
            self.generation_on = false;
        }
    }

    pub(crate) fn read_nr3(&self) -> u8 {
        (self.clock_shift << 4) | (u8::from(self.short_width_mode) << 3) | self.divisor_code
    }

    pub(crate) fn write_nr3(&mut self, value: u8) {
        self.clock_shift = value >> 4;
        self.short_width_mode = value & 0x08 != 0;
        self.divisor_code = value & 0x07;
    }

    pub(crate) fn read_nr4(&self) -> u8 {
        0xBF | (u8::from(self.length_timer.enabled) << 6)
    }

    pub(crate) fn write_nr4(&mut self, value: u8) {
        self.length_timer.enabled = value & 0x40 != 0;

        if value & 0x80 != 0 {
            self.generation_on = self.dac_on;
            self.length_timer.trigger();
            self.volume_control = VolumeControl::from_byte(self.nr2_value);
            self.lfsr = 0x7FFF;
            self.timer_counter = 0;
        }
    }

    fn timer_period(&self) -> u32 {
        let divisor: u32 = match self.divisor_code {
            0 => 8,
            code => 16 * u32::from(code),
        };
        divisor << self.clock_shift
    }

    pub(crate) fn tick_m_cycle(&mut self) {
        self.timer_counter += crate::apu::T_CYCLES_PER_M_CYCLE as u32;
        let period = self.timer_period();
        while self.timer_counter >= period {
            self.timer_counter -= period;
            self.clock_lfsr();
        }
    }

    fn clock_lfsr(&mut self) {
        let feedback = (self.lfsr ^ (self.lfsr >> 1)) & 0x01;
        self.lfsr = (self.lfsr >> 1) | (feedback << 14);
        if self.short_width_mode {
            self.lfsr = (self.lfsr & !(1 << 6)) | (feedback << 6);
        }
    }

    pub(crate) fn clock_length_timer(&mut self) {
        if self.length_timer.tick() {
            self.generation_on = false;
        }
    }

    pub(crate) fn clock_envelope(&mut self) {
        self.volume_control.tick();
    }
}

impl Channel for NoiseChannel {
    fn channel_enabled(&self) -> bool {
        self.generation_on
    }

    fn dac_enabled(&self) -> bool {
        self.dac_on
    }

    fn sample_digital(&self) -> Option<u8> {
        if !self.dac_on {
            return None;
        }

        if !self.generation_on {
            return Some(0);
        }

        // Bit 0 low means output high
        let output = u8::from(self.lfsr & 0x01 == 0);
        Some(output * self.volume_control.volume)
    }
}
