use crate::apu::channels::{Channel, FrequencyTimer, LengthTimer, SlopeDirection, VolumeControl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DutyCycle {
    OneEighth,
    OneFourth,
    OneHalf,
    ThreeFourths,
}

impl DutyCycle {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Self::OneEighth,
            0x01 => Self::OneFourth,
            0x02 => Self::OneHalf,
            0x03 => Self::ThreeFourths,
            _ => unreachable!("masked to 2 bits"),
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Self::OneEighth => 0x00,
            Self::OneFourth => 0x01,
            Self::OneHalf => 0x02,
            Self::ThreeFourths => 0x03,
        }
    }

    fn waveform(self) -> [u8; 8] {
        match self {
            Self::OneEighth => [0, 0, 0, 0, 0, 0, 0, 1],
            Self::OneFourth => [1, 0, 0, 0, 0, 0, 0, 1],
            Self::OneHalf => [1, 0, 0, 0, 0, 1, 1, 1],
            Self::ThreeFourths => [0, 1, 1, 1, 1, 1, 1, 0],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PulseSweep {
    pace: u8,
    direction: SlopeDirection,
    shift: u8,
}

impl PulseSweep {
    const DISABLED: Self = Self {
        pace: 0,
        direction: SlopeDirection::Decreasing,
        shift: 0,
    };

    fn from_byte(byte: u8) -> Self {
        Self {
            pace: (byte >> 4) & 0x07,
            direction: if byte & 0x08 != 0 {
                SlopeDirection::Decreasing
            } else {
                SlopeDirection::Increasing
            },
            shift: byte & 0x07,
        }
    }

    fn to_byte(self) -> u8 {
        let direction_bit = match self.direction {
            SlopeDirection::Decreasing => 0x08,
            SlopeDirection::Increasing => 0x00,
        };
        (self.pace << 4) | direction_bit | self.shift
    }
}

/// A square wave channel: channel 1 (with frequency sweep) or channel 2.
#[derive(Debug, Clone)]
pub(crate) struct PulseChannel {
    generation_on: bool,
    dac_on: bool,
    duty_cycle: DutyCycle,
    length_timer: LengthTimer,
    volume_control: VolumeControl,
    nr2_value: u8,
    frequency_timer: FrequencyTimer,
    phase_position: usize,
    has_sweep: bool,
    sweep: PulseSweep,
    sweep_timer: u8,
    sweep_shadow_frequency: u16,
    sweep_enabled: bool,
}

impl PulseChannel {
    pub(crate) fn new_channel_1() -> Self {
        Self::new(true)
    }

    pub(crate) fn new_channel_2() -> Self {
        Self::new(false)
    }

    fn new(has_sweep: bool) -> Self {
        Self {
            generation_on: false,
            dac_on: false,
            duty_cycle: DutyCycle::OneEighth,
            length_timer: LengthTimer::new(64),
            volume_control: VolumeControl::new(),
            nr2_value: 0x00,
            frequency_timer: FrequencyTimer::new(4),
            phase_position: 0,
            has_sweep,
            sweep: PulseSweep::DISABLED,
            sweep_timer: 0,
            sweep_shadow_frequency: 0,
            sweep_enabled: false,
        }
    }

    pub(crate) fn read_nr0(&self) -> u8 {
        0x80 | self.sweep.to_byte()
    }

    pub(crate) fn write_nr0(&mut self, value: u8) {
        self.sweep = PulseSweep::from_byte(value);
    }

    pub(crate) fn read_nr1(&self) -> u8 {
        (self.duty_cycle.to_bits() << 6) | 0x3F
    }

    pub(crate) fn write_nr1(&mut self, value: u8) {
        self.duty_cycle = DutyCycle::from_bits(value >> 6);
        self.length_timer.load(u16::from(value & 0x3F));
    }

    pub(crate) fn read_nr2(&self) -> u8 {
        self.nr2_value
    }

    pub(crate) fn write_nr2(&mut self, value: u8) {
        self.nr2_value = value;
        // The DAC is controlled by the upper 5 bits; clearing them kills the
        // channel immediately
        self.dac_on = value & 0xF8 != 0;
        if !self.dac_on {
            self.generation_on = false;
        }
    }

    pub(crate) fn write_nr3(&mut self, value: u8) {
        let frequency = (self.frequency_timer.frequency() & 0x0700) | u16::from(value);
        self.frequency_timer.set_frequency(frequency);
    }

    pub(crate) fn read_nr4(&self) -> u8 {
        0xBF | (u8::from(self.length_timer.enabled) << 6)
    }

    pub(crate) fn write_nr4(&mut self, value: u8) {
        let frequency =
            (self.frequency_timer.frequency() & 0x00FF) | (u16::from(value & 0x07) << 8);
        self.frequency_timer.set_frequency(frequency);
        self.length_timer.enabled = value & 0x40 != 0;

        if value & 0x80 != 0 {
            self.trigger();
        }
    }

    fn trigger(&mut self) {
        self.generation_on = self.dac_on;
        self.length_timer.trigger();
        self.volume_control = VolumeControl::from_byte(self.nr2_value);
        self.frequency_timer.trigger();

        if self.has_sweep {
            self.sweep_shadow_frequency = self.frequency_timer.frequency();
            self.sweep_timer = if self.sweep.pace != 0 { self.sweep.pace } else { 8 };
            self.sweep_enabled = self.sweep.pace != 0 || self.sweep.shift != 0;
            if self.sweep.shift != 0 && self.next_sweep_frequency() > 2047 {
                self.generation_on = false;
            }
        }
    }

    pub(crate) fn tick_m_cycle(&mut self) {
        if self.frequency_timer.tick_m_cycle() {
            self.phase_position = (self.phase_position + 1) % 8;
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

    // 128Hz sweep clock (channel 1 only)
    pub(crate) fn clock_sweep(&mut self) {
        if !self.has_sweep || !self.sweep_enabled {
            return;
        }

        self.sweep_timer -= 1;
        if self.sweep_timer != 0 {
            return;
        }
        self.sweep_timer = if self.sweep.pace != 0 { self.sweep.pace } else { 8 };

        if self.sweep.pace == 0 {
            return;
        }

        let new_frequency = self.next_sweep_frequency();
        if new_frequency > 2047 {
            self.generation_on = false;
            return;
        }

        if self.sweep.shift != 0 {
            self.sweep_shadow_frequency = new_frequency;
            self.frequency_timer.set_frequency(new_frequency);
            if self.next_sweep_frequency() > 2047 {
                self.generation_on = false;
            }
        }
    }

    fn next_sweep_frequency(&self) -> u16 {
        let delta = self.sweep_shadow_frequency >> self.sweep.shift;
        match self.sweep.direction {
            SlopeDirection::Increasing => self.sweep_shadow_frequency + delta,
            SlopeDirection::Decreasing => self.sweep_shadow_frequency.saturating_sub(delta),
        }
    }
}

impl Channel for PulseChannel {
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

        let wave_step = self.duty_cycle.waveform()[self.phase_position];
        Some(wave_step * self.volume_control.volume)
    }
}
