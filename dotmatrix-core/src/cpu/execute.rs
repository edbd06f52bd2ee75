use crate::bus::Bus;
use crate::cpu::Cpu;

// The eleven opcodes with no defined behavior; executing one freezes the CPU
fn is_undefined_opcode(opcode: u8) -> bool {
    matches!(
        opcode,
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD
    )
}

impl Cpu {
    pub(super) fn execute_opcode(&mut self, bus: &mut Bus, opcode: u8) {
        match opcode {
            0x00 => {}
            0x01 | 0x11 | 0x21 | 0x31 => {
                let nn = self.fetch16(bus);
                self.set_wide_register(opcode, nn);
            }
            0x02 => {
                self.write8(bus, self.registers.bc(), self.registers.a);
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let value = self.wide_register(opcode).wrapping_add(1);
                self.set_wide_register(opcode, value);
                self.internal_cycle(bus);
            }
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let value = self.read_operand(bus, opcode >> 3);
                let incremented = self.increment(value);
                self.write_operand(bus, opcode >> 3, incremented);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let value = self.read_operand(bus, opcode >> 3);
                let decremented = self.decrement(value);
                self.write_operand(bus, opcode >> 3, decremented);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let n = self.fetch8(bus);
                self.write_operand(bus, opcode >> 3, n);
            }
            0x07 => {
                let rotated = self.rotate_left(self.registers.a, false);
                self.registers.a = rotated;
            }
            0x08 => {
                let nn = self.fetch16(bus);
                self.write16(bus, nn, self.registers.sp);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.add_hl(self.wide_register(opcode));
                self.internal_cycle(bus);
            }
            0x0A => {
                self.registers.a = self.read8(bus, self.registers.bc());
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let value = self.wide_register(opcode).wrapping_sub(1);
                self.set_wide_register(opcode, value);
                self.internal_cycle(bus);
            }
            0x0F => {
                let rotated = self.rotate_right(self.registers.a, false);
                self.registers.a = rotated;
            }
            0x10 => {
                // STOP is encoded as 10 00; the padding byte is consumed
                let _ = self.fetch8(bus);
                log::debug!("STOP executed at PC={:04X}", self.registers.pc.wrapping_sub(2));
                self.registers.stopped = true;
                bus.set_stop_mode(true);
            }
            0x12 => {
                self.write8(bus, self.registers.de(), self.registers.a);
            }
            0x17 => {
                let rotated = self.rotate_left_thru_carry(self.registers.a, false);
                self.registers.a = rotated;
            }
            0x18 => {
                let offset = self.fetch8(bus) as i8;
                self.relative_jump(bus, offset);
            }
            0x1A => {
                self.registers.a = self.read8(bus, self.registers.de());
            }
            0x1F => {
                let rotated = self.rotate_right_thru_carry(self.registers.a, false);
                self.registers.a = rotated;
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch8(bus) as i8;
                if self.condition_met(opcode) {
                    self.relative_jump(bus, offset);
                }
            }
            0x22 => {
                let hl = self.registers.hl();
                self.write8(bus, hl, self.registers.a);
                self.registers.set_hl(hl.wrapping_add(1));
            }
            0x27 => {
                self.decimal_adjust_accumulator();
            }
            0x2A => {
                let hl = self.registers.hl();
                self.registers.a = self.read8(bus, hl);
                self.registers.set_hl(hl.wrapping_add(1));
            }
            0x2F => {
                self.registers.a = !self.registers.a;
                let zero = self.registers.zero_flag();
                let carry = self.registers.carry_flag();
                self.registers.set_flags(zero, true, true, carry);
            }
            0x32 => {
                let hl = self.registers.hl();
                self.write8(bus, hl, self.registers.a);
                self.registers.set_hl(hl.wrapping_sub(1));
            }
            0x37 => {
                let zero = self.registers.zero_flag();
                self.registers.set_flags(zero, false, false, true);
            }
            0x3A => {
                let hl = self.registers.hl();
                self.registers.a = self.read8(bus, hl);
                self.registers.set_hl(hl.wrapping_sub(1));
            }
            0x3F => {
                let zero = self.registers.zero_flag();
                let complemented = !self.registers.carry_flag();
                self.registers.set_flags(zero, false, false, complemented);
            }
            0x76 => {
                self.halt(bus);
            }
            opcode @ 0x40..=0x7F => {
                let value = self.read_operand(bus, opcode);
                self.write_operand(bus, opcode >> 3, value);
            }
            opcode @ 0x80..=0x87 => {
                let value = self.read_operand(bus, opcode);
                self.add(value, false);
            }
            opcode @ 0x88..=0x8F => {
                let value = self.read_operand(bus, opcode);
                self.add(value, true);
            }
            opcode @ 0x90..=0x97 => {
                let value = self.read_operand(bus, opcode);
                self.subtract(value, false);
            }
            opcode @ 0x98..=0x9F => {
                let value = self.read_operand(bus, opcode);
                self.subtract(value, true);
            }
            opcode @ 0xA0..=0xA7 => {
                let value = self.read_operand(bus, opcode);
                self.and(value);
            }
            opcode @ 0xA8..=0xAF => {
                let value = self.read_operand(bus, opcode);
                self.xor(value);
            }
            opcode @ 0xB0..=0xB7 => {
                let value = self.read_operand(bus, opcode);
                self.or(value);
            }
            opcode @ 0xB8..=0xBF => {
                let value = self.read_operand(bus, opcode);
                self.compare(value);
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                self.internal_cycle(bus);
                if self.condition_met(opcode) {
                    let return_address = self.pop_stack(bus);
                    self.registers.pc = return_address;
                    self.internal_cycle(bus);
                }
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop_stack(bus);
                match opcode & 0x30 {
                    0x00 => self.registers.set_bc(value),
                    0x10 => self.registers.set_de(value),
                    0x20 => self.registers.set_hl(value),
                    _ => self.registers.set_af(value),
                }
            }
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let nn = self.fetch16(bus);
                if self.condition_met(opcode) {
                    self.registers.pc = nn;
                    self.internal_cycle(bus);
                }
            }
            0xC3 => {
                let nn = self.fetch16(bus);
                self.registers.pc = nn;
                self.internal_cycle(bus);
            }
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let nn = self.fetch16(bus);
                if self.condition_met(opcode) {
                    self.call(bus, nn);
                }
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = match opcode & 0x30 {
                    0x00 => self.registers.bc(),
                    0x10 => self.registers.de(),
                    0x20 => self.registers.hl(),
                    _ => self.registers.af(),
                };
                self.internal_cycle(bus);
                self.push_stack(bus, value);
            }
            0xC6 => {
                let n = self.fetch8(bus);
                self.add(n, false);
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.call(bus, u16::from(opcode & 0x38));
            }
            0xC9 => {
                let return_address = self.pop_stack(bus);
                self.registers.pc = return_address;
                self.internal_cycle(bus);
            }
            0xCB => {
                let cb_opcode = self.fetch8(bus);
                self.execute_cb_opcode(bus, cb_opcode);
            }
            0xCD => {
                let nn = self.fetch16(bus);
                self.call(bus, nn);
            }
            0xCE => {
                let n = self.fetch8(bus);
                self.add(n, true);
            }
            0xD6 => {
                let n = self.fetch8(bus);
                self.subtract(n, false);
            }
            0xD9 => {
                let return_address = self.pop_stack(bus);
                self.registers.pc = return_address;
                self.internal_cycle(bus);
                // Unlike EI, RETI enables interrupts immediately
                self.registers.ime = true;
            }
            0xDE => {
                let n = self.fetch8(bus);
                self.subtract(n, true);
            }
            0xE0 => {
                let n = self.fetch8(bus);
                self.write8(bus, 0xFF00 | u16::from(n), self.registers.a);
            }
            0xE2 => {
                self.write8(bus, 0xFF00 | u16::from(self.registers.c), self.registers.a);
            }
            0xE6 => {
                let n = self.fetch8(bus);
                self.and(n);
            }
            0xE8 => {
                let offset = self.fetch8(bus) as i8;
                self.registers.sp = self.add_sp_offset(offset);
                self.internal_cycle(bus);
                self.internal_cycle(bus);
            }
            0xE9 => {
                self.registers.pc = self.registers.hl();
            }
            0xEA => {
                let nn = self.fetch16(bus);
                self.write8(bus, nn, self.registers.a);
            }
            0xEE => {
                let n = self.fetch8(bus);
                self.xor(n);
            }
            0xF0 => {
                let n = self.fetch8(bus);
                self.registers.a = self.read8(bus, 0xFF00 | u16::from(n));
            }
            0xF2 => {
                self.registers.a = self.read8(bus, 0xFF00 | u16::from(self.registers.c));
            }
            0xF3 => {
                self.registers.ime = false;
                self.registers.ime_pending = false;
            }
            0xF6 => {
                let n = self.fetch8(bus);
                self.or(n);
            }
            0xF8 => {
                let offset = self.fetch8(bus) as i8;
                let result = self.add_sp_offset(offset);
                self.registers.set_hl(result);
                self.internal_cycle(bus);
            }
            0xF9 => {
                self.registers.sp = self.registers.hl();
                self.internal_cycle(bus);
            }
            0xFA => {
                let nn = self.fetch16(bus);
                self.registers.a = self.read8(bus, nn);
            }
            0xFB => {
                self.registers.ime_pending = true;
            }
            0xFE => {
                let n = self.fetch8(bus);
                self.compare(n);
            }
            _ => {
                debug_assert!(is_undefined_opcode(opcode));
                log::error!(
                    "undefined opcode {opcode:02X} at PC={:04X}; CPU is frozen",
                    self.registers.pc.wrapping_sub(1)
                );
                self.registers.locked = true;
            }
        }
    }

    fn execute_cb_opcode(&mut self, bus: &mut Bus, opcode: u8) {
        match opcode {
            opcode @ 0x00..=0x07 => {
                let value = self.read_operand(bus, opcode);
                let result = self.rotate_left(value, true);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x08..=0x0F => {
                let value = self.read_operand(bus, opcode);
                let result = self.rotate_right(value, true);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x10..=0x17 => {
                let value = self.read_operand(bus, opcode);
                let result = self.rotate_left_thru_carry(value, true);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x18..=0x1F => {
                let value = self.read_operand(bus, opcode);
                let result = self.rotate_right_thru_carry(value, true);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x20..=0x27 => {
                let value = self.read_operand(bus, opcode);
                let result = self.shift_left(value);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x28..=0x2F => {
                let value = self.read_operand(bus, opcode);
                let result = self.arithmetic_shift_right(value);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x30..=0x37 => {
                let value = self.read_operand(bus, opcode);
                let result = self.swap(value);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x38..=0x3F => {
                let value = self.read_operand(bus, opcode);
                let result = self.logical_shift_right(value);
                self.write_operand(bus, opcode, result);
            }
            opcode @ 0x40..=0x7F => {
                let bit = (opcode & 0x38) >> 3;
                let value = self.read_operand(bus, opcode);
                self.test_bit(bit, value);
            }
            opcode @ 0x80..=0xBF => {
                let bit = (opcode & 0x38) >> 3;
                let value = self.read_operand(bus, opcode);
                self.write_operand(bus, opcode, value & !(1 << bit));
            }
            opcode @ 0xC0..=0xFF => {
                let bit = (opcode & 0x38) >> 3;
                let value = self.read_operand(bus, opcode);
                self.write_operand(bus, opcode, value | (1 << bit));
            }
        }
    }

    // 8-bit operand addressed by a 3-bit field of the opcode: B, C, D, E,
    // H, L, (HL), A. Callers pass the opcode directly for a low-bits operand
    // or `opcode >> 3` for a mid-bits operand.
    fn read_operand(&mut self, bus: &mut Bus, operand_bits: u8) -> u8 {
        match operand_bits & 0x07 {
            0x00 => self.registers.b,
            0x01 => self.registers.c,
            0x02 => self.registers.d,
            0x03 => self.registers.e,
            0x04 => self.registers.h,
            0x05 => self.registers.l,
            0x06 => self.read8(bus, self.registers.hl()),
            _ => self.registers.a,
        }
    }

    fn write_operand(&mut self, bus: &mut Bus, operand_bits: u8, value: u8) {
        match operand_bits & 0x07 {
            0x00 => self.registers.b = value,
            0x01 => self.registers.c = value,
            0x02 => self.registers.d = value,
            0x03 => self.registers.e = value,
            0x04 => self.registers.h = value,
            0x05 => self.registers.l = value,
            0x06 => self.write8(bus, self.registers.hl(), value),
            _ => self.registers.a = value,
        }
    }

    // 16-bit register selected by opcode bits 4-5: BC, DE, HL, SP
    fn wide_register(&self, opcode: u8) -> u16 {
        match opcode & 0x30 {
            0x00 => self.registers.bc(),
            0x10 => self.registers.de(),
            0x20 => self.registers.hl(),
            _ => self.registers.sp,
        }
    }

    fn set_wide_register(&mut self, opcode: u8, value: u16) {
        match opcode & 0x30 {
            0x00 => self.registers.set_bc(value),
            0x10 => self.registers.set_de(value),
            0x20 => self.registers.set_hl(value),
            _ => self.registers.sp = value,
        }
    }

    // Branch condition in opcode bits 3-4: NZ, Z, NC, C
    fn condition_met(&self, opcode: u8) -> bool {
        match opcode & 0x18 {
            0x00 => !self.registers.zero_flag(),
            0x08 => self.registers.zero_flag(),
            0x10 => !self.registers.carry_flag(),
            _ => self.registers.carry_flag(),
        }
    }

    fn halt(&mut self, bus: &mut Bus) {
        if !self.registers.ime && bus.pending_interrupt().is_some() {
            // HALT bug: the CPU does not halt, and the next opcode fetch
            // fails to advance PC
            self.registers.halt_bug = true;
        } else {
            self.registers.halted = true;
        }
    }

    fn relative_jump(&mut self, bus: &mut Bus, offset: i8) {
        self.registers.pc = self.registers.pc.wrapping_add_signed(offset.into());
        self.internal_cycle(bus);
    }

    fn call(&mut self, bus: &mut Bus, address: u16) {
        self.internal_cycle(bus);
        self.push_stack(bus, self.registers.pc);
        self.registers.pc = address;
    }

    //
    // 8-bit arithmetic
    //

    fn add(&mut self, value: u8, with_carry: bool) {
        let a = self.registers.a;
        let carry_in = u8::from(with_carry && self.registers.carry_flag());

        let (partial, overflow_a) = a.overflowing_add(value);
        let (sum, overflow_b) = partial.overflowing_add(carry_in);
        let half_carry = (a & 0x0F) + (value & 0x0F) + carry_in > 0x0F;

        self.registers.a = sum;
        self.registers.set_flags(sum == 0, false, half_carry, overflow_a || overflow_b);
    }

    fn subtract_value(&mut self, value: u8, with_carry: bool) -> u8 {
        let a = self.registers.a;
        let carry_in = u8::from(with_carry && self.registers.carry_flag());

        let (partial, overflow_a) = a.overflowing_sub(value);
        let (difference, overflow_b) = partial.overflowing_sub(carry_in);
        let half_borrow = (a & 0x0F) < (value & 0x0F) + carry_in;

        self.registers.set_flags(difference == 0, true, half_borrow, overflow_a || overflow_b);

        difference
    }

    fn subtract(&mut self, value: u8, with_carry: bool) {
        self.registers.a = self.subtract_value(value, with_carry);
    }

    fn compare(&mut self, value: u8) {
        let _ = self.subtract_value(value, false);
    }

    fn and(&mut self, value: u8) {
        let result = self.registers.a & value;
        self.registers.a = result;
        self.registers.set_flags(result == 0, false, true, false);
    }

    fn or(&mut self, value: u8) {
        let result = self.registers.a | value;
        self.registers.a = result;
        self.registers.set_flags(result == 0, false, false, false);
    }

    fn xor(&mut self, value: u8) {
        let result = self.registers.a ^ value;
        self.registers.a = result;
        self.registers.set_flags(result == 0, false, false, false);
    }

    fn increment(&mut self, value: u8) -> u8 {
        let incremented = value.wrapping_add(1);
        let carry = self.registers.carry_flag();
        self.registers.set_flags(incremented == 0, false, value & 0x0F == 0x0F, carry);
        incremented
    }

    fn decrement(&mut self, value: u8) -> u8 {
        let decremented = value.wrapping_sub(1);
        let carry = self.registers.carry_flag();
        self.registers.set_flags(decremented == 0, true, value & 0x0F == 0x00, carry);
        decremented
    }

    /// BCD adjustment of A after an ADD/ADC/SUB/SBC, steered by the N, H,
    /// and C flags per the CPU manual's table.
    fn decimal_adjust_accumulator(&mut self) {
        let mut a = self.registers.a;
        let subtract = self.registers.subtract_flag();
        let mut carry = self.registers.carry_flag();

        if subtract {
            let mut adjustment = 0x00_u8;
            if self.registers.half_carry_flag() {
                adjustment |= 0x06;
            }
            if carry {
                adjustment |= 0x60;
            }
            a = a.wrapping_sub(adjustment);
        } else {
            let mut adjustment = 0x00_u8;
            if self.registers.half_carry_flag() || a & 0x0F > 0x09 {
                adjustment |= 0x06;
            }
            if carry || a > 0x99 {
                adjustment |= 0x60;
                carry = true;
            }
            a = a.wrapping_add(adjustment);
        }

        self.registers.a = a;
        self.registers.set_flags(a == 0, subtract, false, carry);
    }

    //
    // 16-bit arithmetic
    //

    fn add_hl(&mut self, value: u16) {
        let hl = self.registers.hl();
        let (sum, overflow) = hl.overflowing_add(value);
        let half_carry = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;

        self.registers.set_hl(sum);
        let zero = self.registers.zero_flag();
        self.registers.set_flags(zero, false, half_carry, overflow);
    }

    // Shared by ADD SP,e and LD HL,SP+e: H and C come from unsigned 8-bit
    // arithmetic on the low byte of SP
    fn add_sp_offset(&mut self, offset: i8) -> u16 {
        let sp = self.registers.sp;
        let unsigned_offset = offset as u8;

        let half_carry = (sp & 0x000F) + u16::from(unsigned_offset & 0x0F) > 0x000F;
        let carry = (sp & 0x00FF) + u16::from(unsigned_offset) > 0x00FF;

        self.registers.set_flags(false, false, half_carry, carry);

        sp.wrapping_add_signed(offset.into())
    }

    //
    // Rotates, shifts, and bit operations
    //

    fn rotate_left(&mut self, value: u8, set_zero_flag: bool) -> u8 {
        let rotated = value.rotate_left(1);
        self.registers.set_flags(set_zero_flag && rotated == 0, false, false, value & 0x80 != 0);
        rotated
    }

    fn rotate_right(&mut self, value: u8, set_zero_flag: bool) -> u8 {
        let rotated = value.rotate_right(1);
        self.registers.set_flags(set_zero_flag && rotated == 0, false, false, value & 0x01 != 0);
        rotated
    }

    fn rotate_left_thru_carry(&mut self, value: u8, set_zero_flag: bool) -> u8 {
        let rotated = (value << 1) | u8::from(self.registers.carry_flag());
        self.registers.set_flags(set_zero_flag && rotated == 0, false, false, value & 0x80 != 0);
        rotated
    }

    fn rotate_right_thru_carry(&mut self, value: u8, set_zero_flag: bool) -> u8 {
        let rotated = (value >> 1) | (u8::from(self.registers.carry_flag()) << 7);
        self.registers.set_flags(set_zero_flag && rotated == 0, false, false, value & 0x01 != 0);
        rotated
    }

    fn shift_left(&mut self, value: u8) -> u8 {
        let shifted = value << 1;
        self.registers.set_flags(shifted == 0, false, false, value & 0x80 != 0);
        shifted
    }

    // Arithmetic shift preserves the sign bit
    fn arithmetic_shift_right(&mut self, value: u8) -> u8 {
        let shifted = (value >> 1) | (value & 0x80);
        self.registers.set_flags(shifted == 0, false, false, value & 0x01 != 0);
        shifted
    }

    fn logical_shift_right(&mut self, value: u8) -> u8 {
        let shifted = value >> 1;
        self.registers.set_flags(shifted == 0, false, false, value & 0x01 != 0);
        shifted
    }

    fn swap(&mut self, value: u8) -> u8 {
        let swapped = value.rotate_left(4);
        self.registers.set_flags(swapped == 0, false, false, false);
        swapped
    }

    fn test_bit(&mut self, bit: u8, value: u8) {
        let carry = self.registers.carry_flag();
        self.registers.set_flags(value & (1 << bit) == 0, false, true, carry);
    }
}
