use super::{new_test_system, PROGRAM_START};

// Execute the first instruction of the given program and assert that it
// emitted exactly the documented number of T-cycles worth of device ticks.
fn assert_t_cycles(program_hex: &str, expected_t_cycles: u64) {
    let (mut cpu, mut bus, _) = new_test_system(program_hex);

    // Run the NOP + JP preamble to reach the program
    while cpu.registers.pc != PROGRAM_START {
        cpu.step(&mut bus);
    }

    let m_cycles_before = bus.m_cycles_elapsed();
    cpu.step(&mut bus);
    let m_cycles = bus.m_cycles_elapsed() - m_cycles_before;

    assert_eq!(
        expected_t_cycles, 4 * m_cycles,
        "instruction {program_hex} should take {expected_t_cycles} T-cycles, took {}",
        4 * m_cycles
    );
}

#[test]
fn eight_bit_load_cycle_counts() {
    // LD B, C
    assert_t_cycles("41", 4);
    // LD B, n
    assert_t_cycles("0642", 8);
    // LD B, (HL)
    assert_t_cycles("46", 8);
    // LD (HL), B
    assert_t_cycles("70", 8);
    // LD (HL), n
    assert_t_cycles("3642", 12);
    // LD A, (BC)
    assert_t_cycles("0A", 8);
    // LD (DE), A
    assert_t_cycles("12", 8);
    // LD A, (nn)
    assert_t_cycles("FA00C0", 16);
    // LD (nn), A
    assert_t_cycles("EA00C0", 16);
    // LDH A, (n)
    assert_t_cycles("F090", 12);
    // LDH (n), A
    assert_t_cycles("E090", 12);
    // LD A, (0xFF00+C)
    assert_t_cycles("F2", 8);
    // LD (HL+), A
    assert_t_cycles("22", 8);
}

#[test]
fn sixteen_bit_load_cycle_counts() {
    // LD BC, nn
    assert_t_cycles("014242", 12);
    // LD (nn), SP
    assert_t_cycles("0800C0", 20);
    // LD SP, HL
    assert_t_cycles("F9", 8);
    // PUSH BC
    assert_t_cycles("C5", 16);
    // POP BC
    assert_t_cycles("C1", 12);
}

#[test]
fn arithmetic_cycle_counts() {
    // ADD B
    assert_t_cycles("80", 4);
    // ADD (HL)
    assert_t_cycles("86", 8);
    // ADD n
    assert_t_cycles("C642", 8);
    // INC B
    assert_t_cycles("04", 4);
    // INC (HL)
    assert_t_cycles("34", 12);
    // INC BC
    assert_t_cycles("03", 8);
    // ADD HL, BC
    assert_t_cycles("09", 8);
    // ADD SP, n
    assert_t_cycles("E801", 16);
    // LD HL, SP+n
    assert_t_cycles("F801", 12);
    // DAA
    assert_t_cycles("27", 4);
}

#[test]
fn bit_operation_cycle_counts() {
    // RLCA
    assert_t_cycles("07", 4);
    // RLC B
    assert_t_cycles("CB00", 8);
    // RLC (HL)
    assert_t_cycles("CB06", 16);
    // BIT 0, B
    assert_t_cycles("CB40", 8);
    // BIT 0, (HL)
    assert_t_cycles("CB46", 12);
    // SET 0, (HL)
    assert_t_cycles("CBC6", 16);
    // RES 0, (HL)
    assert_t_cycles("CB86", 16);
}

#[test]
fn control_flow_cycle_counts() {
    // NOP
    assert_t_cycles("00", 4);
    // JP nn
    assert_t_cycles("C35301", 16);
    // JP HL
    assert_t_cycles("E9", 4);
    // JR n
    assert_t_cycles("1800", 12);
    // CALL nn
    assert_t_cycles("CD5301", 24);
    // RST 0x10
    assert_t_cycles("D7", 16);
    // DI
    assert_t_cycles("F3", 4);
    // EI
    assert_t_cycles("FB", 4);

    // Post-boot Z is set: Z-conditioned branches are taken, NZ are not
    // JP Z, nn (taken)
    assert_t_cycles("CA5301", 16);
    // JP NZ, nn (not taken)
    assert_t_cycles("C25301", 12);
    // JR Z, n (taken)
    assert_t_cycles("2800", 12);
    // JR NZ, n (not taken)
    assert_t_cycles("2000", 8);
    // CALL Z, nn (taken)
    assert_t_cycles("CC5301", 24);
    // CALL NZ, nn (not taken)
    assert_t_cycles("C45301", 12);
    // RET Z (taken)
    assert_t_cycles("C8", 20);
    // RET NZ (not taken)
    assert_t_cycles("C0", 8);
    // RET
    assert_t_cycles("C9", 16);
    // RETI
    assert_t_cycles("D9", 16);
}

#[test]
fn interrupt_dispatch_cycle_count() {
    let (mut cpu, mut bus, _) = new_test_system("00");
    while cpu.registers.pc != PROGRAM_START {
        cpu.step(&mut bus);
    }

    cpu.registers.ime = true;
    bus.write(0xFFFF, 0x04);
    bus.write(0xFF0F, 0x04);

    let m_cycles_before = bus.m_cycles_elapsed();
    cpu.step(&mut bus);

    // Dispatch costs 5 machine cycles and lands on the Timer vector
    assert_eq!(5, bus.m_cycles_elapsed() - m_cycles_before);
    assert_eq!(0x0050, cpu.registers.pc);
}
