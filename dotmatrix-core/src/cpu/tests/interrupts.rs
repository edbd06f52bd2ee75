use super::{new_test_system, PROGRAM_START};
use crate::interrupts::InterruptType;

fn run_preamble(
    cpu: &mut crate::cpu::Cpu,
    bus: &mut crate::bus::Bus,
) {
    while cpu.registers.pc != PROGRAM_START {
        cpu.step(bus);
    }
}

#[test]
fn ei_enables_after_one_instruction() {
    // EI; NOP; NOP
    let (mut cpu, mut bus, _) = new_test_system("FB0000");
    run_preamble(&mut cpu, &mut bus);
    bus.write(0xFF0F, 0x00);

    cpu.step(&mut bus);
    assert!(!cpu.registers.ime);

    cpu.step(&mut bus);
    assert!(cpu.registers.ime);
}

#[test]
fn ei_then_di_leaves_interrupts_disabled() {
    // EI; DI; NOP, with VBlank pending the whole time
    let (mut cpu, mut bus, program_end) = new_test_system("FBF300");
    run_preamble(&mut cpu, &mut bus);
    bus.write(0xFFFF, 0x01);
    bus.write(0xFF0F, 0x01);

    while cpu.registers.pc < program_end {
        cpu.step(&mut bus);
    }

    // The one-instruction EI delay was cancelled by DI: no dispatch happened
    assert!(!cpu.registers.ime);
    assert_eq!(program_end, cpu.registers.pc);
    assert_eq!(0xE1, bus.read(0xFF0F));
}

#[test]
fn pending_interrupt_dispatches_once_ime_is_set() {
    // EI; NOP; (dispatch happens at the next boundary)
    let (mut cpu, mut bus, _) = new_test_system("FB00");
    run_preamble(&mut cpu, &mut bus);
    bus.write(0xFFFF, 0x01);
    bus.write(0xFF0F, 0x01);

    cpu.step(&mut bus); // EI
    cpu.step(&mut bus); // NOP; IME becomes true afterwards
    cpu.step(&mut bus); // dispatch

    assert_eq!(InterruptType::VBlank.handler_address(), cpu.registers.pc);
    assert!(!cpu.registers.ime);
    assert_eq!(0xE0, bus.read(0xFF0F));
}

#[test]
fn lowest_pending_bit_wins_and_only_it_clears() {
    let (mut cpu, mut bus, _) = new_test_system("00");
    run_preamble(&mut cpu, &mut bus);

    cpu.registers.ime = true;
    bus.write(0xFFFF, 0x1F);
    // Timer, Serial, and Joypad all pending
    bus.write(0xFF0F, 0x1C);

    cpu.step(&mut bus);

    assert_eq!(InterruptType::Timer.handler_address(), cpu.registers.pc);
    // Serial and Joypad stay latched
    assert_eq!(0xE0 | 0x18, bus.read(0xFF0F));
}

#[test]
fn halt_with_ime_waits_then_dispatches() {
    // HALT; the Timer interrupt arrives later and is serviced
    let (mut cpu, mut bus, _) = new_test_system("76");
    run_preamble(&mut cpu, &mut bus);

    cpu.registers.ime = true;
    bus.write(0xFF0F, 0x00);
    bus.write(0xFFFF, 0x04);
    // Timer: enabled, fastest rate
    bus.write(0xFF07, 0x05);
    bus.write(0xFF05, 0xF0);

    cpu.step(&mut bus);
    assert!(cpu.registers.halted);

    let mut steps = 0;
    while cpu.registers.halted {
        cpu.step(&mut bus);
        steps += 1;
        assert!(steps < 100_000, "timer interrupt never woke the CPU");
    }

    // The step that wakes the CPU also dispatches
    assert_eq!(InterruptType::Timer.handler_address(), cpu.registers.pc);
    assert!(!cpu.registers.ime);
}

#[test]
fn halt_with_ime_clear_resumes_without_dispatch() {
    // HALT; LD B, 0x22
    let (mut cpu, mut bus, program_end) = new_test_system("760622");
    run_preamble(&mut cpu, &mut bus);

    cpu.registers.ime = false;
    bus.write(0xFF0F, 0x00);
    bus.write(0xFFFF, 0x04);
    bus.write(0xFF07, 0x05);
    bus.write(0xFF05, 0xF0);

    let mut steps = 0;
    while cpu.registers.pc < program_end {
        cpu.step(&mut bus);
        steps += 1;
        assert!(steps < 100_000, "CPU never resumed from HALT");
    }

    // Resumed and ran the rest of the program without taking the vector
    assert_eq!(0x22, cpu.registers.b);
    assert!(!cpu.registers.ime);
    // The request is still latched because nothing dispatched
    assert_ne!(0, bus.read(0xFF0F) & 0x04);
}

#[test]
fn halt_bug_executes_next_byte_twice() {
    // XOR A; INC A; HALT; INC A -- with IME clear and an interrupt already
    // pending, the INC A after HALT runs twice
    let (mut cpu, mut bus, program_end) = new_test_system("AF3C763C");
    run_preamble(&mut cpu, &mut bus);

    bus.write(0xFFFF, 0x01);
    bus.write(0xFF0F, 0x01);

    let mut steps = 0;
    while cpu.registers.pc < program_end {
        cpu.step(&mut bus);
        steps += 1;
        assert!(steps < 100, "halt bug program did not terminate");
    }

    assert_eq!(0x03, cpu.registers.a);
}

#[test]
fn reti_enables_interrupts_immediately() {
    // LD SP, 0xDFFE; PUSH BC; RETI
    let (mut cpu, mut bus, _) = new_test_system("31FEDFC5D9");
    run_preamble(&mut cpu, &mut bus);
    bus.write(0xFF0F, 0x00);

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert!(!cpu.registers.ime);

    cpu.step(&mut bus);
    assert!(cpu.registers.ime);
    assert_eq!(cpu.registers.bc(), cpu.registers.pc);
}

#[test]
fn di_clears_pending_enable_and_ime() {
    let (mut cpu, mut bus, _) = new_test_system("F3");
    run_preamble(&mut cpu, &mut bus);

    cpu.registers.ime = true;
    cpu.registers.ime_pending = true;
    cpu.step(&mut bus);

    assert!(!cpu.registers.ime);
    assert!(!cpu.registers.ime_pending);
}

#[test]
fn undefined_opcode_locks_the_cpu_but_time_flows() {
    let (mut cpu, mut bus, _) = new_test_system("DD");
    run_preamble(&mut cpu, &mut bus);

    cpu.step(&mut bus);
    assert!(cpu.locked());

    // Further steps keep ticking the machine without executing anything
    let pc = cpu.registers.pc;
    let m_cycles_before = bus.m_cycles_elapsed();
    for _ in 0..10 {
        cpu.step(&mut bus);
    }
    assert_eq!(pc, cpu.registers.pc);
    assert_eq!(10, bus.m_cycles_elapsed() - m_cycles_before);
}
