use super::{hash_map, run_test, set_in_state, ExpectedState, R8_OPERAND_CODES};

#[test]
fn load_register_immediate() {
    for code in R8_OPERAND_CODES {
        let load_opcode = 0x06 | (code << 3);

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, code, 0x83);

        run_test(&format!("{load_opcode:02x}83"), &expected_state);
    }
}

#[test]
fn load_register_register() {
    for source in R8_OPERAND_CODES {
        for destination in R8_OPERAND_CODES {
            let load_immediate_opcode = 0x06 | (source << 3);
            let load_opcode = 0x40 | (destination << 3) | source;

            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, destination, 0x47);

            run_test(
                // LD <src>, 0x47; LD <dst>, <src>
                &format!("{load_immediate_opcode:02x}47{load_opcode:02x}"),
                &expected_state,
            );
        }
    }
}

#[test]
fn load_indirect_hl() {
    run_test(
        // LD HL, 0xC600; LD (HL), 0x99; LD B, (HL)
        "2100C6369946",
        &ExpectedState {
            b: Some(0x99),
            memory: hash_map! { 0xC600: 0x99 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC600; LD D, 0x5E; LD (HL), D
        "2100C6165E72",
        &ExpectedState {
            memory: hash_map! { 0xC600: 0x5E },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_indirect_pairs() {
    run_test(
        // LD BC, 0xC234; LD A, 0x7D; LD (BC), A
        "0134C23E7D02",
        &ExpectedState {
            memory: hash_map! { 0xC234: 0x7D },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD DE, 0xC235; LD A, 0x7E; LD (DE), A
        "1135C23E7E12",
        &ExpectedState {
            memory: hash_map! { 0xC235: 0x7E },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD BC, 0xC234; LD A, 0x12; LD (BC), A; XOR A; LD A, (BC)
        "0134C23E1202AF0A",
        &ExpectedState {
            a: Some(0x12),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_increment_decrement() {
    run_test(
        // LD HL, 0xC500; LD A, 0x11; LD (HL+), A; LD (HL+), A
        "2100C53E112222",
        &ExpectedState {
            h: Some(0xC5),
            l: Some(0x02),
            memory: hash_map! { 0xC500: 0x11, 0xC501: 0x11 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC501; LD A, 0x22; LD (HL-), A; LD (HL-), A
        "2101C53E223232",
        &ExpectedState {
            h: Some(0xC4),
            l: Some(0xFF),
            memory: hash_map! { 0xC501: 0x22, 0xC500: 0x22 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC500; LD (HL), 0x55; LD A, (HL+)
        "2100C536552A",
        &ExpectedState {
            a: Some(0x55),
            h: Some(0xC5),
            l: Some(0x01),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_direct() {
    run_test(
        // LD A, 0x6A; LD (0xC777), A; XOR A; LD A, (0xC777)
        "3E6AEA77C7AFFA77C7",
        &ExpectedState {
            a: Some(0x6A),
            memory: hash_map! { 0xC777: 0x6A },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_high_page() {
    run_test(
        // LD A, 0x39; LDH (0x90), A; XOR A; LDH A, (0x90)
        "3E39E090AFF090",
        &ExpectedState {
            a: Some(0x39),
            memory: hash_map! { 0xFF90: 0x39 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD C, 0x91; LD A, 0x3A; LD (0xFF00+C), A
        "0E913E3AE2",
        &ExpectedState {
            memory: hash_map! { 0xFF91: 0x3A },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD C, 0x92; LD A, 0x3B; LD (0xFF00+C), A; XOR A; LD A, (0xFF00+C)
        "0E923E3BE2AFF2",
        &ExpectedState {
            a: Some(0x3B),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_register_pair_immediate() {
    run_test(
        "018813",
        &ExpectedState {
            b: Some(0x13),
            c: Some(0x88),
            ..ExpectedState::empty()
        },
    );

    run_test(
        "31FEDF",
        &ExpectedState {
            sp: Some(0xDFFE),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct_stack_pointer() {
    run_test(
        // LD SP, 0xDEAD; LD (0xC300), SP
        "31ADDE0800C3",
        &ExpectedState {
            memory: hash_map! { 0xC300: 0xAD, 0xC301: 0xDE },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_stack_pointer_hl() {
    run_test(
        // LD HL, 0xD123; LD SP, HL
        "2123D1F9",
        &ExpectedState {
            sp: Some(0xD123),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_stack_pointer_offset() {
    run_test(
        // LD SP, 0xCFF8; LD HL, SP+0x08
        "31F8CFF808",
        &ExpectedState {
            h: Some(0xD0),
            l: Some(0x00),
            f: Some(0x30),
            sp: Some(0xCFF8),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xD000; LD HL, SP-2
        "3100D0F8FE",
        &ExpectedState {
            h: Some(0xCF),
            l: Some(0xFE),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_pop_round_trip() {
    run_test(
        // LD SP, 0xDFFE; LD BC, 0x1234; PUSH BC; POP DE
        "31FEDF013412C5D1",
        &ExpectedState {
            d: Some(0x12),
            e: Some(0x34),
            sp: Some(0xDFFE),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xDFFE; LD BC, 0x8F8F; PUSH BC; POP AF
        // The low nibble of F always reads zero
        "31FEDF018F8FC5F1",
        &ExpectedState {
            a: Some(0x8F),
            f: Some(0x80),
            sp: Some(0xDFFE),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xDFFE; LD HL, 0xBEEF; PUSH HL
        "31FEDF21EFBEE5",
        &ExpectedState {
            sp: Some(0xDFFC),
            memory: hash_map! { 0xDFFD: 0xBE, 0xDFFC: 0xEF },
            ..ExpectedState::empty()
        },
    );
}
