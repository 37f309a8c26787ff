//! 8080/Z80 flag-semantics divergence and mode-switch safety
//!
//! The 8080 has no overflow flag at all: bit 2 of F always means parity
//! there, even after an arithmetic op. The Z80 reuses that same bit
//! position for signed overflow on arithmetic ops (parity everywhere
//! else). Same opcode, same operands, different bit 2 meaning — these
//! tests drive the same instruction through both modes and check that
//! the bit diverges exactly where the two chips disagree.

use super::*;

#[test]
fn add_signed_overflow_vs_parity_diverge() {
    // 0x7F + 0x01 = 0x80: signed overflow (Z80 meaning), but 0x80 has
    // odd parity (1 bit set), so the 8080 meaning is clear.
    let mut z80 = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    z80.a = 0x7F;
    z80.set_b(0x01);
    mem.write_byte(0, 0x80); // ADD A,B
    step(&mut z80, &mut mem);
    assert_eq!(z80.a, 0x80);
    assert!(z80.flag_p(), "Z80: P/V should report signed overflow here");

    let mut i8080 = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    i8080.a = 0x7F;
    i8080.set_b(0x01);
    mem.write_byte(0, 0x80);
    step(&mut i8080, &mut mem);
    assert_eq!(i8080.a, 0x80);
    assert!(!i8080.flag_p(), "8080: P should report parity of 0x80, which is odd");
}

#[test]
fn sub_no_overflow_but_even_parity() {
    // 0x01 - 0x02 = 0xFF: no signed overflow, but 0xFF has even parity.
    let mut z80 = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    z80.a = 0x01;
    z80.set_b(0x02);
    mem.write_byte(0, 0x90); // SUB B
    step(&mut z80, &mut mem);
    assert_eq!(z80.a, 0xFF);
    assert!(!z80.flag_p(), "Z80: no signed overflow crossing 0x01-0x02");

    let mut i8080 = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    i8080.a = 0x01;
    i8080.set_b(0x02);
    mem.write_byte(0, 0x90);
    step(&mut i8080, &mut mem);
    assert_eq!(i8080.a, 0xFF);
    assert!(i8080.flag_p(), "8080: 0xFF has even parity");
}

#[test]
fn inc_dec_parity_fixup_applies_too() {
    // INC 0x7F -> 0x80: same overflow/parity split as ADD.
    let mut z80 = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    z80.a = 0x7F;
    mem.write_byte(0, 0x3C); // INC A
    step(&mut z80, &mut mem);
    assert!(z80.flag_p());

    let mut i8080 = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    i8080.a = 0x7F;
    mem.write_byte(0, 0x3C);
    step(&mut i8080, &mut mem);
    assert!(!i8080.flag_p());
}

#[test]
fn logical_ops_are_parity_based_in_both_modes() {
    // AND/OR/XOR never had an overflow meaning on either chip, so the
    // fixup doesn't touch them: parity agrees across modes even though
    // the final byte still differs (8080 clears Y/X and forces N).
    let mut z80 = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    z80.a = 0xFF;
    z80.set_b(0x0F);
    mem.write_byte(0, 0xA0); // AND B -> 0x0F, even parity
    step(&mut z80, &mut mem);
    assert!(z80.flag_p());

    let mut i8080 = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    i8080.a = 0xFF;
    i8080.set_b(0x0F);
    mem.write_byte(0, 0xA0);
    step(&mut i8080, &mut mem);
    assert!(i8080.flag_p());
}

#[test]
fn eighty80_mask_clears_undocumented_y_x_bits() {
    // 0x10 + 0x10 = 0x20, which has the Y bit (bit 5) set in the raw
    // Z80-shaped flag byte. The 8080 has no undocumented Y/X flags, so
    // `write_f` clears bit 5 regardless of the raw computation.
    let mut z80 = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    z80.a = 0x10;
    z80.set_b(0x10);
    mem.write_byte(0, 0x80); // ADD A,B
    step(&mut z80, &mut mem);
    assert_ne!(z80.f & flags::Y, 0, "Z80 keeps the undocumented Y flag");

    let mut i8080 = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    i8080.a = 0x10;
    i8080.set_b(0x10);
    mem.write_byte(0, 0x80);
    step(&mut i8080, &mut mem);
    assert_eq!(i8080.f & flags::Y, 0, "8080 has no undocumented Y flag");
}

#[test]
fn eighty80_mask_forces_n_flag_high() {
    // The 8080 doesn't have an N flag either; bit 1 of F is always 1
    // there regardless of the operation (ADD clears N on the Z80).
    let mut cpu = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    cpu.a = 0x01;
    cpu.set_b(0x01);
    mem.write_byte(0, 0x80); // ADD A,B: Z80 would clear N here
    step(&mut cpu, &mut mem);
    assert_ne!(cpu.f & 0x02, 0, "8080 F bit 1 is always forced high");
}

#[test]
fn cpl_undocumented_flags_come_from_result_not_old_f() {
    // CPL's X/Y bits are copied from the post-complement A, not preserved
    // from whatever X/Y happened to be in F beforehand.
    let mut cpu = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    cpu.a = 0x0F; // complements to 0xF0: Y bit set, X bit clear
    cpu.f = flags::X; // old F has X set, Y clear — the opposite pattern
    mem.write_byte(0, 0x2F); // CPL
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.a, 0xF0);
    assert_ne!(cpu.f & flags::Y, 0, "Y should come from the new A, not stale F");
    assert_eq!(cpu.f & flags::X, 0, "X should come from the new A, not stale F");
}

#[test]
fn scf_ccf_undocumented_flags_come_from_a() {
    let mut cpu = cpu_in_mode(Mode::ZilogZ80);
    let mut mem = Memory::new();
    cpu.a = 0x28; // both Y and X bits set in A itself
    cpu.f = 0x00;
    mem.write_byte(0, 0x37); // SCF
    step(&mut cpu, &mut mem);
    assert!(cpu.flag_c());
    assert_ne!(cpu.f & flags::Y, 0);
    assert_ne!(cpu.f & flags::X, 0);
}

#[test]
fn mode_switch_does_not_retroactively_remask_stale_flags() {
    // Switching `mode` is a bare field assignment with no side effects:
    // it changes how the *next* `write_f` masks, not what's already
    // sitting in `f`.
    let mut cpu = cpu_in_mode(Mode::ZilogZ80);
    cpu.f = 0xAA; // has bits outside the 8080's S/Z/H/P/C/N set
    cpu.set_mode(Mode::Intel8080);
    assert_eq!(cpu.f, 0xAA, "mode switch alone must not touch F");
}

#[test]
fn daa_after_add_with_bcd_carry() {
    // 0x9A with C=1,H=0 going into DAA (post-ADD state in 8080 mode):
    // both nibbles need the +0x66 adjustment, wrapping A to 0 and
    // leaving carry set per the classic 8080 DAA table.
    let mut cpu = cpu_in_mode(Mode::Intel8080);
    let mut mem = Memory::new();
    cpu.a = 0x9A;
    cpu.f = flags::C;
    mem.write_byte(0, 0x27); // DAA
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag_c());
    assert!(cpu.flag_z());
}
