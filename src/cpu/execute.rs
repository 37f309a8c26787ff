//! Instruction decode and dispatch for all four prefix planes
//!
//! `step` hands a single fetched opcode byte to [`Cpu::execute_unprefixed`],
//! which decomposes it into the standard `x`/`y`/`z`/`p`/`q` fields and
//! either dispatches directly or falls into one of the prefix-specific
//! functions below (`execute_cb`, `execute_ed`, `execute_indexed`,
//! `execute_indexed_cb`). There is no materialized `Operation` struct and
//! no recursive re-entry into `step` — each plane is its own function.

use super::flags::{self, LogicalOp, ShiftKind};
use super::{Cpu, Mode};
use crate::memory::Memory;
use crate::ports::PortBus;

/// Which index register a `DD`/`FD`-prefixed instruction addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexReg {
    Ix,
    Iy,
}

impl Cpu {
    fn index(&self, idx: IndexReg) -> u16 {
        match idx {
            IndexReg::Ix => self.ix,
            IndexReg::Iy => self.iy,
        }
    }

    fn set_index(&mut self, idx: IndexReg, val: u16) {
        match idx {
            IndexReg::Ix => self.ix = val,
            IndexReg::Iy => self.iy = val,
        }
    }

    fn index_half(&self, idx: IndexReg, high: bool) -> u8 {
        match (idx, high) {
            (IndexReg::Ix, true) => self.ixh(),
            (IndexReg::Ix, false) => self.ixl(),
            (IndexReg::Iy, true) => self.iyh(),
            (IndexReg::Iy, false) => self.iyl(),
        }
    }

    fn set_index_half(&mut self, idx: IndexReg, high: bool, val: u8) {
        match (idx, high) {
            (IndexReg::Ix, true) => self.set_ixh(val),
            (IndexReg::Ix, false) => self.set_ixl(val),
            (IndexReg::Iy, true) => self.set_iyh(val),
            (IndexReg::Iy, false) => self.set_iyl(val),
        }
    }

    fn shift_kind(y: u8) -> ShiftKind {
        match y {
            0 => ShiftKind::Rlc,
            1 => ShiftKind::Rrc,
            2 => ShiftKind::Rl,
            3 => ShiftKind::Rr,
            4 => ShiftKind::Sla,
            5 => ShiftKind::Sra,
            6 => ShiftKind::Sll,
            7 => ShiftKind::Srl,
            _ => unreachable!("3-bit field"),
        }
    }

    /// Entry point from `step`: apply the 8080/Z80 mode gate, then decode.
    ///
    /// On the 8080, `CB`/`DD`/`ED`/`FD` have no meaning as prefixes — the
    /// 8080 decodes every opcode by its top two bits regardless of the
    /// low six, so these four bytes fall into the documented JMP/CALL
    /// encoding families instead of going unused: `0xCB` duplicates `JMP
    /// nn` (`0xC3`), `0xDD`/`0xED`/`0xFD` each duplicate `CALL nn`
    /// (`0xCD`), matching §4.8. The handful of Z80-only unprefixed
    /// opcodes (`EX AF,AF'`, `DJNZ`, the unconditional and conditional
    /// `JR`s) fold to undocumented 8080 NOPs, and `0xD9` (`EXX` on the
    /// Z80) decodes as the 8080's duplicate `RET`.
    pub(super) fn execute_unprefixed(
        &mut self,
        mem: &mut Memory,
        ports: &mut dyn PortBus,
        opcode: u8,
        x: u8,
        y: u8,
        z: u8,
        p: u8,
        q: u8,
    ) {
        if self.mode == Mode::Intel8080 {
            match opcode {
                0xCB => {
                    self.pc = self.fetch_word(mem);
                    return;
                }
                0xDD | 0xED | 0xFD => {
                    let nn = self.fetch_word(mem);
                    self.helpers_push_word(mem, self.pc);
                    self.pc = nn;
                    return;
                }
                0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => return,
                0xD9 => {
                    self.pc = self.pop_word(mem);
                    return;
                }
                _ => {}
            }
        }
        self.execute_unprefixed_core(mem, ports, x, y, z, p, q);
    }

    fn execute_unprefixed_core(
        &mut self,
        mem: &mut Memory,
        ports: &mut dyn PortBus,
        x: u8,
        y: u8,
        z: u8,
        p: u8,
        q: u8,
    ) {
        match x {
            0 => self.execute_x0(mem, y, z, p, q),
            1 => self.execute_x1(mem, y, z),
            2 => self.execute_x2(mem, y, z),
            3 => self.execute_x3(mem, ports, y, z, p, q),
            _ => unreachable!("2-bit field"),
        }
    }

    fn execute_x0(&mut self, mem: &mut Memory, y: u8, z: u8, p: u8, q: u8) {
        match z {
            0 => match y {
                0 => {}
                1 => self.ex_af(),
                2 => {
                    let d = self.fetch_disp(mem);
                    let b = self.b().wrapping_sub(1);
                    self.set_b(b);
                    if b != 0 {
                        self.pc = self.pc.wrapping_add(d as i16 as u16);
                    }
                }
                3 => {
                    let d = self.fetch_disp(mem);
                    self.pc = self.pc.wrapping_add(d as i16 as u16);
                }
                4..=7 => {
                    let d = self.fetch_disp(mem);
                    if self.check_cc(y - 4) {
                        self.pc = self.pc.wrapping_add(d as i16 as u16);
                    }
                }
                _ => unreachable!("3-bit field"),
            },
            1 => {
                if q == 0 {
                    let nn = self.fetch_word(mem);
                    self.set_rp(p, nn);
                } else {
                    let rp = self.get_rp(p);
                    let result = self.alu_add16(self.hl, rp);
                    self.hl = result;
                }
            }
            2 => match (q, p) {
                (0, 0) => mem.write_byte(self.bc, self.a),
                (0, 1) => mem.write_byte(self.de, self.a),
                (0, 2) => {
                    let nn = self.fetch_word(mem);
                    mem.write_word(nn, self.hl);
                }
                (0, 3) => {
                    let nn = self.fetch_word(mem);
                    mem.write_byte(nn, self.a);
                }
                (1, 0) => self.a = mem.read_byte(self.bc),
                (1, 1) => self.a = mem.read_byte(self.de),
                (1, 2) => {
                    let nn = self.fetch_word(mem);
                    self.hl = mem.read_word(nn);
                }
                (1, 3) => {
                    let nn = self.fetch_word(mem);
                    self.a = mem.read_byte(nn);
                }
                _ => unreachable!("2-bit fields"),
            },
            3 => {
                let rp = self.get_rp(p);
                self.set_rp(p, if q == 0 { rp.wrapping_add(1) } else { rp.wrapping_sub(1) });
            }
            4 => {
                let val = self.get_reg8(y, mem);
                let result = self.alu_inc(val);
                self.set_reg8(y, result, mem);
            }
            5 => {
                let val = self.get_reg8(y, mem);
                let result = self.alu_dec(val);
                self.set_reg8(y, result, mem);
            }
            6 => {
                let n = self.fetch_byte(mem);
                self.set_reg8(y, n, mem);
            }
            7 => match y {
                0 => self.alu_rlca(),
                1 => self.alu_rrca(),
                2 => self.alu_rla(),
                3 => self.alu_rra(),
                4 => self.alu_daa(),
                5 => {
                    self.a = !self.a;
                    let mut raw = self.f & (flags::S | flags::Z | flags::P | flags::C);
                    raw |= self.a & (flags::Y | flags::X);
                    raw |= flags::H | flags::N;
                    self.write_f(raw);
                }
                6 => {
                    let mut raw = self.f & (flags::S | flags::Z | flags::P);
                    raw |= self.a & (flags::Y | flags::X);
                    raw |= flags::C;
                    self.write_f(raw);
                }
                7 => {
                    let old_c = self.flag_c();
                    let mut raw = self.f & (flags::S | flags::Z | flags::P);
                    raw |= self.a & (flags::Y | flags::X);
                    if old_c {
                        raw |= flags::H;
                    } else {
                        raw |= flags::C;
                    }
                    self.write_f(raw);
                }
                _ => unreachable!("3-bit field"),
            },
            _ => unreachable!("3-bit field"),
        }
    }

    fn execute_x1(&mut self, mem: &mut Memory, y: u8, z: u8) {
        if y == 6 && z == 6 {
            self.halted = true;
            self.pc = self.pc.wrapping_sub(1);
            return;
        }
        let val = self.get_reg8(z, mem);
        self.set_reg8(y, val, mem);
    }

    fn execute_x2(&mut self, mem: &mut Memory, y: u8, z: u8) {
        let val = self.get_reg8(z, mem);
        self.execute_alu(y, val);
    }

    fn execute_alu(&mut self, y: u8, val: u8) {
        match y {
            0 => self.a = self.alu_add(val, false),
            1 => self.a = self.alu_add(val, true),
            2 => self.a = self.alu_sub(val, false),
            3 => self.a = self.alu_sub(val, true),
            4 => self.a = self.alu_logical(LogicalOp::And, val),
            5 => self.a = self.alu_logical(LogicalOp::Xor, val),
            6 => self.a = self.alu_logical(LogicalOp::Or, val),
            7 => {
                self.alu_sub(val, false);
            }
            _ => unreachable!("3-bit field"),
        }
    }

    fn execute_x3(
        &mut self,
        mem: &mut Memory,
        ports: &mut dyn PortBus,
        y: u8,
        z: u8,
        p: u8,
        q: u8,
    ) {
        match z {
            0 => {
                if self.check_cc(y) {
                    self.pc = self.pop_word(mem);
                }
            }
            1 => {
                if q == 0 {
                    let val = self.pop_word(mem);
                    self.set_rp2(p, val);
                } else {
                    match p {
                        0 => self.pc = self.pop_word(mem),
                        1 => self.exx(),
                        2 => self.pc = self.hl,
                        3 => self.sp = self.hl,
                        _ => unreachable!("2-bit field"),
                    }
                }
            }
            2 => {
                let nn = self.fetch_word(mem);
                if self.check_cc(y) {
                    self.pc = nn;
                }
            }
            3 => match y {
                0 => self.pc = self.fetch_word(mem),
                1 => {
                    let opcode = self.fetch_byte(mem);
                    let cx = (opcode >> 6) & 3;
                    let cy = (opcode >> 3) & 7;
                    let cz = opcode & 7;
                    self.execute_cb(mem, cx, cy, cz);
                }
                2 => {
                    let n = self.fetch_byte(mem);
                    ports.output(n as u16, self.a);
                }
                3 => {
                    let n = self.fetch_byte(mem);
                    self.a = ports.input(n as u16);
                }
                4 => self.hl = self.ex_sp_word(mem, self.hl),
                5 => self.ex_de_hl(),
                6 => {
                    self.iff1 = false;
                    self.iff2 = false;
                }
                7 => self.ei_delay = 2,
                _ => unreachable!("3-bit field"),
            },
            4 => {
                let nn = self.fetch_word(mem);
                if self.check_cc(y) {
                    self.helpers_push_word(mem, self.pc);
                    self.pc = nn;
                }
            }
            5 => {
                if q == 0 {
                    let val = self.get_rp2(p);
                    self.helpers_push_word(mem, val);
                } else {
                    match p {
                        0 => {
                            let nn = self.fetch_word(mem);
                            self.helpers_push_word(mem, self.pc);
                            self.pc = nn;
                        }
                        1 => self.execute_indexed(mem, ports, IndexReg::Ix),
                        2 => self.execute_ed(mem, ports),
                        3 => self.execute_indexed(mem, ports, IndexReg::Iy),
                        _ => unreachable!("2-bit field"),
                    }
                }
            }
            6 => {
                let n = self.fetch_byte(mem);
                self.execute_alu(y, n);
            }
            7 => {
                self.helpers_push_word(mem, self.pc);
                self.pc = (y as u16) * 8;
            }
            _ => unreachable!("3-bit field"),
        }
    }

    fn execute_cb(&mut self, mem: &mut Memory, x: u8, y: u8, z: u8) {
        let val = self.get_reg8(z, mem);
        match x {
            0 => {
                let result = self.alu_shift(Self::shift_kind(y), val);
                self.set_reg8(z, result, mem);
            }
            1 => self.alu_bit(val, y, val),
            2 => self.set_reg8(z, val & !(1 << y), mem),
            3 => self.set_reg8(z, val | (1 << y), mem),
            _ => unreachable!("2-bit field"),
        }
    }

    fn execute_ed(&mut self, mem: &mut Memory, ports: &mut dyn PortBus) {
        let opcode = self.fetch_byte(mem);
        let x = (opcode >> 6) & 3;
        let y = (opcode >> 3) & 7;
        let z = opcode & 7;
        let p = (y >> 1) & 3;
        let q = y & 1;

        match x {
            1 => match z {
                0 => {
                    let val = ports.input(self.bc);
                    if y != 6 {
                        self.set_reg8(y, val, mem);
                    }
                    let mut raw = val & (flags::Y | flags::X);
                    if val == 0 {
                        raw |= flags::Z;
                    }
                    if val & 0x80 != 0 {
                        raw |= flags::S;
                    }
                    if flags::parity8(val) {
                        raw |= flags::P;
                    }
                    raw |= self.f & flags::C;
                    self.write_f(raw);
                }
                1 => {
                    let val = if y == 6 { 0 } else { self.get_reg8(y, mem) };
                    ports.output(self.bc, val);
                }
                2 => {
                    let rp = self.get_rp(p);
                    let result = if q == 0 {
                        self.alu_sbc16(self.hl, rp)
                    } else {
                        self.alu_adc16(self.hl, rp)
                    };
                    self.hl = result;
                }
                3 => {
                    let nn = self.fetch_word(mem);
                    if q == 0 {
                        mem.write_word(nn, self.get_rp(p));
                    } else {
                        let val = mem.read_word(nn);
                        self.set_rp(p, val);
                    }
                }
                4 => {
                    let a = self.a;
                    let (result, raw) = flags::compute_sub8(0, a, 0);
                    self.a = result;
                    self.write_f(raw);
                }
                5 => {
                    self.pc = self.pop_word(mem);
                    self.iff1 = self.iff2;
                }
                6 => {
                    self.im = match y {
                        0 | 1 | 4 | 5 => super::InterruptMode::Mode0,
                        2 | 6 => super::InterruptMode::Mode1,
                        3 | 7 => super::InterruptMode::Mode2,
                        _ => unreachable!("3-bit field"),
                    };
                }
                7 => match y {
                    0 => self.i = self.a,
                    1 => self.r = self.a,
                    2 => {
                        self.a = self.i;
                        self.ed_ld_a_flags();
                    }
                    3 => {
                        self.a = self.r;
                        self.ed_ld_a_flags();
                    }
                    4 => self.alu_rrd(mem),
                    5 => self.alu_rld(mem),
                    6 | 7 => {}
                    _ => unreachable!("3-bit field"),
                },
                _ => unreachable!("3-bit field"),
            },
            2 if y >= 4 => self.execute_bli(mem, ports, y, z),
            _ => log::trace!("undefined opcode ed{:02x}, treated as NOP", opcode),
        }
    }

    /// `LD A,I` / `LD A,R`: S/Z/Y/X from the loaded value, P/V = IFF2, C preserved.
    fn ed_ld_a_flags(&mut self) {
        let a = self.a;
        let mut raw = a & (flags::Y | flags::X);
        if a == 0 {
            raw |= flags::Z;
        }
        if a & 0x80 != 0 {
            raw |= flags::S;
        }
        if self.iff2 {
            raw |= flags::P;
        }
        raw |= self.f & flags::C;
        self.write_f(raw);
    }

    fn alu_rrd(&mut self, mem: &mut Memory) {
        let mem_val = mem.read_byte(self.hl);
        let a = self.a;
        let new_a = (a & 0xF0) | (mem_val & 0x0F);
        let new_mem = ((a & 0x0F) << 4) | (mem_val >> 4);
        self.a = new_a;
        mem.write_byte(self.hl, new_mem);
        self.rotate_digit_flags(new_a);
    }

    fn alu_rld(&mut self, mem: &mut Memory) {
        let mem_val = mem.read_byte(self.hl);
        let a = self.a;
        let new_a = (a & 0xF0) | (mem_val >> 4);
        let new_mem = ((mem_val & 0x0F) << 4) | (a & 0x0F);
        self.a = new_a;
        mem.write_byte(self.hl, new_mem);
        self.rotate_digit_flags(new_a);
    }

    fn rotate_digit_flags(&mut self, new_a: u8) {
        let mut raw = self.f & flags::C;
        raw |= new_a & (flags::Y | flags::X);
        if new_a == 0 {
            raw |= flags::Z;
        }
        if new_a & 0x80 != 0 {
            raw |= flags::S;
        }
        if flags::parity8(new_a) {
            raw |= flags::P;
        }
        self.write_f(raw);
    }

    /// `LDI`/`LDD`/`LDIR`/`LDDR`, `CPI`/`CPD`/`CPIR`/`CPDR`, `INI`/`IND`/
    /// `INIR`/`INDR`, `OUTI`/`OUTD`/`OTIR`/`OTDR`.
    ///
    /// Repeating forms rewind PC by 2 after one element so the *same*
    /// `step` call is naturally re-entered by the host on its next call —
    /// one element transferred per `step`, rather than looping internally
    /// over the whole block in a single call.
    fn execute_bli(&mut self, mem: &mut Memory, ports: &mut dyn PortBus, y: u8, z: u8) {
        let inc = y == 4 || y == 6;
        let repeat = y == 6 || y == 7;
        match z {
            0 => self.bli_ld(mem, inc, repeat),
            1 => self.bli_cp(mem, inc, repeat),
            2 => self.bli_in(mem, ports, inc, repeat),
            3 => self.bli_out(mem, ports, inc, repeat),
            _ => unreachable!("2-bit field"),
        }
    }

    fn bli_ld(&mut self, mem: &mut Memory, inc: bool, repeat: bool) {
        let val = mem.read_byte(self.hl);
        mem.write_byte(self.de, val);
        if inc {
            self.hl = self.hl.wrapping_add(1);
            self.de = self.de.wrapping_add(1);
        } else {
            self.hl = self.hl.wrapping_sub(1);
            self.de = self.de.wrapping_sub(1);
        }
        self.bc = self.bc.wrapping_sub(1);

        let n = self.a.wrapping_add(val);
        let mut raw = self.f & (flags::S | flags::Z | flags::C);
        raw |= n & flags::X;
        if n & 0x02 != 0 {
            raw |= flags::Y;
        }
        if self.bc != 0 {
            raw |= flags::P;
        }
        self.write_f(raw);

        if repeat && self.bc != 0 {
            self.pc = self.pc.wrapping_sub(2);
        }
    }

    fn bli_cp(&mut self, mem: &mut Memory, inc: bool, repeat: bool) {
        let val = mem.read_byte(self.hl);
        let (result, sub_raw) = flags::compute_sub8(self.a, val, 0);
        if inc {
            self.hl = self.hl.wrapping_add(1);
        } else {
            self.hl = self.hl.wrapping_sub(1);
        }
        self.bc = self.bc.wrapping_sub(1);

        let half = sub_raw & flags::H != 0;
        let n = result.wrapping_sub(half as u8);
        let mut raw = sub_raw & (flags::S | flags::Z | flags::H | flags::N);
        raw |= n & flags::X;
        if n & 0x02 != 0 {
            raw |= flags::Y;
        }
        if self.bc != 0 {
            raw |= flags::P;
        }
        raw |= self.f & flags::C;
        self.write_f(raw);

        if repeat && self.bc != 0 && result != 0 {
            self.pc = self.pc.wrapping_sub(2);
        }
    }

    fn bli_in(&mut self, mem: &mut Memory, ports: &mut dyn PortBus, inc: bool, repeat: bool) {
        let val = ports.input(self.bc);
        mem.write_byte(self.hl, val);
        self.hl = if inc { self.hl.wrapping_add(1) } else { self.hl.wrapping_sub(1) };
        let new_b = self.b().wrapping_sub(1);
        self.set_b(new_b);

        let mut raw = new_b & (flags::Y | flags::X);
        if new_b == 0 {
            raw |= flags::Z;
        }
        if new_b & 0x80 != 0 {
            raw |= flags::S;
        }
        raw |= flags::N;
        raw |= self.f & flags::C;
        self.write_f(raw);

        if repeat && new_b != 0 {
            self.pc = self.pc.wrapping_sub(2);
        }
    }

    fn bli_out(&mut self, mem: &mut Memory, ports: &mut dyn PortBus, inc: bool, repeat: bool) {
        let val = mem.read_byte(self.hl);
        ports.output(self.bc, val);
        self.hl = if inc { self.hl.wrapping_add(1) } else { self.hl.wrapping_sub(1) };
        let new_b = self.b().wrapping_sub(1);
        self.set_b(new_b);

        let mut raw = new_b & (flags::Y | flags::X);
        if new_b == 0 {
            raw |= flags::Z;
        }
        if new_b & 0x80 != 0 {
            raw |= flags::S;
        }
        raw |= flags::N;
        raw |= self.f & flags::C;
        self.write_f(raw);

        if repeat && new_b != 0 {
            self.pc = self.pc.wrapping_sub(2);
        }
    }

    /// `DD`/`FD`-prefixed plane: every reference to `HL`/`(HL)`/`H`/`L`
    /// in the unprefixed table is redirected to `IX`/`IY` and their
    /// halves; opcodes that never touch `HL` execute exactly as if the
    /// prefix were absent.
    fn execute_indexed(&mut self, mem: &mut Memory, ports: &mut dyn PortBus, idx: IndexReg) {
        let opcode = self.fetch_byte(mem);
        if opcode == 0xCB {
            let d = self.fetch_disp(mem);
            let final_op = self.fetch_byte(mem);
            self.execute_indexed_cb(mem, idx, d, final_op);
            return;
        }

        let x = (opcode >> 6) & 3;
        let y = (opcode >> 3) & 7;
        let z = opcode & 7;
        let p = (y >> 1) & 3;
        let q = y & 1;

        match x {
            0 => match z {
                1 if q == 0 && p == 2 => {
                    let nn = self.fetch_word(mem);
                    self.set_index(idx, nn);
                }
                1 if q == 1 => {
                    let rp = if p == 2 { self.index(idx) } else { self.get_rp(p) };
                    let base = self.index(idx);
                    let result = self.alu_add16(base, rp);
                    self.set_index(idx, result);
                }
                2 if p == 2 => {
                    let nn = self.fetch_word(mem);
                    if q == 0 {
                        mem.write_word(nn, self.index(idx));
                    } else {
                        let v = mem.read_word(nn);
                        self.set_index(idx, v);
                    }
                }
                3 if p == 2 => {
                    let v = self.index(idx);
                    self.set_index(idx, if q == 0 { v.wrapping_add(1) } else { v.wrapping_sub(1) });
                }
                4 if y == 4 || y == 5 => {
                    let v = self.index_half(idx, y == 4);
                    let result = self.alu_inc(v);
                    self.set_index_half(idx, y == 4, result);
                }
                4 if y == 6 => {
                    let d = self.fetch_disp(mem);
                    let addr = self.index(idx).wrapping_add(d as i16 as u16);
                    let v = mem.read_byte(addr);
                    let result = self.alu_inc(v);
                    mem.write_byte(addr, result);
                }
                5 if y == 4 || y == 5 => {
                    let v = self.index_half(idx, y == 4);
                    let result = self.alu_dec(v);
                    self.set_index_half(idx, y == 4, result);
                }
                5 if y == 6 => {
                    let d = self.fetch_disp(mem);
                    let addr = self.index(idx).wrapping_add(d as i16 as u16);
                    let v = mem.read_byte(addr);
                    let result = self.alu_dec(v);
                    mem.write_byte(addr, result);
                }
                6 if y == 4 || y == 5 => {
                    let n = self.fetch_byte(mem);
                    self.set_index_half(idx, y == 4, n);
                }
                6 if y == 6 => {
                    let d = self.fetch_disp(mem);
                    let n = self.fetch_byte(mem);
                    let addr = self.index(idx).wrapping_add(d as i16 as u16);
                    mem.write_byte(addr, n);
                }
                _ => self.execute_unprefixed_core(mem, ports, x, y, z, p, q),
            },
            1 => {
                if y == 6 && z == 6 {
                    self.halted = true;
                    self.pc = self.pc.wrapping_sub(1);
                } else if y == 6 {
                    let d = self.fetch_disp(mem);
                    let addr = self.index(idx).wrapping_add(d as i16 as u16);
                    let val = self.get_reg8(z, mem);
                    mem.write_byte(addr, val);
                } else if z == 6 {
                    let d = self.fetch_disp(mem);
                    let addr = self.index(idx).wrapping_add(d as i16 as u16);
                    let val = mem.read_byte(addr);
                    self.set_reg8(y, val, mem);
                } else if (y == 4 || y == 5) && (z == 4 || z == 5) {
                    let val = self.index_half(idx, z == 4);
                    self.set_index_half(idx, y == 4, val);
                } else if y == 4 || y == 5 {
                    let val = self.get_reg8(z, mem);
                    self.set_index_half(idx, y == 4, val);
                } else if z == 4 || z == 5 {
                    let val = self.index_half(idx, z == 4);
                    self.set_reg8(y, val, mem);
                } else {
                    let val = self.get_reg8(z, mem);
                    self.set_reg8(y, val, mem);
                }
            }
            2 => {
                let val = if z == 6 {
                    let d = self.fetch_disp(mem);
                    let addr = self.index(idx).wrapping_add(d as i16 as u16);
                    mem.read_byte(addr)
                } else if z == 4 || z == 5 {
                    self.index_half(idx, z == 4)
                } else {
                    self.get_reg8(z, mem)
                };
                self.execute_alu(y, val);
            }
            3 => match z {
                1 if q == 0 && p == 2 => {
                    let v = self.pop_word(mem);
                    self.set_index(idx, v);
                }
                1 if q == 1 && p == 2 => self.pc = self.index(idx),
                1 if q == 1 && p == 3 => self.sp = self.index(idx),
                3 if y == 4 => {
                    let v = self.ex_sp_word(mem, self.index(idx));
                    self.set_index(idx, v);
                }
                5 if q == 0 && p == 2 => {
                    let v = self.index(idx);
                    self.helpers_push_word(mem, v);
                }
                _ => self.execute_unprefixed_core(mem, ports, x, y, z, p, q),
            },
            _ => unreachable!("2-bit field"),
        }
    }

    /// `DDCB`/`FDCB`: always a memory operand at `(index+d)`; the
    /// rotate/`RES`/`SET` forms also copy the result into register `z`
    /// when `z != 6` (the well-known undocumented "copy" behavior).
    fn execute_indexed_cb(&mut self, mem: &mut Memory, idx: IndexReg, d: i8, final_op: u8) {
        let addr = self.index(idx).wrapping_add(d as i16 as u16);
        let x = (final_op >> 6) & 3;
        let y = (final_op >> 3) & 7;
        let z = final_op & 7;
        let val = mem.read_byte(addr);

        match x {
            0 => {
                let result = self.alu_shift(Self::shift_kind(y), val);
                mem.write_byte(addr, result);
                if z != 6 {
                    self.set_reg8(z, result, mem);
                }
            }
            1 => {
                let xy_source = (addr >> 8) as u8;
                self.alu_bit(val, y, xy_source);
            }
            2 => {
                let result = val & !(1 << y);
                mem.write_byte(addr, result);
                if z != 6 {
                    self.set_reg8(z, result, mem);
                }
            }
            3 => {
                let result = val | (1 << y);
                mem.write_byte(addr, result);
                if z != 6 {
                    self.set_reg8(z, result, mem);
                }
            }
            _ => unreachable!("2-bit field"),
        }
    }
}
