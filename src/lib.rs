//! Dual-mode Intel 8080 / Zilog Z80 interpreting CPU core
//!
//! This crate provides a platform-agnostic, host-embeddable CPU core: a
//! flat 64 KiB [`memory::Memory`] image, a host [`ports::PortBus`] hook
//! for `IN`/`OUT`, and a [`cpu::Cpu`] that interprets either instruction
//! set depending on [`cpu::Mode`]. There is no display, keypad, file
//! format, or scheduler here — those are host concerns; this crate is
//! the instruction-level engine a host wires up to them.
//!
//! # Architecture
//!
//! - `memory`: flat 64 KiB byte-addressable image
//! - `ports`: host I/O port hook used by `IN`/`OUT`
//! - `error`: the core's one fallible operation (snapshot decoding)
//! - `cpu`: the register file, decoder, and executor
//!
//! # Example
//!
//! ```
//! use dual8080z80::cpu::{Cpu, Mode};
//! use dual8080z80::memory::Memory;
//! use dual8080z80::ports::NullPorts;
//!
//! let mut cpu = Cpu::new();
//! cpu.set_mode(Mode::Intel8080);
//! cpu.reset();
//!
//! let mut mem = Memory::new();
//! mem.load(0, &[0x3E, 0x2A]); // MVI A,0x2A
//!
//! let mut ports = NullPorts;
//! cpu.step(&mut mem, &mut ports).unwrap();
//! assert_eq!(cpu.a, 0x2A);
//! ```

pub mod cpu;
pub mod error;
pub mod memory;
pub mod ports;

pub use cpu::{Cpu, Mode, Reg16, Reg8};
pub use error::CpuError;
pub use memory::Memory;
pub use ports::{NullPorts, PortBus};
