//! LS-8 CPU core.
//!
//! Holds the register file, program counter, condition flags, and the
//! running flag, and implements execution for the full instruction set.
//! The execute path runs on [`Ls8`] so PRN output lands in the machine's
//! output buffer.
//!
//! The PC is pre-advanced by the instruction size before the handler
//! runs; control-transfer instructions then overwrite it. This also
//! means CALL pushes the correct return address (the byte after its
//! operand) without special-casing.

use crate::opcodes::Instruction;
use crate::{Ls8, FL_E, FL_G, FL_L, REG_COUNT, SP_INIT, SP_REG};

/// CPU state for the LS-8.
///
/// Registers are byte-wide; R7 doubles as the stack pointer and starts
/// at [`SP_INIT`] so the stack grows downward from near the top of RAM.
pub struct Cpu {
    /// General-purpose registers R0–R7
    pub reg: [u8; REG_COUNT],
    /// Program counter (wraps modulo 256, like all machine addresses)
    pub pc: u8,
    /// Condition flags: `00000LGE` (Less, Greater, Equal)
    pub fl: u8,
    /// Cleared by HLT; the fetch loop exits when false
    pub running: bool,
    /// Monotonic instruction counter
    pub tick: u64,
}

impl Cpu {
    pub fn new() -> Self {
        let mut reg = [0u8; REG_COUNT];
        reg[SP_REG] = SP_INIT;
        Cpu { reg, pc: 0, fl: 0, running: true, tick: 0 }
    }

    #[inline(always)]
    pub fn flag(&self, bit: u8) -> bool {
        self.fl & (1 << bit) != 0
    }

    #[inline(always)]
    pub fn set_flag(&mut self, bit: u8, v: bool) {
        if v { self.fl |= 1 << bit; } else { self.fl &= !(1 << bit); }
    }

    /// Current stack pointer (R7).
    #[inline(always)]
    pub fn sp(&self) -> u8 {
        self.reg[SP_REG]
    }

    #[inline(always)]
    pub fn set_sp(&mut self, v: u8) {
        self.reg[SP_REG] = v;
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Mask a register-index operand into [0,7].
///
/// Same wrap policy as memory addresses: an out-of-range index in the
/// emulated program wraps instead of faulting the engine.
#[inline(always)]
fn r(i: u8) -> usize {
    (i & 0x07) as usize
}

// ---- Instruction execution on Ls8 ----

impl Ls8 {
    /// Execute a single decoded instruction.
    ///
    /// The PC is advanced by `size` first; JMP/JEQ/JNE/CALL/RET replace
    /// it with their target. [`Instruction::Unknown`] is rejected by
    /// [`Ls8::step`] before reaching this point; if it does arrive, the
    /// machine halts without touching any other state.
    pub(crate) fn execute_inst(&mut self, inst: Instruction, size: u8) {
        self.cpu.pc = self.cpu.pc.wrapping_add(size);

        match inst {
            Instruction::Nop => {}
            Instruction::Hlt => {
                self.cpu.running = false;
            }

            // Data movement
            Instruction::Ldi { r: d, v } => {
                self.cpu.reg[r(d)] = v;
            }
            Instruction::Prn { r: d } => {
                let v = self.cpu.reg[r(d)];
                self.output.extend_from_slice(format!("{}\n", v).as_bytes());
            }

            // ALU (fixed-width unsigned: results wrap modulo 256)
            Instruction::Add { a, b } => {
                self.cpu.reg[r(a)] = self.cpu.reg[r(a)].wrapping_add(self.cpu.reg[r(b)]);
            }
            Instruction::Mlt { a, b } => {
                self.cpu.reg[r(a)] = self.cpu.reg[r(a)].wrapping_mul(self.cpu.reg[r(b)]);
            }
            Instruction::Cmp { a, b } => {
                let (x, y) = (self.cpu.reg[r(a)], self.cpu.reg[r(b)]);
                self.cpu.set_flag(FL_E, x == y);
                self.cpu.set_flag(FL_G, x > y);
                self.cpu.set_flag(FL_L, x < y);
            }

            // Stack (full-descending, addressed through R7)
            Instruction::Push { r: d } => {
                let sp = self.cpu.sp().wrapping_sub(1);
                self.cpu.set_sp(sp);
                self.mem.write(sp, self.cpu.reg[r(d)]);
            }
            Instruction::Pop { r: d } => {
                let sp = self.cpu.sp();
                self.cpu.reg[r(d)] = self.mem.read(sp);
                self.cpu.set_sp(sp.wrapping_add(1));
            }

            // Control transfer: return addresses share the data stack
            Instruction::Call { r: d } => {
                let sp = self.cpu.sp().wrapping_sub(1);
                self.cpu.set_sp(sp);
                self.mem.write(sp, self.cpu.pc); // already advanced past operand
                self.cpu.pc = self.cpu.reg[r(d)];
            }
            Instruction::Ret => {
                let sp = self.cpu.sp();
                self.cpu.pc = self.mem.read(sp);
                self.cpu.set_sp(sp.wrapping_add(1));
            }
            Instruction::Jmp { r: d } => {
                self.cpu.pc = self.cpu.reg[r(d)];
            }
            Instruction::Jeq { r: d } => {
                if self.cpu.flag(FL_E) {
                    self.cpu.pc = self.cpu.reg[r(d)];
                }
            }
            Instruction::Jne { r: d } => {
                if !self.cpu.flag(FL_E) {
                    self.cpu.pc = self.cpu.reg[r(d)];
                }
            }

            Instruction::Unknown(_) => {
                self.cpu.running = false;
            }
        }
    }
}
