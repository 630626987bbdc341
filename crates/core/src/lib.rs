//! # ls8-core
//!
//! Emulation core for the LS-8 teaching computer: an 8-bit machine with
//! 256 bytes of flat RAM, eight byte-wide registers (R7 is the stack
//! pointer), a condition-flag byte, and a fourteen-instruction ISA
//! covering data movement, arithmetic, stack, and control transfer.
//!
//! ## Architecture
//!
//! - [`Ls8`] — Top-level machine wiring CPU and memory, owns the
//!   fetch-decode-execute loop and the PRN output buffer
//! - [`Cpu`] — Register file, PC, FL flags, running flag
//! - [`Memory`] — Flat 256-byte RAM (program + data + stack)
//! - [`opcodes`] — Closed [`opcodes::Instruction`] enum and decoder
//! - [`disasm`] — Instruction disassembler for debug views
//! - [`loader`] — Binary-literal text image parser
//! - [`savestate`] — Machine snapshots for suspend/resume
//!
//! ## Address policy
//!
//! Every machine address (PC, SP, memory operands) is a `u8`, so all
//! address arithmetic wraps modulo 256. Register-index operands wrap
//! into [0,7] the same way. Arithmetic results wrap modulo 256 by
//! design; only an unknown opcode is a fatal engine error.

pub mod cpu;
pub mod memory;
pub mod opcodes;
pub mod disasm;
pub mod loader;
pub mod savestate;

pub use cpu::Cpu;
pub use memory::Memory;
pub use savestate::SaveState;

use std::fmt;

/// RAM size in bytes (the full 8-bit address space)
pub const RAM_SIZE: usize = 256;
/// Number of general-purpose registers (R0–R7)
pub const REG_COUNT: usize = 8;
/// Register doubling as the stack pointer
pub const SP_REG: usize = 7;
/// Power-on stack pointer: the stack grows down from near the top of RAM
pub const SP_INIT: u8 = 0xF4;

// FL bit positions (00000LGE)
pub const FL_E: u8 = 0;
pub const FL_G: u8 = 1;
pub const FL_L: u8 = 2;

/// Fatal execution fault. The machine halts and no further fetch occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError {
    /// Fetched opcode matches no known instruction.
    UnknownOpcode { addr: u8, opcode: u8 },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::UnknownOpcode { addr, opcode } => {
                write!(f, "unknown opcode 0x{:02X} at address 0x{:02X}", opcode, addr)
            }
        }
    }
}

impl std::error::Error for RunError {}

/// Why [`Ls8::run`] returned without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// HLT executed; the running flag is clear.
    Halted,
    /// Execution paused at a breakpoint (address given), still running.
    Breakpoint(u8),
}

/// LS-8 machine: CPU + RAM + PRN output buffer.
///
/// Each instance owns its state exclusively; independent programs get
/// independent machines.
pub struct Ls8 {
    pub cpu: Cpu,
    pub mem: Memory,
    /// PRN output bytes, drained by the frontend via [`take_output`](Self::take_output)
    pub output: Vec<u8>,
    /// Breakpoint addresses honored by [`run`](Self::run)
    pub breakpoints: Vec<u8>,
    /// Emit a trace line to stderr before each executed instruction
    pub debug: bool,
}

impl Ls8 {
    /// Create a machine in power-on state: zeroed RAM and registers,
    /// PC 0, SP at [`SP_INIT`].
    pub fn new() -> Self {
        Ls8 {
            cpu: Cpu::new(),
            mem: Memory::new(),
            output: Vec::new(),
            breakpoints: Vec::new(),
            debug: false,
        }
    }

    /// Reset CPU, RAM, and output to power-on state.
    ///
    /// Breakpoints are preserved across resets.
    pub fn reset(&mut self) {
        self.cpu = Cpu::new();
        self.mem.data.fill(0);
        self.output.clear();
    }

    /// Reset the machine and load a program image from its text form.
    ///
    /// Returns the number of bytes loaded.
    pub fn load_image(&mut self, src: &str) -> Result<usize, String> {
        self.reset();
        loader::parse_image(src, &mut self.mem.data)
    }

    /// Execute a single instruction.
    ///
    /// Fetches the opcode at PC plus two operand bytes speculatively
    /// (always readable — the address space wraps), decodes, and runs
    /// the handler. An unknown opcode halts the machine and reports the
    /// offending address and byte.
    pub fn step(&mut self) -> Result<(), RunError> {
        let pc = self.cpu.pc;
        let op = self.mem.read(pc);
        let a = self.mem.read(pc.wrapping_add(1));
        let b = self.mem.read(pc.wrapping_add(2));
        let (inst, size) = opcodes::decode(op, a, b);

        if let opcodes::Instruction::Unknown(opcode) = inst {
            self.cpu.running = false;
            return Err(RunError::UnknownOpcode { addr: pc, opcode });
        }

        if self.debug {
            eprintln!("{}", self.trace_line());
        }

        self.execute_inst(inst, size);
        self.cpu.tick += 1;
        Ok(())
    }

    /// Execute a single instruction and return its disassembly.
    ///
    /// Used by the step debugger.
    pub fn step_one(&mut self) -> Result<String, RunError> {
        let pc = self.cpu.pc;
        let op = self.mem.read(pc);
        let a = self.mem.read(pc.wrapping_add(1));
        let b = self.mem.read(pc.wrapping_add(2));
        let (inst, _) = opcodes::decode(op, a, b);
        let asm = disasm::disassemble(inst);
        self.step()?;
        Ok(format!("0x{:02X}: {}", pc, asm))
    }

    /// Run the fetch-decode-execute loop until HLT, a breakpoint, or a
    /// decode fault.
    ///
    /// The breakpoint check skips the first instruction of each call so
    /// a run can be resumed from the breakpoint it stopped at.
    pub fn run(&mut self) -> Result<StopReason, RunError> {
        let mut first = true;
        while self.cpu.running {
            if !first && !self.breakpoints.is_empty()
                && self.breakpoints.contains(&self.cpu.pc)
            {
                return Ok(StopReason::Breakpoint(self.cpu.pc));
            }
            first = false;
            self.step()?;
        }
        Ok(StopReason::Halted)
    }

    /// Take and clear accumulated PRN output bytes.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// One-line CPU state dump: PC, the three bytes at PC, and all
    /// eight registers.
    pub fn trace_line(&self) -> String {
        let pc = self.cpu.pc;
        let mut s = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            self.mem.read(pc),
            self.mem.read(pc.wrapping_add(1)),
            self.mem.read(pc.wrapping_add(2)),
        );
        for v in self.cpu.reg.iter() {
            s.push_str(&format!(" {:02X}", v));
        }
        s
    }

    /// Format a register dump string with R0–R7, PC, SP, FL, and tick.
    pub fn dump_regs(&self) -> String {
        let mut s = String::new();
        for (i, v) in self.cpu.reg.iter().enumerate() {
            s.push_str(&format!("R{}={:02X} ", i, v));
        }
        s.push_str(&format!(
            "\nPC={:02X} SP={:02X} FL={} (0x{:02X}) tick={}",
            self.cpu.pc,
            self.cpu.sp(),
            disasm::format_fl(self.cpu.fl),
            self.cpu.fl,
            self.cpu.tick
        ));
        s
    }

    /// Dump a RAM region as hex rows of sixteen bytes.
    pub fn dump_ram(&self, start: u8, len: usize) -> String {
        let mut s = String::new();
        let mut addr = start as usize;
        let end = (addr + len).min(RAM_SIZE);
        while addr < end {
            let row_end = (addr + 16).min(end);
            s.push_str(&format!("0x{:02X}:", addr));
            for a in addr..row_end {
                s.push_str(&format!(" {:02X}", self.mem.data[a]));
            }
            s.push('\n');
            addr = row_end;
        }
        s
    }
}

impl Default for Ls8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcodes::{ADD, CALL, CMP, HLT, JEQ, JMP, JNE, LDI, MLT, NOP, POP, PRN, PUSH, RET};

    /// Load raw program bytes at address 0 and return a fresh machine.
    fn machine_with(program: &[u8]) -> Ls8 {
        let mut m = Ls8::new();
        m.mem.data[..program.len()].copy_from_slice(program);
        m
    }

    #[test]
    fn test_machine_creation() {
        let m = Ls8::new();
        assert_eq!(m.cpu.pc, 0);
        assert_eq!(m.cpu.sp(), SP_INIT);
        assert!(m.cpu.running);
        assert!(m.output.is_empty());
    }

    #[test]
    fn test_ldi_then_hlt() {
        for (r, v) in [(0u8, 0u8), (3, 0x7F), (6, 0xFF)] {
            let mut m = machine_with(&[LDI, r, v, HLT]);
            assert_eq!(m.run(), Ok(StopReason::Halted));
            assert_eq!(m.cpu.reg[r as usize], v);
            assert_eq!(m.cpu.pc, 4);
        }
    }

    #[test]
    fn test_add_wraps() {
        let mut m = machine_with(&[LDI, 0, 250, LDI, 1, 10, ADD, 0, 1, HLT]);
        m.run().unwrap();
        assert_eq!(m.cpu.reg[0], 4);
    }

    #[test]
    fn test_mlt_wraps() {
        let mut m = machine_with(&[LDI, 0, 16, LDI, 1, 17, MLT, 0, 1, HLT]);
        m.run().unwrap();
        assert_eq!(m.cpu.reg[0], (16u8).wrapping_mul(17));
    }

    #[test]
    fn test_push_pop_preserves_value_and_sp() {
        let mut m = machine_with(&[LDI, 1, 99, PUSH, 1, POP, 2, HLT]);
        m.run().unwrap();
        assert_eq!(m.cpu.reg[2], 99);
        assert_eq!(m.cpu.reg[1], 99);
        // Net zero stack displacement
        assert_eq!(m.cpu.sp(), SP_INIT);
    }

    #[test]
    fn test_push_writes_below_sp_init() {
        let mut m = machine_with(&[LDI, 0, 0xAB, PUSH, 0, HLT]);
        m.run().unwrap();
        assert_eq!(m.cpu.sp(), SP_INIT - 1);
        assert_eq!(m.mem.read(SP_INIT - 1), 0xAB);
    }

    #[test]
    fn test_call_ret_returns_past_call() {
        // 0: LDI R0,6   (subroutine address)
        // 3: CALL R0    → return address is 5
        // 5: HLT
        // 6: LDI R1,42
        // 9: RET
        let mut m = machine_with(&[LDI, 0, 6, CALL, 0, HLT, LDI, 1, 42, RET]);
        assert_eq!(m.run(), Ok(StopReason::Halted));
        assert_eq!(m.cpu.reg[1], 42);
        // HLT at 5 executed, PC advanced past it
        assert_eq!(m.cpu.pc, 6);
        assert_eq!(m.cpu.sp(), SP_INIT);
    }

    #[test]
    fn test_call_pushes_return_address() {
        let mut m = machine_with(&[LDI, 0, 5, CALL, 0, HLT]);
        // Step LDI then CALL
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.cpu.pc, 5);
        assert_eq!(m.cpu.sp(), SP_INIT - 1);
        assert_eq!(m.mem.read(m.cpu.sp()), 5); // call_address(3) + 2
    }

    #[test]
    fn test_data_and_return_stack_interleave_lifo() {
        // main: push a data byte, call a subroutine that also pushes and
        // pops, return, pop the data byte back.
        //  0: LDI R0, 11  (data)
        //  3: LDI R1, 13  (subroutine addr)
        //  6: PUSH R0
        //  8: CALL R1     → return addr 10
        // 10: POP R2
        // 12: HLT
        // 13: LDI R3, 77
        // 16: PUSH R3
        // 18: POP R4
        // 20: RET
        let mut m = machine_with(&[
            LDI, 0, 11, LDI, 1, 13, PUSH, 0, CALL, 1, POP, 2, HLT,
            LDI, 3, 77, PUSH, 3, POP, 4, RET,
        ]);
        assert_eq!(m.run(), Ok(StopReason::Halted));
        assert_eq!(m.cpu.reg[2], 11);
        assert_eq!(m.cpu.reg[4], 77);
        assert_eq!(m.cpu.sp(), SP_INIT);
    }

    #[test]
    fn test_cmp_jeq_taken() {
        // 0: LDI R0,5; 3: LDI R1,5; 6: LDI R2,14; 9: CMP R0,R1
        // 12: JEQ R2 → 14; 14: LDI R3,1; 17: HLT
        let mut m = machine_with(&[
            LDI, 0, 5, LDI, 1, 5, LDI, 2, 14, CMP, 0, 1, JEQ, 2, LDI, 3, 1, HLT,
        ]);
        m.run().unwrap();
        assert!(m.cpu.flag(FL_E));
        assert_eq!(m.cpu.reg[3], 1);
    }

    #[test]
    fn test_cmp_jeq_not_taken_falls_through() {
        // Unequal operands: JEQ advances by 2 into LDI R3,1
        let mut m = machine_with(&[
            LDI, 0, 5, LDI, 1, 6, LDI, 2, 17, CMP, 0, 1, JEQ, 2, LDI, 3, 1, HLT,
        ]);
        m.run().unwrap();
        assert!(!m.cpu.flag(FL_E));
        assert_eq!(m.cpu.reg[3], 1);
    }

    #[test]
    fn test_cmp_jne_complement() {
        // Unequal: JNE taken, skips the LDI R3 marker
        let mut m = machine_with(&[
            LDI, 0, 5, LDI, 1, 6, LDI, 2, 17, CMP, 0, 1, JNE, 2, LDI, 3, 1, HLT,
        ]);
        m.run().unwrap();
        assert_eq!(m.cpu.reg[3], 0);

        // Equal: JNE not taken
        let mut m = machine_with(&[
            LDI, 0, 5, LDI, 1, 5, LDI, 2, 17, CMP, 0, 1, JNE, 2, LDI, 3, 1, HLT,
        ]);
        m.run().unwrap();
        assert_eq!(m.cpu.reg[3], 1);
    }

    #[test]
    fn test_cmp_sets_greater_and_less() {
        let mut m = machine_with(&[LDI, 0, 9, LDI, 1, 3, CMP, 0, 1, HLT]);
        m.run().unwrap();
        assert!(m.cpu.flag(FL_G));
        assert!(!m.cpu.flag(FL_L));
        assert!(!m.cpu.flag(FL_E));
    }

    #[test]
    fn test_jmp_unconditional() {
        let mut m = machine_with(&[LDI, 0, 6, JMP, 0, HLT, LDI, 1, 9, HLT]);
        m.run().unwrap();
        assert_eq!(m.cpu.reg[1], 9);
    }

    #[test]
    fn test_nop_advances() {
        let mut m = machine_with(&[NOP, NOP, HLT]);
        assert_eq!(m.run(), Ok(StopReason::Halted));
        assert_eq!(m.cpu.tick, 3);
    }

    #[test]
    fn test_prn_decimal_output() {
        let mut m = machine_with(&[LDI, 0, 8, LDI, 1, 9, MLT, 0, 1, PRN, 0, HLT]);
        assert_eq!(m.run(), Ok(StopReason::Halted));
        assert_eq!(m.take_output(), b"72\n");
        assert!(m.output.is_empty());
    }

    #[test]
    fn test_prn_order_preserved() {
        let mut m = machine_with(&[LDI, 0, 1, PRN, 0, LDI, 0, 200, PRN, 0, HLT]);
        m.run().unwrap();
        assert_eq!(m.take_output(), b"1\n200\n");
    }

    #[test]
    fn test_unknown_opcode_is_fatal() {
        let mut m = machine_with(&[LDI, 0, 8, 0xFF, HLT]);
        let err = m.run().unwrap_err();
        assert_eq!(err, RunError::UnknownOpcode { addr: 3, opcode: 0xFF });
        assert!(!m.cpu.running);
        // PC did not move past the bad byte
        assert_eq!(m.cpu.pc, 3);
    }

    #[test]
    fn test_load_image_end_to_end() {
        let src = "\
# mul.ls8: print 8 * 9
10000010 # LDI R0,8
00000000
00001000
10000010 # LDI R1,9
00000001
00001001
10100010 # MLT R0,R1
00000000
00000001
01000111 # PRN R0
00000000
00000001 # HLT
";
        let mut m = Ls8::new();
        let size = m.load_image(src).unwrap();
        assert_eq!(size, 12);
        assert_eq!(m.run(), Ok(StopReason::Halted));
        assert_eq!(m.take_output(), b"72\n");
    }

    #[test]
    fn test_load_image_resets_previous_state() {
        let mut m = machine_with(&[LDI, 0, 8, HLT]);
        m.run().unwrap();
        m.load_image("00000001\n").unwrap();
        assert_eq!(m.cpu.pc, 0);
        assert_eq!(m.cpu.reg[0], 0);
        assert_eq!(m.cpu.sp(), SP_INIT);
        assert_eq!(m.mem.read(1), 0);
    }

    #[test]
    fn test_breakpoint_stops_and_resumes() {
        let mut m = machine_with(&[LDI, 0, 1, LDI, 1, 2, HLT]);
        m.breakpoints.push(3);
        assert_eq!(m.run(), Ok(StopReason::Breakpoint(3)));
        assert_eq!(m.cpu.reg[0], 1);
        assert_eq!(m.cpu.reg[1], 0);
        // Resuming executes from the breakpoint to the halt
        assert_eq!(m.run(), Ok(StopReason::Halted));
        assert_eq!(m.cpu.reg[1], 2);
    }

    #[test]
    fn test_step_one_reports_disassembly() {
        let mut m = machine_with(&[LDI, 0, 8, HLT]);
        assert_eq!(m.step_one().unwrap(), "0x00: LDI R0, 0x08");
        assert_eq!(m.step_one().unwrap(), "0x03: HLT");
        assert!(!m.cpu.running);
    }

    #[test]
    fn test_trace_line_format() {
        let m = machine_with(&[LDI, 0, 8, HLT]);
        let line = m.trace_line();
        assert!(line.starts_with("TRACE: 00 | 82 00 08 |"));
        assert!(line.ends_with("00 00 00 00 00 00 00 F4"));
    }

    #[test]
    fn test_operand_over_fetch_wraps_at_top() {
        // HLT at the last cell: operand fetch wraps to 0x00/0x01
        let mut m = Ls8::new();
        m.mem.write(0xFF, HLT);
        m.cpu.pc = 0xFF;
        assert_eq!(m.run(), Ok(StopReason::Halted));
    }

    #[test]
    fn test_independent_machines_share_nothing() {
        let mut a = machine_with(&[LDI, 0, 1, HLT]);
        let b = Ls8::new();
        a.run().unwrap();
        assert_eq!(b.cpu.reg[0], 0);
        assert_eq!(b.mem.read(0), 0);
    }
}
