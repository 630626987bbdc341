//! LS-8 instruction disassembler.
//!
//! Converts decoded [`Instruction`] values back to human-readable
//! assembly text. Used by the step debugger and the `--dis` listing.

use crate::opcodes::{self, Instruction};

/// Format a decoded instruction as an assembly string.
pub fn disassemble(inst: Instruction) -> String {
    match inst {
        Instruction::Nop => "NOP".into(),
        Instruction::Hlt => "HLT".into(),
        Instruction::Ldi { r, v } => format!("LDI R{}, 0x{:02X}", r, v),
        Instruction::Prn { r } => format!("PRN R{}", r),
        Instruction::Add { a, b } => format!("ADD R{}, R{}", a, b),
        Instruction::Mlt { a, b } => format!("MLT R{}, R{}", a, b),
        Instruction::Cmp { a, b } => format!("CMP R{}, R{}", a, b),
        Instruction::Push { r } => format!("PUSH R{}", r),
        Instruction::Pop { r } => format!("POP R{}", r),
        Instruction::Call { r } => format!("CALL R{}", r),
        Instruction::Ret => "RET".into(),
        Instruction::Jmp { r } => format!("JMP R{}", r),
        Instruction::Jeq { r } => format!("JEQ R{}", r),
        Instruction::Jne { r } => format!("JNE R{}", r),
        Instruction::Unknown(op) => format!(".db 0x{:02X}", op),
    }
}

/// Format the FL byte as a flag string like "lge" (lowercase=clear, UPPER=set).
pub fn format_fl(fl: u8) -> String {
    let flags = ['L', 'G', 'E'];
    let mut s = String::with_capacity(3);
    for (i, &f) in flags.iter().enumerate() {
        let bit = 2 - i;
        if fl & (1 << bit) != 0 {
            s.push(f);
        } else {
            s.push(f.to_ascii_lowercase());
        }
    }
    s
}

/// Disassemble a range of RAM.
///
/// Returns lines of `"0xAA: BYTES  MNEMONIC"` for the given address
/// range, walking instruction widths from the opcode bytes.
pub fn disassemble_range(ram: &[u8], start: usize, end: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut addr = start;
    while addr < end && addr < ram.len() {
        let op = ram[addr];
        let a = ram.get(addr + 1).copied().unwrap_or(0);
        let b = ram.get(addr + 2).copied().unwrap_or(0);
        let (inst, size) = opcodes::decode(op, a, b);
        let asm = disassemble(inst);
        match size {
            3 => lines.push(format!("0x{:02X}: {:02X} {:02X} {:02X}  {}", addr, op, a, b, asm)),
            2 => lines.push(format!("0x{:02X}: {:02X} {:02X}     {}", addr, op, a, asm)),
            _ => lines.push(format!("0x{:02X}: {:02X}        {}", addr, op, asm)),
        }
        addr += size as usize;
    }
    lines
}
