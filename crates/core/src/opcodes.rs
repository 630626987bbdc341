//! LS-8 instruction decoder.
//!
//! Decodes an opcode byte (plus the two speculatively fetched operand
//! bytes) into a typed [`Instruction`] enum. The opcode byte layout is
//! `AABCDDDD`: `AA` is the operand count (0–2), `B` is set for ALU
//! operations, `C` is set for instructions that write the PC themselves,
//! and `DDDD` is the instruction number within its group.

// Opcode byte values
pub const NOP: u8 = 0b0000_0000;
pub const HLT: u8 = 0b0000_0001;
pub const RET: u8 = 0b0001_0001;
pub const PUSH: u8 = 0b0100_0101;
pub const POP: u8 = 0b0100_0110;
pub const PRN: u8 = 0b0100_0111;
pub const CALL: u8 = 0b0101_0000;
pub const JMP: u8 = 0b0101_0100;
pub const JEQ: u8 = 0b0101_0101;
pub const JNE: u8 = 0b0101_0110;
pub const LDI: u8 = 0b1000_0010;
pub const ADD: u8 = 0b1010_0000;
pub const MLT: u8 = 0b1010_0010;
pub const CMP: u8 = 0b1010_0111;

/// Decoded LS-8 instruction with operands.
///
/// Register fields `r`, `a`, `b` are register indices (masked to 0–7 at
/// execution), `v` is an immediate byte. An opcode byte matching no
/// known instruction decodes to [`Instruction::Unknown`]; executing it
/// is a fatal decode error, never a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Hlt,
    // Data movement
    Ldi { r: u8, v: u8 },
    Prn { r: u8 },
    // ALU
    Add { a: u8, b: u8 },
    Mlt { a: u8, b: u8 },
    Cmp { a: u8, b: u8 },
    // Stack
    Push { r: u8 },
    Pop { r: u8 },
    // Control transfer
    Call { r: u8 },
    Ret,
    Jmp { r: u8 },
    Jeq { r: u8 },
    Jne { r: u8 },
    Unknown(u8),
}

/// Decode an opcode byte with its two operand bytes.
/// Returns (Instruction, size_in_bytes).
pub fn decode(op: u8, a: u8, b: u8) -> (Instruction, u8) {
    let inst = match op {
        NOP => Instruction::Nop,
        HLT => Instruction::Hlt,
        LDI => Instruction::Ldi { r: a, v: b },
        PRN => Instruction::Prn { r: a },
        ADD => Instruction::Add { a, b },
        MLT => Instruction::Mlt { a, b },
        CMP => Instruction::Cmp { a, b },
        PUSH => Instruction::Push { r: a },
        POP => Instruction::Pop { r: a },
        CALL => Instruction::Call { r: a },
        RET => Instruction::Ret,
        JMP => Instruction::Jmp { r: a },
        JEQ => Instruction::Jeq { r: a },
        JNE => Instruction::Jne { r: a },
        _ => Instruction::Unknown(op),
    };
    (inst, size(op))
}

/// Instruction size in bytes: 1 + operand count from the top two opcode bits.
#[inline(always)]
pub fn size(op: u8) -> u8 {
    1 + (op >> 6)
}
