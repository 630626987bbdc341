//! LS-8 memory subsystem.
//!
//! A single flat 256-byte RAM holds both program and data. Addresses are
//! `u8`, so every access is modulo-256 by construction — this is the
//! documented address policy for the whole machine: out-of-range
//! computed addresses wrap rather than fault, which also makes the
//! engine's speculative operand over-fetch at the top of memory safe.

use crate::RAM_SIZE;

/// Flat 256-byte RAM, zero-initialized.
pub struct Memory {
    pub data: [u8; RAM_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Memory { data: [0u8; RAM_SIZE] }
    }

    #[inline(always)]
    pub fn read(&self, addr: u8) -> u8 {
        self.data[addr as usize]
    }

    #[inline(always)]
    pub fn write(&mut self, addr: u8, v: u8) {
        self.data[addr as usize] = v;
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
