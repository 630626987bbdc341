//! Save state (quick save / quick load) for the LS-8 emulator.
//!
//! Captures the full machine state to a file using bincode serialization
//! with deflate compression, so a run can be suspended after a halt or
//! breakpoint and resumed later.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "LS8S"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Ls8, RAM_SIZE};

/// Magic bytes identifying an LS-8 save state file.
const MAGIC: &[u8; 4] = b"LS8S";
/// Current save state format version.
const FORMAT_VERSION: u32 = 1;

/// Complete machine state: CPU, RAM, and undrained PRN output.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    pub pc: u8,
    pub fl: u8,
    pub running: bool,
    pub tick: u64,
    pub reg: [u8; 8],
    pub ram: Vec<u8>,
    pub output: Vec<u8>,
}

impl SaveState {
    /// Capture the current machine state.
    pub fn capture(machine: &Ls8) -> Self {
        SaveState {
            pc: machine.cpu.pc,
            fl: machine.cpu.fl,
            running: machine.cpu.running,
            tick: machine.cpu.tick,
            reg: machine.cpu.reg,
            ram: machine.mem.data.to_vec(),
            output: machine.output.clone(),
        }
    }

    /// Restore this state into a machine. Breakpoints are untouched.
    pub fn apply(&self, machine: &mut Ls8) {
        machine.cpu.pc = self.pc;
        machine.cpu.fl = self.fl;
        machine.cpu.running = self.running;
        machine.cpu.tick = self.tick;
        machine.cpu.reg = self.reg;
        machine.mem.data.fill(0);
        let len = self.ram.len().min(RAM_SIZE);
        machine.mem.data[..len].copy_from_slice(&self.ram[..len]);
        machine.output = self.output.clone();
    }
}

// ─── File I/O ───────────────────────────────────────────────────────────────

/// Save state to file with header and deflate compression.
pub fn save_to_file(state: &SaveState, path: &Path) -> Result<(), String> {
    let payload = bincode::serialize(state)
        .map_err(|e| format!("Serialize error: {}", e))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(8 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);

    std::fs::write(path, &out)
        .map_err(|e| format!("Write error: {}", e))
}

/// Load state from file, verifying magic and version.
pub fn load_from_file(path: &Path) -> Result<SaveState, String> {
    let data = std::fs::read(path)
        .map_err(|e| format!("Read error: {}", e))?;

    if data.len() < 8 {
        return Err("File too small".into());
    }
    if &data[0..4] != MAGIC {
        return Err("Invalid save state file (bad magic)".into());
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(format!("Unsupported save state version {} (expected {})",
            version, FORMAT_VERSION));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[8..])
        .map_err(|e| format!("Decompress error: {:?}", e))?;

    bincode::deserialize(&decompressed)
        .map_err(|e| format!("Deserialize error: {}", e))
}

/// Derive save state file path from program image path.
/// `counter.ls8` → `counter.state`
pub fn state_path(image_path: &str) -> String {
    let p = Path::new(image_path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("program");
    let dir = p.parent().unwrap_or(Path::new("."));
    dir.join(format!("{}.state", stem)).to_string_lossy().into_owned()
}
