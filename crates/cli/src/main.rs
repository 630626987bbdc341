//! LS-8 emulator frontend.
//!
//! Provides three execution modes:
//!
//! - **Run mode** (default): Load an image and run to halt, PRN output
//!   on stdout.
//! - **Trace mode** (`--trace`): Same, with a per-instruction state
//!   trace on stderr.
//! - **Step mode** (`--step`): Interactive instruction-level debugger.
//!
//! Breakpoints (`--break`) pause a run and drop into the debugger.
//! `--save-state` / `--load-state` suspend and resume a run across
//! invocations.

use ls8_core::{disasm, savestate, Ls8, StopReason};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("LS-8 Emulator - Rust");
        eprintln!("Usage: {} <program.ls8> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --trace              Per-instruction trace on stderr");
        eprintln!("  --step               Interactive step debugger");
        eprintln!("  --break <addr>       Breakpoint at hex address (repeatable)");
        eprintln!("  --dis                Disassemble the image and exit");
        eprintln!("  --save-state <file>  Write machine state after halt");
        eprintln!("  --load-state <file>  Restore machine state before running");
        eprintln!();
        eprintln!("Step mode keys: Enter=step r=regs m A N=ram d=disasm c=continue q=quit");
        std::process::exit(1);
    }

    let image_path = &args[1];
    let trace = args.iter().any(|a| a == "--trace");
    let step_mode = args.iter().any(|a| a == "--step");
    let dis_only = args.iter().any(|a| a == "--dis");

    let save_state_path: Option<String> = args.iter()
        .position(|a| a == "--save-state")
        .and_then(|i| args.get(i + 1))
        .cloned();
    let load_state_path: Option<String> = args.iter()
        .position(|a| a == "--load-state")
        .and_then(|i| args.get(i + 1))
        .cloned();

    let src = match fs::read_to_string(image_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}: {}", image_path, e);
            std::process::exit(1);
        }
    };

    let mut machine = Ls8::new();
    machine.debug = trace;

    let size = match machine.load_image(&src) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error: {}: {}", image_path, e);
            std::process::exit(1);
        }
    };
    if trace {
        eprintln!("Loaded {} bytes", size);
    }

    // Parse breakpoints
    {
        let mut i = 0;
        while i < args.len() {
            if args[i] == "--break" {
                if let Some(s) = args.get(i + 1) {
                    let s = s.trim_start_matches("0x").trim_start_matches("0X");
                    match u8::from_str_radix(s, 16) {
                        Ok(addr) => {
                            machine.breakpoints.push(addr);
                            if trace {
                                eprintln!("Breakpoint: 0x{:02X}", addr);
                            }
                        }
                        Err(_) => {
                            eprintln!("Error: invalid breakpoint address {:?}", s);
                            std::process::exit(1);
                        }
                    }
                }
                i += 2;
            } else {
                i += 1;
            }
        }
    }

    if dis_only {
        for line in disasm::disassemble_range(&machine.mem.data, 0, size) {
            println!("{}", line);
        }
        return;
    }

    if let Some(ref path) = load_state_path {
        match savestate::load_from_file(Path::new(path)) {
            Ok(state) => {
                state.apply(&mut machine);
                if trace {
                    eprintln!("Restored state from {}", path);
                }
            }
            Err(e) => {
                eprintln!("Error: {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    if step_mode {
        if run_step_mode(&mut machine) {
            run_to_halt(&mut machine);
        }
    } else {
        run_to_halt(&mut machine);
    }

    if let Some(ref path) = save_state_path {
        let state = savestate::SaveState::capture(&machine);
        if let Err(e) = savestate::save_to_file(&state, Path::new(path)) {
            eprintln!("Error: {}: {}", path, e);
            std::process::exit(1);
        }
        if trace {
            eprintln!("State saved to {}", path);
        }
    }
}

/// Drain the machine's PRN buffer to stdout.
fn flush_output(machine: &mut Ls8) {
    let out = machine.take_output();
    if !out.is_empty() {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(&out).expect("stdout write");
        lock.flush().expect("stdout flush");
    }
}

// ─── Run Mode ───────────────────────────────────────────────────────────────

fn run_to_halt(machine: &mut Ls8) {
    loop {
        let result = machine.run();
        flush_output(machine);
        match result {
            Ok(StopReason::Halted) => return,
            Ok(StopReason::Breakpoint(addr)) => {
                eprintln!("Breakpoint at 0x{:02X}", addr);
                eprintln!("{}", machine.dump_regs());
                if !run_step_mode(machine) {
                    return;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

// ─── Step Mode ──────────────────────────────────────────────────────────────

/// Interactive instruction-level debugger on stdin/stderr.
///
/// Returns true if the caller should continue free-running (`c`),
/// false on quit, halt, or end of input.
fn run_step_mode(machine: &mut Ls8) -> bool {
    let stdin = io::stdin();
    eprintln!("Step mode: Enter=step r=regs m A N=ram d=disasm c=continue q=quit");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => return false,
        };
        let mut parts = line.trim().split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "" | "s" => {
                if !machine.cpu.running {
                    eprintln!("Machine is halted.");
                    return false;
                }
                match machine.step_one() {
                    Ok(asm) => eprintln!("{}", asm),
                    Err(e) => {
                        flush_output(machine);
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
                flush_output(machine);
                if !machine.cpu.running {
                    eprintln!("Halted.");
                    return false;
                }
            }
            "r" => eprintln!("{}", machine.dump_regs()),
            "m" => {
                let addr = parts.next()
                    .and_then(|s| u8::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                    .unwrap_or(0);
                let len = parts.next().and_then(|s| s.parse().ok()).unwrap_or(16);
                eprint!("{}", machine.dump_ram(addr, len));
            }
            "d" => {
                let pc = machine.cpu.pc as usize;
                let end = (pc + 16).min(ls8_core::RAM_SIZE);
                for l in disasm::disassemble_range(&machine.mem.data, pc, end) {
                    eprintln!("{}", l);
                }
            }
            "c" => return true,
            "q" => return false,
            _ => eprintln!("Unknown command {:?}", cmd),
        }
    }
    false
}
