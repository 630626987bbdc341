//! Program image parser.
//!
//! LS-8 images are plain text: one instruction byte per line written as
//! a binary digit string (e.g. `10000010`), with `#` starting a comment
//! and blank lines skipped. Successive values land at successive RAM
//! addresses starting at 0.

/// Parse a program image into RAM.
///
/// Returns the number of bytes loaded. A line whose non-comment text is
/// not a valid binary literal aborts the load with the offending line
/// number — malformed input is never silently skipped.
pub fn parse_image(src: &str, ram: &mut [u8]) -> Result<usize, String> {
    let mut addr = 0usize;

    for (lineno, line) in src.lines().enumerate() {
        let text = line.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        let value = u8::from_str_radix(text, 2)
            .map_err(|_| format!("line {}: invalid binary literal {:?}", lineno + 1, text))?;

        if addr >= ram.len() {
            return Err(format!(
                "line {}: program exceeds {} bytes of memory",
                lineno + 1,
                ram.len()
            ));
        }
        ram[addr] = value;
        addr += 1;
    }

    Ok(addr)
}
