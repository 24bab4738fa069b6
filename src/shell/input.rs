use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::os::unix::ffi::OsStringExt;

/// Writes the prompt and reads one line as raw bytes. `None` means end of input.
pub fn read_command<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<Option<OsString>> {
    write!(out, "{}", prompt).context("Failed to write prompt")?;
    out.flush().context("Failed to flush prompt")?;

    let mut line = Vec::new();
    let read = input.read_until(b'\n', &mut line).context("Failed to read command")?;
    if read == 0 {
        return Ok(None);
    }

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    Ok(Some(OsString::from_vec(line)))
}
