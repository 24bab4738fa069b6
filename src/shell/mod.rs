pub mod input;

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::ExitStatusExt;
use crate::command::{CommandOutcome, Launcher, execute, split_arguments};
use crate::config::ShellConfig;
use crate::env::Environment;
use self::input::read_command;

/// The read, split, execute loop.
pub struct Shell<L: Launcher> {
    config: ShellConfig,
    env: Environment,
    launcher: L,
}

impl<L: Launcher> Shell<L> {
    pub fn new(config: ShellConfig, env: Environment, launcher: L) -> Self {
        Self { config, env, launcher }
    }

    /// Runs until end of input. Any `Err` is fatal to the shell.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut out: W) -> Result<()> {
        while let Some(line) = read_command(&mut input, &mut out, &self.config.prompt)? {
            self.run_line(&line, &mut out)?;
        }

        // Leave the terminal on a fresh line after ^D
        writeln!(out).context("Failed to write output")?;
        out.flush().context("Failed to flush output")?;
        Ok(())
    }

    fn run_line<W: Write>(&self, line: &OsStr, out: &mut W) -> Result<()> {
        let args = split_arguments(line, self.config.max_arguments);

        // The child writes straight to the inherited stdout
        out.flush().context("Failed to flush output")?;

        match execute(&args, &self.env, self.config.empty_path_segments, &self.launcher)? {
            CommandOutcome::Skipped => {}
            CommandOutcome::Completed(status) => match status.signal() {
                Some(signal) => log::debug!("{:?} terminated by signal {}", args.program(), signal),
                None => log::debug!("{:?} exited with {:?}", args.program(), status.code()),
            },
            CommandOutcome::NotFound(name) => {
                out.write_all(b"Command not found: ")
                    .and_then(|_| out.write_all(name.as_bytes()))
                    .and_then(|_| out.write_all(b"\n"))
                    .context("Failed to write output")?;
            }
        }
        Ok(())
    }
}
