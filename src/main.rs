mod cli;
mod config;
mod env;
mod command;
mod shell;

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::io;
use std::process::ExitCode;
use cli::Cli;
use command::SystemLauncher;
use config::ShellConfig;
use env::Environment;
use shell::Shell;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "hsh:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = ShellConfig::from_cli(cli)?;
    log::debug!("Starting with {:?}", config);

    let shell = Shell::new(config, Environment::from_process(), SystemLauncher);
    shell.run(io::stdin().lock(), io::stdout())
}
