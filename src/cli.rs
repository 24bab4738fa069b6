use clap::Parser;
use std::path::PathBuf;
use crate::command::EmptySegmentPolicy;

#[derive(Parser, Debug)]
#[command(name = "hsh", version, about = "hsh: a minimal command-line shell")]
pub struct Cli {
    /// Load settings from a TOML file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Prompt written before each line is read
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Maximum number of tokens kept per line (extra tokens are dropped)
    #[arg(short = 'n', long = "max-args", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_args: Option<u64>,

    /// How empty PATH segments are treated during lookup
    #[arg(long = "empty-path-segments", value_enum)]
    pub empty_path_segments: Option<EmptySegmentPolicy>,
}
