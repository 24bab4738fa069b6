use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use crate::cli::Cli;
use crate::command::EmptySegmentPolicy;

pub const DEFAULT_PROMPT: &str = "$ ";
pub const DEFAULT_MAX_ARGUMENTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    pub prompt: String,
    pub max_arguments: usize,
    pub empty_path_segments: EmptySegmentPolicy,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_arguments: DEFAULT_MAX_ARGUMENTS,
            empty_path_segments: EmptySegmentPolicy::default(),
        }
    }
}

/// On-disk layer. Every key is optional and falls back to the defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    prompt: Option<String>,
    max_arguments: Option<usize>,
    empty_path_segments: Option<EmptySegmentPolicy>,
}

impl ShellConfig {
    /// Defaults, then the `--config` file, then CLI flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => Self::default(),
        };

        if let Some(prompt) = &cli.prompt {
            config.prompt = prompt.clone();
        }
        if let Some(max) = cli.max_args {
            config.max_arguments = usize::try_from(max).context("--max-args is out of range")?;
        }
        if let Some(policy) = cli.empty_path_segments {
            config.empty_path_segments = policy;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_arguments == 0 {
            bail!("Configuration Error: 'max_arguments' must be at least 1.");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<ShellConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;

    log::debug!("Loaded config from {:?}", path);

    let defaults = ShellConfig::default();
    let config = ShellConfig {
        prompt: file.prompt.unwrap_or(defaults.prompt),
        max_arguments: file.max_arguments.unwrap_or(defaults.max_arguments),
        empty_path_segments: file.empty_path_segments.unwrap_or(defaults.empty_path_segments),
    };
    config.validate()?;
    Ok(config)
}
