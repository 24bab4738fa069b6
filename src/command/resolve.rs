use clap::ValueEnum;
use serde::Deserialize;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use crate::env::Environment;

/// What an empty `PATH` entry (`::`, leading or trailing `:`) stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmptySegmentPolicy {
    #[default]
    Skip,
    CurrentDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The name carries a separator and is launched as given.
    Direct(PathBuf),
    /// First executable candidate found in `PATH`.
    Searched(PathBuf),
    NotFound,
}

pub fn resolve(program: &OsStr, env: &Environment, policy: EmptySegmentPolicy) -> Resolution {
    match std::env::current_dir() {
        Ok(cwd) => resolve_in(program, env, policy, Some(&cwd)),
        Err(e) => {
            log::debug!("Current directory unavailable: {}", e);
            resolve_in(program, env, policy, None)
        }
    }
}

pub fn resolve_in(
    program: &OsStr,
    env: &Environment,
    policy: EmptySegmentPolicy,
    cwd: Option<&Path>,
) -> Resolution {
    if program.as_bytes().contains(&b'/') {
        return Resolution::Direct(PathBuf::from(program));
    }

    let Some(path_var) = env.path().filter(|p| !p.is_empty()) else {
        log::debug!("PATH is unset or empty, {:?} cannot be resolved", program);
        return Resolution::NotFound;
    };

    let base = cwd.unwrap_or(Path::new("."));

    for segment in path_var.as_bytes().split(|b| *b == b':') {
        let dir = if segment.is_empty() {
            match (policy, cwd) {
                (EmptySegmentPolicy::Skip, _) => continue,
                (EmptySegmentPolicy::CurrentDir, Some(cwd)) => cwd.to_path_buf(),
                (EmptySegmentPolicy::CurrentDir, None) => {
                    log::warn!("Ignoring empty PATH segment: current directory is unavailable");
                    continue;
                }
            }
        } else {
            PathBuf::from(OsStr::from_bytes(segment))
        };

        log::trace!("Trying {}", dir.join(program).display());
        if let Ok(found) = which::which_in(program, Some(dir.as_os_str()), base) {
            log::debug!("Resolved {:?} to {}", program, found.display());
            return Resolution::Searched(found);
        }
    }

    log::debug!("{:?} not found in PATH", program);
    Resolution::NotFound
}
