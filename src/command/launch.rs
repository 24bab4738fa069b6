use anyhow::{Result, anyhow};
use nix::errno::Errno;
use std::ffi::OsString;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use crate::command::{ArgumentList, EmptySegmentPolicy, Resolution, resolve};
use crate::env::Environment;

/// Conventional exit status for "command not found".
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

/// Result of one spawn-and-wait.
#[derive(Debug)]
pub enum LaunchOutcome {
    Exited(ExitStatus),
    FailedToLaunch(io::Error),
}

/// Spawns `program` with `args` as its argument vector and blocks until it ends.
pub trait Launcher {
    fn launch(&self, program: &Path, args: &ArgumentList, env: &Environment) -> LaunchOutcome;
}

/// Runs commands as real child processes sharing the shell's stdio.
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, program: &Path, args: &ArgumentList, env: &Environment) -> LaunchOutcome {
        let mut cmd = Command::new(program);
        if let Some(name) = args.program() {
            cmd.arg0(name);
        }
        cmd.args(args.args());

        // The snapshot is the source of truth for the child's environment
        cmd.env_clear();
        cmd.envs(env.vars());

        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return LaunchOutcome::FailedToLaunch(e),
        };
        log::debug!("Spawned {} (pid {})", program.display(), child.id());

        match child.wait() {
            Ok(status) => LaunchOutcome::Exited(status),
            Err(e) => LaunchOutcome::FailedToLaunch(e),
        }
    }
}

#[derive(Debug)]
pub enum CommandOutcome {
    /// Empty line, nothing was launched.
    Skipped,
    Completed(ExitStatus),
    NotFound(OsString),
}

/// Resolves and runs one argument list.
///
/// Returns `Err` only when a process could not be created at all; every
/// "cannot find or exec this program" case comes back as `NotFound`.
pub fn execute<L: Launcher + ?Sized>(
    args: &ArgumentList,
    env: &Environment,
    policy: EmptySegmentPolicy,
    launcher: &L,
) -> Result<CommandOutcome> {
    let Some(name) = args.program() else {
        return Ok(CommandOutcome::Skipped);
    };

    let (path, direct) = match resolve(name, env, policy) {
        Resolution::Direct(path) => (path, true),
        Resolution::Searched(path) => (path, false),
        Resolution::NotFound => return Ok(CommandOutcome::NotFound(name.to_os_string())),
    };

    match launcher.launch(&path, args, env) {
        LaunchOutcome::Exited(status) if direct && status.code() == Some(NOT_FOUND_EXIT_CODE) => {
            Ok(CommandOutcome::NotFound(name.to_os_string()))
        }
        LaunchOutcome::Exited(status) => Ok(CommandOutcome::Completed(status)),
        LaunchOutcome::FailedToLaunch(e) if is_process_creation_failure(&e) => {
            Err(anyhow!(e).context(format!("Failed to create process for {:?}", name)))
        }
        LaunchOutcome::FailedToLaunch(e) => {
            log::debug!("Could not exec {}: {}", path.display(), e);
            Ok(CommandOutcome::NotFound(name.to_os_string()))
        }
    }
}

/// Errors where no new process could be made at all. Anything else means the
/// program image could not be loaded for this one command.
fn is_process_creation_failure(err: &io::Error) -> bool {
    match err.raw_os_error() {
        Some(code) => matches!(Errno::from_raw(code), Errno::EAGAIN | Errno::ENOMEM),
        None => err.kind() == io::ErrorKind::OutOfMemory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::split_arguments;
    use std::cell::RefCell;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::process::ExitStatusExt;
    use std::path::PathBuf;

    /// Replays canned outcomes and records what it was asked to run.
    struct ScriptedLauncher {
        calls: RefCell<Vec<(PathBuf, Vec<OsString>, Option<OsString>)>>,
        outcome: fn() -> LaunchOutcome,
    }

    impl ScriptedLauncher {
        fn new(outcome: fn() -> LaunchOutcome) -> Self {
            Self { calls: RefCell::new(Vec::new()), outcome }
        }
    }

    impl Launcher for ScriptedLauncher {
        fn launch(&self, program: &Path, args: &ArgumentList, env: &Environment) -> LaunchOutcome {
            self.calls.borrow_mut().push((
                program.to_path_buf(),
                args.as_slice().to_vec(),
                env.get("HSH_MARKER").map(OsStr::to_os_string),
            ));
            (self.outcome)()
        }
    }

    fn exited(code: i32) -> LaunchOutcome {
        LaunchOutcome::Exited(ExitStatus::from_raw(code << 8))
    }

    fn failed(errno: Errno) -> LaunchOutcome {
        LaunchOutcome::FailedToLaunch(io::Error::from_raw_os_error(errno as i32))
    }

    fn no_path() -> Environment {
        Environment::default()
    }

    fn system_path() -> Environment {
        [("PATH", "/usr/bin:/bin")].into_iter().collect()
    }

    #[test]
    fn test_empty_list_is_skipped() {
        let launcher = ScriptedLauncher::new(|| exited(0));
        let outcome = execute(&split_arguments("", 10), &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap();
        assert!(matches!(outcome, CommandOutcome::Skipped));
        assert!(launcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_unresolved_never_launches() {
        let launcher = ScriptedLauncher::new(|| exited(0));
        let args = split_arguments("zzznotacommand arg", 10);
        let outcome = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap();
        assert!(matches!(outcome, CommandOutcome::NotFound(ref n) if n == "zzznotacommand"));
        assert!(launcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_direct_path_passes_full_argv() {
        let launcher = ScriptedLauncher::new(|| exited(3));
        let args = split_arguments("/opt/tool -v x", 10);
        let outcome = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap();

        match outcome {
            CommandOutcome::Completed(status) => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected outcome {:?}", other),
        }
        let calls = launcher.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/opt/tool"));
        assert_eq!(calls[0].1, ["/opt/tool", "-v", "x"]);
    }

    #[test]
    fn test_environment_reaches_launcher() {
        let launcher = ScriptedLauncher::new(|| exited(0));
        let env: Environment = [(OsStr::new("HSH_MARKER"), OsStr::from_bytes(b"caf\xe9"))]
            .into_iter()
            .collect();
        execute(&split_arguments("/opt/tool", 10), &env, EmptySegmentPolicy::Skip, &launcher).unwrap();

        let calls = launcher.calls.borrow();
        assert_eq!(calls[0].2.as_deref().map(OsStr::as_bytes), Some(&b"caf\xe9"[..]));
    }

    #[test]
    fn test_direct_exit_127_is_not_found() {
        let launcher = ScriptedLauncher::new(|| exited(NOT_FOUND_EXIT_CODE));
        let args = split_arguments("./missing", 10);
        let outcome = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap();
        assert!(matches!(outcome, CommandOutcome::NotFound(ref n) if n == "./missing"));
    }

    #[test]
    fn test_signal_is_completed() {
        let launcher = ScriptedLauncher::new(|| LaunchOutcome::Exited(ExitStatus::from_raw(9)));
        let args = split_arguments("/opt/tool", 10);
        let outcome = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap();
        match outcome {
            CommandOutcome::Completed(status) => assert_eq!(status.signal(), Some(9)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_exec_failures_are_not_found() {
        let cases: [fn() -> LaunchOutcome; 4] = [
            || failed(Errno::ENOEXEC),
            || failed(Errno::E2BIG),
            || failed(Errno::ETXTBSY),
            || LaunchOutcome::FailedToLaunch(io::Error::new(io::ErrorKind::InvalidInput, "nul byte found")),
        ];
        for outcome in cases {
            let launcher = ScriptedLauncher::new(outcome);
            let args = split_arguments("./not-a-binary", 10);
            let result = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap();
            assert!(matches!(result, CommandOutcome::NotFound(_)), "got {:?}", result);
        }
    }

    #[test]
    fn test_resource_exhaustion_is_fatal() {
        let cases: [fn() -> LaunchOutcome; 2] = [|| failed(Errno::EAGAIN), || failed(Errno::ENOMEM)];
        for outcome in cases {
            let launcher = ScriptedLauncher::new(outcome);
            let args = split_arguments("/bin/true", 10);
            let err = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &launcher).unwrap_err();
            assert!(format!("{:#}", err).contains("Failed to create process for \"/bin/true\""));
        }
    }

    #[test]
    fn test_process_creation_failure_classification() {
        assert!(is_process_creation_failure(&io::Error::from_raw_os_error(Errno::EAGAIN as i32)));
        assert!(is_process_creation_failure(&io::Error::from_raw_os_error(Errno::ENOMEM as i32)));
        assert!(is_process_creation_failure(&io::Error::from(io::ErrorKind::OutOfMemory)));
        assert!(!is_process_creation_failure(&io::Error::from_raw_os_error(Errno::ENOENT as i32)));
        assert!(!is_process_creation_failure(&io::Error::from_raw_os_error(Errno::E2BIG as i32)));
        assert!(!is_process_creation_failure(&io::Error::from(io::ErrorKind::InvalidInput)));
    }

    #[test]
    fn test_system_launcher_runs_child() {
        for (line, code) in [("true", 0), ("false", 1), ("true ignored args", 0)] {
            let args = split_arguments(line, 10);
            let outcome = execute(&args, &system_path(), EmptySegmentPolicy::Skip, &SystemLauncher).unwrap();
            match outcome {
                CommandOutcome::Completed(status) => assert_eq!(status.code(), Some(code), "{}", line),
                other => panic!("unexpected outcome {:?} for {}", other, line),
            }
        }
    }

    #[test]
    fn test_system_launcher_missing_direct_path() {
        let args = split_arguments("/nonexistent/zzznotacommand", 10);
        let outcome = execute(&args, &no_path(), EmptySegmentPolicy::Skip, &SystemLauncher).unwrap();
        assert!(matches!(outcome, CommandOutcome::NotFound(_)));
    }

    #[test]
    fn test_system_launcher_nul_in_argument() {
        let args = split_arguments(OsStr::from_bytes(b"true a\0b"), 10);
        let outcome = execute(&args, &system_path(), EmptySegmentPolicy::Skip, &SystemLauncher).unwrap();
        assert!(matches!(outcome, CommandOutcome::NotFound(ref n) if n == "true"));
    }

    #[test]
    fn test_system_launcher_oversized_argument() {
        let line = format!("true {}", "x".repeat(200_000));
        let args = split_arguments(&line, 10);
        let outcome = execute(&args, &system_path(), EmptySegmentPolicy::Skip, &SystemLauncher).unwrap();
        assert!(matches!(outcome, CommandOutcome::NotFound(ref n) if n == "true"));
    }
}
