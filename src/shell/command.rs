//! External process execution.
//!
//! Processes run with an explicit environment, a single pipe shared by
//! stdout and stderr (so the captured text keeps write order), and an
//! optional deadline. On Unix the child leads its own process group. The
//! group is killed at the deadline, and again once the child exits, so
//! helpers a step script leaves running cannot outlive it or hold the
//! output pipe open.

use crate::config::EnvList;
use crate::error::{DeployTestError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Combined stdout and stderr.
    pub output: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the command exited with code 0.
    pub success: bool,

    /// Whether the command was killed at its deadline.
    pub timed_out: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Complete environment for the child; nothing is inherited.
    pub env: EnvList,

    /// Wall-clock limit (None = wait forever).
    pub timeout: Option<Duration>,
}

/// Run `program` with `args` and wait for it to exit or hit its deadline.
///
/// # Errors
///
/// Returns `CommandFailed` if the process cannot be spawned or waited on.
/// A non-zero exit or a timeout is not an error; see [`CommandResult`].
pub fn execute(program: &Path, args: &[&str], options: &CommandOptions) -> Result<CommandResult> {
    let command_line = describe(program, args);
    let failed = |e: std::io::Error| DeployTestError::CommandFailed {
        command: command_line.clone(),
        message: e.to_string(),
    };

    let start = Instant::now();
    let (mut reader, writer) = std::io::pipe().map_err(failed)?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.env_clear();
    for (key, value) in options.env.resolved() {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(writer.try_clone().map_err(failed)?);
    cmd.stderr(writer);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let spawned = cmd.spawn();
    // The command owns our copies of the pipe's write end; drop them so the
    // reader sees EOF once the child and its descendants exit.
    drop(cmd);
    let mut child = spawned.map_err(failed)?;

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    // A deadline too far out to represent is no deadline.
    let deadline = options.timeout.and_then(|t| start.checked_add(t));
    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait().map_err(failed)? {
            break status;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            kill_tree(&mut child);
            timed_out = true;
            break child.wait().map_err(failed)?;
        }
        thread::sleep(POLL_INTERVAL);
    };

    // Background helpers left behind by the step would keep the pipe open.
    kill_group(&child);

    let mut output = Vec::new();
    loop {
        let next = match deadline {
            Some(d) => rx.recv_timeout(d.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };
        match next {
            Ok(bytes) => output.extend_from_slice(&bytes),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Something outside the group still holds the pipe.
                output.extend(rx.try_iter().flatten());
                timed_out = true;
                break;
            }
        }
    }
    let duration = start.elapsed();

    Ok(CommandResult {
        exit_code: status.code(),
        output: String::from_utf8_lossy(&output).into_owned(),
        duration,
        success: status.success() && !timed_out,
        timed_out,
    })
}

/// Kill the child and its whole process group.
fn kill_tree(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
}

/// SIGKILL every remaining member of the child's process group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: killpg has no memory-safety preconditions; the group id is the
    // child's pid because it was spawned with process_group(0). An empty
    // group yields ESRCH, which is ignored.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn describe(program: &Path, args: &[&str]) -> String {
    let mut s = program.display().to_string();
    for arg in args {
        s.push(' ');
        s.push_str(arg);
    }
    s
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, options: &CommandOptions) -> CommandResult {
        execute(Path::new("/bin/sh"), &["-c", script], options).unwrap()
    }

    fn options_with_path() -> CommandOptions {
        CommandOptions {
            env: EnvList::new().with("PATH", "/usr/bin:/bin"),
            ..Default::default()
        }
    }

    #[test]
    fn execute_successful_command() {
        let result = sh("echo hello", &options_with_path());

        assert!(result.success);
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = sh("exit 3", &options_with_path());

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn combines_stdout_and_stderr_in_order() {
        let result = sh("echo one; echo two >&2; echo three", &options_with_path());

        assert_eq!(result.output, "one\ntwo\nthree\n");
    }

    #[test]
    fn uses_only_given_environment() {
        let options = CommandOptions {
            env: EnvList::new().with("MY_VAR", "first").with("MY_VAR", "second"),
            ..Default::default()
        };
        let result = sh("echo \"$MY_VAR:${HOME:-unset}\"", &options);

        assert!(result.output.contains("second:unset"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..options_with_path()
        };

        let result = sh("pwd", &options);

        assert!(result.success);
        let expected = temp.path().canonicalize().unwrap();
        assert_eq!(
            Path::new(result.output.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[test]
    fn deadline_kills_the_process() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(300)),
            ..options_with_path()
        };

        let result = sh("echo started; sleep 30", &options);

        assert!(!result.success);
        assert!(result.timed_out);
        assert!(result.output.contains("started"));
        assert!(result.duration < Duration::from_secs(10));
    }

    #[test]
    fn deadline_kills_background_children() {
        // The grandchild holds the output pipe open; if it survived the
        // group kill, reading output would block for the full sleep.
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(300)),
            ..options_with_path()
        };

        let result = sh("sleep 30 & wait", &options);

        assert!(result.timed_out);
        assert!(result.duration < Duration::from_secs(10));
    }

    #[test]
    fn leftover_background_child_does_not_hold_return() {
        let options = CommandOptions {
            timeout: Some(Duration::from_millis(300)),
            ..options_with_path()
        };

        let result = sh("sleep 4 & echo done", &options);

        assert!(result.success);
        assert!(!result.timed_out);
        assert!(result.output.contains("done"));
        assert!(result.duration < Duration::from_secs(2));
    }

    #[test]
    fn leftover_background_child_without_deadline() {
        let result = sh("sleep 30 & echo done", &options_with_path());

        assert!(result.success);
        assert!(result.output.contains("done"));
        assert!(result.duration < Duration::from_secs(10));
    }

    #[test]
    fn unrepresentable_deadline_means_no_deadline() {
        let options = CommandOptions {
            timeout: Some(Duration::MAX),
            ..options_with_path()
        };

        let result = sh("echo ok", &options);

        assert!(result.success);
        assert!(!result.timed_out);
    }

    #[test]
    fn fast_command_returns_before_deadline() {
        let options = CommandOptions {
            timeout: Some(Duration::from_secs(30)),
            ..options_with_path()
        };

        let result = sh("true", &options);

        assert!(result.success);
        assert!(result.duration < Duration::from_secs(5));
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = execute(
            Path::new("/nonexistent/step.sh"),
            &["validate"],
            &CommandOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, DeployTestError::CommandFailed { .. }));
        assert!(err.to_string().contains("/nonexistent/step.sh validate"));
    }
}
