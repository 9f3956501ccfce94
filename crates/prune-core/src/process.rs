//! Bounded external command execution.
//!
//! Package-manager calls can hang (lock contention, interactive prompts), so
//! every child is given a deadline. Stdout and stderr are drained on helper
//! threads while we wait; `brew info --json` output easily exceeds the pipe
//! buffer.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::CommandError;

/// Captured output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// Run `program args...` and wait at most `timeout` for it to exit.
///
/// # Errors
///
/// Returns [`CommandError::Spawn`] if the process cannot be started,
/// [`CommandError::Timeout`] if it is still running after `timeout` (it is
/// killed), and [`CommandError::Failed`] on a non-zero exit.
pub fn run(
    program: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let command = render(program, args);
    tracing::debug!(%command, timeout_secs = timeout.as_secs(), "spawning");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            command: command.clone(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let waited = match child.wait_timeout(timeout) {
        Ok(waited) => waited,
        Err(source) => {
            reap(&mut child);
            return Err(CommandError::Spawn { command, source });
        }
    };

    let Some(status) = waited else {
        reap(&mut child);
        return Err(CommandError::Timeout {
            command,
            secs: timeout.as_secs(),
        });
    };

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();

    if !status.success() {
        return Err(CommandError::Failed {
            command,
            status: status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

/// Kill a child we gave up on and collect its exit status.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn render(program: &Path, args: &[&str]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> Result<CommandOutput, CommandError> {
        run(Path::new("/bin/sh"), &["-c", script], timeout)
    }

    #[test]
    fn test_run_captures_stdout() {
        let out = sh("echo hello", Duration::from_secs(10)).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn test_run_reports_failure_with_stderr() {
        let err = sh("echo nope >&2; exit 3", Duration::from_secs(10)).unwrap_err();
        match err {
            CommandError::Failed { stderr, .. } => assert_eq!(stderr, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_times_out() {
        let err = sh("sleep 5", Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[test]
    fn test_timed_out_child_is_reaped() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec sleep 5", pid_file.display());

        let err = sh(&script, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let alive = Command::new("kill")
            .args(["-0", pid.trim()])
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!alive.success(), "child {} still exists", pid.trim());
    }

    #[test]
    fn test_run_missing_program() {
        let err = run(Path::new("/definitely/not/a/program"), &[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
