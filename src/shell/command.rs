//! Shell command execution.
//!
//! Every command runs with stdin closed, stdout and stderr folded into one
//! bounded [`CaptureBuffer`], an explicit timeout, and a [`CancelToken`].

use crate::error::{DevrigError, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::capture::{CaptureBuffer, DEFAULT_OUTPUT_LIMIT};
use super::cancel::CancelToken;

/// How often a running child is checked for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading after the child exits.
///
/// Daemons started by an install command can inherit the pipes and keep
/// them open forever. A reader still blocked when the grace expires is left
/// detached; it exits once the daemon closes the pipe or the process ends.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Combined stdout and stderr, bounded by the output limit.
    pub output: String,

    /// Bytes of output dropped by the limit.
    pub truncated_bytes: usize,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed for exceeding its timeout.
    pub timed_out: bool,

    /// Whether the command was killed because the run was cancelled.
    pub cancelled: bool,
}

/// Options for command execution.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Shell invoked as `<shell> -c <command>`.
    pub shell: String,

    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Timeout (None = no timeout).
    pub timeout: Option<Duration>,

    /// Bytes of combined output kept.
    pub output_limit: usize,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            cwd: None,
            env: HashMap::new(),
            timeout: None,
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }
}

struct Exit {
    status: ExitStatus,
    timed_out: bool,
    cancelled: bool,
}

/// Execute a shell command.
///
/// Returns `Err` only when the shell itself cannot be spawned or waited on;
/// a non-zero exit, a timeout or a cancellation are reported in the
/// [`CommandResult`].
pub fn execute(command: &str, options: &CommandOptions, cancel: &CancelToken) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(&options.shell);
    cmd.arg("-c").arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    // Own process group, so a timeout takes down everything the shell started.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    debug!("Spawning `{}` via {}", command, options.shell);
    let mut child = cmd.spawn().map_err(|e| {
        warn!("Failed to spawn {}: {}", options.shell, e);
        DevrigError::CommandFailed {
            command: command.to_string(),
            message: format!("could not start {}: {}", options.shell, e),
        }
    })?;

    let capture = Arc::new(Mutex::new(CaptureBuffer::new(options.output_limit)));
    let (done_tx, done_rx) = mpsc::channel();
    let mut readers = 0;

    if let Some(stdout) = child.stdout.take() {
        spawn_reader(stdout, Arc::clone(&capture), done_tx.clone());
        readers += 1;
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(stderr, Arc::clone(&capture), done_tx.clone());
        readers += 1;
    }
    drop(done_tx);

    let exit = wait_for_exit(&mut child, options.timeout, cancel).map_err(|e| {
        warn!("Failed waiting for `{}`: {}", command, e);
        DevrigError::CommandFailed {
            command: command.to_string(),
            message: format!("could not wait for child: {}", e),
        }
    })?;

    let deadline = Instant::now() + DRAIN_GRACE;
    for _ in 0..readers {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if done_rx.recv_timeout(remaining).is_err() {
            debug!("Output pipes of `{}` still open after exit", command);
            break;
        }
    }

    let (output, truncated_bytes) = match capture.lock() {
        Ok(buffer) => (buffer.text(), buffer.omitted()),
        Err(poisoned) => {
            let buffer = poisoned.into_inner();
            (buffer.text(), buffer.omitted())
        }
    };

    if truncated_bytes > 0 {
        warn!("Output of `{}` truncated by {} bytes", command, truncated_bytes);
    }

    let duration = start.elapsed();
    let success = exit.status.success() && !exit.timed_out && !exit.cancelled;
    debug!(
        "`{}` finished: code={:?} timed_out={} cancelled={} in {:?}",
        command,
        exit.status.code(),
        exit.timed_out,
        exit.cancelled,
        duration
    );

    Ok(CommandResult {
        exit_code: exit.status.code(),
        output,
        truncated_bytes,
        duration,
        success,
        timed_out: exit.timed_out,
        cancelled: exit.cancelled,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    capture: Arc<Mutex<CaptureBuffer>>,
    done: mpsc::Sender<()>,
) {
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if let Ok(mut buffer) = capture.lock() {
                        buffer.push(&chunk[..n]);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = done.send(());
    });
}

fn wait_for_exit(
    child: &mut Child,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> std::io::Result<Exit> {
    let start = Instant::now();

    loop {
        if cancel.is_cancelled() {
            warn!("Run cancelled, killing child {}", child.id());
            return kill_and_reap(child, false, true);
        }

        let slice = match timeout {
            Some(limit) => {
                let elapsed = start.elapsed();
                if elapsed >= limit {
                    warn!("Command timed out after {}s, killing", limit.as_secs());
                    return kill_and_reap(child, true, false);
                }
                POLL_INTERVAL.min(limit - elapsed)
            }
            None => POLL_INTERVAL,
        };

        if let Some(status) = child.wait_timeout(slice)? {
            return Ok(Exit {
                status,
                timed_out: false,
                cancelled: false,
            });
        }
    }
}

fn kill_and_reap(child: &mut Child, timed_out: bool, cancelled: bool) -> std::io::Result<Exit> {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: kill(2) with a negative pid signals the child's own group.
            unsafe { libc::kill(-pgid, libc::SIGKILL) };
        }
    }

    // The child may have exited between the last poll and the kill.
    if let Err(e) = child.kill() {
        debug!("kill failed: {}", e);
    }
    let status = child.wait()?;
    Ok(Exit {
        status,
        timed_out,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CommandOptions {
        CommandOptions {
            timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        }
    }

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &options(), &CancelToken::new()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("exit 3", &options(), &CancelToken::new()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn missing_command_exits_127() {
        let result = execute(
            "definitely-not-a-command-xyz",
            &options(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(127));
        assert!(!result.output.is_empty());
    }

    #[test]
    fn combines_stdout_and_stderr() {
        let result = execute("echo out; echo err >&2", &options(), &CancelToken::new()).unwrap();

        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[test]
    fn execute_with_env_and_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut opts = options();
        opts.cwd = Some(temp.path().to_path_buf());
        opts.env.insert("MY_VAR".to_string(), "my_value".to_string());

        let result = execute("echo $MY_VAR; pwd", &opts, &CancelToken::new()).unwrap();

        assert!(result.success);
        assert!(result.output.contains("my_value"));
    }

    #[test]
    fn timeout_kills_command() {
        let opts = CommandOptions {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };

        let result = execute("sleep 10", &opts, &CancelToken::new()).unwrap();

        assert!(result.timed_out);
        assert!(!result.success);
        assert!(result.duration < Duration::from_secs(8));
    }

    #[test]
    fn timeout_kills_grandchildren() {
        let opts = CommandOptions {
            timeout: Some(Duration::from_millis(300)),
            ..Default::default()
        };

        let result = execute("sleep 10 & sleep 10; wait", &opts, &CancelToken::new()).unwrap();

        assert!(result.timed_out);
        assert!(result.duration < Duration::from_secs(5));
    }

    #[test]
    fn cancelled_token_kills_command() {
        let token = CancelToken::new();
        let remote = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            remote.cancel();
        });

        let result = execute("sleep 10", &options(), &token).unwrap();

        assert!(result.cancelled);
        assert!(!result.success);
    }

    #[test]
    fn output_is_bounded() {
        let opts = CommandOptions {
            output_limit: 16,
            ..options()
        };

        let result = execute(
            "i=0; while [ $i -lt 100 ]; do echo line-$i; i=$((i+1)); done",
            &opts,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(result.success);
        assert!(result.truncated_bytes > 0);
        assert!(result.output.contains("[output truncated:"));
        assert!(!result.output.contains("line-99"));
    }

    #[test]
    fn background_daemon_does_not_hang_capture() {
        let result = execute("sleep 30 & echo started", &options(), &CancelToken::new()).unwrap();

        assert!(result.success);
        assert!(result.output.contains("started"));
        assert!(result.duration < Duration::from_secs(10));
    }

    #[test]
    fn missing_shell_is_an_error() {
        let opts = CommandOptions {
            shell: "/nonexistent/shell".to_string(),
            ..options()
        };

        let err = execute("true", &opts, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, DevrigError::CommandFailed { .. }));
        let msg = err.to_string();
        assert!(msg.contains("could not start /nonexistent/shell"));
        assert!(!msg.contains("None"));
    }
}
