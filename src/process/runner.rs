//! Process runner
//!
//! Two invocation styles: [`run`] captures output so the caller can
//! parse or match it, [`run_inherited`] attaches the parent's standard
//! streams so output streams live to the user.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;

use crate::common::logging::loggable;
use crate::common::{describe, Error, Result};

use super::options::{Input, RunOptions, Sink};

/// Read buffer size for draining child pipes
const CHUNK_SIZE: usize = 8192;

/// A finished child process and whatever output was captured
#[derive(Debug)]
pub struct Output {
    pub status: ExitStatus,
    /// Empty when stdout went to a caller-supplied sink
    pub stdout: String,
    pub stderr: String,
}

/// Something that can run a command and hand back its stdout
///
/// The cluster helpers go through this so they can be exercised
/// without a real control plane.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cli: &str, args: &[String], opts: RunOptions) -> Result<String>;
}

impl std::fmt::Debug for dyn CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommandRunner")
    }
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, cli: &str, args: &[String], opts: RunOptions) -> Result<String> {
        run(cli, args, opts).await
    }
}

/// Run a command, capturing stdout and stderr
///
/// Exit code zero yields the captured stdout. A non-zero exit or a
/// spawn failure yields [`Error::CommandFailed`] carrying the captured
/// stderr; it is marked fatal unless `opts.allow_error` is set.
pub async fn run(cli: &str, args: &[String], opts: RunOptions) -> Result<String> {
    let command = describe(cli, args);
    let allow_error = opts.allow_error;
    let redact = opts.redact;

    tracing::debug!("Running '{}'...", command);

    let (stderr, detail) = match execute(cli, args, opts).await {
        Ok(output) if output.status.success() => {
            tracing::debug!(
                command = %command,
                stdout = loggable(&output.stdout, redact),
                "Command succeeded"
            );
            return Ok(output.stdout);
        }
        Ok(output) => (output.stderr, output.status.to_string()),
        Err(e) => (String::new(), e.to_string()),
    };

    let err = Error::CommandFailed {
        command: command.clone(),
        stderr,
        detail,
        fatal: !allow_error,
    };

    if allow_error {
        tracing::debug!(
            command = %command,
            stderr = loggable(err.stderr().unwrap_or_default(), redact),
            "Command failed (tolerated)"
        );
    } else if redact {
        tracing::error!("Failed to successfully execute '{}'", command);
    } else {
        tracing::error!("Failed to successfully execute '{}': {}", command, err);
    }

    Err(err)
}

/// Run a command with the parent's stdin, stdout, stderr and environment
pub async fn run_inherited(path: &Path, args: &[String]) -> Result<()> {
    let command = describe(&path.display().to_string(), args);
    tracing::debug!("Running '{}' with inherited streams", command);

    let failed = |detail: String| Error::CommandFailed {
        command: command.clone(),
        stderr: String::new(),
        detail,
        fatal: false,
    };

    let status = Command::new(path)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !status.success() {
        return Err(failed(status.to_string()));
    }
    Ok(())
}

/// Spawn one child, wire its streams and wait for it to exit
///
/// If a cancellation token is supplied and fires first, the child is
/// sent an interrupt and waited on as usual; nothing forces it to exit.
pub async fn execute(cli: &str, args: &[String], opts: RunOptions) -> io::Result<Output> {
    let RunOptions {
        stdout: stdout_sink,
        stderr: stderr_sink,
        stdin,
        cancel,
        ..
    } = opts;

    let mut child = Command::new(cli)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let command = describe(cli, args);
    let child_stdin = child.stdin.take();
    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let capture_stdout = stdout_sink.is_none();
    let (fed, stdout, stderr, status) = tokio::join!(
        feed(child_stdin, stdin),
        drain(child_stdout, stdout_sink, capture_stdout),
        drain(child_stderr, stderr_sink, true),
        wait(&mut child, cancel.as_ref(), &command),
    );

    let status = status?;
    fed?;

    Ok(Output {
        status,
        stdout: String::from_utf8_lossy(&stdout?).into_owned(),
        stderr: String::from_utf8_lossy(&stderr?).into_owned(),
    })
}

/// Wait for the child, interrupting it once if the token fires first
async fn wait(
    child: &mut Child,
    cancel: Option<&CancellationToken>,
    command: &str,
) -> io::Result<ExitStatus> {
    if let Some(token) = cancel {
        tokio::select! {
            status = child.wait() => return status,
            () = token.cancelled() => interrupt(child, command),
        }
    }
    child.wait().await
}

#[cfg(unix)]
fn interrupt(child: &Child, command: &str) {
    let Some(pid) = child.id() else {
        tracing::debug!("'{}' already exited, no interrupt sent", command);
        return;
    };

    // SIGINT only; the child decides how to wind down
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc == 0 {
        tracing::debug!(pid, "Sent interrupt to '{}'", command);
    } else {
        tracing::warn!(
            pid,
            error = %io::Error::last_os_error(),
            "Failed to interrupt '{}'",
            command
        );
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child, command: &str) {
    tracing::warn!("Interrupt is not supported on this platform, '{}' keeps running", command);
}

/// Write the caller's input to the child's stdin, then close it
async fn feed(pipe: Option<ChildStdin>, input: Option<Input>) -> io::Result<()> {
    let (Some(mut pipe), Some(input)) = (pipe, input) else {
        return Ok(());
    };

    let result = match input {
        Input::Bytes(bytes) => pipe.write_all(&bytes).await,
        Input::Reader(mut reader) => tokio::io::copy(&mut reader, &mut pipe).await.map(|_| ()),
    };

    match result {
        // The child may exit without reading all of its input
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Read a child pipe to EOF, forwarding to `sink` and optionally capturing
async fn drain<R>(pipe: Option<R>, mut sink: Option<Sink>, capture: bool) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let Some(mut pipe) = pipe else {
        return Ok(captured);
    };

    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if capture {
            captured.extend_from_slice(&chunk[..n]);
        }
        if let Some(sink) = sink.as_mut() {
            sink.write_all(&chunk[..n]).await?;
        }
    }

    if let Some(sink) = sink.as_mut() {
        sink.flush().await?;
    }
    Ok(captured)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    fn cancel_after(delay: Duration) -> CancellationToken {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trigger.cancel();
        });
        token
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = run("sh", &sh("echo hello"), RunOptions::new()).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_fatal_by_default() {
        let err = run("sh", &sh("echo oops >&2; exit 1"), RunOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.stderr(), Some("oops\n"));
    }

    #[tokio::test]
    async fn test_tolerated_failure_carries_stderr() {
        let err = run(
            "sh",
            &sh("echo 'namespace exists' >&2; exit 1"),
            RunOptions::new().allow_error(),
        )
        .await
        .unwrap_err();
        assert!(!err.is_fatal());
        let message = err.to_string();
        assert!(message.contains("namespace exists"), "got: {message}");
        assert!(message.contains("exit status: 1"), "got: {message}");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_command_failure() {
        let err = run("funk-no-such-binary-7f3a", &[], RunOptions::new().allow_error())
            .await
            .unwrap_err();
        match err {
            Error::CommandFailed { stderr, detail, fatal, .. } => {
                assert!(stderr.is_empty());
                assert!(!detail.is_empty());
                assert!(!fatal);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stdin_is_fed() {
        let out = run("cat", &[], RunOptions::new().stdin("piped input"))
            .await
            .unwrap();
        assert_eq!(out, "piped input");
    }

    #[tokio::test]
    async fn test_stdout_sink_receives_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdout.log");
        let file = tokio::fs::File::create(&path).await.unwrap();

        let out = run("sh", &sh("echo streamed"), RunOptions::new().stdout(file))
            .await
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "streamed\n");
    }

    #[tokio::test]
    async fn test_stderr_sink_still_captures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stderr.log");
        let file = tokio::fs::File::create(&path).await.unwrap();

        let err = run(
            "sh",
            &sh("echo broken >&2; exit 3"),
            RunOptions::new().allow_error().stderr(file),
        )
        .await
        .unwrap_err();

        assert_eq!(err.stderr(), Some("broken\n"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "broken\n");
    }

    #[tokio::test]
    async fn test_cancel_delivers_interrupt() {
        // The trap only runs if SIGINT actually reached the shell
        let script = "trap 'echo interrupted; exit 0' INT; while :; do sleep 0.05; done";
        let token = cancel_after(Duration::from_millis(300));

        let out = run("sh", &sh(script), RunOptions::new().cancel_on(token))
            .await
            .unwrap();
        assert_eq!(out, "interrupted\n");
    }

    #[tokio::test]
    async fn test_cancel_interrupts_long_sleep() {
        use std::os::unix::process::ExitStatusExt;

        let started = Instant::now();
        let token = cancel_after(Duration::from_millis(100));

        let output = execute("sleep", &["30".to_string()], RunOptions::new().cancel_on(token))
            .await
            .unwrap();

        assert_eq!(output.status.signal(), Some(libc::SIGINT));
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_uncancelled_token_does_not_interfere() {
        let token = CancellationToken::new();
        let out = run("sh", &sh("echo done"), RunOptions::new().cancel_on(token.clone()))
            .await
            .unwrap();
        assert_eq!(out, "done\n");
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_inherited_reports_exit_status() {
        let ok = run_inherited(Path::new("/bin/sh"), &sh("exit 0")).await;
        assert!(ok.is_ok());

        let err = run_inherited(Path::new("/bin/sh"), &sh("exit 4"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exit status: 4"));
    }
}
