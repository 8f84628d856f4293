use mcp_bridge_core::{BridgeError, RunnerConfig};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The captured stdin/stdout pair of a launched server, handed to the
/// transport layer.
pub struct StdioPipes {
    pub stdout: ChildStdout,
    pub stdin: ChildStdin,
}

/// Owned handle to a launched server process.
///
/// The handle and the transport built on its streams share one lifetime:
/// the session that owns both tears them down together.
pub struct ServerProcess {
    child: Child,
    command: String,
    drain_token: CancellationToken,
}

impl ServerProcess {
    /// Launch the configured command with stdin/stdout piped for a stdio
    /// transport. stderr is drained into the log.
    pub fn spawn_stdio(config: &RunnerConfig) -> Result<(Self, StdioPipes), BridgeError> {
        let mut cmd = Self::base_command(config);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut process = Self::spawn_command(cmd, config)?;
        let stdin = process
            .child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::spawn("child stdin was not captured"))?;
        let stdout = process
            .child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::spawn("child stdout was not captured"))?;

        Ok((process, StdioPipes { stdout, stdin }))
    }

    /// Launch the configured command without capturing stdin/stdout, for
    /// servers that speak over an HTTP endpoint instead. stderr is still
    /// drained into the log.
    pub fn spawn(config: &RunnerConfig) -> Result<Self, BridgeError> {
        let mut cmd = Self::base_command(config);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        Self::spawn_command(cmd, config)
    }

    fn base_command(config: &RunnerConfig) -> Command {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);

        if let Some(workdir) = &config.working_directory {
            cmd.current_dir(workdir);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        // A failed connect must not leak the child if teardown never runs.
        cmd.kill_on_drop(true);
        cmd
    }

    fn spawn_command(mut cmd: Command, config: &RunnerConfig) -> Result<Self, BridgeError> {
        let mut child = cmd
            .spawn()
            .map_err(|e| spawn_error(&config.command, &e))?;

        let drain_token = CancellationToken::new();
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_lines(
                stderr,
                config.name.clone(),
                drain_token.child_token(),
            ));
        }

        info!(
            command = %config.command,
            args = ?config.args,
            pid = ?child.id(),
            "server process started"
        );

        Ok(Self {
            child,
            command: config.command.clone(),
            drain_token,
        })
    }

    /// Process id, or None once the process has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check whether the process has exited, without blocking.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Terminate the process and wait for it to be reaped. Terminating an
    /// already-dead process is a no-op.
    pub async fn terminate(&mut self) {
        self.drain_token.cancel();

        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(command = %self.command, %status, "server process already exited");
                return;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(command = %self.command, error = %e, "failed to poll server process");
            }
        }

        if let Err(e) = self.child.start_kill() {
            warn!(command = %self.command, error = %e, "failed to kill server process");
        }

        match self.child.wait().await {
            Ok(status) => {
                info!(command = %self.command, %status, "server process terminated")
            }
            Err(e) => {
                warn!(command = %self.command, error = %e, "failed to reap server process")
            }
        }
    }
}

fn spawn_error(command: &str, err: &std::io::Error) -> BridgeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        BridgeError::spawn(format!("command not found: {command}"))
    } else {
        BridgeError::spawn(format!("{command}: {err}"))
    }
}

/// Forward a child's diagnostic stream into the log, line by line, until
/// the stream closes or the owning session is torn down.
async fn drain_lines<R: AsyncRead + Unpin>(stream: R, server: String, token: CancellationToken) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => debug!(server = %server, "stderr: {line}"),
                Ok(None) => break,
                Err(e) => {
                    warn!(server = %server, error = %e, "error reading server stderr");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &str, args: &[&str]) -> RunnerConfig {
        RunnerConfig::builder()
            .name("process-test")
            .version("0.0.0")
            .command(command)
            .args(args.iter().copied())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_spawn_stdio_captures_streams() {
        let (mut process, _pipes) = ServerProcess::spawn_stdio(&config("sleep", &["5"])).unwrap();
        assert!(process.id().is_some());
        assert!(!process.has_exited());
        process.terminate().await;
    }

    #[tokio::test]
    async fn test_spawn_missing_executable_is_spawn_error() {
        let err = ServerProcess::spawn_stdio(&config("definitely-not-a-real-binary", &[]))
            .err()
            .expect("spawn must fail");
        assert_eq!(err.kind(), "SpawnError");
        assert!(format!("{err}").contains("definitely-not-a-real-binary"));
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let (mut process, _pipes) = ServerProcess::spawn_stdio(&config("sleep", &["5"])).unwrap();
        process.terminate().await;
        // Second terminate must be a no-op, not an error or a hang.
        process.terminate().await;
        assert!(process.has_exited());
    }

    #[tokio::test]
    async fn test_terminate_after_natural_exit() {
        let (mut process, _pipes) = ServerProcess::spawn_stdio(&config("true", &[])).unwrap();
        // Give the process a moment to exit on its own.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        process.terminate().await;
        assert!(process.has_exited());
    }
}
