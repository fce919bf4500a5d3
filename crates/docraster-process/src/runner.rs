//! Bounded command execution

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::panic::{self, AssertUnwindSafe};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{
    child::ManagedChild,
    config::{CommandSpec, RunnerConfig},
    error::{RunError, RunResult},
    output::{capture_pipe, OutputCollector},
};

/// Shell exit status for "command not found"
const EXIT_NOT_FOUND: i32 = 127;

/// Shell exit status for "found but not executable"
const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Output of a command that exited with status 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Interleaved stdout and stderr
    pub output: Vec<u8>,
    /// Wall-clock time from spawn to exit
    pub elapsed: Duration,
}

impl CommandOutput {
    /// Output decoded lossily as UTF-8, trailing newline removed
    pub fn text(&self) -> String {
        let text = String::from_utf8_lossy(&self.output);
        text.trim_end_matches('\n').to_string()
    }
}

/// Runs shell commands under a deadline.
///
/// Each call owns its own pipe, child and accumulator; nothing is kept
/// between calls, so one runner can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    /// Create runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create runner with the given configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Get runner configuration
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `spec` and wait at most `timeout` for it to finish.
    ///
    /// # Examples
    /// ```no_run
    /// use std::time::Duration;
    /// use docraster_process::{CommandSpec, ProcessRunner};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let runner = ProcessRunner::new();
    /// let out = runner
    ///     .run(&CommandSpec::new("pdftocairo -v"), Duration::from_secs(10))
    ///     .await?;
    /// println!("{}", out.text());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, spec: &CommandSpec, timeout: Duration) -> RunResult<CommandOutput> {
        self.execute(spec, timeout, None::<fn()>).await
    }

    /// Like [`run`](Self::run), but call `on_timeout` after the process group
    /// has been killed and before `TimedOut` is returned.
    ///
    /// The callback runs at most once and never on any other path. A panic
    /// inside it is logged and swallowed.
    pub async fn run_with_cleanup<F>(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
        on_timeout: F,
    ) -> RunResult<CommandOutput>
    where
        F: FnOnce(),
    {
        self.execute(spec, timeout, Some(on_timeout)).await
    }

    async fn execute<F>(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
        on_timeout: Option<F>,
    ) -> RunResult<CommandOutput>
    where
        F: FnOnce(),
    {
        let (mut child, collector) = self.spawn(spec)?;
        let pid = child.pid();
        let started = Instant::now();

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let output = collector.finish(self.config.drain_grace).await;
                let elapsed = started.elapsed();
                debug!(pid = %pid, status = %status, elapsed_ms = elapsed.as_millis() as u64, "Command exited");
                classify(spec, status, output, elapsed)
            }
            Ok(Err(source)) => {
                warn!(pid = %pid, error = %source, "Error waiting for command");
                child.kill_group();
                child.reap(self.config.reap_grace).await;
                let output = collector.finish(self.config.drain_grace).await;
                Err(RunError::Wait {
                    command: spec.command.clone(),
                    source,
                    output,
                })
            }
            Err(_) => {
                let elapsed = started.elapsed();
                warn!(
                    pid = %pid,
                    timeout_ms = timeout.as_millis() as u64,
                    command = %spec.command,
                    "Command timed out, killing process group"
                );
                child.kill_group();
                child.reap(self.config.reap_grace).await;

                if let Some(cleanup) = on_timeout {
                    if panic::catch_unwind(AssertUnwindSafe(cleanup)).is_err() {
                        warn!(pid = %pid, "Timeout cleanup panicked");
                    }
                }

                let output = collector.finish(self.config.drain_grace).await;
                Err(RunError::TimedOut {
                    command: spec.command.clone(),
                    elapsed,
                    output,
                })
            }
        }
    }

    /// Start `shell -c command` as a new process group leader with both
    /// output streams on the capture pipe.
    fn spawn(&self, spec: &CommandSpec) -> RunResult<(ManagedChild, OutputCollector)> {
        debug!(command = %spec, "Spawning command");

        let spawn_failed = |source: io::Error| RunError::SpawnFailed {
            command: spec.command.clone(),
            source,
            output: Vec::new(),
        };

        let (read, writer) = capture_pipe().map_err(spawn_failed)?;
        let (stdout, stderr) = writer.into_stdio().map_err(spawn_failed)?;

        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(&spec.command)
            .envs(&spec.env)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);

        if let Some(ref dir) = spec.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(spawn_failed)?;
        // Closes the parent's copies of the write end; from here on EOF on
        // the read end means every process in the group has let go of it.
        drop(cmd);

        let pid = child.id().ok_or_else(|| {
            spawn_failed(io::Error::new(
                io::ErrorKind::Other,
                "Failed to get process ID",
            ))
        })?;

        let mut child = ManagedChild::new(child, pid);
        let collector = match OutputCollector::start(read) {
            Ok(collector) => collector,
            Err(e) => {
                child.kill_group();
                return Err(spawn_failed(e));
            }
        };

        info!(pid = %pid, command = %spec.command, "Command spawned");
        Ok((child, collector))
    }
}

fn classify(
    spec: &CommandSpec,
    status: ExitStatus,
    output: Vec<u8>,
    elapsed: Duration,
) -> RunResult<CommandOutput> {
    if status.success() {
        return Ok(CommandOutput { output, elapsed });
    }

    let command = spec.command.clone();
    match status.code() {
        Some(EXIT_NOT_FOUND) => Err(RunError::SpawnFailed {
            command,
            source: io::Error::new(io::ErrorKind::NotFound, shell_message(&output)),
            output,
        }),
        Some(EXIT_NOT_EXECUTABLE) => Err(RunError::SpawnFailed {
            command,
            source: io::Error::new(io::ErrorKind::PermissionDenied, shell_message(&output)),
            output,
        }),
        code => Err(RunError::NonZeroExit {
            command,
            code,
            signal: status.signal(),
            output,
        }),
    }
}

fn shell_message(output: &[u8]) -> String {
    let message = String::from_utf8_lossy(output).trim().to_string();
    if message.is_empty() {
        "command could not be executed".to_string()
    } else {
        message
    }
}
