//! Error types for command execution

use std::borrow::Cow;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failed command outcomes.
///
/// Every variant that got as far as running the command carries the combined
/// stdout/stderr captured up to that point.
#[derive(Debug, Error)]
pub enum RunError {
    /// The command could not be started, or the shell could not find or
    /// execute it (exit status 127 / 126)
    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
        /// What the shell printed; empty when the shell itself never started
        output: Vec<u8>,
    },

    /// The deadline elapsed and the process group was killed
    #[error("Timed out after {:.1}s when running `{command}`", .elapsed.as_secs_f64())]
    TimedOut {
        command: String,
        elapsed: Duration,
        output: Vec<u8>,
    },

    /// The command finished with a non-zero status or was killed by a signal
    #[error("Unexpected exit {} when running `{command}`", describe_exit(.code, .signal))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        signal: Option<i32>,
        output: Vec<u8>,
    },

    /// Waiting on a running child failed
    #[error("Failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
        output: Vec<u8>,
    },
}

impl RunError {
    /// Output captured before the failure
    pub fn output(&self) -> &[u8] {
        match self {
            RunError::SpawnFailed { output, .. }
            | RunError::TimedOut { output, .. }
            | RunError::NonZeroExit { output, .. }
            | RunError::Wait { output, .. } => output,
        }
    }

    /// Captured output decoded lossily as UTF-8
    pub fn output_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.output())
    }

    /// Whether the command was killed for exceeding its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::TimedOut { .. })
    }

    /// The command line this error refers to
    pub fn command(&self) -> &str {
        match self {
            RunError::SpawnFailed { command, .. }
            | RunError::TimedOut { command, .. }
            | RunError::NonZeroExit { command, .. }
            | RunError::Wait { command, .. } => command,
        }
    }
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (*code, *signal) {
        (Some(code), _) => format!("code {}", code),
        (None, Some(signal)) => format!("by signal {}", signal),
        (None, None) => "with unknown status".to_string(),
    }
}

/// Result type for command execution
pub type RunResult<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = RunError::NonZeroExit {
            command: "false".into(),
            code: Some(1),
            signal: None,
            output: b"boom".to_vec(),
        };
        assert_eq!(err.to_string(), "Unexpected exit code 1 when running `false`");
        assert_eq!(err.output_text(), "boom");
        assert!(!err.is_timeout());

        let err = RunError::TimedOut {
            command: "sleep 9".into(),
            elapsed: Duration::from_millis(1500),
            output: Vec::new(),
        };
        assert_eq!(err.to_string(), "Timed out after 1.5s when running `sleep 9`");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_signal_exit_message() {
        let err = RunError::NonZeroExit {
            command: "kill -9 $$".into(),
            code: None,
            signal: Some(9),
            output: Vec::new(),
        };
        assert!(err.to_string().contains("by signal 9"));
    }

    #[test]
    fn test_spawn_failure_has_no_output() {
        let err = RunError::SpawnFailed {
            command: "nope".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            output: Vec::new(),
        };
        assert!(err.output().is_empty());
        assert_eq!(err.command(), "nope");
    }
}
