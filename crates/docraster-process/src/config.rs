//! Command and runner configuration

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default shell used to interpret command strings
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// How long the reader may keep draining after the process is gone
const DEFAULT_DRAIN_GRACE_MS: u64 = 500;

/// How long to wait for a killed group leader to be reaped
const DEFAULT_REAP_GRACE_MS: u64 = 1000;

/// A shell command line plus the context it runs in.
///
/// The command string is handed to the shell verbatim. Quoting arguments is
/// the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Shell-executable command line
    pub command: String,
    /// Environment variables (added to parent env)
    pub env: BTreeMap<String, String>,
    /// Working directory (None = current dir)
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create new command spec
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: BTreeMap::new(),
            working_dir: None,
        }
    }

    /// Add environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        f.write_str(&self.command)
    }
}

/// Runner settings shared by every invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Shell that interprets the command line
    pub shell: PathBuf,
    /// Upper bound on draining output once the process has exited or been killed
    pub drain_grace: Duration,
    /// Upper bound on reaping the group leader after SIGKILL
    pub reap_grace: Duration,
}

impl RunnerConfig {
    /// Create configuration with defaults
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            drain_grace: Duration::from_millis(DEFAULT_DRAIN_GRACE_MS),
            reap_grace: Duration::from_millis(DEFAULT_REAP_GRACE_MS),
        }
    }

    /// Set shell path
    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set drain grace period
    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Set reap grace period
    pub fn reap_grace(mut self, grace: Duration) -> Self {
        self.reap_grace = grace;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("gm convert in.pdf out.png")
            .env("OMP_NUM_THREADS", "2")
            .env("MAGICK_TMPDIR", "/tmp/scratch")
            .working_dir("/tmp");

        assert_eq!(spec.command, "gm convert in.pdf out.png");
        assert_eq!(spec.env.len(), 2);
        assert_eq!(spec.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_command_spec_display_prefixes_env() {
        let spec = CommandSpec::new("echo hi").env("B", "2").env("A", "1");
        assert_eq!(spec.to_string(), "A=1 B=2 echo hi");
    }

    #[test]
    fn test_runner_config_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.shell, PathBuf::from("/bin/sh"));
        assert_eq!(config.drain_grace, Duration::from_millis(500));
        assert_eq!(config.reap_grace, Duration::from_secs(1));
    }
}
