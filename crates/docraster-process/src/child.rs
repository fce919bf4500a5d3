//! Managed child process wrapper

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Child;
use tracing::{debug, warn};

/// A spawned process group leader.
///
/// The process was started with `process_group(0)`, so its pid doubles as
/// the group id and every descendant that did not call `setsid` shares it.
pub struct ManagedChild {
    /// Underlying tokio child process
    child: Child,
    /// Process ID (and process group ID)
    pid: u32,
}

impl ManagedChild {
    pub(crate) fn new(child: Child, pid: u32) -> Self {
        Self { child, pid }
    }

    /// Get process ID
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Wait for the process to exit. Cancel safe.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// SIGKILL every process in the group.
    ///
    /// `ESRCH` means the group already exited between the deadline and the
    /// signal; that is not an error.
    pub fn kill_group(&mut self) {
        let pgid = Pid::from_raw(self.pid as i32);

        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) => debug!(pid = %self.pid, "Sent SIGKILL to process group"),
            Err(Errno::ESRCH) => {
                debug!(pid = %self.pid, "Process group already gone before SIGKILL");
            }
            Err(e) => {
                warn!(pid = %self.pid, error = %e, "Failed to signal process group, killing leader only");
                if let Err(e) = self.child.start_kill() {
                    warn!(pid = %self.pid, error = %e, "Failed to kill process");
                }
            }
        }
    }

    /// Collect the exit status of a killed leader so no zombie remains.
    ///
    /// If the leader does not go away within `grace` the handle is dropped;
    /// tokio keeps reaping dropped children in the background.
    pub async fn reap(mut self, grace: Duration) -> Option<ExitStatus> {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(pid = %self.pid, status = %status, "Reaped process");
                Some(status)
            }
            Ok(Err(e)) => {
                warn!(pid = %self.pid, error = %e, "Error reaping process");
                None
            }
            Err(_) => {
                warn!(pid = %self.pid, "Process not reaped in time, detaching");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn(script: &str) -> ManagedChild {
        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        ManagedChild::new(child, pid)
    }

    #[tokio::test]
    async fn test_kill_group_then_reap() {
        let mut child = spawn("sleep 10");
        child.kill_group();

        let status = child.reap(Duration::from_secs(5)).await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_kill_group_after_exit_is_tolerated() {
        let mut child = spawn("exit 0");
        let status = child.wait().await.unwrap();
        assert!(status.success());

        // Group is gone; must not panic or error.
        child.kill_group();
        assert!(child.reap(Duration::from_secs(1)).await.is_some());
    }
}
