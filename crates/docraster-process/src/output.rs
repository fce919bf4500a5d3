//! Merged stdout/stderr capture
//!
//! One pipe carries both streams so their relative order survives. A reader
//! task drains it for the whole life of the child; a child that fills the
//! pipe buffer with nobody reading would block forever on write.

use std::io;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const READ_CHUNK: usize = 8192;

/// Write side of the capture pipe, handed to the child as stdout and stderr.
///
/// Both `Stdio` values are dup'd descriptors; the parent's copies close when
/// the command that owns them is dropped.
pub(crate) struct PipeWriter {
    fd: OwnedFd,
}

impl PipeWriter {
    /// Produce the (stdout, stderr) pair pointing at the same pipe
    pub(crate) fn into_stdio(self) -> io::Result<(Stdio, Stdio)> {
        let stderr = self.fd.try_clone()?;
        Ok((Stdio::from(self.fd), Stdio::from(stderr)))
    }
}

/// Create the capture pipe. Both ends are close-on-exec so concurrent
/// spawns never inherit each other's descriptors.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub(crate) fn capture_pipe() -> io::Result<(OwnedFd, PipeWriter)> {
    use nix::fcntl::OFlag;

    let (read, write) = nix::unistd::pipe2(OFlag::O_CLOEXEC).map_err(io::Error::from)?;
    Ok((read, PipeWriter { fd: write }))
}

/// No `pipe2` here; set close-on-exec after the fact.
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
pub(crate) fn capture_pipe() -> io::Result<(OwnedFd, PipeWriter)> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use std::os::fd::AsRawFd;

    let (read, write) = nix::unistd::pipe().map_err(io::Error::from)?;
    for fd in [&read, &write] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(io::Error::from)?;
    }
    Ok((read, PipeWriter { fd: write }))
}

/// Accumulates everything the child writes.
///
/// Dropping the collector aborts the reader task, which closes the read end.
pub(crate) struct OutputCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    reader: JoinHandle<io::Result<()>>,
}

impl OutputCollector {
    /// Start draining the read end. Must be called inside a tokio runtime.
    pub(crate) fn start(read: OwnedFd) -> io::Result<Self> {
        let receiver = pipe::Receiver::from_owned_fd(read)?;
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let reader = tokio::spawn(drain(receiver, Arc::clone(&buffer)));
        Ok(Self { buffer, reader })
    }

    /// Wait up to `grace` for EOF, then hand back whatever was captured.
    ///
    /// EOF only arrives once every holder of the write end is gone. A
    /// background process that escaped the group can keep it open; the grace
    /// period bounds that case.
    pub(crate) async fn finish(mut self, grace: Duration) -> Vec<u8> {
        match tokio::time::timeout(grace, &mut self.reader).await {
            Ok(Ok(Ok(()))) => debug!("Output drained to EOF"),
            Ok(Ok(Err(e))) => warn!(error = %e, "Error reading command output"),
            Ok(Err(e)) => warn!(error = %e, "Output reader task failed"),
            Err(_) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Output pipe still open after grace period, keeping partial output"
                );
            }
        }
        self.take()
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer.lock())
    }
}

impl Drop for OutputCollector {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn drain(mut receiver: pipe::Receiver, buffer: Arc<Mutex<Vec<u8>>>) -> io::Result<()> {
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = receiver.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.lock().extend_from_slice(&chunk[..n]);
    }
}
