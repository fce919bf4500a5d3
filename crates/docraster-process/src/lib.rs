//! # docraster-process
//!
//! **Purpose**: Bounded execution of external rasterizer commands
//!
//! Runs a shell command line as its own process group, captures stdout and
//! stderr as one interleaved stream, and enforces a wall-clock deadline.
//!
//! ## Features
//!
//! - **Merged Output**: stdout and stderr share one pipe, drained concurrently
//!   so a chatty child can never block on a full pipe buffer
//! - **Timeouts**: the deadline races process exit; on expiry the whole
//!   process group receives SIGKILL and the leader is reaped
//! - **Timeout Cleanup**: an optional callback runs only on the timeout path,
//!   e.g. to delete truncated output files
//! - **Typed Outcomes**: `TimedOut`, `NonZeroExit` and `SpawnFailed` all carry
//!   the captured output
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use docraster_process::{CommandSpec, ProcessRunner};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = ProcessRunner::new();
//! let spec = CommandSpec::new("pdftocairo -png -f 1 -l 3 in.pdf out/in");
//!
//! runner
//!     .run_with_cleanup(&spec, Duration::from_secs(120), || {
//!         // remove partial out/in-*.png files
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
#[cfg(unix)]
pub mod child;
#[cfg(unix)]
mod output;
#[cfg(unix)]
pub mod runner;

pub use config::{CommandSpec, RunnerConfig};
pub use error::{RunError, RunResult};
#[cfg(unix)]
pub use child::ManagedChild;
#[cfg(unix)]
pub use runner::{CommandOutput, ProcessRunner};
