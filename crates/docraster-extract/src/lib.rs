//! Page image extraction for PDF documents.
//!
//! This crate drives external rasterizers and provides:
//! - Command lines for Poppler `pdftocairo` and GraphicsMagick `gm convert`
//! - Removal of partial output when a run times out
//! - Layered YAML configuration
//! - A driver that renders a page selection one window at a time

pub mod cleanup;
pub mod command;
pub mod config;
pub mod error;
#[cfg(unix)]
pub mod extractor;
pub mod shell;

pub use cleanup::remove_partial_outputs;
pub use command::{
    poppler_format, validate_poppler_format, GraphicsMagickCommand, PopplerCommand,
    RasterCommand, POPPLER_FORMATS,
};
pub use config::{ExtractConfig, RunnerSection, ToolsConfig};
pub use error::{ExtractError, ExtractResult};
#[cfg(unix)]
pub use extractor::{Engine, ExtractRequest, PageExtractor, RunRecord};
pub use shell::{shell_escape, shell_join};
