//! Single-document extraction driver.
//!
//! Composes page windows, command builders and the process runner: one
//! rasterizer run per window (Poppler) or per page (GraphicsMagick).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docraster_pages::{page_windows_for, PageRange};
use docraster_process::ProcessRunner;
use tracing::{debug, info, warn};

use crate::cleanup::remove_partial_outputs;
use crate::command::{validate_poppler_format, GraphicsMagickCommand, PopplerCommand, RasterCommand};
use crate::config::ExtractConfig;
use crate::error::{ExtractError, ExtractResult};

/// Which rasterizer renders the pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Poppler `pdftocairo`, one run per contiguous page window
    #[default]
    Poppler,
    /// GraphicsMagick `gm convert`, one run per page
    GraphicsMagick,
}

impl FromStr for Engine {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "poppler" | "pdftocairo" => Ok(Engine::Poppler),
            "gm" | "graphicsmagick" => Ok(Engine::GraphicsMagick),
            other => Err(ExtractError::Config(format!("unknown engine: {}", other))),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Poppler => f.write_str("poppler"),
            Engine::GraphicsMagick => f.write_str("gm"),
        }
    }
}

/// What to extract from one PDF.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Source document
    pub pdf: PathBuf,
    /// Directory receiving the images
    pub output_dir: PathBuf,
    /// Image format (`png`, `jpg`, ...)
    pub format: String,
    /// Page list such as `"1-3,7"`; `None` renders every page
    pub pages: Option<String>,
    /// Rasterizer to use
    pub engine: Engine,
}

impl ExtractRequest {
    /// Every page of `pdf` as PNG with Poppler
    pub fn new(pdf: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdf: pdf.into(),
            output_dir: output_dir.into(),
            format: "png".to_string(),
            pages: None,
            engine: Engine::default(),
        }
    }

    /// Set image format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set page list
    pub fn pages(mut self, pages: impl Into<String>) -> Self {
        self.pages = Some(pages.into());
        self
    }

    /// Set engine
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }
}

/// One completed rasterizer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    /// Pages this run covered
    pub window: PageRange,
    /// Tool output (usually warnings)
    pub output: String,
    /// Wall-clock duration
    pub elapsed: Duration,
}

/// Drives rasterizer runs for a document.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    runner: ProcessRunner,
    config: ExtractConfig,
}

impl PageExtractor {
    /// Create an extractor from configuration
    pub fn new(config: ExtractConfig) -> Self {
        let runner = ProcessRunner::with_config(config.runner_config());
        Self { runner, config }
    }

    /// Get configuration
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Render the requested pages, stopping at the first failed run.
    ///
    /// A run that times out has its partial files deleted before the error
    /// is returned.
    pub async fn extract(&self, request: &ExtractRequest) -> ExtractResult<Vec<RunRecord>> {
        if request.engine == Engine::Poppler {
            validate_poppler_format(&request.format)?;
        }
        std::fs::create_dir_all(&request.output_dir)?;

        info!(
            pdf = %request.pdf.display(),
            engine = %request.engine,
            format = %request.format,
            pages = request.pages.as_deref().unwrap_or("all"),
            "Extracting page images"
        );

        match request.engine {
            Engine::Poppler => self.extract_poppler(request).await,
            Engine::GraphicsMagick => self.extract_graphicsmagick(request).await,
        }
    }

    async fn extract_poppler(&self, request: &ExtractRequest) -> ExtractResult<Vec<RunRecord>> {
        let mut records = Vec::new();

        for window in page_windows_for(request.pages.as_deref()) {
            let command = PopplerCommand::new(&request.pdf, &request.output_dir, &request.format)
                .executable(&self.config.tools.pdftocairo)
                .density(self.config.density)
                .pages(window)
                .build()?;
            records.push(self.run(window, &command).await?);
        }

        Ok(records)
    }

    async fn extract_graphicsmagick(&self, request: &ExtractRequest) -> ExtractResult<Vec<RunRecord>> {
        let scratch = tempfile::Builder::new().prefix("docraster-gm").tempdir()?;
        let mut records = Vec::new();

        let base = GraphicsMagickCommand::new(&request.pdf, &request.output_dir, &request.format)
            .executable(&self.config.tools.gm)
            .density(self.config.density)
            .threads(self.config.tools.gm_threads)
            .scratch_dir(scratch.path());

        for window in page_windows_for(request.pages.as_deref()) {
            match window {
                PageRange::All => {
                    let command = base.clone().build()?;
                    records.push(self.run(window, &command).await?);
                }
                PageRange::Span { first, last } => {
                    for page in first..=last {
                        let command = base.clone().page(page).build()?;
                        records.push(self.run(PageRange::single(page), &command).await?);
                    }
                }
            }
        }

        debug!(scratch = %scratch.path().display(), "Removing GraphicsMagick scratch directory");
        Ok(records)
    }

    async fn run(&self, window: PageRange, command: &RasterCommand) -> ExtractResult<RunRecord> {
        debug!(pages = %window, command = %command.spec, "Running rasterizer");

        let result = self
            .runner
            .run_with_cleanup(&command.spec, self.config.timeout(), || {
                let removed = remove_partial_outputs(&command.directory, &command.file_pattern);
                warn!(
                    pages = %window,
                    removed,
                    directory = %command.directory.display(),
                    "Removed partial output after timeout"
                );
            })
            .await;

        let output = result?;
        let text = output.text();
        if !text.is_empty() {
            warn!(pages = %window, output = %text, "Rasterizer reported warnings");
        }

        Ok(RunRecord {
            window,
            output: text,
            elapsed: output.elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_parsing() {
        assert_eq!("poppler".parse::<Engine>().unwrap(), Engine::Poppler);
        assert_eq!("GM".parse::<Engine>().unwrap(), Engine::GraphicsMagick);
        assert!("ghostscript".parse::<Engine>().is_err());
        assert_eq!(Engine::GraphicsMagick.to_string(), "gm");
    }

    #[test]
    fn request_builder() {
        let request = ExtractRequest::new("a.pdf", "out")
            .format("jpg")
            .pages("1-2")
            .engine(Engine::GraphicsMagick);
        assert_eq!(request.format, "jpg");
        assert_eq!(request.pages.as_deref(), Some("1-2"));
        assert_eq!(request.engine, Engine::GraphicsMagick);
    }

    #[tokio::test]
    async fn unsupported_format_fails_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PageExtractor::new(ExtractConfig::default());
        let request = ExtractRequest::new("a.pdf", dir.path().join("out")).format("gif");

        let err = extractor.extract(&request).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(..)));
        assert!(!dir.path().join("out").exists());
    }
}
