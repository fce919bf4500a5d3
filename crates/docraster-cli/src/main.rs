use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use docraster_extract::{Engine, ExtractConfig, ExtractRequest, PageExtractor};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docraster")]
#[command(about = "Extract page images from PDF documents with pdftocairo or GraphicsMagick")]
struct Cli {
    /// Rasterizer: poppler or gm
    #[arg(short, long, default_value = "poppler")]
    engine: Engine,

    /// Image format
    #[arg(short, long, default_value = "png")]
    format: String,

    /// Pages to extract, e.g. "1-3,7" (default: all)
    #[arg(short, long)]
    pages: Option<String>,

    /// Resolution in DPI
    #[arg(short, long)]
    density: Option<u32>,

    /// Seconds each rasterizer run may take
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Configuration file (default: ~/.docraster/config.yaml then config/docraster.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// PDF documents
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ExtractConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
                ExtractConfig::from_file(path)
                    .with_context(|| format!("loading {}", path.display()))?
            }
            None => ExtractConfig::load_with_hierarchy()?,
        };

        if let Some(density) = self.density {
            config.density = density;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    fn request(&self, pdf: &Path) -> ExtractRequest {
        let mut request = ExtractRequest::new(pdf, &self.output)
            .format(&self.format)
            .engine(self.engine);
        if let Some(ref pages) = self.pages {
            request = request.pages(pages);
        }
        request
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let extractor = PageExtractor::new(config);

    let mut failed = 0;
    for pdf in &cli.pdfs {
        match extractor.extract(&cli.request(pdf)).await {
            Ok(records) => {
                let elapsed: f64 = records.iter().map(|r| r.elapsed.as_secs_f64()).sum();
                info!(pdf = %pdf.display(), runs = records.len(), "Extraction complete");
                println!("{}: {} run(s) in {:.1}s", pdf.display(), records.len(), elapsed);
            }
            Err(e) => {
                failed += 1;
                match e.tool_output() {
                    Some(output) => error!(pdf = %pdf.display(), error = %e, output = %output, "Extraction failed"),
                    None => error!(pdf = %pdf.display(), error = %e, "Extraction failed"),
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} document(s) failed", failed, cli.pdfs.len());
    }
    Ok(())
}
