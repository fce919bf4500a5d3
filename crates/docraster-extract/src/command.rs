//! Rasterizer command lines.
//!
//! Builders here only produce strings; nothing is executed. Every path and
//! argument is shell-quoted, so file names with spaces or quotes are safe.

use std::io;
use std::path::{Path, PathBuf};

use docraster_pages::PageRange;
use docraster_process::CommandSpec;
use glob::Pattern;

use crate::error::{ExtractError, ExtractResult};
use crate::shell::{shell_escape, shell_join};

/// Formats `pdftocairo` can write, by switch name.
pub const POPPLER_FORMATS: &[&str] = &["png", "jpeg", "tiff", "ps", "eps", "svg"];

/// GraphicsMagick resource limits applied to every conversion.
const GM_MEMORY_ARGS: &[&str] = &["-limit", "memory", "256MiB", "-limit", "map", "512MiB"];

/// A ready-to-run rasterizer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterCommand {
    /// Command line and environment
    pub spec: CommandSpec,
    /// Directory the tool writes into
    pub directory: PathBuf,
    /// Glob (relative to `directory`) matching the files this run produces
    pub file_pattern: String,
}

/// Map common extension spellings to `pdftocairo` switch names.
pub fn poppler_format(format: &str) -> &str {
    match format {
        "jpg" => "jpeg",
        "tif" => "tiff",
        other => other,
    }
}

/// Check `format` is something `pdftocairo` can produce.
pub fn validate_poppler_format(format: &str) -> ExtractResult<&str> {
    let switch = poppler_format(format);
    if POPPLER_FORMATS.contains(&switch) {
        Ok(switch)
    } else {
        Err(ExtractError::UnsupportedFormat(format.to_string(), "Poppler"))
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn file_base(pdf: &Path) -> String {
    pdf.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Builder for one `pdftocairo` run over a page window.
#[derive(Debug, Clone)]
pub struct PopplerCommand {
    executable: String,
    pdf: PathBuf,
    directory: PathBuf,
    format: String,
    density: Option<u32>,
    pages: PageRange,
}

impl PopplerCommand {
    /// Render `pdf` into `directory` as `format`, all pages, default resolution
    pub fn new(pdf: impl Into<PathBuf>, directory: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            executable: "pdftocairo".to_string(),
            pdf: pdf.into(),
            directory: directory.into(),
            format: format.into(),
            density: None,
            pages: PageRange::All,
        }
    }

    /// Set the executable name or path
    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set resolution in DPI (`-r`)
    pub fn density(mut self, density: u32) -> Self {
        self.density = Some(density);
        self
    }

    /// Restrict to a page window (`-f`/`-l`)
    pub fn pages(mut self, pages: PageRange) -> Self {
        self.pages = pages;
        self
    }

    /// Produce the command line.
    ///
    /// `pdftocairo` names its files `<prefix>-<page>.<ext>`, so the prefix is
    /// the PDF's base name inside `directory`.
    pub fn build(&self) -> ExtractResult<RasterCommand> {
        let switch = validate_poppler_format(&self.format)?;

        let mut tokens = vec![self.executable.clone(), format!("-{}", switch)];

        if let Some(density) = self.density {
            tokens.push("-r".to_string());
            tokens.push(density.to_string());
        }

        if let PageRange::Span { first, last } = self.pages {
            tokens.push("-f".to_string());
            tokens.push(first.to_string());
            tokens.push("-l".to_string());
            tokens.push(last.to_string());
        }

        let pdf = absolute(&self.pdf)?;
        let directory = absolute(&self.directory)?;
        let base = file_base(&pdf);
        let prefix = directory.join(&base);

        tokens.push(pdf.to_string_lossy().into_owned());
        tokens.push(prefix.to_string_lossy().into_owned());

        Ok(RasterCommand {
            spec: CommandSpec::new(shell_join(&tokens)),
            file_pattern: format!("{}-*.{}", Pattern::escape(&base), Pattern::escape(&self.format)),
            directory,
        })
    }
}

/// Builder for one `gm convert` run.
///
/// GraphicsMagick is driven one page at a time, which keeps its memory use
/// flat on large documents.
#[derive(Debug, Clone)]
pub struct GraphicsMagickCommand {
    executable: String,
    pdf: PathBuf,
    directory: PathBuf,
    format: String,
    density: u32,
    threads: u32,
    scratch: Option<PathBuf>,
    page: Option<u32>,
}

impl GraphicsMagickCommand {
    /// Render `pdf` into `directory` as `format`
    pub fn new(pdf: impl Into<PathBuf>, directory: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            executable: "gm".to_string(),
            pdf: pdf.into(),
            directory: directory.into(),
            format: format.into(),
            density: crate::config::DEFAULT_DENSITY,
            threads: 2,
            scratch: None,
            page: None,
        }
    }

    /// Set the executable name or path
    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set resolution in DPI (`-density`)
    pub fn density(mut self, density: u32) -> Self {
        self.density = density;
        self
    }

    /// Set `OMP_NUM_THREADS`
    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Set `MAGICK_TMPDIR`
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = Some(dir.into());
        self
    }

    /// Render only this 1-based page
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Produce the command line.
    ///
    /// A single page is written to `<base>_<page>.<format>`. Without a page
    /// every scene is written with `+adjoin` to `<base>_<n>.<format>`, where
    /// `n` is GraphicsMagick's 0-based scene number.
    pub fn build(&self) -> ExtractResult<RasterCommand> {
        let pdf = absolute(&self.pdf)?;
        let directory = absolute(&self.directory)?;
        let base = file_base(&pdf);
        let pdf = pdf.to_string_lossy().into_owned();

        let (input, output, file_pattern) = match self.page {
            Some(page) if page >= 1 => (
                format!("{}[{}]", pdf, page - 1),
                directory.join(format!("{}_{}.{}", base, page, self.format)),
                format!("{}_{}.{}", Pattern::escape(&base), page, Pattern::escape(&self.format)),
            ),
            _ => (
                pdf,
                directory.join(format!("{}_%d.{}", base, self.format)),
                format!("{}_*.{}", Pattern::escape(&base), Pattern::escape(&self.format)),
            ),
        };

        let mut tokens: Vec<String> = vec![
            self.executable.clone(),
            "convert".into(),
            "+adjoin".into(),
            "-define".into(),
            "pdf:use-cropbox=true".into(),
        ];
        tokens.extend(GM_MEMORY_ARGS.iter().map(|s| s.to_string()));
        tokens.push("-density".into());
        tokens.push(self.density.to_string());
        tokens.push(input);
        tokens.push(output.to_string_lossy().into_owned());

        let mut spec = CommandSpec::new(shell_join(&tokens))
            .env("OMP_NUM_THREADS", self.threads.to_string());
        if let Some(ref scratch) = self.scratch {
            spec = spec.env("MAGICK_TMPDIR", scratch.to_string_lossy());
        }

        Ok(RasterCommand {
            spec,
            directory,
            file_pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poppler_all_pages() {
        let cmd = PopplerCommand::new("/docs/report.pdf", "/out", "png")
            .density(150)
            .build()
            .unwrap();
        assert_eq!(
            cmd.spec.command,
            "pdftocairo -png -r 150 /docs/report.pdf /out/report"
        );
        assert_eq!(cmd.directory, PathBuf::from("/out"));
        assert_eq!(cmd.file_pattern, "report-*.png");
    }

    #[test]
    fn poppler_page_window() {
        let cmd = PopplerCommand::new("/docs/report.pdf", "/out", "jpg")
            .pages(PageRange::Span { first: 3, last: 5 })
            .build()
            .unwrap();
        assert_eq!(
            cmd.spec.command,
            "pdftocairo -jpeg -f 3 -l 5 /docs/report.pdf /out/report"
        );
        assert_eq!(cmd.file_pattern, "report-*.jpg");
    }

    #[test]
    fn poppler_quotes_awkward_names() {
        let cmd = PopplerCommand::new("/docs/Q3 'final'.pdf", "/my out", "tif")
            .executable("/usr/local/bin/pdftocairo")
            .build()
            .unwrap();
        assert_eq!(
            cmd.spec.command,
            "/usr/local/bin/pdftocairo -tiff '/docs/Q3 '\\''final'\\''.pdf' '/my out/Q3 '\\''final'\\'''"
        );
    }

    #[test]
    fn poppler_rejects_unknown_format() {
        let err = PopplerCommand::new("a.pdf", "/out", "gif").build().unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref f, _) if f == "gif"));
        assert_eq!(err.to_string(), "gif is not a supported Poppler format");
    }

    #[test]
    fn format_aliases() {
        assert_eq!(poppler_format("jpg"), "jpeg");
        assert_eq!(poppler_format("tif"), "tiff");
        assert_eq!(poppler_format("svg"), "svg");
    }

    #[test]
    fn relative_paths_become_absolute() {
        let cmd = PopplerCommand::new("in.pdf", "out", "png").build().unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(cmd.directory, cwd.join("out"));
        assert!(cmd.spec.command.contains(&shell_escape(&cwd.join("in.pdf").to_string_lossy())));
    }

    #[test]
    fn glob_characters_in_base_are_escaped() {
        let cmd = PopplerCommand::new("/docs/draft[1].pdf", "/out", "png").build().unwrap();
        assert_eq!(cmd.file_pattern, "draft[[]1[]]-*.png");
    }

    #[test]
    fn gm_single_page() {
        let cmd = GraphicsMagickCommand::new("/docs/report.pdf", "/out", "png")
            .density(200)
            .threads(4)
            .scratch_dir("/tmp/gm-scratch")
            .page(3)
            .build()
            .unwrap();
        assert_eq!(
            cmd.spec.command,
            "gm convert +adjoin -define pdf:use-cropbox=true -limit memory 256MiB \
             -limit map 512MiB -density 200 '/docs/report.pdf[2]' /out/report_3.png"
        );
        assert_eq!(cmd.spec.env.get("OMP_NUM_THREADS").map(String::as_str), Some("4"));
        assert_eq!(
            cmd.spec.env.get("MAGICK_TMPDIR").map(String::as_str),
            Some("/tmp/gm-scratch")
        );
        assert_eq!(cmd.file_pattern, "report_3.png");
    }

    #[test]
    fn gm_every_page() {
        let cmd = GraphicsMagickCommand::new("/docs/report.pdf", "/out", "png").build().unwrap();
        assert!(cmd.spec.command.ends_with("/docs/report.pdf /out/report_%d.png"));
        assert_eq!(cmd.file_pattern, "report_*.png");
        assert!(!cmd.spec.env.contains_key("MAGICK_TMPDIR"));
    }
}
