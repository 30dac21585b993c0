//! Output writers for assembled presentation text.
//!
//! A [`Document`] is rendered either natively (Markdown, DOCX, RTF written
//! by this crate) or by piping Markdown through `pandoc`. The choice is made
//! once, up front, by [`OutputWriter::select`].

pub mod docx;
pub mod markdown;
pub mod pandoc;
pub mod rtf;
pub mod wrap;

pub use markdown::MarkdownOptions;
pub use pandoc::PandocConverter;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use xtract_core::{Document, Error, Result};

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Word document (Office Open XML).
    #[default]
    Docx,
    /// Markdown text.
    Markdown,
    /// Rich Text Format.
    Rtf,
}

impl OutputFormat {
    /// File extension for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Markdown => "md",
            Self::Rtf => "rtf",
        }
    }

    /// Writer name pandoc uses for this format.
    pub fn pandoc_name(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Markdown => "markdown",
            Self::Rtf => "rtf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "md" | "markdown" => Ok(Self::Markdown),
            "rtf" => Ok(Self::Rtf),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which rendering backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLibrary {
    /// pandoc when installed, native otherwise.
    #[default]
    Auto,
    /// pandoc, failing if it is not installed.
    Pandoc,
    /// Native writers only.
    Native,
}

/// Writer configuration.
#[derive(Debug, Clone, Default)]
pub struct WriterConfig {
    pub format: OutputFormat,
    pub library: OutputLibrary,
    /// Markdown only: wrap lines at this many characters (0 = no wrapping).
    pub wrap_width: usize,
}

impl WriterConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_library(mut self, library: OutputLibrary) -> Self {
        self.library = library;
        self
    }

    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }
}

/// The rendering strategy chosen for a run.
#[derive(Debug, Clone)]
pub enum OutputWriter {
    /// Convert through an installed pandoc.
    Pandoc(PandocConverter),
    /// Render with this crate's own writers.
    Native,
}

impl OutputWriter {
    /// Choose the strategy for `config`, probing for pandoc if needed.
    pub fn select(config: &WriterConfig) -> Result<Self> {
        Self::select_with(config, PandocConverter::detect)
    }

    fn select_with<P>(config: &WriterConfig, probe: P) -> Result<Self>
    where
        P: FnOnce() -> Option<PandocConverter>,
    {
        // pandoc would only turn Markdown into Markdown and ignore the wrap width
        if config.format == OutputFormat::Markdown {
            return Ok(Self::Native);
        }

        match config.library {
            OutputLibrary::Native => Ok(Self::Native),
            OutputLibrary::Auto => Ok(probe().map_or(Self::Native, Self::Pandoc)),
            OutputLibrary::Pandoc => probe()
                .map(Self::Pandoc)
                .ok_or_else(|| Error::ExternalToolUnavailable(pandoc::PANDOC.to_string())),
        }
    }

    /// Short name for log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pandoc(_) => "pandoc",
            Self::Native => "native",
        }
    }

    /// Render `doc` and write it to `path`.
    ///
    /// The document is fully rendered before the destination is touched.
    pub fn write(&self, doc: &Document, config: &WriterConfig, path: &Path) -> Result<()> {
        match self {
            Self::Pandoc(converter) => {
                let options = MarkdownOptions::default().with_inline_escapes(true);
                let source = markdown::render(doc, &options);
                converter.convert(&source, config.format, path)
            }
            Self::Native => {
                let bytes = render_native(doc, config)?;
                std::fs::write(path, bytes).map_err(|source| Error::WriteFailure {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

/// Render `doc` in memory with the native writer for `config.format`.
pub fn render_native(doc: &Document, config: &WriterConfig) -> Result<Vec<u8>> {
    log::debug!("Rendering {} natively", config.format);

    match config.format {
        OutputFormat::Markdown => {
            let options = MarkdownOptions::default().with_wrap_width(config.wrap_width);
            Ok(markdown::render(doc, &options).into_bytes())
        }
        OutputFormat::Docx => docx::render(doc),
        OutputFormat::Rtf => rtf::render(doc),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn fake_pandoc() -> Option<PandocConverter> {
        Some(PandocConverter::with_program("pandoc", "pandoc 3.1"))
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("docx".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("RTF".parse::<OutputFormat>().unwrap(), OutputFormat::Rtf);
        assert!(matches!(
            "pdf".parse::<OutputFormat>(),
            Err(Error::UnsupportedFormat(f)) if f == "pdf"
        ));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Docx.to_string(), "docx");
    }

    #[test]
    fn test_auto_prefers_pandoc() {
        let config = WriterConfig::new(OutputFormat::Docx);
        let writer = OutputWriter::select_with(&config, fake_pandoc).unwrap();
        assert_eq!(writer.name(), "pandoc");
    }

    #[test]
    fn test_auto_falls_back_silently() {
        let config = WriterConfig::new(OutputFormat::Rtf);
        let writer = OutputWriter::select_with(&config, || None).unwrap();
        assert_eq!(writer.name(), "native");
    }

    #[test]
    fn test_forced_pandoc_missing_is_an_error() {
        let config = WriterConfig::new(OutputFormat::Docx).with_library(OutputLibrary::Pandoc);
        let err = OutputWriter::select_with(&config, || None).unwrap_err();
        assert!(matches!(err, Error::ExternalToolUnavailable(_)));
    }

    #[test]
    fn test_native_never_probes() {
        let config = WriterConfig::new(OutputFormat::Docx).with_library(OutputLibrary::Native);
        let writer = OutputWriter::select_with(&config, || panic!("probed")).unwrap();
        assert_eq!(writer.name(), "native");
    }

    #[test]
    fn test_markdown_is_always_native() {
        let config = WriterConfig::new(OutputFormat::Markdown).with_library(OutputLibrary::Pandoc);
        let writer = OutputWriter::select_with(&config, || panic!("probed")).unwrap();
        assert_eq!(writer.name(), "native");
    }

    #[test]
    fn test_render_native_is_deterministic() {
        let doc = testing::sample_document();
        for format in [OutputFormat::Docx, OutputFormat::Markdown, OutputFormat::Rtf] {
            let config = WriterConfig::new(format);
            assert_eq!(
                render_native(&doc, &config).unwrap(),
                render_native(&doc, &config).unwrap()
            );
        }
    }
}
