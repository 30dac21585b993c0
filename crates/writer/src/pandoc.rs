//! Conversion through an installed `pandoc`.

use crate::OutputFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use xtract_core::{Error, Result};

/// Program name looked up on `PATH`.
pub const PANDOC: &str = "pandoc";

/// Markdown dialect handed to pandoc. Single newlines inside a block are
/// line breaks in the source slides.
const INPUT_FORMAT: &str = "markdown+hard_line_breaks";

/// A pandoc executable that answered `--version`.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    version: String,
}

impl PandocConverter {
    /// Probe `PATH` for pandoc.
    pub fn detect() -> Option<Self> {
        Self::detect_program(PANDOC)
    }

    /// Probe a specific program. Returns `None` if it cannot be run or
    /// exits unsuccessfully.
    pub fn detect_program(program: impl Into<PathBuf>) -> Option<Self> {
        let program = program.into();
        let output = match Command::new(&program)
            .arg("--version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                log::debug!("{} not available: {}", program.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            log::debug!("{} --version exited with {}", program.display(), output.status);
            return None;
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or(PANDOC)
            .trim()
            .to_string();
        log::debug!("Found {}", version);

        Some(Self { program, version })
    }

    #[cfg(test)]
    pub(crate) fn with_program(program: impl Into<PathBuf>, version: &str) -> Self {
        Self {
            program: program.into(),
            version: version.to_string(),
        }
    }

    /// First line of `pandoc --version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Convert Markdown to `format`, writing `output`.
    pub fn convert(&self, markdown: &str, format: OutputFormat, output: &Path) -> Result<()> {
        log::debug!("Converting with {} to {}", self.version, format.pandoc_name());

        let mut child = Command::new(&self.program)
            .args(["-f", INPUT_FORMAT, "-t", format.pandoc_name(), "--standalone", "-o"])
            .arg(output)
            .env("SOURCE_DATE_EPOCH", "0")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ExternalToolFailed(format!("failed to start {}: {}", self.program.display(), e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(markdown.as_bytes())
                .map_err(|e| Error::ExternalToolFailed(format!("failed to send input to pandoc: {}", e)))?;
        }

        let result = child.wait_with_output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::ExternalToolFailed(format!(
                "pandoc exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
