//! CLI tool for extracting text, speaker notes, and comments from PowerPoint
//! files into DOCX, Markdown, or RTF.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use xtract_core::{AssemblerConfig, Error, TextAssembler};
use xtract_pptx::PptxParser;
use xtract_writer::{OutputFormat, OutputLibrary, OutputWriter, WriterConfig};

/// Extract slide text, speaker notes, and comments from a PowerPoint file.
#[derive(Parser, Debug)]
#[command(name = "ppt-xtract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input_file: PathBuf,

    /// Output format: docx, md, or rtf
    #[arg(value_name = "FORMAT", default_value = "docx", value_parser = OutputFormat::from_str)]
    output_format: OutputFormat,

    /// Leave reviewer comments out of the output
    #[arg(long)]
    no_comments: bool,

    /// Library used to write the output
    #[arg(long, value_enum, default_value = "auto")]
    output_lib: LibraryArg,

    /// Wrap Markdown lines at WIDTH characters (0 = no wrapping)
    #[arg(long, value_name = "WIDTH", default_value = "0")]
    wrap_text: usize,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LibraryArg {
    Auto,
    Pandoc,
    Native,
}

impl From<LibraryArg> for OutputLibrary {
    fn from(arg: LibraryArg) -> Self {
        match arg {
            LibraryArg::Auto => OutputLibrary::Auto,
            LibraryArg::Pandoc => OutputLibrary::Pandoc,
            LibraryArg::Native => OutputLibrary::Native,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let output_path =
        run(&args).with_context(|| format!("Failed to process {}", args.input_file.display()))?;
    println!("Saved to {}", output_path.display());

    Ok(())
}

/// Run the whole pipeline for one input file. Returns the written path.
fn run(args: &Args) -> Result<PathBuf> {
    let input_path = &args.input_file;
    if !input_path.is_file() {
        return Err(Error::InputNotFound(input_path.clone()).into());
    }

    let config = WriterConfig::new(args.output_format)
        .with_library(args.output_lib.into())
        .with_wrap_width(args.wrap_text);

    // Probe once, before any work, so a forced but missing pandoc fails fast.
    let writer = OutputWriter::select(&config)?;
    log::info!("Writing {} with the {} writer", config.format, writer.name());

    let file = File::open(input_path).map_err(|e| {
        log::debug!("Cannot open {}: {}", input_path.display(), e);
        Error::InputNotFound(input_path.clone())
    })?;
    let reader = BufReader::new(file);

    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let include_comments = !args.no_comments;
    let presentation = PptxParser::new().parse(reader, filename, include_comments)?;
    log::info!("Read {} slides from {}", presentation.slides.len(), filename);

    let assembler = TextAssembler::new(AssemblerConfig::default().with_include_comments(include_comments));
    let document = assembler.assemble(&presentation);

    let output_path = get_output_path(input_path, args.output.as_deref(), config.format)?;
    writer.write(&document, &config, &output_path)?;

    Ok(output_path)
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&Path>, format: OutputFormat) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.{}", stem, format.extension());

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| Error::WriteFailure {
                path: dir.to_path_buf(),
                source,
            })?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}
