use crate::assembler::DocumentAssembler;
use crate::serializer::{serialize, write_to_file, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

/// How many levels of module subdirectories are followed from the source root
pub const DEPENDENCY_DEPTH: usize = 2;

/// AsyncAPI Generator - Generate an AsyncAPI document from annotated Rust sources
#[derive(Parser, Debug)]
#[command(name = "asyncapi-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory holding the annotated sources
    #[arg(short = 'd', long = "dir", value_name = "DIR", default_value = ".")]
    pub source_dir: PathBuf,

    /// Output file; a `.json` extension selects JSON, anything else YAML
    #[arg(
        short = 'o',
        long = "out",
        value_name = "FILE",
        default_value = "docs/asyncapi.yaml"
    )]
    pub output_path: PathBuf,
}

impl CliArgs {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_path(&self.output_path)
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source_dir.exists() {
        anyhow::bail!(
            "Source directory does not exist: {}",
            args.source_dir.display()
        );
    }

    if !args.source_dir.is_dir() {
        anyhow::bail!(
            "Source path is not a directory: {}",
            args.source_dir.display()
        );
    }

    info!("Source directory: {}", args.source_dir.display());
    info!("Output file: {}", args.output_path.display());
    info!("Output format: {:?}", args.output_format());

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting AsyncAPI document generation...");

    let mut assembler = DocumentAssembler::new();
    assembler
        .extract(&args.source_dir, DEPENDENCY_DEPTH)
        .with_context(|| format!("Failed to scan {}", args.source_dir.display()))?;

    info!("Resolving referenced types...");
    let document = assembler.finish();

    let format = args.output_format();
    info!("Serializing to {:?} format...", format);
    let content = serialize(&document, format)?;

    info!("Writing output to: {}", args.output_path.display());
    write_to_file(&content, &args.output_path)?;

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Channels: {}", document.channels.len());
    info!("  - Messages: {}", document.components.messages.len());
    info!("  - Schemas: {}", document.components.schemas.len());

    Ok(())
}
