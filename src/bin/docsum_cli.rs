use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use docsum::{
    config, logging,
    extraction::{Document, ExtractionError},
    processing::{LengthTier, PipelineError, PipelineResult, SummaryPipeline},
};

#[derive(Parser)]
#[command(
    name = "docsum-cli",
    about = "Summarize a PDF, DOCX, text, or video file from the command line"
)]
struct Cli {
    /// File to summarize.
    file: PathBuf,
    /// Target summary length.
    #[arg(long, value_enum, default_value_t = Length::Medium)]
    length: Length,
    /// Write the result to this path instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Length {
    Short,
    Medium,
    Long,
}

impl From<Length> for LengthTier {
    fn from(length: Length) -> Self {
        match length {
            Length::Short => LengthTier::Short,
            Length::Medium => LengthTier::Medium,
            Length::Long => LengthTier::Long,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() {
    logging::init_cli_tracing();
    if let Err(err) = run(Cli::parse()).await {
        match err.downcast_ref::<PipelineError>() {
            Some(pipeline_error) => {
                eprintln!("error[{}]: {pipeline_error}", pipeline_error.kind());
            }
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::init_config().context("failed to load configuration")?;
    let document = read_document(&cli.file).await?;
    let pipeline = SummaryPipeline::from_config(config)?;

    let result = pipeline.summarize(document, cli.length.into()).await?;
    let rendered = render(&result, cli.format)?;

    match &cli.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write summary to {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

async fn read_document(path: &Path) -> Result<Document, PipelineError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::NoFileProvided);
        }
        Err(error) => return Err(ExtractionError::Io(error).into()),
    };
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    Document::from_named_bytes(filename, bytes)
}

fn render(result: &PipelineResult, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(result).context("failed to serialize result")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => format!("{}\n", result.final_summary),
    })
}
