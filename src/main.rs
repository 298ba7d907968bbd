use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use annoline::lines::{LineConfig, DEFAULT_HEADER_MARGIN_CM, DEFAULT_MARGIN_FRACTION};
use annoline::parser::PdfReader;
use annoline::pipeline::{inspect_document, run, LineSourceSummary, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "annoline")]
#[command(version, about = "Turn PDF markup annotations into a line-numbered review report", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the annotation report for a PDF file
    Extract {
        /// Input PDF file path
        input: PathBuf,

        /// Report path (default: <input_dir>/<input_name>_annotations.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        lines: LineArgs,

        /// Do not print the output path
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show per-page line sources and annotation counts
    Inspect {
        /// Input PDF file path
        input: PathBuf,

        #[command(flatten)]
        lines: LineArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct LineArgs {
    /// Height of the running header band, in centimetres
    #[arg(long, default_value_t = DEFAULT_HEADER_MARGIN_CM)]
    header_margin_cm: f64,

    /// Share of the page width searched for printed line numbers
    #[arg(long = "margin-frac", default_value_t = DEFAULT_MARGIN_FRACTION)]
    margin_fraction: f64,
}

impl From<&LineArgs> for LineConfig {
    fn from(args: &LineArgs) -> Self {
        LineConfig::new(args.header_margin_cm, args.margin_fraction)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            input,
            output,
            lines,
            quiet,
        } => extract(input, output, (&lines).into(), quiet),
        Commands::Inspect { input, lines, json } => inspect(input, (&lines).into(), json),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn extract(input: PathBuf, output: Option<PathBuf>, lines: LineConfig, quiet: bool) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("PDF file not found: {}", input.display());
    }

    let config = PipelineConfig::new(input.clone(), output, lines);
    run(&config).with_context(|| format!("Failed to process PDF: {}", input.display()))?;

    if !quiet {
        println!("Annotations extracted to: {}", config.output.display());
    }
    Ok(())
}

fn inspect(input: PathBuf, lines: LineConfig, json: bool) -> Result<()> {
    lines.validate()?;
    let reader = PdfReader::open(&input)?;
    let summaries = inspect_document(&reader, &lines)
        .with_context(|| format!("Failed to inspect PDF: {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("File: {}", reader.path().display());
    println!("Pages: {}", summaries.len());
    for page in &summaries {
        let source = match &page.line_source {
            LineSourceSummary::Margin {
                count,
                first: Some(first),
                last: Some(last),
            } => format!("margin numbers ({count}, {first}-{last})"),
            LineSourceSummary::Margin { count, .. } => format!("margin numbers ({count})"),
            LineSourceSummary::Body { count } => format!("body lines ({count})"),
        };
        println!(
            "  page {}: {}, {} markup, {} other",
            page.page_number, source, page.markup_annotations, page.other_annotations
        );
    }
    Ok(())
}
