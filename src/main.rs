use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use docrev::clean::clean_document;
use docrev::config::{self, DocrevConfig, MarginsConfig};
use docrev::docx::Package;
use docrev::extract::{extract_paragraphs, unit_texts};
use docrev::output::{atomic_write, default_output_path};
use docrev::reconstruct::reconstruct;
use docrev::revise::{
    ChatCompletionsBackend, Dispatcher, Progress, ProgressObserver, RevisionClient,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Characters of each paragraph shown by `extract`.
const PREVIEW_CHARS: usize = 120;

#[derive(Parser)]
#[command(name = "docrev")]
#[command(about = "Paragraph-level revision and formatting of Word documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the paragraphs that would be sent for revision
    Extract {
        /// Input .docx file
        input: PathBuf,
    },

    /// Revise every paragraph and write a document of tracked-style diffs
    Revise(ReviseArgs),

    /// Normalize page layout, fonts and punctuation
    Clean(CleanArgs),
}

#[derive(Args)]
struct ReviseArgs {
    /// Input .docx file
    input: PathBuf,

    /// Output path (default: <input>_revised.docx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// API key for the revision service
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Chat-completions endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Maximum concurrent requests
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: $DOCREV_CONFIG, ./docrev.toml, ~/.docrev.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args)]
struct CleanArgs {
    /// Input .docx file
    input: PathBuf,

    /// Output path (default: <input>_cleaned.docx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page size: A4, A5, B5 or Letter
    #[arg(long)]
    page_size: Option<String>,

    /// Margins in cm as TOP,BOTTOM,LEFT,RIGHT
    #[arg(long, value_parser = parse_margins)]
    margins: Option<MarginsConfig>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Font family applied to Latin and East Asian text
    #[arg(long)]
    font_name: Option<String>,

    /// Exact line spacing in points
    #[arg(long)]
    line_spacing: Option<f32>,

    /// First-line indent in points
    #[arg(long)]
    indent: Option<f32>,

    /// Font color as RRGGBB
    #[arg(long)]
    color: Option<String>,

    /// Config file (default: $DOCREV_CONFIG, ./docrev.toml, ~/.docrev.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract { input } => cmd_extract(&input),
        Commands::Revise(args) => cmd_revise(args),
        Commands::Clean(args) => cmd_clean(args),
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn parse_margins(value: &str) -> Result<MarginsConfig, String> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid margin value: {e}"))?;
    match parts[..] {
        [top, bottom, left, right] => Ok(MarginsConfig {
            top,
            bottom,
            left,
            right,
        }),
        _ => Err(format!(
            "expected 4 comma-separated values (TOP,BOTTOM,LEFT,RIGHT), got {}",
            parts.len()
        )),
    }
}

fn open_package(path: &Path) -> Result<Package> {
    Package::open(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<DocrevConfig> {
    Ok(config::load(path)?)
}

/// Re-check a config after command-line overrides.
fn validated(config: DocrevConfig) -> Result<DocrevConfig> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid options:\n{e}"))?;
    Ok(config)
}

fn cmd_extract(input: &Path) -> Result<()> {
    let package = open_package(input)?;
    let units = extract_paragraphs(&package)?;

    for unit in &units {
        let mut preview: String = unit.text.chars().take(PREVIEW_CHARS).collect();
        if unit.text.chars().count() > PREVIEW_CHARS {
            preview.push('…');
        }
        println!("{} {}", format!("[{}]", unit.index + 1).dimmed(), preview);
    }

    println!();
    println!("{} {} paragraphs", "✓".green(), units.len());
    Ok(())
}

fn cmd_revise(args: ReviseArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let revision = &mut config.revision;
    if let Some(endpoint) = args.endpoint {
        revision.endpoint = endpoint;
    }
    if let Some(model) = args.model {
        revision.model = model;
    }
    if let Some(workers) = args.workers {
        revision.workers = workers;
    }
    if let Some(timeout) = args.timeout {
        revision.timeout_secs = timeout;
    }
    let config = validated(config)?;

    let package = open_package(&args.input)?;
    let units = extract_paragraphs(&package)?;
    if units.is_empty() {
        println!("{}", "No non-empty paragraphs found".yellow());
    }

    let backend = ChatCompletionsBackend::new(args.api_key, config.revision.service_settings())
        .context("failed to set up the HTTP client")?;
    let client = RevisionClient::new(backend);

    let reporter = ProgressReporter::new(units.len(), args.no_progress);
    let table = Dispatcher::new(&client, config.revision.workers).dispatch(&units, &reporter);
    reporter.finish();

    let originals = unit_texts(&units);
    let reconstruction = reconstruct(
        &originals,
        table.into_inner(),
        &config.output.reconstruct_options(),
    );
    let changed = reconstruction.changed.len();
    let bytes = reconstruction
        .document
        .into_bytes()
        .context("failed to build the revised document")?;

    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, "revised"));
    atomic_write(&output, &bytes)?;

    println!(
        "{} {}: {} of {} paragraphs changed",
        "✓".green(),
        output.display(),
        changed,
        units.len()
    );
    let failures = client.failure_count();
    if failures > 0 {
        eprintln!(
            "{} {} paragraphs kept their original text after service errors (run with -v for details)",
            "⚠".yellow(),
            failures
        );
    }
    Ok(())
}

fn cmd_clean(args: CleanArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    let clean = &mut config.clean;
    if let Some(page_size) = args.page_size {
        clean.page_size = page_size;
    }
    if let Some(margins) = args.margins {
        clean.margins = margins;
    }
    if let Some(font_size) = args.font_size {
        clean.font_size = font_size;
    }
    if let Some(font_name) = args.font_name {
        clean.font_name = font_name;
    }
    if let Some(line_spacing) = args.line_spacing {
        clean.line_spacing = line_spacing;
    }
    if let Some(indent) = args.indent {
        clean.indent = indent;
    }
    if let Some(color) = args.color {
        clean.color = color;
    }
    let config = validated(config)?;
    let profile = config.clean.profile();

    let mut package = open_package(&args.input)?;
    let report = clean_document(&mut package, &profile)?;
    let bytes = package
        .to_bytes()
        .context("failed to build the cleaned document")?;

    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, "cleaned"));
    atomic_write(&output, &bytes)?;

    println!(
        "{} {}: {} paragraphs formatted, {} empty paragraphs removed",
        "✓".green(),
        output.display(),
        report.paragraphs_formatted,
        report.empty_paragraphs_removed
    );
    Ok(())
}

/// Progress bar fed from the dispatcher's worker threads.
struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    fn new(total: usize, hidden: bool) -> Self {
        if hidden || total == 0 {
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} paragraphs {msg}")
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
        }
    }

    fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("done");
        }
    }
}

impl ProgressObserver for ProgressReporter {
    fn on_unit_complete(&self, progress: Progress) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(format!("(#{})", progress.index + 1));
            pb.set_position(progress.completed as u64);
        }
    }
}
