//! CLI para NER em lote sobre arquivos `.plain`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ner_batch_core::aggregate::split_paragraphs;
use ner_batch_core::batch::{discover_inputs, run_batch};
use ner_batch_core::config::{Config, ExecutionStrategy, RecognizerConfig};
use ner_batch_core::highlight::highlight_file;
use ner_batch_core::{EngineKind, Invocation, LabelScheme, SplitterKind};

#[derive(Parser)]
#[command(name = "ner-batch")]
#[command(about = "Batch named-entity recognition over .plain files", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./ner-batch.toml when present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (debug level logging)
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the active recognizer over every .plain file under the given directories
    Run(RunArgs),

    /// Print the sentences of every .plain file and byte/sentence counts
    Split(SplitArgs),

    /// Render a .plain file with one or more result files as HTML
    Highlight(HighlightArgs),

    /// List built-in and configured recognizers
    Recognizers,
}

#[derive(Args)]
struct RunArgs {
    /// Recognizer name (overrides the config file)
    #[arg(long, short)]
    recognizer: Option<String>,

    /// Process documents one at a time, in discovery order
    #[arg(long, conflicts_with = "workers")]
    sequential: bool,

    /// Worker threads for the pool
    #[arg(long, short)]
    workers: Option<usize>,

    /// Engine override: rules, crf or hybrid
    #[arg(long)]
    engine: Option<EngineKind>,

    /// Label scheme override: conll or ontonotes
    #[arg(long)]
    scheme: Option<LabelScheme>,

    /// Sentence splitter override: segtok, unicode or paragraph
    #[arg(long)]
    splitter: Option<SplitterKind>,

    /// Invocation override: per-sentence or batched
    #[arg(long)]
    invocation: Option<Invocation>,

    /// Labels to keep, comma separated (replaces the recognizer's allow-list)
    #[arg(long, value_delimiter = ',')]
    allow: Option<Vec<String>>,

    /// Directories to scan recursively
    #[arg(required = true)]
    dirs: Vec<PathBuf>,
}

#[derive(Args)]
struct SplitArgs {
    /// Sentence splitter: segtok, unicode or paragraph
    #[arg(long, short, default_value = "segtok")]
    splitter: SplitterKind,

    #[arg(required = true)]
    dirs: Vec<PathBuf>,
}

#[derive(Args)]
struct HighlightArgs {
    /// The .plain file
    plain: PathBuf,

    /// Result JSON files, numbered 1.. in the output
    #[arg(required = true)]
    results: Vec<PathBuf>,
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = Config::discover(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run(args) => run(&config, args),
        Commands::Split(args) => split(args),
        Commands::Highlight(args) => {
            let html = highlight_file(&args.plain, args.results.as_slice())
                .with_context(|| format!("Failed to highlight {}", args.plain.display()))?;
            println!("{}", html.display());
            Ok(())
        }
        Commands::Recognizers => list_recognizers(&config),
    }
}

fn run(config: &Config, args: RunArgs) -> Result<()> {
    let name = args.recognizer.as_deref().unwrap_or(config.active_recognizer());
    let overrides = RecognizerConfig {
        engine: args.engine,
        scheme: args.scheme,
        splitter: args.splitter,
        invocation: args.invocation,
        allow: args.allow,
    };
    let descriptor = config.descriptor_with(name, &overrides)?;

    let strategy = match (args.sequential, args.workers) {
        (true, _) => ExecutionStrategy::Sequential,
        (false, Some(0)) => bail!("--workers must be at least 1"),
        (false, Some(workers)) => ExecutionStrategy::Pooled { workers },
        (false, None) => config.strategy(),
    };
    debug!(recognizer = %descriptor.name, ?strategy, "resolved run settings");

    let report = run_batch(&descriptor, strategy, args.dirs.as_slice())
        .with_context(|| format!("Batch with recognizer {} failed", descriptor.name))?;

    println!(
        "{} files, {} paragraphs, {} sentences, {} matches, {} bytes in {:.2?}",
        report.files, report.paragraphs, report.sentences, report.matches, report.bytes, report.elapsed
    );
    Ok(())
}

fn split(args: SplitArgs) -> Result<()> {
    let mut total_bytes = 0;
    let mut total_sentences = 0;

    for path in discover_inputs(args.dirs.as_slice()) {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let paragraphs = split_paragraphs(&text);
        let mut sentences = 0;
        for paragraph in &paragraphs {
            for sentence in args.splitter.split(paragraph) {
                println!("{}", sentence.text);
                sentences += 1;
            }
        }

        println!(
            "{} bytes, {} paragraphs, {} sentences in {}",
            text.len(),
            paragraphs.len(),
            sentences,
            path.display()
        );
        total_bytes += text.len();
        total_sentences += sentences;
    }

    println!("{total_bytes} total bytes, {total_sentences} total sentences");
    Ok(())
}

fn list_recognizers(config: &Config) -> Result<()> {
    let active = config.active_recognizer();
    for d in config.descriptors()? {
        let marker = if d.name == active { "*" } else { " " };
        println!(
            "{marker} {:<10} engine={:<7} scheme={:<10} splitter={:<10} invocation={:<13} allow={}",
            d.name,
            d.engine.name(),
            d.scheme.name(),
            d.options.splitter.name(),
            d.options.invocation.name(),
            d.options.allow
        );
    }
    Ok(())
}
