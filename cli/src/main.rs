use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lexmatch::{CorpusIndex, EngineConfig, EnglishLemmatizer, Lemmatizer, SnowballLemmatizer, TextualEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

mod import;

#[derive(Parser)]
#[command(name = "lexmatch")]
#[command(about = "Find the corpus texts that best cover a query", long_about = None)]
struct Cli {
    /// Corpus file of `text;origin` lines, or a directory of such *.csv files
    #[arg(long, global = true, default_value = "./corpus.csv")]
    corpus: PathBuf,
    /// JSON engine configuration (thresholds and stopword ratios)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = LemmatizerKind::English)]
    lemmatizer: LemmatizerKind,
    /// Snowball language, used with `--lemmatizer snowball`
    #[arg(long, global = true, default_value = "english")]
    language: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LemmatizerKind {
    English,
    Snowball,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the single best match
    Best {
        query: String,
        /// Scan the whole corpus instead of stopping at the first good match
        #[arg(long, default_value_t = false)]
        exhaustive: bool,
    },
    /// Print every match at or above a quality threshold, best first
    Results {
        query: String,
        #[arg(long, default_value_t = 0.5)]
        better_than: f32,
    },
    /// Print corpus statistics and the stopwords chosen for it
    Stats,
}

#[derive(Serialize)]
struct Stats {
    summary: lexmatch::FillSummary,
    stopwords: Vec<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let entries = import::load_delimited(&cli.corpus)?;
    match cli.lemmatizer {
        LemmatizerKind::English => run(EnglishLemmatizer::new(), config, entries, cli.command),
        LemmatizerKind::Snowball => {
            let lemmatizer = SnowballLemmatizer::for_language(&cli.language)
                .ok_or_else(|| anyhow!("no Snowball stemmer for language `{}`", cli.language))?;
            run(lemmatizer, config, entries, cli.command)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    EngineConfig::from_json_str(&json).with_context(|| format!("loading config {}", path.display()))
}

fn run<L: Lemmatizer + 'static>(
    lemmatizer: L,
    config: EngineConfig,
    entries: Vec<TextualEntry>,
    command: Commands,
) -> Result<()> {
    let engine = Arc::new(CorpusIndex::with_config(lemmatizer, config)?);
    let summary = engine.fill(entries)?.wait()?;
    tracing::info!(groups = summary.groups, stopwords = summary.stopwords, "corpus ready");

    let out = match command {
        Commands::Best { query, exhaustive } => {
            serde_json::to_string_pretty(&engine.best_result(&TextualEntry::new(query), exhaustive)?)?
        }
        Commands::Results { query, better_than } => {
            serde_json::to_string_pretty(&engine.results(better_than, &TextualEntry::new(query))?)?
        }
        Commands::Stats => {
            let mut stopwords: Vec<String> = engine.stopwords()?.into_iter().collect();
            stopwords.sort();
            serde_json::to_string_pretty(&Stats { summary, stopwords })?
        }
    };
    println!("{out}");
    Ok(())
}
