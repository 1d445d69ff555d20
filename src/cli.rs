//! Command-line interface definitions and the run confirmation prompt.
//!
//! All tuning knobs can be given as flags; the seed file and output file are
//! positional and default to the `data/` layout the dataset is kept in.

use crate::config::{
    CrawlSettings, DEFAULT_DELAY_MS, DEFAULT_MAX_DEPTH, DEFAULT_MIN_WORDS, DEFAULT_TIMEOUT_SECS,
};
use crate::utils::estimate_minutes;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the corpus crawler.
///
/// # Examples
///
/// ```sh
/// # Defaults: data/input.txt -> data/vietnamese_dataset_full.jsonl
/// vn_news_corpus
///
/// # Custom paths, no prompt, two categories only
/// vn_news_corpus seeds.txt out.jsonl --yes --max-categories 2
///
/// # Alternative site profile
/// vn_news_corpus seeds.txt out.jsonl --config config/vnexpress.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Seed file with one category URL per line
    #[arg(default_value = "data/input.txt")]
    pub input: PathBuf,

    /// JSON Lines file accepted articles are appended to
    #[arg(default_value = "data/vietnamese_dataset_full.jsonl")]
    pub output: PathBuf,

    /// Optional path to a site profile YAML file
    #[arg(short, long, env = "VN_CORPUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Navigation depth explored from each seed page
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: i32,

    /// Only use the first N seed URLs
    #[arg(long)]
    pub max_categories: Option<usize>,

    /// Minimum pause between requests, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Minimum words (title + content) for an article to be kept
    #[arg(long, default_value_t = DEFAULT_MIN_WORDS)]
    pub min_words: usize,

    /// Do not harvest links embedded in article bodies
    #[arg(long)]
    pub no_expand: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl Cli {
    pub fn settings(&self) -> CrawlSettings {
        CrawlSettings {
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            max_depth: self.max_depth,
            max_categories: self.max_categories,
            expand_internal_links: !self.no_expand,
            min_words: self.min_words,
        }
    }
}

/// Show the run estimate and ask whether to proceed. Only `y` (any case)
/// confirms.
pub fn confirm(categories: usize, mut input: impl BufRead, mut out: impl Write) -> io::Result<bool> {
    writeln!(out, "Vietnamese text dataset scraper")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "Categories to process: {categories}")?;
    writeln!(out, "Estimated time: ~{:.1} minutes", estimate_minutes(categories))?;
    writeln!(out)?;
    write!(out, "Do you want to proceed with full scraping? (y/N): ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
