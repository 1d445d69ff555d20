//! # VN News Corpus
//!
//! A focused crawler that harvests long-form Vietnamese news articles from a
//! single publisher and writes them as a clean, deduplicated JSON Lines
//! corpus for language-model training.
//!
//! ## Usage
//!
//! ```sh
//! vn_news_corpus data/input.txt data/vietnamese_dataset_full.jsonl
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Discovery**: walk category pages from each seed URL, collecting
//!    article links (plus links embedded in article bodies)
//! 2. **Fetching**: download each unique article, one request at a time,
//!    spaced by a politeness delay
//! 3. **Qualification**: extract, normalize and score the text; keep only
//!    Vietnamese articles of at least 200 words
//! 4. **Output**: append each accepted article to the JSON Lines file as soon
//!    as it is accepted
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | run completed (or was interrupted; partial output kept) |
//! | 1 | seed file unreadable, bad site profile, or output not writable |
//! | 2 | user declined the confirmation prompt |

use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod discovery;
mod error;
mod extractor;
mod fetcher;
mod language;
mod models;
mod normalizer;
mod outputs;
mod pipeline;
mod utils;

use cli::{Cli, confirm};
use config::SiteProfile;
use error::FatalError;
use outputs::jsonl::JsonlSink;
use pipeline::Crawler;
use utils::{ensure_parent_dir, read_seed_urls};

const EXIT_FATAL: u8 = 1;
const EXIT_DECLINED: u8 = 2;

/// How a run that hit no fatal error ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Completed,
    Interrupted,
    Declined,
}

impl Outcome {
    fn code(&self) -> u8 {
        match self {
            Outcome::Completed | Outcome::Interrupted => 0,
            Outcome::Declined => EXIT_DECLINED,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match run(args, ask_on_terminal).await {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Interactive confirmation; an unreadable terminal counts as "no".
fn ask_on_terminal(categories: usize) -> bool {
    confirm(categories, std::io::stdin().lock(), std::io::stdout()).unwrap_or(false)
}

/// Execute one crawl.
///
/// # Arguments
///
/// * `args` - Parsed command line
/// * `ask` - Asked with the number of seed categories unless `--yes` was
///   given; returning `false` ends the run before any request is made
///
/// # Returns
///
/// The [`Outcome`] of the run, or the [`FatalError`] that stopped it. Seed,
/// profile and output-path errors are all raised before the first request.
async fn run<F>(args: Cli, ask: F) -> Result<Outcome, FatalError>
where
    F: FnOnce(usize) -> bool + Send + 'static,
{
    let seeds = read_seed_urls(&args.input).await?;
    let profile = SiteProfile::load(args.config.as_deref())?;
    ensure_parent_dir(&args.output).await?;

    if !args.yes {
        let categories = seeds.len();
        let proceed = tokio::task::spawn_blocking(move || ask(categories))
            .await
            .unwrap_or(false);
        if !proceed {
            info!("Scraping cancelled by user");
            return Ok(Outcome::Declined);
        }
    }

    let mut sink = JsonlSink::open(&args.output)
        .await
        .map_err(|source| FatalError::Output {
            path: args.output.clone(),
            source,
        })?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current step");
            on_interrupt.cancel();
        }
    });

    info!(domain = %profile.domain, seeds = seeds.len(), output = %args.output.display(), "Starting crawl");
    let crawler = Crawler::new(profile, args.settings(), cancel)?;
    let report = crawler.run(seeds, &mut sink).await?;
    report.log();

    if report.cancelled {
        warn!(
            output = %args.output.display(),
            records = sink.written(),
            "Scraping interrupted by user; partial results retained"
        );
        Ok(Outcome::Interrupted)
    } else {
        info!(
            output = %args.output.display(),
            records = sink.written(),
            "Completed"
        );
        Ok(Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOCAL_PROFILE: &str = "domain: 127.0.0.1\n\
        title_selectors: [h1]\n\
        content_selectors: [article]\n\
        boilerplate_tags: [script]\n\
        boilerplate_classes: [ads]\n\
        section_paths: [/the-thao]\n";

    async fn silent_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        server
    }

    fn cli(dir: &Path, extra: &[&str]) -> Cli {
        let input = dir.join("input.txt");
        let output = dir.join("out/corpus.jsonl");
        let config = dir.join("profile.yaml");
        let mut argv = vec![
            "vn_news_corpus".to_string(),
            input.display().to_string(),
            output.display().to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--delay-ms".to_string(),
            "0".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Cli::parse_from(argv)
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(Outcome::Completed.code(), 0);
        assert_eq!(Outcome::Interrupted.code(), 0);
        assert_eq!(Outcome::Declined.code(), EXIT_DECLINED);
        assert_ne!(EXIT_FATAL, EXIT_DECLINED);
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_fatal_before_any_request() {
        let server = silent_server().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("profile.yaml"), LOCAL_PROFILE).unwrap();

        let res = run(cli(dir.path(), &["--yes"]), |_| true).await;
        assert!(matches!(res, Err(FatalError::SeedFile { .. })));
        assert!(!dir.path().join("out").exists());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_declined_prompt_ends_run_before_any_request() {
        let server = silent_server().await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("profile.yaml"), LOCAL_PROFILE).unwrap();
        std::fs::write(
            dir.path().join("input.txt"),
            format!("{0}/the-thao\n{0}/kinh-doanh\n", server.uri()),
        )
        .unwrap();

        let asked = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&asked);
        let outcome = run(cli(dir.path(), &[]), move |n| {
            *seen.lock().unwrap() = Some(n);
            false
        })
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(outcome.code(), EXIT_DECLINED);
        assert_eq!(*asked.lock().unwrap(), Some(2));
        assert!(!dir.path().join("out/corpus.jsonl").exists());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_run_completes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"<html><body></body></html>".to_vec(), "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("profile.yaml"), LOCAL_PROFILE).unwrap();
        std::fs::write(dir.path().join("input.txt"), format!("{}/the-thao\n", server.uri()))
            .unwrap();

        let outcome = run(cli(dir.path(), &["--yes"]), |_| panic!("prompt shown with --yes"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert!(dir.path().join("out/corpus.jsonl").exists());
    }
}
