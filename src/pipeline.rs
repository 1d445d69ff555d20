//! End-to-end crawl orchestration.
//!
//! A run has two phases, both throttled by the fetcher's shared politeness
//! gate:
//!
//! 1. **Discovery**: each seed is walked by the [`LinkDiscoverer`] with its
//!    own visited set; the per-seed results are merged and, optionally,
//!    expanded with links embedded in article bodies.
//! 2. **Scraping**: every unique article URL goes through
//!    fetch → extract → normalize → qualify. Accepted records are appended to
//!    the sink as soon as they are produced.
//!
//! A candidate that fails at any step is logged and counted, and the run moves
//! on. Cancellation is honored between URLs and while waiting on the network,
//! never in the middle of a sink write.

use crate::config::{CrawlSettings, SiteProfile};
use crate::discovery::{LinkDiscoverer, VisitedSet};
use crate::error::{FatalError, FetchError, Rejection};
use crate::extractor::Extractor;
use crate::fetcher::Fetcher;
use crate::language::is_vietnamese;
use crate::models::{CorpusRecord, ExtractedArticle, NormalizedArticle};
use crate::normalizer::{clean, count_words};
use crate::outputs::jsonl::JsonlSink;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Summary of one run.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub seeds: usize,
    pub article_urls: usize,
    pub accepted: usize,
    /// Rejections keyed by [`Rejection::kind`].
    pub rejected: BTreeMap<&'static str, usize>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl RunReport {
    fn new(seeds: usize) -> Self {
        Self {
            started_at: Local::now(),
            seeds,
            article_urls: 0,
            accepted: 0,
            rejected: BTreeMap::new(),
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    fn reject(&mut self, rejection: &Rejection) {
        *self.rejected.entry(rejection.kind()).or_default() += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn log(&self) {
        info!(
            started_at = %self.started_at.to_rfc3339(),
            seeds = self.seeds,
            article_urls = self.article_urls,
            accepted = self.accepted,
            rejected = self.rejected_total(),
            by_reason = ?self.rejected,
            cancelled = self.cancelled,
            secs = self.elapsed.as_secs(),
            "Run finished"
        );
    }
}

/// Normalize an extracted article and decide whether it enters the corpus.
///
/// Rejects text the language qualifier does not accept, then text with fewer
/// than `min_words` words in the combined title and content.
///
/// # Arguments
///
/// * `url` - Source URL recorded on the corpus record
/// * `extracted` - Raw title and body from the extractor
/// * `min_words` - Inclusive lower bound on the combined word count
///
/// # Returns
///
/// A fresh [`CorpusRecord`], or the [`Rejection`] explaining why the article
/// was dropped.
pub fn assess(
    url: &str,
    extracted: &ExtractedArticle,
    min_words: usize,
) -> Result<CorpusRecord, Rejection> {
    let title = clean(&extracted.title);
    let content = clean(&extracted.raw_content);
    let article = NormalizedArticle::new(title, &content);

    let verdict = is_vietnamese(&article.text);
    if !verdict.accepted {
        return Err(Rejection::NotVietnamese {
            confidence: verdict.confidence,
        });
    }

    let words = count_words(&article.text);
    if words < min_words {
        return Err(Rejection::TooShort { words });
    }

    Ok(CorpusRecord::new(url, article))
}

/// Owns the per-run collaborators and drives both phases.
pub struct Crawler {
    fetcher: Fetcher,
    profile: SiteProfile,
    extractor: Extractor,
    settings: CrawlSettings,
}

impl Crawler {
    pub fn new(
        profile: SiteProfile,
        settings: CrawlSettings,
        cancel: CancellationToken,
    ) -> Result<Self, FatalError> {
        let fetcher = Fetcher::new(&settings, cancel)?;
        let extractor = Extractor::new(&profile);
        Ok(Self {
            fetcher,
            profile,
            extractor,
            settings,
        })
    }

    fn discoverer(&self) -> LinkDiscoverer<'_> {
        LinkDiscoverer::new(&self.fetcher, &self.profile, &self.extractor)
    }

    /// Discover article URLs from every seed and merge them.
    #[instrument(level = "info", skip_all, fields(seeds = seeds.len()))]
    pub async fn collect_article_urls(&self, seeds: &[String]) -> BTreeSet<String> {
        let discoverer = self.discoverer();
        let mut all = BTreeSet::new();
        for seed in seeds {
            if self.fetcher.is_cancelled() {
                break;
            }
            let mut visited = VisitedSet::new();
            let found = discoverer
                .discover(seed, self.settings.max_depth, &mut visited)
                .await;
            info!(%seed, count = found.len(), pages = visited.len(), "Discovered articles");
            all.extend(found);
        }

        if self.settings.expand_internal_links && !self.fetcher.is_cancelled() {
            all = discoverer.expand_internal_links(&all).await;
        }
        info!(count = all.len(), "Total unique articles found");
        all
    }

    /// Fetch, extract and qualify one article.
    #[instrument(level = "debug", skip(self))]
    pub async fn scrape_url(&self, url: &str) -> Result<CorpusRecord, Rejection> {
        let extracted = {
            let doc = self.fetcher.fetch(url).await?;
            self.extractor.extract(&doc)?
        };
        assess(url, &extracted, self.settings.min_words)
    }

    /// Run both phases over `seeds`, appending accepted records to `sink`.
    ///
    /// Only a failing sink write ends the run early with an error.
    #[instrument(level = "info", skip_all)]
    pub async fn run(
        &self,
        seeds: Vec<String>,
        sink: &mut JsonlSink,
    ) -> Result<RunReport, FatalError> {
        let clock = Instant::now();
        let seeds = match self.settings.max_categories {
            Some(cap) => seeds.into_iter().take(cap).collect(),
            None => seeds,
        };
        let mut report = RunReport::new(seeds.len());

        let urls = self.collect_article_urls(&seeds).await;
        report.article_urls = urls.len();

        for url in &urls {
            if self.fetcher.is_cancelled() {
                break;
            }
            match self.scrape_url(url).await {
                Ok(record) => {
                    sink.append(&record)
                        .await
                        .map_err(|source| FatalError::Output {
                            path: sink.path().to_path_buf(),
                            source,
                        })?;
                    report.accepted += 1;
                    info!(
                        %url,
                        title = %truncate_for_log(&record.title, 50),
                        words = count_words(&record.text),
                        "Scraped article"
                    );
                }
                Err(Rejection::Fetch(FetchError::Cancelled)) => break,
                Err(rejection) => {
                    warn!(%url, reason = %rejection, "Skipping article");
                    report.reject(&rejection);
                }
            }
        }

        report.cancelled = self.fetcher.is_cancelled();
        report.elapsed = clock.elapsed();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TITLE: &str = "Người dân Hà Nội đón mùa thu mới";

    fn extracted(body_words: usize) -> ExtractedArticle {
        ExtractedArticle {
            title: TITLE.to_string(),
            raw_content: vec!["và"; body_words].join(" "),
        }
    }

    #[test]
    fn test_word_count_boundary() {
        // The title contributes 8 words.
        match assess("https://vnexpress.net/a.html", &extracted(191), 200) {
            Err(Rejection::TooShort { words }) => assert_eq!(words, 199),
            other => panic!("expected TooShort, got {other:?}"),
        }
        let record = assess("https://vnexpress.net/a.html", &extracted(192), 200).unwrap();
        assert_eq!(count_words(&record.text), 200);
        assert_eq!(record.title, TITLE);
        assert!(record.text.starts_with(&format!("{TITLE}. và")));
    }

    #[test]
    fn test_assess_rejects_non_vietnamese() {
        let article = ExtractedArticle {
            title: "Markets close higher after earnings".to_string(),
            raw_content: "Stocks rallied on strong quarterly results from large companies. "
                .repeat(40),
        };
        assert!(matches!(
            assess("https://vnexpress.net/a.html", &article, 200),
            Err(Rejection::NotVietnamese { .. })
        ));
    }

    fn html(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
    }

    fn article_page(title: &str, body: &str) -> ResponseTemplate {
        html(format!(
            r#"<html><body><h1 class="title-detail">{title}</h1>
               <article class="fck_detail"><p>{body}</p><div class="social">Chia sẻ</div></article>
               </body></html>"#
        ))
    }

    fn crawler(cancel: CancellationToken) -> Crawler {
        let profile = SiteProfile {
            domain: "127.0.0.1".to_string(),
            ..SiteProfile::builtin().unwrap()
        };
        let settings = CrawlSettings {
            delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            ..CrawlSettings::default()
        };
        Crawler::new(profile, settings, cancel).unwrap()
    }

    async fn mount(server: &MockServer, at: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let server = MockServer::start().await;
        let long_body = "Người dân Việt Nam và chính phủ cùng nhau xây dựng thành phố. ".repeat(30);

        mount(
            &server,
            "/the-thao",
            html(
                r#"<a href="/the-thao/good.html">1</a>
                   <a href="/the-thao/short.html">2</a>
                   <a href="/the-thao/english.html">3</a>
                   <a href="/the-thao/gone.html">4</a>
                   <a href="/the-thao/blocked.html">5</a>"#
                    .to_string(),
            ),
        )
        .await;
        mount(
            &server,
            "/the-thao/good.html",
            article_page("Thành phố Hà Nội mở rộng không gian xanh", &long_body),
        )
        .await;
        mount(
            &server,
            "/the-thao/short.html",
            article_page(
                "Tin ngắn trong ngày hôm nay",
                &"Người dân Việt Nam và chính phủ cùng nhau xây dựng thành phố. ".repeat(3),
            ),
        )
        .await;
        mount(
            &server,
            "/the-thao/english.html",
            article_page(
                "Markets close higher after earnings",
                &"Stocks rallied on strong quarterly results from large companies. ".repeat(30),
            ),
        )
        .await;
        mount(&server, "/the-thao/gone.html", ResponseTemplate::new(404)).await;
        mount(
            &server,
            "/the-thao/blocked.html",
            html(format!(
                "<h1>406 Not Acceptable by server</h1><article>{long_body}</article>"
            )),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("corpus.jsonl");
        let mut sink = JsonlSink::open(&out).await.unwrap();
        let seeds = vec![format!("{}/the-thao", server.uri())];
        let report = crawler(CancellationToken::new())
            .run(seeds, &mut sink)
            .await
            .unwrap();

        assert_eq!(report.seeds, 1);
        assert_eq!(report.article_urls, 5);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected.get("fetch"), Some(&1));
        assert_eq!(report.rejected.get("extraction"), Some(&1));
        assert_eq!(report.rejected.get("language"), Some(&1));
        assert_eq!(report.rejected.get("word_count"), Some(&1));
        assert!(!report.cancelled);

        let raw = std::fs::read_to_string(&out).unwrap();
        let records: Vec<CorpusRecord> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.source_url, format!("{}/the-thao/good.html", server.uri()));
        assert_eq!(rec.title, "Thành phố Hà Nội mở rộng không gian xanh");
        assert_eq!(rec.language, "vi");
        assert!(!rec.text.contains("Chia sẻ"));
    }

    #[tokio::test]
    async fn test_run_respects_category_cap() {
        let server = MockServer::start().await;
        mount(&server, "/the-thao", html(String::new())).await;
        Mock::given(method("GET"))
            .and(path("/kinh-doanh"))
            .respond_with(html(String::new()))
            .expect(0)
            .mount(&server)
            .await;

        let mut c = crawler(CancellationToken::new());
        c.settings.max_categories = Some(1);
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlSink::open(dir.path().join("c.jsonl")).await.unwrap();
        let seeds = vec![
            format!("{}/the-thao", server.uri()),
            format!("{}/kinh-doanh", server.uri()),
        ];
        let report = c.run(seeds, &mut sink).await.unwrap();
        assert_eq!(report.seeds, 1);
        assert_eq!(report.accepted, 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html(String::new()))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let c = crawler(cancel.clone());
        cancel.cancel();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("c.jsonl");
        let mut sink = JsonlSink::open(&out).await.unwrap();
        let report = c
            .run(vec![format!("{}/the-thao", server.uri())], &mut sink)
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.accepted, 0);
        assert_eq!(sink.written(), 0);
    }
}
