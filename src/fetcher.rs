//! HTTP fetching with a shared politeness gate.
//!
//! One [`Fetcher`] is built per run and used by both the discovery and the
//! scraping phase. Every request first passes through the same [`Politeness`]
//! gate, so the minimum spacing between outbound requests holds for the whole
//! run regardless of which phase issues them.

use crate::config::CrawlSettings;
use crate::error::{FatalError, FetchError};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "vi-VN,vi;q=0.8,en-US;q=0.5,en;q=0.3";

const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// A parsed HTML page together with the URL it was served from.
pub struct PageDocument {
    html: Html,
    url: Url,
}

impl PageDocument {
    /// Parse `body` leniently; malformed markup never fails.
    pub fn parse(body: &str, url: Url) -> Self {
        Self {
            html: Html::parse_document(body),
            url,
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Enforces a minimum interval between consecutive requests.
///
/// Callers queue on the inner lock, so concurrent callers are spaced out
/// one after another rather than each sleeping independently.
pub struct Politeness {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Politeness {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the interval since the previous request has elapsed, then
    /// claim the slot.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    HTML_CONTENT_TYPES.iter().any(|t| content_type.contains(t))
}

/// Issues bounded-timeout GETs and parses the HTML responses.
pub struct Fetcher {
    client: Client,
    politeness: Politeness,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(settings: &CrawlSettings, cancel: CancellationToken) -> Result<Self, FatalError> {
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            politeness: Politeness::new(settings.delay),
            cancel,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fetch `url` and parse it into a [`PageDocument`].
    ///
    /// Fails on transport errors, timeouts, non-2xx statuses and non-HTML
    /// content types. Nothing is retried here.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &str) -> Result<PageDocument, FetchError> {
        let parsed = Url::parse(url)?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = self.politeness.wait() => {}
        }

        let (final_url, body) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
            res = self.get(parsed) => res?,
        };

        debug!(bytes = body.len(), "Fetched page");
        Ok(PageDocument::parse(&body, final_url))
    }

    async fn get(&self, url: Url) -> Result<(Url, String), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_html(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        Ok((final_url, body))
    }
}
