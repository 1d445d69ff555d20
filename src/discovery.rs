//! Article URL discovery.
//!
//! Starting from a seed (category) page, [`LinkDiscoverer::discover`] walks
//! navigation links depth-first up to a depth bound and collects every
//! same-site `.html` link it sees. A single [`VisitedSet`] is threaded through
//! the whole walk, so a page reachable by several paths is fetched once and
//! cycles terminate.
//!
//! [`LinkDiscoverer::expand_internal_links`] is a second pass that opens each
//! article and harvests the `.html` links embedded in its body, picking up
//! related articles that no category page lists.

use crate::config::SiteProfile;
use crate::extractor::Extractor;
use crate::fetcher::{Fetcher, PageDocument};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::Selector;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// URLs fetched during one discovery traversal.
pub type VisitedSet = HashSet<String>;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Outbound links of one page, split by role.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageLinks {
    articles: Vec<String>,
    navigation: Vec<String>,
}

pub struct LinkDiscoverer<'a> {
    fetcher: &'a Fetcher,
    profile: &'a SiteProfile,
    extractor: &'a Extractor,
}

impl<'a> LinkDiscoverer<'a> {
    pub fn new(fetcher: &'a Fetcher, profile: &'a SiteProfile, extractor: &'a Extractor) -> Self {
        Self {
            fetcher,
            profile,
            extractor,
        }
    }

    /// Collect article URLs reachable from `seed_url` within `max_depth`
    /// navigation hops.
    ///
    /// A URL already in `visited`, or a negative depth, contributes nothing.
    /// Each page is marked visited before it is fetched; a failed fetch ends
    /// that branch. At most `max_nav_links` navigation links are followed
    /// from any one page.
    ///
    /// # Arguments
    ///
    /// * `seed_url` - Category page to start from; its fragment is ignored
    /// * `max_depth` - Navigation hops still allowed below the seed
    /// * `visited` - Pages already fetched in this traversal, updated in place
    ///
    /// # Returns
    ///
    /// Every same-site article URL seen on the visited pages, normalized the
    /// same way as the keys in `visited`.
    #[instrument(level = "info", skip(self, visited))]
    pub async fn discover(
        &self,
        seed_url: &str,
        max_depth: i32,
        visited: &mut VisitedSet,
    ) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut pending = vec![(canonical_seed(seed_url), max_depth)];

        while let Some((url, depth)) = pending.pop() {
            if depth < 0 || visited.contains(&url) {
                continue;
            }
            if self.fetcher.is_cancelled() {
                break;
            }
            visited.insert(url.clone());

            let links = match self.fetcher.fetch(&url).await {
                Ok(doc) => self.partition(&doc, depth, visited),
                Err(e) => {
                    warn!(%url, error = %e, "Skipping page");
                    continue;
                }
            };

            info!(%url, depth, articles = links.articles.len(), "Found articles");
            debug!(navigation = ?links.navigation, "Following navigation links");
            found.extend(links.articles);
            // Reversed so the first navigation link is explored first.
            pending.extend(links.navigation.into_iter().rev().map(|nav| (nav, depth - 1)));
        }

        found
    }

    /// Union `articles` with the same-site `.html` links found inside each
    /// article's content area.
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn expand_internal_links(&self, articles: &BTreeSet<String>) -> BTreeSet<String> {
        let embedded: Vec<Vec<String>> = stream::iter(articles.iter())
            .then(|url| self.internal_links(url))
            .collect()
            .await;

        let mut expanded = articles.clone();
        expanded.extend(embedded.into_iter().flatten());
        info!(
            before = articles.len(),
            after = expanded.len(),
            "Expanded article set with internal links"
        );
        expanded
    }

    async fn internal_links(&self, url: &str) -> Vec<String> {
        if self.fetcher.is_cancelled() {
            return Vec::new();
        }
        let doc = match self.fetcher.fetch(url).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(%url, error = %e, "Skipping internal-link scan");
                return Vec::new();
            }
        };
        let Some(root) = self.extractor.content_root(doc.html()) else {
            return Vec::new();
        };
        root.select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| self.resolve(doc.url(), href))
            .filter(|link| is_article(link))
            .map(String::from)
            .collect()
    }

    fn partition(&self, doc: &PageDocument, depth: i32, visited: &VisitedSet) -> PageLinks {
        let mut links = PageLinks::default();
        for href in doc.html().select(&ANCHOR).filter_map(|a| a.value().attr("href")) {
            let Some(link) = self.resolve(doc.url(), href) else {
                continue;
            };
            if is_article(&link) {
                links.articles.push(link.into());
            } else if depth > 0
                && links.navigation.len() < self.profile.max_nav_links
                && self.is_section(&link)
                && !link.path().ends_with(".html")
                && !visited.contains(link.as_str())
                && !links.navigation.iter().any(|n| n == link.as_str())
            {
                links.navigation.push(link.into());
            }
        }
        links
    }

    /// Absolute same-site http(s) URL for `href`, without its fragment.
    fn resolve(&self, base: &Url, href: &str) -> Option<Url> {
        let mut url = base.join(href.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        if !url.host_str().is_some_and(|h| self.profile.owns_host(h)) {
            return None;
        }
        url.set_fragment(None);
        Some(url)
    }

    fn is_section(&self, url: &Url) -> bool {
        let path = url.path();
        self.profile.section_paths.iter().any(|s| path.contains(s.as_str()))
    }
}

/// Visited-set key for a seed: the serialized URL without its fragment, so
/// links found later that point back at the seed compare equal to it.
fn canonical_seed(seed: &str) -> String {
    match Url::parse(seed.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.into()
        }
        Err(_) => seed.to_string(),
    }
}

/// An article link is an absolute URL ending in `.html`; a query string
/// disqualifies it.
fn is_article(url: &Url) -> bool {
    url.as_str().ends_with(".html")
}
