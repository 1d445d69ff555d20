//! Title and body extraction by cascading selector fallback.
//!
//! Selectors come from the [`SiteProfile`] and are tried in order, first
//! structural match wins:
//!
//! 1. **Title**: the first selector whose first match has more than 10
//!    characters of trimmed text. A title carrying the site's blocked-page
//!    marker (`"406"`) rejects the page.
//! 2. **Body**: for each content selector, boilerplate subtrees (tags such as
//!    `script` or `nav`, and elements whose class mentions `ads`, `share`,
//!    ...) are removed from the match before its text is read. The first
//!    body with more than 100 characters wins.
//! 3. **Fallback**: when no selector yields a body, the longest `div` with
//!    more than 200 characters of text is used.
//!
//! Boilerplate removal mutates a working copy of the document, so a subtree
//! removed while trying one selector stays removed for the later ones.

use crate::config::SiteProfile;
use crate::error::Rejection;
use crate::fetcher::PageDocument;
use crate::models::ExtractedArticle;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

const MIN_TITLE_CHARS: usize = 10;
const MIN_BODY_CHARS: usize = 100;
const MIN_FALLBACK_CHARS: usize = 200;
const BLOCKED_MARKER: &str = "406";

static DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());

fn compile(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!(selector = %s, error = %e, "Skipping invalid selector");
                None
            }
        })
        .collect()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Compiled selector cascade for one site.
pub struct Extractor {
    title: Vec<Selector>,
    content: Vec<Selector>,
    boilerplate_tags: Vec<String>,
    boilerplate_classes: Vec<String>,
}

impl Extractor {
    pub fn new(profile: &SiteProfile) -> Self {
        Self {
            title: compile(&profile.title_selectors),
            content: compile(&profile.content_selectors),
            boilerplate_tags: profile
                .boilerplate_tags
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            boilerplate_classes: profile
                .boilerplate_classes
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
        }
    }

    /// Locate the article title and body in `doc`.
    pub fn extract(&self, doc: &PageDocument) -> Result<ExtractedArticle, Rejection> {
        let title = self.title(doc.html())?;

        let mut html = doc.html().clone();
        let raw_content = match self.body(&mut html) {
            Some(body) => body,
            None => {
                debug!(url = %doc.url(), "No content selector matched; using largest block");
                largest_block(&html).ok_or(Rejection::MissingBody)?
            }
        };

        Ok(ExtractedArticle { title, raw_content })
    }

    /// First element matched by a content selector, untouched.
    pub fn content_root<'a>(&self, html: &'a Html) -> Option<ElementRef<'a>> {
        self.content.iter().find_map(|sel| html.select(sel).next())
    }

    fn title(&self, html: &Html) -> Result<String, Rejection> {
        let title = self
            .title
            .iter()
            .filter_map(|sel| html.select(sel).next())
            .map(|el| text_of(el).trim().to_string())
            .find(|t| t.chars().count() > MIN_TITLE_CHARS)
            .ok_or(Rejection::MissingTitle)?;

        if title.contains(BLOCKED_MARKER) {
            return Err(Rejection::BlockedTitle(title));
        }
        Ok(title)
    }

    fn body(&self, html: &mut Html) -> Option<String> {
        for sel in &self.content {
            let Some(root_id) = html.select(sel).next().map(|el| el.id()) else {
                continue;
            };

            let doomed = match html.tree.get(root_id).and_then(ElementRef::wrap) {
                Some(root) => root
                    .descendants()
                    .skip(1)
                    .filter_map(ElementRef::wrap)
                    .filter(|el| self.is_boilerplate(*el))
                    .map(|el| el.id())
                    .collect::<Vec<_>>(),
                None => continue,
            };
            for id in doomed {
                if let Some(mut node) = html.tree.get_mut(id) {
                    node.detach();
                }
            }

            let text = html
                .tree
                .get(root_id)
                .and_then(ElementRef::wrap)
                .map(text_of)
                .unwrap_or_default();
            if text.chars().count() > MIN_BODY_CHARS {
                return Some(text);
            }
        }
        None
    }

    fn is_boilerplate(&self, el: ElementRef<'_>) -> bool {
        let value = el.value();
        if self.boilerplate_tags.iter().any(|t| t == value.name()) {
            return true;
        }
        value.attr("class").is_some_and(|class| {
            let class = class.to_lowercase();
            self.boilerplate_classes.iter().any(|c| class.contains(c.as_str()))
        })
    }
}

/// Longest `div` text over the fallback threshold; the first one wins ties.
fn largest_block(html: &Html) -> Option<String> {
    let mut best: Option<(usize, String)> = None;
    for div in html.select(&DIV) {
        let text = text_of(div).trim().to_string();
        let len = text.chars().count();
        if len > MIN_FALLBACK_CHARS && best.as_ref().is_none_or(|(l, _)| len > *l) {
            best = Some((len, text));
        }
    }
    best.map(|(_, text)| text)
}
