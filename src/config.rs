//! Site profile and crawl settings.
//!
//! Everything site-specific (selectors, boilerplate denylists, section paths)
//! lives in a [`SiteProfile`] loaded from YAML, so a layout change on the
//! publisher's side is a config edit rather than a code change. The built-in
//! VnExpress profile is embedded from `config/vnexpress.yaml`.

use crate::error::FatalError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

const BUILTIN_PROFILE: &str = include_str!("../config/vnexpress.yaml");

fn default_max_nav_links() -> usize {
    3
}

/// Static, behavior-free tables describing one publisher's site.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteProfile {
    /// Registrable domain; a URL belongs to the site if its host is this
    /// domain or a subdomain of it.
    pub domain: String,
    /// Title selectors, most specific first.
    pub title_selectors: Vec<String>,
    /// Article-body selectors, most specific first.
    pub content_selectors: Vec<String>,
    /// Tags whose subtrees are stripped from the body before reading text.
    pub boilerplate_tags: Vec<String>,
    /// Case-insensitive class substrings whose subtrees are stripped.
    pub boilerplate_classes: Vec<String>,
    /// Path fragments marking category/navigation pages.
    pub section_paths: Vec<String>,
    /// How many navigation links to follow from each page.
    #[serde(default = "default_max_nav_links")]
    pub max_nav_links: usize,
}

impl SiteProfile {
    /// The embedded VnExpress profile.
    pub fn builtin() -> Result<Self, FatalError> {
        Ok(serde_yaml::from_str(BUILTIN_PROFILE)?)
    }

    /// Load a profile from a YAML file, falling back to the built-in one
    /// when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, FatalError> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let raw = std::fs::read_to_string(path).map_err(|source| FatalError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let profile: Self = serde_yaml::from_str(&raw)?;
        info!(domain = %profile.domain, path = %path.display(), "Loaded site profile");
        Ok(profile)
    }

    /// Whether `host` is the profile's domain or one of its subdomains.
    pub fn owns_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let domain = self.domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    }
}

pub const DEFAULT_DELAY_MS: u64 = 1500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_DEPTH: i32 = 4;
pub const DEFAULT_MIN_WORDS: usize = 200;

/// Run-level knobs, filled from the command line.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Minimum pause between any two outbound requests.
    pub delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Navigation depth bound for link discovery.
    pub max_depth: i32,
    /// Optional cap on the number of seed URLs used.
    pub max_categories: Option<usize>,
    /// Also harvest `.html` links found inside article bodies.
    pub expand_internal_links: bool,
    /// Minimum combined title+content word count for acceptance.
    pub min_words: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_depth: DEFAULT_MAX_DEPTH,
            max_categories: None,
            expand_internal_links: true,
            min_words: DEFAULT_MIN_WORDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_profile_parses() {
        let profile = SiteProfile::builtin().unwrap();
        assert_eq!(profile.domain, "vnexpress.net");
        assert_eq!(profile.title_selectors.first().unwrap(), "h1.title-detail");
        assert_eq!(profile.title_selectors.len(), 8);
        assert_eq!(profile.content_selectors.last().unwrap(), ".content");
        assert!(profile.boilerplate_tags.contains(&"iframe".to_string()));
        assert_eq!(profile.boilerplate_classes.len(), 8);
        assert!(profile.section_paths.contains(&"/the-thao".to_string()));
        assert_eq!(profile.max_nav_links, 3);
    }

    #[test]
    fn test_builtin_selectors_are_valid_css() {
        let profile = SiteProfile::builtin().unwrap();
        for s in profile.title_selectors.iter().chain(&profile.content_selectors) {
            assert!(scraper::Selector::parse(s).is_ok(), "bad selector {s}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "domain: example.vn\ntitle_selectors: [h1]\ncontent_selectors: [article]\n\
             boilerplate_tags: [script]\nboilerplate_classes: [ads]\nsection_paths: [/tin]"
        )
        .unwrap();
        let profile = SiteProfile::load(Some(file.path())).unwrap();
        assert_eq!(profile.domain, "example.vn");
        assert_eq!(profile.max_nav_links, 3);
    }

    #[test]
    fn test_load_without_path_is_builtin() {
        let profile = SiteProfile::load(None).unwrap();
        assert_eq!(profile.domain, "vnexpress.net");
    }

    #[test]
    fn test_owns_host() {
        let profile = SiteProfile::builtin().unwrap();
        assert!(profile.owns_host("vnexpress.net"));
        assert!(profile.owns_host("e.VnExpress.net"));
        assert!(!profile.owns_host("notvnexpress.net"));
        assert!(!profile.owns_host("other.com"));
    }

    #[test]
    fn test_default_settings() {
        let s = CrawlSettings::default();
        assert_eq!(s.max_depth, 4);
        assert_eq!(s.min_words, 200);
        assert!(s.expand_internal_links);
        assert_eq!(s.timeout, Duration::from_secs(30));
    }
}
