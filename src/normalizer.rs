//! Text normalization for extracted article text.
//!
//! [`clean`] strips markup leftovers, contact details and noise, and collapses
//! everything into one whitespace-normalized line. It is pure, deterministic
//! and idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

/// Vietnamese letters with diacritics, both cases.
pub const VIETNAMESE_LETTERS: &str = "àáảãạăắằẳẵặâấầẩẫậèéẻẽẹêếềểễệìíỉĩịòóỏõọôốồổỗộơớờởỡợùúủũụưứừửữựỳýỷỹỵđ\
ÀÁẢÃẠĂẮẰẲẴẶÂẤẦẨẪẬÈÉẺẼẸÊẾỀỂỄỆÌÍỈĨỊÒÓỎÕỌÔỐỒỔỖỘƠỚỜỞỠỢÙÚỦŨỤƯỨỪỬỮỰỲÝỶỸỴĐ";

/// Lines this short are treated as navigation or ad residue.
const MIN_LINE_CHARS: usize = 20;

static HTML_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[a-zA-Z0-9#]+;").unwrap());

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z0-9]|[$-_@.&+]|[!*\\(),]|%[0-9a-fA-F]{2})+").unwrap()
});

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\+84|0)[0-9]{8,10}").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

static NUMERIC_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9\s\-.,:;]+$").unwrap());

static DISALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"[^\w\s{VIETNAMESE_LETTERS}.,!?;:()"'\-]"#)).unwrap()
});

fn keep_line(line: &str) -> bool {
    line.chars().count() > MIN_LINE_CHARS && !NUMERIC_LINE.is_match(line)
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Clean raw article text.
///
/// Steps, in order: entities, URLs, emails and phone numbers become spaces;
/// whitespace collapses; short or purely numeric lines are dropped; any
/// character outside word characters, Vietnamese letters and basic
/// punctuation becomes a space; whitespace collapses again.
///
/// The short/numeric filter is applied once more to the final string, so
/// cleaning an already-clean text never changes it.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = HTML_ENTITY.replace_all(text, " ");
    let text = URL.replace_all(&text, " ");
    let text = EMAIL.replace_all(&text, " ");
    let text = PHONE.replace_all(&text, " ");
    let text = collapse_whitespace(&text);

    let kept = text
        .split('\n')
        .map(str::trim)
        .filter(|line| keep_line(line))
        .collect::<Vec<_>>()
        .join("\n");
    let text = BLANK_LINES.replace_all(&kept, "\n");

    let text = DISALLOWED.replace_all(&text, " ");
    let text = collapse_whitespace(&text);

    if keep_line(&text) { text } else { String::new() }
}

/// Number of whitespace-delimited words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
