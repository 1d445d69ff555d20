//! Vietnamese language qualifier.
//!
//! Three independent signals, each in `[0, 1]`, are blended into a single
//! confidence value:
//!
//! | Signal | Weight | Measure |
//! |--------|--------|---------|
//! | character | 0.4 | diacritic letters / all Latin letters |
//! | word | 0.4 | function-word hits / whitespace tokens |
//! | phrase | 0.2 | distinct idiomatic phrases found / 4, capped at 1 |
//!
//! The acceptance threshold is deliberately low: dropping genuine Vietnamese
//! text costs more than letting the odd borderline page through.

use crate::normalizer::VIETNAMESE_LETTERS;
use once_cell::sync::Lazy;
use regex::Regex;

const MIN_TEXT_CHARS: usize = 50;
const ACCEPT_THRESHOLD: f64 = 0.15;

const CHAR_WEIGHT: f64 = 0.4;
const WORD_WEIGHT: f64 = 0.4;
const PHRASE_WEIGHT: f64 = 0.2;
const PHRASES_FOR_FULL_SCORE: f64 = 4.0;

const STOP_WORDS: &[&str] = &[
    "và", "hoặc", "với", "của", "trong", "ngoài", "trên", "dưới", "sau", "trước", "bằng",
    "theo", "về", "để", "cho", "từ", "tại", "này", "đó", "những", "các", "một", "hai", "ba",
    "tôi", "bạn", "anh", "chị", "em",
];

const PHRASES: &[&str] = &[
    "việt nam",
    "theo báo",
    "trong khi",
    "người dân",
    "chính phủ",
    "thành phố",
    "hà nội",
    "tphcm",
    "người",
    "việc",
    "thời gian",
    "khu vực",
];

static DIACRITIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("[{VIETNAMESE_LETTERS}]")).unwrap());

static LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("[a-zA-Z{VIETNAMESE_LETTERS}]")).unwrap());

static STOP_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?:{})\b", STOP_WORDS.join("|"))).unwrap());

static PHRASE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    PHRASES
        .iter()
        .map(|p| Regex::new(&format!(r"(?i)\b{p}\b")).unwrap())
        .collect()
});

/// Outcome of scoring one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub accepted: bool,
    pub confidence: f64,
}

impl Verdict {
    const REJECTED: Self = Self {
        accepted: false,
        confidence: 0.0,
    };

    fn from_confidence(confidence: f64) -> Self {
        Self {
            accepted: confidence > ACCEPT_THRESHOLD,
            confidence,
        }
    }
}

fn character_signal(text: &str) -> Option<f64> {
    let letters = LETTER.find_iter(text).count();
    if letters == 0 {
        return None;
    }
    Some(DIACRITIC.find_iter(text).count() as f64 / letters as f64)
}

fn word_signal(text: &str) -> f64 {
    let hits = STOP_WORD.find_iter(text).count();
    let tokens = text.split_whitespace().count().max(1);
    hits as f64 / tokens as f64
}

fn phrase_signal(text: &str) -> f64 {
    let found = PHRASE_PATTERNS.iter().filter(|re| re.is_match(text)).count();
    (found as f64 / PHRASES_FOR_FULL_SCORE).min(1.0)
}

/// Score `text` for Vietnamese-ness and apply the acceptance threshold.
///
/// Texts shorter than 50 characters, or with no Latin letters at all, are
/// rejected with confidence 0.
pub fn is_vietnamese(text: &str) -> Verdict {
    if text.chars().count() < MIN_TEXT_CHARS {
        return Verdict::REJECTED;
    }
    let Some(character) = character_signal(text) else {
        return Verdict::REJECTED;
    };
    let confidence = CHAR_WEIGHT * character
        + WORD_WEIGHT * word_signal(text)
        + PHRASE_WEIGHT * phrase_signal(text);
    Verdict::from_confidence(confidence)
}
