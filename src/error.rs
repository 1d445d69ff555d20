//! Failure taxonomy for the crawl-and-qualify pipeline.
//!
//! Per-URL failures ([`FetchError`], [`Rejection`]) are logged where they occur
//! and never abort a run. Only a [`FatalError`] stops the process, and only
//! before any network activity has started.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single page could not be fetched and parsed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {0}")]
    Status(u16),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Why an article candidate produced no corpus record.
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("no title selector matched")]
    MissingTitle,

    #[error("title carries the blocked-page marker: {0}")]
    BlockedTitle(String),

    #[error("no body text found")]
    MissingBody,

    #[error("not Vietnamese (confidence {confidence:.2})")]
    NotVietnamese { confidence: f64 },

    #[error("too short ({words} words)")]
    TooShort { words: usize },
}

impl Rejection {
    /// Short stable label used as a counter key in the run report.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::MissingTitle | Self::BlockedTitle(_) | Self::MissingBody => "extraction",
            Self::NotVietnamese { .. } => "language",
            Self::TooShort { .. } => "word_count",
        }
    }
}

/// Errors that end the whole run.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("cannot read seed file {path}: {source}")]
    SeedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read site profile {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid site profile: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("cannot open output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("http client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}
