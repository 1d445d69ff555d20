//! Output sinks for accepted corpus records.
//!
//! # Submodules
//!
//! - [`jsonl`]: append-only JSON Lines writer, one [`CorpusRecord`] per line
//!
//! [`CorpusRecord`]: crate::models::CorpusRecord

pub mod jsonl;
