use serde::{Deserialize, Serialize};

use crate::normalizer::TokenSet;

/// A corpus record: some text and where it came from.
///
/// Equality and hashing use both fields, so the same sentence from two
/// sources gives two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextualEntry {
    text: String,
    origin: Option<String>,
}

impl TextualEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: None }
    }

    pub fn with_origin(text: impl Into<String>, origin: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Some(origin.into()) }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

/// An entry with its token set after stopword removal. Never empty once the
/// engine is filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEntry {
    pub source: TextualEntry,
    pub tokens: TokenSet,
}

/// A hit: every entry sharing the matched token set, with one quality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub entries: Vec<TextualEntry>,
    pub tokens: TokenSet,
    /// Share of the query's tokens present in `tokens`, in `0.0..=1.0`.
    pub quality: f32,
}

/// Counts reported once a fill has been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FillSummary {
    pub input_entries: usize,
    /// Entries left after exact duplicates and empty bags were dropped.
    pub indexed_entries: usize,
    pub discarded_entries: usize,
    pub groups: usize,
    pub stopwords: usize,
    pub vocabulary: usize,
}
