//! In-memory lexical similarity search.
//!
//! Texts are reduced to sets of lemmas, corpus-specific stopwords are removed,
//! and queries are answered by the share of their tokens each entry contains.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lexmatch::{CorpusIndex, TextualEntry};
//!
//! let engine = Arc::new(CorpusIndex::new());
//! engine.fill(vec![TextualEntry::new("Yellow tailed tuna makes for great sashimi")])?.wait()?;
//! let best = engine.best_result(&TextualEntry::new("tuna sashimi"), true)?;
//! # Ok::<(), lexmatch::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod feature_index;
pub mod index;
pub mod lemmatizer;
pub mod normalizer;
mod scan;
pub mod stopwords;
pub mod tokenizer;

pub use config::{
    BottomCutoff, EngineConfig, FeatureIndexConfig, StopwordConfig, FEATURE_EARLY_ACCEPT, TEXT_EARLY_ACCEPT,
};
pub use engine::{CorpusIndex, EngineState, FillHandle};
pub use error::{Error, Result};
pub use feature_index::{FeatureIndex, FeatureMatch, FeatureUniverse, FeatureVector};
pub use index::{FillSummary, Match, NormalizedEntry, TextualEntry};
pub use lemmatizer::{EnglishLemmatizer, FnLemmatizer, Lemmatizer, SnowballLemmatizer};
pub use normalizer::{FrequencyTable, TextNormalizer, TokenSet};
pub use stopwords::{StopwordClassifier, StopwordSet, StopwordStats};
