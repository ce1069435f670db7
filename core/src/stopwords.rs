use std::collections::HashSet;

use crate::config::{BottomCutoff, StopwordConfig};
use crate::normalizer::FrequencyTable;

pub type StopwordSet = HashSet<String>;

/// Count statistics behind a stopword decision. `median` is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopwordStats {
    pub max: u64,
    pub min: u64,
    pub median: u64,
    pub cutoff_top: u64,
    pub cutoff_bottom: u64,
}

/// Picks the tokens that are too frequent or too rare to discriminate entries.
///
/// A token is a stopword iff its count is above `cutoff_top` or below
/// `cutoff_bottom`. The result only depends on the multiset of counts.
///
/// With a single distinct token the maximum equals that token's count, which is
/// always above `floor(count * top_ratio)` for `top_ratio < 1`. The only token
/// is then a stopword and every bag of words ends up empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopwordClassifier {
    config: StopwordConfig,
}

impl StopwordClassifier {
    pub fn new(config: StopwordConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StopwordConfig {
        &self.config
    }

    pub fn diagnostics(&self, counts: &FrequencyTable) -> StopwordStats {
        let mut sorted: Vec<u64> = counts.iter().map(|(_, c)| c).collect();
        if sorted.is_empty() {
            return StopwordStats::default();
        }
        sorted.sort_unstable();
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let median = sorted[sorted.len() / 2];
        let cutoff_top = (max as f64 * self.config.top_ratio).floor() as u64;
        let cutoff_bottom = match self.config.bottom {
            BottomCutoff::RelativeToMax { ratio } => (max as f64 * ratio).floor() as u64,
            BottomCutoff::RelativeToMin { factor } => (min as f64 * factor).floor() as u64,
        };
        StopwordStats { max, min, median, cutoff_top, cutoff_bottom }
    }

    pub fn classify(&self, counts: &FrequencyTable) -> StopwordSet {
        let stats = self.diagnostics(counts);
        tracing::debug!(
            distinct = counts.len(),
            max = stats.max,
            min = stats.min,
            median = stats.median,
            cutoff_top = stats.cutoff_top,
            cutoff_bottom = stats.cutoff_bottom,
            "classifying stopwords"
        );
        counts
            .iter()
            .filter(|(_, c)| *c > stats.cutoff_top || *c < stats.cutoff_bottom)
            .map(|(t, _)| t.to_string())
            .collect()
    }
}
