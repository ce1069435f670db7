use std::collections::{BTreeSet, HashMap};

use crate::lemmatizer::{EnglishLemmatizer, Lemmatizer};

/// Canonical, order-independent token set. Usable directly as a map key.
pub type TokenSet = BTreeSet<String>;

/// Corpus-wide token occurrence counts.
///
/// Owned by a single fill. Workers accumulate their own table and the tables
/// are merged before stopwords are classified.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: &str) {
        self.add_count(token, 1);
    }

    pub fn add_count(&mut self, token: &str, count: u64) {
        match self.counts.get_mut(token) {
            Some(c) => *c += count,
            None => {
                self.counts.insert(token.to_string(), count);
            }
        }
    }

    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn merge(mut self, other: FrequencyTable) -> FrequencyTable {
        if self.counts.len() < other.counts.len() {
            return other.merge(self);
        }
        for (token, count) in other.counts {
            *self.counts.entry(token).or_insert(0) += count;
        }
        self
    }
}

impl<S: AsRef<str>> FromIterator<S> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for token in iter {
            table.add(token.as_ref());
        }
        table
    }
}

/// Turns raw text into a set of lowercase lemmas.
#[derive(Debug, Default)]
pub struct TextNormalizer<L = EnglishLemmatizer> {
    lemmatizer: L,
}

impl TextNormalizer<EnglishLemmatizer> {
    pub fn english() -> Self {
        Self::new(EnglishLemmatizer)
    }
}

impl<L: Lemmatizer> TextNormalizer<L> {
    pub fn new(lemmatizer: L) -> Self {
        Self { lemmatizer }
    }

    pub fn lemmatizer(&self) -> &L {
        &self.lemmatizer
    }

    /// Token set of `text`. Repeated lemmas collapse; empty lemmas are dropped.
    pub fn normalize(&self, text: &str) -> TokenSet {
        self.lemmas(text).collect()
    }

    /// Like [`normalize`](Self::normalize), and also counts every emitted
    /// lemma (repetitions included) into `counts`.
    pub fn normalize_counting(&self, text: &str, counts: &mut FrequencyTable) -> TokenSet {
        let mut tokens = TokenSet::new();
        for lemma in self.lemmas(text) {
            counts.add(&lemma);
            tokens.insert(lemma);
        }
        tokens
    }

    fn lemmas<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.lemmatizer.lemmatize(text).map(|l| l.to_lowercase()).filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lemmatizer::FnLemmatizer;

    #[test]
    fn collapses_duplicates_and_lowercases() {
        let normalizer = TextNormalizer::english();
        let tokens = normalizer.normalize("Fish, fish and more FISH");
        assert_eq!(tokens.iter().filter(|t| t.as_str() == "fish").count(), 1);
        assert!(tokens.contains("and"));
        assert!(tokens.contains("more"));
    }

    #[test]
    fn counts_every_occurrence() {
        let normalizer = TextNormalizer::english();
        let mut counts = FrequencyTable::new();
        let tokens = normalizer.normalize_counting("the fish and the chips", &mut counts);
        assert_eq!(tokens.len(), 4);
        assert_eq!(counts.count("the"), 2);
        assert_eq!(counts.count("chip"), 1);
        assert_eq!(counts.count("absent"), 0);
    }

    #[test]
    fn empty_lemmas_are_discarded() {
        let normalizer = TextNormalizer::new(FnLemmatizer(|text: &str| {
            text.split('|').map(str::to_string).collect()
        }));
        let tokens = normalizer.normalize("A||b|");
        assert_eq!(tokens.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn merge_adds_counts() {
        let left: FrequencyTable = ["a", "b", "a"].into_iter().collect();
        let right: FrequencyTable = ["b", "c"].into_iter().collect();
        let merged = left.merge(right);
        assert_eq!(merged.count("a"), 2);
        assert_eq!(merged.count("b"), 2);
        assert_eq!(merged.count("c"), 1);
        assert_eq!(merged.len(), 3);
    }
}
