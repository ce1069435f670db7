//! The text matching engine.
//!
//! Filling runs a three-stage pipeline: normalize every entry while counting
//! lemmas, classify stopwords from the complete counts and strip them, then
//! group entries with identical token sets. The finished corpus is published
//! as a single immutable snapshot; queries clone an `Arc` to it and never
//! lock while scoring.

use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::oneshot;

use crate::config::EngineConfig;
use crate::error::{check_unit_interval, Error, Result};
use crate::feature_index::FeatureUniverse;
use crate::index::{FillSummary, Match, NormalizedEntry, TextualEntry};
use crate::lemmatizer::{EnglishLemmatizer, Lemmatizer};
use crate::normalizer::{FrequencyTable, TextNormalizer, TokenSet};
use crate::scan::{self, QueryPositions};
use crate::stopwords::{StopwordClassifier, StopwordSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotFilled,
    Filling,
    Filled,
}

enum State {
    NotFilled,
    Filling,
    Filled(Arc<Corpus>),
}

/// Entries sharing one exact token set.
struct DuplicateGroup {
    tokens: TokenSet,
    positions: Vec<u32>,
    members: Vec<TextualEntry>,
}

struct Corpus {
    entries: Vec<NormalizedEntry>,
    /// In order of first appearance; this is the scan order.
    groups: Vec<DuplicateGroup>,
    vocabulary: FeatureUniverse<String>,
    stopwords: StopwordSet,
}

impl Corpus {
    fn to_match(&self, group: usize, quality: f32) -> Match {
        let group = &self.groups[group];
        Match { entries: group.members.clone(), tokens: group.tokens.clone(), quality }
    }
}

/// Completes when a fill started with [`CorpusIndex::fill`] has published.
#[derive(Debug)]
pub struct FillHandle {
    rx: oneshot::Receiver<Result<FillSummary>>,
}

impl FillHandle {
    /// Blocks the current thread until the fill is done. Must not be called
    /// from inside an async runtime or from a rayon pool thread; `.await` the
    /// handle there instead.
    pub fn wait(self) -> Result<FillSummary> {
        self.rx.blocking_recv().unwrap_or(Err(Error::FillAborted))
    }
}

impl Future for FillHandle {
    type Output = Result<FillSummary>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|r| r.unwrap_or(Err(Error::FillAborted)))
    }
}

/// In-memory lexical similarity index over a corpus of short texts.
///
/// The engine is filled exactly once. A second fill is rejected with
/// [`Error::AlreadyFilling`] while the first is running and with
/// [`Error::AlreadyFilled`] afterwards.
pub struct CorpusIndex<L = EnglishLemmatizer> {
    normalizer: TextNormalizer<L>,
    classifier: StopwordClassifier,
    config: EngineConfig,
    state: RwLock<State>,
}

impl CorpusIndex<EnglishLemmatizer> {
    pub fn new() -> Self {
        Self::with_lemmatizer(EnglishLemmatizer)
    }
}

impl Default for CorpusIndex<EnglishLemmatizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lemmatizer> CorpusIndex<L> {
    pub fn with_lemmatizer(lemmatizer: L) -> Self {
        Self::build(lemmatizer, EngineConfig::default())
    }

    pub fn with_config(lemmatizer: L, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(lemmatizer, config))
    }

    fn build(lemmatizer: L, config: EngineConfig) -> Self {
        Self {
            normalizer: TextNormalizer::new(lemmatizer),
            classifier: StopwordClassifier::new(config.stopwords),
            config,
            state: RwLock::new(State::NotFilled),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TextNormalizer<L> {
        &self.normalizer
    }

    pub fn state(&self) -> EngineState {
        match &*self.state.read() {
            State::NotFilled => EngineState::NotFilled,
            State::Filling => EngineState::Filling,
            State::Filled(_) => EngineState::Filled,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.state() == EngineState::Filled
    }

    /// Starts filling on the rayon pool and returns at once.
    ///
    /// The returned handle resolves after the corpus has been published.
    pub fn fill(self: &Arc<Self>, entries: Vec<TextualEntry>) -> Result<FillHandle>
    where
        L: 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.fill_with(entries, move |outcome| {
            // the receiver may have been dropped; the fill still happened
            let _ = tx.send(outcome);
        })?;
        Ok(FillHandle { rx })
    }

    /// Starts filling on the rayon pool and calls `on_complete` exactly once
    /// with the outcome, after the state has changed. The callback runs on a
    /// pool thread and must not block on other pool work.
    pub fn fill_with<C>(self: &Arc<Self>, entries: Vec<TextualEntry>, on_complete: C) -> Result<()>
    where
        L: 'static,
        C: FnOnce(Result<FillSummary>) + Send + 'static,
    {
        self.begin_fill()?;
        let engine = Arc::clone(self);
        rayon::spawn(move || {
            let outcome = engine.run_fill(entries);
            if panic::catch_unwind(AssertUnwindSafe(|| on_complete(outcome))).is_err() {
                tracing::error!("fill completion callback panicked");
            }
        });
        Ok(())
    }

    /// Fills on the calling thread.
    pub fn fill_blocking(&self, entries: Vec<TextualEntry>) -> Result<FillSummary> {
        self.begin_fill()?;
        self.run_fill(entries)
    }

    fn begin_fill(&self) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            State::NotFilled => {
                *state = State::Filling;
                Ok(())
            }
            State::Filling => {
                tracing::warn!("fill rejected: another fill is in progress");
                Err(Error::AlreadyFilling)
            }
            State::Filled(_) => {
                tracing::warn!("fill rejected: engine is already filled");
                Err(Error::AlreadyFilled)
            }
        }
    }

    fn run_fill(&self, entries: Vec<TextualEntry>) -> Result<FillSummary> {
        let started = Instant::now();
        tracing::info!(entries = entries.len(), "filling matching engine");
        match panic::catch_unwind(AssertUnwindSafe(|| self.build_corpus(entries))) {
            Ok((corpus, summary)) => {
                *self.state.write() = State::Filled(Arc::new(corpus));
                tracing::info!(
                    indexed = summary.indexed_entries,
                    discarded = summary.discarded_entries,
                    groups = summary.groups,
                    stopwords = summary.stopwords,
                    vocabulary = summary.vocabulary,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "matching engine filled"
                );
                Ok(summary)
            }
            Err(_) => {
                *self.state.write() = State::NotFilled;
                tracing::warn!("fill worker panicked; engine reset to not filled");
                Err(Error::FillAborted)
            }
        }
    }

    fn build_corpus(&self, entries: Vec<TextualEntry>) -> (Corpus, FillSummary) {
        let input_entries = entries.len();
        let mut seen = HashSet::with_capacity(entries.len());
        let unique: Vec<TextualEntry> = entries.into_iter().filter(|e| seen.insert(e.clone())).collect();

        // Pass 1: normalize and count. Each rayon split keeps its own table.
        let (mut normalized, counts) = unique
            .par_iter()
            .enumerate()
            .fold(
                || (Vec::new(), FrequencyTable::new()),
                |(mut out, mut counts), (i, entry)| {
                    let tokens = self.normalizer.normalize_counting(entry.text(), &mut counts);
                    out.push((i, tokens));
                    (out, counts)
                },
            )
            .reduce(
                || (Vec::new(), FrequencyTable::new()),
                |(mut left, left_counts), (right, right_counts)| {
                    left.extend(right);
                    (left, left_counts.merge(right_counts))
                },
            );
        normalized.sort_unstable_by_key(|(i, _)| *i);

        // Pass 2: stopwords need the complete table.
        let stopwords = self.classifier.classify(&counts);
        drop(counts);

        // Pass 3: strip stopwords and group identical bags.
        let mut entries = Vec::with_capacity(normalized.len());
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut group_of: HashMap<TokenSet, usize> = HashMap::new();
        for ((_, mut tokens), source) in normalized.into_iter().zip(unique) {
            tokens.retain(|t| !stopwords.contains(t));
            if tokens.is_empty() {
                continue;
            }
            match group_of.get(&tokens) {
                Some(&g) => groups[g].members.push(source.clone()),
                None => {
                    group_of.insert(tokens.clone(), groups.len());
                    groups.push(DuplicateGroup {
                        tokens: tokens.clone(),
                        positions: Vec::new(),
                        members: vec![source.clone()],
                    });
                }
            }
            entries.push(NormalizedEntry { source, tokens });
        }

        let vocabulary = FeatureUniverse::new(groups.iter().flat_map(|g| g.tokens.iter().cloned()));
        for group in &mut groups {
            group.positions = group.tokens.iter().filter_map(|t| vocabulary.position(t)).collect();
            group.positions.sort_unstable();
        }

        let summary = FillSummary {
            input_entries,
            indexed_entries: entries.len(),
            discarded_entries: input_entries - entries.len(),
            groups: groups.len(),
            stopwords: stopwords.len(),
            vocabulary: vocabulary.len(),
        };
        (Corpus { entries, groups, vocabulary, stopwords }, summary)
    }

    fn corpus(&self) -> Result<Arc<Corpus>> {
        match &*self.state.read() {
            State::Filled(corpus) => Ok(Arc::clone(corpus)),
            _ => Err(Error::EngineNotFilled),
        }
    }

    fn query_tokens(&self, corpus: &Corpus, text: &str) -> TokenSet {
        let mut tokens = self.normalizer.normalize(text);
        tokens.retain(|t| !corpus.stopwords.contains(t));
        tokens
    }

    fn query_positions(&self, corpus: &Corpus, text: &str) -> QueryPositions {
        corpus.vocabulary.query_positions(&self.query_tokens(corpus, text))
    }

    /// Query tokens as they are scored: lemmatized, with the corpus stopwords removed.
    pub fn normalize_query(&self, text: &str) -> Result<TokenSet> {
        let corpus = self.corpus()?;
        Ok(self.query_tokens(&corpus, text))
    }

    /// The best match for `query`, or `Ok(None)` if no entry shares a token
    /// with it.
    ///
    /// Unless `exhaustive`, the scan stops at the first group scoring above
    /// the early-accept threshold even if a better one follows.
    pub fn best_result(&self, query: &TextualEntry, exhaustive: bool) -> Result<Option<Match>> {
        let corpus = self.corpus()?;
        let query = self.query_positions(&corpus, query.text());
        if query.len == 0 {
            tracing::debug!("query has no tokens after normalization");
            return Ok(None);
        }
        let early_accept = (!exhaustive).then_some(self.config.early_accept);
        let best = scan::best_match(corpus.groups.as_slice(), |g| g.positions.as_slice(), &query, early_accept);
        tracing::debug!(query_tokens = query.len, exhaustive, found = best.is_some(), "best result");
        Ok(best.map(|(g, quality)| corpus.to_match(g, quality)))
    }

    /// All matches with quality at least `better_than`, best first, or
    /// `Ok(None)` if there are none.
    pub fn results(&self, better_than: f32, query: &TextualEntry) -> Result<Option<Vec<Match>>> {
        let corpus = self.corpus()?;
        check_unit_interval("better_than", better_than)?;
        let query = self.query_positions(&corpus, query.text());
        if query.len == 0 {
            tracing::debug!("query has no tokens after normalization");
            return Ok(None);
        }
        let kept = scan::matches_at_least(corpus.groups.as_slice(), |g| g.positions.as_slice(), &query, better_than);
        tracing::debug!(query_tokens = query.len, better_than, hits = kept.len(), "results");
        if kept.is_empty() {
            return Ok(None);
        }
        Ok(Some(kept.into_iter().map(|(g, quality)| corpus.to_match(g, quality)).collect()))
    }

    /// Indexed entries in input order, with their token sets.
    pub fn normalized_entries(&self) -> Result<Vec<NormalizedEntry>> {
        Ok(self.corpus()?.entries.clone())
    }

    pub fn stopwords(&self) -> Result<StopwordSet> {
        Ok(self.corpus()?.stopwords.clone())
    }
}
