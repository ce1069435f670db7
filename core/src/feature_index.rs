//! Containment search over arbitrary feature sets drawn from a fixed universe.
//!
//! This is the text engine's scoring without the language pipeline. Callers
//! do their own filtering before insertion. A typical use is near-duplicate
//! detection over tag sets, hence the high default early-accept threshold.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Range;
use std::sync::{Arc, Weak};

use crate::config::FeatureIndexConfig;
use crate::error::{check_unit_interval, Error, Result};
use crate::scan::{self, QueryPositions};

/// The closed set of features an index accepts, each with a stable position.
///
/// Positions follow the order in which features were first supplied and never
/// change afterwards.
#[derive(Debug, Clone)]
pub struct FeatureUniverse<F> {
    positions: HashMap<F, u32>,
    features: Vec<F>,
}

impl<F: Eq + Hash + Clone> FeatureUniverse<F> {
    pub fn new<I: IntoIterator<Item = F>>(features: I) -> Self {
        let iter = features.into_iter();
        let mut universe = Self {
            positions: HashMap::with_capacity(iter.size_hint().0),
            features: Vec::with_capacity(iter.size_hint().0),
        };
        for feature in iter {
            if !universe.positions.contains_key(&feature) {
                universe.positions.insert(feature.clone(), universe.features.len() as u32);
                universe.features.push(feature);
            }
        }
        universe
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, feature: &F) -> bool {
        self.positions.contains_key(feature)
    }

    pub fn position(&self, feature: &F) -> Option<u32> {
        self.positions.get(feature).copied()
    }

    pub fn feature(&self, position: u32) -> Option<&F> {
        self.features.get(position as usize)
    }

    /// Features in position order.
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.features.iter()
    }

    /// Sorted positions of `features`, or `None` if any is outside the universe.
    pub fn positions_of<'a, I>(&self, features: I) -> Option<Vec<u32>>
    where
        I: IntoIterator<Item = &'a F>,
        F: 'a,
    {
        let mut positions = features.into_iter().map(|f| self.position(f)).collect::<Option<Vec<u32>>>()?;
        positions.sort_unstable();
        Some(positions)
    }

    /// Query positions. Unknown features are kept in the count but match nothing.
    pub(crate) fn query_positions<'a, I>(&self, features: I) -> QueryPositions
    where
        I: IntoIterator<Item = &'a F>,
        F: 'a,
    {
        let mut len = 0;
        let mut positions: Vec<u32> = features
            .into_iter()
            .inspect(|_| len += 1)
            .filter_map(|f| self.position(f))
            .collect();
        positions.sort_unstable();
        QueryPositions { positions, len }
    }
}

/// A set of features plus an optional non-owning link to the object it
/// describes.
#[derive(Debug, Clone)]
pub struct FeatureVector<F, O = ()> {
    features: HashSet<F>,
    origin: Weak<O>,
    index_set: Vec<u32>,
}

impl<F, O> FeatureVector<F, O> {
    pub fn new(features: HashSet<F>) -> Self {
        Self { features, origin: Weak::new(), index_set: Vec::new() }
    }

    /// Links the vector to `origin` without keeping it alive.
    pub fn with_origin(mut self, origin: &Arc<O>) -> Self {
        self.origin = Arc::downgrade(origin);
        self
    }

    pub fn features(&self) -> &HashSet<F> {
        &self.features
    }

    /// The originating object, or `None` if there was none or it was dropped.
    pub fn origin(&self) -> Option<Arc<O>> {
        self.origin.upgrade()
    }

    /// Sorted universe positions of the features. Filled in on insertion.
    pub fn index_set(&self) -> &[u32] {
        &self.index_set
    }
}

impl<F: Eq + Hash, O> FromIterator<F> for FeatureVector<F, O> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug)]
pub struct FeatureMatch<'a, F, O = ()> {
    pub vector: &'a FeatureVector<F, O>,
    /// Share of the query's features found in `vector`, in `0.0..=1.0`.
    pub score: f32,
}

#[derive(Debug)]
pub struct FeatureIndex<F, O = ()> {
    universe: FeatureUniverse<F>,
    vectors: Vec<FeatureVector<F, O>>,
    config: FeatureIndexConfig,
}

impl<F, O> FeatureIndex<F, O>
where
    F: Eq + Hash + Clone + Sync,
    O: Send + Sync,
{
    pub fn new<I: IntoIterator<Item = F>>(universe: I) -> Self {
        Self::with_universe(FeatureUniverse::new(universe), FeatureIndexConfig::default())
    }

    pub fn with_universe(universe: FeatureUniverse<F>, config: FeatureIndexConfig) -> Self {
        Self { universe, vectors: Vec::new(), config }
    }

    pub fn universe(&self) -> &FeatureUniverse<F> {
        &self.universe
    }

    pub fn config(&self) -> &FeatureIndexConfig {
        &self.config
    }

    pub fn vectors(&self) -> &[FeatureVector<F, O>] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Inserts one vector and returns its slot.
    ///
    /// Fails with [`Error::InvalidFeature`] (index 0) if any feature lies outside
    /// the universe. Nothing is stored in that case.
    pub fn add(&mut self, vector: FeatureVector<F, O>) -> Result<usize> {
        let vector = self.indexed(vector).ok_or(Error::InvalidFeature { index: 0 })?;
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// Inserts a batch atomically: all vectors are validated first, and the
    /// first invalid one rejects the whole batch. Returns the slots used.
    pub fn add_batch<I>(&mut self, batch: I) -> Result<Range<usize>>
    where
        I: IntoIterator<Item = FeatureVector<F, O>>,
    {
        let mut indexed = Vec::new();
        for (index, vector) in batch.into_iter().enumerate() {
            match self.indexed(vector) {
                Some(v) => indexed.push(v),
                None => {
                    tracing::debug!(index, "rejecting feature vector batch");
                    return Err(Error::InvalidFeature { index });
                }
            }
        }
        let start = self.vectors.len();
        self.vectors.extend(indexed);
        Ok(start..self.vectors.len())
    }

    fn indexed(&self, mut vector: FeatureVector<F, O>) -> Option<FeatureVector<F, O>> {
        vector.index_set = self.universe.positions_of(&vector.features)?;
        Some(vector)
    }

    /// Best match for `query`. Unless `exhaustive`, the first vector scoring
    /// above the early-accept threshold is returned immediately.
    pub fn best_result(&self, query: &HashSet<F>, exhaustive: bool) -> Option<FeatureMatch<'_, F, O>> {
        let query = self.universe.query_positions(query);
        let early_accept = (!exhaustive).then_some(self.config.early_accept);
        scan::best_match(self.vectors.as_slice(), |v| v.index_set.as_slice(), &query, early_accept)
            .map(|(i, score)| FeatureMatch { vector: &self.vectors[i], score })
    }

    /// Every vector scoring at least `better_than`, best first. `Ok(None)` when
    /// nothing qualifies.
    pub fn results(&self, better_than: f32, query: &HashSet<F>) -> Result<Option<Vec<FeatureMatch<'_, F, O>>>> {
        check_unit_interval("better_than", better_than)?;
        let query = self.universe.query_positions(query);
        let kept = scan::matches_at_least(self.vectors.as_slice(), |v| v.index_set.as_slice(), &query, better_than);
        if kept.is_empty() {
            return Ok(None);
        }
        Ok(Some(kept.into_iter().map(|(i, score)| FeatureMatch { vector: &self.vectors[i], score }).collect()))
    }
}
