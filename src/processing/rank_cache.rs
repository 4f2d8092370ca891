use std::collections::HashMap;
use std::sync::Arc;

use crate::data::column_store::ColumnStore;

/// Row indices that sort one column ascending.
pub type RankPermutation = Arc<[u32]>;

/// Cache key: (column_index, data_generation)
type CacheKey = (usize, u64);

/// Memoized rank permutations, one per column and data generation.
///
/// A permutation is computed with a stable sort the first time a column is
/// asked for and shared by every plot afterwards. Row deletion bumps the
/// store generation, so old entries stop matching and are dropped the next
/// time a permutation is built.
#[derive(Debug, Default)]
pub struct RankCache {
    cache: HashMap<CacheKey, RankPermutation>,
    sorts_performed: usize,
}

impl RankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permutation for `column` against the store's current generation.
    pub fn rank_of(&mut self, store: &ColumnStore, column: usize) -> RankPermutation {
        let generation = store.generation();
        if let Some(rank) = self.cache.get(&(column, generation)) {
            return Arc::clone(rank);
        }

        self.cache.retain(|&(_, g), _| g == generation);
        let rank = stable_rank(store.column(column));
        assert_eq!(
            rank.len(),
            store.npoints(),
            "rank permutation must cover every row"
        );
        self.sorts_performed += 1;
        tracing::debug!(
            "Ranked column {} ({} rows, generation {})",
            column,
            rank.len(),
            generation
        );

        let rank: RankPermutation = rank.into();
        self.cache.insert((column, generation), Arc::clone(&rank));
        rank
    }

    /// Whether a permutation for `column` is cached for `generation`.
    pub fn is_cached(&self, column: usize, generation: u64) -> bool {
        self.cache.contains_key(&(column, generation))
    }

    /// Number of full sorts executed since creation.
    pub fn sorts_performed(&self) -> usize {
        self.sorts_performed
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}

/// Stable argsort: equal values keep their original row order.
pub fn stable_rank(values: &[f32]) -> Vec<u32> {
    let mut idx: Vec<u32> = (0..values.len() as u32).collect();
    idx.sort_by(|&a, &b| values[a as usize].total_cmp(&values[b as usize]));
    idx
}
