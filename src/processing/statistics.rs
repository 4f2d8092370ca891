/// Summary statistics of one column, computed with the help of its rank
/// permutation so no extra sort is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl ColumnStats {
    /// `rank` must sort `values` ascending. Returns `None` for an empty column.
    pub fn compute(values: &[f32], rank: &[u32]) -> Option<Self> {
        let count = values.len();
        if count == 0 {
            return None;
        }
        assert_eq!(rank.len(), count, "rank/value length mismatch");

        let min = values[rank[0] as usize] as f64;
        let max = values[rank[count - 1] as usize] as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (values[rank[count / 2 - 1] as usize] as f64 + values[rank[count / 2] as usize] as f64)
                / 2.0
        } else {
            values[rank[count / 2] as usize] as f64
        };
        let variance = values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Value at fractional position `q` in sorted order (nearest rank).
    pub fn quantile(values: &[f32], rank: &[u32], q: f64) -> f32 {
        let n = rank.len();
        if n == 0 {
            return 0.0;
        }
        let pos = (q.clamp(0.0, 1.0) * (n - 1) as f64).round() as usize;
        values[rank[pos.min(n - 1)] as usize]
    }

    /// Multi-line report for the info panel.
    pub fn report(&self, label: &str) -> String {
        format!(
            "{}:\n  Count: {}\n  Min: {:.4}\n  Max: {:.4}\n  Mean: {:.4}\n  Median: {:.4}\n  Std Dev: {:.4}\n",
            label, self.count, self.min, self.max, self.mean, self.median, self.std_dev
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::rank_cache::stable_rank;

    #[test]
    fn test_compute_stats() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        let rank = stable_rank(&values);
        let stats = ColumnStats::compute(&values, &rank).unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert!((stats.std_dev - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_even_median_and_quantile() {
        let values = [4.0, 1.0, 3.0, 2.0];
        let rank = stable_rank(&values);
        let stats = ColumnStats::compute(&values, &rank).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(ColumnStats::quantile(&values, &rank, 0.0), 1.0);
        assert_eq!(ColumnStats::quantile(&values, &rank, 1.0), 4.0);
    }

    #[test]
    fn test_empty_column() {
        assert!(ColumnStats::compute(&[], &[]).is_none());
    }
}
