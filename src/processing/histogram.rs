/// Bin count a freshly created plot starts with.
pub const DEFAULT_NBINS: usize = 128;
/// Largest bin count the user may pick.
pub const MAX_NBINS: usize = 1024;
/// Smallest useful bin count.
pub const MIN_NBINS: usize = 2;

/// Equal-width histogram of one plot axis, with a second set of counts for
/// the currently selected rows.
///
/// Counts are scaled by `(nbins / DEFAULT_NBINS) / npoints` so bar heights
/// stay comparable when either the bin count or the row count changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub lo: f32,
    pub hi: f32,
    pub counts: Vec<f32>,
    pub selected_counts: Vec<f32>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            lo: -1.0,
            hi: 1.0,
            counts: Vec::new(),
            selected_counts: Vec::new(),
        }
    }
}

impl Histogram {
    /// Bin `values` over `[lo, hi]`. Values outside the range are not
    /// counted; `hi` itself falls into the last bin. `selected(i)` says
    /// whether row `i` is currently selected.
    pub fn compute(
        values: impl ExactSizeIterator<Item = f32>,
        lo: f32,
        hi: f32,
        nbins: usize,
        selected: impl Fn(usize) -> bool,
    ) -> Self {
        let nbins = nbins.clamp(MIN_NBINS, MAX_NBINS);
        let npoints = values.len();
        let mut counts = vec![0.0f32; nbins];
        let mut selected_counts = vec![0.0f32; nbins];

        let width = (hi - lo) / nbins as f32;
        if npoints == 0 || !(width > 0.0) || !width.is_finite() {
            return Self {
                lo,
                hi,
                counts,
                selected_counts,
            };
        }

        for (i, v) in values.enumerate() {
            if !(v >= lo && v <= hi) {
                continue;
            }
            let bin = (((v - lo) / width) as usize).min(nbins - 1);
            counts[bin] += 1.0;
            if selected(i) {
                selected_counts[bin] += 1.0;
            }
        }

        let norm = (nbins as f32 / DEFAULT_NBINS as f32) / npoints as f32;
        for c in counts.iter_mut().chain(selected_counts.iter_mut()) {
            *c *= norm;
        }

        Self {
            lo,
            hi,
            counts,
            selected_counts,
        }
    }

    pub fn nbins(&self) -> usize {
        self.counts.len()
    }

    /// Bin boundaries, `nbins + 1` values from `lo` to `hi`.
    pub fn edges(&self) -> Vec<f32> {
        let n = self.nbins();
        let width = (self.hi - self.lo) / n.max(1) as f32;
        (0..=n).map(|i| self.lo + width * i as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_four_bins() {
        let values: Vec<f32> = (0..128).map(|i| -1.0 + 2.0 * i as f32 / 127.0).collect();
        let h = Histogram::compute(values.iter().copied(), -1.0, 1.0, 4, |_| false);
        let expected = 32.0 * (4.0 / 128.0) / 128.0;
        for &c in &h.counts {
            assert!((c - expected).abs() < 1e-7, "bin {c} != {expected}");
        }
        assert_eq!(h.edges(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert!(h.selected_counts.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_selected_counts_and_out_of_range() {
        let values = [0.1f32, 0.2, 0.9, 5.0];
        let h = Histogram::compute(values.iter().copied(), 0.0, 1.0, 2, |i| i == 2);
        let norm = (2.0 / DEFAULT_NBINS as f32) / 4.0;
        assert_eq!(h.counts, vec![2.0 * norm, 1.0 * norm]);
        assert_eq!(h.selected_counts, vec![0.0, norm]);
    }

    #[test]
    fn test_nbins_clamped_and_degenerate_range() {
        let h = Histogram::compute([1.0f32].into_iter(), 1.0, 1.0, 5000, |_| true);
        assert_eq!(h.nbins(), MAX_NBINS);
        assert!(h.counts.iter().all(|&c| c == 0.0));
    }
}
