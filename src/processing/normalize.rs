use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::processing::statistics::ColumnStats;

/// How raw column values are rescaled before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalizationStyle {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "minmax")]
    MinMax,
    #[serde(rename = "zeromax")]
    ZeroMax,
    #[serde(rename = "maxabs")]
    MaxAbs,
    #[serde(rename = "trim-1e2")]
    Trim1e2,
    #[serde(rename = "trim-1e3")]
    Trim1e3,
    #[serde(rename = "threesigma")]
    ThreeSigma,
    #[serde(rename = "log10")]
    Log10,
    #[serde(rename = "squash")]
    Squash,
    #[serde(rename = "rank")]
    Rank,
    #[serde(rename = "gaussianize")]
    Gaussianize,
}

impl Default for NormalizationStyle {
    fn default() -> Self {
        NormalizationStyle::MinMax
    }
}

impl NormalizationStyle {
    pub const ALL: [NormalizationStyle; 11] = [
        NormalizationStyle::None,
        NormalizationStyle::MinMax,
        NormalizationStyle::ZeroMax,
        NormalizationStyle::MaxAbs,
        NormalizationStyle::Trim1e2,
        NormalizationStyle::Trim1e3,
        NormalizationStyle::ThreeSigma,
        NormalizationStyle::Log10,
        NormalizationStyle::Squash,
        NormalizationStyle::Rank,
        NormalizationStyle::Gaussianize,
    ];

    /// Short name used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            NormalizationStyle::None => "none",
            NormalizationStyle::MinMax => "minmax",
            NormalizationStyle::ZeroMax => "zeromax",
            NormalizationStyle::MaxAbs => "maxabs",
            NormalizationStyle::Trim1e2 => "trim-1e2",
            NormalizationStyle::Trim1e3 => "trim-1e3",
            NormalizationStyle::ThreeSigma => "threesigma",
            NormalizationStyle::Log10 => "log10",
            NormalizationStyle::Squash => "squash",
            NormalizationStyle::Rank => "rank",
            NormalizationStyle::Gaussianize => "gaussianize",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NormalizationStyle::None => "None",
            NormalizationStyle::MinMax => "Min/Max",
            NormalizationStyle::ZeroMax => "Zero/Max",
            NormalizationStyle::MaxAbs => "Max |value|",
            NormalizationStyle::Trim1e2 => "Trim 1e-2",
            NormalizationStyle::Trim1e3 => "Trim 1e-3",
            NormalizationStyle::ThreeSigma => "3 sigma",
            NormalizationStyle::Log10 => "log10",
            NormalizationStyle::Squash => "Squash",
            NormalizationStyle::Rank => "Rank",
            NormalizationStyle::Gaussianize => "Gaussianize",
        }
    }
}

impl fmt::Display for NormalizationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NormalizationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        NormalizationStyle::ALL
            .iter()
            .copied()
            .find(|style| style.name() == lower)
            .ok_or_else(|| format!("unknown normalization style '{s}'"))
    }
}

/// Outcome of normalizing one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Data range (in normalized units) that should fill the drawable range.
    pub world_min: f32,
    pub world_max: f32,
    pub warning: Option<String>,
}

impl Normalized {
    fn range(world_min: f32, world_max: f32) -> Self {
        Self {
            world_min,
            world_max,
            warning: None,
        }
    }

    pub fn world(&self) -> (f32, f32) {
        (self.world_min, self.world_max)
    }
}

/// Range to show for a column whose values may all be equal.
fn padded_range(min: f32, max: f32) -> (f32, f32) {
    if max > min {
        (min, max)
    } else {
        (min - 1.0, max + 1.0)
    }
}

fn min_max(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Rescale `values` in place according to `style` and return the world
/// range to display.
///
/// `rank` must be the ascending permutation of `values` (normally the cached
/// permutation of the source column the values were copied from).
/// Degenerate input never fails: values are left alone and a padded range
/// around them is returned. The returned range is always finite.
pub fn normalize(values: &mut [f32], rank: &[u32], style: NormalizationStyle) -> Normalized {
    let n = values.len();
    assert_eq!(rank.len(), n, "rank permutation does not match value buffer");
    if n == 0 {
        return Normalized::range(-1.0, 1.0);
    }

    let min = values[rank[0] as usize];
    let max = values[rank[n - 1] as usize];

    let mut result = match style {
        NormalizationStyle::None => Normalized::range(-1.0, 1.0),

        NormalizationStyle::MinMax => {
            if max > min {
                let span = max - min;
                for v in values.iter_mut() {
                    *v = -1.0 + 2.0 * (*v - min) / span;
                }
                Normalized::range(-1.0, 1.0)
            } else {
                let (lo, hi) = padded_range(min, max);
                Normalized::range(lo, hi)
            }
        }

        NormalizationStyle::ZeroMax => {
            if max > 0.0 && max > min {
                for v in values.iter_mut() {
                    *v /= max;
                }
                Normalized::range(0.0, 1.0)
            } else {
                let (lo, hi) = padded_range(min, max);
                Normalized::range(lo, hi)
            }
        }

        NormalizationStyle::MaxAbs => {
            let m = min.abs().max(max.abs());
            if m > 0.0 && max > min {
                for v in values.iter_mut() {
                    *v /= m;
                }
                Normalized::range(-1.0, 1.0)
            } else {
                let (lo, hi) = padded_range(min, max);
                Normalized::range(lo, hi)
            }
        }

        NormalizationStyle::Trim1e2 | NormalizationStyle::Trim1e3 => {
            let frac = if style == NormalizationStyle::Trim1e2 {
                1e-2
            } else {
                1e-3
            };
            let lo = ColumnStats::quantile(values, rank, frac / 2.0);
            let hi = ColumnStats::quantile(values, rank, 1.0 - frac / 2.0);
            let (lo, hi) = padded_range(lo, hi);
            Normalized::range(lo, hi)
        }

        NormalizationStyle::ThreeSigma => {
            // ColumnStats::compute only returns None for an empty column.
            let stats = ColumnStats::compute(values, rank);
            match stats {
                Some(s) if s.std_dev > 0.0 => {
                    let mean = s.mean as f32;
                    let three_sigma = (3.0 * s.std_dev) as f32;
                    for v in values.iter_mut() {
                        *v = (*v - mean) / three_sigma;
                    }
                    Normalized::range(-1.0, 1.0)
                }
                _ => {
                    let (lo, hi) = padded_range(min, max);
                    Normalized::range(lo, hi)
                }
            }
        }

        NormalizationStyle::Log10 => {
            let mut nonpositive = 0usize;
            for v in values.iter_mut() {
                if *v > 0.0 {
                    *v = v.log10();
                } else {
                    *v = 0.0;
                    nonpositive += 1;
                }
            }
            let (lo, hi) = min_max(values);
            let (lo, hi) = padded_range(lo, hi);
            Normalized {
                world_min: lo,
                world_max: hi,
                warning: (nonpositive > 0)
                    .then(|| format!("log10: {nonpositive} nonpositive values were set to 0")),
            }
        }

        NormalizationStyle::Squash => {
            for v in values.iter_mut() {
                *v /= 1.0 + v.abs();
            }
            Normalized::range(-1.0, 1.0)
        }

        NormalizationStyle::Rank => {
            let denom = (n - 1).max(1) as f32;
            for (i, &row) in rank.iter().enumerate() {
                values[row as usize] = i as f32 / denom;
            }
            Normalized::range(0.0, 1.0)
        }

        NormalizationStyle::Gaussianize => {
            let denom = (n + 2) as f64;
            for (i, &row) in rank.iter().enumerate() {
                let p = (i as f64 + 1.0) / denom;
                values[row as usize] = (0.2 * inverse_normal_cdf(p)) as f32;
            }
            let lo = values[rank[0] as usize];
            let hi = values[rank[n - 1] as usize];
            let (lo, hi) = padded_range(lo, hi);
            Normalized::range(lo, hi)
        }
    };

    if !result.world_min.is_finite() || !result.world_max.is_finite() {
        result.world_min = -1.0;
        result.world_max = 1.0;
    }
    result
}

/// Quantile function of the standard normal distribution.
///
/// Acklam's rational approximation, relative error below 1.2e-9 on (0, 1).
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::rank_cache::stable_rank;

    const EPS: f32 = 1e-5;

    fn run(values: &[f32], style: NormalizationStyle) -> (Vec<f32>, Normalized) {
        let mut v = values.to_vec();
        let rank = stable_rank(values);
        let out = normalize(&mut v, &rank, style);
        (v, out)
    }

    fn sample() -> Vec<f32> {
        vec![3.0, -2.0, 7.5, 0.25, 12.0, -6.0, 1.0, 4.0]
    }

    #[test]
    fn test_none_leaves_values() {
        let (v, out) = run(&sample(), NormalizationStyle::None);
        assert_eq!(v, sample());
        assert_eq!(out.world(), (-1.0, 1.0));
    }

    #[test]
    fn test_bounded_styles_stay_in_unit_range() {
        for style in [
            NormalizationStyle::MinMax,
            NormalizationStyle::ZeroMax,
            NormalizationStyle::MaxAbs,
            NormalizationStyle::Squash,
        ] {
            let (v, _) = run(&sample(), style);
            let (lo, hi) = min_max(&v);
            assert!(lo >= -1.0 - EPS, "{style}: min {lo}");
            assert!(hi <= 1.0 + EPS, "{style}: max {hi}");
        }
    }

    #[test]
    fn test_minmax_hits_both_ends() {
        let (v, out) = run(&[0.0, 5.0, 10.0], NormalizationStyle::MinMax);
        assert_eq!(v, vec![-1.0, 0.0, 1.0]);
        assert_eq!(out.world(), (-1.0, 1.0));
    }

    #[test]
    fn test_maxabs_keeps_zero_centered() {
        let (v, _) = run(&[-2.0, 0.0, 4.0], NormalizationStyle::MaxAbs);
        assert_eq!(v, vec![-0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_degenerate_column_unchanged() {
        for style in [
            NormalizationStyle::MinMax,
            NormalizationStyle::ZeroMax,
            NormalizationStyle::MaxAbs,
            NormalizationStyle::ThreeSigma,
        ] {
            let (v, out) = run(&[4.0, 4.0, 4.0], style);
            assert_eq!(v, vec![4.0, 4.0, 4.0], "{style}");
            assert_eq!(out.world(), (3.0, 5.0), "{style}");
        }
    }

    #[test]
    fn test_trim_only_changes_world_range() {
        let values: Vec<f32> = (0..2001).map(|i| i as f32).collect();
        let (v, out) = run(&values, NormalizationStyle::Trim1e2);
        assert_eq!(v, values);
        assert_eq!(out.world(), (10.0, 1990.0));

        let (_, out) = run(&values, NormalizationStyle::Trim1e3);
        assert_eq!(out.world(), (1.0, 1999.0));
    }

    #[test]
    fn test_threesigma_scaling() {
        let (v, out) = run(&[-1.0, 1.0], NormalizationStyle::ThreeSigma);
        // mean 0, sigma 1
        assert!((v[0] + 1.0 / 3.0).abs() < EPS);
        assert!((v[1] - 1.0 / 3.0).abs() < EPS);
        assert_eq!(out.world(), (-1.0, 1.0));
    }

    #[test]
    fn test_log10_warns_on_nonpositive() {
        let (v, out) = run(&[100.0, 10.0, -3.0, 0.0], NormalizationStyle::Log10);
        assert_eq!(v, vec![2.0, 1.0, 0.0, 0.0]);
        assert_eq!(out.world(), (0.0, 2.0));
        assert!(out.warning.unwrap().contains('2'));

        let (_, out) = run(&[1.0, 10.0], NormalizationStyle::Log10);
        assert!(out.warning.is_none());
    }

    #[test]
    fn test_rank_uses_permutation() {
        let (v, out) = run(&[30.0, 10.0, 20.0], NormalizationStyle::Rank);
        assert_eq!(v, vec![1.0, 0.0, 0.5]);
        assert_eq!(out.world(), (0.0, 1.0));
    }

    #[test]
    fn test_rank_twice_preserves_order() {
        let values = sample();
        let (once, _) = run(&values, NormalizationStyle::Rank);
        let (twice, _) = run(&once, NormalizationStyle::Rank);
        assert_eq!(stable_rank(&once), stable_rank(&twice));
        assert_eq!(stable_rank(&values), stable_rank(&twice));
    }

    #[test]
    fn test_gaussianize_is_ordered_around_median() {
        let values: Vec<f32> = (0..9).map(|i| (i * i) as f32).collect();
        let (v, out) = run(&values, NormalizationStyle::Gaussianize);
        // p = (rank + 1) / (n + 2) with n = 9.
        let expected = |rank: usize| (0.2 * inverse_normal_cdf((rank as f64 + 1.0) / 11.0)) as f32;
        assert!((v[0] - expected(0)).abs() < 1e-5);
        assert!((v[4] - expected(4)).abs() < 1e-5);
        assert!((v[8] - expected(8)).abs() < 1e-5);
        assert!(v[4].abs() < 0.05);
        assert!(v.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(out.world(), (v[0], v[8]));
    }

    #[test]
    fn test_inverse_normal_cdf_known_values() {
        assert!(inverse_normal_cdf(0.5).abs() < 1e-9);
        assert!((inverse_normal_cdf(0.975) - 1.959963985).abs() < 1e-6);
        assert!((inverse_normal_cdf(0.01) + 2.326347874).abs() < 1e-6);
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in NormalizationStyle::ALL {
            assert_eq!(style.name().parse::<NormalizationStyle>().unwrap(), style);
        }
        assert!("bogus".parse::<NormalizationStyle>().is_err());
    }
}
