use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_SQRT_2, PI};

/// Optional transform applied to the first two normalized axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AxisTransform {
    #[default]
    Identity,
    /// x' = (x + y)/sqrt(2), y' = (x - y)/sqrt(2)
    SumDifference,
    /// x' = atan2(y, x)/pi, y' = sqrt(x^2 + y^2)
    Polar,
}

impl AxisTransform {
    pub const ALL: [AxisTransform; 3] = [
        AxisTransform::Identity,
        AxisTransform::SumDifference,
        AxisTransform::Polar,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AxisTransform::Identity => "None",
            AxisTransform::SumDifference => "Sum vs. difference",
            AxisTransform::Polar => "Polar",
        }
    }

    /// Transform `x`/`y` in place. Returns the new world ranges of both
    /// axes, or `None` when the transform leaves the values untouched.
    pub fn apply(&self, x: &mut [f32], y: &mut [f32]) -> Option<((f32, f32), (f32, f32))> {
        assert_eq!(x.len(), y.len(), "axis buffers must have equal length");
        match self {
            AxisTransform::Identity => return None,
            AxisTransform::SumDifference => {
                for (xv, yv) in x.iter_mut().zip(y.iter_mut()) {
                    let (a, b) = (*xv, *yv);
                    *xv = (a + b) * FRAC_1_SQRT_2;
                    *yv = (a - b) * FRAC_1_SQRT_2;
                }
            }
            AxisTransform::Polar => {
                for (xv, yv) in x.iter_mut().zip(y.iter_mut()) {
                    let (a, b) = (*xv, *yv);
                    *xv = b.atan2(a) / PI;
                    *yv = (a * a + b * b).sqrt();
                }
            }
        }
        Some((extent(x), extent(y)))
    }
}

fn extent(values: &[f32]) -> (f32, f32) {
    let (lo, hi) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        (-1.0, 1.0)
    } else if hi > lo {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}
