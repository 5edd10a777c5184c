//! crates/fit_advisor_core/src/scoring.rs
//!
//! The deterministic part of size selection: the fit scorer and the
//! height/weight estimator used when scoring has nothing to go on.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::charts::{SizeChart, SizeRange};
use crate::domain::{Measurements, SizeLabel};

/// Closeness of fit per size label, each in `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FitScore(BTreeMap<SizeLabel, f64>);

impl FitScore {
    pub fn get(&self, label: SizeLabel) -> Option<f64> {
        self.0.get(&label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sizes by descending score. Equal scores keep the size ordering.
    pub fn ranked(&self) -> Vec<(SizeLabel, f64)> {
        let mut ranked: Vec<_> = self.0.iter().map(|(l, s)| (*l, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn best(&self) -> Option<(SizeLabel, f64)> {
        self.ranked().into_iter().next()
    }
}

/// Scores a single measurement against a single range.
fn contribution(range: &SizeRange, value: f64) -> f64 {
    if range.contains(value) {
        let spread = range.max - range.min;
        if spread <= 0.0 {
            return 100.0;
        }
        100.0 * (1.0 - 0.5 * (value - range.center()).abs() / spread)
    } else if value < range.min {
        (60.0 - 100.0 * (range.min - value) / range.min).max(0.0)
    } else {
        (60.0 - 100.0 * (value - range.max) / range.max).max(0.0)
    }
}

/// Scores every size in `chart` against the supplied measurements.
///
/// Only metrics present in both the chart entry and the measurements take
/// part; a size with no overlapping metric scores 0.
pub fn score(chart: &SizeChart, measurements: &Measurements) -> FitScore {
    let scores = chart
        .iter()
        .map(|(label, ranges)| {
            let contributions: Vec<f64> = ranges
                .iter()
                .filter_map(|(metric, range)| {
                    measurements.get(*metric).map(|v| contribution(range, v))
                })
                .collect();
            let score = if contributions.is_empty() {
                0.0
            } else {
                contributions.iter().sum::<f64>() / contributions.len() as f64
            };
            (label, score)
        })
        .collect();
    FitScore(scores)
}

/// The ladder the estimator moves along.
const ESTIMATE_LADDER: [SizeLabel; 5] = [
    SizeLabel::S,
    SizeLabel::M,
    SizeLabel::L,
    SizeLabel::XL,
    SizeLabel::XXL,
];

fn size_for_height(height: f64) -> SizeLabel {
    if height < 165.0 {
        SizeLabel::S
    } else if height < 173.0 {
        SizeLabel::M
    } else if height < 180.0 {
        SizeLabel::L
    } else {
        SizeLabel::XL
    }
}

fn size_for_weight(weight: f64) -> SizeLabel {
    if weight < 55.0 {
        SizeLabel::S
    } else if weight < 70.0 {
        SizeLabel::M
    } else if weight < 85.0 {
        SizeLabel::L
    } else {
        SizeLabel::XL
    }
}

fn step(label: SizeLabel, delta: isize) -> SizeLabel {
    let idx = ESTIMATE_LADDER
        .iter()
        .position(|l| *l == label)
        .unwrap_or(1) as isize;
    let clamped = (idx + delta).clamp(0, ESTIMATE_LADDER.len() as isize - 1);
    ESTIMATE_LADDER[clamped as usize]
}

/// Guesses a size from height and weight alone.
pub fn estimate(height: Option<f64>, weight: Option<f64>) -> SizeLabel {
    match (height, weight) {
        (Some(h), Some(w)) if h > 0.0 => {
            let base = size_for_height(h);
            let bmi = w / (h / 100.0).powi(2);
            if bmi > 28.0 {
                step(base, 1)
            } else if bmi < 20.0 {
                step(base, -1)
            } else {
                base
            }
        }
        (Some(h), _) => size_for_height(h),
        (None, Some(w)) => size_for_weight(w),
        (None, None) => SizeLabel::middle(),
    }
}
