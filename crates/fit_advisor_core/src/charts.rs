//! crates/fit_advisor_core/src/charts.rs
//!
//! The static size charts, one per product category.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::{Category, Metric, SizeLabel};
use crate::ports::{PortError, PortResult};

/// An inclusive measurement range in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: f64,
    pub max: f64,
}

impl SizeRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Size label -> metric -> range, for a single category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeChart {
    sizes: BTreeMap<SizeLabel, BTreeMap<Metric, SizeRange>>,
}

impl SizeChart {
    pub fn new(sizes: BTreeMap<SizeLabel, BTreeMap<Metric, SizeRange>>) -> Self {
        Self { sizes }
    }

    /// Iterates sizes in label order.
    pub fn iter(&self) -> impl Iterator<Item = (SizeLabel, &BTreeMap<Metric, SizeRange>)> {
        self.sizes.iter().map(|(label, ranges)| (*label, ranges))
    }

    pub fn labels(&self) -> Vec<SizeLabel> {
        self.sizes.keys().copied().collect()
    }

    pub fn contains(&self, label: SizeLabel) -> bool {
        self.sizes.contains_key(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// The label present in this chart closest to `label` in the size ordering.
    /// Ties resolve towards the smaller size. Returns `label` for an empty chart.
    pub fn nearest(&self, label: SizeLabel) -> SizeLabel {
        self.sizes
            .keys()
            .copied()
            .min_by_key(|candidate| candidate.index().abs_diff(label.index()))
            .unwrap_or(label)
    }

    /// The chart's middle label: `M` when charted, otherwise the nearest size to it.
    pub fn middle_label(&self) -> SizeLabel {
        self.nearest(SizeLabel::middle())
    }

    /// Human-readable ranges, e.g. `"92-98 cm"`.
    pub fn readable(&self) -> BTreeMap<SizeLabel, BTreeMap<Metric, String>> {
        self.sizes
            .iter()
            .map(|(label, ranges)| {
                let metrics = ranges
                    .iter()
                    .map(|(metric, range)| (*metric, format!("{}-{} cm", range.min, range.max)))
                    .collect();
                (*label, metrics)
            })
            .collect()
    }
}

/// Read-only lookup of size charts by category. Built once at startup.
#[derive(Debug, Clone)]
pub struct SizeChartStore {
    charts: HashMap<Category, SizeChart>,
}

impl SizeChartStore {
    pub fn new(charts: HashMap<Category, SizeChart>) -> Self {
        Self { charts }
    }

    /// The charts shipped with the service.
    pub fn builtin() -> Self {
        // (label, [(metric, min, max)]) per category; every category runs S..XXL.
        let steps = [SizeLabel::S, SizeLabel::M, SizeLabel::L, SizeLabel::XL, SizeLabel::XXL];
        let heights = [(160.0, 167.0), (167.0, 173.0), (173.0, 180.0), (180.0, 187.0), (187.0, 194.0)];

        let upper = [(86.0, Metric::Chest), (70.0, Metric::Waist)];
        let lower = [(70.0, Metric::Waist), (86.0, Metric::Hips)];

        let mut charts = HashMap::new();
        charts.insert(Category::UpperBody, stepped_chart(&steps, &heights, &upper, 6.0));
        charts.insert(Category::LowerBody, stepped_chart(&steps, &heights, &lower, 6.0));

        let mut outerwear = stepped_chart(&steps, &heights, &[(88.0, Metric::Chest)], 6.0);
        for (i, label) in steps.iter().enumerate() {
            let start = 42.0 + 2.0 * i as f64;
            if let Some(ranges) = outerwear.sizes.get_mut(label) {
                ranges.insert(Metric::Shoulder, SizeRange::new(start, start + 2.0));
            }
        }
        charts.insert(Category::Outerwear, outerwear);

        Self { charts }
    }

    /// Looks up the chart for a category.
    pub fn chart(&self, category: Category) -> PortResult<&SizeChart> {
        self.charts
            .get(&category)
            .ok_or_else(|| PortError::NotFound(format!("No size chart for {}", category)))
    }

    /// Parses a category name and looks up its chart.
    pub fn chart_by_name(&self, name: &str) -> PortResult<(Category, &SizeChart)> {
        let category: Category = name.parse()?;
        Ok((category, self.chart(category)?))
    }
}

/// Builds a chart where each metric range is `width` wide and moves up by
/// `width` per size step, starting at the given base.
fn stepped_chart(
    labels: &[SizeLabel],
    heights: &[(f64, f64)],
    bases: &[(f64, Metric)],
    width: f64,
) -> SizeChart {
    let sizes = labels
        .iter()
        .zip(heights)
        .enumerate()
        .map(|(i, (label, (h_min, h_max)))| {
            let mut ranges = BTreeMap::new();
            ranges.insert(Metric::Height, SizeRange::new(*h_min, *h_max));
            for (base, metric) in bases {
                let start = base + width * i as f64;
                ranges.insert(*metric, SizeRange::new(start, start + width));
            }
            (*label, ranges)
        })
        .collect();
    SizeChart::new(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_upper_body_matches_published_chart() {
        let store = SizeChartStore::builtin();
        let chart = store.chart(Category::UpperBody).unwrap();
        let m = chart.iter().find(|(label, _)| *label == SizeLabel::M).unwrap().1;
        assert_eq!(m[&Metric::Chest], SizeRange::new(92.0, 98.0));
        assert_eq!(m[&Metric::Waist], SizeRange::new(76.0, 82.0));
        assert_eq!(m[&Metric::Height], SizeRange::new(167.0, 173.0));
        assert_eq!(chart.labels().len(), 5);
    }

    #[test]
    fn builtin_outerwear_has_shoulder_ranges() {
        let store = SizeChartStore::builtin();
        let chart = store.chart(Category::Outerwear).unwrap();
        let xxl = chart.iter().find(|(label, _)| *label == SizeLabel::XXL).unwrap().1;
        assert_eq!(xxl[&Metric::Shoulder], SizeRange::new(50.0, 52.0));
        assert_eq!(xxl[&Metric::Chest], SizeRange::new(112.0, 118.0));
        assert!(!xxl.contains_key(&Metric::Waist));
    }

    #[test]
    fn unknown_category_name_is_not_found() {
        let store = SizeChartStore::builtin();
        assert!(matches!(
            store.chart_by_name("socks"),
            Err(PortError::NotFound(_))
        ));
        let (category, _) = store.chart_by_name("quan").unwrap();
        assert_eq!(category, Category::LowerBody);
    }

    #[test]
    fn nearest_snaps_into_the_chart() {
        let store = SizeChartStore::builtin();
        let chart = store.chart(Category::LowerBody).unwrap();
        assert_eq!(chart.nearest(SizeLabel::XS), SizeLabel::S);
        assert_eq!(chart.nearest(SizeLabel::L), SizeLabel::L);
        assert_eq!(chart.middle_label(), SizeLabel::M);
    }

    #[test]
    fn readable_chart_formats_ranges() {
        let store = SizeChartStore::builtin();
        let readable = store.chart(Category::UpperBody).unwrap().readable();
        assert_eq!(readable[&SizeLabel::S][&Metric::Chest], "86-92 cm");
    }
}
