//! crates/fit_advisor_core/src/recommend.rs
//!
//! The recommendation engine: scorer first, estimator as the fallback, and
//! model-written tips that are never allowed to fail the request.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::charts::{SizeChart, SizeChartStore};
use crate::domain::{
    AlternativeSize, Category, FitPreference, Measurements, SizeLabel, SizeRecommendation,
};
use crate::ports::{GenerationRequest, GenerationService, PortResult};
use crate::prompts::SIZE_TIPS_TEMPLATE;
use crate::scoring::{estimate, score};
use crate::validation::validate_measurements;

const MAX_CONFIDENCE: f64 = 0.95;
const MAX_ALTERNATIVE_CONFIDENCE: f64 = 0.90;
const FALLBACK_CONFIDENCE: f64 = 0.5;
const MAX_ALTERNATIVES: usize = 2;
const MAX_TIPS: usize = 3;

/// Everything needed to answer one size question.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeRequest {
    pub product_id: String,
    pub category: Category,
    pub measurements: Measurements,
    pub fit_preference: FitPreference,
}

pub struct RecommendationEngine {
    charts: Arc<SizeChartStore>,
    generator: Arc<dyn GenerationService>,
}

impl RecommendationEngine {
    pub fn new(charts: Arc<SizeChartStore>, generator: Arc<dyn GenerationService>) -> Self {
        Self { charts, generator }
    }

    /// Recommends a size for the shopper.
    ///
    /// Fails only on invalid measurements or an unknown category; a failing
    /// generation service just means canned tips.
    pub async fn recommend(&self, request: &SizeRequest) -> PortResult<SizeRecommendation> {
        info!(
            "Processing size recommendation for product {} ({})",
            request.product_id, request.category
        );
        validate_measurements(&request.measurements)?;
        let chart = self.charts.chart(request.category)?;

        let scores = score(chart, &request.measurements);
        let ranked = scores.ranked();

        let (picked, confidence) = match ranked.first() {
            Some((label, best)) if *best > 0.0 => (*label, (best / 100.0).min(MAX_CONFIDENCE)),
            _ => {
                let m = &request.measurements;
                (estimate(m.height, m.weight), FALLBACK_CONFIDENCE)
            }
        };
        let recommended = apply_fit_preference(snap_to_chart(chart, picked), request.fit_preference);

        let alternatives = ranked
            .iter()
            .filter(|(label, s)| *label != recommended && *s > 0.0)
            .take(MAX_ALTERNATIVES)
            .map(|(label, s)| AlternativeSize {
                size: *label,
                confidence: round2((s / 100.0).min(MAX_ALTERNATIVE_CONFIDENCE)),
                note: alternative_note(*label, recommended).to_string(),
            })
            .collect();

        let tips = self.tips(recommended, request).await;

        info!(
            "Size recommendation completed for product {}: {} at {:.2}",
            request.product_id, recommended, confidence
        );

        Ok(SizeRecommendation {
            recommended,
            confidence: round2(confidence),
            alternatives,
            tips,
            measurements_used: request.measurements,
        })
    }

    async fn tips(&self, size: SizeLabel, request: &SizeRequest) -> Vec<String> {
        let fmt_opt = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());
        let prompt = SIZE_TIPS_TEMPLATE
            .replace("{size}", size.as_str())
            .replace("{category}", request.category.as_str())
            .replace("{fit_preference}", &request.fit_preference.to_string())
            .replace("{height}", &fmt_opt(request.measurements.height))
            .replace("{weight}", &fmt_opt(request.measurements.weight));

        let generation = GenerationRequest::prompt(prompt).with_sampling(0.5, 256);
        match self.generator.generate(generation).await {
            Ok(text) => {
                let tips = split_tips(&text);
                if tips.is_empty() {
                    warn!("Tip generation returned no usable text; using canned tips");
                    canned_tips(size)
                } else {
                    tips
                }
            }
            Err(e) => {
                warn!("Failed to generate tips: {}", e);
                canned_tips(size)
            }
        }
    }
}

/// Hook for nudging the label by fit preference. Currently leaves it unchanged.
fn apply_fit_preference(label: SizeLabel, preference: FitPreference) -> SizeLabel {
    debug!("Fit preference {} read for {}; no adjustment rule configured", preference, label);
    label
}

fn snap_to_chart(chart: &SizeChart, label: SizeLabel) -> SizeLabel {
    if chart.is_empty() {
        label
    } else {
        chart.nearest(label)
    }
}

fn alternative_note(size: SizeLabel, recommended: SizeLabel) -> &'static str {
    if size < recommended {
        "Tighter fit, good if you like a close cut"
    } else {
        "Looser fit, good if you like a relaxed feel"
    }
}

fn split_tips(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
        .take(MAX_TIPS)
        .map(str::to_string)
        .collect()
}

fn canned_tips(size: SizeLabel) -> Vec<String> {
    vec![
        format!("Size {} is suggested based on your measurements", size),
        "If you prefer a looser fit, go one size up".to_string(),
    ]
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
