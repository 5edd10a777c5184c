//! crates/fit_advisor_core/src/tryon.rs
//!
//! The three-stage virtual try-on pipeline.
//!
//! 1. Body analysis from the shopper's photo. A transport failure here is the
//!    only thing that fails a job; unreadable content becomes the neutral
//!    default analysis.
//! 2. Garment analysis from the product photo. Advisory only.
//! 3. Fit prediction from the body analysis and product details. Any failure
//!    yields an approximate prediction.

use std::sync::Arc;
use tracing::{info, warn};

use crate::charts::SizeChartStore;
use crate::domain::{
    new_job_id, BodyAnalysis, FitPrediction, GarmentAnalysis, ImageInput, JobMetadata,
    ProductInfo, SizeLabel, TryOnJob, TryOnResult,
};
use crate::jobs::JobStore;
use crate::payload::{parse_payload, parse_payload_or_else};
use crate::ports::{GenerationRequest, GenerationService, PortError, PortResult};
use crate::prompts::{BODY_ANALYSIS_PROMPT, FIT_PREDICTION_TEMPLATE, GARMENT_ANALYSIS_PROMPT};
use crate::validation::validate_image;

const TEMPERATURE: f32 = 0.3;
const MAX_OUTPUT_TOKENS: u32 = 1024;

pub struct TryOnPipeline {
    generator: Arc<dyn GenerationService>,
    charts: Arc<SizeChartStore>,
    jobs: JobStore,
}

impl TryOnPipeline {
    pub fn new(
        generator: Arc<dyn GenerationService>,
        charts: Arc<SizeChartStore>,
        jobs: JobStore,
    ) -> Self {
        Self {
            generator,
            charts,
            jobs,
        }
    }

    /// Validates the photos, records a job, runs the pipeline and stores the
    /// terminal state. Returns the job as stored.
    ///
    /// An empty `garment_photo` skips garment analysis.
    pub async fn submit(
        &self,
        product: &ProductInfo,
        user_photo: &ImageInput,
        garment_photo: &ImageInput,
    ) -> PortResult<TryOnJob> {
        validate_image(user_photo)?;
        if !garment_photo.is_empty() {
            validate_image(garment_photo)?;
        }

        let job_id = new_job_id();
        self.jobs
            .create(
                &job_id,
                JobMetadata {
                    product_id: product.id.clone(),
                },
            )
            .await?;

        match self.run(&job_id, user_photo, garment_photo, product).await {
            Ok(result) => self.jobs.complete(&job_id, result).await,
            Err(e) => self.jobs.fail(&job_id, e.to_string()).await,
        }
    }

    /// Runs the three stages in order. Errors only when the body analysis
    /// call itself fails.
    pub async fn run(
        &self,
        job_id: &str,
        user_photo: &ImageInput,
        garment_photo: &ImageInput,
        product: &ProductInfo,
    ) -> PortResult<TryOnResult> {
        info!("Processing try-on job {}", job_id);

        info!("Analyzing body for job {}", job_id);
        let (body_analysis, body_analysis_defaulted) =
            self.analyze_body(job_id, user_photo).await?;

        info!("Analyzing garment for job {}", job_id);
        let garment_analysis = self.analyze_garment(job_id, garment_photo).await;

        info!("Predicting fit for job {}", job_id);
        let fit_prediction = self.predict_fit(job_id, &body_analysis, product).await;

        info!("Try-on analysis completed for job {}", job_id);
        Ok(TryOnResult {
            body_analysis,
            body_analysis_defaulted,
            garment_analysis,
            fit_prediction,
        })
    }

    async fn analyze_body(
        &self,
        job_id: &str,
        photo: &ImageInput,
    ) -> PortResult<(BodyAnalysis, bool)> {
        let request = GenerationRequest::prompt(BODY_ANALYSIS_PROMPT)
            .with_image(photo.clone())
            .with_sampling(TEMPERATURE, MAX_OUTPUT_TOKENS);
        let text = match self.generator.generate(request).await {
            Ok(text) => text,
            // The call went through but carried no usable content.
            Err(PortError::MalformedResponse(reason)) => {
                warn!(
                    "Body analysis for job {} returned no usable content, using defaults: {}",
                    job_id, reason
                );
                return Ok((BodyAnalysis::default(), true));
            }
            Err(e) => {
                warn!("Body analysis call failed for job {}: {}", job_id, e);
                return Err(e);
            }
        };

        let mut defaulted = false;
        let analysis = parse_payload_or_else(&text, "body analysis", || {
            defaulted = true;
            BodyAnalysis::default()
        });
        Ok((analysis, defaulted))
    }

    async fn analyze_garment(&self, job_id: &str, photo: &ImageInput) -> Option<GarmentAnalysis> {
        if photo.is_empty() {
            return None;
        }
        let request = GenerationRequest::prompt(GARMENT_ANALYSIS_PROMPT)
            .with_image(photo.clone())
            .with_sampling(TEMPERATURE, MAX_OUTPUT_TOKENS);
        let outcome = match self.generator.generate(request).await {
            Ok(text) => parse_payload::<GarmentAnalysis>(&text),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!("Garment analysis skipped for job {}: {}", job_id, e);
                None
            }
        }
    }

    async fn predict_fit(
        &self,
        job_id: &str,
        body: &BodyAnalysis,
        product: &ProductInfo,
    ) -> FitPrediction {
        let fallback_size = self
            .charts
            .chart(product.category)
            .map(|chart| chart.middle_label())
            .unwrap_or_else(|_| SizeLabel::middle());

        let body_json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
        let prompt = FIT_PREDICTION_TEMPLATE
            .replace("{body_analysis}", &body_json)
            .replace("{product_type}", product.category.as_str())
            .replace("{product_name}", &product.name)
            .replace("{available_sizes}", &product.sizes.join(", "))
            .replace("{material}", &product.material);
        let request =
            GenerationRequest::prompt(prompt).with_sampling(TEMPERATURE, MAX_OUTPUT_TOKENS);

        let outcome = match self.generator.generate(request).await {
            Ok(text) => parse_payload::<FitPrediction>(&text),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(mut prediction) => {
                prediction.fit_confidence = prediction.fit_confidence.clamp(0.0, 1.0);
                prediction.approximate = false;
                prediction
            }
            Err(e) => {
                warn!("Fit prediction degraded for job {}: {}", job_id, e);
                FitPrediction::approximate(fallback_size)
            }
        }
    }
}
