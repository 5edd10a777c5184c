//! crates/fit_advisor_core/src/domain.rs
//!
//! Defines the core data structures for the fit advisor.
//! Everything here is plain data; the components that act on it live in
//! their own modules.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::ports::PortError;

//=========================================================================================
// Sizes, Categories and Metrics
//=========================================================================================

/// An ordinal apparel size. The derive order is the size ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeLabel {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
}

impl SizeLabel {
    pub const ALL: [SizeLabel; 6] = [
        SizeLabel::XS,
        SizeLabel::S,
        SizeLabel::M,
        SizeLabel::L,
        SizeLabel::XL,
        SizeLabel::XXL,
    ];

    /// The middle of the ordering, used whenever no better answer exists.
    pub const fn middle() -> Self {
        SizeLabel::M
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeLabel::XS => "XS",
            SizeLabel::S => "S",
            SizeLabel::M => "M",
            SizeLabel::L => "L",
            SizeLabel::XL => "XL",
            SizeLabel::XXL => "XXL",
        }
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeLabel {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        SizeLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| PortError::Validation(format!("Unknown size label '{}'", s)))
    }
}

/// A product category, each with its own size chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[serde(alias = "upper_body", alias = "ao_thun")]
    UpperBody,
    #[serde(alias = "lower_body", alias = "quan")]
    LowerBody,
    #[serde(alias = "ao_khoac")]
    Outerwear,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::UpperBody, Category::LowerBody, Category::Outerwear];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::UpperBody => "upper-body",
            Category::LowerBody => "lower-body",
            Category::Outerwear => "outerwear",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PortError;

    /// Accepts the kebab-case name, its snake_case form, or a legacy product type name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upper-body" | "upper_body" | "ao_thun" => Ok(Category::UpperBody),
            "lower-body" | "lower_body" | "quan" => Ok(Category::LowerBody),
            "outerwear" | "ao_khoac" => Ok(Category::Outerwear),
            _ => Err(PortError::NotFound(format!("Unknown product category: {}", s))),
        }
    }
}

/// A body metric that size charts are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Height,
    Chest,
    Waist,
    Hips,
    Shoulder,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Height,
        Metric::Chest,
        Metric::Waist,
        Metric::Hips,
        Metric::Shoulder,
    ];
}

//=========================================================================================
// Measurements and Preferences
//=========================================================================================

/// Body measurements supplied by the shopper, in centimeters and kilograms.
/// `None` always means "not provided", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder: Option<f64>,
}

impl Measurements {
    /// Returns the value recorded for a charted metric, if any.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Height => self.height,
            Metric::Chest => self.chest,
            Metric::Waist => self.waist,
            Metric::Hips => self.hips,
            Metric::Shoulder => self.shoulder,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Measurements::default()
    }
}

/// How the shopper likes clothes to sit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPreference {
    Slim,
    #[default]
    Regular,
    Loose,
}

impl fmt::Display for FitPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitPreference::Slim => "slim",
            FitPreference::Regular => "regular",
            FitPreference::Loose => "loose",
        })
    }
}

//=========================================================================================
// Size Recommendation
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSize {
    pub size: SizeLabel,
    pub confidence: f64,
    pub note: String,
}

/// The answer to a size recommendation request. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRecommendation {
    pub recommended: SizeLabel,
    pub confidence: f64,
    pub alternatives: Vec<AlternativeSize>,
    pub tips: Vec<String>,
    pub measurements_used: Measurements,
}

//=========================================================================================
// Try-On
//=========================================================================================

/// An uploaded photo handed to the generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub mime_type: String,
    pub data: Bytes,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Product metadata used by the fit prediction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub sizes: Vec<String>,
    pub material: String,
}

impl ProductInfo {
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: "Product".to_string(),
            category,
            sizes: ["S", "M", "L", "XL"].iter().map(|s| s.to_string()).collect(),
            material: "cotton".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyProportions {
    #[serde(default)]
    pub upper_body: Option<String>,
    #[serde(default)]
    pub waist_definition: Option<String>,
}

/// What the vision model saw in the shopper's photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyAnalysis {
    pub body_type: String,
    #[serde(default)]
    pub estimated_height_range: Option<String>,
    pub shoulder_width: String,
    #[serde(default)]
    pub body_proportions: Option<BodyProportions>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for BodyAnalysis {
    fn default() -> Self {
        Self {
            body_type: "average".to_string(),
            estimated_height_range: Some("average (160-175cm)".to_string()),
            shoulder_width: "medium".to_string(),
            body_proportions: None,
            notes: Some("Could not analyse the photo in detail; using default values".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentAnalysis {
    pub garment_type: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub fit_type: Option<String>,
    #[serde(default)]
    pub notable_features: Vec<String>,
    #[serde(default)]
    pub recommended_body_types: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitPrediction {
    pub recommended_size: SizeLabel,
    pub fit_confidence: f64,
    #[serde(default)]
    pub fit_style: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fit_areas: BTreeMap<String, String>,
    #[serde(default)]
    pub styling_tips: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Set only on the fallback prediction produced without the model.
    #[serde(default)]
    pub approximate: bool,
}

impl FitPrediction {
    /// The prediction used when the model could not be asked or understood.
    pub fn approximate(size: SizeLabel) -> Self {
        Self {
            recommended_size: size,
            fit_confidence: 0.5,
            fit_style: None,
            description: Some(format!(
                "Prediction is approximate; size {} is suggested",
                size
            )),
            fit_areas: BTreeMap::new(),
            styling_tips: Vec::new(),
            warnings: Vec::new(),
            approximate: true,
        }
    }
}

/// Everything the try-on pipeline learned for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryOnResult {
    pub body_analysis: BodyAnalysis,
    /// True when the body analysis is the neutral default.
    pub body_analysis_defaulted: bool,
    pub garment_analysis: Option<GarmentAnalysis>,
    pub fit_prediction: FitPrediction,
}

//=========================================================================================
// Jobs
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        })
    }
}

/// Metadata recorded when a job is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub product_id: String,
}

/// A unit of try-on work. Only the job store mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryOnJob {
    pub job_id: String,
    pub status: JobStatus,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TryOnResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generates an opaque, practically unique job identifier.
pub fn new_job_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("tryon_{}", &hex[..12])
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedItem {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopperPreferences {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// Optional shopper context injected into the assistant's instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub cart_items: Vec<NamedItem>,
    #[serde(default)]
    pub recent_views: Vec<NamedItem>,
    #[serde(default)]
    pub preferences: Option<ShopperPreferences>,
}

/// A completed, non-streaming assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,
}
