//! Core domain types for soilscan-ai
//!
//! The data model for the classification pipeline: remote predictions,
//! sampled color statistics, the closed soil-type enumeration, the static
//! profile records attached to each type, and the result/history shapes.
//! Wire names are camelCase to match the persisted history format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Predictions
// ============================================================================

/// A label/score pair from the remote classification service
///
/// Scores are in [0, 1]; the service returns predictions ordered by
/// descending score and the list is never empty on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

// ============================================================================
// Color statistics
// ============================================================================

/// Which channel mean dominates a color sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominantChannel {
    Red,
    Green,
    Blue,
}

/// Mean-channel pixel statistics from the sampled image region
///
/// Immutable once computed. `brightness` is the plain channel average and
/// `is_dark` flags samples below the darkness threshold used by the
/// fusion rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub dominant_channel: DominantChannel,
    pub brightness: f64,
    pub is_dark: bool,
}

/// Brightness below this value marks a sample as dark
pub const DARKNESS_THRESHOLD: f64 = 100.0;

impl ColorSample {
    /// Build a sample from channel means, deriving the dominant channel
    /// (ties resolve red > green > blue), brightness, and darkness flag
    pub fn from_means(r: u8, g: u8, b: u8) -> Self {
        // Fixed tie-break priority: red > green > blue
        let dominant_channel = if r >= g && r >= b {
            DominantChannel::Red
        } else if g >= b {
            DominantChannel::Green
        } else {
            DominantChannel::Blue
        };
        let brightness = (r as f64 + g as f64 + b as f64) / 3.0;

        Self {
            r,
            g,
            b,
            dominant_channel,
            brightness,
            is_dark: brightness < DARKNESS_THRESHOLD,
        }
    }
}

// ============================================================================
// Soil types and profiles
// ============================================================================

/// Closed soil category enumeration
///
/// Every classification path resolves to exactly one member; `Loamy` is
/// the universal fallback when no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Clay,
    Sandy,
    Loamy,
    Silty,
    Peaty,
    Chalky,
}

impl SoilType {
    /// All members, in display order
    pub const ALL: [SoilType; 6] = [
        SoilType::Clay,
        SoilType::Sandy,
        SoilType::Loamy,
        SoilType::Silty,
        SoilType::Peaty,
        SoilType::Chalky,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "clay",
            SoilType::Sandy => "sandy",
            SoilType::Loamy => "loamy",
            SoilType::Silty => "silty",
            SoilType::Peaty => "peaty",
            SoilType::Chalky => "chalky",
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive handling characteristics of a soil type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilCharacteristics {
    pub texture: String,
    pub drainage: String,
    pub water_retention: String,
    pub workability: String,
}

/// Estimated macronutrient levels (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientLevels {
    pub nitrogen: u8,
    pub phosphorus: u8,
    pub potassium: u8,
}

/// Estimated pH descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhEstimate {
    pub value: f64,
    pub range: String,
    pub status: String,
}

/// Static agronomic record for one soil type
///
/// Defined once at process start by the knowledge base; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilProfile {
    /// One-line display description
    pub description: String,
    /// Display color (hex)
    pub color: String,
    pub characteristics: SoilCharacteristics,
    pub nutrients: NutrientLevels,
    #[serde(rename = "pH")]
    pub ph: PhEstimate,
    /// Exactly four ordered recommendation strings
    pub recommendations: Vec<String>,
}

// ============================================================================
// Analysis results and history
// ============================================================================

/// Final verdict of one analysis
///
/// Produced exactly once per successful analysis; owned by the caller.
/// `color_sample` is absent on the degraded (label-only) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub soil_type: SoilType,
    /// One-decimal percentage; [60, 95] on the standard path
    pub confidence: f64,
    pub characteristics: SoilCharacteristics,
    pub recommendations: Vec<String>,
    pub nutrients: NutrientLevels,
    #[serde(rename = "pH")]
    pub ph: PhEstimate,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color_sample: Option<ColorSample>,
    /// Up to three predictions, ordered by descending score
    pub top_predictions: Vec<Prediction>,
}

/// One persisted history entry
///
/// Owned by the history store; list order is recency order (most recent
/// first). `image_data` is the base64-encoded source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub image_data: String,
    pub result: AnalysisResult,
}

// ============================================================================
// Modes
// ============================================================================

/// Service mode, resolved once at startup from the credential flag
///
/// A configured credential commits the pipeline to real-service semantics;
/// inference failures are then reported, never masked with demo data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    RealService,
    DemoMode,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::RealService => "realService",
            AnalysisMode::DemoMode => "demoMode",
        }
    }
}

/// Round to one decimal place (confidence display precision)
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Tests
// ============================================================================
