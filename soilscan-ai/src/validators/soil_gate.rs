//! Soil image plausibility gate
//!
//! Decides whether a prediction list plausibly describes a soil
//! photograph before any fusion runs. Only the top predictions are
//! inspected; a single keyword hit is sufficient. A negative verdict is
//! terminal for the analysis (no result is produced).

use crate::types::Prediction;

/// How many top predictions are inspected
const INSPECTED_PREDICTIONS: usize = 5;

/// Labels containing any of these terms count as soil-related
const SOIL_KEYWORDS: [&str; 11] = [
    "soil",
    "dirt",
    "earth",
    "ground",
    "sand",
    "clay",
    "mud",
    "terrain",
    "land",
    "brown",
    "agricultural",
];

/// Return whether any of the top predictions carries a soil-related label
///
/// Matching is case-insensitive substring containment; the scan stops at
/// the first hit.
pub fn is_soil_image(predictions: &[Prediction]) -> bool {
    predictions
        .iter()
        .take(INSPECTED_PREDICTIONS)
        .any(|prediction| {
            let label = prediction.label.to_lowercase();
            SOIL_KEYWORDS.iter().any(|keyword| label.contains(keyword))
        })
}
