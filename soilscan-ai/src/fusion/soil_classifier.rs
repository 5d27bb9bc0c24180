//! Soil type fusion and confidence scoring
//!
//! Blends two signals into one verdict: the remote model's label
//! predictions and the sampled color statistics. Color rules outrank
//! label matching by design (a dark, red-poor sample is peat no matter
//! what the label says); label substring mapping is the fallback and the
//! whole of the degraded (no-color) path.
//!
//! # Confidence
//! - Base: top prediction score × 100.
//! - Types with an expected-color reference (clay, sandy, loamy, peaty)
//!   blend in a color-match score: `100 − (|Δr|+|Δg|+|Δb|) / 7.65`
//!   (a full-scale 765 channel delta maps to 0), weighted 0.6 base /
//!   0.4 color.
//! - The standard path clamps to [60, 95]. The label-only path reports
//!   the base unclamped; a sub-60 value signals that the color channel
//!   was unavailable.

use crate::types::{ColorSample, DominantChannel, Prediction, SoilType};

/// Standard-path confidence bounds (percent)
const CONFIDENCE_MIN: f64 = 60.0;
const CONFIDENCE_MAX: f64 = 95.0;

/// Weights for the base/color confidence blend
const BASE_WEIGHT: f64 = 0.6;
const COLOR_WEIGHT: f64 = 0.4;

/// Maximum total channel delta (3 × 255) scaled to a 0-100 score
const CHANNEL_DELTA_SCALE: f64 = 7.65;

/// Label substrings mapped to soil types, checked in order. The synonym
/// terms mirror how classification models describe soil texture.
const LABEL_RULES: [(&str, SoilType); 11] = [
    ("clay", SoilType::Clay),
    ("heavy", SoilType::Clay),
    ("sand", SoilType::Sandy),
    ("light", SoilType::Sandy),
    ("loam", SoilType::Loamy),
    ("balanced", SoilType::Loamy),
    ("silt", SoilType::Silty),
    ("peat", SoilType::Peaty),
    ("organic", SoilType::Peaty),
    ("chalk", SoilType::Chalky),
    ("alkaline", SoilType::Chalky),
];

/// Expected mean color per soil type, where one is defined
///
/// Silty and chalky have no stable color signature and carry no
/// reference; their confidence uses the model score alone.
fn expected_color(soil_type: SoilType) -> Option<(u8, u8, u8)> {
    match soil_type {
        SoilType::Clay => Some((160, 80, 60)),
        SoilType::Sandy => Some((180, 160, 130)),
        SoilType::Loamy => Some((120, 85, 60)),
        SoilType::Peaty => Some((60, 45, 35)),
        SoilType::Silty | SoilType::Chalky => None,
    }
}

/// Determine the soil type from predictions and color statistics
///
/// Total: always returns exactly one type. Rule order is a deliberate
/// priority, first match wins:
/// 1. dark sample with weak red → peaty
/// 2. red-dominant and strongly red → clay
/// 3. uniformly light → sandy
/// 4. top label substring mapping
/// 5. loamy fallback
pub fn determine_soil_type(predictions: &[Prediction], color: &ColorSample) -> SoilType {
    if color.is_dark && color.r < 80 {
        return SoilType::Peaty;
    }
    if color.dominant_channel == DominantChannel::Red && color.r > 120 {
        return SoilType::Clay;
    }
    if color.r > 150 && color.g > 140 && color.b > 120 {
        return SoilType::Sandy;
    }

    predictions
        .first()
        .and_then(|top| map_label_to_soil_type(&top.label))
        .unwrap_or(SoilType::Loamy)
}

/// Map a prediction label to a soil type by substring, if any rule hits
pub fn map_label_to_soil_type(label: &str) -> Option<SoilType> {
    let label = label.to_lowercase();
    LABEL_RULES
        .iter()
        .find(|(term, _)| label.contains(term))
        .map(|(_, soil_type)| *soil_type)
}

/// Score the verdict's confidence on the standard (color-aware) path
///
/// Clamped to [60, 95]; callers round to one decimal for display.
pub fn calculate_confidence(
    predictions: &[Prediction],
    color: &ColorSample,
    soil_type: SoilType,
) -> f64 {
    let base = predictions.first().map(|p| p.score * 100.0).unwrap_or(0.0);

    let blended = match expected_color(soil_type) {
        Some((er, eg, eb)) => {
            let delta = (color.r as f64 - er as f64).abs()
                + (color.g as f64 - eg as f64).abs()
                + (color.b as f64 - eb as f64).abs();
            let color_match = 100.0 - delta / CHANNEL_DELTA_SCALE;
            BASE_WEIGHT * base + COLOR_WEIGHT * color_match
        }
        None => base,
    };

    blended.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
}

/// Degraded classification when no color sample is available
///
/// Uses label substring mapping alone, with the loamy fallback, and
/// reports the raw model score as confidence (unclamped).
pub fn classify_label_only(predictions: &[Prediction]) -> (SoilType, f64) {
    let soil_type = predictions
        .first()
        .and_then(|top| map_label_to_soil_type(&top.label))
        .unwrap_or(SoilType::Loamy);
    let confidence = predictions.first().map(|p| p.score * 100.0).unwrap_or(0.0);

    (soil_type, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::round_to_tenth;

    fn prediction(label: &str, score: f64) -> Vec<Prediction> {
        vec![Prediction {
            label: label.to_string(),
            score,
        }]
    }

    #[test]
    fn dark_low_red_sample_is_always_peaty() {
        let color = ColorSample::from_means(50, 60, 70);
        assert!(color.is_dark);

        // Label content is irrelevant once rule 1 fires
        for label in ["clay soil", "sandy beach", "chalk cliff", "anything"] {
            assert_eq!(
                determine_soil_type(&prediction(label, 0.9), &color),
                SoilType::Peaty
            );
        }
    }

    #[test]
    fn red_dominant_bright_red_is_clay() {
        let color = ColorSample::from_means(140, 70, 55);
        assert_eq!(
            determine_soil_type(&prediction("loam field", 0.9), &color),
            SoilType::Clay
        );
    }

    #[test]
    fn uniformly_light_sample_is_sandy() {
        // Green-dominant so rule 2 cannot fire first
        let color = ColorSample::from_means(160, 170, 130);
        assert_eq!(
            determine_soil_type(&prediction("clay soil", 0.9), &color),
            SoilType::Sandy
        );
    }

    #[test]
    fn label_mapping_applies_when_color_rules_pass() {
        // Mid-tone, green-dominant: no color rule fires
        let color = ColorSample::from_means(100, 110, 90);

        for (label, expected) in [
            ("clay soil", SoilType::Clay),
            ("sand dune", SoilType::Sandy),
            ("loam field", SoilType::Loamy),
            ("silt deposit", SoilType::Silty),
            ("peat bog", SoilType::Peaty),
            ("chalk cliff", SoilType::Chalky),
            ("heavy ground", SoilType::Clay),
            ("organic matter", SoilType::Peaty),
        ] {
            assert_eq!(
                determine_soil_type(&prediction(label, 0.8), &color),
                expected,
                "label {label:?}"
            );
        }
    }

    #[test]
    fn unknown_labels_fall_back_to_loamy() {
        let color = ColorSample::from_means(100, 110, 90);
        assert_eq!(
            determine_soil_type(&prediction("unidentified object", 0.3), &color),
            SoilType::Loamy
        );
        assert_eq!(determine_soil_type(&[], &color), SoilType::Loamy);
    }

    #[test]
    fn clay_scenario_blends_to_86_2() {
        let predictions = prediction("clay soil", 0.80);
        let color = ColorSample::from_means(140, 70, 55);

        let soil_type = determine_soil_type(&predictions, &color);
        assert_eq!(soil_type, SoilType::Clay);

        // Δ = (20, 10, 5) against the clay reference (160, 80, 60):
        // color match ≈ 95.4, blended = 0.6·80 + 0.4·95.4 ≈ 86.17
        let confidence = calculate_confidence(&predictions, &color, soil_type);
        assert_eq!(round_to_tenth(confidence), 86.2);
    }

    #[test]
    fn confidence_is_clamped_to_standard_bounds() {
        let color = ColorSample::from_means(0, 255, 255);

        // Terrible color match and a weak score still floors at 60
        let low = calculate_confidence(&prediction("clay soil", 0.05), &color, SoilType::Clay);
        assert_eq!(low, 60.0);

        // Perfect score and perfect color match still caps at 95
        let perfect = ColorSample::from_means(160, 80, 60);
        let high = calculate_confidence(&prediction("clay soil", 1.0), &perfect, SoilType::Clay);
        assert_eq!(high, 95.0);
    }

    #[test]
    fn types_without_reference_use_base_alone() {
        let color = ColorSample::from_means(100, 110, 90);

        let silty = calculate_confidence(&prediction("silt deposit", 0.7), &color, SoilType::Silty);
        assert_eq!(silty, 70.0);

        let chalky =
            calculate_confidence(&prediction("chalk cliff", 0.88), &color, SoilType::Chalky);
        assert_eq!(chalky, 88.0);
    }

    #[test]
    fn label_only_path_reports_raw_score() {
        let (soil_type, confidence) = classify_label_only(&prediction("unidentified object", 0.3));
        assert_eq!(soil_type, SoilType::Loamy);
        assert_eq!(confidence, 30.0);

        let (soil_type, confidence) = classify_label_only(&prediction("peat bog", 0.92));
        assert_eq!(soil_type, SoilType::Peaty);
        assert_eq!(confidence, 92.0);
    }

    #[test]
    fn confidence_stays_within_bounds_across_inputs() {
        // Property sweep: any score and sample keeps the standard path in [60, 95]
        for score in [0.0, 0.2, 0.5, 0.8, 1.0] {
            for means in [(0u8, 0u8, 0u8), (80, 90, 70), (255, 255, 255)] {
                let color = ColorSample::from_means(means.0, means.1, means.2);
                for soil_type in SoilType::ALL {
                    let confidence =
                        calculate_confidence(&prediction("soil", score), &color, soil_type);
                    assert!(
                        (CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&confidence),
                        "confidence {confidence} out of bounds"
                    );
                }
            }
        }
    }
}
