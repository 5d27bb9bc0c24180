//! Static soil knowledge base
//!
//! Maps each [`SoilType`] to its fixed agronomic profile: handling
//! characteristics, estimated N-P-K levels, pH descriptor, display
//! metadata, and four ordered recommendations. The table is built once
//! and never mutated; `lookup` is total over the closed enumeration.

use crate::types::{
    NutrientLevels, PhEstimate, SoilCharacteristics, SoilProfile, SoilType,
};
use once_cell::sync::Lazy;

/// Look up the static profile for a soil type
pub fn lookup(soil_type: SoilType) -> &'static SoilProfile {
    match soil_type {
        SoilType::Clay => &CLAY,
        SoilType::Sandy => &SANDY,
        SoilType::Loamy => &LOAMY,
        SoilType::Silty => &SILTY,
        SoilType::Peaty => &PEATY,
        SoilType::Chalky => &CHALKY,
    }
}

fn profile(
    description: &str,
    color: &str,
    texture: &str,
    drainage: &str,
    water_retention: &str,
    workability: &str,
    nutrients: (u8, u8, u8),
    ph: (f64, &str, &str),
    recommendations: [&str; 4],
) -> SoilProfile {
    SoilProfile {
        description: description.to_string(),
        color: color.to_string(),
        characteristics: SoilCharacteristics {
            texture: texture.to_string(),
            drainage: drainage.to_string(),
            water_retention: water_retention.to_string(),
            workability: workability.to_string(),
        },
        nutrients: NutrientLevels {
            nitrogen: nutrients.0,
            phosphorus: nutrients.1,
            potassium: nutrients.2,
        },
        ph: PhEstimate {
            value: ph.0,
            range: ph.1.to_string(),
            status: ph.2.to_string(),
        },
        recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
    }
}

static CLAY: Lazy<SoilProfile> = Lazy::new(|| {
    profile(
        "Heavy, nutrient-rich soil with poor drainage",
        "#8B4513",
        "Heavy and sticky when wet",
        "Poor",
        "High",
        "Difficult",
        (75, 70, 80),
        (6.5, "6.0-7.0", "Slightly Acidic to Neutral"),
        [
            "Add organic matter to improve drainage",
            "Avoid working when wet",
            "Consider raised beds",
            "Grow crops: Broccoli, cabbage, beans",
        ],
    )
});

static SANDY: Lazy<SoilProfile> = Lazy::new(|| {
    profile(
        "Light, well-draining soil with low nutrients",
        "#F4A460",
        "Gritty and loose",
        "Excellent",
        "Low",
        "Easy",
        (40, 35, 30),
        (6.0, "5.5-6.5", "Acidic"),
        [
            "Add compost to retain moisture",
            "Mulch heavily to prevent drying",
            "Fertilize regularly",
            "Grow crops: Carrots, potatoes, lettuce",
        ],
    )
});

static LOAMY: Lazy<SoilProfile> = Lazy::new(|| {
    profile(
        "Ideal balanced soil with good drainage and nutrients",
        "#654321",
        "Smooth and slightly gritty",
        "Good",
        "Moderate",
        "Easy",
        (70, 65, 70),
        (6.8, "6.5-7.5", "Neutral"),
        [
            "Maintain with regular compost",
            "Ideal for most crops",
            "Practice crop rotation",
            "Grow crops: Tomatoes, peppers, most vegetables",
        ],
    )
});

static SILTY: Lazy<SoilProfile> = Lazy::new(|| {
    profile(
        "Smooth, moisture-retentive soil",
        "#A0522D",
        "Smooth and soapy",
        "Moderate",
        "High",
        "Moderate",
        (65, 60, 55),
        (6.5, "6.0-7.0", "Slightly Acidic to Neutral"),
        [
            "Add organic matter for structure",
            "Avoid compaction",
            "Mulch to prevent erosion",
            "Grow crops: Vegetables, grasses",
        ],
    )
});

static PEATY: Lazy<SoilProfile> = Lazy::new(|| {
    profile(
        "Organic-rich, acidic soil",
        "#2F1B0C",
        "Spongy and fibrous",
        "Good",
        "Very High",
        "Easy",
        (85, 50, 45),
        (5.0, "4.0-5.5", "Very Acidic"),
        [
            "Add lime to reduce acidity",
            "Ensure good drainage",
            "Rich in nutrients",
            "Grow crops: Root vegetables, brassicas",
        ],
    )
});

static CHALKY: Lazy<SoilProfile> = Lazy::new(|| {
    profile(
        "Alkaline soil with good drainage",
        "#D3D3D3",
        "Stony and gritty",
        "Excellent",
        "Low",
        "Moderate",
        (50, 55, 60),
        (7.5, "7.0-8.5", "Alkaline"),
        [
            "Add organic matter regularly",
            "Choose alkaline-tolerant plants",
            "Mulch to retain moisture",
            "Grow crops: Spinach, beets, cabbage",
        ],
    )
});
