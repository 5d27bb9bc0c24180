//! Fusion of model predictions and color statistics

pub mod soil_classifier;

pub use soil_classifier::{
    calculate_confidence, classify_label_only, determine_soil_type, map_label_to_soil_type,
};
