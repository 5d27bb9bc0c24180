//! Image feature extraction

pub mod color_extractor;

pub use color_extractor::{extract_color, DecodeError};
