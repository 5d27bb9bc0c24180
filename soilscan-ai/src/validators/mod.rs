//! Input validation

pub mod soil_gate;

pub use soil_gate::is_soil_image;
