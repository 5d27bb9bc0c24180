//! # SoilScan Common Library
//!
//! Shared code for the SoilScan crates:
//! - Error types (`Error`, `Result`)
//! - Configuration resolution (CLI → env → TOML → default)
//! - Event types and broadcast bus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
