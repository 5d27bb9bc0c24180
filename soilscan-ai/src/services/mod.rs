//! External service clients

pub mod archive_client;
pub mod inference_client;

pub use archive_client::{ArchiveClient, ArchiveError};
pub use inference_client::{InferenceClient, InferenceError};
