//! Types and errors for page registration.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("no reference page loaded")]
    MissingReference,

    #[error("no captured page loaded")]
    MissingCapture,

    #[error("image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("not enough keypoint matches: need {needed}, found {found}")]
    NotEnoughMatches { needed: usize, found: usize },

    #[error("too few consensus inliers: need {needed}, found {found}")]
    InsufficientInliers { needed: usize, found: usize },

    #[error("degenerate homography: {0}")]
    Degenerate(String),
}

pub type Result<T> = std::result::Result<T, RegisterError>;
