//! Captured-page registration against a clean reference page.
//!
//! Scans arrive skewed, scaled, and offset. Registration recovers the
//! projective transform between the captured page and the reference layout
//! so the fixed calibration boxes crop the right table regions:
//!
//! 1. Detect FAST-9 keypoints on both pages and describe them.
//! 2. Match descriptors with a ratio test.
//! 3. Fit a homography with RANSAC and refit on the inliers.
//! 4. Warp the capture into the reference frame, padding with white.
//!
//! The aligned page is self-checked with normalized cross-correlation
//! against the reference; callers decide what score is acceptable.

pub mod features;
pub mod homography;
pub mod types;

pub use self::types::{RegisterError, Result};

use std::path::Path;

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use nalgebra::Matrix3;
use tracing::debug;

use crate::config::RegistrationSettings;
use self::features::{detect_keypoints, match_keypoints};
use self::homography::{fit_ransac, RansacParams};

// ============================================================
// Constants
// ============================================================

/// A homography needs 4 correspondences; fewer matches cannot be fit.
const MIN_MATCHES: usize = 4;

/// Minimum RANSAC consensus before a fit is trusted.
const MIN_INLIERS: usize = 10;

// ============================================================
// Types
// ============================================================

/// Outcome of registering one captured page.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The capture warped into the reference frame, reference-sized,
    /// white-padded where the capture does not cover.
    pub aligned: GrayImage,
    /// Homography mapping capture coordinates to reference coordinates.
    pub homography: Matrix3<f64>,
    /// Ratio-test matches fed to RANSAC.
    pub match_count: usize,
    /// Per-match inlier flags under the final fit, aligned with the match
    /// list order.
    pub inlier_mask: Vec<bool>,
    /// Consensus inliers of the final fit.
    pub inlier_count: usize,
    /// Mean inlier reprojection error in pixels.
    pub mean_error: f64,
    /// Normalized cross-correlation of the aligned page against the
    /// reference, in [-1, 1].
    pub score: f64,
}

/// Holds the reference and capture pages and runs the registration.
#[derive(Debug, Clone)]
pub struct Registrar {
    settings: RegistrationSettings,
    reference: Option<GrayImage>,
    capture: Option<GrayImage>,
}

impl Registrar {
    pub fn new(settings: RegistrationSettings) -> Self {
        Self {
            settings,
            reference: None,
            capture: None,
        }
    }

    pub fn set_reference(&mut self, image: GrayImage) {
        self.reference = Some(image);
    }

    pub fn set_capture(&mut self, image: GrayImage) {
        self.capture = Some(image);
    }

    /// Load the reference page from disk as grayscale.
    pub fn load_reference(&mut self, path: &Path) -> Result<()> {
        self.reference = Some(load_gray(path)?);
        Ok(())
    }

    /// Load the captured page from disk as grayscale.
    pub fn load_capture(&mut self, path: &Path) -> Result<()> {
        self.capture = Some(load_gray(path)?);
        Ok(())
    }

    pub fn reference(&self) -> Option<&GrayImage> {
        self.reference.as_ref()
    }

    /// Register the loaded capture against the loaded reference.
    pub fn register(&self) -> Result<Registration> {
        let reference = self.reference.as_ref().ok_or(RegisterError::MissingReference)?;
        let capture = self.capture.as_ref().ok_or(RegisterError::MissingCapture)?;
        register_pages(reference, capture, &self.settings)
    }
}

// ============================================================
// Registration
// ============================================================

fn load_gray(path: &Path) -> Result<GrayImage> {
    if !path.exists() {
        return Err(RegisterError::ImageNotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_luma8())
}

/// Register `capture` against `reference` and warp it into the reference
/// frame.
pub fn register_pages(
    reference: &GrayImage,
    capture: &GrayImage,
    settings: &RegistrationSettings,
) -> Result<Registration> {
    let ref_keypoints = detect_keypoints(reference, settings.fast_threshold, settings.max_keypoints);
    let cap_keypoints = detect_keypoints(capture, settings.fast_threshold, settings.max_keypoints);
    debug!(
        reference = ref_keypoints.len(),
        capture = cap_keypoints.len(),
        "detected keypoints"
    );

    let matches = match_keypoints(&ref_keypoints, &cap_keypoints, settings.match_ratio);
    if matches.len() < MIN_MATCHES {
        return Err(RegisterError::NotEnoughMatches {
            needed: MIN_MATCHES,
            found: matches.len(),
        });
    }

    // H maps capture coordinates to reference coordinates.
    let src: Vec<[f64; 2]> = matches
        .iter()
        .map(|m| {
            let k = &cap_keypoints[m.capture];
            [f64::from(k.x), f64::from(k.y)]
        })
        .collect();
    let dst: Vec<[f64; 2]> = matches
        .iter()
        .map(|m| {
            let k = &ref_keypoints[m.reference];
            [f64::from(k.x), f64::from(k.y)]
        })
        .collect();

    let params = RansacParams {
        iterations: settings.ransac_iterations,
        inlier_threshold: settings.reprojection_threshold,
        min_inliers: MIN_INLIERS,
        seed: 0,
    };
    let fit = fit_ransac(&src, &dst, &params)?;
    debug!(
        matches = matches.len(),
        inliers = fit.inlier_count,
        mean_error = fit.mean_error,
        "homography fit"
    );

    let aligned = warp_to_reference(capture, &fit.h, reference.dimensions())?;
    let score = normalized_correlation(reference, &aligned);

    Ok(Registration {
        aligned,
        homography: fit.h,
        match_count: matches.len(),
        inlier_mask: fit.inlier_mask,
        inlier_count: fit.inlier_count,
        mean_error: fit.mean_error,
        score,
    })
}

/// Warp `capture` through `h` into a reference-sized white canvas.
fn warp_to_reference(
    capture: &GrayImage,
    h: &Matrix3<f64>,
    (width, height): (u32, u32),
) -> Result<GrayImage> {
    let coefficients = [
        h[(0, 0)] as f32,
        h[(0, 1)] as f32,
        h[(0, 2)] as f32,
        h[(1, 0)] as f32,
        h[(1, 1)] as f32,
        h[(1, 2)] as f32,
        h[(2, 0)] as f32,
        h[(2, 1)] as f32,
        h[(2, 2)] as f32,
    ];
    let projection = Projection::from_matrix(coefficients)
        .ok_or_else(|| RegisterError::Degenerate("homography is not invertible".into()))?;
    let mut canvas = GrayImage::new(width, height);
    warp_into(capture, &projection, Interpolation::Bilinear, Luma([255]), &mut canvas);
    Ok(canvas)
}

/// Zero-normalized cross-correlation over the overlapping region of two
/// images. 1.0 for identical content, near 0 for unrelated content.
pub fn normalized_correlation(a: &GrayImage, b: &GrayImage) -> f64 {
    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    let n = f64::from(width) * f64::from(height);
    if n < 2.0 {
        return 0.0;
    }

    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    for y in 0..height {
        for x in 0..width {
            sum_a += f64::from(a.get_pixel(x, y).0[0]);
            sum_b += f64::from(b.get_pixel(x, y).0[0]);
        }
    }
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for y in 0..height {
        for x in 0..width {
            let da = f64::from(a.get_pixel(x, y).0[0]) - mean_a;
            let db = f64::from(b.get_pixel(x, y).0[0]) - mean_b;
            cov += da * db;
            var_a += da * da;
            var_b += db * db;
        }
    }
    let denom = (var_a * var_b).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    cov / denom
}
