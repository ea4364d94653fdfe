//! Capture-profile configuration.
//!
//! The shape-predicate bounds, the binarization threshold, and the
//! coordinate-collapsing delta were tuned empirically for one scan
//! resolution (850x1100). They are calibration inputs per capture profile,
//! not universal constants, so they load from a TOML file with the tuned
//! values as defaults:
//!
//! 1. Explicit `--profile` path
//! 2. `./keylift.toml`
//! 3. `<user config dir>/keylift/profile.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================
// Constants - tuned defaults for the canonical 850x1100 scan
// ============================================================

/// Global binarization threshold. The printed keys are near-white paper
/// with black ink; 250 separates them cleanly at this resolution.
pub const DEFAULT_BINARY_THRESHOLD: u8 = 250;

/// Pixel delta within which raw coordinates collapse to one logical value.
pub const DEFAULT_COLLAPSE_DELTA: i32 = 5;

/// Width of the horizontal closing bar that bridges dashed marker lines.
pub const DEFAULT_CLOSE_KERNEL_WIDTH: u32 = 5;

/// Local profile file name.
const LOCAL_PROFILE: &str = "keylift.toml";

/// Profile file under the user config dir.
const USER_PROFILE: &str = "keylift/profile.toml";

// ============================================================
// Error Types
// ============================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("profile not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Profile
// ============================================================

/// Shape bounds a contour must satisfy to count as a category-marker line.
///
/// All five clauses are necessary: loosening any one reintroduces false
/// positives (table borders, text serifs, solid fills).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkerCriteria {
    /// Reject noise specks below this bounding-box area.
    pub min_area: u32,
    /// Marker lines are at least this wide.
    pub min_width: u32,
    /// Table-border segments are much wider; cap the width.
    pub max_width: u32,
    /// Solid fills are taller; marker lines stay within this height.
    pub max_height: u32,
    /// Left edge of the table interior; the table's own border and the
    /// answer column sit left of it.
    pub interior_x: i32,
    /// Top edge of the table interior, below the heading row.
    pub interior_y: i32,
}

impl Default for MarkerCriteria {
    fn default() -> Self {
        Self {
            min_area: 20,
            min_width: 5,
            max_width: 30,
            max_height: 3,
            interior_x: 60,
            interior_y: 80,
        }
    }
}

impl MarkerCriteria {
    /// The canonical marker-line shape predicate.
    pub fn accepts(&self, bounds: &crate::geometry::BoundingBox) -> bool {
        bounds.aspect() >= 1.0
            && bounds.area() >= self.min_area
            && bounds.w >= self.min_width
            && bounds.w <= self.max_width
            && bounds.h <= self.max_height
            && bounds.x >= self.interior_x
            && bounds.y >= self.interior_y
    }
}

/// Registration knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistrationSettings {
    /// FAST-9 corner threshold.
    pub fast_threshold: u8,
    /// Keep at most this many keypoints per image, strongest first.
    pub max_keypoints: usize,
    /// Lowe ratio: a match is good only if nearest < ratio * second-nearest.
    pub match_ratio: f64,
    /// RANSAC inlier reprojection threshold in pixels.
    pub reprojection_threshold: f64,
    /// RANSAC iteration cap.
    pub ransac_iterations: usize,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            fast_threshold: 25,
            max_keypoints: 400,
            match_ratio: 0.7,
            reprojection_threshold: 5.0,
            ransac_iterations: 2000,
        }
    }
}

/// Tunable calibration for one capture batch (scanner, DPI, exposure).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureProfile {
    /// Global binarization threshold (0-255).
    pub binary_threshold: u8,
    /// Coordinate-collapsing delta in pixels.
    pub collapse_delta: i32,
    /// Horizontal closing-bar width in pixels.
    pub close_kernel_width: u32,
    /// Marker-line shape bounds.
    pub marker: MarkerCriteria,
    /// Registration knobs.
    pub registration: RegistrationSettings,
}

impl Default for CaptureProfile {
    fn default() -> Self {
        Self {
            binary_threshold: DEFAULT_BINARY_THRESHOLD,
            collapse_delta: DEFAULT_COLLAPSE_DELTA,
            close_kernel_width: DEFAULT_CLOSE_KERNEL_WIDTH,
            marker: MarkerCriteria::default(),
            registration: RegistrationSettings::default(),
        }
    }
}

impl CaptureProfile {
    /// Load a profile from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Load the first profile found in the search order, or the defaults.
    pub fn load() -> Result<Self> {
        let local = Path::new(LOCAL_PROFILE);
        if local.exists() {
            return Self::load_from_path(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join(USER_PROFILE);
            if user.exists() {
                return Self::load_from_path(&user);
            }
        }
        Ok(Self::default())
    }
}
