//! keylift - recovers per-question reporting categories from scanned ACT
//! scoring-key pages.
//!
//! A scoring key prints one marker line per question in the column of each
//! reporting category the question counts toward. Recovering the key from a
//! scan runs in four stages:
//!
//! 1. [`register`]: align the captured page to a clean reference page with
//!    keypoint matching and a RANSAC homography.
//! 2. [`contour`]: crop each half-table, binarize, close dashed marker
//!    lines, and extract contours.
//! 3. [`classify`]: keep the contours shaped like marker lines.
//! 4. [`grid`]: collapse marker coordinates into logical rows and columns
//!    and snap every marker to its question and category.
//!
//! [`pipeline::PageScanner`] drives all four stages across the three key
//! pages, and [`render`] writes the recovered key as a category file.

pub mod classify;
pub mod cli;
pub mod config;
pub mod contour;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod pipeline;
pub mod register;
pub mod render;

pub use cli::{Cli, Commands, ScanArgs};
pub use config::{CaptureProfile, ConfigError, MarkerCriteria, RegistrationSettings};
pub use geometry::{BoundingBox, Marker};
pub use grid::{GridError, SectionGrid};
pub use layout::{SectionKind, SectionLayout, PAGE_HEIGHT, PAGE_WIDTH};
pub use pipeline::{PageScanner, PipelineError};
pub use register::{RegisterError, Registrar, Registration};
pub use render::{render_category_file, write_category_file, RenderError};

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 2;
}
