//! End-to-end page scanning: registration, cropping, detection, and grid
//! reconstruction for every section on every scoring-key page.
//!
//! The printed key spans three pages: English alone, Math alone, and
//! Reading plus Science sharing a page. Pages are independent, so they
//! scan in parallel.

use std::path::{Path, PathBuf};

use image::imageops::crop_imm;
use image::GrayImage;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::classify::extract_markers;
use crate::config::CaptureProfile;
use crate::contour::close_and_extract;
use crate::geometry::BoundingBox;
use crate::grid::{reconstruct, GridError, SectionGrid};
use crate::layout::{SectionKind, SectionLayout, PAGE_HEIGHT, PAGE_WIDTH};
use crate::register::{register_pages, RegisterError};

// ============================================================
// Constants
// ============================================================

/// Page image stems and the sections printed on each page.
const PAGE_FILES: [(&str, &[SectionKind]); 3] = [
    ("e.png", &[SectionKind::English]),
    ("m.png", &[SectionKind::Math]),
    ("rs.png", &[SectionKind::Reading, SectionKind::Science]),
];

/// Alignment self-check score below which the registration is suspect.
const MIN_ALIGNMENT_SCORE: f64 = 0.5;

// ============================================================
// Error Types
// ============================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reference page is {found_w}x{found_h}, calibration requires {expected_w}x{expected_h}")]
    ReferenceSize {
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },

    #[error("page image missing: {0}")]
    MissingPage(PathBuf),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Scanner
// ============================================================

/// Scans captured scoring-key pages against their reference pages.
#[derive(Debug, Clone)]
pub struct PageScanner {
    profile: CaptureProfile,
}

impl PageScanner {
    pub fn new(profile: CaptureProfile) -> Self {
        Self { profile }
    }

    /// Scan one captured page, recovering the grid of every section printed
    /// on it.
    pub fn scan_page(
        &self,
        reference: &GrayImage,
        capture: &GrayImage,
        sections: &[SectionKind],
    ) -> Result<Vec<(SectionKind, SectionGrid)>> {
        check_reference_size(reference)?;

        let registration = register_pages(reference, capture, &self.profile.registration)?;
        info!(
            matches = registration.match_count,
            inliers = registration.inlier_count,
            score = registration.score,
            "registered page"
        );
        if registration.score < MIN_ALIGNMENT_SCORE {
            warn!(
                score = registration.score,
                "alignment self-check is low; detection may be unreliable"
            );
        }

        sections
            .iter()
            .map(|&kind| {
                let grid = self.scan_section(&registration.aligned, kind)?;
                Ok((kind, grid))
            })
            .collect()
    }

    /// Detect and reconstruct one section on an already-aligned page.
    pub fn scan_section(&self, aligned: &GrayImage, kind: SectionKind) -> Result<SectionGrid> {
        let layout = SectionLayout::of(kind);
        let mut halves = [Vec::new(), Vec::new()];
        for (half, markers) in halves.iter_mut().enumerate() {
            let table = crop_table(aligned, &layout.tables[half]);
            let contours = close_and_extract(
                &table,
                self.profile.binary_threshold,
                self.profile.close_kernel_width,
            );
            *markers = extract_markers(&contours, &self.profile.marker);
            info!(
                section = ?kind,
                half,
                contours = contours.len(),
                markers = markers.len(),
                "extracted half-table markers"
            );
        }
        Ok(reconstruct(&layout, &mut halves, self.profile.collapse_delta)?)
    }

    /// Scan all three pages, loading `<stem>.png` from both directories.
    /// Pages are processed in parallel; sections come back in printed order.
    pub fn scan_directory(
        &self,
        reference_dir: &Path,
        capture_dir: &Path,
    ) -> Result<Vec<(SectionKind, SectionGrid)>> {
        let per_page: Vec<Vec<(SectionKind, SectionGrid)>> = PAGE_FILES
            .par_iter()
            .map(|&(stem, sections)| {
                let reference = load_page(&reference_dir.join(stem))?;
                let capture = load_page(&capture_dir.join(stem))?;
                self.scan_page(&reference, &capture, sections)
            })
            .collect::<Result<_>>()?;
        Ok(per_page.into_iter().flatten().collect())
    }
}

// ============================================================
// Helpers
// ============================================================

fn check_reference_size(reference: &GrayImage) -> Result<()> {
    let (w, h) = reference.dimensions();
    if (w, h) != (PAGE_WIDTH, PAGE_HEIGHT) {
        return Err(PipelineError::ReferenceSize {
            expected_w: PAGE_WIDTH,
            expected_h: PAGE_HEIGHT,
            found_w: w,
            found_h: h,
        });
    }
    Ok(())
}

fn crop_table(page: &GrayImage, table: &BoundingBox) -> GrayImage {
    crop_imm(page, table.x as u32, table.y as u32, table.w, table.h).to_image()
}

fn load_page(path: &Path) -> Result<GrayImage> {
    if !path.exists() {
        return Err(PipelineError::MissingPage(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_reference_size_is_enforced() {
        let scanner = PageScanner::new(CaptureProfile::default());
        let small = GrayImage::from_pixel(100, 100, Luma([255]));
        let err = scanner
            .scan_page(&small, &small, &[SectionKind::Math])
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReferenceSize { .. }));
    }

    #[test]
    fn test_scan_section_blank_page_is_empty() {
        let scanner = PageScanner::new(CaptureProfile::default());
        let blank = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255]));
        let grid = scanner.scan_section(&blank, SectionKind::Reading).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.question_count(), 40);
    }

    #[test]
    fn test_missing_page_error() {
        let scanner = PageScanner::new(CaptureProfile::default());
        let dir = tempfile::tempdir().unwrap();
        let err = scanner
            .scan_directory(dir.path(), dir.path())
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingPage(_)));
    }

    #[test]
    fn test_page_files_cover_all_sections() {
        let mut covered: Vec<SectionKind> = PAGE_FILES
            .iter()
            .flat_map(|(_, sections)| sections.iter().copied())
            .collect();
        for kind in SectionKind::all() {
            assert!(covered.contains(&kind));
        }
        covered.dedup();
        assert_eq!(covered.len(), 4);
    }
}
