//! Mark classification: which detected regions actually carry ink.
//!
//! Two classifiers cover the two mark styles on scoring material. Printed
//! category-marker lines are classified by shape alone (the predicate in
//! [`crate::config::MarkerCriteria`]). Filled bubbles are classified by
//! darkness: each candidate region is masked and the darkest one wins.

use image::{GrayImage, Luma};
use imageproc::contours::Contour;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::config::MarkerCriteria;
use crate::contour::BinaryPair;
use crate::geometry::{BoundingBox, Marker};

// ============================================================
// Pixel counting
// ============================================================

/// Ink and paper pixel counts per contour, index-aligned with the input.
#[derive(Debug, Clone, Default)]
pub struct PixelCounts {
    /// Ink pixels (set in the inverted binary) inside each contour.
    pub black: Vec<u32>,
    /// Paper pixels (set in the binary) inside each contour.
    pub white: Vec<u32>,
}

/// Rasterize a contour's interior into a mask image.
///
/// Contours with fewer than three points cannot form a polygon; their
/// bounding box stands in.
fn contour_mask(contour: &Contour<i32>, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let Some(bounds) = BoundingBox::of_points(&contour.points) else {
        return mask;
    };
    if contour.points.len() < 3 {
        fill_box(&mut mask, &bounds);
        return mask;
    }
    // draw_polygon_mut rejects a closing duplicate of the first point.
    let mut poly: Vec<Point<i32>> = contour.points.clone();
    if poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        fill_box(&mut mask, &bounds);
        return mask;
    }
    draw_polygon_mut(&mut mask, &poly, Luma([255]));
    mask
}

fn fill_box(mask: &mut GrayImage, bounds: &BoundingBox) {
    for y in bounds.y..bounds.y + bounds.h as i32 {
        for x in bounds.x..bounds.x + bounds.w as i32 {
            if x >= 0 && y >= 0 && (x as u32) < mask.width() && (y as u32) < mask.height() {
                mask.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
    }
}

fn count_in_mask(mask: &GrayImage, image: &GrayImage) -> u32 {
    mask.pixels()
        .zip(image.pixels())
        .filter(|(m, p)| m.0[0] > 0 && p.0[0] > 0)
        .count() as u32
}

/// Count ink and paper pixels inside each contour.
pub fn count_pixels(contours: &[Contour<i32>], pair: &BinaryPair) -> PixelCounts {
    let (width, height) = pair.binary.dimensions();
    let mut counts = PixelCounts::default();
    for contour in contours {
        let mask = contour_mask(contour, width, height);
        counts.black.push(count_in_mask(&mask, &pair.inverted));
        counts.white.push(count_in_mask(&mask, &pair.binary));
    }
    counts
}

// ============================================================
// Darkness classification
// ============================================================

/// Pick the filled bubble among the candidate regions.
///
/// Candidates are ordered left to right by bounding box, the gray levels
/// under each mask are summed, and the lowest total wins. The returned
/// index is the left-to-right position (the answer-choice ordinal), not an
/// index into the input slice. Ties go to the leftmost candidate.
pub fn find_darkest(contours: &[Contour<i32>], gray: &GrayImage) -> Option<usize> {
    let (width, height) = gray.dimensions();

    let mut measured: Vec<(i32, u64)> = Vec::with_capacity(contours.len());
    for contour in contours {
        let Some(bounds) = BoundingBox::of_points(&contour.points) else {
            continue;
        };
        let mask = contour_mask(contour, width, height);
        let mut sum = 0u64;
        let mut area = 0u64;
        for (m, p) in mask.pixels().zip(gray.pixels()) {
            if m.0[0] > 0 {
                sum += u64::from(p.0[0]);
                area += 1;
            }
        }
        // A degenerate mask covers nothing and must not win with sum 0.
        let total = if area > 0 { sum } else { u64::MAX };
        measured.push((bounds.x, total));
    }
    if measured.is_empty() {
        return None;
    }

    measured.sort_by_key(|(x, _)| *x);
    let mut darkest = 0usize;
    for (i, (_, total)) in measured.iter().enumerate() {
        if *total < measured[darkest].1 {
            darkest = i;
        }
    }
    Some(darkest)
}

// ============================================================
// Marker extraction
// ============================================================

/// Keep the contours whose bounding boxes pass the marker-line predicate
/// and lift them into [`Marker`]s. Degenerate contours are dropped.
pub fn extract_markers(contours: &[Contour<i32>], criteria: &MarkerCriteria) -> Vec<Marker> {
    contours
        .iter()
        .filter_map(Marker::from_contour)
        .filter(|m| criteria.accepts(&m.bounds))
        .collect()
}
