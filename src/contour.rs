//! Region binarization, morphological closing, and contour filtering.
//!
//! Turns a cropped half-table image into a filtered list of shape
//! candidates. Printed marker lines and column separators are frequently
//! broken into dashes or anti-aliased into disconnected blobs at scan
//! resolution; a closing pass with a short horizontal bar bridges the gaps
//! so a single printed mark produces a single contour instead of several
//! fragments.
//!
//! Thresholding is deliberately manual and global (OpenCV THRESH_BINARY
//! semantics): scan exposure varies per capture batch, so the threshold is
//! a profile parameter, never auto-computed.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};

// ============================================================
// Binarization
// ============================================================

/// A binary image and its logical complement, produced by one threshold.
#[derive(Debug, Clone)]
pub struct BinaryPair {
    /// Pixels above the threshold are 255 (paper), the rest 0.
    pub binary: GrayImage,
    /// Pixels above the threshold are 0, the rest 255 (ink).
    pub inverted: GrayImage,
}

/// Apply a single global threshold, producing the binary image and its
/// complement.
pub fn binarize(gray: &GrayImage, threshold: u8) -> BinaryPair {
    let (width, height) = gray.dimensions();
    let mut binary = GrayImage::new(width, height);
    let mut inverted = GrayImage::new(width, height);
    for (src, (b, i)) in gray
        .pixels()
        .zip(binary.pixels_mut().zip(inverted.pixels_mut()))
    {
        if src.0[0] > threshold {
            b.0[0] = 255;
        } else {
            i.0[0] = 255;
        }
    }
    BinaryPair { binary, inverted }
}

// ============================================================
// Morphological closing (horizontal bar)
// ============================================================

/// Row-wise dilation with a centered horizontal bar of `width` pixels.
///
/// `imageproc`'s `dilate` is isotropic (L1/LInf balls); bridging dashed
/// horizontal lines needs a flat bar, so the window runs along rows only.
fn dilate_horizontal(image: &GrayImage, width: u32) -> GrayImage {
    row_filter(image, width, |a, b| a.max(b), 0)
}

/// Row-wise erosion with the same bar.
fn erode_horizontal(image: &GrayImage, width: u32) -> GrayImage {
    row_filter(image, width, |a, b| a.min(b), 255)
}

fn row_filter(image: &GrayImage, width: u32, fold: fn(u8, u8) -> u8, init: u8) -> GrayImage {
    let (w, h) = image.dimensions();
    let radius = (width / 2) as i64;
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = init;
            for dx in -radius..=radius {
                let sx = x as i64 + dx;
                if sx >= 0 && sx < w as i64 {
                    acc = fold(acc, image.get_pixel(sx as u32, y).0[0]);
                }
            }
            out.put_pixel(x, y, image::Luma([acc]));
        }
    }
    out
}

/// Morphological closing with a horizontal bar: dilate then erode.
///
/// Bridges foreground gaps of up to `width - 1` pixels along a row.
pub fn close_horizontal(image: &GrayImage, width: u32) -> GrayImage {
    erode_horizontal(&dilate_horizontal(image, width), width)
}

// ============================================================
// Contour extraction
// ============================================================

/// Outer contours of the inverted binary (ink regions) of `gray`.
pub fn extract_contours(gray: &GrayImage, threshold: u8) -> Vec<Contour<i32>> {
    let pair = binarize(gray, threshold);
    outer_contours(&pair.inverted)
}

/// Close dashed ink regions with a horizontal bar, then extract outer
/// contours. One printed marker line yields one contour.
pub fn close_and_extract(gray: &GrayImage, threshold: u8, kernel_width: u32) -> Vec<Contour<i32>> {
    let pair = binarize(gray, threshold);
    let closed = close_horizontal(&pair.inverted, kernel_width);
    outer_contours(&closed)
}

/// Outer-border contours of the foreground (nonzero) regions. Holes are
/// not needed for line or bubble detection.
pub fn outer_contours(foreground: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(foreground)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .collect()
}

// ============================================================
// Shape measures and filters
// ============================================================

/// Polygon area of a closed contour (shoelace formula).
pub fn contour_area(contour: &Contour<i32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..pts.len() {
        let p = pts[i];
        let q = pts[(i + 1) % pts.len()];
        acc += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    (acc.abs() as f64) / 2.0
}

/// Perimeter of a closed contour.
pub fn contour_perimeter(contour: &Contour<i32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 2 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..pts.len() {
        let p = pts[i];
        let q = pts[(i + 1) % pts.len()];
        let dx = f64::from(q.x - p.x);
        let dy = f64::from(q.y - p.y);
        acc += (dx * dx + dy * dy).sqrt();
    }
    acc
}

/// Circularity: `4 * pi * area / perimeter^2`, near 1.0 for a circle.
///
/// No accept/reject threshold is baked in; callers choose one per use case.
pub fn circularity(contour: &Contour<i32>) -> f64 {
    let perimeter = contour_perimeter(contour);
    if perimeter <= f64::EPSILON {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * contour_area(contour) / (perimeter * perimeter)
}

/// Keep only contours satisfying `predicate`.
pub fn filter_by_shape<F>(contours: Vec<Contour<i32>>, predicate: F) -> Vec<Contour<i32>>
where
    F: Fn(&Contour<i32>) -> bool,
{
    contours.into_iter().filter(|c| predicate(c)).collect()
}

/// Stable sort by polygon area. Descending picks the k largest regions
/// (page-section detection); ascending is occasionally useful for display.
pub fn sort_by_size(mut contours: Vec<Contour<i32>>, descending: bool) -> Vec<Contour<i32>> {
    contours.sort_by(|a, b| {
        let ord = contour_area(a)
            .partial_cmp(&contour_area(b))
            .unwrap_or(std::cmp::Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    contours
}
