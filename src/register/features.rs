//! Keypoint detection, binary patch descriptors, and ratio-test matching.
//!
//! Corners come from FAST-9. Each corner gets a 256-bit descriptor of
//! brightness comparisons between pixel pairs sampled from a fixed seeded
//! pattern around the corner, so descriptors are comparable across images
//! and across runs. Matching is exhaustive two-nearest-neighbour Hamming
//! search with Lowe's ratio test.

use image::GrayImage;
use imageproc::corners::corners_fast9;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================
// Constants
// ============================================================

/// Descriptor length in comparison bits.
const DESCRIPTOR_BITS: usize = 256;

/// Half-width of the square patch the comparison pairs are drawn from.
/// Corners closer than this to the border carry no descriptor and are
/// dropped.
const PATCH_RADIUS: i32 = 8;

/// Seed for the comparison-pair pattern. Both images must sample the same
/// pattern or their descriptors are incomparable.
const PATTERN_SEED: u64 = 0x4b65_794c_6966;

// ============================================================
// Types
// ============================================================

/// A corner with its binary descriptor.
#[derive(Debug, Clone)]
pub struct Keypoint {
    pub x: u32,
    pub y: u32,
    pub score: f32,
    descriptor: [u64; 4],
}

/// An accepted correspondence: indices into the two keypoint lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub reference: usize,
    pub capture: usize,
}

// ============================================================
// Detection
// ============================================================

/// Detect FAST-9 corners, keep the `max_keypoints` strongest, and attach
/// descriptors. Corners too close to the border are discarded.
pub fn detect_keypoints(gray: &GrayImage, fast_threshold: u8, max_keypoints: usize) -> Vec<Keypoint> {
    let (width, height) = gray.dimensions();
    let pattern = comparison_pattern();

    let mut corners = corners_fast9(gray, fast_threshold);
    corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut keypoints = Vec::with_capacity(max_keypoints.min(corners.len()));
    for corner in corners {
        if keypoints.len() == max_keypoints {
            break;
        }
        let (x, y) = (corner.x as i32, corner.y as i32);
        if x < PATCH_RADIUS
            || y < PATCH_RADIUS
            || x + PATCH_RADIUS >= width as i32
            || y + PATCH_RADIUS >= height as i32
        {
            continue;
        }
        keypoints.push(Keypoint {
            x: corner.x,
            y: corner.y,
            score: corner.score,
            descriptor: describe(gray, x, y, &pattern),
        });
    }
    keypoints
}

/// The fixed comparison-pair pattern: offsets within the descriptor patch.
fn comparison_pattern() -> Vec<(i32, i32, i32, i32)> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    (0..DESCRIPTOR_BITS)
        .map(|_| {
            (
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
            )
        })
        .collect()
}

fn describe(gray: &GrayImage, x: i32, y: i32, pattern: &[(i32, i32, i32, i32)]) -> [u64; 4] {
    let mut bits = [0u64; 4];
    for (i, &(ax, ay, bx, by)) in pattern.iter().enumerate() {
        let pa = gray.get_pixel((x + ax) as u32, (y + ay) as u32).0[0];
        let pb = gray.get_pixel((x + bx) as u32, (y + by) as u32).0[0];
        if pa < pb {
            bits[i / 64] |= 1u64 << (i % 64);
        }
    }
    bits
}

// ============================================================
// Matching
// ============================================================

fn hamming(a: &[u64; 4], b: &[u64; 4]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Exhaustive two-nearest-neighbour matching with Lowe's ratio test.
///
/// Each captured keypoint is compared against its two nearest reference
/// descriptors and accepted only when the nearest is clearly closer than
/// the second nearest (`nearest < ratio * second`). Ambiguous descriptors,
/// including exact ties, are rejected.
pub fn match_keypoints(reference: &[Keypoint], capture: &[Keypoint], ratio: f64) -> Vec<Match> {
    if reference.len() < 2 {
        return Vec::new();
    }
    let mut matches = Vec::new();
    for (ci, ck) in capture.iter().enumerate() {
        let mut best = u32::MAX;
        let mut second = u32::MAX;
        let mut best_idx = 0usize;
        for (ri, rk) in reference.iter().enumerate() {
            let d = hamming(&ck.descriptor, &rk.descriptor);
            if d < best {
                second = best;
                best = d;
                best_idx = ri;
            } else if d < second {
                second = d;
            }
        }
        if f64::from(best) < ratio * f64::from(second) {
            matches.push(Match {
                reference: best_idx,
                capture: ci,
            });
        }
    }
    matches
}
