//! Homography estimation: DLT with Hartley normalization, wrapped in RANSAC.
//!
//! The captured page differs from the reference by an unknown projective
//! transform (scanner skew, slight rotation, scale). Four good
//! correspondences pin it down; RANSAC tolerates the bad ones that survive
//! the ratio test.

use nalgebra::{DMatrix, Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::types::{RegisterError, Result};

// ============================================================
// Projection helpers
// ============================================================

/// Project a point through a 3x3 homography: `H * [x, y, 1]^T -> [u, v]`.
pub fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let p = h * Vector3::new(x, y, 1.0);
    if p[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [p[0] / p[2], p[1] / p[2]]
}

/// Reprojection error `||project(H, src) - dst||` in pixels.
pub fn reprojection_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    let p = project(h, src[0], src[1]);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

// ============================================================
// DLT
// ============================================================

/// Translate the centroid to the origin and scale so the mean distance from
/// it is sqrt(2). Conditioning step for the DLT system.
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, normalized)
}

/// Direct Linear Transform from at least 4 correspondences.
///
/// Returns H with `dst ~= project(H, src)`, scaled so `h33 = 1` when
/// possible.
pub fn estimate_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Matrix3<f64>> {
    let n = src.len();
    if n < 4 || dst.len() < 4 {
        return Err(RegisterError::NotEnoughMatches {
            needed: 4,
            found: n.min(dst.len()),
        });
    }
    if src.len() != dst.len() {
        return Err(RegisterError::Degenerate(
            "correspondence lists differ in length".into(),
        ));
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    // Two rows per correspondence in the 2n x 9 system A h = 0.
    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // h is the eigenvector of A^T A with the smallest eigenvalue.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);
    let mut min_idx = 0;
    for i in 1..9 {
        if eig.eigenvalues[i].abs() < eig.eigenvalues[min_idx].abs() {
            min_idx = i;
        }
    }
    let h_norm = Matrix3::from_fn(|r, c| eig.eigenvectors[(3 * r + c, min_idx)]);

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| RegisterError::Degenerate("destination normalizer not invertible".into()))?;
    let h = t_dst_inv * h_norm * t_src;

    let scale = h[(2, 2)];
    if scale.abs() < 1e-15 {
        Ok(h)
    } else {
        Ok(h / scale)
    }
}

// ============================================================
// RANSAC
// ============================================================

/// RANSAC knobs for homography fitting.
#[derive(Debug, Clone)]
pub struct RansacParams {
    /// Iteration cap.
    pub iterations: usize,
    /// Reprojection error below which a correspondence counts as an inlier.
    pub inlier_threshold: f64,
    /// Reject the fit outright below this many inliers.
    pub min_inliers: usize,
    /// Seed for the minimal-sample draw. Fixed so runs are reproducible.
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 2000,
            inlier_threshold: 5.0,
            min_inliers: 10,
            seed: 0,
        }
    }
}

/// A consensus homography fit.
#[derive(Debug, Clone)]
pub struct RansacFit {
    /// Homography refit on all inliers.
    pub h: Matrix3<f64>,
    /// Per-correspondence inlier flags under the refit model.
    pub inlier_mask: Vec<bool>,
    /// Number of inliers under the refit model.
    pub inlier_count: usize,
    /// Mean reprojection error over the inliers.
    pub mean_error: f64,
}

/// Fit a homography to noisy correspondences with RANSAC, then refit on the
/// full inlier set.
pub fn fit_ransac(src: &[[f64; 2]], dst: &[[f64; 2]], params: &RansacParams) -> Result<RansacFit> {
    let n = src.len();
    if n < 4 {
        return Err(RegisterError::NotEnoughMatches { needed: 4, found: n });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best_count = 0usize;
    let mut best_mask = vec![false; n];
    let mut best_h = Matrix3::identity();

    for _ in 0..params.iterations {
        let sample = rand::seq::index::sample(&mut rng, n, 4);
        let s4: Vec<[f64; 2]> = sample.iter().map(|i| src[i]).collect();
        let d4: Vec<[f64; 2]> = sample.iter().map(|i| dst[i]).collect();

        let h = match estimate_dlt(&s4, &d4) {
            Ok(h) => h,
            Err(_) => continue,
        };

        let mut count = 0usize;
        let mut mask = vec![false; n];
        for i in 0..n {
            if reprojection_error(&h, src[i], dst[i]) < params.inlier_threshold {
                mask[i] = true;
                count += 1;
            }
        }

        if count > best_count {
            best_count = count;
            best_mask = mask;
            best_h = h;
            // Consensus above 90% will not improve meaningfully.
            if count * 10 > n * 9 {
                break;
            }
        }
    }

    if best_count < params.min_inliers {
        return Err(RegisterError::InsufficientInliers {
            needed: params.min_inliers,
            found: best_count,
        });
    }

    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let h_refit = estimate_dlt(&inlier_src, &inlier_dst).unwrap_or(best_h);

    let mut final_mask = vec![false; n];
    let mut inlier_count = 0usize;
    let mut error_sum = 0.0;
    for i in 0..n {
        let err = reprojection_error(&h_refit, src[i], dst[i]);
        if err < params.inlier_threshold {
            final_mask[i] = true;
            inlier_count += 1;
            error_sum += err;
        }
    }
    let mean_error = if inlier_count > 0 {
        error_sum / inlier_count as f64
    } else {
        f64::INFINITY
    };

    Ok(RansacFit {
        h: h_refit,
        inlier_mask: final_mask,
        inlier_count,
        mean_error,
    })
}
