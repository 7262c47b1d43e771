//! Model kernels: one per supported geometric model.

pub mod fundamental;
pub mod homography;

pub use fundamental::FundamentalKernel;
pub use homography::HomographyKernel;

use nalgebra::{DMatrix, Matrix3};

use crate::types::DataMatrix;

/// Hartley normalization of a correspondence subset: each image's points are
/// translated to their centroid and scaled to mean distance sqrt(2).
pub(crate) struct Normalization {
    /// Similarity applied to left-image points.
    pub t1: Matrix3<f64>,
    /// Similarity applied to right-image points.
    pub t2: Matrix3<f64>,
    /// Inverse of `t2`, for mapping models back to pixel coordinates.
    pub t2_inv: Matrix3<f64>,
    /// Normalized coordinates, one row `[x1, y1, x2, y2]` per subset entry.
    pub points: DMatrix<f64>,
}

/// Compute the normalization, or `None` when either point set collapses to a
/// single location.
pub(crate) fn hartley_normalize(data: &DataMatrix, idxs: &[usize]) -> Option<Normalization> {
    let n = idxs.len();
    if n == 0 {
        return None;
    }

    let mut cx1 = 0.0;
    let mut cy1 = 0.0;
    let mut cx2 = 0.0;
    let mut cy2 = 0.0;
    for &idx in idxs {
        cx1 += data[(idx, 0)];
        cy1 += data[(idx, 1)];
        cx2 += data[(idx, 2)];
        cy2 += data[(idx, 3)];
    }
    let inv_n = 1.0 / n as f64;
    cx1 *= inv_n;
    cy1 *= inv_n;
    cx2 *= inv_n;
    cy2 *= inv_n;

    let mut d1 = 0.0;
    let mut d2 = 0.0;
    for &idx in idxs {
        let dx1 = data[(idx, 0)] - cx1;
        let dy1 = data[(idx, 1)] - cy1;
        let dx2 = data[(idx, 2)] - cx2;
        let dy2 = data[(idx, 3)] - cy2;
        d1 += (dx1 * dx1 + dy1 * dy1).sqrt();
        d2 += (dx2 * dx2 + dy2 * dy2).sqrt();
    }
    d1 *= inv_n;
    d2 *= inv_n;
    if d1 < 1e-10 || d2 < 1e-10 {
        return None;
    }

    let s1 = std::f64::consts::SQRT_2 / d1;
    let s2 = std::f64::consts::SQRT_2 / d2;

    let t1 = Matrix3::new(s1, 0.0, -s1 * cx1, 0.0, s1, -s1 * cy1, 0.0, 0.0, 1.0);
    let t2 = Matrix3::new(s2, 0.0, -s2 * cx2, 0.0, s2, -s2 * cy2, 0.0, 0.0, 1.0);
    let t2_inv = Matrix3::new(1.0 / s2, 0.0, cx2, 0.0, 1.0 / s2, cy2, 0.0, 0.0, 1.0);

    let mut points = DMatrix::zeros(n, 4);
    for (i, &idx) in idxs.iter().enumerate() {
        points[(i, 0)] = (data[(idx, 0)] - cx1) * s1;
        points[(i, 1)] = (data[(idx, 1)] - cy1) * s1;
        points[(i, 2)] = (data[(idx, 2)] - cx2) * s2;
        points[(i, 3)] = (data[(idx, 3)] - cy2) * s2;
    }

    Some(Normalization {
        t1,
        t2,
        t2_inv,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalization_centers_and_scales() {
        let data = DMatrix::from_row_slice(
            3,
            4,
            &[
                0.0, 0.0, 10.0, 10.0, //
                4.0, 0.0, 14.0, 10.0, //
                2.0, 3.0, 12.0, 13.0,
            ],
        );
        let idxs = [0usize, 1, 2];
        let norm = hartley_normalize(&data, &idxs).unwrap();

        // Centroid of normalized points is the origin, mean norm is sqrt(2).
        for col_pair in [(0usize, 1usize), (2, 3)] {
            let mut cx = 0.0;
            let mut cy = 0.0;
            let mut d = 0.0;
            for i in 0..3 {
                cx += norm.points[(i, col_pair.0)];
                cy += norm.points[(i, col_pair.1)];
            }
            for i in 0..3 {
                let x = norm.points[(i, col_pair.0)];
                let y = norm.points[(i, col_pair.1)];
                d += (x * x + y * y).sqrt();
            }
            assert_abs_diff_eq!(cx / 3.0, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(cy / 3.0, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(d / 3.0, std::f64::consts::SQRT_2, epsilon = 1e-12);
        }

        // t2_inv really inverts t2.
        assert_abs_diff_eq!(norm.t2 * norm.t2_inv, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn coincident_points_are_rejected() {
        let data = DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 5.0, 5.0, 1.0, 2.0, 6.0, 7.0]);
        assert!(hartley_normalize(&data, &[0, 1]).is_none());
    }
}
