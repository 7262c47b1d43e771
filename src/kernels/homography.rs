//! Homography kernel: 4-point minimal solver, transfer error, DLT refit.

use nalgebra::{DMatrix, DVector, Matrix3};

use crate::core::{DistanceKind, ModelKernel, OrsaError, PointError, Side};
use crate::kernels::hartley_normalize;
use crate::models::Homography;
use crate::types::{DataMatrix, CORRESPONDENCE_COLS};
use crate::utils::gauss_elimination;

const SAMPLE_SIZE: usize = 4;

/// Kernel fitting a homography to `[x1, y1, x2, y2]` correspondences.
///
/// The minimal solver fixes `h[2][2] = 1` and solves the resulting 8x8
/// system by Gaussian elimination; the refit uses a Hartley-normalized DLT
/// over all given indices. Errors are squared transfer distances measured in
/// the right image.
pub struct HomographyKernel {
    data: DataMatrix,
}

impl HomographyKernel {
    pub fn new(data: DataMatrix) -> Result<Self, OrsaError> {
        if data.ncols() != CORRESPONDENCE_COLS {
            return Err(OrsaError::BadDataShape(data.ncols()));
        }
        if data.nrows() < SAMPLE_SIZE {
            return Err(OrsaError::InsufficientCorrespondences {
                got: data.nrows(),
                needed: SAMPLE_SIZE,
            });
        }
        Ok(Self { data })
    }

    /// Minimal 4-point solver. An unsolvable (near-collinear) sample yields
    /// no model.
    fn solve_minimal(&self, sample: &[usize]) -> Option<Homography> {
        // Two rows per correspondence in the augmented system [A | b],
        // unknowns are the first eight entries of H.
        let mut augmented = DMatrix::<f64>::zeros(8, 9);
        for (i, &idx) in sample.iter().enumerate() {
            let x1 = self.data[(idx, 0)];
            let y1 = self.data[(idx, 1)];
            let x2 = self.data[(idx, 2)];
            let y2 = self.data[(idx, 3)];

            augmented[(2 * i, 0)] = -x1;
            augmented[(2 * i, 1)] = -y1;
            augmented[(2 * i, 2)] = -1.0;
            augmented[(2 * i, 6)] = x2 * x1;
            augmented[(2 * i, 7)] = x2 * y1;
            augmented[(2 * i, 8)] = -x2;

            augmented[(2 * i + 1, 3)] = -x1;
            augmented[(2 * i + 1, 4)] = -y1;
            augmented[(2 * i + 1, 5)] = -1.0;
            augmented[(2 * i + 1, 6)] = y2 * x1;
            augmented[(2 * i + 1, 7)] = y2 * y1;
            augmented[(2 * i + 1, 8)] = -y2;
        }

        let mut h = DVector::<f64>::zeros(8);
        if !gauss_elimination(&mut augmented, &mut h) {
            return None;
        }
        if h.iter().any(|v| !v.is_finite()) {
            return None;
        }

        Some(Homography::new(Matrix3::new(
            h[0], h[1], h[2], //
            h[3], h[4], h[5], //
            h[6], h[7], 1.0,
        )))
    }

    /// Hartley-normalized DLT over an arbitrary index subset.
    fn solve_dlt(&self, idxs: &[usize]) -> Option<Homography> {
        let n = idxs.len();
        if n < SAMPLE_SIZE {
            return None;
        }

        let norm = hartley_normalize(&self.data, idxs)?;

        let mut a = DMatrix::<f64>::zeros(2 * n, 9);
        for i in 0..n {
            let x1 = norm.points[(i, 0)];
            let y1 = norm.points[(i, 1)];
            let x2 = norm.points[(i, 2)];
            let y2 = norm.points[(i, 3)];

            a[(2 * i, 0)] = -x1;
            a[(2 * i, 1)] = -y1;
            a[(2 * i, 2)] = -1.0;
            a[(2 * i, 6)] = x2 * x1;
            a[(2 * i, 7)] = x2 * y1;
            a[(2 * i, 8)] = x2;

            a[(2 * i + 1, 3)] = -x1;
            a[(2 * i + 1, 4)] = -y1;
            a[(2 * i + 1, 5)] = -1.0;
            a[(2 * i + 1, 6)] = y2 * x1;
            a[(2 * i + 1, 7)] = y2 * y1;
            a[(2 * i + 1, 8)] = y2;
        }

        // Null vector of A = right singular vector of the smallest singular
        // value of A^T A.
        let ata = a.transpose() * &a;
        let svd = ata.svd(false, true);
        let v_t = svd.v_t?;
        let h = v_t.row(v_t.nrows() - 1);
        if h.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let mut h_norm = Matrix3::<f64>::zeros();
        for r in 0..3 {
            for c in 0..3 {
                h_norm[(r, c)] = h[3 * r + c];
            }
        }

        // Back to pixel coordinates, then fix the overall scale.
        let mut h_mat = norm.t2_inv * h_norm * norm.t1;
        let scale = h_mat[(2, 2)];
        if scale.abs() < 1e-12 {
            return None;
        }
        h_mat /= scale;
        Some(Homography::new(h_mat))
    }
}

impl ModelKernel for HomographyKernel {
    type Model = Homography;

    fn n_data(&self) -> usize {
        self.data.nrows()
    }

    fn sample_size(&self) -> usize {
        SAMPLE_SIZE
    }

    fn models_per_sample(&self) -> usize {
        1
    }

    fn distance_kind(&self) -> DistanceKind {
        DistanceKind::Point
    }

    fn compute_models(&self, sample: &[usize]) -> Vec<Homography> {
        if sample.len() != SAMPLE_SIZE {
            return Vec::new();
        }
        self.solve_minimal(sample).into_iter().collect()
    }

    fn error(&self, model: &Homography, index: usize) -> PointError {
        let x1 = self.data[(index, 0)];
        let y1 = self.data[(index, 1)];
        let x2 = self.data[(index, 2)];
        let y2 = self.data[(index, 3)];

        let value = match model.transform(x1, y1) {
            Some((tx, ty)) => {
                let dx = tx - x2;
                let dy = ty - y2;
                dx * dx + dy * dy
            }
            None => f64::INFINITY,
        };
        PointError {
            value,
            side: Side::Right,
        }
    }

    fn refit(&self, inliers: &[usize]) -> Option<Homography> {
        self.solve_dlt(inliers)
    }
}
