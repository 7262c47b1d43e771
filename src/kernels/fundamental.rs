//! Fundamental matrix kernel: 7-point minimal solver, epipolar distance,
//! normalized 8-point refit with rank-2 enforcement.

use nalgebra::{DMatrix, Matrix3};

use crate::core::{DistanceKind, ModelKernel, OrsaError, PointError, Side};
use crate::kernels::hartley_normalize;
use crate::models::FundamentalMatrix;
use crate::types::{DataMatrix, CORRESPONDENCE_COLS};
use crate::utils::solve_cubic_real;

const SAMPLE_SIZE: usize = 7;

/// Kernel fitting a fundamental matrix to `[x1, y1, x2, y2]` correspondences.
///
/// The minimal solver is the classical 7-point algorithm: the epipolar
/// constraints leave a two-dimensional null space `{F1, F2}`, and enforcing
/// `det(F) = 0` on the pencil `alpha F1 + (1 - alpha) F2` yields a cubic in
/// `alpha` with up to three real solutions. Both basis vectors are reachable
/// (`alpha = 1` and `alpha = 0`), which matters because on clean samples the
/// SVD often returns the rank-2 solution as a basis vector itself. Errors
/// are squared point-to-epipolar-line distances in the right image.
pub struct FundamentalKernel {
    data: DataMatrix,
}

impl FundamentalKernel {
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

    /// One row of the epipolar constraint matrix for `x2^T F x1 = 0`, with F
    /// flattened row-major.
    fn constraint_row(a: &mut DMatrix<f64>, row: usize, x1: f64, y1: f64, x2: f64, y2: f64) {
        a[(row, 0)] = x2 * x1;
        a[(row, 1)] = x2 * y1;
        a[(row, 2)] = x2;
        a[(row, 3)] = y2 * x1;
        a[(row, 4)] = y2 * y1;
        a[(row, 5)] = y2;
        a[(row, 6)] = x1;
        a[(row, 7)] = y1;
        a[(row, 8)] = 1.0;
    }

    fn seven_point(&self, sample: &[usize]) -> Vec<FundamentalMatrix> {
        let mut a = DMatrix::<f64>::zeros(SAMPLE_SIZE, 9);
        for (i, &idx) in sample.iter().enumerate() {
            Self::constraint_row(
                &mut a,
                i,
                self.data[(idx, 0)],
                self.data[(idx, 1)],
                self.data[(idx, 2)],
                self.data[(idx, 3)],
            );
        }

        // Two-dimensional null space of A: the right singular vectors of the
        // two smallest singular values of A^T A.
        let ata = a.transpose() * &a;
        let svd = ata.svd(false, true);
        let v_t = match svd.v_t {
            Some(v_t) => v_t,
            None => return Vec::new(),
        };

        let mut f1 = Matrix3::<f64>::zeros();
        let mut f2 = Matrix3::<f64>::zeros();
        for r in 0..3 {
            for c in 0..3 {
                f1[(r, c)] = v_t[(7, 3 * r + c)];
                f2[(r, c)] = v_t[(8, 3 * r + c)];
            }
        }

        // det(alpha*F1 + (1-alpha)*F2) is a cubic in alpha; recover its
        // coefficients from four evaluations. F1 and F2 are unit-norm rows
        // of V^T, so the determinants are well scaled.
        let d0 = f2.determinant();
        let d1 = f1.determinant();
        let dm1 = (f2 * 2.0 - f1).determinant();
        let d2 = (f1 * 2.0 - f2).determinant();

        let c0 = d0;
        let c2 = (d1 + dm1) / 2.0 - d0;
        let c3 = (d2 + 3.0 * d0 - 3.0 * d1 - dm1) / 6.0;
        let c1 = (d1 - dm1) / 2.0 - c3;

        const EPS: f64 = 1e-12;
        let mut alphas = [0.0f64; 3];
        let n_alphas = if c3.abs() > EPS {
            let mut roots = [0.0f64; 3];
            let n = solve_cubic_real(c2 / c3, c1 / c3, c0 / c3, &mut roots);
            alphas[..n].copy_from_slice(&roots[..n]);
            n
        } else if c2.abs() > EPS {
            let disc = c1 * c1 - 4.0 * c2 * c0;
            if disc < 0.0 {
                0
            } else {
                let sq = disc.sqrt();
                alphas[0] = (-c1 + sq) / (2.0 * c2);
                alphas[1] = (-c1 - sq) / (2.0 * c2);
                2
            }
        } else if c1.abs() > EPS {
            alphas[0] = -c0 / c1;
            1
        } else {
            // det vanishes on the whole pencil; both basis vectors already
            // satisfy the rank-2 constraint.
            alphas[0] = 0.0;
            alphas[1] = 1.0;
            2
        };

        let mut models = Vec::new();
        for &alpha in alphas.iter().take(n_alphas) {
            let mut f = f1 * alpha + f2 * (1.0 - alpha);
            let norm = f.norm();
            if norm < 1e-12 || f.iter().any(|v| !v.is_finite()) {
                continue;
            }
            f /= norm;
            models.push(FundamentalMatrix::new(f));
        }
        models
    }

    /// Normalized 8-point solve over an arbitrary subset, with the rank-2
    /// constraint enforced by zeroing the smallest singular value.
    fn eight_point(&self, idxs: &[usize]) -> Option<FundamentalMatrix> {
        let n = idxs.len();
        if n < 8 {
            return None;
        }

        let norm = hartley_normalize(&self.data, idxs)?;

        let mut a = DMatrix::<f64>::zeros(n, 9);
        for i in 0..n {
            Self::constraint_row(
                &mut a,
                i,
                norm.points[(i, 0)],
                norm.points[(i, 1)],
                norm.points[(i, 2)],
                norm.points[(i, 3)],
            );
        }

        let ata = a.transpose() * &a;
        let svd = ata.svd(false, true);
        let v_t = svd.v_t?;
        let f_vec = v_t.row(v_t.nrows() - 1);
        if f_vec.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let mut f_norm = Matrix3::<f64>::zeros();
        for r in 0..3 {
            for c in 0..3 {
                f_norm[(r, c)] = f_vec[3 * r + c];
            }
        }

        // Rank-2 projection in normalized coordinates.
        let mut f_svd = f_norm.svd(true, true);
        f_svd.singular_values[2] = 0.0;
        let f_rank2 = f_svd.recompose().ok()?;

        let mut f = norm.t2.transpose() * f_rank2 * norm.t1;
        let scale = f.norm();
        if scale < 1e-12 {
            return None;
        }
        f /= scale;
        Some(FundamentalMatrix::new(f))
    }
}

impl ModelKernel for FundamentalKernel {
    type Model = FundamentalMatrix;

    fn n_data(&self) -> usize {
        self.data.nrows()
    }

    fn sample_size(&self) -> usize {
        SAMPLE_SIZE
    }

    fn models_per_sample(&self) -> usize {
        3
    }

    fn distance_kind(&self) -> DistanceKind {
        DistanceKind::Line
    }

    fn compute_models(&self, sample: &[usize]) -> Vec<FundamentalMatrix> {
        if sample.len() != SAMPLE_SIZE {
            return Vec::new();
        }
        self.seven_point(sample)
    }

    fn error(&self, model: &FundamentalMatrix, index: usize) -> PointError {
        let x2 = self.data[(index, 2)];
        let y2 = self.data[(index, 3)];
        let (a, b, c) = model.epipolar_line(self.data[(index, 0)], self.data[(index, 1)]);

        let denom = a * a + b * b;
        let value = if denom < 1e-30 {
            f64::INFINITY
        } else {
            let signed = a * x2 + b * y2 + c;
            signed * signed / denom
        };
        PointError {
            value,
            side: Side::Right,
        }
    }

    fn refit(&self, inliers: &[usize]) -> Option<FundamentalMatrix> {
        self.eight_point(inliers)
    }
}
