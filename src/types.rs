//! Shared data representation for correspondence sets.
//!
//! Correspondences are stored in a single dynamic matrix with one row per
//! match and columns `[x1, y1, x2, y2]`. Kernels capture this matrix at
//! construction time and treat it as immutable for the whole run.

use nalgebra::DMatrix;

use crate::core::OrsaError;

/// Dynamic matrix of `f64` holding one correspondence per row.
pub type DataMatrix = DMatrix<f64>;

/// Number of columns a correspondence matrix must have.
pub const CORRESPONDENCE_COLS: usize = 4;

/// Assemble a correspondence matrix from two Nx2 point matrices.
///
/// Row `i` of the result is `[x1, y1, x2, y2]` taken from row `i` of each
/// input. Fails if the inputs are not both Nx2 with the same N.
pub fn correspondence_matrix(
    points1: &DMatrix<f64>,
    points2: &DMatrix<f64>,
) -> Result<DataMatrix, OrsaError> {
    if points1.ncols() != 2 || points2.ncols() != 2 || points1.nrows() != points2.nrows() {
        return Err(OrsaError::PointShapeMismatch);
    }

    let n = points1.nrows();
    let mut data = DataMatrix::zeros(n, CORRESPONDENCE_COLS);
    for i in 0..n {
        data[(i, 0)] = points1[(i, 0)];
        data[(i, 1)] = points1[(i, 1)];
        data[(i, 2)] = points2[(i, 0)];
        data[(i, 3)] = points2[(i, 1)];
    }
    Ok(data)
}
