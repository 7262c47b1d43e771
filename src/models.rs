//! Geometric model types produced by the kernels.

use nalgebra::{Matrix3, Vector3};

/// Planar projective transformation represented by a 3x3 matrix, normalized
/// so that the bottom-right entry is 1 whenever possible.
#[derive(Clone, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Apply the transform to a point; `None` when the point maps to the
    /// line at infinity.
    pub fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let p = self.h * Vector3::new(x, y, 1.0);
        if p.z.abs() < 1e-12 {
            return None;
        }
        Some((p.x / p.z, p.y / p.z))
    }
}

/// Fundamental matrix relating two uncalibrated pinhole views, satisfying
/// `x2^T F x1 = 0` for corresponding points.
#[derive(Clone, Debug, PartialEq)]
pub struct FundamentalMatrix {
    pub f: Matrix3<f64>,
}

impl FundamentalMatrix {
    pub fn new(f: Matrix3<f64>) -> Self {
        Self { f }
    }

    /// Epipolar line in the right image of a point in the left image, as
    /// `(a, b, c)` with the line `ax + by + c = 0`.
    pub fn epipolar_line(&self, x1: f64, y1: f64) -> (f64, f64, f64) {
        let l = self.f * Vector3::new(x1, y1, 1.0);
        (l.x, l.y, l.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homography_transforms_points() {
        // Pure translation by (2, -1).
        let h = Homography::new(Matrix3::new(1.0, 0.0, 2.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0));
        let (x, y) = h.transform(3.0, 4.0).unwrap();
        assert_eq!((x, y), (5.0, 3.0));
    }

    #[test]
    fn degenerate_transform_is_none() {
        let h = Homography::new(Matrix3::new(
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
        ));
        assert!(h.transform(1.0, 1.0).is_none());
    }

    #[test]
    fn epipolar_line_of_rectified_pair() {
        // F for a rectified stereo pair: x2^T F x1 = y1 - y2.
        let f = FundamentalMatrix::new(Matrix3::new(
            0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0,
        ));
        let (a, b, c) = f.epipolar_line(7.0, 3.0);
        // Horizontal line y = 3 in the right image.
        assert_eq!((a, b, c), (0.0, -1.0, 3.0));
    }
}
