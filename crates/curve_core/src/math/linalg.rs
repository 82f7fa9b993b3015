//! Dense linear algebra on top of `nalgebra`.
//!
//! Calibration Jacobians are small and dense (one row per curve node), so a
//! partial-pivoting LU factorisation is used throughout. Ill-conditioning is
//! detected from the ratio of the smallest to the largest absolute pivot of
//! the `U` factor.

use nalgebra::{DMatrix, DVector};

use crate::types::SolverError;

/// Default pivot ratio below which a matrix is treated as singular.
pub const DEFAULT_MIN_PIVOT_RATIO: f64 = 1e-14;

/// Ratio of smallest to largest absolute diagonal entry of the LU factor.
///
/// Returns 0.0 when every pivot is zero and 1.0 for an empty matrix.
pub fn pivot_ratio(matrix: &DMatrix<f64>) -> f64 {
    if matrix.is_empty() {
        return 1.0;
    }
    ratio_of(&matrix.clone().lu().u())
}

/// Solves `A·x = b` for square `A`.
///
/// # Errors
///
/// - `SolverError::DimensionMismatch` if `A` is not square or `b` has the
///   wrong length
/// - `SolverError::SingularMatrix` if the pivot ratio is below
///   `min_pivot_ratio` or the factorisation cannot be inverted
pub fn lu_solve(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    min_pivot_ratio: f64,
) -> Result<DVector<f64>, SolverError> {
    check_square(a)?;
    if b.len() != a.nrows() {
        return Err(SolverError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    if a.is_empty() {
        return Ok(DVector::zeros(0));
    }

    let lu = a.clone().lu();
    let ratio = ratio_of(&lu.u());
    if ratio < min_pivot_ratio {
        return Err(SolverError::SingularMatrix { pivot_ratio: ratio });
    }
    lu.solve(b)
        .ok_or(SolverError::SingularMatrix { pivot_ratio: ratio })
}

/// Inverts square `A`.
///
/// # Errors
///
/// Same conditions as [`lu_solve`].
pub fn lu_inverse(a: &DMatrix<f64>, min_pivot_ratio: f64) -> Result<DMatrix<f64>, SolverError> {
    check_square(a)?;
    if a.is_empty() {
        return Ok(DMatrix::zeros(0, 0));
    }

    let lu = a.clone().lu();
    let ratio = ratio_of(&lu.u());
    if ratio < min_pivot_ratio {
        return Err(SolverError::SingularMatrix { pivot_ratio: ratio });
    }
    lu.try_inverse()
        .ok_or(SolverError::SingularMatrix { pivot_ratio: ratio })
}

fn check_square(a: &DMatrix<f64>) -> Result<(), SolverError> {
    if a.nrows() != a.ncols() {
        return Err(SolverError::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    Ok(())
}

fn ratio_of(u: &DMatrix<f64>) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = 0.0_f64;
    for p in u.diagonal().iter() {
        if !p.is_finite() {
            return 0.0;
        }
        min = min.min(p.abs());
        max = max.max(p.abs());
    }
    if max == 0.0 {
        0.0
    } else {
        min / max
    }
}
