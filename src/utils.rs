//! Utility functions
//!
//! Small numeric helpers used by the gain calculations.

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(x: &[f32], y: &[f32]) -> f32 {
    x.iter().zip(y.iter()).map(|(x_, y_)| x_ * y_).sum()
}

/// Index into lower triangular packed storage for row `i`, column `j`,
/// with `j <= i`.
#[inline]
pub fn packed_index(i: usize, j: usize) -> usize {
    i * (i + 1) / 2 + j
}

/// Solve `(H + lambda * I) x = g` for a symmetric matrix `H` given in lower
/// triangular packed storage, using a Cholesky factorization of the
/// regularized system followed by forward and back substitution.
///
/// Arithmetic is unguarded IEEE float, the caller must supply finite inputs
/// and enough regularization to keep the system positive definite.
pub fn solve_regularized(hess: &[f32], grad: &[f32], lambda: f32) -> Vec<f32> {
    let n = grad.len();
    debug_assert_eq!(hess.len(), n * (n + 1) / 2);

    let mut chol = vec![0.0_f32; hess.len()];
    for i in 0..n {
        for j in 0..=i {
            let mut s = hess[packed_index(i, j)];
            if i == j {
                s += lambda;
            }
            for k in 0..j {
                s -= chol[packed_index(i, k)] * chol[packed_index(j, k)];
            }
            chol[packed_index(i, j)] = if i == j { s.sqrt() } else { s / chol[packed_index(j, j)] };
        }
    }

    // Forward substitution, L y = g.
    let mut y = vec![0.0_f32; n];
    for i in 0..n {
        let mut s = grad[i];
        for k in 0..i {
            s -= chol[packed_index(i, k)] * y[k];
        }
        y[i] = s / chol[packed_index(i, i)];
    }

    // Back substitution, L^T x = y.
    let mut x = vec![0.0_f32; n];
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in (i + 1)..n {
            s -= chol[packed_index(k, i)] * x[k];
        }
        x[i] = s / chol[packed_index(i, i)];
    }
    x
}
