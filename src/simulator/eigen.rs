use crate::error::{KinError, Result};
use crate::model::DegradationModel;
use nalgebra::{DMatrix, DVector};

/// Solves the linear system `x' = A x` by eigen-decomposition and evaluates
/// `V diag(exp(lambda t)) c` at each output time, with `c` from
/// `V c = x0`.
///
/// There is no fallback for non-diagonalizable coefficient matrices
/// (repeated eigenvalues with a deficient eigenspace): the mixing
/// coefficients then cannot be solved for and the call fails.
pub fn solve_eigen(
    model: &DegradationModel,
    parms: &[f64],
    x0: &DVector<f64>,
    times: &[f64],
) -> Result<Vec<DVector<f64>>> {
    let matrix = model.coefficient_matrix().ok_or_else(|| {
        KinError::Strategy(
            "eigen solution requires a linear model with a coefficient matrix".to_string(),
        )
    })?;
    let n = model.n_states();
    let zero_state = DVector::zeros(n);
    let a = DMatrix::from_fn(n, n, |r, c| matrix[r][c].eval(0.0, &zero_state, parms));

    let eigenvalues = a.clone().schur().eigenvalues().ok_or_else(|| {
        KinError::IntegrationFailure(
            "coefficient matrix has complex eigenvalues".to_string(),
        )
    })?;

    // One eigenvector per eigenvalue from the null space of (A - lambda I).
    let mut v = DMatrix::zeros(n, n);
    for (j, &lambda) in eigenvalues.iter().enumerate() {
        let shifted = &a - DMatrix::identity(n, n) * lambda;
        let svd = shifted.svd(false, true);
        let v_t = svd.v_t.ok_or_else(|| {
            KinError::IntegrationFailure("SVD of shifted coefficient matrix failed".to_string())
        })?;
        // Singular values are sorted in decreasing order; the last right
        // singular vector spans the (numerical) null space.
        let eigvec = v_t.row(n - 1).transpose();
        v.set_column(j, &eigvec);
    }

    let c = v.clone().lu().solve(x0).ok_or_else(|| {
        KinError::IntegrationFailure(
            "eigenvector matrix is singular; the coefficient matrix is not diagonalizable"
                .to_string(),
        )
    })?;

    let mut states = Vec::with_capacity(times.len());
    for &t in times {
        let scaled = DVector::from_fn(n, |j, _| c[j] * (eigenvalues[j] * t).exp());
        let x = &v * scaled;
        if x.iter().any(|v| !v.is_finite()) {
            return Err(KinError::IntegrationFailure(format!(
                "non-finite state in eigen solution at t = {}",
                t
            )));
        }
        states.push(x);
    }
    Ok(states)
}
