//! Ordinary least squares for the in-process reference boundary.
//!
//! Normal equations with a tiny ridge term for numerical stability. Sized
//! for the parent counts causal graphs actually have (a handful), not for
//! wide design matrices.

/// A fitted least-squares model: intercept plus one coefficient per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Residual standard deviation (degrees-of-freedom corrected).
    pub noise_std: f64,
    /// Training-set R², a residual diagnostic, not a validation score.
    pub train_r2: f64,
}

const RIDGE: f64 = 1e-9;

/// Fit `y ≈ b0 + Σ b_i x_i` over row-major feature rows.
///
/// Returns `None` when there are fewer rows than unknowns or the system is
/// too ill-conditioned to solve.
pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Option<LeastSquaresFit> {
    let n = targets.len();
    if n == 0 || rows.len() != n {
        return None;
    }
    let k = rows[0].len();
    if rows.iter().any(|r| r.len() != k) || n < k + 1 {
        return None;
    }

    // Normal equations over the design matrix with a leading 1s column.
    let dim = k + 1;
    let mut xtx = vec![vec![0.0f64; dim]; dim];
    let mut xty = vec![0.0f64; dim];

    for (row, &y) in rows.iter().zip(targets) {
        let mut design = Vec::with_capacity(dim);
        design.push(1.0);
        design.extend_from_slice(row);
        for i in 0..dim {
            for j in 0..dim {
                xtx[i][j] += design[i] * design[j];
            }
            xty[i] += design[i] * y;
        }
    }
    for (i, diag) in xtx.iter_mut().enumerate() {
        diag[i] += RIDGE;
    }

    let beta = solve(&mut xtx, &mut xty)?;

    // Residual diagnostics.
    let mean_y = targets.iter().sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (row, &y) in rows.iter().zip(targets) {
        let mut pred = beta[0];
        for (b, x) in beta[1..].iter().zip(row) {
            pred += b * x;
        }
        ss_res += (y - pred).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }

    let dof = (n as f64 - dim as f64).max(1.0);
    let noise_std = (ss_res / dof).max(0.0).sqrt();
    let train_r2 = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(-1.0, 1.0)
    } else if ss_res <= 1e-12 {
        1.0
    } else {
        0.0
    };

    Some(LeastSquaresFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        noise_std: if noise_std.is_finite() { noise_std } else { 0.0 },
        train_r2,
    })
}

/// Gaussian elimination with partial pivoting; consumes its inputs.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for col in (row + 1)..n {
            sum -= a[row][col] * x[col];
        }
        x[row] = sum / a[row][row];
        if !x[row].is_finite() {
            return None;
        }
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_line() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..20).map(|i| 3.0 + 2.0 * i as f64).collect();

        let fit = fit(&rows, &targets).unwrap();
        assert!((fit.intercept - 3.0).abs() < 1e-6);
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-6);
        assert!(fit.noise_std < 1e-6);
        assert!(fit.train_r2 > 0.999);
    }

    #[test]
    fn test_two_features() {
        // y = 1 + 2a - 3b
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, (i * i % 7) as f64])
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect();

        let fit = fit(&rows, &targets).unwrap();
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((fit.coefficients[1] + 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_underdetermined_returns_none() {
        let rows = vec![vec![1.0, 2.0]];
        let targets = vec![1.0];
        assert!(fit(&rows, &targets).is_none());
    }

    #[test]
    fn test_constant_target_fits_intercept() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets = vec![5.0; 10];

        let fit = fit(&rows, &targets).unwrap();
        assert!((fit.intercept - 5.0).abs() < 1e-6);
        assert!(fit.coefficients[0].abs() < 1e-6);
        assert_eq!(fit.train_r2, 1.0);
    }
}
