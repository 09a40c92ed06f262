//! Discrete-time algebraic Riccati equation solver.
//!
//! Solves the generalized discrete-time equation with cross weighting
//!
//! ```text
//! X = Q + AᵗXA − (L + AᵗXB)(R + BᵗXB)⁻¹(L + AᵗXB)ᵗ
//! ```
//!
//! for the stabilizing symmetric solution X. The recovery-policy pipeline
//! calls it with `A = I`, `B = Q·Fᵗ`, `Q = C`, `R = E`, `L = −D`, so the
//! solver's state dimension is the item count m and its input dimension the
//! sequence length n, the reverse of the usual naming.
//!
//! The interface is a trait so the backend stays swappable; the default
//! backend is a structure-preserving doubling iteration that needs nothing
//! beyond dense multiplies and inverses.

use ndarray::{Array1, Array2};
use ndarray_linalg::{Eig, Inverse};
use num_complex::Complex;

use crate::error::{GrpError, GrpResult};

/// Solution bundle returned by a [`DareSolver`].
#[derive(Debug, Clone)]
pub struct DareSolution {
    /// Stabilizing symmetric solution X, square in the state dimension.
    pub x: Array2<f64>,
    /// Reciprocal 1-norm condition estimate of `R + BᵗXB`, the matrix the
    /// feedback computation inverts. Near zero means the gain is unreliable.
    pub rcond: f64,
    /// Eigenvalues of the closed-loop matrix `A − B·K` with
    /// `K = (R + BᵗXB)⁻¹(L + AᵗXB)ᵗ`.
    pub closed_loop_eigenvalues: Array1<Complex<f64>>,
    /// Doubling steps taken before the iterate stagnated.
    pub iterations: usize,
}

impl DareSolution {
    /// Largest closed-loop eigenvalue modulus; below 1 for a stabilizing
    /// solution.
    pub fn spectral_radius(&self) -> f64 {
        self.closed_loop_eigenvalues
            .iter()
            .map(|lambda| lambda.norm())
            .fold(0.0, f64::max)
    }
}

/// Interface for discrete-time generalized Riccati backends.
///
/// Implementations must return the stabilizing solution of the equation in
/// the module docs or fail with [`GrpError::SolverConvergence`]; they never
/// return a non-stabilizing root.
pub trait DareSolver {
    /// Solve for the stabilizing X.
    ///
    /// # Arguments
    ///
    /// * `a` - state matrix, sd×sd
    /// * `b` - input matrix, sd×id
    /// * `q` - state weight, sd×sd symmetric
    /// * `r` - control weight, id×id symmetric, invertible
    /// * `l` - cross weight, sd×id
    fn solve(
        &self,
        a: &Array2<f64>,
        b: &Array2<f64>,
        q: &Array2<f64>,
        r: &Array2<f64>,
        l: &Array2<f64>,
    ) -> GrpResult<DareSolution>;
}

/// Structure-preserving doubling backend.
///
/// The cross term is first eliminated with `Â = A − BR⁻¹Lᵗ`,
/// `Q̂ = Q − LR⁻¹Lᵗ`, `G₀ = BR⁻¹Bᵗ`, after which the doubling recursion
///
/// ```text
/// W       = I + G·H
/// A_{k+1} = A·W⁻¹·A
/// G_{k+1} = G + A·W⁻¹·G·Aᵗ
/// H_{k+1} = H + Aᵗ·H·W⁻¹·A
/// ```
///
/// drives H quadratically to the stabilizing solution. Each step squares
/// the closed-loop horizon, so well-posed problems stagnate in a few dozen
/// steps at most.
///
/// # Examples
///
/// ```
/// use grp_rs::dare::{DareSolver, DoublingSolver};
/// use ndarray::arr2;
///
/// // Scalar equation whose stabilizing root solves x² − 0.25x − 1 = 0.
/// let a = arr2(&[[0.5]]);
/// let b = arr2(&[[1.0]]);
/// let q = arr2(&[[1.0]]);
/// let r = arr2(&[[1.0]]);
/// let l = arr2(&[[0.0]]);
///
/// let sol = DoublingSolver::default().solve(&a, &b, &q, &r, &l).unwrap();
/// let expected = (0.25 + (0.0625f64 + 4.0).sqrt()) / 2.0;
/// assert!((sol.x[[0, 0]] - expected).abs() < 1e-12);
/// assert!(sol.spectral_radius() < 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DoublingSolver {
    /// Relative stagnation threshold on successive iterates of X.
    pub tolerance: f64,
    /// Hard cap on doubling steps before declaring non-convergence.
    pub max_iterations: usize,
}

impl Default for DoublingSolver {
    fn default() -> Self {
        DoublingSolver {
            tolerance: 1e-13,
            max_iterations: 100,
        }
    }
}

impl DareSolver for DoublingSolver {
    fn solve(
        &self,
        a: &Array2<f64>,
        b: &Array2<f64>,
        q: &Array2<f64>,
        r: &Array2<f64>,
        l: &Array2<f64>,
    ) -> GrpResult<DareSolution> {
        let sd = a.nrows();
        let id = b.ncols();
        check_shape("A", a, (sd, sd))?;
        check_shape("B", b, (sd, id))?;
        check_shape("Q", q, (sd, sd))?;
        check_shape("R", r, (id, id))?;
        check_shape("L", l, (sd, id))?;

        let r_inv = r
            .inv()
            .map_err(|_| GrpError::SolverConvergence("control weight R is singular".to_string()))?;

        // Cross-term elimination.
        let br_inv = b.dot(&r_inv);
        let a_hat = a - &br_inv.dot(&l.t());
        let q_hat = q - &l.dot(&r_inv).dot(&l.t());

        let eye: Array2<f64> = Array2::eye(sd);
        let mut ak = a_hat;
        let mut gk = br_inv.dot(&b.t());
        let mut hk = symmetrize(&q_hat);
        let mut iterations = None;

        for step in 1..=self.max_iterations {
            let w = &eye + &gk.dot(&hk);
            let w_inv = w.inv().map_err(|_| {
                GrpError::SolverConvergence(format!(
                    "doubling step {} met a singular iteration matrix",
                    step
                ))
            })?;
            let awi = ak.dot(&w_inv);
            let a_next = awi.dot(&ak);
            let g_next = &gk + &awi.dot(&gk).dot(&ak.t());
            let h_next = &hk + &ak.t().dot(&hk).dot(&w_inv).dot(&ak);

            let delta = one_norm(&(&h_next - &hk));
            let scale = one_norm(&h_next).max(1.0);
            ak = a_next;
            gk = symmetrize(&g_next);
            hk = symmetrize(&h_next);
            if delta <= self.tolerance * scale {
                iterations = Some(step);
                break;
            }
        }

        let iterations = iterations.ok_or_else(|| {
            GrpError::SolverConvergence(format!(
                "no stabilizing solution after {} doubling steps",
                self.max_iterations
            ))
        })?;
        let x = hk;

        // Diagnostics are computed on the original cross-weighted equation.
        let w_final = r + &b.t().dot(&x).dot(b);
        let w_final_inv = w_final.inv().map_err(|_| {
            GrpError::SolverConvergence("R + BᵗXB is singular at the solution".to_string())
        })?;
        let lxb = l + &a.t().dot(&x).dot(b);
        let k_gain = w_final_inv.dot(&lxb.t());
        let a_closed = a - &b.dot(&k_gain);
        let (closed_loop_eigenvalues, _) = a_closed.eig().map_err(|_| {
            GrpError::SolverConvergence("closed-loop eigenvalue computation failed".to_string())
        })?;

        let norm_product = one_norm(&w_final) * one_norm(&w_final_inv);
        let rcond = if norm_product > 0.0 {
            1.0 / norm_product
        } else {
            0.0
        };

        let solution = DareSolution {
            x,
            rcond,
            closed_loop_eigenvalues,
            iterations,
        };
        let radius = solution.spectral_radius();
        if radius >= 1.0 + 1e-8 {
            return Err(GrpError::SolverConvergence(format!(
                "solution is not stabilizing: closed-loop spectral radius {:.6}",
                radius
            )));
        }
        Ok(solution)
    }
}

fn check_shape(name: &str, matrix: &Array2<f64>, expected: (usize, usize)) -> GrpResult<()> {
    if matrix.dim() != expected {
        return Err(GrpError::MalformedInput(format!(
            "solver operand {} has shape {:?}, expected {:?}",
            name,
            matrix.dim(),
            expected
        )));
    }
    Ok(())
}

/// Induced 1-norm: maximum absolute column sum.
fn one_norm(matrix: &Array2<f64>) -> f64 {
    let mut max = 0.0;
    for column in matrix.columns() {
        let sum: f64 = column.iter().map(|v| v.abs()).sum();
        if sum > max {
            max = sum;
        }
    }
    max
}

fn symmetrize(matrix: &Array2<f64>) -> Array2<f64> {
    (matrix + &matrix.t()) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_scalar_dare_known_root() {
        // x² − 0.25x − 1 = 0, positive root.
        let a = arr2(&[[0.5]]);
        let b = arr2(&[[1.0]]);
        let q = arr2(&[[1.0]]);
        let r = arr2(&[[1.0]]);
        let l = arr2(&[[0.0]]);
        let sol = DoublingSolver::default().solve(&a, &b, &q, &r, &l).unwrap();

        let expected = (0.25 + (0.0625f64 + 4.0).sqrt()) / 2.0;
        assert!((sol.x[[0, 0]] - expected).abs() < 1e-12);
        assert!(sol.spectral_radius() < 1.0);
        assert!(sol.rcond > 0.0 && sol.rcond <= 1.0);
        assert!(sol.iterations >= 1);
    }

    #[test]
    fn test_identity_state_with_cross_weight() {
        // A = I, B = 1, Q = 4, R = 2, L = 2: the fixed point is X = 2 and the
        // closed loop lands exactly at the origin.
        let a = arr2(&[[1.0]]);
        let b = arr2(&[[1.0]]);
        let q = arr2(&[[4.0]]);
        let r = arr2(&[[2.0]]);
        let l = arr2(&[[2.0]]);
        let sol = DoublingSolver::default().solve(&a, &b, &q, &r, &l).unwrap();

        assert!((sol.x[[0, 0]] - 2.0).abs() < 1e-12);
        assert!(sol.spectral_radius() < 1e-10);
    }

    #[test]
    fn test_wide_input_matrix() {
        // One state, two controls: X = 2 again, with R the 2×2 control
        // weight of a two-slot cycle on a single item.
        let a = arr2(&[[1.0]]);
        let b = arr2(&[[1.0, 1.0]]);
        let q = arr2(&[[8.0]]);
        let r = arr2(&[[6.0, 2.0], [2.0, 2.0]]);
        let l = arr2(&[[6.0, 2.0]]);
        let sol = DoublingSolver::default().solve(&a, &b, &q, &r, &l).unwrap();

        assert!((sol.x[[0, 0]] - 2.0).abs() < 1e-12);
        assert!(sol.spectral_radius() < 1e-10);
    }

    #[test]
    fn test_solution_is_symmetric() {
        let a = arr2(&[[0.9, 0.2], [0.0, 0.7]]);
        let b = arr2(&[[0.0], [1.0]]);
        let q = arr2(&[[1.0, 0.0], [0.0, 2.0]]);
        let r = arr2(&[[1.0]]);
        let l = arr2(&[[0.0], [0.0]]);
        let sol = DoublingSolver::default().solve(&a, &b, &q, &r, &l).unwrap();

        let n = sol.x.nrows();
        for i in 0..n {
            for j in 0..n {
                assert!((sol.x[[i, j]] - sol.x[[j, i]]).abs() < 1e-12);
            }
        }
        assert!(sol.spectral_radius() < 1.0);
    }

    #[test]
    fn test_uncontrollable_unit_mode_fails() {
        // A = 1 with B = 0: the mode sits on the unit circle and no control
        // reaches it, so there is no stabilizing solution.
        let a = arr2(&[[1.0]]);
        let b = arr2(&[[0.0]]);
        let q = arr2(&[[1.0]]);
        let r = arr2(&[[1.0]]);
        let l = arr2(&[[0.0]]);
        let err = DoublingSolver::default()
            .solve(&a, &b, &q, &r, &l)
            .unwrap_err();
        assert!(matches!(err, GrpError::SolverConvergence(_)));
    }

    #[test]
    fn test_singular_control_weight_fails() {
        let a = arr2(&[[0.5]]);
        let b = arr2(&[[1.0]]);
        let q = arr2(&[[1.0]]);
        let r = arr2(&[[0.0]]);
        let l = arr2(&[[0.0]]);
        let err = DoublingSolver::default()
            .solve(&a, &b, &q, &r, &l)
            .unwrap_err();
        assert!(matches!(err, GrpError::SolverConvergence(_)));
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let a = arr2(&[[0.5, 0.0], [0.0, 0.5]]);
        let b = arr2(&[[1.0], [0.0]]);
        let q = arr2(&[[1.0]]);
        let r = arr2(&[[1.0]]);
        let l = arr2(&[[0.0], [0.0]]);
        let err = DoublingSolver::default()
            .solve(&a, &b, &q, &r, &l)
            .unwrap_err();
        assert!(matches!(err, GrpError::MalformedInput(_)));
    }

    #[test]
    fn test_residual_of_returned_solution() {
        // The returned X must satisfy the defining equation.
        let a = arr2(&[[0.8, 0.1], [0.05, 0.9]]);
        let b = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
        let q = arr2(&[[2.0, 0.5], [0.5, 1.0]]);
        let r = arr2(&[[1.0, 0.0], [0.0, 3.0]]);
        let l = arr2(&[[0.1, 0.0], [0.0, 0.2]]);
        let sol = DoublingSolver::default().solve(&a, &b, &q, &r, &l).unwrap();
        let x = &sol.x;

        let lxb = &l + &a.t().dot(x).dot(&b);
        let w = &r + &b.t().dot(x).dot(&b);
        let w_inv = w.inv().unwrap();
        let rhs = q + &a.t().dot(x).dot(&a) - lxb.dot(&w_inv).dot(&lxb.t());
        let residual = x
            .iter()
            .zip(rhs.iter())
            .map(|(xi, ri)| (xi - ri).abs())
            .fold(0.0, f64::max);
        assert!(residual < 1e-10, "residual {}", residual);
    }
}
