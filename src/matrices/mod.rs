//! Assembly of the recovery-policy matrices.
//!
//! Given the normalized inputs, this module builds the fixed matrices that
//! define the policy's quadratic cost and linear dynamics:
//!
//! - `F` (n×m): one-hot selection, row j picks the item run in slot j
//! - `Q` (m×m): `diag(p) − J`, the per-slot effect of extra run time on the
//!   production deviation of every item (J is the all-ones matrix)
//! - `R`, `S` (n×n): lower-triangular projections of `F·Q·Fᵗ`, with and
//!   without the diagonal
//! - `B`, `H` (m×m): diagonal cost coefficients `p·b/(p−1)`, `p·h/(p−1)`
//! - `Bb`, `Hb` (n×n): diagonals of `F·B·Fᵗ`, `F·H·Fᵗ`
//! - `C` (m×m), `D` (m×n), `E` (n×n): the composite weights handed to the
//!   Riccati solver
//!
//! Assembly is a pure function of the inputs: no I/O, no randomness, and a
//! fixed operation order, so identical inputs produce bit-identical output.

use ndarray::Array2;

use crate::error::{GrpError, GrpResult};
use crate::params::GrpInputs;

/// The fixed matrices of the recovery-policy cost and dynamics structure.
///
/// Shapes use m = number of items, n = sequence length.
#[derive(Debug, Clone)]
pub struct RecoveryMatrices {
    /// n×m one-hot selection matrix.
    pub f: Array2<f64>,
    /// m×m dynamics coupling `diag(p) − J`.
    pub q: Array2<f64>,
    /// n×n lower-triangular part of `F·Q·Fᵗ`, diagonal included.
    pub r: Array2<f64>,
    /// n×n strictly lower-triangular part of `F·Q·Fᵗ`.
    pub s: Array2<f64>,
    /// n×n diagonal backlog weight, the diagonal of `F·B·Fᵗ`.
    pub bb: Array2<f64>,
    /// n×n diagonal holding weight, the diagonal of `F·H·Fᵗ`.
    pub hb: Array2<f64>,
    /// m×m state weight `Fᵗ·(Bb+Hb)·F`.
    pub c: Array2<f64>,
    /// m×n cross weight `−Fᵗ·(Bb·S + Hb·R)`.
    pub d: Array2<f64>,
    /// n×n control weight `Sᵗ·Bb·S + Rᵗ·Hb·R`.
    pub e: Array2<f64>,
}

impl RecoveryMatrices {
    /// Number of items m.
    pub fn num_items(&self) -> usize {
        self.q.nrows()
    }

    /// Sequence length n.
    pub fn cycle_len(&self) -> usize {
        self.e.nrows()
    }

    /// `Q·Fᵗ` (m×n), the input matrix handed to the Riccati solver.
    pub fn qft(&self) -> Array2<f64> {
        self.q.dot(&self.f.t())
    }
}

/// Build every recovery-policy matrix from the normalized inputs.
///
/// The cross weight `D` is m×n: the outer `Fᵗ` is applied exactly once and
/// there is no trailing `F`, which is what the solver call site requires of
/// `L = −D`.
///
/// # Errors
///
/// Returns [`GrpError::SolverConvergence`] when some normalized production
/// rate equals 1. The cost coefficients divide by `p − 1`, so such an item
/// has no finite cost representation: the machine can never recover lost
/// output for it.
pub fn assemble(inputs: &GrpInputs) -> GrpResult<RecoveryMatrices> {
    let m = inputs.num_items();
    let n = inputs.cycle_len();

    for (i, &pi) in inputs.p.iter().enumerate() {
        if (pi - 1.0).abs() < f64::EPSILON {
            return Err(GrpError::SolverConvergence(format!(
                "item {}: normalized production rate is 1, cost matrices are undefined",
                i
            )));
        }
    }

    let mut f = Array2::zeros((n, m));
    for (j, &item) in inputs.seq.iter().enumerate() {
        f[[j, item]] = 1.0;
    }

    let q = Array2::from_diag(&inputs.p) - Array2::ones((m, m));

    // R keeps the lower triangle of F·Q·Fᵗ including the diagonal, S excludes it.
    let fqf = f.dot(&q).dot(&f.t());
    let mut r = Array2::zeros((n, n));
    let mut s = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            r[[i, j]] = fqf[[i, j]];
            if j < i {
                s[[i, j]] = fqf[[i, j]];
            }
        }
    }

    let pm1 = &inputs.p - 1.0;
    let ratio = &inputs.p / &pm1;
    let b_cost = Array2::from_diag(&(&ratio * &inputs.b));
    let h_cost = Array2::from_diag(&(&ratio * &inputs.h));

    let fbf = f.dot(&b_cost).dot(&f.t());
    let fhf = f.dot(&h_cost).dot(&f.t());
    let bb = Array2::from_diag(&fbf.diag().to_owned());
    let hb = Array2::from_diag(&fhf.diag().to_owned());

    let c = f.t().dot(&(&bb + &hb)).dot(&f);
    let d = f.t().dot(&(bb.dot(&s) + hb.dot(&r))).mapv(|v| -v);
    let e = s.t().dot(&bb).dot(&s) + r.t().dot(&hb).dot(&r);

    debug_assert_eq!(c.dim(), (m, m));
    debug_assert_eq!(d.dim(), (m, n));
    debug_assert_eq!(e.dim(), (n, n));

    Ok(RecoveryMatrices {
        f,
        q,
        r,
        s,
        bb,
        hb,
        c,
        d,
        e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{GrpInputs, GrpParams};
    use ndarray::{arr2, Array2};

    fn inputs(
        demand: &[f64],
        rates: &[f64],
        holding: &[f64],
        backlog: &[f64],
        seq: Vec<usize>,
    ) -> GrpInputs {
        let params = GrpParams {
            demand_rates: demand.to_vec(),
            production_rates: rates.to_vec(),
            machine_efficiency: 1.0,
            inventory_holding_costs: holding.to_vec(),
            backlog_costs: backlog.to_vec(),
            tolerance: 0.01,
        };
        GrpInputs::new(params, seq).unwrap()
    }

    fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_two_item_alternating_values() {
        // Two identical items at p = 3, unit costs, sequence [0, 1]: every
        // matrix has a small closed form.
        let inputs = inputs(&[1.0, 1.0], &[3.0, 3.0], &[1.0, 1.0], &[1.0, 1.0], vec![0, 1]);
        let mats = assemble(&inputs).unwrap();

        assert_eq!(mats.f, arr2(&[[1.0, 0.0], [0.0, 1.0]]));
        assert_eq!(mats.q, arr2(&[[2.0, -1.0], [-1.0, 2.0]]));
        assert_eq!(mats.r, arr2(&[[2.0, 0.0], [-1.0, 2.0]]));
        assert_eq!(mats.s, arr2(&[[0.0, 0.0], [-1.0, 0.0]]));
        assert_eq!(mats.bb, arr2(&[[1.5, 0.0], [0.0, 1.5]]));
        assert_eq!(mats.hb, arr2(&[[1.5, 0.0], [0.0, 1.5]]));
        assert!(max_abs_diff(&mats.c, &arr2(&[[3.0, 0.0], [0.0, 3.0]])) < 1e-12);
        assert!(max_abs_diff(&mats.d, &arr2(&[[-3.0, 0.0], [3.0, -3.0]])) < 1e-12);
        assert!(max_abs_diff(&mats.e, &arr2(&[[9.0, -3.0], [-3.0, 6.0]])) < 1e-12);
    }

    #[test]
    fn test_single_item_values() {
        let inputs = inputs(&[1.0], &[2.0], &[1.0], &[1.0], vec![0]);
        let mats = assemble(&inputs).unwrap();
        assert_eq!(mats.q, arr2(&[[1.0]]));
        assert_eq!(mats.c, arr2(&[[4.0]]));
        assert_eq!(mats.d, arr2(&[[-2.0]]));
        assert_eq!(mats.e, arr2(&[[2.0]]));
    }

    #[test]
    fn test_selection_matrix_is_one_hot() {
        let inputs = inputs(
            &[1.0, 1.0],
            &[4.0, 4.0],
            &[1.0, 1.0],
            &[1.0, 1.0],
            vec![0, 1, 0],
        );
        let mats = assemble(&inputs).unwrap();
        assert_eq!(mats.f.dim(), (3, 2));
        for row in mats.f.rows() {
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(row.iter().filter(|&&v| v == 0.0).count(), 1);
        }
        // Column sums count each item's occurrences in the sequence.
        let col_sums: Vec<f64> = (0..2).map(|j| mats.f.column(j).sum()).collect();
        assert_eq!(col_sums, vec![2.0, 1.0]);
    }

    #[test]
    fn test_triangular_structure() {
        let inputs = inputs(
            &[1.0, 1.0],
            &[4.0, 4.0],
            &[1.0, 2.0],
            &[2.0, 1.0],
            vec![0, 1, 0, 1],
        );
        let mats = assemble(&inputs).unwrap();
        let n = mats.cycle_len();
        let fqf = mats.f.dot(&mats.q).dot(&mats.f.t());
        for i in 0..n {
            // S has a zero diagonal; R carries the FQF diagonal.
            assert_eq!(mats.s[[i, i]], 0.0);
            assert_eq!(mats.r[[i, i]], fqf[[i, i]]);
            for j in 0..n {
                if j > i {
                    assert_eq!(mats.r[[i, j]], 0.0);
                    assert_eq!(mats.s[[i, j]], 0.0);
                } else if j < i {
                    assert_eq!(mats.r[[i, j]], fqf[[i, j]]);
                    assert_eq!(mats.s[[i, j]], fqf[[i, j]]);
                }
            }
        }
    }

    #[test]
    fn test_cost_projections_are_diagonal() {
        let inputs = inputs(
            &[1.0, 2.0, 1.0],
            &[5.0, 8.0, 5.0],
            &[1.0, 2.0, 3.0],
            &[3.0, 2.0, 1.0],
            vec![0, 1, 2, 0],
        );
        let mats = assemble(&inputs).unwrap();
        let n = mats.cycle_len();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    assert_eq!(mats.bb[[i, j]], 0.0);
                    assert_eq!(mats.hb[[i, j]], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_cross_weight_shape() {
        let inputs = inputs(
            &[1.0, 1.0],
            &[4.0, 4.0],
            &[1.0, 1.0],
            &[1.0, 1.0],
            vec![0, 1, 0],
        );
        let mats = assemble(&inputs).unwrap();
        assert_eq!(mats.c.dim(), (2, 2));
        assert_eq!(mats.d.dim(), (2, 3));
        assert_eq!(mats.e.dim(), (3, 3));
        assert_eq!(mats.qft().dim(), (2, 3));
    }

    #[test]
    fn test_unit_production_rate_is_fatal() {
        let inputs = inputs(&[1.0, 1.0], &[1.0, 3.0], &[1.0, 1.0], &[1.0, 1.0], vec![0, 1]);
        let err = assemble(&inputs).unwrap_err();
        assert!(matches!(err, GrpError::SolverConvergence(_)));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let inputs = inputs(
            &[1.0, 2.0],
            &[5.0, 7.0],
            &[1.5, 0.5],
            &[2.5, 1.5],
            vec![0, 1, 1],
        );
        let a = assemble(&inputs).unwrap();
        let b = assemble(&inputs).unwrap();
        assert_eq!(a.c, b.c);
        assert_eq!(a.d, b.d);
        assert_eq!(a.e, b.e);
    }
}
