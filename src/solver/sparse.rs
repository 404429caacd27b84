//! Global stiffness assembly and the iterative solve for large models
//!
//! Element matrices are scattered as COO triplets; duplicates are summed
//! when the matrix is compressed to CSR.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Accumulates element stiffness into an `n x n` global matrix
pub struct GlobalStiffness {
    n: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
}

impl GlobalStiffness {
    pub fn new(n: usize) -> Self {
        // 24-DOF shells dominate the fill of meshed models
        let guess = n * 48;
        Self {
            n,
            rows: Vec::with_capacity(guess),
            cols: Vec::with_capacity(guess),
            vals: Vec::with_capacity(guess),
        }
    }

    /// Scatter a square element matrix, given column-major, onto `dofs`
    pub fn scatter(&mut self, dofs: &[usize], k_elem: &[f64]) {
        let m = dofs.len();
        debug_assert_eq!(k_elem.len(), m * m);
        for (c, &gc) in dofs.iter().enumerate() {
            for (r, &gr) in dofs.iter().enumerate() {
                let v = k_elem[c * m + r];
                if v != 0.0 {
                    self.rows.push(gr);
                    self.cols.push(gc);
                    self.vals.push(v);
                }
            }
        }
    }

    pub fn finish(self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.n, self.n);
        for ((r, c), v) in self.rows.into_iter().zip(self.cols).zip(self.vals) {
            coo.push(r, c, v);
        }
        CsrMatrix::from(&coo)
    }
}

/// Diagonal of a square CSR matrix; absent entries are zero
pub fn diagonal(k: &CsrMatrix<f64>) -> Vec<f64> {
    let mut d = vec![0.0; k.nrows()];
    for (i, row) in k.row_iter().enumerate() {
        if let Ok(pos) = row.col_indices().binary_search(&i) {
            d[i] = row.values()[pos];
        }
    }
    d
}

/// Keep only rows and columns that map to a free index
pub fn reduce_sparse(k: &CsrMatrix<f64>, free_index: &[Option<usize>], n_free: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n_free, n_free);
    for (r, c, &v) in k.triplet_iter() {
        if let (Some(i), Some(j)) = (free_index[r], free_index[c]) {
            coo.push(i, j, v);
        }
    }
    CsrMatrix::from(&coo)
}

pub fn reduce_dense(k: &CsrMatrix<f64>, free_index: &[Option<usize>], n_free: usize) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(n_free, n_free);
    for (r, c, &v) in k.triplet_iter() {
        if let (Some(i), Some(j)) = (free_index[r], free_index[c]) {
            out[(i, j)] += v;
        }
    }
    out
}

pub fn to_dense(k: &CsrMatrix<f64>) -> DMatrix<f64> {
    reduce_dense(k, &(0..k.nrows()).map(Some).collect::<Vec<_>>(), k.nrows())
}

/// `k * x`
pub fn matvec(k: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        k.nrows(),
        k.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&c, &v)| v * x[c])
                .sum::<f64>()
        }),
    )
}

/// Conjugate gradients with a Jacobi preconditioner.
///
/// Stops once `|r| <= tol * |b|`. `None` means breakdown or no convergence
/// within `max_iter`; the caller falls back to a direct solve.
pub fn solve_pcg(k: &CsrMatrix<f64>, b: &DVector<f64>, tol: f64, max_iter: usize) -> Option<DVector<f64>> {
    let n = k.nrows();
    let target = tol * b.norm();
    if target == 0.0 {
        return Some(DVector::zeros(n));
    }

    let inv_diag = DVector::from_iterator(
        n,
        diagonal(k)
            .into_iter()
            .map(|d| if d.abs() > f64::EPSILON { 1.0 / d } else { 1.0 }),
    );

    let mut x = DVector::zeros(n);
    let mut r = b.clone();
    let mut z = r.component_mul(&inv_diag);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..max_iter {
        let kp = matvec(k, &p);
        let curvature = p.dot(&kp);
        if curvature.is_nan() || curvature <= 0.0 {
            log::debug!("PCG breakdown at iteration {}", iter);
            return None;
        }
        let alpha = rz / curvature;
        x += alpha * &p;
        r -= alpha * &kp;
        if r.norm() <= target {
            return Some(x);
        }
        z = r.component_mul(&inv_diag);
        let rz_next = r.dot(&z);
        p = &z + (rz_next / rz) * &p;
        rz = rz_next;
    }

    log::debug!("PCG did not converge in {} iterations", max_iter);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tridiagonal() -> (GlobalStiffness, DMatrix<f64>) {
        #[rustfmt::skip]
        let k = DMatrix::from_row_slice(3, 3, &[
             4.0, -1.0,  0.0,
            -1.0,  4.0, -1.0,
             0.0, -1.0,  3.0,
        ]);
        let mut global = GlobalStiffness::new(3);
        global.scatter(&[0, 1, 2], k.as_slice());
        (global, k)
    }

    #[test]
    fn test_scatter_sums_overlapping_elements() {
        let spring = [1.0, -1.0, -1.0, 1.0];
        let mut global = GlobalStiffness::new(3);
        global.scatter(&[0, 1], &spring);
        global.scatter(&[1, 2], &spring);
        let k = global.finish();

        assert_eq!(diagonal(&k), vec![1.0, 2.0, 1.0]);
        assert_eq!(k.nnz(), 7);
        assert_relative_eq!(to_dense(&k)[(0, 2)], 0.0);
    }

    #[test]
    fn test_reduce_drops_restrained_rows() {
        let (global, _) = tridiagonal();
        let k = global.finish();
        let free = [None, Some(0), Some(1)];

        let dense = reduce_dense(&k, &free, 2);
        assert_relative_eq!(dense[(0, 0)], 4.0);
        assert_relative_eq!(dense[(1, 0)], -1.0);
        assert_eq!(to_dense(&reduce_sparse(&k, &free, 2)), dense);
    }

    #[test]
    fn test_pcg_matches_direct_solve() {
        let (global, dense) = tridiagonal();
        let k = global.finish();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        let x = solve_pcg(&k, &b, 1e-12, 100).unwrap();
        assert!((&dense * &x - &b).norm() < 1e-9);
        assert!((matvec(&k, &x) - &b).norm() < 1e-9);
    }

    #[test]
    fn test_pcg_zero_rhs() {
        let (global, _) = tridiagonal();
        let x = solve_pcg(&global.finish(), &DVector::zeros(3), 1e-10, 10).unwrap();
        assert_eq!(x.norm(), 0.0);
    }
}
