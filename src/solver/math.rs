//! Frame element math: stiffness, transformation, releases, fixed-end forces

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

use crate::error::{CalcError, CalcResult};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;

/// 12x12 matrix for member stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for member forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// 3-point Gauss-Legendre rule on [-1, 1]
pub(crate) const GAUSS3: [(f64, f64); 3] = [
    (-0.774_596_669_241_483_4, 5.0 / 9.0),
    (0.0, 8.0 / 9.0),
    (0.774_596_669_241_483_4, 5.0 / 9.0),
];

/// Integrate `f` over `[a, b]` with the 3-point rule
pub(crate) fn gauss3<F: Fn(f64) -> f64>(a: f64, b: f64, f: F) -> f64 {
    if b <= a {
        return 0.0;
    }
    let half = (b - a) / 2.0;
    let mid = (a + b) / 2.0;
    GAUSS3
        .iter()
        .map(|(xi, w)| w * f(mid + half * xi))
        .sum::<f64>()
        * half
}

/// Cubic Hermite shape functions at `x` on a member of length `l`:
/// `[N1, N2, N3, N4]` for (v_i, θ_i, v_j, θ_j)
pub(crate) fn hermite(x: f64, l: f64) -> [f64; 4] {
    let xi = x / l;
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    [
        1.0 - 3.0 * xi2 + 2.0 * xi3,
        l * (xi - 2.0 * xi2 + xi3),
        3.0 * xi2 - 2.0 * xi3,
        l * (xi3 - xi2),
    ]
}

/// Direction cosines of a frame member (rows: local x, y, z in global axes).
///
/// Horizontal members get local y = global Y; vertical members pointing up
/// get local y = -X and z = Z; inclined members keep local z horizontal.
pub fn member_rotation(i_node: &[f64; 3], j_node: &[f64; 3], rotation: f64) -> CalcResult<Mat3> {
    let d = Vector3::new(
        j_node[0] - i_node[0],
        j_node[1] - i_node[1],
        j_node[2] - i_node[2],
    );
    let length = d.norm();
    if length < 1e-10 {
        return Err(CalcError::InvalidGeometry(format!(
            "zero-length member between {:?} and {:?}",
            i_node, j_node
        )));
    }
    let x = d / length;

    let (y, z) = if x[0].abs() < 1e-10 && x[2].abs() < 1e-10 {
        if x[1] > 0.0 {
            (Vector3::new(-1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0))
        } else {
            (Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0))
        }
    } else if d[1].abs() < 1e-10 {
        let y = Vector3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y).normalize();
        (y, z)
    } else {
        let proj = Vector3::new(d[0], 0.0, d[2]);
        let z = if x[1] > 0.0 {
            proj.cross(&x)
        } else {
            x.cross(&proj)
        }
        .normalize();
        let y = z.cross(&x).normalize();
        (y, z)
    };

    let (y, z) = if rotation.abs() > 1e-12 {
        let (s, c) = rotation.sin_cos();
        (y * c + z * s, -y * s + z * c)
    } else {
        (y, z)
    };

    Ok(Mat3::new(
        x[0], x[1], x[2],
        y[0], y[1], y[2],
        z[0], z[1], z[2],
    ))
}

/// 12x12 block-diagonal transformation (global -> local)
pub fn member_transformation_matrix(
    i_node: &[f64; 3],
    j_node: &[f64; 3],
    rotation: f64,
) -> CalcResult<Mat12> {
    let r = member_rotation(i_node, j_node, rotation)?;
    let mut t = Mat12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3).copy_from(&r);
    }
    Ok(t)
}

/// Local stiffness of a 3D Euler-Bernoulli frame element.
///
/// Four uncoupled parts: axial (0, 6), torsion (3, 9), bending in the
/// local x-y plane (1, 5, 7, 11) and bending in the x-z plane (2, 4, 8, 10).
pub fn member_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
) -> Mat12 {
    let mut k = Mat12::zeros();
    add_spring(&mut k, [0, 6], e * a / length);
    add_spring(&mut k, [3, 9], g * j / length);
    add_bending(&mut k, [1, 5, 7, 11], e * iz, length, 1.0);
    // Positive w with positive θy bends the other way
    add_bending(&mut k, [2, 4, 8, 10], e * iy, length, -1.0);
    k
}

fn add_spring(k: &mut Mat12, [i, j]: [usize; 2], stiffness: f64) {
    k[(i, i)] += stiffness;
    k[(j, j)] += stiffness;
    k[(i, j)] -= stiffness;
    k[(j, i)] -= stiffness;
}

/// Hermite bending block on (v_i, θ_i, v_j, θ_j); `sign` scales the rotations
fn add_bending(k: &mut Mat12, dofs: [usize; 4], ei: f64, l: f64, sign: f64) {
    let l2 = l * l;
    #[rustfmt::skip]
    let base = [
         12.0,    6.0 * l,  -12.0,    6.0 * l,
         6.0 * l, 4.0 * l2, -6.0 * l, 2.0 * l2,
        -12.0,   -6.0 * l,   12.0,   -6.0 * l,
         6.0 * l, 2.0 * l2, -6.0 * l, 4.0 * l2,
    ];
    let scale = [1.0, sign, 1.0, sign];
    let factor = ei / (l2 * l);
    for (r, &dr) in dofs.iter().enumerate() {
        for (c, &dc) in dofs.iter().enumerate() {
            k[(dr, dc)] += scale[r] * scale[c] * base[4 * r + c] * factor;
        }
    }
}

struct Partition {
    kept: std::vec::Vec<usize>,
    released: std::vec::Vec<usize>,
}

impl Partition {
    fn new(releases: &[bool; 12]) -> Self {
        let (released, kept): (std::vec::Vec<usize>, std::vec::Vec<usize>) =
            (0..12).partition(|&i| releases[i]);
        Self { kept, released }
    }

    fn block(&self, k: &Mat12, rows: &[usize], cols: &[usize]) -> Mat {
        Mat::from_fn(rows.len(), cols.len(), |i, j| k[(rows[i], cols[j])])
    }

    /// inv(k22), or None when the released block is singular
    fn k22_inv(&self, k: &Mat12) -> Option<Mat> {
        self.block(k, &self.released, &self.released).try_inverse()
    }
}

/// Static condensation of released DOFs out of a local stiffness matrix
pub fn apply_releases(k: &Mat12, releases: &[bool; 12]) -> Mat12 {
    let p = Partition::new(releases);
    if p.released.is_empty() {
        return *k;
    }
    let Some(k22_inv) = p.k22_inv(k) else {
        return *k;
    };
    let k11 = p.block(k, &p.kept, &p.kept);
    let k12 = p.block(k, &p.kept, &p.released);
    let k21 = p.block(k, &p.released, &p.kept);
    let condensed = &k11 - &k12 * &k22_inv * &k21;

    let mut out = Mat12::zeros();
    for (i, &ui) in p.kept.iter().enumerate() {
        for (j, &uj) in p.kept.iter().enumerate() {
            out[(ui, uj)] = condensed[(i, j)];
        }
    }
    out
}

/// Condense a fixed-end force vector: fer1 - k12 * inv(k22) * fer2
pub fn apply_fer_releases(fer: &Vec12, k: &Mat12, releases: &[bool; 12]) -> Vec12 {
    let p = Partition::new(releases);
    if p.released.is_empty() {
        return *fer;
    }
    let Some(k22_inv) = p.k22_inv(k) else {
        return *fer;
    };
    let k12 = p.block(k, &p.kept, &p.released);
    let fer1 = Vec::from_iterator(p.kept.len(), p.kept.iter().map(|&i| fer[i]));
    let fer2 = Vec::from_iterator(p.released.len(), p.released.iter().map(|&i| fer[i]));
    let condensed = &fer1 - &k12 * &k22_inv * &fer2;

    let mut out = Vec12::zeros();
    for (i, &ui) in p.kept.iter().enumerate() {
        out[ui] = condensed[i];
    }
    out
}

/// Recover the displacements of released DOFs from the kept ones:
/// d2 = -inv(k22) * (k21 * d1 + fer2)
pub fn recover_released_displacements(
    d: &Vec12,
    fer: &Vec12,
    k: &Mat12,
    releases: &[bool; 12],
) -> Vec12 {
    let p = Partition::new(releases);
    if p.released.is_empty() {
        return *d;
    }
    let Some(k22_inv) = p.k22_inv(k) else {
        return *d;
    };
    let k21 = p.block(k, &p.released, &p.kept);
    let d1 = Vec::from_iterator(p.kept.len(), p.kept.iter().map(|&i| d[i]));
    let fer2 = Vec::from_iterator(p.released.len(), p.released.iter().map(|&i| fer[i]));
    let d2 = -(&k22_inv * (&k21 * &d1 + &fer2));

    let mut out = *d;
    for (i, &ri) in p.released.iter().enumerate() {
        out[ri] = d2[i];
    }
    out
}

/// Fixed-end forces for a linearly varying load along a local axis
/// (0 = x, 1 = y, 2 = z) acting on `[x1, x2]`
pub fn fer_linear_load(w1: f64, w2: f64, x1: f64, x2: f64, length: f64, axis: usize) -> Vec12 {
    let l = length;
    let a = x1.max(0.0);
    let b = x2.min(l);
    let mut fer = Vec12::zeros();
    if b <= a || (x2 - x1).abs() < 1e-12 {
        return fer;
    }
    let w = |s: f64| w1 + (w2 - w1) * (s - x1) / (x2 - x1);
    let int = |f: &dyn Fn(f64) -> f64| gauss3(a, b, |s| w(s) * f(s));

    match axis {
        0 => {
            fer[0] = -int(&|s| 1.0 - s / l);
            fer[6] = -int(&|s| s / l);
        }
        1 => {
            fer[1] = -int(&|s| hermite(s, l)[0]);
            fer[5] = -int(&|s| hermite(s, l)[1]);
            fer[7] = -int(&|s| hermite(s, l)[2]);
            fer[11] = -int(&|s| hermite(s, l)[3]);
        }
        2 => {
            fer[2] = -int(&|s| hermite(s, l)[0]);
            fer[4] = int(&|s| hermite(s, l)[1]);
            fer[8] = -int(&|s| hermite(s, l)[2]);
            fer[10] = int(&|s| hermite(s, l)[3]);
        }
        _ => {}
    }
    fer
}

/// Dense direct solve: Cholesky first, LU when the matrix is not SPD
pub fn solve_dense(a: &Mat, b: &Vec) -> Option<Vec> {
    if let Some(chol) = a.clone().cholesky() {
        return Some(chol.solve(b));
    }
    a.clone().lu().solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transformation_matrix_horizontal() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[10.0, 0.0, 0.0], 0.0).unwrap();
        assert_relative_eq!(t[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transformation_matrix_vertical() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[0.0, 10.0, 0.0], 0.0).unwrap();
        assert_relative_eq!(t[(0, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 0)], -1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_length_is_an_error() {
        assert!(member_transformation_matrix(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], 0.0).is_err());
    }

    #[test]
    fn test_inclined_rotation_is_orthonormal() {
        let r = member_rotation(&[0.0, 0.0, 0.0], &[3.0, 4.0, 2.0], 0.3).unwrap();
        let rrt = r * r.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(rrt[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_local_stiffness_symmetry() {
        let k = member_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 10.0);
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_local_stiffness_bending_signs() {
        let (e, iy, iz, l) = (200.0, 1e4, 2e4, 500.0);
        let k = member_local_stiffness(e, 77.0, 100.0, iy, iz, 1e3, l);
        assert_relative_eq!(k[(0, 6)], -e * 100.0 / l);
        assert_relative_eq!(k[(1, 5)], 6.0 * e * iz / (l * l), max_relative = 1e-12);
        assert_relative_eq!(k[(2, 4)], -6.0 * e * iy / (l * l), max_relative = 1e-12);
        assert_relative_eq!(k[(4, 8)], 6.0 * e * iy / (l * l), max_relative = 1e-12);
        assert_relative_eq!(k[(4, 10)], 2.0 * e * iy / l, max_relative = 1e-12);
        assert_relative_eq!(k[(9, 9)], 77.0 * 1e3 / l, max_relative = 1e-12);
    }

    #[test]
    fn test_uniform_fer_matches_closed_form() {
        let (w, l) = (-10.0, 1000.0);
        let fer = fer_linear_load(w, w, 0.0, l, l, 1);
        assert_relative_eq!(fer[1], -w * l / 2.0, max_relative = 1e-12);
        assert_relative_eq!(fer[5], -w * l * l / 12.0, max_relative = 1e-12);
        assert_relative_eq!(fer[7], -w * l / 2.0, max_relative = 1e-12);
        assert_relative_eq!(fer[11], w * l * l / 12.0, max_relative = 1e-12);

        let fer = fer_linear_load(w, w, 0.0, l, l, 2);
        assert_relative_eq!(fer[4], w * l * l / 12.0, max_relative = 1e-12);
        assert_relative_eq!(fer[10], -w * l * l / 12.0, max_relative = 1e-12);
    }

    #[test]
    fn test_triangular_fer() {
        // Zero at i, w at j: R_i = 3wL/20, R_j = 7wL/20, M_i = wL²/30, M_j = wL²/20
        let (w, l) = (6.0, 4.0);
        let fer = fer_linear_load(0.0, w, 0.0, l, l, 1);
        assert_relative_eq!(fer[1], -3.0 * w * l / 20.0, max_relative = 1e-12);
        assert_relative_eq!(fer[7], -7.0 * w * l / 20.0, max_relative = 1e-12);
        assert_relative_eq!(fer[5], -w * l * l / 30.0, max_relative = 1e-12);
        assert_relative_eq!(fer[11], w * l * l / 20.0, max_relative = 1e-12);
    }

    #[test]
    fn test_released_ends_carry_no_moment() {
        let k = member_local_stiffness(200.0, 77.0, 100.0, 1e4, 2e4, 1e3, 500.0);
        let releases = [
            false, false, false, false, true, true, false, false, false, false, true, true,
        ];
        let kc = apply_releases(&k, &releases);
        for i in 0..12 {
            assert_eq!(kc[(4, i)], 0.0);
            assert_eq!(kc[(11, i)], 0.0);
        }
        // Pinned-pinned beam under uniform load: end shears wL/2, no moments
        let fer = fer_linear_load(-1.0, -1.0, 0.0, 500.0, 500.0, 1);
        let fc = apply_fer_releases(&fer, &k, &releases);
        assert_relative_eq!(fc[1], 250.0, max_relative = 1e-9);
        assert_relative_eq!(fc[5], 0.0);
        assert_relative_eq!(fc[11], 0.0);
    }

    #[test]
    fn test_dense_solve() {
        let a = Mat::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = Vec::from_vec(vec![1.0, 2.0]);
        let x = solve_dense(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 7.0 / 11.0, epsilon = 1e-12);
    }
}
