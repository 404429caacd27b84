//! Flat four-node shell element (membrane + MITC4 bending)
//!
//! References:
//! - "Finite Element Procedures, 2nd Edition", Klaus-Jurgen Bathe
//! - Dvorkin & Bathe, "A continuum mechanics based four-node shell element"
//!
//! Nodes are taken in i-j-m-n order, mapped to natural coordinates
//! (-1,-1), (1,-1), (1,1), (-1,1). Each node carries six local DOFs
//! `[u, v, w, rx, ry, rz]`; `rz` (drilling) only gets a small stabilising
//! stiffness.

use nalgebra::{Matrix2, SMatrix, SVector, Vector3};

use super::math::Mat3;
use crate::error::{CalcError, CalcResult};

pub type Mat24 = SMatrix<f64, 24, 24>;
pub type Vec24 = SVector<f64, 24>;

type B3 = SMatrix<f64, 3, 24>;
type B2 = SMatrix<f64, 2, 24>;
type Row24 = SMatrix<f64, 1, 24>;

const NATURAL: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const GAUSS2: f64 = 0.577_350_269_189_625_8;
const SHEAR_CORRECTION: f64 = 5.0 / 6.0;
const DRILLING_RATIO: f64 = 1e-3;

/// Direction cosines of the element plane: x along i->j, z = x cross (n - i)
pub fn shell_rotation(nodes: &[[f64; 3]; 4]) -> CalcResult<Mat3> {
    let p = |k: usize| Vector3::new(nodes[k][0], nodes[k][1], nodes[k][2]);
    let ij = p(1) - p(0);
    let in_ = p(3) - p(0);
    if ij.norm() < 1e-12 {
        return Err(CalcError::InvalidGeometry("shell edge i-j has zero length".into()));
    }
    let x = ij.normalize();
    let z = x.cross(&in_);
    if z.norm() < 1e-12 {
        return Err(CalcError::InvalidGeometry("shell nodes are collinear".into()));
    }
    let z = z.normalize();
    let y = z.cross(&x);

    Ok(Mat3::new(
        x[0], x[1], x[2],
        y[0], y[1], y[2],
        z[0], z[1], z[2],
    ))
}

/// 24x24 transformation (global -> local), eight 3x3 blocks
pub fn shell_transformation_matrix(nodes: &[[f64; 3]; 4]) -> CalcResult<Mat24> {
    let r = shell_rotation(nodes)?;
    let mut t = Mat24::zeros();
    for block in 0..8 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3).copy_from(&r);
    }
    Ok(t)
}

/// Node coordinates projected onto the element plane
fn local_coords(nodes: &[[f64; 3]; 4]) -> CalcResult<[[f64; 2]; 4]> {
    let r = shell_rotation(nodes)?;
    let origin = Vector3::new(nodes[0][0], nodes[0][1], nodes[0][2]);
    let mut out = [[0.0; 2]; 4];
    for (k, n) in nodes.iter().enumerate() {
        let d = Vector3::new(n[0], n[1], n[2]) - origin;
        let l = r * d;
        out[k] = [l[0], l[1]];
    }
    Ok(out)
}

fn shape(r: f64, s: f64) -> [f64; 4] {
    let mut n = [0.0; 4];
    for (k, [rk, sk]) in NATURAL.iter().enumerate() {
        n[k] = 0.25 * (1.0 + r * rk) * (1.0 + s * sk);
    }
    n
}

/// (dN/dr, dN/ds)
fn shape_derivs(r: f64, s: f64) -> ([f64; 4], [f64; 4]) {
    let mut dr = [0.0; 4];
    let mut ds = [0.0; 4];
    for (k, [rk, sk]) in NATURAL.iter().enumerate() {
        dr[k] = 0.25 * rk * (1.0 + s * sk);
        ds[k] = 0.25 * sk * (1.0 + r * rk);
    }
    (dr, ds)
}

/// Jacobian [[x_r, y_r], [x_s, y_s]]
fn jacobian(xy: &[[f64; 2]; 4], r: f64, s: f64) -> Matrix2<f64> {
    let (dr, ds) = shape_derivs(r, s);
    let mut j = Matrix2::zeros();
    for k in 0..4 {
        j[(0, 0)] += dr[k] * xy[k][0];
        j[(0, 1)] += dr[k] * xy[k][1];
        j[(1, 0)] += ds[k] * xy[k][0];
        j[(1, 1)] += ds[k] * xy[k][1];
    }
    j
}

struct Point {
    n: [f64; 4],
    dndx: [f64; 4],
    dndy: [f64; 4],
    j_inv: Matrix2<f64>,
    det: f64,
}

fn point(xy: &[[f64; 2]; 4], r: f64, s: f64) -> CalcResult<Point> {
    let j = jacobian(xy, r, s);
    let det = j.determinant();
    if det <= 1e-14 {
        return Err(CalcError::InvalidGeometry(format!(
            "shell element is distorted or inverted (det J = {:.3e})",
            det
        )));
    }
    let j_inv = j
        .try_inverse()
        .ok_or_else(|| CalcError::InvalidGeometry("singular shell Jacobian".into()))?;
    let (dr, ds) = shape_derivs(r, s);
    let mut dndx = [0.0; 4];
    let mut dndy = [0.0; 4];
    for k in 0..4 {
        dndx[k] = j_inv[(0, 0)] * dr[k] + j_inv[(0, 1)] * ds[k];
        dndy[k] = j_inv[(1, 0)] * dr[k] + j_inv[(1, 1)] * ds[k];
    }
    Ok(Point {
        n: shape(r, s),
        dndx,
        dndy,
        j_inv,
        det,
    })
}

fn gauss_points() -> [(f64, f64); 4] {
    [
        (-GAUSS2, -GAUSS2),
        (GAUSS2, -GAUSS2),
        (GAUSS2, GAUSS2),
        (-GAUSS2, GAUSS2),
    ]
}

fn plane_stress(e: f64, nu: f64) -> SMatrix<f64, 3, 3> {
    let c = e / (1.0 - nu * nu);
    #[rustfmt::skip]
    let d = SMatrix::<f64, 3, 3>::new(
        c,      c * nu, 0.0,
        c * nu, c,      0.0,
        0.0,    0.0,    c * (1.0 - nu) / 2.0,
    );
    d
}

fn membrane_b(p: &Point) -> B3 {
    let mut b = B3::zeros();
    for k in 0..4 {
        let (u, v) = (6 * k, 6 * k + 1);
        b[(0, u)] = p.dndx[k];
        b[(1, v)] = p.dndy[k];
        b[(2, u)] = p.dndy[k];
        b[(2, v)] = p.dndx[k];
    }
    b
}

fn bending_b(p: &Point) -> B3 {
    let mut b = B3::zeros();
    for k in 0..4 {
        let (rx, ry) = (6 * k + 3, 6 * k + 4);
        b[(0, ry)] = p.dndx[k];
        b[(1, rx)] = -p.dndy[k];
        b[(2, rx)] = -p.dndx[k];
        b[(2, ry)] = p.dndy[k];
    }
    b
}

/// Covariant transverse shear strain along r (`along_r`) or s at a tying point
fn covariant_shear(xy: &[[f64; 2]; 4], r: f64, s: f64, along_r: bool) -> Row24 {
    let j = jacobian(xy, r, s);
    let n = shape(r, s);
    let (dr, ds) = shape_derivs(r, s);
    let (dn, row) = if along_r { (dr, 0) } else { (ds, 1) };
    let mut g = Row24::zeros();
    for k in 0..4 {
        g[6 * k + 2] = dn[k];
        g[6 * k + 3] = -n[k] * j[(row, 1)];
        g[6 * k + 4] = n[k] * j[(row, 0)];
    }
    g
}

struct TyingStrains {
    a: Row24,
    c: Row24,
    d: Row24,
    b: Row24,
}

impl TyingStrains {
    fn new(xy: &[[f64; 2]; 4]) -> Self {
        Self {
            a: covariant_shear(xy, 0.0, 1.0, true),
            c: covariant_shear(xy, 0.0, -1.0, true),
            d: covariant_shear(xy, 1.0, 0.0, false),
            b: covariant_shear(xy, -1.0, 0.0, false),
        }
    }

    /// Cartesian [γxz; γyz] at (r, s)
    fn shear_b(&self, p: &Point, r: f64, s: f64) -> B2 {
        let g_rz = self.a * (0.5 * (1.0 + s)) + self.c * (0.5 * (1.0 - s));
        let g_sz = self.d * (0.5 * (1.0 + r)) + self.b * (0.5 * (1.0 - r));
        let mut cov = B2::zeros();
        cov.set_row(0, &g_rz);
        cov.set_row(1, &g_sz);
        p.j_inv * cov
    }
}

/// Local 24x24 stiffness of a flat quadrilateral shell
pub fn shell_local_stiffness(nodes: &[[f64; 3]; 4], e: f64, nu: f64, t: f64) -> CalcResult<Mat24> {
    if t <= 0.0 {
        return Err(CalcError::InvalidInput(format!("shell thickness {} must be positive", t)));
    }
    let xy = local_coords(nodes)?;
    let dm = plane_stress(e, nu) * t;
    let db = plane_stress(e, nu) * (t * t * t / 12.0);
    let ds = SHEAR_CORRECTION * e / (2.0 * (1.0 + nu)) * t;
    let tying = TyingStrains::new(&xy);

    let mut km = Mat24::zeros();
    let mut kb = Mat24::zeros();
    let mut ks = Mat24::zeros();
    for (r, s) in gauss_points() {
        let p = point(&xy, r, s)?;
        let bm = membrane_b(&p);
        let bb = bending_b(&p);
        let bs = tying.shear_b(&p, r, s);
        km += bm.transpose() * dm * bm * p.det;
        kb += bb.transpose() * db * bb * p.det;
        ks += bs.transpose() * bs * (ds * p.det);
    }

    let mut k = km + kb + ks;

    let k_drill = (0..4)
        .flat_map(|n| [kb[(6 * n + 3, 6 * n + 3)], kb[(6 * n + 4, 6 * n + 4)]])
        .fold(f64::INFINITY, f64::min)
        * DRILLING_RATIO;
    for n in 0..4 {
        k[(6 * n + 5, 6 * n + 5)] += k_drill;
    }
    Ok(k)
}

/// Consistent nodal loads (local) for a uniform pressure along local +z
pub fn shell_pressure_loads(nodes: &[[f64; 3]; 4], pressure: f64) -> CalcResult<Vec24> {
    let xy = local_coords(nodes)?;
    let mut f = Vec24::zeros();
    for (r, s) in gauss_points() {
        let p = point(&xy, r, s)?;
        for k in 0..4 {
            f[6 * k + 2] += pressure * p.n[k] * p.det;
        }
    }
    Ok(f)
}

/// Plan area of the element
pub fn shell_area(nodes: &[[f64; 3]; 4]) -> CalcResult<f64> {
    let xy = local_coords(nodes)?;
    let mut area = 0.0;
    for (r, s) in gauss_points() {
        area += point(&xy, r, s)?.det;
    }
    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> [[f64; 3]; 4] {
        [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 2.0], [0.0, 0.0, 2.0]]
    }

    #[test]
    fn test_normal_follows_node_order() {
        let r = shell_rotation(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
            .unwrap();
        assert_relative_eq!(r[(2, 2)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_stiffness_symmetric() {
        let nodes = [[0.0, 0.0, 0.0], [3.0, 0.2, 0.0], [2.5, 2.0, 0.0], [0.3, 1.5, 0.0]];
        let k = shell_local_stiffness(&nodes, 200e3, 0.3, 0.1).unwrap();
        for i in 0..24 {
            for j in 0..24 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_rigid_translation_is_stress_free() {
        let k = shell_local_stiffness(&square(), 200e3, 0.3, 0.1).unwrap();
        for dof in 0..3 {
            let mut d = Vec24::zeros();
            for n in 0..4 {
                d[6 * n + dof] = 1.0;
            }
            let f = k * d;
            assert!(f.norm() < 1e-6, "dof {} residual {}", dof, f.norm());
        }
    }

    #[test]
    fn test_pressure_resultant() {
        let f = shell_pressure_loads(&square(), 5.0).unwrap();
        let total: f64 = (0..4).map(|k| f[6 * k + 2]).sum();
        assert_relative_eq!(total, 5.0 * 4.0, epsilon = 1e-10);
        assert_relative_eq!(shell_area(&square()).unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_element_rejected() {
        let bowtie = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        assert!(shell_local_stiffness(&bowtie, 1.0, 0.3, 0.1).is_err());
    }
}
