//! Geometry: node identity and member assembly
//!
//! CAD coordinates are Z-up; the solver works Y-up. Every coordinate that
//! enters the model passes through [`cad_to_model`], which scales into the
//! working length unit and swaps CAD Y/Z.

mod assembler;
mod indexer;

pub use assembler::{MemberAssembler, MemberRecord};
pub use indexer::{GeometryIndexer, NodeArena, NodeKey};

/// A 3D point `[x, y, z]`
pub type Coord = [f64; 3];

/// CAD (x, y, z) -> solver (x, z, y), scaled into working units
pub fn cad_to_model(p: Coord, scale: f64) -> Coord {
    [p[0] * scale, p[2] * scale, p[1] * scale]
}

/// Inverse of [`cad_to_model`]
pub fn model_to_cad(p: Coord, scale: f64) -> Coord {
    [p[0] / scale, p[2] / scale, p[1] / scale]
}

pub fn distance(a: &Coord, b: &Coord) -> f64 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2) + (b[2] - a[2]).powi(2)).sqrt()
}

pub(crate) fn sub(a: &Coord, b: &Coord) -> Coord {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn cross(a: &Coord, b: &Coord) -> Coord {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: &Coord) -> f64 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

/// Bilinear interpolation over four corners at parametric (u, v) in [0, 1]²
pub fn bilinear(corners: &[Coord; 4], u: f64, v: f64) -> Coord {
    let w = [
        (1.0 - u) * (1.0 - v),
        u * (1.0 - v),
        u * v,
        (1.0 - u) * v,
    ];
    let mut p = [0.0; 3];
    for (c, wi) in corners.iter().zip(w) {
        for k in 0..3 {
            p[k] += wi * c[k];
        }
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_swap_round_trip() {
        let cad = [1.0, 2.0, 3.0];
        let model = cad_to_model(cad, 1000.0);
        assert_eq!(model, [1000.0, 3000.0, 2000.0]);
        let back = model_to_cad(model, 1000.0);
        for k in 0..3 {
            assert_relative_eq!(back[k], cad[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bilinear_center() {
        let c = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 4.0, 0.0], [0.0, 4.0, 0.0]];
        let p = bilinear(&c, 0.5, 0.5);
        assert_relative_eq!(p[0], 1.0);
        assert_relative_eq!(p[1], 2.0);
    }
}
