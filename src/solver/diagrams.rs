//! Internal force and deflection diagrams along a solved member

use super::math::{gauss3, hermite, Vec12};
use super::Response;

/// Factored line load in member-local axes (0 = x, 1 = y, 2 = z)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalLineLoad {
    pub w1: f64,
    pub w2: f64,
    pub x1: f64,
    pub x2: f64,
    pub axis: usize,
}

impl LocalLineLoad {
    fn intensity(&self, s: f64) -> f64 {
        self.w1 + (self.w2 - self.w1) * (s - self.x1) / (self.x2 - self.x1)
    }

    /// Loaded part of `[from, to]`
    fn span(&self, from: f64, to: f64) -> Option<(f64, f64)> {
        let a = self.x1.max(from);
        let b = self.x2.min(to);
        (b > a && self.x2 - self.x1 > 1e-12).then_some((a, b))
    }
}

/// Deflection at `x` of a clamped-clamped beam from a unit load at `s`
/// (times EI)
fn clamped_green(x: f64, s: f64, l: f64) -> f64 {
    let l3 = l * l * l;
    if x <= s {
        let (a, b) = (s, l - s);
        b * b * x * x * (3.0 * a * l - (3.0 * a + b) * x) / (6.0 * l3)
    } else {
        let (a, b) = (s, l - s);
        let xr = l - x;
        a * a * xr * xr * (3.0 * b * l - (3.0 * b + a) * xr) / (6.0 * l3)
    }
}

/// Everything needed to evaluate a member's responses for one combination
#[derive(Debug, Clone)]
pub struct MemberDiagram {
    pub length: f64,
    pub e: f64,
    pub iy: f64,
    pub iz: f64,
    /// Local end forces `[f_i; f_j]`
    pub forces: Vec12,
    /// Local end displacements, released DOFs recovered
    pub displacements: Vec12,
    pub loads: Vec<LocalLineLoad>,
}

impl MemberDiagram {
    /// ∫₀ˣ w(s) ds over loads on `axis`
    fn resultant(&self, axis: usize, x: f64) -> f64 {
        self.loads
            .iter()
            .filter(|l| l.axis == axis)
            .filter_map(|l| l.span(0.0, x).map(|(a, b)| gauss3(a, b, |s| l.intensity(s))))
            .sum()
    }

    /// ∫₀ˣ w(s)(x - s) ds over loads on `axis`
    fn first_moment(&self, axis: usize, x: f64) -> f64 {
        self.loads
            .iter()
            .filter(|l| l.axis == axis)
            .filter_map(|l| {
                l.span(0.0, x)
                    .map(|(a, b)| gauss3(a, b, |s| l.intensity(s) * (x - s)))
            })
            .sum()
    }

    /// Deflection from span loads with both ends held, times EI
    fn span_deflection(&self, axis: usize, x: f64) -> f64 {
        let l = self.length;
        self.loads
            .iter()
            .filter(|ld| ld.axis == axis)
            .map(|ld| {
                let left = ld
                    .span(0.0, x)
                    .map_or(0.0, |(a, b)| gauss3(a, b, |s| ld.intensity(s) * clamped_green(x, s, l)));
                let right = ld
                    .span(x, l)
                    .map_or(0.0, |(a, b)| gauss3(a, b, |s| ld.intensity(s) * clamped_green(x, s, l)));
                left + right
            })
            .sum()
    }

    pub fn value_at(&self, response: Response, x: f64) -> f64 {
        let x = x.clamp(0.0, self.length);
        let f = &self.forces;
        let d = &self.displacements;
        match response {
            Response::Axial => -(f[0] + self.resultant(0, x)),
            Response::ShearY => -(f[1] + self.resultant(1, x)),
            Response::ShearZ => -(f[2] + self.resultant(2, x)),
            Response::Torque => -f[3],
            Response::MomentZ => f[5] - f[1] * x - self.first_moment(1, x),
            Response::MomentY => f[4] + f[2] * x + self.first_moment(2, x),
            Response::DeflectionY => {
                let n = hermite(x, self.length);
                let ends = n[0] * d[1] + n[1] * d[5] + n[2] * d[7] + n[3] * d[11];
                ends + self.span_deflection(1, x) / (self.e * self.iz)
            }
            Response::DeflectionZ => {
                let n = hermite(x, self.length);
                let ends = n[0] * d[2] - n[1] * d[4] + n[2] * d[8] - n[3] * d[10];
                ends + self.span_deflection(2, x) / (self.e * self.iy)
            }
        }
    }

    /// `n_points` equally spaced values from the i-node to the j-node
    pub fn array(&self, response: Response, n_points: usize) -> Vec<f64> {
        match n_points {
            0 => Vec::new(),
            1 => vec![self.value_at(response, 0.0)],
            n => (0..n)
                .map(|k| self.value_at(response, self.length * k as f64 / (n - 1) as f64))
                .collect(),
        }
    }

    pub fn min(&self, response: Response, samples: usize) -> f64 {
        self.array(response, samples.max(2))
            .into_iter()
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self, response: Response, samples: usize) -> f64 {
        self.array(response, samples.max(2))
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
