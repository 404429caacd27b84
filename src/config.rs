//! Run configuration: working units, active combination and solver options

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CalcResult;
use crate::solver::Response;
use crate::units::{ForceUnit, LengthUnit, UnitSystem};

/// Default active combination (dead load only)
pub const DEFAULT_COMBINATION: &str = "100_DL";

/// Discretisation counts per response type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsePoints {
    pub moment: usize,
    pub shear: usize,
    pub axial: usize,
    pub torque: usize,
    pub deflection: usize,
}

impl Default for ResponsePoints {
    fn default() -> Self {
        Self {
            moment: 5,
            shear: 4,
            axial: 3,
            torque: 3,
            deflection: 4,
        }
    }
}

impl ResponsePoints {
    /// Same count for every response type
    pub fn uniform(n: usize) -> Self {
        Self {
            moment: n,
            shear: n,
            axial: n,
            torque: n,
            deflection: n,
        }
    }

    pub fn for_response(&self, response: Response) -> usize {
        match response {
            Response::MomentY | Response::MomentZ => self.moment,
            Response::ShearY | Response::ShearZ => self.shear,
            Response::Axial => self.axial,
            Response::Torque => self.torque,
            Response::DeflectionY | Response::DeflectionZ => self.deflection,
        }
    }
}

/// Thresholds used to grade a generated plate mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Minimum acceptable interior angle (degrees)
    pub min_angle: f64,
    /// Maximum acceptable edge-length ratio
    pub max_aspect_ratio: f64,
    /// Minimum acceptable shape regularity (1.0 = ideal)
    pub min_regularity: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_angle: 30.0,
            max_aspect_ratio: 3.0,
            min_regularity: 0.1,
        }
    }
}

/// Options for the reference linear-static solver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Use the sparse iterative path (falls back to dense on failure)
    pub sparse: bool,
    /// Convergence tolerance for the iterative path
    pub tolerance: f64,
    /// Maximum iterations for the iterative path
    pub max_iterations: usize,
    /// Sample count used when reporting member min/max values
    pub extreme_samples: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sparse: false,
            tolerance: 1e-10,
            max_iterations: 10_000,
            extreme_samples: 101,
        }
    }
}

impl AnalysisOptions {
    /// Dense direct solve
    pub fn dense() -> Self {
        Self::default()
    }

    /// Sparse Jacobi-preconditioned CG
    pub fn sparse() -> Self {
        Self {
            sparse: true,
            ..Self::default()
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

/// Options for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcOptions {
    /// Working length unit for every solver quantity
    pub length_unit: LengthUnit,
    /// Working force unit for every solver quantity
    pub force_unit: ForceUnit,
    /// Length unit of incoming CAD coordinates
    pub geometry_unit: LengthUnit,
    /// Active combination identifier
    pub combination: String,
    /// Inject member self-weight as a dead load
    pub self_weight: bool,
    /// Response discretisation
    pub points: ResponsePoints,
    /// Decimal places used for node identity
    pub node_decimals: u32,
    /// Mesh grading thresholds
    pub quality: QualityThresholds,
    /// Reference solver options
    pub solver: AnalysisOptions,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            length_unit: LengthUnit::Mm,
            force_unit: ForceUnit::KN,
            geometry_unit: LengthUnit::Mm,
            combination: DEFAULT_COMBINATION.to_string(),
            self_weight: false,
            points: ResponsePoints::default(),
            node_decimals: 2,
            quality: QualityThresholds::default(),
            solver: AnalysisOptions::default(),
        }
    }
}

impl CalcOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> CalcResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn units(&self) -> UnitSystem {
        UnitSystem::new(self.length_unit, self.force_unit)
    }

    /// Factor converting CAD coordinates into working lengths
    pub fn geometry_scale(&self) -> f64 {
        self.geometry_unit.in_meters() / self.length_unit.in_meters()
    }

    /// Node identity tolerance in working length units
    pub fn node_tolerance(&self) -> f64 {
        10f64.powi(-(self.node_decimals as i32))
    }

    pub fn with_combination(mut self, name: &str) -> Self {
        self.combination = name.to_string();
        self
    }

    pub fn with_self_weight(mut self, enabled: bool) -> Self {
        self.self_weight = enabled;
        self
    }

    pub fn with_units(mut self, length: LengthUnit, force: ForceUnit) -> Self {
        self.length_unit = length;
        self.force_unit = force;
        self
    }

    pub fn with_geometry_unit(mut self, unit: LengthUnit) -> Self {
        self.geometry_unit = unit;
        self
    }

    pub fn with_points(mut self, points: ResponsePoints) -> Self {
        self.points = points;
        self
    }

    pub fn with_solver(mut self, solver: AnalysisOptions) -> Self {
        self.solver = solver;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let opts = CalcOptions::default();
        assert_eq!(opts.combination, "100_DL");
        assert!(!opts.self_weight);
        assert_eq!(opts.points.moment, 5);
        assert_eq!(opts.points.shear, 4);
        assert_eq!(opts.points.axial, 3);
        assert_eq!(opts.points.torque, 3);
        assert_eq!(opts.points.deflection, 4);
        assert_relative_eq!(opts.node_tolerance(), 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let opts: CalcOptions =
            serde_json::from_str(r#"{"combination": "1001_1.2DL+1.6LL", "points": {"moment": 9}}"#)
                .unwrap();
        assert_eq!(opts.combination, "1001_1.2DL+1.6LL");
        assert_eq!(opts.points.moment, 9);
        assert_eq!(opts.points.shear, 4);
        assert_eq!(opts.length_unit, LengthUnit::Mm);
    }

    #[test]
    fn test_geometry_scale() {
        let opts = CalcOptions::new()
            .with_units(LengthUnit::Mm, ForceUnit::KN)
            .with_geometry_unit(LengthUnit::M);
        assert_relative_eq!(opts.geometry_scale(), 1000.0, epsilon = 1e-9);
    }
}
