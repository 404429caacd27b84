//! Solver contract and the in-process reference backend
//!
//! The pipeline only ever talks to a solver through [`SolverModel`] (model
//! building and `analyze`) and [`SolverResults`] (post-solve queries).
//! [`FrameModel`] implements both as a linear-static frame/shell solver.
//!
//! All quantities are in the working unit pair. Global axes are Y-up.

mod diagrams;
mod math;
mod model;
mod shell;
mod sparse;

pub use diagrams::{LocalLineLoad, MemberDiagram};
pub use math::{
    apply_fer_releases, apply_releases, fer_linear_load, member_local_stiffness,
    member_rotation, member_transformation_matrix, recover_released_displacements, solve_dense,
    Mat, Mat12, Mat3, Vec12,
};
pub use model::{FrameModel, DEFAULT_COMBO};
pub use shell::{
    shell_area, shell_local_stiffness, shell_pressure_loads, shell_rotation,
    shell_transformation_matrix, Mat24, Vec24,
};
pub use sparse::{solve_pcg, GlobalStiffness};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CalcResult;
use crate::loads::LoadCombination;

/// Load direction. Upper-case variants are global axes, lower-case are
/// member-local axes.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadDirection {
    FX,
    FY,
    FZ,
    MX,
    MY,
    MZ,
    Fx,
    Fy,
    Fz,
}

impl LoadDirection {
    /// Index into a 6-DOF nodal vector for global directions
    pub fn global_index(self) -> Option<usize> {
        match self {
            LoadDirection::FX => Some(0),
            LoadDirection::FY => Some(1),
            LoadDirection::FZ => Some(2),
            LoadDirection::MX => Some(3),
            LoadDirection::MY => Some(4),
            LoadDirection::MZ => Some(5),
            _ => None,
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, LoadDirection::Fx | LoadDirection::Fy | LoadDirection::Fz)
    }
}

/// Restrained degrees of freedom at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixity {
    pub dx: bool,
    pub dy: bool,
    pub dz: bool,
    pub rx: bool,
    pub ry: bool,
    pub rz: bool,
}

impl Fixity {
    pub fn fixed() -> Self {
        Self::from_array([true; 6])
    }

    pub fn pinned() -> Self {
        Self::from_array([true, true, true, false, false, false])
    }

    pub fn from_array(a: [bool; 6]) -> Self {
        Self {
            dx: a[0],
            dy: a[1],
            dz: a[2],
            rx: a[3],
            ry: a[4],
            rz: a[5],
        }
    }

    pub fn as_array(&self) -> [bool; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    pub fn is_supported(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }

    pub fn num_restrained(&self) -> usize {
        self.as_array().iter().filter(|&&r| r).count()
    }
}

/// End releases for a member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReleases {
    /// i-node releases [DX, DY, DZ, RX, RY, RZ]
    pub i_node: [bool; 6],
    /// j-node releases [DX, DY, DZ, RX, RY, RZ]
    pub j_node: [bool; 6],
}

impl MemberReleases {
    pub fn none() -> Self {
        Self::default()
    }

    /// Bending released at both ends (truss behaviour)
    pub fn pin_both() -> Self {
        Self {
            i_node: [false, false, false, false, true, true],
            j_node: [false, false, false, false, true, true],
        }
    }

    pub fn as_array(&self) -> [bool; 12] {
        let mut arr = [false; 12];
        arr[0..6].copy_from_slice(&self.i_node);
        arr[6..12].copy_from_slice(&self.j_node);
        arr
    }

    pub fn any(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }
}

/// Material as the solver sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProps {
    pub e: f64,
    pub g: f64,
    pub nu: f64,
    /// Weight per unit volume
    pub unit_weight: f64,
}

/// Section as the solver sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionProps {
    pub a: f64,
    pub iy: f64,
    pub iz: f64,
    pub j: f64,
}

/// A linearly varying line load on part of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Intensity at `x1`
    pub w1: f64,
    /// Intensity at `x2`
    pub w2: f64,
    /// Start position from the i-node
    pub x1: f64,
    /// End position from the i-node; clamped to the member length
    pub x2: f64,
    pub direction: LoadDirection,
    pub case: String,
}

impl DistributedLoad {
    pub fn new(w1: f64, w2: f64, x1: f64, x2: f64, direction: LoadDirection, case: &str) -> Self {
        Self {
            w1,
            w2,
            x1,
            x2,
            direction,
            case: case.to_string(),
        }
    }

    /// Constant intensity over `[0, length]`
    pub fn uniform(w: f64, length: f64, direction: LoadDirection, case: &str) -> Self {
        Self::new(w, w, 0.0, length, direction, case)
    }

    pub fn is_uniform(&self) -> bool {
        (self.w1 - self.w2).abs() < 1e-12
    }

    pub fn total_force(&self) -> f64 {
        (self.w1 + self.w2) / 2.0 * (self.x2 - self.x1)
    }
}

/// Member response series that can be queried after a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Response {
    MomentY,
    MomentZ,
    ShearY,
    ShearZ,
    Axial,
    Torque,
    DeflectionY,
    DeflectionZ,
}

impl Response {
    pub const ALL: [Response; 8] = [
        Response::MomentY,
        Response::MomentZ,
        Response::ShearY,
        Response::ShearZ,
        Response::Axial,
        Response::Torque,
        Response::DeflectionY,
        Response::DeflectionZ,
    ];
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Response::MomentY => "momentY",
            Response::MomentZ => "momentZ",
            Response::ShearY => "shearY",
            Response::ShearZ => "shearZ",
            Response::Axial => "axial",
            Response::Torque => "torque",
            Response::DeflectionY => "deflectionY",
            Response::DeflectionZ => "deflectionZ",
        };
        f.write_str(s)
    }
}

/// Reaction components at a node for one combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

impl Reactions {
    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
            fz: arr[2],
            mx: arr[3],
            my: arr[4],
            mz: arr[5],
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }
}

/// Model-building half of the solver contract
pub trait SolverModel {
    fn add_node(&mut self, name: &str, x: f64, y: f64, z: f64) -> CalcResult<()>;

    fn add_material(&mut self, name: &str, props: MaterialProps) -> CalcResult<()>;

    fn add_section(&mut self, name: &str, props: SectionProps) -> CalcResult<()>;

    /// `rotation` in radians about the member axis
    fn add_member(
        &mut self,
        name: &str,
        i_node: &str,
        j_node: &str,
        material: &str,
        section: &str,
        rotation: f64,
    ) -> CalcResult<()>;

    fn def_releases(&mut self, member: &str, releases: MemberReleases) -> CalcResult<()>;

    fn def_support(&mut self, node: &str, fixity: Fixity) -> CalcResult<()>;

    fn add_node_load(
        &mut self,
        node: &str,
        direction: LoadDirection,
        value: f64,
        case: &str,
    ) -> CalcResult<()>;

    fn add_member_dist_load(&mut self, member: &str, load: DistributedLoad) -> CalcResult<()>;

    /// Self-weight of every member as a line load along a global axis
    fn add_member_self_weight(
        &mut self,
        direction: LoadDirection,
        factor: f64,
        case: &str,
    ) -> CalcResult<()>;

    /// Rectangular plate element, nodes in i-j-m-n order
    fn add_plate(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
    ) -> CalcResult<()>;

    /// General quadrilateral element, nodes in i-j-m-n order
    fn add_quad(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
    ) -> CalcResult<()>;

    /// Pressure along the element's local +z axis
    fn add_plate_surface_pressure(&mut self, plate: &str, pressure: f64, case: &str)
        -> CalcResult<()>;

    fn add_quad_surface_pressure(&mut self, quad: &str, pressure: f64, case: &str)
        -> CalcResult<()>;

    fn add_load_combo(&mut self, combo: LoadCombination) -> CalcResult<()>;

    fn analyze(&mut self) -> CalcResult<()>;
}

/// Query half of the solver contract
pub trait SolverResults {
    fn node_names(&self) -> Vec<String>;

    fn member_names(&self) -> Vec<String>;

    fn support(&self, node: &str) -> Option<Fixity>;

    /// Reactions for a combination; an error when none were computed
    fn node_reactions(&self, node: &str, combo: &str) -> CalcResult<Reactions>;

    /// Response sampled at `n_points` equally spaced stations from i to j
    fn member_array(
        &self,
        member: &str,
        response: Response,
        n_points: usize,
        combo: &str,
    ) -> CalcResult<Vec<f64>>;

    fn member_min(&self, member: &str, response: Response, combo: &str) -> CalcResult<f64>;

    fn member_max(&self, member: &str, response: Response, combo: &str) -> CalcResult<f64>;
}

/// A complete solver backend
pub trait StructuralSolver: SolverModel + SolverResults {}

impl<T: SolverModel + SolverResults> StructuralSolver for T {}
