//! Plate discretisation: mesher contract, structured-grid fallback,
//! plate-to-element adapter and mesh quality grading

mod adapter;
mod grid;
mod quality;

pub use adapter::{ElementKind, PlateElement, PlateMesh, PlateMeshAdapter, PlateMeshRecord, NODE_MERGE_TOLERANCE};
pub use grid::StructuredGrid;
pub use quality::{
    element_quality, ElementQuality, ElementShape, MeshQualityReport, QualityGrade, ShapeStats,
    Stat,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CalcResult;
use crate::geometry::Coord;

/// A planar face handed to a mesher, in CAD coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub name: String,
    pub outline: Vec<Coord>,
    /// Corner points in i-j-m-n order; a triangle repeats its last corner
    pub corners: [Coord; 4],
}

/// Mesher output: node tag -> coordinate, element id -> node tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshOutput {
    pub nodes: BTreeMap<usize, Coord>,
    pub elements: BTreeMap<usize, Vec<usize>>,
}

impl MeshOutput {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// External surface mesher
pub trait SurfaceMesher {
    fn name(&self) -> &str;

    /// Discretise `face` at a target element size (same length unit as the face)
    fn mesh(&self, face: &Face, size: f64) -> CalcResult<MeshOutput>;
}
