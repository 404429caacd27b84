//! Input document: the CAD-side objects the pipeline consumes
//!
//! Every object kind is resolved into a tagged variant at ingestion time;
//! nothing downstream probes for optional fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CalcResult;
use crate::geometry::Coord;
use crate::loads::LoadType;
use crate::units::{ForceUnit, LengthUnit, Quantity};

/// Complete structural input for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureInput {
    pub frames: Vec<FrameObject>,
    pub plates: Vec<PlateObject>,
    pub materials: BTreeMap<String, MaterialSource>,
    pub sections: BTreeMap<String, SectionSource>,
    pub loads: Vec<LoadObject>,
    pub supports: Vec<SupportObject>,
    pub area_loads: Vec<AreaLoadObject>,
}

impl StructureInput {
    pub fn from_json(text: &str) -> CalcResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn frame(&self, name: &str) -> Option<&FrameObject> {
        self.frames.iter().find(|f| f.name == name)
    }

    pub fn plate(&self, name: &str) -> Option<&PlateObject> {
        self.plates.iter().find(|p| p.name == name)
    }

    /// Look up a vertex on any frame or plate object
    pub fn vertex(&self, object: &str, index: usize) -> Option<Coord> {
        if let Some(frame) = self.frame(object) {
            return frame.vertices.get(index).copied();
        }
        self.plate(object)
            .and_then(|p| p.outline.get(index).copied())
    }
}

/// A line-bearing object; each edge becomes one member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameObject {
    pub name: String,
    pub vertices: Vec<Coord>,
    /// Vertex index pairs; a polyline through `vertices` when empty
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    /// Section rotation about the member axis, degrees
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub truss: bool,
}

impl FrameObject {
    /// Edge endpoints in CAD coordinates, paired with their edge index.
    /// Edges referencing missing vertices are dropped.
    pub fn segments(&self) -> Vec<(usize, [Coord; 2])> {
        let pairs: Vec<[usize; 2]> = if self.edges.is_empty() {
            (1..self.vertices.len()).map(|i| [i - 1, i]).collect()
        } else {
            self.edges.clone()
        };
        pairs
            .iter()
            .enumerate()
            .filter_map(|(k, [a, b])| {
                let a = self.vertices.get(*a)?;
                let b = self.vertices.get(*b)?;
                Some((k, [*a, *b]))
            })
            .collect()
    }

    /// Member name for one of this object's edges
    pub fn member_name(&self, edge: usize) -> String {
        format!("{}_{}", self.name, edge)
    }
}

/// A planar face to be turned into shell elements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateObject {
    pub name: String,
    /// Face boundary, at least three points
    pub outline: Vec<Coord>,
    /// Explicit corner points (four expected)
    #[serde(default)]
    pub corners: Option<Vec<Coord>>,
    /// Thickness in the geometry unit
    pub thickness: f64,
    #[serde(default)]
    pub material: Option<String>,
    /// Target element size in the geometry unit; single element when absent
    #[serde(default)]
    pub mesh_size: Option<f64>,
}

/// Calc-properties exposed directly by newer material objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcProperties {
    /// Elastic modulus, MPa
    pub modulus: f64,
    /// Shear modulus, MPa
    #[serde(default)]
    pub shear_modulus: Option<f64>,
    pub poisson: f64,
    /// Unit weight, kN/m³
    pub unit_weight: f64,
}

/// How a material exposes its properties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialSource {
    Structured(CalcProperties),
    RawFields {
        density: Quantity,
        modulus: Quantity,
        poisson: f64,
        #[serde(default)]
        shear_modulus: Option<Quantity>,
    },
}

/// Cross-section properties in a stated length unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSource {
    pub area: f64,
    pub iy: f64,
    pub iz: f64,
    #[serde(default)]
    pub iyz: f64,
    /// Torsion constant
    pub j: f64,
    #[serde(default)]
    pub unit: LengthUnit,
}

/// Global direction token in CAD axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CadDirection {
    #[serde(rename = "+X")]
    PosX,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "+Y")]
    PosY,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "+Z")]
    PosZ,
    #[serde(rename = "-Z")]
    NegZ,
}

impl CadDirection {
    pub fn token(self) -> &'static str {
        match self {
            CadDirection::PosX => "+X",
            CadDirection::NegX => "-X",
            CadDirection::PosY => "+Y",
            CadDirection::NegY => "-Y",
            CadDirection::PosZ => "+Z",
            CadDirection::NegZ => "-Z",
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            CadDirection::PosX | CadDirection::PosY | CadDirection::PosZ => 1.0,
            _ => -1.0,
        }
    }
}

/// What a load is attached to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadTarget {
    Edge { object: String, edge: usize },
    Vertex { object: String, vertex: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadMagnitude {
    Nodal { value: f64 },
    Distributed { initial: f64, r#final: f64 },
}

/// A nodal or edge-distributed load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadObject {
    pub name: String,
    #[serde(default)]
    pub load_type: Option<LoadType>,
    pub direction: CadDirection,
    pub target: LoadTarget,
    pub magnitude: LoadMagnitude,
    #[serde(default)]
    pub force_unit: ForceUnit,
    /// Length unit of a distributed magnitude (force per this unit)
    #[serde(default = "default_load_length")]
    pub length_unit: LengthUnit,
}

fn default_load_length() -> LengthUnit {
    LengthUnit::M
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SupportTarget {
    Vertex { object: String, vertex: usize },
    Point { point: Coord },
}

/// Fixity flags in CAD axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadFixity {
    pub dx: bool,
    pub dy: bool,
    pub dz: bool,
    pub rx: bool,
    pub ry: bool,
    pub rz: bool,
}

impl CadFixity {
    pub fn fixed() -> Self {
        Self {
            dx: true,
            dy: true,
            dz: true,
            rx: true,
            ry: true,
            rz: true,
        }
    }

    pub fn pinned() -> Self {
        Self {
            dx: true,
            dy: true,
            dz: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportObject {
    pub name: String,
    pub target: SupportTarget,
    pub fixity: CadFixity,
}

/// A pressure load on a plate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaLoadObject {
    pub name: String,
    #[serde(default)]
    pub load_type: Option<LoadType>,
    pub pressure: Quantity,
    /// Explicit link to the loaded plate
    #[serde(default)]
    pub plate: Option<String>,
    /// Parent object reference, used when no explicit link exists
    #[serde(default)]
    pub parent: Option<String>,
}

impl AreaLoadObject {
    pub fn target_plate(&self) -> Option<&str> {
        self.plate.as_deref().or(self.parent.as_deref())
    }
}
