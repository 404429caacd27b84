//! Structure Calc - structural model construction and result extraction
//!
//! Turns CAD-style structural objects (frames, plates, loads, supports,
//! materials and sections) into a finite-element model, solves it for one
//! load combination and extracts per-member response series and support
//! reactions:
//! - Node deduplication by rounded coordinate, CAD Z-up to solver Y-up
//! - Member assembly with a vertical end-node tie-break
//! - Material and section resolution, including section rotation
//! - Standard ASD / strength-design combination table
//! - Plate meshing with a structured-grid fallback and mesh grading
//! - A PyNite-style linear-static frame/shell solver behind a trait
//!
//! ## Example
//! ```rust
//! use structure_calc::prelude::*;
//!
//! let json = r#"{
//!     "frames": [{ "name": "B", "vertices": [[0, 0, 0], [1000, 0, 0]], "section": "S" }],
//!     "sections": { "S": { "area": 5000, "iy": 1e7, "iz": 4e7, "j": 1e6 } },
//!     "supports": [{
//!         "name": "Fix",
//!         "target": { "kind": "vertex", "object": "B", "vertex": 0 },
//!         "fixity": { "dx": true, "dy": true, "dz": true, "rx": true, "ry": true, "rz": true }
//!     }],
//!     "loads": [{
//!         "name": "Tip",
//!         "direction": "-Z",
//!         "target": { "kind": "vertex", "object": "B", "vertex": 1 },
//!         "magnitude": { "kind": "nodal", "value": 10.0 },
//!         "force_unit": "kn"
//!     }]
//! }"#;
//! let input = StructureInput::from_json(json).unwrap();
//!
//! let mut pipeline = Pipeline::new(CalcOptions::default());
//! let report = pipeline.run(&input);
//! assert_eq!(report.state, RunState::ResultsExtracted);
//!
//! let fixed = report.reactions.get("0").unwrap();
//! assert!((fixed.reactions.fy - 10.0).abs() < 1e-6);
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod loads;
pub mod mesh;
pub mod pipeline;
pub mod properties;
pub mod results;
pub mod solver;
pub mod supports;
pub mod units;

// Re-export common types
pub mod prelude {
    pub use crate::config::{AnalysisOptions, CalcOptions, QualityThresholds, ResponsePoints};
    pub use crate::error::{CalcError, CalcResult};
    pub use crate::geometry::{GeometryIndexer, MemberAssembler, MemberRecord, NodeArena};
    pub use crate::input::{
        AreaLoadObject, CadDirection, CadFixity, FrameObject, LoadMagnitude, LoadObject,
        LoadTarget, MaterialSource, PlateObject, SectionSource, StructureInput, SupportObject,
        SupportTarget,
    };
    pub use crate::loads::{CombinationTable, LoadCombination, LoadType};
    pub use crate::mesh::{Face, MeshOutput, MeshQualityReport, StructuredGrid, SurfaceMesher};
    pub use crate::pipeline::{Pipeline, RunReport, RunState};
    pub use crate::results::{MemberResult, ReactionTable, ResponseSeries};
    pub use crate::solver::{
        FrameModel, Response, SolverModel, SolverResults, StructuralSolver,
    };
    pub use crate::units::{ForceUnit, LengthUnit, Quantity, UnitSystem};
}
