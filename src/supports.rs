//! Support markers into nodal fixity

use log::debug;

use crate::error::recover;
use crate::geometry::{GeometryIndexer, NodeArena};
use crate::input::{CadFixity, StructureInput, SupportObject, SupportTarget};
use crate::solver::{Fixity, SolverModel};

/// CAD fixity flags in solver axes (CAD Y and Z swap for both translation
/// and rotation)
pub fn cad_to_solver_fixity(cad: &CadFixity) -> Fixity {
    Fixity {
        dx: cad.dx,
        dy: cad.dz,
        dz: cad.dy,
        rx: cad.rx,
        ry: cad.rz,
        rz: cad.ry,
    }
}

pub struct SupportApplicator<'a> {
    input: &'a StructureInput,
    indexer: &'a GeometryIndexer,
    arena: &'a NodeArena,
}

impl<'a> SupportApplicator<'a> {
    pub fn new(input: &'a StructureInput, indexer: &'a GeometryIndexer, arena: &'a NodeArena) -> Self {
        Self {
            input,
            indexer,
            arena,
        }
    }

    /// Register every support that lands on a node; returns how many did
    pub fn apply<S: SolverModel + ?Sized>(
        &self,
        supports: &[SupportObject],
        solver: &mut S,
        warnings: &mut Vec<String>,
    ) -> usize {
        let mut applied = 0;
        for support in supports {
            match self.register(support, solver) {
                Ok(node) => {
                    debug!("support {} on node {}", support.name, node);
                    applied += 1;
                }
                Err(msg) => recover(warnings, format!("support {}: {}", support.name, msg)),
            }
        }
        applied
    }

    fn register<S: SolverModel + ?Sized>(
        &self,
        support: &SupportObject,
        solver: &mut S,
    ) -> Result<usize, String> {
        let point = match &support.target {
            SupportTarget::Vertex { object, vertex } => self
                .input
                .vertex(object, *vertex)
                .ok_or_else(|| format!("vertex {} of {} not found", vertex, object))?,
            SupportTarget::Point { point } => *point,
        };
        let node = self
            .arena
            .find(&self.indexer.to_model(point))
            .ok_or_else(|| format!("no structural node at {:?}, skipped", point))?;

        let fixity = cad_to_solver_fixity(&support.fixity);
        if !fixity.is_supported() {
            return Err("no restrained degree of freedom, skipped".to_string());
        }
        solver
            .def_support(&NodeArena::name(node), fixity)
            .map_err(|e| e.to_string())?;
        Ok(node)
    }
}
