//! Nodal and edge-distributed loads from CAD load objects

use std::collections::HashMap;

use log::debug;

use super::{direction_token, LoadType};
use crate::error::recover;
use crate::geometry::{distance, GeometryIndexer, MemberRecord, NodeArena};
use crate::input::{CadDirection, LoadMagnitude, LoadObject, LoadTarget, StructureInput};
use crate::solver::{DistributedLoad, LoadDirection, SolverModel};
use crate::units::UnitSystem;

/// Solver axis and sign for a CAD direction (CAD Z is solver Y)
pub fn solver_direction(direction: CadDirection) -> (LoadDirection, f64) {
    let axis = match direction {
        CadDirection::PosX | CadDirection::NegX => LoadDirection::FX,
        CadDirection::PosY | CadDirection::NegY => LoadDirection::FZ,
        CadDirection::PosZ | CadDirection::NegZ => LoadDirection::FY,
    };
    (axis, direction.sign())
}

/// Registers load objects against a solver model
pub struct LoadApplicator<'a> {
    input: &'a StructureInput,
    indexer: &'a GeometryIndexer,
    arena: &'a NodeArena,
    members: HashMap<&'a str, &'a MemberRecord>,
    units: UnitSystem,
    combination: &'a str,
}

impl<'a> LoadApplicator<'a> {
    pub fn new(
        input: &'a StructureInput,
        indexer: &'a GeometryIndexer,
        arena: &'a NodeArena,
        members: &'a [MemberRecord],
        units: UnitSystem,
        combination: &'a str,
    ) -> Self {
        Self {
            input,
            indexer,
            arena,
            members: members.iter().map(|m| (m.name.as_str(), m)).collect(),
            units,
            combination,
        }
    }

    /// Wind/seismic loads only act in the direction named by the active
    /// combination; loads in any other direction are left out
    pub fn is_active(&self, load: &LoadObject) -> bool {
        let load_type = load.load_type.unwrap_or_default();
        if !load_type.is_directional() {
            return true;
        }
        match direction_token(self.combination) {
            Some(token) => token == load.direction.token(),
            None => true,
        }
    }

    /// Register every load; returns how many reached the solver
    pub fn apply<S: SolverModel + ?Sized>(
        &self,
        loads: &[LoadObject],
        solver: &mut S,
        warnings: &mut Vec<String>,
    ) -> usize {
        let mut applied = 0;
        for load in loads {
            if !self.is_active(load) {
                debug!(
                    "load {}: direction {} inactive under {}",
                    load.name,
                    load.direction.token(),
                    self.combination
                );
                continue;
            }
            match self.register(load, solver) {
                Ok(()) => applied += 1,
                Err(msg) => recover(warnings, format!("load {}: {}", load.name, msg)),
            }
        }
        applied
    }

    fn register<S: SolverModel + ?Sized>(&self, load: &LoadObject, solver: &mut S) -> Result<(), String> {
        let case = load.load_type.unwrap_or(LoadType::Dead).case_name();
        let (axis, sign) = solver_direction(load.direction);

        match (&load.target, &load.magnitude) {
            (LoadTarget::Vertex { object, vertex }, LoadMagnitude::Nodal { value }) => {
                let p = self
                    .input
                    .vertex(object, *vertex)
                    .ok_or_else(|| format!("vertex {} of {} not found", vertex, object))?;
                let node = self
                    .arena
                    .find(&self.indexer.to_model(p))
                    .ok_or_else(|| format!("no structural node at {:?}", p))?;
                let value = sign * self.units.force(*value, load.force_unit);
                solver
                    .add_node_load(&NodeArena::name(node), axis, value, case)
                    .map_err(|e| e.to_string())
            }
            (LoadTarget::Edge { object, edge }, LoadMagnitude::Distributed { initial, r#final }) => {
                let frame = self
                    .input
                    .frame(object)
                    .ok_or_else(|| format!("frame object {} not found", object))?;
                let name = frame.member_name(*edge);
                let member = self
                    .members
                    .get(name.as_str())
                    .ok_or_else(|| format!("member {} not in model", name))?;
                let (pi, pj) = match (self.arena.coord(member.i_node), self.arena.coord(member.j_node)) {
                    (Some(a), Some(b)) => (*a, *b),
                    _ => return Err(format!("member {} has no coordinates", name)),
                };

                // Values run from the edge's first vertex
                let (w1, w2) = if member.flipped {
                    (*r#final, *initial)
                } else {
                    (*initial, *r#final)
                };
                let convert = |w: f64| sign * self.units.line_load(w, load.force_unit, load.length_unit);

                solver
                    .add_member_dist_load(
                        &name,
                        DistributedLoad::new(convert(w1), convert(w2), 0.0, distance(&pi, &pj), axis, case),
                    )
                    .map_err(|e| e.to_string())
            }
            (LoadTarget::Edge { .. }, LoadMagnitude::Nodal { .. }) => {
                Err("nodal magnitude needs a vertex target".to_string())
            }
            (LoadTarget::Vertex { .. }, LoadMagnitude::Distributed { .. }) => {
                Err("distributed magnitude needs an edge target".to_string())
            }
        }
    }
}
