//! Plate objects into shell elements on the shared node arena

use log::{debug, info};
use serde::Serialize;

use super::{Face, MeshOutput, MeshQualityReport, QualityGrade, StructuredGrid, SurfaceMesher};
use crate::config::QualityThresholds;
use crate::error::recover;
use crate::geometry::{distance, Coord, GeometryIndexer, NodeArena};
use crate::input::PlateObject;

/// Distance in model units under which a plate node snaps to an existing node
pub const NODE_MERGE_TOLERANCE: f64 = 1e-2;

/// Solver element family used for a plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    /// One element spanning the whole plate
    Plate,
    /// Meshed quadrilaterals
    Quad,
}

/// One shell element in arena indices, i-j-m-n order
#[derive(Debug, Clone, PartialEq)]
pub struct PlateElement {
    pub name: String,
    pub nodes: [usize; 4],
    /// A triangle whose last node is repeated
    pub padded: bool,
}

impl PlateElement {
    pub fn node_names(&self) -> [String; 4] {
        self.nodes.map(NodeArena::name)
    }
}

/// What became of one plate; kept in the run report and used to map
/// pressure loads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateMeshRecord {
    pub plate: String,
    pub kind: ElementKind,
    pub elements: Vec<String>,
    pub new_nodes: usize,
    pub reused_nodes: usize,
    /// Mesher that produced the elements, `"corners"` for a single element
    pub mesher: String,
    pub quality: Option<MeshQualityReport>,
}

#[derive(Debug, Clone)]
pub struct PlateMesh {
    pub record: PlateMeshRecord,
    pub material: Option<String>,
    /// Working length unit
    pub thickness: f64,
    pub elements: Vec<PlateElement>,
}

pub struct PlateMeshAdapter<'a> {
    indexer: &'a GeometryIndexer,
    mesher: Option<&'a dyn SurfaceMesher>,
    thresholds: QualityThresholds,
}

impl<'a> PlateMeshAdapter<'a> {
    pub fn new(
        indexer: &'a GeometryIndexer,
        mesher: Option<&'a dyn SurfaceMesher>,
        thresholds: QualityThresholds,
    ) -> Self {
        Self {
            indexer,
            mesher,
            thresholds,
        }
    }

    /// Turn a plate into elements, adding any new nodes to `arena`.
    /// `None` when the plate has no usable geometry.
    pub fn adapt(
        &self,
        plate: &PlateObject,
        arena: &mut NodeArena,
        warnings: &mut Vec<String>,
    ) -> Option<PlateMesh> {
        if !(plate.thickness.is_finite() && plate.thickness > 0.0) {
            recover(
                warnings,
                format!("plate {}: thickness {} is not positive, skipped", plate.name, plate.thickness),
            );
            return None;
        }
        let corners = self.corners(plate, arena, warnings)?;

        let mesh = match plate.mesh_size {
            Some(size) => self.meshed(plate, corners, size, arena, warnings)?,
            None => self.single(plate, corners, arena),
        };
        info!(
            "Plate {}: {} element(s), {} new node(s), {} reused",
            plate.name,
            mesh.elements.len(),
            mesh.record.new_nodes,
            mesh.record.reused_nodes
        );
        Some(mesh)
    }

    /// Corner points in CAD coordinates. Explicit corners must all sit on
    /// existing nodes; otherwise the first four outline points are used.
    fn corners(
        &self,
        plate: &PlateObject,
        arena: &NodeArena,
        warnings: &mut Vec<String>,
    ) -> Option<[Coord; 4]> {
        if let Some(explicit) = &plate.corners {
            let matched = explicit.len() == 4
                && explicit
                    .iter()
                    .all(|p| arena.find_within(&self.indexer.to_model(*p), NODE_MERGE_TOLERANCE).is_some());
            if matched {
                return Some([explicit[0], explicit[1], explicit[2], explicit[3]]);
            }
            recover(
                warnings,
                format!(
                    "plate {}: explicit corners do not match the node list, using outline",
                    plate.name
                ),
            );
        }

        let mut outline: Vec<Coord> = Vec::with_capacity(4);
        for p in &plate.outline {
            if outline.last().map_or(true, |q| distance(p, q) > 1e-9) {
                outline.push(*p);
            }
            if outline.len() == 4 {
                break;
            }
        }
        if outline.len() > 2 && distance(&outline[0], &outline[outline.len() - 1]) <= 1e-9 {
            outline.pop();
        }
        match outline.len() {
            4 => Some([outline[0], outline[1], outline[2], outline[3]]),
            3 => Some([outline[0], outline[1], outline[2], outline[2]]),
            n => {
                recover(
                    warnings,
                    format!("plate {}: outline has {} distinct point(s), skipped", plate.name, n),
                );
                None
            }
        }
    }

    fn single(&self, plate: &PlateObject, corners: [Coord; 4], arena: &mut NodeArena) -> PlateMesh {
        // A padded triangle registers its last corner once
        let padded = distance(&corners[2], &corners[3]) <= 1e-9;
        let distinct = if padded { 3 } else { 4 };
        let (mut new_nodes, mut reused_nodes) = (0, 0);
        let mut nodes = [0usize; 4];
        for (k, p) in corners.iter().take(distinct).enumerate() {
            let (i, new) = arena.insert_within(self.indexer.to_model(*p), NODE_MERGE_TOLERANCE);
            if new {
                new_nodes += 1;
            } else {
                reused_nodes += 1;
            }
            nodes[k] = i;
        }
        if padded {
            nodes[3] = nodes[2];
        }
        let element = PlateElement {
            name: plate.name.clone(),
            nodes,
            padded,
        };
        let quality = self.quality(std::slice::from_ref(&element), arena);
        PlateMesh {
            record: PlateMeshRecord {
                plate: plate.name.clone(),
                kind: ElementKind::Plate,
                elements: vec![element.name.clone()],
                new_nodes,
                reused_nodes,
                mesher: "corners".to_string(),
                quality,
            },
            material: plate.material.clone(),
            thickness: plate.thickness * self.indexer.scale(),
            elements: vec![element],
        }
    }

    fn meshed(
        &self,
        plate: &PlateObject,
        corners: [Coord; 4],
        size: f64,
        arena: &mut NodeArena,
        warnings: &mut Vec<String>,
    ) -> Option<PlateMesh> {
        let face = Face {
            name: plate.name.clone(),
            outline: plate.outline.clone(),
            corners,
        };
        let (output, mesher) = self.run_mesher(&face, size, warnings)?;

        // Mesher tag -> arena index
        let mut tags = std::collections::BTreeMap::new();
        let (mut new_nodes, mut reused_nodes) = (0, 0);
        for (&tag, p) in &output.nodes {
            let (i, new) = arena.insert_within(self.indexer.to_model(*p), NODE_MERGE_TOLERANCE);
            if new {
                new_nodes += 1;
            } else {
                debug!("plate {}: mesh node {} reuses node {}", plate.name, tag, i);
                reused_nodes += 1;
            }
            tags.insert(tag, i);
        }

        let mut elements = Vec::with_capacity(output.elements.len());
        for (id, element_tags) in &output.elements {
            let mut nodes: Vec<usize> = Vec::with_capacity(4);
            let mut missing = None;
            for tag in element_tags {
                match tags.get(tag) {
                    Some(&i) if nodes.last() != Some(&i) => nodes.push(i),
                    Some(_) => {}
                    None => missing = Some(*tag),
                }
            }
            if let Some(tag) = missing {
                recover(
                    warnings,
                    format!("plate {}: element {} references unknown node {}", plate.name, id, tag),
                );
                continue;
            }
            if nodes.len() > 1 && nodes.first() == nodes.last() {
                nodes.pop();
            }
            let (nodes, padded) = match nodes.as_slice() {
                &[a, b, c, d] => ([a, b, c, d], false),
                &[a, b, c] => ([a, b, c, c], true),
                other => {
                    recover(
                        warnings,
                        format!(
                            "plate {}: element {} has {} distinct node(s), skipped",
                            plate.name,
                            id,
                            other.len()
                        ),
                    );
                    continue;
                }
            };
            elements.push(PlateElement {
                name: format!("{}_Q{}", plate.name, elements.len() + 1),
                nodes,
                padded,
            });
        }

        if elements.is_empty() {
            recover(warnings, format!("plate {}: mesh produced no elements", plate.name));
            return None;
        }
        let padded = elements.iter().filter(|e| e.padded).count();
        if padded > 0 {
            debug!("plate {}: {} triangle(s) padded to quads", plate.name, padded);
        }

        let quality = self.quality(&elements, arena);
        if let Some(q) = &quality {
            if q.grade == QualityGrade::Poor {
                recover(
                    warnings,
                    format!(
                        "plate {}: poor mesh quality ({} of {} elements violate thresholds)",
                        plate.name, q.violating, q.total
                    ),
                );
            }
        }

        Some(PlateMesh {
            record: PlateMeshRecord {
                plate: plate.name.clone(),
                kind: ElementKind::Quad,
                elements: elements.iter().map(|e| e.name.clone()).collect(),
                new_nodes,
                reused_nodes,
                mesher,
                quality,
            },
            material: plate.material.clone(),
            thickness: plate.thickness * self.indexer.scale(),
            elements,
        })
    }

    /// Configured mesher first, structured grid when it is absent, fails or
    /// returns nothing
    fn run_mesher(
        &self,
        face: &Face,
        size: f64,
        warnings: &mut Vec<String>,
    ) -> Option<(MeshOutput, String)> {
        if let Some(mesher) = self.mesher {
            match mesher.mesh(face, size) {
                Ok(out) if !out.is_empty() => return Some((out, mesher.name().to_string())),
                Ok(_) => recover(
                    warnings,
                    format!("plate {}: {} returned no elements, using structured grid", face.name, mesher.name()),
                ),
                Err(e) => recover(
                    warnings,
                    format!("plate {}: {} failed ({}), using structured grid", face.name, mesher.name(), e),
                ),
            }
        }
        let grid = StructuredGrid;
        match grid.mesh(face, size) {
            Ok(out) => Some((out, grid.name().to_string())),
            Err(e) => {
                recover(warnings, format!("plate {}: {}", face.name, e));
                None
            }
        }
    }

    fn quality(&self, elements: &[PlateElement], arena: &NodeArena) -> Option<MeshQualityReport> {
        let shapes: Vec<Vec<Coord>> = elements
            .iter()
            .map(|e| e.nodes.iter().filter_map(|&i| arena.coord(i).copied()).collect())
            .collect();
        if shapes.is_empty() {
            return None;
        }
        Some(MeshQualityReport::assess(&shapes, &self.thresholds))
    }
}
