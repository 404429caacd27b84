//! Member assembly from frame edges

use log::warn;
use serde::Serialize;

use super::{GeometryIndexer, NodeArena};
use crate::input::FrameObject;

/// One frame member referencing two arena nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRecord {
    pub name: String,
    /// Source frame object
    pub object: String,
    pub i_node: usize,
    /// Never lower than `i_node` in the vertical axis
    pub j_node: usize,
    pub material: Option<String>,
    pub section: Option<String>,
    /// Section rotation, degrees
    pub rotation: f64,
    pub truss: bool,
    /// Ends were swapped relative to the edge's vertex order
    pub flipped: bool,
}

impl MemberRecord {
    pub fn node_names(&self) -> [String; 2] {
        [NodeArena::name(self.i_node), NodeArena::name(self.j_node)]
    }
}

pub struct MemberAssembler<'a> {
    indexer: &'a GeometryIndexer,
    arena: &'a NodeArena,
}

impl<'a> MemberAssembler<'a> {
    pub fn new(indexer: &'a GeometryIndexer, arena: &'a NodeArena) -> Self {
        Self { indexer, arena }
    }

    /// Map every edge to a member. Returns the members in input order plus
    /// a warning for each edge that could not be resolved.
    pub fn assemble(&self, frames: &[FrameObject]) -> (Vec<MemberRecord>, Vec<String>) {
        let mut members = Vec::new();
        let mut warnings = Vec::new();

        for frame in frames {
            for (edge, [a, b]) in frame.segments() {
                let name = frame.member_name(edge);
                let (Some(mut i), Some(mut j)) = (
                    self.arena.find(&self.indexer.to_model(a)),
                    self.arena.find(&self.indexer.to_model(b)),
                ) else {
                    let msg = format!("member {}: endpoint not in node list, skipped", name);
                    warn!("{}", msg);
                    warnings.push(msg);
                    continue;
                };
                if i == j {
                    let msg = format!("member {}: zero length after rounding, skipped", name);
                    warn!("{}", msg);
                    warnings.push(msg);
                    continue;
                }
                let flipped = self.vertical(j) < self.vertical(i);
                if flipped {
                    std::mem::swap(&mut i, &mut j);
                }
                members.push(MemberRecord {
                    name,
                    object: frame.name.clone(),
                    i_node: i,
                    j_node: j,
                    material: frame.material.clone(),
                    section: frame.section.clone(),
                    rotation: frame.rotation,
                    truss: frame.truss,
                    flipped,
                });
            }
        }

        (members, warnings)
    }

    fn vertical(&self, index: usize) -> f64 {
        self.arena.coord(index).map(|c| c[1]).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str, vertices: Vec<[f64; 3]>) -> FrameObject {
        FrameObject {
            name: name.into(),
            vertices,
            edges: vec![],
            material: Some("S355".into()),
            section: Some("IPE300".into()),
            rotation: 0.0,
            truss: false,
        }
    }

    #[test]
    fn test_higher_node_listed_second() {
        // Column drawn top-down in CAD
        let frames = vec![frame("C1", vec![[0.0, 0.0, 3000.0], [0.0, 0.0, 0.0]])];
        let indexer = GeometryIndexer::new(1.0, 2);
        let arena = indexer.index(&frames);
        let (members, warnings) = MemberAssembler::new(&indexer, &arena).assemble(&frames);
        assert!(warnings.is_empty());
        assert_eq!(members.len(), 1);
        let m = &members[0];
        assert_eq!(m.name, "C1_0");
        let yi = arena.coord(m.i_node).unwrap()[1];
        let yj = arena.coord(m.j_node).unwrap()[1];
        assert!(yj >= yi);
        assert_eq!(m.i_node, 1);
        assert_eq!(m.j_node, 0);
        assert!(m.flipped);
    }

    #[test]
    fn test_tie_break_holds_for_every_member() {
        let frames = vec![
            frame("F", vec![[0.0, 0.0, 0.0], [0.0, 0.0, 3.0], [4.0, 0.0, 3.0], [4.0, 0.0, 0.0]]),
            frame("D", vec![[4.0, 0.0, 3.0], [0.0, 0.0, 0.0]]),
        ];
        let indexer = GeometryIndexer::new(1.0, 2);
        let arena = indexer.index(&frames);
        let (members, _) = MemberAssembler::new(&indexer, &arena).assemble(&frames);
        assert_eq!(members.len(), 4);
        for m in &members {
            assert!(arena.coord(m.j_node).unwrap()[1] >= arena.coord(m.i_node).unwrap()[1]);
        }
        let flipped: Vec<_> = members.iter().filter(|m| m.flipped).map(|m| m.name.as_str()).collect();
        assert_eq!(flipped, vec!["F_2", "D_0"]);
    }

    #[test]
    fn test_degenerate_edge_is_skipped() {
        let frames = vec![frame("Z", vec![[0.0, 0.0, 0.0], [0.001, 0.0, 0.0]])];
        let indexer = GeometryIndexer::new(1.0, 2);
        let arena = indexer.index(&frames);
        let (members, warnings) = MemberAssembler::new(&indexer, &arena).assemble(&frames);
        assert!(members.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
