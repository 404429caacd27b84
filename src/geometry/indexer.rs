//! Node deduplication by rounded coordinate

use std::collections::HashMap;

use log::debug;

use super::{cad_to_model, distance, Coord};
use crate::input::FrameObject;

/// Integer key of a rounded coordinate
pub type NodeKey = [i64; 3];

/// Ordered node list plus a coordinate -> index map.
///
/// Two points are the same node when every coordinate rounds (half away
/// from zero) to the same value at `decimals` places. Points straddling a
/// rounding boundary are distinct even if closer than the tolerance.
#[derive(Debug, Clone)]
pub struct NodeArena {
    decimals: u32,
    scale: f64,
    coords: Vec<Coord>,
    index: HashMap<NodeKey, usize>,
}

impl NodeArena {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            scale: 10f64.powi(decimals as i32),
            coords: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn key(&self, p: &Coord) -> NodeKey {
        [
            (p[0] * self.scale).round() as i64,
            (p[1] * self.scale).round() as i64,
            (p[2] * self.scale).round() as i64,
        ]
    }

    /// Coordinate snapped to the rounding grid
    pub fn round(&self, p: &Coord) -> Coord {
        let k = self.key(p);
        [
            k[0] as f64 / self.scale,
            k[1] as f64 / self.scale,
            k[2] as f64 / self.scale,
        ]
    }

    /// Insert a model-frame point; returns its index and whether it was new
    pub fn insert(&mut self, p: Coord) -> (usize, bool) {
        let key = self.key(&p);
        if let Some(&i) = self.index.get(&key) {
            return (i, false);
        }
        let i = self.coords.len();
        self.coords.push(self.round(&p));
        self.index.insert(key, i);
        (i, true)
    }

    pub fn find(&self, p: &Coord) -> Option<usize> {
        self.index.get(&self.key(p)).copied()
    }

    /// Nearest node within `tol` of `p`, looking across rounding boundaries
    pub fn find_within(&self, p: &Coord, tol: f64) -> Option<usize> {
        if let Some(i) = self.find(p) {
            if distance(&self.coords[i], p) <= tol {
                return Some(i);
            }
        }
        let reach = (tol * self.scale).ceil() as i64 + 1;
        let cells = (2 * reach + 1).pow(3) as usize;
        if cells > self.coords.len() {
            return self.nearest(p, tol, 0..self.coords.len());
        }
        let k = self.key(p);
        let neighbours = (-reach..=reach).flat_map(move |dx| {
            (-reach..=reach).flat_map(move |dy| (-reach..=reach).map(move |dz| [k[0] + dx, k[1] + dy, k[2] + dz]))
        });
        self.nearest(p, tol, neighbours.filter_map(|key| self.index.get(&key).copied()))
    }

    fn nearest(&self, p: &Coord, tol: f64, candidates: impl Iterator<Item = usize>) -> Option<usize> {
        candidates
            .map(|i| (i, distance(&self.coords[i], p)))
            .filter(|&(_, d)| d <= tol)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Like [`NodeArena::insert`], but an existing node within `tol` is reused
    pub fn insert_within(&mut self, p: Coord, tol: f64) -> (usize, bool) {
        match self.find_within(&p, tol) {
            Some(i) => (i, false),
            None => self.insert(p),
        }
    }

    pub fn coord(&self, index: usize) -> Option<&Coord> {
        self.coords.get(index)
    }

    /// Canonical solver name of a node
    pub fn name(index: usize) -> String {
        index.to_string()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Coord)> {
        self.coords.iter().enumerate()
    }
}

/// Extracts edge endpoints from frame objects into a [`NodeArena`]
#[derive(Debug, Clone, Copy)]
pub struct GeometryIndexer {
    scale: f64,
    decimals: u32,
}

impl GeometryIndexer {
    /// `scale` converts CAD lengths into working lengths
    pub fn new(scale: f64, decimals: u32) -> Self {
        Self { scale, decimals }
    }

    /// CAD point into the model frame (unrounded)
    pub fn to_model(&self, p: Coord) -> Coord {
        cad_to_model(p, self.scale)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Build the ordered node list for a set of frame objects
    pub fn index(&self, frames: &[FrameObject]) -> NodeArena {
        let mut arena = NodeArena::new(self.decimals);
        for frame in frames {
            for (_, [a, b]) in frame.segments() {
                for p in [a, b] {
                    let (i, new) = arena.insert(self.to_model(p));
                    if new {
                        debug!("node {} at {:?}", i, arena.coords[i]);
                    }
                }
            }
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str, vertices: Vec<Coord>) -> FrameObject {
        FrameObject {
            name: name.into(),
            vertices,
            edges: vec![],
            material: None,
            section: None,
            rotation: 0.0,
            truss: false,
        }
    }

    #[test]
    fn test_shared_endpoints_dedup() {
        let frames = vec![
            frame("A", vec![[0.0, 0.0, 0.0], [1000.0, 0.0, 0.0]]),
            frame("B", vec![[1000.0, 0.0, 0.0], [1000.0, 0.0, 3000.0]]),
        ];
        let arena = GeometryIndexer::new(1.0, 2).index(&frames);
        assert_eq!(arena.len(), 3);
        // CAD Z becomes solver Y
        assert_eq!(arena.coord(2), Some(&[1000.0, 3000.0, 0.0]));
    }

    #[test]
    fn test_indexing_is_idempotent() {
        let frames = vec![
            frame("A", vec![[0.0, 0.0, 0.0], [1.234, 5.678, 9.1011], [3.0, 3.0, 3.0]]),
            frame("B", vec![[3.0, 3.0, 3.0], [0.0, 0.0, 0.0]]),
        ];
        let indexer = GeometryIndexer::new(1.0, 2);
        let a = indexer.index(&frames);
        let b = indexer.index(&frames);
        assert_eq!(a.len(), b.len());
        for ((ia, ca), (ib, cb)) in a.iter().zip(b.iter()) {
            assert_eq!(ia, ib);
            assert_eq!(ca, cb);
        }
    }

    #[test]
    fn test_rounding_boundary() {
        let mut arena = NodeArena::new(2);
        let (origin, _) = arena.insert([0.0, 0.0, 0.0]);
        assert_eq!(arena.find(&[0.004999, 0.0, 0.0]), Some(origin));
        assert_eq!(arena.find(&[0.005001, 0.0, 0.0]), None);
        assert_eq!(arena.find(&[-0.004999, 0.0, 0.0]), Some(origin));

        let (i, new) = arena.insert([0.005001, 0.0, 0.0]);
        assert!(new);
        assert_eq!(arena.coord(i), Some(&[0.01, 0.0, 0.0]));
    }

    #[test]
    fn test_tolerance_lookup_crosses_rounding_boundary() {
        let mut arena = NodeArena::new(2);
        let (origin, _) = arena.insert([0.0, 0.0, 0.0]);
        let (far, _) = arena.insert([1000.0, 0.0, 0.0]);

        // Rounds to 0.01, so the exact lookup misses
        let near = [0.006, 0.0, 0.0];
        assert_eq!(arena.find(&near), None);
        assert_eq!(arena.find_within(&near, 1e-2), Some(origin));
        assert_eq!(arena.find_within(&[999.992, 0.0, 0.003], 1e-2), Some(far));
        assert_eq!(arena.find_within(&[0.02, 0.0, 0.0], 1e-2), None);

        let (i, new) = arena.insert_within(near, 1e-2);
        assert_eq!((i, new), (origin, false));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_tolerance_lookup_checks_neighbour_keys() {
        let mut arena = NodeArena::new(2);
        for x in 0..6 {
            for y in 0..6 {
                for z in 0..6 {
                    arena.insert([x as f64, y as f64, z as f64]);
                }
            }
        }
        let target = arena.find(&[2.0, 3.0, 4.0]).unwrap();
        assert_eq!(arena.find(&[2.006, 2.996, 4.0]), None);
        assert_eq!(arena.find_within(&[2.006, 2.996, 4.0], 1e-2), Some(target));
        assert_eq!(arena.find_within(&[2.5, 3.0, 4.0], 1e-2), None);
    }

    #[test]
    fn test_tolerance_lookup_scans_small_arenas() {
        // Fine rounding makes the neighbour grid larger than the arena
        let mut arena = NodeArena::new(4);
        let (a, _) = arena.insert([1.0, 2.0, 3.0]);
        assert_eq!(arena.find_within(&[1.009, 2.0, 3.0], 1e-2), Some(a));
        assert_eq!(arena.find_within(&[1.011, 2.0, 3.0], 1e-2), None);
    }

    #[test]
    fn test_empty_input() {
        let arena = GeometryIndexer::new(1.0, 2).index(&[]);
        assert!(arena.is_empty());
    }
}
