//! Structured quad grid by bilinear sampling of a face's corners

use super::{Face, MeshOutput, SurfaceMesher};
use crate::error::{CalcError, CalcResult};
use crate::geometry::{bilinear, distance};

/// Always-available mesher used when no external mesher is configured or
/// the configured one fails
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredGrid;

impl StructuredGrid {
    /// Divisions along one parametric direction
    pub fn divisions(length: f64, size: f64) -> usize {
        ((length / size).ceil() as usize).max(1)
    }
}

impl SurfaceMesher for StructuredGrid {
    fn name(&self) -> &str {
        "structured-grid"
    }

    fn mesh(&self, face: &Face, size: f64) -> CalcResult<MeshOutput> {
        if !(size.is_finite() && size > 0.0) {
            return Err(CalcError::Mesher(format!("invalid element size {}", size)));
        }
        let c = &face.corners;
        let nu = Self::divisions(distance(&c[0], &c[1]).max(distance(&c[3], &c[2])), size);
        let nv = Self::divisions(distance(&c[0], &c[3]).max(distance(&c[1], &c[2])), size);

        let mut out = MeshOutput::default();
        let tag = |i: usize, j: usize| 1 + j * (nu + 1) + i;
        for j in 0..=nv {
            for i in 0..=nu {
                let p = bilinear(c, i as f64 / nu as f64, j as f64 / nv as f64);
                out.nodes.insert(tag(i, j), p);
            }
        }
        let mut id = 1;
        for j in 0..nv {
            for i in 0..nu {
                out.elements.insert(
                    id,
                    vec![tag(i, j), tag(i + 1, j), tag(i + 1, j + 1), tag(i, j + 1)],
                );
                id += 1;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face(w: f64, h: f64) -> Face {
        let corners = [[0.0, 0.0, 0.0], [w, 0.0, 0.0], [w, h, 0.0], [0.0, h, 0.0]];
        Face {
            name: "P".into(),
            outline: corners.to_vec(),
            corners,
        }
    }

    #[test]
    fn test_grid_counts() {
        let mesh = StructuredGrid.mesh(&face(3000.0, 1000.0), 1000.0).unwrap();
        assert_eq!(mesh.elements.len(), 3);
        assert_eq!(mesh.nodes.len(), 8);
        assert_eq!(mesh.elements[&1], vec![1, 2, 6, 5]);
        assert_relative_eq!(mesh.nodes[&8][0], 3000.0);
    }

    #[test]
    fn test_size_larger_than_face_gives_one_element() {
        let mesh = StructuredGrid.mesh(&face(1.0, 1.0), 10.0).unwrap();
        assert_eq!(mesh.elements.len(), 1);
    }

    #[test]
    fn test_invalid_size() {
        assert!(StructuredGrid.mesh(&face(1.0, 1.0), 0.0).is_err());
    }
}
