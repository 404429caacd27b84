//! Mesh quality metrics and grading

use serde::{Deserialize, Serialize};

use crate::config::QualityThresholds;
use crate::geometry::{cross, distance, norm, sub, Coord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementShape {
    Triangle,
    Quad,
}

/// Metrics for one element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementQuality {
    pub shape: ElementShape,
    /// Degrees
    pub min_angle: f64,
    /// Degrees
    pub max_angle: f64,
    /// Longest over shortest edge
    pub aspect_ratio: f64,
    /// 1.0 for an equilateral triangle or a square
    pub regularity: f64,
}

impl ElementQuality {
    pub fn violates(&self, t: &QualityThresholds) -> bool {
        self.min_angle < t.min_angle
            || self.aspect_ratio > t.max_aspect_ratio
            || self.regularity < t.min_regularity
    }
}

/// Quality of a 3- or 4-point element. Repeated points are dropped first,
/// so a padded quad is assessed as a triangle. `None` when fewer than three
/// distinct points remain or an edge has zero length.
pub fn element_quality(points: &[Coord]) -> Option<ElementQuality> {
    let mut pts: Vec<Coord> = Vec::with_capacity(4);
    for p in points {
        if pts.last().map_or(true, |q| distance(p, q) > 1e-12) {
            pts.push(*p);
        }
    }
    if pts.len() > 1 && distance(&pts[0], &pts[pts.len() - 1]) <= 1e-12 {
        pts.pop();
    }
    let shape = match pts.len() {
        3 => ElementShape::Triangle,
        4 => ElementShape::Quad,
        _ => return None,
    };

    let n = pts.len();
    let edges: Vec<f64> = (0..n).map(|k| distance(&pts[k], &pts[(k + 1) % n])).collect();
    let shortest = edges.iter().copied().fold(f64::INFINITY, f64::min);
    let longest = edges.iter().copied().fold(0.0, f64::max);
    if shortest <= 1e-12 {
        return None;
    }

    let angles: Vec<f64> = (0..n)
        .map(|k| {
            let a = sub(&pts[(k + n - 1) % n], &pts[k]);
            let b = sub(&pts[(k + 1) % n], &pts[k]);
            let cos = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]) / (norm(&a) * norm(&b));
            cos.clamp(-1.0, 1.0).acos().to_degrees()
        })
        .collect();

    // Polygon area from the summed cross products about the first point
    let mut area_vec = [0.0; 3];
    for k in 1..n - 1 {
        let c = cross(&sub(&pts[k], &pts[0]), &sub(&pts[k + 1], &pts[0]));
        for i in 0..3 {
            area_vec[i] += c[i];
        }
    }
    let area = norm(&area_vec) / 2.0;
    let sum_sq: f64 = edges.iter().map(|l| l * l).sum();
    let regularity = match shape {
        ElementShape::Triangle => 4.0 * 3f64.sqrt() * area / sum_sq,
        ElementShape::Quad => 4.0 * area / sum_sq,
    };

    Some(ElementQuality {
        shape,
        min_angle: angles.iter().copied().fold(f64::INFINITY, f64::min),
        max_angle: angles.iter().copied().fold(0.0, f64::max),
        aspect_ratio: longest / shortest,
        regularity,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl QualityGrade {
    /// Grade from the fraction of violating elements
    pub fn from_fraction(f: f64) -> Self {
        if f <= 0.0 {
            QualityGrade::Excellent
        } else if f <= 0.10 {
            QualityGrade::Good
        } else if f <= 0.30 {
            QualityGrade::Acceptable
        } else {
            QualityGrade::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Stat {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        let (mut min, mut max, mut sum, mut n) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize);
        for v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            n += 1;
        }
        if n == 0 {
            return Self { min: 0.0, max: 0.0, avg: 0.0 };
        }
        Self { min, max, avg: sum / n as f64 }
    }
}

/// Aggregates for one element shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStats {
    pub count: usize,
    pub min_angle: Stat,
    pub aspect_ratio: Stat,
    pub regularity: Stat,
    pub violations: usize,
}

impl ShapeStats {
    fn of(elements: &[ElementQuality], thresholds: &QualityThresholds) -> Option<Self> {
        if elements.is_empty() {
            return None;
        }
        Some(Self {
            count: elements.len(),
            min_angle: Stat::of(elements.iter().map(|e| e.min_angle)),
            aspect_ratio: Stat::of(elements.iter().map(|e| e.aspect_ratio)),
            regularity: Stat::of(elements.iter().map(|e| e.regularity)),
            violations: elements.iter().filter(|e| e.violates(thresholds)).count(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshQualityReport {
    pub triangles: Option<ShapeStats>,
    pub quads: Option<ShapeStats>,
    /// Elements that could not be measured (collapsed)
    pub degenerate: usize,
    pub total: usize,
    pub violating: usize,
    pub grade: QualityGrade,
}

impl MeshQualityReport {
    /// Grade a set of elements given as corner coordinates
    pub fn assess(elements: &[Vec<Coord>], thresholds: &QualityThresholds) -> Self {
        let mut triangles = Vec::new();
        let mut quads = Vec::new();
        let mut degenerate = 0;
        for el in elements {
            match element_quality(el) {
                Some(q) if q.shape == ElementShape::Triangle => triangles.push(q),
                Some(q) => quads.push(q),
                None => degenerate += 1,
            }
        }
        let triangles = ShapeStats::of(&triangles, thresholds);
        let quads = ShapeStats::of(&quads, thresholds);
        let violating = degenerate
            + triangles.as_ref().map_or(0, |s| s.violations)
            + quads.as_ref().map_or(0, |s| s.violations);
        let total = elements.len();
        let fraction = if total == 0 {
            0.0
        } else {
            violating as f64 / total as f64
        };
        Self {
            triangles,
            quads,
            degenerate,
            total,
            violating,
            grade: QualityGrade::from_fraction(fraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_square_is_ideal() {
        let q = element_quality(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
            .unwrap();
        assert_eq!(q.shape, ElementShape::Quad);
        assert_relative_eq!(q.regularity, 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.aspect_ratio, 1.0);
        assert_relative_eq!(q.min_angle, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_padded_quad_is_a_triangle() {
        let h = 3f64.sqrt() / 2.0;
        let q = element_quality(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, h, 0.0], [0.5, h, 0.0]])
            .unwrap();
        assert_eq!(q.shape, ElementShape::Triangle);
        assert_relative_eq!(q.regularity, 1.0, epsilon = 1e-9);
        assert_relative_eq!(q.min_angle, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grading() {
        let thresholds = QualityThresholds::default();
        let square = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let sliver = vec![[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [5.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

        let all_good = MeshQualityReport::assess(&vec![square.clone(); 4], &thresholds);
        assert_eq!(all_good.grade, QualityGrade::Excellent);

        let mut mixed = vec![square; 9];
        mixed.push(sliver.clone());
        let report = MeshQualityReport::assess(&mixed, &thresholds);
        assert_eq!(report.violating, 1);
        assert_eq!(report.grade, QualityGrade::Good);

        let poor = MeshQualityReport::assess(&[sliver], &thresholds);
        assert_eq!(poor.grade, QualityGrade::Poor);
    }
}
