//! Section resolution with principal-axis rotation

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{CalcError, CalcResult};
use crate::input::SectionSource;
use crate::units::UnitSystem;

/// Section in working units, inertias already rotated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSection {
    /// Solver-side name; carries the rotation when non-zero
    pub name: String,
    /// Name of the source section
    pub source: String,
    pub area: f64,
    pub iy: f64,
    pub iz: f64,
    pub iyz: f64,
    pub j: f64,
    /// Rotation applied, degrees
    pub rotation: f64,
}

/// Rotate second moments of area by `theta` (radians) about the member axis.
///
/// Returns `(Iy, Iz, Iyz)` in the rotated axes.
pub fn rotate_inertia(iy: f64, iz: f64, iyz: f64, theta: f64) -> (f64, f64, f64) {
    if theta == 0.0 {
        return (iy, iz, iyz);
    }
    let (s2, c2) = (2.0 * theta).sin_cos();
    let avg = (iz + iy) / 2.0;
    let half = (iz - iy) / 2.0;
    let riy = avg - half * c2 + iyz * s2;
    let riz = avg + half * c2 - iyz * s2;
    let riyz = half * s2 + iyz * c2;
    (riy, riz, riyz)
}

/// Solver name for a section at a given rotation
pub fn section_key(name: &str, rotation_deg: f64) -> String {
    if rotation_deg == 0.0 {
        name.to_string()
    } else {
        format!("{}@{}", name, rotation_deg)
    }
}

/// Resolves each (section, rotation) pair once
pub struct SectionResolver {
    units: UnitSystem,
    cache: HashMap<String, ResolvedSection>,
}

impl SectionResolver {
    pub fn new(units: UnitSystem) -> Self {
        Self {
            units,
            cache: HashMap::new(),
        }
    }

    /// Returns the resolved section and whether it was seen for the first time
    pub fn resolve(
        &mut self,
        name: &str,
        source: &SectionSource,
        rotation_deg: f64,
    ) -> CalcResult<(ResolvedSection, bool)> {
        let key = section_key(name, rotation_deg);
        if let Some(hit) = self.cache.get(&key) {
            return Ok((hit.clone(), false));
        }

        let values = [source.area, source.iy, source.iz, source.iyz, source.j];
        if values.iter().any(|v| !v.is_finite()) || source.area <= 0.0 {
            return Err(CalcError::InvalidInput(format!(
                "section {}: non-finite or non-positive properties",
                name
            )));
        }

        let u = &self.units;
        let (iy, iz, iyz) = rotate_inertia(
            u.inertia(source.iy, source.unit),
            u.inertia(source.iz, source.unit),
            u.inertia(source.iyz, source.unit),
            rotation_deg.to_radians(),
        );
        let section = ResolvedSection {
            name: key.clone(),
            source: name.to_string(),
            area: u.area(source.area, source.unit),
            iy,
            iz,
            iyz,
            j: u.inertia(source.j, source.unit),
            rotation: rotation_deg,
        };
        self.cache.insert(key, section.clone());
        Ok((section, true))
    }
}
