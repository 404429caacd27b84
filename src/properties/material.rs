//! Material resolution as an ordered strategy chain

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::error::{CalcError, CalcResult};
use crate::input::{CalcProperties, MaterialSource};
use crate::units::UnitSystem;

/// Name used when a member or plate carries no material reference
pub const DEFAULT_MATERIAL: &str = "GenericSteel";

/// Material in working units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMaterial {
    pub name: String,
    /// Elastic modulus
    pub e: f64,
    /// Shear modulus
    pub g: f64,
    pub nu: f64,
    /// Weight per unit volume
    pub unit_weight: f64,
}

impl ResolvedMaterial {
    pub fn isotropic(name: &str, e: f64, nu: f64, unit_weight: f64) -> Self {
        Self {
            name: name.to_string(),
            e,
            g: e / (2.0 * (1.0 + nu)),
            nu,
            unit_weight,
        }
    }

    fn validate(self) -> CalcResult<Self> {
        let finite = [self.e, self.g, self.nu, self.unit_weight]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.e <= 0.0 || self.g <= 0.0 || !(-1.0..0.5).contains(&self.nu) {
            return Err(CalcError::InvalidInput(format!(
                "material {}: E={} G={} nu={}",
                self.name, self.e, self.g, self.nu
            )));
        }
        Ok(self)
    }
}

/// One way of turning a material source into working-unit properties
pub trait MaterialStrategy {
    fn label(&self) -> &'static str;

    fn resolve(
        &self,
        name: &str,
        source: Option<&MaterialSource>,
        units: &UnitSystem,
    ) -> CalcResult<ResolvedMaterial>;
}

/// Reads the calc-properties accessor (MPa, kN/m³)
pub struct StructuredAccessor;

impl MaterialStrategy for StructuredAccessor {
    fn label(&self) -> &'static str {
        "structured"
    }

    fn resolve(
        &self,
        name: &str,
        source: Option<&MaterialSource>,
        units: &UnitSystem,
    ) -> CalcResult<ResolvedMaterial> {
        let Some(MaterialSource::Structured(props)) = source else {
            return Err(CalcError::MaterialNotFound(name.to_string()));
        };
        from_calc_properties(name, props, units)
    }
}

fn from_calc_properties(
    name: &str,
    props: &CalcProperties,
    units: &UnitSystem,
) -> CalcResult<ResolvedMaterial> {
    let e = units.stress_from_pascals(props.modulus * 1e6);
    let g = match props.shear_modulus {
        Some(g) => units.stress_from_pascals(g * 1e6),
        None => e / (2.0 * (1.0 + props.poisson)),
    };
    ResolvedMaterial {
        name: name.to_string(),
        e,
        g,
        nu: props.poisson,
        unit_weight: units.unit_weight_from_si(props.unit_weight * 1e3),
    }
    .validate()
}

/// Converts raw density/modulus quantities by their unit strings
pub struct ManualConversion;

impl MaterialStrategy for ManualConversion {
    fn label(&self) -> &'static str {
        "manual"
    }

    fn resolve(
        &self,
        name: &str,
        source: Option<&MaterialSource>,
        units: &UnitSystem,
    ) -> CalcResult<ResolvedMaterial> {
        let Some(MaterialSource::RawFields {
            density,
            modulus,
            poisson,
            shear_modulus,
        }) = source
        else {
            return Err(CalcError::MaterialNotFound(name.to_string()));
        };
        let e = modulus.to_stress(units)?;
        let g = match shear_modulus {
            Some(g) => g.to_stress(units)?,
            None => e / (2.0 * (1.0 + poisson)),
        };
        ResolvedMaterial {
            name: name.to_string(),
            e,
            g,
            nu: *poisson,
            unit_weight: density.to_unit_weight(units)?,
        }
        .validate()
    }
}

/// Generic structural steel; never fails
pub struct GenericSteel;

impl GenericSteel {
    pub fn material(&self, name: &str, units: &UnitSystem) -> ResolvedMaterial {
        let mpa = |v: f64| units.stress_from_pascals(v * 1e6);
        ResolvedMaterial {
            name: name.to_string(),
            e: mpa(200_000.0),
            g: mpa(77_000.0),
            nu: 0.3,
            unit_weight: units.unit_weight_from_si(78.5e3),
        }
    }
}

/// Tries each strategy in order; the generic steel default closes the chain
pub struct MaterialResolver {
    units: UnitSystem,
    strategies: Vec<Box<dyn MaterialStrategy>>,
    fallback: GenericSteel,
    cache: HashMap<String, ResolvedMaterial>,
}

impl MaterialResolver {
    pub fn new(units: UnitSystem) -> Self {
        Self {
            units,
            strategies: vec![Box::new(StructuredAccessor), Box::new(ManualConversion)],
            fallback: GenericSteel,
            cache: HashMap::new(),
        }
    }

    /// Resolve a material, recording a warning when the default is used
    pub fn resolve(
        &mut self,
        name: &str,
        source: Option<&MaterialSource>,
        warnings: &mut Vec<String>,
    ) -> ResolvedMaterial {
        if let Some(hit) = self.cache.get(name) {
            return hit.clone();
        }

        let mut failures = Vec::new();
        let mut resolved = None;
        for strategy in &self.strategies {
            match strategy.resolve(name, source, &self.units) {
                Ok(m) => {
                    debug!("material {} resolved by {} strategy", name, strategy.label());
                    resolved = Some(m);
                    break;
                }
                Err(e) => failures.push(format!("{}: {}", strategy.label(), e)),
            }
        }

        let material = resolved.unwrap_or_else(|| {
            let msg = format!(
                "material {}: using generic steel ({})",
                name,
                failures.join("; ")
            );
            warn!("{}", msg);
            warnings.push(msg);
            self.fallback.material(name, &self.units)
        });

        self.cache.insert(name.to_string(), material.clone());
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ForceUnit, LengthUnit, Quantity};
    use approx::assert_relative_eq;

    fn mm_kn() -> UnitSystem {
        UnitSystem::new(LengthUnit::Mm, ForceUnit::KN)
    }

    #[test]
    fn test_structured_source() {
        let source = MaterialSource::Structured(CalcProperties {
            modulus: 210_000.0,
            shear_modulus: None,
            poisson: 0.3,
            unit_weight: 78.5,
        });
        let mut warnings = Vec::new();
        let m = MaterialResolver::new(mm_kn()).resolve("S355", Some(&source), &mut warnings);
        assert!(warnings.is_empty());
        assert_relative_eq!(m.e, 210.0, epsilon = 1e-9);
        assert_relative_eq!(m.g, 210.0 / 2.6, epsilon = 1e-9);
        // 78.5 kN/m³ = 7.85e-8 kN/mm³
        assert_relative_eq!(m.unit_weight, 7.85e-8, epsilon = 1e-18);
    }

    #[test]
    fn test_raw_fields_source() {
        let source = MaterialSource::RawFields {
            density: Quantity::new(2500.0, "kg/m^3"),
            modulus: Quantity::new(30.0, "GPa"),
            poisson: 0.2,
            shear_modulus: None,
        };
        let units = UnitSystem::new(LengthUnit::M, ForceUnit::KN);
        let mut warnings = Vec::new();
        let m = MaterialResolver::new(units).resolve("C30", Some(&source), &mut warnings);
        assert!(warnings.is_empty());
        assert_relative_eq!(m.e, 30e6, epsilon = 1e-3);
        assert_relative_eq!(m.unit_weight, 2.5 * 9.80665, epsilon = 1e-9);
        assert_relative_eq!(m.g, 30e6 / 2.4, epsilon = 1e-3);
    }

    #[test]
    fn test_bad_units_fall_back_to_steel() {
        let source = MaterialSource::RawFields {
            density: Quantity::new(7850.0, "stone/acre"),
            modulus: Quantity::new(200.0, "GPa"),
            poisson: 0.3,
            shear_modulus: None,
        };
        let units = UnitSystem::new(LengthUnit::M, ForceUnit::KN);
        let mut warnings = Vec::new();
        let m = MaterialResolver::new(units).resolve("Odd", Some(&source), &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_relative_eq!(m.e, 2e8, epsilon = 1e-3);
        assert_relative_eq!(m.g, 7.7e7, epsilon = 1e-3);
        assert_relative_eq!(m.nu, 0.3);
        assert_relative_eq!(m.unit_weight, 78.5, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_source_falls_back_and_caches() {
        let mut resolver = MaterialResolver::new(mm_kn());
        let mut warnings = Vec::new();
        let a = resolver.resolve(DEFAULT_MATERIAL, None, &mut warnings);
        let b = resolver.resolve(DEFAULT_MATERIAL, None, &mut warnings);
        assert_eq!(a, b);
        assert_eq!(warnings.len(), 1);
    }
}
