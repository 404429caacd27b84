//! Pressure loads onto the elements generated for each plate

use log::debug;

use crate::error::recover;
use crate::input::AreaLoadObject;
use crate::mesh::{ElementKind, PlateMeshRecord};
use crate::solver::SolverModel;
use crate::units::UnitSystem;

pub struct AreaLoadMapper<'a> {
    plates: &'a [PlateMeshRecord],
    units: UnitSystem,
}

impl<'a> AreaLoadMapper<'a> {
    pub fn new(plates: &'a [PlateMeshRecord], units: UnitSystem) -> Self {
        Self { plates, units }
    }

    /// Register every area load; returns how many reached the solver
    pub fn apply<S: SolverModel + ?Sized>(
        &self,
        loads: &[AreaLoadObject],
        solver: &mut S,
        warnings: &mut Vec<String>,
    ) -> usize {
        let mut applied = 0;
        for load in loads {
            match self.register(load, solver) {
                Ok(n) => {
                    debug!("area load {}: {} element(s)", load.name, n);
                    applied += 1;
                }
                Err(msg) => recover(warnings, format!("area load {}: {}", load.name, msg)),
            }
        }
        applied
    }

    fn register<S: SolverModel + ?Sized>(
        &self,
        load: &AreaLoadObject,
        solver: &mut S,
    ) -> Result<usize, String> {
        let target = load
            .target_plate()
            .ok_or_else(|| "no target plate".to_string())?;
        let record = self
            .plates
            .iter()
            .find(|r| r.plate == target)
            .ok_or_else(|| format!("plate {} was not meshed", target))?;
        let pressure = load.pressure.to_stress(&self.units).map_err(|e| e.to_string())?;
        let case = load.load_type.unwrap_or_default().case_name();

        match record.kind {
            ElementKind::Plate => {
                for element in &record.elements {
                    solver
                        .add_plate_surface_pressure(element, pressure, case)
                        .map_err(|e| e.to_string())?;
                }
            }
            ElementKind::Quad => {
                for element in &record.elements {
                    solver
                        .add_quad_surface_pressure(element, pressure, case)
                        .map_err(|e| e.to_string())?;
                }
            }
        }
        Ok(record.elements.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadType;
    use crate::solver::FrameModel;
    use crate::units::{ForceUnit, LengthUnit, Quantity};

    fn record(kind: ElementKind, elements: &[&str]) -> PlateMeshRecord {
        PlateMeshRecord {
            plate: "Slab".into(),
            kind,
            elements: elements.iter().map(|s| s.to_string()).collect(),
            new_nodes: 0,
            reused_nodes: 0,
            mesher: "corners".into(),
            quality: None,
        }
    }

    fn area_load(plate: Option<&str>, parent: Option<&str>) -> AreaLoadObject {
        AreaLoadObject {
            name: "AL".into(),
            load_type: Some(LoadType::Live),
            pressure: Quantity::new(5.0, "kPa"),
            plate: plate.map(String::from),
            parent: parent.map(String::from),
        }
    }

    #[test]
    fn test_unmeshed_target_is_recovered() {
        let records = vec![record(ElementKind::Plate, &["Slab"])];
        let units = UnitSystem::new(LengthUnit::Mm, ForceUnit::KN);
        let mapper = AreaLoadMapper::new(&records, units);
        let mut model = FrameModel::default();
        let mut warnings = Vec::new();

        let applied = mapper.apply(
            &[area_load(Some("Roof"), None), area_load(None, None)],
            &mut model,
            &mut warnings,
        );
        assert_eq!(applied, 0);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_parent_reference_resolves_target() {
        let load = area_load(None, Some("Slab"));
        assert_eq!(load.target_plate(), Some("Slab"));
        let linked = area_load(Some("Roof"), Some("Slab"));
        assert_eq!(linked.target_plate(), Some("Roof"));
    }
}
