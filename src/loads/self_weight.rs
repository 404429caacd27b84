//! Member self-weight as a uniform dead load

use log::info;
use serde::Serialize;

use crate::error::{recover, CalcError, CalcResult};
use crate::solver::{DistributedLoad, LoadDirection, SolverModel};

use super::LoadType;

/// What the injector needs to know about one registered member
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedMember {
    pub name: String,
    pub length: f64,
    /// Working force / length³; `None` when the material did not resolve
    pub unit_weight: Option<f64>,
    /// Working length²; `None` when the section did not resolve
    pub area: Option<f64>,
}

impl WeightedMember {
    /// Line load (force / length)
    pub fn line_load(&self) -> CalcResult<f64> {
        match (self.unit_weight, self.area) {
            (Some(w), Some(a)) if (w * a).is_finite() && w * a >= 0.0 => Ok(w * a),
            (Some(w), Some(a)) => Err(CalcError::InvalidInput(format!(
                "member {}: line load {} x {} is not a weight",
                self.name, w, a
            ))),
            _ => Err(CalcError::InvalidInput(format!(
                "member {}: unit weight or area unavailable",
                self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelfWeightSummary {
    /// Members that received a line load
    pub members: usize,
    /// Total weight, working force units
    pub total: f64,
    /// The solver's generic routine was used instead
    pub generic: bool,
}

pub struct SelfWeightInjector;

impl SelfWeightInjector {
    /// Register `unit_weight × area` on every member, acting down the
    /// vertical solver axis. Falls back to the solver's own self-weight
    /// routine when any member's line load cannot be computed.
    pub fn inject<S: SolverModel + ?Sized>(
        members: &[WeightedMember],
        solver: &mut S,
        warnings: &mut Vec<String>,
    ) -> SelfWeightSummary {
        let case = LoadType::Dead.case_name();
        let loads: CalcResult<Vec<f64>> = members.iter().map(WeightedMember::line_load).collect();

        let loads = match loads {
            Ok(loads) => loads,
            Err(e) => {
                recover(warnings, format!("per-member self-weight failed ({}), using generic routine", e));
                if let Err(e) = solver.add_member_self_weight(LoadDirection::FY, -1.0, case) {
                    recover(warnings, format!("generic self-weight failed: {}", e));
                }
                return SelfWeightSummary {
                    generic: true,
                    ..SelfWeightSummary::default()
                };
            }
        };

        let mut summary = SelfWeightSummary::default();
        for (member, w) in members.iter().zip(loads) {
            if w == 0.0 {
                continue;
            }
            let load = DistributedLoad::uniform(-w, member.length, LoadDirection::FY, case);
            match solver.add_member_dist_load(&member.name, load) {
                Ok(()) => {
                    summary.members += 1;
                    summary.total += w * member.length;
                }
                Err(e) => recover(warnings, format!("self-weight on {}: {}", member.name, e)),
            }
        }
        info!(
            "Self-weight on {} member(s), total {:.4}",
            summary.members, summary.total
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{FrameModel, MaterialProps, SectionProps};
    use approx::assert_relative_eq;

    #[test]
    fn test_line_load_requires_both_properties() {
        let mut m = WeightedMember {
            name: "B_0".into(),
            length: 2.0,
            unit_weight: Some(78.5),
            area: Some(0.01),
        };
        assert_relative_eq!(m.line_load().unwrap(), 0.785);
        m.area = None;
        assert!(m.line_load().is_err());
        m.area = Some(0.01);
        m.unit_weight = Some(-78.5);
        assert!(m.line_load().is_err());
    }

    fn cantilever() -> FrameModel {
        let mut model = FrameModel::default();
        model.add_node("0", 0.0, 0.0, 0.0).unwrap();
        model.add_node("1", 2.0, 0.0, 0.0).unwrap();
        model
            .add_material("M", MaterialProps { e: 200e6, g: 77e6, nu: 0.3, unit_weight: 78.5 })
            .unwrap();
        model
            .add_section("S", SectionProps { a: 0.01, iy: 1e-4, iz: 1e-4, j: 1e-4 })
            .unwrap();
        model.add_member("B_0", "0", "1", "M", "S", 0.0).unwrap();
        model
    }

    fn member(unit_weight: Option<f64>) -> WeightedMember {
        WeightedMember {
            name: "B_0".into(),
            length: 2.0,
            unit_weight,
            area: Some(0.01),
        }
    }

    #[test]
    fn test_per_member_line_loads() {
        let mut model = cantilever();
        let mut warnings = Vec::new();
        let summary = SelfWeightInjector::inject(&[member(Some(78.5))], &mut model, &mut warnings);
        assert!(!summary.generic);
        assert_eq!(summary.members, 1);
        assert_relative_eq!(summary.total, 1.57, epsilon = 1e-12);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unresolved_member_uses_generic_routine() {
        let mut model = cantilever();
        let mut warnings = Vec::new();
        let summary = SelfWeightInjector::inject(
            &[member(Some(78.5)), WeightedMember { name: "B_1".into(), ..member(None) }],
            &mut model,
            &mut warnings,
        );
        assert!(summary.generic);
        assert_eq!(summary.members, 0);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("B_1"));
    }

    #[test]
    fn test_negative_unit_weight_uses_generic_routine() {
        let mut model = cantilever();
        let mut warnings = Vec::new();
        let summary = SelfWeightInjector::inject(&[member(Some(-78.5))], &mut model, &mut warnings);
        assert!(summary.generic);
        assert!(warnings[0].contains("generic routine"));
    }
}
