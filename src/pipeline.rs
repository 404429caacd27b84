//! One analysis run: build the solver model, solve, extract results
//!
//! Every stage recovers from per-entity failures with a logged warning.
//! A run that cannot be solved ends in [`RunState::Failed`]; `execute`
//! itself never returns an error.

use std::collections::HashSet;
use std::error::Error as _;

use log::{error, info};
use serde::Serialize;

use crate::config::CalcOptions;
use crate::error::recover;
use crate::geometry::{distance, GeometryIndexer, MemberAssembler, MemberRecord, NodeArena};
use crate::input::StructureInput;
use crate::loads::{
    analysis_label, AreaLoadMapper, CombinationTable, LoadApplicator, SelfWeightInjector,
    SelfWeightSummary, WeightedMember,
};
use crate::mesh::{ElementKind, PlateMesh, PlateMeshAdapter, PlateMeshRecord, SurfaceMesher};
use crate::properties::{
    MaterialResolver, ResolvedMaterial, ResolvedSection, SectionResolver, DEFAULT_MATERIAL,
};
use crate::results::{MemberResult, ReactionAggregator, ReactionTable, ResultExtractor};
use crate::solver::{
    FrameModel, MaterialProps, MemberReleases, SectionProps, SolverModel, StructuralSolver,
};
use crate::supports::SupportApplicator;
use crate::units::UnitSystem;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Unbuilt,
    Built,
    Solved,
    ResultsExtracted,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::ResultsExtracted | RunState::Failed)
    }
}

/// Everything a run produced, including partial results after a failure
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub combination: String,
    pub analysis_type: String,
    /// Working units, e.g. `"kN-mm"`
    pub units: String,
    pub nodes: usize,
    pub members: Vec<MemberResult>,
    pub reactions: ReactionTable,
    pub plates: Vec<PlateMeshRecord>,
    pub self_weight: Option<SelfWeightSummary>,
    pub solver_error: Option<String>,
    pub warnings: Vec<String>,
}

impl RunReport {
    fn new(combination: &str, units: UnitSystem) -> Self {
        Self {
            state: RunState::Unbuilt,
            combination: combination.to_string(),
            analysis_type: analysis_label(combination).to_string(),
            units: units.label(),
            nodes: 0,
            members: Vec::new(),
            reactions: ReactionTable {
                combination: combination.to_string(),
                ..ReactionTable::default()
            },
            plates: Vec::new(),
            self_weight: None,
            solver_error: None,
            warnings: Vec::new(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberResult> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Materials and sections registered with the solver so far
struct PropertyRegistry {
    materials: MaterialResolver,
    sections: SectionResolver,
    registered: HashSet<String>,
}

impl PropertyRegistry {
    fn new(units: UnitSystem) -> Self {
        Self {
            materials: MaterialResolver::new(units),
            sections: SectionResolver::new(units),
            registered: HashSet::new(),
        }
    }

    fn material<S: SolverModel + ?Sized>(
        &mut self,
        name: Option<&str>,
        input: &StructureInput,
        solver: &mut S,
        warnings: &mut Vec<String>,
    ) -> Option<ResolvedMaterial> {
        let name = name.unwrap_or(DEFAULT_MATERIAL);
        let material = self
            .materials
            .resolve(name, input.materials.get(name), warnings);
        let key = format!("material:{}", name);
        if !self.registered.contains(&key) {
            let props = MaterialProps {
                e: material.e,
                g: material.g,
                nu: material.nu,
                unit_weight: material.unit_weight,
            };
            if let Err(e) = solver.add_material(name, props) {
                recover(warnings, format!("material {}: {}", name, e));
                return None;
            }
            self.registered.insert(key);
        }
        Some(material)
    }

    fn section<S: SolverModel + ?Sized>(
        &mut self,
        member: &MemberRecord,
        input: &StructureInput,
        solver: &mut S,
        warnings: &mut Vec<String>,
    ) -> Option<ResolvedSection> {
        let Some(name) = member.section.as_deref() else {
            recover(warnings, format!("member {}: no section, skipped", member.name));
            return None;
        };
        let Some(source) = input.sections.get(name) else {
            recover(
                warnings,
                format!("member {}: section {} not defined, skipped", member.name, name),
            );
            return None;
        };
        let (section, _) = match self.sections.resolve(name, source, member.rotation) {
            Ok(hit) => hit,
            Err(e) => {
                recover(warnings, format!("member {}: {}, skipped", member.name, e));
                return None;
            }
        };
        let key = format!("section:{}", section.name);
        if !self.registered.contains(&key) {
            let props = SectionProps {
                a: section.area,
                iy: section.iy,
                iz: section.iz,
                j: section.j,
            };
            if let Err(e) = solver.add_section(&section.name, props) {
                recover(warnings, format!("section {}: {}", section.name, e));
                return None;
            }
            self.registered.insert(key);
        }
        Some(section)
    }
}

/// Drives one structural model through build, solve and extraction
pub struct Pipeline {
    options: CalcOptions,
    table: CombinationTable,
    mesher: Option<Box<dyn SurfaceMesher>>,
    state: RunState,
}

impl Pipeline {
    pub fn new(options: CalcOptions) -> Self {
        Self {
            options,
            table: CombinationTable::standard(),
            mesher: None,
            state: RunState::Unbuilt,
        }
    }

    /// Use an external surface mesher for plates with a mesh size
    pub fn with_mesher(mut self, mesher: Box<dyn SurfaceMesher>) -> Self {
        self.mesher = Some(mesher);
        self
    }

    pub fn with_table(mut self, table: CombinationTable) -> Self {
        self.table = table;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn options(&self) -> &CalcOptions {
        &self.options
    }

    pub fn table(&self) -> &CombinationTable {
        &self.table
    }

    /// Run against a fresh reference solver
    pub fn run(&mut self, input: &StructureInput) -> RunReport {
        let mut model = FrameModel::new(self.options.solver.clone());
        self.execute(input, &mut model)
    }

    /// Build `solver` from `input`, solve it and extract results for the
    /// active combination. Derived state from any previous run is discarded.
    pub fn execute<S: StructuralSolver + ?Sized>(
        &mut self,
        input: &StructureInput,
        solver: &mut S,
    ) -> RunReport {
        self.state = RunState::Unbuilt;
        let units = self.options.units();
        let combo = self.options.combination.clone();
        let mut report = RunReport::new(&combo, units);
        let warnings = &mut report.warnings;

        info!("Building model for {} ({})", combo, report.analysis_type);
        if !self.table.contains(&combo) {
            recover(
                warnings,
                format!("combination {} not in table, every factor taken as 1.0", combo),
            );
        }

        // Geometry
        let indexer = GeometryIndexer::new(self.options.geometry_scale(), self.options.node_decimals);
        let mut arena = indexer.index(&input.frames);
        let (records, assembly_warnings) = MemberAssembler::new(&indexer, &arena).assemble(&input.frames);
        warnings.extend(assembly_warnings);

        let adapter = PlateMeshAdapter::new(&indexer, self.mesher.as_deref(), self.options.quality);
        let plates: Vec<PlateMesh> = input
            .plates
            .iter()
            .filter_map(|plate| adapter.adapt(plate, &mut arena, warnings))
            .collect();

        for (i, c) in arena.iter() {
            if let Err(e) = solver.add_node(&NodeArena::name(i), c[0], c[1], c[2]) {
                recover(warnings, format!("node {}: {}", i, e));
            }
        }
        report.nodes = arena.len();

        // Properties and members
        let mut registry = PropertyRegistry::new(units);
        let mut members: Vec<MemberRecord> = Vec::with_capacity(records.len());
        let mut weighted: Vec<WeightedMember> = Vec::with_capacity(records.len());
        for record in records {
            let Some(material) = registry.material(record.material.as_deref(), input, solver, warnings)
            else {
                continue;
            };
            let Some(section) = registry.section(&record, input, solver, warnings) else {
                continue;
            };
            let [i, j] = record.node_names();
            // Inertias are already rotated
            if let Err(e) = solver.add_member(&record.name, &i, &j, &material.name, &section.name, 0.0) {
                recover(warnings, format!("member {}: {}", record.name, e));
                continue;
            }
            if record.truss {
                if let Err(e) = solver.def_releases(&record.name, MemberReleases::pin_both()) {
                    recover(warnings, format!("member {}: {}", record.name, e));
                }
            }
            let length = match (arena.coord(record.i_node), arena.coord(record.j_node)) {
                (Some(a), Some(b)) => distance(a, b),
                _ => 0.0,
            };
            weighted.push(WeightedMember {
                name: record.name.clone(),
                length,
                unit_weight: Some(material.unit_weight),
                area: Some(section.area),
            });
            members.push(record);
        }

        // Plates
        for mesh in plates {
            if let Some(material) = registry.material(mesh.material.as_deref(), input, solver, warnings) {
                for element in &mesh.elements {
                    let names = element.node_names();
                    let nodes = [
                        names[0].as_str(),
                        names[1].as_str(),
                        names[2].as_str(),
                        names[3].as_str(),
                    ];
                    let added = match mesh.record.kind {
                        ElementKind::Plate => {
                            solver.add_plate(&element.name, nodes, mesh.thickness, &material.name)
                        }
                        ElementKind::Quad => {
                            solver.add_quad(&element.name, nodes, mesh.thickness, &material.name)
                        }
                    };
                    if let Err(e) = added {
                        recover(warnings, format!("plate element {}: {}", element.name, e));
                    }
                }
            }
            report.plates.push(mesh.record);
        }

        // Supports and loads
        let supported = SupportApplicator::new(input, &indexer, &arena).apply(&input.supports, solver, warnings);
        let loads = LoadApplicator::new(input, &indexer, &arena, &members, units, &combo)
            .apply(&input.loads, solver, warnings);
        if self.options.self_weight {
            report.self_weight = Some(SelfWeightInjector::inject(&weighted, solver, warnings));
        }
        let area_loads = AreaLoadMapper::new(&report.plates, units).apply(&input.area_loads, solver, warnings);
        if let Err(e) = solver.add_load_combo(self.table.solver_combination(&combo)) {
            recover(warnings, format!("combination {}: {}", combo, e));
        }

        self.state = RunState::Built;
        info!(
            "Model built: {} node(s), {} member(s), {} plate(s), {} support(s), {} load(s), {} area load(s)",
            arena.len(),
            members.len(),
            report.plates.len(),
            supported,
            loads,
            area_loads
        );

        let missing: Vec<&str> = [
            (arena.is_empty(), "nodes"),
            (members.is_empty(), "members"),
            (supported == 0, "supports"),
        ]
        .iter()
        .filter(|(m, _)| *m)
        .map(|(_, what)| *what)
        .collect();
        if !missing.is_empty() {
            recover(warnings, format!("model cannot be solved, no {}", missing.join(", ")));
            return self.finish(report, RunState::Failed);
        }

        // Solve
        let solved = match solver.analyze() {
            Ok(()) => {
                self.state = RunState::Solved;
                true
            }
            Err(e) => {
                let mut trace = e.to_string();
                let mut source = e.source();
                while let Some(cause) = source {
                    trace.push_str(&format!(": {}", cause));
                    source = cause.source();
                }
                error!("Analysis failed: {}", trace);
                report.solver_error = Some(trace);
                false
            }
        };

        // Extraction, partial when the solve failed
        report.members = ResultExtractor::new(self.options.points).extract(
            &*solver,
            &members,
            &combo,
            &mut report.warnings,
        );
        report.reactions = ReactionAggregator::aggregate(&*solver, &combo);
        if solved && !report.reactions.any_reported() {
            recover(
                &mut report.warnings,
                format!("no supported node reports reactions for {}", combo),
            );
        }

        let state = if solved {
            RunState::ResultsExtracted
        } else {
            RunState::Failed
        };
        self.finish(report, state)
    }

    fn finish(&mut self, mut report: RunReport, state: RunState) -> RunReport {
        self.state = state;
        report.state = state;
        info!(
            "Run finished {:?} with {} warning(s)",
            state,
            report.warnings.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{
        CadFixity, CalcProperties, FrameObject, MaterialSource, SectionSource, SupportObject,
        SupportTarget,
    };
    use crate::units::LengthUnit;

    fn beam_input() -> StructureInput {
        let mut input = StructureInput {
            frames: vec![FrameObject {
                name: "B".into(),
                vertices: vec![[0.0, 0.0, 0.0], [1000.0, 0.0, 0.0]],
                edges: vec![],
                material: None,
                section: Some("S".into()),
                rotation: 0.0,
                truss: false,
            }],
            ..StructureInput::default()
        };
        input.sections.insert(
            "S".into(),
            SectionSource {
                area: 5000.0,
                iy: 1.0e7,
                iz: 4.0e7,
                iyz: 0.0,
                j: 1.0e6,
                unit: LengthUnit::Mm,
            },
        );
        input
    }

    #[test]
    fn test_missing_supports_fail_cleanly() {
        let mut pipeline = Pipeline::new(CalcOptions::default());
        let report = pipeline.run(&beam_input());
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(pipeline.state(), RunState::Failed);
        assert!(report.members.is_empty());
        assert!(report.warnings.iter().any(|w| w.contains("no supports")));
    }

    #[test]
    fn test_empty_input_fails_cleanly() {
        let report = Pipeline::new(CalcOptions::default()).run(&StructureInput::default());
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(report.nodes, 0);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("no nodes, members, supports")));
    }

    #[test]
    fn test_unknown_combination_is_warned() {
        let options = CalcOptions::default().with_combination("999_CUSTOM");
        let report = Pipeline::new(options).run(&beam_input());
        assert_eq!(report.analysis_type, "Allowable Stress Design");
        assert!(report.warnings[0].contains("999_CUSTOM"));
    }

    #[test]
    fn test_member_without_section_is_skipped() {
        let mut input = beam_input();
        input.frames[0].section = None;
        let report = Pipeline::new(CalcOptions::default()).run(&input);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("B_0: no section")));
        assert_eq!(report.state, RunState::Failed);
    }

    #[test]
    fn test_negative_unit_weight_falls_back_to_generic_self_weight() {
        let mut input = beam_input();
        input.frames[0].material = Some("Odd".into());
        input.materials.insert(
            "Odd".into(),
            MaterialSource::Structured(CalcProperties {
                modulus: 200_000.0,
                shear_modulus: None,
                poisson: 0.3,
                unit_weight: -78.5,
            }),
        );
        input.supports.push(SupportObject {
            name: "Fix".into(),
            target: SupportTarget::Point { point: [0.0, 0.0, 0.0] },
            fixity: CadFixity::fixed(),
        });

        let options = CalcOptions::default().with_self_weight(true);
        let report = Pipeline::new(options).run(&input);
        let summary = report.self_weight.as_ref().unwrap();
        assert!(summary.generic);
        assert_eq!(summary.members, 0);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("using generic routine")));
    }
}
