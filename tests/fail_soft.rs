use structure_calc::loads::LoadCombination;
use structure_calc::prelude::*;
use structure_calc::solver::{
    DistributedLoad, Fixity, LoadDirection, MaterialProps, MemberReleases, Reactions,
    SectionProps,
};

/// Reference solver whose result queries fail for one member, or whose
/// solve fails outright
struct Flaky {
    inner: FrameModel,
    broken_member: Option<String>,
    fail_solve: bool,
}

impl Flaky {
    fn new() -> Self {
        Self {
            inner: FrameModel::default(),
            broken_member: None,
            fail_solve: false,
        }
    }

    fn check(&self, member: &str) -> CalcResult<()> {
        match &self.broken_member {
            Some(b) if b == member => Err(CalcError::AnalysisFailed(format!("no results for {}", member))),
            _ => Ok(()),
        }
    }
}

impl SolverModel for Flaky {
    fn add_node(&mut self, name: &str, x: f64, y: f64, z: f64) -> CalcResult<()> {
        self.inner.add_node(name, x, y, z)
    }

    fn add_material(&mut self, name: &str, props: MaterialProps) -> CalcResult<()> {
        self.inner.add_material(name, props)
    }

    fn add_section(&mut self, name: &str, props: SectionProps) -> CalcResult<()> {
        self.inner.add_section(name, props)
    }

    fn add_member(
        &mut self,
        name: &str,
        i_node: &str,
        j_node: &str,
        material: &str,
        section: &str,
        rotation: f64,
    ) -> CalcResult<()> {
        self.inner.add_member(name, i_node, j_node, material, section, rotation)
    }

    fn def_releases(&mut self, member: &str, releases: MemberReleases) -> CalcResult<()> {
        self.inner.def_releases(member, releases)
    }

    fn def_support(&mut self, node: &str, fixity: Fixity) -> CalcResult<()> {
        self.inner.def_support(node, fixity)
    }

    fn add_node_load(
        &mut self,
        node: &str,
        direction: LoadDirection,
        value: f64,
        case: &str,
    ) -> CalcResult<()> {
        self.inner.add_node_load(node, direction, value, case)
    }

    fn add_member_dist_load(&mut self, member: &str, load: DistributedLoad) -> CalcResult<()> {
        self.inner.add_member_dist_load(member, load)
    }

    fn add_member_self_weight(
        &mut self,
        direction: LoadDirection,
        factor: f64,
        case: &str,
    ) -> CalcResult<()> {
        self.inner.add_member_self_weight(direction, factor, case)
    }

    fn add_plate(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
    ) -> CalcResult<()> {
        self.inner.add_plate(name, nodes, thickness, material)
    }

    fn add_quad(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
    ) -> CalcResult<()> {
        self.inner.add_quad(name, nodes, thickness, material)
    }

    fn add_plate_surface_pressure(&mut self, plate: &str, pressure: f64, case: &str) -> CalcResult<()> {
        self.inner.add_plate_surface_pressure(plate, pressure, case)
    }

    fn add_quad_surface_pressure(&mut self, quad: &str, pressure: f64, case: &str) -> CalcResult<()> {
        self.inner.add_quad_surface_pressure(quad, pressure, case)
    }

    fn add_load_combo(&mut self, combo: LoadCombination) -> CalcResult<()> {
        self.inner.add_load_combo(combo)
    }

    fn analyze(&mut self) -> CalcResult<()> {
        if self.fail_solve {
            return Err(CalcError::SingularMatrix);
        }
        self.inner.analyze()
    }
}

impl SolverResults for Flaky {
    fn node_names(&self) -> Vec<String> {
        self.inner.node_names()
    }

    fn member_names(&self) -> Vec<String> {
        self.inner.member_names()
    }

    fn support(&self, node: &str) -> Option<Fixity> {
        self.inner.support(node)
    }

    fn node_reactions(&self, node: &str, combo: &str) -> CalcResult<Reactions> {
        self.inner.node_reactions(node, combo)
    }

    fn member_array(
        &self,
        member: &str,
        response: Response,
        n_points: usize,
        combo: &str,
    ) -> CalcResult<Vec<f64>> {
        self.check(member)?;
        self.inner.member_array(member, response, n_points, combo)
    }

    fn member_min(&self, member: &str, response: Response, combo: &str) -> CalcResult<f64> {
        self.check(member)?;
        self.inner.member_min(member, response, combo)
    }

    fn member_max(&self, member: &str, response: Response, combo: &str) -> CalcResult<f64> {
        self.check(member)?;
        self.inner.member_max(member, response, combo)
    }
}

/// Two-span beam along CAD X with a tip load, fixed at the origin
fn two_members() -> StructureInput {
    let mut input = StructureInput::from_json(
        r#"{
            "frames": [{
                "name": "B",
                "vertices": [[0, 0, 0], [1000, 0, 0], [2000, 0, 0]],
                "section": "S"
            }],
            "sections": { "S": { "area": 5000, "iy": 1e7, "iz": 4e7, "j": 1e6 } },
            "supports": [{
                "name": "Fix",
                "target": { "kind": "point", "point": [0, 0, 0] },
                "fixity": { "dx": true, "dy": true, "dz": true, "rx": true, "ry": true, "rz": true }
            }]
        }"#,
    )
    .unwrap();
    input.loads.push(LoadObject {
        name: "Tip".into(),
        load_type: None,
        direction: CadDirection::NegZ,
        target: LoadTarget::Vertex {
            object: "B".into(),
            vertex: 2,
        },
        magnitude: LoadMagnitude::Nodal { value: 5.0 },
        force_unit: ForceUnit::KN,
        length_unit: LengthUnit::M,
    });
    input
}

#[test]
fn test_broken_member_gets_zero_series_only() {
    let mut solver = Flaky::new();
    solver.broken_member = Some("B_0".into());

    let report = Pipeline::new(CalcOptions::default()).execute(&two_members(), &mut solver);
    assert_eq!(report.state, RunState::ResultsExtracted);

    let broken = report.member("B_0").unwrap();
    for response in Response::ALL {
        assert_eq!(broken.series(response).values, vec![0.0]);
        assert_eq!(broken.series(response).min, 0.0);
        assert_eq!(broken.series(response).max, 0.0);
    }

    // The neighbour is untouched: moment at its i end is 5 kN x 1000 mm
    let healthy = report.member("B_1").unwrap();
    assert_eq!(healthy.moment_z.values.len(), 5);
    let peak = healthy.moment_z.min.abs().max(healthy.moment_z.max.abs());
    assert!((peak - 5000.0).abs() < 1e-6);

    let member_warnings: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.starts_with("member B_0"))
        .collect();
    assert_eq!(member_warnings.len(), 1);
}

#[test]
fn test_solver_exception_keeps_partial_results() {
    let mut solver = Flaky::new();
    solver.fail_solve = true;

    let mut pipeline = Pipeline::new(CalcOptions::default());
    let report = pipeline.execute(&two_members(), &mut solver);
    assert_eq!(report.state, RunState::Failed);
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(report.solver_error.as_deref().unwrap().contains("Singular"));

    // Every member still has a record, zero-filled
    assert_eq!(report.members.len(), 2);
    assert_eq!(report.members[0].moment_y.values, vec![0.0]);
    // The support is listed but reports nothing
    let fixed = report.reactions.get("0").unwrap();
    assert!(!fixed.reported);
}

#[test]
fn test_rerun_discards_previous_state() {
    let mut pipeline = Pipeline::new(CalcOptions::default());
    let first = pipeline.run(&two_members());
    let second = pipeline.run(&two_members());
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.members.len(), second.members.len());
    assert_eq!(first.reactions, second.reactions);
}
