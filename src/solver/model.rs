//! In-process linear-static frame/shell model
//!
//! Members are 3D Euler-Bernoulli frame elements with optional end releases,
//! plates and quads are flat MITC4 shells. Each load combination is solved
//! against the same stiffness matrix and keeps its own displacements,
//! reactions and member diagrams.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info, warn};
use nalgebra_sparse::CsrMatrix;

use super::diagrams::{LocalLineLoad, MemberDiagram};
use super::math::{self, Mat, Mat12, Mat3, Vec as FEVec, Vec12};
use super::shell::{self, Mat24, Vec24};
use super::sparse::{self, GlobalStiffness};
use super::{
    DistributedLoad, Fixity, LoadDirection, MaterialProps, MemberReleases, Reactions, Response,
    SectionProps, SolverModel, SolverResults,
};
use crate::config::AnalysisOptions;
use crate::error::{CalcError, CalcResult};
use crate::loads::LoadCombination;

/// Name of the combination used when none was registered
pub const DEFAULT_COMBO: &str = "Combo 1";

#[derive(Debug, Clone)]
struct MemberData {
    i_node: String,
    j_node: String,
    material: String,
    section: String,
    rotation: f64,
    releases: MemberReleases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellKind {
    Plate,
    Quad,
}

#[derive(Debug, Clone)]
struct ShellData {
    nodes: [String; 4],
    thickness: f64,
    material: String,
    kind: ShellKind,
}

#[derive(Debug, Clone)]
struct NodeLoad {
    direction: LoadDirection,
    value: f64,
    case: String,
}

#[derive(Debug, Clone)]
struct SelfWeight {
    direction: LoadDirection,
    factor: f64,
    case: String,
}

#[derive(Debug, Clone)]
struct Pressure {
    pressure: f64,
    case: String,
}

/// Results of one combination
#[derive(Debug, Clone, Default)]
struct ComboSolution {
    displacements: HashMap<String, [f64; 6]>,
    reactions: HashMap<String, [f64; 6]>,
    members: HashMap<String, MemberDiagram>,
}

/// Per-member quantities shared by every combination
struct PreparedMember {
    name: String,
    i_dof: usize,
    j_dof: usize,
    length: f64,
    rotation: Mat3,
    t: Mat12,
    k_local: Mat12,
    k_cond: Mat12,
    releases: [bool; 12],
    material: MaterialProps,
    section: SectionProps,
}

struct PreparedShell {
    name: String,
    dofs: [usize; 4],
    k_global: Mat24,
    /// Global nodal loads for a unit pressure
    unit_load: Vec24,
}

enum Reduced {
    Dense(Mat),
    Sparse(CsrMatrix<f64>),
}

/// A linear-static frame/shell model
#[derive(Debug, Clone, Default)]
pub struct FrameModel {
    pub options: AnalysisOptions,
    node_order: Vec<String>,
    nodes: HashMap<String, [f64; 3]>,
    materials: HashMap<String, MaterialProps>,
    sections: HashMap<String, SectionProps>,
    member_order: Vec<String>,
    members: HashMap<String, MemberData>,
    shell_order: Vec<String>,
    shells: HashMap<String, ShellData>,
    supports: HashMap<String, Fixity>,
    node_loads: HashMap<String, Vec<NodeLoad>>,
    dist_loads: HashMap<String, Vec<DistributedLoad>>,
    self_weight: Vec<SelfWeight>,
    pressures: HashMap<String, Vec<Pressure>>,
    combos: BTreeMap<String, LoadCombination>,
    solutions: HashMap<String, ComboSolution>,
}

impl FrameModel {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn is_analyzed(&self) -> bool {
        !self.solutions.is_empty()
    }

    pub fn combo_names(&self) -> Vec<String> {
        self.combos.keys().cloned().collect()
    }

    pub fn num_shells(&self) -> usize {
        self.shells.len()
    }

    /// Nodal displacement [DX, DY, DZ, RX, RY, RZ] for a combination
    pub fn node_displacement(&self, node: &str, combo: &str) -> CalcResult<[f64; 6]> {
        let solution = self.solution(combo)?;
        solution
            .displacements
            .get(node)
            .copied()
            .ok_or_else(|| CalcError::NodeNotFound(node.to_string()))
    }

    fn solution(&self, combo: &str) -> CalcResult<&ComboSolution> {
        if self.solutions.is_empty() {
            return Err(CalcError::NotAnalyzed);
        }
        self.solutions
            .get(combo)
            .ok_or_else(|| CalcError::CombinationNotFound(combo.to_string()))
    }

    fn diagram(&self, member: &str, combo: &str) -> CalcResult<&MemberDiagram> {
        if !self.members.contains_key(member) {
            return Err(CalcError::MemberNotFound(member.to_string()));
        }
        self.solution(combo)?
            .members
            .get(member)
            .ok_or_else(|| CalcError::MemberNotFound(member.to_string()))
    }

    fn invalidate(&mut self) {
        self.solutions.clear();
    }

    fn require_node(&self, name: &str) -> CalcResult<()> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(CalcError::NodeNotFound(name.to_string()))
        }
    }

    /// Every case that has at least one load registered, at factor 1.0
    fn default_combination(&self) -> LoadCombination {
        let mut cases: HashSet<&str> = HashSet::new();
        cases.extend(self.node_loads.values().flatten().map(|l| l.case.as_str()));
        cases.extend(self.dist_loads.values().flatten().map(|l| l.case.as_str()));
        cases.extend(self.self_weight.iter().map(|l| l.case.as_str()));
        cases.extend(self.pressures.values().flatten().map(|l| l.case.as_str()));
        cases
            .into_iter()
            .fold(LoadCombination::new(DEFAULT_COMBO), |c, case| c.with_case(case, 1.0))
    }

    fn add_shell(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
        kind: ShellKind,
    ) -> CalcResult<()> {
        for n in nodes {
            self.require_node(n)?;
        }
        if !self.materials.contains_key(material) {
            return Err(CalcError::MaterialNotFound(material.to_string()));
        }
        if self.shells.contains_key(name) {
            return Err(CalcError::DuplicateName(name.to_string()));
        }
        if thickness <= 0.0 {
            return Err(CalcError::InvalidInput(format!(
                "thickness of '{}' must be positive",
                name
            )));
        }
        self.shells.insert(
            name.to_string(),
            ShellData {
                nodes: nodes.map(str::to_string),
                thickness,
                material: material.to_string(),
                kind,
            },
        );
        self.shell_order.push(name.to_string());
        self.invalidate();
        Ok(())
    }

    fn add_pressure(&mut self, name: &str, kind: ShellKind, pressure: f64, case: &str) -> CalcResult<()> {
        match self.shells.get(name) {
            Some(s) if s.kind == kind => {}
            _ => return Err(CalcError::PlateNotFound(name.to_string())),
        }
        self.pressures.entry(name.to_string()).or_default().push(Pressure {
            pressure,
            case: case.to_string(),
        });
        self.invalidate();
        Ok(())
    }

    fn coords(&self, name: &str) -> CalcResult<[f64; 3]> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| CalcError::NodeNotFound(name.to_string()))
    }

    fn prepare_members(&self, dof: &HashMap<&str, usize>) -> CalcResult<Vec<PreparedMember>> {
        let mut prepared = Vec::with_capacity(self.member_order.len());
        for name in &self.member_order {
            let m = &self.members[name];
            let pi = self.coords(&m.i_node)?;
            let pj = self.coords(&m.j_node)?;
            let material = *self
                .materials
                .get(&m.material)
                .ok_or_else(|| CalcError::MaterialNotFound(m.material.clone()))?;
            let section = *self
                .sections
                .get(&m.section)
                .ok_or_else(|| CalcError::SectionNotFound(m.section.clone()))?;

            let t = math::member_transformation_matrix(&pi, &pj, m.rotation)?;
            let length = crate::geometry::distance(&pi, &pj);
            let k_local = math::member_local_stiffness(
                material.e,
                material.g,
                section.a,
                section.iy,
                section.iz,
                section.j,
                length,
            );
            let releases = m.releases.as_array();
            let k_cond = math::apply_releases(&k_local, &releases);

            prepared.push(PreparedMember {
                name: name.clone(),
                i_dof: dof[m.i_node.as_str()],
                j_dof: dof[m.j_node.as_str()],
                length,
                rotation: t.fixed_view::<3, 3>(0, 0).into_owned(),
                t,
                k_local,
                k_cond,
                releases,
                material,
                section,
            });
        }
        Ok(prepared)
    }

    fn prepare_shells(&self, dof: &HashMap<&str, usize>) -> CalcResult<Vec<PreparedShell>> {
        let mut prepared = Vec::with_capacity(self.shell_order.len());
        for name in &self.shell_order {
            let s = &self.shells[name];
            let material = self
                .materials
                .get(&s.material)
                .ok_or_else(|| CalcError::MaterialNotFound(s.material.clone()))?;
            let mut coords = [[0.0; 3]; 4];
            let mut dofs = [0; 4];
            for k in 0..4 {
                coords[k] = self.coords(&s.nodes[k])?;
                dofs[k] = dof[s.nodes[k].as_str()];
            }
            let t = shell::shell_transformation_matrix(&coords)?;
            let k_local = shell::shell_local_stiffness(&coords, material.e, material.nu, s.thickness)?;
            let unit_load = t.transpose() * shell::shell_pressure_loads(&coords, 1.0)?;
            prepared.push(PreparedShell {
                name: name.clone(),
                dofs,
                k_global: t.transpose() * k_local * t,
                unit_load,
            });
        }
        Ok(prepared)
    }

    /// Factored line loads on a member, resolved into local axes
    fn member_line_loads(&self, m: &PreparedMember, combo: &LoadCombination) -> Vec<LocalLineLoad> {
        let mut out = Vec::new();
        let mut push = |direction: LoadDirection, w1: f64, w2: f64, x1: f64, x2: f64| {
            let x1 = x1.max(0.0);
            let x2 = x2.min(m.length);
            if x2 <= x1 {
                return;
            }
            let components: [f64; 3] = match direction {
                LoadDirection::Fx => [1.0, 0.0, 0.0],
                LoadDirection::Fy => [0.0, 1.0, 0.0],
                LoadDirection::Fz => [0.0, 0.0, 1.0],
                global => match global.global_index() {
                    Some(g) if g < 3 => [m.rotation[(0, g)], m.rotation[(1, g)], m.rotation[(2, g)]],
                    _ => return,
                },
            };
            for (axis, c) in components.into_iter().enumerate() {
                if c.abs() > 1e-12 {
                    out.push(LocalLineLoad {
                        w1: w1 * c,
                        w2: w2 * c,
                        x1,
                        x2,
                        axis,
                    });
                }
            }
        };

        if let Some(loads) = self.dist_loads.get(&m.name) {
            for load in loads {
                let f = combo.factor(&load.case);
                if f.abs() > 1e-12 {
                    push(load.direction, load.w1 * f, load.w2 * f, load.x1, load.x2);
                }
            }
        }
        for sw in &self.self_weight {
            let f = combo.factor(&sw.case);
            if f.abs() > 1e-12 {
                let w = m.material.unit_weight * m.section.a * sw.factor * f;
                push(sw.direction, w, w, 0.0, m.length);
            }
        }
        out
    }

    fn fixed_end_forces(loads: &[LocalLineLoad], length: f64) -> Vec12 {
        loads.iter().fold(Vec12::zeros(), |acc, l| {
            acc + math::fer_linear_load(l.w1, l.w2, l.x1, l.x2, length, l.axis)
        })
    }

    fn load_vector(
        &self,
        combo: &LoadCombination,
        members: &[PreparedMember],
        shells: &[PreparedShell],
        dof: &HashMap<&str, usize>,
    ) -> FEVec {
        let mut p = FEVec::zeros(self.node_order.len() * 6);

        for (node, loads) in &self.node_loads {
            let base = dof[node.as_str()];
            for load in loads {
                let f = combo.factor(&load.case);
                if let Some(i) = load.direction.global_index() {
                    p[base + i] += f * load.value;
                }
            }
        }

        for m in members {
            let loads = self.member_line_loads(m, combo);
            if loads.is_empty() {
                continue;
            }
            let fer = Self::fixed_end_forces(&loads, m.length);
            let fer = math::apply_fer_releases(&fer, &m.k_local, &m.releases);
            let fer_global = m.t.transpose() * fer;
            for i in 0..6 {
                p[m.i_dof + i] -= fer_global[i];
                p[m.j_dof + i] -= fer_global[i + 6];
            }
        }

        for s in shells {
            let Some(pressures) = self.pressures.get(&s.name) else {
                continue;
            };
            let total: f64 = pressures.iter().map(|pr| pr.pressure * combo.factor(&pr.case)).sum();
            if total == 0.0 {
                continue;
            }
            for (k, &base) in s.dofs.iter().enumerate() {
                for i in 0..6 {
                    p[base + i] += s.unit_load[6 * k + i] * total;
                }
            }
        }
        p
    }

    fn solve_reduced(&self, k11: &Reduced, p1: &FEVec) -> CalcResult<FEVec> {
        if p1.is_empty() {
            return Ok(FEVec::zeros(0));
        }
        let d1 = match k11 {
            Reduced::Dense(k) => math::solve_dense(k, p1),
            Reduced::Sparse(csr) => {
                match sparse::solve_pcg(csr, p1, self.options.tolerance, self.options.max_iterations) {
                    Some(d) => Some(d),
                    None => {
                        warn!("Iterative solve did not converge, falling back to dense");
                        math::solve_dense(&sparse::to_dense(csr), p1)
                    }
                }
            }
        };
        match d1 {
            Some(d) if d.iter().all(|v| v.is_finite()) => Ok(d),
            _ => Err(CalcError::SingularMatrix),
        }
    }

    fn member_diagram(&self, m: &PreparedMember, combo: &LoadCombination, d: &FEVec) -> MemberDiagram {
        let d_global = Vec12::from_iterator(
            (0..6)
                .map(|i| d[m.i_dof + i])
                .chain((0..6).map(|i| d[m.j_dof + i])),
        );
        let d_local = m.t * d_global;
        let loads = self.member_line_loads(m, combo);
        let fer = Self::fixed_end_forces(&loads, m.length);
        let fer_cond = math::apply_fer_releases(&fer, &m.k_local, &m.releases);
        let forces = m.k_cond * d_local + fer_cond;
        let displacements =
            math::recover_released_displacements(&d_local, &fer, &m.k_local, &m.releases);

        MemberDiagram {
            length: m.length,
            e: m.material.e,
            iy: m.section.iy,
            iz: m.section.iz,
            forces,
            displacements,
            loads,
        }
    }
}

impl SolverModel for FrameModel {
    fn add_node(&mut self, name: &str, x: f64, y: f64, z: f64) -> CalcResult<()> {
        if self.nodes.contains_key(name) {
            return Err(CalcError::DuplicateName(name.to_string()));
        }
        self.nodes.insert(name.to_string(), [x, y, z]);
        self.node_order.push(name.to_string());
        self.invalidate();
        Ok(())
    }

    fn add_material(&mut self, name: &str, props: MaterialProps) -> CalcResult<()> {
        if self.materials.contains_key(name) {
            return Err(CalcError::DuplicateName(name.to_string()));
        }
        self.materials.insert(name.to_string(), props);
        Ok(())
    }

    fn add_section(&mut self, name: &str, props: SectionProps) -> CalcResult<()> {
        if self.sections.contains_key(name) {
            return Err(CalcError::DuplicateName(name.to_string()));
        }
        self.sections.insert(name.to_string(), props);
        Ok(())
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
        self.require_node(i_node)?;
        self.require_node(j_node)?;
        if !self.materials.contains_key(material) {
            return Err(CalcError::MaterialNotFound(material.to_string()));
        }
        if !self.sections.contains_key(section) {
            return Err(CalcError::SectionNotFound(section.to_string()));
        }
        if self.members.contains_key(name) {
            return Err(CalcError::DuplicateName(name.to_string()));
        }
        self.members.insert(
            name.to_string(),
            MemberData {
                i_node: i_node.to_string(),
                j_node: j_node.to_string(),
                material: material.to_string(),
                section: section.to_string(),
                rotation,
                releases: MemberReleases::none(),
            },
        );
        self.member_order.push(name.to_string());
        self.invalidate();
        Ok(())
    }

    fn def_releases(&mut self, member: &str, releases: MemberReleases) -> CalcResult<()> {
        let m = self
            .members
            .get_mut(member)
            .ok_or_else(|| CalcError::MemberNotFound(member.to_string()))?;
        m.releases = releases;
        self.invalidate();
        Ok(())
    }

    fn def_support(&mut self, node: &str, fixity: Fixity) -> CalcResult<()> {
        self.require_node(node)?;
        self.supports.insert(node.to_string(), fixity);
        self.invalidate();
        Ok(())
    }

    fn add_node_load(
        &mut self,
        node: &str,
        direction: LoadDirection,
        value: f64,
        case: &str,
    ) -> CalcResult<()> {
        self.require_node(node)?;
        if direction.is_local() {
            return Err(CalcError::InvalidInput(format!(
                "node load on '{}' must use a global direction, got {:?}",
                node, direction
            )));
        }
        self.node_loads.entry(node.to_string()).or_default().push(NodeLoad {
            direction,
            value,
            case: case.to_string(),
        });
        self.invalidate();
        Ok(())
    }

    fn add_member_dist_load(&mut self, member: &str, load: DistributedLoad) -> CalcResult<()> {
        if !self.members.contains_key(member) {
            return Err(CalcError::MemberNotFound(member.to_string()));
        }
        if matches!(
            load.direction,
            LoadDirection::MX | LoadDirection::MY | LoadDirection::MZ
        ) {
            return Err(CalcError::InvalidInput(format!(
                "distributed moments are not supported on '{}'",
                member
            )));
        }
        if load.x2 < load.x1 {
            return Err(CalcError::InvalidInput(format!(
                "load extent on '{}' ends before it starts",
                member
            )));
        }
        self.dist_loads.entry(member.to_string()).or_default().push(load);
        self.invalidate();
        Ok(())
    }

    fn add_member_self_weight(
        &mut self,
        direction: LoadDirection,
        factor: f64,
        case: &str,
    ) -> CalcResult<()> {
        if !matches!(direction, LoadDirection::FX | LoadDirection::FY | LoadDirection::FZ) {
            return Err(CalcError::InvalidInput(format!(
                "self-weight must act along a global axis, got {:?}",
                direction
            )));
        }
        self.self_weight.push(SelfWeight {
            direction,
            factor,
            case: case.to_string(),
        });
        self.invalidate();
        Ok(())
    }

    fn add_plate(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
    ) -> CalcResult<()> {
        self.add_shell(name, nodes, thickness, material, ShellKind::Plate)
    }

    fn add_quad(
        &mut self,
        name: &str,
        nodes: [&str; 4],
        thickness: f64,
        material: &str,
    ) -> CalcResult<()> {
        self.add_shell(name, nodes, thickness, material, ShellKind::Quad)
    }

    fn add_plate_surface_pressure(
        &mut self,
        plate: &str,
        pressure: f64,
        case: &str,
    ) -> CalcResult<()> {
        self.add_pressure(plate, ShellKind::Plate, pressure, case)
    }

    fn add_quad_surface_pressure(&mut self, quad: &str, pressure: f64, case: &str) -> CalcResult<()> {
        self.add_pressure(quad, ShellKind::Quad, pressure, case)
    }

    fn add_load_combo(&mut self, combo: LoadCombination) -> CalcResult<()> {
        self.combos.insert(combo.name.clone(), combo);
        self.invalidate();
        Ok(())
    }

    fn analyze(&mut self) -> CalcResult<()> {
        if self.node_order.is_empty() {
            return Err(CalcError::AnalysisFailed("model has no nodes".to_string()));
        }
        if self.combos.is_empty() {
            let combo = self.default_combination();
            self.combos.insert(combo.name.clone(), combo);
        }
        self.solutions.clear();

        let dof: HashMap<&str, usize> = self
            .node_order
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i * 6))
            .collect();
        let n_dofs = self.node_order.len() * 6;

        let members = self.prepare_members(&dof)?;
        let shells = self.prepare_shells(&dof)?;

        let mut global = GlobalStiffness::new(n_dofs);
        for m in &members {
            let kg = m.t.transpose() * m.k_cond * m.t;
            let dofs: Vec<usize> = (m.i_dof..m.i_dof + 6).chain(m.j_dof..m.j_dof + 6).collect();
            global.scatter(&dofs, kg.as_slice());
        }
        for s in &shells {
            let dofs: Vec<usize> = s.dofs.iter().flat_map(|&b| b..b + 6).collect();
            global.scatter(&dofs, s.k_global.as_slice());
        }
        let k_global = global.finish();

        let mut restrained = vec![false; n_dofs];
        for (node, fixity) in &self.supports {
            let base = dof[node.as_str()];
            for (i, r) in fixity.as_array().into_iter().enumerate() {
                restrained[base + i] = r;
            }
        }

        let diag = sparse::diagonal(&k_global);
        let max_diag = diag.iter().fold(0.0_f64, |a, &b| a.max(b.abs()));
        let mut free_index: Vec<Option<usize>> = vec![None; n_dofs];
        let mut free: Vec<usize> = Vec::new();
        let mut held = 0;
        for i in 0..n_dofs {
            if restrained[i] {
                continue;
            }
            if diag[i].abs() <= max_diag * 1e-12 {
                held += 1;
                continue;
            }
            free_index[i] = Some(free.len());
            free.push(i);
        }
        if held > 0 {
            debug!("{} unrestrained DOF(s) without stiffness held at zero", held);
        }

        let n_free = free.len();
        let k11 = if self.options.sparse {
            Reduced::Sparse(sparse::reduce_sparse(&k_global, &free_index, n_free))
        } else {
            Reduced::Dense(sparse::reduce_dense(&k_global, &free_index, n_free))
        };

        let combos: Vec<LoadCombination> = self.combos.values().cloned().collect();
        let mut solutions = HashMap::with_capacity(combos.len());
        for combo in &combos {
            let p = self.load_vector(combo, &members, &shells, &dof);
            let p1 = FEVec::from_iterator(n_free, free.iter().map(|&i| p[i]));
            let d1 = self.solve_reduced(&k11, &p1)?;

            let mut d = FEVec::zeros(n_dofs);
            for (k, &i) in free.iter().enumerate() {
                d[i] = d1[k];
            }
            let r = sparse::matvec(&k_global, &d) - &p;

            let mut solution = ComboSolution::default();
            for name in &self.node_order {
                let base = dof[name.as_str()];
                let mut disp = [0.0; 6];
                let mut rxn = [0.0; 6];
                for i in 0..6 {
                    disp[i] = d[base + i];
                    if restrained[base + i] {
                        rxn[i] = r[base + i];
                    }
                }
                solution.displacements.insert(name.clone(), disp);
                solution.reactions.insert(name.clone(), rxn);
            }
            for m in &members {
                solution
                    .members
                    .insert(m.name.clone(), self.member_diagram(m, combo, &d));
            }
            solutions.insert(combo.name.clone(), solution);
        }

        info!(
            "Solved {} node(s), {} member(s), {} shell(s), {} free DOF(s), {} combination(s)",
            self.node_order.len(),
            members.len(),
            shells.len(),
            n_free,
            solutions.len()
        );
        self.solutions = solutions;
        Ok(())
    }
}

impl SolverResults for FrameModel {
    fn node_names(&self) -> Vec<String> {
        self.node_order.clone()
    }

    fn member_names(&self) -> Vec<String> {
        self.member_order.clone()
    }

    fn support(&self, node: &str) -> Option<Fixity> {
        self.supports.get(node).copied()
    }

    fn node_reactions(&self, node: &str, combo: &str) -> CalcResult<Reactions> {
        let solution = self.solution(combo)?;
        solution
            .reactions
            .get(node)
            .map(|r| Reactions::from_array(*r))
            .ok_or_else(|| CalcError::NodeNotFound(node.to_string()))
    }

    fn member_array(
        &self,
        member: &str,
        response: Response,
        n_points: usize,
        combo: &str,
    ) -> CalcResult<Vec<f64>> {
        Ok(self.diagram(member, combo)?.array(response, n_points))
    }

    fn member_min(&self, member: &str, response: Response, combo: &str) -> CalcResult<f64> {
        Ok(self
            .diagram(member, combo)?
            .min(response, self.options.extreme_samples))
    }

    fn member_max(&self, member: &str, response: Response, combo: &str) -> CalcResult<f64> {
        Ok(self
            .diagram(member, combo)?
            .max(response, self.options.extreme_samples))
    }
}
