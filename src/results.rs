//! Post-solve extraction: member response series and support reactions

use log::info;
use serde::Serialize;

use crate::config::ResponsePoints;
use crate::error::recover;
use crate::geometry::MemberRecord;
use crate::solver::{Reactions, Response, SolverResults};

/// One response type along a member
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseSeries {
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

/// Response series for one member under the active combination
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResult {
    pub name: String,
    pub section: Option<String>,
    pub nodes: [String; 2],
    pub moment_y: ResponseSeries,
    pub moment_z: ResponseSeries,
    pub shear_y: ResponseSeries,
    pub shear_z: ResponseSeries,
    pub axial: ResponseSeries,
    pub torque: ResponseSeries,
    pub deflection_y: ResponseSeries,
    pub deflection_z: ResponseSeries,
}

impl MemberResult {
    fn empty(member: &MemberRecord) -> Self {
        Self {
            name: member.name.clone(),
            section: member.section.clone(),
            nodes: member.node_names(),
            moment_y: ResponseSeries::default(),
            moment_z: ResponseSeries::default(),
            shear_y: ResponseSeries::default(),
            shear_z: ResponseSeries::default(),
            axial: ResponseSeries::default(),
            torque: ResponseSeries::default(),
            deflection_y: ResponseSeries::default(),
            deflection_z: ResponseSeries::default(),
        }
    }

    pub fn series(&self, response: Response) -> &ResponseSeries {
        match response {
            Response::MomentY => &self.moment_y,
            Response::MomentZ => &self.moment_z,
            Response::ShearY => &self.shear_y,
            Response::ShearZ => &self.shear_z,
            Response::Axial => &self.axial,
            Response::Torque => &self.torque,
            Response::DeflectionY => &self.deflection_y,
            Response::DeflectionZ => &self.deflection_z,
        }
    }

    fn series_mut(&mut self, response: Response) -> &mut ResponseSeries {
        match response {
            Response::MomentY => &mut self.moment_y,
            Response::MomentZ => &mut self.moment_z,
            Response::ShearY => &mut self.shear_y,
            Response::ShearZ => &mut self.shear_z,
            Response::Axial => &mut self.axial,
            Response::Torque => &mut self.torque,
            Response::DeflectionY => &mut self.deflection_y,
            Response::DeflectionZ => &mut self.deflection_z,
        }
    }
}

/// Pulls response series from a solved model, one member at a time.
///
/// A failed query never aborts extraction: a failed array becomes `[0.0]`
/// and a failed extreme becomes `0.0`, with one warning per member.
pub struct ResultExtractor {
    points: ResponsePoints,
}

impl ResultExtractor {
    pub fn new(points: ResponsePoints) -> Self {
        Self { points }
    }

    pub fn extract<R: SolverResults + ?Sized>(
        &self,
        solver: &R,
        members: &[MemberRecord],
        combo: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<MemberResult> {
        members
            .iter()
            .map(|member| self.extract_member(solver, member, combo, warnings))
            .collect()
    }

    fn extract_member<R: SolverResults + ?Sized>(
        &self,
        solver: &R,
        member: &MemberRecord,
        combo: &str,
        warnings: &mut Vec<String>,
    ) -> MemberResult {
        let mut result = MemberResult::empty(member);
        let mut failed = Vec::new();

        for response in Response::ALL {
            let n = self.points.for_response(response);
            let series = result.series_mut(response);
            series.values = solver
                .member_array(&member.name, response, n, combo)
                .unwrap_or_else(|e| {
                    failed.push(format!("{} array ({})", response, e));
                    vec![0.0]
                });
            series.min = solver
                .member_min(&member.name, response, combo)
                .unwrap_or_else(|e| {
                    failed.push(format!("{} min ({})", response, e));
                    0.0
                });
            series.max = solver
                .member_max(&member.name, response, combo)
                .unwrap_or_else(|e| {
                    failed.push(format!("{} max ({})", response, e));
                    0.0
                });
        }

        if !failed.is_empty() {
            recover(
                warnings,
                format!(
                    "member {}: {} quer{} failed, zero substituted: {}",
                    member.name,
                    failed.len(),
                    if failed.len() == 1 { "y" } else { "ies" },
                    failed.join(", ")
                ),
            );
        }
        result
    }
}

/// Reactions at one supported node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionRecord {
    pub node: String,
    pub reactions: Reactions,
    /// The solver reported reactions for this node
    pub reported: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReactionTable {
    pub combination: String,
    pub records: Vec<ReactionRecord>,
    /// Component-wise sum over all supported nodes
    pub sum: Reactions,
}

impl ReactionTable {
    pub fn any_reported(&self) -> bool {
        self.records.iter().any(|r| r.reported)
    }

    pub fn get(&self, node: &str) -> Option<&ReactionRecord> {
        self.records.iter().find(|r| r.node == node)
    }
}

pub struct ReactionAggregator;

impl ReactionAggregator {
    /// Collect reactions at every supported node; components the solver
    /// does not report are zero
    pub fn aggregate<R: SolverResults + ?Sized>(solver: &R, combo: &str) -> ReactionTable {
        let mut table = ReactionTable {
            combination: combo.to_string(),
            ..ReactionTable::default()
        };
        let mut sum = [0.0; 6];

        for node in solver.node_names() {
            if !solver.support(&node).is_some_and(|f| f.is_supported()) {
                continue;
            }
            let (reactions, reported) = match solver.node_reactions(&node, combo) {
                Ok(r) => (r, true),
                Err(_) => (Reactions::default(), false),
            };
            for (s, v) in sum.iter_mut().zip(reactions.as_array()) {
                *s += v;
            }
            table.records.push(ReactionRecord {
                node,
                reactions,
                reported,
            });
        }

        table.sum = Reactions::from_array(sum);
        info!(
            "Reaction sum under {}: FX={:.4} FY={:.4} FZ={:.4}",
            combo, table.sum.fx, table.sum.fy, table.sum.fz
        );
        table
    }
}
