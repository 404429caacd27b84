//! Load combinations and the standard combination table
//!
//! Two families are tabulated: allowable-stress (100-series) and strength
//! design (1000-series). Wind and seismic combinations come in one variant
//! per horizontal CAD direction, tagged `(+X)`, `(-X)`, `(+Y)` or `(-Y)`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::LoadType;

/// Horizontal direction tokens embedded in directional combination names
pub const DIRECTION_TOKENS: [&str; 4] = ["+X", "-X", "+Y", "-Y"];

/// First identifier of the strength-design family
const STRENGTH_PREFIX: u32 = 1000;

/// A named set of per-case factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCombination {
    pub name: String,
    /// Case name -> factor
    pub factors: BTreeMap<String, f64>,
}

impl LoadCombination {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            factors: BTreeMap::new(),
        }
    }

    /// Add a load case with a factor
    pub fn with_case(mut self, case: &str, factor: f64) -> Self {
        self.factors.insert(case.to_string(), factor);
        self
    }

    /// Factor for a case; zero when the case does not participate
    pub fn factor(&self, case: &str) -> f64 {
        self.factors.get(case).copied().unwrap_or(0.0)
    }

    pub fn includes(&self, case: &str) -> bool {
        self.factor(case).abs() > 1e-10
    }

    /// Horizontal direction token in the name, if any
    pub fn direction(&self) -> Option<&'static str> {
        direction_token(&self.name)
    }
}

/// Direction token embedded in a combination name, e.g. `"+X"` for
/// `"103_DL+0.6WL(+X)"`
pub fn direction_token(name: &str) -> Option<&'static str> {
    DIRECTION_TOKENS
        .iter()
        .copied()
        .find(|t| name.contains(&format!("({})", t)))
}

/// Design philosophy label derived from the identifier's numeric prefix
pub fn analysis_label(name: &str) -> &'static str {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(n) if n >= STRENGTH_PREFIX => "Strength Design",
        _ => "Allowable Stress Design",
    }
}

struct Row {
    id: u32,
    label: &'static str,
    dead: f64,
    live: f64,
    wind: f64,
    seismic: f64,
}

impl Row {
    fn directional(&self) -> bool {
        self.wind != 0.0 || self.seismic != 0.0
    }
}

const fn row(id: u32, label: &'static str, dead: f64, live: f64, wind: f64, seismic: f64) -> Row {
    Row {
        id,
        label,
        dead,
        live,
        wind,
        seismic,
    }
}

#[rustfmt::skip]
const ASD_ROWS: [Row; 9] = [
    row(100, "DL",                 1.0, 0.0,  0.0,  0.0),
    row(101, "DL+LL",              1.0, 1.0,  0.0,  0.0),
    row(102, "DL+0.75LL",          1.0, 0.75, 0.0,  0.0),
    row(103, "DL+0.6WL",           1.0, 0.0,  0.6,  0.0),
    row(104, "DL+0.75LL+0.45WL",   1.0, 0.75, 0.45, 0.0),
    row(105, "0.6DL+0.6WL",        0.6, 0.0,  0.6,  0.0),
    row(106, "DL+0.7EL",           1.0, 0.0,  0.0,  0.7),
    row(107, "DL+0.75LL+0.525EL",  1.0, 0.75, 0.0,  0.525),
    row(108, "0.6DL+0.7EL",        0.6, 0.0,  0.0,  0.7),
];

#[rustfmt::skip]
const STRENGTH_ROWS: [Row; 8] = [
    row(1000, "1.4DL",             1.4, 0.0,  0.0,  0.0),
    row(1001, "1.2DL+1.6LL",       1.2, 1.6,  0.0,  0.0),
    row(1002, "1.2DL+LL",          1.2, 1.0,  0.0,  0.0),
    row(1003, "1.2DL+0.5WL",       1.2, 0.0,  0.5,  0.0),
    row(1004, "1.2DL+WL+LL",       1.2, 1.0,  1.0,  0.0),
    row(1005, "1.2DL+EL+LL",       1.2, 1.0,  0.0,  1.0),
    row(1006, "0.9DL+WL",          0.9, 0.0,  1.0,  0.0),
    row(1007, "0.9DL+EL",          0.9, 0.0,  0.0,  1.0),
];

/// Static combination table keyed by identifier
#[derive(Debug, Clone)]
pub struct CombinationTable {
    combos: BTreeMap<String, LoadCombination>,
}

impl Default for CombinationTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CombinationTable {
    /// The standard ASD + strength-design table.
    ///
    /// Fluid loads take the dead-load factor. Hydrostatic loads enter every
    /// combination beyond the dead-only ones, at 1.0 for ASD and 1.6 for
    /// strength design.
    pub fn standard() -> Self {
        let mut combos = BTreeMap::new();
        for (rows, h) in [(&ASD_ROWS[..], 1.0), (&STRENGTH_ROWS[..], 1.6)] {
            for (k, r) in rows.iter().enumerate() {
                let hydrostatic = if k == 0 { 0.0 } else { h };
                let names: Vec<String> = if r.directional() {
                    DIRECTION_TOKENS
                        .iter()
                        .map(|t| format!("{}_{}({})", r.id, r.label, t))
                        .collect()
                } else {
                    vec![format!("{}_{}", r.id, r.label)]
                };
                for name in names {
                    let mut combo = LoadCombination::new(&name);
                    for (lt, f) in [
                        (LoadType::Dead, r.dead),
                        (LoadType::Fluid, r.dead),
                        (LoadType::Live, r.live),
                        (LoadType::Hydrostatic, hydrostatic),
                        (LoadType::Wind, r.wind),
                        (LoadType::Seismic, r.seismic),
                    ] {
                        if f != 0.0 {
                            combo = combo.with_case(lt.case_name(), f);
                        }
                    }
                    combos.insert(name, combo);
                }
            }
        }
        Self { combos }
    }

    pub fn get(&self, name: &str) -> Option<&LoadCombination> {
        self.combos.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.combos.contains_key(name)
    }

    /// Factor for a load type under a combination: 1.0 for unknown
    /// combinations, 0.0 for types the combination does not include
    pub fn resolve(&self, name: &str, load_type: LoadType) -> f64 {
        match self.combos.get(name) {
            Some(combo) => combo.factor(load_type.case_name()),
            None => 1.0,
        }
    }

    /// Solver combination for an identifier, with every case spelled out
    pub fn solver_combination(&self, name: &str) -> LoadCombination {
        LoadType::ALL
            .iter()
            .fold(LoadCombination::new(name), |c, lt| {
                c.with_case(lt.case_name(), self.resolve(name, *lt))
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.combos.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadCombination> {
        self.combos.values()
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }
}
