//! Load types (the case names loads are registered under)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CalcError;

/// The six load types a combination can scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadType {
    #[default]
    Dead,
    Live,
    Hydrostatic,
    Fluid,
    Wind,
    Seismic,
}

impl LoadType {
    pub const ALL: [LoadType; 6] = [
        LoadType::Dead,
        LoadType::Live,
        LoadType::Hydrostatic,
        LoadType::Fluid,
        LoadType::Wind,
        LoadType::Seismic,
    ];

    /// Case name used when registering loads with the solver
    pub fn case_name(self) -> &'static str {
        match self {
            LoadType::Dead => "dead",
            LoadType::Live => "live",
            LoadType::Hydrostatic => "hydrostatic",
            LoadType::Fluid => "fluid",
            LoadType::Wind => "wind",
            LoadType::Seismic => "seismic",
        }
    }

    /// Wind and seismic loads act in one horizontal direction per combination
    pub fn is_directional(self) -> bool {
        matches!(self, LoadType::Wind | LoadType::Seismic)
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.case_name())
    }
}

impl FromStr for LoadType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dead" | "dl" | "d" => Ok(LoadType::Dead),
            "live" | "ll" | "l" => Ok(LoadType::Live),
            "hydrostatic" | "h" => Ok(LoadType::Hydrostatic),
            "fluid" | "f" => Ok(LoadType::Fluid),
            "wind" | "wl" | "w" => Ok(LoadType::Wind),
            "seismic" | "el" | "e" => Ok(LoadType::Seismic),
            other => Err(CalcError::InvalidInput(format!("unknown load type '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("DL".parse::<LoadType>().unwrap(), LoadType::Dead);
        assert_eq!("Wind".parse::<LoadType>().unwrap(), LoadType::Wind);
        assert!("snow".parse::<LoadType>().is_err());
    }

    #[test]
    fn test_default_is_dead() {
        assert_eq!(LoadType::default(), LoadType::Dead);
        assert_eq!(LoadType::default().case_name(), "dead");
    }
}
