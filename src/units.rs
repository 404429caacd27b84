//! Length/force unit pairs and conversion of CAD quantities into working units

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CalcError, CalcResult};

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// Length units understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Mm,
    Cm,
    M,
    In,
    Ft,
}

impl LengthUnit {
    /// Size of one unit in meters
    pub fn in_meters(self) -> f64 {
        match self {
            LengthUnit::Mm => 1e-3,
            LengthUnit::Cm => 1e-2,
            LengthUnit::M => 1.0,
            LengthUnit::In => 0.0254,
            LengthUnit::Ft => 0.3048,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::M => "m",
            LengthUnit::In => "in",
            LengthUnit::Ft => "ft",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" => Ok(LengthUnit::Mm),
            "cm" => Ok(LengthUnit::Cm),
            "m" => Ok(LengthUnit::M),
            "in" | "inch" | "\"" => Ok(LengthUnit::In),
            "ft" | "foot" | "'" => Ok(LengthUnit::Ft),
            other => Err(CalcError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Force units understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceUnit {
    N,
    #[default]
    #[serde(rename = "kn")]
    KN,
    Kgf,
    Tf,
    Lbf,
    Kip,
}

impl ForceUnit {
    /// Size of one unit in newtons
    pub fn in_newtons(self) -> f64 {
        match self {
            ForceUnit::N => 1.0,
            ForceUnit::KN => 1e3,
            ForceUnit::Kgf => STANDARD_GRAVITY,
            ForceUnit::Tf => 1e3 * STANDARD_GRAVITY,
            ForceUnit::Lbf => 4.448_221_615_260_5,
            ForceUnit::Kip => 4_448.221_615_260_5,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ForceUnit::N => "N",
            ForceUnit::KN => "kN",
            ForceUnit::Kgf => "kgf",
            ForceUnit::Tf => "tf",
            ForceUnit::Lbf => "lbf",
            ForceUnit::Kip => "kip",
        }
    }
}

impl FromStr for ForceUnit {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" => Ok(ForceUnit::N),
            "kn" => Ok(ForceUnit::KN),
            "kgf" => Ok(ForceUnit::Kgf),
            "tf" => Ok(ForceUnit::Tf),
            "lbf" | "lb" => Ok(ForceUnit::Lbf),
            "kip" | "kips" => Ok(ForceUnit::Kip),
            other => Err(CalcError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for ForceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The working length/force pair every solver value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitSystem {
    pub length: LengthUnit,
    pub force: ForceUnit,
}

impl UnitSystem {
    pub fn new(length: LengthUnit, force: ForceUnit) -> Self {
        Self { length, force }
    }

    fn l(&self) -> f64 {
        self.length.in_meters()
    }

    fn f(&self) -> f64 {
        self.force.in_newtons()
    }

    /// Convert a length into the working length unit
    pub fn length(&self, value: f64, from: LengthUnit) -> f64 {
        value * from.in_meters() / self.l()
    }

    /// Convert an area (length²) into working units
    pub fn area(&self, value: f64, from: LengthUnit) -> f64 {
        value * (from.in_meters() / self.l()).powi(2)
    }

    /// Convert a second moment of area (length⁴) into working units
    pub fn inertia(&self, value: f64, from: LengthUnit) -> f64 {
        value * (from.in_meters() / self.l()).powi(4)
    }

    /// Convert a force into the working force unit
    pub fn force(&self, value: f64, from: ForceUnit) -> f64 {
        value * from.in_newtons() / self.f()
    }

    /// Convert a line load into working force/length
    pub fn line_load(&self, value: f64, force: ForceUnit, length: LengthUnit) -> f64 {
        value * (force.in_newtons() / length.in_meters()) * self.l() / self.f()
    }

    /// Convert a stress/pressure in pascals into working force/length²
    pub fn stress_from_pascals(&self, pascals: f64) -> f64 {
        pascals * self.l().powi(2) / self.f()
    }

    /// Convert a unit weight in N/m³ into working force/length³
    pub fn unit_weight_from_si(&self, newtons_per_m3: f64) -> f64 {
        newtons_per_m3 * self.l().powi(3) / self.f()
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.force, self.length)
    }
}

/// A raw value with its unit string, as exposed by CAD property fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value,
            unit: unit.to_string(),
        }
    }

    /// Interpret as a stress or pressure and convert into working units
    pub fn to_stress(&self, units: &UnitSystem) -> CalcResult<f64> {
        let pascals = self.finite()? * pascals_per(&self.unit)?;
        Ok(units.stress_from_pascals(pascals))
    }

    /// Interpret as a density and convert into a working unit weight.
    ///
    /// Mass densities go native -> t/m³ -> kN/m³ under standard gravity; a
    /// quantity already expressed as force/volume is converted directly.
    pub fn to_unit_weight(&self, units: &UnitSystem) -> CalcResult<f64> {
        let value = self.finite()?;
        let si = match kilograms_per_cubic_meter(&self.unit) {
            Ok(kg_m3) => {
                let tonnes_m3 = value * kg_m3 / 1000.0;
                tonnes_m3 * STANDARD_GRAVITY * 1000.0
            }
            Err(_) => value * newtons_per_cubic_meter(&self.unit)?,
        };
        Ok(units.unit_weight_from_si(si))
    }

    fn finite(&self) -> CalcResult<f64> {
        if self.value.is_finite() {
            Ok(self.value)
        } else {
            Err(CalcError::InvalidInput(format!(
                "non-finite quantity {} {}",
                self.value, self.unit
            )))
        }
    }
}

fn normalize(unit: &str) -> String {
    unit.trim()
        .replace('²', "^2")
        .replace('³', "^3")
        .replace(' ', "")
        .to_ascii_lowercase()
}

/// Split "mm^2" / "mm2" into ("mm", 2)
fn split_power(term: &str) -> (&str, i32) {
    let term = term.trim_end_matches(|c: char| c.is_ascii_digit() || c == '^');
    (term, 1)
}

fn power_of(term: &str) -> i32 {
    term.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim_start_matches('^')
        .parse()
        .unwrap_or(1)
}

fn length_term(term: &str, expected_power: i32) -> CalcResult<LengthUnit> {
    let (base, _) = split_power(term);
    if power_of(term) != expected_power {
        return Err(CalcError::UnknownUnit(term.to_string()));
    }
    base.parse()
}

fn ratio<'a>(unit: &'a str, original: &str) -> CalcResult<(&'a str, &'a str)> {
    unit.split_once('/')
        .ok_or_else(|| CalcError::UnknownUnit(original.to_string()))
}

/// Pascals represented by one unit of the given stress unit string
pub fn pascals_per(unit: &str) -> CalcResult<f64> {
    let u = normalize(unit);
    let lbf = ForceUnit::Lbf.in_newtons();
    let kip = ForceUnit::Kip.in_newtons();
    let inch = LengthUnit::In.in_meters();
    let foot = LengthUnit::Ft.in_meters();
    let named = match u.as_str() {
        "pa" => Some(1.0),
        "kpa" => Some(1e3),
        "mpa" => Some(1e6),
        "gpa" => Some(1e9),
        "psi" => Some(lbf / (inch * inch)),
        "ksi" => Some(kip / (inch * inch)),
        "psf" => Some(lbf / (foot * foot)),
        "ksf" => Some(kip / (foot * foot)),
        _ => None,
    };
    if let Some(factor) = named {
        return Ok(factor);
    }
    let (force, length) = ratio(&u, unit)?;
    let force: ForceUnit = force.parse()?;
    let length = length_term(length, 2)?;
    Ok(force.in_newtons() / length.in_meters().powi(2))
}

/// kg/m³ represented by one unit of the given mass-density unit string
pub fn kilograms_per_cubic_meter(unit: &str) -> CalcResult<f64> {
    let u = normalize(unit);
    let (mass, length) = ratio(&u, unit)?;
    let kg = match mass {
        "kg" => 1.0,
        "g" => 1e-3,
        "t" => 1e3,
        "lbm" | "lb" => 0.453_592_37,
        _ => return Err(CalcError::UnknownUnit(unit.to_string())),
    };
    let length = length_term(length, 3)?;
    Ok(kg / length.in_meters().powi(3))
}

/// N/m³ represented by one unit of the given unit-weight string
pub fn newtons_per_cubic_meter(unit: &str) -> CalcResult<f64> {
    let u = normalize(unit);
    let (force, length) = ratio(&u, unit)?;
    let force: ForceUnit = force.parse()?;
    let length = length_term(length, 3)?;
    Ok(force.in_newtons() / length.in_meters().powi(3))
}

/// Parse a line-load unit such as "kN/m" into its force and length parts
pub fn parse_line_load_unit(unit: &str) -> CalcResult<(ForceUnit, LengthUnit)> {
    let u = normalize(unit);
    let (force, length) = ratio(&u, unit)?;
    Ok((force.parse()?, length_term(length, 1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stress_units() {
        let mm_kn = UnitSystem::new(LengthUnit::Mm, ForceUnit::KN);
        // 200 GPa = 200 kN/mm²
        let e = Quantity::new(200.0, "GPa").to_stress(&mm_kn).unwrap();
        assert_relative_eq!(e, 200.0, epsilon = 1e-9);

        let e = Quantity::new(200_000.0, "N/mm^2").to_stress(&mm_kn).unwrap();
        assert_relative_eq!(e, 200.0, epsilon = 1e-9);

        let m_kn = UnitSystem::new(LengthUnit::M, ForceUnit::KN);
        let p = Quantity::new(2.5, "kPa").to_stress(&m_kn).unwrap();
        assert_relative_eq!(p, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_density_goes_through_tonnes() {
        let m_kn = UnitSystem::new(LengthUnit::M, ForceUnit::KN);
        let w = Quantity::new(7850.0, "kg/m^3").to_unit_weight(&m_kn).unwrap();
        assert_relative_eq!(w, 7.85 * STANDARD_GRAVITY, epsilon = 1e-9);

        // Already a unit weight
        let w = Quantity::new(78.5, "kN/m³").to_unit_weight(&m_kn).unwrap();
        assert_relative_eq!(w, 78.5, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        assert!(pascals_per("furlong").is_err());
        assert!(kilograms_per_cubic_meter("kg/m^2").is_err());
        assert!("parsec".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn test_line_load_conversion() {
        let mm_kn = UnitSystem::new(LengthUnit::Mm, ForceUnit::KN);
        let (f, l) = parse_line_load_unit("kN/m").unwrap();
        assert_relative_eq!(mm_kn.line_load(10.0, f, l), 0.01, epsilon = 1e-12);
    }
}
