//! Physical unit names accepted for parameters named `unit`.
//!
//! Mirrors the toolkit's unit table: symbol and long forms for length,
//! area, volume, angle, time, frequency, charge, energy, mass, power,
//! force, pressure, current, potential, resistance, capacitance,
//! magnetic flux and field, inductance, temperature, amount of substance,
//! activity, dose, luminous quantities and dimensionless ratios.

use std::collections::HashSet;

use once_cell::sync::Lazy;

#[rustfmt::skip]
pub const UNITS: &[&str] = &[
    // length, area, volume
    "millimeter", "millimeter2", "millimeter3",
    "centimeter", "centimeter2", "centimeter3",
    "meter", "meter2", "meter3",
    "kilometer", "kilometer2", "kilometer3",
    "parsec", "micrometer", "nanometer", "angstrom", "fermi",
    "barn", "millibarn", "microbarn", "nanobarn", "picobarn",
    "mm", "um", "nm", "mm2", "mm3",
    "cm", "cm2", "cm3",
    "liter", "L", "dL", "cL", "mL",
    "m", "m2", "m3",
    "km", "km2", "km3",
    "pc",
    // angle
    "radian", "milliradian", "degree", "steradian",
    "rad", "mrad", "sr", "deg",
    // time, frequency
    "nanosecond", "second", "millisecond", "microsecond", "picosecond",
    "hertz", "kilohertz", "megahertz",
    "ns", "s", "ms",
    // charge
    "eplus", "e_SI", "coulomb",
    // energy
    "megaelectronvolt", "electronvolt", "kiloelectronvolt",
    "gigaelectronvolt", "teraelectronvolt", "petaelectronvolt", "joule",
    "MeV", "eV", "keV", "GeV", "TeV", "PeV",
    // mass
    "kilogram", "gram", "milligram",
    "kg", "g", "mg",
    // power, force, pressure
    "watt", "newton", "hep_pascal", "bar", "atmosphere",
    // electric current, potential, resistance, capacitance
    "ampere", "milliampere", "microampere", "nanoampere",
    "megavolt", "kilovolt", "volt", "ohm",
    "farad", "millifarad", "microfarad", "nanofarad", "picofarad",
    // magnetic flux, field, inductance
    "weber", "tesla", "gauss", "kilogauss", "henry",
    // temperature, amount of substance, activity, dose
    "kelvin", "mole", "becquerel", "curie", "gray",
    // luminous quantities
    "candela", "lumen", "lux",
    // ratios
    "perCent", "perThousand", "perMillion",
];

static UNIT_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| UNITS.iter().copied().collect());

/// Whether `name` is one of the known unit names (case-sensitive)
pub fn is_unit(name: &str) -> bool {
    UNIT_SET.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_units() {
        assert!(is_unit("cm"));
        assert!(is_unit("MeV"));
        assert!(is_unit("deg"));
        assert!(is_unit("perCent"));
    }

    #[test]
    fn test_unknown_units() {
        assert!(!is_unit("centimeters"));
        assert!(!is_unit("mev"));
        assert!(!is_unit(""));
    }
}
