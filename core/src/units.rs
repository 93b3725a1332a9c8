//! Unit-string parsing and conversion factors.
//!
//! Axis coordinates and data values are stored on disk in a native unit and
//! shown to the user in a display unit. The converter turns a pair of unit
//! strings into a single multiplicative factor such that
//! `display_value = native_value * factor`.
//!
//! Units are parsed against a table of known symbols with standard SI-prefix
//! handling (`cm`, `MHz`, `keV`, ...). Conversion between two units is only
//! allowed when their physical dimensions match; `cm -> parsec` is valid,
//! `cm -> kg` is not.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DataViewError, Result};

/// Exponents of the seven SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminosity: i8,
}

const fn dim(l: i8, m: i8, t: i8, i: i8, th: i8, n: i8, j: i8) -> Dimension {
    Dimension {
        length: l,
        mass: m,
        time: t,
        current: i,
        temperature: th,
        amount: n,
        luminosity: j,
    }
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = dim(0, 0, 0, 0, 0, 0, 0);

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }
}

/// A unit string resolved to its dimension and its scale relative to the
/// coherent SI unit of that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedUnit {
    pub dimension: Dimension,
    pub si_scale: f64,
}

/// Known unit symbols.
///
/// Returns `(dimension, scale to SI, accepts SI prefixes)`. Exact symbols are
/// matched before any prefix splitting, so `min` is minutes rather than
/// milli-inches and `Pa` is pascal rather than peta-ampere.
fn base_unit(symbol: &str) -> Option<(Dimension, f64, bool)> {
    let entry = match symbol {
        // SI base units
        "m" => (dim(1, 0, 0, 0, 0, 0, 0), 1.0, true),
        "g" => (dim(0, 1, 0, 0, 0, 0, 0), 1e-3, true),
        "s" => (dim(0, 0, 1, 0, 0, 0, 0), 1.0, true),
        "A" => (dim(0, 0, 0, 1, 0, 0, 0), 1.0, true),
        "K" => (dim(0, 0, 0, 0, 1, 0, 0), 1.0, true),
        "mol" => (dim(0, 0, 0, 0, 0, 1, 0), 1.0, true),
        "cd" => (dim(0, 0, 0, 0, 0, 0, 1), 1.0, true),

        // Derived units
        "Hz" => (dim(0, 0, -1, 0, 0, 0, 0), 1.0, true),
        "N" => (dim(1, 1, -2, 0, 0, 0, 0), 1.0, true),
        "Pa" => (dim(-1, 1, -2, 0, 0, 0, 0), 1.0, true),
        "bar" => (dim(-1, 1, -2, 0, 0, 0, 0), 1e5, true),
        "J" => (dim(2, 1, -2, 0, 0, 0, 0), 1.0, true),
        "eV" => (dim(2, 1, -2, 0, 0, 0, 0), 1.602_176_634e-19, true),
        "W" => (dim(2, 1, -3, 0, 0, 0, 0), 1.0, true),
        "V" => (dim(2, 1, -3, -1, 0, 0, 0), 1.0, true),
        "C" => (dim(0, 0, 1, 1, 0, 0, 0), 1.0, true),
        "T" => (dim(0, 1, -2, -1, 0, 0, 0), 1.0, true),
        "G" => (dim(0, 1, -2, -1, 0, 0, 0), 1e-4, true),
        "L" => (dim(3, 0, 0, 0, 0, 0, 0), 1e-3, true),

        // Time on laboratory scales
        "min" => (dim(0, 0, 1, 0, 0, 0, 0), 60.0, false),
        "h" => (dim(0, 0, 1, 0, 0, 0, 0), 3600.0, false),
        "hr" => (dim(0, 0, 1, 0, 0, 0, 0), 3600.0, false),
        "day" => (dim(0, 0, 1, 0, 0, 0, 0), 86_400.0, false),

        // Length aliases
        "micron" => (dim(1, 0, 0, 0, 0, 0, 0), 1e-6, false),
        "angstrom" => (dim(1, 0, 0, 0, 0, 0, 0), 1e-10, false),
        "Å" => (dim(1, 0, 0, 0, 0, 0, 0), 1e-10, false),
        "au" => (dim(1, 0, 0, 0, 0, 0, 0), 1.495_978_707e11, false),
        "pc" => (dim(1, 0, 0, 0, 0, 0, 0), 3.085_677_581_491_367e16, true),
        "parsec" => (dim(1, 0, 0, 0, 0, 0, 0), 3.085_677_581_491_367e16, false),

        // Dimensionless
        "rad" => (Dimension::DIMENSIONLESS, 1.0, false),
        "deg" => (Dimension::DIMENSIONLESS, std::f64::consts::PI / 180.0, false),
        "counts" => (Dimension::DIMENSIONLESS, 1.0, false),
        "arb" => (Dimension::DIMENSIONLESS, 1.0, false),

        _ => return None,
    };
    Some(entry)
}

/// SI prefixes, longest symbol first so `da` wins over `d`.
const PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
    ("z", 1e-21),
    ("y", 1e-24),
];

/// Converts scalar quantities between unit strings.
///
/// Stateless apart from a cache of already-parsed unit strings, so repeated
/// conversions during interactive use stay cheap.
#[derive(Debug, Clone, Default)]
pub struct UnitConverter {
    cache: HashMap<String, ParsedUnit>,
}

impl UnitConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a unit string to its dimension and SI scale.
    ///
    /// An empty string is treated as dimensionless with scale 1.
    ///
    /// # Errors
    /// Returns `InvalidUnit` when the string matches neither a known symbol
    /// nor a prefix + prefixable symbol.
    pub fn parse(&mut self, unit: &str) -> Result<ParsedUnit> {
        let trimmed = unit.trim();
        if let Some(parsed) = self.cache.get(trimmed) {
            return Ok(*parsed);
        }
        let parsed = parse_symbol(trimmed).ok_or_else(|| DataViewError::InvalidUnit {
            unit: unit.to_string(),
        })?;
        self.cache.insert(trimmed.to_string(), parsed);
        Ok(parsed)
    }

    /// Multiplicative factor such that `target_value = native_value * factor`.
    ///
    /// # Errors
    /// Returns `InvalidUnit` when either string does not parse, and
    /// `IncommensurableUnits` when the two units have different dimensions.
    pub fn factor(&mut self, native_unit: &str, target_unit: &str) -> Result<f64> {
        let from = self.parse(native_unit)?;
        let to = self.parse(target_unit)?;
        if from.dimension != to.dimension {
            return Err(DataViewError::IncommensurableUnits {
                from: native_unit.to_string(),
                to: target_unit.to_string(),
            });
        }
        Ok(from.si_scale / to.si_scale)
    }
}

fn parse_symbol(symbol: &str) -> Option<ParsedUnit> {
    if symbol.is_empty() {
        return Some(ParsedUnit {
            dimension: Dimension::DIMENSIONLESS,
            si_scale: 1.0,
        });
    }

    if let Some((dimension, si_scale, _)) = base_unit(symbol) {
        return Some(ParsedUnit {
            dimension,
            si_scale,
        });
    }

    for (prefix, scale) in PREFIXES {
        if let Some(rest) = symbol.strip_prefix(prefix) {
            if rest.is_empty() {
                continue;
            }
            if let Some((dimension, si_scale, prefixable)) = base_unit(rest) {
                if prefixable {
                    return Some(ParsedUnit {
                        dimension,
                        si_scale: si_scale * scale,
                    });
                }
            }
        }
    }

    None
}
