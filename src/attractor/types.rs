use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Nombre maximal de coefficients (carte quadratique: 6 par coordonnée).
pub const MAX_COEFFICIENTS: usize = 12;

/// Point du plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Familles de cartes prises en charge.
///
/// Chaque famille calcule (x', y') à partir du seul point précédent et
/// de coefficients fixes (système dynamique du premier ordre).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapFamily {
    /// x' = sin(a·y) + c·cos(a·x), y' = sin(b·x) + d·cos(b·y)
    Clifford,
    /// x' = sin(a·y) − cos(b·x), y' = sin(c·x) − cos(d·y)
    #[serde(rename = "dejong", alias = "de-jong")]
    DeJong,
    /// x' = d·sin(a·x) − sin(b·y), y' = c·cos(a·x) + cos(b·y)
    Svensson,
    /// x' = a − x² + b·y, y' = x
    Simon,
    /// x' = sin(x² − y² + a), y' = cos(2·x·y + b)
    SineCosine,
    /// Polynôme du second degré en x et y pour chaque coordonnée (6 + 6 coefficients).
    Quadratic,
}

impl MapFamily {
    pub fn all() -> &'static [MapFamily] {
        &[
            MapFamily::Clifford,
            MapFamily::DeJong,
            MapFamily::Svensson,
            MapFamily::Simon,
            MapFamily::SineCosine,
            MapFamily::Quadratic,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            MapFamily::Clifford => "Clifford",
            MapFamily::DeJong => "De Jong",
            MapFamily::Svensson => "Svensson",
            MapFamily::Simon => "Simon",
            MapFamily::SineCosine => "Sine/Cosine",
            MapFamily::Quadratic => "Quadratic",
        }
    }

    pub fn cli_name(self) -> &'static str {
        match self {
            MapFamily::Clifford => "clifford",
            MapFamily::DeJong => "dejong",
            MapFamily::Svensson => "svensson",
            MapFamily::Simon => "simon",
            MapFamily::SineCosine => "sine-cosine",
            MapFamily::Quadratic => "quadratic",
        }
    }

    pub fn from_cli_name(value: &str) -> Option<Self> {
        let wanted = value.trim().to_lowercase();
        // Alias historiques
        let wanted = match wanted.as_str() {
            "de-jong" => "dejong",
            "sinecosine" | "sincos" | "coaster" => "sine-cosine",
            "polynomial" => "quadratic",
            other => other,
        };
        MapFamily::all().iter().copied().find(|f| f.cli_name() == wanted)
    }

    /// Nombre de coefficients attendus.
    pub fn arity(self) -> usize {
        match self {
            MapFamily::Clifford | MapFamily::DeJong | MapFamily::Svensson => 4,
            MapFamily::Simon | MapFamily::SineCosine => 2,
            MapFamily::Quadratic => MAX_COEFFICIENTS,
        }
    }
}

impl std::str::FromStr for MapFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_cli_name(s).ok_or_else(|| Error::UnknownFamily(s.to_string()))
    }
}

/// Famille + coefficients. Immuable pendant la génération.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapParams {
    family: MapFamily,
    coefficients: [f64; MAX_COEFFICIENTS],
}

impl MapParams {
    /// Construit les paramètres en vérifiant l'arité de la famille.
    pub fn new(family: MapFamily, coefficients: &[f64]) -> Result<Self> {
        let expected = family.arity();
        if coefficients.len() != expected {
            return Err(Error::Arity {
                family,
                expected,
                got: coefficients.len(),
            });
        }
        let mut fixed = [0.0; MAX_COEFFICIENTS];
        fixed[..expected].copy_from_slice(coefficients);
        Ok(Self {
            family,
            coefficients: fixed,
        })
    }

    pub fn family(&self) -> MapFamily {
        self.family
    }

    /// Coefficients significatifs (longueur = arité).
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients[..self.family.arity()]
    }

    /// Libellé court, ex. "a=-1.400 b=1.600 c=1.000 d=0.700".
    pub fn label(&self) -> String {
        const NAMES: [&str; 4] = ["a", "b", "c", "d"];
        let coeffs = self.coefficients();
        if coeffs.len() <= NAMES.len() {
            coeffs
                .iter()
                .zip(NAMES)
                .map(|(v, n)| format!("{n}={v:.3}"))
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            coeffs
                .iter()
                .map(|v| format!("{v:.3}"))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}
