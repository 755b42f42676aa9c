use crate::attractor::{MapFamily, MapParams, Point};
use crate::color::Style;
use crate::error::{Error, Result};

/// Jeu de paramètres nommé, avec son style et son point de départ suggérés.
#[derive(Clone, Copy, Debug)]
pub struct Preset {
    pub name: &'static str,
    pub family: MapFamily,
    pub coefficients: &'static [f64],
    pub start: Point,
    pub style: Style,
}

impl Preset {
    pub fn params(&self) -> Result<MapParams> {
        MapParams::new(self.family, self.coefficients)
    }
}

const ORIGIN: Point = Point::new(0.0, 0.0);

/// Coefficients de la carte quadratique "coaster" (x puis y, termes 1, x, x², xy, y, y²).
const COASTER_QUADRATIC: [f64; 12] = [
    -0.28752426, 0.65608465, 0.71259527, 1.34370624, 1.01724109, 0.19113889,
    -1.06839961, 0.29822047, 0.35672293, -0.68326573, 0.68020521, 1.18480771,
];

const PRESETS: &[Preset] = &[
    // Clifford
    Preset { name: "clifford-spiral", family: MapFamily::Clifford, coefficients: &[-1.4, 1.6, 1.0, 0.7], start: ORIGIN, style: Style::PurpleDream },
    Preset { name: "clifford-complex", family: MapFamily::Clifford, coefficients: &[-2.0, -2.0, -1.2, 2.0], start: ORIGIN, style: Style::Sunset },
    Preset { name: "clifford-circular", family: MapFamily::Clifford, coefficients: &[1.7, 1.7, 0.6, 1.2], start: ORIGIN, style: Style::Ocean },
    Preset { name: "clifford-dense", family: MapFamily::Clifford, coefficients: &[-1.8, -2.0, -0.5, -0.9], start: ORIGIN, style: Style::Fire },
    Preset { name: "clifford-flow", family: MapFamily::Clifford, coefficients: &[1.5, -1.8, 1.6, 0.9], start: ORIGIN, style: Style::Forest },
    // De Jong
    Preset { name: "dejong-classic", family: MapFamily::DeJong, coefficients: &[2.01, -2.53, 1.61, -0.33], start: ORIGIN, style: Style::PurpleDream },
    Preset { name: "dejong-butterfly", family: MapFamily::DeJong, coefficients: &[-2.7, -0.09, -0.86, -2.2], start: ORIGIN, style: Style::Sunset },
    Preset { name: "dejong-symmetric", family: MapFamily::DeJong, coefficients: &[1.641, 1.902, 0.316, 1.525], start: ORIGIN, style: Style::Fire },
    Preset { name: "dejong-web", family: MapFamily::DeJong, coefficients: &[-2.24, 0.43, -0.65, -2.43], start: ORIGIN, style: Style::Ocean },
    // Svensson
    Preset { name: "svensson-curves", family: MapFamily::Svensson, coefficients: &[1.4, 1.56, 1.4, -6.56], start: ORIGIN, style: Style::Ember },
    Preset { name: "svensson-dense", family: MapFamily::Svensson, coefficients: &[-1.78, -1.93, -1.44, -2.33], start: ORIGIN, style: Style::Forest },
    Preset { name: "svensson-simple", family: MapFamily::Svensson, coefficients: &[1.7, 1.8, 0.0, 1.0], start: ORIGIN, style: Style::Monochrome },
    // Simon
    Preset { name: "simon-1.1", family: MapFamily::Simon, coefficients: &[1.1, 0.3], start: Point::new(0.1, 0.1), style: Style::Plasma },
    Preset { name: "simon-1.3", family: MapFamily::Simon, coefficients: &[1.3, 0.3], start: Point::new(0.1, 0.1), style: Style::Plasma },
    Preset { name: "simon-1.4", family: MapFamily::Simon, coefficients: &[1.4, 0.3], start: Point::new(0.1, 0.1), style: Style::Plasma },
    // Sinus/cosinus
    Preset { name: "sincos-3.69-4.51", family: MapFamily::SineCosine, coefficients: &[3.69, 4.51], start: ORIGIN, style: Style::Orange },
    Preset { name: "sincos-3.61-m4.24", family: MapFamily::SineCosine, coefficients: &[3.61, -4.24], start: ORIGIN, style: Style::Blue },
    Preset { name: "sincos-0.29-4.0", family: MapFamily::SineCosine, coefficients: &[0.29, 4.0], start: ORIGIN, style: Style::Orange },
    Preset { name: "sincos-5.92-m2.89", family: MapFamily::SineCosine, coefficients: &[5.92, -2.89], start: ORIGIN, style: Style::Pink },
    // Quadratique
    Preset { name: "coaster", family: MapFamily::Quadratic, coefficients: &COASTER_QUADRATIC, start: Point::new(0.05, 0.05), style: Style::Red },
];

/// Tous les presets, dans l'ordre d'affichage.
pub fn presets() -> &'static [Preset] {
    PRESETS
}

pub fn find_preset(name: &str) -> Result<&'static Preset> {
    let wanted = name.trim().to_lowercase();
    PRESETS
        .iter()
        .find(|p| p.name == wanted)
        .ok_or_else(|| Error::UnknownPreset(name.to_string()))
}

/// Premier preset de la famille, utilisé quand aucun coefficient n'est fourni.
pub fn default_preset_for_family(family: MapFamily) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.family == family)
}

/// Plages d'échantillonnage par défaut (une par coefficient) pour la recherche aléatoire.
pub fn default_ranges(family: MapFamily) -> Vec<(f64, f64)> {
    match family {
        // ±2 plutôt que ±3 pour la stabilité
        MapFamily::Clifford => vec![(-2.0, 2.0); 4],
        MapFamily::DeJong => vec![(-3.0, 3.0); 4],
        MapFamily::Svensson => vec![(-3.0, 3.0); 4],
        MapFamily::Simon => vec![(1.0, 1.6), (0.3, 0.3)],
        MapFamily::SineCosine => vec![(-6.0, 6.0); 2],
        MapFamily::Quadratic => vec![(-1.2, 1.2); 12],
    }
}
