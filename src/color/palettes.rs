use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Couleur RGB 8 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const fn rgb(hex: u32) -> Rgb {
    Rgb {
        r: ((hex >> 16) & 0xFF) as u8,
        g: ((hex >> 8) & 0xFF) as u8,
        b: (hex & 0xFF) as u8,
    }
}

/// Styles de rendu disponibles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    PurpleDream,
    Sunset,
    Ocean,
    Fire,
    Forest,
    Monochrome,
    /// Orange → or sur fond noir
    #[default]
    Ember,
    Orange,
    Red,
    Pink,
    Blue,
    Plasma,
    Viridis,
}

/// Description figée d'un style.
#[derive(Clone, Copy, Debug)]
pub struct StyleDescriptor {
    pub name: &'static str,
    /// Arrêts du gradient, également espacés de 0 à 1.
    pub colors: &'static [Rgb],
    /// Opacité au premier et au dernier point.
    pub alpha_range: (f32, f32),
    pub point_size: f32,
    /// Taille croissante de 50 % à 100 % le long de la trajectoire.
    pub size_ramp: bool,
    pub background: Rgb,
}

const BLACK: Rgb = rgb(0x000000);
const WHITE: Rgb = rgb(0xFFFFFF);

const PURPLE_DREAM_COLORS: [Rgb; 4] = [rgb(0x000033), rgb(0x4B0082), rgb(0x9370DB), rgb(0xDDA0DD)];
const SUNSET_COLORS: [Rgb; 4] = [rgb(0x8B0000), rgb(0xFF4500), rgb(0xFFD700), rgb(0xFFF8DC)];
const OCEAN_COLORS: [Rgb; 4] = [rgb(0x000080), rgb(0x0000FF), rgb(0x00BFFF), rgb(0x87CEEB)];
const FIRE_COLORS: [Rgb; 4] = [rgb(0x8B0000), rgb(0xDC143C), rgb(0xFF6347), rgb(0xFFD700)];
const FOREST_COLORS: [Rgb; 4] = [rgb(0x013220), rgb(0x228B22), rgb(0x32CD32), rgb(0x90EE90)];
const MONOCHROME_COLORS: [Rgb; 1] = [WHITE];
const EMBER_COLORS: [Rgb; 2] = [rgb(0xFF4500), rgb(0xFFD700)];

// Gradients clairs sur fond blanc, avec rampe d'opacité
const ORANGE_COLORS: [Rgb; 4] = [rgb(0xFFF8E1), rgb(0xFFE082), rgb(0xFF8F00), rgb(0xE65100)];
const RED_COLORS: [Rgb; 5] = [rgb(0xFFEBEE), rgb(0xFFCDD2), rgb(0xE57373), rgb(0xC62828), rgb(0x8B0000)];
const PINK_COLORS: [Rgb; 4] = [rgb(0xFCE4EC), rgb(0xF8BBD9), rgb(0xE91E63), rgb(0xAD1457)];
const BLUE_COLORS: [Rgb; 4] = [rgb(0xE3F2FD), rgb(0x90CAF9), rgb(0x2196F3), rgb(0x0D47A1)];

// Approximations des colormaps matplotlib
const PLASMA_COLORS: [Rgb; 5] = [rgb(0x0D0887), rgb(0x7E03A8), rgb(0xCC4778), rgb(0xF89540), rgb(0xF0F921)];
const VIRIDIS_COLORS: [Rgb; 5] = [rgb(0x440154), rgb(0x3B528B), rgb(0x21918C), rgb(0x5EC962), rgb(0xFDE725)];

const fn dark(name: &'static str, colors: &'static [Rgb], alpha: f32) -> StyleDescriptor {
    StyleDescriptor {
        name,
        colors,
        alpha_range: (alpha, alpha),
        point_size: 0.1,
        size_ramp: false,
        background: BLACK,
    }
}

const fn light(name: &'static str, colors: &'static [Rgb], alpha_range: (f32, f32), point_size: f32) -> StyleDescriptor {
    StyleDescriptor {
        name,
        colors,
        alpha_range,
        point_size,
        size_ramp: true,
        background: WHITE,
    }
}

const PURPLE_DREAM: StyleDescriptor = dark("purple-dream", &PURPLE_DREAM_COLORS, 0.15);
const SUNSET: StyleDescriptor = dark("sunset", &SUNSET_COLORS, 0.12);
const OCEAN: StyleDescriptor = dark("ocean", &OCEAN_COLORS, 0.15);
const FIRE: StyleDescriptor = dark("fire", &FIRE_COLORS, 0.1);
const FOREST: StyleDescriptor = dark("forest", &FOREST_COLORS, 0.12);
const MONOCHROME: StyleDescriptor = dark("monochrome", &MONOCHROME_COLORS, 0.05);
const EMBER: StyleDescriptor = dark("ember", &EMBER_COLORS, 0.1);
const ORANGE: StyleDescriptor = light("orange", &ORANGE_COLORS, (0.1, 0.8), 0.5);
const RED: StyleDescriptor = light("red", &RED_COLORS, (0.05, 0.6), 0.3);
const PINK: StyleDescriptor = light("pink", &PINK_COLORS, (0.1, 0.7), 0.4);
const BLUE: StyleDescriptor = light("blue", &BLUE_COLORS, (0.1, 0.8), 0.5);
const PLASMA: StyleDescriptor = StyleDescriptor {
    name: "plasma",
    colors: &PLASMA_COLORS,
    alpha_range: (0.8, 0.8),
    point_size: 0.1,
    size_ramp: false,
    background: BLACK,
};
const VIRIDIS: StyleDescriptor = StyleDescriptor {
    name: "viridis",
    colors: &VIRIDIS_COLORS,
    alpha_range: (0.15, 0.15),
    point_size: 0.1,
    size_ramp: false,
    background: WHITE,
};

impl Style {
    pub fn all() -> &'static [Style] {
        &[
            Style::PurpleDream,
            Style::Sunset,
            Style::Ocean,
            Style::Fire,
            Style::Forest,
            Style::Monochrome,
            Style::Ember,
            Style::Orange,
            Style::Red,
            Style::Pink,
            Style::Blue,
            Style::Plasma,
            Style::Viridis,
        ]
    }

    pub fn descriptor(self) -> &'static StyleDescriptor {
        match self {
            Style::PurpleDream => &PURPLE_DREAM,
            Style::Sunset => &SUNSET,
            Style::Ocean => &OCEAN,
            Style::Fire => &FIRE,
            Style::Forest => &FOREST,
            Style::Monochrome => &MONOCHROME,
            Style::Ember => &EMBER,
            Style::Orange => &ORANGE,
            Style::Red => &RED,
            Style::Pink => &PINK,
            Style::Blue => &BLUE,
            Style::Plasma => &PLASMA,
            Style::Viridis => &VIRIDIS,
        }
    }

    pub fn cli_name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn from_cli_name(value: &str) -> Option<Self> {
        let wanted = value.trim().to_lowercase().replace('_', "-");
        let wanted = if wanted == "default" { "ember".to_string() } else { wanted };
        Style::all().iter().copied().find(|s| s.cli_name() == wanted)
    }
}

impl std::str::FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_cli_name(s).ok_or_else(|| Error::UnknownStyle(s.to_string()))
    }
}

/// Interpole le gradient (arrêts également espacés) en `t` ∈ [0, 1].
pub fn gradient_interpolate(colors: &[Rgb], t: f64) -> Rgb {
    match colors {
        [] => WHITE,
        [only] => *only,
        _ => {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            let segments = (colors.len() - 1) as f64;
            let pos = t * segments;
            let idx = (pos.floor() as usize).min(colors.len() - 2);
            let factor = pos - idx as f64;
            let (a, b) = (colors[idx], colors[idx + 1]);
            let lerp = |u: u8, v: u8| -> u8 {
                let u = u as f64;
                let v = v as f64;
                (u + factor * (v - u)).round().clamp(0.0, 255.0) as u8
            };
            Rgb {
                r: lerp(a.r, b.r),
                g: lerp(a.g, b.g),
                b: lerp(a.b, b.b),
            }
        }
    }
}

/// Apparence d'un point de la trajectoire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub color: Rgb,
    pub alpha: f32,
    pub size: f32,
}

impl StyleDescriptor {
    /// Couleur, opacité et taille du point `index` parmi `count`.
    pub fn point_style(&self, index: usize, count: usize) -> PointStyle {
        let t = if count > 1 {
            index as f64 / (count - 1) as f64
        } else {
            0.0
        };
        let (lo, hi) = self.alpha_range;
        let size = if self.size_ramp {
            self.point_size * (0.5 + 0.5 * t as f32)
        } else {
            self.point_size
        };
        PointStyle {
            color: gradient_interpolate(self.colors, t),
            alpha: (lo + (hi - lo) * t as f32).clamp(0.0, 1.0),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        let colors = [rgb(0x000000), rgb(0xFF0000), rgb(0xFFFFFF)];
        assert_eq!(gradient_interpolate(&colors, 0.0), rgb(0x000000));
        assert_eq!(gradient_interpolate(&colors, 0.5), rgb(0xFF0000));
        assert_eq!(gradient_interpolate(&colors, 1.0), rgb(0xFFFFFF));
        assert_eq!(gradient_interpolate(&colors, 2.0), rgb(0xFFFFFF));
        assert_eq!(gradient_interpolate(&colors, 0.25), Rgb { r: 128, g: 0, b: 0 });
    }

    #[test]
    fn test_single_color() {
        assert_eq!(gradient_interpolate(&MONOCHROME_COLORS, 0.7), WHITE);
    }

    #[test]
    fn test_alpha_and_size_ramp() {
        let blue = Style::Blue.descriptor();
        let first = blue.point_style(0, 101);
        let last = blue.point_style(100, 101);
        assert!((first.alpha - 0.1).abs() < 1e-6);
        assert!((last.alpha - 0.8).abs() < 1e-6);
        assert!((first.size - 0.25).abs() < 1e-6);
        assert!((last.size - 0.5).abs() < 1e-6);
        assert_eq!(first.color, BLUE_COLORS[0]);
        assert_eq!(last.color, BLUE_COLORS[3]);
    }

    #[test]
    fn test_constant_alpha() {
        let fire = Style::Fire.descriptor();
        assert_eq!(fire.point_style(0, 10).alpha, fire.point_style(9, 10).alpha);
        assert_eq!(fire.point_style(0, 10).size, fire.point_style(9, 10).size);
    }

    #[test]
    fn test_cli_names() {
        for style in Style::all() {
            assert_eq!(Style::from_cli_name(style.cli_name()), Some(*style));
        }
        assert_eq!(Style::from_cli_name("purple_dream"), Some(Style::PurpleDream));
        assert_eq!(Style::from_cli_name("default"), Some(Style::Ember));
        assert!("nope".parse::<Style>().is_err());
    }
}
