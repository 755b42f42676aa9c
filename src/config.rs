//! Fichier de configuration TOML d'une exécution.
//!
//! Toutes les sections sont optionnelles:
//!
//! ```toml
//! [map]
//! family = "clifford"
//! coefficients = [-1.4, 1.6, 1.0, 0.7]
//! start = { x = 0.0, y = 0.0 }
//!
//! [generator]
//! points = 500000
//!
//! [render]
//! width = 1200
//! height = 1200
//!
//! [output]
//! png = "clifford.png"
//! style = "ocean"
//! ```
//!
//! `[generator]` règle `render`. La recherche lit `[search.generator]`; en son
//! absence elle garde ses propres défauts (trajectoires plus courtes, détection
//! des répétitions).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::attractor::definitions::default_preset_for_family;
use crate::attractor::{find_preset, GeneratorConfig, MapFamily, MapParams, Point, SearchConfig};
use crate::color::Style;
use crate::error::{Error, Result};
use crate::io::csv::DEFAULT_PRECISION;
use crate::render::RenderConfig;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub map: MapSection,
    /// Générateur de `render`.
    pub generator: GeneratorConfig,
    pub render: RenderConfig,
    /// Réglages de `search`, générateur compris (`[search.generator]`).
    pub search: SearchConfig,
    pub output: OutputSection,
}

/// Carte à itérer: un preset, ou une famille et ses coefficients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSection {
    pub preset: Option<String>,
    pub family: MapFamily,
    pub coefficients: Option<Vec<f64>>,
    pub start: Option<Point>,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            preset: None,
            family: MapFamily::Clifford,
            coefficients: None,
            start: None,
        }
    }
}

/// Carte résolue, prête pour le générateur.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedMap {
    pub params: MapParams,
    pub start: Point,
    /// Style suggéré par le preset, s'il y en a un.
    pub style: Option<Style>,
}

impl MapSection {
    /// Résout la carte. Les coefficients explicites priment sur le preset;
    /// sans l'un ni l'autre, le premier preset de la famille est utilisé.
    pub fn resolve(&self) -> Result<ResolvedMap> {
        let preset = match &self.preset {
            Some(name) => Some(find_preset(name)?),
            None if self.coefficients.is_none() => default_preset_for_family(self.family),
            None => None,
        };

        let params = match (&self.coefficients, preset) {
            (Some(coefficients), Some(p)) => MapParams::new(p.family, coefficients)?,
            (Some(coefficients), None) => MapParams::new(self.family, coefficients)?,
            (None, Some(p)) => p.params()?,
            (None, None) => {
                return Err(Error::Arity {
                    family: self.family,
                    expected: self.family.arity(),
                    got: 0,
                })
            }
        };

        Ok(ResolvedMap {
            params,
            start: self
                .start
                .or(preset.map(|p| p.start))
                .unwrap_or_default(),
            style: preset.map(|p| p.style),
        })
    }
}

/// Fichiers produits et apparence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub png: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    /// Décimales écrites dans le CSV.
    pub precision: usize,
    /// Un point exporté sur `csv_stride`.
    pub csv_stride: usize,
    pub style: Option<Style>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            png: None,
            csv: None,
            precision: DEFAULT_PRECISION,
            csv_stride: 1,
            style: None,
        }
    }
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let text = fs::read_to_string(path)?;
    let config = toml::from_str(&text).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("configuration loaded from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: RunConfig = toml::from_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.output.precision, 3);
        assert_eq!(config.generator.points, 1_000_000);
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
            [map]
            family = "dejong"
            coefficients = [2.01, -2.53, 1.61, -0.33]

            [generator]
            points = 5000
            transient = 10

            [render]
            width = 640

            [search]
            attempts = 7
            parallel = true

            [search.acceptance]
            min_points = 100

            [output]
            png = "out.png"
            style = "purple-dream"
        "#;
        let config: RunConfig = toml::from_str(text).unwrap();
        assert_eq!(config.map.family, MapFamily::DeJong);
        assert_eq!(config.generator.points, 5000);
        assert_eq!(config.generator.transient, 10);
        assert_eq!(config.generator.escape_bound, Some(100.0));
        assert_eq!(config.render.width, 640);
        assert_eq!(config.render.height, 2000);
        assert_eq!(config.search.attempts, 7);
        assert!(config.search.parallel);
        assert_eq!(config.search.acceptance.min_points, 100);
        assert!(config.search.acceptance.require_completed);
        assert_eq!(config.output.png, Some(PathBuf::from("out.png")));
        assert_eq!(config.output.style, Some(Style::PurpleDream));

        let resolved = config.map.resolve().unwrap();
        assert_eq!(resolved.params.family(), MapFamily::DeJong);
        assert_eq!(resolved.start, Point::new(0.0, 0.0));
        assert_eq!(resolved.style, None);
    }

    #[test]
    fn test_search_has_its_own_generator() {
        let text = r#"
            [generator]
            points = 5000

            [search.generator]
            transient = 50
        "#;
        let config: RunConfig = toml::from_str(text).unwrap();
        assert_eq!(config.generator.points, 5000);
        assert_eq!(config.search.generator.transient, 50);

        let only_top: RunConfig = toml::from_str("[generator]\npoints = 5000\n").unwrap();
        assert_eq!(only_top.search, SearchConfig::default());
    }

    #[test]
    fn test_resolve_preset() {
        let section = MapSection {
            preset: Some("simon-1.4".to_string()),
            ..MapSection::default()
        };
        let resolved = section.resolve().unwrap();
        assert_eq!(resolved.params.family(), MapFamily::Simon);
        assert_eq!(resolved.params.coefficients(), &[1.4, 0.3]);
        assert_eq!(resolved.start, Point::new(0.1, 0.1));
        assert_eq!(resolved.style, Some(Style::Plasma));
    }

    #[test]
    fn test_coefficients_override_preset() {
        let section = MapSection {
            preset: Some("simon-1.4".to_string()),
            coefficients: Some(vec![1.2, 0.3]),
            start: Some(Point::new(0.5, 0.0)),
            ..MapSection::default()
        };
        let resolved = section.resolve().unwrap();
        assert_eq!(resolved.params.coefficients(), &[1.2, 0.3]);
        assert_eq!(resolved.start, Point::new(0.5, 0.0));
    }

    #[test]
    fn test_resolve_errors() {
        let wrong_arity = MapSection {
            coefficients: Some(vec![1.0]),
            ..MapSection::default()
        };
        assert!(matches!(wrong_arity.resolve(), Err(Error::Arity { got: 1, .. })));

        let unknown = MapSection {
            preset: Some("nope".to_string()),
            ..MapSection::default()
        };
        assert!(matches!(unknown.resolve(), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn test_family_default_preset() {
        let resolved = MapSection::default().resolve().unwrap();
        assert_eq!(resolved.params.family(), MapFamily::Clifford);
        assert!(resolved.style.is_some());
    }

    #[test]
    fn test_load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[render]\nwidth = \"large\"\n").unwrap();
        match load_config(&path) {
            Err(Error::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }

        let good = dir.path().join("good.toml");
        fs::write(&good, "[output]\nprecision = 6\n").unwrap();
        assert_eq!(load_config(&good).unwrap().output.precision, 6);
    }
}
