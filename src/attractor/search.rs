//! Recherche aléatoire de coefficients produisant un attracteur intéressant.
//!
//! Boucle bornée: chaque tentative tire des coefficients uniformément dans
//! les plages configurées, génère une trajectoire depuis un point initial neuf
//! et s'arrête à la première trajectoire acceptée.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::attractor::definitions::default_ranges;
use crate::attractor::trajectory::RepetitionCheck;
use crate::attractor::{generate, GeneratorConfig, MapFamily, MapParams, Point, Termination, Trajectory};
use crate::error::{Error, Result};

/// Critères d'acceptation d'une trajectoire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Acceptance {
    /// Refuse les trajectoires tronquées (divergence ou échappement).
    pub require_completed: bool,
    /// Nombre minimal de points hors transitoire.
    pub min_points: usize,
    /// Étendue (min, max) exclusive que x et y doivent respecter.
    pub span: Option<(f64, f64)>,
}

impl Default for Acceptance {
    fn default() -> Self {
        Self {
            require_completed: true,
            min_points: 20_000,
            span: Some((0.5, 20.0)),
        }
    }
}

impl Acceptance {
    pub fn accepts(&self, trajectory: &Trajectory) -> bool {
        match trajectory.termination() {
            Termination::Completed => {}
            Termination::Diverged { .. } | Termination::Escaped { .. } => {
                if self.require_completed {
                    return false;
                }
            }
            Termination::Degenerate { .. } | Termination::Repetitive { .. } => return false,
        }

        if trajectory.rendered().len() < self.min_points {
            return false;
        }

        match self.span {
            None => true,
            Some((lo, hi)) => match trajectory.bounds() {
                Some(b) => {
                    let inside = |s: f64| s > lo && s < hi;
                    inside(b.span_x()) && inside(b.span_y())
                }
                None => false,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub family: MapFamily,
    /// Plages par coefficient; par défaut celles de la famille.
    pub ranges: Option<Vec<(f64, f64)>>,
    /// Nombre maximal de tentatives.
    pub attempts: usize,
    pub start: Point,
    pub generator: GeneratorConfig,
    pub acceptance: Acceptance,
    pub seed: Option<u64>,
    /// Évalue les tentatives par lots en parallèle (rayon).
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            family: MapFamily::Clifford,
            ranges: None,
            attempts: 100,
            start: Point::new(0.0, 0.0),
            generator: GeneratorConfig {
                points: 100_000,
                repetition: Some(RepetitionCheck {
                    limit: 1000,
                    ..RepetitionCheck::default()
                }),
                ..GeneratorConfig::default()
            },
            acceptance: Acceptance::default(),
            seed: None,
            parallel: false,
        }
    }
}

/// Première tentative acceptée.
#[derive(Clone, Debug)]
pub struct SearchSuccess {
    /// Index (à partir de 0) de la tentative retenue.
    pub attempt: usize,
    pub params: MapParams,
    pub trajectory: Trajectory,
}

/// Lance la recherche avec le générateur standard.
pub fn search(config: &SearchConfig) -> Result<SearchSuccess> {
    search_by(config, |params, start, generator| generate(params, start, generator))
}

/// Recherche avec une fonction d'évaluation fournie.
pub(crate) fn search_by<E>(config: &SearchConfig, evaluate: E) -> Result<SearchSuccess>
where
    E: Fn(&MapParams, Point, &GeneratorConfig) -> Trajectory + Sync,
{
    let ranges = resolve_ranges(config)?;
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    log::info!(
        "searching {} coefficients: {} attempts max, seed {seed}",
        config.family.name(),
        config.attempts
    );

    let run = |attempt: usize| -> Result<Option<SearchSuccess>> {
        let coefficients = sample_coefficients(&ranges, seed, attempt);
        let params = MapParams::new(config.family, &coefficients)?;
        let trajectory = evaluate(&params, config.start, &config.generator);
        let accepted = config.acceptance.accepts(&trajectory);
        log::info!(
            "attempt {}/{}: {} -> {} ({} points){}",
            attempt + 1,
            config.attempts,
            params.label(),
            trajectory.termination(),
            trajectory.len(),
            if accepted { ", accepted" } else { "" }
        );
        Ok(accepted.then_some(SearchSuccess {
            attempt,
            params,
            trajectory,
        }))
    };

    if config.parallel {
        let batch = rayon::current_num_threads().max(1);
        let mut next = 0;
        while next < config.attempts {
            let end = (next + batch).min(config.attempts);
            let results: Vec<Result<Option<SearchSuccess>>> =
                (next..end).into_par_iter().map(&run).collect();
            // Résultats dans l'ordre des tentatives: la première acceptée gagne.
            for result in results {
                if let Some(success) = result? {
                    return Ok(success);
                }
            }
            next = end;
        }
    } else {
        for attempt in 0..config.attempts {
            if let Some(success) = run(attempt)? {
                return Ok(success);
            }
        }
    }

    log::warn!("no attractor accepted after {} attempts", config.attempts);
    Err(Error::SearchExhausted {
        attempts: config.attempts,
    })
}

fn resolve_ranges(config: &SearchConfig) -> Result<Vec<(f64, f64)>> {
    let ranges = config
        .ranges
        .clone()
        .unwrap_or_else(|| default_ranges(config.family));
    if ranges.len() != config.family.arity() {
        return Err(Error::Arity {
            family: config.family,
            expected: config.family.arity(),
            got: ranges.len(),
        });
    }
    ranges
        .into_iter()
        .enumerate()
        .map(|(index, (a, b))| {
            // La largeur elle-même doit être finie pour l'échantillonnage uniforme
            if a.is_finite() && b.is_finite() && (a - b).abs().is_finite() {
                Ok((a.min(b), a.max(b)))
            } else {
                Err(Error::InvalidRange { index, lo: a, hi: b })
            }
        })
        .collect()
}

/// Générateur propre à une tentative: le tirage ne dépend que de (seed, attempt),
/// ce qui rend les modes séquentiel et parallèle équivalents.
fn attempt_rng(seed: u64, attempt: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn sample_coefficients(ranges: &[(f64, f64)], seed: u64, attempt: usize) -> Vec<f64> {
    let mut rng = attempt_rng(seed, attempt);
    ranges
        .iter()
        .map(|&(a, b)| {
            let (lo, hi) = (a.min(b), a.max(b));
            if lo == hi {
                lo
            } else {
                rng.random_range(lo..=hi)
            }
        })
        .collect()
}
