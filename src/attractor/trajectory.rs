//! Générateur de trajectoires.
//!
//! Itère une récurrence à partir d'un point initial et s'arrête dès que la
//! suite diverge (valeur non finie), s'échappe (|x| ou |y| au-delà d'une borne),
//! se fige sur un point fixe (étendue quasi nulle sur une fenêtre glissante)
//! ou se répète trop tôt (trop de points déjà vus, à une tolérance près).
//!
//! Aucun de ces cas n'est une erreur: ils sont rapportés dans [`Termination`]
//! et c'est à l'appelant (la recherche de paramètres) de décider de réessayer.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attractor::{Point, Recurrence};

/// Limite de pré-allocation du vecteur de points.
const PREALLOC_LIMIT: usize = 1 << 20;

/// Détection des répétitions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionCheck {
    /// Écart absolu maximal, par axe, pour considérer deux points égaux.
    pub tolerance: f64,
    /// Nombre de répétitions au-delà duquel la trajectoire est rejetée.
    pub limit: usize,
    /// Le rejet n'a lieu que si l'index courant est < fraction × points.
    pub completion_fraction: f64,
}

impl Default for RepetitionCheck {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            limit: 100_000,
            completion_fraction: 0.5,
        }
    }
}

/// Détection de convergence vers un point fixe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegenerateCheck {
    /// Taille de la fenêtre glissante (derniers points).
    pub window: usize,
    /// Étendue (max - min) sous laquelle un axe est considéré figé.
    pub threshold: f64,
    /// Nombre de points requis avant de commencer la vérification.
    pub warmup: usize,
}

impl Default for DegenerateCheck {
    fn default() -> Self {
        Self {
            window: 1000,
            threshold: 1e-3,
            warmup: 1000,
        }
    }
}

/// Paramètres du générateur.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Nombre maximal de points, point initial compris.
    pub points: usize,
    /// Points initiaux exclus du rendu et de l'export.
    pub transient: usize,
    pub escape_bound: Option<f64>,
    pub degenerate: Option<DegenerateCheck>,
    pub repetition: Option<RepetitionCheck>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            points: 1_000_000,
            transient: 1000,
            escape_bound: Some(100.0),
            degenerate: Some(DegenerateCheck::default()),
            repetition: None,
        }
    }
}

/// Raison de l'arrêt de la génération. `step` est l'index du point fautif.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Completed,
    Diverged { step: usize },
    Escaped { step: usize },
    Degenerate { step: usize },
    Repetitive { step: usize, repetitions: usize },
}

impl Termination {
    pub fn is_completed(self) -> bool {
        self == Termination::Completed
    }

}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Termination::Completed => write!(f, "completed"),
            Termination::Diverged { step } => write!(f, "diverged at step {step}"),
            Termination::Escaped { step } => write!(f, "escaped at step {step}"),
            Termination::Degenerate { step } => write!(f, "degenerate at step {step}"),
            Termination::Repetitive { step, repetitions } => {
                write!(f, "repetitive at step {step} ({repetitions} repetitions)")
            }
        }
    }
}

/// Boîte englobante d'un ensemble de points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    /// Boîte des points finis; `None` s'il n'y en a aucun.
    pub fn of(points: &[Point]) -> Option<Self> {
        points
            .iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<Bounds>, p| {
                Some(match acc {
                    None => Bounds {
                        xmin: p.x,
                        xmax: p.x,
                        ymin: p.y,
                        ymax: p.y,
                    },
                    Some(b) => Bounds {
                        xmin: b.xmin.min(p.x),
                        xmax: b.xmax.max(p.x),
                        ymin: b.ymin.min(p.y),
                        ymax: b.ymax.max(p.y),
                    },
                })
            })
    }

    pub fn span_x(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn span_y(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Résultat d'une génération. Immuable.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: Vec<Point>,
    termination: Termination,
    repetitions: usize,
    transient: usize,
}

impl Trajectory {
    /// Tous les points générés, transitoire compris.
    #[cfg(test)]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Points hors transitoire (ceux que l'on dessine / exporte).
    pub fn rendered(&self) -> &[Point] {
        &self.points[self.transient.min(self.points.len())..]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(self.rendered())
    }
}

/// Itère `map` depuis `start` selon `config`.
pub fn generate<R>(map: &R, start: Point, config: &GeneratorConfig) -> Trajectory
where
    R: Recurrence + ?Sized,
{
    let finish = |points: Vec<Point>, termination: Termination, repetitions: usize| {
        if !termination.is_completed() {
            log::debug!("trajectory stopped: {termination} after {} points", points.len());
        }
        Trajectory {
            points,
            termination,
            repetitions,
            transient: config.transient,
        }
    };

    if config.points == 0 {
        return finish(Vec::new(), Termination::Completed, 0);
    }
    if !start.is_finite() {
        return finish(Vec::new(), Termination::Diverged { step: 0 }, 0);
    }

    let mut points = Vec::with_capacity(config.points.min(PREALLOC_LIMIT));
    points.push(start);

    // Historique local à cet appel: rien ne fuit d'une tentative à l'autre.
    let mut history = config
        .repetition
        .map(|r| RepetitionIndex::new(r.tolerance));
    if let Some(index) = history.as_mut() {
        index.insert(start);
    }
    let mut window = config.degenerate.map(|d| SpreadWindow::new(d.window));
    if let Some(w) = window.as_mut() {
        w.push(start);
    }

    let mut repetitions = 0usize;
    let mut current = start;

    for i in 1..config.points {
        let next = map.step(current);

        if !next.is_finite() {
            return finish(points, Termination::Diverged { step: i }, repetitions);
        }

        if let Some(bound) = config.escape_bound {
            if next.x.abs() > bound || next.y.abs() > bound {
                return finish(points, Termination::Escaped { step: i }, repetitions);
            }
        }

        if let (Some(rep), Some(index)) = (config.repetition, history.as_mut()) {
            if index.contains(next) {
                repetitions += 1;
            }
            if repetitions > rep.limit && (i as f64) < config.points as f64 * rep.completion_fraction {
                return finish(
                    points,
                    Termination::Repetitive {
                        step: i,
                        repetitions,
                    },
                    repetitions,
                );
            }
            index.insert(next);
        }

        points.push(next);
        current = next;

        if let (Some(deg), Some(w)) = (config.degenerate, window.as_mut()) {
            w.push(next);
            if points.len() >= deg.warmup
                && w.is_full()
                && w.spread_x() < deg.threshold
                && w.spread_y() < deg.threshold
            {
                return finish(points, Termination::Degenerate { step: i }, repetitions);
            }
        }
    }

    finish(points, Termination::Completed, repetitions)
}

/// Index spatial des points déjà vus.
///
/// Grille de cellules de côté `tolerance`: deux points à moins de `tolerance`
/// sur chaque axe sont dans des cellules voisines, la recherche se limite
/// donc au voisinage 3×3 de la cellule du candidat.
struct RepetitionIndex {
    tolerance: f64,
    cells: HashMap<(i64, i64), Vec<Point>>,
}

impl RepetitionIndex {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cells: HashMap::new(),
        }
    }

    fn enabled(&self) -> bool {
        self.tolerance > 0.0 && self.tolerance.is_finite()
    }

    fn cell(&self, p: Point) -> (i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    fn insert(&mut self, p: Point) {
        if !self.enabled() {
            return;
        }
        let key = self.cell(p);
        self.cells.entry(key).or_default().push(p);
    }

    fn contains(&self, p: Point) -> bool {
        if !self.enabled() {
            return false;
        }
        let (cx, cy) = self.cell(p);
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                let key = (cx.saturating_add(dx), cy.saturating_add(dy));
                if let Some(bucket) = self.cells.get(&key) {
                    if bucket.iter().any(|q| {
                        (q.x - p.x).abs() < self.tolerance && (q.y - p.y).abs() < self.tolerance
                    }) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// Min/max glissants (files monotones), O(1) amorti par point.
struct SlidingExtrema {
    window: usize,
    count: usize,
    min: VecDeque<(usize, f64)>,
    max: VecDeque<(usize, f64)>,
}

impl SlidingExtrema {
    fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            count: 0,
            min: VecDeque::new(),
            max: VecDeque::new(),
        }
    }

    fn push(&mut self, value: f64) {
        let idx = self.count;
        self.count += 1;

        while self.min.back().is_some_and(|&(_, v)| v >= value) {
            self.min.pop_back();
        }
        self.min.push_back((idx, value));
        while self.max.back().is_some_and(|&(_, v)| v <= value) {
            self.max.pop_back();
        }
        self.max.push_back((idx, value));

        // Sortie de fenêtre
        let oldest = self.count.saturating_sub(self.window);
        while self.min.front().is_some_and(|&(i, _)| i < oldest) {
            self.min.pop_front();
        }
        while self.max.front().is_some_and(|&(i, _)| i < oldest) {
            self.max.pop_front();
        }
    }

    fn spread(&self) -> f64 {
        match (self.min.front(), self.max.front()) {
            (Some(&(_, lo)), Some(&(_, hi))) => hi - lo,
            _ => f64::INFINITY,
        }
    }

    fn is_full(&self) -> bool {
        self.count >= self.window
    }
}

struct SpreadWindow {
    x: SlidingExtrema,
    y: SlidingExtrema,
}

impl SpreadWindow {
    fn new(window: usize) -> Self {
        Self {
            x: SlidingExtrema::new(window),
            y: SlidingExtrema::new(window),
        }
    }

    fn push(&mut self, p: Point) {
        self.x.push(p.x);
        self.y.push(p.y);
    }

    fn is_full(&self) -> bool {
        self.x.is_full()
    }

    fn spread_x(&self) -> f64 {
        self.x.spread()
    }

    fn spread_y(&self) -> f64 {
        self.y.spread()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::attractor::{MapFamily, MapParams};

    fn bare(points: usize) -> GeneratorConfig {
        GeneratorConfig {
            points,
            transient: 0,
            escape_bound: None,
            degenerate: None,
            repetition: None,
        }
    }

    #[test]
    fn test_escape_is_reported_early() {
        // x' = 2 + x², rapidement > 100
        let mut k = [0.0; 12];
        k[0] = 2.0;
        k[2] = 1.0;
        let map = MapParams::new(MapFamily::Quadratic, &k).unwrap();
        let config = GeneratorConfig {
            escape_bound: Some(100.0),
            ..bare(10_000)
        };
        let t = generate(&map, Point::new(0.0, 0.0), &config);
        assert!(matches!(t.termination(), Termination::Escaped { .. }));
        assert!(t.len() < 10_000);
        assert!(t.points().iter().all(|p| p.x.abs() <= 100.0));
    }

    #[test]
    fn test_divergence_without_escape_bound() {
        let mut k = [0.0; 12];
        k[0] = 2.0;
        k[2] = 1.0;
        let map = MapParams::new(MapFamily::Quadratic, &k).unwrap();
        let t = generate(&map, Point::new(0.0, 0.0), &bare(10_000));
        assert!(matches!(t.termination(), Termination::Diverged { .. }));
        assert!(t.len() < 10_000);
        assert!(t.points().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_nan_is_diverged() {
        let map = |_: Point| Point::new(f64::NAN, 0.0);
        let t = generate(&map, Point::new(0.0, 0.0), &GeneratorConfig::default());
        assert_eq!(t.termination(), Termination::Diverged { step: 1 });
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_non_finite_start() {
        let map = |p: Point| p;
        let t = generate(&map, Point::new(f64::INFINITY, 0.0), &bare(10));
        assert_eq!(t.termination(), Termination::Diverged { step: 0 });
        assert!(t.is_empty());
    }

    #[test]
    fn test_fixed_point_is_degenerate_and_stops() {
        let calls = Cell::new(0usize);
        let map = |_: Point| {
            calls.set(calls.get() + 1);
            Point::new(0.0, 0.0)
        };
        let config = GeneratorConfig {
            degenerate: Some(DegenerateCheck::default()),
            ..bare(100_000)
        };
        let t = generate(&map, Point::new(0.0, 0.0), &config);
        assert_eq!(t.termination(), Termination::Degenerate { step: 999 });
        assert_eq!(t.len(), 1000);
        assert_eq!(calls.get(), 999);
    }

    #[test]
    fn test_zero_clifford_is_degenerate() {
        let map = MapParams::new(MapFamily::Clifford, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        let t = generate(&map, Point::new(0.3, 0.2), &GeneratorConfig {
            points: 50_000,
            ..GeneratorConfig::default()
        });
        assert!(matches!(t.termination(), Termination::Degenerate { .. }));
        assert!(t.len() < 50_000);
    }

    #[test]
    fn test_stable_clifford_completes() {
        let map = MapParams::new(MapFamily::Clifford, &[-1.4, 1.6, 1.0, 0.7]).unwrap();
        let config = GeneratorConfig {
            points: 10_000,
            transient: 0,
            ..GeneratorConfig::default()
        };
        let t = generate(&map, Point::new(0.0, 0.0), &config);
        assert_eq!(t.termination(), Termination::Completed);
        assert_eq!(t.len(), 10_000);
        assert!(t.points().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_stable_de_jong_completes_with_transient() {
        let map = MapParams::new(MapFamily::DeJong, &[2.01, -2.53, 1.61, -0.33]).unwrap();
        let config = GeneratorConfig {
            points: 10_000,
            transient: 1000,
            repetition: Some(RepetitionCheck::default()),
            ..GeneratorConfig::default()
        };
        let t = generate(&map, Point::new(0.0, 0.0), &config);
        assert_eq!(t.termination(), Termination::Completed);
        assert_eq!(t.len(), 10_000);
        assert_eq!(t.rendered().len(), 9_000);
        assert!(t.rendered().iter().all(|p| p.is_finite()));
    }

    fn alternate(p: Point) -> Point {
        if p.x < 0.5 {
            Point::new(1.0, 1.0)
        } else {
            Point::new(0.0, 0.0)
        }
    }

    #[test]
    fn test_period_two_is_repetitive() {
        let config = GeneratorConfig {
            repetition: Some(RepetitionCheck {
                tolerance: 1e-6,
                limit: 5,
                completion_fraction: 0.5,
            }),
            ..bare(1000)
        };
        let t = generate(&alternate, Point::new(0.0, 0.0), &config);
        assert_eq!(
            t.termination(),
            Termination::Repetitive {
                step: 7,
                repetitions: 6
            }
        );
        assert_eq!(t.len(), 7);
    }

    #[test]
    fn test_repetitions_counted_on_every_occurrence() {
        let config = GeneratorConfig {
            repetition: Some(RepetitionCheck {
                tolerance: 1e-6,
                limit: 1000,
                completion_fraction: 0.5,
            }),
            ..bare(20)
        };
        let t = generate(&alternate, Point::new(0.0, 0.0), &config);
        assert_eq!(t.termination(), Termination::Completed);
        // Index 0 et 1 sont nouveaux, 2..=19 sont des répétitions
        assert_eq!(t.repetitions(), 18);
    }

    #[test]
    fn test_late_repetitions_do_not_stop() {
        let config = GeneratorConfig {
            repetition: Some(RepetitionCheck {
                tolerance: 1e-6,
                limit: 5,
                completion_fraction: 0.1,
            }),
            ..bare(20)
        };
        let t = generate(&alternate, Point::new(0.0, 0.0), &config);
        assert_eq!(t.termination(), Termination::Completed);
        assert_eq!(t.len(), 20);
    }

    #[test]
    fn test_repetition_tolerance_is_per_axis() {
        let mut index = RepetitionIndex::new(1e-6);
        index.insert(Point::new(0.0, 0.0));
        assert!(index.contains(Point::new(5e-7, -5e-7)));
        assert!(!index.contains(Point::new(5e-7, 2e-6)));
        assert!(!index.contains(Point::new(2e-6, 0.0)));

        let mut coarse = RepetitionIndex::new(1.0);
        coarse.insert(Point::new(0.99, 0.0));
        assert!(coarse.contains(Point::new(1.5, -0.5)));
        assert!(!coarse.contains(Point::new(2.0, 0.0)));
    }

    #[test]
    fn test_sliding_extrema() {
        let mut w = SlidingExtrema::new(3);
        for v in [5.0, 1.0, 3.0] {
            w.push(v);
        }
        assert!(w.is_full());
        assert_eq!(w.spread(), 4.0);
        w.push(2.0); // fenêtre [1, 3, 2]
        assert_eq!(w.spread(), 2.0);
        w.push(2.5); // fenêtre [3, 2, 2.5]
        assert_eq!(w.spread(), 1.0);
    }

    #[test]
    fn test_bounds() {
        let b = Bounds::of(&[Point::new(1.0, -2.0), Point::new(-3.0, 4.0)]).unwrap();
        assert_eq!((b.xmin, b.xmax, b.ymin, b.ymax), (-3.0, 1.0, -2.0, 4.0));
        assert!(Bounds::of(&[]).is_none());
    }
}
