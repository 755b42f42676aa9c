//! Une itération de chaque famille de cartes.

use crate::attractor::{MapFamily, MapParams, Point};

/// Fonction de récurrence: le point suivant ne dépend que du point courant.
pub trait Recurrence {
    fn step(&self, p: Point) -> Point;
}

impl Recurrence for MapParams {
    fn step(&self, p: Point) -> Point {
        step(self, p)
    }
}

impl<F> Recurrence for F
where
    F: Fn(Point) -> Point,
{
    fn step(&self, p: Point) -> Point {
        self(p)
    }
}

/// Calcule le point suivant selon la famille.
pub fn step(params: &MapParams, p: Point) -> Point {
    let k = params.coefficients();
    match params.family() {
        MapFamily::Clifford => clifford(k, p),
        MapFamily::DeJong => de_jong(k, p),
        MapFamily::Svensson => svensson(k, p),
        MapFamily::Simon => simon(k, p),
        MapFamily::SineCosine => sine_cosine(k, p),
        MapFamily::Quadratic => quadratic(k, p),
    }
}

fn clifford(k: &[f64], Point { x, y }: Point) -> Point {
    let (a, b, c, d) = (k[0], k[1], k[2], k[3]);
    Point::new(
        (a * y).sin() + c * (a * x).cos(),
        (b * x).sin() + d * (b * y).cos(),
    )
}

fn de_jong(k: &[f64], Point { x, y }: Point) -> Point {
    let (a, b, c, d) = (k[0], k[1], k[2], k[3]);
    Point::new((a * y).sin() - (b * x).cos(), (c * x).sin() - (d * y).cos())
}

fn svensson(k: &[f64], Point { x, y }: Point) -> Point {
    let (a, b, c, d) = (k[0], k[1], k[2], k[3]);
    Point::new(
        d * (a * x).sin() - (b * y).sin(),
        c * (a * x).cos() + (b * y).cos(),
    )
}

fn simon(k: &[f64], Point { x, y }: Point) -> Point {
    Point::new(k[0] - x * x + k[1] * y, x)
}

fn sine_cosine(k: &[f64], Point { x, y }: Point) -> Point {
    Point::new((x * x - y * y + k[0]).sin(), (2.0 * x * y + k[1]).cos())
}

fn quadratic(k: &[f64], Point { x, y }: Point) -> Point {
    // Termes dans l'ordre: 1, x, x², xy, y, y²
    let poly = |c: &[f64]| c[0] + c[1] * x + c[2] * x * x + c[3] * x * y + c[4] * y + c[5] * y * y;
    Point::new(poly(&k[..6]), poly(&k[6..12]))
}
