//! Rendu d'une trajectoire en nuage de points.
//!
//! Les points sont composés dans l'ordre de la trajectoire (alpha blending)
//! sur un canevas flottant initialisé à la couleur de fond du style.

use serde::{Deserialize, Serialize};

use crate::attractor::trajectory::Bounds;
use crate::attractor::Point;
use crate::color::{Rgb, StyleDescriptor};
use crate::error::{Error, Result};

/// Paramètres de rastérisation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Marge relative autour des données (0.1 = 10 % de l'étendue de chaque côté).
    pub margin: f64,
    /// Ne dessine qu'un point sur `stride`.
    pub stride: usize,
    /// Pixels par unité de rayon. La taille d'un point est une aire (comme
    /// l'argument `s` d'un scatter), le rayon vaut sqrt(taille / π) × point_scale.
    pub point_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 2000,
            margin: 0.1,
            stride: 1,
            point_scale: 300.0 / 72.0,
        }
    }
}

/// Canevas RGB flottant, valeurs dans [0, 255].
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let bg = [background.r as f32, background.g as f32, background.b as f32];
        Self {
            width,
            height,
            pixels: vec![bg; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 3]] {
        &self.pixels
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let px = &mut self.pixels[y as usize * self.width as usize + x as usize];
        let src = [color.r as f32, color.g as f32, color.b as f32];
        for (d, s) in px.iter_mut().zip(src) {
            *d = *d * (1.0 - alpha) + s * alpha;
        }
    }

    fn splat(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, alpha: f32) {
        if radius < 0.75 {
            // Un point exactement sur le bord droit/bas reste dans l'image
            let pixel = |v: f64, n: u32| if v == n as f64 { n as i64 - 1 } else { v.floor() as i64 };
            self.blend(pixel(cx, self.width), pixel(cy, self.height), color, alpha);
            return;
        }
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }
}

/// Transformation données → pixels, à échelle égale sur les deux axes.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    xmin: f64,
    ymax: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    fn fit(bounds: Bounds, width: u32, height: u32, margin: f64) -> Self {
        // Étendue nulle (point fixe): on élargit à 1
        let span_x = if bounds.span_x() > 0.0 { bounds.span_x() } else { 1.0 };
        let span_y = if bounds.span_y() > 0.0 { bounds.span_y() } else { 1.0 };
        let cx = (bounds.xmin + bounds.xmax) / 2.0;
        let cy = (bounds.ymin + bounds.ymax) / 2.0;
        let span_x = span_x * (1.0 + 2.0 * margin.max(0.0));
        let span_y = span_y * (1.0 + 2.0 * margin.max(0.0));

        let scale = (width as f64 / span_x).min(height as f64 / span_y);
        // Centrage de la dimension la moins remplie
        let offset_x = (width as f64 - span_x * scale) / 2.0;
        let offset_y = (height as f64 - span_y * scale) / 2.0;

        Self {
            xmin: cx - span_x / 2.0,
            ymax: cy + span_y / 2.0,
            scale,
            offset_x,
            offset_y,
        }
    }

    fn project(&self, p: Point) -> (f64, f64) {
        (
            (p.x - self.xmin) * self.scale + self.offset_x,
            (self.ymax - p.y) * self.scale + self.offset_y,
        )
    }
}

/// Dessine `points` (déjà débarrassés du transitoire) avec `style`.
pub fn render_scatter(points: &[Point], style: &StyleDescriptor, config: &RenderConfig) -> Result<Canvas> {
    let bounds = Bounds::of(points).ok_or(Error::EmptyTrajectory)?;
    let width = config.width.max(1);
    let height = config.height.max(1);
    let viewport = Viewport::fit(bounds, width, height, config.margin);
    let mut canvas = Canvas::new(width, height, style.background);

    let stride = config.stride.max(1);
    let count = points.len().div_ceil(stride);
    for (i, p) in points.iter().step_by(stride).enumerate() {
        if !p.is_finite() {
            continue;
        }
        let ps = style.point_style(i, count);
        let radius = (ps.size as f64 / std::f64::consts::PI).sqrt() * config.point_scale as f64;
        let (px, py) = viewport.project(*p);
        canvas.splat(px, py, radius, ps.color, ps.alpha);
    }

    log::debug!("rendered {count} points on {width}x{height} canvas");
    Ok(canvas)
}
