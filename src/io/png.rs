use std::path::Path;

use image::{ImageError, RgbImage};
use rayon::prelude::*;

use crate::error::Result;
use crate::render::Canvas;

/// Convertit le canevas flottant en image RGB 8 bits.
///
/// La conversion est parallélisée par lignes.
pub fn canvas_to_image(canvas: &Canvas) -> Result<RgbImage> {
    let width = canvas.width();
    let height = canvas.height();
    let w = width as usize;

    let buffer: Vec<u8> = canvas
        .pixels()
        .par_chunks(w.max(1))
        .flat_map(|row| {
            row.iter()
                .flat_map(|px| px.map(|c| c.round().clamp(0.0, 255.0) as u8))
                .collect::<Vec<u8>>()
        })
        .collect();

    // Créer l'image depuis le buffer
    let img = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ImageError::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Impossible de créer l'image depuis le buffer",
        ))
    })?;
    Ok(img)
}

/// Enregistre le canevas au format PNG.
pub fn save_png(canvas: &Canvas, output: &Path) -> Result<()> {
    let img = canvas_to_image(canvas)?;
    // save() détecte le format depuis l'extension
    img.save(output)?;
    log::info!("image saved to {}", output.display());
    Ok(())
}
