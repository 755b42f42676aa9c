//! Type d'erreur commun à la bibliothèque.

use std::path::PathBuf;

use thiserror::Error;

use crate::attractor::MapFamily;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("erreur d'entrée/sortie: {0}")]
    Io(#[from] std::io::Error),

    #[error("erreur d'image: {0}")]
    Image(#[from] image::ImageError),

    #[error("fichier de configuration invalide {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{family:?} attend {expected} coefficients, {got} fournis")]
    Arity {
        family: MapFamily,
        expected: usize,
        got: usize,
    },

    #[error("plage d'échantillonnage {index} invalide: ({lo}, {hi})")]
    InvalidRange { index: usize, lo: f64, hi: f64 },

    #[error("type d'attracteur inconnu: '{0}'")]
    UnknownFamily(String),

    #[error("style inconnu: '{0}'")]
    UnknownStyle(String),

    #[error("preset inconnu: '{0}'")]
    UnknownPreset(String),

    #[error("erreur CSV: {0}")]
    CsvFormat(#[from] csv::Error),

    #[error("ligne {line} du CSV invalide: {reason}")]
    Csv { line: usize, reason: String },

    #[error("trajectoire vide, rien à dessiner")]
    EmptyTrajectory,

    #[error("aucun attracteur retenu après {attempts} tentatives")]
    SearchExhausted { attempts: usize },
}
