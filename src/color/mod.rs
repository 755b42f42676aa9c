pub mod palettes;

pub use palettes::{Rgb, Style, StyleDescriptor};
