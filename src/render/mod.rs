pub mod scatter;

pub use scatter::{render_scatter, Canvas, RenderConfig};
