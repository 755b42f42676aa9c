pub mod types;
pub mod maps;
pub mod definitions;
pub mod trajectory;
pub mod search;

pub use types::{MapFamily, MapParams, Point};
pub use maps::Recurrence;
pub use definitions::{find_preset, presets};
pub use trajectory::{generate, GeneratorConfig, Termination, Trajectory};
pub use search::{search, SearchConfig};
