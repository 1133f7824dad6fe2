mod geometry;
mod projection;
mod renderer;

pub use projection::{AlbersUsa, Inset};
pub use renderer::{MapLayers, MapRenderer, Region, Ring};
