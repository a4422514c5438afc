mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::{Camera, Viewport};
pub use renderer::{MapLayers, MapRenderer, Overlay};
