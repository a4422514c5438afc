//! Feature selection and camera framing.
//!
//! Everything here is plain data in, plain data out: the host hit-tests,
//! feeds candidates in, and applies the returned signals and effects.

pub mod area;
pub mod camera;
pub mod highlight;
pub mod panel;
pub mod resolver;
pub mod session;
pub mod units;

pub use area::AreaCache;
pub use camera::{CameraFraming, CameraMove, CameraTarget};
pub use highlight::{HighlightController, HighlightSignal, HighlightState};
pub use resolver::resolve;
pub use session::{Effect, LoadRequest, LoadResponse, SelectionSession};
pub use units::UnitMode;
