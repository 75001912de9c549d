pub mod bounds;
pub mod config;
pub mod constants;
pub mod controller;
pub mod geo;
pub mod host;
pub mod surface;
pub mod viewport;

pub use controller::{CursorHint, InteractionMode, MapController};
pub use host::HostElement;
pub use surface::Surface;
