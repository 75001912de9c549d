pub mod draw;

pub use draw::{ClosedPolygon, DrawingEvent, DrawingSession, DrawingState};
