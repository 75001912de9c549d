pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{InputEvent, MouseButton};
pub use handler::{Action, InputHandler, MapCallbacks};
