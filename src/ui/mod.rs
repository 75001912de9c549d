#[cfg(feature = "egui")]
pub mod painter;
pub mod popup;

pub use popup::Popup;
