pub mod base;
pub mod coverage;
pub mod heatmap;
pub mod macros;
pub mod manager;
pub mod marker;
pub mod polygon;
pub mod recommendation;
pub mod reconciler;
pub mod style;
pub mod tile;

pub use base::{LayerProperties, LayerTrait, LayerType};
pub use manager::LayerManager;
pub use reconciler::{LayerReconciler, ReconcileOutcome, ReconcileReport};
