pub mod conversion;
pub mod model;
