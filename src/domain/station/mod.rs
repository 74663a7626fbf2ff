//! Station aggregate
//!
//! Cached pool details plus the repository interface over them.

pub mod model;
pub mod repository;

pub use model::{BoundingBox, Coordinates, PowerType, StationFields, StationRecord};
pub use repository::StationRepository;
