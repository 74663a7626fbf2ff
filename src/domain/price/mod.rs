//! Price aggregate

pub mod model;
pub mod repository;

pub use model::{PriceFields, PriceRecord};
pub use repository::PriceRepository;
