//! SeaORM repository implementations

pub mod price_repository;
pub mod station_repository;
pub mod update_repository;

pub use price_repository::SeaOrmPriceRepository;
pub use station_repository::SeaOrmStationRepository;
pub use update_repository::{SeaOrmUpdateLogRepository, SeaOrmUpdateQueueRepository};
