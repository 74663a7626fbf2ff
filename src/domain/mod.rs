pub mod error;
pub mod price;
pub mod station;
pub mod update;

// Re-export commonly used types
pub use error::{CacheError, CacheResult};
pub use price::{PriceFields, PriceRecord, PriceRepository};
pub use station::{
    BoundingBox, Coordinates, PowerType, StationFields, StationRecord, StationRepository,
};
pub use update::{
    CacheStats, QueuedUpdate, UpdateKind, UpdateLogEntry, UpdateLogRepository,
    UpdateQueueRepository, UpdaterStatus,
};
