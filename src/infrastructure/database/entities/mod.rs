//! Database entities module

pub mod price;
pub mod station;
pub mod update_log;
pub mod update_queue;

pub use price::Entity as Price;
pub use station::Entity as Station;
pub use update_log::Entity as UpdateLog;
pub use update_queue::Entity as UpdateQueue;
