use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The shared request quota is currently exhausted. Surfaced by the
    /// manual refresh path so callers can say "try again shortly".
    #[error("Rate limit exceeded, please wait a moment")]
    RateLimited,

    /// Non-2xx status, transport failure or unusable payload from the
    /// upstream map API.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;
