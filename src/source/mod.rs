pub mod client;
pub mod models;

pub use client::TableClient;
pub use models::{Reading, SensorField, Site};

use async_trait::async_trait;

use crate::error::AppResult;

/// Maximum number of historical rows fetched per site.
pub const HISTORY_LIMIT: usize = 50;

/// Query surface of the remote table store.
///
/// The production implementation is [`TableClient`]; tests substitute an
/// in-memory store. Implementations are expected to deliver `history` in
/// ascending `recorded_at` order and `latest_reading` as the row with the
/// maximum `recorded_at` for the site; the snapshot builder re-sorts
/// history either way.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All sites, in stable listing order (ascending id).
    async fn list_sites(&self) -> AppResult<Vec<Site>>;

    /// The most recent reading for a site, if any exist.
    async fn latest_reading(&self, site_id: i64) -> AppResult<Option<Reading>>;

    /// Up to `limit` historical readings for a site, ascending by timestamp.
    async fn history(&self, site_id: i64, limit: usize) -> AppResult<Vec<Reading>>;
}
