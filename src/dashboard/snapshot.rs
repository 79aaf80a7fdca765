use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::source::{DataSource, HISTORY_LIMIT, Reading, Site};

/// Per-site view model assembled once per refresh cycle.
///
/// A snapshot always reflects one consistent read pass: the whole set is
/// rebuilt and swapped in wholesale, never patched incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SiteSnapshot {
    pub site: Site,
    /// Most recent reading, or `None` when the site has no data or its
    /// fetch failed this cycle.
    pub latest: Option<Reading>,
    /// Bounded historical window, ascending by `recorded_at`, length ≤ 50.
    pub history: Vec<Reading>,
}

/// Fetch every site's latest reading and historical window.
///
/// The site listing is the only fatal step. Per-site fetches are bounded by
/// `fetch_timeout` and fail independently: a site whose data cannot be
/// fetched still appears in the result, with `latest = None` and an empty
/// history. Output preserves listing order.
///
/// # Errors
///
/// Returns an error only when the site listing itself fails or times out.
pub async fn build_all(
    source: &dyn DataSource,
    fetch_timeout: Duration,
) -> AppResult<Vec<SiteSnapshot>> {
    let sites = timeout(fetch_timeout, source.list_sites())
        .await
        .map_err(|_| AppError::Timeout(fetch_timeout))??;

    tracing::debug!(site_count = sites.len(), "Building site snapshots");

    let snapshots = futures::future::join_all(
        sites
            .into_iter()
            .map(|site| build_site(source, site, fetch_timeout)),
    )
    .await;

    Ok(snapshots)
}

/// Assemble one site's snapshot. Infallible: fetch failures degrade the
/// snapshot rather than propagating.
async fn build_site(source: &dyn DataSource, site: Site, fetch_timeout: Duration) -> SiteSnapshot {
    let latest = match timeout(fetch_timeout, source.latest_reading(site.id)).await {
        Ok(Ok(reading)) => reading,
        Ok(Err(e)) => {
            tracing::warn!(site_id = site.id, error = %e, "Failed to fetch latest reading");
            None
        }
        Err(_) => {
            tracing::warn!(site_id = site.id, "Latest reading fetch timed out");
            None
        }
    };

    let mut history = match timeout(fetch_timeout, source.history(site.id, HISTORY_LIMIT)).await {
        Ok(Ok(rows)) => rows,
        Ok(Err(e)) => {
            tracing::warn!(site_id = site.id, error = %e, "Failed to fetch history");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(site_id = site.id, "History fetch timed out");
            Vec::new()
        }
    };

    // The store is asked for ascending order, but sensor rows have been seen
    // arriving unordered; normalize here so downstream code can rely on it.
    history.sort_by_key(|r| r.recorded_at);
    history.truncate(HISTORY_LIMIT);

    SiteSnapshot {
        site,
        latest,
        history,
    }
}
