use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::dashboard::snapshot::SiteSnapshot;
use crate::error::{AppError, AppResult};

/// One dashboard tab.
#[derive(Debug, Serialize, ToSchema)]
pub struct SiteTab {
    /// Tab position; also the index used by the chart surfaces.
    pub index: usize,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActiveSiteRequest {
    pub index: usize,
}

pub fn site_tabs(snapshots: &[SiteSnapshot]) -> Vec<SiteTab> {
    snapshots
        .iter()
        .enumerate()
        .map(|(index, snapshot)| SiteTab {
            index,
            id: snapshot.site.id,
            name: snapshot.site.name.clone(),
        })
        .collect()
}

/// List site tabs in listing order
#[utoipa::path(
    get,
    path = "/api/sites",
    responses(
        (status = 200, description = "Site tabs retrieved successfully", body = Vec<SiteTab>),
    ),
    tag = "sites"
)]
pub async fn list_sites(State(state): State<AppState>) -> Json<Vec<SiteTab>> {
    let dashboard = state.dashboard.read().await;
    Json(site_tabs(&dashboard.snapshots))
}

/// Get the current snapshot for one site tab
#[utoipa::path(
    get,
    path = "/api/sites/{index}/snapshot",
    params(
        ("index" = usize, Path, description = "Site tab index"),
    ),
    responses(
        (status = 200, description = "Snapshot retrieved successfully", body = SiteSnapshot),
        (status = 404, description = "Site tab not found"),
    ),
    tag = "sites"
)]
pub async fn get_site_snapshot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<Json<SiteSnapshot>> {
    let dashboard = state.dashboard.read().await;
    dashboard
        .snapshots
        .get(index)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Site tab {index} not found")))
}

/// Select the active site tab
///
/// Emits a site-change event for the refresh scheduler; the re-render is
/// asynchronous, hence 202. An event already queued while a refresh is in
/// flight is enough, so an overflowing queue drops the duplicate.
#[utoipa::path(
    put,
    path = "/api/active-site",
    request_body = ActiveSiteRequest,
    responses(
        (status = 202, description = "Site change queued"),
        (status = 404, description = "Site tab not found"),
    ),
    tag = "sites"
)]
pub async fn set_active_site(
    State(state): State<AppState>,
    Json(request): Json<ActiveSiteRequest>,
) -> AppResult<StatusCode> {
    let tab_count = state.dashboard.read().await.snapshots.len();
    if request.index >= tab_count {
        return Err(AppError::NotFound(format!(
            "Site tab {} not found",
            request.index
        )));
    }

    match state.site_events.try_send(request.index) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::debug!(index = request.index, "Site change queue full, event dropped");
        }
        Err(TrySendError::Closed(_)) => {
            return Err(AppError::Internal(
                "Refresh scheduler is not running".to_string(),
            ));
        }
    }

    Ok(StatusCode::ACCEPTED)
}
