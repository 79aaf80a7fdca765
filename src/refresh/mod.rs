pub mod scheduler;

pub use scheduler::{RefreshHandle, apply_site_change, run_refresh_cycle, spawn};

use serde::Serialize;
use utoipa::ToSchema;

/// Lifecycle of the refresh scheduler, visible to the HTTP layer.
///
/// `Idle` before the scheduler starts, `Loading` until the first pass
/// yields a site list, then `Ready` with excursions to `Refreshing` while
/// a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    #[default]
    Idle,
    Loading,
    Ready,
    Refreshing,
}
