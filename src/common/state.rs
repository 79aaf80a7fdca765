use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, mpsc};

use crate::charts::RenderedCharts;
use crate::config::Config;
use crate::dashboard::snapshot::SiteSnapshot;
use crate::refresh::RefreshState;
use crate::source::DataSource;

/// Dashboard data owned by the refresh scheduler and read by the HTTP
/// layer. The snapshot set is replaced wholesale each cycle, never patched.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub snapshots: Vec<SiteSnapshot>,
    pub active_site: usize,
    pub refresh_state: RefreshState,
    pub last_refresh: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<dyn DataSource>,
    pub dashboard: Arc<RwLock<DashboardState>>,
    pub rendered: Arc<Mutex<RenderedCharts>>,
    /// Tab selector events, consumed by the refresh scheduler.
    pub site_events: mpsc::Sender<usize>,
}

impl AppState {
    pub fn new(
        config: Config,
        source: Arc<dyn DataSource>,
        site_events: mpsc::Sender<usize>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            source,
            dashboard: Arc::new(RwLock::new(DashboardState::default())),
            rendered: Arc::new(Mutex::new(RenderedCharts::default())),
            site_events,
        }
    }
}
