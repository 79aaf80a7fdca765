use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::charts::{ChartLifecycleManager, SurfaceChartFactory};
use crate::common::AppState;
use crate::dashboard::{snapshot, summary};
use crate::refresh::RefreshState;

/// Controls a spawned refresh scheduler.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the scheduler. The timer is dropped, an in-flight fetch is
    /// discarded rather than applied, and every live chart handle is
    /// disposed before the task exits.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Refresh scheduler task did not stop cleanly");
        }
    }
}

/// Spawn the dashboard refresh scheduler as a background task.
#[must_use]
pub fn spawn(state: AppState, site_events: mpsc::Receiver<usize>) -> RefreshHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_dashboard_refresh(state, site_events, shutdown_rx));
    RefreshHandle {
        shutdown: shutdown_tx,
        task,
    }
}

/// Run the dashboard refresh loop until shutdown.
///
/// One task, one `select!` loop: timer ticks re-fetch and re-render,
/// site-change events re-render the new active site from the snapshots
/// already held, and both trigger sources are serialized through the same
/// loop so a refresh never overlaps another. A tick that lands while a
/// cycle is in flight is skipped; a site-change event is deferred until the
/// cycle finishes.
pub async fn run_dashboard_refresh(
    state: AppState,
    mut site_events: mpsc::Receiver<usize>,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval_secs = state.config.refresh_interval_seconds;
    let fetch_timeout = Duration::from_secs(state.config.fetch_timeout_seconds);

    tracing::info!(interval_secs, "Starting dashboard refresh scheduler");

    let factory = Arc::new(SurfaceChartFactory::new(state.rendered.clone()));
    let mut manager = ChartLifecycleManager::new(factory.clone());

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // First tick completes immediately: the initial load.
    ticker.tick().await;
    set_refresh_state(&state, RefreshState::Loading).await;
    let mut loaded = tokio::select! {
        ok = run_refresh_cycle(&state, &factory, &mut manager, fetch_timeout) => ok,
        _ = shutdown.changed() => {
            manager.clear();
            return;
        }
    };
    settle_refresh_state(&state, loaded).await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                set_refresh_state(
                    &state,
                    if loaded { RefreshState::Refreshing } else { RefreshState::Loading },
                )
                .await;
                let ok = tokio::select! {
                    ok = run_refresh_cycle(&state, &factory, &mut manager, fetch_timeout) => ok,
                    _ = shutdown.changed() => break,
                };
                loaded = loaded || ok;
                settle_refresh_state(&state, loaded).await;
            }
            Some(site_index) = site_events.recv() => {
                if loaded {
                    set_refresh_state(&state, RefreshState::Refreshing).await;
                    apply_site_change(&state, &mut manager, site_index).await;
                    settle_refresh_state(&state, loaded).await;
                } else {
                    tracing::debug!(site_index, "Site change before first load, ignored");
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    manager.clear();
    tracing::info!("Dashboard refresh scheduler stopped");
}

/// One full refresh pass: fetch all sites, swap the snapshot set in
/// atomically, then render the active site's charts and the summary pies.
/// Returns whether the site listing succeeded.
///
/// Fetching finishes (or is written off per site) before any chart is
/// touched, so charts never observe a half-updated snapshot set. A listing
/// failure clears the dashboard to its no-data state.
pub async fn run_refresh_cycle(
    state: &AppState,
    factory: &SurfaceChartFactory,
    manager: &mut ChartLifecycleManager,
    fetch_timeout: Duration,
) -> bool {
    match snapshot::build_all(state.source.as_ref(), fetch_timeout).await {
        Ok(snapshots) => {
            factory.register_site_surfaces(snapshots.len());

            let energy = summary::energy_distribution(&snapshots);
            let motors = summary::motor_distribution(&snapshots);

            let (active_index, active_snapshot) = {
                let mut dashboard = state.dashboard.write().await;
                if dashboard.active_site >= snapshots.len() {
                    dashboard.active_site = 0;
                }
                dashboard.snapshots = snapshots;
                dashboard.last_refresh = Some(Utc::now());
                let index = dashboard.active_site;
                (index, dashboard.snapshots.get(index).cloned())
            };

            match active_snapshot {
                Some(active) => manager.render_active_site(&active, active_index),
                None => {
                    tracing::debug!("No sites to render");
                    manager.clear();
                }
            }
            manager.render_summary_charts(&energy, &motors);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Site listing failed, dashboard shows no data this cycle");
            state.dashboard.write().await.snapshots.clear();
            manager.clear();
            false
        }
    }
}

/// Switch the active tab and re-render it from the held snapshots, without
/// re-fetching.
pub async fn apply_site_change(
    state: &AppState,
    manager: &mut ChartLifecycleManager,
    site_index: usize,
) {
    let snapshot = {
        let mut dashboard = state.dashboard.write().await;
        let Some(snapshot) = dashboard.snapshots.get(site_index).cloned() else {
            tracing::warn!(site_index, "Ignoring site change to unknown tab");
            return;
        };
        dashboard.active_site = site_index;
        snapshot
    };

    manager.render_active_site(&snapshot, site_index);
}

async fn set_refresh_state(state: &AppState, refresh_state: RefreshState) {
    state.dashboard.write().await.refresh_state = refresh_state;
}

async fn settle_refresh_state(state: &AppState, loaded: bool) {
    set_refresh_state(
        state,
        if loaded {
            RefreshState::Ready
        } else {
            RefreshState::Loading
        },
    )
    .await;
}
