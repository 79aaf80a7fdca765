//! Unit tests for the refresh cycle and scheduler.
//!
//! Run with: cargo test --test refresh_unit_test

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fodder_monitor::charts::{ChartLifecycleManager, ChartSpec, SurfaceChartFactory};
use fodder_monitor::common::AppState;
use fodder_monitor::config::{Config, Deployment};
use fodder_monitor::error::{AppError, AppResult};
use fodder_monitor::refresh::{self, RefreshState, apply_site_change, run_refresh_cycle};
use fodder_monitor::source::{DataSource, Reading, Site};
use tokio::sync::mpsc;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> Config {
    Config {
        source_base_url: "http://localhost/rest/v1".to_string(),
        source_api_key: "test-key".to_string(),
        refresh_interval_seconds: 3,
        fetch_timeout_seconds: 5,
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        disable_rate_limiting: true,
        rate_limit_per_second: 10,
        rate_limit_burst: 60,
        deployment: Deployment::Local,
    }
}

fn reading(site_id: i64, temperature: f64) -> Reading {
    Reading {
        site_id,
        recorded_at: Utc.timestamp_opt(1_770_000_000, 0).unwrap(),
        temperature: Some(temperature),
        humidity: Some(55.0),
        ph: Some(6.5),
        height_cm: Some(10.0),
        motor1_power: Some(100.0),
        motor2_power: Some(0.0),
    }
}

/// Three chambers; chamber 2's per-site fetches fail. The listing can be
/// toggled dead to exercise the no-data path.
struct FixtureSource {
    sites: Vec<Site>,
    readings: HashMap<i64, Vec<Reading>>,
    fail_sites: Vec<i64>,
    fail_listing: AtomicBool,
}

impl FixtureSource {
    fn three_chambers() -> Self {
        let sites = (1..=3)
            .map(|id| Site {
                id,
                name: format!("Chamber {id}"),
            })
            .collect();
        let mut readings = HashMap::new();
        readings.insert(1, vec![reading(1, 20.0), reading(1, 21.0)]);
        readings.insert(3, vec![reading(3, 30.0), reading(3, 31.0)]);
        Self {
            sites,
            readings,
            fail_sites: vec![2],
            fail_listing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn list_sites(&self) -> AppResult<Vec<Site>> {
        if self.fail_listing.load(Ordering::Relaxed) {
            return Err(AppError::SourceApi("listing unavailable".to_string()));
        }
        Ok(self.sites.clone())
    }

    async fn latest_reading(&self, site_id: i64) -> AppResult<Option<Reading>> {
        if self.fail_sites.contains(&site_id) {
            return Err(AppError::SourceApi(format!("site {site_id} unreachable")));
        }
        Ok(self
            .readings
            .get(&site_id)
            .and_then(|rows| rows.last().cloned()))
    }

    async fn history(&self, site_id: i64, _limit: usize) -> AppResult<Vec<Reading>> {
        if self.fail_sites.contains(&site_id) {
            return Err(AppError::SourceApi(format!("site {site_id} unreachable")));
        }
        Ok(self.readings.get(&site_id).cloned().unwrap_or_default())
    }
}

fn app_state(source: Arc<FixtureSource>) -> (AppState, mpsc::Receiver<usize>) {
    let (tx, rx) = mpsc::channel(8);
    (AppState::new(test_config(), source, tx), rx)
}

fn rendered_surfaces(state: &AppState) -> Vec<String> {
    state
        .rendered
        .lock()
        .unwrap()
        .charts
        .keys()
        .cloned()
        .collect()
}

#[tokio::test]
async fn cycle_populates_snapshots_and_renders_active_site() {
    let (state, _rx) = app_state(Arc::new(FixtureSource::three_chambers()));
    let factory = Arc::new(SurfaceChartFactory::new(state.rendered.clone()));
    let mut manager = ChartLifecycleManager::new(factory.clone());

    let ok = run_refresh_cycle(&state, &factory, &mut manager, FETCH_TIMEOUT).await;
    assert!(ok);

    let dashboard = state.dashboard.read().await;
    assert_eq!(dashboard.snapshots.len(), 3);
    assert_eq!(dashboard.active_site, 0);
    assert!(dashboard.last_refresh.is_some());
    drop(dashboard);

    let surfaces = rendered_surfaces(&state);
    assert!(surfaces.contains(&"pie-energy".to_string()));
    assert!(surfaces.contains(&"pie-motors".to_string()));
    assert!(surfaces.contains(&"gauge-0-temperature".to_string()));
    assert!(surfaces.contains(&"scatter-0-temperature-humidity".to_string()));
    // Only the active site's charts are rendered.
    assert!(!surfaces.contains(&"gauge-1-temperature".to_string()));
}

#[tokio::test]
async fn failing_site_tab_renders_zeroed_gauges_and_no_scatter() {
    let (state, _rx) = app_state(Arc::new(FixtureSource::three_chambers()));
    let factory = Arc::new(SurfaceChartFactory::new(state.rendered.clone()));
    let mut manager = ChartLifecycleManager::new(factory.clone());

    assert!(run_refresh_cycle(&state, &factory, &mut manager, FETCH_TIMEOUT).await);

    // Switch to the chamber whose fetches failed (tab index 1 = site id 2).
    apply_site_change(&state, &mut manager, 1).await;
    assert_eq!(state.dashboard.read().await.active_site, 1);

    let rendered = state.rendered.lock().unwrap().clone();
    match rendered.charts.get("gauge-1-temperature") {
        Some(ChartSpec::Gauge { value, percent, label, .. }) => {
            assert_eq!(*value, 0.0);
            assert_eq!(*percent, 0.0);
            assert!(!label.is_empty());
        }
        other => panic!("expected a gauge spec, got {other:?}"),
    }
    assert!(
        !rendered
            .charts
            .keys()
            .any(|surface| surface.starts_with("scatter-1-")),
        "a failed site has no plottable history"
    );

    // The healthy neighbor renders fully after switching back.
    apply_site_change(&state, &mut manager, 2).await;
    let rendered = state.rendered.lock().unwrap().clone();
    assert!(rendered.charts.contains_key("scatter-2-temperature-humidity"));
}

#[tokio::test]
async fn site_change_to_unknown_tab_is_ignored() {
    let (state, _rx) = app_state(Arc::new(FixtureSource::three_chambers()));
    let factory = Arc::new(SurfaceChartFactory::new(state.rendered.clone()));
    let mut manager = ChartLifecycleManager::new(factory.clone());

    assert!(run_refresh_cycle(&state, &factory, &mut manager, FETCH_TIMEOUT).await);
    apply_site_change(&state, &mut manager, 99).await;

    assert_eq!(state.dashboard.read().await.active_site, 0);
    assert!(rendered_surfaces(&state).contains(&"gauge-0-temperature".to_string()));
}

#[tokio::test]
async fn listing_failure_clears_to_the_no_data_state() {
    let source = Arc::new(FixtureSource::three_chambers());
    let (state, _rx) = app_state(source.clone());
    let factory = Arc::new(SurfaceChartFactory::new(state.rendered.clone()));
    let mut manager = ChartLifecycleManager::new(factory.clone());

    assert!(run_refresh_cycle(&state, &factory, &mut manager, FETCH_TIMEOUT).await);
    assert!(!rendered_surfaces(&state).is_empty());

    source.fail_listing.store(true, Ordering::Relaxed);
    assert!(!run_refresh_cycle(&state, &factory, &mut manager, FETCH_TIMEOUT).await);

    assert!(state.dashboard.read().await.snapshots.is_empty());
    assert!(rendered_surfaces(&state).is_empty());
}

#[tokio::test(start_paused = true)]
async fn scheduler_loads_applies_site_changes_and_tears_down() {
    let (state, rx) = app_state(Arc::new(FixtureSource::three_chambers()));
    let refresher = refresh::spawn(state.clone(), rx);

    // Let the initial load run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    {
        let dashboard = state.dashboard.read().await;
        assert_eq!(dashboard.refresh_state, RefreshState::Ready);
        assert_eq!(dashboard.snapshots.len(), 3);
    }

    // Tab selector event, handled by the same loop as the timer.
    state.site_events.send(2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(state.dashboard.read().await.active_site, 2);
    assert!(rendered_surfaces(&state).contains(&"gauge-2-temperature".to_string()));

    // Teardown disposes every live chart handle.
    refresher.shutdown().await;
    assert!(rendered_surfaces(&state).is_empty());
}
