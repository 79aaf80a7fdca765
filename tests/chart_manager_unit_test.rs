//! Unit tests for the chart lifecycle manager.
//!
//! Run with: cargo test --test chart_manager_unit_test

use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use fodder_monitor::charts::{
    ChartFactory, ChartHandle, ChartKey, ChartLifecycleManager, ChartSpec, Metric, SurfaceId,
};
use fodder_monitor::dashboard::snapshot::SiteSnapshot;
use fodder_monitor::dashboard::summary::Distribution;
use fodder_monitor::source::{Reading, Site};

/// Factory that counts live instances per surface and can simulate missing
/// render targets.
#[derive(Default)]
struct CountingFactory {
    live: Mutex<HashMap<SurfaceId, usize>>,
    missing: Mutex<HashSet<SurfaceId>>,
    created: AtomicU64,
    destroyed: AtomicU64,
    next_instance: AtomicU64,
}

impl CountingFactory {
    fn live_on(&self, surface: &str) -> usize {
        self.live
            .lock()
            .unwrap()
            .get(surface)
            .copied()
            .unwrap_or(0)
    }

    fn max_live_per_surface(&self) -> usize {
        self.live
            .lock()
            .unwrap()
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }

    fn total_live(&self) -> usize {
        self.live.lock().unwrap().values().sum()
    }

    fn mark_missing(&self, surface: &str) {
        self.missing.lock().unwrap().insert(surface.to_string());
    }

    fn mark_available(&self, surface: &str) {
        self.missing.lock().unwrap().remove(surface);
    }
}

impl ChartFactory for CountingFactory {
    fn create(&self, surface: &SurfaceId, _spec: ChartSpec) -> Option<ChartHandle> {
        if self.missing.lock().unwrap().contains(surface) {
            return None;
        }
        *self.live.lock().unwrap().entry(surface.clone()).or_insert(0) += 1;
        self.created.fetch_add(1, Ordering::Relaxed);
        Some(ChartHandle {
            surface: surface.clone(),
            instance: self.next_instance.fetch_add(1, Ordering::Relaxed),
        })
    }

    fn destroy(&self, handle: ChartHandle) {
        let mut live = self.live.lock().unwrap();
        match live.get_mut(&handle.surface) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                live.remove(&handle.surface);
            }
            None => panic!("destroyed a handle that was never live: {}", handle.surface),
        }
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

fn reading(site_id: i64, temperature: Option<f64>, humidity: Option<f64>) -> Reading {
    Reading {
        site_id,
        recorded_at: Utc.timestamp_opt(1_770_000_000, 0).unwrap(),
        temperature,
        humidity,
        ph: Some(6.5),
        height_cm: Some(12.0),
        motor1_power: Some(150.0),
        motor2_power: Some(30.0),
    }
}

fn populated_snapshot(site_id: i64, name: &str) -> SiteSnapshot {
    SiteSnapshot {
        site: Site {
            id: site_id,
            name: name.to_string(),
        },
        latest: Some(reading(site_id, Some(21.0), Some(55.0))),
        history: vec![
            reading(site_id, Some(20.0), Some(50.0)),
            reading(site_id, Some(21.0), Some(55.0)),
        ],
    }
}

fn empty_snapshot(site_id: i64, name: &str) -> SiteSnapshot {
    SiteSnapshot {
        site: Site {
            id: site_id,
            name: name.to_string(),
        },
        latest: None,
        history: Vec::new(),
    }
}

fn distributions() -> (Distribution, Distribution) {
    let snapshots = [populated_snapshot(1, "Chamber 1")];
    (
        fodder_monitor::dashboard::summary::energy_distribution(&snapshots),
        fodder_monitor::dashboard::summary::motor_distribution(&snapshots),
    )
}

#[test]
fn at_most_one_live_instance_per_key() {
    let factory = Arc::new(CountingFactory::default());
    let mut manager = ChartLifecycleManager::new(factory.clone());
    let (energy, motors) = distributions();

    let snapshots = [populated_snapshot(1, "Chamber 1"), populated_snapshot(2, "Chamber 2")];

    // Repeated refreshes and tab switches in every order.
    for (pass, site_index) in [0usize, 0, 1, 0, 1, 1].into_iter().enumerate() {
        manager.render_active_site(&snapshots[site_index], site_index);
        manager.render_summary_charts(&energy, &motors);

        assert!(
            factory.max_live_per_surface() <= 1,
            "duplicate live instance after pass {pass}"
        );
        assert_eq!(factory.total_live(), manager.live_count());
    }
}

#[test]
fn tab_switch_disposes_the_previous_site() {
    let factory = Arc::new(CountingFactory::default());
    let mut manager = ChartLifecycleManager::new(factory.clone());

    manager.render_active_site(&populated_snapshot(1, "Chamber 1"), 0);
    assert_eq!(factory.live_on("gauge-0-temperature"), 1);

    manager.render_active_site(&populated_snapshot(2, "Chamber 2"), 1);
    assert_eq!(factory.live_on("gauge-0-temperature"), 0);
    assert_eq!(factory.live_on("gauge-1-temperature"), 1);
    assert!(!manager.has(ChartKey::Gauge {
        site_index: 0,
        metric: Metric::Temperature,
    }));
}

#[test]
fn summary_pies_are_recreated_every_cycle() {
    let factory = Arc::new(CountingFactory::default());
    let mut manager = ChartLifecycleManager::new(factory.clone());
    let (energy, motors) = distributions();

    manager.render_summary_charts(&energy, &motors);
    manager.render_summary_charts(&energy, &motors);

    assert_eq!(factory.live_on("pie-energy"), 1);
    assert_eq!(factory.live_on("pie-motors"), 1);
    // Two creates and one destroy per pie across the two cycles.
    assert_eq!(factory.created.load(Ordering::Relaxed), 4);
    assert_eq!(factory.destroyed.load(Ordering::Relaxed), 2);
}

#[test]
fn empty_snapshot_renders_zeroed_gauges_and_no_scatter() {
    let factory = Arc::new(CountingFactory::default());
    let mut manager = ChartLifecycleManager::new(factory.clone());

    manager.render_active_site(&empty_snapshot(2, "Chamber 2"), 1);

    for metric in Metric::ALL {
        assert!(manager.has(ChartKey::Gauge {
            site_index: 1,
            metric,
        }));
    }
    // No history, so no scatter handles at all.
    assert_eq!(manager.live_count(), Metric::ALL.len());
}

#[test]
fn missing_render_target_is_skipped_and_retried() {
    let factory = Arc::new(CountingFactory::default());
    let mut manager = ChartLifecycleManager::new(factory.clone());

    factory.mark_missing("gauge-0-temperature");
    manager.render_active_site(&populated_snapshot(1, "Chamber 1"), 0);

    let temperature_key = ChartKey::Gauge {
        site_index: 0,
        metric: Metric::Temperature,
    };
    assert!(!manager.has(temperature_key));
    assert!(manager.has(ChartKey::Gauge {
        site_index: 0,
        metric: Metric::Humidity,
    }));

    // Surface appears next cycle; the chart comes back with it.
    factory.mark_available("gauge-0-temperature");
    manager.render_active_site(&populated_snapshot(1, "Chamber 1"), 0);
    assert!(manager.has(temperature_key));
}

#[test]
fn clear_disposes_everything() {
    let factory = Arc::new(CountingFactory::default());
    let mut manager = ChartLifecycleManager::new(factory.clone());
    let (energy, motors) = distributions();

    manager.render_active_site(&populated_snapshot(1, "Chamber 1"), 0);
    manager.render_summary_charts(&energy, &motors);
    assert!(manager.live_count() > 0);

    manager.clear();
    assert_eq!(manager.live_count(), 0);
    assert_eq!(factory.total_live(), 0);
    assert_eq!(
        factory.created.load(Ordering::Relaxed),
        factory.destroyed.load(Ordering::Relaxed)
    );
}
