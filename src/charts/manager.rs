use std::collections::HashMap;
use std::sync::Arc;

use crate::charts::gauge::{GaugeBand, Metric, gauge_percentage};
use crate::charts::scatter::{SCATTER_PAIRS, collect_points};
use crate::charts::{ChartFactory, ChartHandle, ChartKey, ChartSpec};
use crate::dashboard::snapshot::SiteSnapshot;
use crate::dashboard::summary::Distribution;

/// Pie slice colors, energy chart then motor chart.
const ENERGY_PIE_COLORS: [&str; 3] = ["#f39c12", "#27ae60", "#2980b9"];
const MOTOR_PIE_COLORS: [&str; 3] = ["#27ae60", "#c0392b", "#f39c12"];

/// Owns every live chart instance.
///
/// The registry maps chart keys to the handles the factory issued. Creating
/// a chart for a key always destroys the previous handle first, so a key
/// can never have two live instances. Renders rebuild charts from scratch
/// rather than diffing instance state.
pub struct ChartLifecycleManager {
    factory: Arc<dyn ChartFactory>,
    live: HashMap<ChartKey, ChartHandle>,
}

impl ChartLifecycleManager {
    #[must_use]
    pub fn new(factory: Arc<dyn ChartFactory>) -> Self {
        Self {
            factory,
            live: HashMap::new(),
        }
    }

    /// Render the gauges and scatter plots for the active site.
    ///
    /// Disposes every per-site handle (whatever site it belonged to), then
    /// creates fresh charts bound to `site_index`. A missing latest reading
    /// renders each gauge at zero; a scatter pair with no plottable points
    /// creates no chart.
    pub fn render_active_site(&mut self, snapshot: &SiteSnapshot, site_index: usize) {
        self.dispose_site_charts();

        for metric in Metric::ALL {
            let value = snapshot
                .latest
                .as_ref()
                .and_then(|r| r.field(metric.field()))
                .unwrap_or(0.0);
            let percent = gauge_percentage(value, metric.max());
            let spec = ChartSpec::Gauge {
                label: metric.label().to_string(),
                value,
                percent,
                color: GaugeBand::for_percentage(percent).color().to_string(),
            };
            self.create(ChartKey::Gauge { site_index, metric }, spec);
        }

        for pair in SCATTER_PAIRS {
            let points = collect_points(&snapshot.history, pair);
            if points.is_empty() {
                tracing::debug!(
                    site_index,
                    x = pair.x.slug(),
                    y = pair.y.slug(),
                    "No plottable points, scatter chart not created"
                );
                continue;
            }
            let spec = ChartSpec::Scatter {
                x_label: pair.x.label().to_string(),
                y_label: pair.y.label().to_string(),
                points,
            };
            self.create(ChartKey::Scatter { site_index, pair }, spec);
        }
    }

    /// Render the two summary pies. Independent of per-site state; both are
    /// disposed and recreated every cycle.
    pub fn render_summary_charts(&mut self, energy: &Distribution, motors: &Distribution) {
        self.create(ChartKey::EnergyPie, pie_spec(energy, &ENERGY_PIE_COLORS));
        self.create(ChartKey::MotorPie, pie_spec(motors, &MOTOR_PIE_COLORS));
    }

    /// Dispose every live chart. Used on teardown and when a cycle ends in
    /// the no-data state.
    pub fn clear(&mut self) {
        let keys: Vec<ChartKey> = self.live.keys().copied().collect();
        for key in keys {
            self.dispose(key);
        }
    }

    /// Number of live chart instances.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether a key currently has a live instance.
    #[must_use]
    pub fn has(&self, key: ChartKey) -> bool {
        self.live.contains_key(&key)
    }

    fn create(&mut self, key: ChartKey, spec: ChartSpec) {
        // At most one live instance per key: replace-by-destroy, never shadow.
        self.dispose(key);

        let surface = key.surface_id();
        match self.factory.create(&surface, spec) {
            Some(handle) => {
                self.live.insert(key, handle);
            }
            None => {
                tracing::debug!(surface = %surface, "Render target missing, chart skipped this cycle");
            }
        }
    }

    fn dispose(&mut self, key: ChartKey) {
        if let Some(handle) = self.live.remove(&key) {
            self.factory.destroy(handle);
        }
    }

    fn dispose_site_charts(&mut self) {
        let keys: Vec<ChartKey> = self
            .live
            .keys()
            .filter(|k| k.site_index().is_some())
            .copied()
            .collect();
        for key in keys {
            self.dispose(key);
        }
    }
}

fn pie_spec(distribution: &Distribution, colors: &[&str; 3]) -> ChartSpec {
    ChartSpec::Pie {
        labels: distribution.labels.clone(),
        shares: distribution.shares.clone(),
        colors: colors.iter().map(ToString::to_string).collect(),
    }
}
