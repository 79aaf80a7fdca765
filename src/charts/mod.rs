pub mod gauge;
pub mod manager;
pub mod scatter;
pub mod surface;

pub use gauge::{GaugeBand, Metric, gauge_percentage};
pub use manager::ChartLifecycleManager;
pub use scatter::{SCATTER_PAIRS, ScatterPair, collect_points};
pub use surface::{RenderedCharts, SurfaceChartFactory};

use serde::Serialize;
use utoipa::ToSchema;

/// Identifies one drawing surface (canvas) on the dashboard page.
pub type SurfaceId = String;

/// Stable identity of one chart slot. The lifecycle manager guarantees at
/// most one live instance per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKey {
    Gauge { site_index: usize, metric: Metric },
    Scatter { site_index: usize, pair: ScatterPair },
    EnergyPie,
    MotorPie,
}

impl ChartKey {
    /// The owning site's tab index; `None` for the summary pies, which are
    /// independent of per-site state.
    #[must_use]
    pub fn site_index(self) -> Option<usize> {
        match self {
            Self::Gauge { site_index, .. } | Self::Scatter { site_index, .. } => Some(site_index),
            Self::EnergyPie | Self::MotorPie => None,
        }
    }

    /// Canvas id this chart draws on.
    #[must_use]
    pub fn surface_id(self) -> SurfaceId {
        match self {
            Self::Gauge { site_index, metric } => {
                format!("gauge-{site_index}-{}", metric.slug())
            }
            Self::Scatter { site_index, pair } => {
                format!("scatter-{site_index}-{}-{}", pair.x.slug(), pair.y.slug())
            }
            Self::EnergyPie => "pie-energy".to_string(),
            Self::MotorPie => "pie-motors".to_string(),
        }
    }
}

/// Renderer-facing description of one chart. The production factory
/// publishes these for the web view; tests inspect them directly.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Gauge {
        label: String,
        value: f64,
        percent: f64,
        color: String,
    },
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<[f64; 2]>,
    },
    Pie {
        labels: Vec<String>,
        shares: Vec<f64>,
        colors: Vec<String>,
    },
}

/// Opaque reference to one live chart instance, issued by a factory and
/// owned by the lifecycle manager until destroyed.
#[derive(Debug)]
pub struct ChartHandle {
    pub surface: SurfaceId,
    pub instance: u64,
}

/// Capability interface over the concrete charting surface.
///
/// `create` returns `None` when the target surface is not available (for
/// example the page section for that site has not been laid out yet); the
/// caller skips the chart for the cycle and retries on the next one.
pub trait ChartFactory: Send + Sync {
    fn create(&self, surface: &SurfaceId, spec: ChartSpec) -> Option<ChartHandle>;
    fn destroy(&self, handle: ChartHandle);
}
