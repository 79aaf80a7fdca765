use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use utoipa::ToSchema;

use crate::charts::gauge::Metric;
use crate::charts::scatter::SCATTER_PAIRS;
use crate::charts::{ChartFactory, ChartHandle, ChartKey, ChartSpec, SurfaceId};

/// Everything currently drawn, keyed by canvas id. This is the view the
/// web dashboard polls; the scheduler task is its only writer, through the
/// factory below.
#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct RenderedCharts {
    pub charts: BTreeMap<SurfaceId, ChartSpec>,
}

/// Production [`ChartFactory`]: materializes chart specs onto registered
/// surfaces.
///
/// Surfaces exist for the two summary pies from the start; per-site
/// surfaces are registered once the site count is known. A create against
/// an unregistered surface returns `None`, which the lifecycle manager
/// treats as "skip this cycle".
pub struct SurfaceChartFactory {
    surfaces: Mutex<HashSet<SurfaceId>>,
    rendered: Arc<Mutex<RenderedCharts>>,
    next_instance: AtomicU64,
}

impl SurfaceChartFactory {
    #[must_use]
    pub fn new(rendered: Arc<Mutex<RenderedCharts>>) -> Self {
        let mut surfaces = HashSet::new();
        surfaces.insert(ChartKey::EnergyPie.surface_id());
        surfaces.insert(ChartKey::MotorPie.surface_id());

        Self {
            surfaces: Mutex::new(surfaces),
            rendered,
            next_instance: AtomicU64::new(1),
        }
    }

    /// Rebuild the surface set for `site_count` site tabs. Called by the
    /// scheduler after each successful site listing, before rendering.
    pub fn register_site_surfaces(&self, site_count: usize) {
        let mut surfaces = HashSet::new();
        surfaces.insert(ChartKey::EnergyPie.surface_id());
        surfaces.insert(ChartKey::MotorPie.surface_id());

        for site_index in 0..site_count {
            for metric in Metric::ALL {
                surfaces.insert(ChartKey::Gauge { site_index, metric }.surface_id());
            }
            for pair in SCATTER_PAIRS {
                surfaces.insert(ChartKey::Scatter { site_index, pair }.surface_id());
            }
        }

        *self.surfaces.lock().unwrap_or_else(PoisonError::into_inner) = surfaces;
    }
}

impl ChartFactory for SurfaceChartFactory {
    fn create(&self, surface: &SurfaceId, spec: ChartSpec) -> Option<ChartHandle> {
        if !self
            .surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(surface)
        {
            return None;
        }

        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .charts
            .insert(surface.clone(), spec);

        Some(ChartHandle {
            surface: surface.clone(),
            instance: self.next_instance.fetch_add(1, Ordering::Relaxed),
        })
    }

    fn destroy(&self, handle: ChartHandle) {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .charts
            .remove(&handle.surface);
    }
}
