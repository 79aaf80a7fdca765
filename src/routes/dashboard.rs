use axum::{
    Json,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::PoisonError;
use utoipa::ToSchema;

use crate::charts::RenderedCharts;
use crate::common::AppState;
use crate::refresh::RefreshState;
use crate::routes::sites::{SiteTab, site_tabs};

/// Everything the dashboard page needs for one poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub refresh_state: RefreshState,
    pub active_site: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub sites: Vec<SiteTab>,
    /// Live chart specs keyed by canvas id. Only the active site's charts
    /// (plus the two summary pies) are present.
    pub charts: RenderedCharts,
}

/// Get the rendered dashboard view
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard view retrieved successfully", body = DashboardResponse),
    ),
    tag = "dashboard"
)]
pub async fn dashboard_data(State(state): State<AppState>) -> Json<DashboardResponse> {
    let dashboard = state.dashboard.read().await;
    let charts = state
        .rendered
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    Json(DashboardResponse {
        refresh_state: dashboard.refresh_state,
        active_site: dashboard.active_site,
        last_refresh: dashboard.last_refresh,
        sites: site_tabs(&dashboard.snapshots),
        charts,
    })
}

pub async fn dashboard_page() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Html(DASHBOARD_HTML),
    )
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Fodder Monitor</title>
    <style>
        :root {
            --bg: #f8fafc;
            --surface: #ffffff;
            --border: #e2e8f0;
            --text: #1e293b;
            --muted: #64748b;
            --accent: #2563eb;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: system-ui, -apple-system, sans-serif; background: var(--bg); color: var(--text); min-height: 100vh; }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            padding: 1.5rem;
        }

        header {
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin-bottom: 1.5rem;
            flex-wrap: wrap;
            gap: 1rem;
        }
        h1 { font-size: 1.25rem; font-weight: 600; }
        .refresh-info { font-size: 0.75rem; color: var(--muted); }

        .site-tabs { display: flex; gap: 0.5rem; flex-wrap: wrap; }
        .site-tab {
            padding: 0.5rem 1rem;
            border: 1px solid var(--border);
            border-radius: 0.375rem;
            font-size: 0.875rem;
            background: var(--surface);
            cursor: pointer;
            transition: all 0.15s;
        }
        .site-tab:hover { border-color: var(--accent); color: var(--accent); }
        .site-tab.active { background: var(--accent); border-color: var(--accent); color: white; }

        .panel {
            background: var(--surface);
            border: 1px solid var(--border);
            border-radius: 0.5rem;
            padding: 1rem;
            margin-bottom: 1rem;
        }
        .panel h2 {
            font-size: 0.875rem;
            font-weight: 600;
            color: var(--muted);
            margin-bottom: 0.75rem;
        }

        .gauge-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 1rem; }
        .gauge-cell { text-align: center; }
        .gauge-cell canvas { max-height: 120px; }
        .gauge-label { font-size: 0.75rem; color: var(--muted); margin-top: 0.25rem; }
        .gauge-value { font-size: 0.875rem; font-weight: 600; }

        .scatter-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 1rem; }
        .scatter-cell canvas { max-height: 220px; }

        .pie-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 1rem; }
        .pie-cell { text-align: center; }
        .pie-cell canvas { max-height: 240px; }

        .placeholder {
            text-align: center;
            color: var(--muted);
            padding: 3rem 1rem;
            font-size: 0.875rem;
        }
    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>Fodder Monitor</h1>
            <span class="refresh-info" id="refresh-info">Loading…</span>
        </header>

        <div class="site-tabs" id="site-tabs"></div>
        <div id="content"></div>

        <div class="panel">
            <h2>Summary</h2>
            <div class="pie-grid">
                <div class="pie-cell"><canvas id="pie-energy"></canvas><div class="gauge-label">Energy distribution</div></div>
                <div class="pie-cell"><canvas id="pie-motors"></canvas><div class="gauge-label">Motor status</div></div>
            </div>
        </div>
    </div>

    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
<script>
const METRICS = ['temperature', 'humidity', 'ph', 'height'];
const PAIRS = [['temperature', 'humidity'], ['ph', 'height'], ['motor1', 'motor2']];
const POLL_MS = 3000;

const state = {
    activeSite: 0,
    siteCount: -1,
    charts: {},   // canvas id -> Chart instance
};

const api = url => fetch(url).then(r => r.json());

function destroyCharts() {
    Object.values(state.charts).forEach(chart => chart.destroy());
    state.charts = {};
}

function buildTabs(sites) {
    const container = document.getElementById('site-tabs');
    container.innerHTML = sites.map(s => `
        <button class="site-tab${s.index === state.activeSite ? ' active' : ''}" data-index="${s.index}">${s.name}</button>
    `).join('');
    container.querySelectorAll('.site-tab').forEach(btn => {
        btn.addEventListener('click', async () => {
            const index = Number(btn.dataset.index);
            state.activeSite = index;
            await fetch('/api/active-site', {
                method: 'PUT',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ index }),
            });
            refresh();
        });
    });
}

function buildContent(siteIndex) {
    const gauges = METRICS.map(m => `
        <div class="gauge-cell">
            <canvas id="gauge-${siteIndex}-${m}"></canvas>
            <div class="gauge-label" id="gauge-${siteIndex}-${m}-label"></div>
        </div>
    `).join('');
    const scatters = PAIRS.map(p => `
        <div class="scatter-cell"><canvas id="scatter-${siteIndex}-${p[0]}-${p[1]}"></canvas></div>
    `).join('');
    document.getElementById('content').innerHTML = `
        <div class="panel"><h2>Gauges</h2><div class="gauge-grid">${gauges}</div></div>
        <div class="panel"><h2>History</h2><div class="scatter-grid">${scatters}</div></div>
    `;
}

function drawGauge(canvas, spec) {
    state.charts[canvas.id] = new Chart(canvas, {
        type: 'doughnut',
        data: {
            datasets: [{
                data: [spec.percent, 100 - spec.percent],
                backgroundColor: [spec.color, '#ddd'],
                borderWidth: 0,
            }],
        },
        options: {
            circumference: 180,
            rotation: 270,
            cutout: '70%',
            responsive: true,
            maintainAspectRatio: false,
            plugins: { legend: { display: false }, tooltip: { enabled: false } },
        },
    });
    const label = document.getElementById(canvas.id + '-label');
    if (label) {
        label.innerHTML = `${spec.label}<br><span class="gauge-value">${spec.value.toFixed(1)}</span>`;
    }
}

function drawScatter(canvas, spec) {
    state.charts[canvas.id] = new Chart(canvas, {
        type: 'scatter',
        data: {
            datasets: [{
                data: spec.points.map(p => ({ x: p[0], y: p[1] })),
                backgroundColor: '#2563eb',
            }],
        },
        options: {
            responsive: true,
            maintainAspectRatio: false,
            animation: false,
            plugins: { legend: { display: false } },
            scales: {
                x: { title: { display: true, text: spec.x_label } },
                y: { title: { display: true, text: spec.y_label } },
            },
        },
    });
}

function drawPie(canvas, spec) {
    state.charts[canvas.id] = new Chart(canvas, {
        type: 'pie',
        data: {
            labels: spec.labels,
            datasets: [{
                data: spec.shares,
                backgroundColor: spec.colors,
                borderWidth: 1,
            }],
        },
        options: {
            responsive: true,
            maintainAspectRatio: false,
            plugins: { legend: { position: 'bottom' } },
        },
    });
}

async function refresh() {
    let data;
    try {
        data = await api('/api/dashboard');
    } catch (e) {
        document.getElementById('refresh-info').textContent = 'Connection lost, retrying…';
        return;
    }

    state.activeSite = data.active_site;
    document.getElementById('refresh-info').textContent =
        data.last_refresh ? `Updated ${new Date(data.last_refresh).toLocaleTimeString()}` : data.refresh_state;

    if (!data.sites.length) {
        destroyCharts();
        state.siteCount = 0;
        document.getElementById('site-tabs').innerHTML = '';
        document.getElementById('content').innerHTML = '<div class="placeholder">No data found</div>';
        return;
    }

    buildTabs(data.sites);
    if (state.siteCount !== data.sites.length) {
        state.siteCount = data.sites.length;
    }
    buildContent(data.active_site);

    // The server view is authoritative: drop every instance and recreate
    // from the spec payload.
    destroyCharts();
    for (const [surface, spec] of Object.entries(data.charts.charts)) {
        const canvas = document.getElementById(surface);
        if (!canvas) continue;
        if (spec.kind === 'gauge') drawGauge(canvas, spec);
        else if (spec.kind === 'scatter') drawScatter(canvas, spec);
        else if (spec.kind === 'pie') drawPie(canvas, spec);
    }
}

refresh();
setInterval(refresh, POLL_MS);
</script>
</body>
</html>
"##;
