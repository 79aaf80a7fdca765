pub mod dashboard;
pub mod health;
mod rate_limit;
pub mod sites;

use axum::{Router, routing::get, routing::put};
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

use rate_limit::FallbackIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        dashboard::dashboard_data,
        sites::list_sites,
        sites::get_site_snapshot,
        sites::set_active_site,
    ),
    components(
        schemas(
            crate::source::Site,
            crate::source::Reading,
            crate::dashboard::SiteSnapshot,
            crate::charts::ChartSpec,
            crate::charts::RenderedCharts,
            crate::refresh::RefreshState,
            dashboard::DashboardResponse,
            health::HealthResponse,
            sites::SiteTab,
            sites::ActiveSiteRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "dashboard", description = "Rendered dashboard view"),
        (name = "sites", description = "Site tabs and snapshots"),
    ),
    info(
        title = "Fodder Monitor API",
        description = "Greenhouse monitoring dashboard for hydroponic fodder chambers",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
            "Rate limiting configured"
        );
    }

    let api_routes_base = Router::new()
        .route("/dashboard", get(dashboard::dashboard_data))
        .route("/sites", get(sites::list_sites))
        .route("/sites/{index}/snapshot", get(sites::get_site_snapshot))
        .route("/active-site", put(sites::set_active_site));

    let api_routes = if config.disable_rate_limiting {
        api_routes_base
    } else {
        let limiter = GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
            .expect("Failed to create rate limiter");

        api_routes_base.layer(GovernorLayer {
            config: Arc::new(limiter),
        })
    }
    .layer(RequestBodyLimitLayer::new(64 * 1024)); // 64KB body limit

    // Dashboard page and health check (NO rate limiting)
    let page_routes = Router::new()
        .route("/", get(dashboard::dashboard_page))
        .route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
