/*
* HTTP surface
* ------------
* @project: metrics-orchestrator
*
* GET     /dashboard   current metrics + anomaly verdict + timestamp
* GET     /history     rolling cpu/memory series
* OPTIONS (any)        empty 200, answered by the CORS middleware
*
* Every response, errors and 404s included, carries the permissive CORS
* headers. Bodies are written with a trailing newline.
*/

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::middleware::cors::cors;
use crate::config::Settings;
use crate::dashboard::{DashboardAggregator, DashboardOutcome, SystemClock};
use crate::monitoring::upstream::build_client;
use crate::monitoring::{
    AnomalyChecker, HistoryBuffer, HttpAnomalyProvider, HttpMetricsProvider, MetricsFetcher,
};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<DashboardAggregator>,
}

impl AppState {
    pub fn new(aggregator: Arc<DashboardAggregator>) -> Self {
        Self { aggregator }
    }

    /// Wires the HTTP providers, the shared history and the aggregator.
    pub fn from_settings(settings: &Settings) -> reqwest::Result<Self> {
        let client = build_client(settings.upstream.timeout())?;
        let history = Arc::new(HistoryBuffer::new(settings.history.capacity));

        let fetcher = MetricsFetcher::new(
            Arc::new(HttpMetricsProvider::new(client.clone(), &settings.upstream.metrics_url)),
            Arc::clone(&history),
        );
        let checker = AnomalyChecker::new(
            Arc::new(HttpAnomalyProvider::new(client, &settings.upstream.anomaly_url)),
            Arc::clone(&history),
            settings.history.warmup_samples,
        );

        Ok(Self::new(Arc::new(DashboardAggregator::new(
            fetcher,
            checker,
            history,
            Arc::new(SystemClock),
        ))))
    }
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/history", get(get_history))
        .fallback(fallback_handler)
        .with_state(app_state)
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
}

fn json_response<T: Serialize>(value: &T) -> Result<Response, serde_json::Error> {
    let mut body = serde_json::to_vec(value)?;
    body.push(b'\n');
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let outcome = state
        .aggregator
        .aggregate()
        .await
        .map_err(ApiError::MetricsUnavailable)?;

    if let DashboardOutcome::Replayed(cached) = &outcome {
        debug!(cached_at = cached.timestamp, "Serving stale dashboard");
    }

    json_response(outcome.response().as_ref()).map_err(ApiError::EncodeDashboard)
}

async fn get_history(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let history = state.aggregator.history().await;
    json_response(&history).map_err(ApiError::EncodeHistory)
}

async fn fallback_handler(uri: Uri) -> StatusCode {
    warn!("No route for {}", uri);
    StatusCode::NOT_FOUND
}
