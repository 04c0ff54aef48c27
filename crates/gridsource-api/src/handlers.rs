//! HTTP handlers for the datasource protocol.
//!
//! Each handler decodes the request, hands it to the
//! [`RequestDispatcher`](crate::RequestDispatcher) and returns the raw
//! JSON array the dashboard client expects.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::info;

use gridsource_protocol::{
    AnnotationRequest, MetricsRequest, PanelQuery, PayloadOptionsRequest, QueryRequest,
    SearchRequest, TagValuesRequest,
};

use crate::ApiState;
use crate::extract::{ApiJson, ApiQuery};

const BANNER: &str = "gridsource: generic metrics datasource. \
    Query registered sources through /search, /query, /annotations and /panels.";

/// GET|POST /
pub async fn test_datasource() -> impl IntoResponse {
    info!("request to / (datasource test)");
    (StatusCode::OK, BANNER)
}

// ── Discovery ──────────────────────────────────────────────────

/// POST /search
pub async fn search_metrics(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> impl IntoResponse {
    info!(fragment = %req.target, "request to /search");
    match state.dispatcher.search(&req).await {
        Ok(names) => Json(names).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /metrics
pub async fn find_metrics(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<MetricsRequest>,
) -> impl IntoResponse {
    info!(metric = ?req.metric, "request to /metrics");
    Json(state.dispatcher.metrics(&req))
}

/// POST /metric-payload-options
pub async fn payload_options(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<PayloadOptionsRequest>,
) -> impl IntoResponse {
    info!(name = %req.name, "request to /metric-payload-options");
    Json(state.dispatcher.payload_options(&req))
}

/// POST /tag-keys. The request body is ignored.
pub async fn tag_keys(State(state): State<ApiState>) -> impl IntoResponse {
    info!("request to /tag-keys");
    Json(state.dispatcher.tag_keys())
}

/// POST /tag-values
pub async fn tag_values(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TagValuesRequest>,
) -> impl IntoResponse {
    info!(key = %req.key, "request to /tag-values");
    Json(state.dispatcher.tag_values(&req))
}

// ── Data ───────────────────────────────────────────────────────

/// POST /query
pub async fn query_metrics(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<QueryRequest>,
) -> impl IntoResponse {
    info!(targets = req.targets.len(), "request to /query");
    match state.dispatcher.query(&req).await {
        Ok(blocks) => Json(blocks).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /annotations
pub async fn query_annotations(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<AnnotationRequest>,
) -> impl IntoResponse {
    info!(query = %req.annotation.query, "request to /annotations");
    match state.dispatcher.annotations(&req).await {
        Ok(annotations) => Json(annotations).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /panels?from=<ms>&to=<ms>&query=<source:target>
pub async fn get_panel(
    State(state): State<ApiState>,
    ApiQuery(req): ApiQuery<PanelQuery>,
) -> impl IntoResponse {
    info!(query = %req.query, "request to /panels");
    match state.dispatcher.panel(&req).await {
        Ok(panel) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, panel.content_type)],
            panel.body,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
