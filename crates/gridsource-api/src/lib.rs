//! gridsource-api: HTTP surface of the generic metrics datasource.
//!
//! Decodes the dashboard client's JSON requests, dispatches them through
//! the source registry and answers with the raw JSON arrays the client
//! expects.
//!
//! # API Routes
//!
//! Every route accepts both GET and POST.
//!
//! | Path | Description |
//! |---|---|
//! | `/` | Connectivity check banner |
//! | `/search` | Metric names matching a search fragment |
//! | `/metrics` | Metric picker options with editor payloads |
//! | `/metric-payload-options` | Domains or locations for a payload input |
//! | `/tag-keys` | Ad-hoc filter keys |
//! | `/tag-values` | Values for an ad-hoc filter key |
//! | `/query` | Time series and table data |
//! | `/annotations` | Events for a qualified annotation query |
//! | `/panels` | Backend-rendered panel, content type passed through |

pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod handlers;

pub use dispatcher::{DOMAIN_TAG, MIN_SEARCH_LEN, RequestDispatcher};
pub use error::{ApiError, ApiResult};

use axum::Router;
use axum::routing::get;
use gridsource_registry::Registry;
use tower_http::cors::CorsLayer;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: RequestDispatcher,
}

/// Build the datasource router over `registry`.
pub fn build_router(registry: Registry, cors: bool) -> Router {
    let state = ApiState {
        dispatcher: RequestDispatcher::new(registry),
    };

    let router = Router::new()
        .route("/", get(handlers::test_datasource).post(handlers::test_datasource))
        .route("/search", get(handlers::search_metrics).post(handlers::search_metrics))
        .route("/metrics", get(handlers::find_metrics).post(handlers::find_metrics))
        .route(
            "/metric-payload-options",
            get(handlers::payload_options).post(handlers::payload_options),
        )
        .route("/tag-keys", get(handlers::tag_keys).post(handlers::tag_keys))
        .route("/tag-values", get(handlers::tag_values).post(handlers::tag_values))
        .route("/query", get(handlers::query_metrics).post(handlers::query_metrics))
        .route(
            "/annotations",
            get(handlers::query_annotations).post(handlers::query_annotations),
        )
        .route("/panels", get(handlers::get_panel).post(handlers::get_panel))
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
