//! Router-level protocol tests.
//!
//! Drives the full datasource router the daemon serves, checking the JSON
//! shapes and status codes a dashboard client sees.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::DateTime;
use gridsource_api::build_router;
use gridsource_core::{Panel, TimeRange, TimeSeries};
use gridsource_registry::{DEFAULT_SOURCE, Registry};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_registry() -> Registry {
    let registry = Registry::new();
    registry.set_metrics([
        "/dc1/rackA/temp",
        "/dc1/rackA/humidity",
        "/dc1/rackB/temp",
        "/dc2/row1/rackC/power",
        "malformed",
    ]);

    let index = registry.index();
    registry.register_finder(DEFAULT_SOURCE, move |fragment: &str| Ok(index.search(fragment)));
    registry.register_reader(DEFAULT_SOURCE, |target: &str, range: TimeRange| {
        let points = (1..=4).filter_map(|i| {
            let ts = DateTime::from_timestamp_millis(i * 15_000)?;
            range.contains(ts).then_some((ts, i as f64))
        });
        Ok(TimeSeries::from_points(target, points))
    });
    registry.register_reader("stor", |_: &str, range: TimeRange| {
        Ok(TimeSeries::new(vec![range.until])
            .with_column("state", ["ok"])?
            .with_column("load", [0.5])?)
    });
    registry.register_annotation_reader("events", |query: &str, range: TimeRange| {
        Ok(TimeSeries::new(vec![range.until]).with_column("title", [query])?)
    });
    registry.register_panel_reader("viz", |target: &str, _| {
        Ok(Panel::html(format!("<svg id=\"{target}\"/>")))
    });
    registry
}

fn router() -> Router {
    build_router(test_registry(), true)
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn minute_range() -> Value {
    json!({"from": "1970-01-01T00:00:00.000Z", "to": "1970-01-01T00:01:00.000Z"})
}

#[tokio::test]
async fn banner_answers_get_and_post() {
    for method in ["GET", "POST"] {
        let req = Request::builder()
            .method(method)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
    }
}

#[tokio::test]
async fn search_respects_minimum_length() {
    let (status, body) = post_json(router(), "/search", json!({"target": "te"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = post_json(router(), "/search", json!({"target": "temp"})).await;
    assert_eq!(body, json!(["/dc1/rackA/temp", "/dc1/rackB/temp"]));
}

#[tokio::test]
async fn search_accepts_get_with_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"target": "humid"}"#))
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!(["/dc1/rackA/humidity"]));
}

#[tokio::test]
async fn query_merges_targets_and_honors_range() {
    let (status, body) = post_json(
        router(),
        "/query",
        json!({
            "range": {"from": "1970-01-01T00:00:15Z", "to": "1970-01-01T00:00:45Z"},
            "targets": [
                {"target": "/dc1/rackA/temp", "refId": "A"},
                {"target": "stor:disk", "type": "table", "refId": "B"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"target": "/dc1/rackA/temp", "datapoints": [[2.0, 30000], [3.0, 45000]]},
            {
                "columns": [
                    {"text": "Time", "type": "time"},
                    {"text": "state", "type": "string"},
                    {"text": "load", "type": "number"}
                ],
                "rows": [[45000, "ok", 0.5]],
                "type": "table"
            }
        ])
    );
}

#[tokio::test]
async fn query_resamples_with_interval() {
    let (_, body) = post_json(
        router(),
        "/query",
        json!({
            "range": minute_range(),
            "intervalMs": 30000,
            "targets": [{"target": "/dc1/rackA/temp"}]
        }),
    )
    .await;
    assert_eq!(
        body,
        json!([{"target": "/dc1/rackA/temp", "datapoints": [[1.5, 30000], [3.5, 60000]]}])
    );
}

#[tokio::test]
async fn query_with_unknown_source_is_not_found() {
    let (status, body) = post_json(
        router(),
        "/query",
        json!({"range": minute_range(), "targets": [{"target": "ghost:x"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn query_with_bad_range_is_bad_request() {
    let (status, _) = post_json(
        router(),
        "/query",
        json!({"range": {"from": "soon", "to": "later"}, "targets": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn query_without_range_is_bad_request_with_json_error() {
    let req = Request::builder()
        .method("POST")
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"targets":[{"target":"cpu"}]}"#))
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("range"));
}

#[tokio::test]
async fn panel_without_query_param_is_bad_request() {
    let req = Request::builder()
        .uri("/panels?from=0&to=60000")
        .body(Body::empty())
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn lenient_target_type_is_served_as_timeserie() {
    let (status, body) = post_json(
        router(),
        "/query",
        json!({
            "range": minute_range(),
            "targets": [
                {"target": "/dc1/rackA/temp", "type": "timeseries"},
                {"target": "/dc1/rackB/temp", "type": null}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let targets: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["target"].as_str().unwrap())
        .collect();
    assert_eq!(targets, vec!["/dc1/rackA/temp", "/dc1/rackB/temp"]);
}

#[tokio::test]
async fn huge_interval_keeps_points() {
    let (status, body) = post_json(
        router(),
        "/query",
        json!({
            "range": minute_range(),
            "intervalMs": 10_000_000_000_000_000u64,
            "targets": [{"target": "/dc1/rackA/temp"}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["datapoints"].as_array().unwrap().len(), 1);
    assert_eq!(body[0]["datapoints"][0][0], 2.5);
}

#[tokio::test]
async fn search_with_colon_uses_default_finder() {
    let (status, body) = post_json(router(), "/search", json!({"target": "temp:max"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn annotations_require_qualified_query() {
    let (status, body) = post_json(
        router(),
        "/annotations",
        json!({"range": minute_range(), "annotation": {"query": "bad-query", "name": "x"}}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Target must be of type: <finder>:<metric_query>, got instead: bad-query"
    );
}

#[tokio::test]
async fn annotations_carry_full_query() {
    let (status, body) = post_json(
        router(),
        "/annotations",
        json!({"range": minute_range(), "annotation": {"query": "events:deploys"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"annotation": "events:deploys", "time": 60000, "title": "deploys"}])
    );
}

#[tokio::test]
async fn panel_passes_content_type_through() {
    let req = Request::builder()
        .uri("/panels?from=0&to=60000&query=viz:cpu")
        .body(Body::empty())
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<svg id=\"cpu\"/>");
}

#[tokio::test]
async fn metrics_lists_siblings() {
    let (_, body) = post_json(
        router(),
        "/metrics",
        json!({"metric": "/dc1/rackA/temp", "payload": {"domain": "dc1", "location": "rackA"}}),
    )
    .await;
    let values: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["/dc1/rackA/temp", "/dc1/rackA/humidity"]);
    assert_eq!(
        body[0]["payloads"][0],
        json!({"name": "domain", "label": "Domain", "type": "input", "reloadMetric": true})
    );
}

#[tokio::test]
async fn payload_options_use_greedy_location() {
    let (_, body) = post_json(
        router(),
        "/metric-payload-options",
        json!({"name": "location", "payload": {"namespace": "dc2"}}),
    )
    .await;
    assert_eq!(body, json!([{"name": "row1/rackC"}]));

    let (_, body) = post_json(
        router(),
        "/metric-payload-options",
        json!({"name": "namespace", "payload": {}}),
    )
    .await;
    assert_eq!(body, json!([{"name": "dc1"}, {"name": "dc2"}]));
}

#[tokio::test]
async fn tag_keys_and_values() {
    let (_, keys) = post_json(router(), "/tag-keys", json!({})).await;
    assert_eq!(keys, json!([{"type": "string", "text": "Domain"}]));

    let (_, values) = post_json(router(), "/tag-values", json!({"key": "Domain"})).await;
    assert_eq!(
        values,
        json!([{"text": "$default"}, {"text": "stor"}, {"text": "events"}, {"text": "viz"}])
    );
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/query")
        .header(header::ORIGIN, "http://dashboard.local")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert!(resp
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn cors_can_be_disabled() {
    let req = Request::builder()
        .method("POST")
        .uri("/tag-keys")
        .header(header::ORIGIN, "http://dashboard.local")
        .body(Body::empty())
        .unwrap();
    let resp = build_router(test_registry(), false).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
