//! Admin API routes under `/__mockdir`.

use super::state::ServerState;
use super::types::*;
use crate::metrics;
use crate::testing::{has_test_suite, load_test_suite, TestRunSummary, TestRunner};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub async fn route_admin(
    method: &Method,
    path: &str,
    state: Arc<ServerState>,
) -> Response<Full<Bytes>> {
    let route = path.strip_prefix(ADMIN_PREFIX).unwrap_or(path);
    debug!("Admin API: {} {}", method, path);

    match (method, route) {
        (&Method::GET, "" | "/") => handle_root(),
        (&Method::GET, "/health") => json_response(StatusCode::OK, &json!({"status": "ok"})),
        (&Method::GET, "/endpoints") => handle_endpoints(&state),
        (&Method::POST, "/reload") => handle_reload(&state),
        (&Method::GET, "/responses") => {
            json_response(StatusCode::OK, &json!({"responses": state.responses().entries()}))
        }
        (&Method::DELETE, "/responses") => {
            state.responses().clear();
            json_response(StatusCode::OK, &json!({"cleared": true}))
        }
        (&Method::GET, "/tests") => handle_tests(state).await,
        (&Method::GET, "/metrics") => build_response_with_headers(
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics::collect_metrics(),
        ),
        _ => not_found(),
    }
}

fn handle_root() -> Response<Full<Bytes>> {
    let link = |rel: &str| json!({"href": format!("{ADMIN_PREFIX}/{rel}")});
    let body = json!({
        "_links": {
            "health": link("health"),
            "endpoints": link("endpoints"),
            "reload": link("reload"),
            "responses": link("responses"),
            "tests": link("tests"),
            "metrics": link("metrics")
        }
    });
    json_response(StatusCode::OK, &body)
}

fn handle_endpoints(state: &ServerState) -> Response<Full<Bytes>> {
    let snapshot = state.snapshot();
    let endpoints: Vec<EndpointSummary> =
        snapshot.endpoints().iter().map(EndpointSummary::from).collect();
    let mut body = json!({
        "directory": state.directory().display().to_string(),
        "endpoints": endpoints,
    });
    if let Some(stats) = state.scripts().cache_stats() {
        body["scriptCache"] = json!({"hits": stats.hits, "misses": stats.misses, "size": stats.size});
    }
    json_response(StatusCode::OK, &body)
}

fn handle_reload(state: &ServerState) -> Response<Full<Bytes>> {
    match state.reload() {
        Ok(count) => json_response(StatusCode::OK, &json!({"reloaded": true, "endpoints": count})),
        Err(e) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &crate::response::error_chain(&e),
        ),
    }
}

async fn handle_tests(state: Arc<ServerState>) -> Response<Full<Bytes>> {
    if !has_test_suite(state.directory()) {
        return error_response(StatusCode::NOT_FOUND, "Configuration has no test suite");
    }

    let result = tokio::task::spawn_blocking(move || -> Result<TestRunSummary, String> {
        let cases = load_test_suite(state.directory()).map_err(|e| crate::response::error_chain(&e))?;
        TestRunner::new(cases)
            .run(&state.snapshot(), true)
            .map_err(|e| e.to_string())
    })
    .await;

    match result {
        Ok(Ok(summary)) => json_response(
            StatusCode::OK,
            &json!({
                "total": summary.results.len(),
                "passed": summary.passed(),
                "failed": summary.failed(),
                "errors": summary.errors(),
                "results": summary.reports(),
            }),
        ),
        Ok(Err(message)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &message),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
