//! Mock request handling: resolve, generate, write the response.

use super::state::ServerState;
use super::types::*;
use crate::dispatch::{dispatch, DispatchOutcome, RouteInfo, NO_ENDPOINT_MESSAGE, NO_RULE_MESSAGE};
use crate::request::RequestInfo;
use crate::response::error_chain;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::error;

pub async fn handle_mock(req: Request<Incoming>, state: Arc<ServerState>) -> Response<Full<Bytes>> {
    let uri = req.uri().clone();
    let headers = req.headers().clone();
    let body = match collect_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };
    let request = RequestInfo::from_parts(&uri, &headers, &body);

    let snapshot = state.snapshot();
    let observer = state.observer();
    // Scripts and file reads block
    let outcome =
        tokio::task::spawn_blocking(move || dispatch(&snapshot, &request, observer.as_ref())).await;

    match outcome {
        Ok(outcome) => mock_response(outcome),
        Err(e) => {
            error!(error = %e, "response generation task failed");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub fn mock_response(outcome: DispatchOutcome) -> Response<Full<Bytes>> {
    match outcome {
        DispatchOutcome::Generated {
            route,
            content_type,
            body,
        } => {
            let mut headers = route_headers(&route);
            headers.push(("Content-Type", content_type));
            build_response_with_headers(StatusCode::OK, valid_headers(headers), body)
        }
        DispatchOutcome::NoEndpoint => build_response_with_headers(
            StatusCode::NOT_FOUND,
            [(ERROR_HEADER, NO_ENDPOINT_MESSAGE)],
            Bytes::new(),
        ),
        DispatchOutcome::NoRule { endpoint } => build_response_with_headers(
            StatusCode::NOT_FOUND,
            valid_headers(vec![
                (ENDPOINT_HEADER, encode_identity(&endpoint)),
                (ERROR_HEADER, NO_RULE_MESSAGE.to_string()),
            ]),
            Bytes::new(),
        ),
        DispatchOutcome::Failed { route, error } => {
            let mut headers = route_headers(&route);
            headers.push(("Content-Type", "text/plain; charset=utf-8".to_string()));
            build_response_with_headers(
                StatusCode::INTERNAL_SERVER_ERROR,
                valid_headers(headers),
                error_chain(&error),
            )
        }
    }
}

fn route_headers(route: &RouteInfo) -> Vec<(&'static str, String)> {
    vec![
        (ENDPOINT_HEADER, encode_identity(&route.endpoint)),
        (MATCHER_HEADER, encode_identity(&route.matcher)),
        (CREATOR_HEADER, encode_identity(&route.creator)),
    ]
}
