//! Run test cases against a live mockdir server.
//!
//! The server reports the endpoint, matcher and creator that handled each
//! request in percent-encoded response headers, so remote runs judge the
//! same axes as local ones.

use super::{ExecutionFault, TestCase, TestCaseResult, TestOutcome, NO_EXPECTATIONS_MESSAGE};
use crate::server::{decode_identity, CREATOR_HEADER, ERROR_HEADER, MATCHER_HEADER};
use reqwest::StatusCode;
use tracing::debug;

pub async fn execute_remote(
    case: &TestCase,
    client: &reqwest::Client,
    base_url: &str,
    handle_errors: bool,
) -> Result<TestCaseResult, ExecutionFault> {
    match evaluate_remote(case, client, base_url).await {
        Ok(outcome) => Ok(TestCaseResult::new(case.name.clone(), outcome)),
        Err(fault) if handle_errors => {
            debug!(test = %case.name, error = %fault, "remote test case faulted");
            Ok(TestCaseResult::new(case.name.clone(), TestOutcome::Error(fault)))
        }
        Err(fault) => Err(fault),
    }
}

async fn evaluate_remote(
    case: &TestCase,
    client: &reqwest::Client,
    base_url: &str,
) -> Result<TestOutcome, ExecutionFault> {
    let url = format!(
        "{}{}{}",
        base_url.trim_end_matches('/'),
        case.request_path,
        case.raw_query_string()
    );

    let request = match &case.request_body {
        Some(body) => client.post(&url).body(body.clone()),
        None => client.get(&url),
    };
    let response = request
        .send()
        .await
        .map_err(|source| ExecutionFault::Transport {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let routing_error = header(ERROR_HEADER);
    let identity = |name: &str| {
        header(name)
            .and_then(|value| decode_identity(&value))
            .unwrap_or_default()
    };
    let matcher = identity(MATCHER_HEADER);
    let creator = identity(CREATOR_HEADER);

    if status == StatusCode::NOT_FOUND {
        if let Some(message) = routing_error {
            return Ok(TestOutcome::Failure(message));
        }
    }

    let body = response
        .text()
        .await
        .map_err(|source| ExecutionFault::Transport { url, source })?;

    if !status.is_success() {
        return Err(ExecutionFault::Server {
            status: status.as_u16(),
            body,
        });
    }

    if !case.has_expectations() {
        return Ok(TestOutcome::Failure(NO_EXPECTATIONS_MESSAGE.to_string()));
    }

    Ok(case.compare(&matcher, &creator, Some(&body)))
}
