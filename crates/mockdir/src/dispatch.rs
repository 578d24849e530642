//! Resolve a request against a snapshot and generate its response.
//!
//! Used by the HTTP server. Every attempt is counted in metrics and
//! reported to the observer.

use crate::endpoint::EndpointCollection;
use crate::metrics;
use crate::observer::{ResponseObserver, ResponseOutcome, ResponseRecord};
use crate::request::RequestInfo;
use crate::response::{error_chain, GenerationError};
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, warn};

pub const NO_ENDPOINT_MESSAGE: &str = "No endpoint matches request path";
pub const NO_RULE_MESSAGE: &str = "Endpoint has no match for request";

/// Identities of the endpoint, matcher and creator that handled a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub endpoint: String,
    pub matcher: String,
    pub creator: String,
    pub single_match: bool,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Generated {
        route: RouteInfo,
        content_type: String,
        body: Bytes,
    },
    NoEndpoint,
    NoRule {
        endpoint: String,
    },
    Failed {
        route: RouteInfo,
        error: GenerationError,
    },
}

impl DispatchOutcome {
    pub fn outcome(&self) -> ResponseOutcome {
        match self {
            DispatchOutcome::Generated { .. } => ResponseOutcome::Ok,
            DispatchOutcome::NoEndpoint => ResponseOutcome::NoEndpoint,
            DispatchOutcome::NoRule { .. } => ResponseOutcome::NoRule,
            DispatchOutcome::Failed { .. } => ResponseOutcome::Error,
        }
    }
}

pub fn dispatch(
    collection: &EndpointCollection,
    request: &RequestInfo,
    observer: &dyn ResponseObserver,
) -> DispatchOutcome {
    let outcome = resolve_and_generate(collection, request);
    report(request, &outcome, observer);
    outcome
}

fn resolve_and_generate(collection: &EndpointCollection, request: &RequestInfo) -> DispatchOutcome {
    let Some(endpoint) = collection.resolve(&request.path) else {
        debug!(path = %request.path, "no endpoint matches request path");
        return DispatchOutcome::NoEndpoint;
    };

    let Some(resolution) = endpoint.resolve(request) else {
        debug!(endpoint = %endpoint.name(), "endpoint has no match for request");
        return DispatchOutcome::NoRule {
            endpoint: endpoint.name().to_string(),
        };
    };

    let creator = resolution.creator();
    let route = RouteInfo {
        endpoint: endpoint.name().to_string(),
        matcher: resolution.matcher().identity(),
        creator: creator.identity(),
        single_match: resolution.single_match,
    };
    debug!(
        endpoint = %route.endpoint,
        rule = resolution.index,
        matcher = %route.matcher,
        creator = %route.creator,
        single_match = route.single_match,
        "request resolved"
    );

    match creator.generate(request) {
        Ok(body) => DispatchOutcome::Generated {
            route,
            content_type: creator.content_type().to_string(),
            body,
        },
        Err(error) => {
            warn!(
                endpoint = %route.endpoint,
                creator = %route.creator,
                error = %error_chain(&error),
                "response generation failed"
            );
            DispatchOutcome::Failed { route, error }
        }
    }
}

fn report(request: &RequestInfo, outcome: &DispatchOutcome, observer: &dyn ResponseObserver) {
    let kind = outcome.outcome();
    let mut record = ResponseRecord {
        timestamp: Utc::now(),
        path: request.path.clone(),
        query_string: request.query_string.clone(),
        outcome: kind,
        endpoint: None,
        matcher: None,
        creator: None,
        single_match: None,
        error: None,
    };

    match outcome {
        DispatchOutcome::Generated { route, .. } => fill_route(&mut record, route),
        DispatchOutcome::Failed { route, error } => {
            fill_route(&mut record, route);
            record.error = Some(error_chain(error));
        }
        DispatchOutcome::NoRule { endpoint } => record.endpoint = Some(endpoint.clone()),
        DispatchOutcome::NoEndpoint => {}
    }

    metrics::record_request(record.endpoint.as_deref().unwrap_or(""), kind.as_str());
    observer.record(record);
}

fn fill_route(record: &mut ResponseRecord, route: &RouteInfo) {
    record.endpoint = Some(route.endpoint.clone());
    record.matcher = Some(route.matcher.clone());
    record.creator = Some(route.creator.clone());
    record.single_match = Some(route.single_match);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Endpoint, RequestMatcher};
    use crate::observer::ResponseLog;
    use crate::response::{BodySource, ResponseCreator};
    use regex::Regex;

    fn collection() -> EndpointCollection {
        let ep = Endpoint::new("foo", Regex::new("^/foo/$").unwrap(), ".")
            .with_rule(
                RequestMatcher::body_regex("test").unwrap(),
                ResponseCreator::new(BodySource::Literal("matched".into()), ".")
                    .with_content_type("text/xml"),
            )
            .with_rule(
                RequestMatcher::body_regex("missing").unwrap(),
                ResponseCreator::new(BodySource::File("does-not-exist.txt".into()), "."),
            );
        EndpointCollection::new(vec![ep])
    }

    #[test]
    fn test_generated() {
        let log = ResponseLog::new(10);
        let request = RequestInfo::new("/foo/", "?a=1").with_body("a test");

        match dispatch(&collection(), &request, &log) {
            DispatchOutcome::Generated {
                route,
                content_type,
                body,
            } => {
                assert_eq!(route.endpoint, "foo");
                assert_eq!(route.matcher, "Regex 'test'");
                assert_eq!(route.creator, "Literal response");
                assert!(route.single_match);
                assert_eq!(content_type, "text/xml");
                assert_eq!(body, Bytes::from("matched"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, ResponseOutcome::Ok);
        assert_eq!(entries[0].query_string, "?a=1");
    }

    #[test]
    fn test_routing_misses() {
        let log = ResponseLog::new(10);

        let outcome = dispatch(&collection(), &RequestInfo::new("/bar/", ""), &log);
        assert!(matches!(outcome, DispatchOutcome::NoEndpoint));

        let outcome = dispatch(&collection(), &RequestInfo::new("/foo/", "").with_body("nothing"), &log);
        assert!(matches!(outcome, DispatchOutcome::NoRule { ref endpoint } if endpoint == "foo"));

        let outcomes: Vec<ResponseOutcome> = log.entries().iter().map(|r| r.outcome).collect();
        assert_eq!(outcomes, vec![ResponseOutcome::NoEndpoint, ResponseOutcome::NoRule]);
    }

    #[test]
    fn test_generation_failure_is_recorded() {
        let log = ResponseLog::new(10);
        let request = RequestInfo::new("/foo/", "").with_body("missing");

        let outcome = dispatch(&collection(), &request, &log);
        assert!(matches!(
            outcome,
            DispatchOutcome::Failed {
                error: GenerationError::NotFound(_),
                ..
            }
        ));

        let entry = &log.entries()[0];
        assert_eq!(entry.outcome, ResponseOutcome::Error);
        assert!(entry.error.as_deref().unwrap().contains("does-not-exist.txt"));
    }
}
