use super::{NO_ENDPOINT_MESSAGE, NO_EXPECTATIONS_MESSAGE, NO_RULE_MESSAGE};
use crate::endpoint::EndpointCollection;
use crate::request::RequestInfo;
use crate::response::GenerationError;
use std::error::Error as _;
use tracing::debug;

/// A fault that stopped a test case from being judged.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionFault {
    #[error("response generation failed")]
    Generation(#[from] GenerationError),
    #[error("request to {url} failed")]
    Transport { url: String, source: reqwest::Error },
    #[error("server answered {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Debug)]
pub enum TestOutcome {
    Success,
    /// An expectation did not hold, or the request was not routed.
    Failure(String),
    Error(ExecutionFault),
}

/// The result of one test case execution.
#[derive(Debug)]
pub struct TestCaseResult {
    pub name: String,
    pub outcome: TestOutcome,
}

impl TestCaseResult {
    pub fn new(name: impl Into<String>, outcome: TestOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, TestOutcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, TestOutcome::Failure(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, TestOutcome::Error(_))
    }

    /// Assertion or routing message, if the case failed.
    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            TestOutcome::Failure(message) => Some(message),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&ExecutionFault> {
        match &self.outcome {
            TestOutcome::Error(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self.outcome {
            TestOutcome::Success => "OK",
            TestOutcome::Failure(_) => "Fail",
            TestOutcome::Error(_) => "Error",
        }
    }

    /// `OK`, or the status followed by indented detail lines.
    pub fn render(&self) -> String {
        match &self.outcome {
            TestOutcome::Success => self.status().to_string(),
            TestOutcome::Failure(message) => format!("{}\n{}", self.status(), indent(message)),
            TestOutcome::Error(fault) => {
                let mut rendered = format!("{}\n{}", self.status(), indent(&fault.to_string()));
                let mut cause = fault.source();
                while let Some(error) = cause {
                    rendered.push('\n');
                    rendered.push_str(&indent(&error.to_string()));
                    cause = error.source();
                }
                rendered
            }
        }
    }
}

fn indent(text: &str) -> String {
    format!("    {}", text.replace('\n', "\n    "))
}

/// What an endpoint currently returns for a test's request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResponse {
    Body(String),
    RoutingMiss(&'static str),
}

/// A canned request with expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub request_path: String,
    pub query_string: Option<String>,
    pub request_body: Option<String>,
    pub expected_request_matcher: Option<String>,
    pub expected_response_creator: Option<String>,
    pub expected_response_body: Option<String>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, request_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request_path: request_path.into(),
            ..Default::default()
        }
    }

    pub fn has_expectations(&self) -> bool {
        self.expected_request_matcher.is_some()
            || self.expected_response_creator.is_some()
            || self.expected_response_body.is_some()
    }

    pub fn needs_response_body(&self) -> bool {
        self.expected_response_body.is_some()
    }

    /// Query string as a request carries it, with a leading `?`.
    pub fn raw_query_string(&self) -> String {
        match self.query_string.as_deref() {
            None | Some("") => String::new(),
            Some(q) if q.starts_with('?') => q.to_string(),
            Some(q) => format!("?{q}"),
        }
    }

    pub fn request(&self) -> RequestInfo {
        RequestInfo::new(self.request_path.clone(), self.raw_query_string())
            .with_body(self.request_body.clone().unwrap_or_default())
    }

    /// Run the case against a collection.
    ///
    /// Faults are captured into the result when `handle_errors` is set and
    /// returned as `Err` otherwise. Routing misses and failed expectations
    /// are always results.
    pub fn execute(
        &self,
        collection: &EndpointCollection,
        handle_errors: bool,
    ) -> Result<TestCaseResult, ExecutionFault> {
        match self.evaluate(collection) {
            Ok(outcome) => Ok(TestCaseResult::new(self.name.clone(), outcome)),
            Err(fault) if handle_errors => {
                debug!(test = %self.name, error = %fault, "test case faulted");
                Ok(TestCaseResult::new(self.name.clone(), TestOutcome::Error(fault)))
            }
            Err(fault) => Err(fault),
        }
    }

    fn evaluate(&self, collection: &EndpointCollection) -> Result<TestOutcome, ExecutionFault> {
        let Some(endpoint) = collection.resolve(&self.request_path) else {
            return Ok(TestOutcome::Failure(NO_ENDPOINT_MESSAGE.to_string()));
        };

        let request = self.request();
        let Some(resolution) = endpoint.resolve(&request) else {
            return Ok(TestOutcome::Failure(NO_RULE_MESSAGE.to_string()));
        };

        if !self.has_expectations() {
            return Ok(TestOutcome::Failure(NO_EXPECTATIONS_MESSAGE.to_string()));
        }

        let body = if self.needs_response_body() {
            let bytes = resolution.creator().generate(&request)?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };

        Ok(self.compare(
            &resolution.matcher().identity(),
            &resolution.creator().identity(),
            body.as_deref(),
        ))
    }

    /// Judge actual identities and body against the expectations.
    ///
    /// Axes are checked in order (matcher, creator, body) and the first
    /// mismatch becomes the failure message.
    pub fn compare(&self, matcher: &str, creator: &str, body: Option<&str>) -> TestOutcome {
        if let Some(expected) = &self.expected_request_matcher {
            if expected != matcher {
                return TestOutcome::Failure(format!(
                    "Expected request matcher: {expected}\nActual: {matcher}"
                ));
            }
        }

        if let Some(expected) = &self.expected_response_creator {
            if expected != creator {
                return TestOutcome::Failure(format!(
                    "Expected response creator: {expected}\nActual: {creator}"
                ));
            }
        }

        if let Some(expected) = &self.expected_response_body {
            let actual = body.unwrap_or_default();
            if expected != actual {
                return TestOutcome::Failure(format!(
                    "Expected response body: {expected}\nActual: {actual}"
                ));
            }
        }

        TestOutcome::Success
    }

    /// Resolve and generate without asserting anything.
    pub fn get_response(
        &self,
        collection: &EndpointCollection,
    ) -> Result<TestResponse, GenerationError> {
        let Some(endpoint) = collection.resolve(&self.request_path) else {
            return Ok(TestResponse::RoutingMiss(NO_ENDPOINT_MESSAGE));
        };
        let request = self.request();
        let Some(resolution) = endpoint.resolve(&request) else {
            return Ok(TestResponse::RoutingMiss(NO_RULE_MESSAGE));
        };
        let bytes = resolution.creator().generate(&request)?;
        Ok(TestResponse::Body(String::from_utf8_lossy(&bytes).into_owned()))
    }
}
