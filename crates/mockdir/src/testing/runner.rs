use super::remote::execute_remote;
use super::{ExecutionFault, TestCase, TestCaseResult, TestOutcome};
use crate::endpoint::EndpointCollection;
use serde::Serialize;
use tracing::info;

/// Runs the cases of a suite in order.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    cases: Vec<TestCase>,
}

impl TestRunner {
    pub fn new(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Execute every case. With `handle_errors` unset the first fault aborts
    /// the run.
    pub fn run(
        &self,
        collection: &EndpointCollection,
        handle_errors: bool,
    ) -> Result<TestRunSummary, ExecutionFault> {
        let mut summary = TestRunSummary::default();
        for (index, case) in self.cases.iter().enumerate() {
            summary.push(index, case.execute(collection, handle_errors)?);
        }
        summary.log();
        Ok(summary)
    }

    /// Execute a single case by position, `None` when out of range.
    pub fn run_one(
        &self,
        index: usize,
        collection: &EndpointCollection,
        handle_errors: bool,
    ) -> Option<Result<TestCaseResult, ExecutionFault>> {
        self.cases
            .get(index)
            .map(|case| case.execute(collection, handle_errors))
    }

    /// Execute every case against a running server.
    pub async fn run_remote(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        handle_errors: bool,
    ) -> Result<TestRunSummary, ExecutionFault> {
        let mut summary = TestRunSummary::default();
        for (index, case) in self.cases.iter().enumerate() {
            summary.push(index, execute_remote(case, client, base_url, handle_errors).await?);
        }
        summary.log();
        Ok(summary)
    }
}

/// Results of a run, in case order.
#[derive(Debug, Default)]
pub struct TestRunSummary {
    pub results: Vec<(usize, TestCaseResult)>,
}

impl TestRunSummary {
    pub fn push(&mut self, index: usize, result: TestCaseResult) {
        self.results.push((index, result));
    }

    pub fn passed(&self) -> usize {
        self.count(TestCaseResult::is_ok)
    }

    pub fn failed(&self) -> usize {
        self.count(TestCaseResult::is_failure)
    }

    pub fn errors(&self) -> usize {
        self.count(TestCaseResult::is_error)
    }

    pub fn all_ok(&self) -> bool {
        self.passed() == self.results.len()
    }

    fn count(&self, predicate: fn(&TestCaseResult) -> bool) -> usize {
        self.results.iter().filter(|(_, r)| predicate(r)).count()
    }

    fn log(&self) {
        info!(
            total = self.results.len(),
            passed = self.passed(),
            failed = self.failed(),
            errors = self.errors(),
            "test run finished"
        );
    }

    pub fn reports(&self) -> Vec<TestReport> {
        self.results
            .iter()
            .map(|(index, result)| TestReport::new(*index, result))
            .collect()
    }
}

/// Serializable view of one result.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub index: usize,
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub rendered: String,
}

impl TestReport {
    pub fn new(index: usize, result: &TestCaseResult) -> Self {
        let message = match &result.outcome {
            TestOutcome::Success => None,
            TestOutcome::Failure(message) => Some(message.clone()),
            TestOutcome::Error(fault) => Some(fault.to_string()),
        };
        Self {
            index,
            name: result.name.clone(),
            status: result.status(),
            message,
            rendered: result.render(),
        }
    }
}
