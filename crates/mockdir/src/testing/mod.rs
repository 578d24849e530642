//! Declarative test cases for a configuration directory.
//!
//! A test case replays a canned request through endpoint resolution and
//! asserts on up to three axes: the matcher that accepted it, the creator
//! chosen, and the body produced. Suites live in `tests/tests.json` next to
//! the endpoint directories.

mod case;
mod remote;
mod runner;
mod suite;

pub use case::{ExecutionFault, TestCase, TestCaseResult, TestOutcome, TestResponse};
pub use remote::execute_remote;
pub use runner::{TestReport, TestRunSummary, TestRunner};
pub use suite::{has_test_suite, load_test_suite, TestDefinition, TESTS_DIR, TESTS_FILE};

pub use crate::dispatch::{NO_ENDPOINT_MESSAGE, NO_RULE_MESSAGE};

pub const NO_EXPECTATIONS_MESSAGE: &str = "Test case has no expectations";

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TestSuiteError {
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid test definitions in {}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("test '{name}' has no expectations")]
    NoExpectations { name: String },
    #[error("test '{name}' references missing file {}", .path.display())]
    MissingFile { name: String, path: PathBuf },
}
