use super::{TestCase, TestSuiteError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TESTS_DIR: &str = "tests";
pub const TESTS_FILE: &str = "tests.json";

const FILE_PREFIX: &str = "file:";

/// True when `directory` has a `tests/tests.json` definition file.
pub fn has_test_suite(directory: impl AsRef<Path>) -> bool {
    tests_file(directory.as_ref()).is_file()
}

/// Read, validate and build every test case of a configuration directory.
pub fn load_test_suite(directory: impl AsRef<Path>) -> Result<Vec<TestCase>, TestSuiteError> {
    let path = tests_file(directory.as_ref());
    let contents = fs::read_to_string(&path).map_err(|source| TestSuiteError::Read {
        path: path.clone(),
        source,
    })?;
    let definitions: Vec<TestDefinition> =
        serde_json::from_str(&contents).map_err(|source| TestSuiteError::Parse {
            path: path.clone(),
            source,
        })?;

    let tests_dir = directory.as_ref().join(TESTS_DIR);
    let cases = definitions
        .iter()
        .map(|definition| definition.validated(&tests_dir)?.create_test_case(&tests_dir))
        .collect::<Result<Vec<_>, _>>()?;

    info!(suite = %path.display(), count = cases.len(), "test suite loaded");
    Ok(cases)
}

fn tests_file(directory: &Path) -> PathBuf {
    directory.join(TESTS_DIR).join(TESTS_FILE)
}

/// One entry of `tests.json`.
///
/// `requestbody` and `expectedresponsebody` may be written as
/// `file:<path>` to load the value from a file in the tests directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub requestpath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub querystring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requestbody: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectedrequestmatcher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectedresponsecreator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectedresponsebody: Option<String>,
}

impl TestDefinition {
    /// Structural checks run before a case is built.
    ///
    /// At least one expectation must be present and every `file:` reference
    /// must name an existing file under `tests_dir`.
    pub fn validated(&self, tests_dir: &Path) -> Result<&Self, TestSuiteError> {
        if self.expectedrequestmatcher.is_none()
            && self.expectedresponsecreator.is_none()
            && self.expectedresponsebody.is_none()
        {
            return Err(TestSuiteError::NoExpectations {
                name: self.name.clone(),
            });
        }

        for value in [&self.requestbody, &self.expectedresponsebody].into_iter().flatten() {
            if let Some(reference) = value.strip_prefix(FILE_PREFIX) {
                let path = tests_dir.join(reference);
                if !path.is_file() {
                    return Err(TestSuiteError::MissingFile {
                        name: self.name.clone(),
                        path,
                    });
                }
            }
        }
        Ok(self)
    }

    /// Build a runnable case, loading `file:` values from `tests_dir`.
    pub fn create_test_case(&self, tests_dir: &Path) -> Result<TestCase, TestSuiteError> {
        Ok(TestCase {
            name: self.name.clone(),
            request_path: self.requestpath.clone(),
            query_string: self.querystring.clone(),
            request_body: load_value(self.requestbody.as_deref(), tests_dir)?,
            expected_request_matcher: self.expectedrequestmatcher.clone(),
            expected_response_creator: self.expectedresponsecreator.clone(),
            expected_response_body: load_value(self.expectedresponsebody.as_deref(), tests_dir)?,
        })
    }
}

fn load_value(value: Option<&str>, tests_dir: &Path) -> Result<Option<String>, TestSuiteError> {
    match value {
        Some(value) => match value.strip_prefix(FILE_PREFIX) {
            Some(reference) => {
                let path = tests_dir.join(reference);
                fs::read_to_string(&path)
                    .map(Some)
                    .map_err(|source| TestSuiteError::Read { path, source })
            }
            None => Ok(Some(value.to_string())),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_expectations_rejected() {
        let definition = TestDefinition {
            name: "empty".into(),
            requestpath: "/foo/".into(),
            ..Default::default()
        };
        assert!(matches!(
            definition.validated(Path::new(".")),
            Err(TestSuiteError::NoExpectations { .. })
        ));
    }

    #[test]
    fn test_missing_referenced_file_rejected() {
        let dir = TempDir::new().unwrap();
        let definition = TestDefinition {
            name: "ref".into(),
            requestbody: Some("file:absent.txt".into()),
            expectedrequestmatcher: Some("Any request".into()),
            ..Default::default()
        };
        assert!(matches!(
            definition.validated(dir.path()),
            Err(TestSuiteError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_file_values_are_loaded_verbatim() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("example.txt"), "FOOBARBOOBAR\n").unwrap();
        let definition = TestDefinition {
            name: "files".into(),
            requestpath: "/foo/".into(),
            requestbody: Some("file:example.txt".into()),
            expectedresponsebody: Some("file:example.txt".into()),
            ..Default::default()
        };

        let case = definition
            .validated(dir.path())
            .unwrap()
            .create_test_case(dir.path())
            .unwrap();
        assert_eq!(case.request_body.as_deref(), Some("FOOBARBOOBAR\n"));
        assert_eq!(case.expected_response_body.as_deref(), Some("FOOBARBOOBAR\n"));
    }

    #[test]
    fn test_query_string_is_kept() {
        let definition = TestDefinition {
            querystring: Some("?foo=bar".into()),
            ..Default::default()
        };
        let case = definition.create_test_case(Path::new(".")).unwrap();
        assert_eq!(case.query_string.as_deref(), Some("?foo=bar"));
    }

    #[test]
    fn test_definition_field_names() {
        let json = r#"{
            "name": "n",
            "requestpath": "/p",
            "querystring": "?q=1",
            "requestbody": "b",
            "expectedrequestmatcher": "Any request",
            "expectedresponsecreator": "Literal response",
            "expectedresponsebody": "r"
        }"#;
        let definition: TestDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.requestpath, "/p");
        assert_eq!(definition.expectedresponsecreator.as_deref(), Some("Literal response"));
    }
}
