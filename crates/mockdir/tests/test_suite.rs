//! Integration tests for test suite detection, loading and execution
//! against a configuration directory on disk.

use mockdir::testing::{
    has_test_suite, load_test_suite, TestDefinition, TestResponse, TestRunner, NO_ENDPOINT_MESSAGE,
    NO_RULE_MESSAGE,
};
use mockdir::EndpointCollection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ENDPOINT_JSON: &str = r#"
{
    "name": "foo",
    "pathregex": "^/foo/$",
    "responses": [
        {
            "match": {"regex": "test"},
            "response": {
                "file": "content.txt",
                "contenttype": "text/plain"
            }
        },
        {
            "match": {},
            "response": {
                "script": "myscript.rhai",
                "contenttype": "text/xml",
                "replacements": [
                    {"search": "a", "replace": "b"},
                    {"search": "foo", "replace": "bar"}
                ]
            }
        }
    ]
}
"#;

const TESTS_JSON: &str = r#"
[
    {
        "name": "/foo/ request works",
        "requestpath": "/foo/",
        "requestbody": "heisann test",
        "expectedresponsebody": "FOOBARBOOBAR"
    },
    {
        "name": "/foo/ request works",
        "requestpath": "/foo/",
        "requestbody": "heisann test",
        "expectedresponsebody": "file:example.txt"
    },
    {
        "name": "/foo/ request works",
        "requestpath": "/foo/",
        "requestbody": "file:example.txt",
        "expectedresponsebody": "file:example.txt"
    }
]
"#;

fn add_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn without_suite() -> TempDir {
    let dir = TempDir::new().unwrap();
    add_file(dir.path(), "endpoint1/endpoint.json", ENDPOINT_JSON);
    dir
}

fn with_suite() -> TempDir {
    let dir = without_suite();
    add_file(dir.path(), "endpoint1/content.txt", "FOOBARBOOBAR");
    add_file(dir.path(), "endpoint1/myscript.rhai", "body");
    add_file(dir.path(), "tests/tests.json", TESTS_JSON);
    add_file(dir.path(), "tests/example.txt", "FOOBARBOOBAR");
    dir
}

fn definition(json: serde_json::Value) -> TestDefinition {
    serde_json::from_value(json).unwrap()
}

#[test]
fn test_no_suite_detected_without_tests_file() {
    let dir = without_suite();
    assert!(!has_test_suite(dir.path()));
}

#[test]
fn test_endpoint_named_tests_is_not_a_suite() {
    let dir = without_suite();
    add_file(dir.path(), "tests/endpoint.json", ENDPOINT_JSON);
    assert!(!has_test_suite(dir.path()));
}

#[test]
fn test_detects_suite() {
    let dir = with_suite();
    assert!(has_test_suite(dir.path()));
}

#[test]
fn test_reads_tests_from_json_file() {
    let dir = with_suite();
    let cases = load_test_suite(dir.path()).unwrap();

    assert_eq!(cases.len(), 3);
    let first = &cases[0];
    assert_eq!(first.name, "/foo/ request works");
    assert_eq!(first.request_path, "/foo/");
    assert_eq!(first.request_body.as_deref(), Some("heisann test"));
    assert_eq!(first.expected_response_body.as_deref(), Some("FOOBARBOOBAR"));
}

#[test]
fn test_request_body_can_be_read_from_file() {
    let dir = with_suite();
    let cases = load_test_suite(dir.path()).unwrap();
    assert_eq!(cases[2].request_body.as_deref(), Some("FOOBARBOOBAR"));
}

#[test]
fn test_every_suite_case_passes() {
    let dir = with_suite();
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();
    let runner = TestRunner::new(load_test_suite(dir.path()).unwrap());

    for case in runner.cases() {
        let result = case.execute(&collection, false).unwrap();
        assert!(result.is_ok(), "{}", result.render());
    }
    assert!(runner.run(&collection, false).unwrap().all_ok());
}

#[test]
fn test_expected_matcher_mismatch() {
    let dir = with_suite();
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();
    let case = definition(serde_json::json!({
        "name": "checksomething",
        "requestpath": "/foo/",
        "requestbody": "foobar",
        "expectedrequestmatcher": "Regex 'test'"
    }))
    .validated(Path::new("."))
    .unwrap()
    .create_test_case(Path::new("."))
    .unwrap();

    assert!(case.has_expectations());
    assert!(!case.needs_response_body());

    let result = case.execute(&collection, true).unwrap();
    assert!(result.is_failure());
    assert!(result.fault().is_none());
    assert_eq!(
        result.message(),
        Some("Expected request matcher: Regex 'test'\nActual: Any request")
    );
}

#[test]
fn test_expected_matcher_success() {
    let dir = with_suite();
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();
    let case = definition(serde_json::json!({
        "name": "checksomething",
        "requestpath": "/foo/",
        "requestbody": "this is a test",
        "expectedrequestmatcher": "Regex 'test'"
    }))
    .create_test_case(Path::new("."))
    .unwrap();

    assert!(case.execute(&collection, true).unwrap().is_ok());
}

#[test]
fn test_expected_creator_mismatch() {
    let dir = with_suite();
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();
    let case = definition(serde_json::json!({
        "name": "checksomething",
        "requestpath": "/foo/",
        "requestbody": "foobar",
        "expectedresponsecreator": "File content.txt"
    }))
    .create_test_case(Path::new("."))
    .unwrap();

    let result = case.execute(&collection, true).unwrap();
    assert_eq!(
        result.message(),
        Some("Expected response creator: File content.txt\nActual: Execute script myscript.rhai")
    );
}

#[test]
fn test_expected_creator_success() {
    let dir = with_suite();
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();
    let case = definition(serde_json::json!({
        "name": "checksomething",
        "requestpath": "/foo/",
        "requestbody": "this is a test",
        "expectedresponsecreator": "File content.txt"
    }))
    .create_test_case(Path::new("."))
    .unwrap();

    let result = case.execute(&collection, true).unwrap();
    assert!(result.is_ok());
    assert!(result.message().is_none());
}

#[test]
fn test_catch_all_script_applies_replacements_in_order() {
    let dir = with_suite();
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();
    let case = definition(serde_json::json!({
        "name": "replacements",
        "requestpath": "/foo/",
        "requestbody": "a foo",
        "expectedresponsebody": "b bar"
    }))
    .create_test_case(Path::new("."))
    .unwrap();

    let result = case.execute(&collection, false).unwrap();
    assert!(result.is_ok(), "{}", result.render());
}

#[test]
fn test_routing_miss_messages() {
    let dir = with_suite();
    add_file(
        dir.path(),
        "strict/endpoint.json",
        r#"{"name": "strict", "pathregex": "^/strict$", "responses": [
            {"match": {"regex": "^only$"}, "response": {"literal": "x"}}
        ]}"#,
    );
    let collection = EndpointCollection::read_from_directory(dir.path()).unwrap();

    let miss = definition(serde_json::json!({
        "name": "miss", "requestpath": "/nowhere", "expectedresponsebody": "x"
    }))
    .create_test_case(Path::new("."))
    .unwrap();
    assert_eq!(
        miss.execute(&collection, true).unwrap().message(),
        Some(NO_ENDPOINT_MESSAGE)
    );
    assert_eq!(
        miss.get_response(&collection).unwrap(),
        TestResponse::RoutingMiss(NO_ENDPOINT_MESSAGE)
    );

    let no_rule = definition(serde_json::json!({
        "name": "no rule", "requestpath": "/strict", "requestbody": "other", "expectedresponsebody": "x"
    }))
    .create_test_case(Path::new("."))
    .unwrap();
    assert_eq!(
        no_rule.execute(&collection, true).unwrap().message(),
        Some(NO_RULE_MESSAGE)
    );
}

#[test]
fn test_suite_without_expectations_is_rejected() {
    let dir = without_suite();
    add_file(
        dir.path(),
        "tests/tests.json",
        r#"[{"name": "empty", "requestpath": "/foo/"}]"#,
    );
    assert!(load_test_suite(dir.path()).is_err());
}
