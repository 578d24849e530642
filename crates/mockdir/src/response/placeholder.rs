use crate::request::RequestInfo;
use regex::{Captures, Regex};
use std::path::{Component, Path};
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\(([A-Za-z0-9_.\-]+)\)").expect("valid placeholder regex"))
}

/// Expand `$(name)` placeholders in a resource path template.
///
/// `$(querystring)` is the raw query string without its leading `?`; any
/// other name is looked up as a decoded query parameter. Unknown names
/// expand to nothing.
///
/// Returns `None` when an expanded value is not a single plain path
/// segment, so request data can never move the path out of the template's
/// directory.
pub fn expand_placeholders(template: &str, request: &RequestInfo) -> Option<String> {
    if !template.contains("$(") {
        return Some(template.to_string());
    }

    let query = request.query();
    let mut rejected = false;
    let expanded = placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let value = match &caps[1] {
                "querystring" => request.query_string.trim_start_matches('?').to_string(),
                name => query.get(name).cloned().unwrap_or_default(),
            };
            if !is_plain_segment(&value) {
                rejected = true;
            }
            value
        })
        .into_owned();

    (!rejected).then_some(expanded)
}

/// Empty, or exactly one normal path component with no separators.
fn is_plain_segment(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if value.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_is_unchanged() {
        let request = RequestInfo::new("/a", "?id=1");
        assert_eq!(expand_placeholders("content.txt", &request).unwrap(), "content.txt");
    }

    #[test]
    fn test_query_parameter() {
        let request = RequestInfo::new("/a", "?id=42&lang=no");
        assert_eq!(
            expand_placeholders("orders/$(id)_$(lang).xml", &request).unwrap(),
            "orders/42_no.xml"
        );
    }

    #[test]
    fn test_raw_querystring() {
        let request = RequestInfo::new("/a", "?file1");
        assert_eq!(expand_placeholders("$(querystring).txt", &request).unwrap(), "file1.txt");
    }

    #[test]
    fn test_missing_parameter_expands_to_empty() {
        let request = RequestInfo::new("/a", "");
        assert_eq!(expand_placeholders("$(id).xml", &request).unwrap(), ".xml");
    }

    #[test]
    fn test_traversal_values_are_rejected() {
        for query in ["?../secret.txt", "?/etc/passwd", "?..", "?a\\b", "?."] {
            let request = RequestInfo::new("/a", query);
            assert_eq!(expand_placeholders("$(querystring)", &request), None, "{query}");
        }

        let request = RequestInfo::new("/a", "?id=..%2Fsecret");
        assert_eq!(expand_placeholders("$(id).xml", &request), None);
    }

    #[test]
    fn test_template_directories_are_kept() {
        let request = RequestInfo::new("/a", "?id=7");
        assert_eq!(
            expand_placeholders("../shared/$(id).xml", &request).unwrap(),
            "../shared/7.xml"
        );
    }
}
