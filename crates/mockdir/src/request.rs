//! The in-flight request as seen by matchers, creators and scripts.

use std::collections::HashMap;

/// Request data the resolution engine reads.
///
/// The hosting layer builds one from a hyper request; the test runner builds
/// one from a test case. The query string is kept raw (including a leading
/// `?` when present) so scripts and placeholders see what the client sent.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub path: String,
    pub query_string: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RequestInfo {
    pub fn new(path: impl Into<String>, query_string: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query_string: query_string.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Build from hyper request parts.
    ///
    /// Header names keep hyper's lowercase form. Non-UTF-8 header values are
    /// skipped.
    pub fn from_parts(uri: &hyper::Uri, headers: &hyper::HeaderMap, body: &[u8]) -> Self {
        let header_map = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            path: uri.path().to_string(),
            query_string: uri.query().map(|q| format!("?{q}")).unwrap_or_default(),
            headers: header_map,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// Query parameters, URL-decoded.
    pub fn query(&self) -> HashMap<String, String> {
        parse_query_string(&self.query_string)
    }

    /// Look up a single decoded query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query().remove(name)
    }
}

/// Parse a query string into decoded key/value pairs.
///
/// A leading `?` is ignored. Keys without `=` map to an empty value.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_key = urlencoding::decode(key).unwrap_or_default().into_owned();
            let decoded_value = urlencoding::decode(value).unwrap_or_default().into_owned();
            (decoded_key, decoded_value)
        })
        .collect()
}
