//! Response helpers and JSON views shared by the mock handler and admin API.

use crate::endpoint::Endpoint;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

/// Path prefix reserved for the admin API.
pub const ADMIN_PREFIX: &str = "/__mockdir";

/// Identity headers carry percent-encoded text so any identity fits on the
/// wire. Read them back with [`decode_identity`].
pub const ENDPOINT_HEADER: &str = "x-mockdir-endpoint";
pub const MATCHER_HEADER: &str = "x-mockdir-matcher";
pub const CREATOR_HEADER: &str = "x-mockdir-creator";
/// Carries the routing-miss message on 404 responses.
pub const ERROR_HEADER: &str = "x-mockdir-error";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EndpointSummary {
    pub name: String,
    pub pathregex: String,
    pub directory: String,
    pub rules: Vec<RuleSummary>,
}

#[derive(Debug, Serialize)]
pub struct RuleSummary {
    pub matcher: String,
    pub creator: String,
    pub contenttype: String,
}

impl From<&Endpoint> for EndpointSummary {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            name: endpoint.name().to_string(),
            pathregex: endpoint.path_pattern().to_string(),
            directory: endpoint.directory().display().to_string(),
            rules: endpoint
                .rules()
                .iter()
                .map(|rule| RuleSummary {
                    matcher: rule.matcher.identity(),
                    creator: rule.creator.identity(),
                    contenttype: rule.creator.content_type().to_string(),
                })
                .collect(),
        }
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response_with_headers(status, [("Content-Type", "text/plain; charset=utf-8")], body)
}

/// Build a response, falling back to a bare 500 if the builder rejects
/// its inputs.
pub fn build_response_with_headers<K, V>(
    status: StatusCode,
    headers: impl IntoIterator<Item = (K, V)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(Full::new(body.into())).unwrap_or_else(|_| {
        let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Keep only headers whose values are legal on the wire.
///
/// Identities can contain arbitrary regex text; a header that cannot be
/// encoded is dropped instead of failing the whole response.
pub fn valid_headers(headers: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
    headers
        .into_iter()
        .filter(|(name, value)| {
            let valid = HeaderValue::from_str(value).is_ok();
            if !valid {
                debug!(header = %name, value = %value, "dropping header that cannot be encoded");
            }
            valid
        })
        .collect()
}

pub fn encode_identity(identity: &str) -> String {
    urlencoding::encode(identity).into_owned()
}

/// Inverse of [`encode_identity`]; `None` when the value is not valid
/// percent-encoded UTF-8.
pub fn decode_identity(value: &str) -> Option<String> {
    urlencoding::decode(value).ok().map(|decoded| decoded.into_owned())
}

pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: status.as_u16(),
            message: message.to_string(),
        },
    };
    json_response(status, &error)
}

pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    use http_body_util::BodyExt;
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let resp = json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn test_error_response() {
        let resp = error_response(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_header_falls_back_to_500() {
        let resp = build_response_with_headers(StatusCode::OK, [("x-bad", "line\nbreak")], "body");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_valid_headers_drops_unencodable_values() {
        let headers = valid_headers(vec![
            (MATCHER_HEADER, "Regex 'ok'".to_string()),
            (CREATOR_HEADER, "File \u{e6}.txt".to_string()),
        ]);
        assert_eq!(headers, vec![(MATCHER_HEADER, "Regex 'ok'".to_string())]);
    }

    #[test]
    fn test_identity_encoding() {
        let encoded = encode_identity("File \u{e6}.txt");
        assert!(HeaderValue::from_str(&encoded).is_ok());
        assert_eq!(decode_identity(&encoded).as_deref(), Some("File \u{e6}.txt"));
        assert_eq!(decode_identity("Regex%20%27100%25%27").as_deref(), Some("Regex '100%'"));
    }
}
