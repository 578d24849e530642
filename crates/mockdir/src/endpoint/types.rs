//! Declarative endpoint definitions (`endpoint.json`) and load errors.

use crate::response::Replacement;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the definition file inside each endpoint directory.
pub const ENDPOINT_FILE: &str = "endpoint.json";

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid endpoint definition {}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{}: invalid path regex '{pattern}'", .path.display())]
    PathRegex {
        path: PathBuf,
        pattern: String,
        source: regex::Error,
    },
    #[error("{}: response {index}: invalid body regex '{pattern}'", .path.display())]
    BodyRegex {
        path: PathBuf,
        index: usize,
        pattern: String,
        source: regex::Error,
    },
    #[error("{}: response {index}: {message}", .path.display())]
    InvalidResponse {
        path: PathBuf,
        index: usize,
        message: String,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointDefinition {
    pub name: String,
    pub pathregex: String,
    #[serde(default)]
    pub responses: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleDefinition {
    #[serde(rename = "match", default)]
    pub matcher: MatchDefinition,
    pub response: ResponseDefinition,
}

/// `{}` accepts everything; `{"regex": p}` searches the body for `p`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MatchDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// Exactly one of `literal`, `file`, `script` or `code` must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Script file, relative to the endpoint directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Inline script source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<Replacement>,
}
