//! Build endpoints from a configuration directory.
//!
//! Each immediate subdirectory holding an `endpoint.json` becomes one
//! endpoint. Subdirectories are visited in name order, which is the
//! declaration order used for path resolution.

use super::core::Endpoint;
use super::matcher::RequestMatcher;
use super::types::{
    EndpointDefinition, EndpointError, MatchDefinition, ResponseDefinition, ENDPOINT_FILE,
};
use crate::response::{BodySource, ResponseCreator, ScriptSource};
use crate::scripting::ScriptRuntime;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub fn read_endpoints(
    directory: &Path,
    scripts: &Arc<ScriptRuntime>,
) -> Result<Vec<Endpoint>, EndpointError> {
    let root = std::path::absolute(directory).unwrap_or_else(|_| directory.to_path_buf());
    let entries = fs::read_dir(&root).map_err(|source| EndpointError::Read {
        path: root.clone(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.join(ENDPOINT_FILE).is_file())
        .collect();
    candidates.sort();

    let mut endpoints = Vec::with_capacity(candidates.len());
    for endpoint_dir in candidates {
        let endpoint = load_endpoint(&endpoint_dir, scripts)?;
        debug!(
            endpoint = %endpoint.name(),
            pattern = %endpoint.path_pattern(),
            rules = endpoint.rules().len(),
            "loaded endpoint"
        );
        endpoints.push(endpoint);
    }

    info!(directory = %root.display(), count = endpoints.len(), "endpoints loaded");
    Ok(endpoints)
}

/// Load a single endpoint directory.
pub fn load_endpoint(
    endpoint_dir: &Path,
    scripts: &Arc<ScriptRuntime>,
) -> Result<Endpoint, EndpointError> {
    let file = endpoint_dir.join(ENDPOINT_FILE);
    let contents = fs::read_to_string(&file).map_err(|source| EndpointError::Read {
        path: file.clone(),
        source,
    })?;
    let definition: EndpointDefinition =
        serde_json::from_str(&contents).map_err(|source| EndpointError::Parse {
            path: file.clone(),
            source,
        })?;

    build_endpoint(definition, endpoint_dir, &file, scripts)
}

fn build_endpoint(
    definition: EndpointDefinition,
    endpoint_dir: &Path,
    file: &Path,
    scripts: &Arc<ScriptRuntime>,
) -> Result<Endpoint, EndpointError> {
    let path_regex = Regex::new(&definition.pathregex).map_err(|source| EndpointError::PathRegex {
        path: file.to_path_buf(),
        pattern: definition.pathregex.clone(),
        source,
    })?;

    let mut endpoint = Endpoint::new(definition.name, path_regex, endpoint_dir);
    for (index, rule) in definition.responses.into_iter().enumerate() {
        let matcher = build_matcher(&rule.matcher, file, index)?;
        let creator = build_creator(rule.response, endpoint_dir, file, index)?
            .with_scripts(Arc::clone(scripts));
        endpoint = endpoint.with_rule(matcher, creator);
    }
    Ok(endpoint)
}

fn build_matcher(
    definition: &MatchDefinition,
    file: &Path,
    index: usize,
) -> Result<RequestMatcher, EndpointError> {
    match &definition.regex {
        None => Ok(RequestMatcher::Any),
        Some(pattern) => {
            RequestMatcher::body_regex(pattern).map_err(|source| EndpointError::BodyRegex {
                path: file.to_path_buf(),
                index,
                pattern: pattern.clone(),
                source,
            })
        }
    }
}

fn build_creator(
    definition: ResponseDefinition,
    endpoint_dir: &Path,
    file: &Path,
    index: usize,
) -> Result<ResponseCreator, EndpointError> {
    let mut sources = Vec::new();
    if let Some(text) = definition.literal {
        sources.push(BodySource::Literal(text));
    }
    if let Some(path) = definition.file {
        sources.push(BodySource::File(path));
    }
    if let Some(path) = definition.script {
        sources.push(BodySource::Script(ScriptSource::File(path)));
    }
    if let Some(code) = definition.code {
        sources.push(BodySource::Script(ScriptSource::Inline(code)));
    }

    let body = match sources.len() {
        1 => sources.remove(0),
        0 => {
            return Err(EndpointError::InvalidResponse {
                path: file.to_path_buf(),
                index,
                message: "one of 'literal', 'file', 'script' or 'code' is required".to_string(),
            })
        }
        _ => {
            return Err(EndpointError::InvalidResponse {
                path: file.to_path_buf(),
                index,
                message: "only one of 'literal', 'file', 'script' or 'code' may be set"
                    .to_string(),
            })
        }
    };

    let mut creator =
        ResponseCreator::new(body, endpoint_dir).with_replacements(definition.replacements);
    if let Some(content_type) = definition.contenttype {
        creator = creator.with_content_type(content_type);
    }
    Ok(creator)
}
