use super::matcher::RequestMatcher;
use crate::request::RequestInfo;
use crate::response::ResponseCreator;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One matcher/creator pair within an endpoint.
#[derive(Debug)]
pub struct ResponseRule {
    pub matcher: RequestMatcher,
    pub creator: ResponseCreator,
}

impl ResponseRule {
    pub fn new(matcher: RequestMatcher, creator: ResponseCreator) -> Self {
        Self { matcher, creator }
    }
}

/// The rule chosen for a request.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    /// Position of the rule within its endpoint.
    pub index: usize,
    pub rule: &'a ResponseRule,
    /// True when no other rule in the endpoint would also have accepted.
    pub single_match: bool,
}

impl<'a> Resolution<'a> {
    pub fn matcher(&self) -> &'a RequestMatcher {
        &self.rule.matcher
    }

    pub fn creator(&self) -> &'a ResponseCreator {
        &self.rule.creator
    }
}

/// A named, path-scoped group of ordered response rules.
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    path_regex: Regex,
    rules: Vec<ResponseRule>,
    directory: PathBuf,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, path_regex: Regex, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path_regex,
            rules: Vec::new(),
            directory: directory.into(),
        }
    }

    pub fn with_rule(mut self, matcher: RequestMatcher, creator: ResponseCreator) -> Self {
        self.rules.push(ResponseRule::new(matcher, creator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_pattern(&self) -> &str {
        self.path_regex.as_str()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    pub fn matches_path(&self, path: &str) -> bool {
        self.path_regex.is_match(path)
    }

    /// Pick the first rule whose matcher accepts the request.
    ///
    /// Every matcher is evaluated so `single_match` reflects the total
    /// number of accepting rules.
    pub fn resolve(&self, request: &RequestInfo) -> Option<Resolution<'_>> {
        let mut first = None;
        let mut accepted = 0usize;

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.matcher.matches(&request.body) {
                accepted += 1;
                first.get_or_insert(index);
            }
        }

        let index = first?;
        if accepted > 1 {
            debug!(
                endpoint = %self.name,
                rule = index,
                accepted,
                "several rules accept request, first one wins"
            );
        }

        Some(Resolution {
            index,
            rule: &self.rules[index],
            single_match: accepted == 1,
        })
    }
}
