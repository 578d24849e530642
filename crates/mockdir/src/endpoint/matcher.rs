//! Request matchers: predicates over the request body.

use regex::Regex;
use std::fmt;

/// Decides whether a response rule applies to a request body.
///
/// The display form is the matcher's identity, used both in listings and by
/// test cases asserting which rule fired.
#[derive(Debug, Clone)]
pub enum RequestMatcher {
    /// Accepts every request.
    Any,
    /// Accepts a request whose body contains a match for the pattern.
    BodyRegex(Regex),
}

impl RequestMatcher {
    pub fn body_regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(RequestMatcher::BodyRegex(Regex::new(pattern)?))
    }

    pub fn matches(&self, body: &str) -> bool {
        match self {
            RequestMatcher::Any => true,
            RequestMatcher::BodyRegex(regex) => regex.is_match(body),
        }
    }

    pub fn identity(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMatcher::Any => write!(f, "Any request"),
            RequestMatcher::BodyRegex(regex) => write!(f, "Regex '{}'", regex.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_matches_everything() {
        assert!(RequestMatcher::Any.matches(""));
        assert!(RequestMatcher::Any.matches("anything at all"));
    }

    #[test]
    fn test_body_regex_is_unanchored() {
        let matcher = RequestMatcher::body_regex("test").unwrap();
        assert!(matcher.matches("heisann test"));
        assert!(matcher.matches("testing"));
        assert!(!matcher.matches("foobar"));
    }

    #[test]
    fn test_identity_strings() {
        assert_eq!(RequestMatcher::Any.identity(), "Any request");
        assert_eq!(
            RequestMatcher::body_regex("test").unwrap().identity(),
            "Regex 'test'"
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RequestMatcher::body_regex("(unclosed").is_err());
    }
}
