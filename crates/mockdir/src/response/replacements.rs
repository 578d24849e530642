use serde::{Deserialize, Serialize};

/// A literal search/replace pair applied to a generated body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Replacement {
    pub search: String,
    pub replace: String,
}

impl Replacement {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// Apply replacements one after another.
///
/// Each pair sees the output of the previous one, so a later pair can
/// rewrite text an earlier pair introduced. Pairs with an empty search
/// string are skipped.
pub fn apply_replacements(text: &str, replacements: &[Replacement]) -> String {
    replacements
        .iter()
        .filter(|r| !r.search.is_empty())
        .fold(text.to_string(), |acc, r| acc.replace(&r.search, &r.replace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sequential_application() {
        let replacements = vec![Replacement::new("a", "b"), Replacement::new("foo", "bar")];
        assert_eq!(
            apply_replacements("this is a test foo", &replacements),
            "this is b test bar"
        );
    }

    #[test]
    fn test_later_pair_sees_earlier_output() {
        let replacements = vec![Replacement::new("x", "yy"), Replacement::new("yy", "z")];
        assert_eq!(apply_replacements("x", &replacements), "z");
    }

    #[test]
    fn test_empty_search_is_skipped() {
        let replacements = vec![Replacement::new("", "boom")];
        assert_eq!(apply_replacements("abc", &replacements), "abc");
    }

    proptest! {
        #[test]
        fn prop_matches_step_by_step_replace(
            text in "[abc ]{0,40}",
            pairs in prop::collection::vec(("[abc]{1,2}", "[abc]{0,2}"), 0..4),
        ) {
            let replacements: Vec<Replacement> =
                pairs.iter().map(|(s, r)| Replacement::new(s.clone(), r.clone())).collect();

            let mut expected = text.clone();
            for (search, replace) in &pairs {
                expected = expected.replace(search.as_str(), replace.as_str());
            }

            prop_assert_eq!(apply_replacements(&text, &replacements), expected);
        }
    }
}
