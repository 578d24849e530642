//! Response creators: literal text, files and scripts.
//!
//! Every creator generates a body, then applies its replacement list in
//! declared order. File and script paths may contain `$(name)` placeholders
//! that are expanded from the request before the path is used.

mod creator;
mod placeholder;
mod replacements;

pub use creator::{BodySource, ResponseCreator, ScriptSource, DEFAULT_CONTENT_TYPE};
pub use placeholder::expand_placeholders;
pub use replacements::{apply_replacements, Replacement};

use crate::scripting::ScriptError;
use std::path::PathBuf;

/// Failure to produce a response body.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read {}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("script failed: {identity}")]
    ScriptFault {
        identity: String,
        source: ScriptError,
    },
}

/// Render an error with its full source chain on one line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_includes_script_diagnostic() {
        let err = GenerationError::ScriptFault {
            identity: "Execute script a.rhai".to_string(),
            source: ScriptError::Runtime("boom".to_string()),
        };
        assert_eq!(
            error_chain(&err),
            "script failed: Execute script a.rhai: execution failed: boom"
        );
    }
}
