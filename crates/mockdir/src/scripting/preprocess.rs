//! Textual preprocessing applied to script source before compilation.
//!
//! Two directives are handled:
//! - `#include "file"` splices the named file's contents in place,
//!   recursively, resolved against the directory of the including file.
//! - `import "file"` (Rhai's module import) gets its path rewritten to an
//!   absolute path rooted at the directory of the file containing it, so the
//!   module resolver does not depend on the process working directory.

use super::ScriptError;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn include_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"#include\s+"([^"]*)""#).expect("valid include regex"))
}

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bimport\s+"([^"]*)""#).expect("valid import regex"))
}

/// Preprocess script source.
///
/// `directory` is the base for relative directives. `origin` is the file
/// the source was read from, if any; it seeds cycle detection so a file
/// including itself is reported.
pub fn preprocess(
    source: &str,
    directory: &Path,
    origin: Option<&Path>,
) -> Result<String, ScriptError> {
    let mut stack = Vec::new();
    if let Some(origin) = origin {
        stack.push(fs::canonicalize(origin).unwrap_or_else(|_| origin.to_path_buf()));
    }
    expand(source, directory, &mut stack)
}

fn expand(source: &str, directory: &Path, stack: &mut Vec<PathBuf>) -> Result<String, ScriptError> {
    let source = rewrite_imports(source, directory);
    execute_includes(&source, directory, stack)
}

/// Rewrite relative `import` paths to absolute ones rooted at `directory`.
pub fn rewrite_imports(source: &str, directory: &Path) -> String {
    import_regex()
        .replace_all(source, |caps: &Captures| {
            let target = directory.join(&caps[1]);
            let absolute = std::path::absolute(&target).unwrap_or(target);
            // Rhai string literals treat backslashes as escapes
            let rendered = absolute.display().to_string().replace('\\', "/");
            format!("import \"{rendered}\"")
        })
        .into_owned()
}

fn execute_includes(
    source: &str,
    directory: &Path,
    stack: &mut Vec<PathBuf>,
) -> Result<String, ScriptError> {
    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for caps in include_regex().captures_iter(source) {
        let Some(directive) = caps.get(0) else {
            continue;
        };
        output.push_str(&source[last..directive.start()]);

        let path = directory.join(&caps[1]);
        let canonical = fs::canonicalize(&path).map_err(|e| ScriptError::Include {
            path: path.clone(),
            source: e,
        })?;

        if stack.contains(&canonical) {
            let mut chain = stack.clone();
            chain.push(canonical);
            return Err(ScriptError::CyclicInclude { chain });
        }

        let contents = fs::read_to_string(&canonical).map_err(|e| ScriptError::Include {
            path: canonical.clone(),
            source: e,
        })?;
        let nested_directory = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| directory.to_path_buf());

        stack.push(canonical);
        let expanded = expand(&contents, &nested_directory, stack)?;
        stack.pop();

        output.push_str(&expanded);
        last = directive.end();
    }

    output.push_str(&source[last..]);
    Ok(output)
}
