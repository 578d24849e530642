//! Dynamic response scripts.
//!
//! Scripts are Rhai source, preprocessed (`#include` splicing and `import`
//! path rewriting), compiled, and evaluated with the request bound as
//! context. The evaluated value becomes the response body.
//!
//! Compilation happens on every invocation unless a [`ScriptCache`] is
//! enabled, in which case ASTs are shared by preprocessed source text.

mod preprocess;
mod rhai_engine;
mod script_cache;

pub use preprocess::{preprocess, rewrite_imports};
pub use rhai_engine::xml_escape;
pub use script_cache::{ScriptCache, ScriptCacheStats};

use crate::config::ScriptingConfig;
use crate::metrics;
use crate::request::RequestInfo;
use rhai::Dynamic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Diagnostic for a failed script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("compilation failed: {0}")]
    Compile(String),
    #[error("execution failed: {0}")]
    Runtime(String),
    #[error("cyclic include: {}", display_chain(.chain))]
    CyclicInclude { chain: Vec<PathBuf> },
    #[error("cannot include {}", .path.display())]
    Include {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Where a script's source comes from.
pub struct ScriptInput<'a> {
    pub source: &'a str,
    /// Base directory for relative directives and file helpers.
    pub directory: &'a Path,
    /// File the source was read from, if any.
    pub origin: Option<&'a Path>,
    /// Identity used in diagnostics.
    pub identity: &'a str,
}

/// Shared script settings and the optional compiled-script cache.
#[derive(Default)]
pub struct ScriptRuntime {
    cache: Option<ScriptCache>,
    max_operations: u64,
}

impl ScriptRuntime {
    pub fn new(config: &ScriptingConfig) -> Self {
        Self {
            cache: config
                .cache_compiled
                .then(|| ScriptCache::new(config.cache_capacity)),
            max_operations: config.max_operations,
        }
    }

    pub fn shared(config: &ScriptingConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn cache_stats(&self) -> Option<ScriptCacheStats> {
        self.cache.as_ref().map(ScriptCache::stats)
    }

    /// Preprocess, compile and evaluate a script against a request.
    pub fn evaluate(&self, input: ScriptInput<'_>, request: &RequestInfo) -> Result<String, ScriptError> {
        let started = Instant::now();
        let result = self.run(&input, request);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => {
                debug!(script = %input.identity, elapsed_ms, "script evaluated");
                metrics::record_script_execution("ok", elapsed_ms);
            }
            Err(e) => {
                warn!(script = %input.identity, error = %e, "script failed");
                metrics::record_script_execution("error", elapsed_ms);
            }
        }
        result
    }

    fn run(&self, input: &ScriptInput<'_>, request: &RequestInfo) -> Result<String, ScriptError> {
        let source = preprocess(input.source, input.directory, input.origin)?;
        let engine = rhai_engine::create_engine(input.directory, input.identity, self.max_operations);

        let ast = match &self.cache {
            Some(cache) => cache.get_or_compile(&engine, &source)?,
            None => Arc::new(
                engine
                    .compile(&source)
                    .map_err(|e| ScriptError::Compile(e.to_string()))?,
            ),
        };

        let mut scope = rhai_engine::request_scope(request);
        let value: Dynamic = engine
            .eval_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ScriptError::Runtime(e.to_string()))?;

        Ok(rhai_engine::dynamic_to_body(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input<'a>(source: &'a str, dir: &'a Path) -> ScriptInput<'a> {
        ScriptInput {
            source,
            directory: dir,
            origin: None,
            identity: "inline",
        }
    }

    #[test]
    fn test_evaluate_echo() {
        let dir = TempDir::new().unwrap();
        let runtime = ScriptRuntime::default();
        let request = RequestInfo::new("/echo", "").with_body("hello");

        assert_eq!(runtime.evaluate(input("body", dir.path()), &request).unwrap(), "hello");
    }

    #[test]
    fn test_syntax_error_is_compile_fault() {
        let dir = TempDir::new().unwrap();
        let runtime = ScriptRuntime::default();

        let err = runtime
            .evaluate(input("let x = ;", dir.path()), &RequestInfo::default())
            .unwrap_err();
        assert!(matches!(err, ScriptError::Compile(_)));
    }

    #[test]
    fn test_thrown_error_is_runtime_fault() {
        let dir = TempDir::new().unwrap();
        let runtime = ScriptRuntime::default();

        let err = runtime
            .evaluate(input("throw \"boom\";", dir.path()), &RequestInfo::default())
            .unwrap_err();
        match err {
            ScriptError::Runtime(message) => assert!(message.contains("boom")),
            other => panic!("expected runtime fault, got {other:?}"),
        }
    }

    #[test]
    fn test_include_runs_before_compilation() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("lib.rhai"), "fn shout(s) { s.to_upper() }").unwrap();
        let runtime = ScriptRuntime::default();
        let request = RequestInfo::default().with_body("quiet");

        let result = runtime
            .evaluate(input("#include \"lib.rhai\"\nshout(body)", dir.path()), &request)
            .unwrap();
        assert_eq!(result, "QUIET");
    }

    #[test]
    fn test_import_resolves_relative_to_script_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::write(
            dir.path().join("scripts/util.rhai"),
            "fn wrap(s) { `[${s}]` }",
        )
        .unwrap();
        let runtime = ScriptRuntime::default();
        let request = RequestInfo::default().with_body("x");

        let result = runtime
            .evaluate(
                input("import \"scripts/util\" as util;\nutil::wrap(body)", dir.path()),
                &request,
            )
            .unwrap();
        assert_eq!(result, "[x]");
    }

    #[test]
    fn test_cache_reuses_compiled_script() {
        let dir = TempDir::new().unwrap();
        let runtime = ScriptRuntime::new(&ScriptingConfig {
            cache_compiled: true,
            cache_capacity: 4,
            max_operations: 0,
        });

        for body in ["a", "b"] {
            let request = RequestInfo::default().with_body(body);
            assert_eq!(runtime.evaluate(input("body", dir.path()), &request).unwrap(), body);
        }

        let stats = runtime.cache_stats().unwrap();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_cache_disabled_by_default() {
        assert!(ScriptRuntime::default().cache_stats().is_none());
    }
}
