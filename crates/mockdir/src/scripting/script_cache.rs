use super::ScriptError;
use parking_lot::RwLock;
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Compiled scripts keyed by their fully preprocessed source text.
///
/// Two requests whose scripts preprocess to the same text share one AST, so
/// edits to an included file produce a new key rather than a stale hit.
/// When the cache reaches capacity it is cleared wholesale.
pub struct ScriptCache {
    entries: RwLock<HashMap<String, Arc<AST>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl ScriptCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get_or_compile(&self, engine: &Engine, source: &str) -> Result<Arc<AST>, ScriptError> {
        if let Some(ast) = self.entries.read().get(source) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("script cache hit");
            return Ok(Arc::clone(ast));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let ast = Arc::new(
            engine
                .compile(source)
                .map_err(|e| ScriptError::Compile(e.to_string()))?,
        );

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "script cache full, clearing");
            entries.clear();
        }
        entries.insert(source.to_string(), Arc::clone(&ast));
        Ok(ast)
    }

    pub fn stats(&self) -> ScriptCacheStats {
        ScriptCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.read().len(),
        }
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
