use super::core::Endpoint;
use super::loader;
use super::types::EndpointError;
use crate::scripting::ScriptRuntime;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// An ordered, immutable configuration snapshot.
#[derive(Debug, Default)]
pub struct EndpointCollection {
    endpoints: Vec<Endpoint>,
}

impl EndpointCollection {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// Load every endpoint under `directory` with an uncached script runtime.
    pub fn read_from_directory(directory: impl AsRef<Path>) -> Result<Self, EndpointError> {
        Self::read_from_directory_with(directory, Arc::new(ScriptRuntime::default()))
    }

    pub fn read_from_directory_with(
        directory: impl AsRef<Path>,
        scripts: Arc<ScriptRuntime>,
    ) -> Result<Self, EndpointError> {
        loader::read_endpoints(directory.as_ref(), &scripts).map(Self::new)
    }

    /// First endpoint, in declared order, whose path pattern accepts `path`.
    pub fn resolve(&self, path: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.matches_path(path))
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name() == name)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// The live snapshot used by the server.
///
/// Readers clone the `Arc` and resolve without holding the lock; a reload
/// swaps the whole pointer, so a request sees either the old or the new
/// collection.
#[derive(Debug, Default)]
pub struct SharedCollection {
    current: RwLock<Arc<EndpointCollection>>,
}

impl SharedCollection {
    pub fn new(collection: EndpointCollection) -> Self {
        Self {
            current: RwLock::new(Arc::new(collection)),
        }
    }

    pub fn snapshot(&self) -> Arc<EndpointCollection> {
        Arc::clone(&self.current.read())
    }

    /// Install a new snapshot and return the previous one.
    pub fn replace(&self, collection: EndpointCollection) -> Arc<EndpointCollection> {
        std::mem::replace(&mut *self.current.write(), Arc::new(collection))
    }
}
