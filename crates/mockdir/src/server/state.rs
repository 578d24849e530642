use crate::endpoint::{EndpointCollection, EndpointError, SharedCollection};
use crate::metrics;
use crate::observer::{ResponseLog, ResponseObserver};
use crate::scripting::ScriptRuntime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Everything a running server shares between connections.
pub struct ServerState {
    directory: PathBuf,
    collection: SharedCollection,
    scripts: Arc<ScriptRuntime>,
    responses: Arc<ResponseLog>,
    observer: Arc<dyn ResponseObserver>,
}

impl ServerState {
    /// Wrap a loaded collection. Resolution attempts go to `responses`
    /// unless another observer is set.
    pub fn new(
        directory: impl Into<PathBuf>,
        collection: EndpointCollection,
        scripts: Arc<ScriptRuntime>,
        responses: Arc<ResponseLog>,
    ) -> Self {
        let observer: Arc<dyn ResponseObserver> = responses.clone();
        Self {
            directory: directory.into(),
            collection: SharedCollection::new(collection),
            scripts,
            responses,
            observer,
        }
    }

    /// Load the configuration directory and wrap it.
    pub fn load(
        directory: impl Into<PathBuf>,
        scripts: Arc<ScriptRuntime>,
        responses: Arc<ResponseLog>,
    ) -> Result<Self, EndpointError> {
        let directory = directory.into();
        let collection =
            EndpointCollection::read_from_directory_with(&directory, Arc::clone(&scripts))?;
        Ok(Self::new(directory, collection, scripts, responses))
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResponseObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn snapshot(&self) -> Arc<EndpointCollection> {
        self.collection.snapshot()
    }

    pub fn scripts(&self) -> &ScriptRuntime {
        &self.scripts
    }

    pub fn responses(&self) -> &ResponseLog {
        &self.responses
    }

    pub fn observer(&self) -> Arc<dyn ResponseObserver> {
        Arc::clone(&self.observer)
    }

    /// Re-read the configuration directory and swap in the result.
    ///
    /// On failure the current snapshot stays in place.
    pub fn reload(&self) -> Result<usize, EndpointError> {
        let loaded =
            EndpointCollection::read_from_directory_with(&self.directory, Arc::clone(&self.scripts));
        match loaded {
            Ok(collection) => {
                let count = collection.len();
                self.collection.replace(collection);
                metrics::record_reload(true);
                info!(directory = %self.directory.display(), endpoints = count, "configuration reloaded");
                Ok(count)
            }
            Err(e) => {
                metrics::record_reload(false);
                error!(
                    directory = %self.directory.display(),
                    error = %e,
                    "reload failed, keeping current configuration"
                );
                Err(e)
            }
        }
    }
}
