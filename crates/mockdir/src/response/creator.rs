use super::placeholder::expand_placeholders;
use super::replacements::{apply_replacements, Replacement};
use super::GenerationError;
use crate::request::RequestInfo;
use crate::scripting::{ScriptInput, ScriptRuntime};
use bytes::Bytes;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Where a creator's body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// Fixed text returned verbatim.
    Literal(String),
    /// File path template, relative to the endpoint directory.
    File(String),
    Script(ScriptSource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Inline(String),
    /// Script path template, relative to the endpoint directory.
    File(String),
}

/// Produces a response body and content type for a matched rule.
pub struct ResponseCreator {
    body: BodySource,
    content_type: String,
    replacements: Vec<Replacement>,
    directory: PathBuf,
    scripts: Arc<ScriptRuntime>,
}

impl ResponseCreator {
    pub fn new(body: BodySource, directory: impl Into<PathBuf>) -> Self {
        Self {
            body,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            replacements: Vec::new(),
            directory: directory.into(),
            scripts: Arc::new(ScriptRuntime::default()),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_replacements(mut self, replacements: Vec<Replacement>) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn with_scripts(mut self, scripts: Arc<ScriptRuntime>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn body_source(&self) -> &BodySource {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    pub fn identity(&self) -> String {
        self.to_string()
    }

    /// Generate the response body for a request.
    pub fn generate(&self, request: &RequestInfo) -> Result<Bytes, GenerationError> {
        let body = match &self.body {
            BodySource::Literal(text) => Bytes::from(text.clone()),
            BodySource::File(template) => {
                let path = self.resolve(template, request)?;
                Bytes::from(read_resource(&path)?)
            }
            BodySource::Script(script) => Bytes::from(self.run_script(script, request)?),
        };

        if self.replacements.is_empty() {
            return Ok(body);
        }
        let text = String::from_utf8_lossy(&body);
        Ok(Bytes::from(apply_replacements(&text, &self.replacements)))
    }

    /// Resource path for a request. Placeholder values that would leave the
    /// template's directory resolve to nothing.
    fn resolve(&self, template: &str, request: &RequestInfo) -> Result<PathBuf, GenerationError> {
        match expand_placeholders(template, request) {
            Some(relative) => Ok(self.directory.join(relative)),
            None => {
                debug!(
                    template = %template,
                    query = %request.query_string,
                    "placeholder value rejected in resource path"
                );
                Err(GenerationError::NotFound(self.directory.join(template)))
            }
        }
    }

    fn run_script(&self, script: &ScriptSource, request: &RequestInfo) -> Result<String, GenerationError> {
        let identity = self.identity();
        let result = match script {
            ScriptSource::Inline(source) => self.scripts.evaluate(
                ScriptInput {
                    source,
                    directory: &self.directory,
                    origin: None,
                    identity: &identity,
                },
                request,
            ),
            ScriptSource::File(template) => {
                let path = self.resolve(template, request)?;
                let bytes = read_resource(&path)?;
                let source = String::from_utf8_lossy(&bytes);
                let directory = path.parent().unwrap_or(self.directory.as_path());
                self.scripts.evaluate(
                    ScriptInput {
                        source: &source,
                        directory,
                        origin: Some(&path),
                        identity: &identity,
                    },
                    request,
                )
            }
        };

        result.map_err(|source| GenerationError::ScriptFault { identity, source })
    }
}

fn read_resource(path: &Path) -> Result<Vec<u8>, GenerationError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GenerationError::NotFound(path.to_path_buf()),
        _ => GenerationError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

impl fmt::Display for ResponseCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            BodySource::Literal(_) => write!(f, "Literal response"),
            BodySource::File(path) => write!(f, "File {path}"),
            BodySource::Script(ScriptSource::File(path)) => write!(f, "Execute script {path}"),
            BodySource::Script(ScriptSource::Inline(_)) => write!(f, "Execute inline script"),
        }
    }
}

impl fmt::Debug for ResponseCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCreator")
            .field("body", &self.body)
            .field("content_type", &self.content_type)
            .field("replacements", &self.replacements)
            .field("directory", &self.directory)
            .finish()
    }
}
