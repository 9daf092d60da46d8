//! # Templates
//!
//! HTML rendering for handlers, backed by `minijinja`.
//!
//! A [`Templates`] value is configured with a base directory, a cache flag
//! and a table of named functions callable from templates. Rendering takes a
//! file name relative to the base directory and a [`ResponsePayload`], which
//! templates see as `data`, `code` and `message`.
//!
//! With caching enabled each file is read and compiled once; later renders
//! reuse the compiled template even if the file changes or disappears. The
//! cache sits behind an `RwLock` so concurrent hits never wait on each other.
//!
//! A render failure inside a handler is a deployment defect, not a request
//! error: [`Context::write_template`](crate::context::Context::write_template)
//! panics on it and the recovery boundary answers 500.

use minijinja::value::{Rest, Value};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Data handed to a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub data: serde_json::Value,
    pub code: i64,
    pub message: String,
}

impl ResponsePayload {
    pub fn new(data: serde_json::Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            data,
            code,
            message: message.into(),
        }
    }
}

/// Function callable from templates by name.
pub type TemplateFunction =
    Arc<dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static>;

#[derive(Debug)]
pub enum TemplateError {
    /// No base directory was configured
    MissingBaseDir,
    Io { path: String, source: io::Error },
    /// Syntax error in the template source
    Parse(minijinja::Error),
    Render(minijinja::Error),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MissingBaseDir => write!(f, "template base dir is not set"),
            TemplateError::Io { path, source } => write!(f, "cannot read template {path}: {source}"),
            TemplateError::Parse(e) => write!(f, "template parse error: {e}"),
            TemplateError::Render(e) => write!(f, "template render error: {e}"),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Io { source, .. } => Some(source),
            TemplateError::Parse(e) | TemplateError::Render(e) => Some(e),
            TemplateError::MissingBaseDir => None,
        }
    }
}

/// Template loader and renderer.
pub struct Templates {
    base_dir: String,
    enable_cache: bool,
    functions: Vec<(String, TemplateFunction)>,
    cache: RwLock<HashMap<String, Arc<Environment<'static>>>>,
}

impl Templates {
    /// Templates under `base_dir`, caching disabled.
    pub fn new(base_dir: impl Into<String>) -> Self {
        let mut base_dir = base_dir.into();
        if !base_dir.is_empty() && !base_dir.ends_with('/') {
            base_dir.push('/');
        }
        Self {
            base_dir,
            enable_cache: false,
            functions: Vec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Make `f` callable as `name(...)` in every template loaded afterwards.
    pub fn add_function<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.functions.push((name.into(), Arc::new(f)));
        self
    }

    #[must_use]
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.enable_cache
    }

    /// Number of compiled templates held in the cache.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    fn load(&self, name: &str) -> Result<Arc<Environment<'static>>, TemplateError> {
        if self.base_dir.is_empty() {
            return Err(TemplateError::MissingBaseDir);
        }

        if self.enable_cache {
            let hit = self
                .cache
                .read()
                .ok()
                .and_then(|cache| cache.get(name).cloned());
            if let Some(env) = hit {
                return Ok(env);
            }
        }

        let path = format!("{}{}", self.base_dir, name);
        let source = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;

        let mut env = Environment::new();
        for (fname, f) in &self.functions {
            let f = Arc::clone(f);
            env.add_function(fname.clone(), move |args: Rest<Value>| f(args.as_slice()));
        }
        env.add_template_owned(name.to_string(), source)
            .map_err(TemplateError::Parse)?;
        let env = Arc::new(env);
        debug!(template = %name, path = %path, "Template compiled");

        if self.enable_cache {
            if let Ok(mut cache) = self.cache.write() {
                // Another request may have populated it meanwhile; keep theirs.
                let cached = cache.entry(name.to_string()).or_insert(env);
                return Ok(Arc::clone(cached));
            }
        }
        Ok(env)
    }

    /// Render `name` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the base dir is unset, the file cannot
    /// be read, or the template fails to parse or render.
    pub fn render(&self, name: &str, payload: &ResponsePayload) -> Result<Vec<u8>, TemplateError> {
        let env = self.load(name)?;
        let template = env.get_template(name).map_err(TemplateError::Render)?;
        let html = template.render(payload).map_err(TemplateError::Render)?;
        Ok(html.into_bytes())
    }
}
