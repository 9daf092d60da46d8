//! Serving files from a directory under a wildcard route.
//!
//! [`RouterGroup::static_files`](crate::group::RouterGroup::static_files)
//! registers `GET <prefix>/<relative>/*filepath` with a [`StaticHandler`];
//! the captured `filepath` is mapped below the root directory. Anything that
//! would leave the root, and anything that is not a regular file, is a 404.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::context::{Context, CONTENT_TYPE};
use crate::middleware::Handler;

/// Name of the wildcard capture holding the requested file.
pub const FILEPATH_PARAM: &str = "filepath";

pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `url_path` below the base directory.
    ///
    /// Returns `None` for any `..`, root or prefix component.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            _ => "application/octet-stream",
        }
    }

    /// Read the file behind `url_path` with its content type.
    ///
    /// # Errors
    ///
    /// `NotFound` for paths escaping the base directory or not naming a
    /// regular file; other I/O errors as reported by the filesystem.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

/// Route handler answering with the file named by the `filepath` capture.
pub struct StaticHandler {
    files: StaticFiles,
}

impl StaticHandler {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            files: StaticFiles::new(root),
        }
    }
}

impl Handler for StaticHandler {
    fn call(&self, ctx: &mut Context) {
        let requested = ctx.param(FILEPATH_PARAM).to_string();
        match self.files.load(&requested) {
            Ok((bytes, content_type)) => {
                ctx.set_header(CONTENT_TYPE, content_type);
                ctx.data(200, &bytes);
            }
            Err(err) => {
                debug!(
                    root = %self.files.base_dir().display(),
                    file = %requested,
                    error = %err,
                    "Static file not served"
                );
                let body = format!("404 NOT FOUND: {}\n", ctx.path());
                ctx.string(404, body);
            }
        }
    }
}
