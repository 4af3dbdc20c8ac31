//! Request handling: maps a method and normalized path to a response.

use std::future::Future;
use std::path::{Component, Path};

use crate::files::{FileOutcome, FileReader, FsReader};
use crate::http::mime::extension_to_type;
use crate::http::parser::DEFAULT_DOCUMENT;
use crate::http::request::Method;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub trait Handler: Send + Sync + 'static {
    fn handle(&self, method: &Method, path: &str) -> impl Future<Output = Response> + Send;
}

/// Serves GET and HEAD from a [`FileReader`].
#[derive(Debug, Clone)]
pub struct StaticFiles<R = FsReader> {
    reader: R,
}

impl<R: FileReader> StaticFiles<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    async fn get(&self, path: &str) -> Response {
        match self.reader.read(path).await {
            FileOutcome::Found(contents) => ResponseBuilder::with_server_headers(StatusCode::Ok)
                .header("Content-Type", extension_to_type(path))
                .body(contents)
                .build(),
            outcome => error_for(path, outcome),
        }
    }

    async fn head(&self, path: &str) -> Response {
        match self.reader.stat(path).await {
            FileOutcome::Found(size) => ResponseBuilder::with_server_headers(StatusCode::Ok)
                .header("Content-Type", extension_to_type(path))
                .header("Content-Length", size.to_string())
                .build(),
            outcome => error_for(path, outcome).into_head(),
        }
    }
}

impl<R: FileReader> Handler for StaticFiles<R> {
    async fn handle(&self, method: &Method, path: &str) -> Response {
        let Some(path) = confine(path) else {
            tracing::warn!(%method, path, "path escapes document root");
            let response = Response::error_page(StatusCode::Forbidden);
            return match method {
                Method::HEAD => response.into_head(),
                _ => response,
            };
        };

        match method {
            Method::GET => self.get(&path).await,
            Method::HEAD => self.head(&path).await,
            _ => Response::error_page(StatusCode::MethodNotAllowed),
        }
    }
}

fn error_for<T>(path: &str, outcome: FileOutcome<T>) -> Response {
    let status = match outcome {
        FileOutcome::Found(_) | FileOutcome::NotFound => StatusCode::NotFound,
        FileOutcome::PermissionDenied => StatusCode::Forbidden,
        FileOutcome::Failed(e) => {
            tracing::error!(path, error = %e, "failed to read file");
            StatusCode::InternalServerError
        }
    };
    Response::error_page(status)
}

/// Lexically resolves `.` and `..` in a relative path. Returns `None` if
/// the path is absolute or climbs above its starting point. A path that
/// resolves to the root itself names the default document.
///
/// ```
/// # use staticd::handler::confine;
/// assert_eq!(confine("a/./b/../c.txt").as_deref(), Some("a/c.txt"));
/// assert_eq!(confine("../etc/passwd"), None);
/// assert_eq!(confine("/etc/passwd"), None);
/// assert_eq!(confine("docs/..").as_deref(), Some("index.html"));
/// ```
pub fn confine(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() {
        return Some(DEFAULT_DOCUMENT.to_string());
    }
    Some(parts.join("/"))
}
