//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::Request,
    http::{header::SET_COOKIE, HeaderMap, Method, StatusCode},
    middleware::Next,
    Router,
};
use expressway::http::{middleware_fn, Middleware};
use tempfile::TempDir;
use tower::ServiceExt;

/// An application root on disk.
pub struct AppRoot {
    dir: TempDir,
}

impl AppRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> &Self {
        let path = self.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    /// Create an empty unit file, as discovery only looks at names.
    pub fn touch(&self, relative: &str) -> &Self {
        self.write(relative, "")
    }
}

/// Ordered record of what ran.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Middleware appending `name` to `log` on every request.
pub fn recording(log: &Log, name: &str) -> Middleware {
    let log = log.clone();
    let name = name.to_owned();
    middleware_fn(move |req: Request, next: Next| {
        let log = log.clone();
        let name = name.clone();
        async move {
            log.push(name);
            next.run(req).await
        }
    })
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    /// Value of cookie `name` as set by the response.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers.get_all(SET_COOKIE).iter().find_map(|value| {
            let pair = value.to_str().ok()?.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_owned())
        })
    }
}

/// Send one request through `router`.
pub async fn send(router: Router, method: Method, uri: &str, headers: &[(&str, &str)]) -> Reply {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get(router: Router, uri: &str) -> Reply {
    send(router, Method::GET, uri, &[]).await
}
