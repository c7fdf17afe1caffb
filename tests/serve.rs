//! Serving a booted application over TCP.

use axum::{routing::get, Json, Router};
use expressway::plugin::RoutesEntry;
use expressway::{bootstrap, PluginRegistry};
use serde_json::{json, Value};

mod common;
use common::AppRoot;

#[tokio::test]
async fn serves_routes_until_stopped() {
    let root = AppRoot::new();
    root.write("config/app.toml", "modules = []\nport = 4000\n")
        .touch("routes/status.rs");

    let registry = PluginRegistry::new()
        .routes_entry(RoutesEntry::new(
            |_| Router::new().route("/", get(|| async { "home" })),
            expressway::http::failure::render_failures(),
        ))
        .routes("routes/status", |ctx| {
            let port = ctx.config().u64_or("app.port", 0);
            Some(Router::new().route(
                "/",
                get(move || async move { Json(json!({ "ok": true, "configured_port": port })) }),
            ))
        });

    let app = bootstrap(root.path(), registry).unwrap().boot().await.unwrap();
    assert_eq!(app.port(None), 4000);
    assert_eq!(app.port(Some(8080)), 8080);

    let server = app.serve(Some(0)).await.unwrap();
    let port = server.local_addr().port();
    assert_ne!(port, 0);

    let client = reqwest::Client::new();
    let home = client
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(home.status(), 200);
    assert_eq!(home.text().await.unwrap(), "home");

    let status: Value = client
        .get(format!("http://127.0.0.1:{port}/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status, json!({ "ok": true, "configured_port": 4000 }));

    server.stop().await.unwrap();
    assert!(client
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .is_err());
}

#[tokio::test]
async fn default_port_applies_without_configuration() {
    let root = AppRoot::new();
    root.write("config/app.toml", "modules = []\n");

    let registry = PluginRegistry::new().routes_entry(RoutesEntry::default());
    let app = bootstrap(root.path(), registry).unwrap().boot().await.unwrap();
    assert_eq!(app.port(None), 3000);
}

#[tokio::test]
async fn configured_port_zero_falls_back_to_default() {
    let root = AppRoot::new();
    root.write("config/app.toml", "modules = []\nport = 0\n");

    let registry = PluginRegistry::new().routes_entry(RoutesEntry::default());
    let app = bootstrap(root.path(), registry).unwrap().boot().await.unwrap();
    assert_eq!(app.port(None), 3000);
    assert_eq!(app.port(Some(5000)), 5000);
}
