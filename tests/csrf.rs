//! Cookie parsing and CSRF protection as wired by the bootstrap.

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
    routing::{get, post},
    Extension, Router,
};
use expressway::http::{App, InstallStep};
use expressway::plugin::RoutesEntry;
use expressway::security::{CookieJar, CsrfToken};
use expressway::{bootstrap, PluginRegistry};
use tower::ServiceExt;

mod common;
use common::{get as request, send, AppRoot};

const FORBIDDEN_BODY: &str = r#"{"status":false,"code":403,"message":"Forbidden"}"#;

fn entry() -> RoutesEntry {
    RoutesEntry::new(
        |_| {
            Router::new()
                .route("/", get(|| async { "form" }))
                .route("/submit", post(|| async { "accepted" }))
                .route(
                    "/token",
                    get(|Extension(token): Extension<CsrfToken>| async move { token.0 }),
                )
                .route(
                    "/theme",
                    get(|Extension(jar): Extension<CookieJar>| async move {
                        jar.get("theme").unwrap_or("none").to_owned()
                    }),
                )
        },
        expressway::http::failure::render_failures(),
    )
}

async fn boot(cookies: &str) -> App {
    let root = AppRoot::new();
    root.write("config/app.toml", "modules = []\nkey = \"application-key\"\n")
        .write("config/cookies.toml", cookies);
    let registry = PluginRegistry::new().routes_entry(entry());
    bootstrap(root.path(), registry).unwrap().boot().await.unwrap()
}

#[tokio::test]
async fn post_without_token_is_forbidden() {
    let app = boot("enable_csrf = true\n").await;

    let reply = send(app.router(), Method::POST, "/submit", &[]).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body, FORBIDDEN_BODY);
}

#[tokio::test]
async fn post_with_forged_token_is_forbidden() {
    let app = boot("enable_csrf = true\n").await;

    let reply = send(
        app.router(),
        Method::POST,
        "/submit",
        &[("x-csrf-token", "salt-forged")],
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body, FORBIDDEN_BODY);
}

#[tokio::test]
async fn token_from_global_cookie_is_accepted() {
    let app = boot("enable_csrf = true\nenable_global_csrf = true\n").await;

    let first = request(app.router(), "/").await;
    assert_eq!(first.status, StatusCode::OK);
    let secret = first.cookie("_csrf").unwrap();
    let token = first.cookie("XSRF-TOKEN").unwrap();
    assert!(secret.starts_with("s:"));

    let cookie = format!("_csrf={secret}");
    let reply = send(
        app.router(),
        Method::POST,
        "/submit",
        &[("cookie", cookie.as_str()), ("x-xsrf-token", token.as_str())],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "accepted");
    assert!(reply.cookie("_csrf").is_none());
}

#[tokio::test]
async fn token_in_form_body_is_accepted() {
    let app = boot("enable_csrf = true\n").await;

    let first = request(app.router(), "/token").await;
    let secret = first.cookie("_csrf").unwrap();
    let token = first.body;

    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/submit")
        .header(header::COOKIE, format!("_csrf={secret}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("name=ada&_csrf={token}")))
        .unwrap();
    let response = app.router().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn global_token_cookie_is_only_set_on_get() {
    let app = boot("enable_csrf = true\nenable_global_csrf = true\ncsrf_token_name = \"APP-TOKEN\"\n").await;

    let reply = request(app.router(), "/").await;
    assert!(reply.cookie("APP-TOKEN").is_some());
    assert!(reply.cookie("XSRF-TOKEN").is_none());

    let reply = send(app.router(), Method::HEAD, "/", &[]).await;
    assert!(reply.cookie("APP-TOKEN").is_none());
}

#[tokio::test]
async fn security_steps_follow_body_parser_in_order() {
    let app = boot("enable_csrf = true\nenable_global_csrf = true\n").await;

    let installed = app.installed();
    assert_eq!(
        &installed[..4],
        &[
            InstallStep::BodyParser,
            InstallStep::CookieParser,
            InstallStep::CsrfProtection,
            InstallStep::CsrfTokenCookie,
        ]
    );
    assert!(installed.contains(&InstallStep::ErrorHandler("csrf".into())));

    let protection = app.context().csrf().unwrap();
    let token = protection.create_token("secret");
    assert!(protection.verify("secret", &token));
}

#[tokio::test]
async fn disabled_csrf_installs_no_protection() {
    let app = boot("enable_csrf = false\n").await;

    let installed = app.installed();
    assert!(!installed.contains(&InstallStep::CsrfProtection));
    assert!(!installed.contains(&InstallStep::ErrorHandler("csrf".into())));
    assert!(!installed.contains(&InstallStep::CookieParser));
    assert!(app.context().csrf().is_none());

    let reply = send(app.router(), Method::POST, "/submit", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn cookie_parser_alone_exposes_the_jar() {
    let app = boot("enable_cookie_parser = true\n").await;

    assert!(app.installed().contains(&InstallStep::CookieParser));
    let reply = send(app.router(), Method::GET, "/theme", &[("cookie", "theme=dark; lang=en")]).await;
    assert_eq!(reply.body, "dark");
}
