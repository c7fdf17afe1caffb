//! Configuration phase: loading `config/` and validating settings.

use expressway::config::{ConfigError, ValidationError};
use expressway::{bootstrap, BootError, PluginRegistry};
use serde_json::json;

mod common;
use common::AppRoot;

#[test]
fn namespaces_come_from_file_stems() {
    let root = AppRoot::new();
    root.write("config/app.toml", "port = 4000\nmodules = []\n")
        .write("config/mail.json", r#"{ "driver": "log", "from": "noreply@example.com" }"#)
        .touch("config/.hidden.toml")
        .write("config/index.toml", "ignored = true\n");

    let server = bootstrap(root.path(), PluginRegistry::new()).unwrap();
    let config = server.config();

    assert_eq!(config.get("app.port"), Some(&json!(4000)));
    assert_eq!(config.get_or("app.missing", "x"), json!("x"));
    assert_eq!(config.str_or("mail.from", ""), "noreply@example.com");
    assert_eq!(config.namespaces(), vec!["app", "mail"]);
    assert_eq!(server.settings().port, Some(4000));
}

#[test]
fn missing_config_directory_yields_defaults() {
    let root = AppRoot::new();
    let server = bootstrap(root.path(), PluginRegistry::new()).unwrap();

    assert!(server.config().namespaces().is_empty());
    assert_eq!(server.settings().port, None);
    assert_eq!(server.settings().modules, vec!["mail", "database", "caching"]);
}

#[test]
fn malformed_file_aborts_configuration() {
    let root = AppRoot::new();
    root.write("config/app.toml", "port = \n");

    let err = bootstrap(root.path(), PluginRegistry::new()).err().unwrap();
    assert!(matches!(err, BootError::Config(ConfigError::Toml { .. })), "{err}");
}

#[test]
fn unsupported_extension_is_rejected() {
    let root = AppRoot::new();
    root.write("config/app.yaml", "port: 4000\n");

    let err = bootstrap(root.path(), PluginRegistry::new()).err().unwrap();
    assert!(matches!(err, BootError::Config(ConfigError::UnsupportedFormat(_))), "{err}");
}

#[test]
fn csrf_without_app_key_fails_validation() {
    let root = AppRoot::new();
    root.write("config/cookies.toml", "enable_csrf = true\n");

    match bootstrap(root.path(), PluginRegistry::new()) {
        Err(BootError::Config(ConfigError::Validation(errors))) => {
            assert_eq!(errors, vec![ValidationError::MissingAppKey]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("configuration should not validate"),
    }
}

#[test]
fn invalid_registration_key_is_reported_before_loading() {
    let root = AppRoot::new();
    let registry = PluginRegistry::new().routes("../outside", |_| None);

    let err = bootstrap(root.path(), registry).err().unwrap();
    assert!(matches!(err, BootError::Plugin(_)), "{err}");
}
