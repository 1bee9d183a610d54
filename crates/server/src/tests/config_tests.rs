use super::{normalize_database_url, resolve_settings};

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = resolve_settings(None, env_from(&[]));
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
    assert_eq!(settings.database_url, "sqlite://./data/inventory.db");
    assert_eq!(settings.gate_password, "verySecretPassword");
}

#[test]
fn file_values_override_defaults() {
    let file = r#"
bind_addr = "0.0.0.0:8080"
database_url = "./store/catalog.db"
gate_password = "hunter2"
"#;
    let settings = resolve_settings(Some(file), env_from(&[]));
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.database_url, "sqlite://./store/catalog.db");
    assert_eq!(settings.gate_password, "hunter2");
}

#[test]
fn env_overrides_file_and_prefixed_spelling_wins() {
    let file = r#"bind_addr = "0.0.0.0:8080""#;
    let settings = resolve_settings(
        Some(file),
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:4000"),
            ("APP__BIND_ADDR", "127.0.0.1:5000"),
            ("GATE_PASSWORD", "from-env"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.gate_password, "from-env");
    assert_eq!(settings.database_url, "sqlite::memory:");
}

#[test]
fn malformed_file_is_ignored() {
    let settings = resolve_settings(Some("bind_addr = [1, 2"), env_from(&[]));
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn normalizes_single_colon_windows_path() {
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\test.db"),
        "sqlite://C:/Users/alice/test.db"
    );
}

#[test]
fn blank_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        "sqlite://./data/inventory.db"
    );
}
