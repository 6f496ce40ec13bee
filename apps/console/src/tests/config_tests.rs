use super::{load_settings, settings_from_sources, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_without_file_or_env() {
    let settings = settings_from_sources(None, env_of(&[])).expect("settings");
    assert_eq!(settings, Settings::default());
}

#[test]
fn file_values_are_applied_and_root_normalized() {
    let raw = r#"
api_url = "http://127.0.0.1:8000/api"
app_root = "admin/users"
page_size = 10
"#;
    let settings = settings_from_sources(Some(raw), env_of(&[])).expect("settings");
    assert_eq!(settings.api_url.as_deref(), Some("http://127.0.0.1:8000/api"));
    assert_eq!(settings.app_root, "/admin/users/");
    assert_eq!(settings.page_size, 10);
    assert_eq!(settings.stats_path, "/projects/");
}

#[test]
fn prefixed_env_wins_over_bare_env_and_file() {
    let raw = r#"api_url = "http://file/api""#;
    let settings = settings_from_sources(
        Some(raw),
        env_of(&[
            ("API_URL", "http://bare/api"),
            ("APP__API_URL", "http://prefixed/api"),
            ("APP__SEARCH_DELAY_MS", "250"),
            ("APP__PAGE_SIZE", "not-a-number"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.api_url.as_deref(), Some("http://prefixed/api"));
    assert_eq!(settings.search_delay_ms, 250);
    assert_eq!(settings.page_size, Settings::default().page_size);
}

#[test]
fn blank_api_url_falls_back_to_demo_store() {
    let settings =
        settings_from_sources(None, env_of(&[("APP__API_URL", "  ")])).expect("settings");
    assert_eq!(settings.api_url, None);
}

#[test]
fn malformed_toml_is_rejected() {
    assert!(settings_from_sources(Some("page_size = ["), env_of(&[])).is_err());
}

#[test]
fn missing_file_is_not_an_error() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("console_settings_missing_{suffix}.toml"));
    assert!(!path.exists());
    load_settings(&path).expect("defaults");
}

#[test]
fn reads_settings_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("console_settings_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("console.toml");
    fs::write(&path, "stats_path = \"/projects/tutorial/\"\n").expect("write");

    let settings = load_settings(&path).expect("settings");
    assert_eq!(settings.stats_path, "/projects/tutorial/");

    fs::remove_dir_all(temp_root).expect("cleanup");
}
