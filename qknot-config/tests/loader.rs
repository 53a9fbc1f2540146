use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use qknot_config::{
    ConfigLoadError, ConfigLoader, ConfigSource, UnknownStatusPolicy,
};
use tempfile::TempDir;

fn lookup(pairs: Vec<(&str, String)>) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write config");
    path
}

const TOML: &str = r#"
[backend]
base_url = "https://knots.example.org"
request_timeout = "90s"

[poll]
max_attempts = 40
interval = "3s"
unknown_status = "keep-polling"

[snapshot]
path = "/var/lib/qknot/pending.json"
"#;

#[test]
fn toml_file_named_by_env_is_applied() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "qknot.toml", TOML);

    let load = ConfigLoader::new()
        .load_with(lookup(vec![(
            "QKNOT_CONFIG_PATH",
            path.display().to_string(),
        )]))
        .unwrap();

    assert_eq!(load.source, ConfigSource::EnvPath(path));
    let config = load.config;
    assert_eq!(config.backend.base_url, "https://knots.example.org");
    assert_eq!(config.backend.request_timeout, Duration::from_secs(90));
    assert_eq!(config.poll.max_attempts, 40);
    assert_eq!(config.poll.interval(), Duration::from_secs(3));
    assert_eq!(config.poll.unknown_status, UnknownStatusPolicy::KeepPolling);
    assert_eq!(
        config.snapshot.path,
        PathBuf::from("/var/lib/qknot/pending.json")
    );
}

#[test]
fn env_overrides_win_over_file_values() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "qknot.toml", TOML);

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_with(lookup(vec![
            ("QKNOT_BACKEND_URL", "http://10.0.0.5:8000".into()),
            ("QKNOT_MAX_POLL_ATTEMPTS", "5".into()),
            ("QKNOT_POLL_INTERVAL", "250ms".into()),
            ("QKNOT_REQUEST_TIMEOUT", "2m".into()),
            ("QKNOT_SNAPSHOT_PATH", "/tmp/override.json".into()),
            ("QKNOT_UNKNOWN_STATUS", "fail".into()),
        ]))
        .unwrap();

    assert_eq!(load.source, ConfigSource::File(path));
    let config = load.config;
    assert_eq!(config.backend.base_url, "http://10.0.0.5:8000");
    assert_eq!(config.backend.request_timeout, Duration::from_secs(120));
    assert_eq!(config.poll.max_attempts, 5);
    assert_eq!(config.poll.interval_ms, 250);
    assert_eq!(config.poll.unknown_status, UnknownStatusPolicy::Fail);
    assert_eq!(config.snapshot.path, PathBuf::from("/tmp/override.json"));
    assert!(!load.warnings.is_empty(), "5 x 250ms is a short budget");
}

#[test]
fn json_file_is_parsed_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "qknot.json",
        r#"{"poll": {"interval_ms": 1500}, "backend": {"base_url": "https://q.example"}}"#,
    );

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_with(lookup(vec![]))
        .unwrap();

    assert_eq!(load.config.poll.interval_ms, 1_500);
    assert_eq!(load.config.backend.base_url, "https://q.example");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = ConfigLoader::new()
        .with_config_path(&missing)
        .load_with(lookup(vec![]))
        .unwrap_err();

    assert!(matches!(err, ConfigLoadError::MissingConfig { path } if path == missing));
}

#[test]
fn malformed_file_reports_its_origin() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.toml", "[poll\nmax_attempts = ");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_with(lookup(vec![]))
        .unwrap_err();

    assert!(matches!(err, ConfigLoadError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn bad_duration_in_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "qknot.toml", "[poll]\ninterval = \"soon\"\n");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_with(lookup(vec![]))
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigLoadError::InvalidDuration { field: "poll.interval", .. }
    ));
}

#[test]
fn env_file_values_reach_the_loader() {
    let dir = TempDir::new().unwrap();
    let env_path = write(&dir, "qknot.env", "QKNOT_ENV_FILE_PROBE=present\n");

    let load = ConfigLoader::new().with_env_file(&env_path).load().unwrap();

    assert!(load.env_file_loaded);
    assert_eq!(
        std::env::var("QKNOT_ENV_FILE_PROBE").as_deref(),
        Ok("present")
    );
}
