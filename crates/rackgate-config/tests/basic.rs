use rackgate_config::prelude::*;
use serial_test::serial;
use std::io::Write;
use std::sync::Arc;

fn defaults() -> serde_json::Value {
    serde_json::json!({
        "server": {"bind": "0.0.0.0:8080"},
        "logging": {"level": "info"},
        "auth": {"enabled": true}
    })
}

#[tokio::test]
#[serial]
async fn layers_override_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rackgate.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "server:\n  bind: 127.0.0.1:9000\nlogging:\n  level: warn").unwrap();

    std::env::set_var("RACKGATE_TEST__LOGGING__LEVEL", "debug");
    let loader = Loader::new(defaults())
        .with_source(Arc::new(FileSource::required(vec![path])))
        .with_source(Arc::new(EnvSource {
            prefix: "RACKGATE_TEST".into(),
            separator: "__".into(),
        }))
        .with_source(Arc::new(CliArgsSource {
            args: vec!["auth.enabled=false".into()],
        }));

    let snapshot = loader.load_once().await.expect("snapshot");
    std::env::remove_var("RACKGATE_TEST__LOGGING__LEVEL");

    let bind: String = snapshot.get(&KeyPath::new("server.bind")).unwrap();
    let level: String = snapshot.get(&KeyPath::new("logging.level")).unwrap();
    let enabled: bool = snapshot.get(&KeyPath::new("auth.enabled")).unwrap();
    assert_eq!(bind, "127.0.0.1:9000");
    assert_eq!(level, "debug");
    assert!(!enabled);
    assert!(!snapshot.checksum().0.is_empty());
    assert!(snapshot
        .provenance()
        .iter()
        .any(|p| p.layer == Layer::Env && p.key.0 == "logging.level"));
}

#[tokio::test]
async fn optional_missing_file_is_skipped() {
    let loader = Loader::new(defaults()).with_source(Arc::new(FileSource {
        paths: vec!["/definitely/not/here.yaml".into()],
        optional: true,
    }));
    let snapshot = loader.load_once().await.expect("snapshot");
    let bind: String = snapshot.get(&KeyPath::new("server.bind")).unwrap();
    assert_eq!(bind, "0.0.0.0:8080");
}

#[tokio::test]
async fn required_missing_file_fails() {
    let loader = Loader::new(defaults()).with_source(Arc::new(FileSource::required(vec![
        "/definitely/not/here.yaml".into(),
    ])));
    let err = loader.load_once().await.unwrap_err().into_inner();
    assert_eq!(err.http_status, 503);
}

#[tokio::test]
async fn toml_and_json_files_merge() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("a.toml");
    std::fs::write(&toml_path, "[handler]\ntimeout_ms = 500\n").unwrap();
    let json_path = dir.path().join("b.json");
    std::fs::write(&json_path, r#"{"handler": {"name": "x"}}"#).unwrap();

    let loader = Loader::new(defaults()).with_source(Arc::new(FileSource::required(vec![
        toml_path, json_path,
    ])));
    let snapshot = loader.load_once().await.unwrap();
    let timeout: u64 = snapshot.get(&KeyPath::new("handler.timeout_ms")).unwrap();
    let name: String = snapshot.get(&KeyPath::new("handler.name")).unwrap();
    assert_eq!(timeout, 500);
    assert_eq!(name, "x");
}

#[tokio::test]
async fn malformed_cli_override_is_rejected() {
    let loader = Loader::new(defaults()).with_source(Arc::new(CliArgsSource {
        args: vec!["no-equals-sign".into()],
    }));
    assert!(loader.load_once().await.is_err());
}
