use repertoire::config::{Config, load_from_path, save_to_path};
use std::io::Write;
use tempfile::{NamedTempFile, tempdir};

#[test]
fn test_load_config_valid() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let config_content = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [storage]
        data_dir_override = "/tmp/repertoire-data"

        [api]
        token = "abc123"

        [remote]
        url = "https://media.example.com"
        use_keyring = false
    "#;
    temp_file.write_all(config_content.as_bytes()).unwrap();

    let config = load_from_path(temp_file.path()).expect("Failed to load valid config");

    assert_eq!(config.server.address(), "0.0.0.0:9000");
    assert_eq!(
        config.storage.data_dir_override.as_deref(),
        Some(std::path::Path::new("/tmp/repertoire-data"))
    );
    assert_eq!(config.api.token.as_deref(), Some("abc123"));
    assert_eq!(config.remote.url, "https://media.example.com");
    assert!(!config.remote.use_keyring);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_config_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"").unwrap();

    let config = load_from_path(temp_file.path()).expect("Empty config should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.upload_limit_mb, 10);
    assert!(config.storage.data_dir_override.is_none());
    assert!(config.api.token.is_none());
    assert_eq!(config.remote.url, "http://127.0.0.1:8000");
    assert!(config.remote.use_keyring);
}

#[test]
fn test_load_config_invalid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server\nport = ").unwrap();

    assert!(load_from_path(temp_file.path()).is_err());
}

#[test]
fn test_load_config_wrong_type() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[server]\nport = \"not a port\"\n")
        .unwrap();

    assert!(load_from_path(temp_file.path()).is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.server.port = 8123;
    config.api.token = Some("s3cr3t".to_string());
    save_to_path(&config, &path).unwrap();

    let reloaded = load_from_path(&path).unwrap();
    assert_eq!(reloaded.server.port, 8123);
    assert_eq!(reloaded.api.token.as_deref(), Some("s3cr3t"));
}

#[test]
fn test_remote_token_from_config_without_keyring() {
    let mut config = Config::default();
    config.remote.use_keyring = false;
    config.remote.token = Some("plain".to_string());

    assert_eq!(config.get_remote_token().unwrap(), "plain");
    assert!(!config.migrate_credentials().unwrap());
    assert_eq!(config.remote.token.as_deref(), Some("plain"));
}

#[test]
fn test_remote_token_missing() {
    let mut config = Config::default();
    config.remote.use_keyring = false;

    let err = config.get_remote_token().unwrap_err();
    assert!(err.to_string().contains("remote login"));
}
