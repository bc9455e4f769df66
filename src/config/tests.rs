use super::*;
use tempfile::{tempdir, TempDir};
use std::fs::File;
use std::io::Write;

/// Helper function to create a test configuration file
fn create_test_config_file(dir: &TempDir, content: &str) -> PathBuf {
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    let mut file = File::create(&config_path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    config_path
}

fn sample_config() -> Config {
    Config {
        database_url: "original.db".to_string(),
        bind_address: "127.0.0.1:9000".to_string(),
        media_root: PathBuf::from("/srv/media"),
        media_url: "/files/".to_string(),
        identity_header: "x-user".to_string(),
        max_upload_mb: 5,
        cors_allowed_origins: vec!["https://a.example".to_string()],
        log_dir: None,
    }
}

/// Tests for Config::apply_update
#[test]
fn test_apply_update_with_all_values() {
    let update = ConfigUpdate {
        database_url: Some("updated.db".to_string()),
        bind_address: Some("0.0.0.0:80".to_string()),
        media_root: Some(PathBuf::from("/data/media")),
        media_url: Some("/media/".to_string()),
        identity_header: Some(String::new()),
        max_upload_mb: Some(50),
        cors_allowed_origins: Some(vec![]),
        log_dir: Some(PathBuf::from("/var/log/bazaar")),
        server_url: Some("http://ignored".to_string()),
    };

    let updated = sample_config().apply_update(update);

    assert_eq!(updated.database_url, "updated.db");
    assert_eq!(updated.bind_address, "0.0.0.0:80");
    assert_eq!(updated.media_root, PathBuf::from("/data/media"));
    assert_eq!(updated.media_url, "/media/");
    assert_eq!(updated.identity_header, "");
    assert_eq!(updated.max_upload_mb, 50);
    assert!(updated.cors_allowed_origins.is_empty());
    assert_eq!(updated.log_dir, Some(PathBuf::from("/var/log/bazaar")));
}


#[test]
fn test_apply_update_with_partial_values() {
    let update = ConfigUpdate {
        database_url: Some("updated.db".to_string()),
        max_upload_mb: Some(1),
        ..ConfigUpdate::default()
    };

    let updated = sample_config().apply_update(update);

    assert_eq!(updated.database_url, "updated.db");
    assert_eq!(updated.max_upload_mb, 1);
    assert_eq!(updated.bind_address, "127.0.0.1:9000"); // Unchanged
    assert_eq!(updated.cors_allowed_origins, vec!["https://a.example".to_string()]); // Unchanged
}


#[test]
fn test_apply_update_with_no_values() {
    let updated = sample_config().apply_update(ConfigUpdate::default());
    assert_eq!(updated, sample_config());
}


#[test]
fn test_max_upload_bytes() {
    let config = sample_config();
    assert_eq!(config.max_upload_bytes(), 5 * 1024 * 1024);

    let huge = Config { max_upload_mb: u64::MAX, ..sample_config() };
    assert_eq!(huge.max_upload_bytes(), usize::MAX);
}


/// Tests for base_config
#[test]
fn test_base_config_defaults() {
    let config = base_config(None);

    assert_eq!(config.database_url, "bazaar.db");
    assert_eq!(config.bind_address, "127.0.0.1:8000");
    assert_eq!(config.media_root, PathBuf::from("media"));
    assert_eq!(config.media_url, "/media/");
    assert_eq!(config.identity_header, "x-authenticated-user");
    assert_eq!(config.max_upload_mb, 10);
    assert!(config.cors_allowed_origins.is_empty());
    assert_eq!(config.log_dir, None);
}


#[test]
fn test_base_config_with_path() {
    let temp_dir = tempdir().unwrap();
    let config = base_config(Some(temp_dir.path().to_path_buf()));

    let expected_db_path = temp_dir.path().join("bazaar.db").to_string_lossy().to_string();
    assert_eq!(config.database_url, expected_db_path);
    assert_eq!(config.media_root, temp_dir.path().join("media"));
}


/// Tests for config_from_args
#[test]
fn test_config_from_args_with_values() {
    let args = CliArgs {
        database_url: Some("args.db".to_string()),
        max_upload_mb: Some(3),
        cors_allowed_origins: Some(vec!["https://x.example".to_string(), "https://y.example".to_string()]),
        debug: true,
        ..CliArgs::default()
    };

    let update = config_from_args(&args);

    assert_eq!(update.database_url, Some("args.db".to_string()));
    assert_eq!(update.max_upload_mb, Some(3));
    assert_eq!(update.cors_allowed_origins.unwrap().len(), 2);
    assert_eq!(update.bind_address, None);
    assert_eq!(update.server_url, None);
}


#[test]
fn test_cli_args_parse_origins_list() {
    let args = CliArgs::try_parse_from([
        "bazaar",
        "--cors-allowed-origins",
        "https://x.example,https://y.example",
        "--identity-header",
        "",
    ]).unwrap();

    assert_eq!(
        args.cors_allowed_origins,
        Some(vec!["https://x.example".to_string(), "https://y.example".to_string()])
    );
    assert_eq!(args.identity_header, Some(String::new()));
}


#[test]
fn test_config_from_args_with_no_values() {
    let update = config_from_args(&CliArgs::default());
    assert_eq!(update, ConfigUpdate::default());
}


/// Tests for config_from_file - successful cases
#[test]
fn test_config_from_file_with_no_path() {
    let update = config_from_file(None).unwrap();
    assert_eq!(update, ConfigUpdate::default());
}


#[test]
fn test_config_from_file_with_valid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_content = r#"
        database_url = "file.db"
        bind_address = "0.0.0.0:8080"
        media_url = "/uploads/"
        max_upload_mb = 25
        cors_allowed_origins = ["https://shop.example"]
        server_url = "http://shop.internal:8080"
    "#;

    let config_path = create_test_config_file(&temp_dir, config_content);

    let result = config_from_file(Some(config_path));

    let update = result.unwrap();
    assert_eq!(update.database_url, Some("file.db".to_string()));
    assert_eq!(update.bind_address, Some("0.0.0.0:8080".to_string()));
    assert_eq!(update.media_url, Some("/uploads/".to_string()));
    assert_eq!(update.max_upload_mb, Some(25));
    assert_eq!(update.cors_allowed_origins, Some(vec!["https://shop.example".to_string()]));
    assert_eq!(update.server_url, Some("http://shop.internal:8080".to_string()));
    assert_eq!(update.media_root, None);
}


/// Tests for config_from_file - failure cases
#[test]
fn test_config_from_file_with_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_content = r#"
        database_url = "file.db"
        max_upload_mb = "not a number" # Type error
    "#;

    let config_path = create_test_config_file(&temp_dir, config_content);

    let result = config_from_file(Some(config_path));

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}


#[test]
fn test_config_from_file_unreadable() {
    let temp_dir = tempdir().unwrap();

    // A directory exists but cannot be read as a file
    let result = config_from_file(Some(temp_dir.path().to_path_buf()));

    assert!(matches!(result, Err(ConfigError::Read { .. })));
}


#[test]
fn test_config_from_file_with_nonexistent_file() {
    let temp_dir = tempdir().unwrap();
    let nonexistent_path = temp_dir.path().join("nonexistent_config.toml");

    let update = config_from_file(Some(nonexistent_path)).unwrap();

    assert_eq!(update, ConfigUpdate::default());
}


/// Tests for layering
#[test]
fn test_config_precedence() {
    let args = CliArgs {
        database_url: Some("args.db".to_string()),
        ..CliArgs::default()
    };

    let file_update = ConfigUpdate {
        database_url: Some("file.db".to_string()),
        media_url: Some("/uploads/".to_string()),
        ..ConfigUpdate::default()
    };

    let config = base_config(None)
        .apply_update(file_update)
        .apply_update(config_from_args(&args));

    assert_eq!(config.database_url, "args.db"); // From args
    assert_eq!(config.media_url, "/uploads/"); // From file
    assert_eq!(config.bind_address, "127.0.0.1:8000"); // From base
}
