// tests/config_errors.rs

use std::io::Write;

use tempfile::NamedTempFile;

use domwatch::config::{default_config_path, load_and_validate};
use domwatch::errors::DomWatchError;
use domwatch::logging::LogLevel;
use domwatch::Environment;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn endpoint_with_query_returns_config_error() {
    let file = write_config(
        r#"
[data_connector]
endpoint = "https://api.example.com/?debug=1"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DomWatchError::ConfigError(msg)) => {
            assert!(msg.contains("endpoint"));
            assert!(msg.contains("debug=1"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn reserved_characters_in_param_key_return_config_error() {
    let file = write_config(
        r#"
[data_connector.query_params]
"a&b" = "1"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DomWatchError::ConfigError(msg)) => assert!(msg.contains("a&b")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_returns_toml_error() {
    let file = write_config("[data_connector\nendpoint = 1");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(DomWatchError::TomlError(_))
    ));
}

#[test]
fn bad_log_level_is_a_toml_error() {
    let file = write_config("[logging]\nlevel = \"chatty\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(DomWatchError::TomlError(_))
    ));
}

#[test]
fn missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join(default_config_path());
    assert!(matches!(
        load_and_validate(&missing),
        Err(DomWatchError::IoError(_))
    ));
}

#[test]
fn environment_wires_config_into_data_connector() {
    let file = write_config(
        r#"
[data_connector]
endpoint = "https://svc"

[data_connector.query_params]
v = "2"

[logging]
level = "warn"
"#,
    );

    let env = Environment::load(file.path()).unwrap();
    assert_eq!(env.config.logging.level, Some(LogLevel::Warn));
    assert_eq!(env.data_connector.api_url("/x", None), "https://svc/x?v=2");
}
