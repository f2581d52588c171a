use serial_test::serial;
use std::{fs, path::PathBuf};
use tally_common::OutputFormat;
use tally_config::TallyConfigLoader;
use tempfile::TempDir;

fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn file_values_override_defaults_and_expand_placeholders() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
fetch:
  timeout_secs: 30
  retries: 2
count:
  top: 25
  count_head: true
output:
  file: "${TALLY_TEST_OUT_DIR}/ranking.txt"
  show: true
  format: json
log:
  stderr: true
  filter: "debug"
  "#;
    let p = write_yaml(&tmp, "wordtally.yaml", file_yaml);

    let config = temp_env::with_var("TALLY_TEST_OUT_DIR", Some("/srv/out"), || {
        TallyConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config")
    });

    assert_eq!(config.fetch.timeout_secs, 30);
    assert_eq!(config.fetch.retries, 2);
    assert_eq!(config.fetch.connect_timeout_secs, 5);
    assert_eq!(config.count.top, 25);
    assert!(config.count.count_head);
    assert_eq!(config.output.file, Some(PathBuf::from("/srv/out/ranking.txt")));
    assert!(config.output.show);
    assert_eq!(config.output.format, OutputFormat::Json);
    assert!(config.log.stderr);
    assert_eq!(config.log.filter, "debug");
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "wordtally.yaml", "count:\n  top: 5\n");

    let config = temp_env::with_vars(
        [
            ("TALLY__COUNT__TOP", Some("3")),
            ("TALLY__OUTPUT__SHOW", Some("true")),
        ],
        || TallyConfigLoader::new().with_file(&p).load().expect("load config"),
    );

    assert_eq!(config.count.top, 3);
    assert!(config.output.show);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.yaml");
    assert!(TallyConfigLoader::new().with_file(&missing).load().is_err());
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.yaml");
    let config = TallyConfigLoader::new()
        .with_optional_file(&missing)
        .load()
        .expect("defaults");
    assert_eq!(config.count.top, 10);
    assert_eq!(config.output.file, Some(PathBuf::from("result.txt")));
}

#[test]
#[serial]
fn numeric_looking_env_values_reach_string_fields() {
    let config = temp_env::with_vars(
        [
            ("TALLY__FETCH__USER_AGENT", Some("1")),
            ("TALLY__OUTPUT__FILE", Some("2024")),
            ("TALLY__FETCH__RETRIES", Some("2")),
            ("TALLY__COUNT__COUNT_HEAD", Some("true")),
            ("TALLY__OUTPUT__FORMAT", Some("json")),
        ],
        || TallyConfigLoader::new().load().expect("load config"),
    );

    assert_eq!(config.fetch.user_agent, "1");
    assert_eq!(config.output.file, Some(PathBuf::from("2024")));
    assert_eq!(config.fetch.retries, 2);
    assert!(config.count.count_head);
    assert_eq!(config.output.format, OutputFormat::Json);
}
