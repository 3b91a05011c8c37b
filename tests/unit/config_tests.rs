//! Unit tests for configuration parsing and validation.

use visit_intercom::{AppError, GlobalConfig};

fn minimal_toml() -> &'static str {
    r#"
[slack]
channel_id = "C_OPERATORS"
"#
}

#[test]
fn minimal_config_applies_defaults() {
    let config = GlobalConfig::from_toml_str(minimal_toml()).expect("parse");

    assert_eq!(config.http_port, 5000);
    assert_eq!(config.slot_ttl_seconds, 300);
    assert_eq!(config.geo_timeout_seconds, 3);
    assert_eq!(config.geo_base_url, "http://ip-api.com");
    assert!(config.authorized_user_ids.is_empty());
    assert_eq!(config.slack.channel_id, "C_OPERATORS");
    // Tokens never come from the TOML file.
    assert!(config.slack.bot_token.is_empty());
    assert!(config.slack.app_token.is_empty());
}

#[test]
fn full_config_overrides_defaults() {
    let raw = r#"
http_port = 8088
db_path = "/tmp/handoff.db"
slot_ttl_seconds = 60
geo_timeout_seconds = 1
geo_base_url = "http://127.0.0.1:9000"
authorized_user_ids = ["U1", "U2"]

[slack]
channel_id = "C_OPS"
"#;
    let config = GlobalConfig::from_toml_str(raw).expect("parse");

    assert_eq!(config.http_port, 8088);
    assert_eq!(config.slot_ttl_seconds, 60);
    assert_eq!(config.slot_ttl(), std::time::Duration::from_secs(60));
    assert_eq!(config.geo_base_url, "http://127.0.0.1:9000");
    assert_eq!(config.authorized_user_ids, vec!["U1", "U2"]);
}

#[test]
fn empty_channel_id_rejected() {
    let raw = r#"
[slack]
channel_id = ""
"#;
    let err = GlobalConfig::from_toml_str(raw).expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn zero_ttl_rejected() {
    let raw = r#"
slot_ttl_seconds = 0

[slack]
channel_id = "C_OPS"
"#;
    let err = GlobalConfig::from_toml_str(raw).expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn empty_geo_base_url_rejected() {
    let raw = r#"
geo_base_url = ""

[slack]
channel_id = "C_OPS"
"#;
    let err = GlobalConfig::from_toml_str(raw).expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn invalid_toml_rejected() {
    let err = GlobalConfig::from_toml_str("not [valid").expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn missing_slack_section_rejected() {
    let err = GlobalConfig::from_toml_str("http_port = 5000").expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}
