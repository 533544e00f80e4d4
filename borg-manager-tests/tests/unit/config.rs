//! Unit tests for configuration loading and validation

use borg_manager::config::{load_config, Recipients};
use test_utils::{render, two_archive_config_json, two_archive_config_toml, ConfigError, Gate, TestContext};
use tracing::Level;

#[test]
fn test_toml_and_json_load_the_same() {
    let ctx = TestContext::new();
    let values = [("borg", "/usr/bin/borg"), ("repo1", "/srv/a"), ("repo2", "user@nas:b")];
    let toml_path = ctx.create_file("main.toml", &render(two_archive_config_toml(), &values));
    let json_path = ctx.create_file("main.json", &render(two_archive_config_json(), &values));

    let from_toml = load_config(&toml_path).unwrap();
    let from_json = load_config(&json_path).unwrap();

    assert_eq!(from_toml.default_actions, from_json.default_actions);
    assert_eq!(from_toml.archives, from_json.archives);
    assert_eq!(
        from_toml.default_actions,
        vec!["borg:init", "borg:create", "borg:check"]
    );
    assert_eq!(from_toml.borg_bin.unwrap().display().to_string(), "/usr/bin/borg");
}

#[test]
fn test_unsupported_extension() {
    let ctx = TestContext::new();
    let path = ctx.create_file("main.yaml", "default-actions: []");
    assert!(matches!(
        load_config(&path),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_file() {
    let ctx = TestContext::new();
    let result = load_config(ctx.temp_dir().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_syntax_error_reported() {
    let ctx = TestContext::new();
    let path = ctx.create_file("broken.toml", "default-actions = [\"borg:create\"\n");
    assert!(matches!(load_config(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_gate_forms_and_do_if_alias() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "gates.toml",
        r#"
default-actions = []

[[archives]]
[archives.borg]
repository = "user@nas:repo"
do-if = "ping -c 1 nas"
run-after = { predicate = "always" }

[archives.rclone]
destination = "b2:offsite"
run-before = { predicate = "destination-configured" }
"#,
    );

    let config = load_config(&path).unwrap();
    let borg = config.archives[0].borg.as_ref().unwrap();
    assert_eq!(borg.run_before, Some(Gate::Command("ping -c 1 nas".into())));
    assert_eq!(
        borg.run_after,
        Some(Gate::Predicate {
            predicate: "always".into()
        })
    );
    let rclone = config.archives[0].rclone.as_ref().unwrap();
    assert_eq!(
        rclone.run_before.as_ref().map(|g| g.to_string()),
        Some("predicate 'destination-configured'".to_string())
    );
}

#[test]
fn test_email_section() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "email.toml",
        r#"
default-actions = ["borg:create"]
log-level = "debug"
email-log-level = "warning"

[email]
from = "backup@example.org"
to = ["ops@example.org", "admin@example.org"]
subject = "nas backup"

[email.smtp]
host = "smtp.example.org"
port = 587
useSTARTTLS = true
password = "secret"
"#,
    );

    let config = load_config(&path).unwrap();
    let email = config.email.as_ref().unwrap();
    assert!(email.enabled);
    assert_eq!(
        email.to,
        Recipients::Many(vec!["ops@example.org".into(), "admin@example.org".into()])
    );
    let smtp = email.smtp.as_ref().unwrap();
    assert!(smtp.use_starttls);
    assert_eq!(smtp.port, 587);

    assert_eq!(config.base_level(), Level::DEBUG);
    assert_eq!(config.console_level(), Level::DEBUG);
    assert_eq!(config.email_level(), Level::WARN);
}

#[test]
fn test_email_without_recipient_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "email.toml",
        r#"
default-actions = []

[email]
from = "backup@example.org"
to = ""
"#,
    );

    assert!(matches!(
        load_config(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_unknown_log_level_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file("levels.toml", "default-actions = []\nconsole-log-level = \"chatty\"\n");

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("chatty"));
}

#[test]
fn test_levels_default_to_info() {
    let config = test_utils::Config::default();
    assert_eq!(config.console_level(), Level::INFO);
    assert_eq!(config.email_level(), Level::INFO);
}
