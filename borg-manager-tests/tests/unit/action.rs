//! Unit tests for action parsing and handler resolution

use rstest::rstest;
use test_utils::{Action, ConfigError, HandlerRegistry, Prefix};

#[rstest]
#[case("borg:create", Prefix::Borg, "create", "")]
#[case("rclone:sync:--dry-run", Prefix::Rclone, "sync", "--dry-run")]
#[case("shell:notify", Prefix::Shell, "notify", "")]
#[case("borg:prune:--glob-archives 'host-*'", Prefix::Borg, "prune", "--glob-archives 'host-*'")]
#[case("rclone:copyto:--header X-Key:a:b", Prefix::Rclone, "copyto", "--header X-Key:a:b")]
fn test_parse_action(
    #[case] input: &str,
    #[case] prefix: Prefix,
    #[case] command: &str,
    #[case] params: &str,
) {
    let action = Action::parse(input).unwrap();
    assert_eq!(action.prefix, prefix);
    assert_eq!(action.command, command);
    assert_eq!(action.params, params);
}

#[rstest]
#[case("create")]
#[case("borg")]
#[case("")]
fn test_malformed_action_names_input(#[case] input: &str) {
    match Action::parse(input) {
        Err(ConfigError::InvalidAction(s)) => assert_eq!(s, input),
        other => panic!("expected InvalidAction for '{}', got {:?}", input, other),
    }
}

#[test]
fn test_unknown_prefix() {
    let err = Action::parse("tar:backup").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownPrefix(_)));
    assert!(err.to_string().contains("borg, rclone, shell"));
}

#[test]
fn test_display_round_trip() {
    let action = Action::parse("borg:prune:--list").unwrap();
    assert_eq!(action.to_string(), "borg:prune:--list");
    assert_eq!(Action::parse("borg:check").unwrap().to_string(), "borg:check");
}

#[rstest]
#[case("borg:init", "borg-init")]
#[case("borg:create", "borg-create")]
#[case("borg:compact", "borg-default")]
#[case("rclone:sync", "rclone-default")]
#[case("shell:anything", "shell-command")]
fn test_registry_resolution(#[case] input: &str, #[case] handler: &str) {
    let registry = HandlerRegistry::new();
    let action = Action::parse(input).unwrap();
    assert_eq!(registry.resolve(&action).name(), handler);
}
