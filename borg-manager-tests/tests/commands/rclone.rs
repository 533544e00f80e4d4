//! Tests for rclone actions
//!
//! Commands needing a destination skip archives without one; with-lock wraps
//! the rclone call in `borg with-lock`.

use test_utils::{
    ArchiveBuilder, ConfigBuilder, MockExecutor, MockResponse, TestContext, BORG_REPO_VAR,
};

#[test]
fn test_missing_destination_skips_only_that_archive() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["rclone:sync", "borg:check"])
            .add_archive(ArchiveBuilder::new("user@backup:a").with_lock(false))
            .add_archive(ArchiveBuilder::new("user@backup:b").with_destination("b2:offsite/b")),
    );

    assert!(ctx.run());

    let calls = ctx.executor().get_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].command_line, "rclone sync user@backup:b b2:offsite/b");
    assert_eq!(calls[0].env_var(BORG_REPO_VAR), Some("user@backup:b"));
    assert_eq!(ctx.executor().call_count("borg check"), 2);
}

#[test]
fn test_archives_without_rclone_section_skipped() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::with_remote_archives(2).with_default_actions(&["rclone:sync"]),
    );

    assert!(ctx.run());
    assert!(ctx.command_lines().is_empty());
}

#[test]
fn test_command_without_destination_argument_runs() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["rclone:listremotes"])
            .add_archive(ArchiveBuilder::new("user@backup:a").with_lock(false)),
    );

    assert!(ctx.run());
    assert_eq!(ctx.command_lines(), vec!["rclone listremotes"]);
}

#[test]
fn test_with_lock_wraps_in_borg() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["rclone:copy:--transfers 8"])
            .add_archive(
                ArchiveBuilder::new("user@backup:a")
                    .with_borg_env("BORG_PASSCOMMAND", "pass borg")
                    .with_destination("b2:offsite/a")
                    .with_lock(true),
            ),
    );

    assert!(ctx.run());

    let calls = ctx.executor().get_calls();
    assert_eq!(
        calls[0].command_line,
        "borg with-lock user@backup:a rclone copy user@backup:a b2:offsite/a --transfers 8"
    );
    assert_eq!(calls[0].env_var("BORG_PASSCOMMAND"), Some("pass borg"));
    assert_eq!(calls[0].env_var(BORG_REPO_VAR), Some("user@backup:a"));
}

#[test]
fn test_rclone_failure_aborts_run() {
    let executor = MockExecutor::new().expect("rclone sync", MockResponse::exit(7, "Fatal error"));
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["rclone:sync", "borg:check"])
            .add_archive(ArchiveBuilder::new("user@backup:a").with_destination("b2:a"))
            .add_archive(ArchiveBuilder::new("user@backup:b").with_destination("b2:b")),
    )
    .with_executor(executor);

    assert!(!ctx.run());
    assert_eq!(ctx.command_lines(), vec!["rclone sync user@backup:a b2:a"]);
}

#[test]
fn test_rclone_ignore_list() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["rclone:sync", "rclone:size"])
            .add_archive(
                ArchiveBuilder::new("user@backup:a")
                    .with_destination("b2:a")
                    .ignoring_rclone(&["sync"]),
            ),
    );

    assert!(ctx.run());
    assert_eq!(ctx.command_lines(), vec!["rclone size b2:a"]);
}
