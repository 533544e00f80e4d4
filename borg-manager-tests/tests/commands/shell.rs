//! Tests for custom shell commands (`shell:<label>`)

use test_utils::{
    predicate_gate, ArchiveBuilder, ConfigBuilder, MockExecutor, MockResponse, TestContext,
    BORG_REPO_VAR,
};

#[test]
fn test_labelled_command_runs_per_archive() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["shell:report"])
            .add_archive(ArchiveBuilder::new("user@backup:a").with_command("report", "echo \"repo: $BORG_REPO\""))
            .add_archive(ArchiveBuilder::new("user@backup:b"))
            .add_archive(ArchiveBuilder::new("user@backup:c").with_command("report", "df -h")),
    );

    assert!(ctx.run());

    let calls = ctx.executor().get_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].command_line, "echo \"repo: $BORG_REPO\"");
    assert_eq!(calls[0].env_var(BORG_REPO_VAR), Some("user@backup:a"));
    assert_eq!(calls[1].command_line, "df -h");
    assert_eq!(calls[1].env_var(BORG_REPO_VAR), Some("user@backup:c"));
}

#[test]
fn test_params_appended() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .add_archive(ArchiveBuilder::new("user@backup:a").with_command("notify", "notify-send backup")),
    );

    assert!(ctx.run_actions(&["shell:notify:--urgency=low"]));
    assert_eq!(ctx.command_lines(), vec!["notify-send backup --urgency=low"]);
}

#[test]
fn test_borg_gates_do_not_apply() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["shell:notify"])
            .add_archive(
                ArchiveBuilder::new("user@backup:a")
                    .ignoring_borg(&["notify"])
                    .borg_run_before(predicate_gate("never"))
                    .with_command("notify", "true"),
            ),
    );

    assert!(ctx.run());
    assert_eq!(ctx.command_lines(), vec!["true"]);
}

#[test]
fn test_failing_command_fails_run() {
    let executor = MockExecutor::new().expect("false", MockResponse::exit(1, ""));
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["shell:verify", "borg:check"])
            .add_archive(ArchiveBuilder::new("user@backup:a").with_command("verify", "false")),
    )
    .with_executor(executor);

    assert!(!ctx.run());
    assert!(!ctx.executor().was_called("borg check"));
}
