//! Tests for run-before / run-after gates
//!
//! Gates are evaluated per action and per archive; one archive's failed
//! condition never affects another archive.

use test_utils::{
    predicate_gate, shell_gate, ArchiveBuilder, ConfigBuilder, MockExecutor, MockResponse,
    PredicateRegistry, RecordingPredicate, TestContext, BORG_REPO_VAR,
};

#[test]
fn test_shell_gate_skips_only_its_archive() {
    let executor = MockExecutor::new().expect("ping -c 1 nas-a", MockResponse::exit(1, "unreachable"));
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create"])
            .add_archive(ArchiveBuilder::new("user@nas-a:repo").borg_run_before(shell_gate("ping -c 1 nas-a")))
            .add_archive(ArchiveBuilder::new("user@nas-b:repo").borg_run_before(shell_gate("ping -c 1 nas-b"))),
    )
    .with_executor(executor);

    assert!(ctx.run());

    let lines = ctx.command_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "ping -c 1 nas-a");
    assert_eq!(lines[1], "ping -c 1 nas-b");
    assert!(lines[2].starts_with("borg create"));
    assert_eq!(
        ctx.executor().get_calls()[2].env_var(BORG_REPO_VAR),
        Some("user@nas-b:repo")
    );
}

#[test]
fn test_gate_sees_archive_environment() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:check"])
            .add_archive(
                ArchiveBuilder::new("user@backup:a")
                    .with_borg_env("BORG_RSH", "ssh -p 2222")
                    .borg_run_before(shell_gate("test -n \"$BORG_RSH\"")),
            ),
    );

    assert!(ctx.run());
    let calls = ctx.executor().get_calls();
    assert_eq!(calls[0].env_var("BORG_RSH"), Some("ssh -p 2222"));
    assert_eq!(calls[0].env_var(BORG_REPO_VAR), Some("user@backup:a"));
}

#[test]
fn test_gates_evaluated_per_action() {
    let recorder = RecordingPredicate::new();
    let mut registry = PredicateRegistry::new();
    recorder.register(&mut registry, "is-online", |_| true);

    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create", "borg:prune"])
            .add_archive(ArchiveBuilder::new("user@backup:a").borg_run_before(predicate_gate("is-online")))
            .add_archive(ArchiveBuilder::new("user@backup:b").borg_run_before(predicate_gate("is-online"))),
    )
    .with_predicates(registry);

    assert!(ctx.run());
    assert_eq!(
        recorder.seen(),
        vec!["user@backup:a", "user@backup:b", "user@backup:a", "user@backup:b"]
    );
    assert_eq!(ctx.command_lines().len(), 4);
}

#[test]
fn test_never_predicate_skips_without_failing() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create"])
            .add_archive(ArchiveBuilder::new("user@backup:a").borg_run_before(predicate_gate("never"))),
    );

    assert!(ctx.run());
    assert!(ctx.command_lines().is_empty());
}

#[test]
fn test_unknown_predicate_fails_before_running() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create"])
            .add_archive(ArchiveBuilder::new("user@backup:a"))
            .add_archive(ArchiveBuilder::new("user@backup:b").borg_run_before(predicate_gate("is-weekend"))),
    );

    assert!(!ctx.run());
    assert!(ctx.command_lines().is_empty());
}

#[test]
fn test_run_after_follows_successful_step() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create"])
            .add_archive(ArchiveBuilder::new("user@backup:a").borg_run_after(shell_gate("touch /tmp/done"))),
    );

    assert!(ctx.run());
    let lines = ctx.command_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("borg create"));
    assert_eq!(lines[1], "touch /tmp/done");
}

#[test]
fn test_run_after_result_is_ignored() {
    let executor = MockExecutor::new().expect("cleanup", MockResponse::exit(3, "nothing to clean"));
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create", "borg:check"])
            .add_archive(ArchiveBuilder::new("user@backup:a").borg_run_after(shell_gate("cleanup"))),
    )
    .with_executor(executor);

    assert!(ctx.run());
    assert_eq!(ctx.executor().call_count("cleanup"), 2);
    assert!(ctx.executor().was_called("borg check"));
}

#[test]
fn test_run_after_skipped_when_step_fails() {
    let executor = MockExecutor::new().expect("borg create", MockResponse::exit(2, "lock timeout"));
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create"])
            .add_archive(ArchiveBuilder::new("user@backup:a").borg_run_after(shell_gate("cleanup"))),
    )
    .with_executor(executor);

    assert!(!ctx.run());
    assert!(!ctx.executor().was_called("cleanup"));
}

#[test]
fn test_run_after_skipped_when_precondition_fails() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create"])
            .add_archive(
                ArchiveBuilder::new("user@backup:a")
                    .borg_run_before(predicate_gate("never"))
                    .borg_run_after(shell_gate("cleanup")),
            ),
    );

    assert!(ctx.run());
    assert!(ctx.command_lines().is_empty());
}

#[test]
fn test_rclone_gate_independent_of_borg_gate() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .with_default_actions(&["borg:create", "rclone:sync"])
            .add_archive(
                ArchiveBuilder::new("user@backup:a")
                    .borg_run_before(predicate_gate("never"))
                    .with_destination("b2:a")
                    .rclone_run_before(predicate_gate("destination-configured")),
            ),
    );

    assert!(ctx.run());
    assert_eq!(ctx.command_lines(), vec!["rclone sync user@backup:a b2:a"]);
}
