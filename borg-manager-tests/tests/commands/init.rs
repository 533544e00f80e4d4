//! Tests for `borg:init`
//!
//! Initialization is idempotent: an already initialized local repository is
//! never passed to `borg init`, and "repository already exists" is accepted.

use test_utils::{
    create_initialized_repository, repository_exists_output, ArchiveBuilder, ConfigBuilder,
    MockExecutor, MockResponse, TestContext,
};

#[test]
fn test_initialized_repository_skipped() {
    let builder = ConfigBuilder::new()
        .with_default_actions(&["borg:init", "borg:create"])
        .add_local_archive("existing")
        .add_local_archive("fresh");
    let existing = builder.repository_path("existing");
    let fresh = builder.repository_path("fresh");
    create_initialized_repository(&existing).unwrap();
    let ctx = TestContext::from_builder(builder);

    assert!(ctx.run());

    let lines = ctx.command_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        format!("borg init --encryption=repokey {}", fresh.display())
    );
    assert!(lines[1].starts_with("borg create"));
    assert!(lines[2].starts_with("borg create"));
}

#[test]
fn test_empty_directory_is_not_initialized() {
    let builder = ConfigBuilder::new()
        .with_default_actions(&["borg:init"])
        .add_local_archive("empty");
    std::fs::create_dir_all(builder.repository_path("empty")).unwrap();
    let ctx = TestContext::from_builder(builder);

    assert!(ctx.run());
    assert_eq!(ctx.executor().call_count("init"), 1);
}

#[test]
fn test_already_exists_is_accepted() {
    let executor = MockExecutor::new().expect(
        "init",
        MockResponse::exit(2, &repository_exists_output("user@backup:repo1")),
    );
    let ctx = TestContext::from_builder(
        ConfigBuilder::with_remote_archives(1).with_default_actions(&["borg:init", "borg:check"]),
    )
    .with_executor(executor);

    assert!(ctx.run());
    assert!(ctx.executor().was_called("check"));
}

#[test]
fn test_already_exists_wrapped_over_lines_is_accepted() {
    let executor = MockExecutor::new().expect(
        "init",
        MockResponse::exit(2, "A Repository\n  already   exists at ssh://backup/./repo1."),
    );
    let ctx = TestContext::from_builder(
        ConfigBuilder::with_remote_archives(1).with_default_actions(&["borg:init"]),
    )
    .with_executor(executor);

    assert!(ctx.run());
}

#[test]
fn test_other_init_errors_fail() {
    let executor = MockExecutor::new().expect(
        "init",
        MockResponse::exit(2, "Remote: Permission denied (publickey)."),
    );
    let ctx = TestContext::from_builder(
        ConfigBuilder::with_remote_archives(2).with_default_actions(&["borg:init", "borg:check"]),
    )
    .with_executor(executor);

    assert!(!ctx.run());
    assert_eq!(ctx.executor().call_count("init"), 1);
    assert!(!ctx.executor().was_called("check"));
}

#[test]
fn test_init_encryption_and_extra_args() {
    let builder = ConfigBuilder::new()
        .with_default_actions(&["borg:init:--append-only"])
        .add_archive(
            ArchiveBuilder::new("user@backup:repo")
                .with_encryption_mode(" repokey-blake2\n")
                .with_borg_extra("init", "--make-parent-dirs"),
        );
    let ctx = TestContext::from_builder(builder);

    assert!(ctx.run());
    assert_eq!(
        ctx.command_lines(),
        vec!["borg init --encryption=repokey-blake2 user@backup:repo --make-parent-dirs --append-only"]
    );
}
