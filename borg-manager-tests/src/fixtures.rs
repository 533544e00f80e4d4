//! Test fixtures and sample data
//!
//! Configuration templates use `{repo}`-style placeholders filled with
//! [`render`].

use borg_manager::utils::borg::{REPOSITORY_BANNER, REPOSITORY_MARKER_FILE, REPOSITORY_README_FILE};
use std::fs;
use std::io;
use std::path::Path;

/// Two archives, scheduled init/create/check
pub fn two_archive_config_toml() -> &'static str {
    r#"
default-actions = ["borg:init", "borg:create", "borg:check"]
borg-bin = "{borg}"

[[archives]]
[archives.borg]
repository = "{repo1}"
source = ["/etc"]

[[archives]]
[archives.borg]
repository = "{repo2}"
source = ["/home"]
"#
}

/// Shared defaults with an archive overriding part of them
pub fn defaults_config_toml() -> &'static str {
    r#"
default-actions = ["borg:create"]

[defaults.borg]
compression = " zstd,6 "
exclude = ["*.tmp"]
env-vars = { BORG_PASSCOMMAND = "cat /etc/borg/pass" }
commands-extra = { create = "--stats" }

[[archives]]
[archives.borg]
repository = "user@nas:main"

[[archives]]
[archives.borg]
repository = "user@nas:media"
exclude = []
env-vars = { BORG_RSH = "ssh -i /root/.ssh/media" }
commands-extra = { create = "--progress" }
"#
}

/// Archive with an rclone section and a custom command
pub fn rclone_config_toml() -> &'static str {
    r#"
default-actions = ["borg:create", "rclone:sync", "shell:report"]

[[archives]]
[archives.borg]
repository = "{repo1}"
source = ["/srv"]

[archives.rclone]
with-lock = true
destination = "b2:offsite"

[archives.report]
command-line = "echo synced $BORG_REPO"
"#
}

/// Same data as [`two_archive_config_toml`], in JSON
pub fn two_archive_config_json() -> &'static str {
    r#"{
  "default-actions": ["borg:init", "borg:create", "borg:check"],
  "borg-bin": "{borg}",
  "archives": [
    { "borg": { "repository": "{repo1}", "source": ["/etc"] } },
    { "borg": { "repository": "{repo2}", "source": ["/home"] } }
  ]
}"#
}

/// Replace `{key}` placeholders in a template
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

/// Make `dir` look like an initialized borg repository
pub fn create_initialized_repository(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(REPOSITORY_MARKER_FILE), "[repository]\nversion = 1\n")?;
    fs::write(
        dir.join(REPOSITORY_README_FILE),
        format!("{}. See https://borgbackup.readthedocs.io/\n", REPOSITORY_BANNER),
    )
}

/// Output of `borg init` on an existing repository
pub fn repository_exists_output(repository: &str) -> String {
    format!("A repository already exists at {}.\n", repository)
}
