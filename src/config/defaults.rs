//! Default values for configuration

use crate::models::VideoStatus;

/// Default owner recorded on videos added from the CLI
pub fn default_owner() -> Option<String> {
    std::env::var("CLIMBLOG_DEFAULT_OWNER")
        .ok()
        .filter(|owner| !owner.trim().is_empty())
}

/// Default SQLite connection pool size
pub fn default_max_connections() -> u32 {
    5
}

/// Default time a writer waits for the database lock (milliseconds)
pub fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Status given to legacy entries that carry none
pub fn default_legacy_status() -> VideoStatus {
    VideoStatus::Ready
}

/// Title given to legacy entries that carry none
pub fn default_legacy_title() -> String {
    "Untitled".to_string()
}

/// Render the commented config file written by `climblog init`
pub fn render_config_toml(owner: Option<&str>) -> String {
    let owner_line = match owner {
        Some(owner) => format!("default_owner = {:?}", owner),
        None => "# default_owner = \"your-user-id\"".to_string(),
    };

    format!(
        r#"# climblog configuration

# Owner recorded on videos added from the command line.
# Overridden per command with --owner.
{owner_line}

[database]
# SQLite connection pool size
max_connections = {max_connections}
# How long a writer waits for the database lock, in milliseconds
busy_timeout_ms = {busy_timeout_ms}

[import]
# Status for legacy entries without one (processing, ready or failed)
default_status = "{legacy_status}"
# Title for legacy entries without one
default_title = "{legacy_title}"
"#,
        max_connections = default_max_connections(),
        busy_timeout_ms = default_busy_timeout_ms(),
        legacy_status = default_legacy_status(),
        legacy_title = default_legacy_title(),
    )
}
