use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::eval::Decision;

/// Environment variable holding the log level (`debug`, `warn`, `off`, ...).
pub const LOG_LEVEL_ENV: &str = "CC_DEVFLOW_LOG";

/// `~/.local/share/cc-devflow`, or `None` without a home directory.
pub fn log_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".local/share/cc-devflow"))
}

fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Send `log` records to ~/.local/share/cc-devflow/hooks.log.
/// Best-effort: failures are silently ignored (logging must never block the hook).
pub fn init() {
    let level = level_from_env();
    if level == LevelFilter::Off {
        return;
    }
    let Some(dir) = log_dir() else {
        return;
    };
    let _ = std::fs::create_dir_all(&dir);
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("hooks.log"))
    else {
        return;
    };

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_time_format_rfc3339()
        .build();
    let _ = WriteLogger::init(level, config, file);
}

/// Collapse a multi-line text onto one log line and cap its length.
fn one_line(text: &str, max_chars: usize) -> String {
    text.replace('\n', "; ").chars().take(max_chars).collect()
}

/// Record one decision: hook name, label, what was checked, and why.
pub fn log_decision(hook: &str, subject: &str, decision: &Decision) {
    log::info!(
        "{hook}\t{label}\t{subject}\t{reason}",
        label = decision.label(),
        subject = one_line(subject, 200),
        reason = one_line(decision.reason(), 1000),
    );
}
