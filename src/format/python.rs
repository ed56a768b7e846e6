//! Argument builders and output parsing for ruff, black and mypy.

use crate::runner::ToolOutput;

const FUTURE_ANNOTATIONS: &str = "from __future__ import annotations";

/// `py39` has no `match`, so the "outdated version block" rule misfires.
pub fn version_ignores(target: &str) -> &'static [&'static str] {
    match target {
        "py39" => &["UP036"],
        _ => &[],
    }
}

/// flake8-future-annotations for targets that still need the import.
pub fn version_rules(target: &str) -> &'static [&'static str] {
    match target {
        "py39" | "py310" => &["FA"],
        _ => &[],
    }
}

/// `py39` -> `3.9`, `py312` -> `3.12`.
pub fn mypy_python_version(target: &str) -> String {
    target.replacen("py3", "3.", 1)
}

fn run_args(tool: &str, rest: impl IntoIterator<Item = String>) -> Vec<String> {
    ["run", tool].into_iter().map(String::from).chain(rest).collect()
}

/// Options for one `ruff check` pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuffPass<'a> {
    pub fix: bool,
    pub select: Option<&'a str>,
    /// Add the target-specific `--ignore` / `--extend-select` flags.
    pub version_flags: bool,
}

pub fn ruff_args(file: &str, target: &str, pass: RuffPass<'_>) -> Vec<String> {
    let mut rest = vec!["check".to_string()];
    if pass.fix {
        rest.push("--fix".into());
    }
    rest.extend(["--target-version".to_string(), target.to_string()]);
    if let Some(select) = pass.select {
        rest.push(format!("--select={select}"));
    }
    if pass.version_flags {
        for rule in version_ignores(target) {
            rest.extend(["--ignore".to_string(), rule.to_string()]);
        }
        for rule in version_rules(target) {
            rest.extend(["--extend-select".to_string(), rule.to_string()]);
        }
    }
    rest.push(file.to_string());
    run_args("ruff", rest)
}

pub fn black_args(file: &str) -> Vec<String> {
    run_args("black", [file.to_string()])
}

pub fn version_args(tool: &str) -> Vec<String> {
    run_args(tool, ["--version".to_string()])
}

pub fn mypy_args(file: &str, target: &str) -> Vec<String> {
    run_args(
        "mypy",
        [
            "--strict".to_string(),
            "--python-version".to_string(),
            mypy_python_version(target),
            file.to_string(),
        ],
    )
}

/// Diagnostic lines from a failed ruff or mypy run, minus the summary line.
pub fn tool_errors(output: &ToolOutput) -> Vec<String> {
    if output.success || output.stdout.trim().is_empty() {
        return Vec::new();
    }
    output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Found"))
        .map(String::from)
        .collect()
}

/// True when the file has code but no `from __future__ import annotations`.
pub fn missing_future_annotations(content: &str) -> bool {
    let has_code = content
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with('#'));
    has_code && !content.contains(FUTURE_ANNOTATIONS)
}
