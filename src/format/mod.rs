//! PostToolUse formatting and type checking of written Python files.
//!
//! The write has already happened when this runs, so the only thing a
//! problem can produce is an advisory block asking the agent to follow up.

pub mod python;

use std::path::{Path, PathBuf};

use crate::config::{PolicyConfig, StrictnessLevel, defaults, detect_python_version};
use crate::eval::Decision;
use crate::hook::HookInput;
use crate::runner::{ToolError, ToolOutput, ToolRunner};

use python::RuffPass;

/// Everything the orchestrator needs, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSettings {
    pub level: StrictnessLevel,
    /// Ruff-style target, e.g. `py311`.
    pub target_python: String,
    /// Program the tools are run through (`uv run ...`).
    pub runner: String,
    pub project_dir: PathBuf,
}

impl FormatSettings {
    pub fn resolve(config: &PolicyConfig, project_dir: &Path) -> Self {
        Self {
            level: config.strictness,
            target_python: detect_python_version(project_dir),
            runner: defaults().format.runner.clone(),
            project_dir: project_dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Formatting,
    TypeChecking,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// Not a write to an existing Python file; nothing is printed.
    NotApplicable,
    Done {
        file: PathBuf,
        advisory: Option<Decision>,
        /// Reported on stderr only.
        warnings: Vec<String>,
    },
}

/// The written file, if this event is one the formatter handles.
pub fn target_file(input: &HookInput) -> Option<PathBuf> {
    let raw = input.edited_file()?;
    let mut path = PathBuf::from(shellexpand::tilde(raw).into_owned());
    if path.is_relative()
        && let Some(cwd) = input.cwd.as_deref()
    {
        path = Path::new(cwd).join(path);
    }

    let ext = path.extension()?.to_str()?;
    if !defaults().format.extensions.iter().any(|e| e == ext) {
        return None;
    }
    path.exists().then_some(path)
}

#[derive(Debug, Default)]
struct Report {
    lint_errors: Vec<String>,
    type_errors: Vec<String>,
    failures: Vec<String>,
    warnings: Vec<String>,
}

impl Report {
    fn advisory(&self, file: &str) -> Option<Decision> {
        let sections: Vec<String> = [
            ("Lint errors in", &self.lint_errors),
            ("Type errors in", &self.type_errors),
            ("Tool failures for", &self.failures),
        ]
        .into_iter()
        .filter(|(_, lines)| !lines.is_empty())
        .map(|(title, lines)| format!("{title} {file}:\n{}", lines.join("\n")))
        .collect();

        (!sections.is_empty()).then(|| Decision::AdvisoryBlock {
            reason: sections.join("\n\n"),
        })
    }
}

pub struct FormatHook<'a> {
    settings: &'a FormatSettings,
    runner: &'a dyn ToolRunner,
}

impl<'a> FormatHook<'a> {
    pub fn new(settings: &'a FormatSettings, runner: &'a dyn ToolRunner) -> Self {
        Self { settings, runner }
    }

    fn run_tool(&self, args: &[String]) -> Result<ToolOutput, ToolError> {
        log::debug!("{} {}", self.settings.runner, args.join(" "));
        self.runner
            .run(&self.settings.runner, args, Some(&self.settings.project_dir))
    }

    fn succeeds(&self, args: &[String]) -> bool {
        self.run_tool(args).is_ok_and(|out| out.success)
    }

    /// Install hint for the first missing tool, if any.
    pub fn missing_dependency(&self) -> Option<String> {
        if !self.runner.available(&self.settings.runner) {
            return Some(
                "uv not found. Install: curl -LsSf https://astral.sh/uv/install.sh | sh".into(),
            );
        }
        ["ruff", "black"]
            .into_iter()
            .find(|tool| !self.succeeds(&python::version_args(tool)))
            .map(|tool| format!("{tool} not found in project. Run: uv add --dev {tool}"))
    }

    /// Run a fix pass whose output does not matter, only whether it ran.
    fn fix(&self, args: &[String], report: &mut Report) {
        if let Err(e) = self.run_tool(args) {
            report.failures.push(e.to_string());
        }
    }

    /// Run a check pass and return its remaining diagnostics.
    fn check(&self, args: &[String], report: &mut Report) -> Vec<String> {
        match self.run_tool(args) {
            Ok(out) => python::tool_errors(&out),
            Err(e) => {
                report.failures.push(e.to_string());
                Vec::new()
            }
        }
    }

    fn format(&self, file: &str, report: &mut Report) {
        let target = self.settings.target_python.as_str();
        let moderate_rules = defaults().format.moderate_rules.as_str();

        match self.settings.level {
            StrictnessLevel::Minimal => {
                self.fix(&python::black_args(file), report);
            }
            StrictnessLevel::Moderate => {
                let fix = RuffPass {
                    fix: true,
                    select: Some(moderate_rules),
                    version_flags: false,
                };
                self.fix(&python::ruff_args(file, target, fix), report);
                self.fix(&python::black_args(file), report);

                let recheck = RuffPass {
                    fix: false,
                    select: Some(moderate_rules),
                    version_flags: true,
                };
                let remaining = self.check(&python::ruff_args(file, target, recheck), report);
                report.warnings.extend(remaining);
            }
            StrictnessLevel::Strict => {
                let fix = RuffPass {
                    fix: true,
                    select: None,
                    version_flags: true,
                };
                self.fix(&python::ruff_args(file, target, fix), report);
                self.fix(&python::black_args(file), report);

                let recheck = RuffPass { fix: false, ..fix };
                let remaining = self.check(&python::ruff_args(file, target, recheck), report);
                report.lint_errors.extend(remaining);
            }
        }
    }

    fn type_check(&self, file: &str, report: &mut Report) {
        if !self.succeeds(&python::version_args("mypy")) {
            report
                .type_errors
                .push("mypy not found in project. Run: uv add --dev mypy".into());
            return;
        }
        let args = python::mypy_args(file, &self.settings.target_python);
        let errors = self.check(&args, report);
        report.type_errors.extend(errors);
    }

    /// Format, lint and type check one written file.
    pub fn run(&self, path: &Path) -> FormatOutcome {
        let file = path.to_string_lossy();
        let done = |advisory: Option<Decision>, warnings: Vec<String>| FormatOutcome::Done {
            file: path.to_path_buf(),
            advisory,
            warnings,
        };

        if let Some(hint) = self.missing_dependency() {
            let advisory = Decision::AdvisoryBlock {
                reason: format!("Missing dependency: {hint}"),
            };
            return done(Some(advisory), Vec::new());
        }

        if self.settings.level == StrictnessLevel::Strict {
            match std::fs::read_to_string(path) {
                Ok(content) if python::missing_future_annotations(&content) => {
                    let advisory = Decision::AdvisoryBlock {
                        reason: "Missing 'from __future__ import annotations' at top of file"
                            .into(),
                    };
                    return done(Some(advisory), Vec::new());
                }
                Ok(_) => {}
                Err(e) => log::warn!("cannot read {file}: {e}"),
            }
        }

        let mut report = Report::default();
        let mut stage = Stage::Formatting;
        while stage != Stage::Done {
            log::debug!("{file}: {stage:?}");
            stage = match stage {
                Stage::Formatting => {
                    self.format(&file, &mut report);
                    if self.settings.level == StrictnessLevel::Strict {
                        Stage::TypeChecking
                    } else {
                        Stage::Done
                    }
                }
                Stage::TypeChecking => {
                    self.type_check(&file, &mut report);
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }

        let advisory = report.advisory(&file);
        done(advisory, report.warnings)
    }
}

/// PostToolUse: format the written file and report what could not be fixed.
pub fn post_tool_use(
    input: &HookInput,
    settings: &FormatSettings,
    runner: &dyn ToolRunner,
) -> FormatOutcome {
    match target_file(input) {
        Some(path) => FormatHook::new(settings, runner).run(&path),
        None => FormatOutcome::NotApplicable,
    }
}
