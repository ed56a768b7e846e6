//! cc-devflow: Claude Code hooks that enforce a git workflow policy and keep
//! Python files formatted.
//!
//! The PreToolUse hook inspects proposed Bash commands, pulls out the
//! branch names, commit messages, push targets and `gh pr merge` calls they
//! contain, checks each against a [`PolicyConfig`](config::PolicyConfig) and
//! renders one [`Decision`](eval::Decision) according to the strictness
//! level. The PostToolUse hook runs ruff, black and mypy on written Python
//! files and reports what it could not fix.
//!
//! # Architecture
//!
//! - **[`parse`]**: quote-aware segmentation, substitution and heredoc handling, shlex tokenizer.
//! - **[`eval`]**: intent registry, verdicts, decision rendering, per-segment context.
//! - **[`commands`]**: per-intent matchers and evaluators (branch, commit, push, PR merge).
//! - **[`config`]**: embedded defaults, settings.json resolution, Python target detection.
//! - **[`hook`]**: request and response JSON.
//! - **[`format`]**: the Python format and type-check orchestrator.
//! - **[`git`]** / **[`runner`]**: current-branch lookup and bounded subprocess execution.
//! - **[`logging`]**: decision logging to `~/.local/share/cc-devflow/hooks.log`.

/// Intent matchers and policy evaluators.
pub mod commands;
/// Embedded defaults, settings resolution and project detection.
pub mod config;
/// Evaluation engine: registry, verdicts, decision rendering.
pub mod eval;
/// Python format and type-check orchestrator.
pub mod format;
/// Current-branch lookup.
pub mod git;
/// Hook request/response wire types.
pub mod hook;
/// File-based logging.
pub mod logging;
/// Shell command parsing: segmentation, substitutions, heredocs, tokenizer.
pub mod parse;
/// External tool execution.
pub mod runner;

use std::path::Path;

use config::PolicyConfig;
use eval::{Decision, GitValidator};
use git::{BranchLookup, FixedBranch};

/// Evaluate a command with the default policy and no current-branch lookup.
///
/// This is the main entry point for tests and simple usage.
/// A bare `git push` is allowed here since the branch is unknown.
pub fn evaluate(command: &str) -> Decision {
    evaluate_with(command, &PolicyConfig::default(), &FixedBranch(None))
}

/// Evaluate a command with an explicit policy and branch lookup.
pub fn evaluate_with(command: &str, config: &PolicyConfig, lookup: &dyn BranchLookup) -> Decision {
    GitValidator::new(config, lookup).evaluate(command, Path::new("."))
}
