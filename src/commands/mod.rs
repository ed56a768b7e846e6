//! Intent matchers and evaluators.
//!
//! Each git concern (branch creation, commit message, push target) has an
//! `IntentSpec` that pulls its intent out of a parsed git invocation, plus a
//! pure evaluator that checks the intent against the policy. `gh pr merge`
//! is detected on the raw command text instead.

/// `git checkout -b` / `git switch -c` branch naming.
pub mod branch;
/// Conventional-commit message checks, including heredoc messages.
pub mod commit;
/// Human-gated `gh pr merge`.
pub mod pr_merge;
/// Protected-branch push guard.
pub mod push;

use crate::eval::{CommandContext, GitInvocation};
use crate::parse;

pub use push::PushTarget;

/// Something a command intends to do that the policy cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    BranchCreate { name: String },
    CommitMessage { text: String },
    PushTarget(PushTarget),
    PrMerge,
}

/// Trait for git subcommand intent extraction.
pub trait IntentSpec: Send + Sync {
    /// The git subcommands this spec understands (e.g. `checkout`, `switch`).
    fn subcommands(&self) -> &'static [&'static str];

    /// Extract the intent from one invocation, or `None` when the shape is
    /// not recognized with confidence.
    fn extract(&self, invocation: &GitInvocation) -> Option<CommandIntent>;
}

/// First value `matcher` finds in any git invocation of `command`,
/// searching chained segments and substitutions in order.
pub(crate) fn first_invocation_match<T>(
    command: &str,
    matcher: impl Fn(&GitInvocation) -> Option<T>,
) -> Option<T> {
    parse::segments(command).iter().find_map(|segment| {
        CommandContext::from_segment(segment)
            .git_invocation()
            .and_then(|invocation| matcher(&invocation))
    })
}
