pub mod context;
pub mod decision;

pub use context::{CommandContext, GitInvocation};
pub use decision::{Decision, Verdict, render};

use std::collections::HashMap;
use std::path::Path;

use crate::commands::branch::{BranchSpec, evaluate_branch};
use crate::commands::commit::{CommitSpec, evaluate_commit, heredoc_messages};
use crate::commands::pr_merge::{contains_pr_merge, evaluate_pr_merge};
use crate::commands::push::{PushSpec, evaluate_push};
use crate::commands::{CommandIntent, IntentSpec};
use crate::config::{PolicyConfig, StrictnessLevel};
use crate::git::BranchLookup;
use crate::parse;

static BRANCH: BranchSpec = BranchSpec;
static COMMIT: CommitSpec = CommitSpec;
static PUSH: PushSpec = PushSpec;

/// Intent specs keyed by the git subcommand they handle.
pub struct IntentRegistry {
    specs: HashMap<&'static str, &'static dyn IntentSpec>,
}

impl Default for IntentRegistry {
    fn default() -> Self {
        let mut specs: HashMap<&'static str, &'static dyn IntentSpec> = HashMap::new();
        for spec in [&BRANCH as &'static dyn IntentSpec, &COMMIT, &PUSH] {
            for &sub in spec.subcommands() {
                specs.insert(sub, spec);
            }
        }
        Self { specs }
    }
}

impl IntentRegistry {
    fn get(&self, subcommand: &str) -> Option<&'static dyn IntentSpec> {
        self.specs.get(subcommand).copied()
    }

    /// Every intent in a command line, in source order.
    ///
    /// Heredoc commit messages come first, then one intent per recognized
    /// git invocation, then `gh pr merge`.
    pub fn extract_intents(&self, command: &str) -> Vec<CommandIntent> {
        log::debug!("{}", parse::parse(command).describe());

        let mut intents: Vec<CommandIntent> = heredoc_messages(command)
            .into_iter()
            .map(|text| CommandIntent::CommitMessage { text })
            .collect();

        for segment in parse::segments(command) {
            let intent = CommandContext::from_segment(&segment)
                .git_invocation()
                .and_then(|invocation| {
                    self.get(&invocation.subcommand)
                        .and_then(|spec| spec.extract(&invocation))
                });
            intents.extend(intent);
        }

        if contains_pr_merge(command) {
            intents.push(CommandIntent::PrMerge);
        }
        intents
    }
}

/// Validates shell commands against the git workflow policy.
pub struct GitValidator<'a> {
    config: &'a PolicyConfig,
    registry: IntentRegistry,
    lookup: &'a dyn BranchLookup,
}

impl<'a> GitValidator<'a> {
    pub fn new(config: &'a PolicyConfig, lookup: &'a dyn BranchLookup) -> Self {
        Self {
            config,
            registry: IntentRegistry::default(),
            lookup,
        }
    }

    fn verdict(&self, intent: &CommandIntent, cwd: &Path) -> Verdict {
        match intent {
            CommandIntent::BranchCreate { name } => evaluate_branch(name, self.config),
            CommandIntent::CommitMessage { text } => evaluate_commit(text, self.config),
            CommandIntent::PushTarget(target) => {
                evaluate_push(target, || self.lookup.current_branch(cwd), self.config)
            }
            CommandIntent::PrMerge => evaluate_pr_merge(true),
        }
    }

    /// One verdict per intent found in the command. No short-circuit.
    pub fn verdicts(&self, command: &str, cwd: &Path) -> Vec<Verdict> {
        self.registry
            .extract_intents(command)
            .iter()
            .map(|intent| {
                let verdict = self.verdict(intent, cwd);
                log::debug!("{intent:?} -> valid={}", verdict.valid);
                verdict
            })
            .collect()
    }

    /// Decision for one proposed shell command.
    pub fn evaluate(&self, command: &str, cwd: &Path) -> Decision {
        if self.config.strictness == StrictnessLevel::Minimal || command.trim().is_empty() {
            return Decision::Approve;
        }
        render(&self.verdicts(command, cwd), self.config.strictness)
    }
}
