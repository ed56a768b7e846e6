use std::sync::LazyLock;

use regex::Regex;

use crate::commands::{CommandIntent, IntentSpec, first_invocation_match};
use crate::config::PolicyConfig;
use crate::eval::{GitInvocation, Verdict};
use crate::parse::SUBST_PLACEHOLDER;

/// `git push` options whose value is the next word.
const PUSH_VALUE_FLAGS: &[&str] = &["-o", "--push-option", "--repo", "--receive-pack", "--exec"];

/// `>`, `2>&1`, `&>`, `>>log`, `<in`. Capture 1 is any attached target.
static REDIRECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+|&)?(?:>>?|<)(.*)$").expect("redirection regex must compile")
});

/// A word with a redirection glued on (`main>/dev/null`, `main&>log`).
/// Capture 1 is the word, capture 2 any attached target.
static ATTACHED_REDIRECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^<>]+?)&?(?:>>?|<)(.*)$").expect("attached redirection regex must compile")
});

/// Where a `git push` sends its commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushTarget {
    pub remote: Option<String>,
    /// First refspec after the remote.
    pub refspec: Option<String>,
    /// Any further refspecs (`git push origin a b`).
    pub extra_refspecs: Vec<String>,
}

impl PushTarget {
    pub fn refspecs(&self) -> impl Iterator<Item = &str> {
        self.refspec
            .iter()
            .chain(self.extra_refspecs.iter())
            .map(String::as_str)
    }
}

pub struct PushSpec;

impl PushSpec {
    fn target(invocation: &GitInvocation) -> Option<PushTarget> {
        if invocation.subcommand != "push" {
            return None;
        }

        let mut positionals: Vec<&str> = Vec::new();
        let mut options_done = false;
        let mut args = invocation.args.iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_str();
            if arg == "&" {
                continue;
            }
            if let Some(caps) = REDIRECTION.captures(arg) {
                if caps[1].is_empty() {
                    args.next();
                }
                continue;
            }
            let arg = match ATTACHED_REDIRECTION.captures(arg) {
                Some(caps) => {
                    if caps[2].is_empty() {
                        args.next();
                    }
                    caps.get(1).map_or(arg, |word| word.as_str())
                }
                None => arg,
            };
            if !options_done {
                if arg == "--" {
                    options_done = true;
                    continue;
                }
                if PUSH_VALUE_FLAGS.contains(&arg) {
                    args.next();
                    continue;
                }
                if arg.starts_with('-') {
                    continue;
                }
            }
            positionals.push(arg);
        }

        if positionals.iter().any(|p| p.contains(SUBST_PLACEHOLDER)) {
            return None;
        }

        let mut positionals = positionals.into_iter().map(String::from);
        Some(PushTarget {
            remote: positionals.next(),
            refspec: positionals.next(),
            extra_refspecs: positionals.collect(),
        })
    }
}

impl IntentSpec for PushSpec {
    fn subcommands(&self) -> &'static [&'static str] {
        &["push"]
    }

    fn extract(&self, invocation: &GitInvocation) -> Option<CommandIntent> {
        Self::target(invocation).map(CommandIntent::PushTarget)
    }
}

/// Remote and refspecs of the first `git push` in the command.
pub fn extract_push_target(command: &str) -> Option<PushTarget> {
    first_invocation_match(command, PushSpec::target)
}

/// Branch a refspec writes to: `+src:refs/heads/dst` becomes `dst`.
fn destination_branch(refspec: &str) -> &str {
    let refspec = refspec.strip_prefix('+').unwrap_or(refspec);
    let dst = refspec.rsplit_once(':').map_or(refspec, |(_, dst)| dst);
    dst.strip_prefix("refs/heads/").unwrap_or(dst)
}

/// Check a push against the protected branches.
///
/// `current_branch` is only called when the push names no refspec, or a
/// refspec whose destination is `HEAD`. If it yields nothing the push is
/// allowed.
pub fn evaluate_push(
    target: &PushTarget,
    current_branch: impl FnOnce() -> Option<String>,
    config: &PolicyConfig,
) -> Verdict {
    let mut destinations: Vec<String> = target
        .refspecs()
        .map(destination_branch)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .collect();

    let needs_head = destinations.is_empty() || destinations.iter().any(|d| d == "HEAD");
    if needs_head {
        match current_branch().filter(|b| !b.is_empty() && b != "HEAD") {
            Some(branch) => {
                destinations.retain(|d| d != "HEAD");
                destinations.push(branch);
            }
            None => {
                log::debug!("current branch unknown, allowing push");
                destinations.retain(|d| d != "HEAD");
            }
        }
    }

    match destinations.iter().find(|d| config.is_protected(d)) {
        Some(branch) => Verdict::invalid(
            format!("Push blocked: '{branch}' is a protected branch"),
            "Direct push to protected branch; open a pull request instead.",
        ),
        None => Verdict::valid(),
    }
}
