use regex::Regex;

use crate::commands::{CommandIntent, IntentSpec, first_invocation_match};
use crate::config::{PolicyConfig, defaults};
use crate::eval::{GitInvocation, Verdict};
use crate::parse::SUBST_PLACEHOLDER;

pub struct BranchSpec;

impl BranchSpec {
    /// Name given to `checkout -b|-B` or `switch -c|-C|--create`.
    fn created_branch(invocation: &GitInvocation) -> Option<String> {
        let create_flags: &[&str] = match invocation.subcommand.as_str() {
            "checkout" => &["-b", "-B"],
            "switch" => &["-c", "-C", "--create", "--force-create"],
            _ => return None,
        };

        let mut args = invocation.args.iter();
        while let Some(arg) = args.next() {
            let name = if create_flags.contains(&arg.as_str()) {
                args.next().map(String::as_str)
            } else if invocation.subcommand == "switch" {
                arg.strip_prefix("--create=")
                    .or_else(|| arg.strip_prefix("--force-create="))
            } else {
                None
            };
            if let Some(name) = name {
                return Some(name)
                    .filter(|n| !n.is_empty() && !n.starts_with('-'))
                    .filter(|n| !n.contains(SUBST_PLACEHOLDER))
                    .map(String::from);
            }
        }
        None
    }
}

impl IntentSpec for BranchSpec {
    fn subcommands(&self) -> &'static [&'static str] {
        &["checkout", "switch"]
    }

    fn extract(&self, invocation: &GitInvocation) -> Option<CommandIntent> {
        Self::created_branch(invocation).map(|name| CommandIntent::BranchCreate { name })
    }
}

/// Branch name created by `git checkout -b` or `git switch -c` anywhere in
/// the command.
pub fn extract_branch_create(command: &str) -> Option<String> {
    first_invocation_match(command, BranchSpec::created_branch)
}

/// `^(type1|type2|...)/[a-z0-9-]+$`, or `None` with an empty vocabulary.
fn branch_pattern(types: &[String]) -> Option<Regex> {
    if types.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = types.iter().map(|t| regex::escape(t)).collect();
    Regex::new(&format!("^({})/[a-z0-9-]+$", alternatives.join("|"))).ok()
}

pub fn evaluate_branch(name: &str, config: &PolicyConfig) -> Verdict {
    if defaults().policy.integration_branches.iter().any(|b| b == name) {
        return Verdict::valid();
    }

    if branch_pattern(&config.branch_types).is_some_and(|re| re.is_match(name)) {
        return Verdict::valid();
    }

    let remediation = if config.branch_types.is_empty() {
        "No branch types are configured; only main, master and develop are accepted".to_string()
    } else {
        format!(
            "Use format: type/description where type is one of: {}",
            config.branch_types.join(", ")
        )
    };
    Verdict::invalid(format!("Invalid branch: {name}"), remediation)
}
