use std::sync::LazyLock;

use regex::Regex;

use crate::commands::{CommandIntent, IntentSpec, first_invocation_match};
use crate::config::PolicyConfig;
use crate::eval::{GitInvocation, Verdict};
use crate::parse::SUBST_PLACEHOLDER;

/// `git commit ... -m "$(cat <<'EOF'` up to the delimiter word.
static HEREDOC_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bgit\b[^\n]*?\bcommit\b[^\n]*?\s(?:-[a-zA-Z]*m|--message)(?:=|\s+)"?\$\(\s*cat\s+<<-?\s*['"]?([A-Za-z_][A-Za-z0-9_]*)['"]?"#,
    )
    .expect("heredoc commit regex must compile")
});

pub struct CommitSpec;

impl CommitSpec {
    /// Value of `-m`, `-am`, `-m<msg>`, `--message <msg>` or `--message=<msg>`.
    fn message(invocation: &GitInvocation) -> Option<String> {
        if invocation.subcommand != "commit" {
            return None;
        }

        let mut args = invocation.args.iter();
        while let Some(arg) = args.next() {
            let value = if arg == "--message" || is_short_cluster_ending_in_m(arg) {
                args.next().map(String::as_str)
            } else if let Some(value) = arg.strip_prefix("--message=") {
                Some(value)
            } else if let Some(value) = arg.strip_prefix("-m") {
                Some(value)
            } else {
                continue;
            };
            return value
                .map(str::trim)
                .filter(|m| !m.is_empty() && !m.contains(SUBST_PLACEHOLDER))
                .map(String::from);
        }
        None
    }
}

/// Short `git commit` flags that take no value and may precede `m` in a cluster.
const NO_VALUE_SHORT_FLAGS: &str = "aveinopqsz";

/// `-m`, `-am`, `-vam`: no-value short flags followed by `m`.
///
/// Anything else after `-m` is an attached message (`-mteam` is "team").
fn is_short_cluster_ending_in_m(arg: &str) -> bool {
    arg.strip_prefix('-')
        .and_then(|flags| flags.strip_suffix('m'))
        .is_some_and(|leading| leading.chars().all(|c| NO_VALUE_SHORT_FLAGS.contains(c)))
}

impl IntentSpec for CommitSpec {
    fn subcommands(&self) -> &'static [&'static str] {
        &["commit"]
    }

    fn extract(&self, invocation: &GitInvocation) -> Option<CommandIntent> {
        Self::message(invocation).map(|text| CommandIntent::CommitMessage { text })
    }
}

/// First non-blank body line of a heredoc, if its terminator is present.
fn heredoc_subject(rest: &str, delimiter: &str) -> Option<String> {
    let body = &rest[rest.find('\n')? + 1..];
    let mut subject = None;
    for line in body.lines() {
        let line = line.trim();
        if line == delimiter {
            return subject;
        }
        if subject.is_none() && !line.is_empty() {
            subject = Some(line.to_string());
        }
    }
    None
}

/// Subjects of every `git commit -m "$(cat <<EOF ... EOF)"` in the command.
pub fn heredoc_messages(command: &str) -> Vec<String> {
    HEREDOC_MESSAGE
        .captures_iter(command)
        .filter_map(|caps| {
            let start = caps.get(0)?.end();
            heredoc_subject(&command[start..], &caps[1])
        })
        .collect()
}

/// Commit message given on the command line, heredoc form first.
pub fn extract_commit_message(command: &str) -> Option<String> {
    heredoc_messages(command)
        .into_iter()
        .next()
        .or_else(|| first_invocation_match(command, CommitSpec::message))
}

fn commit_pattern(types: &[String]) -> Option<Regex> {
    if types.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = types.iter().map(|t| regex::escape(t)).collect();
    Regex::new(&format!(r"^({})(\(.+\))?: .+", alternatives.join("|"))).ok()
}

pub fn evaluate_commit(message: &str, config: &PolicyConfig) -> Verdict {
    if commit_pattern(&config.commit_types).is_some_and(|re| re.is_match(message)) {
        return Verdict::valid();
    }

    let subject = message.lines().next().unwrap_or_default();
    Verdict::invalid(
        format!("Invalid commit message: {subject}"),
        format!(
            "Use format: type(scope): description where type is one of: {}",
            config.commit_types.join(", ")
        ),
    )
}
