use crate::parse::{ShellSegment, program_name, tokenize};

/// Global git options that consume the following word (`git -C dir push`).
const GIT_VALUE_OPTIONS: &[&str] = &[
    "-C",
    "-c",
    "--git-dir",
    "--work-tree",
    "--namespace",
    "--super-prefix",
    "--config-env",
];

/// Programs that run the command that follows them.
const WRAPPERS: &[&str] = &[
    "env", "sudo", "doas", "time", "nice", "nohup", "command", "exec", "timeout", "stdbuf",
    "xargs",
];

/// Shell words after which the next word is still a command.
const KEYWORDS: &[&str] = &["!", "if", "then", "elif", "else", "do", "while", "until"];

/// Context for evaluating a single command segment.
#[derive(Debug)]
pub struct CommandContext {
    /// All words in the command (tokenized via shlex).
    pub words: Vec<String>,
}

/// One `git <subcommand> ...` call found inside a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInvocation {
    /// The subcommand word, e.g. `push`.
    pub subcommand: String,
    /// Words after the subcommand.
    pub args: Vec<String>,
}

/// `NAME=value` prefix assignment.
fn is_assignment(word: &str) -> bool {
    word.split_once('=').is_some_and(|(name, _)| {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

impl CommandContext {
    pub fn from_segment(segment: &ShellSegment) -> Self {
        Self::from_command(&segment.command)
    }

    pub fn from_command(command: &str) -> Self {
        Self {
            words: tokenize(command),
        }
    }

    /// The git invocation this segment runs, if any.
    ///
    /// `git` counts only in command position: first word, after `VAR=value`
    /// assignments or keywords like `do` and `!`, or after a wrapper such as
    /// `env`, `sudo` or `timeout 30` together with the wrapper's own options.
    /// Arguments that happen to be named `git` never start an invocation.
    pub fn git_invocation(&self) -> Option<GitInvocation> {
        let mut wrapped = false;
        for (i, word) in self.words.iter().enumerate() {
            let program = program_name(word);
            if program == "git" {
                return Self::invocation(&self.words[i + 1..]);
            }
            if WRAPPERS.contains(&program) {
                wrapped = true;
                continue;
            }
            if !wrapped && !is_assignment(word) && !KEYWORDS.contains(&word.as_str()) {
                return None;
            }
        }
        None
    }

    /// Skip git's global options and split off the subcommand.
    fn invocation(words: &[String]) -> Option<GitInvocation> {
        let mut i = 0;
        while i < words.len() {
            let word = words[i].as_str();
            if GIT_VALUE_OPTIONS.contains(&word) {
                i += 2;
                continue;
            }
            if word.starts_with('-') {
                i += 1;
                continue;
            }
            return Some(GitInvocation {
                subcommand: word.to_string(),
                args: words[i + 1..].to_vec(),
            });
        }
        None
    }
}
