use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use super::tokenize::{program_name, tokenize};
use super::types::{Operator, ParsedPipeline, ShellSegment};

/// Marker left in the outer command where a substitution was cut out.
pub const SUBST_PLACEHOLDER: &str = "__SUBST__";

/// `<<EOF`, `<<-EOF`, `<< 'EOF'`, `<<"EOF"` but not the `<<<` here-string.
static HEREDOC_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^<])<<-?[ \t]*['"]?([A-Za-z_][A-Za-z0-9_]*)['"]?"#)
        .expect("heredoc regex must compile")
});

/// Programs that execute a heredoc body or a `-c` argument as commands.
const INTERPRETERS: &[&str] = &["sh", "bash", "zsh", "dash", "ksh", "ssh"];

/// Whether a line feeds its heredocs to an interpreter (`bash <<EOF`,
/// `ssh host <<EOF`, `cat <<EOF | sh`).
fn runs_heredoc(line: &str) -> bool {
    line.split(|c: char| c.is_whitespace() || "|;&()".contains(c))
        .any(|word| INTERPRETERS.contains(&program_name(word)))
}

/// Split a command at shell operators (&&, ||, ;, |, |&, newline),
/// respecting single/double quotes and backslash escapes.
///
/// Returns segments and the operators between them.
fn split_compound_command(command: &str) -> (Vec<String>, Vec<Operator>) {
    let mut parts = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();

    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len {
        let c = chars[i];

        if esc {
            buf.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            buf.push(c);
            i += 1;
            continue;
        }
        if sq || dq {
            buf.push(c);
            i += 1;
            continue;
        }

        // Two-char operators
        if i + 1 < len {
            let op = match (c, chars[i + 1]) {
                ('&', '&') => Some(Operator::And),
                ('|', '|') => Some(Operator::Or),
                ('|', '&') => Some(Operator::PipeErr),
                _ => None,
            };
            if let Some(op) = op {
                parts.push(buf.trim().to_string());
                operators.push(op);
                buf.clear();
                i += 2;
                continue;
            }
        }

        let op = match c {
            '|' => Some(Operator::Pipe),
            ';' => Some(Operator::Semi),
            '\n' => Some(Operator::Newline),
            _ => None,
        };
        if let Some(op) = op {
            parts.push(buf.trim().to_string());
            operators.push(op);
            buf.clear();
            i += 1;
            continue;
        }

        buf.push(c);
        i += 1;
    }

    let tail = buf.trim().to_string();
    if !tail.is_empty() {
        parts.push(tail);
    }

    parts.retain(|p| !p.is_empty());

    (parts, operators)
}

/// Consume a balanced `(...)` body starting just after the opening paren.
/// Returns the body and the index after the closing paren.
fn balanced_body(chars: &[char], mut i: usize) -> (String, usize) {
    let len = chars.len();
    let mut depth: u32 = 1;
    let mut inner = String::new();
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len && depth > 0 {
        let c = chars[i];
        if esc {
            inner.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            inner.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
        } else if c == '"' && !sq {
            dq = !dq;
        } else if !sq && !dq {
            if c == '(' {
                depth += 1;
            }
            if c == ')' {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
            }
        }
        inner.push(c);
        i += 1;
    }

    (inner, i)
}

/// Extract command substitution contents from `$(...)`, backticks and
/// process substitutions `<(...)` / `>(...)`.
///
/// Returns the outer command with substitutions replaced by
/// [`SUBST_PLACEHOLDER`], plus the extracted inner command strings.
/// `$()` is extracted even inside double quotes (the shell expands it there);
/// only single quotes suppress it.
fn extract_substitutions(command: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut outer = String::new();
    let mut inners = Vec::new();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len {
        let c = chars[i];

        if esc {
            outer.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            outer.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            outer.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            outer.push(c);
            i += 1;
            continue;
        }
        if sq {
            outer.push(c);
            i += 1;
            continue;
        }

        let opens_body = i + 1 < len
            && chars[i + 1] == '('
            && (c == '$' || ((c == '<' || c == '>') && !dq));
        if opens_body {
            let (inner, next) = balanced_body(&chars, i + 2);
            let trimmed = inner.trim();
            if !trimmed.is_empty() {
                inners.push(trimmed.to_string());
            }
            outer.push_str(SUBST_PLACEHOLDER);
            i = next;
            continue;
        }

        // Backtick: extract to matching backtick (no nesting)
        if c == '`' {
            let mut inner = String::new();
            i += 1;
            while i < len && chars[i] != '`' {
                if chars[i] == '\\' && i + 1 < len {
                    inner.push(chars[i]);
                    inner.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                inner.push(chars[i]);
                i += 1;
            }
            if i < len {
                i += 1;
            }
            let trimmed = inner.trim();
            if !trimmed.is_empty() {
                inners.push(trimmed.to_string());
            }
            outer.push_str(SUBST_PLACEHOLDER);
            continue;
        }

        outer.push(c);
        i += 1;
    }

    (outer, inners)
}

/// Drop heredoc bodies so their text is never mistaken for commands.
///
/// Bodies fed to an interpreter are commands, so they are kept as lines of
/// the outer command and only their terminator is dropped. A heredoc whose
/// terminator never appears is left untouched.
pub fn strip_heredoc_bodies(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut pending: VecDeque<(String, bool)> = VecDeque::new();
    let mut skipped = String::new();
    let mut kept = String::new();

    for line in command.split_inclusive('\n') {
        if let Some((delimiter, executed)) = pending.front() {
            skipped.push_str(line);
            if line.trim() == delimiter {
                pending.pop_front();
                if pending.is_empty() {
                    out.push_str(&kept);
                    kept.clear();
                    skipped.clear();
                }
            } else if *executed {
                kept.push_str(line);
            }
            continue;
        }
        out.push_str(line);
        let executed = runs_heredoc(line);
        pending.extend(
            HEREDOC_START
                .captures_iter(line)
                .map(|caps| (caps[1].to_string(), executed)),
        );
    }

    out.push_str(&skipped);
    out
}

/// Remove subshell / group punctuation wrapped around a segment,
/// e.g. `(git push origin main)` or the tail `git push)` of a split group.
fn strip_grouping(part: &str) -> String {
    let mut text = part.trim_start_matches(['(', '{']).trim_start().to_string();
    if text.ends_with('}') && part.trim_start().starts_with('{') {
        text.pop();
    }
    let opens = text.matches('(').count();
    let mut closes = text.matches(')').count();
    while closes > opens && text.ends_with(')') {
        text.pop();
        closes -= 1;
    }
    text.trim().to_string()
}

/// Parse a command string into a `ParsedPipeline`.
///
/// Heredoc bodies are dropped, substitutions are cut out and kept aside,
/// then the outer command is split at compound operators.
pub fn parse(command: &str) -> ParsedPipeline {
    let stripped = strip_heredoc_bodies(command);
    let (outer, substitutions) = extract_substitutions(&stripped);
    let (parts, operators) = split_compound_command(&outer);

    let segments = parts
        .iter()
        .map(|part| strip_grouping(part))
        .filter(|part| !part.is_empty())
        .map(|command| ShellSegment { command })
        .collect();

    ParsedPipeline {
        segments,
        operators,
        substitutions,
    }
}

/// Every segment of a command line, including the segments of nested
/// substitutions, in source order (outer segments first).
pub fn segments(command: &str) -> Vec<ShellSegment> {
    let pipeline = parse(command);
    let mut all = Vec::new();
    for segment in pipeline.segments {
        let script = interpreter_script(&segment.command);
        all.push(segment);
        if let Some(script) = script {
            all.extend(segments(&script));
        }
    }
    for inner in &pipeline.substitutions {
        all.extend(segments(inner));
    }
    all
}

/// The script of `bash -c '...'` and friends.
fn interpreter_script(segment: &str) -> Option<String> {
    let words = tokenize(segment);
    let at = words
        .iter()
        .position(|w| INTERPRETERS.contains(&program_name(w)))?;
    let rest = &words[at + 1..];
    let flag = rest
        .iter()
        .position(|w| w.starts_with('-') && !w.starts_with("--") && w.contains('c'))?;
    rest.get(flag + 1).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_simple() {
        let (parts, ops) = split_compound_command("git status");
        assert_eq!(parts, vec!["git status"]);
        assert!(ops.is_empty());
    }

    #[test]
    fn split_and() {
        let (parts, ops) = split_compound_command("git add . && git commit -m 'x'");
        assert_eq!(parts, vec!["git add .", "git commit -m 'x'"]);
        assert_eq!(ops, vec![Operator::And]);
    }

    #[test]
    fn split_pipe() {
        let (parts, ops) = split_compound_command("git log | head -5");
        assert_eq!(parts, vec!["git log", "head -5"]);
        assert_eq!(ops, vec![Operator::Pipe]);
    }

    #[test]
    fn split_newline() {
        let (parts, ops) = split_compound_command("git add .\ngit push origin main");
        assert_eq!(parts, vec!["git add .", "git push origin main"]);
        assert_eq!(ops, vec![Operator::Newline]);
    }

    #[test]
    fn split_quoted_operator() {
        let (parts, ops) = split_compound_command("git commit -m 'a && b; c'");
        assert_eq!(parts, vec!["git commit -m 'a && b; c'"]);
        assert!(ops.is_empty());
    }

    #[test]
    fn split_escaped_newline_is_continuation() {
        let (parts, _) = split_compound_command("git push \\\n origin main");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn extract_dollar_paren() {
        let (outer, inners) = extract_substitutions("echo $(git push origin main)");
        assert_eq!(outer, "echo __SUBST__");
        assert_eq!(inners, vec!["git push origin main"]);
    }

    #[test]
    fn extract_backtick() {
        let (outer, inners) = extract_substitutions("echo `git branch --show-current`");
        assert_eq!(outer, "echo __SUBST__");
        assert_eq!(inners, vec!["git branch --show-current"]);
    }

    #[test]
    fn extract_single_quoted_suppressed() {
        let (_, inners) = extract_substitutions("echo '$(git push origin main)'");
        assert!(inners.is_empty());
    }

    #[test]
    fn extract_double_quoted_expanded() {
        let (_, inners) = extract_substitutions("echo \"$(git push)\"");
        assert_eq!(inners, vec!["git push"]);
    }

    #[test]
    fn extract_process_substitution() {
        let (outer, inners) = extract_substitutions("diff <(git show a) <(git show b)");
        assert!(!outer.contains('<'));
        assert_eq!(inners, vec!["git show a", "git show b"]);
    }

    #[test]
    fn heredoc_body_dropped() {
        let cmd = "cat <<'EOF' > notes.txt\ngit push origin main\nEOF\ngit status";
        assert_eq!(strip_heredoc_bodies(cmd), "cat <<'EOF' > notes.txt\ngit status");
    }

    #[test]
    fn heredoc_fed_to_a_shell_is_kept() {
        let cmd = "bash <<'EOF'\ngh pr merge 12 --squash\nEOF\ngit status";
        assert_eq!(
            strip_heredoc_bodies(cmd),
            "bash <<'EOF'\ngh pr merge 12 --squash\ngit status"
        );
        let cmd = "cat <<EOF | sh\ngit push origin main\nEOF";
        assert_eq!(strip_heredoc_bodies(cmd), "cat <<EOF | sh\ngit push origin main\n");
    }

    #[test]
    fn here_string_is_not_a_heredoc() {
        let cmd = "grep x <<< word\ngit push origin main";
        assert_eq!(strip_heredoc_bodies(cmd), cmd);
    }

    #[test]
    fn unterminated_heredoc_kept() {
        let cmd = "echo \"<<EOF\"\ngit push origin main";
        assert_eq!(strip_heredoc_bodies(cmd), cmd);
    }

    #[test]
    fn grouping_stripped() {
        assert_eq!(strip_grouping("(git push origin main)"), "git push origin main");
        assert_eq!(strip_grouping("git push origin main)"), "git push origin main");
        assert_eq!(strip_grouping("{ git push origin main"), "git push origin main");
        assert_eq!(
            strip_grouping("git commit -m \"fix(api): x\""),
            "git commit -m \"fix(api): x\""
        );
    }

    #[test]
    fn segments_include_substitutions() {
        let segs = segments("cd repo && echo $(git push origin main)");
        let texts: Vec<&str> = segs.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(texts, vec!["cd repo", "echo __SUBST__", "git push origin main"]);
    }

    #[test]
    fn shell_heredoc_body_becomes_segments() {
        let segs = segments("ssh build-host <<EOF\ncd repo\ngit push origin main\nEOF");
        let texts: Vec<&str> = segs.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(texts, vec!["ssh build-host <<EOF", "cd repo", "git push origin main"]);
    }

    #[test]
    fn shell_dash_c_argument_becomes_segments() {
        let segs = segments("bash -c 'git add . && git push origin main'");
        let texts: Vec<&str> = segs.iter().map(|s| s.command.as_str()).collect();
        assert!(texts.contains(&"git push origin main"), "{texts:?}");
    }

    #[test]
    fn heredoc_commit_body_does_not_leak_segments() {
        let cmd = "git commit -m \"$(cat <<'EOF'\nfeat: x\n\nthen git push origin main\nEOF\n)\"";
        let segs = segments(cmd);
        assert!(segs.iter().all(|s| !s.command.contains("push")));
    }
}
