use std::sync::LazyLock;

use regex::Regex;

use crate::eval::Verdict;

static PR_MERGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgh\s+pr\s+merge\b").expect("pr merge regex must compile"));

/// Whether `gh pr merge` appears anywhere in the command text, including
/// quotes, substitutions and heredoc bodies.
pub fn contains_pr_merge(command: &str) -> bool {
    PR_MERGE.is_match(command)
}

pub fn evaluate_pr_merge(found: bool) -> Verdict {
    if !found {
        return Verdict::valid();
    }
    Verdict::invalid(
        "PR merge blocked",
        "PR merges require human approval. Review and merge manually.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_merge() {
        assert!(contains_pr_merge("gh pr merge 123"));
        assert!(contains_pr_merge("gh pr merge --squash --delete-branch"));
        assert!(contains_pr_merge("gh  pr   merge"));
        assert!(contains_pr_merge("git push && gh pr merge 42 --auto"));
        assert!(contains_pr_merge("bash -c 'gh pr merge 1'"));
    }

    #[test]
    fn other_pr_commands_pass() {
        assert!(!contains_pr_merge("gh pr create --title x"));
        assert!(!contains_pr_merge("gh pr view 123"));
        assert!(!contains_pr_merge("gh pr list"));
        assert!(!contains_pr_merge("gh pr mergeable"));
        assert!(!contains_pr_merge("git merge main"));
    }

    #[test]
    fn merge_inside_heredoc_detected() {
        assert!(contains_pr_merge("bash <<'EOF'\ngh pr merge 12 --squash\nEOF"));
        assert!(contains_pr_merge("cat > notes.md <<'EOF'\nrun gh pr merge once approved\nEOF"));
    }

    #[test]
    fn merge_always_invalid() {
        let verdict = evaluate_pr_merge(true);
        assert!(!verdict.valid);
        assert_eq!(verdict.violation_reason.as_deref(), Some("PR merge blocked"));
        assert!(verdict.remediation.unwrap().contains("human approval"));
        assert!(evaluate_pr_merge(false).valid);
    }
}
