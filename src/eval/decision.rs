use crate::config::StrictnessLevel;

/// Outcome of checking one intent against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    /// Short, user-facing description of what was wrong.
    pub violation_reason: Option<String>,
    /// Guidance aimed at the agent for fixing it.
    pub remediation: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            violation_reason: None,
            remediation: None,
        }
    }

    pub fn invalid(reason: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self {
            valid: false,
            violation_reason: Some(reason.into()),
            remediation: Some(remediation.into()),
        }
    }

    /// One-line form used for warnings: `reason. remediation`.
    pub fn summary(&self) -> String {
        match (&self.violation_reason, &self.remediation) {
            (Some(reason), Some(fix)) => format!("{reason}. {fix}"),
            (Some(reason), None) => reason.clone(),
            (None, Some(fix)) => fix.clone(),
            (None, None) => String::new(),
        }
    }
}

/// The externally visible outcome of a hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    /// Allowed, but the agent is told what was wrong.
    WarnApprove { message: String },
    /// Stops the command before it runs.
    Block { reason: String, guidance: String },
    /// Post-execution report. The write already happened, so this only asks
    /// the agent to follow up; it prevents nothing.
    AdvisoryBlock { reason: String },
}

impl Decision {
    /// Wire value of the `decision` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve | Decision::WarnApprove { .. } => "approve",
            Decision::Block { .. } | Decision::AdvisoryBlock { .. } => "block",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::WarnApprove { .. } => "WARN",
            Decision::Block { .. } => "BLOCK",
            Decision::AdvisoryBlock { .. } => "ADVISORY",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block { .. })
    }

    /// Human-readable explanation, empty for a plain approve.
    pub fn reason(&self) -> &str {
        match self {
            Decision::Approve => "",
            Decision::WarnApprove { message } => message,
            Decision::Block { reason, .. } | Decision::AdvisoryBlock { reason } => reason,
        }
    }
}

/// Combine every verdict found in one command into a decision.
///
/// Strict blocks on the first invalid verdict, moderate approves with all
/// warnings attached, minimal always approves.
pub fn render(verdicts: &[Verdict], level: StrictnessLevel) -> Decision {
    let mut invalid = verdicts.iter().filter(|v| !v.valid).peekable();
    if invalid.peek().is_none() {
        return Decision::Approve;
    }

    match level {
        StrictnessLevel::Strict => match invalid.next() {
            Some(first) => Decision::Block {
                reason: first.violation_reason.clone().unwrap_or_default(),
                guidance: first.remediation.clone().unwrap_or_default(),
            },
            None => Decision::Approve,
        },
        StrictnessLevel::Moderate => Decision::WarnApprove {
            message: invalid.map(Verdict::summary).collect::<Vec<_>>().join("\n"),
        },
        StrictnessLevel::Minimal => Decision::Approve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_branch() -> Verdict {
        Verdict::invalid("Invalid branch: wip", "Use format: type/description")
    }

    #[test]
    fn no_verdicts_approve() {
        for level in [
            StrictnessLevel::Strict,
            StrictnessLevel::Moderate,
            StrictnessLevel::Minimal,
        ] {
            assert_eq!(render(&[], level), Decision::Approve);
        }
    }

    #[test]
    fn valid_verdicts_approve() {
        let verdicts = [Verdict::valid(), Verdict::valid()];
        assert_eq!(render(&verdicts, StrictnessLevel::Strict), Decision::Approve);
    }

    #[test]
    fn strict_blocks() {
        let decision = render(&[bad_branch()], StrictnessLevel::Strict);
        assert_eq!(
            decision,
            Decision::Block {
                reason: "Invalid branch: wip".into(),
                guidance: "Use format: type/description".into(),
            }
        );
    }

    #[test]
    fn strict_uses_first_invalid() {
        let verdicts = [
            Verdict::valid(),
            Verdict::invalid("first", "fix first"),
            Verdict::invalid("second", "fix second"),
        ];
        let decision = render(&verdicts, StrictnessLevel::Strict);
        assert_eq!(decision.reason(), "first");
    }

    #[test]
    fn moderate_warns_with_every_violation() {
        let verdicts = [
            Verdict::invalid("first", "fix first"),
            Verdict::valid(),
            Verdict::invalid("second", "fix second"),
        ];
        let decision = render(&verdicts, StrictnessLevel::Moderate);
        assert_eq!(
            decision,
            Decision::WarnApprove {
                message: "first. fix first\nsecond. fix second".into()
            }
        );
    }

    #[test]
    fn minimal_approves() {
        assert_eq!(render(&[bad_branch()], StrictnessLevel::Minimal), Decision::Approve);
    }

    #[test]
    fn render_is_idempotent() {
        for level in [
            StrictnessLevel::Strict,
            StrictnessLevel::Moderate,
            StrictnessLevel::Minimal,
        ] {
            assert_eq!(render(&[bad_branch()], level), render(&[bad_branch()], level));
        }
    }

    #[test]
    fn wire_values() {
        assert_eq!(Decision::Approve.as_str(), "approve");
        assert_eq!(Decision::WarnApprove { message: "m".into() }.as_str(), "approve");
        assert_eq!(
            Decision::AdvisoryBlock { reason: "r".into() }.as_str(),
            "block"
        );
        assert!(!Decision::AdvisoryBlock { reason: "r".into() }.is_block());
    }
}
