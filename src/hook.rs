//! Hook wire format: the JSON request on stdin and the response on stdout.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{PolicyConfig, defaults};
use crate::eval::{Decision, GitValidator};
use crate::git::BranchLookup;

#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    pub tool_name: Option<String>,
    pub tool_input: Option<ToolInput>,
    pub cwd: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolInput {
    pub command: Option<String>,
    pub file_path: Option<String>,
}

impl HookInput {
    /// Parse a request. Anything unparseable becomes an empty request,
    /// which every hook treats as "nothing to do".
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(input) => input,
            Err(e) => {
                log::warn!("malformed hook input: {e}");
                Self::default()
            }
        }
    }

    fn tool_is(&self, tools: &[String]) -> bool {
        self.tool_name
            .as_deref()
            .is_some_and(|name| tools.iter().any(|t| t == name))
    }

    /// The proposed shell command, for shell tools only.
    pub fn shell_command(&self) -> Option<&str> {
        if !self.tool_is(&defaults().hooks.shell_tools) {
            return None;
        }
        self.tool_input.as_ref()?.command.as_deref()
    }

    /// The written file, for edit tools only.
    pub fn edited_file(&self) -> Option<&str> {
        if !self.tool_is(&defaults().hooks.edit_tools) {
            return None;
        }
        self.tool_input
            .as_ref()?
            .file_path
            .as_deref()
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResponse {
    pub decision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(
        rename = "systemMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub system_message: Option<String>,
}

impl From<&Decision> for HookResponse {
    fn from(decision: &Decision) -> Self {
        let (reason, system_message) = match decision {
            Decision::Approve | Decision::WarnApprove { .. } => (None, None),
            Decision::Block { reason, guidance } => (Some(reason.clone()), Some(guidance.clone())),
            Decision::AdvisoryBlock { reason } => (Some(reason.clone()), None),
        };
        Self {
            decision: decision.as_str().to_string(),
            reason,
            system_message,
        }
    }
}

impl HookResponse {
    /// Map a response back onto a decision. Warnings are not carried on the
    /// wire, so an approve always decodes to `Approve`.
    pub fn into_decision(self) -> Decision {
        match (self.decision.as_str(), self.reason, self.system_message) {
            ("block", reason, Some(guidance)) => Decision::Block {
                reason: reason.unwrap_or_default(),
                guidance,
            },
            ("block", reason, None) => Decision::AdvisoryBlock {
                reason: reason.unwrap_or_default(),
            },
            _ => Decision::Approve,
        }
    }
}

pub fn encode(decision: &Decision) -> serde_json::Result<String> {
    serde_json::to_string(&HookResponse::from(decision))
}

pub fn decode(raw: &str) -> serde_json::Result<Decision> {
    serde_json::from_str::<HookResponse>(raw).map(HookResponse::into_decision)
}

/// PreToolUse: decide whether a proposed shell command may run.
pub fn pre_tool_use(input: &HookInput, config: &PolicyConfig, lookup: &dyn BranchLookup) -> Decision {
    let Some(command) = input.shell_command() else {
        return Decision::Approve;
    };
    let cwd = Path::new(input.cwd.as_deref().unwrap_or("."));
    GitValidator::new(config, lookup).evaluate(command, cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::FixedBranch;

    fn bash(command: &str) -> HookInput {
        HookInput::parse(
            &serde_json::json!({
                "tool_name": "Bash",
                "tool_input": {"command": command},
                "cwd": "/tmp"
            })
            .to_string(),
        )
    }

    #[test]
    fn parse_full_request() {
        let input = bash("git status");
        assert_eq!(input.shell_command(), Some("git status"));
        assert_eq!(input.cwd.as_deref(), Some("/tmp"));
        assert_eq!(input.edited_file(), None);
    }

    #[test]
    fn malformed_request_is_empty() {
        let input = HookInput::parse("{not json");
        assert!(input.tool_name.is_none());
        assert_eq!(input.shell_command(), None);
    }

    #[test]
    fn edit_request() {
        let input = HookInput::parse(
            r#"{"tool_name":"Write","tool_input":{"file_path":"/x/a.py","content":"x"}}"#,
        );
        assert_eq!(input.edited_file(), Some("/x/a.py"));
        assert_eq!(input.shell_command(), None);
    }

    #[test]
    fn non_shell_tools_approve() {
        let input = HookInput::parse(
            r#"{"tool_name":"Read","tool_input":{"command":"git push origin main"}}"#,
        );
        let decision = pre_tool_use(&input, &PolicyConfig::default(), &FixedBranch(None));
        assert_eq!(decision, Decision::Approve);
    }

    #[test]
    fn push_to_main_blocked() {
        let decision = pre_tool_use(
            &bash("git push origin main"),
            &PolicyConfig::default(),
            &FixedBranch(None),
        );
        assert!(decision.is_block());
    }

    #[test]
    fn approve_encoding() {
        assert_eq!(encode(&Decision::Approve).unwrap(), r#"{"decision":"approve"}"#);
        let warn = Decision::WarnApprove {
            message: "Invalid branch: wip".into(),
        };
        assert_eq!(encode(&warn).unwrap(), r#"{"decision":"approve"}"#);
    }

    #[test]
    fn block_encoding() {
        let block = Decision::Block {
            reason: "Push blocked".into(),
            guidance: "open a pull request".into(),
        };
        assert_eq!(
            encode(&block).unwrap(),
            r#"{"decision":"block","reason":"Push blocked","systemMessage":"open a pull request"}"#
        );
    }

    #[test]
    fn advisory_encoding() {
        let advisory = Decision::AdvisoryBlock {
            reason: "Lint errors in a.py:\nE501".into(),
        };
        let json: serde_json::Value = serde_json::from_str(&encode(&advisory).unwrap()).unwrap();
        assert_eq!(json["decision"], "block");
        assert!(json.get("systemMessage").is_none());
    }

    #[test]
    fn block_round_trip_keeps_both_strings() {
        let block = Decision::Block {
            reason: "Invalid commit message: bad msg".into(),
            guidance: "Use format: type(scope): description".into(),
        };
        assert_eq!(decode(&encode(&block).unwrap()).unwrap(), block);
    }
}
