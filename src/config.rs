use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

static DEFAULTS: LazyLock<Defaults> =
    LazyLock::new(|| toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse"));

static REQUIRES_PYTHON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:>=?|~=)\s*3\.(\d+)").expect("requires-python regex must compile"));

// ── Embedded defaults ──

#[derive(Debug, Deserialize)]
pub struct Defaults {
    pub policy: PolicyDefaults,
    pub hooks: HookDefaults,
    pub git: GitDefaults,
    pub format: FormatDefaults,
}

#[derive(Debug, Deserialize)]
pub struct PolicyDefaults {
    pub level: StrictnessLevel,
    pub branch_types: Vec<String>,
    pub commit_types: Vec<String>,
    pub protected_branches: Vec<String>,
    pub integration_branches: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HookDefaults {
    /// Key under `plugins` in `.claude/settings.json`.
    pub settings_key: String,
    pub shell_tools: Vec<String>,
    pub edit_tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitDefaults {
    pub lookup_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct FormatDefaults {
    pub runner: String,
    pub extensions: Vec<String>,
    pub timeout_secs: u64,
    pub default_target: String,
    pub moderate_rules: String,
}

/// The parsed embedded defaults.
pub fn defaults() -> &'static Defaults {
    &DEFAULTS
}

// ── Resolved policy ──

/// How hard violations are enforced. Ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessLevel {
    Minimal,
    Moderate,
    #[default]
    Strict,
}

impl StrictnessLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strict" => Some(Self::Strict),
            "moderate" => Some(Self::Moderate),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Minimal => "minimal",
        }
    }
}

/// Policy for one evaluation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    pub strictness: StrictnessLevel,
    pub branch_types: Vec<String>,
    pub commit_types: Vec<String>,
    /// Always `main` and `master`; settings cannot change it.
    pub protected_branches: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = &defaults().policy;
        Self {
            strictness: policy.level,
            branch_types: policy.branch_types.clone(),
            commit_types: policy.commit_types.clone(),
            protected_branches: policy.protected_branches.clone(),
        }
    }
}

impl PolicyConfig {
    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branches.iter().any(|b| b == branch)
    }
}

/// User-settable subset of the policy, as found in settings.json.
#[derive(Debug, Deserialize)]
struct RawSettings {
    level: Option<Value>,
    branch_types: Option<Vec<String>>,
    commit_types: Option<Vec<String>>,
}

/// Trim, drop blanks and duplicates, keep first-seen order.
fn vocabulary(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// Build the policy from the plugin's settings object.
///
/// Absent or mistyped settings give the defaults. Missing keys fall back
/// individually. An unknown `level` resolves to strict.
pub fn resolve_config(raw: Option<&Value>) -> PolicyConfig {
    let mut config = PolicyConfig::default();
    let Some(raw) = raw else {
        return config;
    };

    let settings = match RawSettings::deserialize(raw) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("ignoring malformed settings: {e}");
            return config;
        }
    };

    if let Some(level) = settings.level {
        config.strictness = match level.as_str().and_then(StrictnessLevel::from_name) {
            Some(level) => level,
            None => {
                log::warn!("unknown strictness level {level}, using strict");
                StrictnessLevel::Strict
            }
        };
    }
    if let Some(types) = settings.branch_types {
        config.branch_types = vocabulary(types);
    }
    if let Some(types) = settings.commit_types {
        config.commit_types = vocabulary(types);
    }

    config
}

// ── Settings file boundary ──

/// Project directory: `$CLAUDE_PROJECT_DIR`, else the request's cwd, else `.`.
pub fn project_dir(cwd: Option<&str>) -> PathBuf {
    let dir = std::env::var("CLAUDE_PROJECT_DIR")
        .ok()
        .filter(|d| !d.is_empty())
        .or_else(|| cwd.filter(|c| !c.is_empty()).map(String::from))
        .unwrap_or_else(|| ".".to_string());
    PathBuf::from(shellexpand::tilde(&dir).into_owned())
}

/// Read `<project>/.claude/settings.json` and return this plugin's section.
pub fn load_settings(project_dir: &Path) -> Option<Value> {
    let path = project_dir.join(".claude").join("settings.json");
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("cannot read {}: {e}", path.display());
            }
            return None;
        }
    };
    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("settings parse error in {}: {e}", path.display());
            return None;
        }
    };
    value
        .get("plugins")?
        .get(defaults().hooks.settings_key.as_str())
        .cloned()
}

/// Load and resolve the policy for a project.
pub fn load(project_dir: &Path) -> PolicyConfig {
    resolve_config(load_settings(project_dir).as_ref())
}

/// Target Python version for the format tools, e.g. `py39`.
///
/// `tool.ruff.target-version` wins, then `project.requires-python`,
/// then the built-in default.
pub fn detect_python_version(project_root: &Path) -> String {
    let fallback = defaults().format.default_target.clone();
    let Ok(content) = std::fs::read_to_string(project_root.join("pyproject.toml")) else {
        return fallback;
    };
    let data: toml::Table = match toml::from_str(&content) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("pyproject.toml parse error: {e}");
            return fallback;
        }
    };

    let ruff_target = data
        .get("tool")
        .and_then(|t| t.get("ruff"))
        .and_then(|r| r.get("target-version"))
        .and_then(toml::Value::as_str);
    if let Some(target) = ruff_target {
        return target.to_string();
    }

    let requires = data
        .get("project")
        .and_then(|p| p.get("requires-python"))
        .and_then(toml::Value::as_str)
        .unwrap_or("");
    match REQUIRES_PYTHON.captures(requires) {
        Some(caps) => format!("py3{}", &caps[1]),
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_settings(dir: &Path, body: &str) {
        let claude = dir.join(".claude");
        std::fs::create_dir_all(&claude).unwrap();
        std::fs::write(claude.join("settings.json"), body).unwrap();
    }

    #[test]
    fn default_config_parses() {
        let d = defaults();
        assert!(!d.policy.branch_types.is_empty());
        assert!(!d.policy.commit_types.is_empty());
        assert_eq!(d.policy.protected_branches, vec!["main", "master"]);
        assert_eq!(d.hooks.shell_tools, vec!["Bash"]);
        assert_eq!(d.format.extensions, vec!["py", "pyi"]);
    }

    #[test]
    fn default_policy_values() {
        let config = PolicyConfig::default();
        assert_eq!(config.strictness, StrictnessLevel::Strict);
        assert_eq!(
            config.branch_types,
            vec!["feature", "bugfix", "hotfix", "refactor", "docs", "test", "chore"]
        );
        assert_eq!(
            config.commit_types,
            vec![
                "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci",
                "chore", "revert"
            ]
        );
    }

    #[test]
    fn severity_order() {
        assert!(StrictnessLevel::Strict > StrictnessLevel::Moderate);
        assert!(StrictnessLevel::Moderate > StrictnessLevel::Minimal);
    }

    #[test]
    fn missing_settings_give_defaults() {
        assert_eq!(resolve_config(None), PolicyConfig::default());
    }

    #[test]
    fn malformed_settings_give_defaults() {
        assert_eq!(resolve_config(Some(&json!("not an object"))), resolve_config(None));
        assert_eq!(
            resolve_config(Some(&json!({"level": "moderate", "branch_types": "feature"}))),
            resolve_config(None)
        );
    }

    #[test]
    fn empty_settings_give_defaults() {
        assert_eq!(resolve_config(Some(&json!({}))), PolicyConfig::default());
    }

    #[test]
    fn level_is_read() {
        let config = resolve_config(Some(&json!({"level": "moderate"})));
        assert_eq!(config.strictness, StrictnessLevel::Moderate);
        assert_eq!(config.branch_types, PolicyConfig::default().branch_types);
    }

    #[test]
    fn unknown_level_is_strict() {
        let config = resolve_config(Some(&json!({"level": "lenient"})));
        assert_eq!(config.strictness, StrictnessLevel::Strict);
        let config = resolve_config(Some(&json!({"level": 2})));
        assert_eq!(config.strictness, StrictnessLevel::Strict);
    }

    #[test]
    fn custom_vocabularies() {
        let config = resolve_config(Some(&json!({
            "branch_types": ["feature", "fix", "feature", " "],
            "commit_types": ["feat", "fix"]
        })));
        assert_eq!(config.branch_types, vec!["feature", "fix"]);
        assert_eq!(config.commit_types, vec!["feat", "fix"]);
        assert_eq!(config.strictness, StrictnessLevel::Strict);
    }

    #[test]
    fn protected_branches_not_configurable() {
        let config = resolve_config(Some(&json!({"protected_branches": ["release"]})));
        assert_eq!(config.protected_branches, vec!["main", "master"]);
        assert!(config.is_protected("main"));
        assert!(!config.is_protected("release"));
    }

    #[test]
    fn resolve_is_deterministic() {
        let raw = json!({"level": "minimal", "commit_types": ["feat"]});
        assert_eq!(resolve_config(Some(&raw)), resolve_config(Some(&raw)));
    }

    #[test]
    fn load_settings_reads_plugin_section() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(
            dir.path(),
            r#"{"plugins": {"cc-devflow": {"level": "minimal"}, "other": {"level": "moderate"}}}"#,
        );
        let config = load(dir.path());
        assert_eq!(config.strictness, StrictnessLevel::Minimal);
    }

    #[test]
    fn load_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(dir.path()).is_none());
        assert_eq!(load(dir.path()), PolicyConfig::default());
    }

    #[test]
    fn load_settings_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(dir.path(), "{not json");
        assert!(load_settings(dir.path()).is_none());
        assert_eq!(load(dir.path()), PolicyConfig::default());
    }

    #[test]
    fn load_settings_without_plugin_section() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(dir.path(), r#"{"permissions": {}}"#);
        assert!(load_settings(dir.path()).is_none());
    }

    #[test]
    fn python_version_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect_python_version(dir.path()), "py312");
    }

    #[test]
    fn python_version_from_ruff() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nrequires-python = \">=3.10\"\n\n[tool.ruff]\ntarget-version = \"py39\"\n",
        )
        .unwrap();
        assert_eq!(detect_python_version(dir.path()), "py39");
    }

    #[test]
    fn python_version_from_requires_python() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nrequires-python = \"~=3.11\"\n",
        )
        .unwrap();
        assert_eq!(detect_python_version(dir.path()), "py311");
    }

    #[test]
    fn python_version_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[project\n").unwrap();
        assert_eq!(detect_python_version(dir.path()), "py312");
    }

    #[test]
    fn dump_as_toml() {
        let text = toml::to_string_pretty(&PolicyConfig::default()).unwrap();
        assert!(text.contains("strictness = \"strict\""));
        assert!(text.contains("protected_branches"));
    }
}
