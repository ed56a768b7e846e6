use std::path::Path;

use crate::runner::ToolRunner;

/// Answers "which branch is HEAD on in this directory".
pub trait BranchLookup {
    fn current_branch(&self, cwd: &Path) -> Option<String>;
}

/// Asks git via `git rev-parse --abbrev-ref HEAD`.
pub struct GitCli<'a> {
    runner: &'a dyn ToolRunner,
}

impl<'a> GitCli<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Self { runner }
    }
}

impl BranchLookup for GitCli<'_> {
    fn current_branch(&self, cwd: &Path) -> Option<String> {
        let args = ["rev-parse", "--abbrev-ref", "HEAD"].map(String::from);
        match self.runner.run("git", &args, Some(cwd)) {
            Ok(out) if out.success => {
                let branch = out.stdout.trim();
                (!branch.is_empty()).then(|| branch.to_string())
            }
            Ok(out) => {
                log::debug!("git rev-parse failed in {}: {}", cwd.display(), out.stderr.trim());
                None
            }
            Err(e) => {
                log::warn!("branch lookup failed: {e}");
                None
            }
        }
    }
}

/// A lookup with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct FixedBranch(pub Option<String>);

impl BranchLookup for FixedBranch {
    fn current_branch(&self, _cwd: &Path) -> Option<String> {
        self.0.clone()
    }
}
