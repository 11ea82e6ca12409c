use std::path::Path;
use std::process::Command;

use chrona_store::config::Config;
use regex::Regex;

/// Current git branch name, or None outside a repo.
pub(crate) fn current_branch(root: &Path) -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if branch.is_empty() {
        None
    } else {
        Some(branch)
    }
}

/// Extract an issue key from the current branch name using the configured
/// pattern. The `{key}` placeholder is substituted with the escaped project
/// key; the first capture group is the issue key.
pub(crate) fn detect_issue_from_branch(root: &Path, cfg: &Config) -> Option<String> {
    let branch = current_branch(root)?;
    match_branch(&branch, &cfg.branch_pattern, &cfg.project_key)
}

/// Match a branch name against a configured pattern without touching git.
pub(crate) fn match_branch(branch: &str, branch_pattern: &str, project_key: &str) -> Option<String> {
    if branch_pattern.is_empty() || project_key.is_empty() {
        return None;
    }
    let pattern = branch_pattern.replace("{key}", &regex::escape(project_key));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid branch pattern");
            return None;
        }
    };
    re.captures(branch)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_branch_extracts_issue_key() {
        let pattern = r"^(?:feature|fix|hotfix)/({key}-\d+)";
        assert_eq!(
            match_branch("feature/PROJ-42-login", pattern, "PROJ").as_deref(),
            Some("PROJ-42")
        );
        assert_eq!(match_branch("main", pattern, "PROJ"), None);
        assert_eq!(match_branch("feature/OTHER-1", pattern, "PROJ"), None);
    }

    #[test]
    fn match_branch_escapes_project_key() {
        // A key with regex metacharacters must not break the pattern.
        assert_eq!(match_branch("fix/A.B-1", r"fix/({key}-\d+)", "A.B").as_deref(), Some("A.B-1"));
        assert_eq!(match_branch("fix/AxB-1", r"fix/({key}-\d+)", "A.B"), None);
    }

    #[test]
    fn match_branch_requires_configuration() {
        assert_eq!(match_branch("feature/P-1", "", "P"), None);
        assert_eq!(match_branch("feature/P-1", r"({key}-\d+)", ""), None);
    }
}
