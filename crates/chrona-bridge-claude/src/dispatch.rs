use std::path::Path;

use chrona_store::log::debug_log;
use chrona_store::session::{load_session, now_unix, save_session};

use crate::autocreate;
use crate::lifecycle;
use crate::parse::*;

// ── Hook Result ──

/// Result from a hook dispatch.
///
/// - `stdout`: JSON string to print to stdout (consumed by Claude Code)
/// - `stderr`: warning message to print to stderr (shown to user, exit 1)
#[derive(Debug, Default, Clone)]
pub struct HookResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl HookResult {
    /// Construct a result with stdout only (normal output, exit 0).
    pub fn output(stdout: String) -> Self {
        Self {
            stdout: Some(stdout),
            stderr: None,
        }
    }

    /// Construct an empty result (no output, exit 0).
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Wrap an advisory message as the structured stdout Claude Code consumes.
fn advisory(message: String) -> HookResult {
    HookResult::output(serde_json::json!({"systemMessage": message}).to_string())
}

fn advisory_or_empty(result: anyhow::Result<Option<String>>, hook: &str) -> HookResult {
    match result {
        Ok(Some(message)) => advisory(message),
        Ok(None) => HookResult::empty(),
        Err(e) => {
            // Internal failures degrade to silence — never block the host.
            debug_log(true, "dispatch", &format!("{hook} failed: {e}"));
            HookResult::empty()
        }
    }
}

// ── Hook dispatch ──

/// Main hook entrypoint: parse stdin, dispatch by hook_event_name.
/// Returns `HookResult` with optional stdout JSON and/or stderr warnings.
pub fn hook_entrypoint_from_stdin(stdin: &str) -> anyhow::Result<HookResult> {
    if stdin.trim().is_empty() {
        return Ok(HookResult::empty());
    }
    let raw = parse_hook_stdin(stdin)?;

    let hook_event_name = get_str(&raw, "hook_event_name");
    let cwd = get_str(&raw, "cwd");
    let root = resolve_root(&cwd);

    let result = match hook_event_name.as_str() {
        "SessionStart" => advisory_or_empty(lifecycle::session_start(&root), "SessionStart"),
        "PostToolUse" => {
            if let Err(e) = lifecycle::record_post_tool_use(&root, &raw) {
                debug_log(true, "dispatch", &format!("PostToolUse failed: {e}"));
            }
            HookResult::empty()
        }
        "Stop" => advisory_or_empty(lifecycle::flush_point(&root), "Stop"),
        "SessionEnd" => advisory_or_empty(lifecycle::session_end(&root), "SessionEnd"),
        "PreToolUse" => dispatch_pre_tool_use(&root, &raw),
        "UserPromptSubmit" => dispatch_user_prompt(&root, &raw),
        _ => HookResult::empty(),
    };
    Ok(result)
}

/// PreToolUse: inspect an about-to-run `git commit` and suggest referencing
/// the tracked issue key when the message does not mention it.
fn dispatch_pre_tool_use(root: &Path, raw: &serde_json::Value) -> HookResult {
    let tool_name = get_str(raw, "tool_name");
    if tool_name != "Bash" {
        return HookResult::empty();
    }
    let command = raw
        .pointer("/tool_input/command")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if !command.contains("git commit") {
        return HookResult::empty();
    }
    let Some(session) = load_session(root) else {
        return HookResult::empty();
    };
    let Some(issue_key) = session.current_issue else {
        return HookResult::empty();
    };
    if command.contains(issue_key.as_str()) {
        return HookResult::empty();
    }
    advisory(format!(
        "[chrona] Tracking {issue_key} — consider referencing it in the commit message"
    ))
}

/// UserPromptSubmit: detect declared intent in free text and, when autonomy
/// permits, auto-create (or match) an issue for it.
fn dispatch_user_prompt(root: &Path, raw: &serde_json::Value) -> HookResult {
    let prompt = get_str(raw, "prompt");
    if prompt.is_empty() {
        return HookResult::empty();
    }
    let Some(cfg) = chrona_store::config::Config::load(root) else {
        return HookResult::empty();
    };
    if !cfg.enabled {
        return HookResult::empty();
    }
    let Some(mut session) = load_session(root) else {
        return HookResult::empty();
    };

    let Some(outcome) =
        autocreate::attempt_auto_create(root, &mut session, &cfg, &prompt, now_unix())
    else {
        return HookResult::empty();
    };

    if outcome.duplicate {
        return advisory(format!(
            "[chrona] Prompt matches active issue {} — keeping existing tracking",
            outcome.key
        ));
    }

    if let Err(e) = save_session(root, &session) {
        debug_log(true, "dispatch", &format!("save after auto-create failed: {e}"));
        return HookResult::empty();
    }
    advisory(format!(
        "[chrona] Created {}: {}",
        outcome.key, outcome.summary
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrona_core::Session;
    use std::fs;

    fn write_config(root: &Path, body: &str) {
        let path = chrona_store::config_path(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn hook_input(root: &Path, event: &str, extra: serde_json::Value) -> String {
        let mut v = serde_json::json!({
            "hook_event_name": event,
            "cwd": root.to_str().unwrap(),
        });
        if let (Some(obj), Some(extra_obj)) = (v.as_object_mut(), extra.as_object()) {
            for (k, val) in extra_obj {
                obj.insert(k.clone(), val.clone());
            }
        }
        v.to_string()
    }

    #[test]
    fn empty_stdin_is_silent() {
        let result = hook_entrypoint_from_stdin("").unwrap();
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
    }

    #[test]
    fn malformed_stdin_is_an_error_for_the_caller_to_swallow() {
        assert!(hook_entrypoint_from_stdin("{not json").is_err());
    }

    #[test]
    fn unknown_hook_event_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        let input = hook_input(tmp.path(), "SomethingNew", serde_json::json!({}));
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn session_start_hook_creates_session() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let input = hook_input(tmp.path(), "SessionStart", serde_json::json!({}));
        hook_entrypoint_from_stdin(&input).unwrap();
        assert!(load_session(tmp.path()).is_some());
    }

    #[test]
    fn post_tool_use_hook_records_activity() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);
        save_session(tmp.path(), &Session::new("s1", 0)).unwrap();

        let input = hook_input(
            tmp.path(),
            "PostToolUse",
            serde_json::json!({
                "tool_name": "Edit",
                "tool_input": {"file_path": "/src/a.rs"},
            }),
        );
        hook_entrypoint_from_stdin(&input).unwrap();

        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.activity_buffer.len(), 1);
    }

    #[test]
    fn camel_case_hook_payload_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);
        save_session(tmp.path(), &Session::new("s1", 0)).unwrap();

        let input = serde_json::json!({
            "hookEventName": "PostToolUse",
            "cwd": tmp.path().to_str().unwrap(),
            "toolName": "Edit",
            "tool_input": {"file_path": "/src/b.rs"},
        })
        .to_string();
        hook_entrypoint_from_stdin(&input).unwrap();

        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.activity_buffer.len(), 1);
    }

    #[test]
    fn pre_tool_use_suggests_issue_key_for_git_commit() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);
        let mut session = Session::new("s1", 0);
        session.current_issue = Some("K-42".to_string());
        save_session(tmp.path(), &session).unwrap();

        let input = hook_input(
            tmp.path(),
            "PreToolUse",
            serde_json::json!({
                "tool_name": "Bash",
                "tool_input": {"command": "git commit -m \"Add login\""},
            }),
        );
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        let stdout = result.stdout.unwrap();
        assert!(stdout.contains("K-42"));
        assert!(stdout.contains("systemMessage"));
    }

    #[test]
    fn pre_tool_use_silent_when_key_already_referenced() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::new("s1", 0);
        session.current_issue = Some("K-42".to_string());
        save_session(tmp.path(), &session).unwrap();

        let input = hook_input(
            tmp.path(),
            "PreToolUse",
            serde_json::json!({
                "tool_name": "Bash",
                "tool_input": {"command": "git commit -m \"K-42: add login\""},
            }),
        );
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn pre_tool_use_ignores_non_bash_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::new("s1", 0);
        session.current_issue = Some("K-42".to_string());
        save_session(tmp.path(), &session).unwrap();

        let input = hook_input(
            tmp.path(),
            "PreToolUse",
            serde_json::json!({
                "tool_name": "Edit",
                "tool_input": {"file_path": "/src/a.rs"},
            }),
        );
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn pre_tool_use_ignores_other_bash_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::new("s1", 0);
        session.current_issue = Some("K-42".to_string());
        save_session(tmp.path(), &session).unwrap();

        let input = hook_input(
            tmp.path(),
            "PreToolUse",
            serde_json::json!({
                "tool_name": "Bash",
                "tool_input": {"command": "cargo test"},
            }),
        );
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn pre_tool_use_silent_without_current_issue() {
        let tmp = tempfile::tempdir().unwrap();
        save_session(tmp.path(), &Session::new("s1", 0)).unwrap();

        let input = hook_input(
            tmp.path(),
            "PreToolUse",
            serde_json::json!({
                "tool_name": "Bash",
                "tool_input": {"command": "git commit -m \"x\""},
            }),
        );
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn user_prompt_without_auto_create_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);
        save_session(tmp.path(), &Session::new("s1", 0)).unwrap();

        let input = hook_input(
            tmp.path(),
            "UserPromptSubmit",
            serde_json::json!({"prompt": "fix the login crash"}),
        );
        let result = hook_entrypoint_from_stdin(&input).unwrap();
        assert!(result.stdout.is_none());
    }

    #[test]
    fn stop_hook_drains_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);
        let mut session = Session::new("s1", now_unix());
        session
            .activity_buffer
            .push(chrona_core::types::ActivityEvent {
                timestamp: now_unix() - 100,
                tool: "Edit".to_string(),
                kind: chrona_core::types::ActivityKind::FileEdit,
                file_path: Some("/src/a.rs".to_string()),
                command: None,
                issue_key: None,
            });
        save_session(tmp.path(), &session).unwrap();

        let input = hook_input(tmp.path(), "Stop", serde_json::json!({}));
        hook_entrypoint_from_stdin(&input).unwrap();

        let session = load_session(tmp.path()).unwrap();
        assert!(session.activity_buffer.is_empty());
        assert_eq!(session.work_chunks.len(), 1);
    }
}
