use std::sync::LazyLock;

use chrona_core::Session;
use regex::Regex;

/// Compiled credential patterns, initialized once.
static SENSITIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Atlassian API tokens: ATATT3x...
        (
            Regex::new(r"ATATT[A-Za-z0-9+/=_-]{20,}").unwrap(),
            "[REDACTED_TOKEN]",
        ),
        // OpenAI / Anthropic API keys: sk-..., sk-ant-...
        (
            Regex::new(r"\b(sk-[a-zA-Z0-9_-]{20,})").unwrap(),
            "[REDACTED_API_KEY]",
        ),
        // Basic/Bearer auth headers
        (
            Regex::new(r"(Authorization:\s*(?:Basic|Bearer)\s+)\S+").unwrap(),
            "${1}[REDACTED]",
        ),
        // curl -u user:token
        (
            Regex::new(r"(-u\s+\S+:)\S+").unwrap(),
            "${1}[REDACTED]",
        ),
        // printf of email:token piped into base64
        (
            Regex::new(r#"(printf\s+["'])[^"']*[:@][^"']*(["'])"#).unwrap(),
            "${1}[REDACTED]${2}",
        ),
        // apiToken values in inline JSON
        (
            Regex::new(r#"(?i)("apiToken"\s*:\s*")[^"]+(")"#).unwrap(),
            "${1}[REDACTED]${2}",
        ),
    ]
});

/// Remove credentials, tokens, and secrets from a command string before it
/// is stored in the session document.
pub fn sanitize_command(command: &str) -> String {
    let mut output = command.to_string();
    for (pattern, replacement) in SENSITIVE_PATTERNS.iter() {
        output = pattern.replace_all(&output, *replacement).to_string();
    }
    output
}

/// Retroactively sanitize command text already stored in work chunks and
/// the activity buffer. Covers documents written before a pattern existed.
pub fn sanitize_session_commands(session: &mut Session) {
    for chunk in &mut session.work_chunks {
        for activity in &mut chunk.activities {
            if let Some(cmd) = &activity.command {
                activity.command = Some(sanitize_command(cmd));
            }
        }
    }
    for activity in &mut session.activity_buffer {
        if let Some(cmd) = &activity.command {
            activity.command = Some(sanitize_command(cmd));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrona_core::types::{ActivityEvent, ActivityKind};

    #[test]
    fn redacts_atlassian_token() {
        let out = sanitize_command("curl -H 'X: ATATT3xFfGF0aBcDeFgHiJkLmNoPqRsTuVwXyZ012345'");
        assert!(out.contains("[REDACTED_TOKEN]"));
        assert!(!out.contains("ATATT3x"));
    }

    #[test]
    fn redacts_bearer_header() {
        let out = sanitize_command("curl -H 'Authorization: Bearer abc123token456'");
        assert!(out.contains("Authorization: Bearer [REDACTED]"));
        assert!(!out.contains("abc123token456"));
    }

    #[test]
    fn redacts_basic_header() {
        let out = sanitize_command("Authorization: Basic dXNlcjpwYXNz");
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("dXNlcjpwYXNz"));
    }

    #[test]
    fn redacts_curl_user_flag() {
        let out = sanitize_command("curl -u me@x.com:supersecret https://x.atlassian.net");
        assert!(out.contains("-u me@x.com:[REDACTED]"));
        assert!(!out.contains("supersecret"));
    }

    #[test]
    fn redacts_printf_credential_pipe() {
        let out = sanitize_command(r#"printf "me@x.com:tok123" | base64"#);
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("tok123"));
    }

    #[test]
    fn redacts_api_token_json_value() {
        let out = sanitize_command(r#"echo '{"apiToken": "secret-value"}' > cfg.json"#);
        assert!(out.contains(r#""apiToken": "[REDACTED]""#));
        assert!(!out.contains("secret-value"));
    }

    #[test]
    fn redacts_sk_api_key() {
        let out = sanitize_command("export KEY=sk-abc123456789012345678901");
        assert!(out.contains("[REDACTED_API_KEY]"));
        assert!(!out.contains("sk-abc"));
    }

    #[test]
    fn leaves_normal_commands_alone() {
        let cmd = "cargo test --workspace && git status";
        assert_eq!(sanitize_command(cmd), cmd);
    }

    #[test]
    fn redacts_multiple_secrets_in_one_command() {
        let out = sanitize_command(
            "curl -u a:b -H 'Authorization: Bearer tok' ATATT3xFfGF0aBcDeFgHiJkLmNoP",
        );
        assert!(!out.contains("Bearer tok"));
        assert!(out.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn sanitizes_stored_session_commands() {
        let mut session = Session::new("s1", 0);
        session.activity_buffer.push(ActivityEvent {
            timestamp: 1,
            tool: "Bash".to_string(),
            kind: ActivityKind::Command,
            file_path: None,
            command: Some("curl -u me:tok https://x".to_string()),
            issue_key: None,
        });
        sanitize_session_commands(&mut session);
        assert_eq!(
            session.activity_buffer[0].command.as_deref(),
            Some("curl -u me:[REDACTED] https://x")
        );
    }
}
