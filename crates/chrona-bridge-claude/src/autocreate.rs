//! Auto-creation of issues from free-text intent.
//!
//! Gated on autonomy (Cautious never creates), the `autoCreate` config
//! flag, credentials, and classifier confidence. A duplicate of an active
//! issue is reported instead of created. Newly created issues retroactively
//! claim any unattributed chunks.

use std::path::Path;

use chrona_core::classify::{classify, extract_summary, find_duplicate};
use chrona_core::types::IssueEntry;
use chrona_core::Session;
use chrona_store::config::{load_credentials, Config};
use chrona_store::log::debug_log;
use chrona_jira::{CreateIssue, JiraClient};

/// Classifier confidence below this skips auto-creation.
const MIN_CONFIDENCE: f64 = 0.65;

#[derive(Debug, Clone)]
pub(crate) struct AutoCreateOutcome {
    pub key: String,
    pub summary: String,
    /// True when an existing active issue matched instead of creating.
    pub duplicate: bool,
}

/// Try to create an issue for the given free text. Returns `None` on any
/// gate failure; the caller stays silent, never surfacing an error.
pub(crate) fn attempt_auto_create(
    root: &Path,
    session: &mut Session,
    cfg: &Config,
    free_text: &str,
    now: i64,
) -> Option<AutoCreateOutcome> {
    if !session.autonomy.auto_approves() || !cfg.auto_create {
        return None;
    }
    let creds = load_credentials(root);
    if !creds.is_complete() {
        return None;
    }

    let summary = extract_summary(free_text);
    if summary.is_empty() {
        return None;
    }

    if let Some(existing) = find_duplicate(session, &summary) {
        debug_log(
            cfg.debug_log,
            "auto-create",
            &format!("duplicate of {existing}: {summary:?}"),
        );
        return Some(AutoCreateOutcome {
            key: existing,
            summary,
            duplicate: true,
        });
    }

    let classification = classify(&summary, None);
    if classification.confidence < MIN_CONFIDENCE {
        debug_log(
            cfg.debug_log,
            "auto-create",
            &format!(
                "confidence {:.2} below {MIN_CONFIDENCE} for {summary:?}",
                classification.confidence
            ),
        );
        return None;
    }
    if cfg.project_key.is_empty() {
        return None;
    }

    let parent_key = session
        .last_parent_key
        .clone()
        .or_else(|| session.current_issue.clone());

    let client = JiraClient::new(&creds).ok()?;
    let created = match client.create_issue(&CreateIssue {
        project_key: cfg.project_key.clone(),
        summary: summary.clone(),
        issue_type: classification.issue_type.as_str().to_string(),
        parent_key: parent_key.clone(),
        assignee_id: if creds.account_id.is_empty() {
            None
        } else {
            Some(creds.account_id.clone())
        },
        labels: cfg.default_labels.clone(),
    }) {
        Ok(created) => created,
        Err(e) => {
            debug_log(cfg.debug_log, "auto-create", &format!("create failed: {e}"));
            return None;
        }
    };

    let mut entry = IssueEntry::started_at(now);
    entry.summary = summary.clone();
    session.active_issues.insert(created.key.clone(), entry);
    session.current_issue = Some(created.key.clone());
    let claimed = session.claim_unattributed_chunks(&created.key);
    if parent_key.is_some() {
        session.last_parent_key = parent_key;
    }

    debug_log(
        cfg.debug_log,
        "auto-create",
        &format!(
            "created {} type={} claimed_chunks={claimed} summary={summary:?}",
            created.key,
            classification.issue_type.as_str()
        ),
    );
    Some(AutoCreateOutcome {
        key: created.key,
        summary,
        duplicate: false,
    })
}
