use std::path::Path;

use chrona_core::types::WorklogStatus;
use chrona_core::worklog::{self, RoundingPolicy};
use chrona_store::config::Config;
use chrona_store::session::{load_session, save_session};

/// `chrona worklog build <ISSUE>` — print the draft for an issue as JSON
pub fn build(root: &Path, issue_key: &str) -> anyhow::Result<()> {
    let cfg = Config::load(root).unwrap_or_default();
    let Some(session) = load_session(root) else {
        anyhow::bail!("no active session");
    };

    let policy = RoundingPolicy {
        rounding_minutes: cfg.time_rounding,
        accuracy: session.accuracy,
    };
    let draft = worklog::build(&session, issue_key, &policy);

    // logLanguage rides along for downstream description enrichment.
    let out = serde_json::json!({
        "issueKey": draft.issue_key,
        "seconds": draft.seconds,
        "rawSeconds": draft.raw_seconds,
        "capped": draft.capped,
        "summary": draft.summary,
        "rawFacts": {
            "files": draft.raw_facts.files,
            "commands": draft.raw_facts.commands,
            "activityCount": draft.raw_facts.activity_count,
        },
        "logLanguage": Config::log_language(root),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// `chrona worklog approve` — mark pending (and deferred) entries approved
pub fn approve(root: &Path) -> anyhow::Result<()> {
    let count = retag(root, |status| {
        matches!(status, WorklogStatus::Pending | WorklogStatus::Deferred)
            .then_some(WorklogStatus::Approved)
    })?;
    println!("Approved {count} worklog(s).");
    Ok(())
}

/// `chrona worklog defer` — hold pending entries back for a later decision
pub fn defer(root: &Path) -> anyhow::Result<()> {
    let count = retag(root, |status| {
        (status == WorklogStatus::Pending).then_some(WorklogStatus::Deferred)
    })?;
    println!("Deferred {count} worklog(s).");
    Ok(())
}

/// `chrona worklog drop` — discard pending, deferred, and unattributed entries
pub fn drop_entries(root: &Path) -> anyhow::Result<()> {
    let count = retag(root, |status| {
        matches!(
            status,
            WorklogStatus::Pending | WorklogStatus::Deferred | WorklogStatus::Unattributed
        )
        .then_some(WorklogStatus::Dropped)
    })?;
    println!("Dropped {count} worklog(s).");
    Ok(())
}

fn retag(
    root: &Path,
    transition: impl Fn(WorklogStatus) -> Option<WorklogStatus>,
) -> anyhow::Result<usize> {
    let Some(mut session) = load_session(root) else {
        anyhow::bail!("no active session");
    };
    let mut count = 0;
    for entry in &mut session.pending_worklogs {
        if let Some(next) = transition(entry.status) {
            entry.status = next;
            count += 1;
        }
    }
    if count > 0 {
        save_session(root, &session)?;
    }
    Ok(count)
}

/// `chrona worklog post` — post approved entries to the ticket system
pub fn post(root: &Path) -> anyhow::Result<()> {
    let summary = chrona_bridge_claude::post_approved_worklogs(root)?;
    if summary.posted == 0 && summary.failed == 0 {
        println!("Nothing to post.");
    } else {
        println!("Posted {} worklog(s), {} failed.", summary.posted, summary.failed);
    }
    Ok(())
}
