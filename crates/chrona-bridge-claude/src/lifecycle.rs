//! Session lifecycle orchestration: start (resume/create, pruning, branch
//! attribution), flush points (drain + periodic worklogs), and end (flush,
//! worklog emission, archival).
//!
//! Every function here is a short-lived invocation over the persisted
//! session document: load, mutate, save atomically. Failures degrade to
//! no-ops — the host is never blocked.

use std::path::Path;

use chrona_core::types::{
    IssueEntry, IssueKey, PendingWorklog, WorklogStatus, STALE_ISSUE_SECONDS,
};
use chrona_core::worklog::{self, RoundingPolicy};
use chrona_core::{segment, Session};
use chrona_store::config::{load_credentials, Config};
use chrona_store::log::debug_log;
use chrona_store::session::{archive_session, load_session, new_session_id, now_unix, save_session};
use chrona_jira::JiraClient;

use crate::git;
use crate::recorder;
use crate::redact::sanitize_session_commands;

/// SessionStart: resume or create the session document, prune stale issues,
/// sync dials from config, and attribute work from the branch name when
/// nothing else is active. Returns an advisory only when attribution
/// actually happened.
pub(crate) fn session_start(root: &Path) -> anyhow::Result<Option<String>> {
    let Some(cfg) = Config::load(root) else {
        return Ok(None);
    };
    if !cfg.enabled {
        debug_log(cfg.debug_log, "session-start", "disabled via config");
        return Ok(None);
    }

    let now = now_unix();
    let resumed = load_session(root);
    let mut session = resumed.unwrap_or_else(|| Session::new(new_session_id(), now));
    if session.session_id.is_empty() {
        session.session_id = new_session_id();
    }
    if session.last_flush_time == 0 {
        session.last_flush_time = now;
    }

    prune_stale_issues(&mut session, &cfg, now);

    // Config wins over a stale session value.
    session.autonomy = cfg.autonomy_level;
    session.accuracy = cfg.accuracy.clamp(1, 10);

    // Commands stored before a redaction pattern existed get cleaned here.
    sanitize_session_commands(&mut session);

    let mut advisory = None;
    if session.active_issues.is_empty() {
        if let Some(issue_key) = git::detect_issue_from_branch(root, &cfg) {
            session
                .active_issues
                .insert(issue_key.clone(), IssueEntry::started_at(now));
            session.current_issue = Some(issue_key.clone());
            let claimed = session.claim_unattributed_chunks(&issue_key);
            debug_log(
                cfg.debug_log,
                "session-start",
                &format!("branch attribution issue={issue_key} claimed_chunks={claimed}"),
            );
            advisory = Some(format!("[chrona] Tracking {issue_key} (from branch name)"));
        }
    }

    save_session(root, &session)?;
    debug_log(
        cfg.debug_log,
        "session-start",
        &format!("session ready id={}", session.session_id),
    );
    Ok(advisory)
}

/// Remove active issues that are idle beyond the staleness threshold with
/// no recorded work and no referencing chunks.
fn prune_stale_issues(session: &mut Session, cfg: &Config, now: i64) {
    let stale: Vec<IssueKey> = session
        .active_issues
        .iter()
        .filter(|(key, entry)| {
            entry.start_time > 0
                && now - entry.start_time > STALE_ISSUE_SECONDS
                && entry.total_seconds == 0
                && !session
                    .work_chunks
                    .iter()
                    .any(|c| c.issue_key.as_deref() == Some(key.as_str()))
        })
        .map(|(key, _)| key.clone())
        .collect();
    for key in stale {
        session.active_issues.remove(&key);
        if session.current_issue.as_deref() == Some(key.as_str()) {
            session.current_issue = None;
        }
        debug_log(
            cfg.debug_log,
            "session-start",
            &format!("pruned stale issue {key} (>24h, no work)"),
        );
    }
}

/// Drain the activity buffer into work chunks. Returns the keys of chunks
/// flagged for attribution review.
pub(crate) fn drain_buffer(session: &mut Session, cfg: &Config) -> Vec<String> {
    if session.activity_buffer.is_empty() {
        return Vec::new();
    }
    let policy = segment::SegmentPolicy {
        idle_threshold_minutes: cfg.idle_threshold,
        accuracy: session.accuracy,
    };
    let buffer = std::mem::take(&mut session.activity_buffer);
    let chunks = segment::segment_buffer(buffer, &policy);

    let mut flagged = Vec::new();
    for chunk in &chunks {
        if chunk.needs_attribution {
            let files = chunk
                .files_changed
                .iter()
                .take(5)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            flagged.push(files);
        }
    }
    debug_log(
        cfg.debug_log,
        "drain-buffer",
        &format!(
            "new_chunks={} flagged={} total_chunks={}",
            chunks.len(),
            flagged.len(),
            session.work_chunks.len() + chunks.len()
        ),
    );
    session.work_chunks.extend(chunks);
    flagged
}

/// Build and enqueue pending worklogs for every active issue with billable
/// chunks, plus a single unattributed entry for leftover null-key chunks.
/// Returns true when anything was enqueued.
///
/// When exactly one issue is active, the builder already folds unattributed
/// chunks into that issue, so no separate rescue entry is produced.
fn enqueue_worklogs(session: &mut Session, cfg: &Config) -> bool {
    let policy = RoundingPolicy {
        rounding_minutes: cfg.time_rounding,
        accuracy: session.accuracy,
    };

    let keys: Vec<IssueKey> = session.active_issues.keys().cloned().collect();
    let sole_active = keys.len() == 1;
    let mut enqueued = false;

    for key in &keys {
        let draft = worklog::build(session, key, &policy);
        if draft.raw_seconds <= 0 {
            continue;
        }
        // Per-issue auto-approval overrides a cautious session.
        let auto = session.autonomy.auto_approves()
            || session
                .active_issues
                .get(key)
                .is_some_and(|e| e.auto_approve_worklogs);
        let status = if auto {
            WorklogStatus::Approved
        } else {
            WorklogStatus::Pending
        };
        debug_log(
            cfg.debug_log,
            "worklog",
            &format!(
                "issue={key} raw={}s rounded={}s capped={}",
                draft.raw_seconds, draft.seconds, draft.capped
            ),
        );
        session.pending_worklogs.push(PendingWorklog {
            issue_key: Some(key.clone()),
            seconds: draft.seconds,
            summary: draft.summary,
            raw_facts: draft.raw_facts,
            status,
        });
        enqueued = true;
    }

    if !sole_active {
        let draft = worklog::build_unattributed(session, &policy);
        if draft.raw_seconds > 0 {
            debug_log(
                cfg.debug_log,
                "worklog",
                &format!("unattributed raw={}s rounded={}s", draft.raw_seconds, draft.seconds),
            );
            session.pending_worklogs.push(PendingWorklog {
                issue_key: None,
                seconds: draft.seconds,
                summary: draft.summary,
                raw_facts: draft.raw_facts,
                status: WorklogStatus::Unattributed,
            });
            enqueued = true;
        }
    }
    enqueued
}

/// Drop chunks that have just been billed: everything attributed to an
/// active issue, and all unattributed chunks (folded or rescued above).
/// Prevents re-billing on a subsequent flush or end.
fn clear_billed_chunks(session: &mut Session) {
    let keys: Vec<IssueKey> = session.active_issues.keys().cloned().collect();
    session.work_chunks.retain(|c| match &c.issue_key {
        Some(key) => !keys.contains(key),
        None => false,
    });
}

/// Flush point (Stop hook): drain the buffer, then run the periodic worklog
/// flush when the configured interval has elapsed. Returns an advisory when
/// a context switch was flagged.
pub(crate) fn flush_point(root: &Path) -> anyhow::Result<Option<String>> {
    let Some(cfg) = Config::load(root) else {
        return Ok(None);
    };
    if !cfg.enabled {
        return Ok(None);
    }
    let Some(mut session) = load_session(root) else {
        return Ok(None);
    };

    let now = now_unix();
    let flagged = drain_buffer(&mut session, &cfg);

    let interval_due = now - session.last_flush_time >= cfg.worklog_interval * 60;
    let mut posted = false;
    if interval_due && enqueue_worklogs(&mut session, &cfg) {
        clear_billed_chunks(&mut session);
        session.last_flush_time = now;
        posted = session.autonomy.auto_approves();
    }

    save_session(root, &session)?;

    if posted {
        let summary = post_approved_worklogs(root)?;
        if summary.failed > 0 {
            return Ok(Some(format!(
                "[chrona] {} worklog(s) failed to post — will retry later",
                summary.failed
            )));
        }
    }

    if let Some(files) = flagged.first() {
        return Ok(Some(format!(
            "[chrona] Context switch detected ({files}) — work left unattributed until confirmed"
        )));
    }
    Ok(None)
}

/// SessionEnd: flush the planning timer, drain remaining activity, emit
/// worklogs, archive an immutable snapshot, clear billed chunks, and reset
/// each remaining issue's watermark so a later end does not re-bill.
pub(crate) fn session_end(root: &Path) -> anyhow::Result<Option<String>> {
    let cfg = Config::load(root).unwrap_or_default();
    let Some(mut session) = load_session(root) else {
        return Ok(None);
    };

    let now = now_unix();

    if let Some(timer) = session.active_planning.take() {
        recorder::flush_planning_timer(&mut session, &cfg, timer, now);
    }

    drain_buffer(&mut session, &cfg);
    enqueue_worklogs(&mut session, &cfg);
    prune_ghost_issues(&mut session, &cfg);

    // Archive before clearing so the snapshot preserves the full history.
    let archive_path = archive_session(root, &session)?;

    clear_billed_chunks(&mut session);
    for entry in session.active_issues.values_mut() {
        entry.start_time = now;
    }

    save_session(root, &session)?;
    debug_log(
        cfg.debug_log,
        "session-end",
        &format!("archived to {}", archive_path.display()),
    );

    let mut advisory = None;
    if session.autonomy.auto_approves() {
        let summary = post_approved_worklogs(root)?;
        if summary.failed > 0 {
            advisory = Some(format!(
                "[chrona] {} worklog(s) failed to post — will retry later",
                summary.failed
            ));
        } else if summary.posted > 0 {
            advisory = Some(format!("[chrona] Logged {} worklog(s)", summary.posted));
        }
    }
    Ok(advisory)
}

/// Remove "ghost" issues: paused, zero recorded seconds, no chunks, and no
/// nonzero pending entry. These accumulate when tracking starts but no work
/// ever lands.
fn prune_ghost_issues(session: &mut Session, cfg: &Config) {
    let ghosts: Vec<IssueKey> = session
        .active_issues
        .iter()
        .filter(|(key, entry)| {
            entry.paused
                && entry.total_seconds == 0
                && !session
                    .work_chunks
                    .iter()
                    .any(|c| c.issue_key.as_deref() == Some(key.as_str()))
                && !session.pending_worklogs.iter().any(|w| {
                    w.issue_key.as_deref() == Some(key.as_str()) && w.seconds > 0
                })
        })
        .map(|(key, _)| key.clone())
        .collect();
    for key in ghosts {
        session.active_issues.remove(&key);
        if session.current_issue.as_deref() == Some(key.as_str()) {
            session.current_issue = None;
        }
        debug_log(
            cfg.debug_log,
            "session-end",
            &format!("pruned ghost issue {key} (paused, no activity)"),
        );
    }
}

/// Outcome of a posting pass over approved worklogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostSummary {
    pub posted: usize,
    pub failed: usize,
}

/// Post every approved pending worklog to the ticket system, marking each
/// `posted` or `failed`. Missing credentials skip silently; a failed post is
/// left for a later manual or scheduled retry — no inline retry.
pub fn post_approved_worklogs(root: &Path) -> anyhow::Result<PostSummary> {
    let cfg = Config::load(root).unwrap_or_default();
    let creds = load_credentials(root);
    if !creds.is_complete() {
        debug_log(cfg.debug_log, "post-worklogs", "no credentials, skipping");
        return Ok(PostSummary::default());
    }
    let Some(mut session) = load_session(root) else {
        return Ok(PostSummary::default());
    };
    let Ok(client) = JiraClient::new(&creds) else {
        return Ok(PostSummary::default());
    };

    let mut summary = PostSummary::default();
    for entry in &mut session.pending_worklogs {
        if entry.status != WorklogStatus::Approved {
            continue;
        }
        let Some(issue_key) = entry.issue_key.clone() else {
            continue;
        };
        if entry.seconds <= 0 {
            continue;
        }

        // Older entries may predate the stored summary; rebuild from facts.
        let mut comment = entry.summary.clone();
        if comment.trim().is_empty() {
            comment = worklog::summarize_files(&entry.raw_facts.files).unwrap_or_default();
        }

        match client.add_worklog(&issue_key, entry.seconds, &comment) {
            Ok(()) => {
                entry.status = WorklogStatus::Posted;
                summary.posted += 1;
            }
            Err(e) => {
                entry.status = WorklogStatus::Failed;
                summary.failed += 1;
                debug_log(
                    cfg.debug_log,
                    "post-worklogs",
                    &format!("issue={issue_key} seconds={} error={e}", entry.seconds),
                );
            }
        }
    }

    if summary.posted > 0 || summary.failed > 0 {
        save_session(root, &session)?;
    }
    Ok(summary)
}

/// PostToolUse: record one observed action into the session buffer.
pub(crate) fn record_post_tool_use(root: &Path, raw: &serde_json::Value) -> anyhow::Result<()> {
    let Some(cfg) = Config::load(root) else {
        return Ok(());
    };
    if !cfg.enabled {
        return Ok(());
    }
    let Some(mut session) = load_session(root) else {
        return Ok(());
    };
    if recorder::record_activity(&mut session, &cfg, raw, now_unix()) {
        save_session(root, &session)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrona_core::types::{ActivityEvent, ActivityKind, Autonomy, WorkChunk};
    use std::fs;

    fn write_config(root: &Path, body: &str) {
        let path = chrona_store::config_path(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn event(ts: i64, file: &str, issue: Option<&str>) -> ActivityEvent {
        ActivityEvent {
            timestamp: ts,
            tool: "Edit".to_string(),
            kind: ActivityKind::FileEdit,
            file_path: Some(file.to_string()),
            command: None,
            issue_key: issue.map(str::to_string),
        }
    }

    fn chunk(issue: Option<&str>, start: i64, end: i64) -> WorkChunk {
        WorkChunk {
            id: WorkChunk::new_id(),
            issue_key: issue.map(str::to_string),
            start_time: start,
            end_time: end,
            activities: Vec::new(),
            files_changed: Vec::new(),
            idle_gaps: Vec::new(),
            needs_attribution: false,
        }
    }

    #[test]
    fn session_start_creates_fresh_session() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K", "autonomyLevel": "B", "accuracy": 8}"#);

        session_start(tmp.path()).unwrap();

        let session = load_session(tmp.path()).unwrap();
        assert!(!session.session_id.is_empty());
        assert_eq!(session.autonomy, Autonomy::Balanced);
        assert_eq!(session.accuracy, 8);
        assert!(session.active_issues.is_empty());
    }

    #[test]
    fn session_start_without_config_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(session_start(tmp.path()).unwrap().is_none());
        assert!(load_session(tmp.path()).is_none());
    }

    #[test]
    fn session_start_disabled_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"enabled": false}"#);
        assert!(session_start(tmp.path()).unwrap().is_none());
        assert!(load_session(tmp.path()).is_none());
    }

    #[test]
    fn session_start_syncs_dials_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"autonomyLevel": "A", "accuracy": 9}"#);

        let mut stale = Session::new("old-id", 0);
        stale.autonomy = Autonomy::Cautious;
        stale.accuracy = 2;
        save_session(tmp.path(), &stale).unwrap();

        session_start(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.session_id, "old-id");
        assert_eq!(session.autonomy, Autonomy::Autonomous);
        assert_eq!(session.accuracy, 9);
    }

    #[test]
    fn session_start_prunes_stale_empty_issue() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let now = now_unix();
        let mut session = Session::new("s1", now);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(now - 90_000));
        session.current_issue = Some("K-1".to_string());
        save_session(tmp.path(), &session).unwrap();

        session_start(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert!(!session.active_issues.contains_key("K-1"));
        assert!(session.current_issue.is_none());
    }

    #[test]
    fn session_start_retains_stale_issue_with_logged_time() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let now = now_unix();
        let mut session = Session::new("s1", now);
        let mut entry = IssueEntry::started_at(now - 90_000);
        entry.total_seconds = 1200;
        session.active_issues.insert("K-1".to_string(), entry);
        save_session(tmp.path(), &session).unwrap();

        session_start(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert!(session.active_issues.contains_key("K-1"));
    }

    #[test]
    fn session_start_retains_stale_issue_with_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let now = now_unix();
        let mut session = Session::new("s1", now);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(now - 90_000));
        session.work_chunks.push(chunk(Some("K-1"), now - 500, now));
        save_session(tmp.path(), &session).unwrap();

        session_start(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert!(session.active_issues.contains_key("K-1"));
    }

    #[test]
    fn drain_empty_buffer_is_idempotent() {
        let mut session = Session::new("s1", 0);
        let before = serde_json::to_string(&session).unwrap();
        let flagged = drain_buffer(&mut session, &Config::default());
        assert!(flagged.is_empty());
        assert_eq!(serde_json::to_string(&session).unwrap(), before);
    }

    #[test]
    fn drain_moves_buffer_into_chunks() {
        let mut session = Session::new("s1", 0);
        session.activity_buffer.push(event(1000, "/src/a.rs", Some("K-1")));
        session.activity_buffer.push(event(1100, "/src/b.rs", Some("K-1")));

        drain_buffer(&mut session, &Config::default());
        assert!(session.activity_buffer.is_empty());
        assert_eq!(session.work_chunks.len(), 1);
        assert_eq!(session.work_chunks[0].issue_key.as_deref(), Some("K-1"));
    }

    #[test]
    fn enqueue_creates_approved_entry_for_balanced_autonomy() {
        let mut session = Session::new("s1", 0);
        session.autonomy = Autonomy::Balanced;
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(Some("K-1"), 1000, 1600));

        assert!(enqueue_worklogs(&mut session, &Config::default()));
        assert_eq!(session.pending_worklogs.len(), 1);
        let wl = &session.pending_worklogs[0];
        assert_eq!(wl.issue_key.as_deref(), Some("K-1"));
        assert_eq!(wl.seconds, 900);
        assert_eq!(wl.status, WorklogStatus::Approved);
    }

    #[test]
    fn enqueue_creates_pending_entry_for_cautious_autonomy() {
        let mut session = Session::new("s1", 0);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(Some("K-1"), 1000, 1600));

        enqueue_worklogs(&mut session, &Config::default());
        assert_eq!(session.pending_worklogs[0].status, WorklogStatus::Pending);
    }

    #[test]
    fn per_issue_auto_approval_overrides_cautious_session() {
        let mut session = Session::new("s1", 0);
        let mut entry = IssueEntry::started_at(0);
        entry.auto_approve_worklogs = true;
        session.active_issues.insert("K-1".to_string(), entry);
        session.work_chunks.push(chunk(Some("K-1"), 1000, 1600));

        enqueue_worklogs(&mut session, &Config::default());
        assert_eq!(session.pending_worklogs[0].status, WorklogStatus::Approved);
    }

    #[test]
    fn enqueue_rescues_unattributed_work_with_multiple_issues() {
        let mut session = Session::new("s1", 0);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session
            .active_issues
            .insert("K-2".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(None, 1000, 1600));

        assert!(enqueue_worklogs(&mut session, &Config::default()));
        assert_eq!(session.pending_worklogs.len(), 1);
        let wl = &session.pending_worklogs[0];
        assert!(wl.issue_key.is_none());
        assert_eq!(wl.status, WorklogStatus::Unattributed);
    }

    #[test]
    fn enqueue_does_not_double_bill_sole_active_issue() {
        // With one active issue, the builder folds null chunks into it; no
        // separate unattributed entry may appear.
        let mut session = Session::new("s1", 0);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(Some("K-1"), 1000, 1600));
        session.work_chunks.push(chunk(None, 2000, 2600));

        enqueue_worklogs(&mut session, &Config::default());
        assert_eq!(session.pending_worklogs.len(), 1);
        assert_eq!(session.pending_worklogs[0].issue_key.as_deref(), Some("K-1"));
        assert_eq!(session.pending_worklogs[0].seconds, 1200);
    }

    #[test]
    fn session_end_builds_worklog_archives_and_clears() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let mut session = Session::new("end-1", 0);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(Some("K-1"), 1000, 1900));
        save_session(tmp.path(), &session).unwrap();

        session_end(tmp.path()).unwrap();

        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.pending_worklogs.len(), 1);
        assert_eq!(session.pending_worklogs[0].seconds, 900);
        assert!(session.work_chunks.is_empty());

        let archive = chrona_store::archive_dir(tmp.path()).join("end-1.json");
        assert!(archive.exists());
        // The archive snapshot still holds the chunks.
        let snapshot: Session =
            serde_json::from_str(&fs::read_to_string(&archive).unwrap()).unwrap();
        assert_eq!(snapshot.work_chunks.len(), 1);
    }

    #[test]
    fn session_end_twice_does_not_double_bill() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let mut session = Session::new("end-2", 0);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(Some("K-1"), 1000, 1900));
        save_session(tmp.path(), &session).unwrap();

        session_end(tmp.path()).unwrap();
        session_end(tmp.path()).unwrap();

        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.pending_worklogs.len(), 1, "no second worklog");
    }

    #[test]
    fn session_end_resets_watermarks() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let mut session = Session::new("end-3", 0);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(1000));
        save_session(tmp.path(), &session).unwrap();

        session_end(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        let entry = &session.active_issues["K-1"];
        assert!(entry.start_time >= now_unix() - 60);
    }

    #[test]
    fn session_end_flushes_open_planning_timer() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let now = now_unix();
        let mut session = Session::new("end-4", now);
        session.current_issue = Some("K-1".to_string());
        session.active_planning = Some(chrona_core::types::PlanningTimer {
            start_time: now - 600,
            issue_key: Some("K-1".to_string()),
            subject: "Planning: spec".to_string(),
        });
        save_session(tmp.path(), &session).unwrap();

        session_end(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert!(session.active_planning.is_none());
        assert_eq!(session.pending_worklogs.len(), 1);
        assert_eq!(session.pending_worklogs[0].summary, "Planning: spec");
    }

    #[test]
    fn session_end_prunes_ghost_issues() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K"}"#);

        let mut session = Session::new("end-5", 0);
        let mut ghost = IssueEntry::started_at(0);
        ghost.paused = true;
        session.active_issues.insert("K-9".to_string(), ghost);
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        session.work_chunks.push(chunk(Some("K-1"), 0, 600));
        save_session(tmp.path(), &session).unwrap();

        session_end(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert!(!session.active_issues.contains_key("K-9"));
        assert!(session.active_issues.contains_key("K-1"));
    }

    #[test]
    fn flush_point_respects_interval() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K", "worklogInterval": 15}"#);

        let now = now_unix();
        let mut session = Session::new("f1", now);
        session.last_flush_time = now; // interval not yet due
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(now));
        session.work_chunks.push(chunk(Some("K-1"), now - 600, now));
        save_session(tmp.path(), &session).unwrap();

        flush_point(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert!(session.pending_worklogs.is_empty(), "interval not due yet");
        assert_eq!(session.work_chunks.len(), 1);
    }

    #[test]
    fn flush_point_enqueues_when_interval_elapsed() {
        let tmp = tempfile::tempdir().unwrap();
        write_config(tmp.path(), r#"{"projectKey": "K", "worklogInterval": 15}"#);

        let now = now_unix();
        let mut session = Session::new("f2", now);
        session.last_flush_time = now - 1000; // 15m interval elapsed
        session
            .active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(now));
        session.work_chunks.push(chunk(Some("K-1"), now - 1600, now - 1000));
        save_session(tmp.path(), &session).unwrap();

        flush_point(tmp.path()).unwrap();
        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.pending_worklogs.len(), 1);
        assert!(session.work_chunks.is_empty());
        assert!(session.last_flush_time >= now);
    }

    #[test]
    fn post_without_credentials_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        std::env::set_var(
            "CHRONA_GLOBAL_CONFIG",
            tmp.path().join("no-global.json"),
        );
        let mut session = Session::new("p1", 0);
        session.pending_worklogs.push(PendingWorklog {
            issue_key: Some("K-1".to_string()),
            seconds: 900,
            summary: "work".to_string(),
            raw_facts: Default::default(),
            status: WorklogStatus::Approved,
        });
        save_session(tmp.path(), &session).unwrap();

        let summary = post_approved_worklogs(tmp.path()).unwrap();
        assert_eq!(summary.posted, 0);
        assert_eq!(summary.failed, 0);
        // Entry left approved for a later attempt.
        let session = load_session(tmp.path()).unwrap();
        assert_eq!(session.pending_worklogs[0].status, WorklogStatus::Approved);
        std::env::remove_var("CHRONA_GLOBAL_CONFIG");
    }
}
