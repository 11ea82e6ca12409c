use std::path::Path;

use chrona_core::types::WorklogStatus;

/// `chrona status` — show the live session
pub fn run(root: &Path) -> anyhow::Result<()> {
    let Some(session) = chrona_store::session::load_session(root) else {
        println!("No active session.");
        return Ok(());
    };

    println!("Session {}", session.session_id);
    println!("  autonomy: {:?}  accuracy: {}", session.autonomy, session.accuracy);

    if session.active_issues.is_empty() {
        println!("  no active issues");
    } else {
        println!("  active issues:");
        for (key, entry) in &session.active_issues {
            let marker = if session.current_issue.as_deref() == Some(key.as_str()) {
                "*"
            } else if entry.paused {
                "‖"
            } else {
                " "
            };
            let summary = if entry.summary.is_empty() {
                String::new()
            } else {
                format!(" — {}", entry.summary)
            };
            println!(
                "  {marker} {key}{summary} ({}m logged)",
                entry.total_seconds / 60
            );
        }
    }

    println!(
        "  buffered activities: {}  work chunks: {}",
        session.activity_buffer.len(),
        session.work_chunks.len()
    );

    let pending = session
        .pending_worklogs
        .iter()
        .filter(|w| matches!(w.status, WorklogStatus::Pending | WorklogStatus::Approved))
        .count();
    let unattributed = session
        .pending_worklogs
        .iter()
        .filter(|w| w.status == WorklogStatus::Unattributed)
        .count();
    let failed = session
        .pending_worklogs
        .iter()
        .filter(|w| w.status == WorklogStatus::Failed)
        .count();
    println!("  worklogs: {pending} pending/approved, {unattributed} unattributed, {failed} failed");
    Ok(())
}
