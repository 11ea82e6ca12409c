use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    ActivityEvent, IssueEntry, IssueKey, PendingWorklog, PlanningTimer, TaskTimer, WorkChunk,
    SCHEMA_VERSION,
};

fn default_accuracy() -> u8 {
    5
}

/// The session document: the sole shared mutable resource across hook
/// invocations. Persisted after every mutation; archived and reset at
/// session end.
///
/// Migration is additive-only: every field defaults, so documents written
/// by older versions load cleanly. Unknown fields are ignored on load and
/// dropped on the next save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub autonomy: crate::types::Autonomy,
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    #[serde(default)]
    pub active_issues: BTreeMap<IssueKey, IssueEntry>,
    #[serde(default)]
    pub current_issue: Option<IssueKey>,
    /// Last parent issue used for sub-task creation.
    #[serde(default)]
    pub last_parent_key: Option<IssueKey>,
    #[serde(default)]
    pub work_chunks: Vec<WorkChunk>,
    #[serde(default)]
    pub pending_worklogs: Vec<PendingWorklog>,
    #[serde(default)]
    pub activity_buffer: Vec<ActivityEvent>,
    #[serde(default)]
    pub active_planning: Option<PlanningTimer>,
    #[serde(default)]
    pub active_tasks: BTreeMap<String, TaskTimer>,
    /// Task subjects observed at creation, so later status updates without a
    /// subject still resolve one.
    #[serde(default)]
    pub task_subjects: BTreeMap<String, String>,
    #[serde(default)]
    pub last_flush_time: i64,
}

impl Session {
    pub fn new(session_id: impl Into<String>, now: i64) -> Self {
        Session {
            schema_version: SCHEMA_VERSION,
            session_id: session_id.into(),
            autonomy: crate::types::Autonomy::default(),
            accuracy: default_accuracy(),
            active_issues: BTreeMap::new(),
            current_issue: None,
            last_parent_key: None,
            work_chunks: Vec::new(),
            pending_worklogs: Vec::new(),
            activity_buffer: Vec::new(),
            active_planning: None,
            active_tasks: BTreeMap::new(),
            task_subjects: BTreeMap::new(),
            last_flush_time: now,
        }
    }

    /// True when `issue_key` is the only active issue, the case where
    /// unattributed chunks are folded into its worklog.
    pub fn is_sole_active_issue(&self, issue_key: &str) -> bool {
        self.active_issues.len() == 1 && self.active_issues.contains_key(issue_key)
    }

    /// Whether any chunk is attributed to `issue_key`.
    pub fn has_chunks_for(&self, issue_key: &str) -> bool {
        self.work_chunks
            .iter()
            .any(|c| c.issue_key.as_deref() == Some(issue_key))
    }

    /// Retroactively assign unattributed chunks to `issue_key`, folding their
    /// billable time into the issue's `total_seconds`.
    ///
    /// Called whenever an issue becomes known for the first time (branch
    /// detection, auto-create), so work done before the issue existed gets
    /// attributed. Returns the number of chunks claimed.
    pub fn claim_unattributed_chunks(&mut self, issue_key: &str) -> usize {
        let mut claimed = 0;
        let mut claimed_seconds = 0;
        for chunk in &mut self.work_chunks {
            if chunk.issue_key.is_some() {
                continue;
            }
            chunk.issue_key = Some(issue_key.to_string());
            claimed += 1;
            claimed_seconds += chunk.billable_seconds();
        }
        if claimed > 0 {
            if let Some(entry) = self.active_issues.get_mut(issue_key) {
                entry.total_seconds += claimed_seconds;
            }
        }
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Autonomy, IdleGap};

    fn chunk(issue_key: Option<&str>, start: i64, end: i64) -> WorkChunk {
        WorkChunk {
            id: WorkChunk::new_id(),
            issue_key: issue_key.map(str::to_string),
            start_time: start,
            end_time: end,
            activities: Vec::new(),
            files_changed: Vec::new(),
            idle_gaps: Vec::new(),
            needs_attribution: false,
        }
    }

    #[test]
    fn new_session_has_schema_version() {
        let s = Session::new("20260805-120000", 1_000);
        assert_eq!(s.schema_version, SCHEMA_VERSION);
        assert_eq!(s.accuracy, 5);
        assert_eq!(s.autonomy, Autonomy::Cautious);
        assert!(s.active_issues.is_empty());
        assert_eq!(s.last_flush_time, 1_000);
    }

    #[test]
    fn loads_partial_document_with_defaults() {
        // A document written before active_tasks / last_flush_time existed.
        let doc = r#"{
            "session_id": "old",
            "current_issue": "K-1",
            "work_chunks": []
        }"#;
        let s: Session = serde_json::from_str(doc).unwrap();
        assert_eq!(s.session_id, "old");
        assert_eq!(s.current_issue.as_deref(), Some("K-1"));
        assert_eq!(s.accuracy, 5);
        assert!(s.active_tasks.is_empty());
        assert!(s.active_planning.is_none());
        assert_eq!(s.last_flush_time, 0);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let doc = r#"{"session_id": "x", "legacyField": {"nested": true}}"#;
        let s: Session = serde_json::from_str(doc).unwrap();
        assert_eq!(s.session_id, "x");
    }

    #[test]
    fn claim_unattributed_chunks_folds_billable_time() {
        let mut s = Session::new("s1", 0);
        s.active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        s.work_chunks.push(chunk(None, 1000, 1600));
        s.work_chunks.push(chunk(Some("K-2"), 2000, 2500));
        s.work_chunks.push(chunk(None, 3000, 3300));

        let claimed = s.claim_unattributed_chunks("K-1");
        assert_eq!(claimed, 2);
        assert_eq!(s.active_issues["K-1"].total_seconds, 900);
        assert!(s.work_chunks.iter().all(|c| c.issue_key.is_some()));
        assert_eq!(s.work_chunks[1].issue_key.as_deref(), Some("K-2"));
    }

    #[test]
    fn claim_subtracts_idle_gaps_from_folded_time() {
        let mut s = Session::new("s1", 0);
        s.active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        let mut c = chunk(None, 1000, 2000);
        c.idle_gaps.push(IdleGap {
            start_time: 1200,
            end_time: 1500,
            seconds: 300,
        });
        s.work_chunks.push(c);

        s.claim_unattributed_chunks("K-1");
        assert_eq!(s.active_issues["K-1"].total_seconds, 700);
    }

    #[test]
    fn sole_active_issue() {
        let mut s = Session::new("s1", 0);
        assert!(!s.is_sole_active_issue("K-1"));
        s.active_issues
            .insert("K-1".to_string(), IssueEntry::started_at(0));
        assert!(s.is_sole_active_issue("K-1"));
        s.active_issues
            .insert("K-2".to_string(), IssueEntry::started_at(0));
        assert!(!s.is_sole_active_issue("K-1"));
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut s = Session::new("s1", 42);
        s.current_issue = Some("K-9".to_string());
        s.autonomy = Autonomy::Balanced;
        let json = serde_json::to_string(&s).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, "s1");
        assert_eq!(back.current_issue.as_deref(), Some("K-9"));
        assert_eq!(back.autonomy, Autonomy::Balanced);
        assert_eq!(back.last_flush_time, 42);
    }
}
