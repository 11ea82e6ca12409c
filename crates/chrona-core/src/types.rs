use serde::{Deserialize, Serialize};

/// Current schema version for the session document.
pub const SCHEMA_VERSION: u32 = 1;

/// Sanity cap for a single worklog entry (4 hours).
pub const MAX_WORKLOG_SECONDS: i64 = 14_400;

/// Threshold for stale-issue pruning at session start (24 hours).
pub const STALE_ISSUE_SECONDS: i64 = 86_400;

/// Minimum duration for a planning span or host task to be worth billing.
pub const MIN_TRACKED_SECONDS: i64 = 60;

/// Issue key in the ticket system (e.g. "PROJ-42").
pub type IssueKey = String;

/// What kind of action an observed tool call represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    FileEdit,
    FileWrite,
    Command,
    Agent,
    Other,
}

/// One observed action, as captured by the recorder.
///
/// Immutable once appended to the buffer; moved (not copied) into a chunk
/// when the buffer is drained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Unix timestamp (seconds) at capture time.
    pub timestamp: i64,
    /// Host tool name that produced the action.
    pub tool: String,
    pub kind: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Command text, already credential-sanitized by the recorder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Issue the session was focused on at capture time; None = unattributed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<IssueKey>,
}

/// An idle span recorded inside a chunk's time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleGap {
    pub start_time: i64,
    pub end_time: i64,
    pub seconds: i64,
}

/// A contiguous, time-bounded, single-issue grouping of observed actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkChunk {
    /// `chunk_<ulid>`
    pub id: String,
    /// None = unattributed; may be rewritten later by retroactive attribution.
    #[serde(default)]
    pub issue_key: Option<IssueKey>,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub activities: Vec<ActivityEvent>,
    /// Deduplicated touched paths, insertion order.
    #[serde(default)]
    pub files_changed: Vec<String>,
    #[serde(default)]
    pub idle_gaps: Vec<IdleGap>,
    /// Set when a context switch was detected around this chunk.
    #[serde(default)]
    pub needs_attribution: bool,
}

impl WorkChunk {
    /// Fresh chunk id.
    pub fn new_id() -> String {
        format!("chunk_{}", ulid::Ulid::new().to_string().to_lowercase())
    }

    /// Billable seconds: window length minus idle gaps recorded inside the
    /// window, floored at 0. Gaps outside [start_time, end_time] are ignored;
    /// they can only appear in documents written by foreign tooling.
    pub fn billable_seconds(&self) -> i64 {
        let window = self.end_time - self.start_time;
        let idle: i64 = self
            .idle_gaps
            .iter()
            .filter(|g| g.start_time >= self.start_time && g.end_time <= self.end_time)
            .map(|g| g.seconds)
            .sum();
        (window - idle).max(0)
    }
}

/// Degree of automatic action without human confirmation.
///
/// Config files accept the legacy letters (`"A"`/`"B"`/`"C"`) or a numeric
/// 1-10 dial; both normalize through [`Autonomy::from_letter`] /
/// [`Autonomy::from_level`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Autonomy {
    #[default]
    Cautious,
    Balanced,
    Autonomous,
}

impl Autonomy {
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Autonomy::Autonomous),
            "B" => Some(Autonomy::Balanced),
            "C" => Some(Autonomy::Cautious),
            _ => None,
        }
    }

    pub fn from_level(level: i64) -> Self {
        if level >= 10 {
            Autonomy::Autonomous
        } else if level >= 6 {
            Autonomy::Balanced
        } else {
            Autonomy::Cautious
        }
    }

    /// Balanced and Autonomous enqueue worklogs pre-approved; Cautious waits
    /// for explicit approval.
    pub fn auto_approves(self) -> bool {
        !matches!(self, Autonomy::Cautious)
    }
}

/// Per-issue tracking state while an issue is active in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEntry {
    #[serde(default)]
    pub summary: String,
    /// Watermark: work before this instant has already been billed.
    pub start_time: i64,
    /// Monotonically increasing while the issue is active and unpaused.
    #[serde(default)]
    pub total_seconds: i64,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub auto_approve_worklogs: bool,
}

impl IssueEntry {
    pub fn started_at(start_time: i64) -> Self {
        IssueEntry {
            summary: String::new(),
            start_time,
            total_seconds: 0,
            paused: false,
            auto_approve_worklogs: false,
        }
    }
}

/// Lifecycle of a pending worklog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorklogStatus {
    Pending,
    Approved,
    Posted,
    Failed,
    Deferred,
    Dropped,
    Unattributed,
}

/// Raw facts behind a worklog summary, carried for downstream enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFacts {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub activity_count: usize,
}

/// A time-log entry queued for the ticket system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingWorklog {
    #[serde(default)]
    pub issue_key: Option<IssueKey>,
    pub seconds: i64,
    pub summary: String,
    #[serde(default)]
    pub raw_facts: RawFacts,
    pub status: WorklogStatus,
}

/// An open planning span (plan mode or a planning-shaped skill).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningTimer {
    pub start_time: i64,
    /// Issue the session was focused on when planning started.
    #[serde(default)]
    pub issue_key: Option<IssueKey>,
    pub subject: String,
}

/// A started host task awaiting completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTimer {
    #[serde(default)]
    pub subject: String,
    pub start_time: i64,
    #[serde(default)]
    pub issue_key: Option<IssueKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autonomy_from_letter_and_level() {
        assert_eq!(Autonomy::from_letter("a"), Some(Autonomy::Autonomous));
        assert_eq!(Autonomy::from_letter("B"), Some(Autonomy::Balanced));
        assert_eq!(Autonomy::from_letter("c"), Some(Autonomy::Cautious));
        assert_eq!(Autonomy::from_letter("x"), None);

        assert_eq!(Autonomy::from_level(10), Autonomy::Autonomous);
        assert_eq!(Autonomy::from_level(6), Autonomy::Balanced);
        assert_eq!(Autonomy::from_level(5), Autonomy::Cautious);
        assert_eq!(Autonomy::from_level(1), Autonomy::Cautious);
    }

    #[test]
    fn autonomy_auto_approves() {
        assert!(Autonomy::Autonomous.auto_approves());
        assert!(Autonomy::Balanced.auto_approves());
        assert!(!Autonomy::Cautious.auto_approves());
    }

    #[test]
    fn billable_seconds_subtracts_internal_gaps() {
        let chunk = WorkChunk {
            id: WorkChunk::new_id(),
            issue_key: None,
            start_time: 1000,
            end_time: 4000,
            activities: Vec::new(),
            files_changed: Vec::new(),
            idle_gaps: vec![IdleGap {
                start_time: 2000,
                end_time: 2500,
                seconds: 500,
            }],
            needs_attribution: false,
        };
        assert_eq!(chunk.billable_seconds(), 2500);
    }

    #[test]
    fn billable_seconds_ignores_gaps_outside_window() {
        let chunk = WorkChunk {
            id: WorkChunk::new_id(),
            issue_key: None,
            start_time: 1000,
            end_time: 2000,
            activities: Vec::new(),
            files_changed: Vec::new(),
            idle_gaps: vec![IdleGap {
                start_time: 0,
                end_time: 1000,
                seconds: 1000,
            }],
            needs_attribution: false,
        };
        assert_eq!(chunk.billable_seconds(), 1000);
    }

    #[test]
    fn billable_seconds_floors_at_zero() {
        let chunk = WorkChunk {
            id: WorkChunk::new_id(),
            issue_key: None,
            start_time: 1000,
            end_time: 1200,
            activities: Vec::new(),
            files_changed: Vec::new(),
            idle_gaps: vec![IdleGap {
                start_time: 1000,
                end_time: 1200,
                seconds: 9999,
            }],
            needs_attribution: false,
        };
        assert_eq!(chunk.billable_seconds(), 0);
    }

    #[test]
    fn chunk_id_format() {
        let id = WorkChunk::new_id();
        assert!(id.starts_with("chunk_"));
        assert_eq!(id.len(), "chunk_".len() + 26);
    }
}
